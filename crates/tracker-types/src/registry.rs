//! Registry trait for self-registering implementations.

/// Base trait for implementation registries.
///
/// Each pluggable backend provides a `Registry` struct that declares the
/// name used for it in configuration files (for example `"memory"` under
/// `[storage.implementations.memory]`) together with its factory function.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
