//! Storage-related types for the tracker.

use std::str::FromStr;

/// Namespaces for persisted documents.
///
/// A stored key is the namespace followed by `_` and the document id, e.g.
/// `order_simulation_state_ORD-2026-8898`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// Per-order simulation state.
	SimulationState,
	/// Submitted cancellation requests.
	Cancellations,
}

impl StorageKey {
	/// Returns the string representation of the storage key.
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::SimulationState => "order_simulation_state",
			StorageKey::Cancellations => "order_cancellation",
		}
	}

	/// Builds the full key for a document id.
	pub fn key_for(&self, id: &str) -> String {
		format!("{}_{}", self.as_str(), id)
	}

	/// Returns an iterator over all StorageKey variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[Self::SimulationState, Self::Cancellations].into_iter()
	}
}

impl FromStr for StorageKey {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"order_simulation_state" => Ok(Self::SimulationState),
			"order_cancellation" => Ok(Self::Cancellations),
			_ => Err(()),
		}
	}
}
