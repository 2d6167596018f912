//! Builder for constructing a tracker engine from configuration.
//!
//! Storage backends are created through factory functions keyed by
//! implementation name, so the binary decides which backends exist.

use crate::engine::TrackerEngine;
use crate::navigation::Navigator;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracker_config::Config;
use tracker_storage::{StorageError, StorageInterface, StorageService};

/// Errors that can occur while building the engine.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
}

/// Builds a [`TrackerEngine`] with a pluggable storage backend.
pub struct TrackerBuilder {
	config: Config,
}

impl TrackerBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Creates the primary storage backend and the engine around it.
	pub fn build<SF>(
		self,
		storage_factories: HashMap<String, SF>,
		navigator: Arc<dyn Navigator>,
	) -> Result<TrackerEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
	{
		let primary = &self.config.storage.primary;
		let storage_config = self
			.config
			.storage
			.implementations
			.get(primary)
			.ok_or_else(|| {
				BuilderError::Config(format!(
					"Primary storage '{}' has no configuration",
					primary
				))
			})?;
		let factory = storage_factories.get(primary).ok_or_else(|| {
			BuilderError::Config(format!("Unknown storage implementation '{}'", primary))
		})?;

		let backend = factory(storage_config).map_err(|e| {
			tracing::error!(
				component = "storage",
				implementation = %primary,
				error = %e,
				"Failed to create storage implementation"
			);
			BuilderError::Config(format!(
				"Failed to create storage implementation '{}': {}",
				primary, e
			))
		})?;
		tracing::info!(component = "storage", implementation = %primary, "Loaded");

		let storage = Arc::new(StorageService::new(backend));
		Ok(TrackerEngine::new(self.config, storage, navigator))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::navigation::LoggingNavigator;
	use tracker_storage::StorageFactory;

	fn factories() -> HashMap<String, StorageFactory> {
		tracker_storage::get_all_implementations()
			.into_iter()
			.map(|(name, factory)| (name.to_string(), factory))
			.collect()
	}

	#[tokio::test]
	async fn test_builds_memory_engine() {
		let config: Config = r#"
[storage]
primary = "memory"
[storage.implementations.memory]
"#
		.parse()
		.unwrap();

		let engine = TrackerBuilder::new(config)
			.build(factories(), Arc::new(LoggingNavigator))
			.unwrap();
		assert!(engine.list_orders().await.unwrap().is_empty());
	}

	#[test]
	fn test_unknown_backend() {
		let config: Config = r#"
[storage]
primary = "redis"
[storage.implementations.redis]
url = "redis://localhost"
"#
		.parse()
		.unwrap();

		let result = TrackerBuilder::new(config).build(factories(), Arc::new(LoggingNavigator));
		assert!(matches!(result, Err(BuilderError::Config(msg)) if msg.contains("redis")));
	}
}
