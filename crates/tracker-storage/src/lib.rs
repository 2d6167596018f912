//! Storage module for the order tracker.
//!
//! This module provides the persistence port used by the simulation: a
//! low-level key-value interface over raw bytes, a typed JSON layer on top
//! of it, and in-memory and file-based backends.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tracker_types::{ConfigSchema, ImplementationRegistry, StorageKey, ValidationError};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs when a requested item is not found.
	#[error("Not found")]
	NotFound,
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

impl From<ValidationError> for StorageError {
	fn from(err: ValidationError) -> Self {
		StorageError::Configuration(err.to_string())
	}
}

/// Trait defining the low-level interface for storage backends.
///
/// Entries never expire on their own; they disappear only through
/// [`StorageInterface::delete`].
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves raw bytes for the given key.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores raw bytes, replacing any previous value.
	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Deletes the value associated with the given key. Deleting a missing key succeeds.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	/// Checks if a key exists in storage.
	async fn exists(&self, key: &str) -> Result<bool, StorageError>;

	/// Lists every stored key starting with `prefix`, sorted.
	async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for storage factory functions.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

/// Registry trait for storage implementations.
pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// Get all registered storage implementations.
///
/// Returns (name, factory) pairs used to build the backend named in
/// `storage.primary`.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// High-level storage service that provides typed operations.
///
/// Documents are stored as JSON under `<namespace>_<id>`.
pub struct StorageService {
	/// The underlying storage backend implementation.
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	/// Creates a new StorageService with the specified backend.
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	/// Serializes `data` to JSON and stores it, creating or overwriting the entry.
	pub async fn store<T: Serialize>(
		&self,
		namespace: StorageKey,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend.set_bytes(&namespace.key_for(id), bytes).await
	}

	/// Retrieves and deserializes a value from storage.
	///
	/// Malformed documents surface as [`StorageError::Serialization`].
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: StorageKey,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(&namespace.key_for(id)).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Removes a value from storage.
	pub async fn remove(&self, namespace: StorageKey, id: &str) -> Result<(), StorageError> {
		self.backend.delete(&namespace.key_for(id)).await
	}

	/// Checks if a value exists in storage.
	pub async fn exists(&self, namespace: StorageKey, id: &str) -> Result<bool, StorageError> {
		self.backend.exists(&namespace.key_for(id)).await
	}

	/// Lists the ids stored under a namespace.
	pub async fn list_ids(&self, namespace: StorageKey) -> Result<Vec<String>, StorageError> {
		let prefix = namespace.key_for("");
		let keys = self.backend.keys_with_prefix(&prefix).await?;
		Ok(keys
			.into_iter()
			.filter_map(|key| key.strip_prefix(&prefix).map(str::to_string))
			.collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use implementations::memory::MemoryStorage;
	use serde::Deserialize;

	#[derive(Debug, PartialEq, Serialize, Deserialize)]
	struct Doc {
		value: u32,
	}

	#[tokio::test]
	async fn test_typed_round_trip() {
		let service = StorageService::new(Box::new(MemoryStorage::new()));
		service
			.store(StorageKey::SimulationState, "X", &Doc { value: 7 })
			.await
			.unwrap();

		let doc: Doc = service
			.retrieve(StorageKey::SimulationState, "X")
			.await
			.unwrap();
		assert_eq!(doc, Doc { value: 7 });
		assert!(service.exists(StorageKey::SimulationState, "X").await.unwrap());
		assert!(!service.exists(StorageKey::Cancellations, "X").await.unwrap());
	}

	#[tokio::test]
	async fn test_malformed_document() {
		let backend = MemoryStorage::new();
		backend
			.set_bytes("order_simulation_state_X", b"{not json".to_vec())
			.await
			.unwrap();
		let service = StorageService::new(Box::new(backend));

		let result: Result<Doc, _> = service.retrieve(StorageKey::SimulationState, "X").await;
		assert!(matches!(result, Err(StorageError::Serialization(_))));
	}

	#[tokio::test]
	async fn test_list_ids_by_namespace() {
		let service = StorageService::new(Box::new(MemoryStorage::new()));
		for id in ["B", "A"] {
			service
				.store(StorageKey::SimulationState, id, &Doc { value: 1 })
				.await
				.unwrap();
		}
		service
			.store(StorageKey::Cancellations, "C", &Doc { value: 1 })
			.await
			.unwrap();

		let ids = service.list_ids(StorageKey::SimulationState).await.unwrap();
		assert_eq!(ids, vec!["A".to_string(), "B".to_string()]);

		service.remove(StorageKey::SimulationState, "A").await.unwrap();
		let ids = service.list_ids(StorageKey::SimulationState).await.unwrap();
		assert_eq!(ids, vec!["B".to_string()]);
	}
}
