//! File-based storage backend.
//!
//! Each key becomes one JSON file in the base directory. Keys are escaped
//! into file names reversibly so they can be listed back out.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tracker_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError,
};

const EXTENSION: &str = "json";
const DEFAULT_STORAGE_PATH: &str = "./data/storage";

/// File-based storage implementation.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// reader never observes a half-written document.
pub struct FileStorage {
	/// Base directory path for storing files.
	base_path: PathBuf,
}

impl FileStorage {
	pub fn new(base_path: PathBuf) -> Self {
		Self { base_path }
	}

	fn get_file_path(&self, key: &str) -> PathBuf {
		self.base_path
			.join(format!("{}.{}", encode_key(key), EXTENSION))
	}
}

/// Escapes every byte outside `[A-Za-z0-9_.-]` as `%XX`.
fn encode_key(key: &str) -> String {
	let mut out = String::with_capacity(key.len());
	for byte in key.bytes() {
		if byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-' | b'.') {
			out.push(byte as char);
		} else {
			out.push_str(&format!("%{:02X}", byte));
		}
	}
	out
}

fn decode_key(name: &str) -> Option<String> {
	let mut bytes = Vec::with_capacity(name.len());
	let mut iter = name.bytes();
	while let Some(byte) = iter.next() {
		if byte == b'%' {
			let hi = iter.next()?;
			let lo = iter.next()?;
			let hex = [hi, lo];
			let hex = std::str::from_utf8(&hex).ok()?;
			bytes.push(u8::from_str_radix(hex, 16).ok()?);
		} else {
			bytes.push(byte);
		}
	}
	String::from_utf8(bytes).ok()
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.get_file_path(key);

		match fs::read(&path).await {
			Ok(data) => Ok(data),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let path = self.get_file_path(key);

		fs::create_dir_all(&self.base_path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, value)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let path = self.get_file_path(key);

		match fs::remove_file(&path).await {
			Ok(_) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		fs::try_exists(self.get_file_path(key))
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}

	async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
		let mut entries = match fs::read_dir(&self.base_path).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let mut keys = Vec::new();
		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension() != Some(std::ffi::OsStr::new(EXTENSION)) {
				continue;
			}
			let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
				continue;
			};
			match decode_key(stem) {
				Some(key) if key.starts_with(prefix) => keys.push(key),
				Some(_) => {},
				None => tracing::debug!("Skipping file {:?}: not a storage key", path),
			}
		}

		keys.sort();
		Ok(keys)
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![
				Field::new("storage_path", FieldType::String).with_validator(|value| {
					match value.as_str() {
						Some(path) if !path.trim().is_empty() => Ok(()),
						_ => Err("storage_path cannot be empty".to_string()),
					}
				}),
			],
		);
		schema.validate(config)
	}
}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for file storage (default: "./data/storage")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	FileStorageSchema.validate(config)?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_STORAGE_PATH);

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

/// Registry for the file backend.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[test]
	fn test_key_encoding_is_reversible() {
		for key in ["order_simulation_state_ORD-2026-8898", "a/b:c d", "ünï"] {
			let encoded = encode_key(key);
			assert!(!encoded.contains('/'));
			assert_eq!(decode_key(&encoded).as_deref(), Some(key));
		}
		assert_eq!(decode_key("bad%4"), None);
	}

	#[tokio::test]
	async fn test_persists_across_instances() {
		let dir = TempDir::new().unwrap();
		let key = "order_simulation_state_ORD/1";

		FileStorage::new(dir.path().to_path_buf())
			.set_bytes(key, b"{}".to_vec())
			.await
			.unwrap();

		let reopened = FileStorage::new(dir.path().to_path_buf());
		assert_eq!(reopened.get_bytes(key).await.unwrap(), b"{}".to_vec());
		assert!(reopened.exists(key).await.unwrap());
		assert_eq!(
			reopened
				.keys_with_prefix("order_simulation_state_")
				.await
				.unwrap(),
			vec![key.to_string()]
		);
	}

	#[tokio::test]
	async fn test_missing_key_and_directory() {
		let dir = TempDir::new().unwrap();
		let storage = FileStorage::new(dir.path().join("never-created"));

		assert!(matches!(
			storage.get_bytes("nope").await,
			Err(StorageError::NotFound)
		));
		assert!(storage.keys_with_prefix("").await.unwrap().is_empty());
		storage.delete("nope").await.unwrap();
	}

	#[test]
	fn test_schema_rejects_blank_path() {
		let config: toml::Value = toml::from_str("storage_path = \"  \"").unwrap();
		assert!(create_storage(&config).is_err());
	}
}
