//! In-memory storage backend.
//!
//! Keeps every record in a `HashMap` behind a `tokio` read-write lock.
//! Useful for development and tests; nothing survives a restart.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use pickup_types::{ConfigSchema, ImplementationRegistry, Schema, ValidationError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory storage implementation.
pub struct MemoryStorage {
	/// The in-memory store protected by a read-write lock.
	store: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
	/// Creates a new, empty MemoryStorage instance.
	pub fn new() -> Self {
		Self {
			store: Arc::new(RwLock::new(HashMap::new())),
		}
	}
}

impl Default for MemoryStorage {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl StorageInterface for MemoryStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let store = self.store.read().await;
		store.get(key).cloned().ok_or(StorageError::NotFound)
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let mut store = self.store.write().await;
		store.insert(key.to_string(), value);
		Ok(())
	}

	async fn insert_if_absent(&self, key: &str, value: Vec<u8>) -> Result<bool, StorageError> {
		let mut store = self.store.write().await;
		if store.contains_key(key) {
			return Ok(false);
		}
		store.insert(key.to_string(), value);
		Ok(true)
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let mut store = self.store.write().await;
		store.remove(key);
		Ok(())
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		let store = self.store.read().await;
		Ok(store.contains_key(key))
	}

	async fn keys(&self, namespace: &str) -> Result<Vec<String>, StorageError> {
		let prefix = format!("{}:", namespace);
		let store = self.store.read().await;
		Ok(store
			.keys()
			.filter(|key| key.starts_with(&prefix))
			.cloned()
			.collect())
	}
}

/// Configuration schema for MemoryStorage.
pub struct MemoryStorageSchema;

impl ConfigSchema for MemoryStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// No settings, but the section still has to be a table.
		Schema::new(vec![], vec![]).validate(config)
	}
}

/// Factory function to create a memory storage backend from configuration.
///
/// Configuration parameters:
/// - None required for memory storage
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	MemoryStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;
	Ok(Box::new(MemoryStorage::new()))
}

/// Registry for the memory storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_basic_operations() {
		let storage = MemoryStorage::new();

		let key = "orders:1";
		let value = b"{}".to_vec();
		storage.set_bytes(key, value.clone()).await.unwrap();

		assert_eq!(storage.get_bytes(key).await.unwrap(), value);
		assert!(storage.exists(key).await.unwrap());

		storage.delete(key).await.unwrap();
		assert!(!storage.exists(key).await.unwrap());
		assert!(matches!(
			storage.get_bytes(key).await,
			Err(StorageError::NotFound)
		));
	}

	#[tokio::test]
	async fn test_insert_if_absent_keeps_first_value() {
		let storage = MemoryStorage::new();

		assert!(storage
			.insert_if_absent("users_by_email:a@b.c", b"1".to_vec())
			.await
			.unwrap());
		assert!(!storage
			.insert_if_absent("users_by_email:a@b.c", b"2".to_vec())
			.await
			.unwrap());
		assert_eq!(
			storage.get_bytes("users_by_email:a@b.c").await.unwrap(),
			b"1".to_vec()
		);
	}

	#[tokio::test]
	async fn test_concurrent_claims_have_one_winner() {
		let storage = Arc::new(MemoryStorage::new());
		let mut handles = Vec::new();

		for i in 0..16u8 {
			let storage = Arc::clone(&storage);
			handles.push(tokio::spawn(async move {
				storage
					.insert_if_absent("users_by_phone:5550001", vec![i])
					.await
					.unwrap()
			}));
		}

		let mut winners = 0;
		for handle in handles {
			if handle.await.unwrap() {
				winners += 1;
			}
		}
		assert_eq!(winners, 1);
	}

	#[tokio::test]
	async fn test_keys_by_namespace() {
		let storage = MemoryStorage::new();
		storage.set_bytes("users:1", vec![]).await.unwrap();
		storage.set_bytes("users:2", vec![]).await.unwrap();
		storage.set_bytes("users_by_phone:1", vec![]).await.unwrap();

		let mut keys = storage.keys("users").await.unwrap();
		keys.sort();
		assert_eq!(keys, vec!["users:1".to_string(), "users:2".to_string()]);
	}

	#[test]
	fn test_factory_rejects_non_table() {
		assert!(create_storage(&toml::Value::Integer(3)).is_err());
		assert!(create_storage(&toml::Value::Table(toml::map::Map::new())).is_ok());
	}
}
