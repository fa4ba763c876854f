//! Storage module for the pickup ordering system.
//!
//! This crate is the persistence collaborator of the engine. It exposes a
//! small byte-oriented key-value contract that backends implement, and a
//! typed [`StorageService`] on top of it that the engine uses for its user,
//! product and order records.

use async_trait::async_trait;
use pickup_types::ImplementationRegistry;
use serde::{de::DeserializeOwned, Serialize};
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

/// Trait defining the low-level interface for storage backends.
///
/// Keys have the shape `<namespace>:<id>`. Namespaces never contain `:`,
/// ids may.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves raw bytes for the given key.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores raw bytes, replacing any previous value.
	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Stores raw bytes only if the key is vacant.
	///
	/// Returns `false` without touching the existing value when the key is
	/// already taken. The check and the write are a single atomic step, which
	/// is what makes this usable as a uniqueness constraint.
	async fn insert_if_absent(&self, key: &str, value: Vec<u8>) -> Result<bool, StorageError>;

	/// Deletes the value associated with the given key.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	/// Checks if a key exists in storage.
	async fn exists(&self, key: &str) -> Result<bool, StorageError>;

	/// Lists every key stored under a namespace, in no particular order.
	async fn keys(&self, namespace: &str) -> Result<Vec<String>, StorageError>;
}

/// Type alias for storage factory functions.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

/// Registry trait for storage implementations.
pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// Get all registered storage implementations.
///
/// Returns a vector of (name, factory) tuples for all available storage implementations.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// Joins a namespace and an id into a backend key.
pub(crate) fn make_key(namespace: &str, id: &str) -> String {
	format!("{}:{}", namespace, id)
}

/// High-level storage service that provides typed operations.
///
/// Values are stored as JSON.
pub struct StorageService {
	/// The underlying storage backend implementation.
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	/// Creates a new StorageService with the specified backend.
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	/// Stores a serializable value, creating or overwriting it.
	pub async fn store<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let bytes = encode(data)?;
		self.backend.set_bytes(&make_key(namespace, id), bytes).await
	}

	/// Stores a value only if nothing is stored under `namespace:id` yet.
	///
	/// Returns `false` when the slot was already claimed.
	pub async fn claim<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<bool, StorageError> {
		let bytes = encode(data)?;
		self.backend
			.insert_if_absent(&make_key(namespace, id), bytes)
			.await
	}

	/// Retrieves and deserializes a value from storage.
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(&make_key(namespace, id)).await?;
		decode(&bytes)
	}

	/// Like [`retrieve`](Self::retrieve) but maps a missing key to `None`.
	pub async fn find<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<Option<T>, StorageError> {
		match self.retrieve(namespace, id).await {
			Ok(value) => Ok(Some(value)),
			Err(StorageError::NotFound) => Ok(None),
			Err(e) => Err(e),
		}
	}

	/// Removes a value from storage.
	pub async fn remove(&self, namespace: &str, id: &str) -> Result<(), StorageError> {
		self.backend.delete(&make_key(namespace, id)).await
	}

	/// Updates an existing value in storage.
	///
	/// Returns `NotFound` if the key doesn't exist, making it semantically
	/// different from [`store`](Self::store) which will create or overwrite.
	pub async fn update<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let key = make_key(namespace, id);

		if !self.backend.exists(&key).await? {
			return Err(StorageError::NotFound);
		}

		let bytes = encode(data)?;
		self.backend.set_bytes(&key, bytes).await
	}

	/// Checks if a value exists in storage.
	pub async fn exists(&self, namespace: &str, id: &str) -> Result<bool, StorageError> {
		self.backend.exists(&make_key(namespace, id)).await
	}

	/// Loads every value stored under a namespace.
	///
	/// Entries deleted between listing and reading are skipped.
	pub async fn list<T: DeserializeOwned>(&self, namespace: &str) -> Result<Vec<T>, StorageError> {
		let keys = self.backend.keys(namespace).await?;
		let mut values = Vec::with_capacity(keys.len());

		for key in keys {
			match self.backend.get_bytes(&key).await {
				Ok(bytes) => values.push(decode(&bytes)?),
				Err(StorageError::NotFound) => {
					tracing::debug!(key = %key, "Entry vanished while listing");
				},
				Err(e) => return Err(e),
			}
		}

		Ok(values)
	}
}

fn encode<T: Serialize>(data: &T) -> Result<Vec<u8>, StorageError> {
	serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StorageError> {
	serde_json::from_slice(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
}
