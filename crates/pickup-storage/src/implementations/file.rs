//! File-based storage backend.
//!
//! Each namespace is a directory under the configured base path and each
//! record is one JSON file in it. Ids are hex-encoded into file names so that
//! phone numbers, emails and UUIDs all map to safe, reversible names. Ids too
//! long for that are stored under their SHA-256 digest, with the raw id kept
//! in a `.id` file next to the record.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use pickup_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError,
};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;

const EXTENSION: &str = "json";
const ID_EXTENSION: &str = "id";
const DIGEST_PREFIX: &str = "sha256-";

/// Longest id stored under its hex encoding; keeps names well below NAME_MAX.
const MAX_PLAIN_ID_LEN: usize = 64;

/// Distinguishes temp files of concurrent writers within one process.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Where a record lives on disk.
struct RecordPath {
	data: PathBuf,
	/// Path and content of the `.id` file for digest-named records.
	id_file: Option<(PathBuf, String)>,
}

/// File-based storage implementation.
pub struct FileStorage {
	/// Base directory path for storing files.
	base_path: PathBuf,
}

impl FileStorage {
	/// Creates a new FileStorage rooted at `base_path`.
	pub fn new(base_path: PathBuf) -> Self {
		Self { base_path }
	}

	/// Splits `namespace:id` and maps it to `<base>/<namespace>/<stem>.json`.
	///
	/// The stem is `hex(id)`, or `sha256-<hex digest>` for long ids.
	fn get_file_path(&self, key: &str) -> Result<RecordPath, StorageError> {
		let (namespace, id) = key
			.split_once(':')
			.ok_or_else(|| StorageError::Backend(format!("Malformed key: {}", key)))?;
		let dir = self.namespace_dir(namespace);

		if id.len() <= MAX_PLAIN_ID_LEN {
			return Ok(RecordPath {
				data: dir.join(format!("{}.{}", hex::encode(id.as_bytes()), EXTENSION)),
				id_file: None,
			});
		}

		let stem = format!("{}{}", DIGEST_PREFIX, hex::encode(Sha256::digest(id.as_bytes())));
		Ok(RecordPath {
			data: dir.join(format!("{}.{}", stem, EXTENSION)),
			id_file: Some((dir.join(format!("{}.{}", stem, ID_EXTENSION)), id.to_string())),
		})
	}

	fn namespace_dir(&self, namespace: &str) -> PathBuf {
		self.base_path.join(namespace)
	}

	/// Creates the namespace directory and, for digest-named records, the `.id` file.
	async fn prepare(record: &RecordPath) -> Result<(), StorageError> {
		if let Some(parent) = record.data.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}
		if let Some((path, id)) = &record.id_file {
			let temp_path = Self::write_temp(path, id.as_bytes()).await?;
			fs::rename(&temp_path, path)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}
		Ok(())
	}

	/// Recovers the id a record file was stored under.
	async fn decode_id(path: &Path) -> Option<String> {
		let stem = path.file_stem()?.to_str()?;
		if stem.starts_with(DIGEST_PREFIX) {
			fs::read_to_string(path.with_extension(ID_EXTENSION)).await.ok()
		} else {
			String::from_utf8(hex::decode(stem).ok()?).ok()
		}
	}

	/// Writes `value` next to `path` under a unique temporary name.
	async fn write_temp(path: &Path, value: &[u8]) -> Result<PathBuf, StorageError> {
		let temp_path = path.with_extension(format!(
			"{}-{}.tmp",
			std::process::id(),
			TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
		));
		fs::write(&temp_path, value)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		Ok(temp_path)
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.get_file_path(key)?.data;

		match fs::read(&path).await {
			Ok(data) => Ok(data),
			Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let record = self.get_file_path(key)?;
		Self::prepare(&record).await?;
		let path = record.data;

		// Write to a temp file then rename so readers never see a partial record.
		let temp_path = Self::write_temp(&path, &value).await?;
		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}

	async fn insert_if_absent(&self, key: &str, value: Vec<u8>) -> Result<bool, StorageError> {
		let record = self.get_file_path(key)?;
		Self::prepare(&record).await?;
		let path = record.data;

		// hard_link fails atomically if the target exists, unlike rename.
		let temp_path = Self::write_temp(&path, &value).await?;
		let linked = fs::hard_link(&temp_path, &path).await;

		if let Err(e) = fs::remove_file(&temp_path).await {
			tracing::warn!("Failed to remove temp file {:?}: {}", temp_path, e);
		}

		match linked {
			Ok(()) => Ok(true),
			Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let record = self.get_file_path(key)?;
		let id_file = record.id_file.map(|(path, _)| path);

		for path in std::iter::once(record.data).chain(id_file) {
			match fs::remove_file(&path).await {
				Ok(_) => {},
				Err(e) if e.kind() == ErrorKind::NotFound => {},
				Err(e) => return Err(StorageError::Backend(e.to_string())),
			}
		}
		Ok(())
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		let path = self.get_file_path(key)?.data;
		fs::try_exists(&path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}

	async fn keys(&self, namespace: &str) -> Result<Vec<String>, StorageError> {
		let dir = self.namespace_dir(namespace);
		let mut entries = match fs::read_dir(&dir).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
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

			match Self::decode_id(&path).await {
				Some(id) => keys.push(format!("{}:{}", namespace, id)),
				None => tracing::debug!("Skipping unrecognised file {:?}", path),
			}
		}

		Ok(keys)
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
						Some(path) if path.trim().is_empty() => {
							Err("storage_path cannot be empty".to_string())
						},
						_ => Ok(()),
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
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or("./data/storage")
		.to_string();

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

/// Registry for the file storage implementation.
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

	#[tokio::test]
	async fn test_round_trip_and_delete() {
		let dir = TempDir::new().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());

		storage
			.set_bytes("orders:abc", b"{\"a\":1}".to_vec())
			.await
			.unwrap();
		assert_eq!(
			storage.get_bytes("orders:abc").await.unwrap(),
			b"{\"a\":1}".to_vec()
		);
		assert!(storage.exists("orders:abc").await.unwrap());

		storage.delete("orders:abc").await.unwrap();
		assert!(!storage.exists("orders:abc").await.unwrap());
		assert!(matches!(
			storage.get_bytes("orders:abc").await,
			Err(StorageError::NotFound)
		));
		// Deleting twice is fine.
		storage.delete("orders:abc").await.unwrap();
	}

	#[tokio::test]
	async fn test_ids_with_path_characters() {
		let dir = TempDir::new().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());

		let key = "users_by_email:../../etc/passwd@example.com";
		storage.set_bytes(key, b"1".to_vec()).await.unwrap();

		let keys = storage.keys("users_by_email").await.unwrap();
		assert_eq!(keys, vec![key.to_string()]);
	}

	#[tokio::test]
	async fn test_insert_if_absent() {
		let dir = TempDir::new().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());

		assert!(storage
			.insert_if_absent("users_by_phone:555", b"first".to_vec())
			.await
			.unwrap());
		assert!(!storage
			.insert_if_absent("users_by_phone:555", b"second".to_vec())
			.await
			.unwrap());
		assert_eq!(
			storage.get_bytes("users_by_phone:555").await.unwrap(),
			b"first".to_vec()
		);

		// No temp files are left behind.
		assert_eq!(storage.keys("users_by_phone").await.unwrap().len(), 1);
		let mut entries = std::fs::read_dir(dir.path().join("users_by_phone")).unwrap();
		assert!(entries.next().is_some());
		assert!(entries.next().is_none());
	}

	#[tokio::test]
	async fn test_long_ids_use_digest_names() {
		let dir = TempDir::new().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());
		let email = format!("{}@example.com", "a".repeat(240));
		let key = format!("users_by_email:{}", email);

		assert!(storage
			.insert_if_absent(&key, b"first".to_vec())
			.await
			.unwrap());
		assert!(!storage
			.insert_if_absent(&key, b"second".to_vec())
			.await
			.unwrap());
		assert_eq!(storage.get_bytes(&key).await.unwrap(), b"first".to_vec());
		assert_eq!(storage.keys("users_by_email").await.unwrap(), vec![key.clone()]);

		for entry in std::fs::read_dir(dir.path().join("users_by_email")).unwrap() {
			let name = entry.unwrap().file_name();
			assert!(name.len() < 100, "{:?}", name);
		}

		storage.delete(&key).await.unwrap();
		assert!(!storage.exists(&key).await.unwrap());
		assert!(std::fs::read_dir(dir.path().join("users_by_email"))
			.unwrap()
			.next()
			.is_none());
	}

	#[tokio::test]
	async fn test_keys_of_missing_namespace() {
		let dir = TempDir::new().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());
		assert!(storage.keys("products").await.unwrap().is_empty());
	}

	#[test]
	fn test_factory_validates_config() {
		let ok: toml::Value = toml::from_str("storage_path = \"/tmp/pickup\"").unwrap();
		assert!(create_storage(&ok).is_ok());

		let blank: toml::Value = toml::from_str("storage_path = \"  \"").unwrap();
		assert!(matches!(
			create_storage(&blank),
			Err(StorageError::Configuration(_))
		));

		let wrong: toml::Value = toml::from_str("storage_path = 42").unwrap();
		assert!(create_storage(&wrong).is_err());
	}
}
