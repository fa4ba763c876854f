//! Builder pattern for constructing the pickup engine.
//!
//! Storage backends are pluggable: the builder looks up a factory for every
//! configured implementation, creates them, and hands the primary one to the
//! engine.

use crate::PickupEngine;
use pickup_config::Config;
use pickup_storage::{StorageError, StorageInterface, StorageService};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Container for the factory functions needed to build a PickupEngine.
pub struct PickupFactories<SF> {
	pub storage_factories: HashMap<String, SF>,
}

/// Builder for constructing a PickupEngine with pluggable storage.
pub struct PickupBuilder {
	config: Config,
}

impl PickupBuilder {
	/// Creates a new PickupBuilder with the given configuration.
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the storage service from the primary configured implementation.
	pub fn build_storage<SF>(
		&self,
		factories: &PickupFactories<SF>,
	) -> Result<Arc<StorageService>, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
	{
		let mut storage_impls = HashMap::new();
		for (name, config) in &self.config.storage.implementations {
			let Some(factory) = factories.storage_factories.get(name) else {
				tracing::warn!(
					component = "storage",
					implementation = %name,
					"No factory registered, skipping"
				);
				continue;
			};

			match factory(config) {
				Ok(implementation) => {
					storage_impls.insert(name.clone(), implementation);
					let is_primary = &self.config.storage.primary == name;
					tracing::info!(component = "storage", implementation = %name, enabled = %is_primary, "Loaded");
				},
				Err(e) => {
					tracing::error!(
						component = "storage",
						implementation = %name,
						error = %e,
						"Failed to create storage implementation"
					);
					return Err(BuilderError::Config(format!(
						"Failed to create storage implementation '{}': {}",
						name, e
					)));
				},
			}
		}

		if storage_impls.is_empty() {
			return Err(BuilderError::MissingComponent(
				"No valid storage implementations available".into(),
			));
		}

		let primary_storage = &self.config.storage.primary;
		let storage_backend = storage_impls.remove(primary_storage).ok_or_else(|| {
			BuilderError::Config(format!(
				"Primary storage '{}' failed to load or has invalid configuration",
				primary_storage
			))
		})?;

		Ok(Arc::new(StorageService::new(storage_backend)))
	}

	/// Builds the PickupEngine using the given factories.
	pub fn build<SF>(self, factories: PickupFactories<SF>) -> Result<PickupEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
	{
		let storage = self.build_storage(&factories)?;
		PickupEngine::new(self.config, storage).map_err(|e| BuilderError::Config(e.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pickup_config::ConfigBuilder;
	use pickup_storage::StorageFactory;

	fn factories() -> PickupFactories<StorageFactory> {
		PickupFactories {
			storage_factories: pickup_storage::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
		}
	}

	#[test]
	fn test_build_with_memory_storage() {
		let engine = PickupBuilder::new(ConfigBuilder::new().build())
			.build(factories())
			.unwrap();
		assert_eq!(engine.config().storage.primary, "memory");
	}

	#[test]
	fn test_missing_factory() {
		let config = ConfigBuilder::new()
			.storage("redis".into(), toml::Value::Table(toml::map::Map::new()))
			.build();
		let result = PickupBuilder::new(config).build(factories());
		assert!(matches!(result, Err(BuilderError::Config(_))));
	}

	#[test]
	fn test_no_factories() {
		let empty: PickupFactories<StorageFactory> = PickupFactories {
			storage_factories: HashMap::new(),
		};
		let result = PickupBuilder::new(ConfigBuilder::new().build()).build(empty);
		assert!(matches!(result, Err(BuilderError::MissingComponent(_))));
	}

	#[test]
	fn test_bad_backend_config() {
		let config = ConfigBuilder::new()
			.storage("file".into(), toml::Value::Integer(1))
			.build();
		let result = PickupBuilder::new(config).build(factories());
		assert!(matches!(result, Err(BuilderError::Config(_))));
	}
}
