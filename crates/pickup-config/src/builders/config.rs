//! Configuration builder for creating test and development configurations.
//!
//! This module provides utilities for constructing Config instances with
//! sensible defaults, particularly useful for testing scenarios.

use crate::{
	ApiConfig, Argon2Config, AuthConfig, Config, OrdersConfig, ServiceConfig, StorageConfig,
	TransitionPolicy,
};
use pickup_types::SecretString;
use std::collections::HashMap;

/// Builder for creating `Config` instances with a fluent API.
///
/// Defaults to in-memory storage and cheap password hashing so tests stay fast.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	service_id: String,
	storage_primary: String,
	storage_implementations: HashMap<String, toml::Value>,
	jwt_secret: SecretString,
	session_ttl_days: u32,
	argon2: Argon2Config,
	transition_policy: TransitionPolicy,
	token_length: usize,
	api: Option<ApiConfig>,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	/// Creates a new `ConfigBuilder` with default values suitable for testing.
	pub fn new() -> Self {
		let mut storage_implementations = HashMap::new();
		storage_implementations.insert(
			"memory".to_string(),
			toml::Value::Table(toml::map::Map::new()),
		);

		Self {
			service_id: "pickup-test".to_string(),
			storage_primary: "memory".to_string(),
			storage_implementations,
			jwt_secret: SecretString::from("test-signing-secret-0123456789"),
			session_ttl_days: 7,
			argon2: Argon2Config {
				memory_kib: 64,
				iterations: 1,
				parallelism: 1,
			},
			transition_policy: TransitionPolicy::Linear,
			token_length: 6,
			api: None,
		}
	}

	/// Sets the service ID.
	pub fn service_id(mut self, id: String) -> Self {
		self.service_id = id;
		self
	}

	/// Sets the primary storage implementation and its configuration.
	pub fn storage(mut self, primary: String, config: toml::Value) -> Self {
		self.storage_implementations.insert(primary.clone(), config);
		self.storage_primary = primary;
		self
	}

	/// Sets the session signing key.
	pub fn jwt_secret(mut self, secret: SecretString) -> Self {
		self.jwt_secret = secret;
		self
	}

	/// Sets how many days a session token stays valid.
	pub fn session_ttl_days(mut self, days: u32) -> Self {
		self.session_ttl_days = days;
		self
	}

	/// Sets the password hashing cost parameters.
	pub fn argon2(mut self, argon2: Argon2Config) -> Self {
		self.argon2 = argon2;
		self
	}

	/// Sets the order status transition policy.
	pub fn transition_policy(mut self, policy: TransitionPolicy) -> Self {
		self.transition_policy = policy;
		self
	}

	/// Sets the pickup token length.
	pub fn token_length(mut self, length: usize) -> Self {
		self.token_length = length;
		self
	}

	/// Sets the API configuration.
	pub fn api(mut self, api: Option<ApiConfig>) -> Self {
		self.api = api;
		self
	}

	/// Builds the `Config` with the configured values.
	pub fn build(self) -> Config {
		Config {
			service: ServiceConfig {
				id: self.service_id,
			},
			storage: StorageConfig {
				primary: self.storage_primary,
				implementations: self.storage_implementations,
			},
			auth: AuthConfig {
				jwt_secret: self.jwt_secret,
				session_ttl_days: self.session_ttl_days,
				argon2: self.argon2,
			},
			orders: OrdersConfig {
				transition_policy: self.transition_policy,
				token_length: self.token_length,
			},
			api: self.api,
		}
	}
}
