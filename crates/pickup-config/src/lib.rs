//! Configuration module for the pickup ordering service.
//!
//! This module provides structures and utilities for managing service configuration.
//! It supports loading configuration from TOML files and provides validation to ensure
//! all required configuration values are properly set.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files for better organization:
//! - Use `include = ["file1.toml", "file2.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)

pub mod builders;
mod loader;

pub use builders::config::ConfigBuilder;

use pickup_types::SecretString;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		let message = err.message().to_string();
		ConfigError::Parse(message)
	}
}

/// Main configuration structure for the pickup service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity of this service instance.
	pub service: ServiceConfig,
	/// Configuration for the storage backend.
	pub storage: StorageConfig,
	/// Password hashing and session token settings.
	pub auth: AuthConfig,
	/// Order workflow settings.
	#[serde(default)]
	pub orders: OrdersConfig,
	/// Configuration for the HTTP API server.
	pub api: Option<ApiConfig>,
}

/// Configuration specific to the service instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	/// Identifier used in logs.
	pub id: String,
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Credential and session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
	/// Key used to sign session tokens.
	pub jwt_secret: SecretString,
	/// How long an issued session token stays valid.
	#[serde(default = "default_session_ttl_days")]
	pub session_ttl_days: u32,
	/// Cost parameters for password hashing.
	#[serde(default)]
	pub argon2: Argon2Config,
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Argon2Config {
	/// Memory size in KiB.
	#[serde(default = "default_argon2_memory_kib")]
	pub memory_kib: u32,
	/// Number of passes.
	#[serde(default = "default_argon2_iterations")]
	pub iterations: u32,
	/// Degree of parallelism.
	#[serde(default = "default_argon2_parallelism")]
	pub parallelism: u32,
}

impl Default for Argon2Config {
	fn default() -> Self {
		Self {
			memory_kib: default_argon2_memory_kib(),
			iterations: default_argon2_iterations(),
			parallelism: default_argon2_parallelism(),
		}
	}
}

/// Which status changes an administrator may apply to an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
	/// Orders only move one step forward: pending, preparing, ready, completed.
	#[default]
	Linear,
	/// Any known status may be set regardless of the current one.
	Permissive,
}

/// Order workflow configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrdersConfig {
	/// Policy applied to status updates.
	#[serde(default)]
	pub transition_policy: TransitionPolicy,
	/// Number of characters in a pickup token.
	#[serde(default = "default_token_length")]
	pub token_length: usize,
}

impl Default for OrdersConfig {
	fn default() -> Self {
		Self {
			transition_policy: TransitionPolicy::default(),
			token_length: default_token_length(),
		}
	}
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server is enabled.
	#[serde(default)]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Maximum request size in bytes.
	#[serde(default = "default_max_request_size")]
	pub max_request_size: usize,
	/// Include internal error details in error responses.
	///
	/// Meant for development only.
	#[serde(default)]
	pub expose_error_details: bool,
	/// CORS configuration.
	pub cors: Option<CorsConfig>,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
	/// Allowed origins for CORS.
	pub allowed_origins: Vec<String>,
	/// Allowed headers for CORS.
	pub allowed_headers: Vec<String>,
	/// Allowed methods for CORS.
	pub allowed_methods: Vec<String>,
}

fn default_session_ttl_days() -> u32 {
	7
}

fn default_argon2_memory_kib() -> u32 {
	19 * 1024
}

fn default_argon2_iterations() -> u32 {
	2
}

fn default_argon2_parallelism() -> u32 {
	1
}

fn default_token_length() -> usize {
	6
}

/// Returns the default API host.
fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

/// Returns the default API port.
///
/// The storefront client expects the API on port 5000.
fn default_api_port() -> u16 {
	5000
}

/// Returns the default maximum request size in bytes.
fn default_max_request_size() -> usize {
	1024 * 1024 // 1MB
}

/// Shortest accepted signing key, in bytes.
const MIN_SECRET_LEN: usize = 16;

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024; // 1MB
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)));
				},
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply replacements in reverse order to maintain positions
	let mut result = input.to_string();
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

impl Config {
	/// Loads configuration from a file with async environment variable resolution.
	///
	/// This method supports modular configuration through include directives:
	/// - `include = ["file1.toml", "file2.toml"]` - Include specific files
	///
	/// Each top-level section must be unique across all configuration files.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Validates the configuration to ensure all required fields are properly set.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.service.id.trim().is_empty() {
			return Err(ConfigError::Validation("Service ID cannot be empty".into()));
		}

		// Validate storage config
		if self.storage.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one storage implementation must be configured".into(),
			));
		}
		if self.storage.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Storage primary implementation cannot be empty".into(),
			));
		}
		if !self
			.storage
			.implementations
			.contains_key(&self.storage.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary storage '{}' not found in implementations",
				self.storage.primary
			)));
		}

		// Validate auth config
		if self.auth.jwt_secret.len() < MIN_SECRET_LEN {
			return Err(ConfigError::Validation(format!(
				"auth.jwt_secret must be at least {} bytes",
				MIN_SECRET_LEN
			)));
		}
		if self.auth.session_ttl_days == 0 || self.auth.session_ttl_days > 365 {
			return Err(ConfigError::Validation(
				"auth.session_ttl_days must be between 1 and 365".into(),
			));
		}
		let argon2 = &self.auth.argon2;
		if argon2.iterations == 0 || argon2.parallelism == 0 {
			return Err(ConfigError::Validation(
				"auth.argon2 iterations and parallelism must be at least 1".into(),
			));
		}
		if argon2
			.parallelism
			.checked_mul(8)
			.is_none_or(|minimum| argon2.memory_kib < minimum)
		{
			return Err(ConfigError::Validation(
				"auth.argon2.memory_kib must be at least 8 times the parallelism".into(),
			));
		}

		// Validate order config
		if !(4..=16).contains(&self.orders.token_length) {
			return Err(ConfigError::Validation(
				"orders.token_length must be between 4 and 16".into(),
			));
		}

		// Validate API config if enabled
		if let Some(ref api) = self.api {
			if api.enabled && api.port == 0 {
				return Err(ConfigError::Validation(
					"API port must be non-zero when the API is enabled".into(),
				));
			}
		}

		Ok(())
	}
}

/// Implementation of FromStr trait for Config to enable parsing from string.
///
/// Environment variables are resolved and the configuration is automatically
/// validated after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const BASE: &str = r#"
[service]
id = "pickup-test"

[storage]
primary = "memory"
[storage.implementations.memory]

[auth]
jwt_secret = "0123456789abcdef0123456789abcdef"
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("PICKUP_TEST_HOST", "localhost");
		std::env::set_var("PICKUP_TEST_PORT", "5432");

		let input = "host = \"${PICKUP_TEST_HOST}:${PICKUP_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "host = \"localhost:5432\"");

		std::env::remove_var("PICKUP_TEST_HOST");
		std::env::remove_var("PICKUP_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${PICKUP_MISSING_VAR:-default_value}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"default_value\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let input = "value = \"${PICKUP_MISSING_VAR}\"";
		let result = resolve_env_vars(input);
		assert!(result.is_err());
		assert!(result.unwrap_err().to_string().contains("PICKUP_MISSING_VAR"));
	}

	#[test]
	fn test_defaults_applied() {
		let config: Config = BASE.parse().unwrap();

		assert_eq!(config.service.id, "pickup-test");
		assert_eq!(config.auth.session_ttl_days, 7);
		assert_eq!(config.orders.transition_policy, TransitionPolicy::Linear);
		assert_eq!(config.orders.token_length, 6);
		assert!(config.api.is_none());
	}

	#[test]
	fn test_secret_from_env_is_redacted() {
		std::env::set_var("PICKUP_TEST_JWT_SECRET", "a-very-long-signing-secret-value");

		let config_str = BASE.replace(
			"0123456789abcdef0123456789abcdef",
			"${PICKUP_TEST_JWT_SECRET}",
		);
		let config: Config = config_str.parse().unwrap();
		assert_eq!(
			config.auth.jwt_secret.expose_secret(),
			"a-very-long-signing-secret-value"
		);
		assert!(!format!("{:?}", config).contains("a-very-long-signing-secret-value"));

		std::env::remove_var("PICKUP_TEST_JWT_SECRET");
	}

	#[test]
	fn test_permissive_policy_parses() {
		let config_str = format!(
			"{}\n[orders]\ntransition_policy = \"permissive\"\ntoken_length = 8\n",
			BASE
		);
		let config: Config = config_str.parse().unwrap();
		assert_eq!(config.orders.transition_policy, TransitionPolicy::Permissive);
		assert_eq!(config.orders.token_length, 8);
	}

	#[test]
	fn test_short_secret_rejected() {
		let config_str = BASE.replace("0123456789abcdef0123456789abcdef", "short");
		let err = Config::from_str(&config_str).unwrap_err();
		assert!(err.to_string().contains("jwt_secret"));
	}

	#[test]
	fn test_unknown_primary_storage_rejected() {
		let config_str = BASE.replace("primary = \"memory\"", "primary = \"file\"");
		let err = Config::from_str(&config_str).unwrap_err();
		assert!(err
			.to_string()
			.contains("Primary storage 'file' not found in implementations"));
	}

	#[test]
	fn test_token_length_bounds() {
		let config_str = format!("{}\n[orders]\ntoken_length = 2\n", BASE);
		assert!(Config::from_str(&config_str).is_err());
	}

	#[test]
	fn test_argon2_parallelism_bounds() {
		let config_str = format!(
			"{}
[auth.argon2]
memory_kib = 65536
parallelism = 4000000000
",
			BASE
		);
		let err = Config::from_str(&config_str).unwrap_err();
		assert!(err.to_string().contains("memory_kib"));

		let config_str = format!(
			"{}
[auth.argon2]
memory_kib = 16
parallelism = 2
",
			BASE
		);
		assert!(Config::from_str(&config_str).is_ok());
	}

	#[test]
	fn test_unknown_policy_rejected() {
		let config_str = format!("{}\n[orders]\ntransition_policy = \"chaotic\"\n", BASE);
		assert!(matches!(
			Config::from_str(&config_str),
			Err(ConfigError::Parse(_))
		));
	}

	#[test]
	fn test_sample_config_parses() {
		let config: Config = include_str!("../../../config/pickup.toml").parse().unwrap();

		assert_eq!(config.storage.primary, "file");
		assert_eq!(config.orders.transition_policy, TransitionPolicy::Linear);
		let api = config.api.unwrap();
		assert!(api.enabled);
		assert_eq!(api.port, 5000);
		assert_eq!(api.cors.unwrap().allowed_origins.len(), 1);
	}
}
