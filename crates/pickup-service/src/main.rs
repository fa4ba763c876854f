//! Main entry point for the pickup ordering service.
//!
//! This binary loads the configuration, wires the storage backend into the
//! engine and serves the HTTP API. A `promote` subcommand grants the admin
//! role to an existing account, which is the only way admins are created.

use clap::{Parser, Subcommand};
use pickup_config::Config;
use pickup_core::{PickupBuilder, PickupEngine, PickupFactories};
use std::path::PathBuf;
use std::sync::Arc;

mod apis;
mod server;

/// Command-line arguments for the pickup service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml", env = "PICKUP_CONFIG")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
	/// Serve the HTTP API (default)
	Serve,
	/// Grant the admin role to the account registered with a phone number
	Promote {
		#[arg(long)]
		phone: String,
	},
}

/// Main entry point for the pickup service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the engine with the configured storage backend
/// 5. Serves the API, or runs a maintenance command, until done
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	let config_path = args
		.config
		.to_str()
		.ok_or("Configuration path is not valid UTF-8")?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let engine = Arc::new(build_engine(config.clone())?);

	match args.command.unwrap_or(Command::Serve) {
		Command::Serve => match config.api.filter(|api| api.enabled) {
			Some(api_config) => {
				server::start_server(api_config, engine).await?;
				tracing::info!("Stopped pickup service");
			},
			None => {
				tracing::warn!("API server is disabled in configuration, nothing to serve");
			},
		},
		Command::Promote { phone } => {
			let user = engine.accounts().promote(&phone).await?;
			tracing::info!(user_id = %user.id, name = %user.name, "Granted admin role");
		},
	}

	Ok(())
}

/// Builds the engine with every registered storage backend.
fn build_engine(config: Config) -> Result<PickupEngine, Box<dyn std::error::Error>> {
	let builder = PickupBuilder::new(config);

	let storage_factories = pickup_storage::get_all_implementations()
		.into_iter()
		.map(|(name, factory)| (name.to_string(), factory))
		.collect();

	Ok(builder.build(PickupFactories { storage_factories })?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use pickup_config::ConfigBuilder;
	use tempfile::tempdir;

	#[test]
	fn test_args_defaults() {
		let args = Args::parse_from(["pickup"]);
		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
		assert_eq!(args.command, None);
	}

	#[test]
	fn test_promote_subcommand() {
		let args = Args::parse_from(["pickup", "-c", "dev.toml", "promote", "--phone", "5550000"]);
		assert_eq!(args.config, PathBuf::from("dev.toml"));
		assert_eq!(
			args.command,
			Some(Command::Promote {
				phone: "5550000".to_string()
			})
		);
	}

	#[tokio::test]
	async fn test_build_engine_with_memory_storage() {
		let config = ConfigBuilder::new().service_id("test-pickup".to_string()).build();
		let engine = build_engine(config).unwrap();
		assert_eq!(engine.config().service.id, "test-pickup");
		assert!(engine.catalog().list_products().await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_build_engine_from_file_config() {
		let dir = tempdir().unwrap();
		let storage_path = dir.path().join("records");
		let config_path = dir.path().join("config.toml");
		std::fs::write(
			&config_path,
			format!(
				r#"
[service]
id = "file-pickup"

[storage]
primary = "file"

[storage.implementations.file]
storage_path = "{}"

[auth]
jwt_secret = "0123456789abcdef0123456789abcdef"

[orders]
transition_policy = "permissive"
"#,
				storage_path.display()
			),
		)
		.unwrap();

		let config = Config::from_file(config_path.to_str().unwrap()).await.unwrap();
		let engine = build_engine(config).unwrap();
		assert_eq!(engine.config().service.id, "file-pickup");
		assert!(engine.config().api.is_none());
		assert!(engine.storage().list::<serde_json::Value>("products").await.unwrap().is_empty());
	}
}
