//! Multi-file configuration loading.
//!
//! A configuration file may pull in other files with a top-level
//! `include = "file.toml"` or `include = ["a.toml", "b.toml"]`. Included files
//! may include further files; paths are relative to the including file.
//! Each top-level section may be defined in exactly one file.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Loads a configuration file together with everything it includes.
pub struct ConfigLoader {
	/// Directory the root file is resolved against.
	base_path: PathBuf,
	/// Canonical paths already read, for cycle detection.
	visited: HashSet<PathBuf>,
	/// File each top-level section was read from.
	section_sources: HashMap<String, PathBuf>,
}

impl ConfigLoader {
	pub fn new(base_path: impl AsRef<Path>) -> Self {
		Self {
			base_path: base_path.as_ref().to_path_buf(),
			visited: HashSet::new(),
			section_sources: HashMap::new(),
		}
	}

	/// Loads `config_path` and its includes, merges their sections and
	/// validates the result.
	pub async fn load_config(
		&mut self,
		config_path: impl AsRef<Path>,
	) -> Result<Config, ConfigError> {
		let root = resolve_path(&self.base_path, config_path.as_ref())?;

		let mut merged = toml::Table::new();
		let mut pending = vec![root];

		while let Some(file) = pending.pop() {
			let mut table = self.read_table(&file).await?;
			let includes = take_includes(&mut table)?;

			for (section, value) in table {
				self.claim_section(&section, &file)?;
				merged.insert(section, value);
			}

			let dir = file.parent().unwrap_or(self.base_path.as_path()).to_path_buf();
			// Reversed so includes are read in the order they are listed.
			for include in includes.iter().rev() {
				pending.push(resolve_path(&dir, include)?);
			}
		}

		let rendered = toml::to_string(&merged)
			.map_err(|e| ConfigError::Parse(format!("Failed to render merged config: {}", e)))?;
		rendered.parse()
	}

	/// Reads one file, resolving `${VAR}` references before parsing.
	async fn read_table(&mut self, path: &Path) -> Result<toml::Table, ConfigError> {
		let canonical = tokio::fs::canonicalize(path).await?;
		if !self.visited.insert(canonical.clone()) {
			return Err(ConfigError::Validation(format!(
				"Circular include: {} was already loaded",
				canonical.display()
			)));
		}

		let content = tokio::fs::read_to_string(&canonical).await?;
		Ok(toml::from_str(&resolve_env_vars(&content)?)?)
	}

	fn claim_section(&mut self, section: &str, file: &Path) -> Result<(), ConfigError> {
		if let Some(previous) = self.section_sources.get(section) {
			return Err(ConfigError::Validation(format!(
				"Duplicate section '{}' in {} and {}",
				section,
				previous.display(),
				file.display()
			)));
		}
		self.section_sources
			.insert(section.to_string(), file.to_path_buf());
		Ok(())
	}
}

/// Removes the `include` key from a table and returns the listed paths.
fn take_includes(table: &mut toml::Table) -> Result<Vec<PathBuf>, ConfigError> {
	match table.remove("include") {
		None => Ok(Vec::new()),
		Some(toml::Value::String(path)) => Ok(vec![PathBuf::from(path)]),
		Some(toml::Value::Array(items)) => items
			.iter()
			.map(|item| {
				item.as_str().map(PathBuf::from).ok_or_else(|| {
					ConfigError::Validation("include entries must be strings".into())
				})
			})
			.collect(),
		Some(_) => Err(ConfigError::Validation(
			"include must be a string or an array of strings".into(),
		)),
	}
}

fn resolve_path(dir: &Path, path: &Path) -> Result<PathBuf, ConfigError> {
	let resolved = if path.is_absolute() {
		path.to_path_buf()
	} else {
		dir.join(path)
	};

	if !resolved.is_file() {
		return Err(ConfigError::Io(std::io::Error::new(
			std::io::ErrorKind::NotFound,
			format!("Configuration file not found: {}", resolved.display()),
		)));
	}

	Ok(resolved)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use tempfile::TempDir;

	#[tokio::test]
	async fn test_single_file_config() {
		let temp_dir = TempDir::new().unwrap();
		let config_path = temp_dir.path().join("config.toml");

		let config_content = r#"
[service]
id = "pickup-single"

[storage]
primary = "file"
[storage.implementations.file]
storage_path = "./data/storage"

[auth]
jwt_secret = "0123456789abcdef0123456789abcdef"
session_ttl_days = 3

[api]
enabled = true
port = 8080
"#;

		fs::write(&config_path, config_content).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let config = loader.load_config(&config_path).await.unwrap();

		assert_eq!(config.service.id, "pickup-single");
		assert_eq!(config.storage.primary, "file");
		assert_eq!(config.auth.session_ttl_days, 3);
		assert_eq!(config.api.unwrap().port, 8080);
	}

	#[tokio::test]
	async fn test_config_with_includes() {
		let temp_dir = TempDir::new().unwrap();

		let main_config = r#"
include = ["storage.toml", "auth.toml"]

[service]
id = "pickup-split"
"#;

		let storage_config = r#"
[storage]
primary = "memory"
[storage.implementations.memory]
"#;

		let auth_config = r#"
[auth]
jwt_secret = "0123456789abcdef0123456789abcdef"

[orders]
transition_policy = "permissive"
"#;

		fs::write(temp_dir.path().join("main.toml"), main_config).unwrap();
		fs::write(temp_dir.path().join("storage.toml"), storage_config).unwrap();
		fs::write(temp_dir.path().join("auth.toml"), auth_config).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let config = loader.load_config("main.toml").await.unwrap();

		assert_eq!(config.service.id, "pickup-split");
		assert_eq!(config.storage.primary, "memory");
		assert_eq!(
			config.orders.transition_policy,
			crate::TransitionPolicy::Permissive
		);
	}

	#[tokio::test]
	async fn test_duplicate_section_error() {
		let temp_dir = TempDir::new().unwrap();

		let main_config = r#"
include = ["duplicate.toml"]

[service]
id = "pickup-a"
"#;

		let duplicate_config = r#"
[service]
id = "pickup-b"
"#;

		fs::write(temp_dir.path().join("main.toml"), main_config).unwrap();
		fs::write(temp_dir.path().join("duplicate.toml"), duplicate_config).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let result = loader.load_config("main.toml").await;

		assert!(result.is_err());
		let error_msg = result.unwrap_err().to_string();
		assert!(error_msg.contains("Duplicate section 'service'"));
	}

	#[tokio::test]
	async fn test_self_include_detection() {
		let temp_dir = TempDir::new().unwrap();

		let config = r#"
include = ["self.toml"]

[service]
id = "pickup-loop"
"#;

		fs::write(temp_dir.path().join("self.toml"), config).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let result = loader.load_config("self.toml").await;

		assert!(result.is_err());
		let error_msg = result.unwrap_err().to_string();
		assert!(error_msg.contains("already loaded"));
	}

	#[tokio::test]
	async fn test_nested_include_relative_to_including_file() {
		let temp_dir = TempDir::new().unwrap();
		fs::create_dir(temp_dir.path().join("parts")).unwrap();

		fs::write(
			temp_dir.path().join("main.toml"),
			"include = \"parts/storage.toml\"\n[service]\nid = \"pickup-nested\"\n",
		)
		.unwrap();
		fs::write(
			temp_dir.path().join("parts/storage.toml"),
			"include = [\"auth.toml\"]\n[storage]\nprimary = \"memory\"\n[storage.implementations.memory]\n",
		)
		.unwrap();
		fs::write(
			temp_dir.path().join("parts/auth.toml"),
			"[auth]\njwt_secret = \"0123456789abcdef0123456789abcdef\"\n",
		)
		.unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let config = loader.load_config("main.toml").await.unwrap();

		assert_eq!(config.service.id, "pickup-nested");
		assert_eq!(config.storage.primary, "memory");
	}

	#[tokio::test]
	async fn test_include_cycle_detection() {
		let temp_dir = TempDir::new().unwrap();
		fs::write(
			temp_dir.path().join("a.toml"),
			"include = \"b.toml\"\n[service]\nid = \"a\"\n",
		)
		.unwrap();
		fs::write(
			temp_dir.path().join("b.toml"),
			"include = \"a.toml\"\n[storage]\nprimary = \"memory\"\n",
		)
		.unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let err = loader.load_config("a.toml").await.unwrap_err();
		assert!(err.to_string().contains("Circular include"));
	}

	#[tokio::test]
	async fn test_missing_include() {
		let temp_dir = TempDir::new().unwrap();
		fs::write(
			temp_dir.path().join("main.toml"),
			"include = \"nowhere.toml\"\n[service]\nid = \"x\"\n",
		)
		.unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let result = loader.load_config("main.toml").await;
		assert!(matches!(result, Err(ConfigError::Io(_))));
	}
}
