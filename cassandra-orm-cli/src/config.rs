use anyhow::{bail, Context, Result};
use cassandra_orm::metadata_factory::MappingConfig;
use serde::Deserialize;
use std::{collections::BTreeMap, fs, path::Path};

pub const CONFIG_ENV: &str = "CASSANDRA_ORM_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "cassandra-orm.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
	pub connections: BTreeMap<String, ConnectionConfig>,
	#[serde(default)]
	pub orm: OrmConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
	pub hosts: Vec<String>,
	pub keyspace: String,
	#[serde(default)]
	pub user: String,
	#[serde(default)]
	pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrmConfig {
	#[serde(default)]
	pub mappings: BTreeMap<String, MappingConfig>,
	#[serde(default)]
	pub metadata_cache: Option<MetadataCacheConfig>,
	#[serde(default = "default_entity_manager")]
	pub default_entity_manager: String,
	#[serde(default)]
	pub entity_managers: BTreeMap<String, EntityManagerConfig>,
}
impl Default for OrmConfig {
	fn default() -> Self {
		Self {
			mappings: BTreeMap::new(),
			metadata_cache: None,
			default_entity_manager: default_entity_manager(),
			entity_managers: BTreeMap::new(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetadataCacheConfig {
	pub url: String,
	#[serde(default = "default_cache_prefix")]
	pub prefix: String,
	/// Seconds; entries never expire when unset.
	pub ttl: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityManagerConfig {
	pub connection: String,
	#[serde(default)]
	pub dirs: Vec<String>,
}

fn default_entity_manager() -> String {
	"default".to_string()
}

fn default_cache_prefix() -> String {
	"cassandra_orm".to_string()
}

impl Config {
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
		Self::parse(&raw).with_context(|| format!("loading {}", path.display()))
	}

	pub fn parse(raw: &str) -> Result<Self> {
		let config: Config = toml::from_str(raw)?;
		config.validate()?;
		Ok(config)
	}

	fn validate(&self) -> Result<()> {
		if self.connections.is_empty() {
			bail!("`connections` must define at least one connection");
		}
		for (name, connection) in &self.connections {
			if connection.hosts.is_empty() {
				bail!("`connections.{}.hosts` must not be empty", name);
			}
			if connection.keyspace.is_empty() {
				bail!("`connections.{}.keyspace` must not be empty", name);
			}
		}
		for (name, em) in &self.orm.entity_managers {
			if !self.connections.contains_key(&em.connection) {
				bail!("`orm.entity_managers.{}.connection` refers to unknown connection \"{}\"", name, em.connection);
			}
		}
		Ok(())
	}

	/// Configured entity managers, or a single default one on the `default` connection.
	pub fn entity_managers(&self) -> BTreeMap<String, EntityManagerConfig> {
		if !self.orm.entity_managers.is_empty() {
			return self.orm.entity_managers.clone();
		}
		let mut managers = BTreeMap::new();
		managers.insert(
			self.orm.default_entity_manager.clone(),
			EntityManagerConfig { connection: "default".to_string(), dirs: Vec::new() },
		);
		managers
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_full_config() {
		let config = Config::parse(
			r#"
			[connections.default]
			hosts = ["10.0.0.1:9042", "10.0.0.2:9042"]
			keyspace = "app"
			user = "cassandra"
			password = "secret"

			[connections.analytics]
			hosts = ["10.0.1.1"]
			keyspace = "analytics"

			[orm.mappings.App]
			prefix = "app\\entity"

			[orm.metadata_cache]
			url = "redis://127.0.0.1/"
			ttl = 3600

			[orm.entity_managers.default]
			connection = "default"
			dirs = ["crates/app/src/entity"]

			[orm.entity_managers.analytics]
			connection = "analytics"
			"#,
		)
		.unwrap();

		assert_eq!(config.connections["default"].hosts.len(), 2);
		assert_eq!(config.connections["analytics"].user, "");
		assert_eq!(config.orm.mappings["App"].prefix, "app\\entity");
		let cache = config.orm.metadata_cache.as_ref().unwrap();
		assert_eq!(cache.prefix, "cassandra_orm");
		assert_eq!(cache.ttl, Some(3600));

		let managers = config.entity_managers();
		assert_eq!(managers.len(), 2);
		assert_eq!(managers["default"].dirs, vec!["crates/app/src/entity".to_string()]);
		assert!(managers["analytics"].dirs.is_empty());
	}

	#[test]
	fn test_default_entity_manager() {
		let config = Config::parse(
			r#"
			[connections.default]
			hosts = ["127.0.0.1"]
			keyspace = "app"
			"#,
		)
		.unwrap();
		assert!(config.orm.mappings.is_empty());
		assert!(config.orm.metadata_cache.is_none());
		assert_eq!(
			config.entity_managers(),
			BTreeMap::from([(
				"default".to_string(),
				EntityManagerConfig { connection: "default".to_string(), dirs: vec![] }
			)])
		);
	}

	#[test]
	fn test_invalid_configs() {
		let err = Config::parse("connections = {}").unwrap_err();
		assert!(err.to_string().contains("at least one connection"));

		let err = Config::parse(
			r#"
			[connections.default]
			hosts = []
			keyspace = "app"
			"#,
		)
		.unwrap_err();
		assert!(err.to_string().contains("connections.default.hosts"));

		let err = Config::parse(
			r#"
			[connections.default]
			hosts = ["127.0.0.1"]
			keyspace = "app"

			[orm.entity_managers.reports]
			connection = "reporting"
			"#,
		)
		.unwrap_err();
		assert!(err.to_string().contains("orm.entity_managers.reports.connection"));

		assert!(Config::parse("[connections.default]\nkeyspace = \"app\"").is_err());
	}
}
