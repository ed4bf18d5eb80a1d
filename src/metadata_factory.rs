//! Resolves entity class names to cached [`EntityMeta`].
//!
//! Lookups go through two tiers: an in-process map owned by the factory, then an
//! optional [`MetadataCache`] shared across processes. Only on a miss in both is the
//! metadata built from the entity's declaration.
//!
//! The factory assumes a single writer; wrap it in a lock to share it between tasks.

use crate::{
	entity_meta::{EntityMeta, NAMESPACE_SEPARATOR},
	error::{Result, SchemaError},
	metadata_cache::MetadataCache,
	registry::DeclarationSource,
};
use log::debug;
use serde::Deserialize;
use std::{
	collections::{BTreeMap, HashMap},
	sync::Arc,
	time::Duration,
};

/// Suffix appended to class names to build second-tier cache keys.
pub const CACHE_SALT: &str = "$CLASSMETADATA";

/// Separates a namespace alias from a simple class name, as in `App:User`.
pub const ALIAS_SEPARATOR: char = ':';

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MappingConfig {
	pub prefix: String,
}

pub struct MetadataFactory {
	mappings: BTreeMap<String, MappingConfig>,
	source: Arc<dyn DeclarationSource + Send + Sync>,
	cache_driver: Option<Arc<dyn MetadataCache + Send + Sync>>,
	cache_ttl: Option<Duration>,
	loaded_metadata: HashMap<String, Arc<EntityMeta>>,
}
impl MetadataFactory {
	pub fn new(mappings: BTreeMap<String, MappingConfig>, source: Arc<dyn DeclarationSource + Send + Sync>) -> Self {
		Self { mappings, source, cache_driver: None, cache_ttl: None, loaded_metadata: HashMap::new() }
	}

	pub fn set_cache_driver(&mut self, cache_driver: Option<Arc<dyn MetadataCache + Send + Sync>>) {
		self.cache_driver = cache_driver;
	}

	pub fn cache_driver(&self) -> Option<&Arc<dyn MetadataCache + Send + Sync>> {
		self.cache_driver.as_ref()
	}

	/// Lifetime of entries written to the cache driver; `None` keeps them forever.
	pub fn set_cache_ttl(&mut self, ttl: Option<Duration>) {
		self.cache_ttl = ttl;
	}

	pub fn get_loaded_metadata(&self) -> &HashMap<String, Arc<EntityMeta>> {
		&self.loaded_metadata
	}

	/// Only checks the in-process tier.
	pub fn has_metadata_for(&self, class_name: &str) -> bool {
		self.loaded_metadata.contains_key(class_name)
	}

	/// Replaces the in-process entry for `class_name`; the cache driver is left alone.
	pub fn set_metadata_for(&mut self, class_name: impl Into<String>, meta: impl Into<Arc<EntityMeta>>) {
		self.loaded_metadata.insert(class_name.into(), meta.into());
	}

	pub async fn get_metadata_for(&mut self, class_name: &str) -> Result<Arc<EntityMeta>> {
		if let Some(meta) = self.loaded_metadata.get(class_name) {
			return Ok(meta.clone());
		}

		let real_class_name = match class_name.split_once(ALIAS_SEPARATOR) {
			Some((alias, simple_class_name)) => self.fqcn_from_alias(alias, simple_class_name)?,
			None => self.source.real_class_name(class_name),
		};

		let meta = match self.loaded_metadata.get(&real_class_name) {
			Some(meta) => meta.clone(),
			None => self.load_through_cache(&real_class_name).await?,
		};

		if class_name != real_class_name {
			self.loaded_metadata.insert(class_name.to_string(), meta.clone());
		}

		Ok(meta)
	}

	async fn load_through_cache(&mut self, class_name: &str) -> Result<Arc<EntityMeta>> {
		let cache_driver = match &self.cache_driver {
			Some(cache_driver) => cache_driver.clone(),
			None => return self.load_metadata(class_name),
		};

		let key = format!("{}{}", class_name, CACHE_SALT);
		if let Some(cached) = cache_driver.fetch(&key).await? {
			debug!("metadata cache hit for {}", class_name);
			let meta = Arc::new(cached);
			self.loaded_metadata.insert(class_name.to_string(), meta.clone());
			return Ok(meta);
		}

		debug!("metadata cache miss for {}", class_name);
		let meta = self.load_metadata(class_name)?;
		cache_driver.save(&key, &meta, self.cache_ttl).await?;
		Ok(meta)
	}

	fn load_metadata(&mut self, class_name: &str) -> Result<Arc<EntityMeta>> {
		let declaration =
			self.source.declaration(class_name).ok_or_else(|| SchemaError::MetadataNotFound(class_name.to_string()))?;
		let meta = Arc::new(EntityMeta::from_declaration(class_name, declaration));
		debug!("loaded metadata for {} ({} fields)", class_name, meta.field_mappings.len());
		self.loaded_metadata.insert(class_name.to_string(), meta.clone());
		Ok(meta)
	}

	/// Without any configured mapping, `Alias:Name` resolves to `Alias\Entity\Name`.
	fn fqcn_from_alias(&self, alias: &str, simple_class_name: &str) -> Result<String> {
		if self.mappings.is_empty() {
			return Ok(format!(
				"{alias}{sep}Entity{sep}{name}",
				alias = alias,
				sep = NAMESPACE_SEPARATOR,
				name = simple_class_name
			));
		}

		self.mappings
			.get(alias)
			.map(|config| format!("{}{}{}", config.prefix, NAMESPACE_SEPARATOR, simple_class_name))
			.ok_or_else(|| SchemaError::UnknownAlias(alias.to_string()))
	}
}
