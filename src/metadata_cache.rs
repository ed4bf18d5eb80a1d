pub mod redis;

use crate::entity_meta::EntityMeta;
use anyhow::Result;
use async_trait::async_trait;
use std::{collections::HashMap, time::Duration};
use tokio::sync::RwLock;

/// Second-tier store for class metadata, shared between factory instances.
#[async_trait]
pub trait MetadataCache {
	async fn fetch(&self, key: &str) -> Result<Option<EntityMeta>>;
	async fn save(&self, key: &str, meta: &EntityMeta, ttl: Option<Duration>) -> Result<()>;
}

/// Process-local cache; ignores TTLs.
#[derive(Default)]
pub struct MemoryMetadataCache {
	entries: RwLock<HashMap<String, EntityMeta>>,
}
impl MemoryMetadataCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn keys(&self) -> Vec<String> {
		let mut keys = self.entries.read().await.keys().cloned().collect::<Vec<_>>();
		keys.sort();
		keys
	}
}
#[async_trait]
impl MetadataCache for MemoryMetadataCache {
	async fn fetch(&self, key: &str) -> Result<Option<EntityMeta>> {
		Ok(self.entries.read().await.get(key).cloned())
	}

	async fn save(&self, key: &str, meta: &EntityMeta, _ttl: Option<Duration>) -> Result<()> {
		self.entries.write().await.insert(key.to_string(), meta.clone());
		Ok(())
	}
}
