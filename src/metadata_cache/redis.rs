use super::MetadataCache;
use crate::entity_meta::EntityMeta;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use deadpool_redis::{Config, Connection, Pool, Runtime};
use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};
use redis::AsyncCommands;
use std::{io::Write, time::Duration};

/// Stores metadata as zlib-compressed, base64-encoded JSON under `{prefix}:{key}`.
pub struct RedisMetadataCache {
	pool: Pool,
	prefix: String,
}
impl RedisMetadataCache {
	pub fn new(url: &str, prefix: impl Into<String>) -> Result<Self> {
		let cfg = Config::from_url(url);
		let pool = cfg.create_pool(Some(Runtime::Tokio1)).map_err(|e| anyhow!("redis pool for {}: {}", url, e))?;
		Ok(Self { pool, prefix: prefix.into() })
	}

	async fn get_connection(&self) -> Result<Connection> {
		Ok(self.pool.get().await?)
	}

	fn key(&self, key: &str) -> String {
		format!("{}:{}", self.prefix, key)
	}
}
#[async_trait]
impl MetadataCache for RedisMetadataCache {
	async fn fetch(&self, key: &str) -> Result<Option<EntityMeta>> {
		let mut redis = self.get_connection().await?;
		let payload: Option<String> = redis.get(self.key(key)).await?;
		payload.map(|payload| decode(&payload)).transpose()
	}

	async fn save(&self, key: &str, meta: &EntityMeta, ttl: Option<Duration>) -> Result<()> {
		let payload = encode(meta)?;
		let mut redis = self.get_connection().await?;
		let _: () = match ttl {
			Some(ttl) => redis.set_ex(self.key(key), payload, ttl.as_secs().max(1) as usize).await?,
			None => redis.set(self.key(key), payload).await?,
		};
		Ok(())
	}
}

fn encode(meta: &EntityMeta) -> Result<String> {
	let mut enc = ZlibEncoder::new(Vec::new(), Compression::fast());
	enc.write_all(&serde_json::to_vec(meta)?)?;
	Ok(base64::encode(enc.finish()?))
}

fn decode(payload: &str) -> Result<EntityMeta> {
	let compressed = base64::decode(payload)?;
	Ok(serde_json::from_reader(ZlibDecoder::new(compressed.as_slice()))?)
}
