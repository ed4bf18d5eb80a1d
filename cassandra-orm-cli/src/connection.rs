use crate::config::ConnectionConfig;
use anyhow::Result;
use async_trait::async_trait;
use cassandra_orm::executor::StatementExecutor;
use log::{debug, info};
use scylla::{Session, SessionBuilder};
use tokio::sync::OnceCell;

/// Executes statements on a Cassandra/Scylla cluster, connecting on first use.
pub struct ScyllaExecutor {
	config: ConnectionConfig,
	session: OnceCell<Session>,
}
impl ScyllaExecutor {
	pub fn new(config: ConnectionConfig) -> Self {
		Self { config, session: OnceCell::new() }
	}

	async fn session(&self) -> Result<&Session> {
		self.session
			.get_or_try_init(|| async {
				info!("connecting to {} (keyspace {})", self.config.hosts.join(","), self.config.keyspace);
				let mut builder = SessionBuilder::new().known_nodes(&self.config.hosts);
				if !self.config.user.is_empty() {
					builder = builder.user(&self.config.user, &self.config.password);
				}
				let session = builder.build().await?;
				session.use_keyspace(&self.config.keyspace, false).await?;
				Ok::<_, anyhow::Error>(session)
			})
			.await
	}
}
#[async_trait]
impl StatementExecutor for ScyllaExecutor {
	async fn execute(&self, cql: &str) -> Result<()> {
		let session = self.session().await?;
		let prepared = session.prepare(cql).await?;
		session.execute(&prepared, ()).await?;
		Ok(())
	}

	async fn close(&self) -> Result<()> {
		if self.session.initialized() {
			debug!("releasing session for keyspace {}", self.config.keyspace);
		}
		Ok(())
	}
}
