use crate::{
	entity_meta::EntityMeta, error::Result, executor::StatementExecutor, metadata_factory::MetadataFactory,
	schema_manager::SchemaManager,
};
use log::debug;
use std::sync::Arc;

/// Ties one connection to its metadata factory and schema manager.
pub struct EntityManager {
	connection_name: String,
	executor: Arc<dyn StatementExecutor + Send + Sync>,
	metadata_factory: MetadataFactory,
	schema_manager: SchemaManager,
	targeted_entity_directories: Vec<String>,
}
impl EntityManager {
	pub fn new(
		connection_name: impl Into<String>,
		executor: Arc<dyn StatementExecutor + Send + Sync>,
		metadata_factory: MetadataFactory,
	) -> Self {
		let schema_manager = SchemaManager::new(executor.clone());
		Self {
			connection_name: connection_name.into(),
			executor,
			metadata_factory,
			schema_manager,
			targeted_entity_directories: Vec::new(),
		}
	}

	/// Restricts entity discovery to declarations under these directories.
	pub fn with_entity_directories(mut self, directories: Vec<String>) -> Self {
		self.targeted_entity_directories = directories;
		self
	}

	pub fn connection_name(&self) -> &str {
		&self.connection_name
	}

	pub fn targeted_entity_directories(&self) -> &[String] {
		&self.targeted_entity_directories
	}

	pub fn schema_manager(&self) -> &SchemaManager {
		&self.schema_manager
	}

	pub fn schema_manager_mut(&mut self) -> &mut SchemaManager {
		&mut self.schema_manager
	}

	pub fn metadata_factory_mut(&mut self) -> &mut MetadataFactory {
		&mut self.metadata_factory
	}

	pub async fn get_class_metadata(&mut self, class_name: &str) -> Result<Arc<EntityMeta>> {
		self.metadata_factory.get_metadata_for(class_name).await
	}

	pub async fn close_async(&self) -> Result<()> {
		debug!("closing connection {}", self.connection_name);
		self.executor.close().await?;
		Ok(())
	}
}
