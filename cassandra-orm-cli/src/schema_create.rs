use crate::{
	config::{Config, ConnectionConfig},
	connection::ScyllaExecutor,
};
use anyhow::{anyhow, Result};
use cassandra_orm::{
	entity_manager::EntityManager,
	executor::StatementExecutor,
	metadata_cache::{redis::RedisMetadataCache, MetadataCache},
	metadata_factory::MetadataFactory,
	schema_create::SchemaCreate,
	EntityRegistry,
};
use std::{collections::HashMap, sync::Arc, time::Duration};

type Executor = Arc<dyn StatementExecutor + Send + Sync>;

pub async fn schema_create(entities: &EntityRegistry, config: &Config, name: &str, dump_cql: bool) -> Result<()> {
	let mut tool = build_schema_create(entities, config, |connection| Arc::new(ScyllaExecutor::new(connection.clone())))?;
	let outputs = tool.execute(name, dump_cql).await?;

	if dump_cql {
		println!("CQL schema dump for connection {}", name);
		println!("#######");
		println!("{}", outputs.join("\n"));
	} else {
		println!("Cassandra schema updated successfully!");
	}

	Ok(())
}

/// Wires one entity manager per configured name; managers on the same connection share an executor.
pub fn build_schema_create(
	entities: &EntityRegistry,
	config: &Config,
	connect: impl Fn(&ConnectionConfig) -> Executor,
) -> Result<SchemaCreate> {
	let registry = Arc::new(entities.clone());

	let cache: Option<Arc<dyn MetadataCache + Send + Sync>> = match &config.orm.metadata_cache {
		Some(cache) => Some(Arc::new(RedisMetadataCache::new(&cache.url, cache.prefix.clone())?)),
		None => None,
	};
	let cache_ttl = config.orm.metadata_cache.as_ref().and_then(|cache| cache.ttl).map(Duration::from_secs);

	let mut executors: HashMap<String, Executor> = HashMap::new();
	let mut tool = SchemaCreate::new(registry.clone());
	for (name, em) in config.entity_managers() {
		let connection = config
			.connections
			.get(&em.connection)
			.ok_or_else(|| anyhow!("entity manager \"{}\" uses unknown connection \"{}\"", name, em.connection))?;
		let executor = executors.entry(em.connection.clone()).or_insert_with(|| connect(connection)).clone();

		let factory = MetadataFactory::new(config.orm.mappings.clone(), registry.clone());
		let mut manager = EntityManager::new(em.connection, executor, factory).with_entity_directories(em.dirs);
		manager.metadata_factory_mut().set_cache_driver(cache.clone());
		manager.metadata_factory_mut().set_cache_ttl(cache_ttl);

		tool.add_entity_manager(name, manager);
	}

	Ok(tool)
}

#[cfg(test)]
mod tests {
	use super::*;
	use cassandra_orm::{
		entity_meta::{ColumnDeclaration, EntityDeclaration, TableDeclaration},
		executor::MemoryExecutor,
	};
	use std::sync::Mutex;

	fn entities() -> EntityRegistry {
		EntityRegistry::new(vec![
			EntityDeclaration::new("app::entity", "Account", "app/src/entity.rs")
				.with_table(TableDeclaration::default())
				.with_field("id", Some(ColumnDeclaration::new("id", "uuid"))),
			EntityDeclaration::new("app::report", "DailyTotal", "app/src/report/daily_total.rs")
				.with_table(TableDeclaration::default())
				.with_field("id", Some(ColumnDeclaration::new("id", "date"))),
		])
	}

	#[tokio::test]
	async fn test_build_and_execute() {
		let config = Config::parse(
			r#"
			[connections.default]
			hosts = ["127.0.0.1"]
			keyspace = "app"

			[connections.reports]
			hosts = ["127.0.0.2"]
			keyspace = "reports"

			[orm.entity_managers.default]
			connection = "default"

			[orm.entity_managers.reports]
			connection = "reports"
			dirs = ["src/report"]
			"#,
		)
		.unwrap();

		let executors: Mutex<Vec<(String, Arc<MemoryExecutor>)>> = Mutex::new(Vec::new());
		let mut tool = build_schema_create(&entities(), &config, |connection| {
			let executor = Arc::new(MemoryExecutor::new());
			executors.lock().unwrap().push((connection.keyspace.clone(), executor.clone()));
			executor
		})
		.unwrap();
		assert_eq!(executors.lock().unwrap().len(), 2);

		let outputs = tool.execute("reports", false).await.unwrap();
		assert_eq!(outputs, vec!["DROP TABLE IF EXISTS daily_total;", "CREATE TABLE daily_total (id date,PRIMARY KEY (id));"]);

		let dumped = tool.execute("default", true).await.unwrap();
		assert_eq!(dumped, vec!["DROP TABLE IF EXISTS account;", "CREATE TABLE account (id uuid,PRIMARY KEY (id));"]);

		let executors = executors.lock().unwrap();
		for (keyspace, executor) in executors.iter() {
			let statements = executor.statements().await;
			match keyspace.as_str() {
				"reports" => assert_eq!(statements.len(), 2),
				_ => assert!(statements.is_empty()),
			}
			assert!(executor.is_closed());
		}
	}

	#[test]
	fn test_shared_connection_shares_executor() {
		let config = Config::parse(
			r#"
			[connections.default]
			hosts = ["127.0.0.1"]
			keyspace = "app"

			[orm.entity_managers.one]
			connection = "default"

			[orm.entity_managers.two]
			connection = "default"
			"#,
		)
		.unwrap();
		let connects = std::cell::Cell::new(0);
		let tool = build_schema_create(&entities(), &config, |_| {
			connects.set(connects.get() + 1);
			Arc::new(MemoryExecutor::new())
		})
		.unwrap();
		assert_eq!(connects.get(), 1);
		assert_eq!(tool.entity_manager("one").unwrap().connection_name(), "default");
		assert_eq!(tool.entity_manager("two").unwrap().connection_name(), "default");
		assert!(tool.entity_manager("default").is_none());
	}
}
