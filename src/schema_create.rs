use crate::{
	entity_manager::EntityManager,
	error::{Result, SchemaError},
	registry::EntityRegistry,
};
use log::{debug, info, warn};
use std::{collections::HashMap, sync::Arc};

/// Drops and recreates the table of every discovered entity.
pub struct SchemaCreate {
	entity_managers: HashMap<String, EntityManager>,
	registry: Arc<EntityRegistry>,
}
impl SchemaCreate {
	pub fn new(registry: Arc<EntityRegistry>) -> Self {
		Self { entity_managers: HashMap::new(), registry }
	}

	pub fn add_entity_manager(&mut self, name: impl Into<String>, entity_manager: EntityManager) {
		self.entity_managers.insert(name.into(), entity_manager);
	}

	pub fn entity_manager(&self, name: &str) -> Option<&EntityManager> {
		self.entity_managers.get(name)
	}

	/// Returns every rendered statement in the order it was produced.
	pub async fn execute(&mut self, name: &str, dump_cql: bool) -> Result<Vec<String>> {
		let em = self.entity_managers.get_mut(name).ok_or_else(|| SchemaError::UnknownEntityManager(name.to_string()))?;
		em.schema_manager_mut().force_dump_cql(dump_cql);

		let result = Self::create_all(em, &self.registry).await;
		match em.close_async().await {
			Err(e) if result.is_err() => warn!("closing {} after a failed run: {}", name, e),
			closed => closed?,
		}
		result
	}

	async fn create_all(em: &mut EntityManager, registry: &EntityRegistry) -> Result<Vec<String>> {
		let directories = em.targeted_entity_directories().to_vec();
		let mut outputs = Vec::new();

		for declaration in registry.declarations() {
			if !is_entity_source(&declaration.source_file, &directories) {
				continue;
			}

			let class_name = declaration.canonical_name();
			let meta = em.get_class_metadata(&class_name).await?;
			let table = match meta.table_name() {
				Some(table) => table,
				None => {
					debug!("{} has no table, skipping", class_name);
					continue;
				},
			};

			info!("creating table {} for {} on {}", table, class_name, em.connection_name());
			let schema_manager = em.schema_manager();
			outputs.push(schema_manager.drop_table(table).await?);
			outputs.push(
				schema_manager
					.create_table(table, &meta.field_mappings, &meta.table.primary_keys, &meta.table.table_options)
					.await?,
			);
			let indexes = schema_manager.create_indexes(table, &meta.table.indexes).await?;
			if !indexes.is_empty() {
				outputs.push(indexes);
			}
		}

		Ok(outputs)
	}
}

/// Whether a declaration's source file lies in an entity directory. Without configured
/// directories, a path segment below `src/` must name an entity module: `Entity`,
/// `UserEntity`, `entity`, `user_entity` (or the same as a `.rs` file).
pub fn is_entity_source(source_file: &str, directories: &[String]) -> bool {
	let path = source_file.replace('\\', "/");
	if !directories.is_empty() {
		return directories.iter().any(|dir| path.contains(dir.replace('\\', "/").as_str()));
	}

	let under_src = match path.find("src/") {
		Some(idx) => &path[idx + "src/".len()..],
		None => return false,
	};
	let mut segments = under_src.split('/').peekable();
	while let Some(segment) = segments.next() {
		let module = match segments.peek() {
			Some(_) => segment,
			None => match segment.strip_suffix(".rs") {
				Some(module) => module,
				None => continue,
			},
		};
		if is_entity_module(module) {
			return true;
		}
	}
	false
}

fn is_entity_module(module: &str) -> bool {
	module == "entity" || module.ends_with("_entity") || module.ends_with("Entity")
}
