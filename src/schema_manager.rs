use crate::{
	entity_meta::{FieldMapping, KeyPart},
	error::{Result, SchemaError},
	executor::StatementExecutor,
	table_options::TableOptions,
};
use log::info;
use std::sync::Arc;

/// Renders schema statements and, unless dumping, executes them one by one.
pub struct SchemaManager {
	executor: Arc<dyn StatementExecutor + Send + Sync>,
	dump_cql: bool,
}
impl SchemaManager {
	pub fn new(executor: Arc<dyn StatementExecutor + Send + Sync>) -> Self {
		Self { executor, dump_cql: false }
	}

	/// When set, statements are rendered and returned but never executed.
	pub fn force_dump_cql(&mut self, dump_cql: bool) {
		self.dump_cql = dump_cql;
	}

	pub fn is_dump_cql(&self) -> bool {
		self.dump_cql
	}

	async fn exec(&self, cql: String) -> Result<String> {
		if self.dump_cql {
			info!("dumping: {}", cql);
		} else {
			info!("executing: {}", cql);
			self.executor.execute(&cql).await?;
		}
		Ok(cql)
	}

	pub async fn create_table(
		&self,
		name: &str,
		fields: &[FieldMapping],
		primary_keys: &[KeyPart],
		table_options: &TableOptions,
	) -> Result<String> {
		let cql = Self::render_create_table(name, fields, primary_keys, table_options)?;
		self.exec(cql).await
	}

	pub async fn drop_table(&self, name: &str) -> Result<String> {
		self.exec(Self::render_drop_table(name)).await
	}

	/// Creates each index with its own statement. A failure leaves the earlier ones in place.
	pub async fn create_indexes(&self, table: &str, indexes: &[String]) -> Result<String> {
		let mut statements = Vec::with_capacity(indexes.len());
		for index in indexes {
			statements.push(self.exec(Self::render_create_index(table, index)).await?);
		}
		Ok(statements.join("\n"))
	}

	pub fn render_create_table(
		name: &str,
		fields: &[FieldMapping],
		primary_keys: &[KeyPart],
		table_options: &TableOptions,
	) -> Result<String> {
		if fields.is_empty() {
			return Err(SchemaError::NoColumns { table: name.to_string() });
		}

		let columns =
			fields.iter().map(|field| format!("{} {}", field.column_name, field.cql_type)).collect::<Vec<_>>();
		let primary_key = Self::render_primary_key(name, primary_keys)?;
		let options = table_options.to_cql()?;

		Ok(format!("CREATE TABLE {} ({}{}){};", name, columns.join(","), primary_key, options))
	}

	fn render_primary_key(table: &str, primary_keys: &[KeyPart]) -> Result<String> {
		let (partition, clustering) = match primary_keys.split_first() {
			Some(split) => split,
			None => return Ok(String::new()),
		};

		let mut parts = Vec::with_capacity(primary_keys.len());
		parts.push(match partition {
			KeyPart::Column(column) => column.clone(),
			KeyPart::Composite(columns) if columns.is_empty() => {
				return Err(SchemaError::InvalidPrimaryKey {
					table: table.to_string(),
					reason: "empty partition key".to_string(),
				})
			},
			KeyPart::Composite(columns) if columns.len() == 1 => columns[0].clone(),
			KeyPart::Composite(columns) => format!("({})", columns.join(",")),
		});
		for part in clustering {
			match part {
				KeyPart::Column(column) => parts.push(column.clone()),
				KeyPart::Composite(_) => {
					return Err(SchemaError::InvalidPrimaryKey {
						table: table.to_string(),
						reason: "only the partition key may be composite".to_string(),
					})
				},
			}
		}

		Ok(format!(",PRIMARY KEY ({})", parts.join(",")))
	}

	pub fn render_drop_table(name: &str) -> String {
		format!("DROP TABLE IF EXISTS {};", name)
	}

	pub fn render_create_index(table: &str, index: &str) -> String {
		format!("CREATE INDEX ON {} ({});", table, index)
	}
}
