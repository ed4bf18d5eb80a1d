//! Entity declarations and the class metadata built from them.
//!
//! An [`EntityDeclaration`] is the typed form of an entity's `#[table]` and `#[column]`
//! attributes, as produced by the `entity!` macro. [`EntityMeta`] is the normalized
//! descriptor that the metadata factory caches and the schema manager consumes.

use crate::table_options::{OptionValue, TableOption, TableOptions};
use serde::{Deserialize, Serialize};

/// Separator between namespace segments of a canonical class name.
pub const NAMESPACE_SEPARATOR: char = '\\';

/// One element of a primary key declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyPart {
	Column(String),
	/// Composite partition key, only meaningful as the first element.
	Composite(Vec<String>),
}

impl From<&str> for KeyPart {
	fn from(column: &str) -> Self {
		KeyPart::Column(column.to_string())
	}
}

impl From<Vec<&str>> for KeyPart {
	fn from(columns: Vec<&str>) -> Self {
		KeyPart::Composite(columns.into_iter().map(String::from).collect())
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityDeclaration {
	pub namespace: String,
	pub short_name: String,
	pub source_file: String,
	pub table: Option<TableDeclaration>,
	pub fields: Vec<FieldDeclaration>,
}

impl EntityDeclaration {
	/// `module_path` uses Rust `::` separators, as returned by `module_path!()`.
	pub fn new(module_path: &str, short_name: &str, source_file: &str) -> Self {
		Self {
			namespace: module_path.replace("::", &NAMESPACE_SEPARATOR.to_string()),
			short_name: short_name.to_string(),
			source_file: source_file.to_string(),
			table: None,
			fields: Vec::new(),
		}
	}

	pub fn canonical_name(&self) -> String {
		if self.namespace.is_empty() {
			return self.short_name.clone();
		}
		format!("{}{}{}", self.namespace, NAMESPACE_SEPARATOR, self.short_name)
	}

	pub fn with_table(mut self, table: TableDeclaration) -> Self {
		self.table = Some(table);
		self
	}

	pub fn with_field(mut self, name: &str, column: Option<ColumnDeclaration>) -> Self {
		self.fields.push(FieldDeclaration { name: name.to_string(), column });
		self
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDeclaration {
	pub repository_class: Option<String>,
	pub name: Option<String>,
	pub indexes: Vec<String>,
	pub primary_keys: Vec<KeyPart>,
	pub default_ttl: Option<u32>,
	pub if_not_exists: Option<bool>,
	/// Options in declaration order, keyed by their vocabulary name.
	pub table_options: Vec<(String, OptionValue)>,
}

impl Default for TableDeclaration {
	fn default() -> Self {
		Self {
			repository_class: None,
			name: None,
			indexes: Vec::new(),
			primary_keys: vec![KeyPart::Column("id".to_string())],
			default_ttl: None,
			if_not_exists: None,
			table_options: Vec::new(),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDeclaration {
	pub name: String,
	pub column: Option<ColumnDeclaration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDeclaration {
	pub name: String,
	pub cql_type: String,
}

impl ColumnDeclaration {
	pub fn new(name: &str, cql_type: &str) -> Self {
		Self { name: name.to_string(), cql_type: cql_type.to_string() }
	}
}

/// Class metadata: how one entity maps to a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMeta {
	pub name: String,
	pub custom_repository_class_name: Option<String>,
	pub table: TableMeta,
	pub field_mappings: Vec<FieldMapping>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMeta {
	/// `None` when the class has no physical table.
	pub name: Option<String>,
	pub indexes: Vec<String>,
	pub primary_keys: Vec<KeyPart>,
	pub default_ttl: Option<u32>,
	/// Parsed but not consumed: schema creation always drops and recreates.
	pub if_not_exists: Option<bool>,
	pub table_options: TableOptions,
}

impl Default for TableMeta {
	fn default() -> Self {
		Self {
			name: None,
			indexes: Vec::new(),
			primary_keys: Vec::new(),
			default_ttl: None,
			if_not_exists: None,
			table_options: TableOptions::default(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
	pub field_name: String,
	pub column_name: String,
	#[serde(rename = "type")]
	pub cql_type: String,
}

impl FieldMapping {
	pub fn new(field_name: &str, column_name: &str, cql_type: &str) -> Self {
		Self { field_name: field_name.to_string(), column_name: column_name.to_string(), cql_type: cql_type.to_string() }
	}
}

impl EntityMeta {
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into(), custom_repository_class_name: None, table: TableMeta::default(), field_mappings: Vec::new() }
	}

	/// Builds the metadata for `name` from its declaration. No validation happens here.
	pub fn from_declaration(name: impl Into<String>, declaration: &EntityDeclaration) -> Self {
		let mut meta = Self::new(name);

		if let Some(table) = &declaration.table {
			meta.custom_repository_class_name = table.repository_class.clone();

			let mut table_options = TableOptions::default();
			for (option, value) in &table.table_options {
				table_options.set(TableOption::from_name(option), value.clone());
			}

			meta.table = TableMeta {
				name: Some(match &table.name {
					Some(name) if !name.is_empty() => name.clone(),
					_ => table_name_from_class(&declaration.short_name),
				}),
				indexes: table.indexes.clone(),
				primary_keys: table.primary_keys.clone(),
				default_ttl: table.default_ttl,
				if_not_exists: table.if_not_exists,
				table_options,
			};
		}

		meta.field_mappings = declaration
			.fields
			.iter()
			.filter_map(|field| {
				field.column.as_ref().map(|column| FieldMapping {
					field_name: field.name.clone(),
					column_name: column.name.clone(),
					cql_type: column.cql_type.clone(),
				})
			})
			.collect();

		meta
	}

	pub fn table_name(&self) -> Option<&str> {
		self.table.name.as_deref().filter(|name| !name.is_empty())
	}

	pub fn field_names(&self) -> impl Iterator<Item = &str> {
		self.field_mappings.iter().map(|mapping| mapping.field_name.as_str())
	}
}

/// `UserEvent` -> `user_event`. An underscore goes before every uppercase letter that
/// follows a non-uppercase character.
pub fn table_name_from_class(short_name: &str) -> String {
	let mut table = String::with_capacity(short_name.len() + 4);
	let mut prev: Option<char> = None;
	for c in short_name.chars() {
		if c.is_ascii_uppercase() && prev.map_or(false, |p| !p.is_ascii_uppercase()) {
			table.push('_');
		}
		table.push(c);
		prev = Some(c);
	}
	table.to_lowercase()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn declaration() -> EntityDeclaration {
		EntityDeclaration::new("app::entity", "UserEvent", "src/entity/user_event.rs")
			.with_table(TableDeclaration {
				indexes: vec!["kind".to_string()],
				primary_keys: vec![vec!["user_id", "bucket"].into(), "at".into()],
				default_ttl: Some(60),
				if_not_exists: Some(true),
				table_options: vec![
					("clusteringOrder".to_string(), "at DESC".into()),
					("gc_grace_seconds".to_string(), OptionValue::Int(10)),
				],
				..Default::default()
			})
			.with_field("user_id", Some(ColumnDeclaration::new("user_id", "uuid")))
			.with_field("bucket", Some(ColumnDeclaration::new("bucket", "int")))
			.with_field("cache", None)
			.with_field("at", Some(ColumnDeclaration::new("created_at", "timestamp")))
	}

	#[test]
	fn test_table_name_from_class() {
		assert_eq!(table_name_from_class("User"), "user");
		assert_eq!(table_name_from_class("UserEvent"), "user_event");
		assert_eq!(table_name_from_class("HTTPRequestLog"), "httprequest_log");
		assert_eq!(table_name_from_class("Page2View"), "page2_view");
		assert_eq!(table_name_from_class("already_snake"), "already_snake");
	}

	#[test]
	fn test_canonical_name() {
		assert_eq!(declaration().canonical_name(), "app\\entity\\UserEvent");
		assert_eq!(EntityDeclaration::new("", "Bare", "bare.rs").canonical_name(), "Bare");
	}

	#[test]
	fn test_from_declaration() {
		let meta = EntityMeta::from_declaration("app\\entity\\UserEvent", &declaration());
		assert_eq!(meta.table_name(), Some("user_event"));
		assert_eq!(meta.table.indexes, vec!["kind".to_string()]);
		assert_eq!(
			meta.table.primary_keys,
			vec![KeyPart::Composite(vec!["user_id".to_string(), "bucket".to_string()]), KeyPart::from("at")]
		);
		assert_eq!(meta.table.default_ttl, Some(60));
		assert_eq!(meta.table.if_not_exists, Some(true));
		assert_eq!(meta.table.table_options.get(&TableOption::GcGraceSeconds), Some(&OptionValue::Int(10)));
		assert_eq!(meta.table.table_options.get(&TableOption::Comment), None);

		// declaration order, unannotated fields skipped
		assert_eq!(meta.field_names().collect::<Vec<_>>(), vec!["user_id", "bucket", "at"]);
		assert_eq!(meta.field_mappings[2], FieldMapping::new("at", "created_at", "timestamp"));
	}

	#[test]
	fn test_explicit_table_name_and_defaults() {
		let declaration = EntityDeclaration::new("app::entity", "Account", "src/entity/account.rs")
			.with_table(TableDeclaration {
				name: Some("accounts".to_string()),
				repository_class: Some("app\\repository\\AccountRepository".to_string()),
				..Default::default()
			})
			.with_field("id", Some(ColumnDeclaration::new("id", "uuid")));
		let meta = EntityMeta::from_declaration("app\\entity\\Account", &declaration);
		assert_eq!(meta.table_name(), Some("accounts"));
		assert_eq!(meta.table.primary_keys, vec![KeyPart::from("id")]);
		assert_eq!(meta.custom_repository_class_name.as_deref(), Some("app\\repository\\AccountRepository"));
		assert_eq!(meta.table.table_options, TableOptions::default());
	}

	#[test]
	fn test_no_table_declaration() {
		let declaration = EntityDeclaration::new("app::entity", "Address", "src/entity/address.rs")
			.with_field("street", Some(ColumnDeclaration::new("street", "text")));
		let meta = EntityMeta::from_declaration("app\\entity\\Address", &declaration);
		assert_eq!(meta.table_name(), None);
		assert_eq!(meta.field_mappings.len(), 1);
	}

	#[test]
	fn test_meta_json_shape() {
		let meta = EntityMeta::from_declaration("app\\entity\\UserEvent", &declaration());
		let json = serde_json::to_value(&meta).unwrap();
		assert_eq!(json["table"]["primary_keys"], serde_json::json!([["user_id", "bucket"], "at"]));
		assert_eq!(json["field_mappings"][0]["type"], "uuid");
		assert_eq!(json["table"]["table_options"]["clusteringOrder"], "at DESC");
		assert_eq!(serde_json::from_value::<EntityMeta>(json).unwrap(), meta);
	}
}
