pub mod entity_manager;
pub mod entity_meta;
pub mod error;
pub mod executor;
pub mod metadata_cache;
pub mod metadata_factory;
pub mod registry;
pub mod schema_create;
pub mod schema_manager;
pub mod table_options;

use entity_meta::EntityDeclaration;

pub use cassandra_orm_derive::*;
pub use error::{Result, SchemaError};
pub use lazy_static;
pub use registry::{DeclarationSource, EntityRegistry};

/// A struct mapped to a table, usually generated by `entity!`.
pub trait Entity {
	fn declaration() -> EntityDeclaration;
}
