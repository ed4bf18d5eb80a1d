use thiserror::Error;

pub type Result<T, E = SchemaError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum SchemaError {
	#[error("Invalid numeric format for table option \"{option}\", \"{value}\" is not numeric")]
	InvalidOptionValue { option: String, value: String },

	#[error("Unknown entity namespace alias \"{0}\"")]
	UnknownAlias(String),

	#[error("No entity declaration found for class \"{0}\"")]
	MetadataNotFound(String),

	#[error("Unknown entity manager \"{0}\"")]
	UnknownEntityManager(String),

	/// A mapped table without a single column cannot be rendered.
	#[error("Table \"{table}\" has no mapped columns")]
	NoColumns { table: String },

	#[error("Invalid primary key for table \"{table}\": {reason}")]
	InvalidPrimaryKey { table: String, reason: String },

	/// Failure reported by the statement executor or the metadata cache.
	#[error(transparent)]
	Transport(#[from] anyhow::Error),
}
