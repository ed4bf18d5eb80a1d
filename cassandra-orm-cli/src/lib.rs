mod config;
mod connection;
mod schema_create;

use anyhow::{Error, Result};
use cassandra_orm::EntityRegistry;
use clap::{Parser, Subcommand};
use config::{Config, CONFIG_ENV, DEFAULT_CONFIG_PATH};
use dotenv::dotenv;
use schema_create::schema_create;

pub use config::{ConnectionConfig, EntityManagerConfig, MetadataCacheConfig, OrmConfig};
pub use connection::ScyllaExecutor;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
	#[clap(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Drops and recreates the table of every entity handled by an entity manager
	SchemaCreate {
		/// Entity manager to run against
		#[clap(default_value = "default")]
		connection: String,
		/// Print the CQL instead of executing it
		#[clap(long)]
		dump_cql: bool,
	},
}

pub async fn run(entities: &EntityRegistry) -> Result<(), Error> {
	env_logger::init();

	let cli = Cli::parse();

	dotenv().ok();

	let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
	let config = Config::load(path)?;

	match &cli.command {
		Commands::SchemaCreate { connection, dump_cql } => schema_create(entities, &config, connection, *dump_cql).await?,
	}

	Ok(())
}
