use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
	cassandra_orm_cli::run(&schema::ENTITIES).await
}
