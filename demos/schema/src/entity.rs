use cassandra_orm::*;

entity!(
	#[derive(Debug, Default)]
	#[table(name = "accounts", indexes("email"), options(comment = "registered users"))]
	pub Account {
		#[column(cql_type = "uuid")]
		id: String,
		#[column(name = "email_address", cql_type = "text")]
		email: String,
		#[column(cql_type = "text")]
		display_name: String,
		password_hash: String,
	}

	/// One row per user action, bucketed by day.
	#[table(
		primary_keys(partition("user_id", "bucket"), "created_at"),
		default_ttl = 2592000,
		if_not_exists,
		options(
			clusteringOrder = "created_at DESC",
			gc_grace_seconds = 86400,
			bloom_filter_fp_chance = 0.01,
			compaction = "{'class': 'TimeWindowCompactionStrategy'}"
		)
	)]
	pub UserEvent {
		#[column(cql_type = "uuid")]
		user_id: String,
		#[column(cql_type = "int")]
		bucket: i32,
		#[column(cql_type = "timestamp")]
		created_at: i64,
		#[column(cql_type = "text")]
		kind: String,
	}

	#[derive(Debug, Clone)]
	pub Address {
		#[column(cql_type = "text")]
		street: String,
		#[column(cql_type = "text")]
		city: String,
	}
);
