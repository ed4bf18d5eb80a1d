use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// Runs CQL statements against a cluster connection.
#[async_trait]
pub trait StatementExecutor {
	async fn execute(&self, cql: &str) -> Result<()>;

	/// Waits for outstanding asynchronous work and releases the connection.
	async fn close(&self) -> Result<()> {
		Ok(())
	}
}

/// Records statements instead of sending them anywhere.
#[derive(Default)]
pub struct MemoryExecutor {
	statements: RwLock<Vec<String>>,
	fail_on: Option<usize>,
	calls: AtomicUsize,
	closed: AtomicBool,
}
impl MemoryExecutor {
	pub fn new() -> Self {
		Self::default()
	}

	/// Fails the `n`th call to `execute` (1-based) and every call after it.
	pub fn failing_on(n: usize) -> Self {
		Self { fail_on: Some(n), ..Self::default() }
	}

	pub async fn statements(&self) -> Vec<String> {
		self.statements.read().await.clone()
	}

	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::SeqCst)
	}
}
#[async_trait]
impl StatementExecutor for MemoryExecutor {
	async fn execute(&self, cql: &str) -> Result<()> {
		let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
		if matches!(self.fail_on, Some(n) if call >= n) {
			bail!("statement {} rejected: {}", call, cql);
		}
		self.statements.write().await.push(cql.to_string());
		Ok(())
	}

	async fn close(&self) -> Result<()> {
		self.closed.store(true, Ordering::SeqCst);
		Ok(())
	}
}
