//! Database abstraction layer for psql-lite.
//!
//! The runner only ever talks to a [`DatabaseClient`]: an already-open,
//! authenticated session that accepts statement text and hands back rows.

mod mock;
mod postgres;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient, MockHandle};
pub use postgres::PostgresClient;
pub use types::{QueryResult, ResultRow};

use crate::error::Result;
use async_trait::async_trait;

/// Trait defining the interface for database clients.
///
/// Implementations own a single session. Statements are submitted one at a
/// time and the runner never retries or reconnects through this interface.
#[async_trait]
pub trait DatabaseClient: Send {
    /// Executes one statement and returns its rows (empty for DDL and the like).
    ///
    /// Errors carry a human-readable description that identifies the failing
    /// statement.
    async fn execute_query(&mut self, sql: &str) -> Result<QueryResult>;

    /// Closes the session gracefully.
    async fn close(self: Box<Self>) -> Result<()>;
}
