//! QueryExecutor trait definition.
//!
//! The engine never talks to a database directly. Sampling queries go
//! through this trait, which a backend-specific collaborator implements on
//! top of its own connection pool.

use std::sync::Arc;

use async_trait::async_trait;

use super::error::ExecutorResult;

/// A single result row, keyed by column alias.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Runs parameterized, read-only queries against the source database.
///
/// # Example
///
/// ```ignore
/// use schema_intel::metadata::{QueryExecutor, Row};
///
/// async fn example(executor: &impl QueryExecutor) -> ExecutorResult<()> {
///     let rows: Vec<Row> = executor
///         .query("SELECT COUNT(*) AS n FROM orders LIMIT ?", &[10_000.into()])
///         .await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run a read query with positional bind parameters and return all rows.
    async fn query(&self, sql: &str, params: &[serde_json::Value]) -> ExecutorResult<Vec<Row>>;
}

#[async_trait]
impl<T: QueryExecutor + ?Sized> QueryExecutor for Arc<T> {
    async fn query(&self, sql: &str, params: &[serde_json::Value]) -> ExecutorResult<Vec<Row>> {
        (**self).query(sql, params).await
    }
}
