//! Backing store seam
//!
//! The query engine only needs one capability from the store: run a SQL
//! statement with named bind parameters and hand back rows as JSON objects.
//! ClickHouse implements it for production; tests use an in-memory fake.

use async_trait::async_trait;

use crate::data::error::StoreError;
use crate::data::query::BoundParams;

/// One result row, column name to JSON value
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Read-only query capability of the backing store
///
/// Statements reference parameters as `{name:Type}`; every entry of
/// `params` must be bound under its key. Implementations must be safe to
/// share across concurrent requests.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Run a statement and return its rows in store order
    async fn run_query(&self, sql: &str, params: &BoundParams) -> Result<Vec<Row>, StoreError>;
}
