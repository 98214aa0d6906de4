//! Data access layer
//!
//! - `clickhouse` - ClickHouse client and the production `QueryBackend`
//! - `query` - filter compiler, list executor, failure classification
//! - `traits` - the `QueryBackend` seam
//! - `error` - store failure taxonomy

pub mod clickhouse;
pub mod error;
pub mod query;
pub mod traits;

pub use clickhouse::{ClickhouseError, ClickhouseService};
pub use error::StoreError;
pub use traits::{QueryBackend, Row};
