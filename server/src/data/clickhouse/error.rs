//! ClickHouse error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClickhouseError {
    #[error("Database error: {0}")]
    Database(#[from] clickhouse::error::Error),

    #[error("Invalid ClickHouse configuration: {0}")]
    Config(String),

    #[error("Query timeout after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}
