//! Failure classification for list queries
//!
//! | Store failure   | Status | Code                  |
//! |-----------------|--------|-----------------------|
//! | Connection      | 503    | `DB_CONNECTION_ERROR` |
//! | Authentication  | 500    | `DB_AUTH_ERROR`       |
//! | Anything else   | 500    | `DB_QUERY_ERROR`      |
//!
//! Rejected credentials are a server misconfiguration, so they map to 500
//! rather than 401.

use thiserror::Error;

use crate::data::error::StoreError;

pub const DB_CONNECTION_ERROR: &str = "DB_CONNECTION_ERROR";
pub const DB_AUTH_ERROR: &str = "DB_AUTH_ERROR";
pub const DB_QUERY_ERROR: &str = "DB_QUERY_ERROR";

/// A list query failure ready to be rendered as an error envelope
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ClassifiedError {
    /// HTTP status code
    pub status: u16,
    /// Stable machine-readable code
    pub code: &'static str,
    /// Short error title
    pub error: &'static str,
    /// Human-readable detail
    pub message: String,
}

impl From<StoreError> for ClassifiedError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Connection(_) => Self {
                status: 503,
                code: DB_CONNECTION_ERROR,
                error: "Database connection failed",
                message: "Unable to connect to the database. Please try again later.".to_string(),
            },
            StoreError::Authentication(_) => Self {
                status: 500,
                code: DB_AUTH_ERROR,
                error: "Database authentication failed",
                message: "Invalid database credentials".to_string(),
            },
            StoreError::Query(message) => Self {
                status: 500,
                code: DB_QUERY_ERROR,
                error: "Failed to fetch data",
                message,
            },
        }
    }
}
