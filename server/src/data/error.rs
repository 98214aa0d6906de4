//! Backing store error type
//!
//! The store's clients mostly surface failures as text, so every backend
//! error is reduced to one of three kinds. Backends that can tell the kind
//! from structured data (transport errors, server error codes) construct the
//! variant directly; everything else goes through [`StoreError::from_message`].

use thiserror::Error;

/// Failure reported by a [`QueryBackend`](crate::data::QueryBackend)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached (refused, reset, timed out)
    #[error("{0}")]
    Connection(String),

    /// The store rejected the configured credentials
    #[error("{0}")]
    Authentication(String),

    /// Any other failure while running a statement
    #[error("{0}")]
    Query(String),
}

/// Message fragments that indicate rejected credentials (lowercase)
const AUTH_PATTERNS: &[&str] = &[
    "authentication failed",
    "wrong password",
    "invalid credentials",
    "unknown user",
];

/// Message fragments that indicate the store is unreachable (lowercase)
const CONNECTION_PATTERNS: &[&str] = &[
    "econnrefused",
    "connection refused",
    "connection reset",
    "failed to connect",
    "could not connect",
    "network",
    "timed out",
    "fetch failed",
];

impl StoreError {
    /// Classify a failure from its message text.
    ///
    /// Credential failures are checked first: a rejected login is often
    /// reported together with the connection it was attempted on.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        if AUTH_PATTERNS.iter().any(|p| lower.contains(p)) {
            Self::Authentication(message)
        } else if CONNECTION_PATTERNS.iter().any(|p| lower.contains(p)) {
            Self::Connection(message)
        } else {
            Self::Query(message)
        }
    }

    /// Short kind label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Authentication(_) => "authentication",
            Self::Query(_) => "query",
        }
    }
}
