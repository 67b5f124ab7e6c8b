//! Source store error types.

use thiserror::Error;

/// Errors that can occur while reading from the relational source store.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// The store could not be reached or rejected the credentials.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The query reached the store but failed or returned an unusable shape.
    #[error("Query error: {0}")]
    QueryError(String),
}

impl SourceError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }
}
