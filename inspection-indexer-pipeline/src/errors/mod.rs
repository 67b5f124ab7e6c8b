//! Error types for the inspection indexer pipeline.

use inspection_indexer_repository::{SearchIndexError, SourceError};
use inspection_indexer_shared::ColumnType;
use thiserror::Error;

/// Errors that can occur in the inspection indexer pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The source store could not be reached or rejected the credentials.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The source query failed or returned an unusable result.
    #[error("Query error: {0}")]
    QueryError(String),

    /// A required column is missing after header normalization.
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// A value could not be cast to its declared column type.
    #[error("Type coercion error: row {row}, column {column}: cannot convert {value:?} to {expected}")]
    TypeCoercionError {
        /// 1-based data row number in the input dataset.
        row: usize,
        column: String,
        value: String,
        expected: ColumnType,
    },

    /// A document could not be written to the search index.
    #[error("Index write error: {0}")]
    IndexWriteError(String),

    /// A dataset file is malformed.
    #[error("Dataset error: {0}")]
    DatasetError(String),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PipelineError {
    /// Create a schema error.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::SchemaError(msg.into())
    }

    /// Create a type coercion error.
    pub fn coercion(
        row: usize,
        column: impl Into<String>,
        value: impl Into<String>,
        expected: ColumnType,
    ) -> Self {
        Self::TypeCoercionError {
            row,
            column: column.into(),
            value: value.into(),
            expected,
        }
    }

    /// Create an index write error.
    pub fn index_write(msg: impl Into<String>) -> Self {
        Self::IndexWriteError(msg.into())
    }
}

impl From<SourceError> for PipelineError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::ConnectionError(msg) => Self::ConnectionError(msg),
            SourceError::QueryError(msg) => Self::QueryError(msg),
        }
    }
}

impl From<SearchIndexError> for PipelineError {
    fn from(err: SearchIndexError) -> Self {
        Self::IndexWriteError(err.to_string())
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(io) => Self::IoError(io),
                other => Self::DatasetError(format!("{:?}", other)),
            }
        } else {
            Self::DatasetError(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_errors_keep_their_kind() {
        let err: PipelineError = SourceError::connection("refused").into();
        assert!(matches!(err, PipelineError::ConnectionError(ref m) if m == "refused"));

        let err: PipelineError = SourceError::query("relation \"table_m3\" does not exist").into();
        assert!(matches!(err, PipelineError::QueryError(_)));
    }

    #[test]
    fn test_coercion_message() {
        let err = PipelineError::coercion(4, "business_postal_code", "CA", ColumnType::Integer);
        assert_eq!(
            err.to_string(),
            "Type coercion error: row 4, column business_postal_code: cannot convert \"CA\" to integer"
        );
    }

    #[test]
    fn test_search_index_error_becomes_index_write() {
        let err: PipelineError = SearchIndexError::index("status 400").into();
        assert!(matches!(err, PipelineError::IndexWriteError(_)));
    }
}
