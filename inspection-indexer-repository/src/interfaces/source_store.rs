//! Source store trait definition.

use async_trait::async_trait;

use crate::errors::SourceError;
use inspection_indexer_shared::RawDataset;

/// Abstracts the relational store the raw inspection rows are read from.
#[async_trait]
pub trait SourceStore: Send + Sync {
    /// Read every row and column of `table` (a full `SELECT *` scan).
    ///
    /// The result is fully materialized; implementations must not return a
    /// partial result set.
    ///
    /// # Returns
    ///
    /// * `Ok(RawDataset)` - All rows in source order, values in text form
    /// * `Err(SourceError::ConnectionError)` - If the store is unreachable or rejects the credentials
    /// * `Err(SourceError::QueryError)` - If the query fails (e.g. missing table)
    async fn fetch_table(&self, table: &str) -> Result<RawDataset, SourceError>;
}
