//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (OpenSearch, Elasticsearch, etc.).

use async_trait::async_trait;

use crate::errors::SearchIndexError;
use crate::types::{BatchOperationResult, BatchOperationSummary};
use inspection_indexer_shared::InspectionDocument;

/// Abstracts the underlying search index implementation (OpenSearch, Elasticsearch, etc.).
///
/// Implementations are injected into the loader to enable dependency injection
/// and easy testing with in-memory implementations.
///
/// Documents are written without an identifier: every successful write adds a
/// new document, even if an identical one already exists in the index.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Index a single document into `index`.
    ///
    /// # Arguments
    ///
    /// * `index` - Name of the target index
    /// * `document` - The inspection document to write
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the document was indexed successfully
    /// * `Err(SearchIndexError)` - If indexing fails
    async fn index_document(
        &self,
        index: &str,
        document: &InspectionDocument,
    ) -> Result<(), SearchIndexError>;

    /// Index multiple documents and return a per-document summary.
    ///
    /// The default implementation issues one `index_document` call per
    /// document. Backends with a native bulk API should override it.
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Contains aggregate statistics and individual results
    /// * `Err(SearchIndexError)` - If the bulk operation fails entirely
    async fn bulk_index_documents(
        &self,
        index: &str,
        documents: &[InspectionDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let mut results = Vec::with_capacity(documents.len());

        for (position, document) in documents.iter().enumerate() {
            match self.index_document(index, document).await {
                Ok(()) => results.push(BatchOperationResult::succeeded(position)),
                Err(e) => results.push(BatchOperationResult::failed(position, e)),
            }
        }

        Ok(BatchOperationSummary::from_results(results))
    }

    /// Ensure `index` exists, creating it with the inspection mapping if absent.
    ///
    /// An existing index is left untouched.
    async fn ensure_index_exists(&self, index: &str) -> Result<(), SearchIndexError>;

    /// Check if the search engine is healthy and reachable.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the search engine is healthy
    /// * `Ok(false)` - If the search engine is unhealthy
    /// * `Err(SearchIndexError)` - If the health check fails to execute
    async fn health_check(&self) -> Result<bool, SearchIndexError>;
}
