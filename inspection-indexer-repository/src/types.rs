//! Result types for batch index operations.

use crate::errors::SearchIndexError;

/// Result of a batch operation for a single document.
///
/// `position` is the document's offset within the submitted batch, which is
/// the only identity a document has since none is assigned on write.
#[derive(Debug, Clone)]
pub struct BatchOperationResult {
    /// Offset of the document within the batch.
    pub position: usize,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error if the operation failed.
    pub error: Option<SearchIndexError>,
}

impl BatchOperationResult {
    pub fn succeeded(position: usize) -> Self {
        Self {
            position,
            success: true,
            error: None,
        }
    }

    pub fn failed(position: usize, error: SearchIndexError) -> Self {
        Self {
            position,
            success: false,
            error: Some(error),
        }
    }
}

/// Summary of a batch operation containing aggregate statistics and individual results.
///
/// This allows callers to handle partial failures: a bulk request can succeed
/// as a whole while individual documents inside it are rejected.
#[derive(Debug, Clone, Default)]
pub struct BatchOperationSummary {
    /// Total number of items in the batch.
    pub total: usize,
    /// Number of successful operations.
    pub succeeded: usize,
    /// Number of failed operations.
    pub failed: usize,
    /// Individual results for each item, in batch order.
    pub results: Vec<BatchOperationResult>,
}

impl BatchOperationSummary {
    /// Build a summary from per-document results.
    pub fn from_results(results: Vec<BatchOperationResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// The first failure in batch order, if any.
    pub fn first_failure(&self) -> Option<&BatchOperationResult> {
        self.results.iter().find(|r| !r.success)
    }
}
