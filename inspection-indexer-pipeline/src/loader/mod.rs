//! Loader module for the inspection indexer pipeline.
//!
//! Loads the cleaned dataset into the search index.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::dataset;
use crate::errors::PipelineError;
use inspection_indexer_repository::SearchIndexProvider;
use inspection_indexer_shared::InspectionDocument;

/// What the loader does when a document fails to write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteFailurePolicy {
    /// Log and count every failed write, then keep going. The stage succeeds
    /// and the [`LoadReport`] tells how many rows did not land.
    #[default]
    BestEffort,
    /// Abort the stage on the first failed write.
    FailFast,
}

impl FromStr for WriteFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best-effort" | "best_effort" => Ok(Self::BestEffort),
            "fail-fast" | "fail_fast" => Ok(Self::FailFast),
            other => Err(format!(
                "unknown write failure policy {:?} (expected best-effort or fail-fast)",
                other
            )),
        }
    }
}

impl fmt::Display for WriteFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BestEffort => write!(f, "best-effort"),
            Self::FailFast => write!(f, "fail-fast"),
        }
    }
}

/// Configuration for the search loader.
#[derive(Debug, Clone, Default)]
pub struct LoaderConfig {
    pub failure_policy: WriteFailurePolicy,
    /// Documents per bulk request. `None` writes one document per request.
    pub batch_size: Option<usize>,
}

/// Outcome of a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub index: String,
    /// Rows read from the cleaned dataset.
    pub total: usize,
    /// Documents the search engine accepted.
    pub indexed: usize,
    /// Documents that failed to write.
    pub failed: usize,
}

impl LoadReport {
    fn new(index: &str, total: usize) -> Self {
        Self {
            index: index.to_string(),
            total,
            indexed: 0,
            failed: 0,
        }
    }

    /// Whether every row landed in the index.
    pub fn is_complete(&self) -> bool {
        self.failed == 0 && self.indexed == self.total
    }
}

/// Loader that writes cleaned records into the search engine.
///
/// Each row becomes one new document; no identifier is supplied, so loading
/// the same dataset twice doubles the documents in the index.
pub struct SearchLoader {
    client: Arc<dyn SearchIndexProvider>,
    config: LoaderConfig,
}

impl SearchLoader {
    /// Create a new search loader with the given client.
    pub fn new(client: Arc<dyn SearchIndexProvider>) -> Self {
        Self {
            client,
            config: LoaderConfig::default(),
        }
    }

    /// Create a new search loader with custom configuration.
    pub fn with_config(client: Arc<dyn SearchIndexProvider>, config: LoaderConfig) -> Self {
        Self { client, config }
    }

    /// Load the cleaned dataset at `input_path` into `index`.
    #[instrument(skip(self), fields(input = %input_path.display(), policy = %self.config.failure_policy))]
    pub async fn load(&self, input_path: &Path, index: &str) -> Result<LoadReport, PipelineError> {
        let documents: Vec<InspectionDocument> = dataset::read_cleaned(input_path)?
            .into_iter()
            .map(InspectionDocument::from)
            .collect();

        self.ensure_index(index).await?;

        let mut report = LoadReport::new(index, documents.len());

        match self.config.batch_size {
            Some(batch_size) if batch_size > 0 => {
                self.load_bulk(&documents, batch_size, &mut report).await?
            }
            _ => self.load_each(&documents, &mut report).await?,
        }

        if report.failed > 0 {
            warn!(
                total = report.total,
                indexed = report.indexed,
                failed = report.failed,
                "Load finished with failed writes; not every row is in the index"
            );
        } else {
            info!(
                index = %index,
                indexed = report.indexed,
                "Loaded documents into search index"
            );
        }

        Ok(report)
    }

    /// One index request per row, in file order.
    async fn load_each(
        &self,
        documents: &[InspectionDocument],
        report: &mut LoadReport,
    ) -> Result<(), PipelineError> {
        for (position, document) in documents.iter().enumerate() {
            match self.client.index_document(&report.index, document).await {
                Ok(()) => report.indexed += 1,
                Err(e) => {
                    report.failed += 1;
                    error!(
                        row = position + 1,
                        business_id = document.record().business_id,
                        error = %e,
                        "Failed to index document"
                    );
                    if self.config.failure_policy == WriteFailurePolicy::FailFast {
                        return Err(PipelineError::index_write(format!(
                            "row {}: {}",
                            position + 1,
                            e
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Bulk requests of `batch_size` documents. Each document still gets its
    /// own outcome. Under fail-fast, documents of the failing batch that were
    /// accepted stay in the index.
    async fn load_bulk(
        &self,
        documents: &[InspectionDocument],
        batch_size: usize,
        report: &mut LoadReport,
    ) -> Result<(), PipelineError> {
        for (batch, chunk) in documents.chunks(batch_size).enumerate() {
            let offset = batch * batch_size;

            match self.client.bulk_index_documents(&report.index, chunk).await {
                Ok(summary) => {
                    report.indexed += summary.succeeded;
                    report.failed += summary.failed;

                    for failure in summary.results.iter().filter(|r| !r.success) {
                        error!(
                            row = offset + failure.position + 1,
                            error = ?failure.error,
                            "Failed to index document"
                        );
                    }

                    debug!(
                        batch = batch,
                        succeeded = summary.succeeded,
                        failed = summary.failed,
                        "Bulk batch written"
                    );

                    if self.config.failure_policy == WriteFailurePolicy::FailFast {
                        if let Some(failure) = summary.first_failure() {
                            return Err(PipelineError::index_write(format!(
                                "row {}: {}",
                                offset + failure.position + 1,
                                failure
                                    .error
                                    .as_ref()
                                    .map(ToString::to_string)
                                    .unwrap_or_default()
                            )));
                        }
                    }
                }
                Err(e) => {
                    report.failed += chunk.len();
                    error!(
                        first_row = offset + 1,
                        count = chunk.len(),
                        error = %e,
                        "Bulk request failed"
                    );
                    if self.config.failure_policy == WriteFailurePolicy::FailFast {
                        return Err(PipelineError::index_write(format!(
                            "rows {}-{}: {}",
                            offset + 1,
                            offset + chunk.len(),
                            e
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Ensure the search index exists.
    pub async fn ensure_index(&self, index: &str) -> Result<(), PipelineError> {
        self.client
            .ensure_index_exists(index)
            .await
            .map_err(|e| PipelineError::index_write(e.to_string()))
    }

    /// Check if the search engine is healthy.
    pub async fn health_check(&self) -> Result<bool, PipelineError> {
        self.client
            .health_check()
            .await
            .map_err(|e| PipelineError::ConnectionError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use inspection_indexer_repository::SearchIndexError;
    use inspection_indexer_shared::{InspectionRecord, CLEANED_COLUMNS};
    use serde_json::Value;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// In-memory search index. Every write appends, like a write without an id.
    struct MockSearchClient {
        indices: Mutex<HashMap<String, Vec<Value>>>,
        /// Business ids whose writes are rejected.
        reject: HashSet<i64>,
        index_calls: AtomicUsize,
        bulk_calls: AtomicUsize,
    }

    impl MockSearchClient {
        fn new() -> Self {
            Self::rejecting(&[])
        }

        fn rejecting(ids: &[i64]) -> Self {
            Self {
                indices: Mutex::new(HashMap::new()),
                reject: ids.iter().copied().collect(),
                index_calls: AtomicUsize::new(0),
                bulk_calls: AtomicUsize::new(0),
            }
        }

        fn documents(&self, index: &str) -> Vec<Value> {
            self.indices
                .lock()
                .unwrap()
                .get(index)
                .cloned()
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl SearchIndexProvider for MockSearchClient {
        async fn index_document(
            &self,
            index: &str,
            document: &InspectionDocument,
        ) -> Result<(), SearchIndexError> {
            self.index_calls.fetch_add(1, Ordering::SeqCst);
            if self.reject.contains(&document.record().business_id) {
                return Err(SearchIndexError::index("status 400: mapper_parsing_exception"));
            }
            let value = serde_json::to_value(document).unwrap();
            self.indices
                .lock()
                .unwrap()
                .entry(index.to_string())
                .or_default()
                .push(value);
            Ok(())
        }

        async fn bulk_index_documents(
            &self,
            index: &str,
            documents: &[InspectionDocument],
        ) -> Result<inspection_indexer_repository::BatchOperationSummary, SearchIndexError>
        {
            use inspection_indexer_repository::{BatchOperationResult, BatchOperationSummary};

            self.bulk_calls.fetch_add(1, Ordering::SeqCst);
            let mut results = Vec::new();
            for (position, document) in documents.iter().enumerate() {
                if self.reject.contains(&document.record().business_id) {
                    results.push(BatchOperationResult::failed(
                        position,
                        SearchIndexError::index("status 400"),
                    ));
                } else {
                    let value = serde_json::to_value(document).unwrap();
                    self.indices
                        .lock()
                        .unwrap()
                        .entry(index.to_string())
                        .or_default()
                        .push(value);
                    results.push(BatchOperationResult::succeeded(position));
                }
            }
            Ok(BatchOperationSummary::from_results(results))
        }

        async fn ensure_index_exists(&self, index: &str) -> Result<(), SearchIndexError> {
            self.indices
                .lock()
                .unwrap()
                .entry(index.to_string())
                .or_default();
            Ok(())
        }

        async fn health_check(&self) -> Result<bool, SearchIndexError> {
            Ok(true)
        }
    }

    fn record(id: i64) -> InspectionRecord {
        InspectionRecord {
            business_id: id,
            business_name: format!("Business {}", id),
            business_address: "455 Irving St".to_string(),
            business_postal_code: 94122,
            inspection_date: "2023-01-01".to_string(),
            inspection_score: 90.0,
            inspection_type: "Routine - Unscheduled".to_string(),
            violation_description: "Improper food storage".to_string(),
            risk_category: "Low Risk".to_string(),
            current_supervisor_districts: "4".to_string(),
        }
    }

    fn cleaned_file(dir: &TempDir, ids: &[i64]) -> std::path::PathBuf {
        let path = dir.path().join("data_clean.csv");
        let records: Vec<InspectionRecord> = ids.iter().map(|id| record(*id)).collect();
        dataset::write_cleaned(&path, &records).unwrap();
        path
    }

    #[tokio::test]
    async fn test_load_writes_one_document_per_row() {
        let dir = TempDir::new().unwrap();
        let path = cleaned_file(&dir, &[1, 2, 3]);
        let client = Arc::new(MockSearchClient::new());
        let loader = SearchLoader::new(client.clone());

        let report = loader.load(&path, "from_container_m3").await.unwrap();

        assert_eq!(report.total, 3);
        assert_eq!(report.indexed, 3);
        assert!(report.is_complete());
        assert_eq!(client.index_calls.load(Ordering::SeqCst), 3);

        let documents = client.documents("from_container_m3");
        assert_eq!(documents.len(), 3);
        let expected: HashSet<&str> = CLEANED_COLUMNS.iter().map(|(name, _)| *name).collect();
        for (doc, id) in documents.iter().zip([1, 2, 3]) {
            let keys: HashSet<&str> = doc.as_object().unwrap().keys().map(String::as_str).collect();
            assert_eq!(keys, expected);
            assert_eq!(doc["business_id"], id);
        }
    }

    #[tokio::test]
    async fn test_second_load_duplicates_documents() {
        let dir = TempDir::new().unwrap();
        let path = cleaned_file(&dir, &[1, 2, 3]);
        let client = Arc::new(MockSearchClient::new());
        let loader = SearchLoader::new(client.clone());

        loader.load(&path, "m3").await.unwrap();
        loader.load(&path, "m3").await.unwrap();

        assert_eq!(client.documents("m3").len(), 6);
    }

    #[tokio::test]
    async fn test_best_effort_continues_past_failures() {
        let dir = TempDir::new().unwrap();
        let path = cleaned_file(&dir, &[1, 2, 3]);
        let client = Arc::new(MockSearchClient::rejecting(&[2]));
        let loader = SearchLoader::new(client.clone());

        let report = loader.load(&path, "m3").await.unwrap();

        assert_eq!(report.indexed, 2);
        assert_eq!(report.failed, 1);
        assert!(!report.is_complete());
        assert_eq!(client.documents("m3").len(), 2);
    }

    #[tokio::test]
    async fn test_fail_fast_stops_at_first_failure() {
        let dir = TempDir::new().unwrap();
        let path = cleaned_file(&dir, &[1, 2, 3]);
        let client = Arc::new(MockSearchClient::rejecting(&[2]));
        let loader = SearchLoader::with_config(
            client.clone(),
            LoaderConfig {
                failure_policy: WriteFailurePolicy::FailFast,
                batch_size: None,
            },
        );

        let result = loader.load(&path, "m3").await;

        match result {
            Err(PipelineError::IndexWriteError(msg)) => assert!(msg.starts_with("row 2:")),
            other => panic!("expected index write error, got {:?}", other),
        }
        assert_eq!(client.index_calls.load(Ordering::SeqCst), 2);
        assert_eq!(client.documents("m3").len(), 1);
    }

    #[tokio::test]
    async fn test_bulk_mode_batches_requests() {
        let dir = TempDir::new().unwrap();
        let path = cleaned_file(&dir, &[1, 2, 3, 4, 5]);
        let client = Arc::new(MockSearchClient::rejecting(&[4]));
        let loader = SearchLoader::with_config(
            client.clone(),
            LoaderConfig {
                failure_policy: WriteFailurePolicy::BestEffort,
                batch_size: Some(2),
            },
        );

        let report = loader.load(&path, "m3").await.unwrap();

        assert_eq!(client.bulk_calls.load(Ordering::SeqCst), 3);
        assert_eq!(client.index_calls.load(Ordering::SeqCst), 0);
        assert_eq!(report.indexed, 4);
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn test_bulk_fail_fast_reports_row() {
        let dir = TempDir::new().unwrap();
        let path = cleaned_file(&dir, &[1, 2, 3, 4, 5]);
        let client = Arc::new(MockSearchClient::rejecting(&[4]));
        let loader = SearchLoader::with_config(
            client.clone(),
            LoaderConfig {
                failure_policy: WriteFailurePolicy::FailFast,
                batch_size: Some(2),
            },
        );

        let result = loader.load(&path, "m3").await;

        match result {
            Err(PipelineError::IndexWriteError(msg)) => assert!(msg.starts_with("row 4:")),
            other => panic!("expected index write error, got {:?}", other),
        }
        assert_eq!(client.bulk_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_dataset_loads_nothing() {
        let dir = TempDir::new().unwrap();
        let path = cleaned_file(&dir, &[]);
        let client = Arc::new(MockSearchClient::new());
        let loader = SearchLoader::new(client.clone());

        let report = loader.load(&path, "m3").await.unwrap();

        assert_eq!(report.total, 0);
        assert!(report.is_complete());
        assert!(client.documents("m3").is_empty());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "best-effort".parse::<WriteFailurePolicy>().unwrap(),
            WriteFailurePolicy::BestEffort
        );
        assert_eq!(
            "FAIL_FAST".parse::<WriteFailurePolicy>().unwrap(),
            WriteFailurePolicy::FailFast
        );
        assert!("sometimes".parse::<WriteFailurePolicy>().is_err());
    }
}
