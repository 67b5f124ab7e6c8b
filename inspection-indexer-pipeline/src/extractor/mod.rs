//! Extractor module for the inspection indexer pipeline.
//!
//! Reads the full source table and persists it as the intermediate dataset.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::dataset;
use crate::errors::PipelineError;
use inspection_indexer_repository::SourceStore;

/// Result of a successful extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOutput {
    /// Where the intermediate dataset was written.
    pub path: PathBuf,
    pub row_count: usize,
    /// Column names as returned by the source query.
    pub columns: Vec<String>,
}

/// Extractor that snapshots one source table into a tabular file.
///
/// Every call performs a full scan and replaces the output file, so the
/// stage can be re-run safely.
pub struct Extractor {
    source: Arc<dyn SourceStore>,
    table: String,
    output_path: PathBuf,
}

impl Extractor {
    /// Create a new extractor reading `table` into `output_path`.
    pub fn new(
        source: Arc<dyn SourceStore>,
        table: impl Into<String>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            table: table.into(),
            output_path: output_path.into(),
        }
    }

    /// Fetch the whole table and write it to the output path.
    ///
    /// Nothing is written unless the complete result set was fetched.
    #[instrument(skip(self), fields(table = %self.table, output = %self.output_path.display()))]
    pub async fn extract(&self) -> Result<ExtractOutput, PipelineError> {
        let raw = self.source.fetch_table(&self.table).await?;

        dataset::write_raw(&self.output_path, &raw)?;

        info!(
            rows = raw.row_count(),
            columns = raw.columns.len(),
            "Extracted source table"
        );

        Ok(ExtractOutput {
            path: self.output_path.clone(),
            row_count: raw.row_count(),
            columns: raw.columns,
        })
    }
}
