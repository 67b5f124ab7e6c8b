//! The three ETL stages as independently invocable operations.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::errors::PipelineError;
use crate::extractor::Extractor;
use crate::loader::{LoadReport, SearchLoader};
use crate::transformer::Transformer;

/// Extract, transform and load.
///
/// Stages share no state; each one receives its input by path.
#[async_trait]
pub trait EtlStages: Send + Sync {
    /// Snapshot the source table. Returns the intermediate dataset path.
    async fn extract(&self) -> Result<PathBuf, PipelineError>;

    /// Clean the dataset at `input_path`. Returns the cleaned dataset path.
    async fn transform(&self, input_path: &Path) -> Result<PathBuf, PipelineError>;

    /// Write the cleaned dataset at `input_path` into `index_name`.
    async fn load(&self, input_path: &Path, index_name: &str)
        -> Result<LoadReport, PipelineError>;
}

/// [`EtlStages`] backed by the real extractor, transformer and loader.
pub struct EtlPipeline {
    extractor: Extractor,
    transformer: Transformer,
    loader: SearchLoader,
}

impl EtlPipeline {
    pub fn new(extractor: Extractor, transformer: Transformer, loader: SearchLoader) -> Self {
        Self {
            extractor,
            transformer,
            loader,
        }
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    pub fn transformer(&self) -> &Transformer {
        &self.transformer
    }

    pub fn loader(&self) -> &SearchLoader {
        &self.loader
    }
}

#[async_trait]
impl EtlStages for EtlPipeline {
    async fn extract(&self) -> Result<PathBuf, PipelineError> {
        Ok(self.extractor.extract().await?.path)
    }

    async fn transform(&self, input_path: &Path) -> Result<PathBuf, PipelineError> {
        Ok(self.transformer.transform(input_path)?.path)
    }

    async fn load(
        &self,
        input_path: &Path,
        index_name: &str,
    ) -> Result<LoadReport, PipelineError> {
        self.loader.load(input_path, index_name).await
    }
}
