//! Dependency initialization and wiring for the inspection indexer.

use std::sync::Arc;
use tracing::info;

use crate::IndexingError;
use inspection_indexer_pipeline::{
    extractor::Extractor,
    loader::SearchLoader,
    orchestrator::{EtlPipeline, Orchestrator},
    transformer::Transformer,
    EtlConfig,
};
use inspection_indexer_repository::{OpenSearchClient, PostgresSource, SearchIndexConfig};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The stages, for invoking one at a time.
    pub pipeline: Arc<EtlPipeline>,
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
}

impl Dependencies {
    /// Wire the pipeline from configuration.
    ///
    /// No connection is opened here; the source store is contacted on
    /// extraction and the search engine on load or [`Dependencies::verify_search_engine`].
    pub async fn new(config: &EtlConfig) -> Result<Self, IndexingError> {
        info!(
            source_host = %config.source.host,
            source_database = %config.source.database,
            table = %config.table,
            opensearch_url = %config.search_url,
            index = %config.index_name,
            "Initializing dependencies"
        );

        let source = PostgresSource::new(config.source.clone());

        let search_client = OpenSearchClient::new(&config.search_url, SearchIndexConfig::default())
            .await
            .map_err(|e| {
                IndexingError::config(format!("Failed to create OpenSearch client: {}", e))
            })?;

        let extractor = Extractor::new(Arc::new(source), &config.table, &config.raw_data_path);
        let transformer = Transformer::new(&config.clean_data_path);
        let loader = SearchLoader::with_config(Arc::new(search_client), config.loader.clone());

        let pipeline = Arc::new(EtlPipeline::new(extractor, transformer, loader));

        let orchestrator = Orchestrator::with_config(
            pipeline.clone(),
            &config.index_name,
            config.orchestrator.clone(),
        );

        Ok(Self {
            pipeline,
            orchestrator,
        })
    }

    /// Verify the search engine is reachable and healthy.
    pub async fn verify_search_engine(&self) -> Result<(), IndexingError> {
        let healthy = self
            .pipeline
            .loader()
            .health_check()
            .await
            .map_err(|e| IndexingError::config(format!("OpenSearch health check failed: {}", e)))?;

        if !healthy {
            return Err(IndexingError::config("OpenSearch cluster is unhealthy"));
        }

        info!("OpenSearch connection verified");
        Ok(())
    }
}
