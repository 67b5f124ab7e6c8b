//! Pipeline configuration.

use std::path::PathBuf;

use crate::loader::LoaderConfig;
use crate::orchestrator::OrchestratorConfig;
use inspection_indexer_repository::SourceConnection;

pub const DEFAULT_SOURCE_TABLE: &str = "table_m3";
pub const DEFAULT_RAW_DATA_PATH: &str = "data_raw.csv";
pub const DEFAULT_CLEAN_DATA_PATH: &str = "data_clean.csv";
pub const DEFAULT_SEARCH_URL: &str = "http://elasticsearch:9200";
pub const DEFAULT_INDEX_NAME: &str = "from_container_m3";

/// Everything a run needs, passed in explicitly.
#[derive(Debug, Clone)]
pub struct EtlConfig {
    pub source: SourceConnection,
    /// Table to snapshot, optionally schema-qualified.
    pub table: String,
    pub raw_data_path: PathBuf,
    pub clean_data_path: PathBuf,
    pub search_url: String,
    pub index_name: String,
    pub loader: LoaderConfig,
    pub orchestrator: OrchestratorConfig,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            source: SourceConnection::new("postgres", 5432, "airflow", "airflow", "airflow"),
            table: DEFAULT_SOURCE_TABLE.to_string(),
            raw_data_path: PathBuf::from(DEFAULT_RAW_DATA_PATH),
            clean_data_path: PathBuf::from(DEFAULT_CLEAN_DATA_PATH),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            index_name: DEFAULT_INDEX_NAME.to_string(),
            loader: LoaderConfig::default(),
            orchestrator: OrchestratorConfig::default(),
        }
    }
}
