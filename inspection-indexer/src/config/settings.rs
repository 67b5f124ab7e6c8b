//! Builds the pipeline configuration from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::IndexingError;
use inspection_indexer_pipeline::loader::{LoaderConfig, WriteFailurePolicy};
use inspection_indexer_pipeline::orchestrator::{DailySchedule, RetryPolicy};
use inspection_indexer_pipeline::EtlConfig;
use inspection_indexer_repository::SearchIndexConfig;

/// Build the configuration from the process environment.
///
/// # Environment Variables
///
/// - `POSTGRES_HOST`, `POSTGRES_PORT`, `POSTGRES_USER`, `POSTGRES_PASSWORD`, `POSTGRES_DB`:
///   source store connection (default: postgres:5432, airflow/airflow, database airflow)
/// - `SOURCE_TABLE`: table to snapshot (default: table_m3)
/// - `RAW_DATA_PATH`: intermediate dataset file (default: data_raw.csv)
/// - `CLEAN_DATA_PATH`: cleaned dataset file (default: data_clean.csv)
/// - `OPENSEARCH_URL`: search engine URL (default: http://elasticsearch:9200)
/// - `INDEX_NAME`: target index (default: from_container_m3)
/// - `LOAD_FAILURE_POLICY`: `best-effort` or `fail-fast` (default: best-effort)
/// - `LOAD_BATCH_SIZE`: documents per bulk request; unset writes one document per request
/// - `SCHEDULE_TIME`: daily trigger, `HH:MM` UTC (default: 23:30)
/// - `RETRIES`: retries per failed stage (default: 1)
/// - `RETRY_DELAY_SECS`: wait between attempts (default: 180)
pub fn etl_config_from_env() -> Result<EtlConfig, IndexingError> {
    etl_config_from_lookup(|key| std::env::var(key).ok())
}

/// Build the configuration from an arbitrary variable lookup.
///
/// Unset and empty variables fall back to their defaults.
pub fn etl_config_from_lookup<F>(lookup: F) -> Result<EtlConfig, IndexingError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    let mut config = EtlConfig::default();

    if let Some(host) = get("POSTGRES_HOST") {
        config.source.host = host;
    }
    if let Some(port) = parse::<u16>(&get, "POSTGRES_PORT")? {
        config.source.port = port;
    }
    if let Some(user) = get("POSTGRES_USER") {
        config.source.user = user;
    }
    if let Some(password) = get("POSTGRES_PASSWORD") {
        config.source.password = password;
    }
    if let Some(database) = get("POSTGRES_DB") {
        config.source.database = database;
    }
    if let Some(table) = get("SOURCE_TABLE") {
        config.table = table;
    }
    if let Some(path) = get("RAW_DATA_PATH") {
        config.raw_data_path = PathBuf::from(path);
    }
    if let Some(path) = get("CLEAN_DATA_PATH") {
        config.clean_data_path = PathBuf::from(path);
    }
    if let Some(url) = get("OPENSEARCH_URL") {
        config.search_url = url;
    }
    if let Some(index) = get("INDEX_NAME") {
        config.index_name = index;
    }

    config.loader = LoaderConfig {
        failure_policy: parse::<WriteFailurePolicy>(&get, "LOAD_FAILURE_POLICY")?
            .unwrap_or_default(),
        batch_size: parse_batch_size(&get)?,
    };

    if let Some(schedule) = parse::<DailySchedule>(&get, "SCHEDULE_TIME")? {
        config.orchestrator.schedule = schedule;
    }

    let defaults = RetryPolicy::default();
    config.orchestrator.retry = RetryPolicy::new(
        parse::<u32>(&get, "RETRIES")?.unwrap_or(defaults.retries),
        parse::<u64>(&get, "RETRY_DELAY_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.delay),
    );

    Ok(config)
}

/// Bulk batches must fit the search client's per-request limit.
fn parse_batch_size<G>(get: &G) -> Result<Option<usize>, IndexingError>
where
    G: Fn(&str) -> Option<String>,
{
    let Some(size) = parse::<usize>(get, "LOAD_BATCH_SIZE")? else {
        return Ok(None);
    };

    let max = SearchIndexConfig::default().max_batch_size.unwrap_or(usize::MAX);
    if size == 0 || size > max {
        return Err(IndexingError::config(format!(
            "LOAD_BATCH_SIZE must be between 1 and {}, got {}",
            max, size
        )));
    }

    Ok(Some(size))
}

fn parse<T>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, IndexingError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get(key)
        .map(|value| {
            value.trim().parse::<T>().map_err(|e| {
                IndexingError::config(format!("Invalid {} value {:?}: {}", key, value, e))
            })
        })
        .transpose()
}
