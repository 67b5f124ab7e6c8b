//! Inspection Indexer
//!
//! Entry point for the food inspection ETL: snapshot the source table,
//! clean it, and index it into OpenSearch.

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use inspection_indexer::{etl_config_from_env, Dependencies, IndexingError};

#[derive(Parser)]
#[command(name = "inspection-indexer")]
#[command(about = "Food inspection ETL into OpenSearch")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Intermediate dataset file (overrides RAW_DATA_PATH)
    #[arg(long, global = true)]
    raw_data_path: Option<PathBuf>,

    /// Cleaned dataset file (overrides CLEAN_DATA_PATH)
    #[arg(long, global = true)]
    clean_data_path: Option<PathBuf>,

    /// Target index (overrides INDEX_NAME)
    #[arg(long, global = true)]
    index_name: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Snapshot the source table into the intermediate dataset
    Extract,
    /// Clean the intermediate dataset into the cleaned dataset
    Transform,
    /// Index the cleaned dataset
    Load,
    /// Run extract, transform and load once, with retries
    Run,
    /// Run daily at the configured time until Ctrl-C
    Schedule,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let mut config = etl_config_from_env().context("Failed to read configuration")?;
    if let Some(path) = cli.raw_data_path {
        config.raw_data_path = path;
    }
    if let Some(path) = cli.clean_data_path {
        config.clean_data_path = path;
    }
    if let Some(index) = cli.index_name {
        config.index_name = index;
    }

    let deps = Dependencies::new(&config).await?;

    match cli.command {
        Commands::Extract => {
            let output = deps.pipeline.extractor().extract().await?;
            info!(
                rows = output.row_count,
                path = %output.path.display(),
                "Extraction complete"
            );
        }
        Commands::Transform => {
            let output = deps
                .pipeline
                .transformer()
                .transform(&config.raw_data_path)?;
            info!(
                input_rows = output.stats.input_rows,
                duplicate_rows = output.stats.duplicate_rows,
                incomplete_rows = output.stats.incomplete_rows,
                output_rows = output.stats.output_rows,
                path = %output.path.display(),
                "Transformation complete"
            );
        }
        Commands::Load => {
            deps.verify_search_engine().await?;
            let report = deps
                .pipeline
                .loader()
                .load(&config.clean_data_path, &config.index_name)
                .await?;
            info!(
                index = %report.index,
                total = report.total,
                indexed = report.indexed,
                failed = report.failed,
                "Load complete"
            );
        }
        Commands::Run => {
            deps.verify_search_engine().await?;
            let report = deps.orchestrator.run_once(Utc::now()).await;
            if let Some(failed) = report.failed_stage() {
                return Err(IndexingError::RunFailed {
                    stage: failed.stage.to_string(),
                    error: failed.error.clone().unwrap_or_default(),
                }
                .into());
            }
        }
        Commands::Schedule => {
            deps.verify_search_engine().await?;
            deps.orchestrator.run_scheduled().await?;
        }
    }

    Ok(())
}
