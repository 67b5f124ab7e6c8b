//! # Inspection Indexer
//!
//! Main library for the food inspection indexer.
//!
//! This crate provides the entry point and configuration for running
//! the inspection ETL pipeline, either one stage at a time or as a
//! scheduled job.

pub mod config;

pub use config::{etl_config_from_env, Dependencies};

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] inspection_indexer_pipeline::PipelineError),

    /// A pipeline run halted at a stage.
    #[error("Run failed at stage {stage}: {error}")]
    RunFailed { stage: String, error: String },
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
