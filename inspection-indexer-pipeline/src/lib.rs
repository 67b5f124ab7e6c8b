//! # Inspection Indexer Pipeline
//!
//! This crate provides the pipeline components for snapshotting the
//! inspection table, cleaning it, and indexing it into OpenSearch.
//!
//! ## Architecture
//!
//! The pipeline follows the Extractor-Transformer-Loader pattern:
//!
//! 1. **Extractor**: Reads the source table into the intermediate dataset file
//! 2. **Transformer**: Cleans the intermediate dataset into the cleaned dataset file
//! 3. **Loader**: Indexes each cleaned row as one search document
//! 4. **Orchestrator**: Chains the stages with retries on a daily schedule
//!
//! Stages hand off through dataset files only, so each one can be invoked
//! on its own.

pub mod config;
pub mod dataset;
pub mod errors;
pub mod extractor;
pub mod loader;
pub mod orchestrator;
pub mod transformer;

pub use config::EtlConfig;
pub use errors::PipelineError;
