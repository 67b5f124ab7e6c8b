//! # Inspection Indexer Repository
//!
//! This crate provides traits and implementations for the two external
//! services the pipeline talks to: the relational source store the raw rows
//! are read from, and the search index the cleaned documents are written to.
//! It includes definitions for errors, interfaces, and concrete
//! implementations for PostgreSQL and OpenSearch.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod postgres;
pub mod types;

pub use config::{SearchIndexConfig, SourceConnection};
pub use errors::{SearchIndexError, SourceError};
pub use interfaces::{SearchIndexProvider, SourceStore};
pub use opensearch::OpenSearchClient;
pub use postgres::PostgresSource;
pub use types::{BatchOperationResult, BatchOperationSummary};
