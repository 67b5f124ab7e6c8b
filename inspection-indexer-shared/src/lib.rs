//! # Inspection Indexer Shared
//!
//! Shared types for the inspection indexer: the loosely-typed raw dataset
//! produced by extraction, the fixed ten-column cleaned record produced by
//! the transform, and the search document written by the loader.

pub mod dataset;
pub mod record;

pub use dataset::RawDataset;
pub use record::{ColumnType, InspectionDocument, InspectionRecord, CLEANED_COLUMNS, DEDUP_KEY};
