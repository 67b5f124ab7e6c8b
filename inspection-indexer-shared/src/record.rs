//! Cleaned record and search document types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Scalar type a cleaned column is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Text,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "integer"),
            ColumnType::Float => write!(f, "float"),
            ColumnType::Text => write!(f, "text"),
        }
    }
}

/// The ten retained columns, in output order, with their declared types.
pub const CLEANED_COLUMNS: [(&str, ColumnType); 10] = [
    ("business_id", ColumnType::Integer),
    ("business_name", ColumnType::Text),
    ("business_address", ColumnType::Text),
    ("business_postal_code", ColumnType::Integer),
    ("inspection_date", ColumnType::Text),
    ("inspection_score", ColumnType::Float),
    ("inspection_type", ColumnType::Text),
    ("violation_description", ColumnType::Text),
    ("risk_category", ColumnType::Text),
    ("current_supervisor_districts", ColumnType::Text),
];

/// Columns that identify an inspection. Rows agreeing on all three are duplicates.
pub const DEDUP_KEY: [&str; 3] = ["business_id", "inspection_date", "inspection_score"];

/// One fully-typed, null-free inspection row.
///
/// Field order matches [`CLEANED_COLUMNS`], which is also the column order of
/// the cleaned dataset file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionRecord {
    pub business_id: i64,
    pub business_name: String,
    pub business_address: String,
    pub business_postal_code: i64,
    /// Kept as text; no date parsing is applied.
    pub inspection_date: String,
    pub inspection_score: f64,
    pub inspection_type: String,
    pub violation_description: String,
    pub risk_category: String,
    pub current_supervisor_districts: String,
}

/// Search-engine representation of one cleaned record.
///
/// Serializes to a flat JSON object whose keys are exactly the cleaned column
/// names. No document identifier is carried, so the search engine assigns one
/// on every write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InspectionDocument(pub InspectionRecord);

impl From<InspectionRecord> for InspectionDocument {
    fn from(record: InspectionRecord) -> Self {
        Self(record)
    }
}

impl InspectionDocument {
    /// The record this document was built from.
    pub fn record(&self) -> &InspectionRecord {
        &self.0
    }
}
