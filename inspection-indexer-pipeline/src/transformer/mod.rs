//! Transformer module for the inspection indexer pipeline.
//!
//! Turns the loosely-typed intermediate dataset into the fixed ten-column
//! cleaned dataset. The cleaning steps run in a fixed order, each relying on
//! the previous one:
//!
//! 1. **Header normalization**: spaces become underscores, names are lower-cased
//! 2. **Column projection**: keep exactly the ten cleaned columns
//! 3. **Duplicate elimination**: first row per (id, date, score) wins
//! 4. **Null elimination**: drop rows missing any of the ten values
//! 5. **Type coercion**: cast every value, failing the whole run on the first bad one

mod coerce;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::dataset;
use crate::errors::PipelineError;
use coerce::{to_float, to_integer};
use inspection_indexer_shared::{
    ColumnType, InspectionRecord, RawDataset, CLEANED_COLUMNS, DEDUP_KEY,
};

const WIDTH: usize = CLEANED_COLUMNS.len();

/// Row counts observed while cleaning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformStats {
    pub input_rows: usize,
    /// Rows dropped because an earlier row had the same (id, date, score).
    pub duplicate_rows: usize,
    /// Rows dropped because at least one cleaned column was missing.
    pub incomplete_rows: usize,
    pub output_rows: usize,
}

/// Result of a successful transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    /// Where the cleaned dataset was written.
    pub path: PathBuf,
    pub stats: TransformStats,
}

/// Transformer that cleans an intermediate dataset into the cleaned dataset.
///
/// Output is a pure function of the input file, and the output path is fully
/// replaced on every call.
pub struct Transformer {
    output_path: PathBuf,
}

impl Transformer {
    /// Create a new transformer writing to `output_path`.
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
        }
    }

    /// Clean the dataset at `input_path` and write the result.
    ///
    /// # Errors
    ///
    /// * `SchemaError` - a cleaned column is absent after normalization
    /// * `TypeCoercionError` - a retained value cannot be cast to its type
    /// * `DatasetError` / `IoError` - the input cannot be read or the output written
    #[instrument(skip(self), fields(input = %input_path.display(), output = %self.output_path.display()))]
    pub fn transform(&self, input_path: &Path) -> Result<TransformOutput, PipelineError> {
        let raw = dataset::read_raw(input_path)?;
        let (records, stats) = clean(&raw)?;

        dataset::write_cleaned(&self.output_path, &records)?;

        info!(
            input_rows = stats.input_rows,
            duplicate_rows = stats.duplicate_rows,
            incomplete_rows = stats.incomplete_rows,
            output_rows = stats.output_rows,
            "Transformed dataset"
        );

        Ok(TransformOutput {
            path: self.output_path.clone(),
            stats,
        })
    }
}

/// Normalize a column name: spaces to underscores, then lower-case.
pub fn normalize_header(name: &str) -> String {
    name.replace(' ', "_").to_lowercase()
}

/// Run the full cleaning sequence over a raw dataset.
pub fn clean(raw: &RawDataset) -> Result<(Vec<InspectionRecord>, TransformStats), PipelineError> {
    let positions = project_columns(&raw.columns)?;
    let input_rows = raw.row_count();

    let key_slots = DEDUP_KEY.map(slot_of);
    let mut seen = HashSet::with_capacity(input_rows);
    let mut unique = Vec::with_capacity(input_rows);

    // Row numbers are 1-based positions in the input so errors point at the file.
    for (index, row) in raw.rows.iter().enumerate() {
        let cells: [Option<&str>; WIDTH] =
            positions.map(|p| row.get(p).and_then(|v| v.as_deref()));
        let key = key_slots.map(|slot| KeyPart::from_cell(cells[slot]));

        if seen.insert(key) {
            unique.push((index + 1, cells));
        }
    }
    let duplicate_rows = input_rows - unique.len();

    let complete: Vec<(usize, [&str; WIDTH])> = unique
        .into_iter()
        .filter_map(|(row, cells)| {
            let mut values = [""; WIDTH];
            for (slot, cell) in cells.iter().enumerate() {
                values[slot] = (*cell)?;
            }
            Some((row, values))
        })
        .collect();
    let incomplete_rows = input_rows - duplicate_rows - complete.len();

    let records = complete
        .into_iter()
        .map(|(row, values)| coerce_row(row, values))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        duplicate_rows = duplicate_rows,
        incomplete_rows = incomplete_rows,
        "Cleaned rows"
    );

    let stats = TransformStats {
        input_rows,
        duplicate_rows,
        incomplete_rows,
        output_rows: records.len(),
    };

    Ok((records, stats))
}

/// Locate each cleaned column among the normalized headers.
///
/// If two headers normalize to the same name, the first one is used.
fn project_columns(columns: &[String]) -> Result<[usize; WIDTH], PipelineError> {
    let normalized: Vec<String> = columns.iter().map(|c| normalize_header(c)).collect();

    let mut positions = [0usize; WIDTH];
    let mut missing = Vec::new();

    for (slot, (name, _)) in CLEANED_COLUMNS.iter().enumerate() {
        match normalized.iter().position(|c| c == name) {
            Some(position) => positions[slot] = position,
            None => missing.push(*name),
        }
    }

    if !missing.is_empty() {
        return Err(PipelineError::schema(format!(
            "missing required columns after normalization: {}",
            missing.join(", ")
        )));
    }

    Ok(positions)
}

fn slot_of(column: &str) -> usize {
    CLEANED_COLUMNS
        .iter()
        .position(|(name, _)| *name == column)
        .unwrap_or_else(|| unreachable!("dedup column {} is not a cleaned column", column))
}

/// One component of the duplicate key.
///
/// Numeric-looking values compare by value so `90` and `90.0` collide.
/// Integral values are keyed exactly as integers; only non-integral numbers
/// go through their float bits. Other values compare as trimmed text, and
/// missing values are equal to each other.
#[derive(Debug, PartialEq, Eq, Hash)]
enum KeyPart<'a> {
    Missing,
    Int(i64),
    Float(u64),
    Text(&'a str),
}

impl<'a> KeyPart<'a> {
    fn from_cell(cell: Option<&'a str>) -> Self {
        let Some(value) = cell else {
            return KeyPart::Missing;
        };

        if let Some(i) = to_integer(value) {
            return KeyPart::Int(i);
        }

        match to_float(value) {
            Some(f) => KeyPart::Float(f.to_bits()),
            None => KeyPart::Text(value.trim()),
        }
    }
}

fn coerce_row(row: usize, values: [&str; WIDTH]) -> Result<InspectionRecord, PipelineError> {
    let [
        business_id,
        business_name,
        business_address,
        business_postal_code,
        inspection_date,
        inspection_score,
        inspection_type,
        violation_description,
        risk_category,
        current_supervisor_districts,
    ] = values;

    Ok(InspectionRecord {
        business_id: integer(row, "business_id", business_id)?,
        business_name: business_name.to_string(),
        business_address: business_address.to_string(),
        business_postal_code: integer(row, "business_postal_code", business_postal_code)?,
        inspection_date: inspection_date.to_string(),
        inspection_score: float(row, "inspection_score", inspection_score)?,
        inspection_type: inspection_type.to_string(),
        violation_description: violation_description.to_string(),
        risk_category: risk_category.to_string(),
        current_supervisor_districts: current_supervisor_districts.to_string(),
    })
}

fn integer(row: usize, column: &str, value: &str) -> Result<i64, PipelineError> {
    to_integer(value).ok_or_else(|| PipelineError::coercion(row, column, value, ColumnType::Integer))
}

fn float(row: usize, column: &str, value: &str) -> Result<f64, PipelineError> {
    to_float(value).ok_or_else(|| PipelineError::coercion(row, column, value, ColumnType::Float))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Source-style headers, before normalization.
    const HEADERS: [&str; 11] = [
        "Business ID",
        "Business Name",
        "Business Address",
        "Business City",
        "Business Postal Code",
        "Inspection Date",
        "Inspection Score",
        "Inspection Type",
        "Violation Description",
        "Risk Category",
        "Current Supervisor Districts",
    ];

    fn raw(rows: Vec<Vec<Option<String>>>) -> RawDataset {
        let mut dataset = RawDataset::new(HEADERS.iter().map(|h| h.to_string()).collect());
        for row in rows {
            dataset.push_row(row);
        }
        dataset
    }

    fn row(id: &str, date: &str, score: &str, postal: &str) -> Vec<Option<String>> {
        [
            id,
            "Cafe Lupe",
            "100 Mission St",
            "San Francisco",
            postal,
            date,
            score,
            "Routine - Unscheduled",
            "Moderate risk food holding temperature",
            "Moderate Risk",
            "6",
        ]
        .into_iter()
        .map(|v| Some(v.to_string()))
        .collect()
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("Business Postal Code"), "business_postal_code");
        assert_eq!(normalize_header("risk_category"), "risk_category");
        assert_eq!(normalize_header("Inspection  Score"), "inspection__score");
    }

    #[test]
    fn test_projection_drops_extra_columns() {
        let (records, stats) = clean(&raw(vec![row("1", "2023-01-01", "90", "94103")])).unwrap();

        assert_eq!(stats.output_rows, 1);
        assert_eq!(records[0].business_id, 1);
        assert_eq!(records[0].business_postal_code, 94103);
        assert_eq!(records[0].inspection_score, 90.0);
        assert_eq!(records[0].current_supervisor_districts, "6");
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let mut dataset = raw(vec![row("1", "2023-01-01", "90", "94103")]);
        dataset.columns[9] = "Risk".to_string();
        dataset.columns[10] = "Districts".to_string();

        let err = clean(&dataset).unwrap_err();

        match err {
            PipelineError::SchemaError(msg) => {
                assert!(msg.contains("risk_category"));
                assert!(msg.contains("current_supervisor_districts"));
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_keeps_first_occurrence() {
        let (records, stats) = clean(&raw(vec![
            row("1", "2023-01-01", "90.0", "94103"),
            row("1", "2023-01-01", "90.0", "94110"),
        ]))
        .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].business_postal_code, 94103);
        assert_eq!(stats.duplicate_rows, 1);
    }

    #[test]
    fn test_duplicate_key_compares_numbers_by_value() {
        let (records, _) = clean(&raw(vec![
            row("1", "2023-01-01", "90", "94103"),
            row("1.0", "2023-01-01", "90.0", "94110"),
            row("1", "2023-01-02", "90", "94112"),
        ]))
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].inspection_date, "2023-01-02");
    }

    #[test]
    fn test_duplicate_key_keeps_large_ids_distinct() {
        // Adjacent integers above 2^53 share one f64 representation.
        let (records, stats) = clean(&raw(vec![
            row("9007199254740992", "2023-01-01", "90", "94103"),
            row("9007199254740993", "2023-01-01", "90", "94103"),
        ]))
        .unwrap();

        assert_eq!(stats.duplicate_rows, 0);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].business_id, 9_007_199_254_740_992);
        assert_eq!(records[1].business_id, 9_007_199_254_740_993);
    }

    #[test]
    fn test_duplicate_key_compares_fractional_scores_by_value() {
        let (records, _) = clean(&raw(vec![
            row("1", "2023-01-01", "87.5", "94103"),
            row("1", "2023-01-01", "87.50", "94110"),
            row("1", "2023-01-01", "87.25", "94112"),
        ]))
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].business_postal_code, 94103);
        assert_eq!(records[1].inspection_score, 87.25);
    }

    #[test]
    fn test_colliding_headers_use_first_column() {
        let mut columns = vec!["business_id".to_string()];
        columns.extend(HEADERS.iter().map(|h| h.to_string()));
        let mut dataset = RawDataset::new(columns);

        let mut cells = vec![Some("7".to_string())];
        cells.extend(row("1", "2023-01-01", "90", "94103"));
        dataset.push_row(cells);

        let (records, _) = clean(&dataset).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].business_id, 7);
    }

    #[test]
    fn test_dedup_runs_before_null_elimination() {
        // The first row claims the key even though it is later dropped for a
        // missing value, so the complete second row is a duplicate.
        let mut first = row("1", "2023-01-01", "90", "94103");
        first[9] = None;
        let second = row("1", "2023-01-01", "90", "94110");

        let (records, stats) = clean(&raw(vec![first, second])).unwrap();

        assert!(records.is_empty());
        assert_eq!(stats.duplicate_rows, 1);
        assert_eq!(stats.incomplete_rows, 1);
    }

    #[test]
    fn test_rows_with_missing_key_values_collide() {
        let mut first = row("1", "2023-01-01", "90", "94103");
        first[6] = None;
        let mut second = row("1", "2023-01-01", "90", "94110");
        second[6] = None;

        let (_, stats) = clean(&raw(vec![first, second])).unwrap();

        assert_eq!(stats.duplicate_rows, 1);
        assert_eq!(stats.incomplete_rows, 1);
    }

    #[test]
    fn test_missing_value_drops_row() {
        let mut incomplete = row("2", "2023-02-01", "85", "94110");
        incomplete[9] = None;

        let (records, stats) = clean(&raw(vec![
            row("1", "2023-01-01", "90", "94103"),
            incomplete,
            row("3", "2023-03-01", "70", "94112"),
            row("3", "2023-03-01", "70", "94112"),
        ]))
        .unwrap();

        assert_eq!(stats.input_rows, 4);
        assert_eq!(stats.incomplete_rows, 1);
        assert_eq!(stats.duplicate_rows, 1);
        assert_eq!(records.len(), 4 - 1 - 1);
        assert!(records.iter().all(|r| r.business_id != 2));
    }

    #[test]
    fn test_missing_value_in_dropped_column_is_ignored() {
        let mut r = row("1", "2023-01-01", "90", "94103");
        r[3] = None;

        let (records, _) = clean(&raw(vec![r])).unwrap();

        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_non_numeric_postal_code_fails_transform() {
        let err = clean(&raw(vec![
            row("1", "2023-01-01", "90", "94103"),
            row("2", "2023-01-01", "90", "CA"),
        ]))
        .unwrap_err();

        match err {
            PipelineError::TypeCoercionError {
                row,
                column,
                value,
                expected,
            } => {
                assert_eq!(row, 2);
                assert_eq!(column, "business_postal_code");
                assert_eq!(value, "CA");
                assert_eq!(expected, ColumnType::Integer);
            }
            other => panic!("expected coercion error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_score_fails_transform() {
        let err = clean(&raw(vec![row("1", "2023-01-01", "good", "94103")])).unwrap_err();

        assert!(matches!(
            err,
            PipelineError::TypeCoercionError { expected: ColumnType::Float, .. }
        ));
    }

    #[test]
    fn test_output_is_null_free_and_unique() {
        let mut incomplete = row("4", "2023-01-04", "60", "94103");
        incomplete[1] = None;
        let (records, _) = clean(&raw(vec![
            row("1", "2023-01-01", "90", "94103"),
            row("1", "2023-01-01", "90", "94103"),
            row("1", "2023-01-02", "90", "94103"),
            row("2", "2023-01-01", "88", "94104"),
            incomplete,
        ]))
        .unwrap();

        let keys: HashSet<(i64, String, u64)> = records
            .iter()
            .map(|r| (r.business_id, r.inspection_date.clone(), r.inspection_score.to_bits()))
            .collect();
        assert_eq!(keys.len(), records.len());
        assert!(records.iter().all(|r| !r.business_name.is_empty()));
    }

    #[test]
    fn test_transform_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("data_raw.csv");
        let output = dir.path().join("data_clean.csv");
        dataset::write_raw(
            &input,
            &raw(vec![
                row("1", "2023-01-01", "90", "94103"),
                row("2", "2023-01-01", "87.5", "94110.0"),
                row("1", "2023-01-01", "90", "94112"),
            ]),
        )
        .unwrap();
        let transformer = Transformer::new(&output);

        let first = transformer.transform(&input).unwrap();
        let first_bytes = fs::read(&output).unwrap();
        let second = transformer.transform(&input).unwrap();
        let second_bytes = fs::read(&output).unwrap();

        assert_eq!(first, second);
        assert_eq!(first_bytes, second_bytes);
        assert_eq!(first.stats.output_rows, 2);

        let cleaned = dataset::read_cleaned(&output).unwrap();
        assert_eq!(cleaned[1].business_postal_code, 94110);
        assert_eq!(cleaned[1].inspection_score, 87.5);
    }

    #[test]
    fn test_failed_transform_keeps_previous_output() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.csv");
        let bad = dir.path().join("bad.csv");
        let output = dir.path().join("data_clean.csv");
        dataset::write_raw(&good, &raw(vec![row("1", "2023-01-01", "90", "94103")])).unwrap();
        dataset::write_raw(&bad, &raw(vec![row("1", "2023-01-01", "90", "N/A-94103")])).unwrap();
        let transformer = Transformer::new(&output);

        transformer.transform(&good).unwrap();
        let before = fs::read(&output).unwrap();
        let result = transformer.transform(&bad);

        assert!(matches!(result, Err(PipelineError::TypeCoercionError { .. })));
        assert_eq!(fs::read(&output).unwrap(), before);
    }
}
