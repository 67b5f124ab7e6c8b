//! Tabular dataset files.
//!
//! Both the intermediate (raw) and the cleaned dataset are CSV files with a
//! header row. Writes go to a sibling temporary file that is renamed over the
//! target once complete, so a reader sees either the previous file or the
//! full new one, never a partial write.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::PipelineError;
use inspection_indexer_shared::{InspectionRecord, RawDataset, CLEANED_COLUMNS};

/// Cell contents treated as a missing value when reading a dataset file.
///
/// These are the NA markers conventionally recognized by tabular tools, plus
/// the empty field a NULL is written as.
pub const NA_VALUES: [&str; 19] = [
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "<NA>", "#N/A",
    "#N/A N/A", "#NA", "1.#IND", "1.#QNAN", "-1.#IND", "-1.#QNAN",
];

/// Whether a raw cell denotes a missing value.
pub fn is_missing(cell: &str) -> bool {
    NA_VALUES.contains(&cell)
}

/// Read an intermediate dataset.
pub fn read_raw(path: &Path) -> Result<RawDataset, PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    let columns = reader.headers()?.iter().map(str::to_string).collect();
    let mut dataset = RawDataset::new(columns);

    for record in reader.records() {
        let record = record?;
        let row = record
            .iter()
            .map(|cell| {
                if is_missing(cell) {
                    None
                } else {
                    Some(cell.to_string())
                }
            })
            .collect();
        dataset.push_row(row);
    }

    debug!(path = %path.display(), rows = dataset.row_count(), "Read raw dataset");
    Ok(dataset)
}

/// Write an intermediate dataset, replacing any existing file.
///
/// Missing values are written as empty fields.
pub fn write_raw(path: &Path, dataset: &RawDataset) -> Result<(), PipelineError> {
    write_atomically(path, |tmp| {
        let mut writer = csv::Writer::from_path(tmp)?;
        writer.write_record(&dataset.columns)?;
        for row in &dataset.rows {
            writer.write_record(row.iter().map(|v| v.as_deref().unwrap_or("")))?;
        }
        writer.flush()?;
        Ok(())
    })?;

    debug!(path = %path.display(), rows = dataset.row_count(), "Wrote raw dataset");
    Ok(())
}

/// Read a cleaned dataset.
///
/// Columns are matched by header name, so column order in the file does not
/// matter. A row that does not deserialize into an [`InspectionRecord`] is a
/// [`PipelineError::DatasetError`].
pub fn read_cleaned(path: &Path) -> Result<Vec<InspectionRecord>, PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    let records = reader
        .deserialize()
        .collect::<Result<Vec<InspectionRecord>, csv::Error>>()?;

    debug!(path = %path.display(), rows = records.len(), "Read cleaned dataset");
    Ok(records)
}

/// Write a cleaned dataset, replacing any existing file.
///
/// The header is always written, even when there are no records.
pub fn write_cleaned(path: &Path, records: &[InspectionRecord]) -> Result<(), PipelineError> {
    write_atomically(path, |tmp| {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(tmp)?;
        writer.write_record(CLEANED_COLUMNS.iter().map(|(name, _)| *name))?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    })?;

    debug!(path = %path.display(), rows = records.len(), "Wrote cleaned dataset");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_atomically<F>(path: &Path, write: F) -> Result<(), PipelineError>
where
    F: FnOnce(&Path) -> Result<(), PipelineError>,
{
    let tmp = temp_path(path);

    if let Err(e) = write(&tmp) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        PipelineError::IoError(e)
    })
}
