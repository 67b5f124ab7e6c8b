//! Raw (intermediate) dataset types.

/// A tabular result set with no enforced schema.
///
/// Columns are kept in the order the source returned them and every row is
/// aligned with that list. A `None` cell is a SQL NULL (or a missing value
/// when read back from a file).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDataset {
    /// Column names in source order.
    pub columns: Vec<String>,
    /// Rows of loosely-typed scalar values in text form.
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawDataset {
    /// Create an empty dataset with the given header.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row. The row is padded with `None` (or truncated) to the
    /// header width so every row stays aligned with the columns.
    pub fn push_row(&mut self, mut row: Vec<Option<String>>) {
        row.resize(self.columns.len(), None);
        self.rows.push(row);
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
