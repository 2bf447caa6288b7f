//! Dataset loading, column provisioning, and CSV serialization.

use std::collections::HashMap;

use crate::error::CoreError;
use crate::schema::Schema;

/// UTF-8 byte-order mark some spreadsheet tools prepend to CSV exports.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Default base name used for exports when the upload had no file name.
pub const DEFAULT_EXPORT_STEM: &str = "data";

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

/// One stored cell.
///
/// `Unset` means "not yet annotated" and is distinct from every real value,
/// including the empty string a textbox may legitimately hold.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Unset,
    Value(String),
}

impl Cell {
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Text written to CSV; unset cells become empty fields.
    pub fn as_csv_field(&self) -> &str {
        match self {
            Self::Unset => "",
            Self::Value(s) => s,
        }
    }

    fn from_csv_field(field: &str) -> Self {
        if field.is_empty() {
            Self::Unset
        } else {
            Self::Value(field.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Record store
// ---------------------------------------------------------------------------

/// Indexed row/column access used by annotation state and navigation.
///
/// Rows are 0-based here; the 1-based cursor is translated by the caller.
pub trait RecordStore {
    fn row_count(&self) -> usize;

    fn has_column(&self, column: &str) -> bool;

    /// The cell at `(row, column)`, or `None` if either is out of range.
    fn get(&self, row: usize, column: &str) -> Option<&Cell>;

    fn set(&mut self, row: usize, column: &str, value: Cell) -> Result<(), CoreError>;
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// An in-memory table parsed from an uploaded CSV file.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Parse CSV bytes. The first record is the header row.
    pub fn from_csv(bytes: &[u8]) -> Result<Self, CoreError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(bytes);

        let headers = reader
            .headers()
            .map_err(|e| CoreError::Parse(format!("CSV header: {e}")))?
            .clone();

        if headers.is_empty() {
            return Err(CoreError::Parse("CSV has no header row".to_string()));
        }

        let mut table = Self {
            columns: Vec::with_capacity(headers.len()),
            positions: HashMap::with_capacity(headers.len()),
            rows: Vec::new(),
        };
        for header in headers.iter() {
            if table.positions.contains_key(header) {
                return Err(CoreError::Parse(format!(
                    "CSV header '{header}' appears more than once"
                )));
            }
            table.push_column(header.to_string());
        }

        for (i, record) in reader.records().enumerate() {
            let record = record.map_err(|e| CoreError::Parse(format!("CSV record {}: {e}", i + 1)))?;
            table
                .rows
                .push(record.iter().map(Cell::from_csv_field).collect());
        }

        Ok(table)
    }

    /// Column names in order: original columns first, provisioned ones after.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Ensure the table can back `schema`.
    ///
    /// Fails with [`CoreError::MissingColumn`] if the header or text column
    /// is absent. Every missing output column is appended, in schema order,
    /// filled with [`Cell::Unset`]. Returns the names of the added columns.
    pub fn provision(&mut self, schema: &Schema) -> Result<Vec<String>, CoreError> {
        for required in [&schema.header_column, &schema.text_column] {
            if !self.has_column(required) {
                return Err(CoreError::MissingColumn {
                    column: required.clone(),
                });
            }
        }

        let mut added = Vec::new();
        for column in schema.output_columns() {
            if self.has_column(&column) {
                continue;
            }
            self.push_column(column.clone());
            for row in &mut self.rows {
                row.push(Cell::Unset);
            }
            added.push(column);
        }
        Ok(added)
    }

    /// Serialize the table back to CSV, preserving row and column order.
    pub fn to_csv(&self) -> Result<Vec<u8>, CoreError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&self.columns)
            .map_err(|e| CoreError::Internal(format!("CSV write: {e}")))?;
        for row in &self.rows {
            writer
                .write_record(row.iter().map(Cell::as_csv_field))
                .map_err(|e| CoreError::Internal(format!("CSV write: {e}")))?;
        }
        writer
            .into_inner()
            .map_err(|e| CoreError::Internal(format!("CSV flush: {e}")))
    }

    /// Number of rows with at least one set cell among `columns`.
    pub fn count_rows_with_any(&self, columns: &[String]) -> usize {
        let positions: Vec<usize> = columns
            .iter()
            .filter_map(|c| self.positions.get(c).copied())
            .collect();
        self.rows
            .iter()
            .filter(|row| positions.iter().any(|&p| !row[p].is_unset()))
            .count()
    }

    fn push_column(&mut self, name: String) {
        self.positions.insert(name.clone(), self.columns.len());
        self.columns.push(name);
    }
}

impl RecordStore for Table {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn has_column(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }

    fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let position = *self.positions.get(column)?;
        self.rows.get(row).map(|r| &r[position])
    }

    fn set(&mut self, row: usize, column: &str, value: Cell) -> Result<(), CoreError> {
        let position = *self.positions.get(column).ok_or_else(|| CoreError::NotFound {
            entity: "column",
            id: column.to_string(),
        })?;
        let cells = self.rows.get_mut(row).ok_or_else(|| CoreError::NotFound {
            entity: "record",
            id: row.to_string(),
        })?;
        cells[position] = value;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Pending upload
// ---------------------------------------------------------------------------

/// A parsed upload waiting for a schema before it can be annotated.
#[derive(Debug, Clone)]
pub struct PendingDataset {
    pub table: Table,
    /// File name stem used to name the export.
    pub stem: String,
}

impl PendingDataset {
    pub fn parse(bytes: &[u8], filename: Option<&str>) -> Result<Self, CoreError> {
        Ok(Self {
            table: Table::from_csv(bytes)?,
            stem: file_stem(filename),
        })
    }
}

/// Reduce an uploaded file name to a safe stem: `reviews (1).csv` -> `reviews_1`.
fn file_stem(filename: Option<&str>) -> String {
    let Some(name) = filename else {
        return DEFAULT_EXPORT_STEM.to_string();
    };
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let stem = base.rsplit_once('.').map_or(base, |(stem, _)| stem);
    let cleaned: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_matches('_');
    if cleaned.is_empty() {
        DEFAULT_EXPORT_STEM.to_string()
    } else {
        let mut collapsed = String::with_capacity(cleaned.len());
        for c in cleaned.chars() {
            if !(c == '_' && collapsed.ends_with('_')) {
                collapsed.push(c);
            }
        }
        collapsed
    }
}
