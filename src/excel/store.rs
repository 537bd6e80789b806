//! Sheet-level primitives the push and read dispatchers are written against

use crate::config::WorkbookProperties;
use crate::core::range::{NormalizedRange, SheetExtent};
use crate::types::CellValue;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read workbook: {0}")]
    Read(#[from] calamine::XlsxError),

    #[error("Failed to write workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    #[error("Worksheet '{0}' already exists")]
    SheetExists(String),

    #[error("Worksheet '{0}' does not exist")]
    MissingSheet(String),

    #[error("Invalid worksheet name '{0}': {1}")]
    InvalidSheetName(String, String),

    #[error("Cell at column {column}, row {row} is outside the worksheet")]
    OutOfBounds { column: u64, row: u64 },
}

/// Everything stored for one cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellEntry {
    /// Value, or the cached result when the cell holds a formula
    pub value: CellValue,
    /// Formula text including the leading `=`
    pub formula: Option<String>,
    pub comment: Option<String>,
    pub hyperlink: Option<String>,
}

impl CellEntry {
    pub fn with_value(value: impl Into<CellValue>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    /// True when nothing at all is stored for the cell
    pub fn is_blank(&self) -> bool {
        self.value.is_empty()
            && self.formula.is_none()
            && self.comment.is_none()
            && self.hyperlink.is_none()
    }
}

/// A workbook the adapter can push into and read from.
///
/// Sheet names are matched case-insensitively, as Excel does. Rows and
/// columns are 1-based.
pub trait WorkbookStore {
    /// Sheet names in workbook order
    fn sheet_names(&self) -> Vec<String>;

    fn sheet_exists(&self, name: &str) -> bool {
        self.sheet_names().iter().any(|n| n.eq_ignore_ascii_case(name))
    }

    fn create_sheet(&mut self, name: &str) -> StoreResult<()>;

    fn delete_sheet(&mut self, name: &str) -> StoreResult<()>;

    /// Write `values` left to right starting at (`start_column`, `row`).
    /// Blank values clear the target cell.
    fn write_row(&mut self, sheet: &str, row: u32, start_column: u32, values: &[CellValue]) -> StoreResult<()>;

    /// Every cell of `range`, row by row, blank entries included
    fn read_region(&self, sheet: &str, range: &NormalizedRange) -> StoreResult<Vec<Vec<CellEntry>>>;

    /// Last column holding anything; `None` for a missing or empty sheet
    fn last_used_column(&self, sheet: &str) -> Option<u32>;

    /// Last row holding anything; `None` for a missing or empty sheet
    fn last_used_row(&self, sheet: &str) -> Option<u32>;

    /// Replace the document properties; `None` leaves them untouched
    fn update_metadata(&mut self, properties: Option<&WorkbookProperties>);

    fn extent(&self, sheet: &str) -> SheetExtent {
        SheetExtent::new(
            self.last_used_column(sheet).unwrap_or(0),
            self.last_used_row(sheet).unwrap_or(0),
        )
    }
}
