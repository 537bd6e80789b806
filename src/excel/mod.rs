//! Workbook storage
//!
//! - [`WorkbookStore`]: the sheet-level primitives the dispatchers use
//! - [`MemoryWorkbook`]: the in-memory implementation
//! - Import: .xlsx/.xlsm → [`MemoryWorkbook`] via calamine
//! - Export: [`MemoryWorkbook`] → .xlsx via rust_xlsxwriter

pub mod exporter;
pub mod importer;
mod store;
mod workbook;

pub use store::{CellEntry, StoreError, StoreResult, WorkbookStore};
pub use workbook::{validate_sheet_name, MemoryWorkbook, Sheet};
