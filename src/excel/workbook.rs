//! In-memory workbook
//!
//! The adapter loads a workbook into this model (see `importer`), mutates it
//! through [`WorkbookStore`], and writes it back out (see `exporter`).

use super::store::{CellEntry, StoreError, StoreResult, WorkbookStore};
use crate::config::WorkbookProperties;
use crate::core::range::{NormalizedRange, MAX_COLUMNS, MAX_ROWS};
use crate::types::CellValue;
use std::collections::BTreeMap;

/// Characters Excel refuses in sheet names
const FORBIDDEN_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];
const MAX_SHEET_NAME_LEN: usize = 31;

/// Check a sheet name against Excel's rules
pub fn validate_sheet_name(name: &str) -> StoreResult<()> {
    let invalid = |reason: &str| Err(StoreError::InvalidSheetName(name.to_string(), reason.to_string()));

    if name.trim().is_empty() {
        return invalid("name is empty");
    }
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return invalid("name is longer than 31 characters");
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_SHEET_CHARS.contains(c)) {
        return invalid(&format!("character '{}' is not allowed", c));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return invalid("name cannot start or end with an apostrophe");
    }
    Ok(())
}

/// One worksheet: sparse cells keyed by `(row, column)`, both 1-based
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    cells: BTreeMap<(u32, u32), CellEntry>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
        }
    }

    pub fn cell(&self, column: u32, row: u32) -> Option<&CellEntry> {
        self.cells.get(&(row, column))
    }

    /// Store a constant. Overwrites any formula; blank values clear the value
    /// but keep a comment or hyperlink attached to the cell.
    pub fn set_value(&mut self, column: u32, row: u32, value: CellValue) -> StoreResult<()> {
        check_bounds(column, row)?;
        let entry = self.cells.entry((row, column)).or_default();
        entry.value = value;
        entry.formula = None;
        if entry.is_blank() {
            self.cells.remove(&(row, column));
        }
        Ok(())
    }

    /// Store a formula with its cached result
    pub fn set_formula(&mut self, column: u32, row: u32, formula: &str, cached: CellValue) -> StoreResult<()> {
        check_bounds(column, row)?;
        let formula = if formula.starts_with('=') {
            formula.to_string()
        } else {
            format!("={}", formula)
        };
        let entry = self.cells.entry((row, column)).or_default();
        entry.formula = Some(formula);
        entry.value = cached;
        Ok(())
    }

    pub fn set_comment(&mut self, column: u32, row: u32, comment: impl Into<String>) -> StoreResult<()> {
        check_bounds(column, row)?;
        self.cells.entry((row, column)).or_default().comment = Some(comment.into());
        Ok(())
    }

    pub fn set_hyperlink(&mut self, column: u32, row: u32, url: impl Into<String>) -> StoreResult<()> {
        check_bounds(column, row)?;
        self.cells.entry((row, column)).or_default().hyperlink = Some(url.into());
        Ok(())
    }

    /// Non-blank cells as `((row, column), entry)` in row-major order
    pub fn cells(&self) -> impl Iterator<Item = (&(u32, u32), &CellEntry)> {
        self.cells.iter()
    }

    pub fn last_used_row(&self) -> Option<u32> {
        self.cells.keys().map(|(row, _)| *row).max()
    }

    pub fn last_used_column(&self) -> Option<u32> {
        self.cells.keys().map(|(_, column)| *column).max()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

fn check_bounds(column: u32, row: u32) -> StoreResult<()> {
    if column == 0 || row == 0 || column > MAX_COLUMNS || row > MAX_ROWS {
        return Err(StoreError::OutOfBounds {
            column: u64::from(column),
            row: u64::from(row),
        });
    }
    Ok(())
}

/// All sheets of a workbook plus its document properties
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryWorkbook {
    sheets: Vec<Sheet>,
    properties: Option<WorkbookProperties>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Append a sheet as-is (used when loading from a file)
    pub fn push_sheet(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    pub fn properties(&self) -> Option<&WorkbookProperties> {
        self.properties.as_ref()
    }

    fn require_sheet_mut(&mut self, name: &str) -> StoreResult<&mut Sheet> {
        self.sheet_mut(name)
            .ok_or_else(|| StoreError::MissingSheet(name.to_string()))
    }
}

impl WorkbookStore for MemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    fn create_sheet(&mut self, name: &str) -> StoreResult<()> {
        validate_sheet_name(name)?;
        if self.sheet_exists(name) {
            return Err(StoreError::SheetExists(name.to_string()));
        }
        self.sheets.push(Sheet::new(name));
        Ok(())
    }

    fn delete_sheet(&mut self, name: &str) -> StoreResult<()> {
        let position = self
            .sheets
            .iter()
            .position(|s| s.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| StoreError::MissingSheet(name.to_string()))?;
        self.sheets.remove(position);
        Ok(())
    }

    fn write_row(&mut self, sheet: &str, row: u32, start_column: u32, values: &[CellValue]) -> StoreResult<()> {
        let target = self.require_sheet_mut(sheet)?;
        for (offset, value) in values.iter().enumerate() {
            let column = u32::try_from(offset)
                .ok()
                .and_then(|o| start_column.checked_add(o))
                .ok_or(StoreError::OutOfBounds {
                    column: u64::from(start_column) + offset as u64,
                    row: u64::from(row),
                })?;
            target.set_value(column, row, value.clone())?;
        }
        Ok(())
    }

    fn read_region(&self, sheet: &str, range: &NormalizedRange) -> StoreResult<Vec<Vec<CellEntry>>> {
        let source = self
            .sheet(sheet)
            .ok_or_else(|| StoreError::MissingSheet(sheet.to_string()))?;

        let mut grid = Vec::with_capacity(range.height() as usize);
        for row in range.first_row..=range.last_row {
            let mut cells = Vec::with_capacity(range.width() as usize);
            for column in range.first_column..=range.last_column {
                cells.push(source.cell(column, row).cloned().unwrap_or_default());
            }
            grid.push(cells);
        }
        Ok(grid)
    }

    fn last_used_column(&self, sheet: &str) -> Option<u32> {
        self.sheet(sheet).and_then(Sheet::last_used_column)
    }

    fn last_used_row(&self, sheet: &str) -> Option<u32> {
        self.sheet(sheet).and_then(Sheet::last_used_row)
    }

    fn update_metadata(&mut self, properties: Option<&WorkbookProperties>) {
        if let Some(properties) = properties {
            self.properties = Some(properties.clone());
        }
    }
}
