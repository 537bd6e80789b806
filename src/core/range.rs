//! Cell addresses, cell ranges and their resolution against a sheet's extent
//!
//! Columns are handled as 1-based indices internally and rendered with the
//! spreadsheet letter encoding (A..Z, AA..ZZ, AAA..XFD), which is bijective
//! base 26: there is no zero digit.

use crate::error::{AdapterError, AdapterResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Last column of a worksheet (XFD)
pub const MAX_COLUMNS: u32 = 16_384;
/// Last row of a worksheet
pub const MAX_ROWS: u32 = 1_048_576;

/// Convert a 1-based column index to its letter name (1 → A, 27 → AA).
///
/// Index 0 yields an empty string.
pub fn column_index_to_name(index: u32) -> String {
    let mut letters = Vec::new();
    let mut n = index;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - rem) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Convert a column letter name to its 1-based index (case-insensitive).
///
/// Returns `None` for empty input, non-letters, or names too long to index.
pub fn column_name_to_index(name: &str) -> Option<u32> {
    if name.is_empty() {
        return None;
    }
    name.chars().try_fold(0u32, |acc, ch| {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = (ch.to_ascii_uppercase() as u8 - b'A') as u32 + 1;
        acc.checked_mul(26)?.checked_add(digit)
    })
}

fn address_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\$?([A-Za-z]*)\$?(\d*)$").expect("hardcoded regex"))
}

//==============================================================================
// CellAddress
//==============================================================================

/// A cell address with optional column and row. Unset parts mean "use the sheet extent".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "AddressRepr", into = "String")]
pub struct CellAddress {
    /// 1-based column index
    pub column: Option<u32>,
    /// 1-based row index
    pub row: Option<u32>,
}

impl CellAddress {
    pub fn new(column: u32, row: u32) -> Self {
        Self {
            column: Some(column),
            row: Some(row),
        }
    }

    pub fn column_only(column: u32) -> Self {
        Self {
            column: Some(column),
            row: None,
        }
    }

    pub fn row_only(row: u32) -> Self {
        Self {
            column: None,
            row: Some(row),
        }
    }

    /// Column letters, empty if the column is open
    pub fn column_name(&self) -> String {
        self.column.map(column_index_to_name).unwrap_or_default()
    }

    pub fn is_open(&self) -> bool {
        self.column.is_none() || self.row.is_none()
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column_name())?;
        if let Some(row) = self.row {
            write!(f, "{}", row)?;
        }
        Ok(())
    }
}

impl From<CellAddress> for String {
    fn from(address: CellAddress) -> Self {
        address.to_string()
    }
}

impl FromStr for CellAddress {
    type Err = AdapterError;

    /// Parses `B7`, `$B$7`, `B` (column only), `7` (row only) or an empty string (open)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AdapterError::RangeResolutionFailure(format!("'{}' is not a cell address", s));
        let captures = address_pattern().captures(s.trim()).ok_or_else(invalid)?;

        let letters = captures.get(1).map_or("", |m| m.as_str());
        let digits = captures.get(2).map_or("", |m| m.as_str());

        let column = if letters.is_empty() {
            None
        } else {
            Some(column_name_to_index(letters).ok_or_else(invalid)?)
        };
        let row = if digits.is_empty() {
            None
        } else {
            Some(digits.parse::<u32>().map_err(|_| invalid())?)
        };

        Ok(Self { column, row })
    }
}

/// Column given either as an index or as letters
#[derive(Deserialize)]
#[serde(untagged)]
enum ColumnRepr {
    Index(u32),
    Name(String),
}

/// Accepted serialized forms of an address: `"B7"` or `{column: "B" | 2, row: 7}`
#[derive(Deserialize)]
#[serde(untagged)]
enum AddressRepr {
    Text(String),
    Parts {
        #[serde(default)]
        column: Option<ColumnRepr>,
        #[serde(default)]
        row: Option<u32>,
    },
}

impl TryFrom<AddressRepr> for CellAddress {
    type Error = AdapterError;

    fn try_from(repr: AddressRepr) -> Result<Self, Self::Error> {
        match repr {
            AddressRepr::Text(text) => text.parse(),
            AddressRepr::Parts { column, row } => {
                let column = match column {
                    None => None,
                    Some(ColumnRepr::Index(i)) => Some(i),
                    Some(ColumnRepr::Name(name)) if name.is_empty() => None,
                    Some(ColumnRepr::Name(name)) => Some(column_name_to_index(&name).ok_or_else(|| {
                        AdapterError::RangeResolutionFailure(format!("'{}' is not a column name", name))
                    })?),
                };
                Ok(Self { column, row })
            }
        }
    }
}

//==============================================================================
// CellRange
//==============================================================================

/// A rectangular region, possibly with open ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RangeRepr")]
pub struct CellRange {
    pub from: CellAddress,
    pub to: CellAddress,
}

impl CellRange {
    pub fn new(from: CellAddress, to: CellAddress) -> Self {
        Self { from, to }
    }

    /// Render as an A1 region string. `None` unless every bound is set and the
    /// region is valid (positive, ordered, inside the sheet limits).
    pub fn to_excel(&self) -> Option<String> {
        let range = NormalizedRange::new(self.from.column?, self.from.row?, self.to.column?, self.to.row?).ok()?;
        Some(range.to_excel())
    }
}

impl FromStr for CellRange {
    type Err = AdapterError;

    /// Parses `A1:C10`, `A:C`, `2:5`, `A1:C` or a single cell `B3`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once(':') {
            Some((from, to)) => Ok(Self::new(from.parse()?, to.parse()?)),
            None => {
                let cell: CellAddress = s.parse()?;
                Ok(Self::new(cell, cell))
            }
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.from, self.to)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RangeRepr {
    Text(String),
    Parts {
        #[serde(default)]
        from: CellAddress,
        #[serde(default)]
        to: CellAddress,
    },
}

impl TryFrom<RangeRepr> for CellRange {
    type Error = AdapterError;

    fn try_from(repr: RangeRepr) -> Result<Self, Self::Error> {
        match repr {
            RangeRepr::Text(text) => text.parse(),
            RangeRepr::Parts { from, to } => Ok(Self { from, to }),
        }
    }
}

//==============================================================================
// Resolution
//==============================================================================

/// Last used column and row of a sheet; zero for a sheet without used cells
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SheetExtent {
    pub last_column: u32,
    pub last_row: u32,
}

impl SheetExtent {
    pub fn new(last_column: u32, last_row: u32) -> Self {
        Self { last_column, last_row }
    }

    pub fn is_empty(&self) -> bool {
        self.last_column == 0 || self.last_row == 0
    }
}

/// A closed, validated range with 1-based inclusive bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedRange {
    pub first_column: u32,
    pub first_row: u32,
    pub last_column: u32,
    pub last_row: u32,
}

impl NormalizedRange {
    pub fn new(first_column: u32, first_row: u32, last_column: u32, last_row: u32) -> AdapterResult<Self> {
        let range = Self {
            first_column,
            first_row,
            last_column,
            last_row,
        };
        let describe = || {
            format!(
                "{}{}:{}{}",
                column_index_to_name(first_column),
                first_row,
                column_index_to_name(last_column),
                last_row
            )
        };

        if first_column == 0 || first_row == 0 || last_column == 0 || last_row == 0 {
            return Err(AdapterError::RangeResolutionFailure(format!(
                "{} has a zero bound",
                describe()
            )));
        }
        if first_column > last_column || first_row > last_row {
            return Err(AdapterError::RangeResolutionFailure(format!(
                "{} ends before it starts",
                describe()
            )));
        }
        if last_column > MAX_COLUMNS || last_row > MAX_ROWS {
            return Err(AdapterError::RangeResolutionFailure(format!(
                "{} exceeds the worksheet limits",
                describe()
            )));
        }
        Ok(range)
    }

    pub fn width(&self) -> u32 {
        self.last_column - self.first_column + 1
    }

    pub fn height(&self) -> u32 {
        self.last_row - self.first_row + 1
    }

    pub fn contains(&self, column: u32, row: u32) -> bool {
        (self.first_column..=self.last_column).contains(&column)
            && (self.first_row..=self.last_row).contains(&row)
    }

    pub fn to_excel(&self) -> String {
        format!(
            "{}{}:{}{}",
            column_index_to_name(self.first_column),
            self.first_row,
            column_index_to_name(self.last_column),
            self.last_row
        )
    }
}

impl fmt::Display for NormalizedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_excel())
    }
}

/// Close every open bound of `declared` against the sheet extent.
///
/// A missing range covers the whole used area. Missing `from` parts default to
/// column A / row 1, missing `to` parts to the last used column / row.
pub fn resolve(declared: Option<&CellRange>, extent: SheetExtent) -> AdapterResult<NormalizedRange> {
    match declared {
        None => NormalizedRange::new(1, 1, extent.last_column, extent.last_row),
        Some(range) => NormalizedRange::new(
            range.from.column.unwrap_or(1),
            range.from.row.unwrap_or(1),
            range.to.column.unwrap_or(extent.last_column),
            range.to.row.unwrap_or(extent.last_row),
        ),
    }
}
