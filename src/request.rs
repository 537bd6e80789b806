//! Read requests
//!
//! Requests are plain data and can be written as YAML or JSON, tagged by `type`:
//!
//! ```yaml
//! type: Batch
//! requests:
//!   - type: Objects
//!     worksheet: People
//!     range: A1:D20
//!     objectType: Person
//!   - type: Worksheets
//!     nameContains: data
//! ```

use crate::core::range::CellRange;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ReadRequest {
    /// Table with a header row, turned into objects
    #[serde(rename_all = "camelCase")]
    Objects {
        #[serde(default)]
        worksheet: String,
        #[serde(default)]
        range: Option<CellRange>,
        /// Registered type name; none means bag objects
        #[serde(default)]
        object_type: Option<String>,
    },

    /// Cell values (cached results for formulas), one row per sheet row
    #[serde(rename_all = "camelCase")]
    CellValues {
        #[serde(default)]
        worksheet: String,
        #[serde(default)]
        range: Option<CellRange>,
    },

    /// Full cell metadata: formula, comment, hyperlink, data type
    #[serde(rename_all = "camelCase")]
    CellContents {
        #[serde(default)]
        worksheet: String,
        #[serde(default)]
        range: Option<CellRange>,
    },

    #[serde(rename_all = "camelCase")]
    Worksheets {
        #[serde(default)]
        name_contains: Option<String>,
    },

    Batch { requests: Vec<ReadRequest> },

    /// Any request type this adapter does not know
    #[serde(other)]
    Unsupported,
}

impl ReadRequest {
    /// `range` may be empty for the whole used area. `None` if it does not parse.
    pub fn objects(worksheet: impl Into<String>, range: &str, object_type: Option<&str>) -> Option<Self> {
        Some(ReadRequest::Objects {
            worksheet: worksheet.into(),
            range: parse_range(range)?,
            object_type: object_type.map(str::to_string),
        })
    }

    pub fn cell_values(worksheet: impl Into<String>, range: &str) -> Option<Self> {
        Some(ReadRequest::CellValues {
            worksheet: worksheet.into(),
            range: parse_range(range)?,
        })
    }

    pub fn cell_contents(worksheet: impl Into<String>, range: &str) -> Option<Self> {
        Some(ReadRequest::CellContents {
            worksheet: worksheet.into(),
            range: parse_range(range)?,
        })
    }

    pub fn worksheets(name_contains: Option<&str>) -> Self {
        ReadRequest::Worksheets {
            name_contains: name_contains.map(str::to_string),
        }
    }

    pub fn batch(requests: Vec<ReadRequest>) -> Self {
        ReadRequest::Batch { requests }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReadRequest::Objects { .. } => "ObjectRequest",
            ReadRequest::CellValues { .. } => "CellValuesRequest",
            ReadRequest::CellContents { .. } => "CellContentsRequest",
            ReadRequest::Worksheets { .. } => "WorksheetsRequest",
            ReadRequest::Batch { .. } => "BatchRequest",
            ReadRequest::Unsupported => "UnsupportedRequest",
        }
    }
}

/// Empty text → `Some(None)` (open range), bad text → `None`
fn parse_range(range: &str) -> Option<Option<CellRange>> {
    if range.trim().is_empty() {
        return Some(None);
    }
    match range.parse() {
        Ok(parsed) => Some(Some(parsed)),
        Err(e) => {
            tracing::warn!("Ignoring request: {}", e);
            None
        }
    }
}

/// Read a request from a `.yaml`/`.yml` or `.json` file
pub fn load_request(path: &Path) -> anyhow::Result<ReadRequest> {
    let content = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let request = if is_json {
        serde_json::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };
    Ok(request)
}
