//! Push configuration, push types and file settings
//!
//! Configs can be written by hand as YAML or JSON:
//!
//! ```yaml
//! worksheet: Beams
//! startingCell: B2
//! objectProperties: [Name, Length]
//! goDeepInProperties: true
//! workbookProperties:
//!   title: Beam schedule
//! ```

use crate::core::range::CellAddress;
use crate::error::{AdapterError, AdapterResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Declared intent of a push
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PushType {
    /// Resolved by the adapter to [`PushType::DeleteThenCreate`]
    #[default]
    AdapterDefault,
    FullPush,
    DeleteThenCreate,
    UpdateOnly,
    CreateOnly,
    CreateNonExisting,
    UpdateOrCreateOnly,
}

impl PushType {
    pub const ALL: [PushType; 7] = [
        PushType::AdapterDefault,
        PushType::FullPush,
        PushType::DeleteThenCreate,
        PushType::UpdateOnly,
        PushType::CreateOnly,
        PushType::CreateNonExisting,
        PushType::UpdateOrCreateOnly,
    ];

    /// Apply the adapter policy for `AdapterDefault`
    pub fn resolve(self) -> PushType {
        match self {
            PushType::AdapterDefault => PushType::DeleteThenCreate,
            other => other,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PushType::AdapterDefault => "AdapterDefault",
            PushType::FullPush => "FullPush",
            PushType::DeleteThenCreate => "DeleteThenCreate",
            PushType::UpdateOnly => "UpdateOnly",
            PushType::CreateOnly => "CreateOnly",
            PushType::CreateNonExisting => "CreateNonExisting",
            PushType::UpdateOrCreateOnly => "UpdateOrCreateOnly",
        }
    }
}

impl fmt::Display for PushType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PushType {
    type Err = String;

    /// Case-insensitive, dashes and underscores ignored (`update-only` works)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();
        PushType::ALL
            .into_iter()
            .find(|t| t.name().to_lowercase() == wanted)
            .ok_or_else(|| format!("unknown push type '{}'", s))
    }
}

/// Document properties written to the workbook on push
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkbookProperties {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub author: Option<String>,
    pub manager: Option<String>,
    pub company: Option<String>,
    pub category: Option<String>,
    pub keywords: Option<String>,
    pub comments: Option<String>,
}

/// How objects are laid out when pushed to a worksheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PushConfig {
    /// Target worksheet. Empty falls back to [`PushConfig::DEFAULT_WORKSHEET`].
    pub worksheet: String,
    /// Top-left cell of the written table
    pub starting_cell: CellAddress,
    /// Explicit ordered column list; empty infers columns from the objects
    pub object_properties: Vec<String>,
    pub properties_to_ignore: Vec<String>,
    /// Flatten nested objects into dotted columns
    pub go_deep_in_properties: bool,
    /// One object per column instead of one per row
    pub transpose_object_table: bool,
    /// Emit a header row (or column, when transposed)
    pub include_property_names: bool,
    pub workbook_properties: Option<WorkbookProperties>,
}

impl PushConfig {
    pub const DEFAULT_WORKSHEET: &'static str = "Sheet1";

    pub fn for_worksheet(name: impl Into<String>) -> Self {
        Self {
            worksheet: name.into(),
            ..Default::default()
        }
    }

    /// Worksheet name with the default applied
    pub fn worksheet_name(&self) -> &str {
        if self.worksheet.trim().is_empty() {
            Self::DEFAULT_WORKSHEET
        } else {
            &self.worksheet
        }
    }

    /// `(column, row)` of the top-left cell, 1-based. Open parts default to 1.
    pub fn anchor(&self) -> (u32, u32) {
        (
            self.starting_cell.column.unwrap_or(1).max(1),
            self.starting_cell.row.unwrap_or(1).max(1),
        )
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            worksheet: String::new(),
            starting_cell: CellAddress::new(1, 1),
            object_properties: Vec::new(),
            properties_to_ignore: Vec::new(),
            go_deep_in_properties: false,
            transpose_object_table: false,
            include_property_names: true,
            workbook_properties: None,
        }
    }
}

/// Location of the workbook file used by the adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSettings {
    pub file_name: String,
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl FileSettings {
    pub const SUPPORTED_EXTENSIONS: [&'static str; 2] = ["xlsx", "xlsm"];

    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            directory: None,
        }
    }

    pub fn in_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn full_path(&self) -> PathBuf {
        match &self.directory {
            Some(dir) => dir.join(&self.file_name),
            None => PathBuf::from(&self.file_name),
        }
    }

    /// Only `.xlsx` and `.xlsm` workbooks are supported
    pub fn validate(&self) -> AdapterResult<()> {
        let extension = Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        match extension {
            Some(ext) if Self::SUPPORTED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
            _ => Err(AdapterError::InvalidSettings(format!(
                "'{}' is not an .xlsx or .xlsm file",
                self.file_name
            ))),
        }
    }
}

impl From<&Path> for FileSettings {
    fn from(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let directory = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf);
        Self { file_name, directory }
    }
}

/// Read a push config from a `.yaml`/`.yml` or `.json` file
pub fn load_push_config(path: &Path) -> anyhow::Result<PushConfig> {
    let content = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let config = if is_json {
        serde_json::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_adapter_default_resolves_to_delete_then_create() {
        assert_eq!(PushType::AdapterDefault.resolve(), PushType::DeleteThenCreate);
        assert_eq!(PushType::UpdateOnly.resolve(), PushType::UpdateOnly);
    }

    #[test]
    fn test_push_type_from_str() {
        assert_eq!("update-only".parse::<PushType>().unwrap(), PushType::UpdateOnly);
        assert_eq!("DeleteThenCreate".parse::<PushType>().unwrap(), PushType::DeleteThenCreate);
        assert_eq!(
            "create_non_existing".parse::<PushType>().unwrap(),
            PushType::CreateNonExisting
        );
        assert!("sometimes".parse::<PushType>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = PushConfig::default();
        assert_eq!(config.worksheet_name(), "Sheet1");
        assert_eq!(config.anchor(), (1, 1));
        assert!(config.include_property_names);
        assert!(!config.go_deep_in_properties);
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
worksheet: Beams
startingCell: C4
objectProperties: [Name, Length]
transposeObjectTable: true
workbookProperties:
  title: Beam schedule
"#;
        let config: PushConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.worksheet_name(), "Beams");
        assert_eq!(config.anchor(), (3, 4));
        assert_eq!(config.object_properties, vec!["Name", "Length"]);
        assert!(config.transpose_object_table);
        assert!(config.include_property_names, "unset flags keep their defaults");
        assert_eq!(
            config.workbook_properties.unwrap().title.as_deref(),
            Some("Beam schedule")
        );
    }

    #[test]
    fn test_load_push_config_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(br#"{"worksheet": "Data", "includePropertyNames": false}"#)
            .unwrap();
        let config = load_push_config(file.path()).unwrap();
        assert_eq!(config.worksheet, "Data");
        assert!(!config.include_property_names);
    }

    #[test]
    fn test_file_settings_extension() {
        assert!(FileSettings::new("book.xlsx").validate().is_ok());
        assert!(FileSettings::new("macro.XLSM").validate().is_ok());
        assert!(FileSettings::new("legacy.xls").validate().is_err());
        assert!(FileSettings::new("noext").validate().is_err());
    }

    #[test]
    fn test_file_settings_full_path() {
        let settings = FileSettings::new("book.xlsx").in_directory("/tmp/out");
        assert_eq!(settings.full_path(), PathBuf::from("/tmp/out/book.xlsx"));

        let from_path = FileSettings::from(Path::new("data/book.xlsx"));
        assert_eq!(from_path.file_name, "book.xlsx");
        assert_eq!(from_path.full_path(), PathBuf::from("data/book.xlsx"));
    }
}
