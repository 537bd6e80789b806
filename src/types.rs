use crate::core::range::CellAddress;
use chrono::{Duration, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Format used whenever a date cell is rendered as text
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

//==============================================================================
// Cells and rows
//==============================================================================

/// A single scalar cell value. `Empty` stands for a blank (null) cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    DateTime(NaiveDateTime),
    /// Elapsed time, from cells formatted like `[h]:mm:ss`
    Duration(Duration),
    /// Spreadsheet error literal, e.g. `#DIV/0!`
    Error(String),
}

impl CellValue {
    /// Convert a serde value to a cell. Composite values become their compact JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => CellValue::Empty,
            Value::Bool(b) => CellValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => CellValue::Int(i),
                None => CellValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => CellValue::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => CellValue::Text(value.to_string()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Empty => Value::Null,
            CellValue::Bool(b) => Value::Bool(*b),
            CellValue::Int(i) => Value::from(*i),
            CellValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            CellValue::Text(s) => Value::String(s.clone()),
            CellValue::DateTime(dt) => Value::String(dt.format(DATETIME_FORMAT).to_string()),
            CellValue::Duration(_) => Value::String(self.to_string()),
            CellValue::Error(e) => Value::String(e.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Declared type of the cell, `None` for blanks
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            CellValue::Empty => None,
            CellValue::Bool(_) => Some(DataType::Boolean),
            CellValue::Int(_) | CellValue::Float(_) => Some(DataType::Number),
            CellValue::Text(_) => Some(DataType::Text),
            CellValue::DateTime(_) => Some(DataType::DateTime),
            CellValue::Duration(_) => Some(DataType::Duration),
            CellValue::Error(_) => Some(DataType::Error),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Bool(true) => write!(f, "TRUE"),
            CellValue::Bool(false) => write!(f, "FALSE"),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
            CellValue::Duration(d) => write_duration(f, d),
            CellValue::Error(e) => write!(f, "{}", e),
        }
    }
}

/// `[h]:mm:ss` with milliseconds when present, e.g. `36:00:00` or `-0:00:01.500`
fn write_duration(f: &mut fmt::Formatter<'_>, duration: &Duration) -> fmt::Result {
    let sign = if *duration < Duration::zero() { "-" } else { "" };
    let millis = duration.num_milliseconds().unsigned_abs();
    let (seconds, millis) = (millis / 1000, millis % 1000);
    write!(f, "{}{}:{:02}:{:02}", sign, seconds / 3600, seconds / 60 % 60, seconds % 60)?;
    if millis > 0 {
        write!(f, ".{:03}", millis)?;
    }
    Ok(())
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(CellValue::from_json(&value))
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<i32> for CellValue {
    fn from(i: i32) -> Self {
        CellValue::Int(i64::from(i))
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::DateTime(dt)
    }
}

impl From<Duration> for CellValue {
    fn from(d: Duration) -> Self {
        CellValue::Duration(d)
    }
}

/// Declared type of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    DateTime,
    Duration,
    Number,
    Text,
    Error,
}

/// One row of a table (or one column, once transposed)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableRow {
    pub content: Vec<CellValue>,
}

impl TableRow {
    pub fn new(content: Vec<CellValue>) -> Self {
        Self { content }
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.content.get(index)
    }
}

impl<T: Into<CellValue>> FromIterator<T> for TableRow {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        TableRow::new(iter.into_iter().map(Into::into).collect())
    }
}

/// Full metadata of one cell, returned by a cell contents request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellContents {
    pub address: CellAddress,
    pub value: CellValue,
    pub data_type: Option<DataType>,
    /// Formula in A1 notation, empty if the cell holds a constant
    pub formula: String,
    /// The same formula in R1C1 notation, relative to this cell
    #[serde(rename = "formulaR1C1")]
    pub formula_r1c1: String,
    pub comment: String,
    pub hyperlink: String,
}

//==============================================================================
// Objects
//==============================================================================

/// Untyped bag object: two fixed fields plus an ordered map for everything else
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomObject {
    #[serde(default)]
    pub name: String,
    #[serde(default = "Uuid::new_v4")]
    pub guid: Uuid,
    #[serde(flatten)]
    pub custom_data: Map<String, Value>,
}

impl CustomObject {
    /// Header keys that map onto fixed fields instead of `custom_data`
    pub const FIXED_FIELDS: [&'static str; 2] = ["Name", "Guid"];

    pub fn new() -> Self {
        Self {
            name: String::new(),
            guid: Uuid::new_v4(),
            custom_data: Map::new(),
        }
    }

    pub fn is_fixed_field(key: &str) -> bool {
        Self::FIXED_FIELDS.contains(&key)
    }

    /// Assign a fixed field from a cell. Blank cells leave the field untouched.
    pub fn set_fixed_field(&mut self, key: &str, cell: &CellValue) -> Result<(), String> {
        if cell.is_empty() {
            return Ok(());
        }
        match key {
            "Name" => {
                self.name = cell.to_string();
                Ok(())
            }
            "Guid" => {
                self.guid = Uuid::parse_str(cell.to_string().trim())
                    .map_err(|e| format!("not a valid guid ({})", e))?;
                Ok(())
            }
            other => Err(format!("'{}' is not a fixed field", other)),
        }
    }
}

impl Default for CustomObject {
    fn default() -> Self {
        Self::new()
    }
}

/// A domain object as it travels through the adapter: its type name plus its
/// serde representation. The type name is what push homogeneity is checked on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub type_name: String,
    pub value: Value,
}

impl Entity {
    pub fn new(type_name: impl Into<String>, value: Value) -> Self {
        Self {
            type_name: type_name.into(),
            value,
        }
    }

    /// Capture any serializable object, named after its Rust type
    pub fn from_serialize<T: Serialize>(object: &T) -> serde_json::Result<Self> {
        Ok(Self {
            type_name: short_type_name::<T>(),
            value: serde_json::to_value(object)?,
        })
    }

    pub fn deserialize<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        T::deserialize(&self.value)
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }
}

/// `alloc::vec::Vec<my_app::Person>` → `Vec<Person>`
pub(crate) fn short_type_name<T>() -> String {
    let full = std::any::type_name::<T>();
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    for ch in full.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            segment.push(ch);
        } else {
            out.push_str(segment.rsplit("::").next().unwrap_or_default());
            segment.clear();
            out.push(ch);
        }
    }
    out.push_str(segment.rsplit("::").next().unwrap_or_default());
    out
}

/// Something handed to push: either a raw row written verbatim or an object to flatten
#[derive(Debug, Clone, PartialEq)]
pub enum PushObject {
    Row(TableRow),
    Object(Entity),
}

impl PushObject {
    pub const ROW_TYPE: &'static str = "TableRow";

    pub fn from_serialize<T: Serialize>(object: &T) -> serde_json::Result<Self> {
        Entity::from_serialize(object).map(PushObject::Object)
    }

    pub fn from_slice<T: Serialize>(objects: &[T]) -> serde_json::Result<Vec<Self>> {
        objects.iter().map(Self::from_serialize).collect()
    }

    /// Name used to check that a push is homogeneous
    pub fn type_name(&self) -> &str {
        match self {
            PushObject::Row(_) => Self::ROW_TYPE,
            PushObject::Object(entity) => &entity.type_name,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PushObject::Object(entity) if entity.is_null())
    }
}

impl From<TableRow> for PushObject {
    fn from(row: TableRow) -> Self {
        PushObject::Row(row)
    }
}

impl From<Entity> for PushObject {
    fn from(entity: Entity) -> Self {
        PushObject::Object(entity)
    }
}

/// Lightweight worksheet descriptor returned by a worksheets request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worksheet {
    pub name: String,
    /// 1-based position in the workbook
    pub index: usize,
}

/// One element of a read result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReadItem {
    Row(TableRow),
    Contents(Vec<CellContents>),
    Object(Entity),
    Custom(CustomObject),
    Worksheet(Worksheet),
}

impl ReadItem {
    pub fn as_row(&self) -> Option<&TableRow> {
        match self {
            ReadItem::Row(row) => Some(row),
            _ => None,
        }
    }

    pub fn as_custom(&self) -> Option<&CustomObject> {
        match self {
            ReadItem::Custom(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            ReadItem::Object(entity) => Some(entity),
            _ => None,
        }
    }
}
