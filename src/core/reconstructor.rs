//! Table rows → objects
//!
//! The first row is the header; every following row becomes one object. With
//! no target type (or [`CustomObject`]) the rows become bag objects. Concrete
//! types must be registered up front as a [`TypeDescriptor`], which carries
//! the default instance used as a template and a validator that checks the
//! assembled value still deserializes into the type.

use crate::diagnostics::Diagnostics;
use crate::error::{AdapterError, AdapterResult};
use crate::types::{short_type_name, CellValue, CustomObject, Entity, ReadItem, TableRow};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// Checks that an assembled JSON value is a valid instance of the type
pub type Validator = fn(&Value) -> Result<(), String>;

fn validate_as<T: DeserializeOwned>(value: &Value) -> Result<(), String> {
    T::deserialize(value).map(|_| ()).map_err(|e| e.to_string())
}

#[derive(Clone)]
enum Shape {
    Bag,
    Schema { template: Value, validate: Validator },
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Bag => f.write_str("Bag"),
            Shape::Schema { template, .. } => f.debug_struct("Schema").field("template", template).finish(),
        }
    }
}

/// How to build objects of one type from table rows
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    name: String,
    shape: Shape,
    strict: bool,
}

impl TypeDescriptor {
    /// The bag type, [`CustomObject`]
    pub fn bag() -> Self {
        Self {
            name: short_type_name::<CustomObject>(),
            shape: Shape::Bag,
            strict: false,
        }
    }

    /// Descriptor for `T`, named after the Rust type
    pub fn of<T>() -> Self
    where
        T: Serialize + DeserializeOwned + Default,
    {
        Self {
            name: short_type_name::<T>(),
            shape: Shape::Schema {
                template: serde_json::to_value(T::default()).unwrap_or(Value::Null),
                validate: validate_as::<T>,
            },
            strict: false,
        }
    }

    /// Register under a different name than the Rust type's
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Drop the whole row when any field fails to convert
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_bag(&self) -> bool {
        matches!(self.shape, Shape::Bag)
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Settable properties in declaration order; `None` when the type has none
    pub fn properties(&self) -> Option<Vec<&str>> {
        match &self.shape {
            Shape::Bag => None,
            Shape::Schema { template, .. } => template
                .as_object()
                .map(|fields| fields.keys().map(String::as_str).collect()),
        }
    }
}

/// Object types a read request may name
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: HashMap<String, TypeDescriptor>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut registry = Self { types: HashMap::new() };
        registry.register(TypeDescriptor::bag());
        registry
    }

    pub fn register(&mut self, descriptor: TypeDescriptor) {
        self.types.insert(descriptor.name.clone(), descriptor);
    }

    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    /// Resolve an optional type name. No name means the bag type.
    pub fn resolve(&self, name: Option<&str>) -> AdapterResult<TypeDescriptor> {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            None => Ok(TypeDescriptor::bag()),
            Some(name) => self.get(name).cloned().ok_or_else(|| {
                AdapterError::SchemaMismatch(name.to_string(), "type is not registered".to_string())
            }),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build one object per data row.
///
/// Fewer than two rows gives an empty result. Header and row cells are
/// paired positionally up to the shorter of the two; the surplus on either
/// side is dropped without complaint.
pub fn reconstruct(
    rows: &[TableRow],
    target: Option<&TypeDescriptor>,
    diagnostics: &mut Diagnostics,
) -> AdapterResult<Vec<ReadItem>> {
    if rows.len() < 2 {
        return Ok(Vec::new());
    }
    let header: Vec<String> = rows[0].content.iter().map(CellValue::to_string).collect();

    match target {
        Some(descriptor) if !descriptor.is_bag() => reconstruct_typed(&header, &rows[1..], descriptor, diagnostics),
        _ => Ok(reconstruct_custom(&header, &rows[1..], diagnostics)),
    }
}

/// Rows → [`CustomObject`]s. `Name`/`Guid` go to the fixed fields, everything
/// else to `custom_data`.
pub fn reconstruct_custom(header: &[String], rows: &[TableRow], diagnostics: &mut Diagnostics) -> Vec<ReadItem> {
    rows.iter()
        .map(|row| {
            let mut object = CustomObject::new();
            for (key, cell) in header.iter().zip(&row.content) {
                if key.is_empty() {
                    continue;
                }
                if CustomObject::is_fixed_field(key) {
                    if let Err(reason) = object.set_fixed_field(key, cell) {
                        diagnostics.error(assignment_error(key, cell, reason));
                    }
                } else {
                    object.custom_data.insert(key.clone(), cell.to_json());
                }
            }
            ReadItem::Custom(object)
        })
        .collect()
}

/// Rows → instances of a registered schema type
pub fn reconstruct_typed(
    header: &[String],
    rows: &[TableRow],
    descriptor: &TypeDescriptor,
    diagnostics: &mut Diagnostics,
) -> AdapterResult<Vec<ReadItem>> {
    let (template, validate) = match &descriptor.shape {
        Shape::Schema {
            template: Value::Object(fields),
            validate,
        } => (fields, *validate),
        _ => {
            return Err(AdapterError::SchemaMismatch(
                descriptor.name.clone(),
                "the type has no settable named properties".to_string(),
            ))
        }
    };

    let unknown: Vec<&str> = header
        .iter()
        .filter(|key| !key.is_empty() && !template.contains_key(key.as_str()))
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        diagnostics.warning(format!(
            "Columns {} are not properties of {} and were ignored",
            unknown.join(", "),
            descriptor.name
        ));
    }

    let mut items = Vec::with_capacity(rows.len());
    'rows: for (index, row) in rows.iter().enumerate() {
        let mut instance: Map<String, Value> = template.clone();

        for (key, cell) in header.iter().zip(&row.content) {
            if cell.is_empty() {
                continue;
            }
            let Some(default) = template.get(key.as_str()) else {
                continue;
            };
            let assigned = coerce(cell, default).and_then(|value| assign(&mut instance, key, value, validate));
            if let Err(reason) = assigned {
                diagnostics.error(assignment_error(key, cell, reason));
                if descriptor.strict {
                    continue 'rows;
                }
            }
        }

        let value = Value::Object(instance);
        match validate(&value) {
            Ok(()) => items.push(ReadItem::Object(Entity::new(descriptor.name.clone(), value))),
            Err(reason) => diagnostics.error(AdapterError::PropertyAssignmentError {
                property: descriptor.name.clone(),
                value: format!("data row {}", index + 1),
                reason,
            }),
        }
    }

    Ok(items)
}

/// Set one field and check the instance still deserializes. A rejected value
/// is rolled back to what the field held before.
fn assign(instance: &mut Map<String, Value>, key: &str, value: Value, validate: Validator) -> Result<(), String> {
    let previous = instance.insert(key.to_string(), value);
    let checked = validate(&Value::Object(instance.clone()));
    if checked.is_err() {
        match previous {
            Some(previous) => instance.insert(key.to_string(), previous),
            None => instance.remove(key),
        };
    }
    checked
}

fn assignment_error(key: &str, cell: &CellValue, reason: String) -> AdapterError {
    AdapterError::PropertyAssignmentError {
        property: key.to_string(),
        value: format!("'{}'", cell),
        reason,
    }
}

/// Convert a cell to the JSON kind of the property's default value
pub fn coerce(cell: &CellValue, default: &Value) -> Result<Value, String> {
    match default {
        Value::Bool(_) => to_bool(cell).map(Value::Bool),
        Value::Number(n) if n.is_i64() || n.is_u64() => to_integer(cell).map(Value::from),
        Value::Number(_) => to_float(cell).and_then(|f| {
            serde_json::Number::from_f64(f)
                .map(Value::Number)
                .ok_or_else(|| "expected a finite number".to_string())
        }),
        Value::String(_) => Ok(Value::String(cell.to_string())),
        Value::Array(_) | Value::Object(_) => match cell {
            CellValue::Text(text) => {
                serde_json::from_str(text).map_err(|e| format!("expected JSON text ({})", e))
            }
            _ => Err("expected JSON text".to_string()),
        },
        // Option fields default to null: take the cell as it is
        Value::Null => Ok(match cell {
            CellValue::Text(text) if looks_like_json(text) => {
                serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.clone()))
            }
            other => other.to_json(),
        }),
    }
}

fn looks_like_json(text: &str) -> bool {
    let text = text.trim();
    (text.starts_with('{') && text.ends_with('}')) || (text.starts_with('[') && text.ends_with(']'))
}

fn to_bool(cell: &CellValue) -> Result<bool, String> {
    match cell {
        CellValue::Bool(b) => Ok(*b),
        CellValue::Int(i) => Ok(*i != 0),
        CellValue::Text(text) => match text.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" => Ok(false),
            _ => Err("expected a boolean".to_string()),
        },
        _ => Err("expected a boolean".to_string()),
    }
}

fn to_integer(cell: &CellValue) -> Result<i64, String> {
    match cell {
        CellValue::Int(i) => Ok(*i),
        CellValue::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Ok(*f as i64),
        CellValue::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| "expected an integer".to_string()),
        _ => Err("expected an integer".to_string()),
    }
}

fn to_float(cell: &CellValue) -> Result<f64, String> {
    match cell {
        CellValue::Int(i) => Ok(*i as f64),
        CellValue::Float(f) => Ok(*f),
        CellValue::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| "expected a number".to_string()),
        _ => Err("expected a number".to_string()),
    }
}
