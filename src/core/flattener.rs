//! Object graph → flat key/value records
//!
//! Objects are walked through their serde representation. Field order follows
//! declaration order (serde_json is built with `preserve_order`), so the
//! record keys come out in the same order as the struct fields.

use serde_json::{Map, Value};

/// One flattened object: dotted property path → value
pub type FlatRecord = Map<String, Value>;

/// Key used when the flattened object is itself a scalar
pub const ROOT_KEY: &str = "Value";

/// Flatten every object into a record.
///
/// Arrays are expanded recursively: each element contributes its own
/// record(s) rather than being merged into one. Null objects are skipped.
pub fn flatten(objects: &[Value], go_deep: bool) -> Vec<FlatRecord> {
    let mut records = Vec::new();
    for object in objects {
        match object {
            Value::Null => {}
            Value::Array(items) => records.extend(flatten(items, go_deep)),
            other => records.push(flatten_value(other, go_deep, "")),
        }
    }
    records
}

/// Flatten a single value under `parent`.
///
/// Scalars (numbers, text, booleans, and anything serde renders as one such
/// as enums and uuids) are terminal. Object fields are stored verbatim unless
/// `go_deep` is set, in which case the walk continues into them.
pub fn flatten_value(value: &Value, go_deep: bool, parent: &str) -> FlatRecord {
    let mut record = FlatRecord::new();
    match value {
        Value::Null => {}
        Value::Object(fields) => {
            for (name, field) in fields {
                let key = if parent.is_empty() {
                    name.clone()
                } else {
                    format!("{}.{}", parent, name)
                };
                if go_deep {
                    record.extend(flatten_value(field, true, &key));
                } else {
                    record.insert(key, field.clone());
                }
            }
        }
        terminal => {
            let key = if parent.is_empty() { ROOT_KEY } else { parent };
            record.insert(key.to_string(), terminal.clone());
        }
    }
    record
}
