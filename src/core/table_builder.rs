//! Flat records → rectangular table of cells

use super::flattener::{flatten, FlatRecord};
use crate::config::PushConfig;
use crate::types::{CellValue, Entity, TableRow};
use serde_json::Value;

/// Column selection and layout options for [`build`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableOptions {
    /// Ordered column list; empty means "every key seen, in first-seen order"
    pub columns: Vec<String>,
    /// Columns to drop after inference. Entries also named in `columns` are kept.
    pub ignore: Vec<String>,
    pub go_deep: bool,
    pub transpose: bool,
    pub include_header: bool,
}

impl From<&PushConfig> for TableOptions {
    fn from(config: &PushConfig) -> Self {
        Self {
            columns: config.object_properties.clone(),
            ignore: config.properties_to_ignore.clone(),
            go_deep: config.go_deep_in_properties,
            transpose: config.transpose_object_table,
            include_header: config.include_property_names,
        }
    }
}

/// Flatten the objects and lay them out as table rows
pub fn to_table_rows(objects: &[Entity], options: &TableOptions) -> Vec<TableRow> {
    let values: Vec<Value> = objects.iter().map(|e| e.value.clone()).collect();
    let records = flatten(&values, options.go_deep);
    build(&records, options)
}

/// Resolve the column list for a set of records
pub fn resolve_columns(records: &[FlatRecord], columns: &[String], ignore: &[String]) -> Vec<String> {
    let mut keys: Vec<String> = if columns.is_empty() {
        let mut seen: Vec<String> = Vec::new();
        for key in records.iter().flat_map(|r| r.keys()) {
            if !seen.contains(key) {
                seen.push(key.clone());
            }
        }
        seen
    } else {
        columns.to_vec()
    };

    if !ignore.is_empty() {
        let eligible: Vec<&String> = ignore
            .iter()
            .filter(|name| columns.is_empty() || !columns.contains(*name))
            .collect();
        keys.retain(|key| !eligible.contains(&key));
    }

    keys
}

/// Lay records out as rows: optional header row first, then one row per
/// record with one cell per column (blank where the record lacks the key).
/// Transposition happens last, after the header is in place.
pub fn build(records: &[FlatRecord], options: &TableOptions) -> Vec<TableRow> {
    if records.is_empty() {
        return Vec::new();
    }

    let keys = resolve_columns(records, &options.columns, &options.ignore);

    let mut rows = Vec::with_capacity(records.len() + 1);
    if options.include_header {
        rows.push(keys.iter().map(|k| CellValue::Text(k.clone())).collect::<TableRow>());
    }

    for record in records {
        rows.push(TableRow::new(
            keys.iter()
                .map(|k| record.get(k).map(CellValue::from_json).unwrap_or_default())
                .collect(),
        ));
    }

    if options.transpose {
        rows = transpose(&rows);
    }

    rows
}

/// Swap rows and columns. Ragged rows are tolerated: a short row simply
/// contributes nothing to the columns it lacks.
pub fn transpose(rows: &[TableRow]) -> Vec<TableRow> {
    let width = rows.iter().map(TableRow::len).max().unwrap_or(0);
    (0..width)
        .map(|j| TableRow::new(rows.iter().filter_map(|row| row.get(j).cloned()).collect()))
        .collect()
}
