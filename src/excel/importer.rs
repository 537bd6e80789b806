//! Workbook loading - .xlsx/.xlsm → [`MemoryWorkbook`]

use super::store::StoreResult;
use super::workbook::{MemoryWorkbook, Sheet};
use crate::types::CellValue;
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use std::sync::OnceLock;

/// Load a workbook file from disk
pub fn load_path(path: &Path) -> StoreResult<MemoryWorkbook> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    load(&mut workbook)
}

/// Load a workbook from an in-memory stream
pub fn load_bytes(bytes: &[u8]) -> StoreResult<MemoryWorkbook> {
    let mut workbook = Xlsx::new(Cursor::new(bytes))?;
    load(&mut workbook)
}

fn load<RS: Read + Seek>(workbook: &mut Xlsx<RS>) -> StoreResult<MemoryWorkbook> {
    let mut book = MemoryWorkbook::new();

    for name in workbook.sheet_names() {
        let mut sheet = Sheet::new(name.as_str());

        let values = workbook.worksheet_range(&name)?;
        copy_values(&values, &mut sheet)?;

        // A sheet without formulas may not have a formula part at all
        if let Ok(formulas) = workbook.worksheet_formula(&name) {
            copy_formulas(&formulas, &values, &mut sheet)?;
        }

        tracing::debug!(sheet = %name, cells = sheet.cells().count(), "loaded worksheet");
        book.push_sheet(sheet);
    }

    Ok(book)
}

fn copy_values(range: &Range<Data>, sheet: &mut Sheet) -> StoreResult<()> {
    let (row0, col0) = range.start().unwrap_or((0, 0));
    for (row, col, data) in range.used_cells() {
        let value = convert_cell_value(data);
        if value.is_empty() {
            continue;
        }
        sheet.set_value(col0 + col as u32 + 1, row0 + row as u32 + 1, value)?;
    }
    Ok(())
}

fn copy_formulas(formulas: &Range<String>, values: &Range<Data>, sheet: &mut Sheet) -> StoreResult<()> {
    let (row0, col0) = formulas.start().unwrap_or((0, 0));
    for (row, col, formula) in formulas.used_cells() {
        if formula.is_empty() {
            continue;
        }
        let abs_row = row0 + row as u32;
        let abs_col = col0 + col as u32;
        let cached = values
            .get_value((abs_row, abs_col))
            .map(convert_cell_value)
            .unwrap_or_default();
        sheet.set_formula(abs_col + 1, abs_row + 1, formula, cached)?;
    }
    Ok(())
}

/// Convert a calamine cell to a [`CellValue`]
pub fn convert_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => float_cell(*f),
        Data::Int(i) => CellValue::Int(*i),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) if dt.is_duration() => excel_days_to_duration(dt.as_f64())
            .map(CellValue::Duration)
            .unwrap_or(CellValue::Float(dt.as_f64())),
        Data::DateTime(dt) => match excel_serial_to_datetime(dt.as_f64()) {
            Some(value) => CellValue::DateTime(value),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) => parse_iso_datetime(s)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => parse_iso_duration(s)
            .map(CellValue::Duration)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::Error(e) => CellValue::Error(e.to_string()),
    }
}

/// Whole numbers stored as floats come back as integers
fn float_cell(f: f64) -> CellValue {
    if f.fract() == 0.0 && f.abs() < 9.0e15 {
        CellValue::Int(f as i64)
    } else {
        CellValue::Float(f)
    }
}

/// Excel serial date (days since 1899-12-30) to a timestamp
pub fn excel_serial_to_datetime(value: f64) -> Option<NaiveDateTime> {
    if !value.is_finite() {
        return None;
    }
    let days = value.floor() as i64;
    let total_seconds = (value.fract() * 86400.0).round() as u32;

    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let date = epoch.checked_add_signed(Duration::try_days(days)?)?;
    // Rounding can carry into the next day
    let (date, total_seconds) = if total_seconds >= 86400 {
        (date.succ_opt()?, total_seconds - 86400)
    } else {
        (date, total_seconds)
    };
    let time = NaiveTime::from_num_seconds_from_midnight_opt(total_seconds, 0)?;
    Some(NaiveDateTime::new(date, time))
}

/// Elapsed time stored as a fraction of days (`1.5` is 36 hours)
pub fn excel_days_to_duration(days: f64) -> Option<Duration> {
    if !days.is_finite() {
        return None;
    }
    let millis = (days * 86_400_000.0).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    Duration::try_milliseconds(millis as i64)
}

/// ISO 8601 durations as calamine reports them, e.g. `PT36H` or `P1DT2H30M15.5S`
fn parse_iso_duration(s: &str) -> Option<Duration> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^(-)?P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$").expect("hardcoded regex")
    });
    let caps = pattern.captures(s.trim())?;
    let part = |i: usize| -> Option<f64> { caps.get(i).map_or(Some(0.0), |m| m.as_str().parse().ok()) };

    let seconds = part(2)? * 86_400.0 + part(3)? * 3_600.0 + part(4)? * 60.0 + part(5)?;
    let duration = excel_days_to_duration(seconds / 86_400.0)?;
    Some(if caps.get(1).is_some() { -duration } else { duration })
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
