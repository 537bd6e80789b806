//! Workbook saving - [`MemoryWorkbook`] → .xlsx

use super::store::StoreResult;
use super::workbook::{MemoryWorkbook, Sheet};
use crate::config::WorkbookProperties;
use crate::types::{CellValue, DATETIME_FORMAT};
use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, Formula, Note, Url, Workbook, Worksheet};
use std::path::Path;

/// Author shown on notes written by the adapter
const NOTE_AUTHOR: &str = "sheetbridge";
const DATE_NUM_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";
const DURATION_NUM_FORMAT: &str = "[h]:mm:ss";
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Number formats shared by every sheet of one workbook
struct Formats {
    date: Format,
    duration: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            date: Format::new().set_num_format(DATE_NUM_FORMAT),
            duration: Format::new().set_num_format(DURATION_NUM_FORMAT),
        }
    }
}

/// Write the workbook to `path`, replacing any existing file
pub fn save_path(book: &MemoryWorkbook, path: &Path) -> StoreResult<()> {
    let mut workbook = build_workbook(book)?;
    workbook.save(path)?;
    tracing::debug!(path = %path.display(), sheets = book.sheets().len(), "saved workbook");
    Ok(())
}

/// Serialise the workbook to xlsx bytes
pub fn save_to_buffer(book: &MemoryWorkbook) -> StoreResult<Vec<u8>> {
    let mut workbook = build_workbook(book)?;
    Ok(workbook.save_to_buffer()?)
}

/// Translate the in-memory model into a rust_xlsxwriter workbook
pub fn build_workbook(book: &MemoryWorkbook) -> StoreResult<Workbook> {
    let mut workbook = Workbook::new();

    if let Some(properties) = book.properties() {
        workbook.set_properties(&doc_properties(properties));
    }

    let formats = Formats::new();
    for sheet in book.sheets() {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        write_sheet(worksheet, sheet, &formats)?;
    }

    Ok(workbook)
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &Sheet, formats: &Formats) -> StoreResult<()> {
    for (&(row, column), cell) in sheet.cells() {
        let (row, col) = (row - 1, (column - 1) as u16);

        if let Some(formula) = &cell.formula {
            let mut formula = Formula::new(formula.as_str());
            if !cell.value.is_empty() {
                formula = formula.set_result(cell.value.to_string());
            }
            worksheet.write_formula(row, col, formula)?;
        } else if let Some(url) = &cell.hyperlink {
            let text = if cell.value.is_empty() {
                url.clone()
            } else {
                cell.value.to_string()
            };
            worksheet.write_url_with_text(row, col, Url::new(url.as_str()), text)?;
        } else {
            write_value(worksheet, row, col, &cell.value, formats)?;
        }

        if let Some(comment) = &cell.comment {
            let note = Note::new(comment.as_str())
                .set_author(NOTE_AUTHOR)
                .add_author_prefix(false);
            worksheet.insert_note(row, col, &note)?;
        }
    }
    Ok(())
}

fn write_value(worksheet: &mut Worksheet, row: u32, col: u16, value: &CellValue, formats: &Formats) -> StoreResult<()> {
    match value {
        CellValue::Empty => {}
        CellValue::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        CellValue::Int(i) => {
            worksheet.write_number(row, col, *i as f64)?;
        }
        CellValue::Float(f) => {
            worksheet.write_number(row, col, *f)?;
        }
        CellValue::Text(s) | CellValue::Error(s) => {
            worksheet.write_string(row, col, s)?;
        }
        CellValue::DateTime(dt) => {
            let iso = dt.format(DATETIME_FORMAT).to_string();
            match ExcelDateTime::parse_from_str(&iso) {
                Ok(excel_dt) => {
                    worksheet.write_datetime_with_format(row, col, &excel_dt, &formats.date)?;
                }
                // Outside Excel's date range (before 1900): keep the text
                Err(_) => {
                    worksheet.write_string(row, col, &iso)?;
                }
            }
        }
        CellValue::Duration(d) => {
            let days = d.num_milliseconds() as f64 / MILLIS_PER_DAY;
            worksheet.write_number_with_format(row, col, days, &formats.duration)?;
        }
    }
    Ok(())
}

fn doc_properties(properties: &WorkbookProperties) -> DocProperties {
    let mut doc = DocProperties::new();
    if let Some(title) = &properties.title {
        doc = doc.set_title(title);
    }
    if let Some(subject) = &properties.subject {
        doc = doc.set_subject(subject);
    }
    if let Some(author) = &properties.author {
        doc = doc.set_author(author);
    }
    if let Some(manager) = &properties.manager {
        doc = doc.set_manager(manager);
    }
    if let Some(company) = &properties.company {
        doc = doc.set_company(company);
    }
    if let Some(category) = &properties.category {
        doc = doc.set_category(category);
    }
    if let Some(keywords) = &properties.keywords {
        doc = doc.set_keywords(keywords);
    }
    if let Some(comments) = &properties.comments {
        doc = doc.set_comment(comments);
    }
    doc
}
