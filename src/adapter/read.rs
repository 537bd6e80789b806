//! Pull: worksheet regions → rows, cell contents or objects

use super::ExcelAdapter;
use crate::core::formula::a1_to_r1c1;
use crate::core::range::{resolve, CellAddress, CellRange, NormalizedRange};
use crate::core::reconstructor::{reconstruct, TypeRegistry};
use crate::diagnostics::Diagnostics;
use crate::error::{AdapterError, AdapterResult};
use crate::excel::{CellEntry, WorkbookStore};
use crate::request::ReadRequest;
use crate::types::{CellContents, CellValue, ReadItem, TableRow, Worksheet};

/// Routes read requests against one opened workbook
pub struct ReadDispatcher<'a, S: WorkbookStore + ?Sized> {
    store: &'a S,
    registry: &'a TypeRegistry,
}

impl<'a, S: WorkbookStore + ?Sized> ReadDispatcher<'a, S> {
    pub fn new(store: &'a S, registry: &'a TypeRegistry) -> Self {
        Self { store, registry }
    }

    /// Run a request. Failures are recorded and give an empty result.
    pub fn read(&self, request: &ReadRequest, diagnostics: &mut Diagnostics) -> Vec<ReadItem> {
        let result = match request {
            ReadRequest::Objects {
                worksheet,
                range,
                object_type,
            } => self.read_objects(worksheet, range.as_ref(), object_type.as_deref(), diagnostics),
            ReadRequest::CellValues { worksheet, range } => self
                .read_values(worksheet, range.as_ref(), diagnostics)
                .map(|rows| rows.into_iter().map(ReadItem::Row).collect()),
            ReadRequest::CellContents { worksheet, range } => self.read_contents(worksheet, range.as_ref(), diagnostics),
            ReadRequest::Worksheets { name_contains } => Ok(self.read_worksheets(name_contains.as_deref())),
            ReadRequest::Batch { requests } => Ok(requests
                .iter()
                .flat_map(|inner| self.read(inner, diagnostics))
                .collect()),
            ReadRequest::Unsupported => Err(AdapterError::UnsupportedRequest(request.name().to_string())),
        };

        result.unwrap_or_else(|e| {
            diagnostics.error(e);
            Vec::new()
        })
    }

    fn read_objects(
        &self,
        worksheet: &str,
        range: Option<&CellRange>,
        object_type: Option<&str>,
        diagnostics: &mut Diagnostics,
    ) -> AdapterResult<Vec<ReadItem>> {
        let descriptor = self.registry.resolve(object_type)?;
        let rows = self.read_values(worksheet, range, diagnostics)?;
        reconstruct(&rows, Some(&descriptor), diagnostics)
    }

    /// Values, or cached results for formula cells
    fn read_values(&self, worksheet: &str, range: Option<&CellRange>, diagnostics: &mut Diagnostics) -> AdapterResult<Vec<TableRow>> {
        let sheet = self.resolve_sheet(worksheet)?;
        let Some(region) = self.resolve_region(&sheet, range, diagnostics)? else {
            return Ok(Vec::new());
        };

        let grid = self.store.read_region(&sheet, &region)?;
        let rows = grid
            .into_iter()
            .zip(region.first_row..)
            .map(|(cells, row)| {
                cells
                    .into_iter()
                    .zip(region.first_column..)
                    .map(|(cell, column)| cached_value(cell, column, row, diagnostics))
                    .collect::<Vec<_>>()
            })
            .map(TableRow::new)
            .collect();
        Ok(rows)
    }

    /// One [`ReadItem::Contents`] per sheet row
    fn read_contents(&self, worksheet: &str, range: Option<&CellRange>, diagnostics: &mut Diagnostics) -> AdapterResult<Vec<ReadItem>> {
        let sheet = self.resolve_sheet(worksheet)?;
        let Some(region) = self.resolve_region(&sheet, range, diagnostics)? else {
            return Ok(Vec::new());
        };

        let grid = self.store.read_region(&sheet, &region)?;
        let items = grid
            .into_iter()
            .zip(region.first_row..)
            .map(|(cells, row)| {
                ReadItem::Contents(
                    cells
                        .into_iter()
                        .zip(region.first_column..)
                        .map(|(cell, column)| cell_contents(cell, column, row))
                        .collect(),
                )
            })
            .collect();
        Ok(items)
    }

    fn read_worksheets(&self, name_contains: Option<&str>) -> Vec<ReadItem> {
        let filter = name_contains
            .map(str::to_lowercase)
            .filter(|f| !f.is_empty());
        self.store
            .sheet_names()
            .into_iter()
            .enumerate()
            .filter(|(_, name)| {
                filter
                    .as_ref()
                    .map_or(true, |f| name.to_lowercase().contains(f.as_str()))
            })
            .map(|(index, name)| ReadItem::Worksheet(Worksheet { name, index: index + 1 }))
            .collect()
    }

    /// Actual sheet name. An empty name means the first sheet.
    fn resolve_sheet(&self, worksheet: &str) -> AdapterResult<String> {
        let names = self.store.sheet_names();
        if worksheet.trim().is_empty() {
            return names
                .into_iter()
                .next()
                .ok_or_else(|| AdapterError::SheetNotFound("the workbook has no worksheets".to_string()));
        }
        names
            .into_iter()
            .find(|n| n.eq_ignore_ascii_case(worksheet))
            .ok_or_else(|| AdapterError::SheetNotFound(worksheet.to_string()))
    }

    /// Close the open bounds of `range`. `Ok(None)` when there is nothing to
    /// read: the range leans on the used area of a sheet that has none.
    fn resolve_region(
        &self,
        sheet: &str,
        range: Option<&CellRange>,
        diagnostics: &mut Diagnostics,
    ) -> AdapterResult<Option<NormalizedRange>> {
        let extent = self.store.extent(sheet);
        let needs_extent = range.map_or(true, |r| r.to.column.is_none() || r.to.row.is_none());
        if needs_extent && extent.is_empty() {
            diagnostics.note(format!("Worksheet '{}' has no used cells.", sheet));
            return Ok(None);
        }
        resolve(range, extent).map(Some)
    }
}

/// Value of a cell for value and object reads. Error literals such as
/// `#DIV/0!` read as empty; contents reads keep them.
fn cached_value(cell: CellEntry, column: u32, row: u32, diagnostics: &mut Diagnostics) -> CellValue {
    if cell.value.is_empty() && cell.formula.is_some() {
        diagnostics.warning(format!(
            "Cell {} holds a formula without a cached value and needs to be recalculated; it is read as empty.",
            CellAddress::new(column, row)
        ));
    }
    match cell.value {
        CellValue::Error(_) => CellValue::Empty,
        value => value,
    }
}

fn cell_contents(cell: CellEntry, column: u32, row: u32) -> CellContents {
    let formula = cell
        .formula
        .map(|f| f.trim_start_matches('=').to_string())
        .unwrap_or_default();
    CellContents {
        address: CellAddress::new(column, row),
        data_type: cell.value.data_type(),
        value: cell.value,
        formula_r1c1: a1_to_r1c1(&formula, column, row),
        formula,
        comment: cell.comment.unwrap_or_default(),
        hyperlink: cell.hyperlink.unwrap_or_default(),
    }
}

impl ExcelAdapter {
    /// Run a read request. `None` reads the cell values of the first sheet.
    ///
    /// Failures leave the result empty and are recorded in
    /// [`ExcelAdapter::diagnostics`].
    pub fn pull(&mut self, request: Option<ReadRequest>) -> Vec<ReadItem> {
        self.diagnostics.clear();

        let request = request.unwrap_or(ReadRequest::CellValues {
            worksheet: String::new(),
            range: None,
        });

        let Some(book) = self.open_for_read() else {
            return Vec::new();
        };

        let items = ReadDispatcher::new(&book, &self.registry).read(&request, &mut self.diagnostics);
        tracing::info!(request = request.name(), items = items.len(), "pull finished");
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excel::MemoryWorkbook;
    use pretty_assertions::assert_eq;

    fn book() -> MemoryWorkbook {
        let mut book = MemoryWorkbook::new();
        book.create_sheet("People").unwrap();
        book.write_row("People", 1, 1, &["Name".into(), "Age".into()]).unwrap();
        book.write_row("People", 2, 1, &["Ada".into(), 36.into()]).unwrap();
        book.write_row("People", 3, 1, &["Bob".into(), 41.into()]).unwrap();
        book.create_sheet("Empty").unwrap();
        book.create_sheet("people archive").unwrap();
        book
    }

    fn read(book: &MemoryWorkbook, request: &ReadRequest) -> (Vec<ReadItem>, Diagnostics) {
        let registry = TypeRegistry::new();
        let mut diagnostics = Diagnostics::new();
        let items = ReadDispatcher::new(book, &registry).read(request, &mut diagnostics);
        (items, diagnostics)
    }

    #[test]
    fn test_cell_values_whole_sheet() {
        let (items, diags) = read(&book(), &ReadRequest::cell_values("people", "").unwrap());
        assert_eq!(items.len(), 3);
        assert_eq!(items[2].as_row().unwrap().content, vec!["Bob".into(), CellValue::Int(41)]);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_open_range_uses_extent() {
        let (items, _) = read(&book(), &ReadRequest::cell_values("People", "B2:B").unwrap());
        let values: Vec<&CellValue> = items.iter().map(|i| &i.as_row().unwrap().content[0]).collect();
        assert_eq!(values, vec![&CellValue::Int(36), &CellValue::Int(41)]);
    }

    #[test]
    fn test_inverted_range_fails() {
        let (items, diags) = read(&book(), &ReadRequest::cell_values("People", "B3:A1").unwrap());
        assert!(items.is_empty());
        assert!(diags.has_error_kind("RangeResolutionFailure"));
    }

    #[test]
    fn test_empty_sheet_gives_note() {
        let (items, diags) = read(&book(), &ReadRequest::cell_values("Empty", "").unwrap());
        assert!(items.is_empty());
        assert!(!diags.has_errors());
        assert_eq!(diags.notes().count(), 1);
    }

    #[test]
    fn test_missing_sheet() {
        let (items, diags) = read(&book(), &ReadRequest::cell_values("Nope", "").unwrap());
        assert!(items.is_empty());
        assert!(diags.has_error_kind("SheetNotFound"));
    }

    #[test]
    fn test_objects_default_to_bag() {
        let (items, _) = read(&book(), &ReadRequest::objects("People", "", None).unwrap());
        assert_eq!(items.len(), 2);
        let ada = items[0].as_custom().unwrap();
        assert_eq!(ada.name, "Ada");
        assert_eq!(ada.custom_data.get("Age"), Some(&serde_json::json!(36)));
    }

    #[test]
    fn test_unregistered_object_type() {
        let (items, diags) = read(&book(), &ReadRequest::objects("People", "", Some("Person")).unwrap());
        assert!(items.is_empty());
        assert!(diags.has_error_kind("SchemaMismatch"));
    }

    #[test]
    fn test_worksheets_filter() {
        let (items, _) = read(&book(), &ReadRequest::worksheets(Some("PEOPLE")));
        assert_eq!(
            items,
            vec![
                ReadItem::Worksheet(Worksheet { name: "People".to_string(), index: 1 }),
                ReadItem::Worksheet(Worksheet { name: "people archive".to_string(), index: 3 }),
            ]
        );
    }

    #[test]
    fn test_batch_continues_after_failure() {
        let request = ReadRequest::batch(vec![
            ReadRequest::Unsupported,
            ReadRequest::cell_values("Nope", "").unwrap(),
            ReadRequest::worksheets(None),
        ]);
        let (items, diags) = read(&book(), &request);
        assert_eq!(items.len(), 3);
        assert!(diags.has_error_kind("UnsupportedRequest"));
        assert!(diags.has_error_kind("SheetNotFound"));
    }

    #[test]
    fn test_cell_contents_and_recalculation_warning() {
        let mut book = book();
        let sheet = book.sheet_mut("People").unwrap();
        sheet.set_formula(3, 2, "B2*2", CellValue::Empty).unwrap();
        sheet.set_formula(3, 3, "$A$1&B3", CellValue::from("NameBob")).unwrap();
        sheet.set_comment(1, 2, "founder").unwrap();

        let (items, _) = read(&book, &ReadRequest::cell_contents("People", "A2:C3").unwrap());
        let ReadItem::Contents(cells) = &items[0] else {
            panic!("expected cell contents");
        };
        assert_eq!(cells[0].comment, "founder");
        assert_eq!(cells[0].address, CellAddress::new(1, 2));
        assert_eq!(cells[0].formula_r1c1, "");
        assert_eq!(cells[2].formula, "B2*2");
        assert_eq!(cells[2].formula_r1c1, "RC[-1]*2");
        assert_eq!(cells[2].data_type, None);

        let ReadItem::Contents(cells) = &items[1] else {
            panic!("expected cell contents");
        };
        assert_eq!(cells[2].formula, "$A$1&B3");
        assert_eq!(cells[2].formula_r1c1, "R1C1&RC[-1]");

        let (_, diags) = read(&book, &ReadRequest::cell_values("People", "C2").unwrap());
        assert_eq!(diags.warnings().count(), 1);
    }

    #[test]
    fn test_error_cells_read_empty_except_in_contents() {
        let mut book = book();
        let sheet = book.sheet_mut("People").unwrap();
        sheet.set_formula(2, 3, "1/0", CellValue::Error("#DIV/0!".into())).unwrap();

        let (items, diags) = read(&book, &ReadRequest::cell_values("People", "A3:B3").unwrap());
        assert_eq!(items[0].as_row().unwrap().content, vec!["Bob".into(), CellValue::Empty]);
        assert!(diags.is_empty());

        let (items, _) = read(&book, &ReadRequest::objects("People", "", None).unwrap());
        assert_eq!(items[1].as_custom().unwrap().custom_data.get("Age"), Some(&serde_json::Value::Null));

        let (items, _) = read(&book, &ReadRequest::cell_contents("People", "B3").unwrap());
        let ReadItem::Contents(cells) = &items[0] else {
            panic!("expected cell contents");
        };
        assert_eq!(cells[0].value, CellValue::Error("#DIV/0!".into()));
        assert_eq!(cells[0].formula_r1c1, "1/0");
    }
}
