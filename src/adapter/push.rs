//! Push: objects → worksheet tables

use super::ExcelAdapter;
use crate::config::{PushConfig, PushType};
use crate::core::table_builder::{to_table_rows, TableOptions};
use crate::diagnostics::Diagnostics;
use crate::error::{AdapterError, AdapterResult};
use crate::excel::WorkbookStore;
use crate::types::{Entity, PushObject, TableRow};

/// Objects bound for one worksheet, with their own layout config
#[derive(Debug, Clone, PartialEq)]
pub struct PushItem {
    pub objects: Vec<PushObject>,
    /// `None` uses [`PushConfig::default`], with a note
    pub config: Option<PushConfig>,
}

impl PushItem {
    pub fn new(objects: Vec<PushObject>, config: Option<PushConfig>) -> Self {
        Self { objects, config }
    }
}

/// Applies one push type to one worksheet.
///
/// | push type          | sheet missing      | sheet present      |
/// |--------------------|--------------------|--------------------|
/// | CreateNonExisting  | create             | nothing            |
/// | DeleteThenCreate   | create             | delete, create     |
/// | UpdateOnly         | NoTargetToUpdate   | update             |
/// | UpdateOrCreateOnly | create             | update             |
///
/// Anything else is [`AdapterError::UnsupportedPushType`]. `AdapterDefault`
/// must be resolved before it gets here.
pub struct CrudDispatcher<'a, S: WorkbookStore + ?Sized> {
    store: &'a mut S,
}

impl<'a, S: WorkbookStore + ?Sized> CrudDispatcher<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Write `rows` to `sheet` with the top-left cell at `anchor` (column, row)
    pub fn dispatch(&mut self, push_type: PushType, sheet: &str, rows: &[TableRow], anchor: (u32, u32)) -> AdapterResult<()> {
        let exists = self.store.sheet_exists(sheet);
        tracing::debug!(%push_type, sheet, exists, rows = rows.len(), "dispatching push");

        match push_type {
            PushType::CreateNonExisting => {
                if !exists {
                    self.create(sheet, rows, anchor)?;
                }
            }
            PushType::DeleteThenCreate => {
                // Create is attempted even when the delete fails; the first error wins
                let deleted = if exists { self.delete(sheet) } else { Ok(()) };
                let created = self.create(sheet, rows, anchor);
                deleted.and(created)?;
            }
            PushType::UpdateOnly => {
                if !exists {
                    return Err(AdapterError::NoTargetToUpdate(format!(
                        "worksheet '{}' does not exist",
                        sheet
                    )));
                }
                self.update(sheet, rows, anchor)?;
            }
            PushType::UpdateOrCreateOnly => {
                if exists {
                    self.update(sheet, rows, anchor)?;
                } else {
                    self.create(sheet, rows, anchor)?;
                }
            }
            other => return Err(AdapterError::UnsupportedPushType(other.to_string())),
        }
        Ok(())
    }

    fn create(&mut self, sheet: &str, rows: &[TableRow], anchor: (u32, u32)) -> AdapterResult<()> {
        self.store.create_sheet(sheet)?;
        write_table(&mut *self.store, sheet, rows, anchor)
    }

    fn update(&mut self, sheet: &str, rows: &[TableRow], anchor: (u32, u32)) -> AdapterResult<()> {
        if !self.store.sheet_exists(sheet) {
            return Err(AdapterError::SheetNotFound(sheet.to_string()));
        }
        write_table(&mut *self.store, sheet, rows, anchor)
    }

    fn delete(&mut self, sheet: &str) -> AdapterResult<()> {
        self.store.delete_sheet(sheet)?;
        Ok(())
    }
}

/// One `write_row` per table row, downwards from `anchor`
pub fn write_table<S: WorkbookStore + ?Sized>(store: &mut S, sheet: &str, rows: &[TableRow], anchor: (u32, u32)) -> AdapterResult<()> {
    let (column, first_row) = anchor;
    for (offset, row) in rows.iter().enumerate() {
        let row_index = u32::try_from(offset)
            .ok()
            .and_then(|o| first_row.checked_add(o))
            .ok_or_else(|| AdapterError::Store(format!("table on '{}' runs past the last row", sheet)))?;
        store.write_row(sheet, row_index, column, &row.content)?;
    }
    Ok(())
}

/// Table for one push item: rows pass through untouched, objects are flattened
pub fn table_for(objects: &[PushObject], config: &PushConfig) -> Vec<TableRow> {
    if objects.iter().all(|o| matches!(o, PushObject::Row(_))) {
        return objects
            .iter()
            .filter_map(|o| match o {
                PushObject::Row(row) => Some(row.clone()),
                PushObject::Object(_) => None,
            })
            .collect();
    }

    let entities: Vec<Entity> = objects
        .iter()
        .filter_map(|o| match o {
            PushObject::Object(entity) => Some(entity.clone()),
            PushObject::Row(_) => None,
        })
        .collect();
    to_table_rows(&entities, &TableOptions::from(config))
}

/// Distinct type names in first-seen order
fn distinct_types<'a>(objects: impl Iterator<Item = &'a PushObject>) -> Vec<String> {
    let mut types: Vec<String> = Vec::new();
    for object in objects {
        if !types.iter().any(|t| t == object.type_name()) {
            types.push(object.type_name().to_string());
        }
    }
    types
}

/// Push items that passed validation, ready to run against a store.
///
/// `prepare` does every check that needs no workbook, so a rejected push
/// never touches the store.
#[derive(Debug, Clone)]
pub struct PushPlan {
    items: Vec<PushItem>,
    push_type: PushType,
}

impl PushPlan {
    /// Drop null objects, reject empty and mixed-type input, resolve the push
    /// type and fill in missing configs. Problems are recorded in `diagnostics`.
    pub fn prepare(items: Vec<PushItem>, push_type: PushType, diagnostics: &mut Diagnostics) -> Option<Self> {
        let mut items: Vec<PushItem> = items
            .into_iter()
            .map(|mut item| {
                item.objects.retain(|o| !o.is_null());
                item
            })
            .collect();
        if items.iter().all(|item| item.objects.is_empty()) {
            diagnostics.error(AdapterError::EmptyInput("Push".to_string()));
            return None;
        }

        let types = distinct_types(items.iter().flat_map(|item| item.objects.iter()));
        if types.len() != 1 {
            diagnostics.error(AdapterError::MixedTypePush(types));
            return None;
        }

        for item in items.iter_mut() {
            if item.config.is_none() {
                diagnostics.note("PushConfig has not been provided, default config is used.");
                item.config = Some(PushConfig::default());
            }
        }

        Some(Self {
            items,
            push_type: push_type.resolve(),
        })
    }

    /// Resolved push type, never `AdapterDefault`
    pub fn push_type(&self) -> PushType {
        self.push_type
    }

    pub fn items(&self) -> &[PushItem] {
        &self.items
    }

    /// Dispatch every item to its worksheet, then apply workbook properties.
    ///
    /// Returns the objects of the items that were written.
    pub fn execute<S: WorkbookStore + ?Sized>(&self, store: &mut S, diagnostics: &mut Diagnostics) -> Vec<PushObject> {
        let mut pushed = Vec::new();
        for item in &self.items {
            let config = item.config.clone().unwrap_or_default();
            if config.worksheet.trim().is_empty() {
                diagnostics.note(format!(
                    "No worksheet name provided, '{}' is used.",
                    PushConfig::DEFAULT_WORKSHEET
                ));
            }
            let sheet = config.worksheet_name();
            let rows = table_for(&item.objects, &config);

            match CrudDispatcher::new(&mut *store).dispatch(self.push_type, sheet, &rows, config.anchor()) {
                Ok(()) => pushed.extend(item.objects.iter().cloned()),
                Err(e) => diagnostics.error(e),
            }
        }

        for item in &self.items {
            store.update_metadata(item.config.as_ref().and_then(|c| c.workbook_properties.as_ref()));
        }
        pushed
    }
}

/// Validate and push `items` into an already opened store
pub fn push_to_store<S: WorkbookStore + ?Sized>(
    store: &mut S,
    items: Vec<PushItem>,
    push_type: PushType,
    diagnostics: &mut Diagnostics,
) -> Vec<PushObject> {
    match PushPlan::prepare(items, push_type, diagnostics) {
        Some(plan) => plan.execute(store, diagnostics),
        None => Vec::new(),
    }
}

impl ExcelAdapter {
    /// Push objects to the worksheet named in `config`.
    ///
    /// Returns the objects that were written. Failures leave the result empty
    /// and are recorded in [`ExcelAdapter::diagnostics`].
    pub fn push(&mut self, objects: Vec<PushObject>, push_type: PushType, config: Option<PushConfig>) -> Vec<PushObject> {
        self.push_items(vec![PushItem::new(objects, config)], push_type)
    }

    /// Push several items, each to its own worksheet, in one workbook session.
    ///
    /// Items are independent: a failed item is recorded and left out of the
    /// result while the others are still written.
    pub fn push_items(&mut self, items: Vec<PushItem>, push_type: PushType) -> Vec<PushObject> {
        self.diagnostics.clear();

        let Some(plan) = PushPlan::prepare(items, push_type, &mut self.diagnostics) else {
            return Vec::new();
        };
        let Some(mut book) = self.open_for_push(plan.push_type()) else {
            return Vec::new();
        };

        let pushed = plan.execute(&mut book, &mut self.diagnostics);

        if let Err(e) = self.save(&book) {
            self.diagnostics.error(e);
            return Vec::new();
        }

        tracing::info!(objects = pushed.len(), push_type = %plan.push_type(), "push finished");
        pushed
    }
}
