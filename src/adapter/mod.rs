//! Excel adapter: workbook lifecycle around the push and read dispatchers
//!
//! Every call opens its own view of the workbook, works on it in memory and,
//! for a push, saves it back. Nothing is cached between calls.
//!
//! ```no_run
//! use sheetbridge::{ExcelAdapter, FileSettings, PushConfig, PushObject, PushType, ReadRequest};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Beam { name: String, length: f64 }
//!
//! let mut adapter = ExcelAdapter::new(FileSettings::new("beams.xlsx"))?;
//! let beams = vec![Beam { name: "B1".into(), length: 4.5 }];
//!
//! let objects = PushObject::from_slice(&beams).expect("serializable");
//! adapter.push(objects, PushType::AdapterDefault, Some(PushConfig::for_worksheet("Beams")));
//!
//! let rows = adapter.pull(ReadRequest::cell_values("Beams", ""));
//! for diagnostic in adapter.diagnostics().entries() {
//!     eprintln!("{}", diagnostic);
//! }
//! # Ok::<(), sheetbridge::AdapterError>(())
//! ```

mod push;
mod read;

pub use push::{push_to_store, table_for, write_table, CrudDispatcher, PushItem, PushPlan};
pub use read::ReadDispatcher;

use crate::config::{FileSettings, PushType};
use crate::core::reconstructor::{TypeDescriptor, TypeRegistry};
use crate::diagnostics::Diagnostics;
use crate::error::{AdapterError, AdapterResult};
use crate::excel::{exporter, importer, MemoryWorkbook};
use std::path::{Path, PathBuf};

/// Where the workbook comes from and where a push writes it
#[derive(Debug, Clone)]
enum Source {
    File(PathBuf),
    /// The input is a template that is never modified; a push writes to `output`
    Stream { input: Vec<u8>, output: Option<Vec<u8>> },
}

#[derive(Debug)]
pub struct ExcelAdapter {
    source: Source,
    registry: TypeRegistry,
    diagnostics: Diagnostics,
}

impl ExcelAdapter {
    /// Adapter over a workbook file. Only `.xlsx` and `.xlsm` are accepted.
    pub fn new(settings: FileSettings) -> AdapterResult<Self> {
        settings.validate()?;
        Ok(Self::with_source(Source::File(settings.full_path())))
    }

    pub fn open(path: impl AsRef<Path>) -> AdapterResult<Self> {
        Self::new(FileSettings::from(path.as_ref()))
    }

    /// Adapter over an in-memory workbook. Pushes leave `input` untouched and
    /// write the result to [`ExcelAdapter::output`].
    pub fn from_bytes(input: Vec<u8>) -> AdapterResult<Self> {
        if input.is_empty() {
            return Err(AdapterError::InvalidSettings(
                "the input stream for the workbook template is empty".to_string(),
            ));
        }
        Ok(Self::with_source(Source::Stream { input, output: None }))
    }

    fn with_source(source: Source) -> Self {
        Self {
            source,
            registry: TypeRegistry::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Workbook path, `None` for a stream adapter
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            Source::File(path) => Some(path),
            Source::Stream { .. } => None,
        }
    }

    /// Bytes written by the last successful push of a stream adapter
    pub fn output(&self) -> Option<&[u8]> {
        match &self.source {
            Source::Stream { output, .. } => output.as_deref(),
            Source::File(_) => None,
        }
    }

    /// Make a type available to object requests by name
    pub fn register(&mut self, descriptor: TypeDescriptor) -> &mut Self {
        self.registry.register(descriptor);
        self
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Errors, warnings and notes recorded by the last push or pull
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    /// Workbook to push into. A missing file starts a new workbook, except for
    /// `UpdateOnly` where there is nothing to update.
    fn open_for_push(&mut self, push_type: PushType) -> Option<MemoryWorkbook> {
        let opened = match &self.source {
            Source::File(path) if !path.exists() => {
                if push_type == PushType::UpdateOnly {
                    Err(AdapterError::NoTargetToUpdate(format!(
                        "there is no workbook to update under {}",
                        path.display()
                    )))
                } else {
                    Ok(MemoryWorkbook::new())
                }
            }
            _ => self.load(),
        };
        opened.map_err(|e| self.diagnostics.error(e)).ok()
    }

    fn open_for_read(&mut self) -> Option<MemoryWorkbook> {
        self.load().map_err(|e| self.diagnostics.error(e)).ok()
    }

    fn load(&self) -> AdapterResult<MemoryWorkbook> {
        let loaded = match &self.source {
            Source::File(path) => {
                if !path.exists() {
                    return Err(AdapterError::StoreOpenError(format!(
                        "no workbook found at {}",
                        path.display()
                    )));
                }
                importer::load_path(path)
            }
            Source::Stream { input, .. } => importer::load_bytes(input),
        };
        loaded.map_err(|e| AdapterError::StoreOpenError(e.to_string()))
    }

    fn save(&mut self, book: &MemoryWorkbook) -> AdapterResult<()> {
        let saved = match &mut self.source {
            Source::File(path) => exporter::save_path(book, path),
            Source::Stream { output, .. } => exporter::save_to_buffer(book).map(|bytes| {
                *output = Some(bytes);
            }),
        };
        saved.map_err(|e| AdapterError::StoreSaveError(e.to_string()))
    }
}
