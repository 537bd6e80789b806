//! sheetbridge - object collections ↔ Excel worksheet tables
//!
//! Pushes homogeneous collections of serde objects into worksheets as tables
//! and pulls worksheet regions back as raw rows, full cell contents or objects.
//!
//! # Features
//!
//! - Flattening of nested objects into dotted columns (`Section.Depth`)
//! - Explicit column selection, ignore lists, transposed tables, optional header
//! - Push types: DeleteThenCreate, CreateNonExisting, UpdateOnly, UpdateOrCreateOnly
//! - Open-ended A1 ranges (`A:C`, `B2:D`) resolved against the used area
//! - Bag objects for untyped reads, registered types for typed reads
//! - Errors, warnings and notes collected per call instead of raised
//!
//! # Example
//!
//! ```no_run
//! use sheetbridge::{ExcelAdapter, PushConfig, PushObject, PushType, ReadRequest, TypeDescriptor};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! struct Person {
//!     name: String,
//!     age: u32,
//! }
//!
//! let mut adapter = ExcelAdapter::open("people.xlsx")?;
//! adapter.register(TypeDescriptor::of::<Person>());
//!
//! let people = vec![Person { name: "Ada".into(), age: 36 }];
//! let objects = PushObject::from_slice(&people).expect("serializable");
//! adapter.push(objects, PushType::AdapterDefault, Some(PushConfig::for_worksheet("People")));
//!
//! let items = adapter.pull(ReadRequest::objects("People", "", Some("Person")));
//! for item in &items {
//!     let person: Person = item.as_entity().expect("typed").deserialize().expect("valid");
//!     println!("{:?}", person);
//! }
//! # Ok::<(), sheetbridge::AdapterError>(())
//! ```

pub mod adapter;
pub mod cli;
pub mod config;
pub mod core;
pub mod diagnostics;
pub mod error;
pub mod excel;
pub mod request;
pub mod types;

// Re-export commonly used types
pub use adapter::{ExcelAdapter, PushItem, PushPlan};
pub use config::{FileSettings, PushConfig, PushType, WorkbookProperties};
pub use crate::core::{CellAddress, CellRange, TypeDescriptor, TypeRegistry};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::{AdapterError, AdapterResult};
pub use request::ReadRequest;
pub use types::{CellContents, CellValue, CustomObject, DataType, Entity, PushObject, ReadItem, TableRow, Worksheet};
