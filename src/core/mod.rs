//! Table shaping: flattening, table layout, object reconstruction, range resolution
//! and formula notation

pub mod flattener;
pub mod formula;
pub mod range;
pub mod reconstructor;
pub mod table_builder;

pub use flattener::{flatten, FlatRecord};
pub use formula::a1_to_r1c1;
pub use range::{column_index_to_name, column_name_to_index, CellAddress, CellRange, NormalizedRange, SheetExtent};
pub use reconstructor::{reconstruct, TypeDescriptor, TypeRegistry};
pub use table_builder::{build, to_table_rows, transpose, TableOptions};
