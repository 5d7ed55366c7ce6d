//! Columnar data model: declared column types, cell values and tables.
pub mod table;
pub mod types;

pub use table::{Column, ColumnTypeDescriptor, Table, TableError};
pub use types::{ColumnType, Scalar, StructField};
