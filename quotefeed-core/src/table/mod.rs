//! Tabular documents: HTML conversion, schema inference and row extraction.

pub mod document;
pub mod extract;
pub mod html;
pub mod schema;

pub use document::{Cell, Row, Table, TabularDocument};
pub use extract::{extract_row, extract_table, CellError, FromRow, RowCells};
pub use html::parse_html;
pub use schema::{
    detect_schema, infer_schema, match_row, ColumnSpec, DocumentKind, Role, SchemaColumn,
    SchemaMatch, TableSchema,
};
