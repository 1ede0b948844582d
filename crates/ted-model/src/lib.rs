//! Data model for techno-economic data harmonization.
//!
//! Shared by every crate in the workspace: column definitions and schemas,
//! entry rows, working tables, masks, variable specs and the error type.

pub mod columns;
pub mod entry;
pub mod error;
pub mod mask;
pub mod table;
pub mod values;
pub mod variable;

pub use columns::{
    ColumnDefinition, ColumnKind, DataType, FieldDefinition, FieldKind, FieldType, NOT_SPECIFIED,
    TableSchema, WILDCARD,
};
pub use entry::{Entry, join_path};
pub use error::{Result, TedError};
pub use mask::{Condition, Mask, MaskWeight, Selector};
pub use table::Table;
pub use variable::VariableSpec;
