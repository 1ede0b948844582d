//! Error types shared by every stage of the harmonization pipeline.
//!
//! Only conditions that corrupt the *shape* of a table are errors. Problems
//! that affect a single value (missing conversion factor, missing sibling row,
//! unknown variable) are recovered where they occur and logged instead.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort loading or selecting a dataset.
#[derive(Debug, Error)]
pub enum TedError {
    // === Schema Errors ===
    /// A raw file contains a column that is not part of the merged schema.
    #[error("unknown column '{column}' in {path}")]
    UnknownColumn { column: String, path: PathBuf },

    /// Two contributing files define the same field id differently.
    #[error("field '{field}' is defined differently in {first} and {second}")]
    FieldCollision {
        field: String,
        first: String,
        second: String,
    },

    /// A selection or aggregation names a field the dataset does not have.
    #[error("unknown field '{field}' for variable {variable}")]
    UnknownField { field: String, variable: String },

    /// A requested field value is the wildcard or outside the field's domain.
    #[error("value '{value}' is not allowed for field '{field}'")]
    DisallowedValue { field: String, value: String },

    // === Load Errors ===
    /// No file resolved for the requested parent variable.
    #[error("no data to load for variable {variable}")]
    NoData { variable: String },

    // === File Errors ===
    /// Failed to read or write a file.
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV, YAML or TOML file could not be parsed.
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A cell that must be numeric holds something else.
    #[error("invalid value '{value}' for column '{column}' in {path} (row {row})")]
    InvalidCell {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },

    // === Definition Errors ===
    /// A database definition is malformed.
    #[error("invalid definition: {message}")]
    InvalidDefinition { message: String },

    /// A mask has inconsistent `use`/`weight` lists or a bad pattern.
    #[error("invalid mask: {message}")]
    InvalidMask { message: String },

    // === Output Errors ===
    /// Building the output DataFrame failed.
    #[error("DataFrame operation failed: {message}")]
    Frame { message: String },
}

impl TedError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Returns true for the schema family (unknown column, collision, field selection).
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownColumn { .. }
                | Self::FieldCollision { .. }
                | Self::UnknownField { .. }
                | Self::DisallowedValue { .. }
        )
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, TedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TedError::NoData {
            variable: "Tech|Electrolysis".to_string(),
        };
        assert_eq!(err.to_string(), "no data to load for variable Tech|Electrolysis");
    }

    #[test]
    fn test_schema_family() {
        let err = TedError::UnknownColumn {
            column: "colour".to_string(),
            path: PathBuf::from("tedfs/Tech/X.csv"),
        };
        assert!(err.is_schema_error());
        assert!(
            !TedError::NoData {
                variable: "X".to_string()
            }
            .is_schema_error()
        );
    }
}
