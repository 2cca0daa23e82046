//! FILENAME: core/fact-model/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A field name that is not part of the dataset's schema.
    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Duplicate field in schema: {0}")]
    DuplicateField(String),

    #[error("Row {row} has {found} values but the schema has {expected} fields")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
}
