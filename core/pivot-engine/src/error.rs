//! FILENAME: core/pivot-engine/src/error.rs

use fact_model::ModelError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PivotError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Field {0} is placed on both the row and the column axis")]
    OverlappingAxes(String),

    #[error("Field {0} appears more than once on an axis")]
    DuplicateField(String),

    #[error("View not found: {0}")]
    ViewNotFound(String),
}
