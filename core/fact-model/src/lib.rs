//! FILENAME: core/fact-model/src/lib.rs
//! PURPOSE: Shared fact types for the productivity report.
//! CONTEXT: Every other crate in the workspace depends on this one for
//! `FactValue`, `FactRow`, `FactTable` and the schema that normalises raw
//! backend records into rows with a fixed field set.

pub mod error;
pub mod schema;
pub mod table;
pub mod value;

pub use error::ModelError;
pub use schema::{FactSchema, FieldKind, FieldSpec, HOURS_FIELD, MINUTES_FIELD};
pub use table::{FactRow, FactTable, FieldIndex};
pub use value::FactValue;
