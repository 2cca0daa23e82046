//! FILENAME: core/persistence/src/lib.rs
//! Report Export
//!
//! Writes the rendered cross-tab to an XLSX workbook. Export reads the
//! `CrossTabView` (post-filter, post-arrangement) and never the raw facts.

mod error;
mod xlsx_writer;

pub use error::PersistenceError;
pub use xlsx_writer::{export_view, sanitize_file_name, sanitize_sheet_name, save_view};

/// Used when a file name base sanitises to nothing.
pub const DEFAULT_FILE_NAME: &str = "report";
