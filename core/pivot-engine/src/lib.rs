//! FILENAME: core/pivot-engine/src/lib.rs
//! Pivot subsystem for the productivity report.
//!
//! This crate turns a `FactTable` into an aggregated cross-tab and tracks the
//! user's arrangement of fields and saved views. It depends on `fact-model`
//! only for the shared fact types.
//!
//! Layers:
//! - `definition`: Serializable arrangement (what the pivot IS)
//! - `filter`: Per-field allow-lists over the raw facts
//! - `cache`: Group keys and aggregate accumulators (HOW we compute)
//! - `engine`: Cross-tab derivation (HOW we calculate)
//! - `view`: Renderable grid (WHAT we display and export)
//! - `state`: Arrangement transitions (user vs. programmatic)
//! - `views`: Saved views, selection and dirty tracking

pub mod cache;
pub mod definition;
pub mod engine;
pub mod error;
pub mod filter;
pub mod state;
pub mod view;
pub mod views;

pub use cache::{AggregateAccumulator, GroupKey};
pub use definition::*;
pub use engine::{derive_cross_tab, drill_down, CrossTab};
pub use error::PivotError;
pub use filter::{domain_of, FieldFilterState};
pub use state::{ChangeOrigin, PivotEvent, PivotState};
pub use view::{render, CellType, CrossTabView, ViewCell, ViewValue};
pub use views::{SavedView, ViewId, ViewRegistry};
