//! FILENAME: core/pivot-engine/src/definition.rs
//! Pivot Arrangement - The serializable layout of the report.
//!
//! This module contains the types needed to DESCRIBE a pivot:
//! which fields group rows, which group columns, which measure is
//! aggregated and how. These structures are:
//! - Serializable (saved views carry the row/column part)
//! - Validated against a dataset's field list before use
//! - Immutable snapshots of user intent

use crate::error::PivotError;
use fact_model::{ModelError, HOURS_FIELD, MINUTES_FIELD};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ============================================================================
// AGGREGATION
// ============================================================================

/// Supported aggregation functions for the value field.
/// The productivity report always uses `Sum`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregationType {
    Sum,
    Count,
    Average,
    Min,
    Max,
}

impl Default for AggregationType {
    fn default() -> Self {
        AggregationType::Sum
    }
}

impl AggregationType {
    pub fn label(&self) -> &'static str {
        match self {
            AggregationType::Sum => "Sum",
            AggregationType::Count => "Count",
            AggregationType::Average => "Average",
            AggregationType::Min => "Min",
            AggregationType::Max => "Max",
        }
    }
}

// ============================================================================
// MEASURE UNITS
// ============================================================================

/// Display unit for time measures. Switching units swaps the value field
/// and never touches the row/column layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeasureUnit {
    Minutes,
    Hours,
}

impl Default for MeasureUnit {
    fn default() -> Self {
        MeasureUnit::Minutes
    }
}

impl std::str::FromStr for MeasureUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "minutes" | "min" | "m" => Ok(MeasureUnit::Minutes),
            "hours" | "h" => Ok(MeasureUnit::Hours),
            other => Err(format!("unknown measure unit: {}", other)),
        }
    }
}

/// Names of the two fields that measure the same fact in different units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasureFields {
    pub minutes: String,
    pub hours: String,
}

impl MeasureFields {
    pub fn field_for(&self, unit: MeasureUnit) -> &str {
        match unit {
            MeasureUnit::Minutes => &self.minutes,
            MeasureUnit::Hours => &self.hours,
        }
    }
}

impl Default for MeasureFields {
    fn default() -> Self {
        MeasureFields {
            minutes: MINUTES_FIELD.to_string(),
            hours: HOURS_FIELD.to_string(),
        }
    }
}

// ============================================================================
// ARRANGEMENT
// ============================================================================

/// The layout of a pivot: row axis, column axis and the aggregated value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotArrangement {
    /// Fields on the row axis (ordered from outer to inner).
    pub row_fields: Vec<String>,

    /// Fields on the column axis (ordered from outer to inner).
    pub col_fields: Vec<String>,

    pub aggregation: AggregationType,

    /// The measure being aggregated.
    pub value_field: String,
}

impl PivotArrangement {
    /// Creates an arrangement with empty axes.
    pub fn new(value_field: impl Into<String>) -> Self {
        PivotArrangement {
            row_fields: Vec::new(),
            col_fields: Vec::new(),
            aggregation: AggregationType::Sum,
            value_field: value_field.into(),
        }
    }

    pub fn with_rows<S: Into<String>>(mut self, rows: impl IntoIterator<Item = S>) -> Self {
        self.row_fields = rows.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cols<S: Into<String>>(mut self, cols: impl IntoIterator<Item = S>) -> Self {
        self.col_fields = cols.into_iter().map(Into::into).collect();
        self
    }

    /// Order-sensitive comparison of the row/column layout.
    pub fn same_layout(&self, rows: &[String], cols: &[String]) -> bool {
        self.row_fields == rows && self.col_fields == cols
    }

    /// Checks the arrangement against a dataset's field list.
    pub fn validate(&self, fields: &[String]) -> Result<(), PivotError> {
        let known = |name: &str| fields.iter().any(|f| f == name);

        for name in self.row_fields.iter().chain(&self.col_fields) {
            if !known(name) {
                return Err(ModelError::InvalidField(name.clone()).into());
            }
        }
        if !known(&self.value_field) {
            return Err(ModelError::InvalidField(self.value_field.clone()).into());
        }

        for axis in [&self.row_fields, &self.col_fields] {
            let mut seen = HashSet::new();
            for name in axis.iter() {
                if !seen.insert(name.as_str()) {
                    return Err(PivotError::DuplicateField(name.clone()));
                }
            }
        }

        if let Some(shared) = self.row_fields.iter().find(|f| self.col_fields.contains(f)) {
            return Err(PivotError::OverlappingAxes(shared.clone()));
        }

        Ok(())
    }

    /// Fields on neither axis, in dataset order. The value field is excluded.
    pub fn unused_fields(&self, fields: &[String]) -> Vec<String> {
        fields
            .iter()
            .filter(|f| {
                !self.row_fields.contains(f) && !self.col_fields.contains(f) && **f != self.value_field
            })
            .cloned()
            .collect()
    }

    /// Caption for the aggregated value, e.g. "Sum of Minutes".
    pub fn caption(&self) -> String {
        format!("{} of {}", self.aggregation.label(), self.value_field)
    }
}
