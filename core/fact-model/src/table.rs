//! FILENAME: core/fact-model/src/table.rs
//! PURPOSE: The normalised dataset produced by one fact load.
//! CONTEXT: A `FactTable` is immutable once built. Filtering produces a new
//! table with the same schema, so filtered and raw data share one shape.

use crate::error::ModelError;
use crate::value::FactValue;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Index into the table's field list (0-based).
pub type FieldIndex = usize;

static EMPTY_VALUE: FactValue = FactValue::Empty;

/// One record, aligned with its table's field list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactRow {
    values: Vec<FactValue>,
}

impl FactRow {
    pub fn new(values: Vec<FactValue>) -> Self {
        FactRow { values }
    }

    /// Value at a field index; out-of-range reads as empty.
    pub fn get(&self, index: FieldIndex) -> &FactValue {
        self.values.get(index).unwrap_or(&EMPTY_VALUE)
    }

    pub fn values(&self) -> &[FactValue] {
        &self.values
    }

    /// A blank row has no value in any field (the placeholder row).
    pub fn is_blank(&self) -> bool {
        self.values.iter().all(FactValue::is_empty)
    }
}

/// A schema plus the rows of one fetch cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactTable {
    fields: Vec<String>,
    rows: Vec<FactRow>,
}

impl FactTable {
    /// Builds a table, checking for duplicate field names and ragged rows.
    pub fn new(fields: Vec<String>, rows: Vec<FactRow>) -> Result<Self, ModelError> {
        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if !seen.insert(field.as_str()) {
                return Err(ModelError::DuplicateField(field.clone()));
            }
        }

        for (row_idx, row) in rows.iter().enumerate() {
            if row.values.len() != fields.len() {
                return Err(ModelError::RowWidth {
                    row: row_idx,
                    expected: fields.len(),
                    found: row.values.len(),
                });
            }
        }

        Ok(FactTable { fields, rows })
    }

    /// Convenience constructor from borrowed names and raw value vectors.
    pub fn from_values(fields: &[&str], rows: Vec<Vec<FactValue>>) -> Result<Self, ModelError> {
        FactTable::new(
            fields.iter().map(|f| f.to_string()).collect(),
            rows.into_iter().map(FactRow::new).collect(),
        )
    }

    /// A table with the given schema and no rows (state before any load).
    pub fn empty(fields: Vec<String>) -> Self {
        FactTable {
            fields,
            rows: Vec::new(),
        }
    }

    /// The single all-null row used when a load returns nothing, so that
    /// consumers never see a zero-row dataset.
    pub fn placeholder(fields: Vec<String>) -> Self {
        let row = FactRow::new(vec![FactValue::Empty; fields.len()]);
        FactTable {
            fields,
            rows: vec![row],
        }
    }

    /// Same schema, different rows. Internal to filtering.
    pub fn with_rows(&self, rows: Vec<FactRow>) -> Self {
        FactTable {
            fields: self.fields.clone(),
            rows,
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn rows(&self) -> &[FactRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True when every row is blank (placeholder or all-null data).
    pub fn is_placeholder(&self) -> bool {
        !self.rows.is_empty() && self.rows.iter().all(FactRow::is_blank)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }

    pub fn field_index(&self, name: &str) -> Result<FieldIndex, ModelError> {
        self.fields
            .iter()
            .position(|f| f == name)
            .ok_or_else(|| ModelError::InvalidField(name.to_string()))
    }

    /// Iterates one column by name.
    pub fn column<'a>(
        &'a self,
        name: &str,
    ) -> Result<impl Iterator<Item = &'a FactValue> + 'a, ModelError> {
        let index = self.field_index(name)?;
        Ok(self.rows.iter().map(move |row| row.get(index)))
    }

    /// Sum of the numeric values of one column; non-numeric values count as 0.
    pub fn sum(&self, name: &str) -> Result<f64, ModelError> {
        Ok(self.column(name)?.filter_map(FactValue::as_f64).sum())
    }
}
