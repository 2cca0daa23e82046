//! FILENAME: core/fact-model/src/schema.rs
//! PURPOSE: Normalises raw backend records into rows with a fixed field set.
//! CONTEXT: The productivity endpoint returns loosely typed JSON objects.
//! The schema decides which keys become fields, in what order, and which
//! fields are numeric measures.

use crate::error::ModelError;
use crate::table::{FactRow, FactTable};
use crate::value::FactValue;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field name of the minutes-denominated measure.
pub const MINUTES_FIELD: &str = "Minutes";

/// Field name of the hours-denominated measure.
pub const HOURS_FIELD: &str = "Hours";

/// Whether a field groups facts or is aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Dimension,
    Measure,
}

/// One field of the normalised row and the record key it is read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Display name; this is what arrangements and filters refer to.
    pub name: String,
    /// Key in the backend JSON record.
    pub source_key: String,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn dimension(name: &str, source_key: &str) -> Self {
        FieldSpec {
            name: name.to_string(),
            source_key: source_key.to_string(),
            kind: FieldKind::Dimension,
        }
    }

    pub fn measure(name: &str, source_key: &str) -> Self {
        FieldSpec {
            name: name.to_string(),
            source_key: source_key.to_string(),
            kind: FieldKind::Measure,
        }
    }
}

/// The fixed field set of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactSchema {
    pub fields: Vec<FieldSpec>,

    /// When set, `(minutes, hours)`: fill an empty hours field from minutes / 60.
    #[serde(default)]
    pub derive_hours_from: Option<(String, String)>,
}

impl FactSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        FactSchema {
            fields,
            derive_hours_from: None,
        }
    }

    /// The field set of the productivity report.
    pub fn productivity() -> Self {
        FactSchema {
            fields: vec![
                FieldSpec::dimension("User", "user"),
                FieldSpec::dimension("Client", "client"),
                FieldSpec::dimension("Label", "label"),
                FieldSpec::dimension("Task", "task"),
                FieldSpec::dimension("Year", "year"),
                FieldSpec::dimension("Month", "month"),
                FieldSpec::dimension("Period", "period"),
                FieldSpec::dimension("Level", "level"),
                FieldSpec::dimension("Seniority", "seniority"),
                FieldSpec::measure(MINUTES_FIELD, "minutes"),
                FieldSpec::measure(HOURS_FIELD, "hours"),
            ],
            derive_hours_from: Some((MINUTES_FIELD.to_string(), HOURS_FIELD.to_string())),
        }
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn measures(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.kind == FieldKind::Measure)
    }

    /// Normalises one JSON record. Missing keys become empty, extra keys are
    /// dropped, measure fields are coerced to numbers.
    pub fn normalize_record(&self, record: &Map<String, Value>) -> FactRow {
        let mut values: Vec<FactValue> = self
            .fields
            .iter()
            .map(|spec| match record.get(&spec.source_key) {
                None => FactValue::Empty,
                Some(raw) => match spec.kind {
                    FieldKind::Dimension => FactValue::from_json(raw),
                    FieldKind::Measure => FactValue::number_from_json(raw),
                },
            })
            .collect();

        if let Some((minutes, hours)) = &self.derive_hours_from {
            let minutes_idx = self.fields.iter().position(|f| &f.name == minutes);
            let hours_idx = self.fields.iter().position(|f| &f.name == hours);
            if let (Some(m), Some(h)) = (minutes_idx, hours_idx) {
                if values[h].is_empty() {
                    if let Some(mins) = values[m].as_f64() {
                        values[h] = FactValue::Number(mins / 60.0);
                    }
                }
            }
        }

        FactRow::new(values)
    }

    /// Normalises a whole result set. Zero records yield the one-row
    /// placeholder table rather than an empty one.
    ///
    /// Fails with `DuplicateField` when two field specs share a name.
    pub fn normalize(&self, records: &[Map<String, Value>]) -> Result<FactTable, ModelError> {
        let names = self.field_names();
        if records.is_empty() {
            FactTable::new(names.clone(), Vec::new())?;
            return Ok(FactTable::placeholder(names));
        }
        let rows = records.iter().map(|r| self.normalize_record(r)).collect();
        FactTable::new(names, rows)
    }
}

impl Default for FactSchema {
    fn default() -> Self {
        FactSchema::productivity()
    }
}
