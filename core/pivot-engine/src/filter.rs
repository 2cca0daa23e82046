//! FILENAME: core/pivot-engine/src/filter.rs
//! Field Filter Engine - per-field allow-lists over the raw facts.
//!
//! Domains are always computed from the unfiltered table, so browsing the
//! values of one field is never narrowed by filters on other fields.
//! An allow-list set to cover a field's whole domain is dropped: "every value
//! selected" and "never filtered" are the same state. Reloads do not prune
//! stored allow-lists; a value missing from the current facts simply matches
//! nothing until it comes back.

use fact_model::{FactRow, FactTable, FactValue, FieldIndex, ModelError};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// Sorted distinct values of `field` in `table` (blanks last).
pub fn domain_of(table: &FactTable, field: &str) -> Result<Vec<FactValue>, ModelError> {
    let distinct: FxHashSet<&FactValue> = table.column(field)?.collect();
    let mut values: Vec<FactValue> = distinct.into_iter().cloned().collect();
    values.sort();
    Ok(values)
}

/// Allowed values per field. A field without an entry is unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldFilterState {
    allowed: FxHashMap<String, FxHashSet<FactValue>>,
}

impl FieldFilterState {
    pub fn new() -> Self {
        FieldFilterState::default()
    }

    /// Stores `selected` as the allow-list for `field`.
    ///
    /// Values outside the field's domain are discarded. When what remains
    /// covers the whole domain the entry is removed instead. An empty
    /// selection is kept: nothing passes for that field.
    pub fn set_filter<I>(&mut self, table: &FactTable, field: &str, selected: I) -> Result<(), ModelError>
    where
        I: IntoIterator<Item = FactValue>,
    {
        let domain: FxHashSet<FactValue> = domain_of(table, field)?.into_iter().collect();
        let selected: FxHashSet<FactValue> = selected
            .into_iter()
            .filter(|v| domain.contains(v))
            .collect();

        if selected.len() == domain.len() {
            self.allowed.remove(field);
        } else {
            self.allowed.insert(field.to_string(), selected);
        }
        Ok(())
    }

    /// Removes the entry for `field`. Returns whether one existed.
    pub fn clear(&mut self, field: &str) -> bool {
        self.allowed.remove(field).is_some()
    }

    pub fn clear_all(&mut self) {
        self.allowed.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }

    pub fn is_filtered(&self, field: &str) -> bool {
        self.allowed.contains_key(field)
    }

    /// Sorted allow-list for `field`, or `None` when unrestricted.
    pub fn allowed(&self, field: &str) -> Option<Vec<FactValue>> {
        self.allowed.get(field).map(|set| {
            let mut values: Vec<FactValue> = set.iter().cloned().collect();
            values.sort();
            values
        })
    }

    /// Whether `value` passes the filter on `field`.
    pub fn allows(&self, field: &str, value: &FactValue) -> bool {
        self.allowed
            .get(field)
            .map_or(true, |set| set.contains(value))
    }

    /// Names of the filtered fields, sorted.
    pub fn active_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = self.allowed.keys().map(String::as_str).collect();
        fields.sort_unstable();
        fields
    }

    /// Rows of `table` whose value is allowed in every filtered field.
    pub fn apply(&self, table: &FactTable) -> Result<FactTable, ModelError> {
        if self.allowed.is_empty() {
            return Ok(table.clone());
        }

        let mut checks: Vec<(FieldIndex, &FxHashSet<FactValue>)> = Vec::with_capacity(self.allowed.len());
        for (field, set) in &self.allowed {
            checks.push((table.field_index(field)?, set));
        }

        let rows: Vec<FactRow> = table
            .rows()
            .iter()
            .filter(|row| checks.iter().all(|(idx, set)| set.contains(row.get(*idx))))
            .cloned()
            .collect();

        Ok(table.with_rows(rows))
    }

    /// Re-validates the entries against a freshly loaded table.
    ///
    /// Entries for fields the new table lacks are removed. The remaining
    /// allow-lists are kept as stored, so `apply` gives the same rows before
    /// and after.
    pub fn reconcile(&mut self, table: &FactTable) {
        self.allowed.retain(|field, _| table.has_field(field));
    }
}
