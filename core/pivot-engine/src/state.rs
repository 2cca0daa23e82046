//! FILENAME: core/pivot-engine/src/state.rs
//! Pivot State Machine - the live arrangement and how it may change.
//!
//! There are two ways to change the layout and they are separate
//! transitions: `user_rearrange` (drag/drop, field placement) and
//! `load_arrangement` (a saved view was selected, or initial mount).
//! The origin travels with the returned event, so callers never have to
//! consult an out-of-band "programmatic change" flag.

use crate::definition::{MeasureFields, MeasureUnit, PivotArrangement};
use crate::error::PivotError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Who caused an arrangement change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeOrigin {
    User,
    Programmatic,
}

/// Emitted by every transition of `PivotState`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PivotEvent {
    /// The user moved fields. `changed` is false when the drop left the
    /// layout as it was.
    RearrangedByUser { changed: bool },
    /// A layout was loaded. `dropped` lists fields that were discarded
    /// because the current dataset does not know them, or because they
    /// were repeated.
    Loaded { dropped: Vec<String> },
    /// The measure unit was switched. Structure untouched.
    UnitChanged { unit: MeasureUnit },
}

impl PivotEvent {
    pub fn origin(&self) -> ChangeOrigin {
        match self {
            PivotEvent::RearrangedByUser { .. } => ChangeOrigin::User,
            PivotEvent::Loaded { .. } | PivotEvent::UnitChanged { .. } => ChangeOrigin::Programmatic,
        }
    }

    /// Whether the event can flip the dirty flag.
    pub fn affects_layout(&self) -> bool {
        matches!(
            self,
            PivotEvent::RearrangedByUser { changed: true } | PivotEvent::Loaded { .. }
        )
    }
}

/// The current arrangement plus the display unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotState {
    arrangement: PivotArrangement,
    unit: MeasureUnit,
    measures: MeasureFields,
    /// Bumped on every transition that replaces the layout.
    revision: u64,
}

impl PivotState {
    pub fn new(measures: MeasureFields, unit: MeasureUnit) -> Self {
        let arrangement = PivotArrangement::new(measures.field_for(unit));
        PivotState {
            arrangement,
            unit,
            measures,
            revision: 0,
        }
    }

    pub fn arrangement(&self) -> &PivotArrangement {
        &self.arrangement
    }

    pub fn unit(&self) -> MeasureUnit {
        self.unit
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// User-driven rearrangement. Rejected layouts leave the state unchanged.
    pub fn user_rearrange(
        &mut self,
        rows: Vec<String>,
        cols: Vec<String>,
        fields: &[String],
    ) -> Result<PivotEvent, PivotError> {
        let mut next = self.arrangement.clone();
        next.row_fields = rows;
        next.col_fields = cols;
        next.validate(fields)?;

        let changed = !self.arrangement.same_layout(&next.row_fields, &next.col_fields);
        if changed {
            self.arrangement = next;
            self.revision += 1;
        }
        Ok(PivotEvent::RearrangedByUser { changed })
    }

    /// Programmatic load of a saved layout.
    ///
    /// Never fails: unknown fields, duplicates and fields already placed on
    /// the row axis are dropped and reported in the event.
    pub fn load_arrangement(&mut self, rows: &[String], cols: &[String], fields: &[String]) -> PivotEvent {
        let mut seen: HashSet<String> = HashSet::new();
        let mut dropped = Vec::new();
        let mut keep = |name: &String| {
            let ok = fields.contains(name) && seen.insert(name.clone());
            if !ok {
                dropped.push(name.clone());
            }
            ok
        };

        let row_fields: Vec<String> = rows.iter().filter(|f| keep(*f)).cloned().collect();
        let col_fields: Vec<String> = cols.iter().filter(|f| keep(*f)).cloned().collect();

        self.arrangement.row_fields = row_fields;
        self.arrangement.col_fields = col_fields;
        self.revision += 1;
        PivotEvent::Loaded { dropped }
    }

    /// Switches the display unit by swapping the value field.
    pub fn set_unit(&mut self, unit: MeasureUnit) -> PivotEvent {
        self.unit = unit;
        self.arrangement.value_field = self.measures.field_for(unit).to_string();
        PivotEvent::UnitChanged { unit }
    }
}
