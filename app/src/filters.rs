//! FILENAME: app/src/filters.rs
//! Server-side filter: label ids and a day range.

use crate::error::AppError;
use chrono::NaiveDate;
use report_client::{LabelId, ProductivityRequest};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What the backend is asked for. An empty label set means every label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub label_ids: BTreeSet<LabelId>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

impl FilterSpec {
    pub fn new() -> Self {
        FilterSpec::default()
    }

    /// Stores a label selection. Selecting every known label is the same as
    /// selecting none and is stored as the empty set.
    pub fn set_labels<I>(&mut self, selected: I, known: &[LabelId])
    where
        I: IntoIterator<Item = LabelId>,
    {
        let selected: BTreeSet<LabelId> = selected.into_iter().collect();
        let covers_all = !known.is_empty() && known.iter().all(|id| selected.contains(id));
        self.label_ids = if covers_all { BTreeSet::new() } else { selected };
    }

    pub fn is_unrestricted(&self) -> bool {
        self.label_ids.is_empty() && self.from_date.is_none() && self.to_date.is_none()
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if let (Some(from), Some(to)) = (self.from_date, self.to_date) {
            if from > to {
                return Err(AppError::validation(format!(
                    "from date {} is after to date {}",
                    from, to
                )));
            }
        }
        Ok(())
    }

    pub fn to_request(&self) -> ProductivityRequest {
        ProductivityRequest {
            label_ids: self.label_ids.iter().copied().collect(),
            from_day: self.from_date,
            to_day: self.to_date,
        }
    }

    /// Adopts the filter the backend says it applied. An echo naming every
    /// known label is stored as unrestricted.
    pub fn reconcile_with(&mut self, echoed: &ProductivityRequest, known: &[LabelId]) {
        self.set_labels(echoed.label_ids.iter().copied(), known);
        self.from_date = echoed.from_day;
        self.to_date = echoed.to_day;
    }

    /// Labels to show as ticked: everything known when unrestricted,
    /// otherwise exactly the stored set.
    pub fn selected_labels(&self, known: &[LabelId]) -> Vec<LabelId> {
        if self.label_ids.is_empty() {
            known.to_vec()
        } else {
            self.label_ids.iter().copied().collect()
        }
    }
}
