//! FILENAME: core/pivot-engine/src/cache.rs
//! Group keys and aggregate accumulators.
//!
//! A cross-tab cell is addressed by two group keys (row tuple, column tuple)
//! and holds one accumulator. Accumulators are built incrementally in a
//! single pass over the facts and can be merged.

use crate::definition::AggregationType;
use fact_model::FactValue;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// The values of the grouping fields for one axis, outer to inner.
/// Most reports nest at most a handful of fields, so keys stay inline.
pub type GroupKey = SmallVec<[FactValue; 4]>;

// ============================================================================
// AGGREGATE ACCUMULATOR
// ============================================================================

/// Accumulator for computing aggregates incrementally.
/// Stores the intermediate state needed for every `AggregationType`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateAccumulator {
    pub sum: f64,
    /// Contributing rows, numeric or not.
    pub count: u64,
    pub count_numbers: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl AggregateAccumulator {
    pub fn new() -> Self {
        AggregateAccumulator::default()
    }

    /// Adds one fact's value. Non-numeric values only bump the row count.
    pub fn add(&mut self, value: &FactValue) {
        match value.as_f64() {
            Some(n) => self.add_number(n),
            None => self.add_non_number(),
        }
    }

    pub fn add_number(&mut self, value: f64) {
        self.count += 1;
        self.count_numbers += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    pub fn add_non_number(&mut self) {
        self.count += 1;
    }

    /// Computes the final aggregate value.
    pub fn compute(&self, aggregation: AggregationType) -> f64 {
        match aggregation {
            AggregationType::Sum => self.sum,
            AggregationType::Count => self.count as f64,
            AggregationType::Average => {
                if self.count_numbers > 0 {
                    self.sum / (self.count_numbers as f64)
                } else {
                    0.0
                }
            }
            AggregationType::Min => self.min.unwrap_or(0.0),
            AggregationType::Max => self.max.unwrap_or(0.0),
        }
    }

    /// Merges another accumulator into this one.
    pub fn merge(&mut self, other: &AggregateAccumulator) {
        if other.count == 0 {
            return;
        }
        self.sum += other.sum;
        self.count += other.count;
        self.count_numbers += other.count_numbers;
        if let Some(other_min) = other.min {
            self.min = Some(self.min.map_or(other_min, |m| m.min(other_min)));
        }
        if let Some(other_max) = other.max {
            self.max = Some(self.max.map_or(other_max, |m| m.max(other_max)));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulator_aggregations() {
        let mut acc = AggregateAccumulator::new();
        acc.add(&FactValue::Number(10.0));
        acc.add(&FactValue::Number(20.0));
        acc.add(&FactValue::Empty);

        assert_eq!(acc.compute(AggregationType::Sum), 30.0);
        assert_eq!(acc.compute(AggregationType::Count), 3.0);
        assert_eq!(acc.compute(AggregationType::Average), 15.0);
        assert_eq!(acc.compute(AggregationType::Min), 10.0);
        assert_eq!(acc.compute(AggregationType::Max), 20.0);
    }

    #[test]
    fn test_empty_accumulator_uses_identity() {
        let acc = AggregateAccumulator::new();
        assert!(acc.is_empty());
        assert_eq!(acc.compute(AggregationType::Sum), 0.0);
        assert_eq!(acc.compute(AggregationType::Average), 0.0);
    }

    #[test]
    fn test_merge() {
        let mut a = AggregateAccumulator::new();
        a.add_number(5.0);
        let mut b = AggregateAccumulator::new();
        b.add_number(-2.0);
        b.add_number(7.0);

        a.merge(&b);
        assert_eq!(a.compute(AggregationType::Sum), 10.0);
        assert_eq!(a.compute(AggregationType::Min), -2.0);
        assert_eq!(a.compute(AggregationType::Max), 7.0);
        assert_eq!(a.count, 3);
    }
}
