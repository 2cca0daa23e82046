//! FILENAME: core/pivot-engine/src/engine.rs
//! Pivot Engine - Derives a cross-tab from facts and an arrangement.
//!
//! Algorithm:
//! 1. Resolve the row, column and value fields to indices
//! 2. Single pass over the facts: intern row/column group keys and feed the
//!    value into the cell, row total, column total and grand total
//! 3. Sort the interned keys and remap cell coordinates to sorted order
//!
//! Blank rows (every field empty, e.g. the placeholder row) are skipped.
//! An axis without fields gets one implicit empty key.

use crate::cache::{AggregateAccumulator, GroupKey};
use crate::definition::{AggregationType, PivotArrangement};
use crate::error::PivotError;
use fact_model::{FactRow, FactTable, FactValue, FieldIndex};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

// ============================================================================
// CROSS-TAB
// ============================================================================

/// The aggregated two-dimensional table for one arrangement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossTab {
    pub row_fields: Vec<String>,
    pub col_fields: Vec<String>,
    pub value_field: String,
    pub aggregation: AggregationType,

    /// Distinct row keys, sorted.
    row_keys: Vec<GroupKey>,

    /// Distinct column keys, sorted.
    col_keys: Vec<GroupKey>,

    /// Only cells with at least one contributing fact are stored.
    cells: FxHashMap<(usize, usize), AggregateAccumulator>,

    row_totals: Vec<AggregateAccumulator>,
    col_totals: Vec<AggregateAccumulator>,
    grand_total: AggregateAccumulator,

    /// Number of facts that contributed (blank rows excluded).
    source_rows: usize,
}

impl CrossTab {
    fn empty(arrangement: &PivotArrangement) -> Self {
        CrossTab {
            row_fields: arrangement.row_fields.clone(),
            col_fields: arrangement.col_fields.clone(),
            value_field: arrangement.value_field.clone(),
            aggregation: arrangement.aggregation,
            row_keys: Vec::new(),
            col_keys: Vec::new(),
            cells: FxHashMap::default(),
            row_totals: Vec::new(),
            col_totals: Vec::new(),
            grand_total: AggregateAccumulator::new(),
            source_rows: 0,
        }
    }

    pub fn row_keys(&self) -> &[GroupKey] {
        &self.row_keys
    }

    pub fn col_keys(&self) -> &[GroupKey] {
        &self.col_keys
    }

    pub fn row_count(&self) -> usize {
        self.row_keys.len()
    }

    pub fn col_count(&self) -> usize {
        self.col_keys.len()
    }

    /// True when no fact contributed (empty input or placeholder only).
    pub fn is_empty(&self) -> bool {
        self.source_rows == 0
    }

    pub fn source_rows(&self) -> usize {
        self.source_rows
    }

    /// Aggregated value of a cell, or `None` when no fact fell into it.
    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        self.cells
            .get(&(row, col))
            .map(|acc| acc.compute(self.aggregation))
    }

    /// Aggregated value, with absent cells reading as the identity (0).
    pub fn value_or_zero(&self, row: usize, col: usize) -> f64 {
        self.value(row, col).unwrap_or(0.0)
    }

    /// Looks a cell up by its key values instead of its position.
    pub fn lookup(&self, row_key: &[FactValue], col_key: &[FactValue]) -> Option<f64> {
        let row = self.row_keys.binary_search_by(|k| k.as_slice().cmp(row_key)).ok()?;
        let col = self.col_keys.binary_search_by(|k| k.as_slice().cmp(col_key)).ok()?;
        self.value(row, col)
    }

    pub fn row_total(&self, row: usize) -> f64 {
        self.row_totals
            .get(row)
            .map_or(0.0, |acc| acc.compute(self.aggregation))
    }

    pub fn col_total(&self, col: usize) -> f64 {
        self.col_totals
            .get(col)
            .map_or(0.0, |acc| acc.compute(self.aggregation))
    }

    pub fn grand_total(&self) -> f64 {
        self.grand_total.compute(self.aggregation)
    }

    /// Sum over every stored cell. For `Sum` this equals `grand_total`.
    pub fn cell_sum(&self) -> f64 {
        self.cells
            .values()
            .map(|acc| acc.compute(self.aggregation))
            .sum()
    }

    /// Number of stored (non-absent) cells.
    pub fn populated_cells(&self) -> usize {
        self.cells.len()
    }

    /// Caption for the value area, e.g. "Sum of Minutes".
    pub fn caption(&self) -> String {
        format!("{} of {}", self.aggregation.label(), self.value_field)
    }
}

// ============================================================================
// DERIVATION
// ============================================================================

struct ResolvedFields {
    rows: Vec<FieldIndex>,
    cols: Vec<FieldIndex>,
    value: FieldIndex,
}

fn resolve(table: &FactTable, arrangement: &PivotArrangement) -> Result<ResolvedFields, PivotError> {
    let rows = arrangement
        .row_fields
        .iter()
        .map(|f| table.field_index(f))
        .collect::<Result<Vec<_>, _>>()?;
    let cols = arrangement
        .col_fields
        .iter()
        .map(|f| table.field_index(f))
        .collect::<Result<Vec<_>, _>>()?;
    let value = table.field_index(&arrangement.value_field)?;
    Ok(ResolvedFields { rows, cols, value })
}

fn key_for(row: &FactRow, fields: &[FieldIndex]) -> GroupKey {
    fields.iter().map(|&idx| row.get(idx).clone()).collect()
}

/// Interns a key, returning its position in insertion order.
fn intern(index: &mut FxHashMap<GroupKey, usize>, keys: &mut Vec<GroupKey>, key: GroupKey) -> usize {
    if let Some(&pos) = index.get(&key) {
        return pos;
    }
    let pos = keys.len();
    keys.push(key.clone());
    index.insert(key, pos);
    pos
}

/// Sorts interned keys and returns `old position -> new position`.
fn sort_keys(keys: &mut Vec<GroupKey>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));

    let mut remap = vec![0; keys.len()];
    for (new_pos, &old_pos) in order.iter().enumerate() {
        remap[old_pos] = new_pos;
    }

    let mut sorted: Vec<GroupKey> = order.iter().map(|&i| keys[i].clone()).collect();
    std::mem::swap(keys, &mut sorted);
    remap
}

/// Groups `table` by the arrangement's row and column fields and aggregates
/// the value field in every (row group x column group) cell.
///
/// Facts with identical key tuples are merged into one cell.
pub fn derive_cross_tab(
    table: &FactTable,
    arrangement: &PivotArrangement,
) -> Result<CrossTab, PivotError> {
    let fields = resolve(table, arrangement)?;
    let mut tab = CrossTab::empty(arrangement);

    let mut row_index: FxHashMap<GroupKey, usize> = FxHashMap::default();
    let mut col_index: FxHashMap<GroupKey, usize> = FxHashMap::default();
    let mut row_keys: Vec<GroupKey> = Vec::new();
    let mut col_keys: Vec<GroupKey> = Vec::new();
    let mut cells: FxHashMap<(usize, usize), AggregateAccumulator> = FxHashMap::default();
    let mut row_totals: Vec<AggregateAccumulator> = Vec::new();
    let mut col_totals: Vec<AggregateAccumulator> = Vec::new();

    for row in table.rows() {
        if row.is_blank() {
            continue;
        }
        let value = row.get(fields.value);

        let r = intern(&mut row_index, &mut row_keys, key_for(row, &fields.rows));
        let c = intern(&mut col_index, &mut col_keys, key_for(row, &fields.cols));
        if r == row_totals.len() {
            row_totals.push(AggregateAccumulator::new());
        }
        if c == col_totals.len() {
            col_totals.push(AggregateAccumulator::new());
        }

        cells.entry((r, c)).or_default().add(value);
        row_totals[r].add(value);
        col_totals[c].add(value);
        tab.grand_total.add(value);
        tab.source_rows += 1;
    }

    // Step 3: sorted order
    let row_remap = sort_keys(&mut row_keys);
    let col_remap = sort_keys(&mut col_keys);

    tab.cells = cells
        .into_iter()
        .map(|((r, c), acc)| ((row_remap[r], col_remap[c]), acc))
        .collect();

    tab.row_totals = vec![AggregateAccumulator::new(); row_keys.len()];
    for (old, acc) in row_totals.into_iter().enumerate() {
        tab.row_totals[row_remap[old]] = acc;
    }
    tab.col_totals = vec![AggregateAccumulator::new(); col_keys.len()];
    for (old, acc) in col_totals.into_iter().enumerate() {
        tab.col_totals[col_remap[old]] = acc;
    }

    tab.row_keys = row_keys;
    tab.col_keys = col_keys;
    Ok(tab)
}

/// Positions of the facts behind one cell (drill-down).
pub fn drill_down(
    table: &FactTable,
    arrangement: &PivotArrangement,
    row_key: &[FactValue],
    col_key: &[FactValue],
) -> Result<Vec<usize>, PivotError> {
    let fields = resolve(table, arrangement)?;
    let matches = |row: &FactRow, idxs: &[FieldIndex], key: &[FactValue]| {
        idxs.len() == key.len() && idxs.iter().zip(key).all(|(&i, v)| row.get(i) == v)
    };

    Ok(table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| !row.is_blank())
        .filter(|(_, row)| matches(row, &fields.rows, row_key) && matches(row, &fields.cols, col_key))
        .map(|(i, _)| i)
        .collect())
}
