//! FILENAME: core/pivot-engine/src/view.rs
//! Cross-Tab View - Renderable output.
//!
//! This module turns a `CrossTab` into a 2D grid of typed cells. The grid is
//! the "currently rendered" snapshot: the CLI prints it and the export
//! adapter writes it to a spreadsheet. Nothing here reads raw facts.
//!
//! Layout (compact, one label column per row field):
//!
//! ```text
//! Sum of Minutes | Client            |
//! User           | Acme   | Globex   | Grand Total
//! Ana            | 10     |          | 10
//! Beto           | 20     | 5        | 25
//! Grand Total    | 30     | 5        | 35
//! ```

use crate::engine::CrossTab;
use fact_model::FactValue;
use serde::{Deserialize, Serialize};

pub const GRAND_TOTAL_LABEL: &str = "Grand Total";
pub const TOTAL_LABEL: &str = "Total";

// ============================================================================
// CELL TYPES
// ============================================================================

/// The type of a cell in the rendered cross-tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellType {
    /// Top-left cell (carries the value caption).
    Corner,
    /// Name of a row or column field.
    FieldLabel,
    /// Row group label.
    RowHeader,
    /// Column group label.
    ColumnHeader,
    /// Aggregated value.
    Data,
    /// Grand total row.
    GrandTotalRow,
    /// Grand total column.
    GrandTotalColumn,
    /// Intersection of the grand total row and column.
    GrandTotal,
    /// Layout filler, including repeated outer labels.
    Blank,
}

/// Display value for a view cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ViewValue {
    Empty,
    Number(f64),
    Text(String),
}

impl From<&FactValue> for ViewValue {
    fn from(value: &FactValue) -> Self {
        match value {
            FactValue::Empty => ViewValue::Text(value.label()),
            FactValue::Number(n) => ViewValue::Number(*n),
            FactValue::Text(s) => ViewValue::Text(s.clone()),
        }
    }
}

impl From<f64> for ViewValue {
    fn from(value: f64) -> Self {
        ViewValue::Number(value)
    }
}

// ============================================================================
// VIEW CELL
// ============================================================================

/// A single cell of the rendered grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewCell {
    pub value: ViewValue,
    pub cell_type: CellType,
    /// Headers and totals are emphasised.
    pub is_bold: bool,
    /// Pre-formatted display string.
    pub formatted_value: String,
}

impl ViewCell {
    fn text(label: impl Into<String>, cell_type: CellType, is_bold: bool) -> Self {
        let label = label.into();
        ViewCell {
            value: ViewValue::Text(label.clone()),
            formatted_value: label,
            cell_type,
            is_bold,
        }
    }

    fn header(value: &FactValue, cell_type: CellType) -> Self {
        ViewCell {
            value: ViewValue::from(value),
            formatted_value: value.label(),
            cell_type,
            is_bold: false,
        }
    }

    fn number(value: Option<f64>, cell_type: CellType) -> Self {
        match value {
            Some(n) => ViewCell {
                value: ViewValue::Number(n),
                formatted_value: format_number(n),
                cell_type,
                is_bold: cell_type != CellType::Data,
            },
            None => ViewCell {
                value: ViewValue::Empty,
                formatted_value: String::new(),
                cell_type,
                is_bold: false,
            },
        }
    }

    pub fn blank() -> Self {
        ViewCell {
            value: ViewValue::Empty,
            formatted_value: String::new(),
            cell_type: CellType::Blank,
            is_bold: false,
        }
    }
}

/// Integers print without decimals, everything else with two.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{:.2}", n)
    }
}

// ============================================================================
// VIEW
// ============================================================================

/// The rendered grid, row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossTabView {
    pub row_count: usize,
    pub col_count: usize,
    /// Rows above the first data row.
    pub header_row_count: usize,
    /// Columns left of the first data column.
    pub label_col_count: usize,
    pub cells: Vec<Vec<ViewCell>>,
}

impl CrossTabView {
    pub fn cell(&self, row: usize, col: usize) -> Option<&ViewCell> {
        self.cells.get(row).and_then(|r| r.get(col))
    }

    /// Formatted values, one `Vec` per grid row.
    pub fn to_text_rows(&self) -> Vec<Vec<String>> {
        self.cells
            .iter()
            .map(|row| row.iter().map(|c| c.formatted_value.clone()).collect())
            .collect()
    }

    /// Fixed-width text rendering for terminals.
    pub fn to_text(&self) -> String {
        let rows = self.to_text_rows();
        let mut widths = vec![0usize; self.col_count];
        for row in &rows {
            for (i, text) in row.iter().enumerate() {
                widths[i] = widths[i].max(text.chars().count());
            }
        }

        let mut out = String::new();
        for row in &rows {
            let line: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(i, text)| format!("{:<width$}", text, width = widths[i]))
                .collect();
            out.push_str(line.join(" | ").trim_end());
            out.push('\n');
        }
        out
    }
}

/// Renders a cross-tab into a grid.
///
/// A "Grand Total" column appears only when the column axis has fields, a
/// "Grand Total" row only when the row axis has fields. Outer labels that
/// repeat the previous row's (or column's) label are left blank.
pub fn render(tab: &CrossTab) -> CrossTabView {
    let nr = tab.row_fields.len();
    let nc = tab.col_fields.len();
    let label_cols = nr.max(1);
    let header_rows = nc + 1;
    let has_total_col = nc > 0 && tab.col_count() > 0;
    let has_total_row = nr > 0 && tab.row_count() > 0;

    let col_count = label_cols + tab.col_count() + usize::from(has_total_col);
    let row_count = header_rows + tab.row_count() + usize::from(has_total_row);
    let mut cells = vec![vec![ViewCell::blank(); col_count]; row_count];

    let caption = tab.caption();

    // Header block
    if nc == 0 {
        for (k, field) in tab.row_fields.iter().enumerate() {
            cells[0][k] = ViewCell::text(field.clone(), CellType::FieldLabel, true);
        }
        if nr == 0 {
            cells[0][0] = ViewCell::text(String::new(), CellType::Corner, false);
        }
        if tab.col_count() > 0 {
            cells[0][label_cols] = ViewCell::text(caption, CellType::ColumnHeader, true);
        }
    } else {
        cells[0][0] = ViewCell::text(caption, CellType::Corner, true);
        if col_count > label_cols {
            cells[0][label_cols] =
                ViewCell::text(tab.col_fields.join(" / "), CellType::FieldLabel, true);
        }
        for (k, field) in tab.row_fields.iter().enumerate() {
            cells[nc][k] = ViewCell::text(field.clone(), CellType::FieldLabel, true);
        }

        let col_keys = tab.col_keys();
        for (j, key) in col_keys.iter().enumerate() {
            for level in 0..nc {
                let repeated = j > 0 && col_keys[j - 1][..=level] == key[..=level];
                if !repeated {
                    cells[1 + level][label_cols + j] = ViewCell::header(&key[level], CellType::ColumnHeader);
                }
            }
        }
        if has_total_col {
            cells[nc][col_count - 1] = ViewCell::text(GRAND_TOTAL_LABEL, CellType::ColumnHeader, true);
        }
    }

    // Body
    let row_keys = tab.row_keys();
    for (i, key) in row_keys.iter().enumerate() {
        let grid_row = header_rows + i;
        if nr == 0 {
            cells[grid_row][0] = ViewCell::text(TOTAL_LABEL, CellType::RowHeader, false);
        }
        for level in 0..nr {
            let repeated = i > 0 && row_keys[i - 1][..=level] == key[..=level];
            if !repeated {
                cells[grid_row][level] = ViewCell::header(&key[level], CellType::RowHeader);
            }
        }
        for j in 0..tab.col_count() {
            cells[grid_row][label_cols + j] = ViewCell::number(tab.value(i, j), CellType::Data);
        }
        if has_total_col {
            cells[grid_row][col_count - 1] =
                ViewCell::number(Some(tab.row_total(i)), CellType::GrandTotalColumn);
        }
    }

    if has_total_row {
        let last = row_count - 1;
        cells[last][0] = ViewCell::text(GRAND_TOTAL_LABEL, CellType::GrandTotalRow, true);
        for j in 0..tab.col_count() {
            cells[last][label_cols + j] = ViewCell::number(Some(tab.col_total(j)), CellType::GrandTotalRow);
        }
        if has_total_col {
            cells[last][col_count - 1] = ViewCell::number(Some(tab.grand_total()), CellType::GrandTotal);
        }
    }

    CrossTabView {
        row_count,
        col_count,
        header_row_count: header_rows,
        label_col_count: label_cols,
        cells,
    }
}
