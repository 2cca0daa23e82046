//! FILENAME: core/persistence/src/xlsx_writer.rs

use crate::{PersistenceError, DEFAULT_FILE_NAME};
use pivot_engine::{CellType, CrossTabView, ViewCell, ViewValue};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook as XlsxWorkbook, Worksheet};
use std::path::{Path, PathBuf};

/// Excel grid limits.
const MAX_ROWS: usize = 1_048_576;
const MAX_COLS: usize = 16_384;
const MAX_SHEET_NAME: usize = 31;

const HEADER_FILL: u32 = 0xD9E1F2;
const TOTAL_FILL: u32 = 0xEDEDED;

/// Writes `view` to `<dir>/<sanitised base>.xlsx` and returns the path.
/// The directory is created if missing; an existing file is overwritten.
pub fn export_view(view: &CrossTabView, dir: &Path, file_name_base: &str) -> Result<PathBuf, PersistenceError> {
    std::fs::create_dir_all(dir)?;
    let file_name = sanitize_file_name(file_name_base);
    let path = dir.join(format!("{}.xlsx", file_name));
    save_view(view, &sanitize_sheet_name(file_name_base), &path)?;
    Ok(path)
}

/// Writes `view` as the only worksheet of a new workbook at `path`.
pub fn save_view(view: &CrossTabView, sheet_name: &str, path: &Path) -> Result<(), PersistenceError> {
    if view.row_count > MAX_ROWS || view.col_count > MAX_COLS {
        return Err(PersistenceError::InvalidFormat(format!(
            "{} x {} grid exceeds the worksheet limits",
            view.row_count, view.col_count
        )));
    }

    let mut xlsx = XlsxWorkbook::new();
    let worksheet = xlsx.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (row, cells) in view.cells.iter().enumerate() {
        for (col, cell) in cells.iter().enumerate() {
            write_cell(worksheet, row as u32, col as u16, cell)?;
        }
    }

    for (col, width) in column_widths(view).into_iter().enumerate() {
        worksheet.set_column_width(col as u16, width)?;
    }
    if view.header_row_count < view.row_count {
        worksheet.set_freeze_panes(view.header_row_count as u32, view.label_col_count as u16)?;
    }

    xlsx.save(path)?;
    Ok(())
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &ViewCell) -> Result<(), PersistenceError> {
    let format = cell_format(cell);
    match &cell.value {
        ViewValue::Empty => {
            if let Some(fmt) = format {
                worksheet.write_blank(row, col, &fmt)?;
            }
        }
        ViewValue::Number(n) => {
            let fmt = format.unwrap_or_else(Format::new).set_num_format(number_format(*n));
            worksheet.write_number_with_format(row, col, *n, &fmt)?;
        }
        ViewValue::Text(s) => match format {
            Some(fmt) => {
                worksheet.write_string_with_format(row, col, s, &fmt)?;
            }
            None => {
                worksheet.write_string(row, col, s)?;
            }
        },
    }
    Ok(())
}

/// Formatting by cell role. Plain data and blank filler get none.
fn cell_format(cell: &ViewCell) -> Option<Format> {
    let mut format = match cell.cell_type {
        CellType::Data | CellType::Blank | CellType::RowHeader => {
            if !cell.is_bold {
                return None;
            }
            Format::new()
        }
        CellType::Corner | CellType::FieldLabel | CellType::ColumnHeader => Format::new()
            .set_background_color(Color::RGB(HEADER_FILL))
            .set_border_bottom(FormatBorder::Thin),
        CellType::GrandTotalRow | CellType::GrandTotalColumn | CellType::GrandTotal => {
            Format::new().set_background_color(Color::RGB(TOTAL_FILL))
        }
    };

    if cell.is_bold {
        format = format.set_bold();
    }
    if cell.cell_type == CellType::ColumnHeader {
        format = format.set_align(FormatAlign::Center);
    }
    Some(format)
}

fn number_format(n: f64) -> &'static str {
    if n.fract() == 0.0 {
        "#,##0"
    } else {
        "#,##0.00"
    }
}

/// Width per column in Excel character units, from the formatted text.
fn column_widths(view: &CrossTabView) -> Vec<f64> {
    let mut widths = vec![8.0_f64; view.col_count];
    for cells in &view.cells {
        for (col, cell) in cells.iter().enumerate() {
            let chars = cell.formatted_value.chars().count() as f64;
            widths[col] = widths[col].max(chars + 2.0);
        }
    }
    widths.into_iter().map(|w| w.min(60.0)).collect()
}

// ============================================================================
// NAMES
// ============================================================================

/// File name safe on every platform: path separators, reserved characters
/// and control characters become `_`.
pub fn sanitize_file_name(base: &str) -> String {
    let cleaned: String = base
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == ' ').to_string();
    if cleaned.is_empty() {
        DEFAULT_FILE_NAME.to_string()
    } else {
        cleaned
    }
}

/// Worksheet name: no `[]:*?/\`, no leading/trailing apostrophe, at most
/// 31 characters.
pub fn sanitize_sheet_name(base: &str) -> String {
    let cleaned: String = base
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .take(MAX_SHEET_NAME)
        .collect();
    let cleaned = cleaned.trim_matches('\'').trim().to_string();
    if cleaned.is_empty() {
        DEFAULT_FILE_NAME.to_string()
    } else {
        cleaned
    }
}
