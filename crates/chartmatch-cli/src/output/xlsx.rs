use std::path::Path;

use chartmatch_core::error::ChartMatchError;
use chartmatch_core::Table;
use rust_xlsxwriter::{Format, Workbook, XlsxError};

/// Write `table` to a new workbook at `path`: a bold header row, then every
/// row as text.
pub fn write_table(table: &Table, path: &Path, sheet_name: &str) -> Result<(), ChartMatchError> {
    write_workbook(table, path, sheet_name).map_err(|e| {
        ChartMatchError::Io(std::io::Error::other(format!(
            "failed to write {}: {e}",
            path.display()
        )))
    })
}

fn write_workbook(table: &Table, path: &Path, sheet_name: &str) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    let header_format = Format::new().set_bold();
    for (col, name) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, &header_format)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let row_num = (row_idx + 1) as u32;
        for (col, value) in row.iter().enumerate() {
            if !value.is_empty() {
                worksheet.write_string(row_num, col as u16, value)?;
            }
        }
    }

    for (col, name) in table.columns.iter().enumerate() {
        let widest = table
            .rows
            .iter()
            .filter_map(|r| r.get(col))
            .map(|v| v.chars().count())
            .chain(std::iter::once(name.chars().count()))
            .max()
            .unwrap_or(8);
        worksheet.set_column_width(col as u16, (widest as f64 + 2.0).min(60.0))?;
    }

    workbook.save(path)
}
