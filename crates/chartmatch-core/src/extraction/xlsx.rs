use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::config::ColumnRange;
use crate::error::ChartMatchError;
use crate::model::{RequiredColumns, SheetValue, Spreadsheet, SpreadsheetRow, REQUIRED_COLUMNS};
use crate::parsing::normalize::{excel_serial_to_date, parse_sheet_date};

/// Load the patient treatment list from `sheet_name` of the workbook at `path`.
///
/// Junk rows above the real header are skipped: the header is the first row
/// holding all required column names.
pub fn load_spreadsheet(
    path: &Path,
    sheet_name: &str,
    columns: &ColumnRange,
) -> Result<Spreadsheet, ChartMatchError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| ChartMatchError::SpreadsheetOpen {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let available = workbook.sheet_names();
    if !available.iter().any(|s| s == sheet_name) {
        return Err(ChartMatchError::SheetNotFound {
            sheet: sheet_name.to_string(),
            available,
        });
    }

    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| ChartMatchError::SpreadsheetOpen {
            path: path.to_path_buf(),
            reason: format!("failed to read sheet '{sheet_name}': {e}"),
        })?;

    let grid = select_columns(&range, columns);
    build_spreadsheet(sheet_name, grid)
}

/// Read the selected columns into sheet-absolute rows of [`SheetValue`].
fn select_columns(range: &calamine::Range<Data>, columns: &ColumnRange) -> Vec<Vec<SheetValue>> {
    let Some((first_row, first_col)) = range.start() else {
        return Vec::new();
    };
    let Some((_, last_col)) = range.end() else {
        return Vec::new();
    };

    let selected: Vec<u32> = (0..=last_col).filter(|&c| columns.contains(c)).collect();

    let mut grid: Vec<Vec<SheetValue>> = vec![Vec::new(); first_row as usize];
    for row in range.rows() {
        let values = selected
            .iter()
            .map(|&col| {
                col.checked_sub(first_col)
                    .and_then(|offset| row.get(offset as usize))
                    .map(sheet_value)
                    .unwrap_or_default()
            })
            .collect();
        grid.push(values);
    }
    grid
}

fn sheet_value(cell: &Data) -> SheetValue {
    match cell {
        Data::Empty => SheetValue::Empty,
        Data::String(s) => {
            if s.trim().is_empty() {
                SheetValue::Empty
            } else {
                SheetValue::Text(s.clone())
            }
        }
        Data::Float(f) => SheetValue::Number(*f),
        Data::Int(i) => SheetValue::Number(*i as f64),
        Data::Bool(b) => SheetValue::Bool(*b),
        Data::DateTime(dt) => match excel_serial_to_date(dt.as_f64()) {
            Some(date) => SheetValue::Date(date),
            None => SheetValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => match parse_sheet_date(s) {
            Some(date) => SheetValue::Date(date),
            None => SheetValue::Text(s.clone()),
        },
        Data::DurationIso(s) => SheetValue::Text(s.clone()),
        Data::Error(e) => SheetValue::Text(format!("#{e:?}")),
    }
}

/// Locate the header row, then turn the rows below it into [`SpreadsheetRow`]s.
///
/// Fully empty rows are dropped; every kept row remembers its sheet position.
pub fn build_spreadsheet(
    sheet_name: &str,
    grid: Vec<Vec<SheetValue>>,
) -> Result<Spreadsheet, ChartMatchError> {
    let header_row = grid
        .iter()
        .position(|row| is_header_row(row))
        .ok_or_else(|| ChartMatchError::HeaderRowNotFound {
            sheet: sheet_name.to_string(),
            required: REQUIRED_COLUMNS.iter().map(|s| s.to_string()).collect(),
        })?;

    let mut headers: Vec<String> = grid[header_row]
        .iter()
        .map(|v| v.as_text().map(|s| s.trim().to_string()).unwrap_or_default())
        .collect();

    let required = resolve_required(&mut headers).ok_or_else(|| {
        ChartMatchError::HeaderRowNotFound {
            sheet: sheet_name.to_string(),
            required: REQUIRED_COLUMNS.iter().map(|s| s.to_string()).collect(),
        }
    })?;

    let width = headers.len();
    let rows = grid
        .into_iter()
        .enumerate()
        .skip(header_row + 1)
        .filter(|(_, values)| values.iter().any(|v| !v.is_empty()))
        .map(|(sheet_row, mut values)| {
            values.resize(width, SheetValue::Empty);
            SpreadsheetRow {
                sheet_row,
                values,
                visit_no: String::new(),
                file: String::new(),
            }
        })
        .collect();

    tracing::debug!(
        sheet = sheet_name,
        header_row,
        columns = width,
        "located spreadsheet header"
    );

    Ok(Spreadsheet {
        sheet_name: sheet_name.to_string(),
        header_row,
        headers,
        required,
        rows,
    })
}

/// Header cell comparison shared by detection and column lookup.
fn header_matches(cell: &str, name: &str) -> bool {
    cell.trim().to_lowercase() == name.to_lowercase()
}

/// True when the row contains every required header name (any order, any case).
fn is_header_row(row: &[SheetValue]) -> bool {
    let cells: Vec<String> = row.iter().filter_map(|v| v.as_text()).collect();
    REQUIRED_COLUMNS
        .iter()
        .all(|req| cells.iter().any(|c| header_matches(c, req)))
}

/// Find each required column and rename it to its canonical spelling.
fn resolve_required(headers: &mut [String]) -> Option<RequiredColumns> {
    let mut find = |name: &str| -> Option<usize> {
        let idx = headers.iter().position(|h| header_matches(h, name))?;
        headers[idx] = name.to_string();
        Some(idx)
    };

    Some(RequiredColumns {
        patient_name: find(REQUIRED_COLUMNS[0])?,
        date_of_birth: find(REQUIRED_COLUMNS[1])?,
        diagnosis: find(REQUIRED_COLUMNS[2])?,
        authorization: find(REQUIRED_COLUMNS[3])?,
        date_of_therapy: find(REQUIRED_COLUMNS[4])?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn text(s: &str) -> SheetValue {
        SheetValue::Text(s.to_string())
    }

    fn header() -> Vec<SheetValue> {
        vec![
            text("Weekly pt. tx list"),
            text("Authorization number"),
            text("Date of Therapy"),
            text("Diagnosis"),
            text("Date of birth"),
        ]
    }

    #[test]
    fn test_header_after_junk_rows() {
        let grid = vec![
            vec![text("PT list"), SheetValue::Empty],
            vec![SheetValue::Empty; 5],
            vec![text("Week of Jun 30"), text("Diagnosis")],
            header(),
            vec![
                text("Jane Doe"),
                text("AT-1"),
                SheetValue::Date(NaiveDate::from_ymd_opt(2025, 6, 24).unwrap()),
                text("Back pain"),
                text("1/2/1980"),
            ],
            vec![SheetValue::Empty; 5],
            vec![text("John Roe")],
        ];

        let sheet = build_spreadsheet("Week", grid).unwrap();
        assert_eq!(sheet.header_row, 3);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].sheet_row, 4);
        assert_eq!(sheet.rows[1].sheet_row, 6);
        assert_eq!(sheet.rows[1].values.len(), 5);
        assert_eq!(sheet.required.patient_name, 0);
        assert_eq!(sheet.required.date_of_birth, 4);
        assert!(sheet.rows[0].visit_no.is_empty());
    }

    #[test]
    fn test_header_match_is_case_insensitive() {
        let grid = vec![vec![
            text("WEEKLY PT. TX LIST"),
            text("date of birth"),
            text(" Diagnosis "),
            text("Authorization Number"),
            text("Date of therapy"),
            text("Notes"),
        ]];
        let sheet = build_spreadsheet("Week", grid).unwrap();
        assert_eq!(sheet.headers[0], "Weekly pt. tx list");
        assert_eq!(sheet.headers[4], "Date of Therapy");
        assert_eq!(sheet.headers[5], "Notes");
        assert!(sheet.rows.is_empty());
    }

    #[test]
    fn test_header_detection_and_lookup_agree_on_unicode_case() {
        // U+212A KELVIN SIGN lowercases to an ASCII 'k'.
        let grid = vec![vec![
            text("WEE\u{212A}LY PT. TX LIST"),
            text("Date of birth"),
            text("Diagnosis"),
            text("Authorization number"),
            text("Date of Therapy"),
        ]];
        let sheet = build_spreadsheet("Week", grid).unwrap();
        assert_eq!(sheet.required.patient_name, 0);
        assert_eq!(sheet.headers[0], "Weekly pt. tx list");
    }

    #[test]
    fn test_missing_header_is_an_error() {
        let grid = vec![
            vec![text("Weekly pt. tx list"), text("Diagnosis")],
            vec![text("Jane Doe"), text("Back pain")],
        ];
        let err = build_spreadsheet("Week", grid).unwrap_err();
        assert!(matches!(err, ChartMatchError::HeaderRowNotFound { .. }));
    }

    #[test]
    fn test_sheet_value_conversion() {
        assert_eq!(sheet_value(&Data::String("  ".into())), SheetValue::Empty);
        assert_eq!(sheet_value(&Data::Int(7)), SheetValue::Number(7.0));
        assert_eq!(
            sheet_value(&Data::DateTimeIso("2025-06-24T00:00:00".into())),
            SheetValue::Date(NaiveDate::from_ymd_opt(2025, 6, 24).unwrap())
        );
    }
}
