use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A date read from a chart, keeping "label absent" apart from "could not parse".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateField {
    #[default]
    Missing,
    Unparseable(String),
    Date(NaiveDate),
}

impl DateField {
    /// `YYYY-MM-DD`, or empty when there is no usable date.
    pub fn iso(&self) -> String {
        match self {
            DateField::Date(d) => d.format("%Y-%m-%d").to_string(),
            DateField::Missing | DateField::Unparseable(_) => String::new(),
        }
    }
}

/// One visit record pulled from one logical table of a chart PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub patient_name: String,
    pub dob: DateField,
    pub diagnosis: Option<String>,
    pub therapist: Option<String>,
    pub dos: DateField,
    pub visit_no: Option<String>,
    pub authorization_no: Option<String>,
    pub source_file: PathBuf,
}

/// A raw spreadsheet cell, detached from the spreadsheet reader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl SheetValue {
    pub fn is_empty(&self) -> bool {
        match self {
            SheetValue::Empty => true,
            SheetValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Cell text as shown to a user; `None` for empty cells.
    pub fn as_text(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

impl fmt::Display for SheetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetValue::Empty => Ok(()),
            SheetValue::Text(s) => write!(f, "{s}"),
            SheetValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            SheetValue::Number(n) => write!(f, "{n}"),
            SheetValue::Bool(b) => write!(f, "{b}"),
            SheetValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// Canonical names of the spreadsheet columns the matcher needs.
pub const PATIENT_NAME_COLUMN: &str = "Weekly pt. tx list";
pub const DATE_OF_BIRTH_COLUMN: &str = "Date of birth";
pub const DIAGNOSIS_COLUMN: &str = "Diagnosis";
pub const AUTHORIZATION_COLUMN: &str = "Authorization number";
pub const DATE_OF_THERAPY_COLUMN: &str = "Date of Therapy";

pub const REQUIRED_COLUMNS: [&str; 5] = [
    PATIENT_NAME_COLUMN,
    DATE_OF_BIRTH_COLUMN,
    DIAGNOSIS_COLUMN,
    AUTHORIZATION_COLUMN,
    DATE_OF_THERAPY_COLUMN,
];

/// Positions of the required columns within [`Spreadsheet::headers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredColumns {
    pub patient_name: usize,
    pub date_of_birth: usize,
    pub diagnosis: usize,
    pub authorization: usize,
    pub date_of_therapy: usize,
}

/// One data row of the treatment list.
#[derive(Debug, Clone, PartialEq)]
pub struct SpreadsheetRow {
    /// Zero-based row index in the sheet.
    pub sheet_row: usize,
    /// Cells aligned with [`Spreadsheet::headers`].
    pub values: Vec<SheetValue>,
    pub visit_no: String,
    pub file: String,
}

impl SpreadsheetRow {
    pub fn value(&self, column: usize) -> &SheetValue {
        static EMPTY: SheetValue = SheetValue::Empty;
        self.values.get(column).unwrap_or(&EMPTY)
    }
}

/// The treatment list below its detected header row.
#[derive(Debug, Clone, PartialEq)]
pub struct Spreadsheet {
    pub sheet_name: String,
    /// Zero-based row index of the detected header row.
    pub header_row: usize,
    pub headers: Vec<String>,
    pub required: RequiredColumns,
    pub rows: Vec<SpreadsheetRow>,
}

/// A plain rectangular result table, ready for display or export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value at `row` in the named column.
    pub fn get(&self, row: usize, name: &str) -> Option<&str> {
        let col = self.column(name)?;
        self.rows.get(row)?.get(col).map(|s| s.as_str())
    }
}

/// Result of one complete run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// Everything extracted from the PDFs.
    pub extraction: Table,
    /// The treatment list with `Visit No` and `File` filled where a unique match exists.
    pub merged: Table,
    /// Number of spreadsheet rows that received a unique match.
    pub matched: usize,
    pub files_processed: usize,
}
