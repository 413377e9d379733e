use crate::matching::sheet_date;
use crate::model::{
    ExtractedRecord, Spreadsheet, Table, AUTHORIZATION_COLUMN, DATE_OF_BIRTH_COLUMN,
    DATE_OF_THERAPY_COLUMN, DIAGNOSIS_COLUMN, PATIENT_NAME_COLUMN,
};
use crate::parsing::normalize::{display_dob, display_dos, normalize_spaces};

pub const VISIT_NO_COLUMN: &str = "Visit No";
pub const FILE_COLUMN: &str = "File";

/// Columns of the extraction table. `Therapist` is looked up but not reported.
pub const EXTRACTION_COLUMNS: [&str; 7] = [
    "Patient Name",
    "DOB",
    "Diagnosis/CC",
    "DOS",
    VISIT_NO_COLUMN,
    "Authorization No",
    FILE_COLUMN,
];

/// Display order of the merged treatment list.
pub const MERGED_COLUMNS: [&str; 7] = [
    PATIENT_NAME_COLUMN,
    AUTHORIZATION_COLUMN,
    DATE_OF_THERAPY_COLUMN,
    VISIT_NO_COLUMN,
    DIAGNOSIS_COLUMN,
    DATE_OF_BIRTH_COLUMN,
    FILE_COLUMN,
];

/// One row per record; names, diagnoses and authorization codes normalized.
pub fn extraction_table(records: &[ExtractedRecord]) -> Table {
    let rows = records
        .iter()
        .map(|r| {
            vec![
                normalize_spaces(Some(&r.patient_name)),
                r.dob.iso(),
                normalize_spaces(r.diagnosis.as_deref()),
                r.dos.iso(),
                r.visit_no.clone().unwrap_or_default(),
                normalize_spaces(r.authorization_no.as_deref()),
                r.source_file.display().to_string(),
            ]
        })
        .collect();

    Table {
        columns: EXTRACTION_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows,
    }
}

/// The treatment list in display order, with `Date of birth` as `Jan 2, 1980`
/// and `Date of Therapy` as `2025.06.24`.
pub fn merged_table(sheet: &Spreadsheet) -> Table {
    let cols = sheet.required;
    let rows = sheet
        .rows
        .iter()
        .map(|row| {
            let text = |col: usize| normalize_spaces(row.value(col).as_text().as_deref());
            vec![
                text(cols.patient_name),
                text(cols.authorization),
                sheet_date(row.value(cols.date_of_therapy))
                    .map(display_dos)
                    .unwrap_or_default(),
                row.visit_no.clone(),
                text(cols.diagnosis),
                sheet_date(row.value(cols.date_of_birth))
                    .map(display_dob)
                    .unwrap_or_default(),
                row.file.clone(),
            ]
        })
        .collect();

    Table {
        columns: MERGED_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DateField, RequiredColumns, SheetValue, SpreadsheetRow};
    use chrono::NaiveDate;
    use std::path::PathBuf;

    #[test]
    fn test_extraction_table_drops_therapist() {
        let record = ExtractedRecord {
            patient_name: "Jane\n Doe".into(),
            dob: DateField::Date(NaiveDate::from_ymd_opt(1980, 1, 2).unwrap()),
            diagnosis: None,
            therapist: Some("Kim".into()),
            dos: DateField::Unparseable("soon".into()),
            visit_no: Some("3 / 40".into()),
            authorization_no: None,
            source_file: PathBuf::from("/c/a.pdf"),
        };
        let t = extraction_table(&[record]);
        assert!(t.column("Therapist").is_none());
        assert_eq!(t.get(0, "Patient Name"), Some("Jane Doe"));
        assert_eq!(t.get(0, "DOB"), Some("1980-01-02"));
        assert_eq!(t.get(0, "DOS"), Some(""));
        assert_eq!(t.get(0, "Authorization No"), Some(""));
        assert_eq!(t.get(0, "File"), Some("/c/a.pdf"));
    }

    #[test]
    fn test_merged_table_order_and_dates() {
        let sheet = Spreadsheet {
            sheet_name: "Week".into(),
            header_row: 0,
            headers: vec![
                "Date of birth".into(),
                "Weekly pt. tx list".into(),
                "Therapist".into(),
                "Diagnosis".into(),
                "Authorization number".into(),
                "Date of Therapy".into(),
            ],
            required: RequiredColumns {
                patient_name: 1,
                date_of_birth: 0,
                diagnosis: 3,
                authorization: 4,
                date_of_therapy: 5,
            },
            rows: vec![SpreadsheetRow {
                sheet_row: 1,
                values: vec![
                    SheetValue::Date(NaiveDate::from_ymd_opt(1980, 1, 2).unwrap()),
                    SheetValue::Text("Jane Doe".into()),
                    SheetValue::Text("Kim".into()),
                    SheetValue::Text("Back pain".into()),
                    SheetValue::Text("AT-1".into()),
                    SheetValue::Text("6/24/2025".into()),
                ],
                visit_no: "3 / 40".into(),
                file: "/c/a.pdf".into(),
            }],
        };

        let t = merged_table(&sheet);
        assert_eq!(t.columns, MERGED_COLUMNS.to_vec());
        assert_eq!(
            t.rows[0],
            vec![
                "Jane Doe",
                "AT-1",
                "2025.06.24",
                "3 / 40",
                "Back pain",
                "Jan 2, 1980",
                "/c/a.pdf"
            ]
        );
    }
}
