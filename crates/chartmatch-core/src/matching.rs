use std::collections::HashMap;

use chrono::NaiveDate;

use crate::config::MatchPolicy;
use crate::model::{ExtractedRecord, SheetValue, Spreadsheet, SpreadsheetRow};
use crate::parsing::normalize::{excel_serial_to_date, normalize_spaces, parse_sheet_date};

/// Normalized fields compared between a chart record and a sheet row.
///
/// Missing values are empty strings, so absence matches absence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JoinKey {
    pub patient_name: String,
    pub dob: String,
    pub diagnosis: String,
    pub dos: String,
    /// Only populated when the policy includes the authorization number.
    pub authorization: Option<String>,
}

impl JoinKey {
    pub fn from_record(record: &ExtractedRecord, policy: MatchPolicy) -> Self {
        JoinKey {
            patient_name: normalize_spaces(Some(&record.patient_name)),
            dob: record.dob.iso(),
            diagnosis: normalize_spaces(record.diagnosis.as_deref()),
            dos: record.dos.iso(),
            authorization: policy
                .include_authorization
                .then(|| normalize_spaces(record.authorization_no.as_deref())),
        }
    }

    pub fn from_row(sheet: &Spreadsheet, row: &SpreadsheetRow, policy: MatchPolicy) -> Self {
        let cols = sheet.required;
        let text = |col: usize| normalize_spaces(row.value(col).as_text().as_deref());
        let date = |col: usize| {
            sheet_date(row.value(col))
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default()
        };
        JoinKey {
            patient_name: text(cols.patient_name),
            dob: date(cols.date_of_birth),
            diagnosis: text(cols.diagnosis),
            dos: date(cols.date_of_therapy),
            authorization: policy
                .include_authorization
                .then(|| text(cols.authorization)),
        }
    }
}

/// Interpret a sheet cell as a calendar date.
pub fn sheet_date(value: &SheetValue) -> Option<NaiveDate> {
    match value {
        SheetValue::Date(d) => Some(*d),
        SheetValue::Number(n) => excel_serial_to_date(*n),
        SheetValue::Text(s) => {
            let parsed = parse_sheet_date(s);
            if parsed.is_none() {
                tracing::warn!(value = %s, "spreadsheet date could not be parsed");
            }
            parsed
        }
        SheetValue::Empty | SheetValue::Bool(_) => None,
    }
}

/// Outcome of looking up one sheet row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchResult<'a> {
    Unique(&'a ExtractedRecord),
    NoMatch,
    Ambiguous(usize),
}

/// Chart records indexed by join key.
pub struct RecordIndex<'a> {
    records: &'a [ExtractedRecord],
    by_key: HashMap<JoinKey, Vec<usize>>,
}

impl<'a> RecordIndex<'a> {
    pub fn new(records: &'a [ExtractedRecord], policy: MatchPolicy) -> Self {
        let mut by_key: HashMap<JoinKey, Vec<usize>> = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            by_key
                .entry(JoinKey::from_record(record, policy))
                .or_default()
                .push(i);
        }
        RecordIndex { records, by_key }
    }

    pub fn lookup(&self, key: &JoinKey) -> MatchResult<'a> {
        match self.by_key.get(key).map(Vec::as_slice) {
            None | Some([]) => MatchResult::NoMatch,
            Some([only]) => MatchResult::Unique(&self.records[*only]),
            Some(many) => MatchResult::Ambiguous(many.len()),
        }
    }
}

/// Fill `Visit No` and `File` on every sheet row with exactly one matching
/// record. Returns how many rows were filled.
pub fn match_rows(
    sheet: &mut Spreadsheet,
    records: &[ExtractedRecord],
    policy: MatchPolicy,
) -> usize {
    let index = RecordIndex::new(records, policy);
    let mut matched = 0;

    let keys: Vec<JoinKey> = {
        let view: &Spreadsheet = sheet;
        view.rows
            .iter()
            .map(|row| JoinKey::from_row(view, row, policy))
            .collect()
    };

    for (row, key) in sheet.rows.iter_mut().zip(keys) {
        match index.lookup(&key) {
            MatchResult::Unique(record) => {
                row.visit_no = record.visit_no.clone().unwrap_or_default();
                row.file = record.source_file.display().to_string();
                matched += 1;
            }
            MatchResult::Ambiguous(count) => {
                tracing::debug!(
                    sheet_row = row.sheet_row,
                    candidates = count,
                    patient = %key.patient_name,
                    "ambiguous match left unfilled"
                );
            }
            MatchResult::NoMatch => {}
        }
    }

    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DateField, RequiredColumns};
    use std::path::PathBuf;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(name: &str, file: &str, visit: &str) -> ExtractedRecord {
        ExtractedRecord {
            patient_name: name.to_string(),
            dob: DateField::Date(ymd(1980, 1, 2)),
            diagnosis: Some("Back  pain".into()),
            therapist: None,
            dos: DateField::Date(ymd(2025, 6, 24)),
            visit_no: Some(visit.to_string()),
            authorization_no: Some("AT-1".into()),
            source_file: PathBuf::from(file),
        }
    }

    fn sheet(names: &[&str]) -> Spreadsheet {
        Spreadsheet {
            sheet_name: "Week".into(),
            header_row: 0,
            headers: vec![
                "Weekly pt. tx list".into(),
                "Date of birth".into(),
                "Diagnosis".into(),
                "Authorization number".into(),
                "Date of Therapy".into(),
            ],
            required: RequiredColumns {
                patient_name: 0,
                date_of_birth: 1,
                diagnosis: 2,
                authorization: 3,
                date_of_therapy: 4,
            },
            rows: names
                .iter()
                .enumerate()
                .map(|(i, name)| SpreadsheetRow {
                    sheet_row: i + 1,
                    values: vec![
                        SheetValue::Text(name.to_string()),
                        SheetValue::Text("1/2/1980".into()),
                        SheetValue::Text("Back pain ".into()),
                        SheetValue::Text("AT-2".into()),
                        SheetValue::Date(ymd(2025, 6, 24)),
                    ],
                    visit_no: String::new(),
                    file: String::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_unique_match_fills_row() {
        let mut s = sheet(&["Jane  Doe"]);
        let records = vec![record("Jane Doe", "/c/jane.pdf", "3 / 40")];
        let matched = match_rows(&mut s, &records, MatchPolicy::default());
        assert_eq!(matched, 1);
        assert_eq!(s.rows[0].visit_no, "3 / 40");
        assert_eq!(s.rows[0].file, "/c/jane.pdf");
    }

    #[test]
    fn test_ambiguous_match_left_empty() {
        let mut s = sheet(&["Jane Doe"]);
        let records = vec![
            record("Jane Doe", "/c/a.pdf", "1"),
            record("Jane Doe", "/c/b.pdf", "2"),
        ];
        assert_eq!(match_rows(&mut s, &records, MatchPolicy::default()), 0);
        assert!(s.rows[0].visit_no.is_empty());
        assert!(s.rows[0].file.is_empty());
    }

    #[test]
    fn test_no_match_left_empty() {
        let mut s = sheet(&["John Roe", "Jane Doe"]);
        let records = vec![record("Jane Doe", "/c/a.pdf", "1")];
        assert_eq!(match_rows(&mut s, &records, MatchPolicy::default()), 1);
        assert!(s.rows[0].file.is_empty());
        assert_eq!(s.rows[1].file, "/c/a.pdf");
    }

    #[test]
    fn test_authorization_policy() {
        let records = vec![record("Jane Doe", "/c/a.pdf", "1")];

        let mut s = sheet(&["Jane Doe"]);
        let strict = MatchPolicy {
            include_authorization: true,
        };
        // Sheet says AT-2, chart says AT-1.
        assert_eq!(match_rows(&mut s, &records, strict), 0);

        let mut s = sheet(&["Jane Doe"]);
        assert_eq!(match_rows(&mut s, &records, MatchPolicy::default()), 1);
    }

    #[test]
    fn test_missing_values_match_each_other() {
        let mut r = record("Jane Doe", "/c/a.pdf", "1");
        r.diagnosis = None;
        let mut s = sheet(&["Jane Doe"]);
        s.rows[0].values[2] = SheetValue::Empty;
        assert_eq!(match_rows(&mut s, &[r], MatchPolicy::default()), 1);
    }

    #[test]
    fn test_missing_visit_no_still_counts() {
        let mut r = record("Jane Doe", "/c/a.pdf", "1");
        r.visit_no = None;
        let mut s = sheet(&["Jane Doe"]);
        assert_eq!(match_rows(&mut s, &[r], MatchPolicy::default()), 1);
        assert_eq!(s.rows[0].visit_no, "");
        assert_eq!(s.rows[0].file, "/c/a.pdf");
    }

    #[test]
    fn test_sheet_date_sources() {
        assert_eq!(sheet_date(&SheetValue::Number(45832.0)), Some(ymd(2025, 6, 24)));
        assert_eq!(
            sheet_date(&SheetValue::Text("6/24/2025".into())),
            Some(ymd(2025, 6, 24))
        );
        assert_eq!(sheet_date(&SheetValue::Empty), None);
    }
}
