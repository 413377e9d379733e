use chrono::{Days, NaiveDate, NaiveDateTime};

use crate::model::DateField;

/// Collapse every whitespace run to one ASCII space and trim the ends.
///
/// Missing values become the empty string so that two missing values compare
/// equal in the join.
pub fn normalize_spaces(text: Option<&str>) -> String {
    match text {
        Some(s) => s.split_whitespace().collect::<Vec<_>>().join(" "),
        None => String::new(),
    }
}

/// Trim a table cell and drop embedded line breaks.
pub fn clean_cell(cell: &str) -> String {
    cell.trim().replace(['\r', '\n'], "")
}

/// Date of birth as printed on a chart: `April 5, 1973` or `Apr 5, 1973`.
pub fn parse_dob(text: &str) -> Option<NaiveDate> {
    ["%B %d, %Y", "%b %d, %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text.trim(), fmt).ok())
}

/// Date of service as printed on a chart: `6/24/2025`.
pub fn parse_dos(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%m/%d/%Y").ok()
}

/// `April 5, 1973` -> `1973-04-05`; anything else -> empty.
pub fn convert_dob(text: &str) -> String {
    dob_field(text).iso()
}

/// `6/24/2025` -> `2025-06-24`; anything else -> empty.
pub fn convert_dos(text: &str) -> String {
    dos_field(text).iso()
}

pub(crate) fn dob_field(text: &str) -> DateField {
    date_field(text, parse_dob)
}

pub(crate) fn dos_field(text: &str) -> DateField {
    date_field(text, parse_dos)
}

fn date_field(text: &str, parse: fn(&str) -> Option<NaiveDate>) -> DateField {
    match parse(text) {
        Some(d) => DateField::Date(d),
        None => DateField::Unparseable(text.to_string()),
    }
}

/// Dates typed into the treatment list as text.
const SHEET_DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%Y.%m.%d",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%b %d, %Y",
];

const SHEET_DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M"];

/// Lenient parse of a spreadsheet date typed as text.
pub fn parse_sheet_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    SHEET_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            SHEET_DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Convert an Excel serial day number (1900 date system) to a date.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    // Day 0 is 1899-12-30 once the fictitious 1900-02-29 is accounted for.
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.floor() as u64))
}

/// `Jan 2, 1980` (no leading zero on the day).
pub fn display_dob(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// `2025.06.24`.
pub fn display_dos(date: NaiveDate) -> String {
    date.format("%Y.%m.%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_convert_dob_long_month() {
        assert_eq!(convert_dob("April 5, 1973"), "1973-04-05");
        assert_eq!(convert_dob("January 02, 1980"), "1980-01-02");
    }

    #[test]
    fn test_convert_dob_short_month() {
        assert_eq!(convert_dob("Apr 5, 1973"), "1973-04-05");
        assert_eq!(convert_dob("Dec 31, 1999"), "1999-12-31");
    }

    #[test]
    fn test_convert_dob_rejects_other_grammars() {
        assert_eq!(convert_dob("4/5/1973"), "");
        assert_eq!(convert_dob("1973-04-05"), "");
        assert_eq!(convert_dob(""), "");
        assert_eq!(convert_dob("Smarch 5, 1973"), "");
    }

    #[test]
    fn test_convert_dos() {
        assert_eq!(convert_dos("6/24/2025"), "2025-06-24");
        assert_eq!(convert_dos("12/01/2025"), "2025-12-01");
        assert_eq!(convert_dos("June 24, 2025"), "");
        assert_eq!(convert_dos("13/40/2025"), "");
    }

    #[test]
    fn test_unparseable_kept_apart_from_missing() {
        assert_eq!(
            dob_field("not a date"),
            DateField::Unparseable("not a date".into())
        );
        assert_eq!(dos_field("6/24/2025"), DateField::Date(ymd(2025, 6, 24)));
    }

    #[test]
    fn test_normalize_spaces_collapses_runs() {
        assert_eq!(normalize_spaces(Some("  Jane \t\n  Doe ")), "Jane Doe");
        assert_eq!(normalize_spaces(None), "");
    }

    #[test]
    fn test_normalize_spaces_idempotent() {
        let once = normalize_spaces(Some("Low  back\npain "));
        assert_eq!(normalize_spaces(Some(&once)), once);
        assert_eq!(
            normalize_spaces(Some("Low\tback pain")),
            normalize_spaces(Some("Low back     pain"))
        );
    }

    #[test]
    fn test_clean_cell_strips_newlines() {
        assert_eq!(clean_cell("  Patient\nName "), "PatientName");
    }

    #[test]
    fn test_parse_sheet_date_variants() {
        assert_eq!(parse_sheet_date("6/24/2025"), Some(ymd(2025, 6, 24)));
        assert_eq!(parse_sheet_date("2025-06-24"), Some(ymd(2025, 6, 24)));
        assert_eq!(parse_sheet_date("2025-06-24 00:00:00"), Some(ymd(2025, 6, 24)));
        assert_eq!(parse_sheet_date("2025.06.24"), Some(ymd(2025, 6, 24)));
        assert_eq!(parse_sheet_date("Jan 2, 1980"), Some(ymd(1980, 1, 2)));
        assert_eq!(parse_sheet_date("soon"), None);
    }

    #[test]
    fn test_excel_serial() {
        assert_eq!(excel_serial_to_date(45832.0), Some(ymd(2025, 6, 24)));
        assert_eq!(excel_serial_to_date(29222.5), Some(ymd(1980, 1, 2)));
        assert_eq!(excel_serial_to_date(-1.0), None);
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(display_dob(ymd(1980, 1, 2)), "Jan 2, 1980");
        assert_eq!(display_dob(ymd(1973, 11, 25)), "Nov 25, 1973");
        assert_eq!(display_dos(ymd(2025, 6, 24)), "2025.06.24");
    }
}
