use std::sync::LazyLock;

use regex::Regex;

use crate::extraction::{LogicalTable, RawTable};

/// Banner printed at the top of every chart. Tolerates a missing period,
/// odd spacing and backtick/curly apostrophes.
static CLINIC_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Dr\.?\s*Joung[`'’]?s\s*Clinic\s*&\s*Physical\s*Therapy\s*Center")
        .expect("valid regex")
});

pub fn is_clinic_header(text: &str) -> bool {
    CLINIC_HEADER.is_match(text)
}

/// Split a table that holds several charts side by side.
///
/// Each column whose header carries the clinic banner starts a chart; a chart
/// spans up to the next banner column, the last one to the table's end.
/// Fewer than two banners means the table is a single chart.
pub fn split_logical_tables(table: &RawTable) -> Vec<LogicalTable<'_>> {
    let starts: Vec<usize> = table
        .header
        .iter()
        .enumerate()
        .filter(|(_, text)| is_clinic_header(text))
        .map(|(i, _)| i)
        .collect();

    if starts.len() < 2 {
        return vec![table.as_logical()];
    }

    let ends = starts
        .iter()
        .skip(1)
        .copied()
        .chain(std::iter::once(table.column_count()));
    starts
        .iter()
        .zip(ends)
        .map(|(&start, end)| LogicalTable::new(table, start..end))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANNER: &str = "Dr. Joung's Clinic & Physical Therapy Center";

    fn table(header: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            header: header.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_banner_variants() {
        assert!(is_clinic_header(BANNER));
        assert!(is_clinic_header("Dr Joung’s Clinic & Physical Therapy Center"));
        assert!(is_clinic_header("DR. JOUNG`S CLINIC&PHYSICAL THERAPY CENTER"));
        assert!(is_clinic_header("Dr.Joungs Clinic & Physical Therapy Center"));
        assert!(!is_clinic_header("Physical Therapy Center"));
    }

    #[test]
    fn test_two_banners_split_into_two_tables() {
        let t = table(
            &[BANNER, "", BANNER, ""],
            &[&["Patient Name", "Jane Doe", "Patient Name", "John Roe"]],
        );
        let parts = split_logical_tables(&t);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].columns(), 0..2);
        assert_eq!(parts[1].columns(), 2..4);
        assert_eq!(
            parts[1].entries().next(),
            Some(("Patient Name", "John Roe"))
        );
    }

    #[test]
    fn test_three_banners_last_spans_to_end() {
        let t = table(&[BANNER, "", BANNER, "", BANNER, "", "extra"], &[]);
        let parts = split_logical_tables(&t);
        let ranges: Vec<_> = parts.iter().map(|p| p.columns()).collect();
        assert_eq!(ranges, vec![0..2, 2..4, 4..7]);
    }

    #[test]
    fn test_single_banner_is_one_table() {
        let t = table(&[BANNER, ""], &[&["Patient Name", "Jane Doe"]]);
        let parts = split_logical_tables(&t);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].columns(), 0..2);
    }

    #[test]
    fn test_no_banner_is_one_table() {
        let t = table(&["Patient Name", "Jane Doe", "x"], &[]);
        assert_eq!(split_logical_tables(&t).len(), 1);
    }
}
