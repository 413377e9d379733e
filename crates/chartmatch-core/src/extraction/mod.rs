pub mod pdftotext;
pub mod split;
pub mod table;
pub mod xlsx;

use std::ops::Range;
use std::path::Path;

use crate::error::ChartMatchError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl BBox {
    pub fn y_center(&self) -> f32 {
        (self.y_min + self.y_max) / 2.0
    }
}

/// A run of text on a page with its position.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub text: String,
    pub bbox: BBox,
}

/// A rectangular table region found on a page.
///
/// `header` holds the first row's text per column; `rows` hold the body.
/// Every row has `header.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    /// View the whole table as one logical label/value table.
    pub fn as_logical(&self) -> LogicalTable<'_> {
        LogicalTable {
            table: self,
            columns: 0..self.column_count(),
        }
    }
}

/// Tables found on one page, in reading order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageTables {
    pub page_number: usize,
    pub tables: Vec<RawTable>,
}

/// A label/value table carved out of a [`RawTable`] by a column range.
///
/// The first column of the range holds labels and the second holds values;
/// any further columns are ignored.
#[derive(Debug, Clone)]
pub struct LogicalTable<'a> {
    table: &'a RawTable,
    columns: Range<usize>,
}

impl<'a> LogicalTable<'a> {
    pub fn new(table: &'a RawTable, columns: Range<usize>) -> Self {
        LogicalTable { table, columns }
    }

    pub fn columns(&self) -> Range<usize> {
        self.columns.clone()
    }

    /// `(label, value)` pairs in row order. A missing value column yields "".
    pub fn entries(&self) -> impl Iterator<Item = (&'a str, &'a str)> + '_ {
        let label_col = self.columns.start;
        let value_col = label_col + 1;
        let has_value = value_col < self.columns.end;
        self.table.rows.iter().map(move |row| {
            let label = row.get(label_col).map(String::as_str).unwrap_or("");
            let value = if has_value {
                row.get(value_col).map(String::as_str).unwrap_or("")
            } else {
                ""
            };
            (label, value)
        })
    }
}

/// Trait for PDF table layout backends.
pub trait TableExtractor: Send + Sync {
    /// Find table regions on every page of the PDF at `pdf_path`.
    ///
    /// A document that cannot be opened is an error; a page without usable
    /// text simply has no tables.
    fn extract_tables(&self, pdf_path: &Path) -> Result<Vec<PageTables>, ChartMatchError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(rows: &[&[&str]]) -> RawTable {
        RawTable {
            header: vec![String::new(); rows[0].len()],
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_entries_use_first_two_columns_of_range() {
        let table = raw(&[&["Patient Name", "Jane", "Patient Name", "Bob"]]);
        let right = LogicalTable::new(&table, 2..4);
        let entries: Vec<_> = right.entries().collect();
        assert_eq!(entries, vec![("Patient Name", "Bob")]);
    }

    #[test]
    fn test_single_column_range_has_empty_values() {
        let table = raw(&[&["Patient Name", "Jane"]]);
        let narrow = LogicalTable::new(&table, 0..1);
        let entries: Vec<_> = narrow.entries().collect();
        assert_eq!(entries, vec![("Patient Name", "")]);
    }
}
