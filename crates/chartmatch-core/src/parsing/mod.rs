pub mod fields;
pub mod normalize;

use std::path::Path;

use crate::error::ChartMatchError;
use crate::extraction::split::split_logical_tables;
use crate::extraction::{LogicalTable, PageTables, TableExtractor};
use crate::model::ExtractedRecord;
use fields::{RecordDraft, TARGET_FIELDS};
use normalize::clean_cell;

/// Extract one visit record from a label/value table.
///
/// Returns `None` when no non-empty patient name is present; such tables are
/// fragments rather than chart tables.
pub fn extract_record(table: &LogicalTable<'_>, source: &Path) -> Option<ExtractedRecord> {
    let entries: Vec<(String, String)> = table
        .entries()
        .map(|(label, value)| (clean_cell(label), clean_cell(value)))
        .collect();

    let mut draft = RecordDraft::default();
    for rule in TARGET_FIELDS.iter() {
        if let Some((_, value)) = entries.iter().find(|(label, _)| rule.pattern.is_match(label)) {
            tracing::trace!(field = rule.field.label(), value = %value, "matched chart label");
            (rule.apply)(value, &mut draft);
        }
    }

    let patient_name = draft.patient_name.filter(|n| !n.is_empty())?;
    Some(ExtractedRecord {
        patient_name,
        dob: draft.dob,
        diagnosis: draft.diagnosis,
        therapist: draft.therapist,
        dos: draft.dos,
        visit_no: draft.visit_no,
        authorization_no: draft.authorization_no,
        source_file: source.to_path_buf(),
    })
}

/// Turn every logical table on every page into records, in page order.
pub fn parse_tables(pages: &[PageTables], source: &Path) -> Vec<ExtractedRecord> {
    pages
        .iter()
        .flat_map(|page| page.tables.iter())
        .flat_map(split_logical_tables)
        .filter_map(|table| extract_record(&table, source))
        .collect()
}

/// Extract all visit records from one PDF.
///
/// Failing to open the document is an error; pages without tables are not.
pub fn parse_pdf(
    pdf_path: &Path,
    extractor: &dyn TableExtractor,
) -> Result<Vec<ExtractedRecord>, ChartMatchError> {
    let pages = extractor.extract_tables(pdf_path)?;
    let records = parse_tables(&pages, pdf_path);
    tracing::debug!(
        file = %pdf_path.display(),
        backend = extractor.backend_name(),
        pages = pages.len(),
        records = records.len(),
        "parsed chart"
    );
    Ok(records)
}
