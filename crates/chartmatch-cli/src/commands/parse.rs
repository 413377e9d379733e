use chartmatch_core::error::ChartMatchError;
use chartmatch_core::tables::extraction_table;
use std::path::PathBuf;

use crate::commands::{absolute, pdftotext_extractor};
use crate::output;

pub fn run(
    pdf_file: PathBuf,
    output_format: &str,
    output_file: Option<PathBuf>,
) -> Result<(), ChartMatchError> {
    let pdf_file = absolute(pdf_file)?;
    if !pdf_file.is_file() {
        return Err(ChartMatchError::NotFound {
            kind: "PDF",
            path: pdf_file,
        });
    }

    let extractor = pdftotext_extractor()?;
    let records = chartmatch_core::parse_pdf(&pdf_file, &extractor)?;

    match output_file {
        Some(path) => {
            // Always write JSON when saving to file
            let json = serde_json::to_string_pretty(&records)?;
            std::fs::write(&path, json)?;
            eprintln!(
                "Extracted {} record(s), written to {}",
                records.len(),
                path.display()
            );
        }
        None => match output_format {
            "json" => output::json::print(&records)?,
            _ => print!("{}", output::table::format_table(&extraction_table(&records))),
        },
    }

    if records.is_empty() {
        eprintln!("  warning: no chart table with a patient name was found");
    }

    Ok(())
}
