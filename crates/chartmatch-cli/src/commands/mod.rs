pub mod match_charts;
pub mod parse;

use chartmatch_core::error::ChartMatchError;
use chartmatch_core::extraction::pdftotext::PdftotextExtractor;
use std::path::PathBuf;

/// Resolve a command-line path against the working directory.
pub fn absolute(path: PathBuf) -> Result<PathBuf, ChartMatchError> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// The pdftotext backend, or an install hint when poppler is missing.
pub fn pdftotext_extractor() -> Result<PdftotextExtractor, ChartMatchError> {
    if PdftotextExtractor::is_available() {
        Ok(PdftotextExtractor::new())
    } else {
        Err(ChartMatchError::PdftotextNotFound)
    }
}
