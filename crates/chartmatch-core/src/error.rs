use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ChartMatchError {
    #[error("{kind} path must be absolute: {}", path.display())]
    RelativePath { kind: &'static str, path: PathBuf },

    #[error("{kind} not found: {}", path.display())]
    NotFound { kind: &'static str, path: PathBuf },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to load configuration from {}: {reason}", path.display())]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("PDF extraction failed: {0}")]
    Extraction(String),

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed on {} with exit code {code}: {stderr}", path.display())]
    PdftotextFailed {
        path: PathBuf,
        code: i32,
        stderr: String,
    },

    #[error("failed to open spreadsheet {}: {reason}", path.display())]
    SpreadsheetOpen { path: PathBuf, reason: String },

    #[error("sheet '{sheet}' not found (available: {})", available.join(", "))]
    SheetNotFound {
        sheet: String,
        available: Vec<String>,
    },

    #[error("no header row containing all of [{}] found in sheet '{sheet}'", required.join(", "))]
    HeaderRowNotFound {
        sheet: String,
        required: Vec<String>,
    },

    #[error("run stopped by user")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChartMatchError {
    /// True when the run ended because the caller asked it to stop.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ChartMatchError::Cancelled)
    }
}
