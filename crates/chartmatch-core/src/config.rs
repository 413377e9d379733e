use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChartMatchError;

pub const DEFAULT_COLUMNS: &str = "A:G";

/// Everything one matching run needs. Passed explicitly into
/// [`crate::run_matching`]; the core never reads ambient state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Directories scanned recursively for `.pdf` files, in order.
    pub pdf_roots: Vec<PathBuf>,
    /// The authoritative patient treatment list.
    pub spreadsheet: PathBuf,
    pub sheet_name: String,
    /// Column selector such as `A:G`.
    #[serde(default = "default_columns")]
    pub columns: String,
    #[serde(default)]
    pub policy: MatchPolicy,
    #[serde(default)]
    pub unreadable_pdf: UnreadablePdf,
}

fn default_columns() -> String {
    DEFAULT_COLUMNS.to_string()
}

/// Which fields take part in the join between chart records and sheet rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPolicy {
    /// Also require the authorization number to agree. Off by default.
    #[serde(default)]
    pub include_authorization: bool,
}

/// What to do when a PDF cannot be opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnreadablePdf {
    /// Abort the whole run.
    #[default]
    Abort,
    /// Log a warning and continue with the next file.
    Skip,
}

impl MatchConfig {
    pub fn new(pdf_roots: Vec<PathBuf>, spreadsheet: PathBuf, sheet_name: impl Into<String>) -> Self {
        MatchConfig {
            pdf_roots,
            spreadsheet,
            sheet_name: sheet_name.into(),
            columns: default_columns(),
            policy: MatchPolicy::default(),
            unreadable_pdf: UnreadablePdf::default(),
        }
    }

    /// Check paths and the column selector before any work starts.
    pub fn validate(&self) -> Result<ColumnRange, ChartMatchError> {
        if self.pdf_roots.is_empty() {
            return Err(ChartMatchError::Config(
                "at least one PDF folder is required".into(),
            ));
        }
        for root in &self.pdf_roots {
            ensure_absolute(root, "PDF folder")?;
            if !root.is_dir() {
                return Err(ChartMatchError::NotFound {
                    kind: "PDF folder",
                    path: root.clone(),
                });
            }
        }

        ensure_absolute(&self.spreadsheet, "spreadsheet")?;
        if !self.spreadsheet.is_file() {
            return Err(ChartMatchError::NotFound {
                kind: "spreadsheet",
                path: self.spreadsheet.clone(),
            });
        }

        if self.sheet_name.trim().is_empty() {
            return Err(ChartMatchError::Config("sheet name must not be empty".into()));
        }

        self.columns.parse()
    }
}

fn ensure_absolute(path: &Path, kind: &'static str) -> Result<(), ChartMatchError> {
    if path.is_absolute() {
        Ok(())
    } else {
        Err(ChartMatchError::RelativePath {
            kind,
            path: path.to_path_buf(),
        })
    }
}

/// Load a run configuration from a JSON file.
pub fn load_config(path: &Path) -> Result<MatchConfig, ChartMatchError> {
    let content = std::fs::read_to_string(path).map_err(|e| ChartMatchError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| ChartMatchError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// A set of spreadsheet columns selected by letter, e.g. `A:G` or `A:C,E`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRange {
    /// Inclusive, zero-based column spans.
    spans: Vec<(u32, u32)>,
}

impl ColumnRange {
    pub fn contains(&self, column: u32) -> bool {
        self.spans
            .iter()
            .any(|&(first, last)| first <= column && column <= last)
    }
}

impl FromStr for ColumnRange {
    type Err = ChartMatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut spans = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let span = match part.split_once(':') {
                Some((first, last)) => (column_index(first)?, column_index(last)?),
                None => {
                    let col = column_index(part)?;
                    (col, col)
                }
            };
            if span.0 > span.1 {
                return Err(ChartMatchError::Config(format!(
                    "column range '{part}' is reversed"
                )));
            }
            spans.push(span);
        }

        if spans.is_empty() {
            return Err(ChartMatchError::Config(format!(
                "column range '{s}' selects no columns"
            )));
        }
        Ok(ColumnRange { spans })
    }
}

impl fmt::Display for ColumnRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .spans
            .iter()
            .map(|&(first, last)| {
                if first == last {
                    column_letters(first)
                } else {
                    format!("{}:{}", column_letters(first), column_letters(last))
                }
            })
            .collect();
        write!(f, "{}", parts.join(","))
    }
}

/// `A` -> 0, `Z` -> 25, `AA` -> 26.
fn column_index(letters: &str) -> Result<u32, ChartMatchError> {
    let letters = letters.trim();
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ChartMatchError::Config(format!(
            "invalid column letter '{letters}'"
        )));
    }
    let mut index: u32 = 0;
    for c in letters.chars() {
        let digit = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        index = index
            .checked_mul(26)
            .and_then(|i| i.checked_add(digit))
            .ok_or_else(|| ChartMatchError::Config(format!("column '{letters}' is out of range")))?;
    }
    Ok(index - 1)
}

fn column_letters(mut index: u32) -> String {
    let mut out = Vec::new();
    loop {
        out.push((b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    out.iter().rev().collect()
}
