use std::fmt;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::{MatchConfig, UnreadablePdf};
use crate::error::ChartMatchError;
use crate::extraction::xlsx::load_spreadsheet;
use crate::extraction::TableExtractor;
use crate::matching::match_rows;
use crate::model::{ExtractedRecord, MatchOutcome};
use crate::parsing::parse_pdf;
use crate::tables::{extraction_table, merged_table};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Idle,
    Loading,
    Scanning,
    Extracting,
    Normalizing,
    Joining,
    Done,
    Cancelled,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStage::Idle => "idle",
            RunStage::Loading => "loading spreadsheet",
            RunStage::Scanning => "scanning for PDFs",
            RunStage::Extracting => "extracting",
            RunStage::Normalizing => "normalizing",
            RunStage::Joining => "joining",
            RunStage::Done => "done",
            RunStage::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Reported once after each PDF has been parsed.
#[derive(Debug, Clone, Copy)]
pub struct FileProgress<'a> {
    pub completed: usize,
    pub total: usize,
    pub file: &'a Path,
    /// Records produced by this file (0 for a skipped file).
    pub records: usize,
}

/// Hooks a caller passes into [`run_matching`].
///
/// All methods run synchronously on the calling thread and should return quickly.
pub trait RunObserver {
    fn on_stage(&mut self, _stage: RunStage) {}

    fn on_file(&mut self, _progress: &FileProgress<'_>) {}

    /// Polled before each file. Returning `true` ends the run with
    /// [`ChartMatchError::Cancelled`].
    fn should_stop(&self) -> bool {
        false
    }
}

/// Observer that ignores everything and never stops.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Adapts a progress closure and a cancellation predicate into a [`RunObserver`].
pub struct Callbacks<P, C> {
    progress: P,
    cancel: C,
}

impl<P, C> Callbacks<P, C>
where
    P: FnMut(&FileProgress<'_>),
    C: Fn() -> bool,
{
    pub fn new(progress: P, cancel: C) -> Self {
        Callbacks { progress, cancel }
    }
}

impl<P, C> RunObserver for Callbacks<P, C>
where
    P: FnMut(&FileProgress<'_>),
    C: Fn() -> bool,
{
    fn on_file(&mut self, progress: &FileProgress<'_>) {
        (self.progress)(progress)
    }

    fn should_stop(&self) -> bool {
        (self.cancel)()
    }
}

/// Every file with a `.pdf` extension (any case) below the given roots.
///
/// Roots are walked in order and their results concatenated; entries within a
/// directory are visited by file name. Unreadable directory entries are logged
/// and skipped.
pub fn discover_pdfs(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for root in roots {
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(root = %root.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_file() && is_pdf(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }
    files
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Run one full matching pass: load the treatment list, extract every chart
/// PDF under the configured roots, and fill in unique matches.
///
/// Any fatal condition, cancellation included, aborts the run without a
/// partial result.
pub fn run_matching(
    config: &MatchConfig,
    extractor: &dyn TableExtractor,
    observer: &mut dyn RunObserver,
) -> Result<MatchOutcome, ChartMatchError> {
    observer.on_stage(RunStage::Idle);
    let columns = config.validate()?;

    observer.on_stage(RunStage::Loading);
    let mut sheet = load_spreadsheet(&config.spreadsheet, &config.sheet_name, &columns)?;
    tracing::info!(
        sheet = %sheet.sheet_name,
        header_row = sheet.header_row,
        rows = sheet.rows.len(),
        "loaded treatment list"
    );

    observer.on_stage(RunStage::Scanning);
    let files = discover_pdfs(&config.pdf_roots);
    tracing::info!(files = files.len(), backend = extractor.backend_name(), "found chart PDFs");

    observer.on_stage(RunStage::Extracting);
    let records = extract_all(&files, extractor, config.unreadable_pdf, observer)?;

    observer.on_stage(RunStage::Normalizing);
    let extraction = extraction_table(&records);

    observer.on_stage(RunStage::Joining);
    let matched = match_rows(&mut sheet, &records, config.policy);
    let merged = merged_table(&sheet);
    tracing::info!(
        records = records.len(),
        rows = sheet.rows.len(),
        matched,
        "matching finished"
    );

    observer.on_stage(RunStage::Done);
    Ok(MatchOutcome {
        extraction,
        merged,
        matched,
        files_processed: files.len(),
    })
}

fn extract_all(
    files: &[PathBuf],
    extractor: &dyn TableExtractor,
    on_unreadable: UnreadablePdf,
    observer: &mut dyn RunObserver,
) -> Result<Vec<ExtractedRecord>, ChartMatchError> {
    let total = files.len();
    let mut records = Vec::new();

    for (i, file) in files.iter().enumerate() {
        if observer.should_stop() {
            tracing::info!(completed = i, total, "run cancelled");
            observer.on_stage(RunStage::Cancelled);
            return Err(ChartMatchError::Cancelled);
        }

        let found = match parse_pdf(file, extractor) {
            Ok(found) => found,
            Err(e) if on_unreadable == UnreadablePdf::Skip && !e.is_cancelled() => {
                tracing::warn!(file = %file.display(), error = %e, "skipping unreadable PDF");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        observer.on_file(&FileProgress {
            completed: i + 1,
            total,
            file,
            records: found.len(),
        });
        records.extend(found);
    }

    Ok(records)
}
