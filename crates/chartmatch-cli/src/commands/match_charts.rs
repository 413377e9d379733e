use std::path::{Path, PathBuf};

use chartmatch_core::error::ChartMatchError;
use chartmatch_core::{
    load_config, run_matching, FileProgress, MatchConfig, RunObserver, RunStage, UnreadablePdf,
};
use clap::Args;

use crate::commands::{absolute, pdftotext_extractor};
use crate::output;

#[derive(Args)]
pub struct MatchArgs {
    /// Folder to scan recursively for chart PDFs (repeatable)
    #[arg(short = 'd', long = "pdf-dir", value_name = "DIR")]
    pdf_dirs: Vec<PathBuf>,

    /// Patient treatment list (.xlsx)
    #[arg(short, long, value_name = "FILE")]
    spreadsheet: Option<PathBuf>,

    /// Sheet holding this week's list, e.g. "Jun 30 _ Jul 5"
    #[arg(long)]
    sheet: Option<String>,

    /// Spreadsheet columns to read (default A:G)
    #[arg(long, value_name = "RANGE")]
    columns: Option<String>,

    /// JSON run configuration; flags override its fields
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Also require the authorization number to agree
    #[arg(long)]
    match_authorization: bool,

    /// Skip PDFs that cannot be opened instead of aborting
    #[arg(long)]
    skip_unreadable: bool,

    /// Write pdf_summary_<ts>.xlsx and pt_list_merge_<ts>.xlsx here
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Output format: table (default) or json
    #[arg(short, long, default_value = "table")]
    output: String,
}

pub fn run(args: MatchArgs) -> Result<(), ChartMatchError> {
    let config = build_config(&args)?;
    let extractor = pdftotext_extractor()?;
    let mut progress = ProgressPrinter;

    let outcome = run_matching(&config, &extractor, &mut progress)?;

    if let Some(dir) = &args.out_dir {
        let dir = absolute(dir.clone())?;
        std::fs::create_dir_all(&dir)?;
        let ts = chrono::Local::now().format("%Y%m%d%H%M%S");

        let summary_path = dir.join(format!("pdf_summary_{ts}.xlsx"));
        output::xlsx::write_table(&outcome.extraction, &summary_path, "PDF summary")?;
        let merged_path = dir.join(format!("pt_list_merge_{ts}.xlsx"));
        output::xlsx::write_table(&outcome.merged, &merged_path, "Merged")?;

        eprintln!("Wrote {}", summary_path.display());
        eprintln!("Wrote {}", merged_path.display());
    }

    match args.output.as_str() {
        "json" => output::json::print(&outcome)?,
        _ => output::table::print_summary(&outcome),
    }

    Ok(())
}

/// Start from `--config` when given, then apply individual flags on top.
fn build_config(args: &MatchArgs) -> Result<MatchConfig, ChartMatchError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => MatchConfig::new(Vec::new(), PathBuf::new(), String::new()),
    };

    if !args.pdf_dirs.is_empty() {
        config.pdf_roots = args
            .pdf_dirs
            .iter()
            .cloned()
            .map(absolute)
            .collect::<Result<_, _>>()?;
    }
    if let Some(spreadsheet) = &args.spreadsheet {
        config.spreadsheet = absolute(spreadsheet.clone())?;
    }
    if let Some(sheet) = &args.sheet {
        config.sheet_name = sheet.clone();
    }
    if let Some(columns) = &args.columns {
        config.columns = columns.clone();
    }
    if args.match_authorization {
        config.policy.include_authorization = true;
    }
    if args.skip_unreadable {
        config.unreadable_pdf = UnreadablePdf::Skip;
    }

    if config.spreadsheet.as_os_str().is_empty() {
        return Err(ChartMatchError::Config(
            "no spreadsheet given; pass --spreadsheet or --config".into(),
        ));
    }
    Ok(config)
}

/// Prints one line per processed PDF to stderr.
struct ProgressPrinter;

impl RunObserver for ProgressPrinter {
    fn on_stage(&mut self, stage: RunStage) {
        tracing::debug!(%stage, "stage");
    }

    fn on_file(&mut self, p: &FileProgress<'_>) {
        eprintln!(
            "{}/{} | {} | rows={}",
            p.completed,
            p.total,
            short_name(p.file),
            p.records
        );
    }
}

/// `parent/file.pdf`, or just the file name at a root.
fn short_name(path: &Path) -> String {
    let file = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    match path.parent().and_then(Path::file_name) {
        Some(parent) => format!("{}/{file}", parent.to_string_lossy()),
        None => file,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> MatchArgs {
        MatchArgs {
            pdf_dirs: vec![PathBuf::from("/charts")],
            spreadsheet: Some(PathBuf::from("/lists/pt.xlsx")),
            sheet: Some("Jun 30 _ Jul 5".into()),
            columns: None,
            config: None,
            match_authorization: false,
            skip_unreadable: true,
            out_dir: None,
            output: "table".into(),
        }
    }

    #[test]
    fn test_build_config_from_flags() {
        let config = build_config(&args()).unwrap();
        assert_eq!(config.pdf_roots, vec![PathBuf::from("/charts")]);
        assert_eq!(config.columns, "A:G");
        assert_eq!(config.unreadable_pdf, UnreadablePdf::Skip);
        assert!(!config.policy.include_authorization);
    }

    #[test]
    fn test_build_config_requires_spreadsheet() {
        let mut a = args();
        a.spreadsheet = None;
        assert!(matches!(build_config(&a), Err(ChartMatchError::Config(_))));
    }

    #[test]
    fn test_short_name() {
        assert_eq!(short_name(Path::new("/charts/June/a.pdf")), "June/a.pdf");
    }
}
