mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "chartmatch",
    version,
    about = "Match clinic chart PDFs against the weekly patient treatment list"
)]
struct Cli {
    /// Log per-file and per-match detail
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract visit records from a single chart PDF
    Parse {
        /// Path to the chart PDF
        pdf_file: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write the records to a JSON file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Extract every chart PDF under the given folders and fill in the treatment list
    Match(commands::match_charts::MatchArgs),
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Parse {
            pdf_file,
            output,
            out,
        } => commands::parse::run(pdf_file, &output, out),
        Commands::Match(args) => commands::match_charts::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        let code = if e.is_cancelled() { 130 } else { 1 };
        std::process::exit(code);
    }
}
