pub mod config;
pub mod error;
pub mod extraction;
pub mod matching;
pub mod model;
pub mod parsing;
pub mod pipeline;
pub mod tables;

pub use config::{load_config, ColumnRange, MatchConfig, MatchPolicy, UnreadablePdf};
pub use error::ChartMatchError;
pub use model::{ExtractedRecord, MatchOutcome, Table};
pub use parsing::parse_pdf;
pub use pipeline::{run_matching, Callbacks, FileProgress, NoopObserver, RunObserver, RunStage};
