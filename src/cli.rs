use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::kneedle::{DEFAULT_POLYNOMIAL_DEGREE, DEFAULT_SENSITIVITY};
use crate::report::{DEFAULT_DETAIL_N, DEFAULT_TOP_N};

pub const DEFAULT_SOURCE_PATTERN: &str = r"^classification_results_(.+)\.json$";

#[derive(Parser, Debug)]
#[command(
    name = "llm-consensus",
    version,
    about = "Inter-rater agreement and threshold tooling for LLM relevance scores"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Consolidate rater result files and report agreement statistics.
    Analyze(AnalyzeArgs),
    /// Propose knee/elbow cut-offs for the score columns of an analysis report.
    Threshold(ThresholdArgs),
    /// Keyword-weighted relevance scoring of normalized table metadata.
    Relevance(RelevanceArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Rater result files, given as `path` or `name=path`.
    pub sources: Vec<String>,

    #[arg(long, default_value = "LLMS_results")]
    pub results_dir: PathBuf,

    #[arg(long, default_value = DEFAULT_SOURCE_PATTERN)]
    pub pattern: String,

    #[arg(long, default_value = "agreement_continuous_report.json")]
    pub json_output: PathBuf,

    #[arg(long, default_value = "agreement_continuous_report.md")]
    pub markdown_output: PathBuf,

    #[arg(long, default_value = "agreement_charts")]
    pub chart_dir: PathBuf,

    #[arg(long, default_value_t = false)]
    pub no_charts: bool,

    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    pub top_n: usize,

    #[arg(long, default_value_t = DEFAULT_DETAIL_N)]
    pub detail_n: usize,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum SmoothingMode {
    None,
    Polynomial,
}

#[derive(Args, Debug, Clone)]
pub struct ThresholdArgs {
    /// JSON report written by `analyze`.
    pub report: PathBuf,

    #[arg(long = "column")]
    pub columns: Vec<String>,

    #[arg(long, default_value_t = DEFAULT_SENSITIVITY)]
    pub sensitivity: f64,

    #[arg(long, value_enum, default_value_t = SmoothingMode::None)]
    pub smoothing: SmoothingMode,

    #[arg(long, default_value_t = DEFAULT_POLYNOMIAL_DEGREE)]
    pub degree: usize,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RelevanceArgs {
    #[arg(long)]
    pub metadata: PathBuf,

    #[arg(long)]
    pub term_map: PathBuf,

    #[arg(long, default_value = "srs_results.json")]
    pub output: PathBuf,
}
