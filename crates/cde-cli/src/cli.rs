//! CLI argument definitions for the CDE mapper.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use cde_model::{DEFAULT_TOP_K, SimilarityMethod};

#[derive(Parser)]
#[command(
    name = "cde-mapper",
    version,
    about = "Map dataset columns to Common Data Elements",
    long_about = "Propose CDE codes for the columns of a CSV dataset, check an edited\n\
                  mapping table against the CDE schema, and apply it to produce a\n\
                  harmonized dataset."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Match dataset columns to CDE codes and write an initial mapping table.
    Match(MatchArgs),

    /// Check a mapping table against a CDE schema.
    Check(CheckArgs),

    /// Apply a mapping table to a dataset.
    Apply(ApplyArgs),

    /// List the CDEs of a schema.
    Codes(CodesArgs),
}

#[derive(Parser)]
pub struct MatchArgs {
    /// Source dataset (CSV with one header row).
    #[arg(long, value_name = "CSV")]
    pub dataset: PathBuf,

    /// CDE schema (CSV or JSON with code, type and values).
    #[arg(long, value_name = "FILE")]
    pub schema: PathBuf,

    /// Similarity method (lexical, char-embedding, learned-embedding).
    #[arg(long, default_value = "lexical", value_parser = parse_method)]
    pub method: SimilarityMethod,

    /// Number of candidate codes kept per column.
    #[arg(long = "top-k", default_value_t = DEFAULT_TOP_K, value_parser = parse_top_k)]
    pub top_k: usize,

    /// Character embedding table in GloVe text format.
    #[arg(long, value_name = "FILE", env = "CDE_MAPPER_EMBEDDINGS")]
    pub embeddings: Option<PathBuf>,

    /// Never map two source values onto the same target value.
    #[arg(long)]
    pub deduplicate: bool,

    /// Where to write the mapping table (.json, or .ndjson/.jsonl).
    #[arg(long, short, value_name = "FILE")]
    pub output: PathBuf,
}

#[derive(Parser)]
pub struct CheckArgs {
    /// Mapping table to check.
    #[arg(long, value_name = "FILE")]
    pub mapping: PathBuf,

    /// CDE schema the table targets.
    #[arg(long, value_name = "FILE")]
    pub schema: PathBuf,
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Source dataset (CSV with one header row).
    #[arg(long, value_name = "CSV")]
    pub dataset: PathBuf,

    /// Mapping table to apply.
    #[arg(long, value_name = "FILE")]
    pub mapping: PathBuf,

    /// CDE schema; when given the table is checked before it is applied.
    #[arg(long, value_name = "FILE")]
    pub schema: Option<PathBuf>,

    /// Emit one column per schema CDE, in schema order.
    #[arg(long = "schema-ordered", requires = "schema")]
    pub schema_ordered: bool,

    /// Where to write the transformed dataset.
    #[arg(long, short, value_name = "CSV")]
    pub output: PathBuf,
}

#[derive(Parser)]
pub struct CodesArgs {
    /// CDE schema to list.
    #[arg(long, value_name = "FILE")]
    pub schema: PathBuf,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

fn parse_method(value: &str) -> Result<SimilarityMethod, String> {
    cde_map::parse_method(value).map_err(|err| err.to_string())
}

fn parse_top_k(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(top_k) => Ok(top_k),
        Err(err) => Err(err.to_string()),
    }
}
