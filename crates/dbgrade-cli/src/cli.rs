//! CLI argument definitions for the schema grader.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "dbgrade",
    version,
    about = "Grade student database schemas against an answer schema",
    long_about = "Grade student database schemas against an answer schema.\n\n\
                  Tables and columns are paired by canonical names, fuzzy scores and\n\
                  embedding similarity; each answer table earns points when enough\n\
                  columns, the primary key and the foreign keys match."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Grader configuration file (TOML).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Never call the embedding backend; use fallback vectors only.
    #[arg(long = "offline", global = true)]
    pub offline: bool,

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
    /// Grade one student snapshot.
    Grade(GradeArgs),

    /// Grade every snapshot in a directory.
    Batch(BatchArgs),

    /// Print normalized and canonical forms of identifiers.
    Canonical(CanonicalArgs),
}

#[derive(Parser)]
pub struct GradeArgs {
    /// Answer schema snapshot (JSON).
    #[arg(long = "answer", value_name = "FILE")]
    pub answer: PathBuf,

    /// Student schema snapshot (JSON).
    #[arg(long = "student", value_name = "FILE")]
    pub student: PathBuf,

    /// Write pair, table and foreign key CSV files here.
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Parser)]
pub struct BatchArgs {
    /// Answer schema snapshot (JSON).
    #[arg(long = "answer", value_name = "FILE")]
    pub answer: PathBuf,

    /// Directory of student snapshots.
    #[arg(value_name = "STUDENTS_DIR")]
    pub students_dir: PathBuf,

    /// Directory for the results CSV (default: <STUDENTS_DIR>).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Parser)]
pub struct CanonicalArgs {
    /// Identifiers to canonicalize.
    #[arg(value_name = "TEXT", required = true)]
    pub texts: Vec<String>,
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
