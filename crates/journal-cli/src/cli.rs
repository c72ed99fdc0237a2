//! CLI argument definitions for the journal ETL.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "journal-etl",
    version,
    about = "Convert journal entries from SQLite into a validated XML document",
    long_about = "Convert accounting journal entries from a SQLite database into XML.\n\n\
                  Dates, amounts, accounts and descriptions are normalized; records\n\
                  with an unusable date, amount or account are skipped. The output\n\
                  can be checked against an XML Schema before it is written."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q and the configuration file).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (defaults to the configuration file, then pretty).
    #[arg(long = "log-format", value_enum, global = true)]
    pub log_format: Option<LogFormatArg>,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the extract, transform and load pipeline.
    Run(RunArgs),

    /// Write a configuration file containing every default value.
    InitConfig(InitConfigArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Configuration file (default: ./config.json when present).
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// SQLite database to read (overrides paths.database).
    #[arg(long = "db-path", value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// XML document to write (overrides paths.output).
    #[arg(long = "output-path", value_name = "PATH")]
    pub output_path: Option<PathBuf>,

    /// XML Schema used for validation (overrides paths.schema).
    #[arg(long = "schema-path", value_name = "PATH")]
    pub schema_path: Option<PathBuf>,

    /// Table holding the journal entries.
    #[arg(long = "table", value_name = "NAME")]
    pub table: Option<String>,

    /// Skip XML Schema validation.
    #[arg(long = "no-validate")]
    pub no_validate: bool,

    /// Write the XML without indentation.
    #[arg(long = "compact")]
    pub compact: bool,
}

#[derive(Parser)]
pub struct InitConfigArgs {
    /// Where to write the configuration.
    #[arg(value_name = "PATH", default_value = "config.json")]
    pub path: PathBuf,

    /// Overwrite an existing file.
    #[arg(long = "force")]
    pub force: bool,
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
