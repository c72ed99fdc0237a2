//! Journal ETL command-line entry point.

use std::fs;
use std::io::{self, IsTerminal};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};

use journal_cli::logging::{LogConfig, LogFormat, init_logging};
use journal_cli::pipeline::{PipelineSettings, run_pipeline};
use journal_cli::summary::print_summary;
use journal_model::{ConfigSource, JournalConfig};

mod cli;

use crate::cli::{Cli, Command, InitConfigArgs, LogFormatArg, LogLevelArg, RunArgs};

fn main() -> ExitCode {
    let cli = Cli::parse();
    cli.color.write_global();

    let result = match &cli.command {
        Command::Run(args) => run(&cli, args),
        Command::InitConfig(args) => init_config(&cli, args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, args: &RunArgs) -> Result<()> {
    let (config, source) = JournalConfig::load_or_default(args.config.as_deref())
        .context("load configuration")?;
    start_logging(cli, Some(&config))?;
    report_config_source(&source);
    if config.logging.style().is_none() {
        warn!(
            format = %config.logging.format,
            "unknown logging.format, using pretty"
        );
    }

    let base_dir = source.base_dir().unwrap_or_else(|| Path::new(""));
    let paths = config.resolve_paths(base_dir);
    let settings = PipelineSettings {
        database: args.db_path.clone().unwrap_or(paths.database),
        table: args.table.clone(),
        schema: args.schema_path.clone().unwrap_or(paths.schema),
        output: args.output_path.clone().unwrap_or(paths.output),
        validate: config.schema_validation_enabled() && !args.no_validate,
        pretty_print: config.output.pretty_print && !args.compact,
        options: config.processing_options(),
    };

    let report = run_pipeline(&settings)?;
    print_summary(&report);
    Ok(())
}

fn init_config(cli: &Cli, args: &InitConfigArgs) -> Result<()> {
    start_logging(cli, None)?;
    if args.path.exists() && !args.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            args.path.display()
        );
    }
    if let Some(parent) = args.path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    JournalConfig::default()
        .save(&args.path)
        .context("write configuration")?;
    println!("Wrote {}", args.path.display());
    Ok(())
}

fn start_logging(cli: &Cli, config: Option<&JournalConfig>) -> Result<()> {
    let log_config = log_config_from_cli(cli, config);
    init_logging(&log_config).context("failed to initialize logging")
}

fn report_config_source(source: &ConfigSource) {
    match source {
        ConfigSource::Explicit(path) | ConfigSource::DefaultFile(path) => {
            info!(path = %path.display(), "using configuration file");
        }
        ConfigSource::Defaults => warn!("no configuration file found, using defaults"),
        ConfigSource::Ignored { path, error } => {
            warn!(path = %path.display(), %error, "ignoring invalid configuration file, using defaults");
        }
    }
}

/// Build logging configuration: `--log-level` over `-v/-q` over the config file.
fn log_config_from_cli(cli: &Cli, config: Option<&JournalConfig>) -> LogConfig {
    let explicit = cli.verbosity.is_present() || cli.log_level.is_some();
    let mut log_config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        use_env_filter: !explicit,
        ..LogConfig::default()
    };
    if let Some(level) = cli.log_level {
        log_config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    } else if !cli.verbosity.is_present()
        && let Some(config) = config
        && let Ok(level) = config.logging.level_filter()
    {
        log_config.level_filter = level;
    }
    log_config.format = match cli.log_format {
        Some(LogFormatArg::Pretty) => LogFormat::Pretty,
        Some(LogFormatArg::Compact) => LogFormat::Compact,
        Some(LogFormatArg::Json) => LogFormat::Json,
        None => config
            .and_then(|config| config.logging.style())
            .map(LogFormat::from)
            .unwrap_or_default(),
    };
    log_config.log_file = cli.log_file.clone();
    log_config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    log_config
}
