// polyglot-cli/src/main.rs
// ============================================================================
// Module: Polyglot CLI Entry Point
// Description: Command dispatcher for schema and configuration tasks.
// Purpose: Run, revert and inspect migrations and check configuration.
// Dependencies: clap, polyglot-cli, polyglot-config, polyglot-core,
//               thiserror, tracing-subscriber
// ============================================================================

//! ## Overview
//! The `polyglot` binary loads `polyglot.toml` (or the file named by
//! `--config` / `POLYGLOT_CONFIG`), installs the configured dialect and runs
//! one command. Logs go to stderr, filtered by `POLYGLOT_LOG`; command output
//! goes to stdout.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use polyglot_cli::open_storage;
use polyglot_cli::render;
use polyglot_config::PolyglotConfig;
use polyglot_core::Dialect;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable holding the log filter.
const LOG_ENV: &str = "POLYGLOT_LOG";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "polyglot", version, disable_help_subcommand = true)]
struct Cli {
    /// Configuration file (overrides `POLYGLOT_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Schema migration utilities.
    Migrate {
        /// Selected migrate subcommand.
        #[command(subcommand)]
        command: MigrateCommand,
    },
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Print the physical columns the factory produces for a dialect.
    Columns(ColumnsCommand),
}

/// Migration subcommands.
#[derive(Subcommand, Debug)]
enum MigrateCommand {
    /// Apply every pending unit.
    Run,
    /// Revert the newest applied units.
    Revert(RevertCommand),
    /// Show the state of every unit.
    Status,
}

/// Arguments for `migrate revert`.
#[derive(Args, Debug)]
struct RevertCommand {
    /// Number of units to revert.
    #[arg(long, default_value_t = 1)]
    steps: usize,
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate the configuration.
    Validate,
}

/// Arguments for `columns`.
#[derive(Args, Debug)]
struct ColumnsCommand {
    /// Dialect selector; defaults to the configured dialect.
    #[arg(long, value_name = "DIALECT")]
    dialect: Option<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Wraps any displayable error.
    fn new(message: impl ToString) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    init_tracing();
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the command dispatcher.
fn run(cli: Cli) -> CliResult<ExitCode> {
    let load = || PolyglotConfig::load(cli.config.as_deref()).map_err(CliError::new);
    match cli.command {
        Commands::Migrate {
            command,
        } => command_migrate(&load()?, &command),
        Commands::Config {
            command: ConfigCommand::Validate,
        } => {
            let config = load()?;
            write_stdout_line(&format!("config ok (dialect {})", config.dialect().map_err(CliError::new)?))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Columns(command) => {
            let dialect = match command.dialect {
                Some(raw) => Dialect::resolve(&raw).map_err(CliError::new)?,
                None => load()?.dialect().map_err(CliError::new)?,
            };
            write_stdout_line(&render::column_catalog_json(dialect).map_err(CliError::new)?)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Executes a migrate subcommand.
fn command_migrate(config: &PolyglotConfig, command: &MigrateCommand) -> CliResult<ExitCode> {
    let storage = open_storage(config).map_err(CliError::new)?;
    let mut executor = storage.database().executor().map_err(CliError::new)?;
    let lines = match command {
        MigrateCommand::Run => render::report_lines(
            &storage.migrator().run_pending(executor.as_mut()).map_err(CliError::new)?,
        ),
        MigrateCommand::Revert(revert) => render::report_lines(
            &storage.migrator().revert(executor.as_mut(), revert.steps).map_err(CliError::new)?,
        ),
        MigrateCommand::Status => render::status_lines(
            &storage.migrator().status(executor.as_mut()).map_err(CliError::new)?,
        ),
    };
    for line in lines {
        write_stdout_line(&line)?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Installs the stderr log subscriber.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
        .map_err(|err| CliError::new(format!("failed to write stdout: {err}")))
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
