//! scalelog CLI - Log laboratory scale readings over a serial link.
//!
//! ## Features
//!
//! - Periodic weight acquisition into an append-only log file
//! - Interactive setup wizard with port probing
//! - Settings files (global and per-directory)
//! - Shell completion generation
//! - Environment variable support

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use console::style;
use env_logger::Env;
use log::debug;
use scalelog::IntervalSpec;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod config;
mod wizard;

use commands::completions::cmd_completions;
use commands::ports::cmd_list_ports;
use commands::run::{RunArgs, cmd_run};
use config::Config;

/// Failures that carry their own exit code.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    /// Bad invocation or missing setup; exit code 2.
    #[error("{0}")]
    Usage(String),
    /// Stopped by the operator; exit code 130.
    #[error("{0}")]
    Cancelled(String),
}

impl CliError {
    const fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_) => 2,
            Self::Cancelled(_) => 130,
        }
    }
}

/// Exit code for an error that ended the program.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return cli_err.exit_code();
    }
    match err.downcast_ref::<scalelog::Error>() {
        Some(scalelog::Error::Cancelled) => 130,
        _ => 1,
    }
}

/// scalelog - Poll a laboratory scale and log every reading.
///
/// Environment variables:
///   SCALELOG_PORT               - Serial port of the scale
///   SCALELOG_INTERVAL           - Acquisition interval (e.g. 30s, 15m, 2h)
///   SCALELOG_FILE               - Log file readings are appended to
///   SCALELOG_NON_INTERACTIVE    - Non-interactive mode (disable prompts)
#[derive(Parser)]
#[command(name = "scalelog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    /// Serial port the scale is attached to (probed interactively if not specified).
    #[arg(short, long, global = true, env = "SCALELOG_PORT")]
    port: Option<String>,

    /// Verbose output level (-v, -vv for increasing detail).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress non-essential output).
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Non-interactive mode (fail instead of prompting).
    #[arg(long, global = true, env = "SCALELOG_NON_INTERACTIVE")]
    non_interactive: bool,

    /// Path to a settings file.
    #[arg(long = "config", global = true, value_name = "PATH")]
    config_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Weigh at a fixed interval until interrupted with Ctrl-C.
    Run {
        /// Time between readings: an integer followed by s, m or h (e.g. 30m).
        #[arg(short, long, env = "SCALELOG_INTERVAL", value_name = "SPEC", value_parser = parse_interval)]
        interval: Option<IntervalSpec>,

        /// File readings are appended to.
        #[arg(short, long, env = "SCALELOG_FILE", value_name = "PATH")]
        file: Option<PathBuf>,

        /// Add to an existing log file instead of asking to remove it.
        #[arg(long)]
        append: bool,

        /// Do not save settings entered in the wizard.
        #[arg(long)]
        no_save: bool,
    },

    /// List serial ports that can be opened.
    ListPorts {
        /// Output as JSON.
        #[arg(long)]
        json: bool,

        /// List every candidate device without probing it.
        #[arg(long)]
        all: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell type to generate completions for.
        shell: Shell,
    },
}

fn parse_interval(s: &str) -> std::result::Result<IntervalSpec, String> {
    IntervalSpec::parse(s).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let stderr_is_tty = console::Term::stderr().is_term();
    if env::var("NO_COLOR").is_ok() || !stderr_is_tty {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_target(cli.verbose >= 2)
        .format_timestamp(if cli.verbose >= 2 {
            Some(env_logger::TimestampPrecision::Millis)
        } else {
            None
        })
        .init();

    debug!(
        "scalelog v{} (verbose level: {})",
        env!("CARGO_PKG_VERSION"),
        cli.verbose
    );

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", style("Error:").red().bold());
            ExitCode::from(exit_code_for(&e))
        },
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Run {
            interval,
            file,
            append,
            no_save,
        } => {
            // Settings files are only read when a run needs them
            let config = if let Some(ref path) = cli.config_path {
                Config::load_from_path(path)
            } else {
                Config::load()
            };
            let args = RunArgs {
                interval: interval.clone(),
                file: file.clone(),
                append: *append,
                no_save: *no_save,
            };
            cmd_run(cli, &config, &args)
        },
        Commands::ListPorts { json, all } => cmd_list_ports(*json, *all),
        Commands::Completions { shell } => {
            cmd_completions(*shell);
            Ok(())
        },
    }
}
