//! Interactive setup prompts.
//!
//! Every prompt writes to stderr so stdout carries only readings. Prompts
//! need a terminal on both stdin and stderr; callers check with
//! [`ensure_interactive_terminal`] first.

use {
    crate::{CliError, config::Config},
    anyhow::Result,
    console::style,
    dialoguer::{Confirm, Error as DialoguerError, Input, Select, theme::ColorfulTheme},
    log::{debug, info},
    scalelog::{IntervalSpec, PlatformKind, confirmed_ports},
    std::{
        io::IsTerminal,
        path::{Path, PathBuf},
    },
};

/// Whether stdin and stderr are both terminals.
pub(crate) fn has_terminal() -> bool {
    std::io::stdin().is_terminal() && std::io::stderr().is_terminal()
}

pub(crate) fn ensure_interactive_terminal() -> Result<()> {
    if has_terminal() {
        Ok(())
    } else {
        Err(CliError::Usage(
            "Interactive setup requires a terminal; pass --port, --interval and --file instead"
                .to_string(),
        )
        .into())
    }
}

fn map_prompt_error(err: DialoguerError) -> anyhow::Error {
    match err {
        DialoguerError::IO(io_err) => {
            if io_err.kind() == std::io::ErrorKind::Interrupted {
                CliError::Cancelled("Setup cancelled".to_string()).into()
            } else {
                CliError::Usage(format!("Prompt failed: {io_err}")).into()
            }
        },
    }
}

/// One line per setting, for showing loaded settings before confirmation.
pub(crate) fn describe_settings(config: &Config) -> Vec<String> {
    fn or_unset(value: Option<String>) -> String {
        value.unwrap_or_else(|| "(not set)".to_string())
    }

    vec![
        format!("Port:     {}", or_unset(config.connection.serial.clone())),
        format!("Interval: {}", or_unset(config.log.interval.clone())),
        format!(
            "File:     {}",
            or_unset(
                config
                    .log
                    .file
                    .as_ref()
                    .map(|p| p.display().to_string())
            )
        ),
    ]
}

/// Show loaded settings and ask whether to keep them.
pub(crate) fn confirm_loaded(config: &Config) -> Result<bool> {
    eprintln!("{} Loaded settings:", style("ℹ").blue());
    for line in describe_settings(config) {
        eprintln!("  {line}");
    }

    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Use these settings?")
        .default(true)
        .interact()
        .map_err(map_prompt_error)
}

/// Probe this platform's ports and let the operator pick one.
pub(crate) fn select_port() -> Result<String> {
    let platform = PlatformKind::current()?;
    eprintln!("{} Searching for serial ports...", style("ℹ").blue());
    let ports = confirmed_ports(platform);
    debug!("Confirmed ports: {ports:?}");

    if ports.is_empty() {
        return Err(scalelog::Error::NoPortsFound.into());
    }

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select the scale's serial port")
        .items(&ports)
        .default(0)
        .interact()
        .map_err(map_prompt_error)?;

    let port = ports
        .into_iter()
        .nth(selection)
        .ok_or_else(|| CliError::Usage("Invalid port selection".to_string()))?;
    info!("Selected port: {port}");
    Ok(port)
}

#[allow(clippy::ptr_arg)]
fn validate_interval_input(input: &String) -> std::result::Result<(), String> {
    IntervalSpec::parse(input)
        .map(|_| ())
        .map_err(|e| e.to_string())
}

/// Ask for the acquisition interval until it parses.
pub(crate) fn prompt_interval() -> Result<IntervalSpec> {
    let raw: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Interval between readings (e.g. 30s, 15m, 2h)")
        .validate_with(validate_interval_input)
        .interact_text()
        .map_err(map_prompt_error)?;
    Ok(IntervalSpec::parse(&raw)?)
}

/// Ask for the log file name.
pub(crate) fn prompt_file() -> Result<PathBuf> {
    let raw: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Log file")
        .validate_with(|input: &String| {
            if input.trim().is_empty() {
                Err("File name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()
        .map_err(map_prompt_error)?;
    Ok(PathBuf::from(raw.trim()))
}

/// Ask whether an existing log file may be removed.
pub(crate) fn confirm_remove_log(path: &Path) -> Result<bool> {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!(
            "{} already exists. Remove it and start a new log?",
            path.display()
        ))
        .default(false)
        .interact()
        .map_err(map_prompt_error)
}
