//! Acquisition command.

use anyhow::{Context, Result};
use console::style;
use log::{debug, info, warn};
use scalelog::{
    AcquisitionConfig, CancelToken, IntervalSpec, ScaleDriver, Scheduler, WeightReading,
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::{Config, LOCAL_CONFIG_FILE};
use crate::{Cli, CliError, wizard};

/// Arguments of the `run` subcommand.
#[derive(Debug, Clone, Default)]
pub(crate) struct RunArgs {
    pub(crate) interval: Option<IntervalSpec>,
    pub(crate) file: Option<PathBuf>,
    pub(crate) append: bool,
    pub(crate) no_save: bool,
}

/// Settings gathered from one source; any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PartialSettings {
    port: Option<String>,
    interval: Option<IntervalSpec>,
    file: Option<PathBuf>,
}

impl PartialSettings {
    fn from_config(config: &Config) -> Result<Self> {
        let interval = config
            .log
            .interval
            .as_deref()
            .map(IntervalSpec::parse)
            .transpose()
            .map_err(|e| CliError::Usage(format!("Settings file: {e}")))?;
        Ok(Self {
            port: config.connection.serial.clone(),
            interval,
            file: config.log.file.clone(),
        })
    }

    fn is_empty(&self) -> bool {
        self.port.is_none() && self.interval.is_none() && self.file.is_none()
    }

    /// Fill fields missing here from `lower`.
    fn or(self, lower: Self) -> Self {
        Self {
            port: self.port.or(lower.port),
            interval: self.interval.or(lower.interval),
            file: self.file.or(lower.file),
        }
    }

    fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.port.is_none() {
            missing.push("port");
        }
        if self.interval.is_none() {
            missing.push("interval");
        }
        if self.file.is_none() {
            missing.push("file");
        }
        missing
    }

    fn to_config(&self) -> Config {
        let mut config = Config::default();
        config.connection.serial.clone_from(&self.port);
        config.log.interval = self.interval.as_ref().map(|i| i.raw().to_string());
        config.log.file.clone_from(&self.file);
        config
    }

    fn into_acquisition(self) -> Option<AcquisitionConfig> {
        Some(AcquisitionConfig {
            port: self.port?,
            interval: self.interval?,
            log_path: self.file?,
        })
    }
}

/// Prompt for every field still missing. Interval comes before port so a
/// bad interval never reaches the serial layer.
fn fill_with_wizard(mut settings: PartialSettings) -> Result<PartialSettings> {
    if settings.interval.is_none() {
        settings.interval = Some(wizard::prompt_interval()?);
    }
    if settings.port.is_none() {
        settings.port = Some(wizard::select_port()?);
    }
    if settings.file.is_none() {
        settings.file = Some(wizard::prompt_file()?);
    }
    Ok(settings)
}

/// Resolve settings from args, env, settings files and the wizard.
///
/// Returns the settings and whether the wizard changed anything.
fn resolve(cli: &Cli, config: &Config, args: &RunArgs) -> Result<(AcquisitionConfig, bool)> {
    let from_cli = PartialSettings {
        port: cli.port.clone(),
        interval: args.interval.clone(),
        file: args.file.clone(),
    };
    let from_file = PartialSettings::from_config(config)?;
    let mut settings = from_cli.clone().or(from_file.clone());
    let mut prompted = false;

    if !cli.non_interactive
        && !from_file.is_empty()
        && wizard::has_terminal()
        && !wizard::confirm_loaded(&settings.to_config())?
    {
        settings = from_cli;
        prompted = true;
    }

    let missing = settings.missing();
    if !missing.is_empty() {
        if cli.non_interactive {
            return Err(CliError::Usage(format!(
                "Missing settings: {} (pass --port, --interval and --file, or use a settings file)",
                missing.join(", ")
            ))
            .into());
        }
        wizard::ensure_interactive_terminal()?;
        settings = fill_with_wizard(settings)?;
        prompted = true;
    }

    debug!("Resolved settings: {settings:?}");
    let acquisition = settings
        .into_acquisition()
        .ok_or_else(|| CliError::Usage("Incomplete settings".to_string()))?;
    Ok((acquisition, prompted))
}

/// Make sure readings will not be mixed into an unrelated existing log.
fn check_log_file(path: &Path, append: bool, non_interactive: bool) -> Result<()> {
    if append || !path.exists() {
        return Ok(());
    }

    if non_interactive {
        return Err(CliError::Usage(format!(
            "Log file {} already exists; pass --append to add to it",
            path.display()
        ))
        .into());
    }

    wizard::ensure_interactive_terminal()?;
    if wizard::confirm_remove_log(path)? {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
        info!("Removed {}", path.display());
        Ok(())
    } else {
        Err(CliError::Cancelled(format!("Kept {}, nothing logged", path.display())).into())
    }
}

fn save_settings(cli: &Cli, acquisition: &AcquisitionConfig) {
    let path = cli
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE));
    let settings = PartialSettings {
        port: Some(acquisition.port.clone()),
        interval: Some(acquisition.interval.clone()),
        file: Some(acquisition.log_path.clone()),
    };
    if let Err(e) = settings.to_config().save_to(&path) {
        warn!("Failed to save settings to {}: {e:#}", path.display());
    }
}

/// Echo a reading for the operator. A closed stdout must not stop logging.
fn show_reading(out: &mut impl Write, reading: &WeightReading) {
    if let Err(e) = writeln!(out, "{reading}").and_then(|()| out.flush()) {
        debug!("Could not echo reading: {e}");
    }
}

/// Run command implementation.
pub(crate) fn cmd_run(cli: &Cli, config: &Config, args: &RunArgs) -> Result<()> {
    let (acquisition, prompted) = resolve(cli, config, args)?;

    if prompted && !args.no_save {
        save_settings(cli, &acquisition);
    }

    check_log_file(&acquisition.log_path, args.append, cli.non_interactive)?;

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .context("Failed to install Ctrl-C handler")?;

    if !cli.quiet {
        eprintln!(
            "{} Weighing on {} every {}, logging to {}",
            style("⚖").cyan(),
            style(&acquisition.port).cyan(),
            acquisition.interval,
            style(acquisition.log_path.display()).yellow()
        );
        eprintln!("{}", style("Press Ctrl-C to stop.").dim());
    }

    let driver = ScaleDriver::open(&acquisition.port, cancel)?;
    let mut scheduler = Scheduler::new(driver, &acquisition);
    let summary = scheduler.run(|reading| show_reading(&mut io::stdout().lock(), reading))?;

    if !cli.quiet {
        eprintln!(
            "{} Logged {} readings to {}",
            style("✓").green(),
            summary.readings,
            acquisition.log_path.display()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    fn complete_config() -> Config {
        let mut config = Config::default();
        config.connection.serial = Some("/dev/ttyUSB0".to_string());
        config.log.interval = Some("30m".to_string());
        config.log.file = Some(PathBuf::from("file.log"));
        config
    }

    #[test]
    fn test_cli_args_override_settings_file() {
        let cli = cli(&["scalelog", "--non-interactive", "--port", "COM3", "run"]);
        let args = RunArgs {
            interval: Some(IntervalSpec::parse("4s").unwrap()),
            ..RunArgs::default()
        };

        let (acq, prompted) = resolve(&cli, &complete_config(), &args).unwrap();

        assert_eq!(acq.port, "COM3");
        assert_eq!(acq.interval.seconds(), 4);
        assert_eq!(acq.log_path, PathBuf::from("file.log"));
        assert!(!prompted);
    }

    #[test]
    fn test_missing_settings_non_interactive_is_usage_error() {
        let cli = cli(&["scalelog", "--non-interactive", "run"]);

        let err = resolve(&cli, &Config::default(), &RunArgs::default()).unwrap_err();

        match err.downcast_ref::<CliError>() {
            Some(CliError::Usage(msg)) => {
                assert!(msg.contains("port"));
                assert!(msg.contains("interval"));
                assert!(msg.contains("file"));
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_interval_in_settings_file_is_usage_error() {
        let cli = cli(&["scalelog", "--non-interactive", "run"]);
        let mut config = complete_config();
        config.log.interval = Some("soon".to_string());

        let err = resolve(&cli, &config, &RunArgs::default()).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::Usage(_))
        ));
    }

    #[test]
    fn test_partial_settings_or_prefers_upper() {
        let upper = PartialSettings {
            port: Some("COM1".to_string()),
            ..PartialSettings::default()
        };
        let lower = PartialSettings::from_config(&complete_config()).unwrap();

        let merged = upper.or(lower);

        assert_eq!(merged.port.as_deref(), Some("COM1"));
        assert!(merged.missing().is_empty());
        assert_eq!(merged.interval.as_ref().unwrap().raw(), "30m");
    }

    #[test]
    fn test_to_config_keeps_raw_interval() {
        let settings = PartialSettings::from_config(&complete_config()).unwrap();
        assert_eq!(settings.to_config(), complete_config());
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }

    fn sample_reading() -> WeightReading {
        let timestamp = chrono::NaiveDate::from_ymd_opt(2024, 3, 7)
            .and_then(|d| d.and_hms_opt(9, 15, 0))
            .unwrap();
        WeightReading::new(timestamp, "12.345 kg")
    }

    #[test]
    fn test_show_reading_writes_record_line() {
        let mut out = Vec::new();

        show_reading(&mut out, &sample_reading());

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "07/03/2024 09:15:00 - 12.345 kg\n"
        );
    }

    #[test]
    fn test_show_reading_survives_closed_stdout() {
        show_reading(&mut ClosedPipe, &sample_reading());
    }

    #[test]
    fn test_check_log_file_absent_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_log_file(&dir.path().join("new.log"), false, true).is_ok());
    }

    #[test]
    fn test_check_log_file_append_keeps_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.log");
        fs::write(&path, "old\r\n").unwrap();

        check_log_file(&path, true, true).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "old\r\n");
    }

    #[test]
    fn test_check_log_file_exists_non_interactive_is_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.log");
        fs::write(&path, "old\r\n").unwrap();

        let err = check_log_file(&path, false, true).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::Usage(_))
        ));
        assert!(path.exists());
    }
}
