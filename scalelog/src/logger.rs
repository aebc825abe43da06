//! Append-only reading log.
//!
//! The file is opened for every record and closed again before returning, so
//! an interrupted run never leaves a handle open and can lose at most the
//! record being written.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::trace;

use crate::error::{Error, Result};
use crate::reading::{LINE_ENDING, LogRecord};

/// Append `record` plus CRLF to `path`, creating the file if needed.
pub fn append(path: &Path, record: &LogRecord) -> Result<()> {
    let log_write = |source| Error::LogWrite {
        path: path.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(log_write)?;

    let mut line = String::with_capacity(record.line().len() + LINE_ENDING.len());
    line.push_str(record.line());
    line.push_str(LINE_ENDING);

    file.write_all(line.as_bytes()).map_err(log_write)?;
    file.flush().map_err(log_write)?;
    trace!("Appended {} bytes to {}", line.len(), path.display());

    Ok(())
}

/// The log file readings of one run are appended to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingLog {
    path: PathBuf,
}

impl ReadingLog {
    /// Log to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record.
    pub fn append(&self, record: &LogRecord) -> Result<()> {
        append(&self.path, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::WeightReading;
    use chrono::NaiveDate;
    use std::fs;

    fn record(second: u32, payload: &str) -> LogRecord {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 7)
            .and_then(|d| d.and_hms_opt(10, 0, second))
            .unwrap();
        WeightReading::new(ts, payload).to_record()
    }

    #[test]
    fn test_append_creates_file_with_crlf_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.log");

        append(&path, &record(1, "1.000 kg")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "07/03/2024 10:00:01 - 1.000 kg\r\n");
    }

    #[test]
    fn test_append_preserves_order_and_prior_content() {
        let dir = tempfile::tempdir().unwrap();
        let log = ReadingLog::new(dir.path().join("weights.log"));
        fs::write(log.path(), "existing\r\n").unwrap();

        let n = 5;
        for i in 0..n {
            log.append(&record(i, &format!("{i}.000 kg"))).unwrap();
        }

        let content = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.split_terminator("\r\n").collect();
        assert_eq!(lines.len(), n as usize + 1);
        assert_eq!(lines[0], "existing");
        for i in 0..n {
            assert_eq!(
                lines[i as usize + 1],
                format!("07/03/2024 10:00:{i:02} - {i}.000 kg")
            );
        }
        assert!(content.ends_with("\r\n"));
        assert_eq!(content.matches("\r\n").count(), n as usize + 1);
    }

    #[test]
    fn test_append_to_missing_directory_is_log_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("weights.log");

        match append(&path, &record(0, "1 g")) {
            Err(Error::LogWrite { path: failed, .. }) => assert_eq!(failed, path),
            other => panic!("expected LogWrite, got {other:?}"),
        }
    }
}
