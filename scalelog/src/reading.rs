//! Weight readings and the log line they are written as.

use chrono::NaiveDateTime;
use std::fmt;

/// Timestamp format used for display and in the log file.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Line terminator of the log file.
pub const LINE_ENDING: &str = "\r\n";

/// One reading received from the scale.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeightReading {
    timestamp: NaiveDateTime,
    payload: String,
}

impl WeightReading {
    /// Create a reading from a timestamp and the trimmed device payload.
    pub fn new(timestamp: NaiveDateTime, payload: impl Into<String>) -> Self {
        Self {
            timestamp,
            payload: payload.into(),
        }
    }

    /// When the reading was taken.
    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Measured value and unit as sent by the scale firmware.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// The record this reading is logged as.
    pub fn to_record(&self) -> LogRecord {
        LogRecord::from(self)
    }
}

impl fmt::Display for WeightReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.payload
        )
    }
}

/// A single log line, `"<DD/MM/YYYY HH:MM:SS> - <payload>"`, without terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord(String);

impl LogRecord {
    /// Line text without the CRLF terminator.
    pub fn line(&self) -> &str {
        &self.0
    }
}

impl From<&WeightReading> for LogRecord {
    fn from(reading: &WeightReading) -> Self {
        Self(reading.to_string())
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .and_then(|d| d.and_hms_opt(h, m, s))
            .unwrap()
    }

    #[test]
    fn test_record_format_is_day_first() {
        let reading = WeightReading::new(at(9, 5, 3), "12.345 kg");
        assert_eq!(reading.to_record().line(), "07/03/2024 09:05:03 - 12.345 kg");
    }

    #[test]
    fn test_display_matches_record() {
        let reading = WeightReading::new(at(23, 59, 59), "0.000 g");
        assert_eq!(reading.to_string(), reading.to_record().to_string());
    }

    #[test]
    fn test_accessors() {
        let reading = WeightReading::new(at(1, 2, 3), "5.0 g");
        assert_eq!(reading.timestamp(), at(1, 2, 3));
        assert_eq!(reading.payload(), "5.0 g");
    }
}
