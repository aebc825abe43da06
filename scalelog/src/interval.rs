//! Human-friendly acquisition intervals (`4s`, `30m`, `2h`).

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

/// An acquisition interval as typed by the operator, with its value in seconds.
///
/// The grammar is `<integer><unit>` where the unit is one of `s`, `m` or `h`
/// (case-insensitive). No sign, whitespace or fractional part is accepted, and
/// the resolved value must be at least one second.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct IntervalSpec {
    raw: String,
    seconds: u64,
}

impl IntervalSpec {
    /// Parse an interval string.
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |why: &str| {
            Error::InvalidInterval(format!(
                "'{raw}' {why} (expected e.g. 30m, 4s or 2h)"
            ))
        };

        let Some(unit) = raw.chars().last() else {
            return Err(invalid("is empty"));
        };
        let multiplier: u64 = match unit.to_ascii_lowercase() {
            's' => 1,
            'm' => 60,
            'h' => 60 * 60,
            _ => return Err(invalid("has no s/m/h unit suffix")),
        };

        let digits = &raw[..raw.len() - unit.len_utf8()];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("does not start with a whole number"));
        }

        let count: u64 = digits
            .parse()
            .map_err(|_| invalid("is out of range"))?;
        let seconds = count
            .checked_mul(multiplier)
            .ok_or_else(|| invalid("is out of range"))?;
        if seconds == 0 {
            return Err(invalid("must be at least one second"));
        }

        Ok(Self {
            raw: raw.to_string(),
            seconds,
        })
    }

    /// The string the interval was parsed from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Resolved interval in whole seconds.
    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    /// Resolved interval as a `Duration`.
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.seconds)
    }
}

impl FromStr for IntervalSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for IntervalSpec {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<IntervalSpec> for String {
    fn from(spec: IntervalSpec) -> Self {
        spec.raw
    }
}

impl fmt::Display for IntervalSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_resolve_to_seconds() {
        assert_eq!(IntervalSpec::parse("4s").unwrap().seconds(), 4);
        assert_eq!(IntervalSpec::parse("30m").unwrap().seconds(), 1800);
        assert_eq!(IntervalSpec::parse("2h").unwrap().seconds(), 7200);
    }

    #[test]
    fn test_unit_is_case_insensitive() {
        assert_eq!(IntervalSpec::parse("5S").unwrap().seconds(), 5);
        assert_eq!(IntervalSpec::parse("5M").unwrap().seconds(), 300);
        assert_eq!(IntervalSpec::parse("1H").unwrap().seconds(), 3600);
    }

    #[test]
    fn test_multiplier_holds_across_values() {
        for n in [1u64, 7, 59, 60, 90, 1000] {
            assert_eq!(IntervalSpec::parse(&format!("{n}s")).unwrap().seconds(), n);
            assert_eq!(IntervalSpec::parse(&format!("{n}m")).unwrap().seconds(), n * 60);
            assert_eq!(IntervalSpec::parse(&format!("{n}h")).unwrap().seconds(), n * 3600);
        }
    }

    #[test]
    fn test_leading_zeros_are_accepted() {
        assert_eq!(IntervalSpec::parse("05m").unwrap().seconds(), 300);
    }

    #[test]
    fn test_raw_and_display_keep_operator_text() {
        let spec = IntervalSpec::parse("30M").unwrap();
        assert_eq!(spec.raw(), "30M");
        assert_eq!(spec.to_string(), "30M");
        assert_eq!(spec.as_duration(), Duration::from_secs(1800));
    }

    #[test]
    fn test_malformed_intervals_are_rejected() {
        for raw in ["30x", "abc", "-5m", "+5m", "", "m", "1.5h", " 5m", "5 m", "5m ", "5ms"] {
            let result = IntervalSpec::parse(raw);
            assert!(
                matches!(result, Err(Error::InvalidInterval(_))),
                "'{raw}' should be rejected, got {result:?}"
            );
        }
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        assert!(matches!(
            IntervalSpec::parse("0s"),
            Err(Error::InvalidInterval(_))
        ));
        assert!(matches!(
            IntervalSpec::parse("0h"),
            Err(Error::InvalidInterval(_))
        ));
    }

    #[test]
    fn test_overflow_is_rejected() {
        assert!(IntervalSpec::parse("99999999999999999999s").is_err());
        assert!(IntervalSpec::parse(&format!("{}h", u64::MAX / 100)).is_err());
    }

    #[test]
    fn test_from_str_matches_parse() {
        let spec: IntervalSpec = "15m".parse().unwrap();
        assert_eq!(spec.seconds(), 900);
    }
}
