//! Serial port discovery and probing.
//!
//! Candidates come from a per-platform naming scheme rather than from USB
//! metadata, since bench scales are often attached through plain RS-232
//! adapters that report nothing useful. A candidate becomes a *confirmed
//! port* only if it can be opened and closed again.
//!
//! | Platform       | Candidates                       |
//! |----------------|----------------------------------|
//! | Windows        | `COM1` .. `COM256`               |
//! | Linux, Cygwin  | `/dev/tty[A-Za-z]*`              |
//! | macOS          | `/dev/tty.*`                     |

use std::fmt;
use std::fs;
use std::path::PathBuf;

use log::{debug, trace};

use crate::error::{Error, Result};

/// Number of numbered `COM` ports tried on Windows.
pub const COM_PORT_COUNT: u32 = 256;

/// Platform families with a known serial device naming scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum PlatformKind {
    /// Windows (`COMn`).
    Windows,
    /// Linux.
    Linux,
    /// Cygwin, which exposes Linux-style device files.
    Cygwin,
    /// macOS.
    Darwin,
}

impl PlatformKind {
    /// Classify a platform name such as `std::env::consts::OS` (`"linux"`,
    /// `"macos"`, `"windows"`) or a `sys.platform`-style string (`"win32"`,
    /// `"darwin"`, `"cygwin"`).
    pub fn from_name(name: &str) -> Result<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.starts_with("win") {
            Ok(Self::Windows)
        } else if lower.starts_with("linux") {
            Ok(Self::Linux)
        } else if lower.starts_with("cygwin") {
            Ok(Self::Cygwin)
        } else if lower.starts_with("darwin") || lower.starts_with("macos") {
            Ok(Self::Darwin)
        } else {
            Err(Error::UnsupportedPlatform(name.to_string()))
        }
    }

    /// The platform this binary was built for.
    pub fn current() -> Result<Self> {
        Self::from_name(std::env::consts::OS)
    }

    /// The candidate source for this platform family.
    pub fn candidate_source(self) -> Box<dyn CandidateSource> {
        match self {
            Self::Windows => Box::new(ComPorts::default()),
            Self::Linux | Self::Cygwin => Box::new(DeviceDirPorts::linux()),
            Self::Darwin => Box::new(DeviceDirPorts::darwin()),
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Cygwin => "cygwin",
            Self::Darwin => "darwin",
        })
    }
}

/// Lists candidate device identifiers for one platform family.
pub trait CandidateSource {
    /// Candidate paths in discovery order.
    fn candidates(&self) -> Vec<String>;
}

/// Numbered Windows ports, `COM1` through `COM<count>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComPorts {
    count: u32,
}

impl Default for ComPorts {
    fn default() -> Self {
        Self {
            count: COM_PORT_COUNT,
        }
    }
}

impl CandidateSource for ComPorts {
    fn candidates(&self) -> Vec<String> {
        (1..=self.count).map(|i| format!("COM{i}")).collect()
    }
}

/// Entries of a device directory whose file name matches a pattern.
#[derive(Debug, Clone)]
pub struct DeviceDirPorts {
    dir: PathBuf,
    matches: fn(&str) -> bool,
}

impl DeviceDirPorts {
    /// Entries of `dir` accepted by `matches`.
    pub fn new(dir: impl Into<PathBuf>, matches: fn(&str) -> bool) -> Self {
        Self {
            dir: dir.into(),
            matches,
        }
    }

    /// `/dev/tty[A-Za-z]*`; skips the bare controlling terminal `/dev/tty`.
    pub fn linux() -> Self {
        Self::new("/dev", is_linux_tty)
    }

    /// `/dev/tty.*`.
    pub fn darwin() -> Self {
        Self::new("/dev", is_darwin_tty)
    }
}

impl CandidateSource for DeviceDirPorts {
    fn candidates(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Failed to list {}: {e}", self.dir.display());
                return Vec::new();
            },
        };

        let mut found: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(self.matches)
            })
            .map(|entry| entry.path().to_string_lossy().into_owned())
            .collect();
        found.sort();
        found
    }
}

fn is_linux_tty(name: &str) -> bool {
    name.strip_prefix("tty")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_alphabetic())
}

fn is_darwin_tty(name: &str) -> bool {
    name.starts_with("tty.")
}

/// Decides whether a candidate can actually be opened.
pub trait PortProbe {
    /// Open `path` and close it again. Any failure is reported as `false`.
    fn probe_open(&self, path: &str) -> bool;
}

/// Probes with the native serial backend at default parameters.
#[cfg(feature = "native")]
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeProbe;

#[cfg(feature = "native")]
impl PortProbe for NativeProbe {
    fn probe_open(&self, path: &str) -> bool {
        let config = crate::port::SerialConfig::scale(path);
        match crate::port::NativePort::connect(config) {
            Ok(mut port) => {
                port.close();
                true
            },
            Err(e) => {
                trace!("Probe of {path} failed: {e}");
                false
            },
        }
    }
}

/// Candidate identifiers for `platform`.
pub fn discover_candidates(platform: PlatformKind) -> Vec<String> {
    platform.candidate_source().candidates()
}

/// Candidate identifiers for a platform given by name.
///
/// Fails with [`Error::UnsupportedPlatform`] for unrecognised names.
pub fn discover_candidates_for(platform: &str) -> Result<Vec<String>> {
    Ok(discover_candidates(PlatformKind::from_name(platform)?))
}

/// Candidates from `source` that `probe` can open, in discovery order.
///
/// An empty result means no usable device; deciding whether that is fatal is
/// left to the caller.
pub fn confirm_ports(source: &dyn CandidateSource, probe: &dyn PortProbe) -> Vec<String> {
    let candidates = source.candidates();
    let total = candidates.len();
    let confirmed: Vec<String> = candidates
        .into_iter()
        .filter(|path| probe.probe_open(path))
        .collect();
    debug!("{} of {total} candidate ports confirmed", confirmed.len());
    confirmed
}

/// Ports on `platform` that can be opened with the native backend.
#[cfg(feature = "native")]
pub fn confirmed_ports(platform: PlatformKind) -> Vec<String> {
    confirm_ports(platform.candidate_source().as_ref(), &NativeProbe)
}
