//! Harness configuration.
//!
//! Configuration is validated at load time, with sensible defaults and
//! clear error messages. Both verification toggles (size-check strictness
//! and fault injection) are resolved here, not per call site.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{HarnessError, Result};

/// Size-tracking verification strictness.
///
/// Lenient mode accepts over-allocation (the candidate reserved at least
/// what was needed); strict mode requires the exact byte count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SizeCheckMode {
    /// Tracked size must be at least the expected size.
    #[default]
    Lenient,
    /// Tracked size must equal the expected size exactly.
    Strict,
}

impl SizeCheckMode {
    /// Returns true if `actual` satisfies `expected` under this mode.
    #[must_use]
    pub const fn accepts(&self, actual: usize, expected: usize) -> bool {
        match self {
            Self::Lenient => actual >= expected,
            Self::Strict => actual == expected,
        }
    }
}

/// Harness configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Wall-clock deadline per test case.
    #[serde(default = "default_timeout")]
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Parent-side poll interval while waiting on a child.
    #[serde(default = "default_poll_interval")]
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Whether allocation-failure injection reruns are performed.
    #[serde(default = "default_true")]
    pub fault_injection: bool,

    /// Allocation-size verification strictness.
    #[serde(default)]
    pub size_check: SizeCheckMode,

    /// Path of the append-only error log (one failing title per line).
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(50)
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> PathBuf {
    PathBuf::from("errors.log")
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
            fault_injection: default_true(),
            size_check: SizeCheckMode::default(),
            log_path: default_log_path(),
        }
    }
}

impl HarnessConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-test deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Enables or disables fault-injection reruns.
    #[must_use]
    pub const fn with_fault_injection(mut self, enabled: bool) -> Self {
        self.fault_injection = enabled;
        self
    }

    /// Sets the size-check strictness.
    #[must_use]
    pub const fn with_size_check(mut self, mode: SizeCheckMode) -> Self {
        self.size_check = mode;
        self
    }

    /// Sets the error log path.
    #[must_use]
    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = path.into();
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(HarnessError::config("timeout must be greater than zero"));
        }
        if self.poll_interval.is_zero() {
            return Err(HarnessError::config(
                "poll_interval must be greater than zero",
            ));
        }
        if self.poll_interval >= self.timeout {
            return Err(HarnessError::config(
                "poll_interval must be shorter than timeout",
            ));
        }
        if self.log_path.as_os_str().is_empty() {
            return Err(HarnessError::config("log_path cannot be empty"));
        }
        Ok(())
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| HarnessError::config(format!("failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| HarnessError::config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Deadline in whole seconds, rounded up, for the in-child alarm.
    #[must_use]
    pub const fn timeout_secs_ceil(&self) -> u32 {
        let secs = self.timeout.as_secs();
        let extra = if self.timeout.subsec_nanos() > 0 { 1 } else { 0 };
        (secs + extra) as u32
    }
}

/// Serde helper for humantime durations.
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Serializes a duration as a human-readable string.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    /// Deserializes a duration from a human-readable string.
    ///
    /// # Errors
    /// Returns an error if the string cannot be parsed.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
