//! Settings
//!
//! Formatting knobs. Core functions take an explicit [`Settings`]; the
//! process-wide values below are read only at the convenience entry points
//! (`format_value`, `Check::that`, `FluentMessage::build`).

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::result::{CheckError, CheckResult};

/// Smallest accepted string truncation length
pub const MIN_TRUNCATION_LENGTH: usize = 20;

/// Default string truncation length
pub const DEFAULT_TRUNCATION_LENGTH: usize = 20_000;

/// Default number of items shown around a highlighted sequence item
pub const DEFAULT_WINDOW_SIZE: usize = 20;

/// Environment variable overriding the truncation length
pub const TRUNCATION_ENV: &str = "FLUENT_CHECK_TRUNCATION_LENGTH";

/// Environment variable overriding the window size
pub const WINDOW_ENV: &str = "FLUENT_CHECK_WINDOW_SIZE";

static TRUNCATION_LENGTH: AtomicUsize = AtomicUsize::new(DEFAULT_TRUNCATION_LENGTH);
static WINDOW_SIZE: AtomicUsize = AtomicUsize::new(DEFAULT_WINDOW_SIZE);

/// Formatting configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Strings longer than this many characters are truncated
    pub truncation_length: usize,
    /// Items shown around a highlighted sequence item (0 shows all)
    pub window_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            truncation_length: DEFAULT_TRUNCATION_LENGTH,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

impl Settings {
    /// Create a new builder
    #[must_use]
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Snapshot of the process-wide settings
    #[must_use]
    pub fn current() -> Self {
        Self {
            truncation_length: TRUNCATION_LENGTH.load(Ordering::Relaxed),
            window_size: WINDOW_SIZE.load(Ordering::Relaxed),
        }
    }

    /// Defaults overridden by `FLUENT_CHECK_TRUNCATION_LENGTH` and
    /// `FLUENT_CHECK_WINDOW_SIZE`
    pub fn from_env() -> CheckResult<Self> {
        let mut builder = Self::builder();
        if let Some(len) = read_env(TRUNCATION_ENV)? {
            builder = builder.truncation_length(len);
        }
        if let Some(size) = read_env(WINDOW_ENV)? {
            builder = builder.window_size(size);
        }
        builder.build()
    }

    /// Reject values outside the supported range
    pub fn validate(&self) -> CheckResult<()> {
        if self.truncation_length < MIN_TRUNCATION_LENGTH {
            return Err(CheckError::InvalidTruncationLength {
                requested: self.truncation_length,
                minimum: MIN_TRUNCATION_LENGTH,
            });
        }
        Ok(())
    }

    /// Make these the process-wide settings
    pub fn install(self) -> CheckResult<()> {
        self.validate()?;
        TRUNCATION_LENGTH.store(self.truncation_length, Ordering::Relaxed);
        WINDOW_SIZE.store(self.window_size, Ordering::Relaxed);
        tracing::debug!(
            truncation_length = self.truncation_length,
            window_size = self.window_size,
            "installed fluent-check settings"
        );
        Ok(())
    }
}

fn read_env(name: &str) -> CheckResult<Option<usize>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| CheckError::InvalidSetting {
                name: name.to_string(),
                value: raw,
            }),
        Err(_) => Ok(None),
    }
}

/// Builder for [`Settings`]
#[derive(Debug, Clone, Default)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    /// Set the string truncation length
    #[must_use]
    pub fn truncation_length(mut self, len: usize) -> Self {
        self.settings.truncation_length = len;
        self
    }

    /// Set the highlight window size
    #[must_use]
    pub fn window_size(mut self, size: usize) -> Self {
        self.settings.window_size = size;
        self
    }

    /// Validate and build
    pub fn build(self) -> CheckResult<Settings> {
        self.settings.validate()?;
        Ok(self.settings)
    }
}

/// Change the process-wide string truncation length
pub fn set_string_truncation_length(len: usize) -> CheckResult<()> {
    Settings {
        truncation_length: len,
        ..Settings::current()
    }
    .install()
}

/// Current process-wide string truncation length
#[must_use]
pub fn string_truncation_length() -> usize {
    TRUNCATION_LENGTH.load(Ordering::Relaxed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.truncation_length, 20_000);
        assert_eq!(settings.window_size, 20);
    }

    #[test]
    fn test_builder_rejects_short_truncation() {
        let err = Settings::builder().truncation_length(19).build().unwrap_err();
        assert!(matches!(
            err,
            CheckError::InvalidTruncationLength {
                requested: 19,
                minimum: 20
            }
        ));
    }

    #[test]
    fn test_builder_accepts_minimum() {
        let settings = Settings::builder().truncation_length(20).build().unwrap();
        assert_eq!(settings.truncation_length, 20);
    }

    #[test]
    fn test_global_setter_rejects_before_storing() {
        let before = string_truncation_length();
        assert!(set_string_truncation_length(3).is_err());
        assert_eq!(string_truncation_length(), before);
    }

    #[test]
    fn test_serde_round_trip() {
        let settings = Settings::builder().window_size(5).build().unwrap();
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("\"window_size\":5"));
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }
}
