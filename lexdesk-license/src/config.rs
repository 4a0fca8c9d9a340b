//! Licensing configuration.
//!
//! Every field has a default, so a missing or partial `license.toml` is
//! fine. A malformed file falls back to defaults with a warning rather than
//! blocking startup.

use crate::error::{LicenseError, LicenseResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Longest trial the service accepts (one hundred years).
pub const MAX_TRIAL_DAYS: u32 = 36_500;

/// Licensing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseConfig {
    /// Application directory name under the OS data directory.
    pub app_name: String,
    /// Overrides the per-application data directory.
    pub data_dir: Option<PathBuf>,
    /// File name of the encrypted state file.
    pub state_file: String,
    /// Length of the one-time trial.
    pub trial_days: u32,
    /// Interval of the activation watcher.
    pub poll_interval_ms: u64,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            app_name: "LexDesk".to_string(),
            data_dir: None,
            state_file: "license.dat".to_string(),
            trial_days: 14,
            poll_interval_ms: 500,
        }
    }
}

impl LicenseConfig {
    /// Loads configuration from a TOML file.
    ///
    /// A missing file yields defaults; a malformed one yields defaults with a
    /// warning.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No license config at {:?}, using defaults", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Self>(&contents) {
                Ok(config) => {
                    info!("Loaded license config from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("Failed to parse license config {:?}: {}. Using defaults.", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read license config {:?}: {}. Using defaults.", path, e);
                Self::default()
            }
        }
    }

    /// Rejects values the service cannot run with.
    pub fn validate(&self) -> LicenseResult<()> {
        if self.trial_days == 0 {
            return Err(LicenseError::Config("trial_days must be at least 1".to_string()));
        }
        if self.trial_days > MAX_TRIAL_DAYS {
            return Err(LicenseError::Config(format!(
                "trial_days must be at most {MAX_TRIAL_DAYS}, got {}",
                self.trial_days
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(LicenseError::Config(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.state_file.trim().is_empty() {
            return Err(LicenseError::Config("state_file must not be empty".to_string()));
        }
        Ok(())
    }

    /// Directory holding the state file.
    ///
    /// `data_dir` if set, otherwise `<OS data dir>/<app_name>`.
    pub fn resolve_data_dir(&self) -> LicenseResult<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        dirs::data_dir()
            .map(|d| d.join(&self.app_name))
            .ok_or_else(|| LicenseError::Config("no per-user data directory on this OS".to_string()))
    }

    /// Full path of the state file.
    pub fn state_path(&self) -> LicenseResult<PathBuf> {
        Ok(self.resolve_data_dir()?.join(&self.state_file))
    }

    /// Activation watcher interval.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
