//! Persisted license and trial records.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Status of a stored license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseRecordStatus {
    /// License is in force.
    Active,
    /// License was revoked and no longer grants access.
    Revoked,
}

/// Proof that a key was activated on a machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseRecord {
    /// Normalized key, `XXXX-XXXX-XXXX-XXXX-XXXX`.
    pub license_key: String,
    /// Fingerprint of the machine the key was activated on.
    pub machine_id: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    pub activated_at: DateTime<Utc>,
    /// `None` for a perpetual license.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub status: LicenseRecordStatus,
}

impl LicenseRecord {
    /// Returns true if the license has an expiry at or before `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

/// Status of the one-time trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrialStatus {
    Active,
    Expired,
}

/// Marker for the time-boxed trial. Created at most once per installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialRecord {
    pub started_at: DateTime<Utc>,
    pub duration_days: u32,
    pub status: TrialStatus,
}

impl TrialRecord {
    /// Creates an active trial starting at `now`.
    #[must_use]
    pub fn start(now: DateTime<Utc>, duration_days: u32) -> Self {
        Self {
            started_at: now,
            duration_days,
            status: TrialStatus::Active,
        }
    }

    /// When the trial window closes. Saturates at the latest representable
    /// instant for a duration too long for the calendar.
    #[must_use]
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.started_at
            .checked_add_signed(Duration::days(i64::from(self.duration_days)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// The single decrypted document held in the state file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateRecord {
    pub version: u8,
    #[serde(default)]
    pub license: Option<LicenseRecord>,
    #[serde(default)]
    pub trial: Option<TrialRecord>,
}

impl StateRecord {
    /// Current state document format version.
    pub const CURRENT_VERSION: u8 = 1;

    /// An empty document.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            license: None,
            trial: None,
        }
    }

    /// A document holding only a trial.
    #[must_use]
    pub fn with_trial(trial: TrialRecord) -> Self {
        Self {
            trial: Some(trial),
            ..Self::empty()
        }
    }

    /// A document holding only a license.
    #[must_use]
    pub fn with_license(license: LicenseRecord) -> Self {
        Self {
            license: Some(license),
            ..Self::empty()
        }
    }
}

impl Default for StateRecord {
    fn default() -> Self {
        Self::empty()
    }
}
