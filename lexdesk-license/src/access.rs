//! Access decisions.
//!
//! [`evaluate`] is a pure function of the stored state, the current machine
//! fingerprint and the wall clock. It holds nothing between calls. Rules are
//! checked in order and the first match wins:
//!
//! 1. A license bound to this machine, active and unexpired: `Licensed`.
//! 2. Any other license: `Unactivated` with the specific reason. A bad
//!    license never falls through to the trial.
//! 3. A trial: `TrialActive` until `started_at + duration_days`, then
//!    `TrialExpired`.
//! 4. Nothing recorded: `Unactivated` and eligible for a trial.

use crate::record::{LicenseRecordStatus, StateRecord, TrialStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Why access is not granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// Nothing has been activated or started yet.
    NoLicense,
    /// The stored license was activated on a different machine.
    WrongMachine,
    /// The stored license has passed its expiry date.
    LicenseExpired,
    /// The stored license is not active (revoked).
    LicenseInactive,
    /// The state file could not be decrypted or parsed.
    CorruptedState,
}

impl DenialReason {
    /// Human readable, actionable message.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoLicense => {
                "LexDesk is not activated. Enter a license key or start the free trial."
            }
            Self::WrongMachine => {
                "The stored license was activated on a different machine. \
                 Request a key for this machine ID."
            }
            Self::LicenseExpired => "Your license has expired. Enter a renewed license key.",
            Self::LicenseInactive => {
                "Your license is no longer active. Contact support for a new key."
            }
            Self::CorruptedState => {
                "The license file is corrupted. Please re-enter your license key."
            }
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// The single value that gates whether the application may run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AccessDecision {
    /// A valid license is bound to this machine.
    Licensed,
    /// The trial is running.
    TrialActive {
        /// Whole days left, rounded up.
        days_remaining: u32,
    },
    /// The trial has ended; only activation grants access again.
    TrialExpired,
    /// No usable license or trial.
    Unactivated {
        reason: DenialReason,
        /// True if no trial has ever been recorded and one may be started.
        trial_eligible: bool,
    },
}

impl AccessDecision {
    /// Returns true if the application may proceed to normal operation.
    #[must_use]
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Licensed | Self::TrialActive { .. })
    }

    /// Returns true if a trial may be started.
    #[must_use]
    pub fn is_trial_eligible(&self) -> bool {
        matches!(
            self,
            Self::Unactivated {
                trial_eligible: true,
                ..
            }
        )
    }

    /// Reason access is denied, if it is.
    #[must_use]
    pub fn denial_message(&self) -> Option<&'static str> {
        match self {
            Self::Licensed | Self::TrialActive { .. } => None,
            Self::TrialExpired => {
                Some("Your trial has expired. Enter a license key to continue using LexDesk.")
            }
            Self::Unactivated { reason, .. } => Some(reason.message()),
        }
    }

    /// Decision for a state file that failed to decrypt or parse.
    #[must_use]
    pub fn corrupted() -> Self {
        Self::Unactivated {
            reason: DenialReason::CorruptedState,
            trial_eligible: true,
        }
    }
}

/// Computes the access decision for `state` on the machine `fingerprint`
/// at `now`.
#[must_use]
pub fn evaluate(
    state: Option<&StateRecord>,
    fingerprint: &str,
    now: DateTime<Utc>,
) -> AccessDecision {
    let Some(state) = state else {
        return AccessDecision::Unactivated {
            reason: DenialReason::NoLicense,
            trial_eligible: true,
        };
    };

    if let Some(license) = &state.license {
        let reason = if license.machine_id != fingerprint {
            DenialReason::WrongMachine
        } else if license.status != LicenseRecordStatus::Active {
            DenialReason::LicenseInactive
        } else if license.is_expired_at(now) {
            DenialReason::LicenseExpired
        } else {
            return AccessDecision::Licensed;
        };
        return AccessDecision::Unactivated {
            reason,
            trial_eligible: false,
        };
    }

    if let Some(trial) = &state.trial {
        let ends_at = trial.ends_at();
        if trial.status == TrialStatus::Expired || now >= ends_at {
            return AccessDecision::TrialExpired;
        }
        return AccessDecision::TrialActive {
            days_remaining: days_remaining(ends_at, now),
        };
    }

    AccessDecision::Unactivated {
        reason: DenialReason::NoLicense,
        trial_eligible: true,
    }
}

/// Whole days from `now` until `ends_at`, rounded up. Zero once passed.
#[must_use]
pub fn days_remaining(ends_at: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let millis = (ends_at - now).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    u32::try_from((millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY).unwrap_or(u32::MAX)
}
