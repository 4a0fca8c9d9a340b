//! Error types for the licensing module.

use lexdesk_crypto::CryptoError;
use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Key does not match the `XXXX-XXXX-XXXX-XXXX-XXXX` pattern.
    #[error("invalid license key format: {0}")]
    InvalidKeyFormat(String),

    /// Key is well-formed but was not issued for this machine.
    #[error("this license key is not valid for this machine")]
    MachineMismatch,

    /// The state file exists but could not be decrypted or parsed.
    #[error("corrupted license state: {0}")]
    CorruptedState(String),

    /// A trial has already been recorded for this installation.
    #[error("a trial has already been started on this installation")]
    TrialAlreadyStarted,

    /// A license is recorded, so no trial can be started.
    #[error("a license is already recorded on this installation; no trial is available")]
    LicensePresent,

    /// Disk read/write failure.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Encryption failure while writing state.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl LicenseError {
    /// Returns true for failures the caller may retry without user input.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
