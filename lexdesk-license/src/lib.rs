//! Offline licensing and trial gating for LexDesk.
//!
//! This crate decides, without any network access, whether the application
//! may run:
//! - Machine fingerprinting from stable host metadata
//! - License keys derived with HMAC-SHA256 from the machine id, minted by
//!   the issuer and recomputed on the device with the same function
//! - An encrypted, atomically written state file holding the license and
//!   trial records
//! - A pure access controller and a one-time, time-boxed trial
//!
//! # License Key Format
//!
//! `XXXX-XXXX-XXXX-XXXX-XXXX`, the first 20 uppercase hex characters of
//! `HMAC-SHA256(secret, machine_id)`.
//!
//! # Trust Boundary
//!
//! The shared secret and the state-file key are embedded in the binary.
//! Trial expiry relies on the wall clock and is not protected against the
//! clock being set back.

mod access;
mod activation;
mod config;
mod device;
mod error;
mod key;
mod record;
mod service;
mod store;

pub use access::{days_remaining, evaluate, AccessDecision, DenialReason};
pub use activation::{ActivationWatcher, WatchOutcome};
pub use config::{LicenseConfig, MAX_TRIAL_DAYS};
pub use device::{generate_fingerprint, HostMetadata, MachineFingerprint};
pub use error::{LicenseError, LicenseResult};
pub use key::{
    check_issued_key, check_license_key, derive_license_key, is_valid_key_format,
    issue_license_key, normalize_key, verify_license_key, KEY_GROUPS, KEY_GROUP_LEN,
};
pub use record::{LicenseRecord, LicenseRecordStatus, StateRecord, TrialRecord, TrialStatus};
pub use service::{LicenseService, OperationResult, TrialInfo};
pub use store::StateStore;
