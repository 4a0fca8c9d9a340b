//! Shared test helpers for license tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use lexdesk_license::{LicenseConfig, LicenseService, MachineFingerprint, StateStore};
use std::path::Path;

/// Issuer secret used by tests that build the service from parts.
pub const TEST_SECRET: &[u8] = b"test-issuer-secret";

/// A fixed fingerprint for "this" machine.
pub fn this_machine() -> MachineFingerprint {
    MachineFingerprint::from_hostname("lexdesk-test-workstation")
}

/// A fingerprint for some other machine.
pub fn other_machine() -> MachineFingerprint {
    MachineFingerprint::from_hostname("front-desk-laptop")
}

/// Config pointing the state file at `dir`.
pub fn test_config(dir: &Path) -> LicenseConfig {
    LicenseConfig {
        data_dir: Some(dir.to_path_buf()),
        poll_interval_ms: 20,
        ..LicenseConfig::default()
    }
}

/// A service for `fingerprint` whose state lives in `dir`.
pub fn service_for(dir: &Path, fingerprint: MachineFingerprint) -> LicenseService {
    let config = test_config(dir);
    let store = StateStore::in_dir(dir, &config.state_file);
    LicenseService::with_parts(fingerprint, store, TEST_SECRET, config)
}

/// A service for [`this_machine`] whose state lives in `dir`.
pub fn test_service(dir: &Path) -> LicenseService {
    service_for(dir, this_machine())
}

/// A fixed instant used as "now".
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap()
}
