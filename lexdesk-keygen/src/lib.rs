//! Issuer-side operations for LexDesk licensing.
//!
//! The vendor runs these offline: a customer sends their machine id through
//! any channel, the vendor mints the key and sends it back.

use anyhow::{bail, Context, Result};
use lexdesk_license::{
    check_issued_key, issue_license_key, AccessDecision, LicenseConfig,
    LicenseService, MachineFingerprint, TrialInfo,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A key minted for a machine.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct IssuedKey {
    pub machine_id: String,
    pub license_key: String,
}

/// Result of checking a key against a machine id.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VerifyReport {
    pub machine_id: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Licensing state of the local machine.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StatusReport {
    pub machine_id: String,
    pub state_file: String,
    pub decision: AccessDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial: Option<TrialInfo>,
}

fn parse_machine_id(machine_id: &str) -> Result<MachineFingerprint> {
    match MachineFingerprint::parse(machine_id) {
        Some(fp) => Ok(fp),
        None => bail!(
            "'{}' is not a machine id (expected XXXXXXXX-XXXXXXXX-XXXXXXXX-XXXXXXXX)",
            machine_id.trim()
        ),
    }
}

/// Mints the license key for `machine_id` with the embedded secret.
pub fn issue(machine_id: &str) -> Result<IssuedKey> {
    let fingerprint = parse_machine_id(machine_id)?;
    let license_key = issue_license_key(&fingerprint);
    info!("Issued key for machine {}", fingerprint);
    Ok(IssuedKey {
        machine_id: fingerprint.to_string(),
        license_key,
    })
}

/// Checks `key` against `machine_id` with the embedded secret.
pub fn verify(machine_id: &str, key: &str) -> Result<VerifyReport> {
    let fingerprint = parse_machine_id(machine_id)?;
    let report = match check_issued_key(key, &fingerprint) {
        Ok(()) => VerifyReport {
            machine_id: fingerprint.to_string(),
            valid: true,
            reason: None,
        },
        Err(e) => VerifyReport {
            machine_id: fingerprint.to_string(),
            valid: false,
            reason: Some(e.to_string()),
        },
    };
    debug!(valid = report.valid, "Key verified");
    Ok(report)
}

/// Reports this machine's id and access decision without writing anything.
pub async fn status(config: LicenseConfig) -> Result<StatusReport> {
    let service = LicenseService::open(config).context("Failed to open license state")?;
    let decision = service
        .check_access()
        .await
        .context("Failed to read license state")?;
    let trial = service
        .trial_info()
        .await
        .context("Failed to read trial state")?;

    Ok(StatusReport {
        machine_id: service.machine_id().to_string(),
        state_file: service.store().path().display().to_string(),
        message: decision.denial_message().map(str::to_string),
        decision,
        trial,
    })
}
