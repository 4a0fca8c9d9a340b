//! License key derivation and verification.
//!
//! Keys have the shape `XXXX-XXXX-XXXX-XXXX-XXXX`: the first 20 hex
//! characters of `HMAC-SHA256(secret, machine_id)`, uppercased and grouped.
//! The issuer mints keys with [`derive_license_key`]; the device recomputes
//! the same value in [`check_license_key`]. Both sides share this one
//! function so they cannot diverge.
//!
//! The shared secret is compiled into the application. Anyone able to
//! extract it from the binary can mint keys; that is inherent to offline
//! symmetric licensing and is accepted here.

use crate::device::{group, MachineFingerprint};
use crate::error::{LicenseError, LicenseResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Number of key groups.
pub const KEY_GROUPS: usize = 5;

/// Characters per key group.
pub const KEY_GROUP_LEN: usize = 4;

/// Embedded shared secret used by both issuer and device.
const ISSUER_SECRET: &[u8] = b"lexdesk/license/v1/7f3c9a21e5b84d0c96a1f2e8b7d4c630";

/// Derives the license key for `fingerprint` under `secret`.
#[must_use]
pub fn derive_license_key(fingerprint: &str, secret: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret).expect("HMAC-SHA256 accepts keys of any length");
    mac.update(fingerprint.as_bytes());
    let digest = hex::encode_upper(mac.finalize().into_bytes());
    group(&digest[..KEY_GROUPS * KEY_GROUP_LEN], KEY_GROUP_LEN)
}

/// Issuer entry point: mints the key for a machine id with the embedded
/// secret.
#[must_use]
pub fn issue_license_key(fingerprint: &MachineFingerprint) -> String {
    derive_license_key(fingerprint.as_str(), ISSUER_SECRET)
}

/// Checks `candidate` against the key the issuer would mint for
/// `fingerprint` with the embedded secret.
pub fn check_issued_key(candidate: &str, fingerprint: &MachineFingerprint) -> LicenseResult<()> {
    check_license_key(candidate, fingerprint.as_str(), ISSUER_SECRET)
}

/// Returns the embedded shared secret for device-side verification.
pub(crate) fn embedded_secret() -> &'static [u8] {
    ISSUER_SECRET
}

/// Trims and uppercases a user-entered key.
#[must_use]
pub fn normalize_key(candidate: &str) -> String {
    candidate.trim().to_ascii_uppercase()
}

/// Returns true if `candidate` has five dash-separated groups of four
/// ASCII alphanumerics.
#[must_use]
pub fn is_valid_key_format(candidate: &str) -> bool {
    let groups: Vec<&str> = candidate.split('-').collect();
    groups.len() == KEY_GROUPS
        && groups
            .iter()
            .all(|g| g.len() == KEY_GROUP_LEN && g.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Verifies `candidate` against the key derived for `fingerprint`.
///
/// # Errors
///
/// `InvalidKeyFormat` if the key is malformed (the KDF is not run);
/// `MachineMismatch` if it is well-formed but derives differently.
pub fn check_license_key(candidate: &str, fingerprint: &str, secret: &[u8]) -> LicenseResult<()> {
    let candidate = normalize_key(candidate);
    if !is_valid_key_format(&candidate) {
        return Err(LicenseError::InvalidKeyFormat(
            "expected five groups of four letters or digits (XXXX-XXXX-XXXX-XXXX-XXXX)"
                .to_string(),
        ));
    }

    let expected = derive_license_key(fingerprint, secret).replace('-', "");
    let actual = candidate.replace('-', "");
    if bool::from(expected.as_bytes().ct_eq(actual.as_bytes())) {
        Ok(())
    } else {
        Err(LicenseError::MachineMismatch)
    }
}

/// Boolean form of [`check_license_key`].
#[must_use]
pub fn verify_license_key(candidate: &str, fingerprint: &str, secret: &[u8]) -> bool {
    check_license_key(candidate, fingerprint, secret).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_secret_matches_issuer() {
        let fp = MachineFingerprint::from_hostname("workstation-7");
        let key = issue_license_key(&fp);
        assert!(verify_license_key(&key, fp.as_str(), embedded_secret()));
    }

    #[test]
    fn format_rejects_wrong_group_sizes() {
        assert!(!is_valid_key_format("ABCD-EFGH-IJKL-MNOP"));
        assert!(!is_valid_key_format("ABCDE-FGH-IJKL-MNOP-QRST"));
        assert!(!is_valid_key_format("ABCD-EFGH-IJKL-MNOP-QRS!"));
        assert!(is_valid_key_format("ABCD-EFGH-IJKL-MNOP-QRST"));
    }
}
