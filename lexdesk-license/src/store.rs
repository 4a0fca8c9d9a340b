//! Encrypted on-disk license state.
//!
//! One file per installation holds the [`StateRecord`] as compact JSON,
//! sealed in a ChaCha20-Poly1305 envelope under a key embedded in the
//! binary and written as base64 text. The envelope is bound to the
//! license-state label, so any other LexDesk document sealed under the same
//! material reads as corrupted. Nothing else in the crate touches the file.

use crate::error::{LicenseError, LicenseResult};
use crate::record::StateRecord;
use lexdesk_crypto::{derive_subkey, open_str, seal_str, DerivedKey};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Embedded key material for the state file.
const STATE_KEY_MATERIAL: &[u8] = b"lexdesk/state/9d41c7e0a3f25b86e14c0d7a5b9f3e28";

/// Label bound into the derived state key and into every envelope.
const STATE_KEY_CONTEXT: &str = "lexdesk/license-state/v1";

/// Reads and writes the encrypted state file.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    key: DerivedKey,
}

impl StateStore {
    /// Creates a store for the file at `path`. Nothing is read until
    /// [`load`](Self::load) is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            key: derive_subkey(STATE_KEY_MATERIAL, STATE_KEY_CONTEXT),
        }
    }

    /// Creates a store for `file_name` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>, file_name: &str) -> Self {
        Self::new(dir.as_ref().join(file_name))
    }

    /// Path of the state file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encrypts and writes `record`.
    ///
    /// The ciphertext goes to a sibling temp file which is synced and then
    /// renamed over the target, so a crash never leaves a partial file and
    /// a failed save leaves the previous file untouched.
    pub async fn save(&self, record: &StateRecord) -> LicenseResult<()> {
        let json = serde_json::to_string(record)?;
        let encoded = seal_str(&self.key, STATE_KEY_CONTEXT, &json)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let tmp = self.temp_path();
        if let Err(e) = write_synced(&tmp, encoded.as_bytes()).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!(path = %self.path.display(), "License state saved");
        Ok(())
    }

    /// Reads and decrypts the state file.
    ///
    /// Returns `Ok(None)` if no file exists and `CorruptedState` if it exists
    /// but cannot be decrypted or parsed.
    pub async fn load(&self) -> LicenseResult<Option<StateRecord>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match self.decode(bytes) {
            Ok(record) => Ok(Some(record)),
            Err(reason) => {
                warn!(path = %self.path.display(), "License state is corrupted: {}", reason);
                Err(LicenseError::CorruptedState(reason))
            }
        }
    }

    /// Deletes the state file. A missing file is not an error.
    pub async fn erase(&self) -> LicenseResult<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                info!(path = %self.path.display(), "License state erased");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn decode(&self, bytes: Vec<u8>) -> Result<StateRecord, String> {
        let text = String::from_utf8(bytes).map_err(|_| "file is not text".to_string())?;
        let json = open_str(&self.key, STATE_KEY_CONTEXT, &text).map_err(|e| e.to_string())?;
        serde_json::from_str(&json).map_err(|e| format!("invalid state document: {e}"))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

async fn write_synced(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await
}
