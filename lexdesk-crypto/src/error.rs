//! Error types for the encryption layer.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors from sealing, opening and key handling.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The AEAD refused to seal the document.
    #[error("sealing failed: {0}")]
    Seal(String),

    /// Wrong key, wrong context, or the envelope was altered.
    #[error("envelope failed authentication")]
    Open,

    /// The text is not an envelope.
    #[error("malformed envelope: {0}")]
    Malformed(String),

    /// The envelope was written in a format this build does not read.
    #[error("unsupported envelope format {0}")]
    UnsupportedFormat(u8),

    /// Invalid key length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },
}
