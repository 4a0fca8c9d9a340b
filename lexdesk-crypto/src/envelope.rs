//! Sealed envelopes for small local state documents.
//!
//! An envelope is `format || nonce || ciphertext`, written as standard
//! base64 text. The format byte and a caller-chosen context label are bound
//! into the ChaCha20-Poly1305 tag as associated data: an envelope sealed for
//! one purpose, or under another format, will not open as another.

use crate::error::{CryptoError, CryptoResult};
use crate::key::DerivedKey;
use base64::{engine::general_purpose::STANDARD, Engine};
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;

/// Envelope format written by this version.
pub const ENVELOPE_FORMAT: u8 = 1;

/// Size of nonce in bytes (96 bits for ChaCha20-Poly1305).
pub const NONCE_SIZE: usize = 12;

/// Size of authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

const HEADER_SIZE: usize = 1 + NONCE_SIZE;

/// A sealed document and the header needed to open it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    format: u8,
    nonce: [u8; NONCE_SIZE],
    ciphertext: Vec<u8>,
}

impl Envelope {
    /// Seals `plaintext` for `context` under a fresh random nonce.
    pub fn seal(key: &DerivedKey, context: &str, plaintext: &[u8]) -> CryptoResult<Self> {
        let mut nonce = [0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut nonce);

        let aad = associated_data(ENVELOPE_FORMAT, context);
        let ciphertext = cipher(key)
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: &aad,
                },
            )
            .map_err(|e| CryptoError::Seal(e.to_string()))?;

        Ok(Self {
            format: ENVELOPE_FORMAT,
            nonce,
            ciphertext,
        })
    }

    /// Opens the envelope, checking it was sealed for `context`.
    pub fn open(&self, key: &DerivedKey, context: &str) -> CryptoResult<Vec<u8>> {
        let aad = associated_data(self.format, context);
        cipher(key)
            .decrypt(
                Nonce::from_slice(&self.nonce),
                Payload {
                    msg: &self.ciphertext,
                    aad: &aad,
                },
            )
            .map_err(|_| CryptoError::Open)
    }

    /// Format byte from the header.
    pub fn format(&self) -> u8 {
        self.format
    }

    /// Base64 text form.
    pub fn encode(&self) -> String {
        let mut bytes = Vec::with_capacity(HEADER_SIZE + self.ciphertext.len());
        bytes.push(self.format);
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.ciphertext);
        STANDARD.encode(bytes)
    }

    /// Parses the text form. Surrounding whitespace is ignored.
    ///
    /// Only the framing is checked here; authenticity is checked by
    /// [`open`](Self::open).
    pub fn decode(text: &str) -> CryptoResult<Self> {
        let bytes = STANDARD
            .decode(text.trim())
            .map_err(|e| CryptoError::Malformed(format!("invalid base64: {e}")))?;

        let Some(&format) = bytes.first() else {
            return Err(CryptoError::Malformed("empty envelope".to_string()));
        };
        if format != ENVELOPE_FORMAT {
            return Err(CryptoError::UnsupportedFormat(format));
        }
        if bytes.len() < HEADER_SIZE + TAG_SIZE {
            return Err(CryptoError::Malformed(format!(
                "envelope too short ({} bytes)",
                bytes.len()
            )));
        }

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&bytes[1..HEADER_SIZE]);
        Ok(Self {
            format,
            nonce,
            ciphertext: bytes[HEADER_SIZE..].to_vec(),
        })
    }
}

/// Seals a UTF-8 document for `context` and returns the text form.
pub fn seal_str(key: &DerivedKey, context: &str, plaintext: &str) -> CryptoResult<String> {
    Ok(Envelope::seal(key, context, plaintext.as_bytes())?.encode())
}

/// Decodes and opens a text envelope sealed by [`seal_str`].
pub fn open_str(key: &DerivedKey, context: &str, text: &str) -> CryptoResult<String> {
    let plaintext = Envelope::decode(text)?.open(key, context)?;
    String::from_utf8(plaintext).map_err(|e| CryptoError::Malformed(format!("invalid UTF-8: {e}")))
}

fn cipher(key: &DerivedKey) -> ChaCha20Poly1305 {
    ChaCha20Poly1305::new(key.as_bytes().into())
}

fn associated_data(format: u8, context: &str) -> Vec<u8> {
    let mut aad = Vec::with_capacity(1 + context.len());
    aad.push(format);
    aad.extend_from_slice(context.as_bytes());
    aad
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::generate_random_key;

    #[test]
    fn associated_data_binds_format_and_context() {
        assert_eq!(associated_data(1, "ab"), vec![1, b'a', b'b']);
        assert_ne!(associated_data(1, "ab"), associated_data(2, "ab"));
    }

    #[test]
    fn encoded_header_carries_format_and_nonce() {
        let key = generate_random_key();
        let envelope = Envelope::seal(&key, "ctx", b"doc").unwrap();
        let bytes = STANDARD.decode(envelope.encode()).unwrap();
        assert_eq!(bytes[0], ENVELOPE_FORMAT);
        assert_eq!(&bytes[1..HEADER_SIZE], &envelope.nonce);
        assert_eq!(bytes.len(), HEADER_SIZE + 3 + TAG_SIZE);
    }

    #[test]
    fn open_rejects_rewritten_format_byte() {
        let key = generate_random_key();
        let mut envelope = Envelope::seal(&key, "ctx", b"doc").unwrap();
        envelope.format = 2;
        assert!(matches!(envelope.open(&key, "ctx"), Err(CryptoError::Open)));
    }
}
