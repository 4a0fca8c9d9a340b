//! Authenticated encryption for LexDesk's local state files.
//!
//! Everything here is symmetric: a 256-bit key derived per purpose, and a
//! ChaCha20-Poly1305 [`Envelope`] whose header (format byte and nonce) is
//! written alongside the ciphertext as base64 text. The purpose label is
//! authenticated with the document, so keys and envelopes for different
//! files cannot be swapped for one another.

mod envelope;
mod error;
mod key;

pub use envelope::{open_str, seal_str, Envelope, ENVELOPE_FORMAT, NONCE_SIZE, TAG_SIZE};
pub use error::{CryptoError, CryptoResult};
pub use key::{derive_subkey, generate_random_key, DerivedKey, KEY_SIZE};
