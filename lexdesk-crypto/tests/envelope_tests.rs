use base64::{engine::general_purpose::STANDARD, Engine};
use lexdesk_crypto::{
    generate_random_key, open_str, seal_str, CryptoError, Envelope, ENVELOPE_FORMAT, NONCE_SIZE,
    TAG_SIZE,
};

const CONTEXT: &str = "lexdesk/license-state/v1";

fn flip_byte(text: &str, index: usize) -> String {
    let mut bytes = STANDARD.decode(text).unwrap();
    bytes[index] ^= 0x01;
    STANDARD.encode(bytes)
}

#[test]
fn seal_open_roundtrip() {
    let key = generate_random_key();
    let plaintext = br#"{"version":1,"license":null}"#;
    let envelope = Envelope::seal(&key, CONTEXT, plaintext).unwrap();
    assert_eq!(envelope.format(), ENVELOPE_FORMAT);
    assert_eq!(envelope.open(&key, CONTEXT).unwrap(), plaintext);
}

#[test]
fn empty_document_roundtrip() {
    let key = generate_random_key();
    let text = Envelope::seal(&key, CONTEXT, b"").unwrap().encode();
    assert_eq!(STANDARD.decode(&text).unwrap().len(), 1 + NONCE_SIZE + TAG_SIZE);
    let opened = Envelope::decode(&text).unwrap().open(&key, CONTEXT).unwrap();
    assert!(opened.is_empty());
}

#[test]
fn wrong_key_fails_to_open() {
    let key = generate_random_key();
    let other = generate_random_key();
    let envelope = Envelope::seal(&key, CONTEXT, b"license state").unwrap();
    assert!(matches!(envelope.open(&other, CONTEXT), Err(CryptoError::Open)));
}

#[test]
fn other_context_fails_to_open() {
    let key = generate_random_key();
    let envelope = Envelope::seal(&key, "lexdesk/preferences/v1", b"{}").unwrap();
    assert!(matches!(envelope.open(&key, CONTEXT), Err(CryptoError::Open)));
}

#[test]
fn tampered_ciphertext_fails_to_open() {
    let key = generate_random_key();
    let text = seal_str(&key, CONTEXT, "license state").unwrap();
    let tampered = flip_byte(&text, 1 + NONCE_SIZE);
    assert!(matches!(open_str(&key, CONTEXT, &tampered), Err(CryptoError::Open)));
}

#[test]
fn tampered_nonce_fails_to_open() {
    let key = generate_random_key();
    let text = seal_str(&key, CONTEXT, "license state").unwrap();
    let tampered = flip_byte(&text, 1);
    assert!(matches!(open_str(&key, CONTEXT, &tampered), Err(CryptoError::Open)));
}

#[test]
fn unknown_format_is_rejected_before_opening() {
    let key = generate_random_key();
    let text = seal_str(&key, CONTEXT, "license state").unwrap();
    let mut bytes = STANDARD.decode(&text).unwrap();
    bytes[0] = 9;
    let err = Envelope::decode(&STANDARD.encode(bytes)).unwrap_err();
    assert!(matches!(err, CryptoError::UnsupportedFormat(9)));
}

#[test]
fn same_document_seals_differently() {
    let key = generate_random_key();
    let a = seal_str(&key, CONTEXT, "same").unwrap();
    let b = seal_str(&key, CONTEXT, "same").unwrap();
    assert_ne!(a, b);
}

#[test]
fn decode_tolerates_trailing_newline() {
    let key = generate_random_key();
    let text = seal_str(&key, CONTEXT, "Data").unwrap();
    assert_eq!(open_str(&key, CONTEXT, &format!("{text}\n")).unwrap(), "Data");
}

#[test]
fn decode_rejects_short_input() {
    let short = STANDARD.encode([ENVELOPE_FORMAT; 10]);
    assert!(matches!(Envelope::decode(&short), Err(CryptoError::Malformed(_))));
}

#[test]
fn decode_rejects_empty_input() {
    assert!(matches!(Envelope::decode(""), Err(CryptoError::Malformed(_))));
}

#[test]
fn decode_rejects_invalid_base64() {
    assert!(matches!(
        Envelope::decode("!!!not-base64!!!"),
        Err(CryptoError::Malformed(_))
    ));
}

#[test]
fn text_roundtrip_keeps_unicode() {
    let key = generate_random_key();
    let plaintext = r#"{"customerName":"Müller & Partner"}"#;
    let text = seal_str(&key, CONTEXT, plaintext).unwrap();
    assert_eq!(open_str(&key, CONTEXT, &text).unwrap(), plaintext);
}
