use lexdesk_crypto::CryptoError;

#[test]
fn error_display_seal() {
    let err = CryptoError::Seal("oops".into());
    assert!(format!("{err}").contains("sealing failed"));
}

#[test]
fn error_display_open() {
    let msg = CryptoError::Open.to_string();
    assert!(msg.contains("authentication"));
}

#[test]
fn error_display_malformed() {
    let msg = CryptoError::Malformed("too short".into()).to_string();
    assert!(msg.contains("malformed envelope"));
    assert!(msg.contains("too short"));
}

#[test]
fn error_display_unsupported_format() {
    assert!(CryptoError::UnsupportedFormat(7).to_string().contains('7'));
}

#[test]
fn error_display_invalid_key_length() {
    let err = CryptoError::InvalidKeyLength {
        expected: 32,
        actual: 16,
    };
    let msg = format!("{err}");
    assert!(msg.contains("32"));
    assert!(msg.contains("16"));
}
