//! Tests for the symmetric frame cipher

use rand::RngCore;
use rand::rngs::OsRng;

use crate::cipher::{SymmetricFrame, encrypt_for_client, encrypt_with_iv, generate_sym_key};
use crate::error::CryptoError;

#[test]
fn test_round_trip() {
    let key = generate_sym_key();
    let frame = encrypt_for_client("c1", &key, b"{\"msg\":\"hello\"}");

    let parsed = SymmetricFrame::parse(frame.as_bytes()).unwrap();
    assert_eq!(parsed.client_id, "c1");
    assert_eq!(parsed.decrypt(&key).unwrap(), b"{\"msg\":\"hello\"}");
}

#[test]
fn test_round_trip_large_payload() {
    let key = generate_sym_key();
    let mut payload = vec![0u8; 4096];
    OsRng.fill_bytes(&mut payload);

    let frame = encrypt_for_client("bulk-sender", &key, &payload);
    let parsed = SymmetricFrame::parse(frame.as_bytes()).unwrap();
    assert_eq!(parsed.decrypt(&key).unwrap(), payload);
}

#[test]
fn test_fresh_iv_per_frame() {
    let key = generate_sym_key();
    let a = encrypt_for_client("c1", &key, b"same plaintext");
    let b = encrypt_for_client("c1", &key, b"same plaintext");
    assert_ne!(a, b);
}

#[test]
fn test_parse_rejects_missing_parts() {
    for bad in ["", "c1", "c1:00112233445566778899aabbccddeeff"] {
        let err = SymmetricFrame::parse(bad.as_bytes()).unwrap_err();
        assert!(matches!(err, CryptoError::BadFrame(_)), "payload: {bad}");
    }
}

#[test]
fn test_parse_rejects_empty_client_id() {
    let err = SymmetricFrame::parse(b":00112233445566778899aabbccddeeff:AAAA").unwrap_err();
    assert!(matches!(err, CryptoError::BadFrame(_)));
}

#[test]
fn test_parse_rejects_bad_iv() {
    // Not hex
    let err = SymmetricFrame::parse(b"c1:zz112233445566778899aabbccddeeff:AAAA").unwrap_err();
    assert!(matches!(err, CryptoError::BadFrame(_)));

    // Wrong length
    let err = SymmetricFrame::parse(b"c1:0011:AAAA").unwrap_err();
    assert!(matches!(err, CryptoError::BadFrame(_)));
}

#[test]
fn test_parse_rejects_bad_base64() {
    let err =
        SymmetricFrame::parse(b"c1:00112233445566778899aabbccddeeff:!!not-base64!!").unwrap_err();
    assert!(matches!(err, CryptoError::BadFrame(_)));
}

#[test]
fn test_truncated_ciphertext_is_bad_padding() {
    let key = generate_sym_key();
    let frame = encrypt_for_client("c1", &key, b"some plaintext that spans blocks....");

    let mut parsed = SymmetricFrame::parse(frame.as_bytes()).unwrap();
    parsed.ciphertext.truncate(parsed.ciphertext.len() - 5);

    assert!(matches!(
        parsed.decrypt(&key),
        Err(CryptoError::BadPadding)
    ));
}

#[test]
fn test_tampered_iv_corrupts_first_block_only() {
    let key = generate_sym_key();
    let iv = [7u8; 16];
    let plaintext = b"block one here..block two here..";
    let frame = encrypt_with_iv("c1", &key, &iv, plaintext);

    let mut parsed = SymmetricFrame::parse(frame.as_bytes()).unwrap();
    parsed.iv[0] ^= 0xff;

    // Padding stays intact; the deciphered first block differs
    let deciphered = parsed.decrypt(&key).unwrap();
    assert_eq!(deciphered.len(), plaintext.len());
    assert_ne!(&deciphered[..16], &plaintext[..16]);
    assert_eq!(&deciphered[16..], &plaintext[16..]);
}
