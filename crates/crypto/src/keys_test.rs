//! Tests for the RSA handshake envelope

use std::sync::OnceLock;

use rand::RngCore;
use rand::rngs::OsRng;

use crate::cipher::generate_sym_key;
use crate::error::CryptoError;
use crate::keys::{
    RsaPadding, ServerKeyPair, encrypt_for, parse_public_key_pem, verify_signature, wrap_sym_key,
};

/// Key generation is slow; share one pair across the module
fn keys() -> &'static ServerKeyPair {
    static KEYS: OnceLock<ServerKeyPair> = OnceLock::new();
    KEYS.get_or_init(|| ServerKeyPair::generate(2048, RsaPadding::Oaep).unwrap())
}

#[test]
fn test_round_trip_small() {
    let keys = keys();
    let ct = encrypt_for(keys.public(), RsaPadding::Oaep, b"hello").unwrap();
    assert_eq!(keys.decrypt(&ct).unwrap(), b"hello");
}

#[test]
fn test_round_trip_4kib() {
    let keys = keys();
    let mut payload = vec![0u8; 4096];
    OsRng.fill_bytes(&mut payload);

    let ct = encrypt_for(keys.public(), RsaPadding::Oaep, &payload).unwrap();
    // 2048-bit key, OAEP: 190-byte chunks, each a 256-byte block
    assert_eq!(ct.len() % 256, 0);
    assert_eq!(keys.decrypt(&ct).unwrap(), payload);
}

#[test]
fn test_round_trip_pkcs1v15() {
    let keys = ServerKeyPair::generate(2048, RsaPadding::Pkcs1v15).unwrap();
    let mut payload = vec![0u8; 1024];
    OsRng.fill_bytes(&mut payload);

    let ct = encrypt_for(keys.public(), RsaPadding::Pkcs1v15, &payload).unwrap();
    assert_eq!(keys.decrypt(&ct).unwrap(), payload);
}

#[test]
fn test_misaligned_ciphertext_rejected() {
    let keys = keys();
    let mut ct = encrypt_for(keys.public(), RsaPadding::Oaep, b"probe").unwrap();
    ct.pop();

    assert!(matches!(
        keys.decrypt(&ct),
        Err(CryptoError::DecryptFailed(_))
    ));
}

#[test]
fn test_wrap_sym_key_round_trip() {
    let keys = keys();
    let sym = generate_sym_key();

    let wrapped = wrap_sym_key(keys.public(), RsaPadding::Oaep, &sym).unwrap();
    assert_eq!(wrapped.len(), 256);
    assert_eq!(keys.decrypt(&wrapped).unwrap(), sym);
}

#[test]
fn test_sign_verify() {
    let keys = keys();
    let sig = keys.sign(b"attested payload").unwrap();

    assert!(verify_signature(b"attested payload", &sig, keys.public()));
}

#[test]
fn test_verify_rejects_flipped_message_bit() {
    let keys = keys();
    let sig = keys.sign(b"attested payload").unwrap();

    assert!(!verify_signature(b"bttested payload", &sig, keys.public()));
}

#[test]
fn test_verify_rejects_tampered_signature() {
    let keys = keys();
    let mut sig = keys.sign(b"attested payload").unwrap().into_bytes();
    // Flip one hex digit
    sig[0] = if sig[0] == b'0' { b'1' } else { b'0' };
    let sig = String::from_utf8(sig).unwrap();

    assert!(!verify_signature(b"attested payload", &sig, keys.public()));
}

#[test]
fn test_verify_rejects_garbage_hex() {
    let keys = keys();
    assert!(!verify_signature(b"data", "not-hex-at-all", keys.public()));
    assert!(!verify_signature(b"data", "abcd", keys.public()));
}

#[test]
fn test_public_key_pem_round_trip() {
    let keys = keys();
    let pem = keys.public_key_pem().unwrap();

    let parsed = parse_public_key_pem(&pem).unwrap();
    assert_eq!(&parsed, keys.public());
}

#[test]
fn test_verify_key_pair() {
    assert!(keys().verify_key_pair());
}

#[test]
fn test_mismatched_pair_fails_probe() {
    use rsa::pkcs8::EncodePrivateKey;

    let unrelated = rsa::RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
    let unrelated_pem = unrelated
        .to_pkcs8_pem(rsa::pkcs8::LineEnding::LF)
        .unwrap()
        .to_string();

    let mismatched = ServerKeyPair::from_pem(
        &unrelated_pem,
        &keys().public_key_pem().unwrap(),
        RsaPadding::Oaep,
    )
    .unwrap();
    assert!(!mismatched.verify_key_pair());
}
