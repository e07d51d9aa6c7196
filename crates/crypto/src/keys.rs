//! RSA handshake envelope
//!
//! The server holds one RSA key pair. Handshake payloads arrive
//! encrypted under the server's public key; the CONNECT response wraps
//! the freshly generated session key under the *client's* public key.
//!
//! Payloads larger than one RSA block (a CONNECT request carrying a PEM
//! key always is) are chunked: the plaintext is split at the padding
//! limit and each chunk encrypted separately, so the ciphertext is a
//! whole number of key-sized blocks.

use std::fs;
use std::path::Path;

use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use crate::cipher::SymmetricKey;
use crate::error::{CryptoError, Result};

/// Padding scheme for the handshake envelope
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RsaPadding {
    /// RSAES-OAEP with SHA-256 (default)
    #[default]
    Oaep,
    /// RSAES-PKCS1-v1_5 (legacy clients)
    Pkcs1v15,
}

impl RsaPadding {
    /// Padding overhead in bytes for one RSA block
    fn overhead(self) -> usize {
        match self {
            // 2 * SHA-256 digest + 2
            Self::Oaep => 66,
            Self::Pkcs1v15 => 11,
        }
    }
}

/// The server's RSA key pair plus the configured padding scheme
#[derive(Debug, Clone)]
pub struct ServerKeyPair {
    private: RsaPrivateKey,
    public: RsaPublicKey,
    padding: RsaPadding,
}

impl ServerKeyPair {
    /// Load the key pair from PEM files on disk
    ///
    /// The private key may be PKCS#8 or PKCS#1; the public key SPKI or
    /// PKCS#1.
    pub fn load<P: AsRef<Path>>(private_path: P, public_path: P, padding: RsaPadding) -> Result<Self> {
        let private_pem = read_key_file(private_path.as_ref())?;
        let public_pem = read_key_file(public_path.as_ref())?;
        Self::from_pem(&private_pem, &public_pem, padding)
    }

    /// Parse the key pair from PEM strings
    pub fn from_pem(private_pem: &str, public_pem: &str, padding: RsaPadding) -> Result<Self> {
        let private = RsaPrivateKey::from_pkcs8_pem(private_pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(private_pem))
            .map_err(|e| CryptoError::key(format!("invalid private key: {e}")))?;
        let public = parse_public_key_pem(public_pem)?;

        Ok(Self {
            private,
            public,
            padding,
        })
    }

    /// Generate a fresh key pair (tests and first-run setup)
    pub fn generate(bits: usize, padding: RsaPadding) -> Result<Self> {
        let private = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| CryptoError::key(format!("key generation failed: {e}")))?;
        let public = RsaPublicKey::from(&private);
        Ok(Self {
            private,
            public,
            padding,
        })
    }

    /// The server's public key
    pub fn public(&self) -> &RsaPublicKey {
        &self.public
    }

    /// The server's public key as SPKI PEM
    pub fn public_key_pem(&self) -> Result<String> {
        self.public
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::key(format!("failed to encode public key: {e}")))
    }

    /// Decrypt a (possibly chunked) handshake ciphertext
    ///
    /// # Errors
    ///
    /// Returns `DecryptFailed` when the ciphertext is not a whole number
    /// of RSA blocks or any block fails to decrypt.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let block = self.private.size();
        if ciphertext.is_empty() || ciphertext.len() % block != 0 {
            return Err(CryptoError::decrypt_failed(format!(
                "ciphertext length {} is not a multiple of the {block}-byte RSA block",
                ciphertext.len()
            )));
        }

        let mut plaintext = Vec::with_capacity(ciphertext.len());
        for chunk in ciphertext.chunks(block) {
            let part = match self.padding {
                RsaPadding::Oaep => self.private.decrypt(Oaep::new::<Sha256>(), chunk),
                RsaPadding::Pkcs1v15 => self.private.decrypt(Pkcs1v15Encrypt, chunk),
            }
            .map_err(|e| CryptoError::decrypt_failed(e.to_string()))?;
            plaintext.extend_from_slice(&part);
        }
        Ok(plaintext)
    }

    /// Sign data with the server's private key, returning a hex digest
    pub fn sign(&self, data: &[u8]) -> Result<String> {
        let signing_key = SigningKey::<Sha256>::new(self.private.clone());
        let signature = signing_key
            .try_sign(data)
            .map_err(|e| CryptoError::key(format!("signing failed: {e}")))?;
        Ok(hex::encode(signature.to_bytes()))
    }

    /// Round-trip a probe through the pair to catch mismatched key files
    pub fn verify_key_pair(&self) -> bool {
        let probe = b"residue-key-probe";
        match encrypt_for(&self.public, self.padding, probe) {
            Ok(ct) => self.decrypt(&ct).is_ok_and(|pt| pt == probe),
            Err(_) => false,
        }
    }
}

/// Encrypt data under a public key, chunking at the padding limit
pub fn encrypt_for(public: &RsaPublicKey, padding: RsaPadding, data: &[u8]) -> Result<Vec<u8>> {
    let block = public.size();
    let max_chunk = block
        .checked_sub(padding.overhead())
        .ok_or_else(|| CryptoError::key("RSA key too small for padding scheme"))?;

    let mut ciphertext = Vec::with_capacity(data.len().div_ceil(max_chunk).max(1) * block);
    for chunk in data.chunks(max_chunk.max(1)) {
        let part = match padding {
            RsaPadding::Oaep => public.encrypt(&mut OsRng, Oaep::new::<Sha256>(), chunk),
            RsaPadding::Pkcs1v15 => public.encrypt(&mut OsRng, Pkcs1v15Encrypt, chunk),
        }
        .map_err(|e| CryptoError::key(format!("encryption failed: {e}")))?;
        ciphertext.extend_from_slice(&part);
    }
    Ok(ciphertext)
}

/// Wrap a session key under a client's public key
///
/// A 32-byte key always fits one RSA block, so the result is a single
/// block regardless of padding scheme.
pub fn wrap_sym_key(
    public: &RsaPublicKey,
    padding: RsaPadding,
    key: &SymmetricKey,
) -> Result<Vec<u8>> {
    encrypt_for(public, padding, key)
}

/// Verify a hex signature against a public key
///
/// Returns false on any decoding or verification failure; callers that
/// need the error kind use [`CryptoError::BadSignature`].
pub fn verify_signature(data: &[u8], sig_hex: &str, public: &RsaPublicKey) -> bool {
    let Ok(sig_bytes) = hex::decode(sig_hex.trim()) else {
        return false;
    };
    let Ok(signature) = Signature::try_from(sig_bytes.as_slice()) else {
        return false;
    };
    VerifyingKey::<Sha256>::new(public.clone())
        .verify(data, &signature)
        .is_ok()
}

/// Parse a public key from SPKI or PKCS#1 PEM
pub fn parse_public_key_pem(pem: &str) -> Result<RsaPublicKey> {
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|e| CryptoError::key(format!("invalid public key: {e}")))
}

fn read_key_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| CryptoError::KeyIo {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
#[path = "keys_test.rs"]
mod tests;
