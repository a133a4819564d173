//! AES-128-CTR encryption of the key material.
//!
//! The first 16 bytes of the derived key are the AES key. CTR mode keeps the
//! ciphertext exactly as long as the plaintext.

use aes::Aes128;
use cipher::{KeyIvInit, StreamCipher};
use ctr::Ctr128BE;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Cipher name stored in key files.
pub const AES_128_CTR: &str = "aes-128-ctr";

/// IV length for AES-128-CTR.
pub const IV_LENGTH: usize = 16;

/// AES-128 key length.
pub const AES_KEY_LENGTH: usize = 16;

type Aes128Ctr = Ctr128BE<Aes128>;

/// The `cipherparams` object of a key file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CipherParams {
    /// Initialization vector as hex string
    pub iv: String,
}

impl CipherParams {
    pub fn new(iv: &[u8; IV_LENGTH]) -> Self {
        Self {
            iv: hex::encode(iv),
        }
    }

    /// Decodes and length-checks the IV.
    pub fn iv(&self) -> Result<[u8; IV_LENGTH]> {
        let bytes =
            hex::decode(&self.iv).map_err(|e| Error::malformed(format!("invalid IV hex: {}", e)))?;
        bytes.try_into().map_err(|bytes: Vec<u8>| {
            Error::malformed(format!(
                "IV must be {} bytes, got {}",
                IV_LENGTH,
                bytes.len()
            ))
        })
    }
}

fn apply_keystream(key: &[u8], iv: &[u8; IV_LENGTH], data: &mut [u8]) -> Result<()> {
    let key: [u8; AES_KEY_LENGTH] = key
        .get(..AES_KEY_LENGTH)
        .and_then(|k| k.try_into().ok())
        .ok_or_else(|| {
            Error::malformed(format!(
                "encryption key must be at least {} bytes, got {}",
                AES_KEY_LENGTH,
                key.len()
            ))
        })?;

    let mut cipher = Aes128Ctr::new(&key.into(), &(*iv).into());
    cipher.apply_keystream(data);
    Ok(())
}

/// Encrypts `secret` with the first 16 bytes of `derived_key`.
pub fn encrypt_secret(secret: &[u8], derived_key: &[u8], iv: &[u8; IV_LENGTH]) -> Result<Vec<u8>> {
    let mut ciphertext = secret.to_vec();
    apply_keystream(derived_key, iv, &mut ciphertext)?;
    Ok(ciphertext)
}

/// Decrypts `ciphertext` with the first 16 bytes of `derived_key`.
pub fn decrypt_secret(
    ciphertext: &[u8],
    derived_key: &[u8],
    iv: &[u8; IV_LENGTH],
) -> Result<Zeroizing<Vec<u8>>> {
    let mut plaintext = Zeroizing::new(ciphertext.to_vec());
    apply_keystream(derived_key, iv, &mut plaintext)?;
    Ok(plaintext)
}

/// Fills a fresh IV from the operating system RNG.
pub fn generate_iv() -> Result<[u8; IV_LENGTH]> {
    use rand::RngCore;
    let mut iv = [0u8; IV_LENGTH];
    rand::rngs::OsRng
        .try_fill_bytes(&mut iv)
        .map_err(|e| Error::Entropy(e.to_string()))?;
    Ok(iv)
}
