//! Ethereum keypair generation.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use zeroize::Zeroizing;

use super::{Address, Signature};
use crate::error::{Error, Result};

/// Draws at most this many candidates before giving up on the RNG.
const MAX_GENERATION_ATTEMPTS: usize = 16;

/// Represents an Ethereum keypair (private key, public key and derived address).
#[derive(Clone)]
pub struct Keypair {
    secret_key: SecretKey,
    public_key: PublicKey,
    address: Address,
}

impl Keypair {
    /// Generates a new random keypair.
    ///
    /// Draws 32 bytes from the operating system RNG and rejects values
    /// outside `[1, n-1]`, so the scalar is uniform over the curve order.
    pub fn generate() -> Result<Self> {
        let mut candidate = Zeroizing::new([0u8; 32]);

        for _ in 0..MAX_GENERATION_ATTEMPTS {
            OsRng
                .try_fill_bytes(&mut candidate[..])
                .map_err(|e| Error::Entropy(e.to_string()))?;

            if let Ok(secret_key) = SecretKey::from_slice(&candidate[..]) {
                return Ok(Self::from_secret(secret_key));
            }
        }

        Err(Error::Entropy(
            "random source kept producing out-of-range scalars".into(),
        ))
    }

    /// Builds a keypair from an existing secret key.
    pub fn from_secret_key(secret_bytes: &[u8; 32]) -> Result<Self> {
        let secret_key =
            SecretKey::from_slice(secret_bytes).map_err(|_| Error::InvalidSecretKey)?;
        Ok(Self::from_secret(secret_key))
    }

    /// Builds a keypair from a hex-encoded secret key (0x prefix optional).
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self> {
        let digits = secret_hex.trim().trim_start_matches("0x");
        let mut bytes = Zeroizing::new([0u8; 32]);
        hex::decode_to_slice(digits, &mut bytes[..]).map_err(|_| Error::InvalidSecretKey)?;
        Self::from_secret_key(&bytes)
    }

    fn from_secret(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        let address = Address::from_public_key(&public_key);

        Self {
            secret_key,
            public_key,
            address,
        }
    }

    /// Signs `message` with this keypair (Keccak-256 digest, RFC 6979 nonce).
    pub fn sign(&self, message: &[u8]) -> Signature {
        super::sign(message, self)
    }

    /// Returns the private key as a hex string (without 0x prefix).
    pub fn private_key_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.secret_key.secret_bytes()))
    }

    /// Returns the private key bytes.
    pub fn private_key_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.secret_key.secret_bytes())
    }

    pub(crate) fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    /// Returns the public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Returns a reference to the derived address.
    #[inline]
    pub fn address(&self) -> &Address {
        &self.address
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("secret_key", &"[REDACTED]")
            .field("address", &self.address)
            .finish()
    }
}

impl Drop for Keypair {
    fn drop(&mut self) {
        self.secret_key.non_secure_erase();
    }
}
