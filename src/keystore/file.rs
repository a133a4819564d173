//! Version 3 encrypted key file (Web3 Secret Storage).
//!
//! This combines the KDF, cipher and MAC modules into the JSON document that
//! go-ethereum and most Ethereum tooling read and write.

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;
use zeroize::Zeroizing;

use super::cipher::{decrypt_secret, encrypt_secret, generate_iv, CipherParams, AES_128_CTR};
use super::kdf::{generate_salt, KdfParams, ScryptParams};
use super::mac::{compute_mac, verify_mac, MAC_LENGTH};
use crate::crypto::{Address, Keypair};
use crate::error::{Error, Result};

/// Key file format version.
pub const KEY_FILE_VERSION: u32 = 3;

/// Length of the encrypted secp256k1 secret.
pub const SECRET_LENGTH: usize = 32;

/// A password-protected private key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EncryptedKeyFile {
    /// Lowercase hex address without 0x, readable without decryption
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(alias = "Crypto")]
    pub crypto: CryptoJson,
    pub id: String,
    pub version: u32,
}

/// The `crypto` object: everything needed to decrypt the key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CryptoJson {
    pub cipher: String,
    /// Encrypted secret as hex string
    pub ciphertext: String,
    pub cipherparams: CipherParams,
    pub kdf: String,
    pub kdfparams: KdfParams,
    /// MAC as hex string
    pub mac: String,
}

/// Decoded and checked binary fields of a key file.
struct CheckedFields {
    ciphertext: Vec<u8>,
    iv: [u8; 16],
    mac: Vec<u8>,
    address: Option<Address>,
}

impl EncryptedKeyFile {
    /// Encrypts `keypair` under `password` with scrypt cost `cost`.
    ///
    /// The result is not written anywhere; see [`super::KeyDir`].
    pub fn encrypt(keypair: &Keypair, password: &str, cost: ScryptParams) -> Result<Self> {
        let salt = generate_salt()?;
        let iv = generate_iv()?;

        let kdfparams = KdfParams::scrypt(cost, &salt);
        debug!(
            n = cost.n(),
            r = cost.r,
            p = cost.p,
            "deriving key-file key"
        );
        let derived_key = kdfparams.derive_key(password)?;

        let secret = keypair.private_key_bytes();
        let ciphertext = encrypt_secret(&secret[..], &derived_key, &iv)?;
        let mac = compute_mac(&derived_key, &ciphertext)?;

        Ok(Self {
            address: Some(keypair.address().to_hex()),
            crypto: CryptoJson {
                cipher: AES_128_CTR.to_string(),
                ciphertext: hex::encode(&ciphertext),
                cipherparams: CipherParams::new(&iv),
                kdf: kdfparams.name().to_string(),
                kdfparams,
                mac: hex::encode(mac),
            },
            id: Uuid::new_v4().to_string(),
            version: KEY_FILE_VERSION,
        })
    }

    /// Decrypts the key file with `password`.
    ///
    /// Structure is checked first (`MalformedKeyFile`), then the MAC
    /// (`Authentication`); the plaintext is only interpreted as a scalar
    /// after the MAC has matched.
    pub fn decrypt(&self, password: &str) -> Result<Keypair> {
        let fields = self.check()?;

        debug!(id = %self.id, kdf = %self.crypto.kdf, "decrypting key file");
        let derived_key = self.crypto.kdfparams.derive_key(password)?;
        verify_mac(&derived_key, &fields.ciphertext, &fields.mac)?;

        let plaintext = decrypt_secret(&fields.ciphertext, &derived_key, &fields.iv)?;
        let secret: Zeroizing<[u8; SECRET_LENGTH]> = Zeroizing::new(
            plaintext[..]
                .try_into()
                .map_err(|_| Error::malformed("decrypted key has wrong length"))?,
        );

        let keypair = Keypair::from_secret_key(&secret)
            .map_err(|_| Error::malformed("decrypted key is not a valid secp256k1 scalar"))?;

        if let Some(address) = fields.address {
            if &address != keypair.address() {
                return Err(Error::malformed(format!(
                    "address field {} does not match decrypted key {}",
                    address,
                    keypair.address()
                )));
            }
        }

        Ok(keypair)
    }

    /// Validates every structural field without touching the password.
    fn check(&self) -> Result<CheckedFields> {
        if self.version != KEY_FILE_VERSION {
            return Err(Error::malformed(format!(
                "unsupported version {}",
                self.version
            )));
        }

        let crypto = &self.crypto;
        if crypto.cipher != AES_128_CTR {
            return Err(Error::malformed(format!(
                "unsupported cipher: {}",
                crypto.cipher
            )));
        }
        if crypto.kdf != crypto.kdfparams.name() {
            return Err(Error::malformed(format!(
                "kdf {} does not match its parameters",
                crypto.kdf
            )));
        }
        crypto.kdfparams.validate()?;

        let iv = crypto.cipherparams.iv()?;

        let ciphertext = hex::decode(&crypto.ciphertext)
            .map_err(|e| Error::malformed(format!("invalid ciphertext hex: {}", e)))?;
        if ciphertext.len() != SECRET_LENGTH {
            return Err(Error::malformed(format!(
                "ciphertext must be {} bytes, got {}",
                SECRET_LENGTH,
                ciphertext.len()
            )));
        }

        let mac = hex::decode(&crypto.mac)
            .map_err(|e| Error::malformed(format!("invalid MAC hex: {}", e)))?;
        if mac.len() != MAC_LENGTH {
            return Err(Error::malformed(format!(
                "MAC must be {} bytes, got {}",
                MAC_LENGTH,
                mac.len()
            )));
        }

        let address = self
            .address
            .as_deref()
            .map(|a| a.parse::<Address>())
            .transpose()
            .map_err(|e| Error::malformed(e.to_string()))?;

        Ok(CheckedFields {
            ciphertext,
            iv,
            mac,
            address,
        })
    }

    /// Parses a key file from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::malformed(e.to_string()))
    }

    /// Serializes the key file as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::malformed(e.to_string()))
    }

    /// The cleartext address, if the file carries a valid one.
    pub fn address(&self) -> Option<Address> {
        self.address.as_deref().and_then(|a| a.parse().ok())
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}
