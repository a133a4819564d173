//! Password-based key derivation for key files.
//!
//! New key files always use scrypt. PBKDF2-HMAC-SHA256 key files written by
//! other tools are accepted on decryption.

use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Derived key length in bytes: 16 for AES-128, 16 for the MAC key.
pub const DKLEN: usize = 32;

/// Salt length in bytes for newly written key files.
pub const SALT_LENGTH: usize = 32;

/// Largest accepted scrypt cost exponent (n = 2^24, 16 GiB at r = 8).
pub const MAX_LOG_N: u8 = 24;

/// Largest accepted scrypt working memory, `128 * r * n` bytes (16 GiB).
pub const MAX_SCRYPT_MEMORY: u64 = 1 << 34;

/// Largest accepted scrypt parallelization.
pub const MAX_SCRYPT_P: u32 = 16;

/// Largest accepted PBKDF2 iteration count.
pub const MAX_PBKDF2_ROUNDS: u32 = 1 << 24;

const MAX_DKLEN: u32 = 64;

pub const SCRYPT: &str = "scrypt";
pub const PBKDF2: &str = "pbkdf2";
const PRF_HMAC_SHA256: &str = "hmac-sha256";

/// scrypt cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScryptParams {
    /// log2 of the CPU/memory cost `n`
    pub log_n: u8,
    /// Block size
    pub r: u32,
    /// Parallelization
    pub p: u32,
}

impl ScryptParams {
    /// n = 2^18, r = 8, p = 1: about 256 MB and one second per derivation.
    pub const STANDARD: Self = Self::new(18, 8, 1);

    /// n = 2^12, r = 8, p = 6: about 4 MB and a few milliseconds.
    pub const LIGHT: Self = Self::new(12, 8, 6);

    pub const fn new(log_n: u8, r: u32, p: u32) -> Self {
        Self { log_n, r, p }
    }

    /// Returns the cost parameter `n`.
    pub fn n(&self) -> u32 {
        1u32 << self.log_n
    }
}

impl Default for ScryptParams {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// The `kdfparams` object of a key file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum KdfParams {
    Scrypt {
        dklen: u32,
        n: u32,
        p: u32,
        r: u32,
        /// Salt as hex string
        salt: String,
    },
    Pbkdf2 {
        /// Iteration count
        c: u32,
        dklen: u32,
        prf: String,
        salt: String,
    },
}

impl KdfParams {
    /// Creates scrypt parameters for a new key file.
    pub fn scrypt(cost: ScryptParams, salt: &[u8]) -> Self {
        KdfParams::Scrypt {
            dklen: DKLEN as u32,
            n: cost.n(),
            p: cost.p,
            r: cost.r,
            salt: hex::encode(salt),
        }
    }

    /// The `kdf` name these parameters belong to.
    pub fn name(&self) -> &'static str {
        match self {
            KdfParams::Scrypt { .. } => SCRYPT,
            KdfParams::Pbkdf2 { .. } => PBKDF2,
        }
    }

    /// Checks the parameters without running the KDF.
    pub fn validate(&self) -> Result<()> {
        self.checked_salt().map(|_| ())?;
        match self {
            KdfParams::Scrypt { dklen, n, p, r, .. } => {
                check_dklen(*dklen)?;
                scrypt_params(*n, *r, *p, *dklen).map(|_| ())
            }
            KdfParams::Pbkdf2 { c, dklen, prf, .. } => {
                check_dklen(*dklen)?;
                if prf != PRF_HMAC_SHA256 {
                    return Err(Error::malformed(format!("unsupported PBKDF2 PRF: {}", prf)));
                }
                if *c == 0 || *c > MAX_PBKDF2_ROUNDS {
                    return Err(Error::malformed(format!(
                        "PBKDF2 iteration count must be between 1 and {}, got {}",
                        MAX_PBKDF2_ROUNDS, c
                    )));
                }
                Ok(())
            }
        }
    }

    /// Derives the key-file key from `password`.
    pub fn derive_key(&self, password: &str) -> Result<Zeroizing<Vec<u8>>> {
        self.validate()?;
        let salt = self.checked_salt()?;

        match self {
            KdfParams::Scrypt { dklen, n, p, r, .. } => {
                let params = scrypt_params(*n, *r, *p, *dklen)?;
                let mut output = Zeroizing::new(vec![0u8; *dklen as usize]);
                scrypt::scrypt(password.as_bytes(), &salt, &params, &mut output)
                    .map_err(|e| Error::malformed(format!("scrypt: {}", e)))?;
                Ok(output)
            }
            KdfParams::Pbkdf2 { c, dklen, .. } => {
                let mut output = Zeroizing::new(vec![0u8; *dklen as usize]);
                pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, *c, &mut output);
                Ok(output)
            }
        }
    }

    fn salt(&self) -> &str {
        match self {
            KdfParams::Scrypt { salt, .. } | KdfParams::Pbkdf2 { salt, .. } => salt,
        }
    }

    fn checked_salt(&self) -> Result<Vec<u8>> {
        let salt = hex::decode(self.salt())
            .map_err(|e| Error::malformed(format!("invalid salt hex: {}", e)))?;
        if salt.is_empty() {
            return Err(Error::malformed("salt is empty"));
        }
        Ok(salt)
    }
}

fn check_dklen(dklen: u32) -> Result<()> {
    if !(DKLEN as u32..=MAX_DKLEN).contains(&dklen) {
        return Err(Error::malformed(format!(
            "dklen must be between {} and {}, got {}",
            DKLEN, MAX_DKLEN, dklen
        )));
    }
    Ok(())
}

fn scrypt_params(n: u32, r: u32, p: u32, dklen: u32) -> Result<scrypt::Params> {
    if n < 2 || !n.is_power_of_two() {
        return Err(Error::malformed(format!(
            "scrypt n must be a power of two greater than 1, got {}",
            n
        )));
    }
    let log_n = n.trailing_zeros() as u8;
    if log_n > MAX_LOG_N {
        return Err(Error::malformed(format!(
            "scrypt n = 2^{} exceeds the supported maximum 2^{}",
            log_n, MAX_LOG_N
        )));
    }
    if r == 0 || p == 0 {
        return Err(Error::malformed("scrypt r and p must be positive"));
    }
    if p > MAX_SCRYPT_P {
        return Err(Error::malformed(format!(
            "scrypt p = {} exceeds the supported maximum {}",
            p, MAX_SCRYPT_P
        )));
    }
    let memory = 128 * u64::from(r) * u64::from(n);
    if memory > MAX_SCRYPT_MEMORY {
        return Err(Error::malformed(format!(
            "scrypt needs {} bytes of memory, more than the supported {}",
            memory, MAX_SCRYPT_MEMORY
        )));
    }

    scrypt::Params::new(log_n, r, p, dklen as usize)
        .map_err(|e| Error::malformed(format!("invalid scrypt parameters: {}", e)))
}

/// Fills a fresh salt from the operating system RNG.
pub fn generate_salt() -> Result<[u8; SALT_LENGTH]> {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::rngs::OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| Error::Entropy(e.to_string()))?;
    Ok(salt)
}
