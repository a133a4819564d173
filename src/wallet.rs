//! Wallet flows: create, unlock, sign and self-check.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::crypto::{verify, Address, Keypair, Signature};
use crate::error::{Error, Result};
use crate::keystore::{load_key_file, EncryptedKeyFile, KeyDir, ScryptParams};
use crate::password::{read_new_password, PasswordSource};

/// Payload signed by [`self_check`].
pub const SELF_CHECK_MESSAGE: &str =
    "Hello World!Hello World!Hello World!Hello World!Hello World!Hello World!";

/// Password attempts granted to an interactive user.
pub const MAX_PASSWORD_ATTEMPTS: usize = 3;

/// Runs `attempt` until it succeeds, fails with a non-password error, or
/// `attempts` tries are used up.
///
/// Only `PasswordMismatch` and `Authentication` are retried; each retry asks
/// the password source again.
pub fn with_password_retries<T>(
    attempts: usize,
    mut attempt: impl FnMut() -> Result<T>,
) -> Result<T> {
    let mut remaining = attempts.max(1);
    loop {
        match attempt() {
            Err(e) if e.is_retryable_password() && remaining > 1 => {
                remaining -= 1;
                warn!(error = %e, remaining, "password rejected, asking again");
            }
            result => return result,
        }
    }
}

/// An unlocked key and the file it came from.
#[derive(Debug)]
pub struct Wallet {
    keypair: Keypair,
    path: PathBuf,
}

impl Wallet {
    /// Creates a new wallet in `dir`.
    ///
    /// The password is read twice; a mismatch aborts before a key is
    /// generated or any KDF work is done.
    pub fn create(
        dir: &KeyDir,
        passwords: &mut dyn PasswordSource,
        cost: ScryptParams,
    ) -> Result<Self> {
        let password = read_new_password(passwords)?;

        let keypair = Keypair::generate()?;
        let file = EncryptedKeyFile::encrypt(&keypair, &password, cost)?;
        let path = dir.store(&file)?;

        info!(address = %keypair.address(), "created wallet");
        Ok(Self { keypair, path })
    }

    /// Unlocks the oldest key file in `dir`.
    pub fn unlock(dir: &KeyDir, passwords: &mut dyn PasswordSource) -> Result<Self> {
        let (path, file) = dir.load_first()?;
        Self::decrypt(path, &file, passwords)
    }

    /// Unlocks the key file at `path`.
    pub fn open(path: &Path, passwords: &mut dyn PasswordSource) -> Result<Self> {
        let file = load_key_file(path)?;
        Self::decrypt(path.to_path_buf(), &file, passwords)
    }

    fn decrypt(
        path: PathBuf,
        file: &EncryptedKeyFile,
        passwords: &mut dyn PasswordSource,
    ) -> Result<Self> {
        let password = passwords.read_password("Enter wallet password: ")?;
        let keypair = file.decrypt(&password).map_err(|e| {
            warn!(path = %path.display(), error = %e, "could not unlock key file");
            e
        })?;

        info!(address = %keypair.address(), "unlocked wallet");
        Ok(Self { keypair, path })
    }

    pub fn address(&self) -> &Address {
        self.keypair.address()
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    /// Path of the key file backing this wallet.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Signs `data` with the wallet key.
    pub fn sign(&self, data: &[u8]) -> Signature {
        self.keypair.sign(data)
    }
}

/// Outcome of [`self_check`].
#[derive(Debug, Clone)]
pub struct SelfCheck {
    pub address: Address,
    pub signature_hex: String,
    pub recovered: Address,
}

/// Signs [`SELF_CHECK_MESSAGE`], round-trips the signature through hex and
/// recovers the signer, which must be `keypair` itself.
pub fn self_check(keypair: &Keypair) -> Result<SelfCheck> {
    let message = SELF_CHECK_MESSAGE.as_bytes();

    let signature_hex = keypair.sign(message).to_hex();
    let decoded = Signature::from_hex(&signature_hex)?;
    let recovered = verify(message, &decoded)?;

    if &recovered != keypair.address() {
        return Err(Error::InvalidSignature(format!(
            "recovered {} instead of {}",
            recovered,
            keypair.address()
        )));
    }

    Ok(SelfCheck {
        address: *keypair.address(),
        signature_hex,
        recovered,
    })
}
