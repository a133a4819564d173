//! Error types shared by the keystore, signer and storage layers.

use std::path::PathBuf;

/// Errors produced by key generation, key-file handling and signing.
///
/// Cryptographic failures and I/O failures are kept in separate variants so
/// callers can retry a read without ever silently retrying a password.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The operating system random source could not be read.
    #[error("entropy source unavailable: {0}")]
    Entropy(String),

    /// The password and its confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// A password source produced an empty password.
    #[error("password is empty")]
    EmptyPassword,

    /// MAC verification failed: wrong password or tampered key file.
    #[error("could not decrypt key with given password")]
    Authentication,

    /// The key file is structurally invalid or uses unsupported parameters.
    #[error("malformed key file: {0}")]
    MalformedKeyFile(String),

    /// A signature could not be decoded or recovered.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// The bytes are not a valid secp256k1 secret scalar.
    #[error("invalid secret key")]
    InvalidSecretKey,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// No key file was found in the key directory.
    #[error("no key file found in {0}")]
    NoKeyFile(PathBuf),

    #[error("key file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("invalid registry: {0}")]
    Registry(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns true if prompting for the password again may succeed.
    pub fn is_retryable_password(&self) -> bool {
        matches!(self, Error::PasswordMismatch | Error::Authentication)
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedKeyFile(msg.into())
    }
}

/// Result alias for keystore operations.
pub type Result<T> = std::result::Result<T, Error>;
