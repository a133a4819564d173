//! Password-protected key files.
//!
//! The format is version 3 of the Web3 Secret Storage definition:
//!
//! - scrypt (or, when reading, PBKDF2-HMAC-SHA256) password derivation
//! - AES-128-CTR encryption with the first half of the derived key
//! - Keccak-256 MAC over the second half of the derived key and the ciphertext
//! - JSON serialization with a cleartext address for lookup
//!
//! # Example
//!
//! ```rust,ignore
//! use evm_keystore::keystore::{EncryptedKeyFile, KeyDir, ScryptParams};
//!
//! let keypair = Keypair::generate()?;
//! let file = EncryptedKeyFile::encrypt(&keypair, "password", ScryptParams::STANDARD)?;
//! let path = KeyDir::default().store(&file)?;
//!
//! let restored = KeyDir::default().load(&path)?.decrypt("password")?;
//! ```

mod cipher;
mod file;
mod kdf;
mod mac;
mod store;

pub use cipher::{CipherParams, AES_128_CTR, IV_LENGTH};
pub use file::{CryptoJson, EncryptedKeyFile, KEY_FILE_VERSION};
pub use kdf::{KdfParams, ScryptParams, DKLEN};
pub use mac::compute_mac;
pub use store::{key_file_name, load_key_file, KeyDir, DEFAULT_KEY_DIR, KEY_FILE_PREFIX};
