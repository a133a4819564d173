//! # evm_keystore
//!
//! Encrypted Ethereum keystore with secp256k1 signing.
//!
//! ## Architecture
//!
//! - `crypto`: Key generation, address derivation, signing and recovery
//! - `keystore`: Password-protected key files and the key directory
//! - `password`: Password sources (prompt, file, fixed)
//! - `registry`: Address-to-role classification
//! - `wallet`: Create/unlock/sign flows built on the above
//! - `config`: Command-line configuration

pub mod config;
pub mod crypto;
pub mod error;
pub mod keystore;
pub mod password;
pub mod registry;
pub mod wallet;

pub use config::Config;
pub use crypto::{sign, verify, Address, Keypair, Signature};
pub use error::{Error, Result};
pub use keystore::{EncryptedKeyFile, KeyDir, ScryptParams};
pub use password::{FilePassword, FixedPassword, PasswordSource, PromptPassword};
pub use registry::{classify, NodeKind, Registry};
pub use wallet::{self_check, with_password_retries, Wallet};
