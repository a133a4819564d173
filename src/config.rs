//! Command-line configuration for the keystore tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::crypto::{Address, Signature};
use crate::keystore::{ScryptParams, DEFAULT_KEY_DIR};
use crate::password::PASSWORD_FILE_NAME;

/// Encrypted Ethereum keystore
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Directory holding UTC--* key files
    #[arg(short, long, default_value = DEFAULT_KEY_DIR, global = true)]
    pub keystore: PathBuf,

    /// Read the password from this file instead of prompting
    /// (default: <keystore>/password.txt when it exists)
    #[arg(short = 'P', long, global = true)]
    pub password_file: Option<PathBuf>,

    /// Log level: trace, debug, info, warn or error (RUST_LOG takes precedence)
    #[arg(short, long, default_value = "warn", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generate a new key and store it encrypted
    New {
        /// Use light scrypt parameters (n = 4096, p = 6)
        #[arg(long, default_value = "false")]
        light: bool,
    },

    /// Unlock the wallet and print its address
    Address {
        /// Key file to open (default: oldest key file in the keystore)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Sign a message with the wallet key
    Sign {
        /// Message to sign (UTF-8)
        message: String,

        /// Key file to open (default: oldest key file in the keystore)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Recover the signer address of a message
    Verify {
        /// Signed message (UTF-8)
        message: String,

        /// 65-byte hex signature (r || s || v)
        signature: String,

        /// Fail unless the signer is this address
        #[arg(short, long)]
        expect: Option<String>,
    },

    /// Unlock the wallet and run a sign/recover self-check
    Check,

    /// Classify an address against a registry file
    Kind {
        /// Address to classify
        address: String,

        /// Registry JSON file
        #[arg(short, long)]
        registry: PathBuf,
    },
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(
            self.log_level.to_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            return Err(ConfigError::InvalidLogLevel(self.log_level.clone()));
        }

        match &self.command {
            Command::Verify {
                signature, expect, ..
            } => {
                signature
                    .parse::<Signature>()
                    .map_err(|e| ConfigError::InvalidSignature(e.to_string()))?;
                if let Some(expect) = expect {
                    expect
                        .parse::<Address>()
                        .map_err(|e| ConfigError::InvalidAddress(e.to_string()))?;
                }
            }
            Command::Kind { registry, .. } => {
                if !registry.is_file() {
                    return Err(ConfigError::MissingFile(registry.clone()));
                }
            }
            Command::New { .. } | Command::Address { .. } | Command::Sign { .. } | Command::Check => {}
        }

        if let Some(ref path) = self.password_file {
            if !path.is_file() {
                return Err(ConfigError::MissingFile(path.clone()));
            }
        }

        Ok(())
    }

    /// Returns the password file to read, if any.
    ///
    /// An explicit `--password-file` wins; otherwise `password.txt` in the
    /// key directory is used when present.
    pub fn resolved_password_file(&self) -> Option<PathBuf> {
        if let Some(ref path) = self.password_file {
            return Some(path.clone());
        }
        let fallback = self.keystore.join(PASSWORD_FILE_NAME);
        fallback.is_file().then_some(fallback)
    }

    /// Returns the scrypt cost for new key files.
    pub fn scrypt_params(&self) -> ScryptParams {
        match self.command {
            Command::New { light: true } => ScryptParams::LIGHT,
            _ => ScryptParams::STANDARD,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("File not found: {}", .0.display())]
    MissingFile(PathBuf),
}
