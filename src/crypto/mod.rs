//! Cryptographic operations for Ethereum keys, addresses and signatures.
//!
//! This module provides:
//! - Secure random key generation using secp256k1
//! - Ethereum address derivation using Keccak-256
//! - Recoverable ECDSA signing and address recovery

mod address;
mod keypair;
mod signature;

use tiny_keccak::{Hasher, Keccak};

pub use address::Address;
pub use keypair::Keypair;
pub use signature::{
    recover_public_key, sign, verify, verify_address, Signature, SIGNATURE_LENGTH,
};

/// Keccak-256 of arbitrary bytes (output 32 bytes).
pub fn keccak256(input: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(input);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}
