//! Key-file MAC: `keccak256(derived_key[16..32] || ciphertext)`.
//!
//! The MAC binds the second half of the derived key to the ciphertext, so a
//! wrong password and a modified ciphertext are both caught before anything
//! is decrypted.

use crate::crypto::keccak256;
use crate::error::{Error, Result};

/// MAC length in bytes.
pub const MAC_LENGTH: usize = 32;

/// Computes the MAC over `derived_key[16..32] || ciphertext`.
pub fn compute_mac(derived_key: &[u8], ciphertext: &[u8]) -> Result<[u8; MAC_LENGTH]> {
    let mac_key = derived_key.get(16..32).ok_or_else(|| {
        Error::malformed(format!(
            "derived key must be at least 32 bytes, got {}",
            derived_key.len()
        ))
    })?;

    let mut preimage = Vec::with_capacity(mac_key.len() + ciphertext.len());
    preimage.extend_from_slice(mac_key);
    preimage.extend_from_slice(ciphertext);
    Ok(keccak256(&preimage))
}

/// Verifies `expected` against the recomputed MAC.
///
/// Returns `Error::Authentication` on mismatch.
pub fn verify_mac(derived_key: &[u8], ciphertext: &[u8], expected: &[u8]) -> Result<()> {
    let computed = compute_mac(derived_key, ciphertext)?;
    if constant_time_eq(&computed, expected) {
        Ok(())
    } else {
        Err(Error::Authentication)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
