//! Recoverable ECDSA signatures over Keccak-256 digests.
//!
//! Signing uses libsecp256k1's RFC 6979 nonce derivation, so signatures are
//! deterministic: the same key and message always produce identical bytes.
//! Verification recovers the signer's public key from the signature and
//! returns the derived address instead of taking a public key as input.

use std::fmt;
use std::str::FromStr;

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1};

use super::{keccak256, Address, Keypair};
use crate::error::{Error, Result};

/// Encoded signature length: r (32) || s (32) || v (1).
pub const SIGNATURE_LENGTH: usize = 65;

/// Offset some encoders add to the recovery id (`v = 27 + id`).
const LEGACY_V_OFFSET: u8 = 27;

/// A secp256k1 signature with its recovery id.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    r: [u8; 32],
    s: [u8; 32],
    /// Recovery id, 0 to 3 (0 or 1 for every signature seen in practice).
    v: u8,
}

impl Signature {
    /// Decodes a 65-byte `r || s || v` signature.
    ///
    /// `v` may be a recovery id 0..=3 or carry the legacy offset of 27; it is
    /// normalized to the bare recovery id.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(Error::InvalidSignature(format!(
                "expected {} bytes, got {}",
                SIGNATURE_LENGTH,
                bytes.len()
            )));
        }

        let v = match bytes[64] {
            v @ 0..=3 => v,
            v @ 27..=30 => v - LEGACY_V_OFFSET,
            other => {
                return Err(Error::InvalidSignature(format!(
                    "invalid recovery id {}",
                    other
                )))
            }
        };

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);

        Ok(Self { r, s, v })
    }

    /// Decodes a hex signature (0x prefix optional).
    pub fn from_hex(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(digits).map_err(|e| Error::InvalidSignature(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Encodes as 65 bytes `r || s || v` with `v` the bare recovery id.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut out = [0u8; SIGNATURE_LENGTH];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    /// Lowercase hex encoding without 0x prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn r(&self) -> &[u8; 32] {
        &self.r
    }

    pub fn s(&self) -> &[u8; 32] {
        &self.s
    }

    pub fn recovery_id(&self) -> u8 {
        self.v
    }

    fn to_recoverable(self) -> Result<RecoverableSignature> {
        let recovery_id = RecoveryId::from_i32(i32::from(self.v))
            .map_err(|e| Error::InvalidSignature(e.to_string()))?;

        let mut compact = [0u8; 64];
        compact[..32].copy_from_slice(&self.r);
        compact[32..].copy_from_slice(&self.s);

        RecoverableSignature::from_compact(&compact, recovery_id)
            .map_err(|e| Error::InvalidSignature(e.to_string()))
    }
}

impl FromStr for Signature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature(0x{})", self.to_hex())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

fn recovery_byte(recovery_id: RecoveryId) -> u8 {
    match recovery_id.to_i32() {
        0 => 0,
        1 => 1,
        2 => 2,
        _ => 3,
    }
}

fn message_digest(message: &[u8]) -> Message {
    Message::from_digest(keccak256(message))
}

/// Signs the Keccak-256 hash of `message` with `keypair`.
pub fn sign(message: &[u8], keypair: &Keypair) -> Signature {
    let secp = Secp256k1::signing_only();
    let digest = message_digest(message);
    let (recovery_id, compact) = secp
        .sign_ecdsa_recoverable(&digest, keypair.secret_key())
        .serialize_compact();

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&compact[..32]);
    s.copy_from_slice(&compact[32..]);

    Signature {
        r,
        s,
        v: recovery_byte(recovery_id),
    }
}

/// Recovers the public key that produced `signature` over `message`.
pub fn recover_public_key(message: &[u8], signature: &Signature) -> Result<PublicKey> {
    let secp = Secp256k1::verification_only();
    let digest = message_digest(message);
    let recoverable = signature.to_recoverable()?;

    secp.recover_ecdsa(&digest, &recoverable)
        .map_err(|e| Error::InvalidSignature(e.to_string()))
}

/// Recovers the signer of `message` and returns its address.
pub fn verify(message: &[u8], signature: &Signature) -> Result<Address> {
    let public_key = recover_public_key(message, signature)?;
    Ok(Address::from_public_key(&public_key))
}

/// Returns true if `signature` over `message` was produced by `expected`.
pub fn verify_address(message: &[u8], signature: &Signature, expected: &Address) -> Result<bool> {
    Ok(verify(message, signature)? == *expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hello_world() -> Vec<u8> {
        b"Hello World!".repeat(6)
    }

    #[test]
    fn test_sign_verify_roundtrip() {
        let keypair = Keypair::generate().unwrap();
        let message = hello_world();

        let signature = sign(&message, &keypair);
        let recovered = verify(&message, &signature).unwrap();

        assert_eq!(&recovered, keypair.address());
    }

    #[test]
    fn test_empty_message() {
        let keypair = Keypair::generate().unwrap();
        let signature = keypair.sign(b"");
        assert_eq!(&verify(b"", &signature).unwrap(), keypair.address());
    }

    #[test]
    fn test_signing_is_deterministic() {
        let keypair = Keypair::generate().unwrap();
        let first = sign(b"payload", &keypair);
        let second = sign(b"payload", &keypair);
        assert_eq!(first.to_bytes(), second.to_bytes());
    }

    #[test]
    fn test_hex_roundtrip_then_verify() {
        let keypair = Keypair::generate().unwrap();
        let message = hello_world();

        let encoded = sign(&message, &keypair).to_hex();
        assert_eq!(encoded.len(), SIGNATURE_LENGTH * 2);

        let decoded = Signature::from_hex(&encoded).unwrap();
        assert_eq!(&verify(&message, &decoded).unwrap(), keypair.address());

        let prefixed: Signature = format!("0x{}", encoded).parse().unwrap();
        assert_eq!(prefixed, decoded);
    }

    #[test]
    fn test_recovery_id_is_low_bit() {
        let keypair = Keypair::generate().unwrap();
        for i in 0..16u8 {
            let signature = sign(&[i], &keypair);
            assert!(signature.recovery_id() <= 1);
        }
    }

    #[test]
    fn test_s_is_low() {
        let keypair = Keypair::generate().unwrap();
        for i in 0..16u8 {
            let signature = sign(&[i], &keypair);
            assert!(signature.s()[0] <= 0x7f);
        }
    }

    #[test]
    fn test_legacy_v_is_normalized() {
        let keypair = Keypair::generate().unwrap();
        let signature = sign(b"legacy", &keypair);

        let mut bytes = signature.to_bytes();
        bytes[64] += 27;

        let decoded = Signature::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, signature);
        assert_eq!(&verify(b"legacy", &decoded).unwrap(), keypair.address());
    }

    #[test]
    fn test_tampered_message_recovers_other_address() {
        let keypair = Keypair::generate().unwrap();
        let signature = sign(b"original", &keypair);

        match verify(b"tampered", &signature) {
            Ok(address) => assert_ne!(&address, keypair.address()),
            Err(e) => assert!(matches!(e, Error::InvalidSignature(_))),
        }
        assert!(!verify_address(b"tampered", &signature, keypair.address()).unwrap_or(false));
        assert!(verify_address(b"original", &signature, keypair.address()).unwrap());
    }

    #[test]
    fn test_every_recovery_id_roundtrips() {
        for id in 0..4 {
            let recovery_id = RecoveryId::from_i32(id).unwrap();
            let v = recovery_byte(recovery_id);
            assert_eq!(i32::from(v), id);

            let mut bytes = [1u8; SIGNATURE_LENGTH];
            bytes[64] = v;
            let decoded = Signature::from_bytes(&bytes).unwrap();
            assert_eq!(decoded.to_bytes(), bytes);

            bytes[64] = v + 27;
            assert_eq!(Signature::from_bytes(&bytes).unwrap(), decoded);
        }
    }

    #[test]
    fn test_invalid_recovery_id() {
        let mut bytes = [1u8; SIGNATURE_LENGTH];
        bytes[64] = 5;
        assert!(matches!(
            Signature::from_bytes(&bytes),
            Err(Error::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_invalid_length() {
        assert!(matches!(
            Signature::from_bytes(&[0u8; 64]),
            Err(Error::InvalidSignature(_))
        ));
        assert!(Signature::from_hex("0xnothex").is_err());
    }

    #[test]
    fn test_zero_signature_fails_recovery() {
        let signature = Signature::from_bytes(&[0u8; SIGNATURE_LENGTH]).unwrap();
        assert!(matches!(
            verify(b"anything", &signature),
            Err(Error::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_overflowing_scalars_rejected() {
        let mut bytes = [0xffu8; SIGNATURE_LENGTH];
        bytes[64] = 0;
        let signature = Signature::from_bytes(&bytes).unwrap();
        assert!(matches!(
            verify(b"anything", &signature),
            Err(Error::InvalidSignature(_))
        ));
    }
}
