//! Low-level recoverable ECDSA over secp256k1.
//!
//! Signatures are the Ethereum-style `(r, s, v)` triple: two 32-byte scalars
//! plus a recovery byte, over a keccak256 digest. Signing normalizes `s` to
//! the lower half of the curve order; verification rejects high-S values so
//! a third party cannot mint a second valid encoding of the same signature.

use std::fmt;

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use subtle::{Choice, ConstantTimeEq};

use crate::errors::NotaryError;

/// secp256k1 curve order `n`.
const SECP256K1_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFE, 0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36,
    0x41, 0x41,
];

/// `n / 2`, the boundary for low-S normalization.
const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B,
    0x20, 0xA0,
];

/// A 32-byte keccak256 digest.
pub type Digest32 = [u8; 32];

/// Recoverable signature components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RsvSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    /// Recovery byte; emitted as 27/28, accepted as 0/1/27/28.
    pub v: u8,
}

impl RsvSignature {
    /// Packs the signature as `r || s || v` (65 bytes).
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, NotaryError> {
        if bytes.len() != 65 {
            return Err(NotaryError::InvalidComponent("signature must be 65 bytes"));
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { r, s, v: bytes[64] })
    }
}

/// A 20-byte Ethereum-style signer address.
///
/// Parsing accepts any hex casing (with or without a `0x` prefix), so
/// comparisons between stored and recovered addresses are effectively
/// case-insensitive.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn from_hex(text: &str) -> Result<Self, NotaryError> {
        let stripped = text.strip_prefix("0x").unwrap_or(text);
        let raw = hex::decode(stripped)
            .map_err(|_| NotaryError::InvalidComponent("address is not valid hex"))?;
        if raw.len() != 20 {
            return Err(NotaryError::InvalidComponent("address must be 20 bytes"));
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&raw);
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Address::from_hex(&text).map_err(D::Error::custom)
    }
}

/// Keccak256 hash function.
pub fn keccak256(data: &[u8]) -> Digest32 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Derive the Ethereum-style address of a public key: the last 20 bytes of
/// the keccak256 hash of the uncompressed point without its `0x04` prefix.
pub fn address_of(public_key: &VerifyingKey) -> Address {
    let point = public_key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    Address(address)
}

/// Sign a digest, normalizing the result to low-S.
pub fn sign_digest(digest: &Digest32, key: &SigningKey) -> Result<RsvSignature, NotaryError> {
    let (sig, recid) = key
        .sign_prehash_recoverable(digest)
        .map_err(|_| NotaryError::SigningFailed)?;

    let sig_bytes = sig.to_bytes();
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&sig_bytes[..32]);
    s.copy_from_slice(&sig_bytes[32..]);

    // Normalize S to the lower half of the order; flipping S flips the
    // recovery parity with it.
    let v = if is_low_s(&s) {
        recid.to_byte() + 27
    } else {
        s = invert_s(&s);
        if recid.to_byte() == 0 {
            28
        } else {
            27
        }
    };

    Ok(RsvSignature { r, s, v })
}

/// Recover the signer address of a digest from its signature.
///
/// Rejects out-of-range scalars and non-canonical high-S encodings before
/// attempting recovery.
pub fn recover_signer(digest: &Digest32, signature: &RsvSignature) -> Result<Address, NotaryError> {
    if !is_valid_scalar(&signature.r) {
        return Err(NotaryError::InvalidComponent("r out of range"));
    }
    if !is_valid_scalar(&signature.s) {
        return Err(NotaryError::InvalidComponent("s out of range"));
    }
    if !is_low_s(&signature.s) {
        return Err(NotaryError::InvalidComponent("non-canonical high-S"));
    }

    let recovery_id = parse_recovery_id(signature.v)?;

    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&signature.r);
    sig_bytes[32..].copy_from_slice(&signature.s);
    let sig = Signature::from_slice(&sig_bytes)
        .map_err(|_| NotaryError::InvalidComponent("unparseable r/s pair"))?;

    let recovered = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|_| NotaryError::RecoveryFailed)?;

    Ok(address_of(&recovered))
}

/// Constant-time strict comparison `s < n/2`.
fn is_low_s(s: &[u8; 32]) -> bool {
    let mut less = Choice::from(0u8);
    let mut greater = Choice::from(0u8);

    for i in 0..32 {
        let not_decided = !(less | greater);
        let byte_less = Choice::from((s[i] < SECP256K1_HALF_ORDER[i]) as u8);
        let byte_greater = Choice::from((s[i] > SECP256K1_HALF_ORDER[i]) as u8);
        less |= not_decided & byte_less;
        greater |= not_decided & byte_greater;
    }

    less.into()
}

/// Constant-time check that a scalar lies in `[1, n-1]`.
fn is_valid_scalar(scalar: &[u8; 32]) -> bool {
    let mut is_zero = Choice::from(1u8);
    for &byte in scalar {
        is_zero &= byte.ct_eq(&0u8);
    }

    let mut less = Choice::from(0u8);
    let mut greater = Choice::from(0u8);
    for i in 0..32 {
        let not_decided = !(less | greater);
        let byte_less = Choice::from((scalar[i] < SECP256K1_ORDER[i]) as u8);
        let byte_greater = Choice::from((scalar[i] > SECP256K1_ORDER[i]) as u8);
        less |= not_decided & byte_less;
        greater |= not_decided & byte_greater;
    }

    bool::from(!is_zero & less)
}

fn parse_recovery_id(v: u8) -> Result<RecoveryId, NotaryError> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        other => return Err(NotaryError::InvalidRecoveryId(other)),
    };
    RecoveryId::try_from(id).map_err(|_| NotaryError::InvalidRecoveryId(v))
}

/// `s' = n - s`, the mirrored S value. Exposed for malleability tests.
pub fn invert_s(s: &[u8; 32]) -> [u8; 32] {
    let mut result = [0u8; 32];
    let mut borrow: i32 = 0;

    for i in (0..32).rev() {
        let diff = (SECP256K1_ORDER[i] as i32) - (s[i] as i32) - borrow;
        if diff < 0 {
            result[i] = (diff + 256) as u8;
            borrow = 1;
        } else {
            result[i] = diff as u8;
            borrow = 0;
        }
    }

    result
}
