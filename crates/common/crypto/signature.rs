use ethereum_types::{Address, H512, U256};

use crate::{
    keccak::keccak_hash,
    native::NativeCrypto,
    provider::{Crypto, CryptoError},
    recovery::RecoveryId,
};

/// Order of the secp256k1 group.
pub const SECP256K1_N: U256 = U256([
    0xbfd25e8cd0364141,
    0xbaaedce6af48a03b,
    0xfffffffffffffffe,
    0xffffffffffffffff,
]);

/// `SECP256K1_N / 2`, the largest `s` accepted since EIP-2.
pub const SECP256K1_N_HALF: U256 = U256([
    0xdfe92f46681b20a0,
    0x5d576e7357a4501d,
    0xffffffffffffffff,
    0x7fffffffffffffff,
]);

/// An ECDSA signature together with the y-parity needed to recover the signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub recovery_id: RecoveryId,
    pub r: U256,
    pub s: U256,
}

impl RecoverableSignature {
    pub fn new(recovery_id: RecoveryId, r: U256, s: U256) -> Self {
        Self { recovery_id, r, s }
    }

    /// Checks `r` in `[1, n)` and `s` in `[1, n/2]`.
    pub fn validate(&self) -> Result<(), CryptoError> {
        if self.r.is_zero() || self.r >= SECP256K1_N {
            return Err(CryptoError::InvalidSignature("r out of range"));
        }
        if self.s.is_zero() {
            return Err(CryptoError::InvalidSignature("s out of range"));
        }
        if self.s > SECP256K1_N_HALF {
            return Err(CryptoError::HighS);
        }
        Ok(())
    }

    /// `r || s`, both left padded to 32 bytes.
    pub fn to_compact(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.r.to_big_endian());
        out[32..].copy_from_slice(&self.s.to_big_endian());
        out
    }

    /// `r || s || recovery_id`.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&self.to_compact());
        out[64] = self.recovery_id.to_u8();
        out
    }

    /// Parses `r || s || v`, where `v` is the raw recovery id or the same id plus 27.
    pub fn from_bytes(bytes: &[u8; 65]) -> Result<Self, CryptoError> {
        let v = match bytes[64] {
            v @ (27 | 28) => v - 27,
            v => v,
        };
        Ok(Self {
            recovery_id: RecoveryId::new(v)?,
            r: U256::from_big_endian(&bytes[..32]),
            s: U256::from_big_endian(&bytes[32..64]),
        })
    }
}

/// Last 20 bytes of the Keccak-256 of the public key.
pub fn public_key_to_address(public_key: &H512) -> Address {
    let hash = keccak_hash(public_key.as_bytes());
    Address::from_slice(&hash[12..])
}

pub fn sign(msg: &[u8; 32], private_key: &[u8; 32]) -> Result<RecoverableSignature, CryptoError> {
    NativeCrypto.sign(msg, private_key)
}

pub fn recover_public_key(
    msg: &[u8; 32],
    sig: &RecoverableSignature,
) -> Result<H512, CryptoError> {
    NativeCrypto.recover_public_key(msg, sig)
}

pub fn verify(msg: &[u8; 32], sig: &RecoverableSignature, public_key: &H512) -> bool {
    NativeCrypto.verify(msg, sig, public_key)
}
