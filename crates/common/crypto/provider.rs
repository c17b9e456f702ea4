use ethereum_types::{Address, H512};

use crate::signature::RecoverableSignature;

/// Errors from crypto operations. Does not leak backend types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid signature: {0}")]
    InvalidSignature(&'static str),
    #[error("invalid recovery id")]
    InvalidRecoveryId,
    #[error("signature s value is not in the lower half of the curve order")]
    HighS,
    #[error("recovery failed")]
    RecoveryFailed,
    #[error("invalid private key")]
    InvalidPrivateKey,
    #[error("invalid public key")]
    InvalidPublicKey,
}

/// ECDSA over secp256k1, the way transactions and signed messages use it.
///
/// Implementors provide the actual backend. Callers depend only on this trait.
///
/// Methods take `&self` to support `&dyn Crypto` (dynamic dispatch).
/// Implementations are typically zero-sized structs.
///
/// Public keys are the 64-byte uncompressed point without the `0x04` tag.
pub trait Crypto: Send + Sync + core::fmt::Debug {
    /// Signs a 32-byte digest. The returned signature is always low-s.
    fn sign(
        &self,
        msg: &[u8; 32],
        private_key: &[u8; 32],
    ) -> Result<RecoverableSignature, CryptoError>;

    /// Recovers the public key that produced `sig` over `msg`.
    /// Rejects high-s and out-of-range components before recovering.
    fn recover_public_key(
        &self,
        msg: &[u8; 32],
        sig: &RecoverableSignature,
    ) -> Result<H512, CryptoError>;

    /// True only for a well-formed signature by `public_key` over `msg`
    /// whose recovery id recovers that same key.
    fn verify(&self, msg: &[u8; 32], sig: &RecoverableSignature, public_key: &H512) -> bool;

    fn public_key(&self, private_key: &[u8; 32]) -> Result<H512, CryptoError>;

    /// Recover the signer address from a signature + 32-byte message hash.
    fn recover_signer(
        &self,
        msg: &[u8; 32],
        sig: &RecoverableSignature,
    ) -> Result<Address, CryptoError> {
        let public_key = self.recover_public_key(msg, sig)?;
        Ok(crate::signature::public_key_to_address(&public_key))
    }
}
