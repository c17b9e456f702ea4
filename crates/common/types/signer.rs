use ethereum_types::{Address, H256, H512};
use ethtx_crypto::{CryptoError, RecoverableSignature, signature::public_key_to_address};
use secp256k1::{SECP256K1, SecretKey};

/// Anything able to sign a 32-byte hash: a local key, a hardware device, a
/// remote service. Implemented for closures so callers can plug in their own.
pub trait HashSigner {
    fn sign_hash(&self, hash: &H256) -> Result<RecoverableSignature, SignerError>;
}

impl<F> HashSigner for F
where
    F: Fn(&H256) -> Result<RecoverableSignature, SignerError>,
{
    fn sign_hash(&self, hash: &H256) -> Result<RecoverableSignature, SignerError> {
        self(hash)
    }
}

#[derive(Clone, Debug)]
pub struct LocalSigner {
    private_key: SecretKey,
    pub public_key: H512,
    pub address: Address,
}

impl LocalSigner {
    pub fn new(private_key: SecretKey) -> Self {
        let public_key = H512::from_slice(
            &private_key.public_key(SECP256K1).serialize_uncompressed()[1..],
        );
        Self {
            private_key,
            public_key,
            address: public_key_to_address(&public_key),
        }
    }

    pub fn from_slice(private_key: &[u8]) -> Result<Self, SignerError> {
        SecretKey::from_slice(private_key)
            .map(Self::new)
            .map_err(|_| SignerError::InvalidPrivateKey)
    }

    /// Parses a 0x prefixed (or bare) hex private key.
    pub fn from_hex(private_key: &str) -> Result<Self, SignerError> {
        let bytes = hex::decode(private_key.trim().trim_start_matches("0x"))
            .map_err(|e| SignerError::ParseError(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl HashSigner for LocalSigner {
    fn sign_hash(&self, hash: &H256) -> Result<RecoverableSignature, SignerError> {
        Ok(ethtx_crypto::signature::sign(
            &hash.0,
            &self.private_key.secret_bytes(),
        )?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignerError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Failed to parse value: {0}")]
    ParseError(String),
    #[error("Signing failed: {0}")]
    Crypto(#[from] CryptoError),
    #[error("{0}")]
    Custom(String),
}
