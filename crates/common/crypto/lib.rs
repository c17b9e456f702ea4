//! # ethtx-crypto
//!
//! Cryptographic primitives for signing and verifying Ethereum transactions.
//!
//! ## Modules
//!
//! - [`keccak`]: Keccak-256 hash function
//! - [`provider`]: the [`Crypto`](provider::Crypto) backend trait and its error type
//! - [`native`]: libsecp256k1 backend
//! - [`recovery`]: recovery id and wire `v` conversions
//! - [`signature`]: recoverable signatures and curve constants
//!
//! ## Quick Start
//!
//! ```rust
//! use ethereum_types::U256;
//! use ethtx_crypto::keccak::{keccak_hash, Keccak256};
//! use ethtx_crypto::recovery::{encode_v, VEncoding};
//! use ethtx_crypto::signature::{recover_public_key, sign, verify};
//!
//! let digest = keccak_hash(b"hello");
//! let streamed = Keccak256::new().update(b"hel").update(b"lo").finalize();
//! assert_eq!(digest, streamed);
//!
//! let signature = sign(&digest, &[0x46; 32]).unwrap();
//! let public_key = recover_public_key(&digest, &signature).unwrap();
//! assert!(verify(&digest, &signature, &public_key));
//!
//! // EIP-155 `v` for mainnet
//! let mainnet = VEncoding::Eip155 { chain_id: U256::one() };
//! let v = encode_v(signature.recovery_id, mainnet).unwrap();
//! assert!(v == U256::from(37) || v == U256::from(38));
//! ```

pub mod keccak;
pub mod native;
pub mod provider;
pub mod recovery;
pub mod signature;

pub use provider::{Crypto, CryptoError};
pub use recovery::{RecoveryId, VEncoding};
pub use signature::RecoverableSignature;
