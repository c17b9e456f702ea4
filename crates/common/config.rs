use ethereum_types::U256;
use serde::Deserialize;

use crate::types::{LocalSigner, SignerError};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Error deserializing config from env: {err}. From config: {from:?}")]
    ConfigDeserializationError { err: envy::Error, from: String },
    #[error("Error building signer from config: {0}")]
    SignerError(#[from] SignerError),
}

fn default_chain_id() -> u64 {
    1
}

fn default_hardfork_eip155() -> bool {
    true
}

/// Settings handed to the signing collaborators. Read from `ETHTX_*`
/// variables, e.g. `ETHTX_PRIVATE_KEY`, `ETHTX_CHAIN_ID`.
#[derive(Deserialize, Debug, Clone)]
pub struct SignerConfig {
    /// Hex encoded, with or without `0x`.
    pub private_key: String,
    /// Applied to requests that do not name a chain.
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Whether legacy requests get EIP-155 replay protection.
    #[serde(default = "default_hardfork_eip155")]
    pub hardfork_eip155: bool,
}

impl SignerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        envy::prefixed("ETHTX_").from_env::<Self>().map_err(|e| {
            ConfigError::ConfigDeserializationError {
                err: e,
                from: "SignerConfig".to_string(),
            }
        })
    }

    pub fn chain_id(&self) -> U256 {
        U256::from(self.chain_id)
    }

    pub fn signer(&self) -> Result<LocalSigner, ConfigError> {
        Ok(LocalSigner::from_hex(&self.private_key)?)
    }
}
