use ethereum_types::{Address, H256};
use ethtx_crypto::{
    RecoverableSignature, VEncoding,
    keccak::Keccak256,
    recovery::encode_v,
    signature::{public_key_to_address, recover_public_key},
};
use serde::{Deserialize, Serialize};

use crate::{constants::PERSONAL_MESSAGE_PREFIX, errors::TxError, types::HashSigner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// The message is already a 32-byte hash and is signed as is.
    EthSign,
    /// `keccak256("\x19Ethereum Signed Message:\n" || len(message) || message)`
    #[default]
    PersonalSign,
}

pub fn hash_message(message_type: MessageType, message: &[u8]) -> Result<H256, TxError> {
    match message_type {
        MessageType::EthSign => {
            if message.len() != H256::len_bytes() {
                return Err(TxError::InvalidFormat(format!(
                    "eth_sign messages must be 32 bytes, got {}",
                    message.len()
                )));
            }
            Ok(H256::from_slice(message))
        }
        MessageType::PersonalSign => {
            let hash = Keccak256::new()
                .update(PERSONAL_MESSAGE_PREFIX.as_bytes())
                .update(message.len().to_string().as_bytes())
                .update(message)
                .finalize();
            Ok(H256(hash))
        }
    }
}

/// `r || s || v` with `v = 27 + recovery bit`.
pub fn sign_message(
    signer: &(impl HashSigner + ?Sized),
    message_type: MessageType,
    message: &[u8],
) -> Result<[u8; 65], TxError> {
    let hash = hash_message(message_type, message)?;
    let signature = signer.sign_hash(&hash)?;
    let v = encode_v(signature.recovery_id, VEncoding::Electrum)?;
    let mut out = signature.to_bytes();
    out[64] = v.low_u32() as u8;
    Ok(out)
}

/// Recovers the address behind a 65-byte message signature. `v` may be the
/// raw recovery bit or `27/28`.
pub fn recover_message_signer(
    message_type: MessageType,
    message: &[u8],
    signature: &[u8; 65],
) -> Result<Address, TxError> {
    let hash = hash_message(message_type, message)?;
    let signature = RecoverableSignature::from_bytes(signature)?;
    let public_key = recover_public_key(&hash.0, &signature)?;
    Ok(public_key_to_address(&public_key))
}
