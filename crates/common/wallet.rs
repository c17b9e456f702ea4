//! Request level operations over hex strings: what a wallet front-end calls.

use ethereum_types::{Address, H512, U256};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    calldata::erc20_transfer,
    canonical::parse_quantity,
    config::SignerConfig,
    errors::TxError,
    message::{MessageType, recover_message_signer, sign_message},
    types::{HashSigner, JsonTx, LocalSigner, SignerError, Transaction, TxFieldData, TxType},
};

/// Transaction fields plus the token transfer helper: when `contractAddress`
/// is set, `to` is the token recipient and `value` the token amount.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxRequest {
    #[serde(flatten)]
    pub fields: TxFieldData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
}

pub fn encode_hex(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>, TxError> {
    hex::decode(value.trim().trim_start_matches("0x"))
        .map_err(|e| TxError::MalformedFields(format!("{field}: {e}")))
}

impl TxRequest {
    /// Resolves the token helper and the configured chain defaults into plain
    /// transaction fields.
    pub fn into_field_data(self, config: &SignerConfig) -> Result<TxFieldData, TxError> {
        let mut fields = self.fields;
        if let Some(contract) = self.contract_address {
            let recipient = fields.kind()?.address().ok_or_else(|| {
                TxError::MalformedFields("to: token transfers need a recipient".to_string())
            })?;
            let amount = TxFieldData::quantity("value", &fields.value)?;
            // explicit data wins over the derived transfer payload
            if fields.data.as_deref().is_none_or(|data| data.trim_start_matches("0x").is_empty()) {
                fields.data = Some(encode_hex(erc20_transfer(recipient, amount)));
            }
            fields.to = Some(contract);
            fields.value = None;
        }
        if fields.chain_id.is_none() {
            let wants_chain_id = fields.tx_type()? != TxType::Legacy || config.hardfork_eip155;
            if wants_chain_id {
                fields.chain_id = Some(config.chain_id.to_string());
            }
        }
        Ok(fields)
    }
}

/// Builds, signs and serializes a request. Returns the `0x` hex of the signed
/// transaction.
pub fn sign_transaction(
    request: TxRequest,
    signer: &(impl HashSigner + ?Sized),
    config: &SignerConfig,
) -> Result<String, TxError> {
    let fields = request.into_field_data(config)?;
    let tx = Transaction::from_field_data(&fields)?;
    if tx.is_signed() {
        return Err(TxError::MalformedFields(
            "request already carries a signature".to_string(),
        ));
    }
    let signed = tx.sign_with(signer)?;
    let hash = signed.hash()?;
    info!(tx_type = %signed.tx_type(), ?hash, "Signed transaction request");
    Ok(encode_hex(signed.serialize()))
}

/// Decodes a signed transaction, checks its signature (against `public_key`
/// when given) and its chain id (when given), and returns its JSON form.
pub fn valid_signed_transaction(
    raw: &str,
    chain_id: Option<U256>,
    public_key: Option<&H512>,
) -> Result<JsonTx, TxError> {
    let bytes = decode_hex("transaction", raw)?;
    let tx = Transaction::from_serialized_bytes_with_chain_id(&bytes, chain_id)?;
    if !tx.is_signed() {
        return Err(TxError::NotSigned);
    }
    if let (Some(expected), Some(actual)) = (chain_id, tx.chain_id()) {
        if expected != actual {
            return Err(TxError::MalformedFields(format!(
                "chainId: transaction is for chain {actual}, expected {expected}"
            )));
        }
    }
    tx.verify_signature(public_key)?;
    debug!(tx_type = %tx.tx_type(), "Validated signed transaction");
    Ok(tx.to_json())
}

/// Signs a serialized unsigned transaction. `chain_id` gives legacy
/// transactions EIP-155 protection.
pub fn sign_raw_transaction(
    raw: &str,
    signer: &(impl HashSigner + ?Sized),
    chain_id: Option<U256>,
) -> Result<String, TxError> {
    let bytes = decode_hex("transaction", raw)?;
    let tx = Transaction::from_serialized_bytes_with_chain_id(&bytes, chain_id)?;
    if tx.is_signed() {
        return Err(TxError::MalformedFields(
            "transaction is already signed".to_string(),
        ));
    }
    Ok(encode_hex(tx.sign_with(signer)?.serialize()))
}

pub fn sign_message_hex(
    signer: &(impl HashSigner + ?Sized),
    message_type: MessageType,
    message: &[u8],
) -> Result<String, TxError> {
    Ok(encode_hex(sign_message(signer, message_type, message)?))
}

/// Whether `signature` (65 bytes hex) over `message` was made by `address`.
pub fn verify_message(
    message_type: MessageType,
    message: &[u8],
    signature: &str,
    address: Address,
) -> Result<bool, TxError> {
    let signature: [u8; 65] = decode_hex("signature", signature)?
        .try_into()
        .map_err(|bytes: Vec<u8>| {
            TxError::InvalidFormat(format!("signature must be 65 bytes, got {}", bytes.len()))
        })?;
    Ok(recover_message_signer(message_type, message, &signature)? == address)
}

pub fn address_from_private_key(private_key: &str) -> Result<Address, SignerError> {
    Ok(LocalSigner::from_hex(private_key)?.address)
}

pub fn check_private_key(private_key: &str) -> bool {
    LocalSigner::from_hex(private_key).is_ok()
}

/// Parses a chain id given as hex or decimal text.
pub fn parse_chain_id(chain_id: &str) -> Result<U256, TxError> {
    parse_quantity("chainId", chain_id)
}
