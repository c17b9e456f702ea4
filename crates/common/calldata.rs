//! ABI encoding of calls with static arguments, enough to build token
//! transfer payloads.

use ethereum_types::{Address, U256};
use ethtx_crypto::keccak::keccak_hash;

use crate::errors::TxError;

#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    Address(Address),
    Uint(U256),
    Bool(bool),
}

fn parse_signature(signature: &str) -> Result<(String, Vec<String>), TxError> {
    let sig = signature.trim().trim_start_matches("function ");
    let (name, params) = sig.split_once('(').ok_or_else(|| {
        TxError::MalformedFields(format!("invalid function signature {signature:?}"))
    })?;
    let params = params.trim_end_matches(')');
    if params.trim().is_empty() {
        return Ok((name.to_string(), vec![]));
    }
    let params = params
        .split(',')
        .map(|x| x.trim().split_once(' ').map_or(x.trim(), |(ty, _)| ty).to_string())
        .collect();
    Ok((name.to_string(), params))
}

pub fn compute_function_selector(name: &str, params: &[String]) -> [u8; 4] {
    let normalized_signature = format!("{name}({})", params.join(","));
    let hash = keccak_hash(normalized_signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

fn word(value: &Value) -> [u8; 32] {
    match value {
        Value::Address(address) => {
            let mut word = [0u8; 32];
            word[12..].copy_from_slice(address.as_bytes());
            word
        }
        Value::Uint(value) => value.to_big_endian(),
        Value::Bool(value) => U256::from(u8::from(*value)).to_big_endian(),
    }
}

/// `selector || word(value)...` for a function whose arguments are all static.
pub fn encode_calldata(signature: &str, values: &[Value]) -> Result<Vec<u8>, TxError> {
    let (name, params) = parse_signature(signature)?;

    if params.len() != values.len() {
        return Err(TxError::MalformedFields(format!(
            "Number of arguments does not match ({} != {})",
            params.len(),
            values.len()
        )));
    }

    let mut calldata = compute_function_selector(&name, &params).to_vec();
    for value in values {
        calldata.extend_from_slice(&word(value));
    }
    Ok(calldata)
}

/// ERC-20 `transfer(recipient, amount)` payload.
pub fn erc20_transfer(recipient: Address, amount: U256) -> Vec<u8> {
    let mut calldata = crate::constants::TRANSFER_SELECTOR.to_vec();
    calldata.extend_from_slice(&word(&Value::Address(recipient)));
    calldata.extend_from_slice(&word(&Value::Uint(amount)));
    calldata
}
