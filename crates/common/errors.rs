use ethereum_types::U256;
use ethtx_crypto::CryptoError;
use ethtx_rlp::error::RLPDecodeError;

use crate::types::SignerError;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TxError {
    /// Wrong arity, wrong item kind, unknown type byte or an invariant violation on a field.
    #[error("Malformed transaction fields: {0}")]
    MalformedFields(String),
    #[error("Wrong transaction type: expected 0x{expected:02x}, received 0x{received:02x}")]
    WrongTransactionType { expected: u8, received: u8 },
    /// Non-canonical encodings and wrong address or storage key lengths.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("Numeric overflow: {0}")]
    NumericOverflow(String),
    #[error(
        "maxFeePerGas ({max_fee_per_gas}) cannot be less than maxPriorityFeePerGas ({max_priority_fee_per_gas})"
    )]
    FeeInversion {
        max_fee_per_gas: U256,
        max_priority_fee_per_gas: U256,
    },
    #[error("Transaction is not signed")]
    NotSigned,
    #[error("Signature mismatch: {0}")]
    SignatureMismatch(String),
    #[error("Signer error: {0}")]
    Signer(#[from] SignerError),
}

impl From<RLPDecodeError> for TxError {
    fn from(err: RLPDecodeError) -> Self {
        match err {
            RLPDecodeError::NonCanonical(_) => TxError::InvalidFormat(err.to_string()),
            other => TxError::MalformedFields(other.to_string()),
        }
    }
}

impl From<CryptoError> for TxError {
    fn from(err: CryptoError) -> Self {
        TxError::SignatureMismatch(err.to_string())
    }
}
