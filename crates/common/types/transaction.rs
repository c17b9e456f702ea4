use std::fmt::Display;

use bytes::{BufMut, Bytes};
use ethereum_types::{Address, H256, H512, U256};
use ethtx_crypto::{
    RecoverableSignature, RecoveryId, VEncoding,
    keccak::keccak_hash,
    recovery::{decode_v, encode_v},
    signature::{public_key_to_address, recover_public_key, verify},
};
use ethtx_rlp::{
    constants::RLP_NULL, decode::RLPDecode, encode::RLPEncode, item::RlpItem, structs::Encoder,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    canonical::{
        checked_fee_product, parse_quantity, quantity_from_bytes, to_unpadded_bytes,
        validate_no_leading_zeroes,
    },
    constants::DEFAULT_CHAIN_ID,
    errors::TxError,
    serde_utils,
    types::{
        AccessList, AccessListEntry, HashSigner, RawAccessList, TxFieldData, tx_fields,
    },
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transaction {
    LegacyTransaction(LegacyTransaction),
    EIP2930Transaction(EIP2930Transaction),
    EIP1559Transaction(EIP1559Transaction),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegacyTransaction {
    nonce: U256,
    gas_price: U256,
    gas_limit: U256,
    to: TxKind,
    value: U256,
    data: Bytes,
    /// Replay protection. Derived from `v` once signed.
    chain_id: Option<U256>,
    signature: Option<TxSignature>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EIP2930Transaction {
    chain_id: U256,
    nonce: U256,
    gas_price: U256,
    gas_limit: U256,
    to: TxKind,
    value: U256,
    data: Bytes,
    access_list: AccessList,
    signature: Option<TxSignature>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EIP1559Transaction {
    chain_id: U256,
    nonce: U256,
    max_priority_fee_per_gas: U256,
    max_fee_per_gas: U256,
    gas_limit: U256,
    to: TxKind,
    value: U256,
    data: Bytes,
    access_list: AccessList,
    signature: Option<TxSignature>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum TxType {
    #[default]
    Legacy = 0x00,
    EIP2930 = 0x01,
    EIP1559 = 0x02,
}

impl From<TxType> for u8 {
    fn from(val: TxType) -> Self {
        match val {
            TxType::Legacy => 0x00,
            TxType::EIP2930 => 0x01,
            TxType::EIP1559 => 0x02,
        }
    }
}

impl Display for TxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxType::Legacy => write!(f, "Legacy"),
            TxType::EIP2930 => write!(f, "EIP2930"),
            TxType::EIP1559 => write!(f, "EIP1559"),
        }
    }
}

const LEGACY_FIELDS: [&str; 9] = [
    "nonce", "gasPrice", "gasLimit", "to", "value", "data", "v", "r", "s",
];
const EIP2930_FIELDS: [&str; 11] = [
    "chainId",
    "nonce",
    "gasPrice",
    "gasLimit",
    "to",
    "value",
    "data",
    "accessList",
    "v",
    "r",
    "s",
];
const EIP1559_FIELDS: [&str; 12] = [
    "chainId",
    "nonce",
    "maxPriorityFeePerGas",
    "maxFeePerGas",
    "gasLimit",
    "to",
    "value",
    "data",
    "accessList",
    "v",
    "r",
    "s",
];
const NON_QUANTITY_FIELDS: [&str; 3] = ["to", "data", "accessList"];

impl TxType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Legacy),
            0x01 => Some(Self::EIP2930),
            0x02 => Some(Self::EIP1559),
            _ => None,
        }
    }

    /// Wire order of the signed value list.
    pub fn field_names(self) -> &'static [&'static str] {
        match self {
            TxType::Legacy => &LEGACY_FIELDS,
            TxType::EIP2930 => &EIP2930_FIELDS,
            TxType::EIP1559 => &EIP1559_FIELDS,
        }
    }

    /// Number of values before `v, r, s`.
    pub fn unsigned_len(self) -> usize {
        self.field_names().len() - 3
    }
}

/// Destination of a transaction: an account, or a contract creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum TxKind {
    Call(Address),
    #[default]
    Create,
}

impl TxKind {
    pub fn address(&self) -> Option<Address> {
        match self {
            Self::Call(address) => Some(*address),
            Self::Create => None,
        }
    }
}

impl From<Option<Address>> for TxKind {
    fn from(value: Option<Address>) -> Self {
        value.map_or(Self::Create, Self::Call)
    }
}

impl RLPEncode for TxKind {
    fn encode(&self, buf: &mut dyn BufMut) {
        match self {
            Self::Call(address) => address.encode(buf),
            Self::Create => buf.put_u8(RLP_NULL),
        }
    }
}

/// Signature components exactly as carried on the wire. `v` is the y-parity
/// for typed transactions and `27/28` or `chain_id * 2 + 35/36` for legacy
/// ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct TxSignature {
    pub v: U256,
    pub r: U256,
    pub s: U256,
}

/// JSON view of a transaction: hex quantities, `0x` data, optional signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonTx {
    #[serde(rename = "type", with = "serde_utils::u256::hex_str")]
    pub tx_type: U256,
    #[serde(
        default,
        with = "serde_utils::u256::hex_str_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub chain_id: Option<U256>,
    #[serde(with = "serde_utils::u256::hex_str")]
    pub nonce: U256,
    #[serde(
        default,
        with = "serde_utils::u256::hex_str_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub gas_price: Option<U256>,
    #[serde(
        default,
        with = "serde_utils::u256::hex_str_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_priority_fee_per_gas: Option<U256>,
    #[serde(
        default,
        with = "serde_utils::u256::hex_str_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_fee_per_gas: Option<U256>,
    #[serde(with = "serde_utils::u256::hex_str")]
    pub gas_limit: U256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(with = "serde_utils::u256::hex_str")]
    pub value: U256,
    #[serde(with = "serde_utils::bytes")]
    pub data: Bytes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_list: Option<Vec<AccessListEntry>>,
    #[serde(
        default,
        with = "serde_utils::u256::hex_str_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub v: Option<U256>,
    #[serde(
        default,
        with = "serde_utils::u256::hex_str_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub r: Option<U256>,
    #[serde(
        default,
        with = "serde_utils::u256::hex_str_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub s: Option<U256>,
}

impl From<JsonTx> for TxFieldData {
    fn from(json: JsonTx) -> Self {
        let to_hex = |value: U256| format!("{value:#x}");
        Self {
            tx_type: Some(to_hex(json.tx_type)),
            chain_id: json.chain_id.map(to_hex),
            nonce: Some(to_hex(json.nonce)),
            gas_price: json.gas_price.map(to_hex),
            gas_limit: Some(to_hex(json.gas_limit)),
            max_priority_fee_per_gas: json.max_priority_fee_per_gas.map(to_hex),
            max_fee_per_gas: json.max_fee_per_gas.map(to_hex),
            to: json.to.map(|to| format!("{to:#x}")),
            value: Some(to_hex(json.value)),
            data: Some(format!("0x{}", hex::encode(&json.data))),
            access_list: json.access_list,
            v: json.v.map(to_hex),
            r: json.r.map(to_hex),
            s: json.s.map(to_hex),
        }
    }
}

// Framing and value handling shared by the variants, keyed by `TxType`.

/// Typed payloads are prefixed with their type byte; legacy ones are not.
fn frame(tx_type: TxType, payload: &[u8]) -> Bytes {
    if tx_type == TxType::Legacy {
        return Bytes::copy_from_slice(payload);
    }
    let mut buf = Vec::with_capacity(payload.len() + 1);
    buf.push(u8::from(tx_type));
    buf.extend_from_slice(payload);
    Bytes::from(buf)
}

fn unframe(tx_type: TxType, bytes: &[u8]) -> Result<&[u8], TxError> {
    if tx_type == TxType::Legacy {
        return Ok(bytes);
    }
    match bytes.split_first() {
        Some((&received, payload)) if received == u8::from(tx_type) => Ok(payload),
        Some((&received, _)) => Err(TxError::WrongTransactionType {
            expected: tx_type.into(),
            received,
        }),
        None => Err(TxError::MalformedFields(
            "empty transaction bytes".to_string(),
        )),
    }
}

fn decode_values(tx_type: TxType, bytes: &[u8]) -> Result<Vec<RlpItem>, TxError> {
    let payload = unframe(tx_type, bytes)?;
    let values = RlpItem::decode(payload)?;
    if !values.is_list() {
        return Err(TxError::MalformedFields(format!(
            "{tx_type} transaction payload must be a list"
        )));
    }
    Ok(values.into_list()?)
}

/// Returns whether the `v, r, s` slots are present.
fn check_arity(tx_type: TxType, values: &[RlpItem]) -> Result<bool, TxError> {
    let signed = tx_type.field_names().len();
    let unsigned = tx_type.unsigned_len();
    match values.len() {
        n if n == signed => Ok(true),
        n if n == unsigned => Ok(false),
        n => Err(TxError::MalformedFields(format!(
            "{tx_type} transactions have {unsigned} (unsigned) or {signed} (signed) values, got {n}"
        ))),
    }
}

fn scalar<'a>(field: &str, item: &'a RlpItem) -> Result<&'a [u8], TxError> {
    item.as_bytes()
        .map(|bytes| bytes.as_ref())
        .ok_or_else(|| TxError::MalformedFields(format!("{field} must be a byte string")))
}

/// Rejects leading zeroes across every integer value at once, so the error
/// names all offending fields.
fn check_canonical(tx_type: TxType, values: &[RlpItem]) -> Result<(), TxError> {
    let scalars = tx_type
        .field_names()
        .iter()
        .zip(values)
        .filter(|(name, _)| !NON_QUANTITY_FIELDS.contains(*name))
        .map(|(name, item)| -> Result<(&str, &[u8]), TxError> {
            Ok((*name, scalar(name, item)?))
        })
        .collect::<Result<Vec<_>, TxError>>()?;
    validate_no_leading_zeroes(&scalars)
}

fn quantity(field: &str, item: &RlpItem) -> Result<U256, TxError> {
    quantity_from_bytes(field, scalar(field, item)?)
}

fn kind_from_value(item: &RlpItem) -> Result<TxKind, TxError> {
    let bytes = scalar("to", item)?;
    match bytes.len() {
        0 => Ok(TxKind::Create),
        20 => Ok(TxKind::Call(Address::from_slice(bytes))),
        len => Err(TxError::InvalidFormat(format!(
            "to must be 20 bytes, got {len}"
        ))),
    }
}

fn payload_from_value(item: &RlpItem) -> Result<Bytes, TxError> {
    Ok(Bytes::copy_from_slice(scalar("data", item)?))
}

/// All-empty `v, r, s` decode to an unsigned transaction.
fn signature_from_values(values: &[RlpItem]) -> Result<Option<TxSignature>, TxError> {
    let [v, r, s] = values else {
        return Err(TxError::MalformedFields(
            "expected v, r and s values".to_string(),
        ));
    };
    let signature = TxSignature {
        v: quantity("v", v)?,
        r: quantity("r", r)?,
        s: quantity("s", s)?,
    };
    if signature == TxSignature::default() {
        return Ok(None);
    }
    Ok(Some(signature))
}

fn legacy_chain_id(v: U256) -> Result<Option<U256>, TxError> {
    VEncoding::from_legacy_v(v)
        .map(|encoding| encoding.chain_id())
        .map_err(|_| {
            TxError::MalformedFields(format!(
                "v: {v} is neither 27/28 nor an EIP-155 value"
            ))
        })
}

fn check_signature(tx_type: TxType, signature: &TxSignature) -> Result<(), TxError> {
    if signature.r.is_zero() || signature.s.is_zero() {
        return Err(TxError::MalformedFields(
            "r and s must be non-zero in a signed transaction".to_string(),
        ));
    }
    match tx_type {
        TxType::Legacy => legacy_chain_id(signature.v).map(|_| ()),
        _ if signature.v > U256::one() => Err(TxError::MalformedFields(format!(
            "v: y-parity must be 0 or 1, got {}",
            signature.v
        ))),
        _ => Ok(()),
    }
}

fn check_fee_cap(max_fee_per_gas: U256, max_priority_fee_per_gas: U256) -> Result<(), TxError> {
    if max_fee_per_gas < max_priority_fee_per_gas {
        return Err(TxError::FeeInversion {
            max_fee_per_gas,
            max_priority_fee_per_gas,
        });
    }
    Ok(())
}

fn quantity_item(value: U256) -> RlpItem {
    RlpItem::bytes(to_unpadded_bytes(value))
}

fn kind_item(kind: TxKind) -> RlpItem {
    match kind {
        TxKind::Call(address) => RlpItem::bytes(address),
        TxKind::Create => RlpItem::empty(),
    }
}

fn signature_items(signature: Option<TxSignature>) -> [RlpItem; 3] {
    let signature = signature.unwrap_or_default();
    [
        quantity_item(signature.v),
        quantity_item(signature.r),
        quantity_item(signature.s),
    ]
}

fn access_list_from_fields(fields: &TxFieldData) -> Result<AccessList, TxError> {
    let Some(entries) = fields.access_list.clone() else {
        return Ok(AccessList::new());
    };
    let (buffers, _) = tx_fields::normalize(RawAccessList::Json(entries))?;
    tx_fields::validate(&buffers)
}

fn typed_chain_id(fields: &TxFieldData) -> Result<U256, TxError> {
    fields
        .chain_id
        .as_deref()
        .map_or(Ok(DEFAULT_CHAIN_ID), |chain_id| {
            parse_quantity("chainId", chain_id)
        })
}

fn recover_signer_key(
    tx_type: TxType,
    hash: H256,
    signature: Option<TxSignature>,
    encoding: VEncoding,
    expected: Option<&H512>,
) -> Result<H512, TxError> {
    let signature = signature.ok_or(TxError::NotSigned)?;
    let recoverable = decode_v(signature.v, encoding)
        .map(|recovery_id| RecoverableSignature::new(recovery_id, signature.r, signature.s))
        .and_then(|recoverable| recoverable.validate().map(|_| recoverable))
        .inspect_err(|err| warn!(%tx_type, %err, "Rejected malformed transaction signature"))?;
    let public_key = recover_public_key(&hash.0, &recoverable)?;
    if let Some(expected) = expected {
        if !verify(&hash.0, &recoverable, expected) {
            warn!(%tx_type, "Transaction signature does not match the expected public key");
            return Err(TxError::SignatureMismatch(format!(
                "recovered public key {public_key:#x} does not match {expected:#x}"
            )));
        }
    }
    Ok(public_key)
}

/// Signature handling shared by the three variants. Each variant provides
/// `TX_TYPE`, `v_encoding`, `signing_message`, `serialize` and `with_signature`.
macro_rules! impl_signature_ops {
    ($tx:ty) => {
        impl $tx {
            pub fn signature(&self) -> Option<&TxSignature> {
                self.signature.as_ref()
            }

            /// Signed iff `v, r, s` are all present.
            pub fn is_signed(&self) -> bool {
                self.signature.is_some()
            }

            /// The wire `v`.
            pub fn v(&self) -> Option<U256> {
                self.signature.map(|signature| signature.v)
            }

            /// The raw recovery bit behind the wire `v`.
            pub fn recovery_id(&self) -> Result<RecoveryId, TxError> {
                let signature = self.signature.ok_or(TxError::NotSigned)?;
                Ok(decode_v(signature.v, self.v_encoding())?)
            }

            /// Keccak-256 of [`Self::signing_message`], what a signer signs.
            pub fn signing_hash(&self) -> H256 {
                H256(keccak_hash(&self.signing_message()))
            }

            /// Attaches a signature given as a raw recovery bit, folding it into
            /// the wire `v` this variant uses.
            pub fn with_recovery_id(
                &self,
                recovery_id: RecoveryId,
                r: U256,
                s: U256,
            ) -> Result<Self, TxError> {
                let v = encode_v(recovery_id, self.v_encoding()).map_err(|_| {
                    TxError::NumericOverflow("chainId * 2 + 36 cannot exceed 2^256 - 1".to_string())
                })?;
                self.with_signature(v, r, s)
            }

            /// Signs [`Self::signing_hash`] and returns the signed transaction.
            pub fn sign_with(&self, signer: &(impl HashSigner + ?Sized)) -> Result<Self, TxError> {
                let signature = signer.sign_hash(&self.signing_hash())?;
                debug!(tx_type = %Self::TX_TYPE, "Signed transaction");
                self.with_recovery_id(signature.recovery_id, signature.r, signature.s)
            }

            /// Recovers the signer's public key, checking it against `expected`
            /// when given.
            pub fn verify_signature(&self, expected: Option<&H512>) -> Result<H512, TxError> {
                recover_signer_key(
                    Self::TX_TYPE,
                    self.signing_hash(),
                    self.signature,
                    self.v_encoding(),
                    expected,
                )
            }

            pub fn sender(&self) -> Result<Address, TxError> {
                Ok(public_key_to_address(&self.verify_signature(None)?))
            }

            /// Keccak-256 of the serialized signed transaction.
            pub fn hash(&self) -> Result<H256, TxError> {
                if !self.is_signed() {
                    return Err(TxError::NotSigned);
                }
                Ok(H256(keccak_hash(&self.serialize())))
            }
        }
    };
}

impl LegacyTransaction {
    pub const TX_TYPE: TxType = TxType::Legacy;

    pub fn from_field_data(fields: &TxFieldData) -> Result<Self, TxError> {
        fields.check_applicable(Self::TX_TYPE)?;
        Self {
            nonce: TxFieldData::quantity("nonce", &fields.nonce)?,
            gas_price: TxFieldData::quantity("gasPrice", &fields.gas_price)?,
            gas_limit: TxFieldData::quantity("gasLimit", &fields.gas_limit)?,
            to: fields.kind()?,
            value: TxFieldData::quantity("value", &fields.value)?,
            data: fields.payload()?,
            chain_id: fields
                .chain_id
                .as_deref()
                .map(|chain_id| parse_quantity("chainId", chain_id))
                .transpose()?,
            signature: fields.signature()?,
        }
        .validated()
    }

    pub fn from_serialized_bytes(bytes: &[u8]) -> Result<Self, TxError> {
        Self::from_serialized_bytes_with_chain_id(bytes, None)
    }

    /// `chain_id` is used for unsigned transactions, which carry no `v` to
    /// derive it from, and checked against the `v` of signed ones.
    pub fn from_serialized_bytes_with_chain_id(
        bytes: &[u8],
        chain_id: Option<U256>,
    ) -> Result<Self, TxError> {
        let values = decode_values(Self::TX_TYPE, bytes)?;
        Self::from_values_with_chain_id(&values, chain_id)
    }

    pub fn from_values(values: &[RlpItem]) -> Result<Self, TxError> {
        Self::from_values_with_chain_id(values, None)
    }

    pub fn from_values_with_chain_id(
        values: &[RlpItem],
        chain_id: Option<U256>,
    ) -> Result<Self, TxError> {
        let signed = check_arity(Self::TX_TYPE, values)?;
        check_canonical(Self::TX_TYPE, values)?;
        let signature = match signed {
            true => signature_from_values(&values[6..])?,
            false => None,
        };
        Self {
            nonce: quantity("nonce", &values[0])?,
            gas_price: quantity("gasPrice", &values[1])?,
            gas_limit: quantity("gasLimit", &values[2])?,
            to: kind_from_value(&values[3])?,
            value: quantity("value", &values[4])?,
            data: payload_from_value(&values[5])?,
            chain_id,
            signature,
        }
        .validated()
    }

    fn validated(mut self) -> Result<Self, TxError> {
        checked_fee_product(self.gas_limit, self.gas_price, "gasPrice")?;
        if let Some(signature) = &self.signature {
            check_signature(Self::TX_TYPE, signature)?;
            let derived = legacy_chain_id(signature.v)?;
            match (self.chain_id, derived) {
                (Some(expected), Some(derived)) if expected != derived => {
                    return Err(TxError::MalformedFields(format!(
                        "v: encodes chain id {derived}, expected {expected}"
                    )));
                }
                _ => self.chain_id = derived,
            }
        }
        Ok(self)
    }

    pub fn nonce(&self) -> U256 {
        self.nonce
    }

    pub fn gas_price(&self) -> U256 {
        self.gas_price
    }

    pub fn gas_limit(&self) -> U256 {
        self.gas_limit
    }

    pub fn to(&self) -> TxKind {
        self.to
    }

    pub fn value(&self) -> U256 {
        self.value
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn chain_id(&self) -> Option<U256> {
        self.chain_id
    }

    /// EIP-155 replay protection.
    pub fn protected(&self) -> bool {
        self.chain_id.is_some()
    }

    fn v_encoding(&self) -> VEncoding {
        VEncoding::legacy(self.chain_id)
    }

    fn encode_unsigned_fields<'a>(&self, encoder: Encoder<'a>) -> Encoder<'a> {
        encoder
            .encode_field(&self.nonce)
            .encode_field(&self.gas_price)
            .encode_field(&self.gas_limit)
            .encode_field(&self.to)
            .encode_field(&self.value)
            .encode_field(&self.data)
    }

    /// `nonce, gasPrice, gasLimit, to, value, data, v, r, s` with empty
    /// values in place of a missing signature.
    pub fn raw_values(&self) -> Vec<RlpItem> {
        let mut values = vec![
            quantity_item(self.nonce),
            quantity_item(self.gas_price),
            quantity_item(self.gas_limit),
            kind_item(self.to),
            quantity_item(self.value),
            RlpItem::Bytes(self.data.clone()),
        ];
        values.extend(signature_items(self.signature));
        values
    }

    pub fn serialize(&self) -> Bytes {
        frame(Self::TX_TYPE, &self.encode_to_vec())
    }

    /// RLP of the six unsigned values, followed by `chainId, 0, 0` under EIP-155.
    pub fn signing_message(&self) -> Bytes {
        let mut buf = vec![];
        let encoder = self.encode_unsigned_fields(Encoder::new(&mut buf));
        match self.chain_id {
            Some(chain_id) => encoder
                .encode_field(&chain_id)
                .encode_field(&0u8)
                .encode_field(&0u8)
                .finish(),
            None => encoder.finish(),
        }
        Bytes::from(buf)
    }

    /// Attaches a signature given with its wire `v`. A transaction built with a
    /// chain id only accepts an EIP-155 `v` for that chain.
    pub fn with_signature(&self, v: U256, r: U256, s: U256) -> Result<Self, TxError> {
        if let Some(chain_id) = self.chain_id {
            if legacy_chain_id(v)? != Some(chain_id) {
                return Err(TxError::MalformedFields(format!(
                    "v: {v} is not an EIP-155 value for chain id {chain_id}"
                )));
            }
        }
        Self {
            signature: Some(TxSignature { v, r, s }),
            ..self.clone()
        }
        .validated()
    }

    pub fn to_json(&self) -> JsonTx {
        JsonTx {
            tx_type: U256::from(u8::from(Self::TX_TYPE)),
            chain_id: self.chain_id,
            nonce: self.nonce,
            gas_price: Some(self.gas_price),
            max_priority_fee_per_gas: None,
            max_fee_per_gas: None,
            gas_limit: self.gas_limit,
            to: self.to.address(),
            value: self.value,
            data: self.data.clone(),
            access_list: None,
            v: self.v(),
            r: self.signature.map(|signature| signature.r),
            s: self.signature.map(|signature| signature.s),
        }
    }
}

impl EIP2930Transaction {
    pub const TX_TYPE: TxType = TxType::EIP2930;

    pub fn from_field_data(fields: &TxFieldData) -> Result<Self, TxError> {
        fields.check_applicable(Self::TX_TYPE)?;
        Self {
            chain_id: typed_chain_id(fields)?,
            nonce: TxFieldData::quantity("nonce", &fields.nonce)?,
            gas_price: TxFieldData::quantity("gasPrice", &fields.gas_price)?,
            gas_limit: TxFieldData::quantity("gasLimit", &fields.gas_limit)?,
            to: fields.kind()?,
            value: TxFieldData::quantity("value", &fields.value)?,
            data: fields.payload()?,
            access_list: access_list_from_fields(fields)?,
            signature: fields.signature()?,
        }
        .validated()
    }

    pub fn from_serialized_bytes(bytes: &[u8]) -> Result<Self, TxError> {
        let values = decode_values(Self::TX_TYPE, bytes)?;
        Self::from_values(&values)
    }

    pub fn from_values(values: &[RlpItem]) -> Result<Self, TxError> {
        let signed = check_arity(Self::TX_TYPE, values)?;
        check_canonical(Self::TX_TYPE, values)?;
        let signature = match signed {
            true => signature_from_values(&values[8..])?,
            false => None,
        };
        Self {
            chain_id: quantity("chainId", &values[0])?,
            nonce: quantity("nonce", &values[1])?,
            gas_price: quantity("gasPrice", &values[2])?,
            gas_limit: quantity("gasLimit", &values[3])?,
            to: kind_from_value(&values[4])?,
            value: quantity("value", &values[5])?,
            data: payload_from_value(&values[6])?,
            access_list: tx_fields::from_rlp_item(&values[7])?,
            signature,
        }
        .validated()
    }

    fn validated(self) -> Result<Self, TxError> {
        checked_fee_product(self.gas_limit, self.gas_price, "gasPrice")?;
        if let Some(signature) = &self.signature {
            check_signature(Self::TX_TYPE, signature)?;
        }
        Ok(self)
    }

    pub fn chain_id(&self) -> U256 {
        self.chain_id
    }

    pub fn nonce(&self) -> U256 {
        self.nonce
    }

    pub fn gas_price(&self) -> U256 {
        self.gas_price
    }

    pub fn gas_limit(&self) -> U256 {
        self.gas_limit
    }

    pub fn to(&self) -> TxKind {
        self.to
    }

    pub fn value(&self) -> U256 {
        self.value
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn access_list(&self) -> &AccessList {
        &self.access_list
    }

    fn v_encoding(&self) -> VEncoding {
        VEncoding::Parity
    }

    fn encode_unsigned_fields<'a>(&self, encoder: Encoder<'a>) -> Encoder<'a> {
        encoder
            .encode_field(&self.chain_id)
            .encode_field(&self.nonce)
            .encode_field(&self.gas_price)
            .encode_field(&self.gas_limit)
            .encode_field(&self.to)
            .encode_field(&self.value)
            .encode_field(&self.data)
            .encode_field(&self.access_list)
    }

    pub fn raw_values(&self) -> Vec<RlpItem> {
        let mut values = vec![
            quantity_item(self.chain_id),
            quantity_item(self.nonce),
            quantity_item(self.gas_price),
            quantity_item(self.gas_limit),
            kind_item(self.to),
            quantity_item(self.value),
            RlpItem::Bytes(self.data.clone()),
            tx_fields::to_rlp_item(&self.access_list),
        ];
        values.extend(signature_items(self.signature));
        values
    }

    pub fn serialize(&self) -> Bytes {
        frame(Self::TX_TYPE, &self.encode_to_vec())
    }

    pub fn signing_message(&self) -> Bytes {
        let mut buf = vec![];
        self.encode_unsigned_fields(Encoder::new(&mut buf)).finish();
        frame(Self::TX_TYPE, &buf)
    }

    /// Attaches a signature given with its wire `v`, the y-parity.
    pub fn with_signature(&self, v: U256, r: U256, s: U256) -> Result<Self, TxError> {
        Self {
            signature: Some(TxSignature { v, r, s }),
            ..self.clone()
        }
        .validated()
    }

    pub fn to_json(&self) -> JsonTx {
        JsonTx {
            tx_type: U256::from(u8::from(Self::TX_TYPE)),
            chain_id: Some(self.chain_id),
            nonce: self.nonce,
            gas_price: Some(self.gas_price),
            max_priority_fee_per_gas: None,
            max_fee_per_gas: None,
            gas_limit: self.gas_limit,
            to: self.to.address(),
            value: self.value,
            data: self.data.clone(),
            access_list: Some(tx_fields::to_json(&self.access_list)),
            v: self.v(),
            r: self.signature.map(|signature| signature.r),
            s: self.signature.map(|signature| signature.s),
        }
    }
}

impl EIP1559Transaction {
    pub const TX_TYPE: TxType = TxType::EIP1559;

    pub fn from_field_data(fields: &TxFieldData) -> Result<Self, TxError> {
        fields.check_applicable(Self::TX_TYPE)?;
        Self {
            chain_id: typed_chain_id(fields)?,
            nonce: TxFieldData::quantity("nonce", &fields.nonce)?,
            max_priority_fee_per_gas: TxFieldData::quantity(
                "maxPriorityFeePerGas",
                &fields.max_priority_fee_per_gas,
            )?,
            max_fee_per_gas: TxFieldData::quantity("maxFeePerGas", &fields.max_fee_per_gas)?,
            gas_limit: TxFieldData::quantity("gasLimit", &fields.gas_limit)?,
            to: fields.kind()?,
            value: TxFieldData::quantity("value", &fields.value)?,
            data: fields.payload()?,
            access_list: access_list_from_fields(fields)?,
            signature: fields.signature()?,
        }
        .validated()
    }

    pub fn from_serialized_bytes(bytes: &[u8]) -> Result<Self, TxError> {
        let values = decode_values(Self::TX_TYPE, bytes)?;
        Self::from_values(&values)
    }

    pub fn from_values(values: &[RlpItem]) -> Result<Self, TxError> {
        let signed = check_arity(Self::TX_TYPE, values)?;
        check_canonical(Self::TX_TYPE, values)?;
        let signature = match signed {
            true => signature_from_values(&values[9..])?,
            false => None,
        };
        Self {
            chain_id: quantity("chainId", &values[0])?,
            nonce: quantity("nonce", &values[1])?,
            max_priority_fee_per_gas: quantity("maxPriorityFeePerGas", &values[2])?,
            max_fee_per_gas: quantity("maxFeePerGas", &values[3])?,
            gas_limit: quantity("gasLimit", &values[4])?,
            to: kind_from_value(&values[5])?,
            value: quantity("value", &values[6])?,
            data: payload_from_value(&values[7])?,
            access_list: tx_fields::from_rlp_item(&values[8])?,
            signature,
        }
        .validated()
    }

    fn validated(self) -> Result<Self, TxError> {
        checked_fee_product(self.gas_limit, self.max_fee_per_gas, "maxFeePerGas")?;
        check_fee_cap(self.max_fee_per_gas, self.max_priority_fee_per_gas)?;
        if let Some(signature) = &self.signature {
            check_signature(Self::TX_TYPE, signature)?;
        }
        Ok(self)
    }

    pub fn chain_id(&self) -> U256 {
        self.chain_id
    }

    pub fn nonce(&self) -> U256 {
        self.nonce
    }

    pub fn max_priority_fee_per_gas(&self) -> U256 {
        self.max_priority_fee_per_gas
    }

    pub fn max_fee_per_gas(&self) -> U256 {
        self.max_fee_per_gas
    }

    pub fn gas_limit(&self) -> U256 {
        self.gas_limit
    }

    pub fn to(&self) -> TxKind {
        self.to
    }

    pub fn value(&self) -> U256 {
        self.value
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn access_list(&self) -> &AccessList {
        &self.access_list
    }

    fn v_encoding(&self) -> VEncoding {
        VEncoding::Parity
    }

    fn encode_unsigned_fields<'a>(&self, encoder: Encoder<'a>) -> Encoder<'a> {
        encoder
            .encode_field(&self.chain_id)
            .encode_field(&self.nonce)
            .encode_field(&self.max_priority_fee_per_gas)
            .encode_field(&self.max_fee_per_gas)
            .encode_field(&self.gas_limit)
            .encode_field(&self.to)
            .encode_field(&self.value)
            .encode_field(&self.data)
            .encode_field(&self.access_list)
    }

    pub fn raw_values(&self) -> Vec<RlpItem> {
        let mut values = vec![
            quantity_item(self.chain_id),
            quantity_item(self.nonce),
            quantity_item(self.max_priority_fee_per_gas),
            quantity_item(self.max_fee_per_gas),
            quantity_item(self.gas_limit),
            kind_item(self.to),
            quantity_item(self.value),
            RlpItem::Bytes(self.data.clone()),
            tx_fields::to_rlp_item(&self.access_list),
        ];
        values.extend(signature_items(self.signature));
        values
    }

    pub fn serialize(&self) -> Bytes {
        frame(Self::TX_TYPE, &self.encode_to_vec())
    }

    pub fn signing_message(&self) -> Bytes {
        let mut buf = vec![];
        self.encode_unsigned_fields(Encoder::new(&mut buf)).finish();
        frame(Self::TX_TYPE, &buf)
    }

    /// Attaches a signature given with its wire `v`, the y-parity.
    pub fn with_signature(&self, v: U256, r: U256, s: U256) -> Result<Self, TxError> {
        Self {
            signature: Some(TxSignature { v, r, s }),
            ..self.clone()
        }
        .validated()
    }

    pub fn to_json(&self) -> JsonTx {
        JsonTx {
            tx_type: U256::from(u8::from(Self::TX_TYPE)),
            chain_id: Some(self.chain_id),
            nonce: self.nonce,
            gas_price: None,
            max_priority_fee_per_gas: Some(self.max_priority_fee_per_gas),
            max_fee_per_gas: Some(self.max_fee_per_gas),
            gas_limit: self.gas_limit,
            to: self.to.address(),
            value: self.value,
            data: self.data.clone(),
            access_list: Some(tx_fields::to_json(&self.access_list)),
            v: self.v(),
            r: self.signature.map(|signature| signature.r),
            s: self.signature.map(|signature| signature.s),
        }
    }
}

impl_signature_ops!(LegacyTransaction);
impl_signature_ops!(EIP2930Transaction);
impl_signature_ops!(EIP1559Transaction);

impl RLPEncode for LegacyTransaction {
    fn encode(&self, buf: &mut dyn BufMut) {
        let signature = self.signature.unwrap_or_default();
        self.encode_unsigned_fields(Encoder::new(buf))
            .encode_field(&signature.v)
            .encode_field(&signature.r)
            .encode_field(&signature.s)
            .finish();
    }
}

impl RLPEncode for EIP2930Transaction {
    fn encode(&self, buf: &mut dyn BufMut) {
        let signature = self.signature.unwrap_or_default();
        self.encode_unsigned_fields(Encoder::new(buf))
            .encode_field(&signature.v)
            .encode_field(&signature.r)
            .encode_field(&signature.s)
            .finish();
    }
}

impl RLPEncode for EIP1559Transaction {
    fn encode(&self, buf: &mut dyn BufMut) {
        let signature = self.signature.unwrap_or_default();
        self.encode_unsigned_fields(Encoder::new(buf))
            .encode_field(&signature.v)
            .encode_field(&signature.r)
            .encode_field(&signature.s)
            .finish();
    }
}

impl From<LegacyTransaction> for Transaction {
    fn from(tx: LegacyTransaction) -> Self {
        Transaction::LegacyTransaction(tx)
    }
}

impl From<EIP2930Transaction> for Transaction {
    fn from(tx: EIP2930Transaction) -> Self {
        Transaction::EIP2930Transaction(tx)
    }
}

impl From<EIP1559Transaction> for Transaction {
    fn from(tx: EIP1559Transaction) -> Self {
        Transaction::EIP1559Transaction(tx)
    }
}

macro_rules! each_variant {
    ($tx:expr, $inner:ident => $body:expr) => {
        match $tx {
            Transaction::LegacyTransaction($inner) => $body,
            Transaction::EIP2930Transaction($inner) => $body,
            Transaction::EIP1559Transaction($inner) => $body,
        }
    };
}

impl Transaction {
    pub fn tx_type(&self) -> TxType {
        match self {
            Transaction::LegacyTransaction(_) => TxType::Legacy,
            Transaction::EIP2930Transaction(_) => TxType::EIP2930,
            Transaction::EIP1559Transaction(_) => TxType::EIP1559,
        }
    }

    /// Builds the variant named by the fields' `type`, or the one implied by
    /// the fields present.
    pub fn from_field_data(fields: &TxFieldData) -> Result<Self, TxError> {
        match fields.tx_type()? {
            TxType::Legacy => LegacyTransaction::from_field_data(fields).map(Into::into),
            TxType::EIP2930 => EIP2930Transaction::from_field_data(fields).map(Into::into),
            TxType::EIP1559 => EIP1559Transaction::from_field_data(fields).map(Into::into),
        }
    }

    pub fn from_serialized_bytes(bytes: &[u8]) -> Result<Self, TxError> {
        Self::from_serialized_bytes_with_chain_id(bytes, None)
    }

    /// Dispatches on the first byte: an RLP list header means legacy, `0x01`
    /// and `0x02` the typed variants. `chain_id` only applies to legacy
    /// transactions.
    pub fn from_serialized_bytes_with_chain_id(
        bytes: &[u8],
        chain_id: Option<U256>,
    ) -> Result<Self, TxError> {
        let Some(&first_byte) = bytes.first() else {
            return Err(TxError::MalformedFields(
                "empty transaction bytes".to_string(),
            ));
        };
        let tx: Transaction = match first_byte {
            0xc0..=0xff => {
                LegacyTransaction::from_serialized_bytes_with_chain_id(bytes, chain_id)?.into()
            }
            0x01 => EIP2930Transaction::from_serialized_bytes(bytes)?.into(),
            0x02 => EIP1559Transaction::from_serialized_bytes(bytes)?.into(),
            other => {
                return Err(TxError::MalformedFields(format!(
                    "unknown transaction type 0x{other:02x}"
                )));
            }
        };
        debug!(tx_type = %tx.tx_type(), signed = tx.is_signed(), "Decoded transaction");
        Ok(tx)
    }

    pub fn from_values(tx_type: TxType, values: &[RlpItem]) -> Result<Self, TxError> {
        match tx_type {
            TxType::Legacy => LegacyTransaction::from_values(values).map(Into::into),
            TxType::EIP2930 => EIP2930Transaction::from_values(values).map(Into::into),
            TxType::EIP1559 => EIP1559Transaction::from_values(values).map(Into::into),
        }
    }

    pub fn chain_id(&self) -> Option<U256> {
        match self {
            Transaction::LegacyTransaction(tx) => tx.chain_id(),
            Transaction::EIP2930Transaction(tx) => Some(tx.chain_id()),
            Transaction::EIP1559Transaction(tx) => Some(tx.chain_id()),
        }
    }

    pub fn nonce(&self) -> U256 {
        each_variant!(self, tx => tx.nonce())
    }

    pub fn gas_limit(&self) -> U256 {
        each_variant!(self, tx => tx.gas_limit())
    }

    pub fn to(&self) -> TxKind {
        each_variant!(self, tx => tx.to())
    }

    pub fn value(&self) -> U256 {
        each_variant!(self, tx => tx.value())
    }

    pub fn data(&self) -> &Bytes {
        each_variant!(self, tx => tx.data())
    }

    pub fn access_list(&self) -> Option<&AccessList> {
        match self {
            Transaction::LegacyTransaction(_) => None,
            Transaction::EIP2930Transaction(tx) => Some(tx.access_list()),
            Transaction::EIP1559Transaction(tx) => Some(tx.access_list()),
        }
    }

    pub fn signature(&self) -> Option<&TxSignature> {
        each_variant!(self, tx => tx.signature())
    }

    pub fn is_signed(&self) -> bool {
        each_variant!(self, tx => tx.is_signed())
    }

    pub fn v(&self) -> Option<U256> {
        each_variant!(self, tx => tx.v())
    }

    pub fn recovery_id(&self) -> Result<RecoveryId, TxError> {
        each_variant!(self, tx => tx.recovery_id())
    }

    pub fn raw_values(&self) -> Vec<RlpItem> {
        each_variant!(self, tx => tx.raw_values())
    }

    pub fn serialize(&self) -> Bytes {
        each_variant!(self, tx => tx.serialize())
    }

    pub fn signing_message(&self) -> Bytes {
        each_variant!(self, tx => tx.signing_message())
    }

    pub fn signing_hash(&self) -> H256 {
        each_variant!(self, tx => tx.signing_hash())
    }

    pub fn with_signature(&self, v: U256, r: U256, s: U256) -> Result<Self, TxError> {
        each_variant!(self, tx => tx.with_signature(v, r, s).map(Into::into))
    }

    pub fn with_recovery_id(
        &self,
        recovery_id: RecoveryId,
        r: U256,
        s: U256,
    ) -> Result<Self, TxError> {
        each_variant!(self, tx => tx.with_recovery_id(recovery_id, r, s).map(Into::into))
    }

    pub fn sign_with(&self, signer: &(impl HashSigner + ?Sized)) -> Result<Self, TxError> {
        each_variant!(self, tx => tx.sign_with(signer).map(Into::into))
    }

    pub fn verify_signature(&self, expected: Option<&H512>) -> Result<H512, TxError> {
        each_variant!(self, tx => tx.verify_signature(expected))
    }

    pub fn sender(&self) -> Result<Address, TxError> {
        each_variant!(self, tx => tx.sender())
    }

    pub fn hash(&self) -> Result<H256, TxError> {
        each_variant!(self, tx => tx.hash())
    }

    pub fn to_json(&self) -> JsonTx {
        each_variant!(self, tx => tx.to_json())
    }
}
