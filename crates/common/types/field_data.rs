use bytes::Bytes;
use ethereum_types::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::{
    canonical::parse_quantity,
    errors::TxError,
    serde_utils,
    types::{AccessListEntry, TxKind, TxSignature, TxType},
};

/// Loosely typed transaction fields, as they come from JSON or user input.
///
/// Every quantity is kept as text (hex with `0x` or decimal) and only parsed
/// when a transaction is built from it, so range errors name the field.
/// Absent quantities default to zero, an absent or empty `to` means contract
/// creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxFieldData {
    #[serde(
        default,
        rename = "type",
        with = "serde_utils::quantity::opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub tx_type: Option<String>,
    #[serde(default, with = "serde_utils::quantity::opt", skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
    #[serde(default, with = "serde_utils::quantity::opt", skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(default, with = "serde_utils::quantity::opt", skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    #[serde(
        default,
        alias = "gas",
        with = "serde_utils::quantity::opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub gas_limit: Option<String>,
    #[serde(default, with = "serde_utils::quantity::opt", skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<String>,
    #[serde(default, with = "serde_utils::quantity::opt", skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, with = "serde_utils::quantity::opt", skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_list: Option<Vec<AccessListEntry>>,
    #[serde(default, with = "serde_utils::quantity::opt", skip_serializing_if = "Option::is_none")]
    pub v: Option<String>,
    #[serde(default, with = "serde_utils::quantity::opt", skip_serializing_if = "Option::is_none")]
    pub r: Option<String>,
    #[serde(default, with = "serde_utils::quantity::opt", skip_serializing_if = "Option::is_none")]
    pub s: Option<String>,
}

impl TxFieldData {
    /// The explicit `type`, or the one implied by the fields present:
    /// fee market fields mean EIP-1559, an access list alone means EIP-2930.
    pub fn tx_type(&self) -> Result<TxType, TxError> {
        if let Some(tx_type) = &self.tx_type {
            let value = parse_quantity("type", tx_type)?;
            return (value <= U256::from(u8::MAX))
                .then(|| value.low_u32() as u8)
                .and_then(TxType::from_u8)
                .ok_or_else(|| {
                    TxError::MalformedFields(format!("type: unsupported transaction type {tx_type}"))
                });
        }
        if self.max_fee_per_gas.is_some() || self.max_priority_fee_per_gas.is_some() {
            Ok(TxType::EIP1559)
        } else if self.access_list.is_some() {
            Ok(TxType::EIP2930)
        } else {
            Ok(TxType::Legacy)
        }
    }

    /// Fails when a field that has no meaning for `tx_type` is set.
    pub(crate) fn check_applicable(&self, tx_type: TxType) -> Result<(), TxError> {
        let inapplicable: &[(&str, bool)] = match tx_type {
            TxType::Legacy => &[
                ("maxPriorityFeePerGas", self.max_priority_fee_per_gas.is_some()),
                ("maxFeePerGas", self.max_fee_per_gas.is_some()),
                ("accessList", self.access_list.is_some()),
            ],
            TxType::EIP2930 => &[
                ("maxPriorityFeePerGas", self.max_priority_fee_per_gas.is_some()),
                ("maxFeePerGas", self.max_fee_per_gas.is_some()),
            ],
            TxType::EIP1559 => &[("gasPrice", self.gas_price.is_some())],
        };
        match inapplicable.iter().find(|(_, present)| *present) {
            Some((field, _)) => Err(TxError::MalformedFields(format!(
                "{field} is not a field of {tx_type:?} transactions"
            ))),
            None => Ok(()),
        }
    }

    /// Parses a quantity, defaulting to zero when absent.
    pub(crate) fn quantity(field: &str, value: &Option<String>) -> Result<U256, TxError> {
        value
            .as_deref()
            .map_or(Ok(U256::zero()), |value| parse_quantity(field, value))
    }

    pub(crate) fn kind(&self) -> Result<TxKind, TxError> {
        let Some(to) = self.to.as_deref().map(str::trim) else {
            return Ok(TxKind::Create);
        };
        let to = to.trim_start_matches("0x");
        if to.is_empty() {
            return Ok(TxKind::Create);
        }
        let bytes = hex::decode(to)
            .map_err(|e| TxError::MalformedFields(format!("to: {e}")))?;
        if bytes.len() != Address::len_bytes() {
            return Err(TxError::InvalidFormat(format!(
                "to must be 20 bytes, got {}",
                bytes.len()
            )));
        }
        Ok(TxKind::Call(Address::from_slice(&bytes)))
    }

    pub(crate) fn payload(&self) -> Result<Bytes, TxError> {
        let Some(data) = self.data.as_deref() else {
            return Ok(Bytes::new());
        };
        hex::decode(data.trim().trim_start_matches("0x"))
            .map(Bytes::from)
            .map_err(|e| TxError::MalformedFields(format!("data: {e}")))
    }

    /// `None` when no signature component is given, an error when only some are.
    pub(crate) fn signature(&self) -> Result<Option<TxSignature>, TxError> {
        let given = |value: &Option<String>| {
            value
                .as_deref()
                .is_some_and(|value| !value.trim().trim_start_matches("0x").is_empty())
        };
        match (given(&self.v), given(&self.r), given(&self.s)) {
            (false, false, false) => Ok(None),
            (true, true, true) => Ok(Some(TxSignature {
                v: Self::quantity("v", &self.v)?,
                r: Self::quantity("r", &self.r)?,
                s: Self::quantity("s", &self.s)?,
            })),
            _ => Err(TxError::MalformedFields(
                "v, r and s must either all be set or all be absent".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infer_type_from_fields() {
        let legacy = TxFieldData::default();
        assert_eq!(legacy.tx_type().unwrap(), TxType::Legacy);

        let access_list = TxFieldData {
            access_list: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(access_list.tx_type().unwrap(), TxType::EIP2930);

        let fee_market = TxFieldData {
            max_fee_per_gas: Some("0x1".to_string()),
            access_list: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(fee_market.tx_type().unwrap(), TxType::EIP1559);

        let explicit = TxFieldData {
            tx_type: Some("0x01".to_string()),
            ..Default::default()
        };
        assert_eq!(explicit.tx_type().unwrap(), TxType::EIP2930);
    }

    #[test]
    fn reject_unknown_type() {
        for tx_type in ["0x03", "0x7f", "0x100"] {
            let fields = TxFieldData {
                tx_type: Some(tx_type.to_string()),
                ..Default::default()
            };
            assert!(matches!(fields.tx_type(), Err(TxError::MalformedFields(_))));
        }
    }

    #[test]
    fn reject_inapplicable_fields() {
        let fields = TxFieldData {
            gas_price: Some("0x1".to_string()),
            max_fee_per_gas: Some("0x1".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            fields.check_applicable(TxType::EIP1559),
            Err(TxError::MalformedFields(msg)) if msg.contains("gasPrice")
        ));
        assert!(fields.check_applicable(TxType::Legacy).is_err());
    }

    #[test]
    fn destination_and_payload() {
        let fields = TxFieldData {
            to: Some("0x3535353535353535353535353535353535353535".to_string()),
            data: Some("0xabcd".to_string()),
            ..Default::default()
        };
        assert_eq!(fields.kind().unwrap(), TxKind::Call(Address::repeat_byte(0x35)));
        assert_eq!(fields.payload().unwrap().as_ref(), &[0xab, 0xcd]);

        let create = TxFieldData {
            to: Some("0x".to_string()),
            ..Default::default()
        };
        assert_eq!(create.kind().unwrap(), TxKind::Create);

        let short = TxFieldData {
            to: Some("0x3535".to_string()),
            ..Default::default()
        };
        assert!(matches!(short.kind(), Err(TxError::InvalidFormat(_))));
    }

    #[test]
    fn partial_signature_is_malformed() {
        let fields = TxFieldData {
            v: Some("0x1".to_string()),
            r: Some("0x2".to_string()),
            ..Default::default()
        };
        assert!(matches!(fields.signature(), Err(TxError::MalformedFields(_))));
        assert_eq!(TxFieldData::default().signature().unwrap(), None);
    }

    #[test]
    fn deserialize_json_request() {
        let fields: TxFieldData = serde_json::from_str(
            r#"{
                "nonce": 9,
                "gasPrice": "20000000000",
                "gas": "0x5208",
                "to": "0x3535353535353535353535353535353535353535",
                "value": "0xde0b6b3a7640000",
                "chainId": 1
            }"#,
        )
        .unwrap();
        assert_eq!(fields.nonce.as_deref(), Some("9"));
        assert_eq!(fields.gas_limit.as_deref(), Some("0x5208"));
        assert_eq!(
            TxFieldData::quantity("gasPrice", &fields.gas_price).unwrap(),
            U256::from(20_000_000_000u64)
        );
        assert_eq!(fields.tx_type().unwrap(), TxType::Legacy);
    }
}
