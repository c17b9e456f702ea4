//! Canonical integer handling: minimal big endian bytes, no leading zero byte,
//! and nothing above `2^256 - 1`.

use ethereum_types::U256;

use crate::errors::TxError;

/// Minimal big endian representation of `value`; zero is the empty buffer.
pub fn to_unpadded_bytes(value: U256) -> Vec<u8> {
    let bytes = value.to_big_endian();
    let start = (value.leading_zeros() / 8) as usize;
    bytes[start..].to_vec()
}

/// Reads an integer field written in canonical form.
pub fn quantity_from_bytes(field: &str, bytes: &[u8]) -> Result<U256, TxError> {
    validate_no_leading_zeroes(&[(field, bytes)])?;
    if bytes.len() > 32 {
        return Err(TxError::NumericOverflow(format!(
            "{field} does not fit in 256 bits ({} bytes)",
            bytes.len()
        )));
    }
    Ok(U256::from_big_endian(bytes))
}

/// Fails with every field whose value starts with a zero byte.
pub fn validate_no_leading_zeroes(fields: &[(&str, &[u8])]) -> Result<(), TxError> {
    let offending: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.first() == Some(&0))
        .map(|(name, _)| *name)
        .collect();
    if offending.is_empty() {
        return Ok(());
    }
    Err(TxError::InvalidFormat(format!(
        "{} cannot have leading zeroes",
        offending.join(", ")
    )))
}

/// Parses a `0x` prefixed hex or a decimal quantity. Empty input (or a bare `0x`) is zero.
pub fn parse_quantity(field: &str, text: &str) -> Result<U256, TxError> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TxError::MalformedFields(format!(
                "{field}: invalid hex quantity {text:?}"
            )));
        }
        let digits = hex.trim_start_matches('0');
        if digits.is_empty() {
            return Ok(U256::zero());
        }
        // a U256 holds at most 64 significant hex digits
        if digits.len() > 64 {
            return Err(overflow(field));
        }
        U256::from_str_radix(digits, 16).map_err(|_| overflow(field))
    } else {
        if !text.chars().all(|c| c.is_ascii_digit()) {
            return Err(TxError::MalformedFields(format!(
                "{field}: invalid decimal quantity {text:?}"
            )));
        }
        let digits = text.trim_start_matches('0');
        if digits.is_empty() {
            return Ok(U256::zero());
        }
        U256::from_dec_str(digits).map_err(|_| overflow(field))
    }
}

/// `gas_limit * price`, failing if the product leaves the 256-bit range.
pub fn checked_fee_product(gas_limit: U256, price: U256, price_field: &str) -> Result<U256, TxError> {
    gas_limit.checked_mul(price).ok_or_else(|| {
        TxError::NumericOverflow(format!(
            "gasLimit * {price_field} cannot exceed 2^256 - 1"
        ))
    })
}

fn overflow(field: &str) -> TxError {
    TxError::NumericOverflow(format!("{field} cannot exceed 2^256 - 1"))
}
