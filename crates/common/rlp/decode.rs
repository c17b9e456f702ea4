use super::{
    constants::{RLP_EMPTY_LIST, RLP_NULL, SHORT_PAYLOAD_LIMIT},
    error::RLPDecodeError,
    structs::Decoder,
};
use bytes::Bytes;
use ethereum_types::{Address, H160, H256, U256};

/// Max payload size accepted when decoding.
/// RLP itself puts no bound on lengths, but no transaction carries a payload
/// this large.
pub const MAX_RLP_BYTES: usize = 1024 * 1024 * 1024;

/// Max list nesting accepted by [`RlpItem`](crate::item::RlpItem) decoding.
/// A typed transaction reaches four levels through its access list.
pub const MAX_RLP_DEPTH: usize = 16;

/// Trait for decoding RLP encoded slices of data.
/// See <https://ethereum.org/en/developers/docs/data-structures-and-encoding/rlp/#rlp-decoding> for more information.
/// The [`decode_unfinished`](RLPDecode::decode_unfinished) method is used to decode an RLP encoded slice of data and return the decoded value along with the remaining bytes.
/// The [`decode`](RLPDecode::decode) method is used to decode an RLP encoded slice of data and return the decoded value.
/// Implementors need to implement the [`decode_unfinished`](RLPDecode::decode_unfinished) method.
/// While consumers can use the [`decode`](RLPDecode::decode) method to decode the RLP encoded data.
pub trait RLPDecode: Sized {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError>;

    fn decode(rlp: &[u8]) -> Result<Self, RLPDecodeError> {
        let (decoded, remaining) = Self::decode_unfinished(rlp)?;
        if !remaining.is_empty() {
            return Err(RLPDecodeError::invalid_length());
        }

        Ok(decoded)
    }
}

impl RLPDecode for bool {
    #[inline(always)]
    fn decode_unfinished(buf: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        if buf.is_empty() {
            return Err(RLPDecodeError::invalid_length());
        }
        let value = match buf[0] {
            RLP_NULL => false,
            0x01 => true,
            b => return Err(RLPDecodeError::malformed_boolean(b)),
        };

        Ok((value, &buf[1..]))
    }
}

macro_rules! impl_decode_uint {
    ($($t:ty),+) => {
        $(impl RLPDecode for $t {
            fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
                let (bytes, rest) = decode_bytes(rlp)?;
                let padded_bytes = static_left_pad(bytes)?;
                Ok((<$t>::from_be_bytes(padded_bytes), rest))
            }
        })+
    };
}

impl_decode_uint!(u8, u16, u32, u64, usize, u128);

// Decodes a slice of bytes of a fixed size. If you want to decode a list of elements,
// you should use the Vec<T> implementation (for elements of the same type),
// or use the decode implementation for tuples (for elements of different types)
impl<const N: usize> RLPDecode for [u8; N] {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (decoded_bytes, rest) = decode_bytes(rlp)?;
        let value = decoded_bytes
            .try_into()
            .map_err(|_| RLPDecodeError::invalid_length());

        Ok((value?, rest))
    }
}

impl RLPDecode for Bytes {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (decoded, rest) = decode_bytes(rlp)?;
        Ok((Bytes::copy_from_slice(decoded), rest))
    }
}

impl RLPDecode for H256 {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (value, rest) = RLPDecode::decode_unfinished(rlp)?;
        Ok((H256(value), rest))
    }
}

impl RLPDecode for Address {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (value, rest) = RLPDecode::decode_unfinished(rlp)?;
        Ok((H160(value), rest))
    }
}

impl RLPDecode for U256 {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = decode_bytes(rlp)?;
        let padded_bytes: [u8; 32] = static_left_pad(bytes)?;
        Ok((U256::from_big_endian(&padded_bytes), rest))
    }
}

impl RLPDecode for String {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (str_bytes, rest) = decode_bytes(rlp)?;
        let value =
            String::from_utf8(str_bytes.to_vec()).map_err(|_| RLPDecodeError::malformed_data())?;
        Ok((value, rest))
    }
}

// Here we interpret a Vec<T> as a list of elements of the same type.
// If you need to decode a slice of bytes, you should decode it via the
// [u8; N] implementation or similar (Bytes, etc).
impl<T: RLPDecode> RLPDecode for Vec<T> {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        if rlp.is_empty() {
            return Err(RLPDecodeError::invalid_length());
        }

        if rlp[0] == RLP_EMPTY_LIST {
            return Ok((Vec::new(), &rlp[1..]));
        }

        let (is_list, payload, input_rest) = decode_rlp_item(rlp)?;
        if !is_list {
            return Err(RLPDecodeError::unexpected_string());
        }

        let mut result = Vec::new();
        let mut current_slice = payload;

        while !current_slice.is_empty() {
            let (item, rest_current_list) = T::decode_unfinished(current_slice)?;
            result.push(item);
            current_slice = rest_current_list;
        }

        Ok((result, input_rest))
    }
}

impl<T1: RLPDecode, T2: RLPDecode> RLPDecode for (T1, T2) {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let decoder = Decoder::new(rlp)?;
        let (first, decoder) = decoder.decode_field("0")?;
        let (second, decoder) = decoder.decode_field("1")?;
        Ok(((first, second), decoder.finish()?))
    }
}

impl<T1: RLPDecode, T2: RLPDecode, T3: RLPDecode> RLPDecode for (T1, T2, T3) {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let decoder = Decoder::new(rlp)?;
        let (first, decoder) = decoder.decode_field("0")?;
        let (second, decoder) = decoder.decode_field("1")?;
        let (third, decoder) = decoder.decode_field("2")?;
        Ok(((first, second, third), decoder.finish()?))
    }
}

impl<T1: RLPDecode, T2: RLPDecode, T3: RLPDecode, T4: RLPDecode> RLPDecode for (T1, T2, T3, T4) {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let decoder = Decoder::new(rlp)?;
        let (first, decoder) = decoder.decode_field("0")?;
        let (second, decoder) = decoder.decode_field("1")?;
        let (third, decoder) = decoder.decode_field("2")?;
        let (fourth, decoder) = decoder.decode_field("3")?;
        Ok(((first, second, third, fourth), decoder.finish()?))
    }
}

/// Parsed item header: whether the item is a list, how many bytes the prefix
/// takes, and how many bytes of payload follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    is_list: bool,
    prefix_len: usize,
    payload_len: usize,
}

/// Reads and validates the prefix of the item at the start of `data`.
///
/// Rejects every alternate encoding of the same value:
/// - a single byte below 0x80 wrapped in a `0x81` prefix
/// - the long form used for a payload shorter than 56 bytes
/// - a length-of-length with leading zero bytes
///
/// and any header announcing more bytes than `data` holds.
fn parse_header(data: &[u8]) -> Result<Header, RLPDecodeError> {
    let first_byte = *data.first().ok_or(RLPDecodeError::invalid_length())?;

    let header = match first_byte {
        0..=0x7F => Header {
            is_list: false,
            prefix_len: 0,
            payload_len: 1,
        },
        RLP_NULL..=0xB7 => {
            let payload_len = (first_byte - RLP_NULL) as usize;
            if payload_len == 1 && data.get(1).is_some_and(|b| *b < RLP_NULL) {
                return Err(RLPDecodeError::non_canonical());
            }
            Header {
                is_list: false,
                prefix_len: 1,
                payload_len,
            }
        }
        0xB8..=0xBF => {
            let length_of_length = (first_byte - 0xB7) as usize;
            Header {
                is_list: false,
                prefix_len: 1 + length_of_length,
                payload_len: read_long_length(data, length_of_length)?,
            }
        }
        RLP_EMPTY_LIST..=0xF7 => Header {
            is_list: true,
            prefix_len: 1,
            payload_len: (first_byte - RLP_EMPTY_LIST) as usize,
        },
        0xF8..=0xFF => {
            let length_of_length = (first_byte - 0xF7) as usize;
            Header {
                is_list: true,
                prefix_len: 1 + length_of_length,
                payload_len: read_long_length(data, length_of_length)?,
            }
        }
    };

    if header.payload_len > MAX_RLP_BYTES
        || data.len() < header.prefix_len.saturating_add(header.payload_len)
    {
        return Err(RLPDecodeError::invalid_length());
    }
    Ok(header)
}

fn read_long_length(data: &[u8], length_of_length: usize) -> Result<usize, RLPDecodeError> {
    let length_bytes = data
        .get(1..length_of_length + 1)
        .ok_or(RLPDecodeError::invalid_length())?;
    if length_bytes.len() > size_of::<usize>() {
        return Err(RLPDecodeError::invalid_length());
    }
    let length = usize::from_be_bytes(static_left_pad(length_bytes)?);
    if length < SHORT_PAYLOAD_LIMIT {
        return Err(RLPDecodeError::non_canonical());
    }
    Ok(length)
}

/// Decodes an RLP item from a slice of bytes.
/// It returns a 3-element tuple with the following elements:
/// - A boolean indicating if the item is a list or not.
/// - The payload of the item, without its prefix.
/// - The remaining bytes after the item.
pub fn decode_rlp_item(data: &[u8]) -> Result<(bool, &[u8], &[u8]), RLPDecodeError> {
    let header = parse_header(data)?;
    let end = header.prefix_len + header.payload_len;
    Ok((header.is_list, &data[header.prefix_len..end], &data[end..]))
}

/// Splits an RLP item in two:
/// - The first item including its prefix
/// - The remaining bytes after the item
pub fn get_item_with_prefix(data: &[u8]) -> Result<(&[u8], &[u8]), RLPDecodeError> {
    let header = parse_header(data)?;
    Ok(data.split_at(header.prefix_len + header.payload_len))
}

/// Decodes the payload of an RLP item from a slice of bytes.
/// It returns a 2-element tuple with the following elements:
/// - The payload of the item.
/// - The remaining bytes after the item.
pub fn decode_bytes(data: &[u8]) -> Result<(&[u8], &[u8]), RLPDecodeError> {
    let (is_list, payload, rest) = decode_rlp_item(data)?;
    if is_list {
        return Err(RLPDecodeError::unexpected_list());
    }
    Ok((payload, rest))
}

/// Pads a slice of bytes with zeros on the left to make it a fixed size slice.
/// The size of the data must be less than or equal to the size of the output array,
/// and its first byte must not be zero.
#[inline]
pub fn static_left_pad<const N: usize>(data: &[u8]) -> Result<[u8; N], RLPDecodeError> {
    let mut result = [0; N];

    if data.is_empty() {
        return Ok(result);
    }
    if data[0] == 0 {
        return Err(RLPDecodeError::non_canonical());
    }
    if data.len() > N {
        return Err(RLPDecodeError::invalid_length());
    }
    let data_start_index = N.saturating_sub(data.len());
    result
        .get_mut(data_start_index..)
        .ok_or(RLPDecodeError::invalid_length())?
        .copy_from_slice(data);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn decode_integers() {
        assert_eq!(u8::decode(&[RLP_NULL]).unwrap(), 0);
        assert_eq!(u8::decode(&[0x7f]).unwrap(), 0x7f);
        assert_eq!(u8::decode(&[0x81, 0x80]).unwrap(), 0x80);
        assert_eq!(u16::decode(&[0x82, 0x04, 0x00]).unwrap(), 1024);
        assert_eq!(u64::decode(&hex!("8504a817c800")).unwrap(), 20_000_000_000);
        assert_eq!(
            U256::decode(&hex!("880de0b6b3a7640000")).unwrap(),
            U256::from(1_000_000_000_000_000_000u64)
        );
    }

    #[test]
    fn single_byte_with_prefix_is_non_canonical() {
        assert_eq!(
            u8::decode(&[0x81, 0x05]),
            Err(RLPDecodeError::non_canonical())
        );
        assert_eq!(
            Bytes::decode(&[0x81, 0x00]),
            Err(RLPDecodeError::non_canonical())
        );
    }

    #[test]
    fn integer_with_leading_zero_is_non_canonical() {
        assert_eq!(
            u64::decode(&[0x82, 0x00, 0x01]),
            Err(RLPDecodeError::non_canonical())
        );
        assert_eq!(u64::decode(&[0x00]), Err(RLPDecodeError::non_canonical()));
    }

    #[test]
    fn long_form_for_short_payload_is_non_canonical() {
        // "dog" padded into the long string form
        let padded = hex!("b803646f67");
        assert_eq!(
            Bytes::decode(&padded),
            Err(RLPDecodeError::non_canonical())
        );
        let padded_list = hex!("f8020102");
        assert_eq!(
            Vec::<u8>::decode(&padded_list),
            Err(RLPDecodeError::non_canonical())
        );
    }

    #[test]
    fn length_of_length_with_leading_zero_is_non_canonical() {
        let mut encoded = vec![0xb9, 0x00, 0x38];
        encoded.extend_from_slice(&[0xaa; 0x38]);
        assert_eq!(
            Bytes::decode(&encoded),
            Err(RLPDecodeError::non_canonical())
        );
    }

    #[test]
    fn accept_long_form_at_boundary() {
        let mut encoded = vec![0xb8, 0x38];
        encoded.extend_from_slice(&[0xaa; 0x38]);
        assert_eq!(Bytes::decode(&encoded).unwrap().len(), 0x38);
    }

    #[test]
    fn reject_trailing_bytes() {
        assert_eq!(
            u8::decode(&[0x01, 0x02]),
            Err(RLPDecodeError::invalid_length())
        );
    }

    #[test]
    fn reject_truncated_input() {
        assert_eq!(
            Bytes::decode(&hex!("83646f")),
            Err(RLPDecodeError::invalid_length())
        );
        assert_eq!(
            Vec::<u8>::decode(&hex!("c30102")),
            Err(RLPDecodeError::invalid_length())
        );
        assert_eq!(
            Bytes::decode(&hex!("b9")),
            Err(RLPDecodeError::invalid_length())
        );
    }

    #[test]
    fn decode_fixed_size_hashes() {
        let address = Address::decode(&hex!("943535353535353535353535353535353535353535")).unwrap();
        assert_eq!(address, Address::repeat_byte(0x35));
        assert_eq!(
            Address::decode(&hex!("933535353535353535353535353535353535353535")),
            Err(RLPDecodeError::invalid_length())
        );
        let mut encoded = vec![0xa0];
        encoded.extend_from_slice(&[0x11; 32]);
        assert_eq!(H256::decode(&encoded).unwrap(), H256::repeat_byte(0x11));
    }

    #[test]
    fn decode_lists_and_tuples() {
        assert_eq!(Vec::<u8>::decode(&[RLP_EMPTY_LIST]).unwrap(), Vec::<u8>::new());
        assert_eq!(
            Vec::<String>::decode(&hex!("c88363617483646f67")).unwrap(),
            vec!["cat".to_string(), "dog".to_string()]
        );
        assert_eq!(
            <(u8, String)>::decode(&hex!("c50183646f67")).unwrap(),
            (1, "dog".to_string())
        );
        assert!(<(u8, u8)>::decode(&hex!("c3010203")).is_err());
        assert_eq!(
            Vec::<u8>::decode(&hex!("83646f67")),
            Err(RLPDecodeError::unexpected_string())
        );
    }

    #[test]
    fn decode_bool() {
        assert!(bool::decode(&[0x01]).unwrap());
        assert!(!bool::decode(&[RLP_NULL]).unwrap());
        assert_eq!(
            bool::decode(&[0x02]),
            Err(RLPDecodeError::malformed_boolean(0x02))
        );
    }
}
