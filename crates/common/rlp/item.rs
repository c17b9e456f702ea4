//! Untyped RLP structure: a byte string, or a list of further items.
//!
//! Used where the shape of the input is validated before the values are
//! interpreted, e.g. access lists and transaction value arrays.

use bytes::{BufMut, Bytes};

use crate::{
    decode::{MAX_RLP_DEPTH, RLPDecode, decode_rlp_item},
    encode::{RLPEncode, encode_length, list_length},
    error::RLPDecodeError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RlpItem {
    Bytes(Bytes),
    List(Vec<RlpItem>),
}

impl RlpItem {
    /// The empty byte string, used for zero integers and absent values.
    pub fn empty() -> Self {
        Self::Bytes(Bytes::new())
    }

    pub fn bytes(value: impl AsRef<[u8]>) -> Self {
        Self::Bytes(Bytes::copy_from_slice(value.as_ref()))
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[RlpItem]> {
        match self {
            Self::List(items) => Some(items),
            Self::Bytes(_) => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    pub fn into_list(self) -> Result<Vec<RlpItem>, RLPDecodeError> {
        match self {
            Self::List(items) => Ok(items),
            Self::Bytes(_) => Err(RLPDecodeError::unexpected_string()),
        }
    }

    /// Decodes one item whose lists sit `depth` levels below the top.
    fn decode_at_depth(rlp: &[u8], depth: usize) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (is_list, payload, rest) = decode_rlp_item(rlp)?;
        if !is_list {
            return Ok((Self::Bytes(Bytes::copy_from_slice(payload)), rest));
        }
        if depth >= MAX_RLP_DEPTH {
            return Err(RLPDecodeError::MaxDepthExceeded(MAX_RLP_DEPTH));
        }
        let mut items = Vec::new();
        let mut current = payload;
        while !current.is_empty() {
            let (item, next) = Self::decode_at_depth(current, depth + 1)?;
            items.push(item);
            current = next;
        }
        Ok((Self::List(items), rest))
    }
}

impl RLPEncode for RlpItem {
    fn encode(&self, buf: &mut dyn BufMut) {
        match self {
            Self::Bytes(bytes) => bytes.encode(buf),
            Self::List(items) => {
                let payload_len: usize = items.iter().map(RLPEncode::length).sum();
                encode_length(payload_len, buf);
                for item in items {
                    item.encode(buf);
                }
            }
        }
    }

    fn length(&self) -> usize {
        match self {
            Self::Bytes(bytes) => bytes.length(),
            Self::List(items) => list_length(items.iter().map(RLPEncode::length).sum()),
        }
    }
}

impl RLPDecode for RlpItem {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        Self::decode_at_depth(rlp, 0)
    }
}

impl From<Bytes> for RlpItem {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<Vec<u8>> for RlpItem {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value.into())
    }
}

impl From<Vec<RlpItem>> for RlpItem {
    fn from(value: Vec<RlpItem>) -> Self {
        Self::List(value)
    }
}
