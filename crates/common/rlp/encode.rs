use bytes::{BufMut, Bytes};
use ethereum_types::{Address, H256, U256};

use super::{
    constants::{RLP_EMPTY_LIST, RLP_NULL, SHORT_PAYLOAD_LIMIT},
    structs::Encoder,
};

/// Number of bytes needed to write `len` as a big endian integer without leading zeros.
#[inline]
const fn be_len(len: usize) -> usize {
    (usize::BITS - len.leading_zeros()).div_ceil(8) as usize
}

/// Computes the length needed for a given payload length
#[inline]
pub const fn list_length(payload_len: usize) -> usize {
    if payload_len < SHORT_PAYLOAD_LIMIT {
        1 + payload_len
    } else {
        1 + be_len(payload_len) + payload_len
    }
}

/// Computes the length needed for a given byte-string and first byte
#[inline]
pub const fn bytes_length(bytes_len: usize, first_byte: u8) -> usize {
    if bytes_len == 1 && first_byte < RLP_NULL {
        return 1;
    }
    if bytes_len < SHORT_PAYLOAD_LIMIT {
        return 1 + bytes_len;
    }
    1 + be_len(bytes_len) + bytes_len
}

/// Struct implementing `BufMut`, but only counting the number of bytes pushed into the buffer.
#[derive(Debug, Clone, Copy, Default)]
struct ByteCounter {
    count: usize,
}

unsafe impl BufMut for ByteCounter {
    fn remaining_mut(&self) -> usize {
        usize::MAX - self.count
    }

    unsafe fn advance_mut(&mut self, cnt: usize) {
        self.count += cnt;
    }

    fn chunk_mut(&mut self) -> &mut bytes::buf::UninitSlice {
        unreachable!(
            "shouldn't be reachable since all the functions that call this are reimplemented"
        )
    }

    fn put<T: bytes::buf::Buf>(&mut self, src: T)
    where
        Self: Sized,
    {
        self.count += src.remaining();
    }

    fn put_bytes(&mut self, _val: u8, cnt: usize) {
        self.count += cnt;
    }

    fn put_slice(&mut self, src: &[u8]) {
        self.count += src.len()
    }
}

pub trait RLPEncode {
    fn encode(&self, buf: &mut dyn BufMut);

    fn length(&self) -> usize {
        // Run the `encode` function, but only counting the bytes pushed.
        let mut counter = ByteCounter::default();
        self.encode(&mut counter);
        counter.count
    }

    fn encode_to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.length());
        self.encode(&mut buf);
        buf
    }
}

impl RLPEncode for bool {
    #[inline(always)]
    fn encode(&self, buf: &mut dyn BufMut) {
        if *self {
            buf.put_u8(0x01);
        } else {
            buf.put_u8(RLP_NULL);
        }
    }

    #[inline(always)]
    fn length(&self) -> usize {
        1
    }
}

/// Writes the header of a byte string of `len` bytes.
#[inline]
fn encode_string_header(len: usize, buf: &mut dyn BufMut) {
    encode_header(len, RLP_NULL, buf);
}

/// Writes the header of a list whose payload is `total_len` bytes long.
#[inline]
pub fn encode_length(total_len: usize, buf: &mut dyn BufMut) {
    encode_header(total_len, RLP_EMPTY_LIST, buf);
}

fn encode_header(len: usize, offset: u8, buf: &mut dyn BufMut) {
    if len < SHORT_PAYLOAD_LIMIT {
        buf.put_u8(offset + len as u8);
    } else {
        let len_bytes = len.to_be_bytes();
        let start = len_bytes.len() - be_len(len);
        // 55 is the largest short-form length, so long forms start right after it
        buf.put_u8(offset + 55 + (len_bytes.len() - start) as u8);
        buf.put_slice(&len_bytes[start..]);
    }
}

// integers are written as their big endian bytes with leading zeros stripped,
// zero being the empty string
macro_rules! impl_encode_uint {
    ($($t:ty),+) => {
        $(impl RLPEncode for $t {
            #[inline]
            fn encode(&self, buf: &mut dyn BufMut) {
                let be = self.to_be_bytes();
                let start = (self.leading_zeros() / 8) as usize;
                be[start..].encode(buf);
            }

            #[inline]
            fn length(&self) -> usize {
                let significant = size_of::<$t>() - (self.leading_zeros() / 8) as usize;
                if significant == 0 || (significant == 1 && *self < RLP_NULL as $t) {
                    1
                } else {
                    1 + significant
                }
            }
        })+
    };
}

impl_encode_uint!(u8, u16, u32, u64, usize, u128);

impl RLPEncode for [u8] {
    #[inline(always)]
    fn encode(&self, buf: &mut dyn BufMut) {
        if self.len() == 1 && self[0] < RLP_NULL {
            buf.put_u8(self[0]);
        } else {
            encode_string_header(self.len(), buf);
            buf.put_slice(self);
        }
    }

    #[inline]
    fn length(&self) -> usize {
        match self.first() {
            Some(first) => bytes_length(self.len(), *first),
            None => 1,
        }
    }
}

impl<const N: usize> RLPEncode for [u8; N] {
    #[inline]
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_slice().encode(buf)
    }

    #[inline]
    fn length(&self) -> usize {
        self.as_slice().length()
    }
}

impl RLPEncode for str {
    #[inline]
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_bytes().encode(buf)
    }

    #[inline]
    fn length(&self) -> usize {
        self.as_bytes().length()
    }
}

impl RLPEncode for String {
    #[inline]
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_bytes().encode(buf)
    }

    #[inline]
    fn length(&self) -> usize {
        self.as_bytes().length()
    }
}

impl RLPEncode for Bytes {
    #[inline]
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_ref().encode(buf)
    }

    #[inline]
    fn length(&self) -> usize {
        self.as_ref().length()
    }
}

impl RLPEncode for U256 {
    fn encode(&self, buf: &mut dyn BufMut) {
        let leading_zeros_in_bytes: usize = (self.leading_zeros() / 8) as usize;
        let bytes = self.to_big_endian();
        bytes[leading_zeros_in_bytes..].encode(buf)
    }

    fn length(&self) -> usize {
        let significant = self.bits().div_ceil(8);
        if significant == 0 || (significant == 1 && self.low_u32() < RLP_NULL as u32) {
            1
        } else {
            1 + significant
        }
    }
}

impl RLPEncode for H256 {
    #[inline]
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_bytes().encode(buf)
    }

    #[inline]
    fn length(&self) -> usize {
        33
    }
}

impl RLPEncode for Address {
    #[inline]
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_bytes().encode(buf)
    }

    #[inline]
    fn length(&self) -> usize {
        21
    }
}

impl<T: RLPEncode> RLPEncode for Vec<T> {
    #[inline(always)]
    fn encode(&self, buf: &mut dyn BufMut) {
        if self.is_empty() {
            buf.put_u8(RLP_EMPTY_LIST);
            return;
        }
        let payload_len: usize = self.iter().map(RLPEncode::length).sum();
        encode_length(payload_len, buf);
        for item in self {
            item.encode(buf);
        }
    }

    #[inline]
    fn length(&self) -> usize {
        list_length(self.iter().map(RLPEncode::length).sum())
    }
}

impl<T: RLPEncode + ?Sized> RLPEncode for &T {
    #[inline]
    fn encode(&self, buf: &mut dyn BufMut) {
        (**self).encode(buf)
    }

    #[inline]
    fn length(&self) -> usize {
        (**self).length()
    }
}

impl<S: RLPEncode, T: RLPEncode> RLPEncode for (S, T) {
    fn encode(&self, buf: &mut dyn BufMut) {
        Encoder::new(buf)
            .encode_field(&self.0)
            .encode_field(&self.1)
            .finish();
    }

    #[inline]
    fn length(&self) -> usize {
        list_length(self.0.length() + self.1.length())
    }
}

impl<S: RLPEncode, T: RLPEncode, U: RLPEncode> RLPEncode for (S, T, U) {
    fn encode(&self, buf: &mut dyn BufMut) {
        Encoder::new(buf)
            .encode_field(&self.0)
            .encode_field(&self.1)
            .encode_field(&self.2)
            .finish();
    }

    #[inline]
    fn length(&self) -> usize {
        list_length(self.0.length() + self.1.length() + self.2.length())
    }
}

impl<S: RLPEncode, T: RLPEncode, U: RLPEncode, V: RLPEncode> RLPEncode for (S, T, U, V) {
    fn encode(&self, buf: &mut dyn BufMut) {
        Encoder::new(buf)
            .encode_field(&self.0)
            .encode_field(&self.1)
            .encode_field(&self.2)
            .encode_field(&self.3)
            .finish();
    }

    #[inline]
    fn length(&self) -> usize {
        list_length(self.0.length() + self.1.length() + self.2.length() + self.3.length())
    }
}

impl<S: RLPEncode, T: RLPEncode, U: RLPEncode, V: RLPEncode, W: RLPEncode> RLPEncode
    for (S, T, U, V, W)
{
    fn encode(&self, buf: &mut dyn BufMut) {
        Encoder::new(buf)
            .encode_field(&self.0)
            .encode_field(&self.1)
            .encode_field(&self.2)
            .encode_field(&self.3)
            .encode_field(&self.4)
            .finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn can_encode_booleans() {
        assert_eq!(true.encode_to_vec(), vec![0x01]);
        assert_eq!(false.encode_to_vec(), vec![RLP_NULL]);
    }

    #[test]
    fn can_encode_integers() {
        assert_eq!(0u8.encode_to_vec(), vec![RLP_NULL]);
        assert_eq!(0x7fu8.encode_to_vec(), vec![0x7f]);
        assert_eq!(0x80u8.encode_to_vec(), vec![0x81, 0x80]);
        assert_eq!(1024u16.encode_to_vec(), vec![0x82, 0x04, 0x00]);
        assert_eq!(21000u64.encode_to_vec(), hex!("825208"));
        assert_eq!(20_000_000_000u64.encode_to_vec(), hex!("8504a817c800"));
        assert_eq!(0u128.encode_to_vec(), vec![RLP_NULL]);
    }

    #[test]
    fn integer_lengths_match_encoding() {
        for value in [0u64, 1, 0x7f, 0x80, 0xff, 0x100, 21000, u64::MAX] {
            assert_eq!(value.length(), value.encode_to_vec().len(), "{value}");
        }
        for value in [
            U256::zero(),
            U256::from(0x7f),
            U256::from(0x80),
            U256::from(1_000_000_000_000_000_000u64),
            U256::MAX,
        ] {
            assert_eq!(value.length(), value.encode_to_vec().len(), "{value}");
        }
    }

    #[test]
    fn can_encode_u256() {
        assert_eq!(U256::zero().encode_to_vec(), vec![RLP_NULL]);
        assert_eq!(
            U256::from(1_000_000_000_000_000_000u64).encode_to_vec(),
            hex!("880de0b6b3a7640000")
        );
        let mut expected = vec![0xa0];
        expected.extend_from_slice(&[0xff; 32]);
        assert_eq!(U256::MAX.encode_to_vec(), expected);
    }

    #[test]
    fn can_encode_strings() {
        assert_eq!("".encode_to_vec(), vec![RLP_NULL]);
        assert_eq!("dog".encode_to_vec(), hex!("83646f67"));
        let lorem = "Lorem ipsum dolor sit amet, consectetur adipisicing elit";
        let mut expected = vec![0xb8, 0x38];
        expected.extend_from_slice(lorem.as_bytes());
        assert_eq!(lorem.encode_to_vec(), expected);
    }

    #[test]
    fn can_encode_long_byte_strings() {
        let payload = vec![0xaa; 1024];
        let encoded = payload.as_slice().encode_to_vec();
        assert_eq!(&encoded[..3], &[0xb9, 0x04, 0x00]);
        assert_eq!(encoded.len(), payload.as_slice().length());
    }

    #[test]
    fn can_encode_lists() {
        let empty: Vec<u8> = vec![];
        assert_eq!(empty.encode_to_vec(), vec![RLP_EMPTY_LIST]);
        assert_eq!(
            vec!["cat".to_string(), "dog".to_string()].encode_to_vec(),
            hex!("c88363617483646f67")
        );
        let long_list = vec![0xffffu64; 20];
        let encoded = long_list.encode_to_vec();
        assert_eq!(&encoded[..2], &[0xf8, 60]);
        assert_eq!(encoded.len(), long_list.length());
    }

    #[test]
    fn can_encode_tuples() {
        assert_eq!((1u8, "dog").encode_to_vec(), hex!("c50183646f67"));
        assert_eq!((1u8, 2u8, 3u8).length(), 4);
    }

    #[test]
    fn can_encode_fixed_hashes() {
        let address = Address::repeat_byte(0x35);
        assert_eq!(
            address.encode_to_vec(),
            hex!("943535353535353535353535353535353535353535")
        );
        assert_eq!(H256::zero().encode_to_vec().len(), H256::zero().length());
    }

    #[test]
    fn encoding_is_deterministic() {
        let value = (U256::from(12345), vec![Bytes::from_static(b"abc")], true);
        assert_eq!(value.encode_to_vec(), value.encode_to_vec());
    }
}
