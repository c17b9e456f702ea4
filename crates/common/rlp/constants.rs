pub const RLP_NULL: u8 = 0x80;
pub const RLP_EMPTY_LIST: u8 = 0xc0;

/// Payloads shorter than this are described by a single prefix byte.
pub const SHORT_PAYLOAD_LIMIT: usize = 56;
