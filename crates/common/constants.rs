use ethereum_types::U256;

/// Chain id applied to typed transactions that do not name one (mainnet).
pub const DEFAULT_CHAIN_ID: U256 = U256([1, 0, 0, 0]);

/// Prefix of `personal_sign` messages, followed by the decimal message length.
pub const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// `keccak256("transfer(address,uint256)")[..4]`
pub const TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];
