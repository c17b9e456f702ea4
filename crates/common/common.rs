pub use ethereum_types::*;
pub mod calldata;
pub mod canonical;
pub mod config;
pub mod constants;
pub mod errors;
pub mod message;
pub mod serde_utils;
pub mod types;
pub mod wallet;
pub use bytes::Bytes;
