mod field_data;
mod signer;
mod transaction;
pub mod tx_fields;

pub use field_data::*;
pub use signer::*;
pub use transaction::*;
pub use tx_fields::{AccessList, AccessListBytes, AccessListEntry, AccessListItem, RawAccessList};
