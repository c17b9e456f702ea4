use crate::{Address, Bytes, H256, errors::TxError};
use ethtx_rlp::item::RlpItem;
use serde::{Deserialize, Serialize};

pub type AccessList = Vec<AccessListItem>;
pub type AccessListItem = (Address, Vec<H256>);

/// Access list in buffer form, as found on the wire before length checks.
pub type AccessListBytes = Vec<(Bytes, Vec<Bytes>)>;

/// Access list entry in its JSON form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessListEntry {
    pub address: String,
    #[serde(default)]
    pub storage_keys: Vec<String>,
}

/// User supplied access list, either as JSON entries or as raw buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawAccessList {
    Json(Vec<AccessListEntry>),
    Bytes(AccessListBytes),
}

/// Converts a raw access list into both its buffer form and its JSON form.
/// Addresses and storage keys are length checked on the way.
pub fn normalize(raw: RawAccessList) -> Result<(AccessListBytes, Vec<AccessListEntry>), TxError> {
    let buffers = match raw {
        RawAccessList::Bytes(buffers) => buffers,
        RawAccessList::Json(entries) => entries
            .iter()
            .enumerate()
            .map(|(i, entry)| -> Result<(Bytes, Vec<Bytes>), TxError> {
                let address = decode_hex(&format!("accessList[{i}].address"), &entry.address)?;
                let keys = entry
                    .storage_keys
                    .iter()
                    .enumerate()
                    .map(|(j, key)| decode_hex(&format!("accessList[{i}].storageKeys[{j}]"), key))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((address, keys))
            })
            .collect::<Result<AccessListBytes, TxError>>()?,
    };
    let access_list = validate(&buffers)?;
    Ok((buffers, to_json(&access_list)))
}

/// Checks every address is 20 bytes and every storage key is 32 bytes.
pub fn validate(buffers: &AccessListBytes) -> Result<AccessList, TxError> {
    buffers
        .iter()
        .enumerate()
        .map(|(i, (address, keys))| {
            if address.len() != Address::len_bytes() {
                return Err(TxError::InvalidFormat(format!(
                    "accessList[{i}].address must be 20 bytes, got {}",
                    address.len()
                )));
            }
            let keys = keys
                .iter()
                .enumerate()
                .map(|(j, key)| {
                    if key.len() != H256::len_bytes() {
                        return Err(TxError::InvalidFormat(format!(
                            "accessList[{i}].storageKeys[{j}] must be 32 bytes, got {}",
                            key.len()
                        )));
                    }
                    Ok(H256::from_slice(key))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok((Address::from_slice(address), keys))
        })
        .collect()
}

/// Reads an access list out of a decoded value, checking it is a list of
/// `[bytes, [bytes, ...]]` pairs before checking lengths.
pub fn from_rlp_item(item: &RlpItem) -> Result<AccessList, TxError> {
    let shape_error = |detail: &str| TxError::InvalidFormat(format!("accessList: {detail}"));
    let entries = item.as_list().ok_or_else(|| shape_error("expected a list"))?;
    let buffers = entries
        .iter()
        .map(|entry| {
            let [address, keys] = entry.as_list().unwrap_or_default() else {
                return Err(shape_error("each entry must be an [address, storageKeys] pair"));
            };
            let address = address
                .as_bytes()
                .ok_or_else(|| shape_error("address must be a byte string"))?;
            let keys = keys
                .as_list()
                .ok_or_else(|| shape_error("storageKeys must be a list"))?
                .iter()
                .map(|key| {
                    key.as_bytes()
                        .cloned()
                        .ok_or_else(|| shape_error("storage key must be a byte string"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok((address.clone(), keys))
        })
        .collect::<Result<AccessListBytes, TxError>>()?;
    validate(&buffers)
}

pub fn to_rlp_item(access_list: &AccessList) -> RlpItem {
    RlpItem::List(
        access_list
            .iter()
            .map(|(address, keys)| {
                RlpItem::List(vec![
                    RlpItem::bytes(address),
                    RlpItem::List(keys.iter().map(RlpItem::bytes).collect()),
                ])
            })
            .collect(),
    )
}

pub fn to_json(access_list: &AccessList) -> Vec<AccessListEntry> {
    access_list
        .iter()
        .map(|(address, keys)| AccessListEntry {
            address: format!("{address:#x}"),
            storage_keys: keys.iter().map(|key| format!("{key:#x}")).collect(),
        })
        .collect()
}

fn decode_hex(field: &str, value: &str) -> Result<Bytes, TxError> {
    hex::decode(value.trim_start_matches("0x"))
        .map(Bytes::from)
        .map_err(|err| TxError::InvalidFormat(format!("{field}: {err}")))
}
