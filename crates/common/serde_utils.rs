use serde::{Deserialize, Deserializer, Serializer, de::Error};

pub mod u256 {
    use super::*;
    use ethereum_types::U256;

    /// Serializes to a compact 0x prefixed hex string, deserializes from hex or decimal.
    pub mod hex_str {
        use super::*;

        pub fn deserialize<'de, D>(d: D) -> Result<U256, D::Error>
        where
            D: Deserializer<'de>,
        {
            let value = String::deserialize(d)?;
            deser_hex_or_dec_str(&value).map_err(D::Error::custom)
        }

        pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.serialize_str(&format!("{value:#x}"))
        }
    }

    pub mod hex_str_opt {
        use super::*;

        pub fn serialize<S>(value: &Option<U256>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(value) => hex_str::serialize(value, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(d: D) -> Result<Option<U256>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(d)?
                .map(|value| deser_hex_or_dec_str(&value).map_err(D::Error::custom))
                .transpose()
        }
    }

    pub fn deser_hex_or_dec_str(value: &str) -> Result<U256, String> {
        if let Some(hex) = value.strip_prefix("0x") {
            U256::from_str_radix(hex, 16).map_err(|_| "Failed to deserialize u256 value".to_string())
        } else {
            U256::from_dec_str(value).map_err(|e| e.to_string())
        }
    }
}

/// Accepts quantities written either as JSON strings or as JSON numbers,
/// keeping the textual form so range checks happen at construction.
pub mod quantity {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(u64),
    }

    pub mod opt {
        use super::*;

        pub fn deserialize<'de, D>(d: D) -> Result<Option<String>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Ok(
                Option::<StringOrNumber>::deserialize(d)?.map(|value| match value {
                    StringOrNumber::String(value) => value,
                    StringOrNumber::Number(value) => value.to_string(),
                }),
            )
        }

        pub fn serialize<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(value) => serializer.serialize_str(value),
                None => serializer.serialize_none(),
            }
        }
    }
}

/// Serializes to and deserializes from 0x prefixed hex string
pub mod bytes {
    use ::bytes::Bytes;

    use super::*;

    pub fn deserialize<'de, D>(d: D) -> Result<Bytes, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(d)?;
        let bytes = hex::decode(value.trim_start_matches("0x"))
            .map_err(|e| D::Error::custom(e.to_string()))?;
        Ok(Bytes::from(bytes))
    }

    pub fn serialize<S>(value: &Bytes, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(value)))
    }

    pub mod opt {
        use super::*;

        pub fn deserialize<'de, D>(d: D) -> Result<Option<Bytes>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(d)?
                .map(|value| {
                    hex::decode(value.trim_start_matches("0x"))
                        .map(Bytes::from)
                        .map_err(|e| D::Error::custom(e.to_string()))
                })
                .transpose()
        }

        pub fn serialize<S>(value: &Option<Bytes>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(value) => super::serialize(value, serializer),
                None => serializer.serialize_none(),
            }
        }
    }
}
