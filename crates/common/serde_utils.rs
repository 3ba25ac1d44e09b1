//! Serde adapters for the hex-encoded quantities found in chain files.

pub mod u64 {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum HexOrNumber {
        Number(u64),
        Str(String),
    }

    pub fn parse(value: &str) -> Result<u64, String> {
        match value.strip_prefix("0x") {
            Some(hex) => u64::from_str_radix(hex, 16).map_err(|e| e.to_string()),
            None => value.parse::<u64>().map_err(|e| e.to_string()),
        }
    }

    /// `0x`-prefixed hex strings; plain JSON numbers and decimal strings are also accepted
    /// when reading.
    pub mod hex_str {
        use super::*;
        use serde::Serializer;

        pub fn deserialize<'de, D>(d: D) -> Result<u64, D::Error>
        where
            D: Deserializer<'de>,
        {
            match HexOrNumber::deserialize(d)? {
                HexOrNumber::Number(value) => Ok(value),
                HexOrNumber::Str(value) => parse(&value).map_err(serde::de::Error::custom),
            }
        }

        pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.serialize_str(&format!("{value:#x}"))
        }
    }
}

pub mod bytes {
    use ::bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn deserialize<'de, D>(d: D) -> Result<Bytes, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(d)?;
        let value = value.strip_prefix("0x").unwrap_or(&value);
        hex::decode(value)
            .map(Bytes::from)
            .map_err(|e| D::Error::custom(e.to_string()))
    }

    pub fn serialize<S>(value: &Bytes, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(value)))
    }
}
