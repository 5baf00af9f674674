//! Serde helpers for byte fields.
//!
//! Bytes are hex strings in human-readable formats (JSON, TOML) and raw byte
//! strings in binary formats (bincode), so DA payloads stay compact while the
//! RPC surface stays readable.

/// Hex-encoded fixed-size byte arrays.
///
/// Use with `#[serde(with = "dalc_types::serde_helpers::hex_fixed")]`
/// for `[u8; N]` fields.
pub mod hex_fixed {
    use serde::{Deserializer, Serializer};

    /// Serialize a fixed-size byte array.
    pub fn serialize<S, const N: usize>(bytes: &[u8; N], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        super::hex_vec::serialize(bytes, serializer)
    }

    /// Deserialize a fixed-size byte array.
    pub fn deserialize<'de, D, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = super::hex_vec::deserialize(deserializer)?;
        let len = bytes.len();
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom(format!("expected {N} bytes, got {len}")))
    }
}

/// Hex-encoded variable-length bytes.
///
/// Use with `#[serde(with = "dalc_types::serde_helpers::hex_vec")]`
/// for `Vec<u8>` fields.
pub mod hex_vec {
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize a byte slice.
    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode(bytes))
        } else {
            serializer.serialize_bytes(bytes)
        }
    }

    /// Deserialize into a `Vec<u8>`.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)
        } else {
            Vec::<u8>::deserialize(deserializer)
        }
    }
}
