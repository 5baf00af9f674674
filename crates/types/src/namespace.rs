//! Namespace identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Length of a namespace identifier in bytes.
pub const NAMESPACE_ID_SIZE: usize = 8;

/// Fixed-length tag partitioning messages within the DA layer.
///
/// Serialized as a hex string in human-readable formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NamespaceId(#[serde(with = "crate::serde_helpers::hex_fixed")] [u8; NAMESPACE_ID_SIZE]);

impl NamespaceId {
    /// Create a namespace from raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; NAMESPACE_ID_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parse a namespace from a byte slice of exactly [`NAMESPACE_ID_SIZE`] bytes.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidNamespace`] if the slice has the wrong length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, InvalidNamespace> {
        let arr: [u8; NAMESPACE_ID_SIZE] = bytes.try_into().map_err(|_| {
            InvalidNamespace(format!(
                "expected {NAMESPACE_ID_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Raw namespace bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; NAMESPACE_ID_SIZE] {
        &self.0
    }
}

impl AsRef<[u8]> for NamespaceId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for NamespaceId {
    type Err = InvalidNamespace;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| InvalidNamespace(format!("invalid hex: {e}")))?;
        Self::from_slice(&bytes)
    }
}

/// Error returned when a namespace cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid namespace id: {0}")]
pub struct InvalidNamespace(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_namespace_hex() {
        let ns: NamespaceId = "0102030405060708".parse().unwrap();
        assert_eq!(ns.as_bytes(), &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(ns.to_string(), "0102030405060708");

        let prefixed: NamespaceId = "0x0102030405060708".parse().unwrap();
        assert_eq!(prefixed, ns);
    }

    #[test]
    fn test_parse_namespace_wrong_length() {
        let err = "010203".parse::<NamespaceId>().unwrap_err();
        assert!(err.to_string().contains("expected 8 bytes"));
    }

    #[test]
    fn test_namespace_json_is_hex() {
        let ns = NamespaceId::new([0xde, 0xad, 0xbe, 0xef, 0, 0, 0, 1]);
        let json = serde_json::to_string(&ns).unwrap();
        assert_eq!(json, r#""deadbeef00000001""#);
        assert_eq!(serde_json::from_str::<NamespaceId>(&json).unwrap(), ns);
    }
}
