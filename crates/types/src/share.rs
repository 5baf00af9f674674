//! DA layer shares.

use serde::{de, Deserialize, Deserializer, Serialize};

use crate::{NamespaceId, NAMESPACE_ID_SIZE};

/// Size of a single share in bytes.
pub const SHARE_SIZE: usize = 256;

/// Bytes of message data a share carries after its namespace tag.
pub const MESSAGE_SHARE_DATA_SIZE: usize = SHARE_SIZE - NAMESPACE_ID_SIZE;

/// Fixed-size unit of data stored by the DA layer.
///
/// The first [`NAMESPACE_ID_SIZE`] bytes are the namespace tag, the rest is
/// message data. Deserialization rejects any other length than [`SHARE_SIZE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Share(#[serde(with = "crate::serde_helpers::hex_vec")] Vec<u8>);

impl Share {
    /// Build a share from its namespace and data, zero padding the data.
    ///
    /// Returns `None` if `data` does not fit in one share.
    #[must_use]
    pub fn new(namespace: NamespaceId, data: &[u8]) -> Option<Self> {
        if data.len() > MESSAGE_SHARE_DATA_SIZE {
            return None;
        }
        let mut raw = Vec::with_capacity(SHARE_SIZE);
        raw.extend_from_slice(namespace.as_bytes());
        raw.extend_from_slice(data);
        raw.resize(SHARE_SIZE, 0);
        Some(Self(raw))
    }

    /// Wrap raw share bytes.
    ///
    /// Returns `None` unless `raw` is exactly [`SHARE_SIZE`] bytes.
    #[must_use]
    pub fn from_raw(raw: Vec<u8>) -> Option<Self> {
        (raw.len() == SHARE_SIZE).then_some(Self(raw))
    }

    /// Namespace tag of this share.
    #[must_use]
    pub fn namespace(&self) -> NamespaceId {
        let mut ns = [0u8; NAMESPACE_ID_SIZE];
        ns.copy_from_slice(&self.0[..NAMESPACE_ID_SIZE]);
        NamespaceId::new(ns)
    }

    /// Message data carried after the namespace tag.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.0[NAMESPACE_ID_SIZE..]
    }

    /// Full raw share bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Share {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = crate::serde_helpers::hex_vec::deserialize(deserializer)?;
        let len = raw.len();
        Self::from_raw(raw).ok_or_else(|| de::Error::invalid_length(len, &"a 256-byte share"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_layout() {
        let ns = NamespaceId::new([7; NAMESPACE_ID_SIZE]);
        let share = Share::new(ns, &[1, 2, 3]).unwrap();

        assert_eq!(share.as_bytes().len(), SHARE_SIZE);
        assert_eq!(share.namespace(), ns);
        assert_eq!(&share.data()[..3], &[1, 2, 3]);
        assert!(share.data()[3..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_share_rejects_oversized() {
        let ns = NamespaceId::new([0; NAMESPACE_ID_SIZE]);
        assert!(Share::new(ns, &[0; MESSAGE_SHARE_DATA_SIZE + 1]).is_none());
        assert!(Share::from_raw(vec![0; SHARE_SIZE - 1]).is_none());
    }

    #[test]
    fn test_deserialize_enforces_share_size() {
        let err = serde_json::from_str::<Share>("\"0102\"").unwrap_err();
        assert!(err.to_string().contains("invalid length 2"));

        let share = Share::new(NamespaceId::new([3; NAMESPACE_ID_SIZE]), &[9]).unwrap();
        let json = serde_json::to_string(&share).unwrap();
        assert_eq!(serde_json::from_str::<Share>(&json).unwrap(), share);

        let bytes = bincode::serialize(&share).unwrap();
        assert_eq!(bincode::deserialize::<Share>(&bytes).unwrap(), share);
        let short = bincode::serialize(&vec![0u8; 10]).unwrap();
        assert!(bincode::deserialize::<Share>(&short).is_err());
    }
}
