//! Height ledger mapping rollup heights to DA heights.
//!
//! The ledger is write-once per rollup height: a rollup block corresponds to
//! exactly one DA submission, so [`HeightLedger::record`] is a compare-and-set
//! and never overwrites.
//!
//! # Storage Format
//!
//! A flat JSON object keyed by the decimal string of the rollup height:
//!
//! ```json
//! {"1": 8, "2": 9}
//! ```
//!
//! When the ledger is backed by a file, the whole table is rewritten (temp
//! file + rename) on every successful record, before the in-memory table is
//! updated.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use dalc_types::HeightMapping;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::DaError;
use crate::Result;

/// Concurrency-safe rollup height to DA height ledger.
///
/// Reads take a shared lock; all mutation goes through one exclusive lock, which
/// also serializes competing records for the same height. The tokio lock is
/// write-preferring, so writers do not starve behind readers.
#[derive(Debug, Default)]
pub struct HeightLedger {
    /// Backing file, if persistent.
    path: Option<PathBuf>,
    /// Rollup height -> DA height.
    heights: RwLock<BTreeMap<u64, u64>>,
}

impl HeightLedger {
    /// Create an empty ledger that is never written to disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load a ledger from `path` and keep it attached to that file.
    ///
    /// A missing or empty file yields an empty ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid ledger.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DaError::Storage(format!("failed to create ledger directory: {e}"))
            })?;
        }

        let heights = match tokio::fs::read(&path).await {
            Ok(bytes) => decode(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(DaError::Storage(format!("failed to read ledger: {e}"))),
        };

        info!(path = %path.display(), entries = heights.len(), "Height ledger loaded");

        Ok(Self {
            path: Some(path),
            heights: RwLock::new(heights),
        })
    }

    /// Write the full mapping table to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let heights = self.heights.read().await;
        write_atomic(path.as_ref(), &heights).await
    }

    /// DA height recorded for `rollup_height`, if any.
    pub async fn lookup(&self, rollup_height: u64) -> Option<u64> {
        self.heights.read().await.get(&rollup_height).copied()
    }

    /// Record that `rollup_height` was included at `da_height`.
    ///
    /// # Errors
    ///
    /// Returns [`DaError::AlreadyMapped`] carrying the existing DA height if the
    /// rollup height is already recorded, or [`DaError::Storage`] if the backing
    /// file cannot be written. On error the table is unchanged.
    pub async fn record(&self, rollup_height: u64, da_height: u64) -> Result<()> {
        let mut heights = self.heights.write().await;

        if let Some(&existing_da_height) = heights.get(&rollup_height) {
            return Err(DaError::AlreadyMapped {
                rollup_height,
                existing_da_height,
            });
        }

        if let Some(path) = &self.path {
            let mut next = heights.clone();
            next.insert(rollup_height, da_height);
            write_atomic(path, &next).await?;
            *heights = next;
        } else {
            heights.insert(rollup_height, da_height);
        }

        debug!(rollup_height, da_height, "Recorded height mapping");
        Ok(())
    }

    /// All mappings in rollup height order.
    pub async fn mappings(&self) -> Vec<HeightMapping> {
        self.heights
            .read()
            .await
            .iter()
            .map(|(&rollup_height, &da_height)| HeightMapping {
                rollup_height,
                da_height,
            })
            .collect()
    }
}

/// Serialize the table with decimal string keys.
fn encode(heights: &BTreeMap<u64, u64>) -> Result<Vec<u8>> {
    let doc: BTreeMap<String, u64> = heights.iter().map(|(k, v)| (k.to_string(), *v)).collect();
    serde_json::to_vec_pretty(&doc)
        .map_err(|e| DaError::Storage(format!("failed to serialize ledger: {e}")))
}

/// Parse a ledger document. Whitespace-only input is an empty ledger.
fn decode(bytes: &[u8]) -> Result<BTreeMap<u64, u64>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(BTreeMap::new());
    }

    let doc: BTreeMap<String, u64> = serde_json::from_slice(bytes)
        .map_err(|e| DaError::Storage(format!("failed to parse ledger: {e}")))?;

    doc.into_iter()
        .map(|(key, da_height)| {
            key.parse::<u64>()
                .map(|rollup_height| (rollup_height, da_height))
                .map_err(|e| DaError::Storage(format!("invalid ledger key {key:?}: {e}")))
        })
        .collect()
}

async fn write_atomic(path: &Path, heights: &BTreeMap<u64, u64>) -> Result<()> {
    let bytes = encode(heights)?;
    let tmp = path.with_extension("tmp");

    tokio::fs::write(&tmp, &bytes)
        .await
        .map_err(|e| DaError::Storage(format!("failed to write ledger: {e}")))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| DaError::Storage(format!("failed to replace ledger: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use proptest::prelude::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_record_and_lookup() {
        let ledger = HeightLedger::in_memory();
        assert!(ledger.mappings().await.is_empty());
        assert_eq!(ledger.lookup(1).await, None);

        ledger.record(1, 8).await.unwrap();
        ledger.record(2, 9).await.unwrap();

        assert_eq!(ledger.lookup(1).await, Some(8));
        assert_eq!(ledger.mappings().await.len(), 2);
        assert_eq!(
            ledger.mappings().await.last(),
            Some(&HeightMapping { rollup_height: 2, da_height: 9 })
        );
    }

    #[tokio::test]
    async fn test_second_record_is_rejected_and_keeps_original() {
        let ledger = HeightLedger::in_memory();
        ledger.record(1, 8).await.unwrap();

        let err = ledger.record(1, 99).await.unwrap_err();
        assert!(matches!(
            err,
            DaError::AlreadyMapped { rollup_height: 1, existing_da_height: 8 }
        ));
        assert_eq!(ledger.lookup(1).await, Some(8));
    }

    #[tokio::test]
    async fn test_concurrent_records_have_one_winner() {
        let ledger = Arc::new(HeightLedger::in_memory());

        let handles: Vec<_> = (0..16u64)
            .map(|da_height| {
                let ledger = Arc::clone(&ledger);
                tokio::spawn(async move { ledger.record(5, 100 + da_height).await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert!(ledger.lookup(5).await.is_some());
    }

    #[tokio::test]
    async fn test_load_missing_and_empty_file() {
        let dir = tempdir().unwrap();

        let missing = HeightLedger::load(dir.path().join("nested/height_map.json")).await.unwrap();
        assert!(missing.mappings().await.is_empty());

        let empty_path = dir.path().join("empty.json");
        tokio::fs::write(&empty_path, b"\n").await.unwrap();
        let empty = HeightLedger::load(&empty_path).await.unwrap();
        assert!(empty.mappings().await.is_empty());
    }

    #[tokio::test]
    async fn test_record_writes_through_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("height_map.json");

        {
            let ledger = HeightLedger::load(&path).await.unwrap();
            ledger.record(1, 8).await.unwrap();
            ledger.record(2, 12).await.unwrap();
        }

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        let doc: BTreeMap<String, u64> = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc.get("1"), Some(&8));
        assert_eq!(doc.get("2"), Some(&12));

        let reopened = HeightLedger::load(&path).await.unwrap();
        assert_eq!(reopened.lookup(2).await, Some(12));
        assert!(reopened.record(1, 9).await.is_err());
    }

    #[tokio::test]
    async fn test_persist_load_roundtrip_at_boundaries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snapshot.json");

        let ledger = HeightLedger::in_memory();
        let entries = [
            (0, 0),
            (1, 1),
            (i64::MAX as u64, i64::MAX as u64),
            (u64::MAX, u64::MAX),
        ];
        for (rollup, da) in entries {
            ledger.record(rollup, da).await.unwrap();
        }
        ledger.persist(&path).await.unwrap();

        let loaded = HeightLedger::load(&path).await.unwrap();
        assert_eq!(loaded.mappings().await, ledger.mappings().await);
    }

    #[tokio::test]
    async fn test_rejects_non_decimal_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        tokio::fs::write(&path, br#"{"one": 8}"#).await.unwrap();

        let err = HeightLedger::load(&path).await.unwrap_err();
        assert!(err.to_string().contains("invalid ledger key"));
    }

    proptest! {
        #[test]
        fn prop_record_is_write_once(h in any::<u64>(), d1 in any::<u64>(), d2 in any::<u64>()) {
            prop_assume!(d1 != d2);
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let ledger = HeightLedger::in_memory();
                ledger.record(h, d1).await.unwrap();
                let second = ledger.record(h, d2).await;
                assert!(matches!(
                    second,
                    Err(DaError::AlreadyMapped { existing_da_height, .. })
                        if existing_da_height == d1
                ));
                assert_eq!(ledger.lookup(h).await, Some(d1));
            });
        }

        #[test]
        fn prop_encode_decode_roundtrip(
            table in proptest::collection::btree_map(any::<u64>(), any::<u64>(), 1..32)
        ) {
            let bytes = encode(&table).unwrap();
            prop_assert_eq!(decode(&bytes).unwrap(), table);
        }
    }
}
