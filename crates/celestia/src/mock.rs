//! In-memory collaborators for tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use dalc_types::{
    primitives::{Address, B256},
    BlockHeader, BroadcastMode, NamespaceId, RollupBlock, Share, Transaction,
};

use crate::message::Message;
use crate::{
    AvailabilityHeader, BroadcastResponse, ChainClient, DaError, Fee, PayForMessage, Result,
    ShareService, Signer, SquareCodec, TxBroadcaster, XorSquareCodec,
};

pub(crate) const TEST_NAMESPACE: NamespaceId = NamespaceId::new([1, 2, 3, 4, 5, 6, 7, 8]);

const PADDING_NAMESPACE: NamespaceId = NamespaceId::new([0xFF; 8]);

/// Block at `height` in [`TEST_NAMESPACE`] carrying txs `[{1}, {2}, {3, 4}]`.
pub(crate) fn test_block(height: u64) -> RollupBlock {
    RollupBlock::new(
        BlockHeader {
            height,
            namespace_id: TEST_NAMESPACE,
            timestamp: 1_700_000_000 + height,
            last_header_hash: B256::repeat_byte(height as u8),
            proposer: Address::repeat_byte(0x11),
        },
        vec![
            Transaction::new(vec![1]),
            Transaction::new(vec![2]),
            Transaction::new(vec![3, 4]),
        ],
    )
}

/// `count` distinct single-share messages in an unrelated namespace.
pub(crate) fn square_of_shares(count: usize) -> Vec<Share> {
    (0..count)
        .filter_map(|i| Share::new(NamespaceId::new([0xAA; 8]), &[1, i as u8]))
        .collect()
}

fn padding_share() -> Share {
    Share::new(PADDING_NAMESPACE, &[]).unwrap()
}

/// Pad `shares` with padding shares up to the next perfect square.
fn pad_to_square(mut shares: Vec<Share>) -> Vec<Share> {
    let mut side = 1;
    while side * side < shares.len() {
        side += 1;
    }
    shares.resize_with(side * side, padding_share);
    shares
}

/// DA chain keyed by height.
#[derive(Clone, Default)]
pub(crate) struct MockChain {
    blocks: Arc<Mutex<BTreeMap<u64, Vec<Share>>>>,
    hanging: Arc<AtomicBool>,
}

impl MockChain {
    /// Store `shares` at `height` exactly as given.
    pub(crate) fn insert(&self, height: u64, shares: Vec<Share>) {
        self.blocks.lock().unwrap().insert(height, shares);
    }

    /// Append message shares to the block at `height`, keeping it square.
    pub(crate) fn post(&self, height: u64, shares: Vec<Share>) {
        let mut blocks = self.blocks.lock().unwrap();
        let block = blocks.entry(height).or_default();
        block.retain(|s| s.namespace() != PADDING_NAMESPACE);
        block.extend(shares);
        *block = pad_to_square(std::mem::take(block));
    }

    /// Never answer share queries while set.
    pub(crate) fn set_hanging(&self, hanging: bool) {
        self.hanging.store(hanging, Ordering::SeqCst);
    }

    fn find(&self, header: &AvailabilityHeader) -> Option<Vec<Share>> {
        let blocks = self.blocks.lock().unwrap();
        blocks.values().find_map(|shares| {
            let side = (1..=shares.len()).find(|s| s * s == shares.len())?;
            let eds = XorSquareCodec.extend_shares(side, shares).ok()?;
            (XorSquareCodec.compute_header(&eds) == *header).then(|| shares.clone())
        })
    }
}

#[async_trait::async_trait]
impl ChainClient for MockChain {
    async fn block_shares(&self, height: u64) -> Result<Vec<Share>> {
        if self.hanging.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.blocks
            .lock()
            .unwrap()
            .get(&height)
            .cloned()
            .ok_or_else(|| DaError::NotFound {
                da_height: height,
                reason: "height is in the future".into(),
            })
    }
}

/// Share service answering from a [`MockChain`].
#[derive(Clone)]
pub(crate) struct MockShares {
    chain: MockChain,
    unavailable: Arc<AtomicBool>,
    hanging: Arc<AtomicBool>,
}

impl MockShares {
    pub(crate) fn new(chain: MockChain) -> Self {
        Self {
            chain,
            unavailable: Arc::default(),
            hanging: Arc::default(),
        }
    }

    pub(crate) fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Never answer namespace queries while set.
    pub(crate) fn set_hanging(&self, hanging: bool) {
        self.hanging.store(hanging, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ShareService for MockShares {
    async fn shares_available(&self, header: &AvailabilityHeader) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) || self.chain.find(header).is_none() {
            return Err(DaError::Unavailable("sampling failed".into()));
        }
        Ok(())
    }

    async fn shares_by_namespace(
        &self,
        header: &AvailabilityHeader,
        namespace: NamespaceId,
    ) -> Result<Vec<Share>> {
        if self.hanging.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let shares = self
            .chain
            .find(header)
            .ok_or_else(|| DaError::Transport("unknown availability header".into()))?;
        Ok(shares
            .into_iter()
            .filter(|s| s.namespace() == namespace)
            .collect())
    }
}

/// Signer that encodes the payload itself and counts account queries.
#[derive(Clone, Default)]
pub(crate) struct MockSigner {
    queries: Arc<AtomicUsize>,
    unknown_account: bool,
}

impl MockSigner {
    pub(crate) fn unknown_account() -> Self {
        Self {
            unknown_account: true,
            ..Self::default()
        }
    }

    pub(crate) fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Signer for MockSigner {
    async fn query_account_state(&self) -> Result<()> {
        if self.unknown_account {
            return Err(DaError::Signing("account not found".into()));
        }
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn sign_and_encode(&self, payload: &PayForMessage, _fee: &Fee) -> Result<Vec<u8>> {
        if self.queries() == 0 {
            return Err(DaError::Signing("account state not queried".into()));
        }
        bincode::serialize(payload).map_err(|e| DaError::Signing(e.to_string()))
    }
}

#[derive(Clone)]
enum Outcome {
    Accept { height: u64 },
    Reject { code: u32, log: String },
    Hang,
}

/// Broadcaster with a fixed outcome. Accepted payloads from [`MockSigner`] are
/// posted to the attached chain, if any.
#[derive(Clone)]
pub(crate) struct MockBroadcaster {
    outcome: Outcome,
    chain: Option<MockChain>,
    broadcasts: Arc<AtomicUsize>,
}

impl MockBroadcaster {
    fn with(outcome: Outcome) -> Self {
        Self {
            outcome,
            chain: None,
            broadcasts: Arc::default(),
        }
    }

    pub(crate) fn accepting(height: u64) -> Self {
        Self::with(Outcome::Accept { height })
    }

    pub(crate) fn rejecting(code: u32, log: &str) -> Self {
        Self::with(Outcome::Reject {
            code,
            log: log.to_string(),
        })
    }

    pub(crate) fn hanging() -> Self {
        Self::with(Outcome::Hang)
    }

    pub(crate) fn posting_to(chain: MockChain, height: u64) -> Self {
        Self {
            chain: Some(chain),
            ..Self::accepting(height)
        }
    }

    pub(crate) fn broadcasts(&self) -> usize {
        self.broadcasts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TxBroadcaster for MockBroadcaster {
    async fn broadcast(&self, tx: Vec<u8>, _mode: BroadcastMode) -> Result<BroadcastResponse> {
        self.broadcasts.fetch_add(1, Ordering::SeqCst);
        // let concurrent submissions interleave
        tokio::task::yield_now().await;

        match &self.outcome {
            Outcome::Accept { height } => {
                if let Some(chain) = &self.chain {
                    let payload: PayForMessage = bincode::deserialize(&tx)
                        .map_err(|e| DaError::Transport(e.to_string()))?;
                    let message = Message::new(payload.namespace, payload.message);
                    chain.post(*height, message.to_shares());
                }
                Ok(BroadcastResponse {
                    code: 0,
                    raw_log: String::new(),
                    height: *height,
                    gas_used: 80_000,
                    tx_hash: hex::encode([0xAB; 32]),
                })
            }
            Outcome::Reject { code, log } => Ok(BroadcastResponse {
                code: *code,
                raw_log: log.clone(),
                gas_used: 20_000,
                ..BroadcastResponse::default()
            }),
            Outcome::Hang => std::future::pending().await,
        }
    }
}
