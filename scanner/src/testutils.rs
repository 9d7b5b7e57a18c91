//! In-memory block sources and sinks for tests.

use crate::{
    errors::{SinkError, SinkResult},
    record::PersistedRecord,
    sink::RecordSink,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use shardscan_ledger_core::{
    BlockContent, BlockHash, BlockRef, SeqNo, ShardIdent,
    api::{BlockSource, TrustedSource},
    errors::{SourceError, SourceResult},
};
use std::{
    collections::{HashMap, HashSet},
    ops::RangeInclusive,
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
};
use tokio::sync::Notify;

/// A reference whose hashes are derived from the block position, so tests can name
/// a block before it exists.
pub fn block_ref(shard: ShardIdent, seqno: SeqNo) -> BlockRef {
    let mut root = [0u8; 32];
    root[..4].copy_from_slice(&shard.workchain().to_be_bytes());
    root[4..12].copy_from_slice(&shard.prefix().to_be_bytes());
    root[12..16].copy_from_slice(&seqno.to_be_bytes());
    let mut file = root;
    for (i, byte) in file.iter_mut().enumerate() {
        *byte = byte.wrapping_mul(31).wrapping_add(i as u8 ^ 0x5a);
    }
    BlockRef::new(shard, seqno, BlockHash::from_bytes(root), BlockHash::from_bytes(file))
}

struct MasterEntry {
    block: BlockRef,
    descriptors: Vec<BlockRef>,
}

/// A [`TrustedSource`] backed by maps, with failure injection and call counters.
#[derive(Default)]
pub struct MemorySource {
    blocks: RwLock<HashMap<BlockRef, BlockContent>>,
    masters: RwLock<Vec<MasterEntry>>,
    failing: RwLock<HashSet<BlockRef>>,
    unavailable: AtomicBool,
    fetches: AtomicU64,
    sessions: AtomicU64,
    master_added: Notify,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, content: BlockContent) {
        self.blocks.write().insert(content.id, content);
    }

    /// Publishes the next master block (seqno 1, 2, ...) referencing `descriptors`.
    pub fn push_master(&self, descriptors: Vec<BlockRef>) -> BlockRef {
        let block = {
            let mut masters = self.masters.write();
            let block = block_ref(ShardIdent::masterchain(), masters.len() as SeqNo + 1);
            masters.push(MasterEntry { block, descriptors });
            block
        };
        self.master_added.notify_waiters();
        block
    }

    /// Makes every fetch of `block` fail.
    pub fn fail_block(&self, block: BlockRef) {
        self.failing.write().insert(block);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
        self.master_added.notify_waiters();
    }

    pub fn fetches(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn sessions(&self) -> u64 {
        self.sessions.load(Ordering::SeqCst)
    }

    pub fn blocks(&self) -> Vec<BlockRef> {
        self.blocks.read().keys().copied().collect()
    }

    pub fn content(&self, block: &BlockRef) -> Option<BlockContent> {
        self.blocks.read().get(block).cloned()
    }

    fn check_available(&self) -> SourceResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SourceError::Unavailable("memory source switched off".to_string()));
        }
        Ok(())
    }

    fn master_at(&self, seqno: SeqNo) -> Option<BlockRef> {
        let index = (seqno as usize).checked_sub(1)?;
        self.masters.read().get(index).map(|entry| entry.block)
    }
}

impl BlockSource for MemorySource {
    fn block_content(&self, block: &BlockRef) -> SourceResult<BlockContent> {
        self.check_available()?;
        if self.failing.read().contains(block) {
            return Err(SourceError::fetch(*block, "injected failure"));
        }
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.blocks.read().get(block).cloned().ok_or(SourceError::BlockNotFound(*block))
    }
}

#[async_trait]
impl TrustedSource for MemorySource {
    async fn master_block(&self) -> SourceResult<BlockRef> {
        self.check_available()?;
        self.masters.read().last().map(|entry| entry.block).ok_or(SourceError::MasterNotFound(0))
    }

    async fn wait_master_block(&self, seqno: SeqNo) -> SourceResult<BlockRef> {
        loop {
            // Register before checking so a push in between is not missed
            let added = self.master_added.notified();
            self.check_available()?;
            if let Some(block) = self.master_at(seqno) {
                return Ok(block);
            }
            added.await;
        }
    }

    fn shard_descriptors(&self, master: &BlockRef) -> SourceResult<Vec<BlockRef>> {
        self.check_available()?;
        let masters = self.masters.read();
        masters
            .iter()
            .find(|entry| entry.block == *master)
            .map(|entry| entry.descriptors.clone())
            .ok_or(SourceError::MasterNotFound(master.seqno))
    }

    fn begin_session(&self) -> SourceResult<()> {
        self.sessions.fetch_add(1, Ordering::SeqCst);
        self.check_available()
    }
}

/// Builds parent graphs out of [`block_ref`] references.
#[derive(Default)]
pub struct TopologyBuilder {
    source: MemorySource,
}

impl TopologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, content: BlockContent) -> &mut Self {
        self.source.insert(content);
        self
    }

    pub fn block(&mut self, shard: ShardIdent, seqno: SeqNo, parents: &[BlockRef]) -> BlockRef {
        let block = block_ref(shard, seqno);
        self.source.insert(BlockContent::new(block, parents.to_vec(), seqno));
        block
    }

    /// Consecutive blocks of one shard; the first one gets `parents`.
    pub fn chain(&mut self, shard: ShardIdent, seqnos: RangeInclusive<SeqNo>, parents: &[BlockRef]) -> Vec<BlockRef> {
        let mut blocks: Vec<BlockRef> = Vec::new();
        for seqno in seqnos {
            let block = match blocks.last() {
                Some(prev) => self.block(shard, seqno, &[*prev]),
                None => self.block(shard, seqno, parents),
            };
            blocks.push(block);
        }
        blocks
    }

    pub fn build(self) -> MemorySource {
        self.source
    }
}

/// Rejects every append once `fail_after` records went through.
#[derive(Debug, Default)]
pub struct FailingSink {
    pub accepted: Vec<PersistedRecord>,
    pub fail_after: usize,
}

impl FailingSink {
    pub fn new(fail_after: usize) -> Self {
        Self { accepted: Vec::new(), fail_after }
    }
}

impl RecordSink for FailingSink {
    fn append(&mut self, record: &PersistedRecord) -> SinkResult<()> {
        if self.accepted.len() >= self.fail_after {
            return Err(SinkError::Rejected(format!("sink is full after {} records", self.fail_after)));
        }
        self.accepted.push(record.clone());
        Ok(())
    }
}
