use crate::{
    errors::SimulatorResult,
    ledger::{MasterEntry, SimulatedLedger},
    params::SimulatorParams,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use shardscan_core::{debug, info};
use shardscan_ledger_core::{
    BlockContent, BlockRef, SeqNo,
    api::{BlockSource, TrustedSource},
    errors::{SourceError, SourceResult},
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Serves a [`SimulatedLedger`] as a trusted source. A new master block is produced
/// each time a caller waits for one that does not exist yet, after the configured
/// interval.
pub struct ShardchainSimulator {
    interval: std::time::Duration,
    ledger: RwLock<SimulatedLedger>,
    offline: AtomicBool,
    fetches: AtomicU64,
}

impl ShardchainSimulator {
    pub fn new(params: SimulatorParams) -> SimulatorResult<Self> {
        params.validate()?;
        info!(
            "Simulating workchains {:?} with seed {}, one master block every {:?}",
            params.workchains, params.seed, params.interval
        );
        Ok(Self {
            interval: params.interval,
            ledger: RwLock::new(SimulatedLedger::new(params)),
            offline: AtomicBool::new(false),
            fetches: AtomicU64::new(0),
        })
    }

    /// Produces `steps` master blocks right away.
    pub fn advance(&self, steps: usize) -> Option<BlockRef> {
        let mut ledger = self.ledger.write();
        for _ in 0..steps {
            ledger.step();
        }
        ledger.latest_master().map(|entry| entry.block)
    }

    pub fn master_count(&self) -> usize {
        self.ledger.read().masters().len()
    }

    pub fn all_shard_blocks(&self) -> Vec<BlockRef> {
        let mut blocks: Vec<BlockRef> = self.ledger.read().shard_blocks().copied().collect();
        blocks.sort();
        blocks
    }

    /// Shard blocks first referenced by master blocks `after + 1 ..= upto`.
    pub fn shard_blocks_between(&self, after: SeqNo, upto: SeqNo) -> Vec<BlockRef> {
        self.ledger.read().shard_blocks_between(after, upto)
    }

    pub fn fetches(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Simulates losing the upstream connection.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> SourceResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(SourceError::Unavailable("simulated ledger is offline".to_string()));
        }
        Ok(())
    }

    fn master_entry(&self, seqno: SeqNo) -> Option<MasterEntry> {
        self.ledger.read().master(seqno).cloned()
    }
}

impl BlockSource for ShardchainSimulator {
    fn block_content(&self, block: &BlockRef) -> SourceResult<BlockContent> {
        self.check_online()?;
        self.fetches.fetch_add(1, Ordering::Relaxed);
        self.ledger.read().content(block).cloned().ok_or(SourceError::BlockNotFound(*block))
    }
}

#[async_trait]
impl TrustedSource for ShardchainSimulator {
    async fn master_block(&self) -> SourceResult<BlockRef> {
        self.check_online()?;
        self.ledger.read().latest_master().map(|entry| entry.block).ok_or(SourceError::MasterNotFound(0))
    }

    async fn wait_master_block(&self, seqno: SeqNo) -> SourceResult<BlockRef> {
        loop {
            self.check_online()?;
            if let Some(entry) = self.master_entry(seqno) {
                return Ok(entry.block);
            }
            tokio::time::sleep(self.interval).await;

            {
                let mut ledger = self.ledger.write();
                if ledger.masters().len() < seqno as usize {
                    let entry = ledger.step();
                    debug!("produced master block {} with {} shards", entry.block, entry.descriptors.len());
                }
            }
        }
    }

    fn shard_descriptors(&self, master: &BlockRef) -> SourceResult<Vec<BlockRef>> {
        self.check_online()?;
        match self.master_entry(master.seqno) {
            Some(entry) if entry.block == *master => Ok(entry.descriptors),
            _ => Err(SourceError::MasterNotFound(master.seqno)),
        }
    }

    fn begin_session(&self) -> SourceResult<()> {
        self.check_online()
    }
}
