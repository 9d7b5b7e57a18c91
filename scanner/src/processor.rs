use crate::{
    IDENT,
    closure::ShardClosureWalker,
    config::ScanConfig,
    counters::ScanCounters,
    errors::{ScanError, ScanResult},
    frontier::Frontier,
    record::PersistedRecord,
    sink::RecordSink,
    timer::IterationTimer,
};
use shardscan_core::{debug, error, info, time::unix_now, trace};
use shardscan_ledger_core::{BlockRef, api::TrustedSource};
use std::{
    sync::{Arc, atomic::Ordering},
    time::Duration,
};
use triggered::Listener;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Initializing,
    Streaming,
    Discovering,
    Persisting,
    Advancing,
    /// Terminal. Reached on any error; every later call fails with [`ScanError::Halted`].
    Fatal,
    /// Terminal. Reached when a run is cancelled or hits its master block limit.
    Stopped,
}

/// Outcome of processing a single master block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationSummary {
    pub master: BlockRef,
    pub discovered: usize,
    pub records: usize,
    pub fetched: u64,
    pub shards_advanced: usize,
    pub elapsed: Duration,
}

/// Totals of one [`Scanner::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub master_blocks: u64,
    pub shard_blocks: u64,
    pub records: u64,
    pub last_master: Option<BlockRef>,
}

impl ScanReport {
    fn add(&mut self, summary: &IterationSummary) {
        self.master_blocks += 1;
        self.shard_blocks += summary.discovered as u64;
        self.records += summary.records as u64;
        self.last_master = Some(summary.master);
    }
}

/// Follows the master chain and persists every newly finalized shard block.
///
/// Each master block goes through discovery, persistence and then the frontier
/// advance, in that order, so the frontier never moves past a block that was not
/// handed to the sink.
pub struct Scanner<S: TrustedSource + ?Sized, K: RecordSink> {
    source: Arc<S>,
    sink: K,
    frontier: Frontier,
    config: ScanConfig,
    state: ScanState,
    counters: Arc<ScanCounters>,
    last_master: Option<BlockRef>,
}

impl<S: TrustedSource + ?Sized, K: RecordSink> Scanner<S, K> {
    pub fn new(source: Arc<S>, sink: K, config: ScanConfig) -> Self {
        Self {
            source,
            sink,
            frontier: Frontier::new(),
            config,
            state: ScanState::Initializing,
            counters: Default::default(),
            last_master: None,
        }
    }

    pub fn with_counters(mut self, counters: Arc<ScanCounters>) -> Self {
        self.counters = counters;
        self
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn counters(&self) -> Arc<ScanCounters> {
        self.counters.clone()
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn last_master(&self) -> Option<BlockRef> {
        self.last_master
    }

    /// Takes the latest master block as the starting point and seeds the frontier with
    /// its shard descriptors. Shard blocks reachable from it are treated as already seen;
    /// only the master block itself is recorded, when master records are enabled.
    pub async fn initialize(&mut self) -> ScanResult<BlockRef> {
        self.start().await.map(|(master, _)| master)
    }

    async fn start(&mut self) -> ScanResult<(BlockRef, usize)> {
        self.ensure_live()?;
        self.state = ScanState::Initializing;
        let result = self.seed_frontier().await;
        self.settle(result)
    }

    async fn seed_frontier(&mut self) -> ScanResult<(BlockRef, usize)> {
        self.source.begin_session().map_err(ScanError::master)?;
        let master = self.source.master_block().await.map_err(ScanError::master)?;
        let descriptors = self.source.shard_descriptors(&master).map_err(ScanError::master)?;

        let mut records = 0;
        if self.config.record_master_blocks {
            self.sink.append(&PersistedRecord::from_block(&master, unix_now()))?;
            self.sink.flush()?;
            records += 1;
        }

        self.frontier.seed(&descriptors);
        self.last_master = Some(master);
        self.counters.records.fetch_add(records as u64, Ordering::Relaxed);
        info!("[{IDENT}] starting after master block {} with {} shards", master, descriptors.len());
        Ok((master, records))
    }

    /// Discovers, persists and accounts for all shard blocks new since the previous
    /// master block.
    pub fn process_master(&mut self, master: &BlockRef) -> ScanResult<IterationSummary> {
        self.ensure_live()?;
        let result = self.process_master_impl(master);
        self.settle(result)
    }

    fn process_master_impl(&mut self, master: &BlockRef) -> ScanResult<IterationSummary> {
        let timer = IterationTimer::start(*master);
        // Failover to another replica may only happen here, never mid-closure
        self.source.begin_session().map_err(ScanError::master)?;
        let descriptors = self.source.shard_descriptors(master).map_err(ScanError::master)?;

        self.state = ScanState::Discovering;
        let mut walker = ShardClosureWalker::new(&*self.source, &self.frontier);
        let discovered = walker.walk_all(&descriptors)?;
        let fetched = walker.fetched();
        self.counters.fetches.fetch_add(fetched, Ordering::Relaxed);
        trace!("[{IDENT}] master block {} references {} shards, {} new blocks", master, descriptors.len(), discovered.len());

        self.state = ScanState::Persisting;
        let created_at = unix_now();
        let mut records = 0;
        for content in discovered.iter().map(|discovered| &discovered.content) {
            self.sink.append(&PersistedRecord::from_content(content, created_at))?;
            records += 1;
        }
        if self.config.record_master_blocks {
            self.sink.append(&PersistedRecord::from_block(master, created_at))?;
            records += 1;
        }
        self.sink.flush()?;

        self.state = ScanState::Advancing;
        let shards_advanced = self.frontier.advance(discovered.iter().map(|discovered| &discovered.block));
        self.last_master = Some(*master);
        self.state = ScanState::Streaming;

        self.counters.master_blocks.fetch_add(1, Ordering::Relaxed);
        self.counters.shard_blocks.fetch_add(discovered.len() as u64, Ordering::Relaxed);
        self.counters.records.fetch_add(records as u64, Ordering::Relaxed);

        let elapsed = timer.finish(discovered.len());
        Ok(IterationSummary { master: *master, discovered: discovered.len(), records, fetched, shards_advanced, elapsed })
    }

    /// Processes master blocks one after another until `shutdown` fires, the configured
    /// master block limit is reached, or an error occurs.
    pub async fn run(&mut self, shutdown: Listener) -> ScanResult<ScanReport> {
        self.ensure_live()?;
        let mut report = ScanReport::default();

        let mut last_master = match self.last_master {
            Some(master) => master,
            None => {
                let initialized = tokio::select! {
                    biased;
                    _ = shutdown.clone() => None,
                    result = self.start() => Some(result),
                };
                match initialized {
                    Some(result) => {
                        let (master, records) = result?;
                        report.records += records as u64;
                        master
                    }
                    None => return Ok(self.stop(report)),
                }
            }
        };
        self.state = ScanState::Streaming;

        loop {
            if self.config.max_master_blocks.is_some_and(|max| report.master_blocks >= max) {
                debug!("[{IDENT}] reached the limit of {} master blocks", report.master_blocks);
                break;
            }

            let next = tokio::select! {
                biased;
                _ = shutdown.clone() => None,
                result = self.source.wait_master_block(last_master.seqno + 1) => Some(result),
            };
            let master = match next {
                Some(result) => {
                    let result = result.map_err(ScanError::master);
                    self.settle(result)?
                }
                None => break,
            };

            let summary = self.process_master(&master)?;
            debug!(
                "[{IDENT}] master block {}: {} new shard blocks, {} records, {} fetches in {:?}",
                master, summary.discovered, summary.records, summary.fetched, summary.elapsed
            );
            report.add(&summary);
            last_master = master;
        }

        Ok(self.stop(report))
    }

    fn stop(&mut self, report: ScanReport) -> ScanReport {
        self.state = ScanState::Stopped;
        info!("[{IDENT}] stopped after {} master blocks and {} shard blocks", report.master_blocks, report.shard_blocks);
        report
    }

    fn ensure_live(&self) -> ScanResult<()> {
        match self.state {
            ScanState::Fatal => Err(ScanError::Halted),
            _ => Ok(()),
        }
    }

    fn settle<T>(&mut self, result: ScanResult<T>) -> ScanResult<T> {
        match &result {
            Ok(_) => self.state = ScanState::Streaming,
            Err(err) => {
                error!("[{IDENT}] {err}");
                self.state = ScanState::Fatal;
            }
        }
        result
    }
}
