use std::{
    ops::Sub,
    sync::atomic::{AtomicU64, Ordering},
};

#[derive(Default, Debug)]
pub struct ScanCounters {
    pub master_blocks: AtomicU64,
    pub shard_blocks: AtomicU64,
    pub records: AtomicU64,
    pub fetches: AtomicU64,
}

impl ScanCounters {
    pub fn snapshot(&self) -> ScanCountersSnapshot {
        ScanCountersSnapshot {
            master_blocks: self.master_blocks.load(Ordering::Relaxed),
            shard_blocks: self.shard_blocks.load(Ordering::Relaxed),
            records: self.records.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
        }
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanCountersSnapshot {
    pub master_blocks: u64,
    pub shard_blocks: u64,
    pub records: u64,
    pub fetches: u64,
}

impl Sub for &ScanCountersSnapshot {
    type Output = ScanCountersSnapshot;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::Output {
            master_blocks: self.master_blocks.saturating_sub(rhs.master_blocks),
            shard_blocks: self.shard_blocks.saturating_sub(rhs.shard_blocks),
            records: self.records.saturating_sub(rhs.records),
            fetches: self.fetches.saturating_sub(rhs.fetches),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_delta() {
        let counters = ScanCounters::default();
        counters.master_blocks.fetch_add(2, Ordering::Relaxed);
        counters.records.fetch_add(10, Ordering::Relaxed);
        let before = counters.snapshot();
        counters.master_blocks.fetch_add(1, Ordering::Relaxed);
        counters.shard_blocks.fetch_add(4, Ordering::Relaxed);
        counters.records.fetch_add(5, Ordering::Relaxed);

        let delta = &counters.snapshot() - &before;

        assert_eq!(delta, ScanCountersSnapshot { master_blocks: 1, shard_blocks: 4, records: 5, fetches: 0 });
    }
}
