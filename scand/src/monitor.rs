use shardscan_core::{info, trace};
use shardscan_scanner::ScanCounters;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use triggered::Listener;

/// Periodically logs how much the scanner did since the previous report.
pub struct ScanMonitor {
    counters: Arc<ScanCounters>,
    interval: Duration,
}

impl ScanMonitor {
    pub fn new(counters: Arc<ScanCounters>, interval: Duration) -> ScanMonitor {
        ScanMonitor { counters, interval }
    }

    pub async fn worker(self, shutdown: Listener) {
        let mut last_snapshot = self.counters.snapshot();
        let mut last_log_time = Instant::now();
        let mut ticker = tokio::time::interval(self.interval);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.clone() => break,
                _ = ticker.tick() => {}
            }

            let snapshot = self.counters.snapshot();
            if snapshot == last_snapshot {
                // No update, avoid printing useless info
                last_log_time = Instant::now();
                continue;
            }

            // Subtract the snapshots
            let delta = &snapshot - &last_snapshot;
            let now = Instant::now();

            info!(
                "Scanned {} master blocks and {} shard blocks in the last {:.2}s ({} records written; {} block fetches)",
                delta.master_blocks,
                delta.shard_blocks,
                (now - last_log_time).as_secs_f64(),
                delta.records,
                delta.fetches,
            );

            last_snapshot = snapshot;
            last_log_time = now;
        }

        trace!("monitor task exiting");
    }
}
