use crate::IDENT;
use shardscan_core::warn;
use shardscan_ledger_core::BlockRef;
use std::time::{Duration, Instant};

/// Iterations slower than this are reported.
pub const SLOW_ITERATION: Duration = Duration::from_millis(500);

/// Times the processing of one master block and warns when it takes longer than
/// [`SLOW_ITERATION`]. An iteration abandoned by an error is reported on drop.
pub struct IterationTimer {
    master: BlockRef,
    start: Instant,
    discovered: Option<usize>,
}

impl IterationTimer {
    pub fn start(master: BlockRef) -> Self {
        Self { master, start: Instant::now(), discovered: None }
    }

    /// Closes the measurement for an iteration that discovered `discovered` blocks.
    pub fn finish(mut self, discovered: usize) -> Duration {
        self.discovered = Some(discovered);
        self.start.elapsed()
    }
}

impl Drop for IterationTimer {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        if elapsed <= SLOW_ITERATION {
            return;
        }
        match self.discovered {
            Some(discovered) => {
                warn!("[{IDENT}] master block {} took {:?} for {} new shard blocks", self.master, elapsed, discovered)
            }
            None => warn!("[{IDENT}] master block {} failed after {:?}", self.master, elapsed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::block_ref;
    use shardscan_ledger_core::ShardIdent;

    #[test]
    fn test_finish_reports_elapsed() {
        let timer = IterationTimer::start(block_ref(ShardIdent::masterchain(), 3));
        std::thread::sleep(Duration::from_millis(5));

        let elapsed = timer.finish(4);

        assert!(elapsed >= Duration::from_millis(5));
        assert!(elapsed < SLOW_ITERATION);
    }
}
