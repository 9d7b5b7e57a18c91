use crate::errors::{SimulatorError, SimulatorResult};
use serde::{Deserialize, Serialize};
use shardscan_ledger_core::{
    WorkchainId,
    shard::{BASECHAIN_ID, MASTERCHAIN_ID, MAX_SPLIT_DEPTH},
};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorParams {
    pub seed: u64,

    /// Time between two master blocks
    pub interval: Duration,

    /// Chance that an active shard splits in a given master step
    pub split_probability: f64,

    /// Chance that two active sibling shards merge in a given master step
    pub merge_probability: f64,

    pub max_split_depth: u8,

    /// Upper bound on blocks a single shard produces per master step
    pub max_blocks_per_step: u32,

    pub workchains: Vec<WorkchainId>,
}

impl SimulatorParams {
    pub fn validate(&self) -> SimulatorResult<()> {
        for (name, value) in [("split probability", self.split_probability), ("merge probability", self.merge_probability)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SimulatorError::InvalidProbability { name, value });
            }
        }
        if self.max_split_depth > MAX_SPLIT_DEPTH {
            return Err(SimulatorError::SplitDepthTooLarge(self.max_split_depth, MAX_SPLIT_DEPTH));
        }
        if self.workchains.is_empty() {
            return Err(SimulatorError::NoWorkchains);
        }
        if let Some(&workchain) = self.workchains.iter().find(|&&workchain| workchain == MASTERCHAIN_ID) {
            return Err(SimulatorError::MasterchainWorkchain(workchain));
        }
        Ok(())
    }

    /// Produces master blocks back to back, for tests.
    pub fn instant(seed: u64) -> Self {
        Self { seed, interval: Duration::ZERO, ..Default::default() }
    }
}

impl Default for SimulatorParams {
    fn default() -> Self {
        Self {
            seed: 0,
            interval: Duration::from_millis(1000),
            split_probability: 0.1,
            merge_probability: 0.1,
            max_split_depth: 3,
            max_blocks_per_step: 2,
            workchains: vec![BASECHAIN_ID],
        }
    }
}
