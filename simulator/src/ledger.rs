use crate::params::SimulatorParams;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shardscan_core::trace;
use shardscan_ledger_core::{BlockContent, BlockHash, BlockRef, SeqNo, ShardIdent};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone)]
pub struct MasterEntry {
    pub block: BlockRef,
    pub descriptors: Vec<BlockRef>,
}

/// The generated chain: every block ever produced, the active shards and the master
/// blocks referencing them.
///
/// Sequence numbers follow the usual rules: a block continues its shard with
/// `seqno + 1`, split children start at `parent + 1` and a merge block takes
/// `max(left, right) + 1`.
///
/// Probabilities in the params are expected to be validated beforehand.
pub struct SimulatedLedger {
    params: SimulatorParams,
    rng: ChaCha8Rng,
    tips: BTreeMap<ShardIdent, BlockRef>,
    blocks: HashMap<BlockRef, BlockContent>,
    /// Master seqno each shard block was first published under
    published_at: HashMap<BlockRef, SeqNo>,
    unpublished: Vec<BlockRef>,
    masters: Vec<MasterEntry>,
    gen_utime: u32,
}

impl SimulatedLedger {
    pub fn new(params: SimulatorParams) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(params.seed);
        let mut ledger = Self {
            params,
            rng,
            tips: BTreeMap::new(),
            blocks: HashMap::new(),
            published_at: HashMap::new(),
            unpublished: Vec::new(),
            masters: Vec::new(),
            gen_utime: 1_600_000_000,
        };
        for workchain in ledger.params.workchains.clone() {
            let genesis = ledger.produce(ShardIdent::full(workchain), 1, Vec::new());
            ledger.tips.insert(genesis.shard, genesis);
        }
        ledger.publish_master();
        ledger
    }

    pub fn masters(&self) -> &[MasterEntry] {
        &self.masters
    }

    pub fn master(&self, seqno: SeqNo) -> Option<&MasterEntry> {
        self.masters.get((seqno as usize).checked_sub(1)?)
    }

    pub fn latest_master(&self) -> Option<&MasterEntry> {
        self.masters.last()
    }

    pub fn content(&self, block: &BlockRef) -> Option<&BlockContent> {
        self.blocks.get(block)
    }

    pub fn active_shards(&self) -> impl Iterator<Item = &ShardIdent> {
        self.tips.keys()
    }

    pub fn shard_blocks(&self) -> impl Iterator<Item = &BlockRef> {
        self.published_at.keys()
    }

    /// Shard blocks first published by a master block in `(after, upto]`.
    pub fn shard_blocks_between(&self, after: SeqNo, upto: SeqNo) -> Vec<BlockRef> {
        let mut blocks: Vec<BlockRef> =
            self.published_at.iter().filter(|(_, seqno)| **seqno > after && **seqno <= upto).map(|(block, _)| *block).collect();
        blocks.sort();
        blocks
    }

    /// Runs one step of shard activity and publishes the next master block.
    pub fn step(&mut self) -> &MasterEntry {
        let shards: Vec<ShardIdent> = self.tips.keys().copied().collect();
        for shard in shards {
            self.step_shard(shard);
        }
        self.merge_siblings();
        self.publish_master()
    }

    fn step_shard(&mut self, shard: ShardIdent) {
        let Some(tip) = self.tips.get(&shard).copied() else { return };

        if shard.prefix_len() < self.params.max_split_depth && self.rng.gen_bool(self.params.split_probability) {
            if let Ok((left, right)) = shard.split() {
                self.tips.remove(&shard);
                let left = self.produce(left, tip.seqno + 1, vec![tip]);
                let right = self.produce(right, tip.seqno + 1, vec![tip]);
                self.tips.insert(left.shard, left);
                self.tips.insert(right.shard, right);
                trace!("shard {} split at seqno {}", shard, tip.seqno);
                return;
            }
        }

        let count = self.rng.gen_range(0..=self.params.max_blocks_per_step);
        let mut tip = tip;
        for _ in 0..count {
            tip = self.produce(shard, tip.seqno + 1, vec![tip]);
        }
        self.tips.insert(shard, tip);
    }

    fn merge_siblings(&mut self) {
        let lefts: Vec<ShardIdent> = self.tips.keys().filter(|shard| shard.is_left_child()).copied().collect();
        for left in lefts {
            let (Ok(right), Ok(parent)) = (left.sibling(), left.merge()) else { continue };
            let (Some(&left_tip), Some(&right_tip)) = (self.tips.get(&left), self.tips.get(&right)) else { continue };
            if !self.rng.gen_bool(self.params.merge_probability) {
                continue;
            }
            self.tips.remove(&left);
            self.tips.remove(&right);
            let merged = self.produce(parent, left_tip.seqno.max(right_tip.seqno) + 1, vec![left_tip, right_tip]);
            self.tips.insert(parent, merged);
            trace!("shards {} and {} merged into {}", left, right, parent);
        }
    }

    fn publish_master(&mut self) -> &MasterEntry {
        let seqno = self.masters.len() as SeqNo + 1;
        let parents = self.masters.last().map(|entry| vec![entry.block]).unwrap_or_default();
        self.gen_utime += self.params.interval.as_secs().max(1) as u32;
        let block = self.hash_block(ShardIdent::masterchain(), seqno, &parents);
        self.blocks.insert(block, BlockContent::new(block, parents, self.gen_utime));

        for shard_block in self.unpublished.drain(..) {
            self.published_at.insert(shard_block, seqno);
        }
        let descriptors = self.tips.values().copied().collect();
        self.masters.push(MasterEntry { block, descriptors });
        &self.masters[self.masters.len() - 1]
    }

    fn produce(&mut self, shard: ShardIdent, seqno: SeqNo, parents: Vec<BlockRef>) -> BlockRef {
        let block = self.hash_block(shard, seqno, &parents);
        self.blocks.insert(block, BlockContent::new(block, parents, self.gen_utime));
        self.unpublished.push(block);
        block
    }

    fn hash_block(&self, shard: ShardIdent, seqno: SeqNo, parents: &[BlockRef]) -> BlockRef {
        let mut state = blake2b_simd::Params::new().hash_length(32).personal(b"ShardscanBlock").to_state();
        state.update(&self.params.seed.to_le_bytes());
        state.update(&shard.workchain().to_le_bytes());
        state.update(&shard.prefix().to_le_bytes());
        state.update(&seqno.to_le_bytes());
        for parent in parents {
            state.update(parent.root_hash.as_bytes());
        }
        let root_hash = to_block_hash(state.finalize().as_bytes());

        let file = blake2b_simd::Params::new().hash_length(32).personal(b"ShardscanFile").hash(root_hash.as_bytes());
        BlockRef::new(shard, seqno, root_hash, to_block_hash(file.as_bytes()))
    }
}

fn to_block_hash(bytes: &[u8]) -> BlockHash {
    BlockHash::from_slice(bytes).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn busy_params(seed: u64) -> SimulatorParams {
        SimulatorParams { split_probability: 0.4, merge_probability: 0.4, max_split_depth: 3, ..SimulatorParams::instant(seed) }
    }

    #[test]
    fn test_genesis() {
        let params = SimulatorParams { workchains: vec![0, 1], ..SimulatorParams::instant(7) };
        let ledger = SimulatedLedger::new(params);

        let master = ledger.latest_master().unwrap();
        assert_eq!(master.block.seqno, 1);
        assert_eq!(master.descriptors.len(), 2);
        assert!(master.descriptors.iter().all(|block| block.seqno == 1 && block.shard.is_full()));
        assert_eq!(ledger.shard_blocks_between(0, 1).len(), 2);
    }

    #[test]
    fn test_same_seed_same_chain() {
        let mut first = SimulatedLedger::new(busy_params(42));
        let mut second = SimulatedLedger::new(busy_params(42));
        for _ in 0..30 {
            let a = first.step().descriptors.clone();
            let b = second.step().descriptors.clone();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_structure_rules_hold() {
        let mut ledger = SimulatedLedger::new(busy_params(3));
        for _ in 0..60 {
            ledger.step();
        }

        let mut splits = 0;
        let mut merges = 0;
        for block in ledger.shard_blocks() {
            let content = ledger.content(block).unwrap();
            assert_eq!(&content.id, block);
            for parent in content.parents() {
                assert!(parent.seqno < block.seqno);
                assert!(ledger.content(parent).is_some());
            }
            match content.parents() {
                [parent] if parent.shard != block.shard => {
                    assert_eq!(parent.shard, block.shard.merge().unwrap());
                    splits += 1;
                }
                [left, right] => {
                    assert_eq!(left.shard.merge().unwrap(), block.shard);
                    assert_eq!(right.shard, left.shard.sibling().unwrap());
                    merges += 1;
                }
                _ => {}
            }
            assert!(block.shard.prefix_len() <= 3);
        }
        assert!(splits > 0, "expected at least one split");
        assert!(merges > 0, "expected at least one merge");
    }

    #[test]
    fn test_active_shards_partition_workchain() {
        let mut ledger = SimulatedLedger::new(busy_params(11));
        for _ in 0..40 {
            let descriptors = ledger.step().descriptors.clone();
            // Leaf shards cover the whole prefix space exactly once
            let coverage: f64 = descriptors.iter().map(|block| 0.5f64.powi(block.shard.prefix_len() as i32)).sum();
            assert!((coverage - 1.0).abs() < 1e-9);
            assert_eq!(descriptors.len(), ledger.active_shards().count());
        }
    }

    #[test]
    fn test_every_block_published_once() {
        let mut ledger = SimulatedLedger::new(busy_params(5));
        for _ in 0..20 {
            ledger.step();
        }
        let total = ledger.shard_blocks().count();
        let by_range: usize = (0..21).map(|seqno| ledger.shard_blocks_between(seqno, seqno + 1).len()).sum();
        assert_eq!(total, by_range);
        assert_eq!(ledger.masters().len(), 21);
    }
}
