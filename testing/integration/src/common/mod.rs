use shardscan_ledger_core::{BlockRef, SeqNo, WorkchainId};
use shardscan_scanner::PersistedRecord;
use shardscan_simulator::{ShardchainSimulator, SimulatorParams};
use std::collections::HashMap;

/// Identifies a record or block independently of when it was written.
pub type BlockKey = (WorkchainId, String, SeqNo, String);

pub fn record_key(record: &PersistedRecord) -> BlockKey {
    (record.workchain, record.shard.clone(), record.seqno, record.hash.clone())
}

pub fn block_key(block: &BlockRef) -> BlockKey {
    record_key(&PersistedRecord::from_block(block, 0))
}

/// Simulation parameters with frequent splits and merges and no delay between master blocks.
pub fn busy_params(seed: u64) -> SimulatorParams {
    SimulatorParams {
        split_probability: 0.3,
        merge_probability: 0.3,
        max_split_depth: 3,
        max_blocks_per_step: 3,
        ..SimulatorParams::instant(seed)
    }
}

/// Shard blocks published by master blocks `after + 1 ..= upto`, keyed the way records are.
pub fn expected_blocks(simulator: &ShardchainSimulator, after: SeqNo, upto: SeqNo) -> HashMap<BlockKey, BlockRef> {
    simulator.shard_blocks_between(after, upto).into_iter().map(|block| (block_key(&block), block)).collect()
}

/// Asserts that `records` hold every expected block exactly once, with every parent
/// that was also expected written before its child.
pub fn assert_complete_and_ordered(
    simulator: &ShardchainSimulator,
    records: &[PersistedRecord],
    expected: &HashMap<BlockKey, BlockRef>,
) {
    let shard_records: Vec<&PersistedRecord> = records.iter().filter(|record| !record.is_masterchain()).collect();
    assert_eq!(shard_records.len(), expected.len(), "record count differs from the generated shard blocks");

    let mut index = HashMap::new();
    for (i, record) in shard_records.iter().enumerate() {
        let key = record_key(record);
        assert!(expected.contains_key(&key), "unexpected record {key:?}");
        assert!(index.insert(key.clone(), i).is_none(), "record {key:?} written twice");
    }

    for (key, block) in expected {
        let content = shardscan_ledger_core::api::BlockSource::block_content(simulator, block).unwrap();
        for parent in content.parents() {
            if let Some(parent_index) = index.get(&block_key(parent)) {
                assert!(*parent_index < index[key], "parent {parent} written after {block}");
            }
        }
    }
}
