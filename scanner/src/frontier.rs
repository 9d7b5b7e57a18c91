use shardscan_ledger_core::{BlockRef, SeqNo, ShardIdent};
use std::collections::{HashMap, hash_map::Entry};

/// Highest sequence number already accounted for, per shard.
///
/// `set` overwrites unconditionally; keeping the values non-decreasing is up to the
/// caller, which goes through [`Frontier::advance`] for that. A frontier has a single
/// owner and is never shared between concurrent scans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontier {
    shards: HashMap<ShardIdent, SeqNo>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, shard: &ShardIdent) -> Option<SeqNo> {
        self.shards.get(shard).copied()
    }

    pub fn set(&mut self, shard: ShardIdent, seqno: SeqNo) {
        self.shards.insert(shard, seqno);
    }

    /// Whether `block` and all its ancestors in the same shard were already handled.
    pub fn covers(&self, block: &BlockRef) -> bool {
        self.get(&block.shard).is_some_and(|seqno| seqno >= block.seqno)
    }

    /// Takes a baseline from the top shard blocks of a master block. Only the
    /// descriptors themselves are recorded, their history is never walked.
    pub fn seed<'a>(&mut self, descriptors: impl IntoIterator<Item = &'a BlockRef>) {
        for block in descriptors {
            self.set(block.shard, block.seqno);
        }
    }

    /// Moves each touched shard to the deepest block seen for it, never backwards.
    /// Returns the number of shards whose sequence number changed.
    pub fn advance<'a>(&mut self, blocks: impl IntoIterator<Item = &'a BlockRef>) -> usize {
        let mut deepest = HashMap::<ShardIdent, SeqNo>::new();
        for block in blocks {
            let seqno = deepest.entry(block.shard).or_insert(block.seqno);
            *seqno = (*seqno).max(block.seqno);
        }

        let mut advanced = 0;
        for (shard, seqno) in deepest {
            match self.shards.entry(shard) {
                Entry::Occupied(mut entry) => {
                    if *entry.get() < seqno {
                        entry.insert(seqno);
                        advanced += 1;
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert(seqno);
                    advanced += 1;
                }
            }
        }
        advanced
    }

    pub fn len(&self) -> usize {
        self.shards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ShardIdent, &SeqNo)> {
        self.shards.iter()
    }
}

impl FromIterator<(ShardIdent, SeqNo)> for Frontier {
    fn from_iter<T: IntoIterator<Item = (ShardIdent, SeqNo)>>(iter: T) -> Self {
        Self { shards: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::block_ref;
    use shardscan_ledger_core::shard::BASECHAIN_ID;

    #[test]
    fn test_get_set_overwrites() {
        let shard = ShardIdent::full(BASECHAIN_ID);
        let mut frontier = Frontier::new();
        assert_eq!(frontier.get(&shard), None);

        frontier.set(shard, 10);
        frontier.set(shard, 7);
        assert_eq!(frontier.get(&shard), Some(7));
        assert_eq!(frontier.len(), 1);
    }

    #[test]
    fn test_covers() {
        let shard = ShardIdent::full(BASECHAIN_ID);
        let (left, _) = shard.split().unwrap();
        let frontier = Frontier::from_iter([(shard, 10)]);

        assert!(frontier.covers(&block_ref(shard, 10)));
        assert!(frontier.covers(&block_ref(shard, 9)));
        assert!(!frontier.covers(&block_ref(shard, 11)));
        assert!(!frontier.covers(&block_ref(left, 3)));
    }

    #[test]
    fn test_advance_is_monotonic() {
        let shard = ShardIdent::full(BASECHAIN_ID);
        let (left, right) = shard.split().unwrap();
        let mut frontier = Frontier::from_iter([(shard, 10), (left, 20)]);

        let blocks = [block_ref(shard, 12), block_ref(shard, 11), block_ref(left, 15), block_ref(right, 1)];
        assert_eq!(frontier.advance(&blocks), 2);

        assert_eq!(frontier.get(&shard), Some(12));
        assert_eq!(frontier.get(&left), Some(20));
        assert_eq!(frontier.get(&right), Some(1));
        assert_eq!(frontier.advance(&blocks), 0);
    }

    #[test]
    fn test_seed() {
        let shard = ShardIdent::full(BASECHAIN_ID);
        let (left, right) = shard.split().unwrap();
        let mut frontier = Frontier::new();
        frontier.seed(&[block_ref(left, 4), block_ref(right, 6)]);
        assert_eq!(frontier.get(&left), Some(4));
        assert_eq!(frontier.get(&right), Some(6));
        assert_eq!(frontier.get(&shard), None);
    }
}
