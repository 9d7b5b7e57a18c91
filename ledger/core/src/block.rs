use crate::{
    hash::BlockHash,
    shard::{ShardIdent, WorkchainId},
};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub type SeqNo = u32;

/// Full reference to a block: where it lives, its position in the shard chain
/// and the hashes a source needs to fetch and check it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockRef {
    pub shard: ShardIdent,
    pub seqno: SeqNo,
    pub root_hash: BlockHash,
    pub file_hash: BlockHash,
}

impl BlockRef {
    pub fn new(shard: ShardIdent, seqno: SeqNo, root_hash: BlockHash, file_hash: BlockHash) -> Self {
        Self { shard, seqno, root_hash, file_hash }
    }

    pub fn workchain(&self) -> WorkchainId {
        self.shard.workchain()
    }

    pub fn is_masterchain(&self) -> bool {
        self.shard.is_masterchain()
    }
}

impl Display for BlockRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.shard, self.seqno, self.root_hash.short())
    }
}

/// A fetched block body, reduced to what scanning needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContent {
    pub id: BlockRef,
    /// Previous blocks: none at the bottom of the visible history, one for a plain
    /// continuation or a split, two right after a merge.
    pub parents: Vec<BlockRef>,
    pub gen_utime: u32,
}

impl BlockContent {
    pub fn new(id: BlockRef, parents: Vec<BlockRef>, gen_utime: u32) -> Self {
        Self { id, parents, gen_utime }
    }

    pub fn content_hash(&self) -> &BlockHash {
        &self.id.file_hash
    }

    pub fn parents(&self) -> &[BlockRef] {
        &self.parents
    }
}
