use crate::derive::{derive_value, encode_hash};
use serde::{Deserialize, Serialize};
use shardscan_ledger_core::{BlockContent, BlockHash, BlockRef, SeqNo, WorkchainId};

/// The durable, append-only form of a scanned block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRecord {
    pub workchain: WorkchainId,
    /// Shard prefix as 16 hex digits
    pub shard: String,
    pub seqno: SeqNo,
    /// Base64 of the block file hash
    pub hash: String,
    pub digits: String,
    pub value: u8,
    /// Unix millis
    pub created_at: u64,
}

impl PersistedRecord {
    /// Record of a fetched shard block, valued by the hash of its body.
    pub fn from_content(content: &BlockContent, created_at: u64) -> Self {
        Self::new(&content.id, content.content_hash(), created_at)
    }

    /// Record of a block known only by reference, such as a master block.
    pub fn from_block(block: &BlockRef, created_at: u64) -> Self {
        Self::new(block, &block.file_hash, created_at)
    }

    fn new(block: &BlockRef, hash: &BlockHash, created_at: u64) -> Self {
        let derived = derive_value(hash);
        Self {
            workchain: block.workchain(),
            shard: format!("{:016x}", block.shard.prefix()),
            seqno: block.seqno,
            hash: encode_hash(hash),
            digits: derived.digits,
            value: derived.value,
            created_at,
        }
    }

    pub fn is_masterchain(&self) -> bool {
        self.workchain == shardscan_ledger_core::shard::MASTERCHAIN_ID
    }
}
