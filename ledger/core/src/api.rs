use crate::{
    block::{BlockContent, BlockRef, SeqNo},
    errors::SourceResult,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Synchronous access to verified block bodies.
pub trait BlockSource: Send + Sync {
    fn block_content(&self, block: &BlockRef) -> SourceResult<BlockContent>;
}

/// Abstracts a proof-checked ledger source: the master chain head, master block
/// shard descriptors and block bodies. Proof verification happens behind this trait.
#[async_trait]
pub trait TrustedSource: BlockSource {
    /// The latest finalized master block.
    async fn master_block(&self) -> SourceResult<BlockRef>;

    /// Suspends until master block `seqno` is finalized and returns it.
    async fn wait_master_block(&self, seqno: SeqNo) -> SourceResult<BlockRef>;

    /// The top shard blocks referenced by a master block.
    fn shard_descriptors(&self, master: &BlockRef) -> SourceResult<Vec<BlockRef>>;

    /// Pins the following requests to a single upstream replica so their views of
    /// the parent graph agree. Switching replicas is only allowed here.
    fn begin_session(&self) -> SourceResult<()> {
        Ok(())
    }
}

pub type DynTrustedSource = Arc<dyn TrustedSource>;

impl<T: BlockSource + ?Sized> BlockSource for Arc<T> {
    fn block_content(&self, block: &BlockRef) -> SourceResult<BlockContent> {
        (**self).block_content(block)
    }
}
