use crate::{
    errors::{ScanError, ScanResult},
    frontier::Frontier,
};
use shardscan_core::trace;
use shardscan_ledger_core::{BlockContent, BlockRef, api::BlockSource, errors::SourceError};
use std::collections::HashSet;

/// A shard block not yet accounted for by the frontier, together with its fetched body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredBlock {
    pub block: BlockRef,
    pub content: BlockContent,
}

struct Frame {
    content: BlockContent,
    next_parent: usize,
}

/// Computes the closure of unseen ancestors for the shard blocks of one master block.
///
/// Blocks are emitted in post-order: every parent appears before its children. Blocks
/// resolved by an earlier [`walk`](Self::walk) on the same walker are skipped, so roots
/// sharing history (merges, or several descriptors of one master block) emit each block
/// exactly once. The frontier is only read here; advancing it is the caller's job.
///
/// Any failure aborts the walk with no partial output. The walker should be dropped
/// after an error since its resolved set may then reflect blocks nobody persisted.
pub struct ShardClosureWalker<'a, S: BlockSource + ?Sized> {
    source: &'a S,
    frontier: &'a Frontier,
    resolved: HashSet<BlockRef>,
    fetched: u64,
}

impl<'a, S: BlockSource + ?Sized> ShardClosureWalker<'a, S> {
    pub fn new(source: &'a S, frontier: &'a Frontier) -> Self {
        Self { source, frontier, resolved: HashSet::new(), fetched: 0 }
    }

    /// Number of block bodies fetched from the source so far.
    pub fn fetched(&self) -> u64 {
        self.fetched
    }

    pub fn walk_all<'r>(&mut self, roots: impl IntoIterator<Item = &'r BlockRef>) -> ScanResult<Vec<DiscoveredBlock>> {
        let mut discovered = Vec::new();
        for root in roots {
            discovered.extend(self.walk(root)?);
        }
        Ok(discovered)
    }

    pub fn walk(&mut self, root: &BlockRef) -> ScanResult<Vec<DiscoveredBlock>> {
        let mut discovered = Vec::new();
        if self.is_known(root) {
            trace!("closure root {} already accounted for", root);
            return Ok(discovered);
        }

        // Blocks entered but not yet emitted. Meeting one of them again means the
        // parent links loop back.
        let mut on_path = HashSet::new();
        let mut stack = vec![self.enter(*root, &mut on_path)?];

        while let Some(mut frame) = stack.pop() {
            match frame.content.parents.get(frame.next_parent).copied() {
                Some(parent) => {
                    frame.next_parent += 1;
                    stack.push(frame);
                    if on_path.contains(&parent) {
                        return Err(ScanError::CyclicTopology(parent));
                    }
                    if self.is_known(&parent) {
                        continue;
                    }
                    let next = self.enter(parent, &mut on_path)?;
                    stack.push(next);
                }
                None => {
                    let block = frame.content.id;
                    on_path.remove(&block);
                    self.resolved.insert(block);
                    discovered.push(DiscoveredBlock { block, content: frame.content });
                }
            }
        }

        trace!("closure of {} holds {} new blocks", root, discovered.len());
        Ok(discovered)
    }

    fn is_known(&self, block: &BlockRef) -> bool {
        self.resolved.contains(block) || self.frontier.covers(block)
    }

    fn enter(&mut self, block: BlockRef, on_path: &mut HashSet<BlockRef>) -> ScanResult<Frame> {
        let content = self.source.block_content(&block).map_err(|err| ScanError::fetch(block, err))?;
        self.fetched += 1;
        if content.id != block {
            return Err(ScanError::fetch(block, SourceError::fetch(block, format!("source returned block {}", content.id))));
        }
        on_path.insert(block);
        Ok(Frame { content, next_parent: 0 })
    }
}

/// Returns the unseen ancestors of `start`, followed by `start` itself, parents first.
/// Empty when the frontier already covers `start`.
pub fn discover_closure<S: BlockSource + ?Sized>(source: &S, frontier: &Frontier, start: &BlockRef) -> ScanResult<Vec<BlockRef>> {
    let mut walker = ShardClosureWalker::new(source, frontier);
    Ok(walker.walk(start)?.into_iter().map(|discovered| discovered.block).collect())
}
