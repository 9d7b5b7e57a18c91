use crate::{
    block::{BlockRef, SeqNo},
    shard::ShardIdent,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShardError {
    #[error("invalid shard prefix {0:#018x}")]
    InvalidPrefix(u64),

    #[error("shard {0} cannot be split any further")]
    SplitTooDeep(ShardIdent),

    #[error("shard {0} covers its whole workchain and has no parent or sibling")]
    MergeFull(ShardIdent),
}

pub type ShardResult<T> = std::result::Result<T, ShardError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseHashError {
    #[error("block hash must be 32 bytes, got {0} characters or bytes")]
    InvalidLength(usize),

    #[error("block hash '{0}' is not valid hex")]
    InvalidHex(String),
}

/// Failures reported by a block source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The verified connection or its replica is gone.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error("block {0} not found")]
    BlockNotFound(BlockRef),

    #[error("master block {0} not found")]
    MasterNotFound(SeqNo),

    #[error("failed fetching block {block}: {reason}")]
    Fetch { block: BlockRef, reason: String },
}

impl SourceError {
    pub fn fetch<T: Into<String>>(block: BlockRef, reason: T) -> Self {
        Self::Fetch { block, reason: reason.into() }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;
