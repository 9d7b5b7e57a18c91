use shardscan_ledger_core::{BlockRef, errors::SourceError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("sink io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("record rejected: {0}")]
    Rejected(String),
}

pub type SinkResult<T> = std::result::Result<T, SinkError>;

/// Every variant aborts the current iteration with the frontier untouched.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("failed fetching block {block}: {source}")]
    FetchFailed { block: BlockRef, source: SourceError },

    #[error("failed retrieving master block: {0}")]
    MasterFetchFailed(SourceError),

    #[error("persistence failed: {0}")]
    PersistenceFailed(#[from] SinkError),

    #[error("parent references of block {0} form a cycle")]
    CyclicTopology(BlockRef),

    #[error("scanner halted by an earlier fatal error")]
    Halted,
}

impl ScanError {
    /// Classifies a failure to read `block` or its relatives.
    pub fn fetch(block: BlockRef, err: SourceError) -> Self {
        match err {
            SourceError::Unavailable(reason) => Self::SourceUnavailable(reason),
            source => Self::FetchFailed { block, source },
        }
    }

    pub fn master(err: SourceError) -> Self {
        match err {
            SourceError::Unavailable(reason) => Self::SourceUnavailable(reason),
            source => Self::MasterFetchFailed(source),
        }
    }
}

pub type ScanResult<T> = std::result::Result<T, ScanError>;
