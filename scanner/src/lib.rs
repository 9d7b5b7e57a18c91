//! Incremental discovery of newly finalized shard blocks.
//!
//! Every master block references the current top block of each shard. Starting from
//! those, [`closure::ShardClosureWalker`] follows parent links until it reaches blocks
//! the [`frontier::Frontier`] already accounts for, and [`processor::Scanner`] turns the
//! discovered blocks into [`record::PersistedRecord`]s before advancing the frontier.

pub mod closure;
pub mod config;
pub mod counters;
pub mod derive;
pub mod errors;
pub mod frontier;
pub mod processor;
pub mod record;
pub mod sink;
pub mod timer;

#[cfg(any(test, feature = "testutils"))]
pub mod testutils;

pub use closure::{DiscoveredBlock, ShardClosureWalker, discover_closure};
pub use config::ScanConfig;
pub use counters::{ScanCounters, ScanCountersSnapshot};
pub use errors::{ScanError, ScanResult, SinkError, SinkResult};
pub use frontier::Frontier;
pub use processor::{IterationSummary, ScanReport, ScanState, Scanner};
pub use record::PersistedRecord;
pub use sink::{JsonLinesSink, MemorySink, RecordSink};

const IDENT: &str = "Scanner";
