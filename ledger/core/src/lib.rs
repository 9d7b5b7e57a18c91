pub mod api;
pub mod block;
pub mod errors;
pub mod hash;
pub mod shard;

pub use block::{BlockContent, BlockRef, SeqNo};
pub use hash::BlockHash;
pub use shard::{ShardIdent, WorkchainId};
