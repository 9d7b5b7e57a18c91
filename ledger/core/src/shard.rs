use crate::errors::{ShardError, ShardResult};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

pub type WorkchainId = i32;

pub const MASTERCHAIN_ID: WorkchainId = -1;
pub const BASECHAIN_ID: WorkchainId = 0;

/// Prefix of a shard covering its whole workchain: only the tag bit is set.
pub const SHARD_FULL: u64 = 0x8000_0000_0000_0000;

/// Deepest split a shard may go through.
pub const MAX_SPLIT_DEPTH: u8 = 60;

/// Identity of a shard: a workchain and a shard prefix.
///
/// The prefix encodes the path from the full shard down to this one: the bits above
/// the lowest set bit are the path, the lowest set bit is a terminating tag. Splitting
/// a shard extends the path by one bit (`0` for the left child, `1` for the right one).
#[derive(PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShardIdent {
    workchain: WorkchainId,
    prefix: u64,
}

impl ShardIdent {
    pub fn new(workchain: WorkchainId, prefix: u64) -> ShardResult<Self> {
        if prefix == 0 {
            return Err(ShardError::InvalidPrefix(prefix));
        }
        Ok(Self { workchain, prefix })
    }

    pub const fn full(workchain: WorkchainId) -> Self {
        Self { workchain, prefix: SHARD_FULL }
    }

    pub const fn masterchain() -> Self {
        Self::full(MASTERCHAIN_ID)
    }

    pub const fn workchain(&self) -> WorkchainId {
        self.workchain
    }

    pub const fn prefix(&self) -> u64 {
        self.prefix
    }

    pub const fn is_full(&self) -> bool {
        self.prefix == SHARD_FULL
    }

    pub const fn is_masterchain(&self) -> bool {
        self.workchain == MASTERCHAIN_ID
    }

    /// Number of splits separating this shard from the full shard.
    pub const fn prefix_len(&self) -> u8 {
        63 - self.prefix.trailing_zeros() as u8
    }

    const fn tag(&self) -> u64 {
        self.prefix & self.prefix.wrapping_neg()
    }

    pub fn split(&self) -> ShardResult<(ShardIdent, ShardIdent)> {
        if self.prefix_len() >= MAX_SPLIT_DEPTH {
            return Err(ShardError::SplitTooDeep(*self));
        }
        let step = self.tag() >> 1;
        let left = Self { workchain: self.workchain, prefix: self.prefix - step };
        let right = Self { workchain: self.workchain, prefix: self.prefix + step };
        Ok((left, right))
    }

    /// The shard this one was split from.
    pub fn merge(&self) -> ShardResult<ShardIdent> {
        if self.is_full() {
            return Err(ShardError::MergeFull(*self));
        }
        let tag = self.tag();
        Ok(Self { workchain: self.workchain, prefix: (self.prefix - tag) | (tag << 1) })
    }

    pub fn sibling(&self) -> ShardResult<ShardIdent> {
        if self.is_full() {
            return Err(ShardError::MergeFull(*self));
        }
        Ok(Self { workchain: self.workchain, prefix: self.prefix ^ (self.tag() << 1) })
    }

    pub fn is_left_child(&self) -> bool {
        !self.is_full() && self.prefix & (self.tag() << 1) == 0
    }

    /// Whether `other` is this shard or one of its descendants.
    pub fn contains(&self, other: &ShardIdent) -> bool {
        let tag = self.tag();
        let path_mask = !(tag << 1).wrapping_sub(1);
        self.workchain == other.workchain && other.tag() <= tag && (self.prefix ^ other.prefix) & path_mask == 0
    }
}

impl Display for ShardIdent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{:016x}", self.workchain, self.prefix)
    }
}

impl Debug for ShardIdent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_and_merge() {
        let full = ShardIdent::full(BASECHAIN_ID);
        assert!(full.is_full());
        assert_eq!(full.prefix_len(), 0);

        let (left, right) = full.split().unwrap();
        assert_eq!(left.prefix(), 0x4000_0000_0000_0000);
        assert_eq!(right.prefix(), 0xc000_0000_0000_0000);
        assert!(left.is_left_child());
        assert!(!right.is_left_child());
        assert_eq!(left.sibling().unwrap(), right);
        assert_eq!(left.merge().unwrap(), full);
        assert_eq!(right.merge().unwrap(), full);

        let (left_left, left_right) = left.split().unwrap();
        assert_eq!(left_left.prefix(), 0x2000_0000_0000_0000);
        assert_eq!(left_right.prefix(), 0x6000_0000_0000_0000);
        assert_eq!(left_left.prefix_len(), 2);
        assert_eq!(left_right.merge().unwrap(), left);
        assert_eq!(left_right.sibling().unwrap(), left_left);
    }

    #[test]
    fn test_contains() {
        let full = ShardIdent::full(BASECHAIN_ID);
        let (left, right) = full.split().unwrap();
        let (left_left, _) = left.split().unwrap();

        assert!(full.contains(&full));
        assert!(full.contains(&left_left));
        assert!(left.contains(&left_left));
        assert!(!right.contains(&left_left));
        assert!(!left_left.contains(&left));
        assert!(!ShardIdent::masterchain().contains(&left));
    }

    #[test]
    fn test_invalid_operations() {
        assert_eq!(ShardIdent::new(0, 0), Err(ShardError::InvalidPrefix(0)));
        let full = ShardIdent::full(BASECHAIN_ID);
        assert_eq!(full.merge(), Err(ShardError::MergeFull(full)));
        assert!(full.sibling().is_err());

        let mut deep = full;
        for _ in 0..MAX_SPLIT_DEPTH {
            deep = deep.split().unwrap().1;
        }
        assert_eq!(deep.prefix_len(), MAX_SPLIT_DEPTH);
        assert_eq!(deep.split(), Err(ShardError::SplitTooDeep(deep)));
    }

    #[test]
    fn test_display() {
        assert_eq!(ShardIdent::masterchain().to_string(), "-1:8000000000000000");
        let (_, right) = ShardIdent::full(BASECHAIN_ID).split().unwrap();
        assert_eq!(right.to_string(), "0:c000000000000000");
    }
}
