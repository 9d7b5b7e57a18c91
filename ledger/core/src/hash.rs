use crate::errors::ParseHashError;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};
use std::{
    fmt::{Debug, Display, Formatter},
    str::{self, FromStr},
};

pub const HASH_SIZE: usize = 32;

/// A 256-bit block hash (representation hash or file hash).
#[derive(PartialEq, Eq, Clone, Copy, Hash, Default, PartialOrd, Ord)]
pub struct BlockHash([u8; HASH_SIZE]);

impl BlockHash {
    pub const ZERO: BlockHash = BlockHash([0; HASH_SIZE]);

    pub const fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ParseHashError> {
        let bytes: [u8; HASH_SIZE] = bytes.try_into().map_err(|_| ParseHashError::InvalidLength(bytes.len()))?;
        Ok(Self(bytes))
    }

    pub const fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// First four bytes in hex, enough to tell blocks apart in logs.
    pub fn short(&self) -> String {
        let mut hex = [0u8; 8];
        match faster_hex::hex_encode(&self.0[..4], &mut hex) {
            Ok(s) => s.to_owned(),
            Err(_) => String::new(),
        }
    }
}

impl From<[u8; HASH_SIZE]> for BlockHash {
    fn from(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for BlockHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for BlockHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut hex = [0u8; HASH_SIZE * 2];
        let s = faster_hex::hex_encode(&self.0, &mut hex).map_err(|_| std::fmt::Error)?;
        f.write_str(s)
    }
}

impl Debug for BlockHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl FromStr for BlockHash {
    type Err = ParseHashError;

    fn from_str(hash_str: &str) -> Result<Self, Self::Err> {
        if hash_str.len() != HASH_SIZE * 2 {
            return Err(ParseHashError::InvalidLength(hash_str.len()));
        }
        let mut bytes = [0u8; HASH_SIZE];
        faster_hex::hex_decode(hash_str.as_bytes(), &mut bytes).map_err(|_| ParseHashError::InvalidHex(hash_str.to_owned()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for BlockHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BlockHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_basics() {
        let hash_str = "8e40af02265360d59f4ecf9ae9ebf8f00a3118408f5a9cdcbcc9c0f93642f3af";
        let hash = BlockHash::from_str(hash_str).unwrap();
        assert_eq!(hash_str, hash.to_string());
        assert_eq!(hash.short(), "8e40af02");

        let other = BlockHash::from_str("8e40af02265360d59f4ecf9ae9ebf8f00a3118408f5a9cdcbcc9c0f93642f3ab").unwrap();
        assert_ne!(hash, other);

        let short_str = "8e40af02265360d59f4ecf9ae9ebf8f00a3118408f5a9cdcbcc9c0f93642f3";
        assert_eq!(BlockHash::from_str(short_str), Err(ParseHashError::InvalidLength(62)));
        let bad_str = "zz40af02265360d59f4ecf9ae9ebf8f00a3118408f5a9cdcbcc9c0f93642f3af";
        assert!(matches!(BlockHash::from_str(bad_str), Err(ParseHashError::InvalidHex(_))));
    }

    #[test]
    fn test_hash_serde_as_hex() {
        let hash = BlockHash::from_bytes([0xab; HASH_SIZE]);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(HASH_SIZE)));
        assert_eq!(serde_json::from_str::<BlockHash>(&json).unwrap(), hash);
        assert_eq!(BlockHash::from_slice(&[1, 2, 3]), Err(ParseHashError::InvalidLength(3)));
    }
}
