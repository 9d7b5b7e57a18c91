use base64::{Engine, engine::general_purpose::STANDARD};
use shardscan_ledger_core::BlockHash;

pub const DERIVED_VALUE_MODULUS: u32 = 100;

/// Value extracted from a block hash, bounded to `0..DERIVED_VALUE_MODULUS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedValue {
    /// All decimal digits of the base64 hash, in order. May be empty.
    pub digits: String,
    pub value: u8,
}

/// Standard (padded) base64 of the hash bytes.
pub fn encode_hash(hash: &BlockHash) -> String {
    STANDARD.encode(hash.as_bytes())
}

/// Keeps the decimal digits of the base64 encoded hash and reads them as one decimal
/// number modulo 100. The number is folded digit by digit, so any length works.
pub fn derive_value(hash: &BlockHash) -> DerivedValue {
    let digits: String = encode_hash(hash).chars().filter(char::is_ascii_digit).collect();
    let value = digits.bytes().fold(0u32, |acc, digit| (acc * 10 + u32::from(digit - b'0')) % DERIVED_VALUE_MODULUS);
    DerivedValue { digits, value: value as u8 }
}
