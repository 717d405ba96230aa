//! Key types for AES-128.

use crate::block::Block;

/// Number of round keys produced for AES-128.
pub const ROUND_KEYS: usize = 11;

/// AES-128 key wrapper.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Aes128Key(pub [u8; 16]);

impl From<[u8; 16]> for Aes128Key {
    fn from(value: [u8; 16]) -> Self {
        Self(value)
    }
}

impl core::fmt::Debug for Aes128Key {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Aes128Key(..)")
    }
}

/// Expanded key schedule: round keys 0 through 10, 176 bytes in total.
///
/// Produced once by [`expand_key`](crate::expand_key) and never mutated.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct KeySchedule(pub(crate) [Block; ROUND_KEYS]);

impl KeySchedule {
    /// Returns the round key at the requested index (0..=10).
    #[inline]
    pub fn get(&self, round: usize) -> &Block {
        &self.0[round]
    }

    /// Returns all round keys in order.
    #[inline]
    pub fn round_keys(&self) -> &[Block; ROUND_KEYS] {
        &self.0
    }
}

impl core::fmt::Debug for KeySchedule {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("KeySchedule(..)")
    }
}
