//! AES-128 block cipher used by the counter-mode file tools.
//!
//! This crate follows FIPS-197 and provides:
//! - Key schedule for AES-128.
//! - Single-block encryption and decryption over a column-major state.
//! - A [`BlockCipher`] capability with runtime selection between the
//!   table-driven path and x86 AES-NI.
//!
//! The table-driven path is not constant-time; it should not be treated as
//! side-channel hardened.

#![deny(unsafe_code)]
#![deny(missing_docs)]

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
mod aesni;
mod block;
mod cipher;
mod dispatch;
mod key;
mod round;
mod tables;

pub use crate::block::{xor_in_place, Block, BLOCK_LEN};
pub use crate::cipher::{decrypt_block, encrypt_block, expand_key};
pub use crate::dispatch::{Aes128, BlockCipher, Capability};
pub use crate::key::{Aes128Key, KeySchedule, ROUND_KEYS};
