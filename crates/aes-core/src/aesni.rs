//! Hardware block encryption using the x86 AES-NI instructions.
//!
//! The round keys come from the portable [`expand_key`](crate::expand_key);
//! their byte order is the one `AESENC` expects, so no key conversion is done.

#![allow(unsafe_code)]

#[cfg(target_arch = "x86")]
use core::arch::x86::{
    __m128i, _mm_aesenc_si128, _mm_aesenclast_si128, _mm_loadu_si128, _mm_storeu_si128,
    _mm_xor_si128,
};
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::{
    __m128i, _mm_aesenc_si128, _mm_aesenclast_si128, _mm_loadu_si128, _mm_storeu_si128,
    _mm_xor_si128,
};

use crate::block::Block;
use crate::key::KeySchedule;

/// Returns true when the running CPU exposes AES-NI.
pub(crate) fn supported() -> bool {
    std::is_x86_feature_detected!("aes") && std::is_x86_feature_detected!("sse2")
}

/// Encrypts one block with AES-NI.
///
/// # Safety
///
/// The caller must have confirmed [`supported`] returns true on this CPU.
#[target_feature(enable = "aes,sse2")]
pub(crate) unsafe fn encrypt_block(block: &Block, schedule: &KeySchedule) -> Block {
    let round_keys = schedule.round_keys();
    let mut out = [0u8; 16];
    // SAFETY: unaligned loads/stores on 16-byte arrays; the feature
    // requirement is forwarded to the caller.
    unsafe {
        let mut state = _mm_loadu_si128(block.as_ptr().cast::<__m128i>());
        state = _mm_xor_si128(state, _mm_loadu_si128(round_keys[0].as_ptr().cast()));
        for round_key in &round_keys[1..10] {
            state = _mm_aesenc_si128(state, _mm_loadu_si128(round_key.as_ptr().cast()));
        }
        state = _mm_aesenclast_si128(state, _mm_loadu_si128(round_keys[10].as_ptr().cast()));
        _mm_storeu_si128(out.as_mut_ptr().cast::<__m128i>(), state);
    }
    out
}
