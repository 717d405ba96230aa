//! AES round transformations over the column-major [`Block`] layout.

use crate::block::{offset, xor_in_place, Block};
use crate::tables::{GMUL11, GMUL13, GMUL14, GMUL2, GMUL3, GMUL9, INV_SBOX, SBOX};

/// Applies SubBytes to the state in place.
#[inline]
pub fn sub_bytes(state: &mut Block) {
    for byte in state.iter_mut() {
        *byte = SBOX[*byte as usize];
    }
}

/// Applies the inverse SubBytes transformation.
#[inline]
pub fn inv_sub_bytes(state: &mut Block) {
    for byte in state.iter_mut() {
        *byte = INV_SBOX[*byte as usize];
    }
}

/// Gathers the four bytes sharing `row` into a word, column 0 in the top byte.
#[inline]
fn gather_row(state: &Block, row: usize) -> u32 {
    u32::from_be_bytes([
        state[offset(row, 0)],
        state[offset(row, 1)],
        state[offset(row, 2)],
        state[offset(row, 3)],
    ])
}

#[inline]
fn scatter_row(state: &mut Block, row: usize, word: u32) {
    for (col, byte) in word.to_be_bytes().into_iter().enumerate() {
        state[offset(row, col)] = byte;
    }
}

/// Performs ShiftRows in place.
///
/// Row `r` is rotated left by `8 * r` bits as a word; row 0 is untouched.
#[inline]
pub fn shift_rows(state: &mut Block) {
    for row in 1..4 {
        let word = gather_row(state, row).rotate_left(8 * row as u32);
        scatter_row(state, row, word);
    }
}

/// Performs the inverse of ShiftRows in place.
#[inline]
pub fn inv_shift_rows(state: &mut Block) {
    for row in 1..4 {
        let word = gather_row(state, row).rotate_right(8 * row as u32);
        scatter_row(state, row, word);
    }
}

fn mix_single_column(col: &mut [u8]) {
    let [a0, a1, a2, a3] = [col[0], col[1], col[2], col[3]];
    let [i0, i1, i2, i3] = [a0, a1, a2, a3].map(usize::from);
    col[0] = GMUL2[i0] ^ GMUL3[i1] ^ a2 ^ a3;
    col[1] = a0 ^ GMUL2[i1] ^ GMUL3[i2] ^ a3;
    col[2] = a0 ^ a1 ^ GMUL2[i2] ^ GMUL3[i3];
    col[3] = GMUL3[i0] ^ a1 ^ a2 ^ GMUL2[i3];
}

fn inv_mix_single_column(col: &mut [u8]) {
    let [a0, a1, a2, a3] = [col[0], col[1], col[2], col[3]].map(usize::from);
    col[0] = GMUL14[a0] ^ GMUL11[a1] ^ GMUL13[a2] ^ GMUL9[a3];
    col[1] = GMUL9[a0] ^ GMUL14[a1] ^ GMUL11[a2] ^ GMUL13[a3];
    col[2] = GMUL13[a0] ^ GMUL9[a1] ^ GMUL14[a2] ^ GMUL11[a3];
    col[3] = GMUL11[a0] ^ GMUL13[a1] ^ GMUL9[a2] ^ GMUL14[a3];
}

/// MixColumns over all four columns.
///
/// A column is four contiguous bytes in this layout.
#[inline]
pub fn mix_columns(state: &mut Block) {
    for column in state.chunks_exact_mut(4) {
        mix_single_column(column);
    }
}

/// Inverse MixColumns over all four columns.
#[inline]
pub fn inv_mix_columns(state: &mut Block) {
    for column in state.chunks_exact_mut(4) {
        inv_mix_single_column(column);
    }
}

/// Adds (XORs) a round key into the state.
#[inline]
pub fn add_round_key(state: &mut Block, round_key: &Block) {
    xor_in_place(state, round_key);
}
