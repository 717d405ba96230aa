//! Block representation helpers.
//!
//! A block is stored column by column: byte `(row, col)` lives at offset
//! `col * 4 + row`. Every round transform in this crate is written against
//! that layout.

/// AES block of 16 bytes.
pub type Block = [u8; 16];

/// Size of a block in bytes.
pub const BLOCK_LEN: usize = 16;

/// Offset of byte `(row, col)` inside a [`Block`].
#[inline]
pub const fn offset(row: usize, col: usize) -> usize {
    col * 4 + row
}

/// XORs `rhs` into `dst` byte by byte.
#[inline]
pub fn xor_in_place(dst: &mut Block, rhs: &Block) {
    for (d, r) in dst.iter_mut().zip(rhs.iter()) {
        *d ^= *r;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_column_major() {
        assert_eq!(offset(0, 0), 0);
        assert_eq!(offset(3, 0), 3);
        assert_eq!(offset(0, 1), 4);
        assert_eq!(offset(1, 3), 13);
    }

    #[test]
    fn xor_is_self_inverse() {
        let original: Block = core::array::from_fn(|i| i as u8);
        let mask = [0x5au8; 16];
        let mut block = original;
        xor_in_place(&mut block, &mask);
        assert_ne!(block, original);
        xor_in_place(&mut block, &mask);
        assert_eq!(block, original);
    }
}
