//! Counter-mode keystream generation.
//!
//! Block `i` of a file (1-based) is combined with
//! `encrypt(nonce || i as u64 little-endian)`. Encryption and decryption are
//! the same XOR, so only the forward cipher is ever used.

use aes_core::{xor_in_place, Block, BlockCipher, BLOCK_LEN};

use crate::frame::{Nonce, NONCE_LEN};

/// Filler written into the unused tail of the final plaintext block.
pub const PADDING_BYTE: u8 = b'A';

/// Nonce and counter fed through the cipher to produce one keystream block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CounterBlock {
    /// Fixed for the whole file.
    pub nonce: Nonce,
    /// Index of the block in the file, starting at [`CounterBlock::FIRST`].
    pub counter: u64,
}

impl CounterBlock {
    /// Counter value of the first block.
    pub const FIRST: u64 = 1;

    /// Lays the counter block out as cipher input.
    pub fn to_block(&self) -> Block {
        let mut block = [0u8; BLOCK_LEN];
        block[..NONCE_LEN].copy_from_slice(&self.nonce);
        block[NONCE_LEN..].copy_from_slice(&self.counter.to_le_bytes());
        block
    }

    /// Splits a cipher input back into nonce and counter.
    pub fn from_block(block: &Block) -> Self {
        let mut nonce = [0u8; NONCE_LEN];
        let mut counter = [0u8; 8];
        nonce.copy_from_slice(&block[..NONCE_LEN]);
        counter.copy_from_slice(&block[NONCE_LEN..]);
        Self {
            nonce,
            counter: u64::from_le_bytes(counter),
        }
    }
}

/// Stateful CTR transform over a single file.
///
/// Blocks must be fed in file order; each one consumes exactly one counter.
pub struct CtrCodec<C> {
    cipher: C,
    next: CounterBlock,
}

impl<C: BlockCipher> CtrCodec<C> {
    /// Starts a stream at counter 1.
    pub fn new(cipher: C, nonce: Nonce) -> Self {
        Self {
            cipher,
            next: CounterBlock {
                nonce,
                counter: CounterBlock::FIRST,
            },
        }
    }

    /// Counter that the next block will use.
    pub fn next_counter(&self) -> u64 {
        self.next.counter
    }

    /// Nonce of this stream.
    pub fn nonce(&self) -> &Nonce {
        &self.next.nonce
    }

    /// Produces the next keystream block and advances the counter.
    pub fn keystream_block(&mut self) -> Block {
        let keystream = self.cipher.encrypt_block(&self.next.to_block());
        // Wrapping past 2^64 blocks is not reachable for real files.
        self.next.counter = self.next.counter.wrapping_add(1);
        keystream
    }

    /// Transforms one block in place.
    pub fn apply_block(&mut self, block: &mut Block) {
        let keystream = self.keystream_block();
        xor_in_place(block, &keystream);
    }

    /// Transforms every whole block of `data` in place and returns how many
    /// blocks were processed. Trailing bytes past the last whole block are
    /// left untouched.
    pub fn apply_blocks(&mut self, data: &mut [u8]) -> usize {
        debug_assert_eq!(data.len() % BLOCK_LEN, 0, "caller passes whole blocks");
        let mut blocks = 0;
        for chunk in data.chunks_exact_mut(BLOCK_LEN) {
            let keystream = self.keystream_block();
            for (byte, key) in chunk.iter_mut().zip(keystream) {
                *byte ^= key;
            }
            blocks += 1;
        }
        blocks
    }

    /// Pads a final partial block of 1..=15 bytes with [`PADDING_BYTE`] and
    /// transforms it.
    pub fn apply_final(&mut self, tail: &[u8]) -> Block {
        debug_assert!(!tail.is_empty() && tail.len() < BLOCK_LEN);
        let mut block = [PADDING_BYTE; BLOCK_LEN];
        block[..tail.len()].copy_from_slice(tail);
        self.apply_block(&mut block);
        block
    }
}
