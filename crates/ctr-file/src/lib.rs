//! Counter-mode (CTR) file encryption on top of `aes-core`.
//!
//! Files are framed as `[nonce: 8][padding: 1][ciphertext: 16 * N]`. The
//! keystream for block `i` is the AES encryption of the nonce followed by
//! `i` as a little-endian `u64`, starting at 1. Encrypt and decrypt both use
//! the forward cipher.
//!
//! There is no integrity tag. Decrypting with the wrong key succeeds and
//! yields garbage.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod codec;
mod config;
mod error;
mod file;
mod frame;
mod nonce;
mod stream;

pub use crate::codec::{CounterBlock, CtrCodec, PADDING_BYTE};
pub use crate::config::{TransferConfig, DEFAULT_BUFFER_SIZE};
pub use crate::error::{CtrError, Result, SizeError};
pub use crate::file::{decrypt_file, encrypt_file, encrypt_file_with_rng};
pub use crate::frame::{
    ciphertext_len, padding_len, validate_ciphertext_len, FrameHeader, Nonce, HEADER_LEN,
    MIN_CIPHERTEXT_LEN, NONCE_LEN,
};
pub use crate::nonce::generate_nonce;
pub use crate::stream::{decrypt_body, decrypt_stream, encrypt_stream, read_header, TransferSummary};
