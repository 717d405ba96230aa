//! Error types for framed counter-mode transfers.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::frame::MIN_CIPHERTEXT_LEN;

/// Length problems detected before or while streaming.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SizeError {
    /// Encrypting zero bytes is refused.
    #[error("cannot encrypt an empty input")]
    EmptyPlaintext,
    /// Smaller than a header plus one block.
    #[error("ciphertext is {len} bytes; at least {} are required", MIN_CIPHERTEXT_LEN)]
    CiphertextTooShort {
        /// Total ciphertext length.
        len: u64,
    },
    /// Body after the header is not a whole number of blocks.
    #[error("ciphertext body of {body} bytes is not a multiple of 16")]
    Misaligned {
        /// Length after the 9-byte header.
        body: u64,
    },
    /// The reader produced a different number of bytes than declared.
    #[error("input length changed while streaming: expected {expected} bytes, saw {seen}")]
    LengthChanged {
        /// Declared length.
        expected: u64,
        /// Bytes actually observed.
        seen: u64,
    },
}

/// Errors returned by encrypt and decrypt operations.
///
/// Every variant aborts the operation; there is no partial success.
#[derive(Debug, Error)]
pub enum CtrError {
    /// Open, read, write or metadata failure.
    #[error("failed to {action} {target}: {source}")]
    Io {
        /// What was being attempted.
        action: &'static str,
        /// Path or stream the action applied to.
        target: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// Input or ciphertext length is unusable.
    #[error(transparent)]
    Size(#[from] SizeError),
    /// The nonce source failed; nothing was encrypted.
    #[error("randomness unavailable for nonce: {0}")]
    RandomnessUnavailable(#[source] rand::Error),
    /// Buffer size is zero or not a multiple of the block size.
    #[error("buffer size {0} must be a non-zero multiple of 16")]
    InvalidBufferSize(usize),
    /// Header padding byte outside 0..=15.
    #[error("header padding length {0} exceeds 15")]
    InvalidPadding(u8),
    /// Input and output resolve to the same file.
    #[error("input and output are the same file: {}", .0.display())]
    SamePath(PathBuf),
}

impl CtrError {
    pub(crate) fn io(action: &'static str, target: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            action,
            target: target.into(),
            source,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = CtrError> = std::result::Result<T, E>;
