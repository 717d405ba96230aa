//! Transfer configuration.

use aes_core::BLOCK_LEN;

use crate::error::{CtrError, Result};

/// Default chunk buffer: 64 KiB.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Tunables for chunked transfers.
///
/// The buffer size only affects performance; output is identical for every
/// valid value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferConfig {
    /// Bytes read per chunk; a non-zero multiple of 16.
    pub buffer_size: usize,
}

impl TransferConfig {
    /// Creates a configuration with the given buffer size.
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self { buffer_size }
    }

    /// Checks the buffer size.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 || self.buffer_size % BLOCK_LEN != 0 {
            return Err(CtrError::InvalidBufferSize(self.buffer_size));
        }
        Ok(())
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(TransferConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_unaligned_and_zero() {
        for size in [0, 1, 15, 17, 4095] {
            let err = TransferConfig::with_buffer_size(size).validate().unwrap_err();
            assert!(matches!(err, CtrError::InvalidBufferSize(s) if s == size));
        }
        assert!(TransferConfig::with_buffer_size(16).validate().is_ok());
    }
}
