//! On-disk frame: `[nonce: 8][padding: 1][ciphertext blocks: 16 * N]`.

use aes_core::BLOCK_LEN;

use crate::error::{CtrError, Result, SizeError};

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 8;

/// Header length: nonce plus the padding byte.
pub const HEADER_LEN: usize = NONCE_LEN + 1;

/// Smallest valid ciphertext: a header and one block.
pub const MIN_CIPHERTEXT_LEN: u64 = (HEADER_LEN + BLOCK_LEN) as u64;

/// Per-file nonce, stored verbatim in the header.
pub type Nonce = [u8; NONCE_LEN];

/// Number of filler bytes needed to complete the final block of a
/// `plaintext_len`-byte input (0 when already aligned).
pub fn padding_len(plaintext_len: u64) -> u8 {
    let block = BLOCK_LEN as u64;
    ((block - plaintext_len % block) % block) as u8
}

/// Checks a ciphertext length and returns the body length after the header.
pub fn validate_ciphertext_len(len: u64) -> Result<u64, SizeError> {
    if len < MIN_CIPHERTEXT_LEN {
        return Err(SizeError::CiphertextTooShort { len });
    }
    let body = len - HEADER_LEN as u64;
    if body % BLOCK_LEN as u64 != 0 {
        return Err(SizeError::Misaligned { body });
    }
    Ok(body)
}

/// File header written once before any ciphertext.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    /// Nonce used for every counter block of the file.
    pub nonce: Nonce,
    /// Filler bytes in the final plaintext block, 0..=15.
    pub padding: u8,
}

impl FrameHeader {
    /// Builds the header for encrypting `plaintext_len` bytes.
    pub fn for_plaintext(nonce: Nonce, plaintext_len: u64) -> Result<Self> {
        if plaintext_len == 0 {
            return Err(SizeError::EmptyPlaintext.into());
        }
        Ok(Self {
            nonce,
            padding: padding_len(plaintext_len),
        })
    }

    /// Serializes the header.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[..NONCE_LEN].copy_from_slice(&self.nonce);
        bytes[NONCE_LEN] = self.padding;
        bytes
    }

    /// Parses a header, rejecting padding lengths above 15.
    pub fn from_bytes(bytes: &[u8; HEADER_LEN]) -> Result<Self> {
        let padding = bytes[NONCE_LEN];
        if usize::from(padding) >= BLOCK_LEN {
            return Err(CtrError::InvalidPadding(padding));
        }
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&bytes[..NONCE_LEN]);
        Ok(Self { nonce, padding })
    }

    /// Plaintext length recovered from a ciphertext body of `body_len` bytes.
    pub fn plaintext_len(&self, body_len: u64) -> u64 {
        body_len - u64::from(self.padding)
    }
}

/// Total framed size for a plaintext of `plaintext_len` bytes.
pub fn ciphertext_len(plaintext_len: u64) -> u64 {
    HEADER_LEN as u64 + plaintext_len + u64::from(padding_len(plaintext_len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_at_block_boundaries() {
        assert_eq!(padding_len(16), 0);
        assert_eq!(padding_len(17), 15);
        assert_eq!(padding_len(20), 12);
        assert_eq!(padding_len(31), 1);
        assert_eq!(padding_len(32), 0);
        assert_eq!(padding_len(1), 15);
    }

    #[test]
    fn framed_sizes() {
        assert_eq!(ciphertext_len(1), 25);
        assert_eq!(ciphertext_len(16), 25);
        assert_eq!(ciphertext_len(17), 41);
    }

    #[test]
    fn ciphertext_length_validation() {
        assert_eq!(
            validate_ciphertext_len(24),
            Err(SizeError::CiphertextTooShort { len: 24 })
        );
        assert_eq!(validate_ciphertext_len(0), Err(SizeError::CiphertextTooShort { len: 0 }));
        assert_eq!(validate_ciphertext_len(25), Ok(16));
        assert_eq!(validate_ciphertext_len(26), Err(SizeError::Misaligned { body: 17 }));
        assert_eq!(validate_ciphertext_len(40), Err(SizeError::Misaligned { body: 31 }));
        assert_eq!(validate_ciphertext_len(41), Ok(32));
    }

    #[test]
    fn header_round_trip() {
        let header = FrameHeader::for_plaintext([1, 2, 3, 4, 5, 6, 7, 8], 20).unwrap();
        assert_eq!(header.padding, 12);
        let bytes = header.to_bytes();
        assert_eq!(bytes, [1, 2, 3, 4, 5, 6, 7, 8, 12]);
        assert_eq!(FrameHeader::from_bytes(&bytes).unwrap(), header);
        assert_eq!(header.plaintext_len(32), 20);
    }

    #[test]
    fn header_rejects_oversized_padding() {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[NONCE_LEN] = 16;
        assert!(matches!(
            FrameHeader::from_bytes(&bytes),
            Err(CtrError::InvalidPadding(16))
        ));
    }

    #[test]
    fn empty_plaintext_has_no_header() {
        assert!(matches!(
            FrameHeader::for_plaintext([0; NONCE_LEN], 0),
            Err(CtrError::Size(SizeError::EmptyPlaintext))
        ));
    }
}
