//! Chunked transfer of framed CTR streams over `Read`/`Write`.
//!
//! Memory use is bounded by [`TransferConfig::buffer_size`]. Every chunk
//! except the last is filled completely before it is processed, so block
//! boundaries, and hence the output, never depend on the buffer size.

use std::io::{ErrorKind, Read, Write};

use aes_core::{BlockCipher, BLOCK_LEN};
use tracing::{debug, trace};

use crate::codec::CtrCodec;
use crate::config::TransferConfig;
use crate::error::{CtrError, Result, SizeError};
use crate::frame::{self, FrameHeader, Nonce, HEADER_LEN};

/// Byte accounting for one finished transfer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransferSummary {
    /// Bytes consumed from the reader, header included.
    pub bytes_read: u64,
    /// Bytes written, header included.
    pub bytes_written: u64,
    /// Cipher blocks processed.
    pub blocks: u64,
    /// Padding length recorded in (or read from) the header.
    pub padding: u8,
}

/// Reads until `buf` is full or the reader reports end of input.
fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(CtrError::io("read", "input", e)),
        }
    }
    Ok(filled)
}

fn write_chunk<W: Write + ?Sized>(writer: &mut W, chunk: &[u8]) -> Result<()> {
    writer
        .write_all(chunk)
        .map_err(|e| CtrError::io("write", "output", e))
}

/// Fails if the reader still has data after `expected` bytes were consumed.
fn ensure_exhausted<R: Read + ?Sized>(reader: &mut R, expected: u64) -> Result<()> {
    let mut probe = [0u8; 1];
    let extra = read_full(reader, &mut probe)?;
    if extra != 0 {
        return Err(SizeError::LengthChanged {
            expected,
            seen: expected + extra as u64,
        }
        .into());
    }
    Ok(())
}

/// Encrypts exactly `plaintext_len` bytes from `reader` into a framed
/// stream on `writer`, using `nonce` for every counter block.
///
/// The nonce must never be reused under the same key.
pub fn encrypt_stream<R, W, C>(
    mut reader: R,
    mut writer: W,
    plaintext_len: u64,
    cipher: C,
    nonce: Nonce,
    config: &TransferConfig,
) -> Result<TransferSummary>
where
    R: Read,
    W: Write,
    C: BlockCipher,
{
    config.validate()?;
    let header = FrameHeader::for_plaintext(nonce, plaintext_len)?;
    write_chunk(&mut writer, &header.to_bytes())?;

    let mut summary = TransferSummary {
        bytes_written: HEADER_LEN as u64,
        padding: header.padding,
        ..TransferSummary::default()
    };
    let mut codec = CtrCodec::new(cipher, nonce);
    let mut buf = vec![0u8; config.buffer_size];
    let mut remaining = plaintext_len;

    while remaining > 0 {
        let want = remaining.min(buf.len() as u64) as usize;
        let filled = read_full(&mut reader, &mut buf[..want])?;
        summary.bytes_read += filled as u64;
        if filled < want {
            return Err(SizeError::LengthChanged {
                expected: plaintext_len,
                seen: summary.bytes_read,
            }
            .into());
        }
        remaining -= filled as u64;

        let whole = filled - filled % BLOCK_LEN;
        let mut blocks = codec.apply_blocks(&mut buf[..whole]);
        let mut out_len = whole;
        if whole < filled {
            // Only the last chunk can end mid-block; the buffer is block aligned.
            let last = codec.apply_final(&buf[whole..filled]);
            buf[whole..whole + BLOCK_LEN].copy_from_slice(&last);
            out_len += BLOCK_LEN;
            blocks += 1;
        }
        write_chunk(&mut writer, &buf[..out_len])?;

        summary.blocks += blocks as u64;
        summary.bytes_written += out_len as u64;
        trace!(
            read = filled,
            written = out_len,
            next_counter = codec.next_counter(),
            "encrypted chunk"
        );
    }

    ensure_exhausted(&mut reader, plaintext_len)?;
    writer
        .flush()
        .map_err(|e| CtrError::io("flush", "output", e))?;
    debug!(
        blocks = summary.blocks,
        padding = summary.padding,
        "encryption stream complete"
    );
    Ok(summary)
}

/// Reads and validates the 9-byte frame header.
pub fn read_header<R: Read + ?Sized>(reader: &mut R) -> Result<FrameHeader> {
    let mut bytes = [0u8; HEADER_LEN];
    let filled = read_full(reader, &mut bytes)?;
    if filled < HEADER_LEN {
        return Err(SizeError::CiphertextTooShort {
            len: filled as u64,
        }
        .into());
    }
    FrameHeader::from_bytes(&bytes)
}

/// Decrypts `body_len` bytes of ciphertext blocks that follow an already
/// parsed `header`, dropping the padding from the final block.
pub fn decrypt_body<R, W, C>(
    mut reader: R,
    mut writer: W,
    header: &FrameHeader,
    body_len: u64,
    cipher: C,
    config: &TransferConfig,
) -> Result<TransferSummary>
where
    R: Read,
    W: Write,
    C: BlockCipher,
{
    config.validate()?;
    if body_len == 0 || body_len % BLOCK_LEN as u64 != 0 {
        return Err(SizeError::Misaligned { body: body_len }.into());
    }

    let mut summary = TransferSummary {
        bytes_read: HEADER_LEN as u64,
        padding: header.padding,
        ..TransferSummary::default()
    };
    let mut codec = CtrCodec::new(cipher, header.nonce);
    let mut buf = vec![0u8; config.buffer_size];
    let mut remaining = body_len;

    while remaining > 0 {
        let want = remaining.min(buf.len() as u64) as usize;
        let filled = read_full(&mut reader, &mut buf[..want])?;
        summary.bytes_read += filled as u64;
        if filled < want {
            return Err(SizeError::LengthChanged {
                expected: HEADER_LEN as u64 + body_len,
                seen: summary.bytes_read,
            }
            .into());
        }
        remaining -= filled as u64;

        summary.blocks += codec.apply_blocks(&mut buf[..filled]) as u64;
        // Padding lives in the stream's last block, which ends the last chunk.
        let out_len = if remaining == 0 {
            filled - usize::from(header.padding)
        } else {
            filled
        };
        write_chunk(&mut writer, &buf[..out_len])?;
        summary.bytes_written += out_len as u64;
        trace!(
            read = filled,
            written = out_len,
            next_counter = codec.next_counter(),
            "decrypted chunk"
        );
    }

    ensure_exhausted(&mut reader, HEADER_LEN as u64 + body_len)?;
    writer
        .flush()
        .map_err(|e| CtrError::io("flush", "output", e))?;
    debug!(
        blocks = summary.blocks,
        padding = summary.padding,
        "decryption stream complete"
    );
    Ok(summary)
}

/// Decrypts a complete framed stream of `ciphertext_len` bytes.
///
/// The length and header are validated before anything is written.
pub fn decrypt_stream<R, W, C>(
    mut reader: R,
    writer: W,
    ciphertext_len: u64,
    cipher: C,
    config: &TransferConfig,
) -> Result<TransferSummary>
where
    R: Read,
    W: Write,
    C: BlockCipher,
{
    config.validate()?;
    let body_len = frame::validate_ciphertext_len(ciphertext_len)?;
    let header = read_header(&mut reader)?;
    decrypt_body(reader, writer, &header, body_len, cipher, config)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use aes_core::{Aes128, Aes128Key};
    use proptest::prelude::*;
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    use super::*;
    use crate::frame::{ciphertext_len, NONCE_LEN};

    const NONCE: Nonce = [0x42; NONCE_LEN];
    const BUFFER_SIZES: [usize; 4] = [16, 32, 48, 4096];

    fn cipher() -> Aes128 {
        Aes128::new(&Aes128Key::from([
            0x2b, 0x7e, 0x15, 0x16, 0x28, 0xae, 0xd2, 0xa6, 0xab, 0xf7, 0x15, 0x88, 0x09, 0xcf,
            0x4f, 0x3c,
        ]))
    }

    fn random_bytes(len: usize, seed: u8) -> Vec<u8> {
        let mut data = vec![0u8; len];
        ChaCha20Rng::from_seed([seed; 32]).fill_bytes(&mut data);
        data
    }

    fn encrypt(plain: &[u8], buffer_size: usize) -> Vec<u8> {
        let mut out = Vec::new();
        encrypt_stream(
            plain,
            &mut out,
            plain.len() as u64,
            cipher(),
            NONCE,
            &TransferConfig::with_buffer_size(buffer_size),
        )
        .unwrap();
        out
    }

    fn decrypt(framed: &[u8], buffer_size: usize) -> Vec<u8> {
        let mut out = Vec::new();
        decrypt_stream(
            framed,
            &mut out,
            framed.len() as u64,
            cipher(),
            &TransferConfig::with_buffer_size(buffer_size),
        )
        .unwrap();
        out
    }

    #[test]
    fn round_trip_across_buffer_edges() {
        // Shorter than a buffer, exact multiples, 1..=15 past a multiple, many buffers.
        let lengths = [
            1, 5, 15, 16, 17, 31, 32, 33, 47, 48, 49, 63, 64, 65, 100, 4096, 4097, 4111, 12_345,
        ];
        for &len in &lengths {
            let plain = random_bytes(len, len as u8);
            for &size in &BUFFER_SIZES {
                let framed = encrypt(&plain, size);
                assert_eq!(framed.len() as u64, ciphertext_len(len as u64));
                assert_eq!(decrypt(&framed, size), plain, "len {len} buffer {size}");
            }
        }
    }

    #[test]
    fn ciphertext_is_independent_of_buffer_size() {
        let plain = random_bytes(5000, 9);
        let reference = encrypt(&plain, 16);
        for size in [32, 4096, 65536] {
            assert_eq!(encrypt(&plain, size), reference, "buffer {size}");
        }
        // Decrypting with a different buffer size than encrypting still works.
        assert_eq!(decrypt(&reference, 4096), plain);
    }

    #[test]
    fn padding_byte_at_block_boundaries() {
        for (len, padding) in [(16usize, 0u8), (17, 15), (31, 1), (32, 0)] {
            let plain = random_bytes(len, 3);
            let framed = encrypt(&plain, 32);
            assert_eq!(&framed[..NONCE_LEN], &NONCE);
            assert_eq!(framed[NONCE_LEN], padding, "len {len}");
            let recovered = decrypt(&framed, 32);
            assert_eq!(recovered.len(), len);
            assert_eq!(recovered, plain);
        }
    }

    #[test]
    fn summary_counts_bytes_and_blocks() {
        let plain = random_bytes(40, 1);
        let mut out = Vec::new();
        let summary = encrypt_stream(
            &plain[..],
            &mut out,
            40,
            cipher(),
            NONCE,
            &TransferConfig::with_buffer_size(16),
        )
        .unwrap();
        assert_eq!(
            summary,
            TransferSummary {
                bytes_read: 40,
                bytes_written: 9 + 48,
                blocks: 3,
                padding: 8,
            }
        );
        let mut plain_out = Vec::new();
        let summary = decrypt_stream(
            &out[..],
            &mut plain_out,
            out.len() as u64,
            cipher(),
            &TransferConfig::default(),
        )
        .unwrap();
        assert_eq!(summary.bytes_read, 57);
        assert_eq!(summary.bytes_written, 40);
        assert_eq!(summary.blocks, 3);
    }

    #[test]
    fn rejects_short_and_misaligned_ciphertext_without_output() {
        for framed in [vec![0u8; 24], vec![0u8; 26], vec![0u8; 40]] {
            let mut out = Vec::new();
            let err = decrypt_stream(
                &framed[..],
                &mut out,
                framed.len() as u64,
                cipher(),
                &TransferConfig::default(),
            )
            .unwrap_err();
            assert!(matches!(err, CtrError::Size(_)), "{err}");
            assert!(out.is_empty());
        }
    }

    #[test]
    fn rejects_bad_padding_without_output() {
        let mut framed = encrypt(b"sixteen bytes!!!", 16);
        framed[NONCE_LEN] = 16;
        let mut out = Vec::new();
        let err = decrypt_stream(
            &framed[..],
            &mut out,
            framed.len() as u64,
            cipher(),
            &TransferConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CtrError::InvalidPadding(16)));
        assert!(out.is_empty());
    }

    #[test]
    fn empty_plaintext_is_refused() {
        let mut out = Vec::new();
        let err = encrypt_stream(
            &b""[..],
            &mut out,
            0,
            cipher(),
            NONCE,
            &TransferConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CtrError::Size(SizeError::EmptyPlaintext)));
        assert!(out.is_empty());
    }

    #[test]
    fn detects_reader_shorter_than_declared() {
        let plain = random_bytes(20, 4);
        let err = encrypt_stream(
            &plain[..],
            Vec::new(),
            64,
            cipher(),
            NONCE,
            &TransferConfig::with_buffer_size(32),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CtrError::Size(SizeError::LengthChanged {
                expected: 64,
                seen: 20
            })
        ));
    }

    #[test]
    fn detects_reader_longer_than_declared() {
        let plain = random_bytes(40, 4);
        let err = encrypt_stream(
            &plain[..],
            Vec::new(),
            32,
            cipher(),
            NONCE,
            &TransferConfig::with_buffer_size(16),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CtrError::Size(SizeError::LengthChanged {
                expected: 32,
                seen: 33
            })
        ));
    }

    #[test]
    fn invalid_buffer_size_is_refused() {
        let err = encrypt_stream(
            &b"data"[..],
            Vec::new(),
            4,
            cipher(),
            NONCE,
            &TransferConfig::with_buffer_size(24),
        )
        .unwrap_err();
        assert!(matches!(err, CtrError::InvalidBufferSize(24)));
    }

    #[test]
    fn wrong_key_decrypts_to_garbage() {
        let plain = random_bytes(64, 8);
        let framed = encrypt(&plain, 16);
        let mut out = Vec::new();
        decrypt_stream(
            Cursor::new(&framed),
            &mut out,
            framed.len() as u64,
            Aes128::portable(&Aes128Key::from([0u8; 16])),
            &TransferConfig::default(),
        )
        .unwrap();
        assert_eq!(out.len(), plain.len());
        assert_ne!(out, plain);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_round_trip(
            plain in proptest::collection::vec(any::<u8>(), 1..600),
            enc_blocks in 1usize..8,
            dec_blocks in 1usize..8,
        ) {
            let framed = encrypt(&plain, enc_blocks * BLOCK_LEN);
            prop_assert_eq!(&framed, &encrypt(&plain, 4096));
            prop_assert_eq!(decrypt(&framed, dec_blocks * BLOCK_LEN), plain);
        }
    }
}
