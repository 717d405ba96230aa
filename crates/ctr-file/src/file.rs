//! File-level encrypt and decrypt.
//!
//! Inputs are validated before the output file is created. Once created, the
//! output is removed again unless the whole transfer succeeds.

use std::fs::{self, File};
use std::path::Path;

use aes_core::{Aes128, Aes128Key};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use tracing::{debug, info, warn};

use crate::config::TransferConfig;
use crate::error::{CtrError, Result, SizeError};
use crate::frame;
use crate::nonce::generate_nonce;
use crate::stream::{decrypt_body, encrypt_stream, read_header, TransferSummary};

/// Output file that is deleted on drop unless committed.
struct PartialOutput<'a> {
    path: &'a Path,
    committed: bool,
}

impl<'a> PartialOutput<'a> {
    fn create(path: &'a Path) -> Result<(Self, File)> {
        let file =
            File::create(path).map_err(|e| CtrError::io("create", path.display().to_string(), e))?;
        Ok((
            Self {
                path,
                committed: false,
            },
            file,
        ))
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for PartialOutput<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        warn!(path = %self.path.display(), "removing incomplete output");
        if let Err(e) = fs::remove_file(self.path) {
            warn!(path = %self.path.display(), error = %e, "could not remove incomplete output");
        }
    }
}

fn open_input(path: &Path) -> Result<(File, u64)> {
    let file = File::open(path).map_err(|e| CtrError::io("open", path.display().to_string(), e))?;
    let len = file
        .metadata()
        .map_err(|e| CtrError::io("stat", path.display().to_string(), e))?
        .len();
    Ok((file, len))
}

/// Refuses to truncate the input by writing over it.
fn ensure_distinct(input: &Path, output: &Path) -> Result<()> {
    let Ok(output) = output.canonicalize() else {
        // Output does not exist yet.
        return Ok(());
    };
    let input = input
        .canonicalize()
        .map_err(|e| CtrError::io("resolve", input.display().to_string(), e))?;
    if input == output {
        return Err(CtrError::SamePath(output));
    }
    Ok(())
}

/// Encrypts `input` into a framed file at `output` with a nonce from the OS.
pub fn encrypt_file(
    input: &Path,
    output: &Path,
    key: &Aes128Key,
    config: &TransferConfig,
) -> Result<TransferSummary> {
    encrypt_file_with_rng(input, output, key, config, &mut OsRng)
}

/// Encrypts `input` into `output`, drawing the nonce from `rng`.
pub fn encrypt_file_with_rng<R: RngCore + CryptoRng + ?Sized>(
    input: &Path,
    output: &Path,
    key: &Aes128Key,
    config: &TransferConfig,
    rng: &mut R,
) -> Result<TransferSummary> {
    config.validate()?;
    ensure_distinct(input, output)?;
    let (reader, len) = open_input(input)?;
    if len == 0 {
        return Err(SizeError::EmptyPlaintext.into());
    }
    let nonce = generate_nonce(rng)?;
    let cipher = Aes128::new(key);
    info!(
        input = %input.display(),
        bytes = len,
        padding = frame::padding_len(len),
        capability = %cipher.capability(),
        "encrypting file"
    );
    debug!(nonce = %hex::encode(nonce), "generated nonce");

    let (guard, writer) = PartialOutput::create(output)?;
    let summary = encrypt_stream(reader, writer, len, &cipher, nonce, config)?;
    guard.commit();

    info!(output = %output.display(), bytes = summary.bytes_written, "encryption complete");
    Ok(summary)
}

/// Decrypts the framed file at `input` into `output`.
///
/// Counter mode carries no integrity tag: a wrong key produces wrong
/// plaintext rather than an error.
pub fn decrypt_file(
    input: &Path,
    output: &Path,
    key: &Aes128Key,
    config: &TransferConfig,
) -> Result<TransferSummary> {
    config.validate()?;
    ensure_distinct(input, output)?;
    let (mut reader, len) = open_input(input)?;
    let body_len = frame::validate_ciphertext_len(len)?;
    let header = read_header(&mut reader)?;
    let cipher = Aes128::new(key);
    info!(
        input = %input.display(),
        bytes = len,
        padding = header.padding,
        capability = %cipher.capability(),
        "decrypting file"
    );
    debug!(nonce = %hex::encode(header.nonce), "read nonce");

    let (guard, writer) = PartialOutput::create(output)?;
    let summary = decrypt_body(reader, writer, &header, body_len, &cipher, config)?;
    guard.commit();

    info!(output = %output.display(), bytes = summary.bytes_written, "decryption complete");
    Ok(summary)
}
