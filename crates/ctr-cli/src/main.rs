//! Command-line interface for AES-128 counter-mode file encryption.

#![forbid(unsafe_code)]

use std::path::PathBuf;

use aes_core::{Aes128, Aes128Key, BlockCipher, Capability};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ctr_file::{decrypt_file, decrypt_stream, encrypt_file, encrypt_stream, TransferConfig};
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing_subscriber::EnvFilter;

/// AES-128 CTR file encryption CLI.
#[derive(Parser)]
#[command(
    name = "aesctr",
    version,
    author,
    about = "AES-128 counter-mode file encryption"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file into the framed CTR format.
    Enc {
        /// AES-128 key as 32 hex characters.
        #[arg(long, value_name = "HEX", env = "AESCTR_KEY", hide_env_values = true)]
        key_hex: String,
        /// Plaintext input file.
        #[arg(long, value_name = "FILE")]
        input: PathBuf,
        /// Framed ciphertext output path.
        #[arg(long, value_name = "FILE")]
        output: PathBuf,
        /// Chunk buffer size in bytes (multiple of 16).
        #[arg(long, default_value_t = ctr_file::DEFAULT_BUFFER_SIZE)]
        buffer_size: usize,
    },
    /// Decrypt a framed CTR file.
    Dec {
        /// AES-128 key as 32 hex characters.
        #[arg(long, value_name = "HEX", env = "AESCTR_KEY", hide_env_values = true)]
        key_hex: String,
        /// Framed ciphertext input file.
        #[arg(long, value_name = "FILE")]
        input: PathBuf,
        /// Plaintext output path.
        #[arg(long, value_name = "FILE")]
        output: PathBuf,
        /// Chunk buffer size in bytes (multiple of 16).
        #[arg(long, default_value_t = ctr_file::DEFAULT_BUFFER_SIZE)]
        buffer_size: usize,
    },
    /// Verify the block cipher against FIPS-197 and compare dispatch paths.
    Check {
        /// Number of random blocks compared between the two paths.
        #[arg(long, default_value_t = 64)]
        samples: usize,
        /// Optional RNG seed for reproducibility.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Run a local demo: random key and data, encrypt in memory, decrypt back.
    Demo {
        /// Plaintext length in bytes.
        #[arg(long, default_value_t = 100)]
        len: usize,
        /// Optional RNG seed for reproducibility.
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(capability = %Capability::detect(), "probed block cipher capability");

    let cli = Cli::parse();
    match cli.command {
        Commands::Enc {
            key_hex,
            input,
            output,
            buffer_size,
        } => cmd_enc(&key_hex, &input, &output, buffer_size),
        Commands::Dec {
            key_hex,
            input,
            output,
            buffer_size,
        } => cmd_dec(&key_hex, &input, &output, buffer_size),
        Commands::Check { samples, seed } => cmd_check(samples, seed),
        Commands::Demo { len, seed } => cmd_demo(len, seed),
    }
}

fn cmd_enc(key_hex: &str, input: &PathBuf, output: &PathBuf, buffer_size: usize) -> Result<()> {
    let key = parse_key_hex(key_hex)?;
    let config = TransferConfig::with_buffer_size(buffer_size);
    let summary = encrypt_file(input, output, &key, &config)
        .with_context(|| format!("encrypt {}", input.display()))?;
    println!(
        "encrypted {} bytes into {} ({} blocks, padding {})",
        summary.bytes_read,
        output.display(),
        summary.blocks,
        summary.padding
    );
    Ok(())
}

fn cmd_dec(key_hex: &str, input: &PathBuf, output: &PathBuf, buffer_size: usize) -> Result<()> {
    let key = parse_key_hex(key_hex)?;
    let config = TransferConfig::with_buffer_size(buffer_size);
    let summary = decrypt_file(input, output, &key, &config)
        .with_context(|| format!("decrypt {}", input.display()))?;
    println!(
        "decrypted {} bytes into {}",
        summary.bytes_written,
        output.display()
    );
    Ok(())
}

fn cmd_check(samples: usize, seed: Option<u64>) -> Result<()> {
    const NIST_KEY: &str = "000102030405060708090a0b0c0d0e0f";
    const NIST_PLAIN: &str = "00112233445566778899aabbccddeeff";
    const NIST_CIPHER: &str = "69c4e0d86a7b0430d8cdb78070b4c55a";

    let key = parse_key_hex(NIST_KEY)?;
    let plain = parse_block_hex(NIST_PLAIN)?;
    let detected = Aes128::new(&key);
    let portable = Aes128::portable(&key);
    for cipher in [&detected, &portable] {
        let ct = hex::encode(cipher.encrypt_block(&plain));
        if ct != NIST_CIPHER {
            bail!("{} path failed the FIPS-197 vector: {ct}", cipher.capability());
        }
        if cipher.decrypt_block(&parse_block_hex(NIST_CIPHER)?) != plain {
            bail!("inverse cipher failed the FIPS-197 vector");
        }
    }

    let mut rng = seeded_rng(seed);
    for _ in 0..samples {
        let mut key_bytes = [0u8; 16];
        let mut block = [0u8; 16];
        rng.fill_bytes(&mut key_bytes);
        rng.fill_bytes(&mut block);
        let key = Aes128Key::from(key_bytes);
        if Aes128::new(&key).encrypt_block(&block) != Aes128::portable(&key).encrypt_block(&block)
        {
            bail!("mismatch between {} and portable outputs", Capability::detect());
        }
    }
    println!(
        "ok: selected {} path, {samples} random blocks agree",
        detected.capability()
    );
    Ok(())
}

fn cmd_demo(len: usize, seed: Option<u64>) -> Result<()> {
    if len == 0 {
        bail!("demo length must be at least one byte");
    }
    let mut rng = seeded_rng(seed);
    let mut key_bytes = [0u8; 16];
    rng.fill_bytes(&mut key_bytes);
    let cipher = Aes128::new(&Aes128Key::from(key_bytes));

    let mut plaintext = vec![0u8; len];
    rng.fill_bytes(&mut plaintext);
    let nonce = ctr_file::generate_nonce(&mut rng)?;
    let config = TransferConfig::default();

    let mut framed = Vec::new();
    encrypt_stream(&plaintext[..], &mut framed, len as u64, &cipher, nonce, &config)?;
    let mut decrypted = Vec::new();
    decrypt_stream(&framed[..], &mut decrypted, framed.len() as u64, &cipher, &config)?;

    println!("demo key: {}", hex::encode(key_bytes));
    println!("plaintext: {}", hex::encode(&plaintext));
    println!("framed: {}", hex::encode(&framed));
    println!("decrypted: {}", hex::encode(&decrypted));
    if decrypted != plaintext {
        bail!("demo roundtrip failed");
    }
    Ok(())
}

fn parse_key_hex(hex_str: &str) -> Result<Aes128Key> {
    let bytes = hex::decode(hex_str.trim()).context("decode key hex")?;
    if bytes.len() != 16 {
        bail!("AES-128 key must be 16 bytes (32 hex characters)");
    }
    let mut key = [0u8; 16];
    key.copy_from_slice(&bytes);
    Ok(Aes128Key::from(key))
}

fn parse_block_hex(hex_str: &str) -> Result<[u8; 16]> {
    let mut block = [0u8; 16];
    hex::decode_to_slice(hex_str, &mut block).context("decode block hex")?;
    Ok(block)
}

fn seeded_rng(seed: Option<u64>) -> impl RngCore + CryptoRng {
    match seed {
        Some(value) => {
            let mut seed_bytes = [0u8; 32];
            seed_bytes[..8].copy_from_slice(&value.to_le_bytes());
            ChaCha20Rng::from_seed(seed_bytes)
        }
        None => {
            let mut seed_bytes = [0u8; 32];
            rand::rngs::OsRng.fill_bytes(&mut seed_bytes);
            ChaCha20Rng::from_seed(seed_bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn key_hex_parsing() {
        let key = parse_key_hex(" 2d7e86a339d9393ee6570a1101904e16\n").unwrap();
        assert_eq!(key.0[0], 0x2d);
        assert_eq!(key.0[15], 0x16);
        assert!(parse_key_hex("00").is_err());
        assert!(parse_key_hex("zz7e86a339d9393ee6570a1101904e16").is_err());
    }

    #[test]
    fn check_and_demo_succeed() {
        cmd_check(16, Some(1)).unwrap();
        cmd_demo(33, Some(2)).unwrap();
    }
}
