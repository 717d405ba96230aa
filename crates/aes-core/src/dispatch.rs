//! Runtime selection between the portable and hardware block encryptors.
//!
//! The CPU is probed once per process. Callers hold an [`Aes128`] and only
//! ever see the [`BlockCipher`] contract, whichever path was chosen.

use std::sync::OnceLock;

use crate::block::Block;
use crate::cipher::{decrypt_block, encrypt_block, expand_key};
use crate::key::{Aes128Key, KeySchedule};

/// Forward block encryption, the only primitive counter mode needs.
pub trait BlockCipher {
    /// Encrypts one block.
    fn encrypt_block(&self, block: &Block) -> Block;
}

impl<T: BlockCipher + ?Sized> BlockCipher for &T {
    #[inline]
    fn encrypt_block(&self, block: &Block) -> Block {
        (**self).encrypt_block(block)
    }
}

/// Block encryption implementation available on this host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Table-driven software implementation.
    Portable,
    /// x86 AES-NI instructions.
    AesNi,
}

impl Capability {
    /// Returns the best capability of the running CPU, probing on first use.
    ///
    /// Any platform where the probe is unavailable reports [`Capability::Portable`].
    pub fn detect() -> Self {
        static DETECTED: OnceLock<Capability> = OnceLock::new();
        *DETECTED.get_or_init(probe)
    }

    /// Short lowercase name for logs.
    pub fn name(self) -> &'static str {
        match self {
            Capability::Portable => "portable",
            Capability::AesNi => "aes-ni",
        }
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn probe() -> Capability {
    if crate::aesni::supported() {
        Capability::AesNi
    } else {
        Capability::Portable
    }
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
fn probe() -> Capability {
    Capability::Portable
}

/// AES-128 with an expanded key schedule and a fixed encryption path.
#[derive(Clone, Debug)]
pub struct Aes128 {
    schedule: KeySchedule,
    capability: Capability,
}

impl Aes128 {
    /// Expands `key` and uses the best capability the CPU offers.
    pub fn new(key: &Aes128Key) -> Self {
        Self::with_capability(key, Capability::detect())
    }

    /// Expands `key` and always uses the table-driven path.
    pub fn portable(key: &Aes128Key) -> Self {
        Self::with_capability(key, Capability::Portable)
    }

    /// Expands `key` and uses `requested`, falling back to the portable path
    /// when the CPU lacks it.
    pub fn with_capability(key: &Aes128Key, requested: Capability) -> Self {
        let capability = match requested {
            Capability::AesNi if Capability::detect() != Capability::AesNi => Capability::Portable,
            other => other,
        };
        Self {
            schedule: expand_key(key),
            capability,
        }
    }

    /// The encryption path this instance runs.
    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// The expanded key schedule.
    pub fn schedule(&self) -> &KeySchedule {
        &self.schedule
    }

    /// Inverts a block encryption with the portable inverse cipher.
    pub fn decrypt_block(&self, block: &Block) -> Block {
        decrypt_block(block, &self.schedule)
    }
}

impl BlockCipher for Aes128 {
    #[inline]
    fn encrypt_block(&self, block: &Block) -> Block {
        match self.capability {
            Capability::Portable => encrypt_block(block, &self.schedule),
            Capability::AesNi => encrypt_hardware(block, &self.schedule),
        }
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[allow(unsafe_code)]
#[inline]
fn encrypt_hardware(block: &Block, schedule: &KeySchedule) -> Block {
    // SAFETY: `Aes128::with_capability` only keeps AesNi when the probe saw it.
    unsafe { crate::aesni::encrypt_block(block, schedule) }
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
#[inline]
fn encrypt_hardware(block: &Block, schedule: &KeySchedule) -> Block {
    encrypt_block(block, schedule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    const NIST_KEY: [u8; 16] = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
        0x0f,
    ];
    const NIST_PLAIN: [u8; 16] = [
        0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee,
        0xff,
    ];
    const NIST_CIPHER: [u8; 16] = [
        0x69, 0xc4, 0xe0, 0xd8, 0x6a, 0x7b, 0x04, 0x30, 0xd8, 0xcd, 0xb7, 0x80, 0x70, 0xb4, 0xc5,
        0x5a,
    ];

    // SP 800-38A F.5.1, first counter block.
    const CTR_KEY: [u8; 16] = [
        0x2b, 0x7e, 0x15, 0x16, 0x28, 0xae, 0xd2, 0xa6, 0xab, 0xf7, 0x15, 0x88, 0x09, 0xcf, 0x4f,
        0x3c,
    ];
    const CTR_INPUT: [u8; 16] = [
        0xf0, 0xf1, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8, 0xf9, 0xfa, 0xfb, 0xfc, 0xfd, 0xfe,
        0xff,
    ];
    const CTR_KEYSTREAM: [u8; 16] = [
        0xec, 0x8c, 0xdf, 0x73, 0x98, 0x60, 0x7c, 0xb0, 0xf2, 0xd2, 0x16, 0x75, 0xea, 0x9e, 0xa1,
        0xe4,
    ];

    #[test]
    fn both_paths_match_counter_mode_vector() {
        let key = Aes128Key::from(CTR_KEY);
        assert_eq!(Aes128::new(&key).encrypt_block(&CTR_INPUT), CTR_KEYSTREAM);
        assert_eq!(Aes128::portable(&key).encrypt_block(&CTR_INPUT), CTR_KEYSTREAM);
    }

    #[test]
    fn detection_is_stable() {
        assert_eq!(Capability::detect(), Capability::detect());
    }

    #[test]
    fn both_paths_match_nist_vector() {
        let key = Aes128Key::from(NIST_KEY);
        for cipher in [Aes128::new(&key), Aes128::portable(&key)] {
            assert_eq!(
                cipher.encrypt_block(&NIST_PLAIN),
                NIST_CIPHER,
                "{}",
                cipher.capability()
            );
            assert_eq!(cipher.decrypt_block(&NIST_CIPHER), NIST_PLAIN);
        }
    }

    #[test]
    fn hardware_request_falls_back_when_unsupported() {
        let cipher = Aes128::with_capability(&Aes128Key::from([0u8; 16]), Capability::AesNi);
        assert_eq!(cipher.capability(), Capability::detect());
    }

    #[test]
    fn dispatch_paths_agree_on_random_inputs() {
        let mut rng = ChaCha20Rng::from_seed([11u8; 32]);
        for _ in 0..200 {
            let mut key = [0u8; 16];
            let mut block = [0u8; 16];
            rng.fill_bytes(&mut key);
            rng.fill_bytes(&mut block);
            let key = Aes128Key::from(key);
            let detected = Aes128::new(&key);
            let portable = Aes128::portable(&key);
            assert_eq!(detected.encrypt_block(&block), portable.encrypt_block(&block));
        }
    }

    fn encrypt_via<C: BlockCipher>(cipher: C, block: &Block) -> Block {
        cipher.encrypt_block(block)
    }

    #[test]
    fn references_forward_to_cipher() {
        let cipher = Aes128::portable(&Aes128Key::from(NIST_KEY));
        assert_eq!(encrypt_via(&cipher, &NIST_PLAIN), NIST_CIPHER);
        let dynamic: &dyn BlockCipher = &cipher;
        assert_eq!(encrypt_via(dynamic, &NIST_PLAIN), NIST_CIPHER);
    }
}
