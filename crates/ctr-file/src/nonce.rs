//! Nonce generation.

use rand::{CryptoRng, RngCore};

use crate::error::{CtrError, Result};
use crate::frame::{Nonce, NONCE_LEN};

/// Draws a fresh nonce from `rng`.
///
/// A failing source aborts the encryption; there is no fallback value.
pub fn generate_nonce<R: RngCore + CryptoRng + ?Sized>(rng: &mut R) -> Result<Nonce> {
    let mut nonce = [0u8; NONCE_LEN];
    rng.try_fill_bytes(&mut nonce)
        .map_err(CtrError::RandomnessUnavailable)?;
    Ok(nonce)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::rngs::OsRng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    /// Entropy source that always fails.
    pub(crate) struct BrokenRng;

    impl RngCore for BrokenRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new(std::io::Error::new(
                std::io::ErrorKind::Other,
                "entropy source offline",
            )))
        }
    }

    impl CryptoRng for BrokenRng {}

    #[test]
    fn seeded_rng_is_reproducible() {
        let a = generate_nonce(&mut ChaCha20Rng::from_seed([1u8; 32])).unwrap();
        let b = generate_nonce(&mut ChaCha20Rng::from_seed([1u8; 32])).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn os_nonces_differ() {
        let a = generate_nonce(&mut OsRng).unwrap();
        let b = generate_nonce(&mut OsRng).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn failing_source_is_reported() {
        assert!(matches!(
            generate_nonce(&mut BrokenRng),
            Err(CtrError::RandomnessUnavailable(_))
        ));
    }
}
