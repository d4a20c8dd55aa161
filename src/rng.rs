//! Shared cryptographic random source.
//!
//! A ChaCha20 stream seeded once from the OS entropy source, wrapped in a
//! mutex so parallel workers can draw from a single generator. Draws are
//! short (a few dozen words) relative to the primality testing between
//! them, so contention stays low; this is the documented tradeoff versus
//! handing each worker an independently seeded generator.

use std::sync::Mutex;

use num_bigint::{BigUint, RandBigInt};
use rand::rngs::OsRng;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::error::{CltError, Result};

/// Process-local cryptographic random generator for big-integer draws.
///
/// Owned by the scheme state for its lifetime; every draw advances the
/// stream. Safe to share across threads.
pub struct EncodingRng {
    inner: Mutex<ChaCha20Rng>,
}

impl EncodingRng {
    /// Seed from the OS entropy source.
    ///
    /// Blocks until the OS yields 32 bytes; fails with
    /// [`CltError::Entropy`] if the source cannot be read. Construction of
    /// anything downstream cannot proceed without this succeeding.
    pub fn from_entropy() -> Result<Self> {
        let mut seed = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut seed)
            .map_err(|e| CltError::Entropy(e.to_string()))?;
        Ok(Self::from_seed(seed))
    }

    /// Deterministic generator for reproducible tests.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            inner: Mutex::new(ChaCha20Rng::from_seed(seed)),
        }
    }

    /// Uniform integer with at most `bits` bits.
    pub fn random_bits(&self, bits: u64) -> BigUint {
        self.inner.lock().expect("rng lock poisoned").gen_biguint(bits)
    }

    /// Uniform integer in `[0, bound)`.
    pub fn random_below(&self, bound: &BigUint) -> BigUint {
        self.inner
            .lock()
            .expect("rng lock poisoned")
            .gen_biguint_below(bound)
    }

    /// Uniform integer in `[low, high)`.
    pub fn random_range(&self, low: &BigUint, high: &BigUint) -> BigUint {
        self.inner
            .lock()
            .expect("rng lock poisoned")
            .gen_biguint_range(low, high)
    }
}
