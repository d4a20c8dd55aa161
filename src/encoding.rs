//! Noisy encoding of plaintext tuples at a level.
//!
//! Each slot carries `m_i + r_i * g_i` for fresh rho-bit noise `r_i`; the
//! CRT tree folds the slots into one ring element, and the level vector is
//! applied by multiplying in the matching zero-test inverses. Two
//! encodings at complementary levels multiply into a top-level encoding
//! the zero test can certify.

use num_bigint::BigUint;
use num_traits::One;
use rayon::prelude::*;

use crate::error::{CltError, Result};
use crate::state::CltState;

/// Encode a plaintext tuple at the level selected by `pows`.
///
/// Slots beyond the tuple's length carry the zero plaintext. Draws fresh
/// randomness from the state's generator but mutates nothing else, so
/// concurrent calls are safe.
///
/// Fails only on contract violations: more plaintexts than slots, or a
/// level vector whose length is not the zero-test generator count.
pub fn encode(state: &CltState, inputs: &[BigUint], pows: &[u32]) -> Result<BigUint> {
    let params = state.params();
    let n = params.n;
    if inputs.len() > n {
        return Err(CltError::PlaintextTooLong {
            provided: inputs.len(),
            slots: n,
        });
    }
    if pows.len() != params.nzs {
        return Err(CltError::LevelVectorLength {
            provided: pows.len(),
            expected: params.nzs,
        });
    }

    // slot_i = m_i + r_i * g_i with fresh rho-bit noise.
    let rho = params.rho;
    let residues: Vec<BigUint> = (0..n)
        .into_par_iter()
        .map(|i| {
            let mut slot = state.rng.random_bits(rho) * &state.gs[i];
            if i < inputs.len() {
                slot += &inputs[i];
            }
            slot
        })
        .collect();

    let combined = state.crt.combine(&residues)?;

    // Remove the zero-test bases this encoding is tagged with.
    let mut zinv = BigUint::one();
    for (j, &pow) in pows.iter().enumerate() {
        if pow == 0 {
            continue;
        }
        zinv = zinv * state.zinvs[j].modpow(&BigUint::from(pow), &state.x0) % &state.x0;
    }

    Ok(combined * zinv % &state.x0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Zero;

    fn small_state() -> CltState {
        CltState::generate(2, 8, 2, &[1, 1]).unwrap()
    }

    #[test]
    fn test_encoding_is_reduced() {
        let state = small_state();
        let value = encode(&state, &[BigUint::from(1u32)], &[1, 1]).unwrap();
        assert!(value < *state.modulus());
    }

    #[test]
    fn test_level_zero_slots_carry_plaintext() {
        // At the all-zero level no inverse is mixed in, so each slot of the
        // combined value is m_i + r_i * g_i: reducing mod p_i then mod g_i
        // recovers the plaintext.
        let state = small_state();
        let inputs = [BigUint::from(1u32), BigUint::from(2u32)];
        let value = encode(&state, &inputs, &[0, 0]).unwrap();
        let ps = state.crt.leaf_moduli();
        for (i, input) in inputs.iter().enumerate() {
            let slot = &value % ps[i];
            let g = &state.slot_generators()[i];
            assert_eq!(&slot % g, input % g);
        }
        // Unfilled slots encode zero.
        let slot = &value % ps[inputs.len()];
        let g = &state.slot_generators()[inputs.len()];
        assert!((&slot % g).is_zero());
    }

    #[test]
    fn test_too_many_plaintexts_rejected() {
        let state = small_state();
        let n = state.slot_count();
        let inputs = vec![BigUint::from(0u32); n + 1];
        assert!(matches!(
            encode(&state, &inputs, &[1, 1]),
            Err(CltError::PlaintextTooLong { .. })
        ));
    }

    #[test]
    fn test_level_vector_length_rejected() {
        let state = small_state();
        assert!(matches!(
            encode(&state, &[BigUint::from(0u32)], &[1]),
            Err(CltError::LevelVectorLength {
                provided: 1,
                expected: 2
            })
        ));
    }

    #[test]
    fn test_fresh_randomness_per_call() {
        let state = small_state();
        let a = encode(&state, &[BigUint::from(0u32)], &[1, 1]).unwrap();
        let b = encode(&state, &[BigUint::from(0u32)], &[1, 1]).unwrap();
        assert_ne!(a, b);
    }
}
