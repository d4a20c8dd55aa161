//! Parameter derivation for the graded encoding scheme.
//!
//! A pure mapping from (security parameter λ, multilinearity degree κ,
//! zero-test generator count) to the bit widths and prime count that govern
//! everything else. The widths follow the CLT13 analysis: η must absorb the
//! worst-case noise of κ multiplications plus the masking and slack margins,
//! and ν is the gap the zero test uses to separate true zeros from noise.

use crate::error::{CltError, Result};

/// Derived scheme parameters. Fixed at construction, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CltParams {
    /// Security parameter λ.
    pub lambda: u64,
    /// Multilinearity degree κ (number of multiplications the zero test
    /// must survive).
    pub kappa: u64,
    /// Number of independent zero-test generators.
    pub nzs: usize,
    /// Plaintext-slot bit width α.
    pub alpha: u64,
    /// Masking bit width β for zero-test parameter contributions.
    pub beta: u64,
    /// Per-encoding noise bit width ρ.
    pub rho: u64,
    /// Worst-case accumulated noise ρ_f after κ multiplications.
    pub rho_f: u64,
    /// Bit width η of each prime modulus.
    pub eta: u64,
    /// Zero-test slack ν: accepted residuals must be at least ν bits
    /// shorter than the master modulus.
    pub nu: u64,
    /// Number of CRT primes / plaintext slots.
    pub n: usize,
}

impl CltParams {
    /// Derive all widths from (λ, κ, nzs).
    ///
    /// Deterministic and side-effect free. Fails with
    /// [`CltError::InvalidParams`] when an input is zero or the derived
    /// slack or slot count is not positive; nothing is ever clamped.
    pub fn derive(lambda: u64, kappa: u64, nzs: usize) -> Result<Self> {
        if lambda == 0 || kappa == 0 || nzs == 0 {
            return Err(CltError::InvalidParams(format!(
                "lambda, kappa and nzs must be positive (got {}, {}, {})",
                lambda, kappa, nzs
            )));
        }

        let alpha = lambda;
        let beta = lambda;
        let rho = lambda;
        let rho_f = kappa * (rho + alpha + 2);
        let eta = rho_f + alpha + 2 * beta + lambda + 8;

        let slack = eta as i128 - beta as i128 - rho_f as i128 - lambda as i128 - 3;
        if slack <= 0 {
            return Err(CltError::InvalidParams(format!(
                "zero-test slack is {} but must be positive",
                slack
            )));
        }

        let n = (eta as f64 * (lambda as f64).log2()).ceil() as usize;
        if n < 1 {
            return Err(CltError::InvalidParams(format!(
                "derived slot count is {} but must be at least 1",
                n
            )));
        }

        Ok(Self {
            lambda,
            kappa,
            nzs,
            alpha,
            beta,
            rho,
            rho_f,
            eta,
            nu: slack as u64,
            n,
        })
    }
}
