//! Secret scheme state: prime moduli, plaintext generators, zero-test data.
//!
//! Generation follows the CLT13 recipe. Primes and slot generators are
//! produced over parallel index ranges and folded into a CRT tree; if two
//! primes collide the whole set is discarded and regenerated, which keeps
//! the tree build total instead of patching individual leaves. The
//! zero-test bases are drawn below the master modulus and retried until
//! invertible; only their inverses are retained. Everything in the state
//! except the public projection must stay secret.

use std::time::Instant;

use num_bigint::BigUint;
use num_traits::One;
use rayon::prelude::*;

use crate::crt::{mod_inverse, CrtTree};
use crate::error::{CltError, Result};
use crate::logging::{GenerationLog, SilentLog};
use crate::params::CltParams;
use crate::primes::next_prime;
use crate::rng::EncodingRng;
use crate::zero_test::PublicParams;

/// Retry budget for the prime-set/tree loop. A collision needs two equal
/// eta-bit primes, so any healthy configuration succeeds on the first
/// attempt; the bound converts a parameter or entropy defect into an error
/// instead of a hang.
const MAX_GENERATION_ATTEMPTS: usize = 64;

/// Generator-side secret state of the scheme.
///
/// Owns the CRT tree and the random source for its lifetime. The only
/// publishable projection is [`public_params`](Self::public_params); the
/// slot generators, zero-test inverses, and the prime factorization of the
/// master modulus must never leave the generator side.
pub struct CltState {
    pub(crate) params: CltParams,
    /// Master modulus x0 = product of all n primes.
    pub(crate) x0: BigUint,
    /// Zero-test parameter.
    pub(crate) pzt: BigUint,
    /// Per-slot plaintext generators g_1..g_n.
    pub(crate) gs: Vec<BigUint>,
    /// Inverses of the zero-test bases mod x0.
    pub(crate) zinvs: Vec<BigUint>,
    pub(crate) crt: CrtTree,
    pub(crate) rng: EncodingRng,
}

impl CltState {
    /// Generate a fresh state for multilinearity degree `kappa`, security
    /// parameter `lambda`, and `nzs` zero-test generators.
    ///
    /// `pows` fixes the top level the scheme will certify zero at: the
    /// zero test accepts encodings whose level vectors multiply out to
    /// exactly this exponent vector.
    pub fn generate(kappa: u64, lambda: u64, nzs: usize, pows: &[u32]) -> Result<Self> {
        Self::generate_with_log(kappa, lambda, nzs, pows, &SilentLog)
    }

    /// Like [`generate`](Self::generate), reporting progress to `log`.
    pub fn generate_with_log(
        kappa: u64,
        lambda: u64,
        nzs: usize,
        pows: &[u32],
        log: &dyn GenerationLog,
    ) -> Result<Self> {
        let params = CltParams::derive(lambda, kappa, nzs)?;
        if pows.len() != nzs {
            return Err(CltError::LevelVectorLength {
                provided: pows.len(),
                expected: nzs,
            });
        }

        let rng = EncodingRng::from_entropy()?;
        log.message(&format!(
            "parameters: lambda={} kappa={} eta={} nu={} n={} nzs={}",
            params.lambda, params.kappa, params.eta, params.nu, params.n, params.nzs
        ));

        let start = Instant::now();
        let (ps, gs, crt) = Self::generate_prime_set(&params, &rng, log)?;
        log.message(&format!(
            "generated {} primes and slot generators in {:.2}s",
            params.n,
            start.elapsed().as_secs_f64()
        ));

        let x0 = crt.modulus().clone();

        // Zero-test bases: uniform below x0, retried until invertible.
        // Only the inverses are kept.
        let start = Instant::now();
        let bases: Vec<(BigUint, BigUint)> = (0..nzs)
            .into_par_iter()
            .map(|_| loop {
                let z = rng.random_below(&x0);
                if let Some(zinv) = mod_inverse(&z, &x0) {
                    return (z, zinv);
                }
            })
            .collect();
        log.message(&format!(
            "generated {} zero-test bases in {:.2}s",
            nzs,
            start.elapsed().as_secs_f64()
        ));

        // Top-level exponent product zk = z_1^t_1 ... z_k^t_k mod x0.
        let mut zk = BigUint::one();
        for ((z, _), &pow) in bases.iter().zip(pows) {
            if pow > 0 {
                zk = zk * z.modpow(&BigUint::from(pow), &x0) % &x0;
            }
        }
        let zinvs: Vec<BigUint> = bases.into_iter().map(|(_, zinv)| zinv).collect();

        // Zero-test parameter: per slot i, a beta-bit-masked contribution
        //   ((g_i^-1 mod p_i) * zk mod p_i) * mask * (x0 / p_i)
        // summed mod x0. The sum is order-independent, so the parallel
        // parts need no coordination beyond final collection.
        let start = Instant::now();
        let contributions: Vec<BigUint> = ps
            .par_iter()
            .zip(gs.par_iter())
            .map(|(p, g)| {
                let ginv = mod_inverse(g, p)
                    .expect("slot generator shares a factor with its prime modulus");
                let masked = (ginv * &zk % p) * rng.random_bits(params.beta);
                masked * (&x0 / p) % &x0
            })
            .collect();
        let pzt = contributions.into_iter().sum::<BigUint>() % &x0;
        log.message(&format!(
            "assembled zero-test parameter in {:.2}s",
            start.elapsed().as_secs_f64()
        ));

        Ok(Self {
            params,
            x0,
            pzt,
            gs,
            zinvs,
            crt,
            rng,
        })
    }

    /// One round of prime and generator production plus the tree build,
    /// restarted wholesale on a coprimality failure.
    fn generate_prime_set(
        params: &CltParams,
        rng: &EncodingRng,
        log: &dyn GenerationLog,
    ) -> Result<(Vec<BigUint>, Vec<BigUint>, CrtTree)> {
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let ps: Vec<BigUint> = (0..params.n)
                .into_par_iter()
                .map(|_| next_prime(&rng.random_bits(params.eta), rng))
                .collect();
            let gs: Vec<BigUint> = (0..params.n)
                .into_par_iter()
                .map(|_| next_prime(&rng.random_bits(params.alpha), rng))
                .collect();
            match CrtTree::build(&ps) {
                Ok(crt) => return Ok((ps, gs, crt)),
                Err(CltError::NonCoprimeModuli) => {
                    log.message(&format!(
                        "prime collision on attempt {}, regenerating the prime set",
                        attempt
                    ));
                }
                Err(e) => return Err(e),
            }
        }
        Err(CltError::GenerationExhausted {
            attempts: MAX_GENERATION_ATTEMPTS,
        })
    }

    pub fn params(&self) -> &CltParams {
        &self.params
    }

    /// The master modulus x0.
    pub fn modulus(&self) -> &BigUint {
        &self.x0
    }

    /// Number of plaintext slots.
    pub fn slot_count(&self) -> usize {
        self.params.n
    }

    /// Per-slot plaintext generators.
    ///
    /// Generator-side secret: callers building on the state may reduce
    /// plaintexts by these, but they are not part of the published
    /// parameters and must never be.
    pub fn slot_generators(&self) -> &[BigUint] {
        &self.gs
    }

    /// Deep-copy projection of the publishable subset of the state.
    pub fn public_params(&self) -> PublicParams {
        PublicParams::from_state(self)
    }
}
