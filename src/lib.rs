//! # clt_engine Quickstart
//!
//! ```rust,ignore
//! use clt_engine::{encode, is_zero, CltState};
//! use num_bigint::BigUint;
//!
//! // kappa=2, lambda=30, 10 zero-test generators, top level = all ones.
//! let top = vec![1u32; 10];
//! let state = CltState::generate(2, 30, 10, &top)?;
//! let pp = state.public_params();
//!
//! // Two encodings of zero at the top level sum to a top-level zero.
//! let a = encode(&state, &[BigUint::from(0u32)], &top)?;
//! let b = encode(&state, &[BigUint::from(0u32)], &top)?;
//! let sum = (a + b) % state.modulus();
//! assert!(is_zero(&pp, &sum));
//! ```
//!
#![doc = include_str!("../README.md")]

// Core modules
pub mod crt; // divide-and-conquer CRT combination tree
pub mod encoding; // noisy plaintext encoding at a level
pub mod error;
pub mod logging;
pub mod params; // parameter derivation from (lambda, kappa, nzs)
pub mod primes; // probable-prime generation for moduli and slot generators
pub mod rng;
pub mod serialize; // raw record persistence
pub mod state; // secret state generation

// --- Public API exports ---

pub use crt::CrtTree;
pub use encoding::encode;
pub use error::{CltError, Result};
pub use logging::{GenerationLog, SilentLog, StderrLog};
pub use params::CltParams;
pub use rng::EncodingRng;
pub use state::CltState;
pub use zero_test::{is_zero, PublicParams};
