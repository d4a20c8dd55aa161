//! Error taxonomy for the graded encoding engine.
//!
//! Variants map onto the failure classes a caller can actually observe:
//! bad configuration, a dead entropy source, caller contract violations,
//! persistence failures, and an exhausted regeneration budget. Structural
//! collisions (`NonCoprimeModuli`) are recovered internally during state
//! generation and only escape through the standalone
//! [`CrtTree::build`](crate::crt::CrtTree::build) entry point.

use std::fmt;
use std::io;

/// Errors surfaced by parameter derivation, state generation, encoding,
/// and persistence.
#[derive(Debug)]
pub enum CltError {
    /// The derived parameters are not meaningful: a zero input, a
    /// non-positive zero-test slack, or a slot count below one.
    InvalidParams(String),

    /// The OS entropy source could not be read. Construction cannot
    /// proceed without randomness.
    Entropy(String),

    /// Two accumulated CRT moduli share a factor (a prime collision).
    NonCoprimeModuli,

    /// More plaintext values were supplied than the scheme has slots.
    PlaintextTooLong { provided: usize, slots: usize },

    /// A level vector's length does not match the zero-test generator count.
    LevelVectorLength { provided: usize, expected: usize },

    /// A residue sequence's length does not match the CRT tree's leaf count.
    ResidueCountMismatch { provided: usize, expected: usize },

    /// The prime-set retry loop ran out of attempts. This signals a
    /// parameter or entropy defect, not a recoverable runtime condition.
    GenerationExhausted { attempts: usize },

    /// Persistence failure: I/O unavailable, truncated or malformed record.
    Io(io::Error),
}

impl fmt::Display for CltError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CltError::InvalidParams(msg) => write!(f, "invalid parameters: {}", msg),
            CltError::Entropy(msg) => write!(f, "entropy source failure: {}", msg),
            CltError::NonCoprimeModuli => {
                write!(f, "CRT moduli are not pairwise coprime")
            }
            CltError::PlaintextTooLong { provided, slots } => {
                write!(f, "plaintext tuple has {} values but the scheme has {} slots", provided, slots)
            }
            CltError::LevelVectorLength { provided, expected } => {
                write!(f, "level vector has {} entries, expected {}", provided, expected)
            }
            CltError::ResidueCountMismatch { provided, expected } => {
                write!(f, "residue sequence has {} entries, expected {}", provided, expected)
            }
            CltError::GenerationExhausted { attempts } => {
                write!(f, "prime generation failed {} times in a row", attempts)
            }
            CltError::Io(err) => write!(f, "persistence failure: {}", err),
        }
    }
}

impl std::error::Error for CltError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CltError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for CltError {
    fn from(err: io::Error) -> Self {
        CltError::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, CltError>;
