//! Divide-and-conquer Chinese Remainder combination tree.
//!
//! Built once over the prime moduli, read-only afterwards. The tree serves
//! two jobs: its root modulus is the master modulus (the exact product of
//! the leaves), and `combine` reconstructs the unique value congruent to a
//! given residue at every leaf in O(n) total work over O(log n) depth.
//!
//! Nodes live in an arena addressed by index rather than as owned child
//! pointers, so discarding a failed build is dropping one vector.

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Zero};

use crate::error::{CltError, Result};

/// Subtrees spanning at least this many leaves are combined on parallel
/// workers; below it the join overhead outweighs the multiplications.
const PARALLEL_SPAN: usize = 32;

#[derive(Debug, Clone)]
struct CrtNode {
    /// Product of the moduli under this node.
    modulus: BigUint,
    /// Number of leaves under this node.
    span: usize,
    kind: NodeKind,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Leaf,
    Internal {
        left: usize,
        right: usize,
        /// u * rightMod with u * rightMod + v * leftMod = 1, reduced mod
        /// this node's modulus. Congruent to 1 mod leftMod, 0 mod rightMod.
        crt_left: BigUint,
        /// v * leftMod, reduced likewise. Congruent to 1 mod rightMod.
        crt_right: BigUint,
    },
}

/// Balanced binary CRT tree over an ordered sequence of coprime moduli.
#[derive(Debug, Clone)]
pub struct CrtTree {
    nodes: Vec<CrtNode>,
    root: usize,
}

impl CrtTree {
    /// Build the tree by recursive midpoint splits.
    ///
    /// Fails with [`CltError::NonCoprimeModuli`] when two accumulated
    /// subtree moduli share a factor, which can only happen if two of the
    /// input moduli collided; the caller is expected to regenerate the
    /// whole sequence and retry.
    pub fn build(moduli: &[BigUint]) -> Result<Self> {
        if moduli.is_empty() {
            return Err(CltError::InvalidParams(
                "CRT tree needs at least one modulus".into(),
            ));
        }
        let mut nodes = Vec::with_capacity(2 * moduli.len() - 1);
        let root = Self::build_range(&mut nodes, moduli)?;
        Ok(Self { nodes, root })
    }

    fn build_range(nodes: &mut Vec<CrtNode>, moduli: &[BigUint]) -> Result<usize> {
        if moduli.len() == 1 {
            nodes.push(CrtNode {
                modulus: moduli[0].clone(),
                span: 1,
                kind: NodeKind::Leaf,
            });
            return Ok(nodes.len() - 1);
        }

        let mid = moduli.len() / 2;
        let left = Self::build_range(nodes, &moduli[..mid])?;
        let right = Self::build_range(nodes, &moduli[mid..])?;

        let left_mod = nodes[left].modulus.clone();
        let right_mod = nodes[right].modulus.clone();

        // gcd = leftMod * co_left + rightMod * co_right
        let (gcd, co_left, co_right) = extended_gcd(
            &BigInt::from(left_mod.clone()),
            &BigInt::from(right_mod.clone()),
        );
        if !gcd.is_one() {
            return Err(CltError::NonCoprimeModuli);
        }

        let modulus = &left_mod * &right_mod;
        let modulus_int = BigInt::from(modulus.clone());
        let crt_left = to_residue(co_right * BigInt::from(right_mod), &modulus_int);
        let crt_right = to_residue(co_left * BigInt::from(left_mod), &modulus_int);

        nodes.push(CrtNode {
            modulus,
            span: moduli.len(),
            kind: NodeKind::Internal {
                left,
                right,
                crt_left,
                crt_right,
            },
        });
        Ok(nodes.len() - 1)
    }

    /// Reconstruct the unique value in `[0, modulus)` congruent to
    /// `residues[i]` mod the i-th leaf modulus, for every i.
    ///
    /// Residues must already be reduced below their leaf moduli. Sibling
    /// subtrees above a span threshold are evaluated on parallel workers;
    /// the tree itself is never mutated, so concurrent callers need no
    /// locking.
    pub fn combine(&self, residues: &[BigUint]) -> Result<BigUint> {
        let leaves = self.leaf_count();
        if residues.len() != leaves {
            return Err(CltError::ResidueCountMismatch {
                provided: residues.len(),
                expected: leaves,
            });
        }
        Ok(self.combine_node(self.root, residues))
    }

    fn combine_node(&self, idx: usize, residues: &[BigUint]) -> BigUint {
        let node = &self.nodes[idx];
        match &node.kind {
            NodeKind::Leaf => residues[0].clone(),
            NodeKind::Internal {
                left,
                right,
                crt_left,
                crt_right,
            } => {
                let (left_res, right_res) = residues.split_at(self.nodes[*left].span);
                let (left_val, right_val) = if node.span >= PARALLEL_SPAN {
                    rayon::join(
                        || self.combine_node(*left, left_res),
                        || self.combine_node(*right, right_res),
                    )
                } else {
                    (
                        self.combine_node(*left, left_res),
                        self.combine_node(*right, right_res),
                    )
                };
                (left_val * crt_left + right_val * crt_right) % &node.modulus
            }
        }
    }

    /// The master modulus: exact product of all leaf moduli.
    pub fn modulus(&self) -> &BigUint {
        &self.nodes[self.root].modulus
    }

    /// Number of leaf moduli.
    pub fn leaf_count(&self) -> usize {
        self.nodes[self.root].span
    }

    /// Leaf moduli in combination order.
    pub fn leaf_moduli(&self) -> Vec<&BigUint> {
        let mut out = Vec::with_capacity(self.leaf_count());
        self.collect_leaves(self.root, &mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, idx: usize, out: &mut Vec<&'a BigUint>) {
        match &self.nodes[idx].kind {
            NodeKind::Leaf => out.push(&self.nodes[idx].modulus),
            NodeKind::Internal { left, right, .. } => {
                self.collect_leaves(*left, out);
                self.collect_leaves(*right, out);
            }
        }
    }
}

/// Extended GCD: returns (gcd, x, y) such that gcd = a*x + b*y.
///
/// Iterative so the step count (linear in the operand bit length) never
/// touches the stack.
pub(crate) fn extended_gcd(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    let (mut old_r, mut r) = (a.clone(), b.clone());
    let (mut old_x, mut x) = (BigInt::one(), BigInt::zero());
    let (mut old_y, mut y) = (BigInt::zero(), BigInt::one());

    while !r.is_zero() {
        let q = &old_r / &r;
        let next_r = &old_r - &q * &r;
        old_r = std::mem::replace(&mut r, next_r);
        let next_x = &old_x - &q * &x;
        old_x = std::mem::replace(&mut x, next_x);
        let next_y = &old_y - &q * &y;
        old_y = std::mem::replace(&mut y, next_y);
    }
    (old_r, old_x, old_y)
}

/// Modular inverse of `a` mod `m` via extended GCD.
///
/// Returns `None` when `a` and `m` share a factor; non-invertibility is an
/// expected, handled event for values drawn below a composite modulus.
pub(crate) fn mod_inverse(a: &BigUint, m: &BigUint) -> Option<BigUint> {
    let m_int = BigInt::from(m.clone());
    let (gcd, x, _) = extended_gcd(&BigInt::from(a.clone()), &m_int);
    if !gcd.is_one() {
        return None;
    }
    Some(to_residue(x, &m_int))
}

/// Reduce into `[0, m)` and strip the sign.
fn to_residue(v: BigInt, m: &BigInt) -> BigUint {
    let mut r = v % m;
    if r.sign() == Sign::Minus {
        r += m;
    }
    let (_, magnitude) = r.into_parts();
    magnitude
}
