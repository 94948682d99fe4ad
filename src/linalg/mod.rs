//! Exact linear algebra over Z/N for toggle systems.

pub mod crt;
pub mod gf2;
pub mod lift;
pub mod local;
pub mod zp_solve;

use std::fmt;

use ndarray::Array1;

/// Error from the linear solvers.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LinearSolverError {
    /// No exact solution exists.
    Inconsistent,
    /// A Hensel step from `p^level` to `p^(level+1)` could not be solved over GF(p).
    LiftFailed { level: u32 },
}

/// Why a system has no press plan, retained for diagnostics.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Unsolvable {
    /// The bit-packed N = 2 elimination found a `0 = 1` row.
    Binary,
    /// The system is inconsistent already modulo the prime.
    Field { prime: u64 },
    /// The system is solvable modulo the prime but not modulo `prime^exponent`, as
    /// confirmed by the exact solver after lifting failed.
    PrimePower { prime: u64, exponent: u32 },
}

impl fmt::Display for Unsolvable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Unsolvable::Binary => write!(f, "inconsistent over GF(2)"),
            Unsolvable::Field { prime } => write!(f, "inconsistent over GF({})", prime),
            Unsolvable::PrimePower { prime, exponent } => {
                write!(f, "no lift from GF({0}) to Z/{0}^{1}", prime, exponent)
            }
        }
    }
}

/// A step of the prime-power solver that had to switch to the exact Z/p^e solver.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Fallback {
    /// The particular solution could not be lifted from `p^level`.
    Particular { prime: u64, level: u32 },
    /// A nullspace basis vector could not be lifted from `p^level`.
    Basis { prime: u64, level: u32 },
}

/// A kernel vector together with its additive order: `order * values = 0 (mod N)`, so
/// coefficients in `0..order` reach every multiple of it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BasisVector {
    pub values: Array1<u64>,
    pub order: u64,
}

/// The affine solution space `particular + span(basis)` of `A x = b (mod modulus)`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ModularSolution {
    pub modulus: u64,
    pub particular: Array1<u64>,
    pub basis: Vec<BasisVector>,
}

impl ModularSolution {
    /// Number of coefficient combinations spanned by the basis, saturating at `u64::MAX`.
    pub fn combinations(&self) -> u64 {
        self.basis
            .iter()
            .fold(1u64, |acc, v| acc.saturating_mul(v.order))
    }
}
