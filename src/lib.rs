//! Minimum-press solver for toggle puzzles (Lights Out and its variants) over Z/N.
//!
//! A puzzle is a [`Topology`](topology::Topology) together with a [`Board`](board::Board)
//! of cell values. Pressing a cell adds one to every cell it toggles, and the goal is the
//! all-zero board. [`solve`](solver::solve) returns a press plan of least total weight.

extern crate crossbeam;
extern crate itertools;
extern crate ndarray;
extern crate num_integer;
extern crate num_traits;
extern crate pest;
#[macro_use]
extern crate pest_derive;
extern crate rand;

#[macro_use]
extern crate log;

pub mod board;
pub mod error;
pub mod linalg;
pub mod parser;
pub mod recurrence;
pub mod ring;
pub mod search;
pub mod solver;
pub mod system;
pub mod topology;

pub use board::Board;
pub use error::SolveError;
pub use solver::{solve, Outcome, Solution, SolvePath, SolverOptions};
pub use topology::Topology;

#[cfg(test)]
mod tests;
