//! The `solve` entry point: picks an elimination path, then searches the solution space
//! for a plan with the fewest presses.

use std::fmt;

use board::Board;
use error::SolveError;
use linalg::gf2::BinaryEliminator;
use linalg::{lift, Fallback, Unsolvable};
use recurrence::RowRecurrence;
use search::{self, BinarySpace, ModularSpace, SearchOptions, SolutionSpace};
use system::{self, ToggleSystem};
use topology::Topology;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SolverOptions {
    /// Largest number of free variables searched exhaustively. `None` picks 22 for N = 2
    /// and 10 otherwise.
    pub enumeration_limit: Option<usize>,
    /// Largest number of coefficient combinations searched exhaustively.
    pub max_candidates: u64,
    pub max_random_trials: usize,
    /// Threads used by the exhaustive search.
    pub workers: usize,
    pub seed: u64,
    /// Solve cross boards through the first-row recurrence.
    pub use_row_recurrence: bool,
}

impl Default for SolverOptions {
    fn default() -> SolverOptions {
        SolverOptions {
            enumeration_limit: None,
            max_candidates: 1 << 22,
            max_random_trials: 20_000,
            workers: 1,
            seed: 0x5EED,
            use_row_recurrence: true,
        }
    }
}

impl SolverOptions {
    pub fn search_options(&self, modulus: u64) -> SearchOptions {
        SearchOptions {
            enumeration_limit: self
                .enumeration_limit
                .unwrap_or(if modulus == 2 { 22 } else { 10 }),
            max_candidates: self.max_candidates,
            max_random_trials: self.max_random_trials,
            workers: self.workers.max(1),
            seed: self.seed,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Outcome {
    Solved,
    NoSolution(Unsolvable),
}

/// The elimination route taken by [`solve`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SolvePath {
    /// Bit-packed elimination of the full system over GF(2).
    Binary,
    /// Elimination over every prime factor of N, lifted and combined.
    PrimePower,
    /// The first-row system of a cross board.
    RowRecurrence,
}

impl fmt::Display for SolvePath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SolvePath::Binary => write!(f, "bit-packed GF(2)"),
            SolvePath::PrimePower => write!(f, "prime power lifting"),
            SolvePath::RowRecurrence => write!(f, "row recurrence"),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Solution {
    pub outcome: Outcome,
    /// Press count per cell, laid out like the board. All zero without a solution.
    pub press_plan: Board,
    pub total_weight: u64,
    /// False when the search was heuristic, in which case `total_weight` is only an upper
    /// bound on the minimum.
    pub optimal: bool,
    /// Dimension of the solution space.
    pub free_variables: usize,
    pub path: SolvePath,
    /// Lifting steps that had to be redone by exact elimination.
    pub fallbacks: Vec<Fallback>,
    /// Number of candidate plans weighed by the search.
    pub examined: u64,
}

impl Solution {
    pub fn has_solution(&self) -> bool {
        self.outcome == Outcome::Solved
    }

    /// The plan as a list of `(row, col)` presses, each cell repeated by its press count.
    pub fn moves(&self) -> Vec<(usize, usize)> {
        let mut moves = vec![];
        for (r, row) in self.press_plan.rows().iter().enumerate() {
            for (c, &times) in row.iter().enumerate() {
                for _ in 0..times {
                    moves.push((r, c));
                }
            }
        }
        moves
    }

    /// The presses of a binary plan in an order where each one lands on a lit cell of
    /// `board`, for puzzles that only allow pressing lit cells.
    pub fn lit_only_moves<T: Topology + ?Sized>(
        &self,
        topology: &T,
        board: &Board,
    ) -> Result<Vec<(usize, usize)>, SolveError> {
        let order = system::lit_only_order(topology, board, &self.press_plan)?;
        Ok(order.into_iter().map(|i| self.press_plan.locate(i)).collect())
    }

    fn unsolvable(layout: &[usize], reason: Unsolvable, path: SolvePath) -> Solution {
        debug!("No solution: {}", reason);
        Solution {
            outcome: Outcome::NoSolution(reason),
            press_plan: Board::zeros(layout),
            total_weight: 0,
            optimal: true,
            free_variables: 0,
            path,
            fallbacks: vec![],
            examined: 0,
        }
    }
}

struct Found {
    presses: Vec<u64>,
    optimal: bool,
    free_variables: usize,
    examined: u64,
}

fn search_binary(space: BinarySpace, options: &SearchOptions) -> Found {
    let free_variables = space.dimension();
    let outcome = search::minimize(&space, options);
    Found {
        presses: outcome.best.to_residues(),
        optimal: outcome.exhaustive,
        free_variables,
        examined: outcome.examined,
    }
}

fn search_modular(space: ModularSpace, options: &SearchOptions) -> Found {
    let free_variables = space.dimension();
    let outcome = search::minimize(&space, options);
    Found {
        presses: outcome.best,
        optimal: outcome.exhaustive,
        free_variables,
        examined: outcome.examined,
    }
}

/// Finds a plan with the fewest presses that clears `board` on `topology` over Z/`modulus`.
///
/// Malformed input is an error; an unsolvable board is a [`Solution`] whose outcome is
/// [`Outcome::NoSolution`].
pub fn solve<T: Topology + ?Sized>(
    topology: &T,
    board: &Board,
    modulus: u64,
    options: &SolverOptions,
) -> Result<Solution, SolveError> {
    if modulus < 2 {
        return Err(SolveError::InvalidModulus(modulus));
    }
    let layout = topology.layout();
    let search = options.search_options(modulus);

    let recurrence = match topology.row_recurrence() {
        Some((rows, cols)) if options.use_row_recurrence && rows > 0 && cols > 0 => Some((rows, cols)),
        _ => None,
    };

    let (path, found, fallbacks) = if let Some((rows, cols)) = recurrence {
        board.validate(&layout, modulus)?;
        let rec = RowRecurrence::new(rows, cols, board, modulus);
        let (a, b) = rec.reduced_system();
        debug!("Solving {} through the row recurrence", topology.name());
        if modulus == 2 {
            match BinaryEliminator::from_matrix(&a, &b).eliminate() {
                Ok(e) => {
                    let (particular, basis) =
                        rec.expand_binary(&e.particular_solution(), &e.nullspace_basis());
                    let found = search_binary(BinarySpace { particular, basis }, &search);
                    (SolvePath::RowRecurrence, found, vec![])
                }
                Err(_) => {
                    return Ok(Solution::unsolvable(&layout, Unsolvable::Binary, SolvePath::RowRecurrence))
                }
            }
        } else {
            match lift::solve_modular(&a, &b, modulus) {
                Ok((solution, components)) => {
                    let fallbacks = components.iter().filter_map(|c| c.fallback).collect();
                    let found = search_modular(ModularSpace::new(&rec.expand(&solution)), &search);
                    (SolvePath::RowRecurrence, found, fallbacks)
                }
                Err(reason) => {
                    return Ok(Solution::unsolvable(&layout, reason, SolvePath::RowRecurrence))
                }
            }
        }
    } else {
        let system = ToggleSystem::build(topology, board, modulus)?;
        if modulus == 2 {
            debug!("Solving {} by bit-packed elimination", topology.name());
            match BinaryEliminator::from_matrix(&system.a, &system.b).eliminate() {
                Ok(e) => {
                    let space = BinarySpace {
                        particular: e.particular_solution(),
                        basis: e.nullspace_basis(),
                    };
                    (SolvePath::Binary, search_binary(space, &search), vec![])
                }
                Err(_) => {
                    return Ok(Solution::unsolvable(&layout, Unsolvable::Binary, SolvePath::Binary))
                }
            }
        } else {
            debug!("Solving {} over the prime powers of {}", topology.name(), modulus);
            match lift::solve_modular(&system.a, &system.b, modulus) {
                Ok((solution, components)) => {
                    let fallbacks = components.iter().filter_map(|c| c.fallback).collect();
                    let found = search_modular(ModularSpace::new(&solution), &search);
                    (SolvePath::PrimePower, found, fallbacks)
                }
                Err(reason) => {
                    return Ok(Solution::unsolvable(&layout, reason, SolvePath::PrimePower))
                }
            }
        }
    };

    let press_plan = Board::from_cells(&layout, &found.presses);
    let total_weight = press_plan.weight();
    debug!(
        "{}: {} free variables, weight {}{}",
        path,
        found.free_variables,
        total_weight,
        if found.optimal { "" } else { " (heuristic)" }
    );

    Ok(Solution {
        outcome: Outcome::Solved,
        press_plan,
        total_weight,
        optimal: found.optimal,
        free_variables: found.free_variables,
        path,
        fallbacks,
        examined: found.examined,
    })
}

#[test]
fn test_default_limits() {
    let o = SolverOptions::default();
    assert_eq!(o.search_options(2).enumeration_limit, 22);
    assert_eq!(o.search_options(6).enumeration_limit, 10);
    let o = SolverOptions {
        enumeration_limit: Some(3),
        workers: 0,
        ..SolverOptions::default()
    };
    assert_eq!(o.search_options(2).enumeration_limit, 3);
    assert_eq!(o.search_options(2).workers, 1);
}

#[test]
fn test_moves() {
    use topology::Cross;
    let board = Board::new(vec![vec![1]]);
    let s = solve(&Cross::new(1, 1), &board, 5, &SolverOptions::default()).unwrap();
    assert!(s.has_solution());
    assert_eq!(s.press_plan, Board::new(vec![vec![4]]));
    assert_eq!(s.moves(), vec![(0, 0); 4]);
    assert_eq!(s.total_weight, 4);
}

#[test]
fn test_invalid_input() {
    use topology::Cross;
    let board = Board::new(vec![vec![1, 2]]);
    let options = SolverOptions::default();
    assert_eq!(
        solve(&Cross::new(1, 2), &board, 1, &options),
        Err(SolveError::InvalidModulus(1))
    );
    assert!(solve(&Cross::new(1, 2), &board, 2, &options).is_err());
    assert!(solve(&Cross::new(2, 2), &board, 3, &options).is_err());
}
