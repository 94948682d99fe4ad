//! Construction of the toggle system `A x = b (mod N)`.
//!
//! Column `i` of `A` counts how often pressing cell `i` toggles every other cell, and
//! `b = -board`, so a solution `x` is a press-count vector that drives the board to zero.
//! For every topology in scope the toggle relation is symmetric, hence so is `A`.

use ndarray::{Array1, Array2};

use board::Board;
use error::SolveError;
use linalg::gf2::BitVector;
use ring::Ring;
use topology::Topology;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ToggleSystem {
    pub a: Array2<u64>,
    pub b: Array1<u64>,
    pub ring: Ring,
}

/// Builds the press matrix of a topology over Z/N, rejecting malformed press patterns.
pub fn press_matrix<T: Topology + ?Sized>(topology: &T, ring: Ring) -> Result<Array2<u64>, SolveError> {
    let n = topology.cell_count();
    let mut a = Array2::<u64>::zeros((n, n));
    for i in 0..n {
        let targets = topology.press(i);
        if !targets.contains(&i) {
            return Err(SolveError::MissingSelfToggle { cell: i });
        }
        for j in targets {
            if j >= n {
                return Err(SolveError::CellOutOfBounds {
                    cell: i,
                    target: j,
                    cells: n,
                });
            }
            a[(j, i)] = ring.add(a[(j, i)], ring.reduce(1));
        }
    }

    for i in 0..n {
        for j in i + 1..n {
            if a[(i, j)] != a[(j, i)] {
                return Err(SolveError::AsymmetricToggle { cell: i, target: j });
            }
        }
    }
    Ok(a)
}

impl ToggleSystem {
    /// Builds the system for driving `board` to zero on `topology` over Z/`modulus`.
    pub fn build<T: Topology + ?Sized>(
        topology: &T,
        board: &Board,
        modulus: u64,
    ) -> Result<ToggleSystem, SolveError> {
        if modulus < 2 {
            return Err(SolveError::InvalidModulus(modulus));
        }
        let ring = Ring::new(modulus);
        board.validate(&topology.layout(), modulus)?;
        let a = press_matrix(topology, ring)?;
        let b = Array1::from(board.cells().into_iter().map(|v| ring.neg(v)).collect::<Vec<_>>());
        debug!(
            "Toggle system for {} with {} cells over {}",
            topology.name(),
            b.len(),
            ring
        );
        Ok(ToggleSystem { a, b, ring })
    }

    pub fn variables(&self) -> usize {
        self.a.ncols()
    }

    pub fn modulus(&self) -> u64 {
        self.ring.modulus()
    }

    /// Computes `A x (mod N)`.
    pub fn apply(&self, x: &[u64]) -> Array1<u64> {
        mat_vec(&self.a, x, self.ring)
    }

    /// Computes `b - A x (mod N)`.
    pub fn residual(&self, x: &[u64]) -> Array1<u64> {
        let ax = self.apply(x);
        Array1::from(
            self.b
                .iter()
                .zip(ax.iter())
                .map(|(&b, &ax)| self.ring.sub(b, ax))
                .collect::<Vec<_>>(),
        )
    }

    pub fn is_solution(&self, x: &[u64]) -> bool {
        x.len() == self.variables() && self.residual(x).iter().all(|&r| r == 0)
    }
}

/// Computes `a x` over the ring, reducing the entries of both operands first.
pub fn mat_vec(a: &Array2<u64>, x: &[u64], ring: Ring) -> Array1<u64> {
    assert_eq!(a.ncols(), x.len());
    Array1::from(
        a.outer_iter()
            .map(|row| {
                row.iter()
                    .zip(x)
                    .filter(|&(&c, &v)| c != 0 && v != 0)
                    .fold(0, |acc, (&c, &v)| ring.mul_add(acc, ring.reduce(c), ring.reduce(v)))
            })
            .collect::<Vec<_>>(),
    )
}

/// Presses every cell of `plan` the given number of times on a copy of `board`.
pub fn apply_plan<T: Topology + ?Sized>(topology: &T, board: &Board, plan: &Board, modulus: u64) -> Board {
    let ring = Ring::new(modulus);
    let layout = topology.layout();
    assert_eq!(board.layout(), layout);
    assert_eq!(plan.layout(), layout);
    let mut cells: Vec<u64> = board.cells().into_iter().map(|v| ring.reduce(v)).collect();
    for (i, &times) in plan.cells().iter().enumerate() {
        let times = ring.reduce(times);
        if times == 0 {
            continue;
        }
        for j in topology.press(i) {
            cells[j] = ring.add(cells[j], times);
        }
    }
    Board::from_cells(&layout, &cells)
}

/// The board obtained by pressing `presses` on a solved board.
pub fn scramble<T: Topology + ?Sized>(topology: &T, presses: &[u64], modulus: u64) -> Board {
    let layout = topology.layout();
    apply_plan(
        topology,
        &Board::zeros(&layout),
        &Board::from_cells(&layout, presses),
        modulus,
    )
}

/// Orders the presses of a binary plan so that every press lands on a lit cell.
///
/// Lit targets are pressed directly. When every remaining target is dark, a target `t`
/// with a lit neighbour `j` is reached by pressing `j`, `t`, `j`: the first press lights
/// `t` and pressing `t` relights `j`, so the three presses act like pressing `t` alone.
/// If `plan` clears `board`, so does the returned order. The search gets stuck when the
/// remaining presses add up to a kernel vector, since the board is then dark.
pub fn lit_only_order<T: Topology + ?Sized>(
    topology: &T,
    board: &Board,
    plan: &Board,
) -> Result<Vec<usize>, SolveError> {
    let layout = topology.layout();
    board.validate(&layout, 2)?;
    plan.validate(&layout, 2)?;
    let a = press_matrix(topology, Ring::new(2))?;
    let n = a.ncols();
    // the cells toggled an odd number of times by each press
    let toggles: Vec<Vec<usize>> = (0..n)
        .map(|i| (0..n).filter(|&j| a[(j, i)] == 1).collect())
        .collect();

    let mut state = BitVector::from_residues(&board.cells());
    let mut pending: Vec<usize> = plan
        .cells()
        .iter()
        .enumerate()
        .filter(|&(_, &x)| x == 1)
        .map(|(i, _)| i)
        .collect();
    let mut order = Vec::with_capacity(pending.len());
    let press = |state: &mut BitVector, order: &mut Vec<usize>, cell: usize| {
        debug_assert!(state.get(cell));
        for &j in &toggles[cell] {
            state.flip(j);
        }
        order.push(cell);
    };

    while !pending.is_empty() {
        let before = pending.len();
        let mut dark = Vec::with_capacity(before);
        for &t in &pending {
            if state.get(t) {
                press(&mut state, &mut order, t);
            } else {
                dark.push(t);
            }
        }
        pending = dark;
        if pending.len() < before {
            continue;
        }

        let detour = pending.iter().enumerate().find_map(|(k, &t)| {
            toggles[t]
                .iter()
                .cloned()
                .find(|&j| j != t && state.get(j) && a[(j, j)] == 1)
                .map(|j| (k, t, j))
        });
        match detour {
            Some((k, t, j)) => {
                trace!("Reaching dark cell {} through {}", t, j);
                press(&mut state, &mut order, j);
                press(&mut state, &mut order, t);
                press(&mut state, &mut order, j);
                pending.remove(k);
            }
            None => {
                return Err(SolveError::NoLitOnlyOrder {
                    pending: pending.len(),
                })
            }
        }
    }
    debug!("Lit-only order of {} presses", order.len());
    Ok(order)
}

#[test]
fn test_build_cross() {
    use topology::Cross;
    let board = Board::new(vec![vec![1, 0], vec![0, 0]]);
    let s = ToggleSystem::build(&Cross::new(2, 2), &board, 3).unwrap();
    assert_eq!(
        s.a,
        ndarray::arr2(&[[1, 1, 1, 0], [1, 1, 0, 1], [1, 0, 1, 1], [0, 1, 1, 1]])
    );
    assert_eq!(s.b, ndarray::arr1(&[2, 0, 0, 0]));
    // pressing the lit cell twice adds 2 to its whole cross
    assert!(!s.is_solution(&[2, 0, 0, 0]));
    assert_eq!(s.residual(&[2, 0, 0, 0]), ndarray::arr1(&[0, 1, 1, 0]));
}

#[test]
fn test_residual_and_apply_plan() {
    use topology::Cross;
    let t = Cross::new(3, 3);
    let presses = vec![1, 0, 0, 0, 1, 0, 0, 0, 1];
    let board = scramble(&t, &presses, 2);
    let s = ToggleSystem::build(&t, &board, 2).unwrap();
    assert!(s.is_solution(&presses));
    let solved = apply_plan(&t, &board, &Board::from_cells(&t.layout(), &presses), 2);
    assert!(solved.is_zero());
}

#[test]
fn test_multiset_press_accumulates() {
    use topology::Custom;
    // pressing a cell toggles it twice: over Z/2 this cancels out
    let t = Custom::new("double", vec![1], |_| vec![0, 0]);
    let a = press_matrix(&t, Ring::new(2)).unwrap();
    assert_eq!(a[(0, 0)], 0);
    let a = press_matrix(&t, Ring::new(3)).unwrap();
    assert_eq!(a[(0, 0)], 2);
}

#[test]
fn test_malformed_topology() {
    use topology::Custom;
    let board = Board::zeros(&[2]);
    let lonely = Custom::new("lonely", vec![2], |i| vec![1 - i]);
    assert_eq!(
        ToggleSystem::build(&lonely, &board, 2),
        Err(SolveError::MissingSelfToggle { cell: 0 })
    );
    let oneway = Custom::new("oneway", vec![2], |i| if i == 0 { vec![0, 1] } else { vec![1] });
    assert_eq!(
        ToggleSystem::build(&oneway, &board, 2),
        Err(SolveError::AsymmetricToggle { cell: 0, target: 1 })
    );
    let escape = Custom::new("escape", vec![2], |i| vec![i, 2]);
    assert_eq!(
        ToggleSystem::build(&escape, &board, 2),
        Err(SolveError::CellOutOfBounds {
            cell: 0,
            target: 2,
            cells: 2
        })
    );
    assert_eq!(
        ToggleSystem::build(&::topology::Cross::new(1, 2), &board, 1),
        Err(SolveError::InvalidModulus(1))
    );
}

#[test]
fn test_lit_only_detour() {
    use topology::Cross;
    // both targets start dark; the lit end cell opens the way to the middle one
    let t = Cross::new(1, 3);
    let board = Board::new(vec![vec![0, 0, 1]]);
    let plan = Board::new(vec![vec![1, 1, 0]]);
    assert!(apply_plan(&t, &board, &plan, 2).is_zero());
    assert_eq!(lit_only_order(&t, &board, &plan), Ok(vec![2, 1, 2, 0]));
}

#[test]
fn test_lit_only_stuck() {
    use topology::Custom;
    // a press that toggles its own cell twice never changes the board
    let t = Custom::new("double", vec![1], |_| vec![0, 0]);
    assert_eq!(
        lit_only_order(&t, &Board::new(vec![vec![0]]), &Board::new(vec![vec![1]])),
        Err(SolveError::NoLitOnlyOrder { pending: 1 })
    );
    let t = ::topology::Cross::new(1, 1);
    assert!(lit_only_order(&t, &Board::new(vec![vec![2]]), &Board::new(vec![vec![1]])).is_err());
}
