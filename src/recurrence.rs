//! Row recurrence for the cross topology.
//!
//! On a rectangular cross board, cell `(r, c)` is only cleared by presses in rows `r - 1`,
//! `r` and `r + 1`, so once row `r` and the rows above it are known, row `r + 1` is forced:
//!
//! ```text
//! x[r+1][c] = -(board[r][c] + x[r][c-1] + x[r][c] + x[r][c+1] + x[r-1][c])
//! ```
//!
//! Every press count is therefore an affine form in the first row, and only the bottom
//! row's cells remain as equations: a `cols x cols` system instead of `cells x cells`.

use ndarray::{Array1, Array2};

use board::Board;
use linalg::gf2::BitVector;
use linalg::{BasisVector, ModularSolution};
use ring::Ring;

#[derive(Debug, Clone)]
pub struct RowRecurrence {
    cols: usize,
    ring: Ring,
    /// For every cell, the coefficients of its press count in the first-row variables,
    /// followed by the constant term.
    forms: Vec<Vec<u64>>,
    /// The bottom-row equations `g y + g0 = 0`, in the same layout.
    residues: Vec<Vec<u64>>,
}

impl RowRecurrence {
    pub fn new(rows: usize, cols: usize, board: &Board, modulus: u64) -> RowRecurrence {
        assert!(rows > 0 && cols > 0);
        assert_eq!(board.layout(), vec![cols; rows]);
        let ring = Ring::new(modulus);
        let width = cols + 1;

        let mut forms = vec![vec![0; width]; rows * cols];
        for c in 0..cols {
            forms[c][c] = ring.reduce(1);
        }

        // the state left at (r, c) after every press except the one below it
        let remainder = |forms: &[Vec<u64>], r: usize, c: usize| -> Vec<u64> {
            let mut f = vec![0; width];
            f[cols] = ring.reduce(board.get(r, c));
            let mut add = |g: &[u64]| {
                for (a, &b) in f.iter_mut().zip(g) {
                    *a = ring.add(*a, b);
                }
            };
            add(&forms[r * cols + c]);
            if c > 0 {
                add(&forms[r * cols + c - 1]);
            }
            if c + 1 < cols {
                add(&forms[r * cols + c + 1]);
            }
            if r > 0 {
                add(&forms[(r - 1) * cols + c]);
            }
            f
        };

        for r in 0..rows - 1 {
            for c in 0..cols {
                let next = remainder(&forms, r, c).into_iter().map(|v| ring.neg(v)).collect();
                forms[(r + 1) * cols + c] = next;
            }
        }
        let residues = (0..cols).map(|c| remainder(&forms, rows - 1, c)).collect();

        debug!("Row recurrence on {}x{}: {} first-row variables", rows, cols, cols);
        RowRecurrence {
            cols,
            ring,
            forms,
            residues,
        }
    }

    pub fn variables(&self) -> usize {
        self.cols
    }

    /// The system `a y = b` on the first row whose solutions are exactly the first rows of
    /// the full solutions.
    pub fn reduced_system(&self) -> (Array2<u64>, Array1<u64>) {
        let n = self.cols;
        let mut a = Array2::zeros((n, n));
        let mut b = Array1::zeros(n);
        for (i, g) in self.residues.iter().enumerate() {
            for j in 0..n {
                a[(i, j)] = g[j];
            }
            b[i] = self.ring.neg(g[n]);
        }
        (a, b)
    }

    fn evaluate(&self, first_row: &[u64], constant: bool) -> Vec<u64> {
        assert_eq!(first_row.len(), self.cols);
        let ring = self.ring;
        self.forms
            .iter()
            .map(|f| {
                let init = if constant { f[self.cols] } else { 0 };
                f.iter()
                    .zip(first_row)
                    .fold(init, |acc, (&c, &y)| ring.mul_add(acc, c, y))
            })
            .collect()
    }

    /// The full press plan, row-major, forced by the given first row.
    pub fn propagate(&self, first_row: &[u64]) -> Vec<u64> {
        self.evaluate(first_row, true)
    }

    /// The linear part of [`propagate`](RowRecurrence::propagate), which maps kernel vectors
    /// of the reduced system to kernel vectors of the full one.
    pub fn propagate_linear(&self, first_row: &[u64]) -> Vec<u64> {
        self.evaluate(first_row, false)
    }

    /// Total press count of the plan forced by `first_row`.
    pub fn cost(&self, first_row: &[u64]) -> u64 {
        self.propagate(first_row).iter().sum()
    }

    /// Maps a solution space of the reduced system to the full press plans.
    /// Propagation is injective, so basis orders carry over.
    pub fn expand(&self, solution: &ModularSolution) -> ModularSolution {
        ModularSolution {
            modulus: solution.modulus,
            particular: Array1::from(self.propagate(&solution.particular.to_vec())),
            basis: solution
                .basis
                .iter()
                .map(|v| BasisVector {
                    values: Array1::from(self.propagate_linear(&v.values.to_vec())),
                    order: v.order,
                })
                .collect(),
        }
    }

    /// [`expand`](RowRecurrence::expand) for the bit-packed representation.
    pub fn expand_binary(&self, particular: &BitVector, basis: &[BitVector]) -> (BitVector, Vec<BitVector>) {
        let full = BitVector::from_residues(&self.propagate(&particular.to_residues()));
        let basis = basis
            .iter()
            .map(|v| BitVector::from_residues(&self.propagate_linear(&v.to_residues())))
            .collect();
        (full, basis)
    }
}

#[test]
fn test_propagation_clears_board() {
    use system::{apply_plan, scramble};
    use topology::{Cross, Topology};
    let t = Cross::new(4, 5);
    for &modulus in &[2, 3, 4] {
        let presses: Vec<u64> = (0..20).map(|i| (i * i + 1) % modulus).collect();
        let board = scramble(&t, &presses, modulus);
        let rec = RowRecurrence::new(4, 5, &board, modulus);
        let (a, b) = rec.reduced_system();
        // undoing the scramble presses every cell `-presses` times
        let ring = Ring::new(modulus);
        let undo: Vec<u64> = presses.iter().map(|&p| ring.neg(p)).collect();
        let y = &undo[..5];
        assert_eq!(::system::mat_vec(&a, y, ring), b);
        let plan = rec.propagate(y);
        assert_eq!(plan, undo);
        let solved = apply_plan(&t, &board, &Board::from_cells(&t.layout(), &plan), modulus);
        assert!(solved.is_zero());
        assert_eq!(rec.cost(y), plan.iter().sum::<u64>());
    }
}

#[test]
fn test_reduced_kernel_matches_full() {
    use linalg::gf2::BinaryEliminator;
    use topology::Cross;
    // 5x5 Lights Out has nullity 2, and so has its reduced 5x5 system
    let board = Board::zeros(&[5; 5]);
    let rec = RowRecurrence::new(5, 5, &board, 2);
    let (a, b) = rec.reduced_system();
    let e = BinaryEliminator::from_matrix(&a, &b).eliminate().unwrap();
    assert_eq!(e.free_columns().len(), 2);

    let s = ::system::ToggleSystem::build(&Cross::new(5, 5), &board, 2).unwrap();
    let (_, basis) = rec.expand_binary(&e.particular_solution(), &e.nullspace_basis());
    for v in basis {
        assert!(!v.is_zero());
        assert!(s.apply(&v.to_residues()).iter().all(|&r| r == 0));
    }
}

#[test]
fn test_single_row() {
    // on one row the recurrence is the full system itself
    let board = Board::new(vec![vec![1, 0, 1]]);
    let rec = RowRecurrence::new(1, 3, &board, 3);
    let (a, b) = rec.reduced_system();
    assert_eq!(a, ndarray::arr2(&[[1, 1, 0], [1, 1, 1], [0, 1, 1]]));
    assert_eq!(b, ndarray::arr1(&[2, 0, 2]));
}
