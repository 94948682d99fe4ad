//! Bit-packed Gaussian elimination over GF(2).
//!
//! Every row is stored as an array of 64-bit words, bit `k` holding the coefficient of
//! variable `k`; right-hand sides live in a separate bit vector that is swapped in lock-step.

use ndarray::{Array1, Array2};

use linalg::LinearSolverError;

pub const WORD_BITS: usize = 64;

#[inline]
fn words_for(bits: usize) -> usize {
    (bits + WORD_BITS - 1) / WORD_BITS
}

/// Mask of the bits strictly above `bit` within a word.
#[inline]
fn high_mask(bit: usize) -> u64 {
    if bit + 1 == WORD_BITS {
        0
    } else {
        !0u64 << (bit + 1)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct BitVector {
    words: Vec<u64>,
    len: usize,
}

impl BitVector {
    pub fn zeros(len: usize) -> BitVector {
        BitVector {
            words: vec![0; words_for(len)],
            len,
        }
    }

    /// Packs the parities of `values`.
    pub fn from_residues(values: &[u64]) -> BitVector {
        let mut v = BitVector::zeros(values.len());
        for (i, &x) in values.iter().enumerate() {
            if x & 1 == 1 {
                v.set(i, true);
            }
        }
        v
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn get(&self, i: usize) -> bool {
        debug_assert!(i < self.len);
        (self.words[i / WORD_BITS] >> (i % WORD_BITS)) & 1 == 1
    }

    #[inline]
    pub fn set(&mut self, i: usize, value: bool) {
        debug_assert!(i < self.len);
        let mask = 1u64 << (i % WORD_BITS);
        if value {
            self.words[i / WORD_BITS] |= mask;
        } else {
            self.words[i / WORD_BITS] &= !mask;
        }
    }

    #[inline]
    pub fn flip(&mut self, i: usize) {
        debug_assert!(i < self.len);
        self.words[i / WORD_BITS] ^= 1u64 << (i % WORD_BITS);
    }

    fn swap(&mut self, i: usize, j: usize) {
        let (a, b) = (self.get(i), self.get(j));
        self.set(i, b);
        self.set(j, a);
    }

    pub fn xor_assign(&mut self, other: &BitVector) {
        assert_eq!(self.len, other.len);
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a ^= *b;
        }
    }

    /// Hamming weight.
    pub fn count_ones(&self) -> u64 {
        self.words.iter().map(|w| u64::from(w.count_ones())).sum()
    }

    pub fn is_zero(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    pub fn to_residues(&self) -> Vec<u64> {
        (0..self.len).map(|i| self.get(i) as u64).collect()
    }
}

/// Forward elimination state for `A x = b` over GF(2).
#[derive(Debug, Clone)]
pub struct BinaryEliminator {
    rows: Vec<Vec<u64>>,
    rhs: BitVector,
    vars: usize,
    words: usize,
}

impl BinaryEliminator {
    pub fn new(rows: Vec<BitVector>, rhs: BitVector) -> BinaryEliminator {
        assert_eq!(rows.len(), rhs.len());
        let vars = rows.first().map(|r| r.len()).unwrap_or(0);
        assert!(rows.iter().all(|r| r.len() == vars), "rows differ in length");
        BinaryEliminator {
            rows: rows.into_iter().map(|r| r.words).collect(),
            rhs,
            vars,
            words: words_for(vars),
        }
    }

    /// Packs the parities of a dense matrix and right-hand side.
    pub fn from_matrix(a: &Array2<u64>, b: &Array1<u64>) -> BinaryEliminator {
        assert_eq!(a.nrows(), b.len());
        let rows = a
            .outer_iter()
            .map(|row| BitVector::from_residues(&row.to_vec()))
            .collect();
        let mut e = BinaryEliminator::new(rows, BitVector::from_residues(&b.to_vec()));
        e.vars = a.ncols();
        e.words = words_for(e.vars);
        e
    }

    /// Row-reduces the system into echelon form.
    pub fn eliminate(mut self) -> Result<BinaryEchelon, LinearSolverError> {
        let nrows = self.rows.len();
        let mut pivot_cols = vec![];
        let mut pivot_row_for_col = vec![None; self.vars];

        let mut row = 0;
        for col in 0..self.vars {
            if row == nrows {
                break;
            }
            let w = col / WORD_BITS;
            let mask = 1u64 << (col % WORD_BITS);
            let pivot = match (row..nrows).find(|&r| self.rows[r][w] & mask != 0) {
                Some(p) => p,
                None => continue,
            };
            if pivot != row {
                self.rows.swap(row, pivot);
                self.rhs.swap(row, pivot);
            }
            pivot_cols.push(col);
            pivot_row_for_col[col] = Some(row);

            // everything before word w is already zero in the rows below
            let (head, tail) = self.rows.split_at_mut(row + 1);
            let prow = &head[row];
            let prhs = self.rhs.get(row);
            for (offset, r) in tail.iter_mut().enumerate() {
                if r[w] & mask != 0 {
                    for (a, b) in r[w..].iter_mut().zip(&prow[w..]) {
                        *a ^= *b;
                    }
                    if prhs {
                        self.rhs.flip(row + 1 + offset);
                    }
                }
            }
            row += 1;
        }

        let rank = row;
        for r in rank..nrows {
            if self.rhs.get(r) && self.rows[r].iter().all(|&w| w == 0) {
                debug!("Inconsistent GF(2) system: row {} reads 0 = 1", r);
                return Err(LinearSolverError::Inconsistent);
            }
        }

        debug!(
            "GF(2) elimination: {} variables, rank {}, {} free",
            self.vars,
            rank,
            self.vars - rank
        );

        Ok(BinaryEchelon {
            rows: self.rows,
            rhs: self.rhs,
            rank,
            pivot_cols,
            pivot_row_for_col,
            vars: self.vars,
            words: self.words,
        })
    }
}

/// A consistent GF(2) system in row echelon form.
#[derive(Debug, Clone)]
pub struct BinaryEchelon {
    rows: Vec<Vec<u64>>,
    rhs: BitVector,
    rank: usize,
    pivot_cols: Vec<usize>,
    pivot_row_for_col: Vec<Option<usize>>,
    vars: usize,
    words: usize,
}

impl BinaryEchelon {
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn variables(&self) -> usize {
        self.vars
    }

    pub fn free_columns(&self) -> Vec<usize> {
        (0..self.vars)
            .filter(|&c| self.pivot_row_for_col[c].is_none())
            .collect()
    }

    /// Fills in the pivot variables of `x` from its free variables, walking the pivot
    /// rows bottom-up. With `with_rhs == false` this solves the homogeneous system.
    pub fn back_substitute(&self, x: &mut BitVector, with_rhs: bool) {
        assert_eq!(x.len(), self.vars);
        for prow in (0..self.rank).rev() {
            let pcol = self.pivot_cols[prow];
            let w = pcol / WORD_BITS;
            let row = &self.rows[prow];

            let mut acc = row[w] & high_mask(pcol % WORD_BITS) & x.words[w];
            for ww in w + 1..self.words {
                acc ^= row[ww] & x.words[ww];
            }
            let parity = (acc.count_ones() & 1 == 1) ^ (with_rhs && self.rhs.get(prow));
            x.set(pcol, parity);
        }
    }

    /// The solution with every free variable set to zero.
    pub fn particular_solution(&self) -> BitVector {
        let mut x = BitVector::zeros(self.vars);
        self.back_substitute(&mut x, true);
        x
    }

    /// One kernel vector per free column `f`: bit `f` set, pivots back-substituted.
    pub fn nullspace_basis(&self) -> Vec<BitVector> {
        self.free_columns()
            .into_iter()
            .map(|f| {
                let mut v = BitVector::zeros(self.vars);
                v.set(f, true);
                self.back_substitute(&mut v, false);
                v
            })
            .collect()
    }
}

#[cfg(test)]
fn cross_system(rows: usize, cols: usize, lit: &[usize]) -> ::system::ToggleSystem {
    use board::Board;
    use topology::{Cross, Topology};
    let t = Cross::new(rows, cols);
    let mut cells = vec![0; t.cell_count()];
    for &i in lit {
        cells[i] = 1;
    }
    ::system::ToggleSystem::build(&t, &Board::from_cells(&t.layout(), &cells), 2).unwrap()
}

#[test]
fn test_bitvector() {
    let mut v = BitVector::zeros(130);
    assert_eq!(v.words.len(), 3);
    v.set(0, true);
    v.set(64, true);
    v.set(129, true);
    assert_eq!(v.count_ones(), 3);
    v.flip(64);
    assert!(!v.get(64));
    let w = BitVector::from_residues(&[1, 0, 3, 2]);
    assert_eq!(w.to_residues(), vec![1, 0, 1, 0]);
    assert_eq!(high_mask(63), 0);
    assert_eq!(high_mask(0), !1u64);
}

#[test]
fn test_unique_solution() {
    let s = cross_system(3, 3, &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
    let e = BinaryEliminator::from_matrix(&s.a, &s.b).eliminate().unwrap();
    assert_eq!(e.rank(), 9);
    assert!(e.free_columns().is_empty());
    let x = e.particular_solution();
    assert!(s.is_solution(&x.to_residues()));
}

#[test]
fn test_nullspace_in_kernel() {
    for &(n, nullity) in &[(4, 4), (5, 2), (9, 8)] {
        let s = cross_system(n, n, &[]);
        let e = BinaryEliminator::from_matrix(&s.a, &s.b)
            .eliminate()
            .unwrap();
        let basis = e.nullspace_basis();
        assert_eq!(basis.len(), nullity);
        for v in &basis {
            assert!(!v.is_zero());
            assert!(s.apply(&v.to_residues()).iter().all(|&r| r == 0));
        }
    }
}

#[test]
fn test_particular_plus_kernel() {
    // a solvable 5x5 board: the image of a few presses
    let t = ::topology::Cross::new(5, 5);
    let mut presses = vec![0; 25];
    for &i in &[0, 6, 12, 24, 13, 3] {
        presses[i] = 1;
    }
    let board = ::system::scramble(&t, &presses, 2);
    let s = ::system::ToggleSystem::build(&t, &board, 2).unwrap();
    let e = BinaryEliminator::from_matrix(&s.a, &s.b).eliminate().unwrap();
    let mut x = e.particular_solution();
    assert!(s.is_solution(&x.to_residues()));
    for v in e.nullspace_basis() {
        x.xor_assign(&v);
        assert!(s.is_solution(&x.to_residues()));
    }
}

#[test]
fn test_inconsistent() {
    // on a 1x2 strip every press toggles both cells
    let s = cross_system(1, 2, &[0]);
    let r = BinaryEliminator::from_matrix(&s.a, &s.b).eliminate();
    assert_eq!(r.err(), Some(LinearSolverError::Inconsistent));

    let rows = vec![BitVector::from_residues(&[1, 1]), BitVector::from_residues(&[1, 1])];
    let r = BinaryEliminator::new(rows, BitVector::from_residues(&[1, 0])).eliminate();
    assert_eq!(r.err(), Some(LinearSolverError::Inconsistent));
}
