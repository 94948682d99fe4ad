//! Linear solver in Zp.
//!
//! The matrix is brought to reduced row echelon form once, keeping track of the row
//! operations, so that the many right-hand sides met while lifting are solved by a
//! single matrix-vector product.

use ndarray::{s, Array1, Array2, ArrayBase, Data, Ix1, Ix2};

use linalg::LinearSolverError;
use ring;

/// Reduced row echelon form of `a` over GF(p).
#[derive(Debug, Clone)]
pub struct FieldEchelon {
    prime: u64,
    /// Reduced form `R = T a`.
    reduced: Array2<u64>,
    /// Accumulated row operations `T`.
    transform: Array2<u64>,
    pivots: Vec<usize>,
}

impl FieldEchelon {
    pub fn new<S: Data<Elem = u64>>(a: &ArrayBase<S, Ix2>, p: u64) -> FieldEchelon {
        let (neqs, nvars) = a.dim();
        let width = nvars + neqs;

        // Create the augmented matrix [a | I].
        let mut m = Array2::<u64>::zeros((neqs, width));
        for ((i, j), &e) in a.indexed_iter() {
            m[(i, j)] = e % p;
        }
        for i in 0..neqs {
            m[(i, nvars + i)] = 1 % p;
        }

        let mut pivots = vec![];
        let mut row = 0;
        for col in 0..nvars {
            if row == neqs {
                break;
            }
            // Select a non-zero pivot.
            let pivot = match (row..neqs).find(|&k| m[(k, col)] != 0) {
                Some(k) => k,
                None => continue,
            };
            if pivot != row {
                // Swap, skipping the leading columns which are zero in both rows.
                for l in col..width {
                    m.swap((row, l), (pivot, l));
                }
            }

            let inv_x = ring::inv(m[(row, col)], p);
            if inv_x != 1 {
                for l in col..width {
                    m[(row, l)] = ring::mul(m[(row, l)], inv_x, p);
                }
            }
            for k in 0..neqs {
                if k != row && m[(k, col)] != 0 {
                    let s = m[(k, col)];
                    for l in col..width {
                        m[(k, l)] = ring::sub(m[(k, l)], ring::mul(m[(row, l)], s, p), p);
                    }
                }
            }
            pivots.push(col);
            row += 1;
        }

        let reduced = m.slice(s![.., ..nvars]).to_owned();
        let transform = m.slice(s![.., nvars..]).to_owned();
        FieldEchelon {
            prime: p,
            reduced,
            transform,
            pivots,
        }
    }

    pub fn prime(&self) -> u64 {
        self.prime
    }

    pub fn rank(&self) -> usize {
        self.pivots.len()
    }

    pub fn free_columns(&self) -> Vec<usize> {
        let mut pivots = self.pivots.iter().peekable();
        (0..self.reduced.ncols())
            .filter(|&c| {
                if pivots.peek() == Some(&&c) {
                    pivots.next();
                    false
                } else {
                    true
                }
            })
            .collect()
    }

    /// Solves `a x = b` with every free variable set to zero.
    pub fn solve<S: Data<Elem = u64>>(&self, b: &ArrayBase<S, Ix1>) -> Result<Array1<u64>, LinearSolverError> {
        let p = self.prime;
        assert_eq!(self.transform.ncols(), b.len());
        let c = self
            .transform
            .outer_iter()
            .map(|row| {
                row.iter()
                    .zip(b.iter())
                    .fold(0, |acc, (&t, &v)| ring::add(acc, ring::mul(t, v % p, p), p))
            })
            .collect::<Vec<_>>();

        // Check the consistency.
        if c[self.rank()..].iter().any(|&v| v != 0) {
            return Err(LinearSolverError::Inconsistent);
        }

        let mut x = Array1::zeros(self.reduced.ncols());
        for (i, &col) in self.pivots.iter().enumerate() {
            x[col] = c[i];
        }
        Ok(x)
    }

    /// A kernel basis with one vector per free column.
    pub fn nullspace(&self) -> Vec<Array1<u64>> {
        let p = self.prime;
        self.free_columns()
            .into_iter()
            .map(|f| {
                let mut v = Array1::zeros(self.reduced.ncols());
                v[f] = 1;
                for (i, &col) in self.pivots.iter().enumerate() {
                    v[col] = ring::neg(self.reduced[(i, f)], p);
                }
                v
            })
            .collect()
    }
}

#[cfg(test)]
fn is_kernel_vector(a: &Array2<u64>, v: &Array1<u64>, p: u64) -> bool {
    ::system::mat_vec(a, &v.to_vec(), ring::Ring::new(p))
        .iter()
        .all(|&r| r == 0)
}

#[test]
fn test_solve() {
    use ndarray::{arr1, arr2};
    let a = arr2(&[[1, 1, 2], [3, 4, 3], [16, 5, 5]]);
    let b = arr1(&[3, 15, 8]);
    let r = FieldEchelon::new(&a, 17).solve(&b).unwrap();
    assert_eq!(r, arr1(&[2, 3, 16]));
}

#[test]
#[should_panic]
fn test_solve_bad_shape() {
    use ndarray::{arr1, arr2};
    let a = arr2(&[[1, 1, 2], [3, 4, 3], [16, 5, 5]]);
    let b = arr1(&[3, 15, 8, 1]);
    let _ = FieldEchelon::new(&a, 17).solve(&b);
}

#[test]
fn test_solve_underdetermined() {
    use ndarray::{arr1, arr2};
    let a = arr2(&[[1, 1, 2], [3, 4, 3]]);
    let b = arr1(&[3, 15]);
    let e = FieldEchelon::new(&a, 17);
    assert_eq!(e.rank(), 2);
    assert_eq!(e.free_columns(), vec![2]);
    let x = e.solve(&b).unwrap();
    assert_eq!(x[2], 0);
    assert_eq!(::system::mat_vec(&a, &x.to_vec(), ring::Ring::new(17)), b);
    let kernel = e.nullspace();
    assert_eq!(kernel.len(), 1);
    assert!(is_kernel_vector(&a, &kernel[0], 17));
}

#[test]
fn test_solve_rank_deficient() {
    use ndarray::{arr1, arr2};
    // third row is 3 * first + 1 * second mod 17
    let a = arr2(&[[1, 1, 2], [3, 4, 3], [6, 7, 9]]);
    let e = FieldEchelon::new(&a, 17);
    assert_eq!(e.rank(), 2);
    for v in e.nullspace() {
        assert!(is_kernel_vector(&a, &v, 17));
    }
    assert!(e.solve(&arr1(&[3, 15, 7])).is_ok());
    assert_eq!(e.solve(&arr1(&[3, 15, 8])), Err(LinearSolverError::Inconsistent));
}

#[test]
fn test_solve_overdetermined() {
    use ndarray::{arr1, arr2};
    let a = arr2(&[[1, 1, 2], [3, 4, 3], [9, 0, 11], [1, 1, 7], [2, 3, 8]]);
    let b = arr1(&[3, 15, 7, 6, 6]);
    let r = FieldEchelon::new(&a, 17).solve(&b).unwrap();
    assert_eq!(r, arr1(&[11, 1, 4]));
}

#[test]
fn test_solve_inconsistent() {
    use ndarray::{arr1, arr2};
    let a = arr2(&[[1, 1, 2], [3, 4, 3], [16, 5, 5], [14, 2, 4]]);
    let b = arr1(&[3, 15, 8, 3]);
    let r = FieldEchelon::new(&a, 17).solve(&b);
    assert_eq!(r, Err(LinearSolverError::Inconsistent));
}
