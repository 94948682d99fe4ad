//! Exact solving over the local ring Z/p^e.
//!
//! Every ideal of Z/p^e is generated by a power of p, so full pivoting on the entry of
//! least p-adic valuation diagonalizes the matrix: `P a V = diag(p^k_0, .., p^k_(r-1), 0, ..)`
//! with `P` and `V` invertible. Row operations are applied to the right-hand side as they
//! happen and column operations are accumulated in `V`.

use ndarray::{Array1, Array2, ArrayBase, Data, Ix1, Ix2};

use linalg::{BasisVector, LinearSolverError, ModularSolution};
use ring::{self, Ring};

/// Solves `a x = b (mod p^e)` and returns a generating set of the kernel.
pub fn solve<S1: Data<Elem = u64>, S2: Data<Elem = u64>>(
    a: &ArrayBase<S1, Ix2>,
    b: &ArrayBase<S2, Ix1>,
    p: u64,
    e: u32,
) -> Result<ModularSolution, LinearSolverError> {
    assert_eq!(a.nrows(), b.len());
    assert!(e > 0);
    let q = p.pow(e);
    let ring = Ring::new(q);
    let (neqs, nvars) = a.dim();

    let mut m = a.mapv(|x| ring.reduce(x));
    let mut rhs = b.mapv(|x| ring.reduce(x));
    let mut v = Array2::<u64>::eye(nvars);
    let mut shifts = vec![];

    for t in 0..neqs.min(nvars) {
        // Full pivoting: the entry with the smallest valuation.
        let mut best: Option<(usize, usize, u32)> = None;
        'search: for i in t..neqs {
            for j in t..nvars {
                let k = ring::valuation(m[(i, j)], p, e);
                if k < e && best.map_or(true, |(_, _, bk)| k < bk) {
                    best = Some((i, j, k));
                    if k == 0 {
                        break 'search;
                    }
                }
            }
        }
        let (pi, pj, k) = match best {
            Some(b) => b,
            None => break,
        };

        if pi != t {
            for l in 0..nvars {
                m.swap((t, l), (pi, l));
            }
            rhs.swap(t, pi);
        }
        if pj != t {
            for l in 0..neqs {
                m.swap((l, t), (l, pj));
            }
            for l in 0..nvars {
                v.swap((l, t), (l, pj));
            }
        }

        // Normalize the pivot to p^k.
        let pk = p.pow(k);
        let unit = m[(t, t)] / pk;
        let inv = ring::inv(unit, q);
        for l in t..nvars {
            m[(t, l)] = ring.mul(m[(t, l)], inv);
        }
        rhs[t] = ring.mul(rhs[t], inv);
        debug_assert_eq!(m[(t, t)], pk);

        // Clear the pivot column below, every entry being divisible by p^k.
        for i in t + 1..neqs {
            if m[(i, t)] != 0 {
                let f = m[(i, t)] / pk;
                for l in t..nvars {
                    m[(i, l)] = ring.sub(m[(i, l)], ring.mul(f, m[(t, l)]));
                }
                rhs[i] = ring.sub(rhs[i], ring.mul(f, rhs[t]));
            }
        }
        // Clear the pivot row. Only row t changes in `m` since its column is now zero
        // below the pivot.
        for j in t + 1..nvars {
            if m[(t, j)] != 0 {
                let g = m[(t, j)] / pk;
                m[(t, j)] = 0;
                for l in 0..nvars {
                    v[(l, j)] = ring.sub(v[(l, j)], ring.mul(g, v[(l, t)]));
                }
            }
        }
        shifts.push(k);
    }

    let rank = shifts.len();
    trace!("Z/{}^{} diagonal: {:?}", p, e, shifts);

    if rhs.iter().skip(rank).any(|&x| x != 0) {
        return Err(LinearSolverError::Inconsistent);
    }
    let mut y = Array1::<u64>::zeros(nvars);
    for (t, &k) in shifts.iter().enumerate() {
        let pk = p.pow(k);
        if rhs[t] % pk != 0 {
            return Err(LinearSolverError::Inconsistent);
        }
        y[t] = rhs[t] / pk;
    }

    let to_x = |y: &Array1<u64>| ::system::mat_vec(&v, &y.to_vec(), ring);

    // Generators of the kernel of the diagonal form: `p^(e-k) e_t` of order p^k for the
    // non-unit pivots, and `e_j` of order p^e for the zero columns.
    let mut basis = vec![];
    for (t, &k) in shifts.iter().enumerate() {
        if k > 0 {
            let mut g = Array1::zeros(nvars);
            g[t] = p.pow(e - k);
            basis.push(BasisVector {
                values: to_x(&g),
                order: p.pow(k),
            });
        }
    }
    for j in rank..nvars {
        let mut g = Array1::zeros(nvars);
        g[j] = 1;
        basis.push(BasisVector {
            values: to_x(&g),
            order: q,
        });
    }

    Ok(ModularSolution {
        modulus: q,
        particular: to_x(&y),
        basis,
    })
}

/// Generators of the kernel of `a` over Z/p^e.
pub fn nullspace<S: Data<Elem = u64>>(a: &ArrayBase<S, Ix2>, p: u64, e: u32) -> Vec<BasisVector> {
    let zero = Array1::zeros(a.nrows());
    // the homogeneous system is always consistent
    solve(a, &zero, p, e).map(|s| s.basis).unwrap_or_default()
}

#[cfg(test)]
fn check(a: &Array2<u64>, s: &ModularSolution, b: &Array1<u64>) {
    let ring = Ring::new(s.modulus);
    assert_eq!(::system::mat_vec(a, &s.particular.to_vec(), ring), *b);
    for v in &s.basis {
        assert!(::system::mat_vec(a, &v.values.to_vec(), ring)
            .iter()
            .all(|&r| r == 0));
        assert!(v.values.iter().all(|&x| ring.mul(x, ring.reduce(v.order)) == 0));
    }
}

#[test]
fn test_unit_pivots() {
    use ndarray::{arr1, arr2};
    let a = arr2(&[[1, 2], [3, 5]]);
    let b = arr1(&[4, 6]);
    let s = solve(&a, &b, 2, 3).unwrap();
    assert!(s.basis.is_empty());
    check(&a, &s, &b);
}

#[test]
fn test_torsion_kernel() {
    use ndarray::{arr1, arr2};
    // 2 x = 2 (mod 4): x = 1 or 3
    let a = arr2(&[[2]]);
    let s = solve(&a, &arr1(&[2]), 2, 2).unwrap();
    assert_eq!(s.particular, arr1(&[1]));
    assert_eq!(s.basis.len(), 1);
    assert_eq!(s.basis[0].order, 2);
    assert_eq!(s.basis[0].values, arr1(&[2]));
    check(&a, &s, &arr1(&[2]));

    assert_eq!(
        solve(&a, &arr1(&[1]), 2, 2).err(),
        Some(LinearSolverError::Inconsistent)
    );
}

#[test]
fn test_mixed_valuations() {
    use ndarray::{arr1, arr2};
    // mod 9, the rows are independent mod 3 only after scaling
    let a = arr2(&[[3, 6, 0], [6, 3, 3], [0, 0, 0]]);
    let b = arr1(&[3, 6, 0]);
    let s = solve(&a, &b, 3, 2).unwrap();
    check(&a, &s, &b);
    // kernel size: free column gives 9, each of the two 3-pivots gives 3
    let size: u64 = s.basis.iter().map(|v| v.order).product();
    assert_eq!(size, 81);

    assert_eq!(
        solve(&a, &arr1(&[3, 6, 1]), 3, 2).err(),
        Some(LinearSolverError::Inconsistent)
    );
    assert_eq!(nullspace(&a, 3, 2).len(), s.basis.len());
}
