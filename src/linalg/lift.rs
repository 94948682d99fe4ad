//! Solving over Z/N by factoring N into prime powers, solving over GF(p) and lifting.
//!
//! A solution `x` of `a x = b (mod p^k)` is corrected to one modulo `p^(k+1)` by solving
//! `a d = (b - a x) / p^k (mod p)` and setting `x += p^k d`. The GF(p) echelon form is
//! computed once and reused for every correction of the particular solution and the
//! kernel basis.

use ndarray::{Array1, Array2};

use linalg::zp_solve::FieldEchelon;
use linalg::{crt, local};
use linalg::{BasisVector, Fallback, LinearSolverError, ModularSolution, Unsolvable};
use ring::{self, Ring};
use system::mat_vec;

/// The solution space of the system modulo one prime power `prime^exponent` of N.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PrimePowerComponent {
    pub prime: u64,
    pub exponent: u32,
    pub solution: ModularSolution,
    /// Set when lifting failed and the exact Z/p^e solver was used instead.
    pub fallback: Option<Fallback>,
}

impl PrimePowerComponent {
    pub fn modulus(&self) -> u64 {
        self.prime.pow(self.exponent)
    }
}

/// Lifts `x` with `a x = b (mod p)` to a solution modulo `p^e`.
pub fn hensel_lift(
    a: &Array2<u64>,
    b: &Array1<u64>,
    field: &FieldEchelon,
    x: Array1<u64>,
    e: u32,
) -> Result<Array1<u64>, LinearSolverError> {
    let p = field.prime();
    let mut x = x;
    let mut pk = p;
    for level in 1..e {
        let ring = Ring::new(pk * p);
        let ax = mat_vec(a, &x.to_vec(), ring);
        let residual: Array1<u64> = b
            .iter()
            .zip(ax.iter())
            .map(|(&b, &ax)| ring.sub(ring.reduce(b), ax))
            .collect();
        debug_assert!(residual.iter().all(|r| r % pk == 0));
        trace!(
            "Lifting to {}^{}: residual weight {}",
            p,
            level + 1,
            residual.iter().filter(|&&r| r != 0).count()
        );

        let quotient = residual.mapv(|r| r / pk);
        let d = field
            .solve(&quotient)
            .map_err(|_| LinearSolverError::LiftFailed { level })?;
        x = x
            .iter()
            .zip(d.iter())
            .map(|(&x, &d)| ring.add(x, ring.mul(pk, d)))
            .collect();
        pk *= p;
    }
    Ok(x)
}

fn failed_level(err: LinearSolverError) -> u32 {
    match err {
        LinearSolverError::LiftFailed { level } => level,
        LinearSolverError::Inconsistent => 0,
    }
}

/// Solves `a x = b` modulo `p^e`.
pub fn solve_component(
    a: &Array2<u64>,
    b: &Array1<u64>,
    p: u64,
    e: u32,
) -> Result<PrimePowerComponent, Unsolvable> {
    let q = p.pow(e);
    let field = FieldEchelon::new(a, p);
    debug!(
        "Component {}^{}: rank {} over GF({}), {} free",
        p,
        e,
        field.rank(),
        p,
        field.free_columns().len()
    );

    let x0 = field.solve(b).map_err(|_| {
        debug!("Inconsistent over GF({})", p);
        Unsolvable::Field { prime: p }
    })?;

    let exact = |fallback: Fallback| -> Result<PrimePowerComponent, Unsolvable> {
        debug!("Falling back to exact elimination over Z/{}: {:?}", q, fallback);
        match local::solve(a, b, p, e) {
            Ok(solution) => Ok(PrimePowerComponent {
                prime: p,
                exponent: e,
                solution,
                fallback: Some(fallback),
            }),
            Err(_) => Err(Unsolvable::PrimePower { prime: p, exponent: e }),
        }
    };

    let particular = match hensel_lift(a, b, &field, x0, e) {
        Ok(x) => x,
        Err(err) => {
            return exact(Fallback::Particular {
                prime: p,
                level: failed_level(err),
            })
        }
    };

    let zero = Array1::zeros(b.len());
    let mut basis = Vec::with_capacity(field.free_columns().len());
    for v in field.nullspace() {
        match hensel_lift(a, &zero, &field, v, e) {
            Ok(values) => basis.push(BasisVector { values, order: q }),
            Err(err) => {
                let level = failed_level(err);
                debug!(
                    "Kernel vector does not lift past {}^{}: recomputing the kernel over Z/{}",
                    p, level, q
                );
                return Ok(PrimePowerComponent {
                    prime: p,
                    exponent: e,
                    solution: ModularSolution {
                        modulus: q,
                        particular,
                        basis: local::nullspace(a, p, e),
                    },
                    fallback: Some(Fallback::Basis { prime: p, level }),
                });
            }
        }
    }

    Ok(PrimePowerComponent {
        prime: p,
        exponent: e,
        solution: ModularSolution {
            modulus: q,
            particular,
            basis,
        },
        fallback: None,
    })
}

/// Solves `a x = b (mod modulus)` for every prime power of the modulus and combines
/// the components.
pub fn solve_modular(
    a: &Array2<u64>,
    b: &Array1<u64>,
    modulus: u64,
) -> Result<(ModularSolution, Vec<PrimePowerComponent>), Unsolvable> {
    assert!(modulus > 1);
    let components = ring::factorize(modulus)
        .into_iter()
        .map(|(p, e)| solve_component(a, b, p, e))
        .collect::<Result<Vec<_>, _>>()?;
    let combined = crt::combine(components.iter().map(|c| &c.solution));
    debug_assert_eq!(combined.modulus, modulus);
    debug!(
        "Solution space over Z/{}: {} generators, {} combinations",
        modulus,
        combined.basis.len(),
        combined.combinations()
    );
    Ok((combined, components))
}

#[cfg(test)]
fn assert_solves(a: &Array2<u64>, b: &Array1<u64>, s: &ModularSolution) {
    let ring = Ring::new(s.modulus);
    let b = b.mapv(|v| ring.reduce(v));
    assert_eq!(mat_vec(a, &s.particular.to_vec(), ring), b);
    for v in &s.basis {
        assert!(mat_vec(a, &v.values.to_vec(), ring).iter().all(|&r| r == 0));
    }
}

#[test]
fn test_lift_unit_determinant() {
    use ndarray::{arr1, arr2};
    let a = arr2(&[[1, 1, 0], [1, 1, 1], [0, 1, 1]]);
    let b = arr1(&[5, 2, 7]);
    let c = solve_component(&a, &b, 2, 3).unwrap();
    assert_eq!(c.fallback, None);
    assert!(c.solution.basis.is_empty());
    assert_solves(&a, &b, &c.solution);
}

#[test]
fn test_lift_kernel() {
    use topology::Cross;
    // 5x5 Lights Out has a two-dimensional kernel over GF(2)
    let ring = Ring::new(4);
    let a = ::system::press_matrix(&Cross::new(5, 5), ring).unwrap();
    let presses: Vec<u64> = (0..25).map(|i| (i * 7 % 4) as u64).collect();
    let b = mat_vec(&a, &presses, ring);
    let (s, components) = solve_modular(&a, &b, 4).unwrap_or_else(|e| panic!("{}", e));
    assert_eq!(components.len(), 1);
    assert_solves(&a, &b, &s);
    assert!(s.basis.iter().all(|v| v.order == 4 || components[0].fallback.is_some()));
}

#[test]
fn test_particular_fallback() {
    use ndarray::{arr1, arr2};
    // x + y = 1, x + y = 3 is consistent mod 2 but not mod 4
    let a = arr2(&[[1, 1], [1, 1]]);
    assert_eq!(
        solve_component(&a, &arr1(&[1, 3]), 2, 2).err(),
        Some(Unsolvable::PrimePower { prime: 2, exponent: 2 })
    );
    assert_eq!(
        solve_component(&a, &arr1(&[1, 0]), 2, 2).err(),
        Some(Unsolvable::Field { prime: 2 })
    );
}

#[test]
fn test_basis_fallback() {
    use ndarray::{arr1, arr2};
    // 2 x = 0 (mod 4): GF(2) sees a free variable, but it has order 2 mod 4
    let a = arr2(&[[2]]);
    let b = arr1(&[0]);
    let c = solve_component(&a, &b, 2, 2).unwrap();
    assert_eq!(c.fallback, Some(Fallback::Basis { prime: 2, level: 1 }));
    assert_eq!(c.solution.basis.len(), 1);
    assert_eq!(c.solution.basis[0].order, 2);
    assert_solves(&a, &b, &c.solution);
}

#[test]
fn test_solve_modular_composite() {
    use ndarray::{arr1, arr2};
    let a = arr2(&[[1, 1, 1, 0], [1, 1, 0, 1], [1, 0, 1, 1], [0, 1, 1, 1]]);
    // the all-ones vector spans the kernel mod 3, so b must sum to zero mod 3
    let b = arr1(&[3, 0, 5, 10]);
    let (s, components) = solve_modular(&a, &b, 12).unwrap();
    assert_eq!(components.len(), 2);
    assert_eq!(s.modulus, 12);
    assert_solves(&a, &b, &s);
    for c in &components {
        let m = c.modulus();
        assert_eq!(s.particular.mapv(|x| x % m), c.solution.particular);
    }
    assert_eq!(s.basis.len(), 1);
    assert_eq!(s.basis[0].order, 3);
}
