//! Combination of prime-power solution spaces by the Chinese remainder theorem.

use ndarray::Array1;

use linalg::{BasisVector, ModularSolution};
use ring;

/// Merges solution spaces over pairwise coprime moduli into one over their product.
///
/// The particular solutions are merged coordinate-wise. A basis vector of one component
/// is padded with zero modulo every other component, which keeps its additive order.
pub fn combine<'a, I: IntoIterator<Item = &'a ModularSolution>>(parts: I) -> ModularSolution {
    let parts: Vec<&ModularSolution> = parts.into_iter().collect();
    assert!(!parts.is_empty(), "nothing to combine");
    if parts.len() == 1 {
        return parts[0].clone();
    }

    let n = parts[0].particular.len();
    assert!(parts.iter().all(|s| s.particular.len() == n));
    let modulus = parts.iter().fold(1u64, |acc, s| acc * s.modulus);

    let mut particular = Array1::zeros(n);
    for i in 0..n {
        let (value, _) = parts.iter().fold((0u64, 1u64), |(acc, m), s| {
            (
                ring::chinese_remainder(acc, m, s.particular[i], s.modulus),
                m * s.modulus,
            )
        });
        particular[i] = value;
    }

    let mut basis = vec![];
    for (index, part) in parts.iter().enumerate() {
        for v in &part.basis {
            let values = v.values.mapv(|x| {
                parts.iter().enumerate().fold((0u64, 1u64), |(acc, m), (j, s)| {
                    let residue = if j == index { x } else { 0 };
                    (ring::chinese_remainder(acc, m, residue, s.modulus), m * s.modulus)
                })
                .0
            });
            basis.push(BasisVector {
                values,
                order: v.order,
            });
        }
    }

    debug!(
        "Combined {} components into Z/{} with {} basis vectors",
        parts.len(),
        modulus,
        basis.len()
    );
    ModularSolution {
        modulus,
        particular,
        basis,
    }
}

#[test]
fn test_combine() {
    use ndarray::arr1;
    let m4 = ModularSolution {
        modulus: 4,
        particular: arr1(&[1, 3]),
        basis: vec![BasisVector {
            values: arr1(&[2, 0]),
            order: 2,
        }],
    };
    let m3 = ModularSolution {
        modulus: 3,
        particular: arr1(&[2, 0]),
        basis: vec![BasisVector {
            values: arr1(&[1, 1]),
            order: 3,
        }],
    };
    let s = combine(vec![&m4, &m3]);
    assert_eq!(s.modulus, 12);
    assert_eq!(s.particular, arr1(&[5, 3]));
    assert_eq!(s.basis.len(), 2);
    assert_eq!(s.basis[0].values, arr1(&[6, 0]));
    assert_eq!(s.basis[0].order, 2);
    assert_eq!(s.basis[1].values, arr1(&[4, 4]));
    assert_eq!(s.basis[1].order, 3);
    assert_eq!(s.combinations(), 6);
}

#[test]
fn test_combine_single() {
    use ndarray::arr1;
    let m5 = ModularSolution {
        modulus: 5,
        particular: arr1(&[4]),
        basis: vec![],
    };
    assert_eq!(combine(&[m5.clone()]), m5);
}
