//! Minimum-weight search over an affine solution space `x0 + span(v_1, .., v_k)`.
//!
//! Coefficient vectors are enumerated by a mixed-radix odometer whose digit `i` runs over
//! `0..order(v_i)`. Incrementing the odometer bumps every changed digit by one, wrapping
//! digits included (`order * v_i = 0`), so each step only adds a few basis vectors to the
//! current candidate. The odometer can start at any index, which is how the exhaustive
//! search is split over worker threads.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use linalg::gf2::BitVector;
use linalg::ModularSolution;
use ring::Ring;

/// A solution space whose members can be weighed.
pub trait SolutionSpace: Sync {
    type Candidate: Clone + Send;

    /// Number of basis vectors.
    fn dimension(&self) -> usize;

    /// Additive order of basis vector `i`.
    fn order(&self, i: usize) -> u64;

    /// The particular solution, all coefficients zero.
    fn origin(&self) -> Self::Candidate;

    /// Adds `times` copies of basis vector `i`.
    fn add_multiple(&self, candidate: &mut Self::Candidate, i: usize, times: u64);

    fn cost(&self, candidate: &Self::Candidate) -> u64;

    fn add_basis(&self, candidate: &mut Self::Candidate, i: usize) {
        self.add_multiple(candidate, i, 1);
    }

    fn orders(&self) -> Vec<u64> {
        (0..self.dimension()).map(|i| self.order(i)).collect()
    }

    /// Number of coefficient vectors, saturating at `u64::MAX`.
    fn combinations(&self) -> u64 {
        (0..self.dimension()).fold(1u64, |acc, i| acc.saturating_mul(self.order(i)))
    }

    /// The member with the given coefficients.
    fn at(&self, coefficients: &[u64]) -> Self::Candidate {
        let mut c = self.origin();
        for (i, &k) in coefficients.iter().enumerate() {
            if k != 0 {
                self.add_multiple(&mut c, i, k);
            }
        }
        c
    }
}

/// Solutions of a GF(2) system, weighed by Hamming weight.
#[derive(Debug, Clone)]
pub struct BinarySpace {
    pub particular: BitVector,
    pub basis: Vec<BitVector>,
}

impl SolutionSpace for BinarySpace {
    type Candidate = BitVector;

    fn dimension(&self) -> usize {
        self.basis.len()
    }

    fn order(&self, _: usize) -> u64 {
        2
    }

    fn origin(&self) -> BitVector {
        self.particular.clone()
    }

    fn add_multiple(&self, candidate: &mut BitVector, i: usize, times: u64) {
        if times & 1 == 1 {
            candidate.xor_assign(&self.basis[i]);
        }
    }

    fn cost(&self, candidate: &BitVector) -> u64 {
        candidate.count_ones()
    }
}

/// Solutions over Z/N, weighed by their total press count.
#[derive(Debug, Clone)]
pub struct ModularSpace {
    ring: Ring,
    particular: Vec<u64>,
    basis: Vec<(Vec<u64>, u64)>,
}

impl ModularSpace {
    pub fn new(solution: &ModularSolution) -> ModularSpace {
        ModularSpace {
            ring: Ring::new(solution.modulus),
            particular: solution.particular.to_vec(),
            basis: solution
                .basis
                .iter()
                .map(|v| (v.values.to_vec(), v.order))
                .collect(),
        }
    }
}

impl SolutionSpace for ModularSpace {
    type Candidate = Vec<u64>;

    fn dimension(&self) -> usize {
        self.basis.len()
    }

    fn order(&self, i: usize) -> u64 {
        self.basis[i].1
    }

    fn origin(&self) -> Vec<u64> {
        self.particular.clone()
    }

    fn add_multiple(&self, candidate: &mut Vec<u64>, i: usize, times: u64) {
        let ring = self.ring;
        let times = ring.reduce(times);
        for (x, &v) in candidate.iter_mut().zip(&self.basis[i].0) {
            if v != 0 {
                *x = ring.mul_add(*x, v, times);
            }
        }
    }

    fn cost(&self, candidate: &Vec<u64>) -> u64 {
        candidate.iter().sum()
    }
}

/// One increment of the [`Odometer`]: the new combination index and the number of low
/// digits that moved.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Step {
    pub index: u64,
    pub changed: usize,
}

/// Mixed-radix counter over `orders`, running from `start` up to `end` (exclusive).
/// The starting combination itself is not yielded.
#[derive(Debug, Clone)]
pub struct Odometer {
    orders: Vec<u64>,
    digits: Vec<u64>,
    index: u64,
    end: u64,
}

impl Odometer {
    pub fn new(orders: &[u64]) -> Odometer {
        let total = orders.iter().fold(1u64, |acc, &o| acc.saturating_mul(o));
        Odometer::with_range(orders, 0, total)
    }

    pub fn with_range(orders: &[u64], start: u64, end: u64) -> Odometer {
        assert!(orders.iter().all(|&o| o > 0));
        Odometer {
            orders: orders.to_vec(),
            digits: decompose(start, orders),
            index: start,
            end,
        }
    }
}

impl Iterator for Odometer {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        if self.index.saturating_add(1) >= self.end {
            return None;
        }
        let mut i = 0;
        while i < self.digits.len() {
            self.digits[i] += 1;
            if self.digits[i] < self.orders[i] {
                break;
            }
            self.digits[i] = 0;
            i += 1;
        }
        if i == self.digits.len() {
            // wrapped around completely
            return None;
        }
        self.index += 1;
        Some(Step {
            index: self.index,
            changed: i + 1,
        })
    }
}

/// Mixed-radix digits of `index`, least significant first.
pub fn decompose(mut index: u64, orders: &[u64]) -> Vec<u64> {
    orders
        .iter()
        .map(|&o| {
            let d = index % o;
            index /= o;
            d
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Largest dimension that is searched exhaustively.
    pub enumeration_limit: usize,
    /// Largest number of combinations that is searched exhaustively.
    pub max_candidates: u64,
    pub max_random_trials: usize,
    pub workers: usize,
    pub seed: u64,
}

impl Default for SearchOptions {
    fn default() -> SearchOptions {
        SearchOptions {
            enumeration_limit: 10,
            max_candidates: 1 << 22,
            max_random_trials: 20_000,
            workers: 1,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchOutcome<C> {
    pub best: C,
    pub cost: u64,
    /// True when every combination was examined, so `cost` is the minimum.
    pub exhaustive: bool,
    pub examined: u64,
}

/// Minimum-cost member of the combinations `start..end`. Ties go to the lowest index.
fn scan<S: SolutionSpace>(space: &S, start: u64, end: u64) -> (u64, u64, S::Candidate) {
    let orders = space.orders();
    let mut candidate = space.at(&decompose(start, &orders));
    let mut best = (space.cost(&candidate), start, candidate.clone());
    for step in Odometer::with_range(&orders, start, end) {
        for i in 0..step.changed {
            space.add_basis(&mut candidate, i);
        }
        let cost = space.cost(&candidate);
        if cost < best.0 {
            best = (cost, step.index, candidate.clone());
        }
    }
    best
}

fn exhaustive<S: SolutionSpace>(space: &S, total: u64, workers: usize) -> SearchOutcome<S::Candidate> {
    let workers = workers.max(1) as u64;
    // not worth spawning threads for a handful of candidates
    let (cost, _, best) = if workers == 1 || total < 1024 * workers {
        scan(space, 0, total)
    } else {
        let chunk = (total + workers - 1) / workers;
        let results = crossbeam::scope(|s| {
            let handles: Vec<_> = (0..workers)
                .map(|w| {
                    let start = w * chunk;
                    let end = (start + chunk).min(total);
                    s.spawn(move |_| scan(space, start, end))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect::<Vec<_>>()
        })
        .unwrap_or_else(|e| std::panic::resume_unwind(e));

        let mut results = results.into_iter();
        let first = results.next().unwrap_or_else(|| scan(space, 0, total));
        results.fold(first, |best, r| if (r.0, r.1) < (best.0, best.1) { r } else { best })
    };
    SearchOutcome {
        best,
        cost,
        exhaustive: true,
        examined: total,
    }
}

fn heuristic<S: SolutionSpace>(space: &S, options: &SearchOptions) -> SearchOutcome<S::Candidate> {
    let orders = space.orders();
    let k = orders.len();
    let mut rng = StdRng::seed_from_u64(options.seed);
    let trials = (options.max_random_trials as u64).min(space.combinations());

    let mut current = space.origin();
    let mut cost = space.cost(&current);
    let mut examined = 1;
    for _ in 0..trials {
        let trial: Vec<u64> = orders.iter().map(|&o| rng.gen_range(0..o)).collect();
        let candidate = space.at(&trial);
        let c = space.cost(&candidate);
        examined += 1;
        if c < cost {
            current = candidate;
            cost = c;
        }
    }
    debug!("Best of {} random combinations: {}", trials, cost);

    // per-coordinate descent until a full pass makes no progress
    let mut passes = 0;
    loop {
        let mut improved = false;
        for i in 0..k {
            let mut trial = current.clone();
            let mut best: Option<(u64, S::Candidate)> = None;
            for _ in 1..orders[i] {
                space.add_basis(&mut trial, i);
                let c = space.cost(&trial);
                examined += 1;
                if c < best.as_ref().map_or(cost, |b| b.0) {
                    best = Some((c, trial.clone()));
                }
            }
            if let Some((c, candidate)) = best {
                cost = c;
                current = candidate;
                improved = true;
            }
        }
        passes += 1;
        if !improved {
            break;
        }
    }
    debug!("Local search settled after {} passes at {}", passes, cost);

    SearchOutcome {
        best: current,
        cost,
        exhaustive: false,
        examined,
    }
}

/// Finds a minimum-cost member of the space: exhaustively when the space is small enough,
/// otherwise by random sampling followed by local search.
pub fn minimize<S: SolutionSpace>(space: &S, options: &SearchOptions) -> SearchOutcome<S::Candidate> {
    let k = space.dimension();
    if k == 0 {
        let best = space.origin();
        return SearchOutcome {
            cost: space.cost(&best),
            best,
            exhaustive: true,
            examined: 1,
        };
    }

    let total = space.combinations();
    if k <= options.enumeration_limit && total <= options.max_candidates {
        debug!(
            "Enumerating {} combinations of {} basis vectors on {} worker(s)",
            total, k, options.workers
        );
        exhaustive(space, total, options.workers)
    } else {
        warn!(
            "{} free variables ({} combinations) exceed the enumeration limit: the result may not be minimal",
            k, total
        );
        heuristic(space, options)
    }
}

#[cfg(test)]
fn brute_force<S: SolutionSpace>(space: &S) -> u64 {
    let orders = space.orders();
    let total = space.combinations();
    (0..total)
        .map(|i| space.cost(&space.at(&decompose(i, &orders))))
        .min()
        .unwrap_or(0)
}

#[cfg(test)]
fn sample_space() -> ModularSpace {
    use linalg::BasisVector;
    use ndarray::arr1;
    ModularSpace::new(&ModularSolution {
        modulus: 6,
        particular: arr1(&[5, 4, 3, 2, 1, 0]),
        basis: vec![
            BasisVector {
                values: arr1(&[1, 1, 0, 0, 0, 1]),
                order: 6,
            },
            BasisVector {
                values: arr1(&[3, 0, 3, 0, 3, 0]),
                order: 2,
            },
            BasisVector {
                values: arr1(&[0, 2, 2, 4, 0, 0]),
                order: 3,
            },
        ],
    })
}

#[test]
fn test_odometer() {
    let steps: Vec<Step> = Odometer::new(&[2, 3]).collect();
    assert_eq!(steps.len(), 5);
    assert_eq!(steps[0], Step { index: 1, changed: 1 });
    assert_eq!(steps[1], Step { index: 2, changed: 2 });

    let mut o = Odometer::with_range(&[2, 3], 3, 6);
    assert_eq!(o.digits, vec![1, 1]);
    assert_eq!(o.next(), Some(Step { index: 4, changed: 2 }));
    assert_eq!(o.digits, vec![0, 2]);
    assert_eq!(o.next(), Some(Step { index: 5, changed: 1 }));
    assert_eq!(o.next(), None);

    assert_eq!(decompose(5, &[2, 3]), vec![1, 2]);
}

#[test]
fn test_incremental_matches_direct() {
    let space = sample_space();
    let orders = space.orders();
    let mut candidate = space.origin();
    for step in Odometer::new(&orders) {
        for i in 0..step.changed {
            space.add_basis(&mut candidate, i);
        }
        assert_eq!(candidate, space.at(&decompose(step.index, &orders)));
    }
}

#[test]
fn test_exhaustive_is_minimal() {
    let space = sample_space();
    let outcome = minimize(&space, &SearchOptions::default());
    assert!(outcome.exhaustive);
    assert_eq!(outcome.examined, 36);
    assert_eq!(outcome.cost, brute_force(&space));
    assert_eq!(space.cost(&outcome.best), outcome.cost);
}

#[test]
fn test_parallel_matches_sequential() {
    let mut rng = StdRng::seed_from_u64(7);
    let basis: Vec<BitVector> = (0..14)
        .map(|_| {
            let bits: Vec<u64> = (0..40).map(|_| rng.gen_range(0..2)).collect();
            BitVector::from_residues(&bits)
        })
        .collect();
    let bits: Vec<u64> = (0..40).map(|_| rng.gen_range(0..2)).collect();
    let space = BinarySpace {
        particular: BitVector::from_residues(&bits),
        basis,
    };
    let mut options = SearchOptions {
        enumeration_limit: 20,
        ..SearchOptions::default()
    };
    let sequential = minimize(&space, &options);
    options.workers = 4;
    let parallel = minimize(&space, &options);
    assert!(parallel.exhaustive);
    assert_eq!(sequential.cost, parallel.cost);
    assert_eq!(sequential.best, parallel.best);
}

#[test]
fn test_heuristic_bound() {
    let space = sample_space();
    let options = SearchOptions {
        enumeration_limit: 1,
        max_random_trials: 5,
        seed: 3,
        ..SearchOptions::default()
    };
    let outcome = minimize(&space, &options);
    assert!(!outcome.exhaustive);
    // never worse than the particular solution, never better than the optimum
    assert!(outcome.cost <= space.cost(&space.origin()));
    assert!(outcome.cost >= brute_force(&space));
    assert_eq!(space.cost(&outcome.best), outcome.cost);
}
