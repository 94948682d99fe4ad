#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use board::Board;
    use linalg::lift;
    use linalg::{Fallback, Unsolvable};
    use parser;
    use ring::Ring;
    use solver::{solve, Outcome, Solution, SolvePath, SolverOptions};
    use system::{apply_plan, scramble, ToggleSystem};
    use topology::{self, Complete, Cross, Cube, Custom, Diagonal, Diamond, Knight, RowColumn, Topology};

    fn assert_clears<T: Topology + ?Sized>(t: &T, board: &Board, s: &Solution, modulus: u64) {
        assert!(s.has_solution(), "{} has no solution", t.name());
        assert!(apply_plan(t, board, &s.press_plan, modulus).is_zero());
        let system = ToggleSystem::build(t, board, modulus).unwrap();
        assert!(system.is_solution(&s.press_plan.cells()));
        assert_eq!(s.total_weight, s.press_plan.weight());
    }

    fn random_presses(rng: &mut StdRng, cells: usize, modulus: u64) -> Vec<u64> {
        (0..cells).map(|_| rng.gen_range(0..modulus)).collect()
    }

    /// A board that `presses` clears.
    fn board_cleared_by<T: Topology + ?Sized>(t: &T, presses: &[u64], modulus: u64) -> Board {
        let ring = Ring::new(modulus);
        let undo: Vec<u64> = presses.iter().map(|&p| ring.neg(p)).collect();
        scramble(t, &undo, modulus)
    }

    /// Minimum weight over every press vector, or `None` if nothing clears the board.
    fn brute_force<T: Topology + ?Sized>(t: &T, board: &Board, modulus: u64) -> Option<u64> {
        let system = ToggleSystem::build(t, board, modulus).unwrap();
        let n = t.cell_count();
        let total = modulus.pow(n as u32);
        (0..total)
            .map(|index| ::search::decompose(index, &vec![modulus; n]))
            .filter(|x| system.is_solution(x))
            .map(|x| x.iter().sum::<u64>())
            .min()
    }

    fn full_matrix() -> SolverOptions {
        SolverOptions {
            use_row_recurrence: false,
            ..SolverOptions::default()
        }
    }

    #[test]
    fn all_ones_3x3() {
        let t = Cross::new(3, 3);
        let board = Board::new(vec![vec![1; 3]; 3]);
        for options in &[SolverOptions::default(), full_matrix()] {
            let s = solve(&t, &board, 2, options).unwrap();
            assert_clears(&t, &board, &s, 2);
            assert!(s.total_weight <= 9);
            assert!(s.optimal);
        }
    }

    #[test]
    fn single_light_2x2() {
        let t = Cross::new(2, 2);
        let board = Board::new(vec![vec![1, 0], vec![0, 0]]);
        for options in &[SolverOptions::default(), full_matrix()] {
            let s = solve(&t, &board, 2, options).unwrap();
            assert_clears(&t, &board, &s, 2);
            assert_eq!(s.free_variables, 0);
            assert!(s.total_weight > 0);
        }
        let s = solve(&t, &board, 2, &full_matrix()).unwrap();
        assert_eq!(s.path, SolvePath::Binary);
    }

    #[test]
    fn single_cell() {
        let t = Cross::new(1, 1);
        for modulus in 2..8 {
            for v in 0..modulus {
                let board = Board::new(vec![vec![v]]);
                let s = solve(&t, &board, modulus, &SolverOptions::default()).unwrap();
                assert_eq!(s.press_plan, Board::new(vec![vec![(modulus - v) % modulus]]));
                assert_eq!(s.free_variables, 0);
            }
        }
    }

    #[test]
    fn inconsistent_composite() {
        let t = Complete::new(2, 2);
        let board = Board::new(vec![vec![1, 0], vec![0, 0]]);
        let s = solve(&t, &board, 6, &SolverOptions::default()).unwrap();
        assert!(!s.has_solution());
        match s.outcome {
            Outcome::NoSolution(Unsolvable::Field { prime }) => assert!(prime == 2 || prime == 3),
            o => panic!("unexpected outcome {:?}", o),
        }
        assert!(s.press_plan.is_zero());
    }

    #[test]
    fn knight_seeded() {
        let t = Knight::new(5, 5);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..5 {
            let presses = random_presses(&mut rng, 25, 2);
            let board = scramble(&t, &presses, 2);
            let s = solve(&t, &board, 2, &SolverOptions::default()).unwrap();
            assert_clears(&t, &board, &s, 2);
            assert!(s.optimal);
            assert!(s.total_weight <= presses.iter().sum::<u64>());
        }

        for &modulus in &[3, 4] {
            let presses = random_presses(&mut rng, 25, modulus);
            let board = board_cleared_by(&t, &presses, modulus);
            let s = solve(&t, &board, modulus, &SolverOptions::default()).unwrap();
            assert_clears(&t, &board, &s, modulus);
            if s.optimal {
                assert!(s.total_weight <= presses.iter().sum::<u64>());
            }
        }
    }

    #[test]
    fn round_trip_topologies() {
        let topologies: Vec<Box<dyn Topology>> = vec![
            Box::new(Cross::new(3, 4)),
            Box::new(Knight::new(4, 4)),
            Box::new(Diagonal::new(3, 3)),
            Box::new(Diamond::new(2)),
            Box::new(Cube::new(2)),
            Box::new(RowColumn::new(3, 3)),
            Box::new(Complete::new(2, 3)),
        ];
        let options = SolverOptions {
            max_candidates: 1 << 14,
            max_random_trials: 500,
            ..SolverOptions::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        for t in &topologies {
            for modulus in 2..=6 {
                let presses = random_presses(&mut rng, t.cell_count(), modulus);
                let board = scramble(t.as_ref(), &presses, modulus);
                let s = solve(t.as_ref(), &board, modulus, &options).unwrap();
                assert_clears(t.as_ref(), &board, &s, modulus);
            }
        }
    }

    #[test]
    fn crt_consistency() {
        let t = Knight::new(3, 3);
        let mut rng = StdRng::seed_from_u64(5);
        for &modulus in &[6, 12, 30] {
            let presses = random_presses(&mut rng, 9, modulus);
            let board = scramble(&t, &presses, modulus);
            let system = ToggleSystem::build(&t, &board, modulus).unwrap();
            let (combined, components) =
                lift::solve_modular(&system.a, &system.b, modulus).unwrap();
            assert!(system.is_solution(&combined.particular.to_vec()));
            for c in &components {
                let m = c.modulus();
                assert_eq!(combined.particular.mapv(|x| x % m), c.solution.particular);
            }
            let ring = system.ring;
            for v in &combined.basis {
                assert!(system.apply(&v.values.to_vec()).iter().all(|&r| r == 0));
                assert!(v.values.iter().all(|&x| ring.mul(x, ring.reduce(v.order)) == 0));
            }
        }
    }

    #[test]
    fn recurrence_matches_full_matrix() {
        let mut rng = StdRng::seed_from_u64(9);
        for &(rows, cols, modulus) in &[(5, 5, 2), (4, 6, 2), (3, 3, 3), (4, 4, 3), (3, 4, 4), (2, 3, 6)] {
            let t = Cross::new(rows, cols);
            let cells = random_presses(&mut rng, rows * cols, modulus);
            let board = Board::from_cells(&t.layout(), &cells);
            let reduced = solve(&t, &board, modulus, &SolverOptions::default()).unwrap();
            let full = solve(&t, &board, modulus, &full_matrix()).unwrap();
            assert_eq!(reduced.has_solution(), full.has_solution());
            if !full.has_solution() {
                continue;
            }
            assert_eq!(reduced.path, SolvePath::RowRecurrence);
            assert_clears(&t, &board, &reduced, modulus);
            assert_clears(&t, &board, &full, modulus);
            if reduced.optimal && full.optimal {
                assert_eq!(reduced.total_weight, full.total_weight);
            }
        }
    }

    #[test]
    fn minimal_on_small_boards() {
        let mut rng = StdRng::seed_from_u64(11);
        for &(rows, cols, modulus) in &[(2, 2, 4), (2, 2, 6), (2, 3, 3), (2, 3, 4), (1, 4, 2)] {
            let t = Cross::new(rows, cols);
            for _ in 0..3 {
                let cells = random_presses(&mut rng, rows * cols, modulus);
                let board = Board::from_cells(&t.layout(), &cells);
                let expected = brute_force(&t, &board, modulus);
                for options in &[SolverOptions::default(), full_matrix()] {
                    let s = solve(&t, &board, modulus, options).unwrap();
                    assert!(s.optimal);
                    match expected {
                        Some(w) => {
                            assert_clears(&t, &board, &s, modulus);
                            assert_eq!(s.total_weight, w);
                        }
                        None => assert!(!s.has_solution()),
                    }
                }
            }
        }
    }

    #[test]
    fn heuristic_is_an_upper_bound() {
        // 9x9 Lights Out has eight free variables
        let t = Cross::new(9, 9);
        let mut rng = StdRng::seed_from_u64(3);
        let board = scramble(&t, &random_presses(&mut rng, 81, 2), 2);
        let exact = solve(&t, &board, 2, &SolverOptions::default()).unwrap();
        assert!(exact.optimal);
        assert_eq!(exact.free_variables, 8);

        let options = SolverOptions {
            enumeration_limit: Some(2),
            max_random_trials: 50,
            ..SolverOptions::default()
        };
        let rough = solve(&t, &board, 2, &options).unwrap();
        assert_clears(&t, &board, &rough, 2);
        assert!(!rough.optimal);
        assert!(rough.total_weight >= exact.total_weight);
    }

    #[test]
    fn parallel_search() {
        // the 19x19 cross has a 16-dimensional kernel over GF(2), enough to split
        // the exhaustive search between workers
        let t = Cross::new(19, 19);
        let mut rng = StdRng::seed_from_u64(19);
        let presses = random_presses(&mut rng, t.cell_count(), 2);
        let board = board_cleared_by(&t, &presses, 2);
        let options = SolverOptions {
            workers: 4,
            ..full_matrix()
        };
        let parallel = solve(&t, &board, 2, &options).unwrap();
        let sequential = solve(&t, &board, 2, &full_matrix()).unwrap();
        assert_clears(&t, &board, &parallel, 2);
        assert_eq!(parallel.free_variables, 16);
        assert_eq!(parallel.examined, 1 << 16);
        assert!(parallel.optimal);
        assert_eq!(parallel.press_plan, sequential.press_plan);
        assert_eq!(parallel.total_weight, sequential.total_weight);
    }

    #[test]
    fn lit_only_sequences() {
        let topologies: Vec<Box<dyn Topology>> = vec![
            Box::new(Cross::new(3, 3)),
            Box::new(Cross::new(6, 6)),
            Box::new(Knight::new(5, 5)),
        ];
        let mut rng = StdRng::seed_from_u64(7);
        for t in &topologies {
            for _ in 0..5 {
                let presses = random_presses(&mut rng, t.cell_count(), 2);
                let board = board_cleared_by(t.as_ref(), &presses, 2);
                let s = solve(t.as_ref(), &board, 2, &SolverOptions::default()).unwrap();
                assert_clears(t.as_ref(), &board, &s, 2);
                let moves = s.lit_only_moves(t.as_ref(), &board).unwrap();

                let mut state = board.clone();
                let layout = board.layout();
                for &(r, c) in &moves {
                    assert_eq!(state.get(r, c), 1, "{}: pressed dark cell ({}, {})", t.name(), r, c);
                    let mut cells = state.cells();
                    let cell = layout[..r].iter().sum::<usize>() + c;
                    for j in t.press(cell) {
                        cells[j] ^= 1;
                    }
                    state = Board::from_cells(&layout, &cells);
                }
                assert!(state.is_zero(), "{} is not cleared", t.name());
                assert!(moves.len() as u64 >= s.total_weight);
            }
        }
    }

    #[test]
    fn lifting_fallbacks() {
        // a press that toggles its own cell twice
        let double = Custom::new("double", vec![1], |_| vec![0, 0]);
        let board = Board::new(vec![vec![2]]);
        let s = solve(&double, &board, 4, &SolverOptions::default()).unwrap();
        assert_clears(&double, &board, &s, 4);
        assert_eq!(s.fallbacks, vec![Fallback::Particular { prime: 2, level: 1 }]);
        assert_eq!(s.total_weight, 1);

        let s = solve(&double, &Board::new(vec![vec![1]]), 4, &SolverOptions::default()).unwrap();
        assert_eq!(s.outcome, Outcome::NoSolution(Unsolvable::Field { prime: 2 }));

        // two cells toggled together: 1 + x + y = 0 and 3 + x + y = 0 agree mod 2 only
        let pair = Custom::new("pair", vec![2], |i| vec![i, 1 - i]);
        let s = solve(&pair, &Board::new(vec![vec![1, 3]]), 4, &SolverOptions::default()).unwrap();
        assert_eq!(
            s.outcome,
            Outcome::NoSolution(Unsolvable::PrimePower { prime: 2, exponent: 2 })
        );
    }

    #[test]
    fn board_file_end_to_end() {
        let input = "topology diamond 1 modulo 3\n  1\n0 2 0\n  1\n";
        let file = parser::parse_board_file(input).unwrap();
        let header = file.header.unwrap();
        let t = topology::from_name(&header.topology, &header.args, &file.board).unwrap();
        let modulus = header.modulus.unwrap();
        let s = solve(t.as_ref(), &file.board, modulus, &SolverOptions::default()).unwrap();
        if s.has_solution() {
            assert_clears(t.as_ref(), &file.board, &s, modulus);
            assert_eq!(s.moves().len() as u64, s.total_weight);
        }
    }
}
