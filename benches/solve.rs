#![cfg(feature = "nightly")]
#![feature(test)]
extern crate test;

extern crate lightsout;

use test::Bencher;

use lightsout::topology::{Cross, Knight, Topology};
use lightsout::{solve, Board, SolverOptions};

fn lit<T: Topology>(t: &T) -> Board {
    let layout = t.layout();
    let cells: Vec<u64> = (0..t.cell_count() as u64).map(|i| i % 2).collect();
    Board::from_cells(&layout, &cells)
}

#[bench]
fn cross_9x9_gf2(b: &mut Bencher) {
    let t = Cross::new(9, 9);
    let board = lit(&t);
    let options = SolverOptions::default();
    b.iter(|| solve(&t, &board, 2, &options));
}

#[bench]
fn cross_9x9_full_matrix(b: &mut Bencher) {
    let t = Cross::new(9, 9);
    let board = lit(&t);
    let options = SolverOptions {
        use_row_recurrence: false,
        ..SolverOptions::default()
    };
    b.iter(|| solve(&t, &board, 2, &options));
}

#[bench]
fn cross_20x20_row_recurrence(b: &mut Bencher) {
    let t = Cross::new(20, 20);
    let board = lit(&t);
    let options = SolverOptions::default();
    b.iter(|| solve(&t, &board, 2, &options));
}

#[bench]
fn knight_5x5_mod6(b: &mut Bencher) {
    let t = Knight::new(5, 5);
    let board = lit(&t);
    let options = SolverOptions::default();
    b.iter(|| solve(&t, &board, 6, &options));
}
