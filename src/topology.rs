//! Board shapes and their press patterns.
//!
//! A topology only enumerates neighbours: the cell count follows from its layout and
//! `press(i)` lists every cell toggled by pressing cell `i` (including `i` itself). The
//! elimination, lifting and search code never looks at the board shape.

use board::Board;
use error::SolveError;

pub trait Topology {
    /// Short name, as accepted by [`from_name`].
    fn name(&self) -> &str;

    /// Row lengths of the board-shaped grid. Cells are numbered row-major over them.
    fn layout(&self) -> Vec<usize>;

    fn cell_count(&self) -> usize {
        self.layout().iter().sum()
    }

    /// The multiset of cells toggled by pressing `cell`; always contains `cell`.
    fn press(&self, cell: usize) -> Vec<usize>;

    /// `Some((rows, cols))` when the press pattern is the orthogonal cross on a
    /// rectangular grid, so that every row of presses is forced by the rows above it.
    fn row_recurrence(&self) -> Option<(usize, usize)> {
        None
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct Grid {
    rows: usize,
    cols: usize,
}

impl Grid {
    fn new(rows: usize, cols: usize) -> Grid {
        Grid { rows, cols }
    }

    fn layout(&self) -> Vec<usize> {
        vec![self.cols; self.rows]
    }

    #[inline]
    fn locate(&self, cell: usize) -> (usize, usize) {
        (cell / self.cols, cell % self.cols)
    }

    /// Collects `cell` and every in-bounds offset from it.
    fn offsets(&self, cell: usize, offsets: &[(isize, isize)]) -> Vec<usize> {
        let (r, c) = self.locate(cell);
        let mut res = vec![cell];
        for &(dr, dc) in offsets {
            let nr = r as isize + dr;
            let nc = c as isize + dc;
            if nr >= 0 && nc >= 0 && (nr as usize) < self.rows && (nc as usize) < self.cols {
                res.push(nr as usize * self.cols + nc as usize);
            }
        }
        res
    }
}

const CROSS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const KNIGHT: [(isize, isize); 8] = [
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
];
const DIAGONAL: [(isize, isize); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

/// The classic rule: a press toggles the cell and its orthogonal neighbours.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Cross(Grid);

impl Cross {
    pub fn new(rows: usize, cols: usize) -> Cross {
        Cross(Grid::new(rows, cols))
    }
}

impl Topology for Cross {
    fn name(&self) -> &str {
        "cross"
    }

    fn layout(&self) -> Vec<usize> {
        self.0.layout()
    }

    fn press(&self, cell: usize) -> Vec<usize> {
        self.0.offsets(cell, &CROSS)
    }

    fn row_recurrence(&self) -> Option<(usize, usize)> {
        Some((self.0.rows, self.0.cols))
    }
}

/// A press toggles the cell and every cell a knight's move away.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Knight(Grid);

impl Knight {
    pub fn new(rows: usize, cols: usize) -> Knight {
        Knight(Grid::new(rows, cols))
    }
}

impl Topology for Knight {
    fn name(&self) -> &str {
        "knight"
    }

    fn layout(&self) -> Vec<usize> {
        self.0.layout()
    }

    fn press(&self, cell: usize) -> Vec<usize> {
        self.0.offsets(cell, &KNIGHT)
    }
}

/// The "X" rule: a press toggles the cell and its four diagonal neighbours.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Diagonal(Grid);

impl Diagonal {
    pub fn new(rows: usize, cols: usize) -> Diagonal {
        Diagonal(Grid::new(rows, cols))
    }
}

impl Topology for Diagonal {
    fn name(&self) -> &str {
        "diagonal"
    }

    fn layout(&self) -> Vec<usize> {
        self.0.layout()
    }

    fn press(&self, cell: usize) -> Vec<usize> {
        self.0.offsets(cell, &DIAGONAL)
    }
}

/// Alien tiles: a press toggles every cell in its row and in its column, each once.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RowColumn(Grid);

impl RowColumn {
    pub fn new(rows: usize, cols: usize) -> RowColumn {
        RowColumn(Grid::new(rows, cols))
    }
}

impl Topology for RowColumn {
    fn name(&self) -> &str {
        "rowcolumn"
    }

    fn layout(&self) -> Vec<usize> {
        self.0.layout()
    }

    fn press(&self, cell: usize) -> Vec<usize> {
        let g = self.0;
        let (r, c) = g.locate(cell);
        let mut res: Vec<usize> = (0..g.cols).map(|j| r * g.cols + j).collect();
        res.extend((0..g.rows).filter(|&i| i != r).map(|i| i * g.cols + c));
        res
    }
}

/// Every press toggles every cell.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Complete(Grid);

impl Complete {
    pub fn new(rows: usize, cols: usize) -> Complete {
        Complete(Grid::new(rows, cols))
    }
}

impl Topology for Complete {
    fn name(&self) -> &str {
        "complete"
    }

    fn layout(&self) -> Vec<usize> {
        self.0.layout()
    }

    fn press(&self, cell: usize) -> Vec<usize> {
        let mut res = vec![cell];
        res.extend((0..self.0.rows * self.0.cols).filter(|&j| j != cell));
        res
    }
}

/// A diamond of `2k + 1` rows with lengths `1, 3, .., 2k + 1, .., 3, 1`.
///
/// A press toggles the cell, its left and right neighbours, and the single vertically
/// adjacent cell: the one above for even positions in the upper half, below otherwise.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Diamond {
    k: usize,
    counts: Vec<usize>,
    starts: Vec<usize>,
}

impl Diamond {
    pub fn new(k: usize) -> Diamond {
        let counts: Vec<usize> = (0..2 * k + 1)
            .map(|i| if i <= k { 2 * i + 1 } else { 2 * (2 * k - i) + 1 })
            .collect();
        let starts = counts
            .iter()
            .scan(0, |acc, &c| {
                let s = *acc;
                *acc += c;
                Some(s)
            })
            .collect();
        Diamond { k, counts, starts }
    }

    fn index(&self, r: isize, c: isize) -> Option<usize> {
        if r < 0 || c < 0 || r as usize >= self.counts.len() || c as usize >= self.counts[r as usize]
        {
            return None;
        }
        Some(self.starts[r as usize] + c as usize)
    }

    fn locate(&self, cell: usize) -> (usize, usize) {
        let r = match self.starts.binary_search(&cell) {
            Ok(r) => r,
            Err(r) => r - 1,
        };
        (r, cell - self.starts[r])
    }
}

impl Topology for Diamond {
    fn name(&self) -> &str {
        "diamond"
    }

    fn layout(&self) -> Vec<usize> {
        self.counts.clone()
    }

    fn press(&self, cell: usize) -> Vec<usize> {
        let (r, c) = self.locate(cell);
        let (r, c, k) = (r as isize, c as isize, self.k as isize);
        let mut res = vec![cell];
        if r > 0 {
            let up = if r <= k { c - 1 } else { c + 1 };
            res.extend(self.index(r - 1, up));
        }
        if r < 2 * k {
            let down = if r < k { c + 1 } else { c - 1 };
            res.extend(self.index(r + 1, down));
        }
        res.extend(self.index(r, c - 1));
        res.extend(self.index(r, c + 1));
        res
    }
}

/// The six `n x n` faces of a cube, stacked as `6n` rows in the order U, L, F, R, B, D.
///
/// A press toggles the cell, its in-face orthogonal neighbours and, on a face border, the
/// adjacent cell across that edge of the cube.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Cube {
    n: usize,
}

impl Cube {
    pub const U: usize = 0;
    pub const L: usize = 1;
    pub const F: usize = 2;
    pub const R: usize = 3;
    pub const B: usize = 4;
    pub const D: usize = 5;

    pub fn new(n: usize) -> Cube {
        Cube { n }
    }

    pub fn index(&self, face: usize, r: usize, c: usize) -> usize {
        face * self.n * self.n + r * self.n + c
    }

    /// The cell across the edge of `face` in direction `(dr, dc)` from `(r, c)`.
    fn across(&self, face: usize, r: usize, c: usize, dr: isize, dc: isize) -> usize {
        let l = self.n - 1;
        let (f, nr, nc) = match (face, dr, dc) {
            (Cube::U, -1, _) => (Cube::B, 0, l - c),
            (Cube::U, 1, _) => (Cube::F, 0, c),
            (Cube::U, _, -1) => (Cube::L, 0, r),
            (Cube::U, _, _) => (Cube::R, 0, l - r),
            (Cube::D, -1, _) => (Cube::F, l, c),
            (Cube::D, 1, _) => (Cube::B, l, l - c),
            (Cube::D, _, -1) => (Cube::L, l, l - r),
            (Cube::D, _, _) => (Cube::R, l, r),
            (Cube::F, -1, _) => (Cube::U, l, c),
            (Cube::F, 1, _) => (Cube::D, 0, c),
            (Cube::F, _, -1) => (Cube::L, r, l),
            (Cube::F, _, _) => (Cube::R, r, 0),
            (Cube::B, -1, _) => (Cube::U, 0, l - c),
            (Cube::B, 1, _) => (Cube::D, l, l - c),
            (Cube::B, _, -1) => (Cube::R, r, l),
            (Cube::B, _, _) => (Cube::L, r, 0),
            (Cube::L, -1, _) => (Cube::U, c, 0),
            (Cube::L, 1, _) => (Cube::D, l - c, 0),
            (Cube::L, _, -1) => (Cube::B, r, l),
            (Cube::L, _, _) => (Cube::F, r, 0),
            (Cube::R, -1, _) => (Cube::U, l - c, l),
            (Cube::R, 1, _) => (Cube::D, c, l),
            (Cube::R, _, -1) => (Cube::F, r, l),
            (Cube::R, _, _) => (Cube::B, r, 0),
            _ => unreachable!("cube has six faces"),
        };
        self.index(f, nr, nc)
    }
}

impl Topology for Cube {
    fn name(&self) -> &str {
        "cube"
    }

    fn layout(&self) -> Vec<usize> {
        vec![self.n; 6 * self.n]
    }

    fn press(&self, cell: usize) -> Vec<usize> {
        let nn = self.n * self.n;
        let (face, r, c) = (cell / nn, (cell % nn) / self.n, cell % self.n);
        let mut res = vec![cell];
        for &(dr, dc) in &CROSS {
            let nr = r as isize + dr;
            let nc = c as isize + dc;
            if nr >= 0 && nc >= 0 && (nr as usize) < self.n && (nc as usize) < self.n {
                res.push(self.index(face, nr as usize, nc as usize));
            } else {
                res.push(self.across(face, r, c, dr, dc));
            }
        }
        res
    }
}

/// A topology given directly by a layout and a neighbour function.
pub struct Custom<F> {
    name: String,
    layout: Vec<usize>,
    press: F,
}

impl<F: Fn(usize) -> Vec<usize>> Custom<F> {
    pub fn new(name: &str, layout: Vec<usize>, press: F) -> Custom<F> {
        Custom {
            name: name.to_string(),
            layout,
            press,
        }
    }
}

impl<F: Fn(usize) -> Vec<usize>> Topology for Custom<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn layout(&self) -> Vec<usize> {
        self.layout.clone()
    }

    fn press(&self, cell: usize) -> Vec<usize> {
        (self.press)(cell)
    }
}

/// Builds a named topology that fits `board`. `args` can pin the size of shapes that are
/// not plain rectangles (`diamond <k>`, `cube <n>`); otherwise it is inferred.
pub fn from_name(name: &str, args: &[usize], board: &Board) -> Result<Box<dyn Topology>, SolveError> {
    let grid = || {
        board.rectangular().ok_or_else(|| {
            SolveError::Parse(format!("topology '{}' needs a rectangular board", name))
        })
    };
    let t: Box<dyn Topology> = match name {
        "cross" | "classic" => {
            let (r, c) = grid()?;
            Box::new(Cross::new(r, c))
        }
        "knight" => {
            let (r, c) = grid()?;
            Box::new(Knight::new(r, c))
        }
        "diagonal" | "x" => {
            let (r, c) = grid()?;
            Box::new(Diagonal::new(r, c))
        }
        "rowcolumn" | "alien" => {
            let (r, c) = grid()?;
            Box::new(RowColumn::new(r, c))
        }
        "complete" => {
            let (r, c) = grid()?;
            Box::new(Complete::new(r, c))
        }
        "diamond" => {
            let k = match args.first() {
                Some(&k) => k,
                None => board.row_count().saturating_sub(1) / 2,
            };
            Box::new(Diamond::new(k))
        }
        "cube" => {
            let n = match args.first() {
                Some(&n) => n,
                None => board.rows().first().map(|r| r.len()).unwrap_or(0),
            };
            Box::new(Cube::new(n))
        }
        _ => return Err(SolveError::Parse(format!("unknown topology '{}'", name))),
    };
    debug!("Topology {} with layout {:?}", t.name(), t.layout());
    Ok(t)
}

#[cfg(test)]
fn is_symmetric<T: Topology>(t: &T) -> bool {
    let n = t.cell_count();
    let count = |i: usize, j: usize| t.press(i).iter().filter(|&&x| x == j).count();
    (0..n).all(|i| {
        t.press(i).iter().all(|&j| j < n && count(i, j) == count(j, i)) && t.press(i).contains(&i)
    })
}

#[test]
fn test_cross_press() {
    let t = Cross::new(3, 3);
    assert_eq!(t.cell_count(), 9);
    let mut p = t.press(4);
    p.sort();
    assert_eq!(p, vec![1, 3, 4, 5, 7]);
    let mut p = t.press(0);
    p.sort();
    assert_eq!(p, vec![0, 1, 3]);
    assert_eq!(t.row_recurrence(), Some((3, 3)));
}

#[test]
fn test_knight_press() {
    let t = Knight::new(5, 5);
    assert_eq!(t.press(12).len(), 9);
    let mut p = t.press(0);
    p.sort();
    assert_eq!(p, vec![0, 7, 11]);
    assert_eq!(t.row_recurrence(), None);
}

#[test]
fn test_diamond_layout() {
    let t = Diamond::new(2);
    assert_eq!(t.layout(), vec![1, 3, 5, 3, 1]);
    assert_eq!(t.cell_count(), 13);
    assert_eq!(t.locate(0), (0, 0));
    assert_eq!(t.locate(3), (1, 2));
    assert_eq!(t.locate(4), (2, 0));
    assert_eq!(t.locate(12), (4, 0));
    // the top cell touches the middle of row 1
    let mut p = t.press(0);
    p.sort();
    assert_eq!(p, vec![0, 2]);
}

#[test]
fn test_topologies_are_symmetric() {
    for &(r, c) in &[(1, 1), (2, 3), (4, 4), (5, 6)] {
        assert!(is_symmetric(&Cross::new(r, c)));
        assert!(is_symmetric(&Knight::new(r, c)));
        assert!(is_symmetric(&Diagonal::new(r, c)));
        assert!(is_symmetric(&RowColumn::new(r, c)));
        assert!(is_symmetric(&Complete::new(r, c)));
    }
    for k in 0..5 {
        assert!(is_symmetric(&Diamond::new(k)));
    }
    for n in 1..5 {
        assert!(is_symmetric(&Cube::new(n)));
    }
}

#[test]
fn test_cube_degree() {
    let t = Cube::new(3);
    assert_eq!(t.cell_count(), 54);
    for i in 0..54 {
        assert_eq!(t.press(i).len(), 5);
    }
}

#[test]
fn test_from_name() {
    let b = Board::zeros(&[4, 4, 4]);
    assert_eq!(from_name("cross", &[], &b).unwrap().row_recurrence(), Some((3, 4)));
    assert_eq!(from_name("knight", &[], &b).unwrap().cell_count(), 12);
    let d = Board::zeros(&[1, 3, 1]);
    assert_eq!(from_name("diamond", &[], &d).unwrap().layout(), vec![1, 3, 1]);
    assert!(from_name("cross", &[], &d).is_err());
    assert!(from_name("hexagon", &[], &b).is_err());
    let c = Board::zeros(&[2; 12]);
    assert_eq!(from_name("cube", &[], &c).unwrap().cell_count(), 24);
}
