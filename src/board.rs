//! Board-shaped grids of cell values in Z/N.
//!
//! A board is a list of rows which may have different lengths (diamond boards do), so that
//! every topology can be laid out as a plain grid. Cells are numbered row-major.

use std::fmt;

use itertools::Itertools;

use error::SolveError;

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Board {
    rows: Vec<Vec<u64>>,
}

impl Board {
    pub fn new(rows: Vec<Vec<u64>>) -> Board {
        Board { rows }
    }

    /// A board with the given row lengths and every cell set to zero.
    pub fn zeros(layout: &[usize]) -> Board {
        Board {
            rows: layout.iter().map(|&len| vec![0; len]).collect(),
        }
    }

    /// Lays out a flat, row-major cell vector over the given row lengths.
    pub fn from_cells(layout: &[usize], cells: &[u64]) -> Board {
        assert_eq!(
            layout.iter().sum::<usize>(),
            cells.len(),
            "cell count does not match layout"
        );
        let mut rest = cells;
        let mut rows = Vec::with_capacity(layout.len());
        for &len in layout {
            let (row, tail) = rest.split_at(len);
            rows.push(row.to_vec());
            rest = tail;
        }
        Board { rows }
    }

    pub fn rows(&self) -> &[Vec<u64>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn layout(&self) -> Vec<usize> {
        self.rows.iter().map(|r| r.len()).collect()
    }

    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(|r| r.len()).sum()
    }

    /// The cells in row-major order.
    pub fn cells(&self) -> Vec<u64> {
        self.rows.iter().flatten().cloned().collect()
    }

    pub fn get(&self, row: usize, col: usize) -> u64 {
        self.rows[row][col]
    }

    /// Row and column of the cell at a row-major index.
    pub fn locate(&self, mut cell: usize) -> (usize, usize) {
        for (r, row) in self.rows.iter().enumerate() {
            if cell < row.len() {
                return (r, cell);
            }
            cell -= row.len();
        }
        panic!("cell {} is out of bounds", cell)
    }

    /// Returns `(rows, cols)` if every row has the same non-zero length.
    pub fn rectangular(&self) -> Option<(usize, usize)> {
        let cols = self.rows.first()?.len();
        if cols > 0 && self.rows.iter().all(|r| r.len() == cols) {
            Some((self.rows.len(), cols))
        } else {
            None
        }
    }

    pub fn is_zero(&self) -> bool {
        self.rows.iter().flatten().all(|&v| v == 0)
    }

    /// Total number of presses when this board is read as a press plan.
    pub fn weight(&self) -> u64 {
        self.rows.iter().flatten().sum()
    }

    /// Checks the board against a layout and ensures every value lies in `[0, modulus)`.
    pub fn validate(&self, layout: &[usize], modulus: u64) -> Result<(), SolveError> {
        let found = self.layout();
        if found != layout {
            return Err(SolveError::ShapeMismatch {
                expected: layout.to_vec(),
                found,
            });
        }
        for (row, values) in self.rows.iter().enumerate() {
            for (col, &value) in values.iter().enumerate() {
                if value >= modulus {
                    return Err(SolveError::ValueOutOfRange {
                        row,
                        col,
                        value,
                        modulus,
                    });
                }
            }
        }
        Ok(())
    }

    /// Parses a board from whitespace-separated rows. A `topology` header, if present,
    /// is ignored; use `parser::parse_board_file` to read it.
    pub fn parse(input: &str) -> Result<Board, SolveError> {
        ::parser::parse_board_file(input).map(|f| f.board)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", row.iter().join(" "))?;
        }
        Ok(())
    }
}

#[test]
fn test_from_cells() {
    let b = Board::from_cells(&[1, 3, 1], &[1, 2, 3, 4, 5]);
    assert_eq!(b.rows(), &[vec![1], vec![2, 3, 4], vec![5]]);
    assert_eq!(b.cells(), vec![1, 2, 3, 4, 5]);
    assert_eq!(b.layout(), vec![1, 3, 1]);
    assert_eq!(b.rectangular(), None);
    assert_eq!(b.weight(), 15);
    assert_eq!(b.locate(0), (0, 0));
    assert_eq!(b.locate(3), (1, 2));
    assert_eq!(b.locate(4), (2, 0));
}

#[test]
fn test_validate() {
    let b = Board::new(vec![vec![0, 1], vec![2, 0]]);
    assert_eq!(b.rectangular(), Some((2, 2)));
    assert!(b.validate(&[2, 2], 3).is_ok());
    assert_eq!(
        b.validate(&[2, 2], 2),
        Err(SolveError::ValueOutOfRange {
            row: 1,
            col: 0,
            value: 2,
            modulus: 2
        })
    );
    assert_eq!(
        b.validate(&[2, 2, 2], 3),
        Err(SolveError::ShapeMismatch {
            expected: vec![2, 2, 2],
            found: vec![2, 2]
        })
    );
}

#[test]
fn test_display() {
    let b = Board::new(vec![vec![0, 1, 2], vec![3, 4, 5]]);
    assert_eq!(b.to_string(), "0 1 2\n3 4 5");
    assert_eq!(Board::parse(&b.to_string()), Ok(b));
}
