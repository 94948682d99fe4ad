use std::error::Error;
use std::fmt;

/// Malformed input, rejected before any toggle system is built.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SolveError {
    /// The ring must have at least two elements.
    InvalidModulus(u64),
    /// The board's row lengths do not match the topology's layout.
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    /// A cell value is not reduced into `[0, N)`.
    ValueOutOfRange {
        row: usize,
        col: usize,
        value: u64,
        modulus: u64,
    },
    /// A press pattern names a cell that does not exist.
    CellOutOfBounds { cell: usize, target: usize, cells: usize },
    /// Pressing a cell must toggle the cell itself.
    MissingSelfToggle { cell: usize },
    /// `target` is toggled by pressing `cell`, but not the other way around
    /// (or with a different multiplicity).
    AsymmetricToggle { cell: usize, target: usize },
    /// A binary plan cannot be ordered so that every press lands on a lit cell;
    /// `pending` presses were left when every reachable cell was dark.
    NoLitOnlyOrder { pending: usize },
    /// A board file or topology description could not be read.
    Parse(String),
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SolveError::InvalidModulus(n) => write!(f, "invalid modulus {}: need N >= 2", n),
            SolveError::ShapeMismatch {
                ref expected,
                ref found,
            } => write!(
                f,
                "board shape mismatch: expected row lengths {:?}, found {:?}",
                expected, found
            ),
            SolveError::ValueOutOfRange {
                row,
                col,
                value,
                modulus,
            } => write!(
                f,
                "cell ({}, {}) has value {} outside of [0, {})",
                row, col, value, modulus
            ),
            SolveError::CellOutOfBounds {
                cell,
                target,
                cells,
            } => write!(
                f,
                "pressing cell {} toggles cell {}, but the board only has {} cells",
                cell, target, cells
            ),
            SolveError::MissingSelfToggle { cell } => {
                write!(f, "pressing cell {} does not toggle the cell itself", cell)
            }
            SolveError::AsymmetricToggle { cell, target } => write!(
                f,
                "asymmetric toggle relation: pressing {} toggles {} a different number of times than the reverse",
                cell, target
            ),
            SolveError::NoLitOnlyOrder { pending } => write!(
                f,
                "no press order keeps to lit cells: {} presses left on a dark board",
                pending
            ),
            SolveError::Parse(ref msg) => write!(f, "parse error: {}", msg),
        }
    }
}

impl Error for SolveError {}
