//! Parser for board files.

use std::fs;
use std::str::FromStr;

use pest::iterators::Pair;
use pest::Parser;

use board::Board;
use error::SolveError;

#[cfg(debug_assertions)]
const _GRAMMAR: &str = include_str!("grammar.pest");

#[derive(Parser)]
#[grammar = "parser/grammar.pest"]
struct BoardParser;

/// The `topology <name> [args] [modulo <N>]` line.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Header {
    pub topology: String,
    pub args: Vec<usize>,
    pub modulus: Option<u64>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BoardFile {
    pub header: Option<Header>,
    pub board: Board,
}

fn parse_number<T: FromStr>(e: Pair<Rule>) -> Result<T, SolveError> {
    if e.as_rule() != Rule::number {
        unreachable!("Cannot parse {:#?} as number", e);
    }
    e.as_str()
        .parse()
        .map_err(|_| SolveError::Parse(format!("number out of range: {}", e.as_str())))
}

fn parse_header(e: Pair<Rule>) -> Result<Header, SolveError> {
    let mut topology = String::new();
    let mut args = vec![];
    let mut modulus = None;
    for x in e.into_inner() {
        match x.as_rule() {
            Rule::name => topology = x.as_str().to_lowercase(),
            Rule::number => args.push(parse_number(x)?),
            Rule::modulus => {
                for n in x.into_inner() {
                    modulus = Some(parse_number(n)?);
                }
            }
            r => unreachable!("Unexpected {:?} in header", r),
        }
    }
    Ok(Header {
        topology,
        args,
        modulus,
    })
}

/// Parses the contents of a board file.
pub fn parse_board_file(input: &str) -> Result<BoardFile, SolveError> {
    let mut pairs =
        BoardParser::parse(Rule::file, input).map_err(|e| SolveError::Parse(e.to_string()))?;
    let file = match pairs.next() {
        Some(file) => file,
        None => return Err(SolveError::Parse("empty input".to_string())),
    };

    let mut header = None;
    let mut rows = vec![];
    for x in file.into_inner() {
        match x.as_rule() {
            Rule::header => header = Some(parse_header(x)?),
            Rule::row => rows.push(
                x.into_inner()
                    .map(parse_number)
                    .collect::<Result<Vec<u64>, _>>()?,
            ),
            _ => {}
        }
    }

    trace!("Parsed {} rows, header {:?}", rows.len(), header);
    Ok(BoardFile {
        header,
        board: Board::new(rows),
    })
}

/// Reads and parses a board file from disk.
pub fn parse_file(filename: &str) -> Result<BoardFile, SolveError> {
    let s = fs::read_to_string(filename)
        .map_err(|e| SolveError::Parse(format!("Unable to read {}: {}", filename, e)))?;
    parse_board_file(&s)
}

#[test]
fn test_plain_board() {
    let f = parse_board_file("1 0 1\n0 1 0\n").unwrap();
    assert_eq!(f.header, None);
    assert_eq!(f.board, Board::new(vec![vec![1, 0, 1], vec![0, 1, 0]]));
}

#[test]
fn test_header_and_comments() {
    let input = "# a small diamond\n\ntopology Diamond 1 modulo 3\n  2\n1 0 1   # middle row\n0\n";
    let f = parse_board_file(input).unwrap();
    assert_eq!(
        f.header,
        Some(Header {
            topology: "diamond".to_string(),
            args: vec![1],
            modulus: Some(3),
        })
    );
    assert_eq!(f.board.layout(), vec![1, 3, 1]);
    assert_eq!(f.board.get(1, 2), 1);
}

#[test]
fn test_header_without_modulus() {
    let f = parse_board_file("topology knight\n0 0\n0 0").unwrap();
    let h = f.header.unwrap();
    assert_eq!(h.topology, "knight");
    assert!(h.args.is_empty());
    assert_eq!(h.modulus, None);
    assert_eq!(f.board.cell_count(), 4);
}

#[test]
fn test_parse_errors() {
    assert!(parse_board_file("1 x 0").is_err());
    assert!(parse_board_file("1 0\ntopology cross").is_err());
    assert!(parse_board_file("99999999999999999999999").is_err());
}
