extern crate clap;
extern crate env_logger;
extern crate lightsout;
#[macro_use]
extern crate log;

use std::process;

use clap::{App, Arg};

use lightsout::parser;
use lightsout::topology;
use lightsout::{solve, Outcome, SolverOptions};

fn parse_arg<T: std::str::FromStr>(matches: &clap::ArgMatches, name: &str) -> Option<T> {
    matches.value_of(name).map(|v| match v.parse() {
        Ok(x) => x,
        Err(_) => {
            eprintln!("Invalid value for --{}: {}", name, v);
            process::exit(2);
        }
    })
}

fn main() {
    let matches = App::new("lightsout")
        .version("0.1.0")
        .about("Finds a minimum-press solution of a toggle puzzle over Z/N")
        .arg(
            Arg::with_name("modulus")
                .short("n")
                .long("modulus")
                .value_name("N")
                .help("Number of cell states; overrides the board file header")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("topology")
                .short("t")
                .long("topology")
                .value_name("NAME")
                .help("cross, knight, diagonal, diamond, cube, rowcolumn or complete")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("workers")
                .short("w")
                .long("workers")
                .help("Number of workers (threads)")
                .default_value("1")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("limit")
                .long("limit")
                .value_name("K")
                .help("Largest number of free variables searched exhaustively")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("trials")
                .long("trials")
                .help("Random combinations tried when the search is not exhaustive")
                .default_value("20000")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("seed")
                .long("seed")
                .help("Seed of the random search")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("full-matrix")
                .long("full-matrix")
                .help("Never use the row recurrence"),
        )
        .arg(
            Arg::with_name("lit-only")
                .long("lit-only")
                .help("Lists the presses in an order that only presses lit cells (N = 2)"),
        )
        .arg(
            Arg::with_name("INPUT")
                .help("Board file to solve")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("v")
                .short("v")
                .multiple(true)
                .help("Sets the level of verbosity"),
        )
        .get_matches();

    let level = match matches.occurrences_of("v") {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let input = matches.value_of("INPUT").unwrap_or_default();
    let file = match parser::parse_file(input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    let header = file.header.as_ref();
    let modulus = parse_arg::<u64>(&matches, "modulus")
        .or_else(|| header.and_then(|h| h.modulus))
        .unwrap_or(2);
    let name = matches
        .value_of("topology")
        .map(|t| t.to_lowercase())
        .or_else(|| header.map(|h| h.topology.clone()))
        .unwrap_or_else(|| "cross".to_string());
    let args = header
        .filter(|h| h.topology == name)
        .map(|h| h.args.clone())
        .unwrap_or_default();

    let defaults = SolverOptions::default();
    let options = SolverOptions {
        enumeration_limit: parse_arg(&matches, "limit"),
        max_random_trials: parse_arg(&matches, "trials").unwrap_or(defaults.max_random_trials),
        workers: parse_arg(&matches, "workers").unwrap_or(defaults.workers),
        seed: parse_arg(&matches, "seed").unwrap_or(defaults.seed),
        use_row_recurrence: !matches.is_present("full-matrix"),
        ..defaults
    };

    let result = topology::from_name(&name, &args, &file.board).and_then(|t| {
        info!("Solving a {} board over Z/{}", t.name(), modulus);
        solve(t.as_ref(), &file.board, modulus, &options).map(|s| (t, s))
    });
    let (t, solution) = match result {
        Ok(x) => x,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    match solution.outcome {
        Outcome::Solved => {
            info!(
                "{} free variables, {} path, {} candidates examined",
                solution.free_variables, solution.path, solution.examined
            );
            for f in &solution.fallbacks {
                info!("Exact fallback: {:?}", f);
            }
            println!("{}", solution.press_plan);
            println!(
                "weight {}{}",
                solution.total_weight,
                if solution.optimal { "" } else { " (upper bound)" }
            );
            if matches.is_present("lit-only") {
                match solution.lit_only_moves(t.as_ref(), &file.board) {
                    Ok(moves) => {
                        for (r, c) in moves {
                            println!("press {} {}", r, c);
                        }
                    }
                    Err(e) => {
                        eprintln!("{}", e);
                        process::exit(1);
                    }
                }
            }
        }
        Outcome::NoSolution(reason) => {
            info!("{}", reason);
            println!("no solution");
            process::exit(3);
        }
    }
}
