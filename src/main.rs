//! Beam Grid Puzzle CLI
//!
//! Lists, displays, and solves the built-in demo levels. Pieces slide on a
//! grid; same-colored pieces sharing a row or column connect with a beam,
//! and a level is won when every goal tile holds a matching piece and the
//! beam objectives are met.

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use thiserror::Error;

use beamgrid::board::BoardError;
use beamgrid::solver::{self, Outcome, SolverConfig};
use beamgrid::{levels, Board};

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error("no level with id {id}; run 'beamgrid list'")]
    NoSuchLevel { id: u32 },
}

/// Explores and solves beam puzzle levels.
#[derive(Parser)]
#[command(name = "beamgrid")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List the built-in levels.
    List,
    /// Print a level's board.
    Show { id: u32 },
    /// Find a minimum-move solution for a level.
    Solve {
        id: u32,
        /// Give up after expanding this many states.
        #[arg(long)]
        max_states: Option<usize>,
        /// Give up after this many seconds.
        #[arg(long)]
        time_limit: Option<u64>,
        /// Prune mirrored states on symmetric boards.
        #[arg(long)]
        symmetry: bool,
        /// Print every board along the winning line.
        #[arg(long)]
        trace: bool,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Command::List) | None => run_list(),
        Some(Command::Show { id }) => run_show(id),
        Some(Command::Solve {
            id,
            max_states,
            time_limit,
            symmetry,
            trace,
        }) => {
            let config = SolverConfig {
                max_states,
                time_limit: time_limit.map(Duration::from_secs),
                symmetry_reduction: symmetry,
            };
            run_solve(id, &config, trace)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run_list() -> Result<(), CliError> {
    println!("id  size   pieces  par  perfect");
    for board in levels::builtin_levels()? {
        let meta = board.meta();
        println!(
            "{:<3} {:>2}x{:<3} {:>6}  {:>3}  {:>7}",
            meta.id,
            board.width(),
            board.height(),
            board.arrangement().piece_count(),
            meta.par,
            meta.perfect,
        );
    }
    Ok(())
}

fn run_show(id: u32) -> Result<(), CliError> {
    let board = find_level(id)?;
    print!("{}", board.render());
    for &(color, count) in board.objectives() {
        println!("objective: {count} {color:?} beam(s)");
    }
    Ok(())
}

fn run_solve(id: u32, config: &SolverConfig, trace: bool) -> Result<(), CliError> {
    let board = find_level(id)?;
    match solver::solve(&board, config) {
        Outcome::Solved { moves, trace: line } => {
            println!("solved in {moves} move(s)");
            if trace {
                for (i, arr) in line.iter().enumerate() {
                    println!("after {i} move(s):");
                    print!("{}", board.render_with(arr));
                }
            }
        }
        Outcome::Unsolvable => println!("no solution exists"),
        Outcome::Aborted { states_explored } => {
            println!("gave up after exploring {states_explored} states")
        }
    }
    Ok(())
}

fn find_level(id: u32) -> Result<Board, CliError> {
    levels::builtin_level(id)?.ok_or(CliError::NoSuchLevel { id })
}
