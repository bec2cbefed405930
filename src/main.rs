//! # backjump-sat
//!
//! Command-line front end for the clause-learning solver. It reads formulas
//! in DIMACS CNF format and reports the model, search statistics and memory
//! usage.
//!
//! ## Usage
//!
//! ```sh
//! backjump-sat [OPTIONS] [PATH] [SUBCOMMAND]
//! ```
//!
//! - `backjump-sat problem.cnf`: solve a DIMACS file.
//! - `backjump-sat file --path problem.cnf`: same, as a subcommand.
//! - `backjump-sat text --input "1 -2 0\n2 3 0"`: solve an inline formula.
//! - `backjump-sat dir --path benchmarks/`: solve every `.cnf` file below a directory.
//! - `backjump-sat completions zsh`: print a shell completion script.
//!
//! ## Common options
//!
//! - `-v`, `-vv`, `-vvv`: log at info, debug or trace level (`RUST_LOG` overrides).
//! - `--verify <BOOL>`: check the model against the formula (default `true`).
//! - `-s, --stats <BOOL>`: print statistics (default `true`).
//! - `-p, --print-solution`: print the model as signed DIMACS literals.
//! - `-l, --print-learned`: print the learned clauses.

use crate::command_line::cli::{
    Cli, Commands, init_tracing, print_completions, solve_dir, solve_path, solve_text,
};
use clap::Parser;

mod command_line;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbosity());

    match cli.command {
        Some(Commands::File { path, common }) => solve_path(&path, &common),
        Some(Commands::Dir { path, common }) => solve_dir(&path, &common),
        Some(Commands::Text { input, common }) => solve_text(&input, &common),
        Some(Commands::Completions { shell }) => {
            print_completions(shell);
            Ok(())
        }
        None => match cli.path {
            Some(path) if path.is_dir() => solve_dir(&path, &cli.common),
            Some(path) => solve_path(&path, &cli.common),
            None => {
                eprintln!("No command provided. Use --help for more information.");
                std::process::exit(1);
            }
        },
    }
}
