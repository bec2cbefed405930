#![allow(clippy::cast_precision_loss)]

use anyhow::{Context, anyhow, ensure};
use backjump_sat::sat::cdcl::Cdcl;
use backjump_sat::sat::cnf::Cnf;
use backjump_sat::sat::dimacs::{parse_dimacs, parse_file};
use backjump_sat::sat::solver::{SolutionStats, Solutions, Solver};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tikv_jemalloc_ctl::{epoch, stats};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Defines the command-line interface for the solver.
///
/// Uses `clap` for parsing arguments.
#[derive(Parser, Debug)]
#[command(
    name = "backjump-sat",
    version,
    about = "A clause-learning SAT solver with non-chronological backjumping"
)]
pub(crate) struct Cli {
    /// An optional path argument. If provided without a subcommand,
    /// it's treated as the path to a DIMACS .cnf file to solve.
    pub path: Option<PathBuf>,

    /// Specifies the subcommand to execute (e.g. `file`, `text`, `dir`).
    #[clap(subcommand)]
    pub command: Option<Commands>,

    /// Common options applicable to all commands.
    #[command(flatten)]
    pub common: CommonOptions,
}

/// Enumerates the available subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Solve a CNF file in DIMACS format.
    File {
        /// Path to the DIMACS .cnf file.
        #[arg(long)]
        path: PathBuf,

        /// Common options for this subcommand.
        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve a CNF formula provided as plain text.
    Text {
        /// Literal CNF input as a string (e.g. "1 -2 0\n2 3 0").
        /// Literals are space-separated and 0 terminates a clause.
        #[arg(short, long)]
        input: String,

        /// Common options for this subcommand.
        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve every `.cnf` file below a directory.
    Dir {
        /// Directory to walk.
        #[arg(long)]
        path: PathBuf,

        /// Common options for this subcommand.
        #[command(flatten)]
        common: CommonOptions,
    },

    /// Generate shell completion scripts.
    Completions {
        /// The shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Commands {
    const fn common(&self) -> Option<&CommonOptions> {
        match self {
            Self::File { common, .. } | Self::Text { common, .. } | Self::Dir { common, .. } => {
                Some(common)
            }
            Self::Completions { .. } => None,
        }
    }
}

/// Defines common command-line options shared across different subcommands.
#[derive(Args, Debug, Default, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct CommonOptions {
    /// Log verbosity: `-v` info, `-vv` debug, `-vvv` trace. `RUST_LOG` overrides it.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub(crate) verbose: u8,

    /// Check the model against the original formula.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub(crate) verify: bool,

    /// Print problem and search statistics after solving.
    #[arg(short, long, default_value_t = true, action = clap::ArgAction::Set)]
    pub(crate) stats: bool,

    /// Print the satisfying assignment if the formula is satisfiable.
    #[arg(short, long, default_value_t = false)]
    pub(crate) print_solution: bool,

    /// Print every clause learned during the search.
    #[arg(short = 'l', long, default_value_t = false)]
    pub(crate) print_learned: bool,
}

impl Cli {
    /// Verbosity requested either before or after the subcommand.
    pub(crate) fn verbosity(&self) -> u8 {
        self.command
            .as_ref()
            .and_then(Commands::common)
            .map_or(self.common.verbose, |common| {
                common.verbose.max(self.common.verbose)
            })
    }
}

/// Installs the global `tracing` subscriber, writing to stderr.
pub(crate) fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Writes a completion script for `shell` to stdout.
pub(crate) fn print_completions(shell: clap_complete::Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}

/// Parses and solves a single DIMACS file.
///
/// # Errors
///
/// If the file cannot be parsed, or the solver fails.
pub(crate) fn solve_path(path: &Path, common: &CommonOptions) -> anyhow::Result<()> {
    let time = Instant::now();
    let cnf = parse_file(path).with_context(|| format!("failed to parse {}", path.display()))?;
    let elapsed = time.elapsed();

    solve_and_report(&cnf, common, Some(path), elapsed)
}

/// Parses and solves a formula given inline. Escaped `\n` sequences are
/// accepted as line breaks.
///
/// # Errors
///
/// If the text is not valid DIMACS, or the solver fails.
pub(crate) fn solve_text(input: &str, common: &CommonOptions) -> anyhow::Result<()> {
    let time = Instant::now();
    let text = input.replace("\\n", "\n");
    let cnf = parse_dimacs(Cursor::new(text)).context("failed to parse text input")?;
    let elapsed = time.elapsed();

    solve_and_report(&cnf, common, None, elapsed)
}

/// Solves a directory of CNF files.
///
/// Iterates over all `.cnf` files below `path`, parsing, solving and reporting
/// each one in turn.
///
/// # Errors
///
/// If `path` is not a directory or any file fails to parse or solve.
pub(crate) fn solve_dir(path: &Path, common: &CommonOptions) -> anyhow::Result<()> {
    ensure!(
        path.is_dir(),
        "provided path is not a directory: {}",
        path.display()
    );

    for entry in walkdir::WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        let file_path = entry.path();
        if !file_path.is_file() {
            continue;
        }
        if file_path.extension().is_none_or(|ext| ext != "cnf") {
            warn!(path = %file_path.display(), "skipping non-CNF file");
            continue;
        }

        solve_path(file_path, common)?;
    }

    Ok(())
}

/// Verifies a given solution (`sol`) against a CNF formula (`cnf`).
///
/// # Errors
///
/// If the model falsifies some clause.
pub(crate) fn verify_solution(cnf: &Cnf, sol: Option<&Solutions>) -> anyhow::Result<()> {
    if let Some(sol_values) = sol {
        let ok = cnf.verify(sol_values);
        println!("Verified: {ok:?}");
        ensure!(ok, "solution failed verification");
    } else {
        println!("UNSAT");
    }
    Ok(())
}

/// Runs the solver on `cnf`.
///
/// # Errors
///
/// If the engine reports a broken internal invariant.
pub(crate) fn solve(
    cnf: &Cnf,
    label: Option<&Path>,
) -> anyhow::Result<(Cdcl, Option<Solutions>, Duration)> {
    if let Some(name) = label {
        println!("Solving: {}", name.display());
    }
    debug!(
        variables = cnf.num_vars,
        clauses = cnf.len(),
        literals = cnf.num_literals(),
        "formula loaded"
    );

    let time = Instant::now();
    let mut solver = Cdcl::new(cnf.clone());
    let sol = solver.solve().context("solver failed")?;
    let elapsed = time.elapsed();

    debug!(?elapsed, "search finished");
    Ok((solver, sol, elapsed))
}

/// Reads allocated and resident memory from jemalloc, in MiB.
fn memory_usage() -> anyhow::Result<(f64, f64)> {
    epoch::advance().map_err(|e| anyhow!("jemalloc epoch: {e}"))?;

    let allocated_bytes = stats::allocated::read().map_err(|e| anyhow!("jemalloc stats: {e}"))?;
    let resident_bytes = stats::resident::read().map_err(|e| anyhow!("jemalloc stats: {e}"))?;

    Ok((
        allocated_bytes as f64 / (1024.0 * 1024.0),
        resident_bytes as f64 / (1024.0 * 1024.0),
    ))
}

/// Solves `cnf` and reports results including stats and verification.
///
/// # Errors
///
/// If solving or verification fails, or memory statistics are unavailable.
pub(crate) fn solve_and_report(
    cnf: &Cnf,
    common: &CommonOptions,
    label: Option<&Path>,
    parse_time: Duration,
) -> anyhow::Result<()> {
    let (solver, sol, elapsed) = solve(cnf, label)?;
    let (allocated_mib, resident_mib) = memory_usage()?;

    if common.verify {
        verify_solution(cnf, sol.as_ref())?;
    }

    if common.stats {
        print_stats(
            parse_time,
            elapsed,
            cnf,
            &solver.stats(),
            allocated_mib,
            resident_mib,
        );
    }

    if common.print_learned {
        println!("Learned clauses:");
        for clause in solver.learned_clauses() {
            println!("{clause}");
        }
    }

    if let Some(solutions) = &sol {
        if common.print_solution {
            println!("Solutions: {solutions}");
        }
        println!("\nSATISFIABLE");
    } else {
        println!("\nUNSATISFIABLE");
    }

    Ok(())
}

/// Helper function to print a single statistic line in a formatted table row.
pub(crate) fn stat_line(label: &str, value: impl std::fmt::Display) {
    println!("|  {label:<28} {value:>18}  |");
}

/// Helper function to print a statistic line that includes a rate (value/second).
pub(crate) fn stat_line_with_rate(label: &str, value: usize, elapsed: f64) {
    let rate = if elapsed > 0.0 {
        value as f64 / elapsed
    } else {
        0.0
    };
    println!("|  {label:<20} {value:>12} ({rate:>9.0}/sec)  |");
}

/// Prints a summary of problem and search statistics.
pub(crate) fn print_stats(
    parse_time: Duration,
    elapsed: Duration,
    cnf: &Cnf,
    s: &SolutionStats,
    allocated: f64,
    resident: f64,
) {
    let elapsed_secs = elapsed.as_secs_f64();

    println!("\n=======================[ Problem Statistics ]=========================");
    stat_line("Parse time (s)", format!("{:.3}", parse_time.as_secs_f64()));
    stat_line("Variables", cnf.num_vars);
    stat_line("Clauses (original)", cnf.len());
    stat_line("Literals (original)", cnf.num_literals());

    println!("========================[ Search Statistics ]========================");
    stat_line("Learnt clauses", s.learnt_clauses);
    stat_line("Total clauses (incl. learnt)", cnf.len() + s.learnt_clauses);
    stat_line_with_rate("Conflicts", s.conflicts, elapsed_secs);
    stat_line_with_rate("Decisions", s.decisions, elapsed_secs);
    stat_line_with_rate("Propagations", s.propagations, elapsed_secs);
    stat_line_with_rate("Backjumps", s.backjumps, elapsed_secs);
    stat_line_with_rate("Restarts", s.restarts, elapsed_secs);
    stat_line("Attempts", s.attempts());
    stat_line("Memory usage (MiB)", format!("{allocated:.2}"));
    stat_line("Resident memory (MiB)", format!("{resident:.2}"));
    stat_line("CPU time (s)", format!("{elapsed_secs:.3}"));
    println!("=====================================================================");
}
