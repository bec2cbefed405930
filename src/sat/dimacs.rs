#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! A parser for the DIMACS CNF file format.
//!
//! The format includes:
//! - Comment lines starting with `c`.
//! - A problem line `p cnf <num_variables> <num_clauses>`. The variable count
//!   is taken as a lower bound and grown if a clause mentions a larger
//!   variable. The clause count is informational only.
//! - Clauses as whitespace-separated signed integers, each clause terminated
//!   by `0`. A clause may span several lines.
//! - An optional `%` line marking the end of data (SATLIB benchmarks).
//!
//! DIMACS variable `k` is variable index `k - 1` in the resulting [`Cnf`].

use crate::sat::clause::Clause;
use crate::sat::cnf::Cnf;
use crate::sat::error::ParseError;
use crate::sat::literal::Literal;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Largest variable count a parsed formula may have.
///
/// Every variable costs a graph node and several per-variable tables, so a
/// stray huge literal would otherwise exhaust memory during the solve.
pub const MAX_VARIABLES: usize = 1 << 24;

fn check_variable_count(line_no: usize, count: u64) -> Result<usize, ParseError> {
    usize::try_from(count)
        .ok()
        .filter(|&count| count <= MAX_VARIABLES)
        .ok_or(ParseError::TooManyVariables {
            line: line_no,
            count,
        })
}

fn parse_header(line_no: usize, line: &str) -> Result<usize, ParseError> {
    let invalid = || ParseError::InvalidHeader {
        line: line_no,
        content: line.to_string(),
    };
    let mut parts = line.split_whitespace().skip(1);
    if parts.next() != Some("cnf") {
        return Err(invalid());
    }
    let num_vars = parts
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(invalid)?;
    parts
        .next()
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or_else(invalid)?;
    check_variable_count(line_no, num_vars)
}

/// Parses DIMACS data from a `BufRead` source.
///
/// A terminator with no pending literals (a line holding just `0`) is skipped
/// rather than read as an empty clause. Literals left pending at end of input
/// form a final clause.
///
/// # Errors
///
/// - [`ParseError::Io`] if reading fails.
/// - [`ParseError::InvalidHeader`] for a malformed `p` line.
/// - [`ParseError::InvalidLiteral`] for a token that is not a signed integer.
/// - [`ParseError::TooManyVariables`] if the header or a literal implies more
///   than [`MAX_VARIABLES`] variables.
pub fn parse_dimacs<R: BufRead>(reader: R) -> Result<Cnf, ParseError> {
    let mut num_vars = 0;
    let mut clauses = Vec::new();
    let mut pending: Vec<Literal> = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let trimmed = line.trim_start();

        match trimmed.chars().next() {
            None | Some('c') => continue,
            Some('%') => break,
            Some('p') => {
                num_vars = num_vars.max(parse_header(line_no, trimmed)?);
                continue;
            }
            Some(_) => {}
        }

        for token in trimmed.split_whitespace() {
            let value = token
                .parse::<i64>()
                .map_err(|_| ParseError::InvalidLiteral {
                    line: line_no,
                    token: token.to_string(),
                })?;
            match Literal::from_dimacs(value) {
                Some(lit) => {
                    let count = check_variable_count(line_no, value.unsigned_abs())?;
                    num_vars = num_vars.max(count);
                    pending.push(lit);
                }
                None if pending.is_empty() => {}
                None => clauses.push(Clause::new(pending.drain(..))),
            }
        }
    }

    if !pending.is_empty() {
        clauses.push(Clause::new(pending));
    }

    Ok(Cnf::new(num_vars, clauses)?)
}

/// Parses a DIMACS CNF file.
///
/// # Errors
///
/// Fails if the file cannot be opened or its contents are malformed.
pub fn parse_file<P: AsRef<Path>>(file_path: P) -> Result<Cnf, ParseError> {
    let file = File::open(file_path)?;
    parse_dimacs(BufReader::new(file))
}
