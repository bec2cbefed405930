#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Literals over zero-indexed variables.
//!
//! A literal is a fixed two-field record: a [`Polarity`] and a variable index.
//! Polarity `0` is the positive literal (true when the variable is 1), polarity
//! `1` is the negated literal (true when the variable is 0).

use crate::sat::error::FormulaError;
use core::ops::{Neg, Not};
use std::fmt;

/// Index of a propositional variable, in `0..num_vars`.
pub type Variable = usize;

/// Sign of a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Polarity {
    /// Polarity `0`: satisfied when the variable is assigned `true`.
    #[default]
    Positive,
    /// Polarity `1`: satisfied when the variable is assigned `false`.
    Negative,
}

impl Polarity {
    /// The numeric encoding used by the pair-based formula input.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Positive => 0,
            Self::Negative => 1,
        }
    }

    /// The opposite polarity.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Positive => Self::Negative,
            Self::Negative => Self::Positive,
        }
    }
}

impl TryFrom<u8> for Polarity {
    type Error = FormulaError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Positive),
            1 => Ok(Self::Negative),
            other => Err(FormulaError::InvalidPolarity(other)),
        }
    }
}

/// A literal: a variable together with the polarity it appears with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Literal {
    variable: Variable,
    polarity: Polarity,
}

impl Literal {
    /// Creates a literal on `variable` with the given polarity.
    #[must_use]
    pub const fn new(variable: Variable, polarity: Polarity) -> Self {
        Self { variable, polarity }
    }

    /// The literal that is true when `variable` is true.
    #[must_use]
    pub const fn positive(variable: Variable) -> Self {
        Self::new(variable, Polarity::Positive)
    }

    /// The literal that is true when `variable` is false.
    #[must_use]
    pub const fn negative(variable: Variable) -> Self {
        Self::new(variable, Polarity::Negative)
    }

    /// Builds a literal from the `(polarity, variable)` pair encoding.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::InvalidPolarity`] if `polarity` is neither 0 nor 1.
    pub fn from_pair(polarity: u8, variable: Variable) -> Result<Self, FormulaError> {
        Ok(Self::new(variable, Polarity::try_from(polarity)?))
    }

    /// The literal that is false exactly when a variable holds `value`.
    ///
    /// Learned clauses are built from these: every literal negates the value its
    /// variable had in the conflicting assignment.
    #[must_use]
    pub const fn falsified_by(variable: Variable, value: bool) -> Self {
        if value {
            Self::negative(variable)
        } else {
            Self::positive(variable)
        }
    }

    /// The variable index.
    #[must_use]
    pub const fn variable(self) -> Variable {
        self.variable
    }

    /// The sign.
    #[must_use]
    pub const fn polarity(self) -> Polarity {
        self.polarity
    }

    /// Whether this is the negative literal.
    #[must_use]
    pub const fn is_negated(self) -> bool {
        matches!(self.polarity, Polarity::Negative)
    }

    /// The value the variable must take for this literal to be true.
    #[must_use]
    pub const fn forcing_value(self) -> bool {
        !self.is_negated()
    }

    /// Whether the literal is true when its variable holds `value`.
    #[must_use]
    pub const fn is_satisfied_by(self, value: bool) -> bool {
        value == self.forcing_value()
    }

    /// The complementary literal.
    #[must_use]
    pub const fn negated(self) -> Self {
        Self::new(self.variable, self.polarity.flipped())
    }

    /// Converts a signed DIMACS literal (`k` or `-k`, `k >= 1`) to variable `k - 1`.
    ///
    /// Returns `None` for `0`, which DIMACS uses as the clause terminator.
    #[must_use]
    pub fn from_dimacs(value: i64) -> Option<Self> {
        if value == 0 {
            return None;
        }
        let variable = usize::try_from(value.unsigned_abs() - 1).ok()?;
        Some(if value > 0 {
            Self::positive(variable)
        } else {
            Self::negative(variable)
        })
    }

    /// The signed DIMACS form of this literal (variable index shifted by one).
    #[must_use]
    pub fn to_dimacs(self) -> i64 {
        let magnitude = i64::try_from(self.variable).map_or(i64::MAX, |v| v + 1);
        if self.is_negated() {
            -magnitude
        } else {
            magnitude
        }
    }
}

impl Not for Literal {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.negated()
    }
}

impl Neg for Literal {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negated()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_dimacs())
    }
}
