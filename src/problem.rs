//! # Problem
//!
//! A die with `start_size` faces is thrown repeatedly; every throw multiplies the number of
//! equally likely outcomes (`current_size`). The goal is to map those outcomes onto
//! `target_size` equally likely results, which is done once the target has been reduced to 1.

use crate::divisors::{list_common_divisors, list_divisors};
use crate::error::{CubiqueError, Result};
use crate::fraction::Fraction;
use crate::utils::Size;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Problem {
    start_size: Size,
    current_size: Size,
    target_size: Size,
}

/// Both ways an imperfect reduction can go, and how likely the bad one is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TryReduceOutcome {
    /// The reduction went through: the target shrinks and the used outcomes are spent
    pub ok: Problem,
    /// We landed in the remainder: only `current % factor` outcomes are left
    pub err: Problem,
    pub err_rate: Fraction,
}

/// A move that is legal from some problem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidAction {
    Rethrow,
    Reduce { factor: Size },
    TryReduce { factor: Size, err_rate: Fraction },
}

impl Problem {
    /// Nothing thrown yet
    pub fn new(start_size: Size, target_size: Size) -> Result<Self> {
        Self::with_current(start_size, 1, target_size)
    }

    pub fn with_current(start_size: Size, current_size: Size, target_size: Size) -> Result<Self> {
        for size in [start_size, current_size, target_size] {
            if size == 0 {
                return Err(CubiqueError::NotNatural(size));
            }
        }
        Ok(Problem { start_size, current_size, target_size })
    }

    #[inline] pub fn start_size(&self) -> Size { self.start_size }
    #[inline] pub fn current_size(&self) -> Size { self.current_size }
    #[inline] pub fn target_size(&self) -> Size { self.target_size }
    #[inline] pub fn is_solved(&self) -> bool { self.target_size == 1 }

    // ---------- Transitions ---------- //
    /// Throw the die once more
    pub fn rethrow(&self) -> Result<Problem> {
        let current_size = self.current_size.checked_mul(self.start_size).ok_or(CubiqueError::Overflow)?;
        Ok(Problem { current_size, ..*self })
    }

    /// Remove a factor common to both sides. Free: no throw is spent.
    pub fn reduce(&self, factor: Size) -> Result<Problem> {
        if factor == 0 {
            return Err(self.invalid(factor, "the factor must be positive"));
        }
        if self.current_size % factor != 0 {
            return Err(self.invalid(factor, "the current size is not a multiple of it"));
        }
        if self.target_size % factor != 0 {
            return Err(self.invalid(factor, "the target size is not a multiple of it"));
        }
        Ok(Problem {
            current_size: self.current_size / factor,
            target_size: self.target_size / factor,
            ..*self
        })
    }

    /// Map the largest multiple of `factor` below the current size onto `factor` outcomes of
    /// the target. The remainder is the error branch.
    pub fn try_reduce(&self, factor: Size) -> Result<TryReduceOutcome> {
        if factor == 0 {
            return Err(self.invalid(factor, "the factor must be positive"));
        }
        if self.current_size <= factor {
            return Err(self.invalid(factor, "the current size is not larger than it"));
        }
        if self.target_size % factor != 0 {
            return Err(self.invalid(factor, "the target size is not a multiple of it"));
        }
        if self.current_size % factor == 0 {
            return Err(self.invalid(factor, "the current size is a multiple of it, reduce instead"));
        }

        let ok = Problem { current_size: 1, target_size: self.target_size / factor, ..*self };
        let err = Problem { current_size: self.current_size % factor, ..*self };
        Ok(TryReduceOutcome { ok, err, err_rate: self.err_rate(factor)? })
    }

    /// Every legal move: rethrow, then reductions, then imperfect reductions, factors ascending
    pub fn list_valid_actions(&self) -> Result<Vec<ValidAction>> {
        let mut actions = vec![];

        if !self.is_solved() {
            actions.push(ValidAction::Rethrow);
        }

        for factor in list_common_divisors(self.current_size, self.target_size)? {
            if factor > 1 {
                actions.push(ValidAction::Reduce { factor });
            }
        }

        for factor in list_divisors(self.target_size)? {
            if factor > 1 && factor < self.current_size && self.current_size % factor != 0 {
                actions.push(ValidAction::TryReduce { factor, err_rate: self.err_rate(factor)? });
            }
        }

        Ok(actions)
    }

    fn err_rate(&self, factor: Size) -> Result<Fraction> {
        let remainder = i64::try_from(self.current_size % factor).map_err(|_| CubiqueError::Overflow)?;
        let total = i64::try_from(self.current_size).map_err(|_| CubiqueError::Overflow)?;
        Fraction::new(remainder, total)
    }

    fn invalid(&self, factor: Size, reason: &'static str) -> CubiqueError {
        CubiqueError::InvalidFactor { factor, problem: self.to_string(), reason }
    }
}

impl Display for Problem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.current_size, self.target_size)
    }
}

impl Display for ValidAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidAction::Rethrow => write!(f, "Rethrow"),
            ValidAction::Reduce { factor } => write!(f, "Reduce by {}", factor),
            ValidAction::TryReduce { factor, err_rate } => {
                write!(f, "Try to reduce by {} (error rate = {})", factor, err_rate)
            }
        }
    }
}
