//! # Linear expressions
//!
//! Affine expressions `bias + sum(weight * variable)` over exact fractions. Strategy costs
//! are expressed with these while a cycle (or an undecided node) keeps them from being a
//! plain number.

use crate::error::{CubiqueError, Result};
use crate::fraction::Fraction;
use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

// ---------- Variable ---------- //
/// An opaque unknown. Identity is the token itself, not its name: two variables built with
/// the same name are different unknowns.
#[derive(Clone)]
pub struct Variable(Rc<str>);

impl Variable {
    pub fn new(name: &str) -> Self { Variable(Rc::from(name)) }
    pub fn name(&self) -> &str { &self.0 }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.0, &other.0) }
}
impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as *const u8 as usize).hash(state)
    }
}

impl Debug for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { write!(f, "Variable({})", self.name()) }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.name()) }
}

// ---------- Variable factory ---------- //
/// Hands out fresh variables named `a`, `b`, ..., `z`, `aa`, `ab`, ... after an optional prefix,
/// and remembers which ones it issued.
#[derive(Debug, Default)]
pub struct VariableFactory {
    prefix: String,
    next: usize,
    issued: HashSet<Variable>,
}

impl VariableFactory {
    pub fn new() -> Self { Self::default() }

    pub fn with_prefix(prefix: &str) -> Self {
        VariableFactory { prefix: prefix.to_string(), ..Self::default() }
    }

    pub fn next_variable(&mut self) -> Variable {
        let variable = Variable::new(&format!("{}{}", self.prefix, letters(self.next)));
        self.next += 1;
        self.issued.insert(variable.clone());
        variable
    }

    /// Whether this factory issued the variable
    pub fn has(&self, variable: &Variable) -> bool { self.issued.contains(variable) }

    /// How many variables were handed out
    pub fn count(&self) -> usize { self.issued.len() }
}

/// Bijective base 26: 0 -> a, 25 -> z, 26 -> aa
fn letters(mut n: usize) -> String {
    let mut reversed = vec![];
    loop {
        reversed.push((b'a' + (n % 26) as u8) as char);
        if n < 26 { break; }
        n = n / 26 - 1;
    }
    reversed.iter().rev().collect()
}

// ---------- Linear expression ---------- //
/// `bias + sum(weights[v] * v)`. Zero weights are dropped as they appear, so derived
/// equality is equality of the expressions. Arithmetic is checked: a coefficient that
/// leaves the 64 bit range fails with `Overflow`.
#[derive(Clone, PartialEq, Default)]
pub struct LinearExpression {
    bias: Fraction,
    weights: HashMap<Variable, Fraction>,
}

impl LinearExpression {
    pub fn zero() -> Self { Self::default() }
    pub fn one() -> Self { Self::constant(Fraction::one()) }
    pub fn constant(bias: Fraction) -> Self { LinearExpression { bias, weights: HashMap::new() } }
    pub fn variable(variable: Variable) -> Self {
        let mut weights = HashMap::new();
        weights.insert(variable, Fraction::one());
        LinearExpression { bias: Fraction::zero(), weights }
    }

    #[inline] pub fn bias(&self) -> Fraction { self.bias }
    /// Coefficient of `variable`, zero when it does not appear
    #[inline] pub fn weight(&self, variable: &Variable) -> Fraction {
        self.weights.get(variable).copied().unwrap_or_else(Fraction::zero)
    }
    pub fn variables(&self) -> impl Iterator<Item = &Variable> { self.weights.keys() }
    pub fn depends_on(&self, variable: &Variable) -> bool { self.weights.contains_key(variable) }

    /// The plain number this expression is, if no unknown is left in it
    pub fn as_constant(&self) -> Option<Fraction> {
        if self.weights.is_empty() { Some(self.bias) } else { None }
    }

    /// `Some(v)` iff the expression is exactly `v`
    pub fn as_single_variable(&self) -> Option<&Variable> {
        if !self.bias.is_zero() || self.weights.len() != 1 {
            return None;
        }
        self.weights.iter().find(|(_, w)| w.is_one()).map(|(v, _)| v)
    }

    pub fn checked_add(mut self, other: &LinearExpression) -> Result<Self> {
        self.bias = self.bias.checked_add(other.bias)?;
        for (variable, weight) in other.weights.iter() {
            self.accumulate(variable, *weight)?;
        }
        Ok(self)
    }

    /// Scale every coefficient by `factor`
    pub fn checked_mul(&self, factor: Fraction) -> Result<Self> {
        if factor.is_zero() {
            return Ok(Self::zero());
        }
        let mut weights = HashMap::with_capacity(self.weights.len());
        for (variable, weight) in self.weights.iter() {
            weights.insert(variable.clone(), weight.checked_mul(factor)?);
        }
        Ok(LinearExpression { bias: self.bias.checked_mul(factor)?, weights })
    }

    /// Read `self` as the right hand side of `variable = self` and isolate `variable`:
    /// `variable = (self - w * variable) / (1 - w)`.
    pub fn solve_equals_to(&self, variable: &Variable) -> Result<Self> {
        let weight = self.weight(variable);
        let mut independent = self.clone();
        independent.weights.remove(variable);
        if weight.is_zero() {
            return Ok(independent);
        }
        let scale = Fraction::one().checked_sub(weight)?.inv()
            .map_err(|_| CubiqueError::DegenerateSolve { variable: variable.name().to_string() })?;
        independent.checked_mul(scale)
    }

    /// Replace every occurrence of `variable` by `expression`
    pub fn substitute(&self, variable: &Variable, expression: &LinearExpression) -> Result<Self> {
        let weight = self.weight(variable);
        let mut rest = self.clone();
        if weight.is_zero() {
            return Ok(rest);
        }
        rest.weights.remove(variable);
        rest.checked_add(&expression.checked_mul(weight)?)
    }

    /// Plug a value in for every unknown
    pub fn evaluate_with(&self, mut value: impl FnMut(&Variable) -> Fraction) -> Result<Fraction> {
        self.weights.iter()
            .try_fold(self.bias, |total, (v, w)| total.checked_add(w.checked_mul(value(v))?))
    }

    fn accumulate(&mut self, variable: &Variable, weight: Fraction) -> Result<()> {
        let total = self.weight(variable).checked_add(weight)?;
        if total.is_zero() {
            self.weights.remove(variable);
        } else {
            self.weights.insert(variable.clone(), total);
        }
        Ok(())
    }
}

impl Debug for LinearExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { write!(f, "LinearExpression({})", self) }
}

impl Display for LinearExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut sorted = self.weights.iter().collect::<Vec<_>>();
        sorted.sort_by(|a, b| a.0.name().cmp(b.0.name()));

        let mut first = true;
        if !self.bias.is_zero() {
            write!(f, "{}", self.bias)?;
            first = false;
        }
        for (variable, weight) in sorted {
            // sign and magnitude are written apart, so the magnitude never needs negating
            let sign = if weight.is_negative() { "-" } else { "+" };
            let unit = weight.denominator() == 1 && weight.numerator().unsigned_abs() == 1;
            match (first, weight.is_negative()) {
                (true, false) => {}
                (true, true) => write!(f, "- ")?,
                (false, _) => write!(f, " {} ", sign)?,
            }
            if !unit {
                write!(f, "{}", weight.numerator().unsigned_abs())?;
                if weight.denominator() != 1 {
                    write!(f, "/{}", weight.denominator())?;
                }
                write!(f, " ")?;
            }
            write!(f, "{}", variable)?;
            first = false;
        }
        if first {
            write!(f, "0")?;
        }
        Ok(())
    }
}
