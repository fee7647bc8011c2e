//! # Fraction
//!
//! Exact rationals, always kept in lowest terms with the sign on the numerator.
//! Probabilities and expected costs are never approximated with floats.

use crate::divisors::euclid;
use crate::error::{CubiqueError, Result};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::ops::{Add, Mul, Neg, Sub};

/// `numerator / denominator` with `denominator > 0` and `gcd(|numerator|, denominator) == 1`.
/// Zero is `0/1`, so derived equality is structural equality of the value.
///
/// The `checked_*` methods report a result that does not fit back into 64 bits as
/// `Overflow`. The ring operators behave like the primitive integers and panic instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fraction {
    numerator: i64,
    denominator: i64,
}

impl Fraction {
    /// Normalize an arbitrary pair
    pub fn new(numerator: i64, denominator: i64) -> Result<Self> {
        if denominator == 0 {
            return Err(CubiqueError::DivisionByZero);
        }
        Self::reduced(numerator as i128, denominator as i128).ok_or(CubiqueError::Overflow)
    }
    #[inline] pub const fn zero() -> Self { Fraction { numerator: 0, denominator: 1 } }
    #[inline] pub const fn one() -> Self { Fraction { numerator: 1, denominator: 1 } }

    #[inline] pub fn numerator(&self) -> i64 { self.numerator }
    #[inline] pub fn denominator(&self) -> i64 { self.denominator }
    #[inline] pub fn is_zero(&self) -> bool { self.numerator == 0 }
    #[inline] pub fn is_one(&self) -> bool { *self == Self::one() }
    #[inline] pub fn is_negative(&self) -> bool { self.numerator < 0 }

    pub fn checked_add(self, other: Fraction) -> Result<Self> {
        let n = self.numerator as i128 * other.denominator as i128 + other.numerator as i128 * self.denominator as i128;
        let d = self.denominator as i128 * other.denominator as i128;
        Self::reduced(n, d).ok_or(CubiqueError::Overflow)
    }

    pub fn checked_sub(self, other: Fraction) -> Result<Self> {
        let n = self.numerator as i128 * other.denominator as i128 - other.numerator as i128 * self.denominator as i128;
        let d = self.denominator as i128 * other.denominator as i128;
        Self::reduced(n, d).ok_or(CubiqueError::Overflow)
    }

    pub fn checked_mul(self, other: Fraction) -> Result<Self> {
        let n = self.numerator as i128 * other.numerator as i128;
        let d = self.denominator as i128 * other.denominator as i128;
        Self::reduced(n, d).ok_or(CubiqueError::Overflow)
    }

    pub fn checked_div(self, other: Fraction) -> Result<Self> {
        if other.is_zero() {
            return Err(CubiqueError::DivisionByZero);
        }
        let n = self.numerator as i128 * other.denominator as i128;
        let d = self.denominator as i128 * other.numerator as i128;
        Self::reduced(n, d).ok_or(CubiqueError::Overflow)
    }

    pub fn inv(self) -> Result<Self> {
        Self::one().checked_div(self)
    }

    /// Fails only for a numerator of `i64::MIN`
    pub fn abs(self) -> Result<Self> {
        let numerator = self.numerator.checked_abs().ok_or(CubiqueError::Overflow)?;
        Ok(Fraction { numerator, ..self })
    }

    /// Lossy, only meant for display and sampling sanity checks
    pub fn to_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Sign moved to the numerator and common factors removed. `None` when it does not fit in 64 bits.
    fn reduced(numerator: i128, denominator: i128) -> Option<Self> {
        debug_assert!(denominator != 0);
        let (numerator, denominator) = if denominator < 0 { (-numerator, -denominator) } else { (numerator, denominator) };
        if numerator == 0 {
            return Some(Self::zero());
        }
        let gcd = euclid(numerator.unsigned_abs(), denominator.unsigned_abs()) as i128;
        Some(Fraction {
            numerator: i64::try_from(numerator / gcd).ok()?,
            denominator: i64::try_from(denominator / gcd).ok()?,
        })
    }
}

impl Default for Fraction {
    fn default() -> Self { Self::zero() }
}

fn overflowed(operation: &str, a: Fraction, b: Fraction) -> ! {
    panic!("{} {} {} does not fit in a 64 bit fraction", a, operation, b)
}

impl Add for Fraction {
    type Output = Fraction;
    fn add(self, other: Fraction) -> Fraction {
        self.checked_add(other).unwrap_or_else(|_| overflowed("+", self, other))
    }
}

impl Sub for Fraction {
    type Output = Fraction;
    fn sub(self, other: Fraction) -> Fraction {
        self.checked_sub(other).unwrap_or_else(|_| overflowed("-", self, other))
    }
}

impl Neg for Fraction {
    type Output = Fraction;
    fn neg(self) -> Fraction {
        Fraction::zero().checked_sub(self).unwrap_or_else(|_| overflowed("-", Fraction::zero(), self))
    }
}

impl Mul for Fraction {
    type Output = Fraction;
    fn mul(self, other: Fraction) -> Fraction {
        self.checked_mul(other).unwrap_or_else(|_| overflowed("*", self, other))
    }
}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        // denominators are positive, so cross multiplying keeps the order
        let left = self.numerator as i128 * other.denominator as i128;
        let right = other.numerator as i128 * self.denominator as i128;
        left.cmp(&right)
    }
}

impl Display for Fraction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}
