//! # Divisors
//!
//! Small number theory helpers the puzzle leans on. All results are in ascending order.

use crate::error::{CubiqueError, Result};
use crate::utils::Size;

/// Every divisor of `n`, smallest first
pub fn list_divisors(n: Size) -> Result<Vec<Size>> {
    assert_natural(n)?;

    // Divisors pair up as (a, n/a), so walking a up to sqrt(n) finds the small half
    let mut small = vec![];
    let mut a = 1;
    while a <= n / a {
        if n % a == 0 {
            small.push(a);
        }
        a += 1;
    }

    // The large half mirrors the small one, reversed to stay ascending
    let mut large = small.iter().rev()
        .map(|&a| n / a)
        .filter(|&b| !small.contains(&b))
        .collect::<Vec<_>>();
    small.append(&mut large);
    Ok(small)
}

/// Divisors shared by `n1` and `n2`, smallest first
pub fn list_common_divisors(n1: Size, n2: Size) -> Result<Vec<Size>> {
    assert_natural(n1)?;
    assert_natural(n2)?;
    let (small, large) = (n1.min(n2), n1.max(n2));
    Ok(list_divisors(small)?.into_iter().filter(|d| large % d == 0).collect())
}

pub fn greatest_common_divisor(n1: Size, n2: Size) -> Result<Size> {
    assert_natural(n1)?;
    assert_natural(n2)?;
    Ok(euclid(n1 as u128, n2 as u128) as Size)
}

/// Plain Euclid, wide enough for the intermediate values of fraction arithmetic.
/// `euclid(0, b) == b`.
pub(crate) fn euclid(mut a: u128, mut b: u128) -> u128 {
    while a != 0 {
        let r = b % a;
        b = a;
        a = r;
    }
    b
}

fn assert_natural(n: Size) -> Result<()> {
    if n == 0 { Err(CubiqueError::NotNatural(n)) } else { Ok(()) }
}
