//! Integer division helpers shared by the domain algebra and the encoders.

use num_traits::{PrimInt, Signed};

/// Floor division: `floor(b / a)`.
///
/// # Panics
///
/// Panics if `a` is zero.
pub fn floor_div<T: PrimInt + Signed>(b: T, a: T) -> T {
    let q = b / a;
    let r = b % a;
    if r != T::zero() && ((r < T::zero()) != (a < T::zero())) {
        q - T::one()
    } else {
        q
    }
}

/// Ceiling division: `ceil(b / a)`.
///
/// # Panics
///
/// Panics if `a` is zero.
pub fn ceil_div<T: PrimInt + Signed>(b: T, a: T) -> T {
    let q = b / a;
    let r = b % a;
    if r != T::zero() && ((r > T::zero()) == (a > T::zero())) {
        q + T::one()
    } else {
        q
    }
}

/// Greatest common divisor of the absolute values; `gcd(0, 0) == 0`.
pub fn gcd<T: PrimInt + Signed>(a: T, b: T) -> T {
    let mut a = a.abs();
    let mut b = b.abs();
    while b != T::zero() {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Number of base-`base` digits needed to write `value` (at least one).
pub fn digit_count(value: i64, base: i64) -> usize {
    debug_assert!(value >= 0 && base >= 2);
    let mut count = 1;
    let mut rest = value / base;
    while rest > 0 {
        count += 1;
        rest /= base;
    }
    count
}

/// Least-significant-first digits of a non-negative `value`.
pub fn to_digits(value: i64, base: i64) -> Vec<i64> {
    debug_assert!(value >= 0 && base >= 2);
    let mut digits = Vec::with_capacity(digit_count(value, base));
    let mut rest = value;
    loop {
        digits.push(rest % base);
        rest /= base;
        if rest == 0 {
            break;
        }
    }
    digits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_div() {
        assert_eq!(floor_div(7, 3), 2);
        assert_eq!(floor_div(6, 3), 2);
        assert_eq!(floor_div(-7, 3), -3);
        assert_eq!(floor_div(-6, 3), -2);
        assert_eq!(floor_div(7, -3), -3);
        assert_eq!(floor_div(-7, -3), 2);
    }

    #[test]
    fn test_ceil_div() {
        assert_eq!(ceil_div(7, 3), 3);
        assert_eq!(ceil_div(6, 3), 2);
        assert_eq!(ceil_div(-7, 3), -2);
        assert_eq!(ceil_div(7, -3), -2);
        assert_eq!(ceil_div(-7, -3), 3);
        assert_eq!(ceil_div(0i64, -3), 0);
    }

    #[test]
    fn test_gcd() {
        assert_eq!(gcd(12i64, 18), 6);
        assert_eq!(gcd(-4i64, 6), 2);
        assert_eq!(gcd(0i64, 5), 5);
        assert_eq!(gcd(0i64, 0), 0);
    }

    #[test]
    fn test_digits() {
        assert_eq!(digit_count(0, 10), 1);
        assert_eq!(digit_count(9, 10), 1);
        assert_eq!(digit_count(10, 10), 2);
        assert_eq!(digit_count(5, 2), 3);
        assert_eq!(to_digits(0, 10), vec![0]);
        assert_eq!(to_digits(123, 10), vec![3, 2, 1]);
        assert_eq!(to_digits(6, 2), vec![0, 1, 1]);
    }
}
