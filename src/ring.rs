//! Modular arithmetic in Z/N: each element x is in the range `0 <= x < N < 2^B`, where a
//! B-bit unsigned integer stores the value. When N is a prime p this is GF(p).

use std::fmt;

use num_integer::Integer;
use num_traits::ops::overflowing::{OverflowingAdd, OverflowingSub};
use num_traits::Unsigned;

/// Unsigned integer.
pub trait UnsignedInteger:
    Integer + Unsigned + OverflowingAdd + OverflowingSub + Copy + fmt::Display + fmt::Debug
{
}

impl<T> UnsignedInteger for T where
    T: Integer + Unsigned + OverflowingAdd + OverflowingSub + Copy + fmt::Display + fmt::Debug
{
}

/// Computes `x + y` in Z/m.
#[inline]
pub fn add<T: UnsignedInteger>(x: T, y: T, m: T) -> T {
    debug_assert!(m > T::zero());
    debug_assert!(x < m);
    debug_assert!(y < m);
    let (z, b) = x.overflowing_add(&y);
    if b {
        z.overflowing_sub(&m).0
    } else if z >= m {
        z - m
    } else {
        z
    }
}

/// Computes `x - y` in Z/m.
#[inline]
pub fn sub<T: UnsignedInteger>(x: T, y: T, m: T) -> T {
    debug_assert!(m > T::zero());
    debug_assert!(x < m);
    debug_assert!(y < m);
    let (z, b) = x.overflowing_sub(&y);
    if b {
        z.overflowing_add(&m).0
    } else {
        z
    }
}

/// Computes `x * y` in Z/m.
#[inline]
pub fn mul<T: UnsignedInteger>(x: T, y: T, m: T) -> T {
    debug_assert!(m > T::zero());
    debug_assert!(x < m);
    debug_assert!(y < m);
    if x.is_zero() {
        T::zero()
    } else {
        // by Schrage's method
        let q = m / x;
        let r = m % x;
        let a = x * (y % q);
        let b = if r <= q { r * (y / q) } else { mul(r, y / q, m) };
        sub(a, b, m)
    }
}

/// Computes `-x` in Z/m.
#[inline]
pub fn neg<T: UnsignedInteger>(x: T, m: T) -> T {
    debug_assert!(m > T::zero());
    debug_assert!(x < m);
    if x.is_zero() {
        T::zero()
    } else {
        m - x
    }
}

/// Computes `1/x` in Z/m, or `None` when `gcd(x, m) != 1`.
pub fn try_inv<T: UnsignedInteger>(x: T, m: T) -> Option<T> {
    debug_assert!(m > T::zero());
    debug_assert!(x < m);
    if x.is_zero() {
        return None;
    }
    // by the extended Euclidean algorithm: a x + b m = gcd(x, m) = 1 or a x = 1 (mod m)
    // (Knuth vol. 2, Algorithm X)
    let mut u1 = T::one();
    let mut u3 = x;
    let mut v1 = T::zero();
    let mut v3 = m;
    let mut even_iter = true;
    while !v3.is_zero() {
        let q = u3 / v3;
        let t3 = u3 % v3;
        let t1 = u1 + q * v1;
        u1 = v1;
        v1 = t1;
        u3 = v3;
        v3 = t3;
        even_iter = !even_iter;
    }
    if u3 != T::one() {
        return None;
    }
    Some(if even_iter { u1 } else { m - u1 })
}

/// Computes `1/x` in Z/m.
#[inline]
pub fn inv<T: UnsignedInteger>(x: T, m: T) -> T {
    match try_inv(x, m) {
        Some(y) => y,
        None => panic!("{} is not invertible in Z_{}", x, m),
    }
}

/// Factors `n` into prime powers, in increasing order of the prime.
pub fn factorize(mut n: u64) -> Vec<(u64, u32)> {
    let mut factors = vec![];
    let mut p = 2u64;
    while p.saturating_mul(p) <= n {
        if n % p == 0 {
            let mut e = 0;
            while n % p == 0 {
                n /= p;
                e += 1;
            }
            factors.push((p, e));
        }
        p += if p == 2 { 1 } else { 2 };
    }
    if n > 1 {
        factors.push((n, 1));
    }
    factors
}

/// Use Garner's algorithm for the Chinese remainder theorem
/// to reconstruct the x in `[0, m1*m2)` that satisfies `x = a1 (mod m1)` and `x = a2 (mod m2)`.
///
/// The moduli must be coprime; anything else is a bug in the caller.
pub fn chinese_remainder(a1: u64, m1: u64, a2: u64, m2: u64) -> u64 {
    debug_assert!(a1 < m1 && a2 < m2);
    assert_eq!(m1.gcd(&m2), 1, "CRT moduli {} and {} are not coprime", m1, m2);
    if m2 == 1 {
        return a1;
    }

    // convert to mixed-radix notation
    let gamma1 = inv(m1 % m2, m2);
    let v1 = mul(sub(a2 % m2, a1 % m2, m2), gamma1, m2);

    // convert to standard representation
    let x = u128::from(v1) * u128::from(m1) + u128::from(a1);
    debug_assert!(x < u128::from(m1) * u128::from(m2));
    x as u64
}

/// The p-adic valuation of `x` in Z/p^e, capped at `e` (the valuation of zero).
pub fn valuation(mut x: u64, p: u64, e: u32) -> u32 {
    if x == 0 {
        return e;
    }
    let mut v = 0;
    while x % p == 0 {
        x /= p;
        v += 1;
    }
    v
}

/// The ring Z/N, carried by value through every solve invocation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Ring {
    modulus: u64,
}

impl Ring {
    pub fn new(modulus: u64) -> Ring {
        assert!(modulus > 0, "Z/0 is not a finite ring");
        Ring { modulus }
    }

    #[inline]
    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    /// Maps an arbitrary integer into `[0, N)`.
    #[inline]
    pub fn reduce(&self, x: u64) -> u64 {
        x % self.modulus
    }

    #[inline]
    pub fn add(&self, x: u64, y: u64) -> u64 {
        add(x, y, self.modulus)
    }

    #[inline]
    pub fn sub(&self, x: u64, y: u64) -> u64 {
        sub(x, y, self.modulus)
    }

    #[inline]
    pub fn mul(&self, x: u64, y: u64) -> u64 {
        mul(x, y, self.modulus)
    }

    #[inline]
    pub fn neg(&self, x: u64) -> u64 {
        neg(x, self.modulus)
    }

    #[inline]
    pub fn inv(&self, x: u64) -> Option<u64> {
        try_inv(x, self.modulus)
    }

    /// Computes `acc + x * y`.
    #[inline]
    pub fn mul_add(&self, acc: u64, x: u64, y: u64) -> u64 {
        self.add(acc, self.mul(x, y))
    }
}

impl fmt::Display for Ring {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Z/{}", self.modulus)
    }
}

#[test]
fn test_add() {
    fn check_add(x: u8, y: u8, p: u8) {
        let z = u64::from(add(x, y, p));
        assert_eq!(z, (u64::from(x) + u64::from(y)) % u64::from(p));
    }

    check_add(100, 200, 251);
    check_add(100, 151, 251);
    check_add(100, 100, 251);
    check_add(1, 1, 2);
}

#[test]
fn test_sub() {
    fn check_sub(x: u8, y: u8, p: u8) {
        let z = u64::from(sub(x, y, p));
        assert_eq!(z, (u64::from(p) + u64::from(x) - u64::from(y)) % u64::from(p));
    }

    check_sub(100, 200, 251);
    check_sub(200, 100, 251);
    check_sub(0, 5, 6);
}

#[test]
fn test_mul() {
    fn check_mul(x: u8, y: u8, p: u8) {
        let z = u64::from(mul(x, y, p));
        assert_eq!(z, u64::from(x) * u64::from(y) % u64::from(p));
    }

    check_mul(100, 200, 251);
    check_mul(250, 250, 251);
    check_mul(128, 2, 251);
    check_mul(0, 250, 251);
    check_mul(250, 0, 251);
    // composite moduli
    check_mul(5, 5, 6);
    check_mul(3, 3, 4);
    check_mul(200, 201, 255);
}

#[test]
fn test_neg() {
    for x in 0..6u8 {
        assert_eq!(add(x, neg(x, 6), 6), 0);
    }
}

#[test]
fn test_inv() {
    for x in 1..251u16 {
        assert_eq!(mul(x, inv(x, 251), 251), 1);
    }
    assert_eq!(try_inv(5u64, 6), Some(5));
    assert_eq!(try_inv(2u64, 4), None);
    assert_eq!(try_inv(3u64, 9), None);
    assert_eq!(try_inv(0u64, 7), None);
}

#[test]
#[should_panic]
fn test_inv_not_invertible() {
    let _ = inv(4u64, 6);
}

#[test]
fn test_factorize() {
    assert_eq!(factorize(1), vec![]);
    assert_eq!(factorize(2), vec![(2, 1)]);
    assert_eq!(factorize(6), vec![(2, 1), (3, 1)]);
    assert_eq!(factorize(12), vec![(2, 2), (3, 1)]);
    assert_eq!(factorize(97), vec![(97, 1)]);
    assert_eq!(factorize(360), vec![(2, 3), (3, 2), (5, 1)]);
}

#[test]
fn test_chinese_remainder() {
    for a in 0..4 {
        for b in 0..9 {
            let x = chinese_remainder(a, 4, b, 9);
            assert!(x < 36);
            assert_eq!(x % 4, a);
            assert_eq!(x % 9, b);
        }
    }
    assert_eq!(chinese_remainder(3, 5, 0, 1), 3);
}

#[test]
#[should_panic]
fn test_chinese_remainder_not_coprime() {
    let _ = chinese_remainder(1, 4, 1, 6);
}

#[test]
fn test_valuation() {
    assert_eq!(valuation(0, 2, 3), 3);
    assert_eq!(valuation(4, 2, 3), 2);
    assert_eq!(valuation(6, 2, 3), 1);
    assert_eq!(valuation(5, 5, 2), 1);
    assert_eq!(valuation(7, 3, 2), 0);
}

#[test]
fn test_ring() {
    let r = Ring::new(6);
    assert_eq!(r.reduce(13), 1);
    assert_eq!(r.mul_add(5, 4, 2), 1);
    assert_eq!(r.inv(5), Some(5));
    assert_eq!(r.inv(3), None);
    assert_eq!(r.to_string(), "Z/6");
}
