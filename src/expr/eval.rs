// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::expr::nodes::WidthInt;
use baa::{BitVecOps, BitVecValue, BitVecValueRef};

/// Unsigned division with remainder over arbitrary-width values.
/// Division by zero follows the SMT-LIB total semantics: quotient all ones,
/// remainder equal to the dividend.
pub fn unsigned_div_rem(a: &BitVecValue, b: &BitVecValue) -> (BitVecValue, BitVecValue) {
    let width = a.width();
    debug_assert_eq!(width, b.width());
    let zero = BitVecValue::zero(width);
    if b.is_equal(&zero) {
        return (zero.not(), a.clone());
    }
    if width <= 64 {
        let x = a.to_u64().unwrap();
        let y = b.to_u64().unwrap();
        return (
            BitVecValue::from_u64(x / y, width),
            BitVecValue::from_u64(x % y, width),
        );
    }
    // restoring shift-subtract long division
    let one = BitVecValue::from_u64(1, width);
    let mut quot = zero.clone();
    let mut rem = zero;
    for i in (0..width).rev() {
        rem = rem.shift_left(&one);
        if a.slice(i, i).is_tru() {
            rem = rem.or(&one);
        }
        if rem.is_greater_or_equal(b) {
            rem = rem.sub(b);
            let shift = BitVecValue::from_u64(i as u64, width);
            quot = quot.or(&one.shift_left(&shift));
        }
    }
    (quot, rem)
}

/// Signed division with remainder: quotient truncates towards zero, the remainder
/// takes the sign of the dividend. Division by zero follows SMT-LIB: quotient is
/// -1 for a non-negative dividend and 1 otherwise, remainder is the dividend.
pub fn signed_div_rem(a: &BitVecValue, b: &BitVecValue) -> (BitVecValue, BitVecValue) {
    let width = a.width();
    debug_assert_eq!(width, b.width());
    let zero = BitVecValue::zero(width);
    if b.is_equal(&zero) {
        let quot = if is_negative(a) {
            BitVecValue::from_u64(1, width)
        } else {
            zero.not()
        };
        return (quot, a.clone());
    }
    let abs_a = abs(a);
    let abs_b = abs(b);
    let (quot, rem) = unsigned_div_rem(&abs_a, &abs_b);
    let quot = if is_negative(a) != is_negative(b) {
        quot.negate()
    } else {
        quot
    };
    let rem = if is_negative(a) { rem.negate() } else { rem };
    (quot, rem)
}

pub(crate) fn is_negative(v: &BitVecValue) -> bool {
    let msb = v.width() - 1;
    v.slice(msb, msb).is_tru()
}

fn abs(v: &BitVecValue) -> BitVecValue {
    if is_negative(v) {
        v.negate()
    } else {
        v.clone()
    }
}

/// Raw bits of a value of up to 128 bits, least significant word first.
pub(crate) fn value_to_bits(v: &BitVecValueRef) -> u128 {
    debug_assert!(v.width() <= 128);
    let words = v.words();
    let mut bits = words[0] as u128;
    if words.len() > 1 {
        bits |= (words[1] as u128) << 64;
    }
    bits
}

/// Packs the low `width` bits of `bits` into a value.
pub(crate) fn bits_to_value(bits: u128, width: WidthInt) -> BitVecValue {
    debug_assert!(width >= 1 && width <= 128);
    if width <= 64 {
        debug_assert!(width == 64 || bits < (1u128 << width));
        BitVecValue::from_u64(bits as u64, width)
    } else {
        let hi = BitVecValue::from_u64((bits >> 64) as u64, width - 64);
        let lo = BitVecValue::from_u64(bits as u64, 64);
        hi.concat(&lo)
    }
}

/// Masks an integer result down to `width` bits.
pub(crate) fn mask_bits(bits: u128, width: WidthInt) -> u128 {
    if width >= 128 {
        bits
    } else {
        bits & ((1u128 << width) - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_u64(x: u64, y: u64, width: WidthInt) {
        let a = BitVecValue::from_u64(x, width);
        let b = BitVecValue::from_u64(y, width);
        let (q, r) = unsigned_div_rem(&a, &b);
        assert_eq!(q.to_u64().unwrap(), x / y, "{x} / {y}");
        assert_eq!(r.to_u64().unwrap(), x % y, "{x} % {y}");
    }

    fn check_i64(x: i64, y: i64, width: WidthInt) {
        let a = BitVecValue::from_i64(x, width);
        let b = BitVecValue::from_i64(y, width);
        let (q, r) = signed_div_rem(&a, &b);
        assert_eq!(q.to_i64().unwrap(), x / y, "{x} / {y}");
        assert_eq!(r.to_i64().unwrap(), x % y, "{x} % {y}");
    }

    #[test]
    fn division_narrow() {
        check_u64(17, 5, 32);
        check_u64(0, 5, 32);
        check_u64(5, 17, 32);
        check_u64(100, 10, 7);
        check_i64(17, 5, 32);
        check_i64(-17, 5, 32);
        check_i64(17, -5, 32);
        check_i64(-17, -5, 32);
        check_i64(-100, 3, 8);
    }

    #[test]
    fn division_by_zero() {
        let a = BitVecValue::from_u64(42, 16);
        let zero = BitVecValue::zero(16);
        let (q, r) = unsigned_div_rem(&a, &zero);
        assert_eq!(q.to_u64().unwrap(), 0xffff);
        assert_eq!(r.to_u64().unwrap(), 42);
        let (q, r) = signed_div_rem(&a, &zero);
        assert_eq!(q.to_i64().unwrap(), -1);
        assert_eq!(r.to_u64().unwrap(), 42);
        let neg = BitVecValue::from_i64(-42, 16);
        let (q, r) = signed_div_rem(&neg, &zero);
        assert_eq!(q.to_i64().unwrap(), 1);
        assert_eq!(r.to_i64().unwrap(), -42);
    }

    #[test]
    fn division_wide() {
        // (2^80 + 12345) / 7, computed against u128 arithmetic
        let x: u128 = (1u128 << 80) + 12345;
        let y: u128 = 7;
        let a = bits_to_value(x, 96);
        let b = bits_to_value(y, 96);
        let (q, r) = unsigned_div_rem(&a, &b);
        assert_eq!(value_to_bits(&(&q).into()), x / y);
        assert_eq!(value_to_bits(&(&r).into()), x % y);
    }

    #[test]
    fn signed_division_overflow() {
        // INT8_MIN / -1 wraps
        let a = BitVecValue::from_i64(-128, 8);
        let b = BitVecValue::from_i64(-1, 8);
        let (q, _r) = signed_div_rem(&a, &b);
        assert_eq!(q.to_i64().unwrap(), -128);
    }

    #[test]
    fn bit_round_trip() {
        for (bits, width) in [
            (0u128, 1),
            (1, 1),
            (0xab, 8),
            (0xdead_beef, 32),
            ((1u128 << 79) | 12345, 80),
            (u128::MAX, 128),
        ] {
            let v = bits_to_value(bits, width);
            assert_eq!(v.width(), width);
            assert_eq!(value_to_bits(&(&v).into()), bits);
        }
    }
}
