// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::expr::nodes::{widths, WidthInt};
use rustc_apfloat::ieee::{Double, Half, Quad, Single, X87DoubleExtended};
use rustc_apfloat::{Float, FloatConvert, Round};
use std::cmp::Ordering;
use std::sync::Once;
use tracing::warn;

/// One of the five IEEE-754 rounding directions.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum RoundingMode {
    NearestTiesToEven,
    TowardPositive,
    TowardNegative,
    TowardZero,
    NearestTiesToAway,
}

impl RoundingMode {
    pub(crate) fn to_apfloat(self) -> Round {
        match self {
            RoundingMode::NearestTiesToEven => Round::NearestTiesToEven,
            RoundingMode::TowardPositive => Round::TowardPositive,
            RoundingMode::TowardNegative => Round::TowardNegative,
            RoundingMode::TowardZero => Round::TowardZero,
            RoundingMode::NearestTiesToAway => Round::NearestTiesToAway,
        }
    }
}

/// The floating-point interpretation of a bit pattern is a pure function of its width.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum FloatFormat {
    Half,
    Single,
    Double,
    /// 80-bit x87 extended precision with an explicit integer bit
    Extended,
    Quad,
}

impl FloatFormat {
    pub fn from_width(width: WidthInt) -> Option<FloatFormat> {
        match width {
            widths::HALF => Some(FloatFormat::Half),
            widths::SINGLE => Some(FloatFormat::Single),
            widths::DOUBLE => Some(FloatFormat::Double),
            widths::EXTENDED => Some(FloatFormat::Extended),
            widths::QUAD => Some(FloatFormat::Quad),
            _ => None,
        }
    }

    pub fn width(&self) -> WidthInt {
        match self {
            FloatFormat::Half => widths::HALF,
            FloatFormat::Single => widths::SINGLE,
            FloatFormat::Double => widths::DOUBLE,
            FloatFormat::Extended => widths::EXTENDED,
            FloatFormat::Quad => widths::QUAD,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum FPBinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Min,
    Max,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum FPUnOp {
    Neg,
    Abs,
    Sqrt,
    RoundToIntegral,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum FPCmpOp {
    Equal,
    Less,
    LessEqual,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum FPPredicate {
    IsNan,
    IsInfinite,
    IsNormal,
    IsSubnormal,
}

/// Host-native evaluation strategy for the 80-bit extended format. The
/// arbitrary-precision library mis-classifies some "unsupported" 80-bit encodings
/// as NaN, so a platform with a native extended type can register an evaluator
/// that computes on the FPU instead (saving and restoring the ambient rounding
/// mode around each operation). Returning `None` declines the operation, e.g.
/// when the rounding mode has no native equivalent.
pub trait NativeExtendedEval {
    fn binary(&self, op: FPBinOp, a: u128, b: u128, rm: RoundingMode) -> Option<u128>;
    fn unary(&self, op: FPUnOp, a: u128, rm: RoundingMode) -> Option<u128>;
}

macro_rules! dispatch_format {
    ($fmt:expr, $F:ident => $body:expr) => {
        match $fmt {
            FloatFormat::Half => {
                type $F = Half;
                $body
            }
            FloatFormat::Single => {
                type $F = Single;
                $body
            }
            FloatFormat::Double => {
                type $F = Double;
                $body
            }
            FloatFormat::Extended => {
                type $F = X87DoubleExtended;
                $body
            }
            FloatFormat::Quad => {
                type $F = Quad;
                $body
            }
        }
    };
}

/// The canonical quiet NaN bit pattern of a format. Matches the solver convention:
/// positive sign, all-ones exponent, most significant fraction bit set.
pub fn canonical_nan(fmt: FloatFormat) -> u128 {
    dispatch_format!(fmt, F => F::NAN.to_bits())
}

pub fn eval_binary(
    fmt: FloatFormat,
    op: FPBinOp,
    a: u128,
    b: u128,
    rm: RoundingMode,
    canonical: bool,
) -> u128 {
    dispatch_format!(fmt, F => {
        let fa = F::from_bits(a);
        let fb = F::from_bits(b);
        if canonical && (fa.is_nan() || fb.is_nan()) {
            return F::NAN.to_bits();
        }
        let round = rm.to_apfloat();
        let v: F = match op {
            FPBinOp::Add => fa.add_r(fb, round).value,
            FPBinOp::Sub => fa.sub_r(fb, round).value,
            FPBinOp::Mul => fa.mul_r(fb, round).value,
            FPBinOp::Div => fa.div_r(fb, round).value,
            FPBinOp::Rem => (fa % fb).value,
            // minNum/maxNum semantics when NaNs are not canonicalized away
            FPBinOp::Min => {
                if fa.is_nan() {
                    fb
                } else if fb.is_nan() || matches!(fa.partial_cmp(&fb), Some(Ordering::Less)) {
                    fa
                } else {
                    fb
                }
            }
            FPBinOp::Max => {
                if fa.is_nan() {
                    fb
                } else if fb.is_nan() || matches!(fa.partial_cmp(&fb), Some(Ordering::Greater)) {
                    fa
                } else {
                    fb
                }
            }
        };
        if canonical && v.is_nan() {
            F::NAN.to_bits()
        } else {
            v.to_bits()
        }
    })
}

/// Evaluates a unary operation. Returns `None` when no bit-exact evaluation is
/// available (square root outside the 32/64-bit round-nearest-even case).
pub fn eval_unary(
    fmt: FloatFormat,
    op: FPUnOp,
    a: u128,
    rm: RoundingMode,
    canonical: bool,
) -> Option<u128> {
    if op == FPUnOp::Sqrt {
        return eval_sqrt(fmt, a, rm, canonical);
    }
    dispatch_format!(fmt, F => {
        let fa = F::from_bits(a);
        if canonical && fa.is_nan() {
            return Some(F::NAN.to_bits());
        }
        let v: F = match op {
            FPUnOp::Neg => -fa,
            FPUnOp::Abs => {
                if fa.is_negative() {
                    -fa
                } else {
                    fa
                }
            }
            FPUnOp::RoundToIntegral => fa.round_to_integral(rm.to_apfloat()).value,
            FPUnOp::Sqrt => unreachable!(),
        };
        if canonical && v.is_nan() {
            Some(F::NAN.to_bits())
        } else {
            Some(v.to_bits())
        }
    })
}

/// The arbitrary-precision library provides no square root, so we use the host FPU
/// for the formats it implements exactly. Correct rounding is only guaranteed in
/// the host's default (nearest-even) mode.
fn eval_sqrt(fmt: FloatFormat, a: u128, rm: RoundingMode, canonical: bool) -> Option<u128> {
    if rm != RoundingMode::NearestTiesToEven {
        warn_sqrt_unsupported();
        return None;
    }
    let bits = match fmt {
        FloatFormat::Single => f32::from_bits(a as u32).sqrt().to_bits() as u128,
        FloatFormat::Double => f64::from_bits(a as u64).sqrt().to_bits() as u128,
        _ => {
            warn_sqrt_unsupported();
            return None;
        }
    };
    if canonical && eval_predicate(fmt, FPPredicate::IsNan, bits) {
        Some(canonical_nan(fmt))
    } else {
        Some(bits)
    }
}

/// Ordered comparison: any NaN operand compares false.
pub fn eval_compare(fmt: FloatFormat, op: FPCmpOp, a: u128, b: u128) -> bool {
    dispatch_format!(fmt, F => {
        let ord = F::from_bits(a).partial_cmp(&F::from_bits(b));
        match op {
            FPCmpOp::Equal => ord == Some(Ordering::Equal),
            FPCmpOp::Less => ord == Some(Ordering::Less),
            FPCmpOp::LessEqual => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
        }
    })
}

pub fn eval_predicate(fmt: FloatFormat, op: FPPredicate, a: u128) -> bool {
    dispatch_format!(fmt, F => {
        let fa = F::from_bits(a);
        match op {
            FPPredicate::IsNan => fa.is_nan(),
            FPPredicate::IsInfinite => fa.is_infinite(),
            FPPredicate::IsNormal => {
                !fa.is_nan() && !fa.is_infinite() && !fa.is_zero() && !fa.is_denormal()
            }
            FPPredicate::IsSubnormal => fa.is_denormal(),
        }
    })
}

/// Format-to-format conversion (extension or truncation).
pub fn eval_convert(
    from: FloatFormat,
    to: FloatFormat,
    a: u128,
    rm: RoundingMode,
    canonical: bool,
) -> u128 {
    dispatch_format!(from, S => {
        let fa = S::from_bits(a);
        if canonical && fa.is_nan() {
            return canonical_nan(to);
        }
        dispatch_format!(to, T => {
            let mut loses_info = false;
            let v: T = fa.convert_r(rm.to_apfloat(), &mut loses_info).value;
            if canonical && v.is_nan() {
                T::NAN.to_bits()
            } else {
                v.to_bits()
            }
        })
    })
}

/// Float to unsigned integer of `width` bits. IEEE-754 conversion semantics: NaN
/// and out-of-range values saturate the invalid-operation path of the library.
pub fn eval_to_unsigned(fmt: FloatFormat, a: u128, width: WidthInt, rm: RoundingMode) -> u128 {
    debug_assert!(width <= 128);
    dispatch_format!(fmt, F => {
        let mut is_exact = false;
        let v = F::from_bits(a)
            .to_u128_r(width as usize, rm.to_apfloat(), &mut is_exact)
            .value;
        crate::expr::eval::mask_bits(v, width)
    })
}

pub fn eval_to_signed(fmt: FloatFormat, a: u128, width: WidthInt, rm: RoundingMode) -> u128 {
    debug_assert!(width <= 128);
    dispatch_format!(fmt, F => {
        let mut is_exact = false;
        let v = F::from_bits(a)
            .to_i128_r(width as usize, rm.to_apfloat(), &mut is_exact)
            .value;
        crate::expr::eval::mask_bits(v as u128, width)
    })
}

pub fn eval_from_unsigned(fmt: FloatFormat, value: u128, rm: RoundingMode) -> u128 {
    dispatch_format!(fmt, F => F::from_u128_r(value, rm.to_apfloat()).value.to_bits())
}

pub fn eval_from_signed(fmt: FloatFormat, value: i128, rm: RoundingMode) -> u128 {
    dispatch_format!(fmt, F => F::from_i128_r(value, rm.to_apfloat()).value.to_bits())
}

pub(crate) fn warn_native_extended_missing() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        warn!(
            "no native 80-bit extended float evaluator registered; falling back to the \
             arbitrary-precision library, results for unsupported encodings may be imprecise"
        )
    });
}

fn warn_sqrt_unsupported() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        warn!("fsqrt is only folded for 32 and 64-bit operands under round-nearest-even")
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    const RNE: RoundingMode = RoundingMode::NearestTiesToEven;

    #[test]
    fn add_matches_host() {
        let a = 1.5f32.to_bits() as u128;
        let b = 2.25f32.to_bits() as u128;
        let sum = eval_binary(FloatFormat::Single, FPBinOp::Add, a, b, RNE, true);
        assert_eq!(sum, (1.5f32 + 2.25f32).to_bits() as u128);

        let a = 0.1f64.to_bits() as u128;
        let b = 0.2f64.to_bits() as u128;
        let sum = eval_binary(FloatFormat::Double, FPBinOp::Add, a, b, RNE, true);
        assert_eq!(sum, (0.1f64 + 0.2f64).to_bits() as u128);
    }

    #[test]
    fn nan_canonicalization() {
        // a NaN with a non-standard payload
        let weird_nan = 0x7fc0_1234u128;
        assert!(eval_predicate(
            FloatFormat::Single,
            FPPredicate::IsNan,
            weird_nan
        ));
        let one = 1.0f32.to_bits() as u128;
        let r = eval_binary(FloatFormat::Single, FPBinOp::Add, weird_nan, one, RNE, true);
        assert_eq!(r, canonical_nan(FloatFormat::Single));
        // without canonicalization the payload survives
        let r = eval_binary(
            FloatFormat::Single,
            FPBinOp::Add,
            weird_nan,
            one,
            RNE,
            false,
        );
        assert_ne!(r, canonical_nan(FloatFormat::Single));
        assert!(eval_predicate(FloatFormat::Single, FPPredicate::IsNan, r));
    }

    #[test]
    fn division_and_zero() {
        let one = 1.0f64.to_bits() as u128;
        let zero = 0.0f64.to_bits() as u128;
        let r = eval_binary(FloatFormat::Double, FPBinOp::Div, one, zero, RNE, true);
        assert_eq!(r, f64::INFINITY.to_bits() as u128);
        let r = eval_binary(FloatFormat::Double, FPBinOp::Div, zero, zero, RNE, true);
        assert_eq!(r, canonical_nan(FloatFormat::Double));
    }

    #[test]
    fn min_max() {
        let one = 1.0f32.to_bits() as u128;
        let two = 2.0f32.to_bits() as u128;
        assert_eq!(
            eval_binary(FloatFormat::Single, FPBinOp::Min, one, two, RNE, true),
            one
        );
        assert_eq!(
            eval_binary(FloatFormat::Single, FPBinOp::Max, one, two, RNE, true),
            two
        );
        // canonical mode: NaN input wins
        let nan = canonical_nan(FloatFormat::Single);
        assert_eq!(
            eval_binary(FloatFormat::Single, FPBinOp::Min, nan, one, RNE, true),
            nan
        );
    }

    #[test]
    fn conversions() {
        let x = 1.25f32.to_bits() as u128;
        let wide = eval_convert(FloatFormat::Single, FloatFormat::Double, x, RNE, true);
        assert_eq!(wide, 1.25f64.to_bits() as u128);
        let narrow = eval_convert(FloatFormat::Double, FloatFormat::Single, wide, RNE, true);
        assert_eq!(narrow, x);

        assert_eq!(
            eval_to_unsigned(FloatFormat::Double, 42.75f64.to_bits() as u128, 32, RNE),
            43
        );
        assert_eq!(
            eval_to_unsigned(
                FloatFormat::Double,
                42.75f64.to_bits() as u128,
                32,
                RoundingMode::TowardZero
            ),
            42
        );
        assert_eq!(
            eval_to_signed(FloatFormat::Double, (-3.5f64).to_bits() as u128, 8, RNE),
            0xfc // -4 as two's complement
        );
        assert_eq!(
            eval_from_unsigned(FloatFormat::Single, 7, RNE),
            7.0f32.to_bits() as u128
        );
        assert_eq!(
            eval_from_signed(FloatFormat::Single, -7, RNE),
            (-7.0f32).to_bits() as u128
        );
    }

    #[test]
    fn sqrt_host_fallback() {
        let nine = 9.0f64.to_bits() as u128;
        assert_eq!(
            eval_unary(FloatFormat::Double, FPUnOp::Sqrt, nine, RNE, true),
            Some(3.0f64.to_bits() as u128)
        );
        // sqrt of a negative number is NaN and gets canonicalized
        let neg = (-1.0f32).to_bits() as u128;
        assert_eq!(
            eval_unary(FloatFormat::Single, FPUnOp::Sqrt, neg, RNE, true),
            Some(canonical_nan(FloatFormat::Single))
        );
        // no bit-exact square root for the extended format
        assert_eq!(
            eval_unary(FloatFormat::Extended, FPUnOp::Sqrt, 0, RNE, true),
            None
        );
    }

    #[test]
    fn extended_format_round_trip() {
        // 1.0 in the 80-bit format: biased exponent 16383, explicit integer bit
        let one_ext: u128 = (16383u128 << 64) | (1u128 << 63);
        let as_double = eval_convert(FloatFormat::Extended, FloatFormat::Double, one_ext, RNE, true);
        assert_eq!(as_double, 1.0f64.to_bits() as u128);
        let back = eval_convert(FloatFormat::Double, FloatFormat::Extended, as_double, RNE, true);
        assert_eq!(back, one_ext);
    }

    #[test]
    fn rint() {
        let x = 2.5f64.to_bits() as u128;
        assert_eq!(
            eval_unary(FloatFormat::Double, FPUnOp::RoundToIntegral, x, RNE, true),
            Some(2.0f64.to_bits() as u128)
        );
        assert_eq!(
            eval_unary(
                FloatFormat::Double,
                FPUnOp::RoundToIntegral,
                x,
                RoundingMode::TowardPositive,
                true
            ),
            Some(3.0f64.to_bits() as u128)
        );
    }
}
