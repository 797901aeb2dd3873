// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use baa::{BitVecOps, BitVecValue};
use std::rc::Rc;
use symex_ir::expr::*;

const RNE: RoundingMode = RoundingMode::NearestTiesToEven;

fn f32_lit(ctx: &mut Context, value: f32) -> ExprRef {
    ctx.fp_lit(&BitVecValue::from_u64(value.to_bits() as u64, 32))
}

fn f64_lit(ctx: &mut Context, value: f64) -> ExprRef {
    ctx.fp_lit(&BitVecValue::from_u64(value.to_bits(), 64))
}

fn f64_bits(ctx: &Context, e: ExprRef) -> u64 {
    ctx.get_const(e).unwrap().to_u64().unwrap()
}

#[test]
fn test_float_constant_folding() {
    let mut ctx = Context::default();
    let a = f64_lit(&mut ctx, 1.5);
    let b = f64_lit(&mut ctx, 2.25);
    let sum = ctx.fp_add(a, b, RNE);
    assert_eq!(f64_bits(&ctx, sum), (1.5f64 + 2.25f64).to_bits());
    let prod = ctx.fp_mul(a, b, RNE);
    assert_eq!(f64_bits(&ctx, prod), (1.5f64 * 2.25f64).to_bits());
    let quot = ctx.fp_div(a, b, RNE);
    assert_eq!(f64_bits(&ctx, quot), (1.5f64 / 2.25f64).to_bits());
    // a symbolic operand leaves the operation symbolic
    let x = ctx.bv_symbol("x", 64);
    let open = ctx.fp_add(a, x, RNE);
    assert!(matches!(ctx.get(open), Expr::FPAdd(..)));
}

#[test]
fn test_nan_canonicalization_idempotence() {
    let mut ctx = Context::default();
    // two NaNs with different payloads
    let n1 = ctx.fp_lit(&BitVecValue::from_u64(0x7ff8_0000_0000_0001, 64));
    let n2 = ctx.fp_lit(&BitVecValue::from_u64(0xfff8_dead_beef_0000, 64));
    assert_ne!(n1, n2);
    let x = ctx.bv_symbol("x", 64);
    // under canonical-NaN mode both fold to the same canonical constant,
    // even though the other operand is symbolic
    let r1 = ctx.fp_add(n1, x, RNE);
    let r2 = ctx.fp_add(n2, x, RNE);
    assert_eq!(r1, r2);
    assert!(ctx.is_const(r1));
    // and the canonical constant is itself a fixed point
    let r3 = ctx.fp_add(r1, x, RNE);
    assert_eq!(r3, r1);
}

#[test]
fn test_non_canonical_mode_keeps_payloads() {
    let mut ctx = Context::default();
    ctx.set_canonical_nan(false);
    let nan = ctx.fp_lit(&BitVecValue::from_u64(0x7ff8_0000_0000_0001, 64));
    let x = ctx.bv_symbol("x", 64);
    // no fold on a symbolic operand without the canonical-NaN shortcut
    let open = ctx.fp_add(nan, x, RNE);
    assert!(matches!(ctx.get(open), Expr::FPAdd(..)));
    // constant evaluation still happens and still produces a NaN
    let one = f64_lit(&mut ctx, 1.0);
    let r = ctx.fp_add(nan, one, RNE);
    assert_eq!(ctx.fp_is_nan(r), ctx.tru());
}

#[test]
fn test_float_comparisons_and_predicates() {
    let mut ctx = Context::default();
    let one = f64_lit(&mut ctx, 1.0);
    let two = f64_lit(&mut ctx, 2.0);
    let tru = ctx.tru();
    let fals = ctx.fals();
    assert_eq!(ctx.fp_less(one, two), tru);
    assert_eq!(ctx.fp_greater(one, two), fals);
    assert_eq!(ctx.fp_less_equal(one, one), tru);
    assert_eq!(ctx.fp_equal(one, two), fals);
    // NaN makes every ordered comparison false, even against a symbolic operand
    let nan = ctx.fp_lit(&BitVecValue::from_u64(f64::NAN.to_bits(), 64));
    let x = ctx.bv_symbol("x", 64);
    assert_eq!(ctx.fp_less(nan, x), fals);
    assert_eq!(ctx.fp_equal(x, nan), fals);
    assert_eq!(ctx.fp_is_nan(nan), tru);
    assert_eq!(ctx.fp_is_infinite(nan), fals);
    let inf = f64_lit(&mut ctx, f64::INFINITY);
    assert_eq!(ctx.fp_is_infinite(inf), tru);
    assert_eq!(ctx.fp_is_normal(one), tru);
    let tiny = ctx.fp_lit(&BitVecValue::from_u64(1, 64));
    assert_eq!(ctx.fp_is_subnormal(tiny), tru);
}

#[test]
fn test_float_conversions() {
    let mut ctx = Context::default();
    let x = f32_lit(&mut ctx, 1.25);
    let wide = ctx.fp_extend(x, 64);
    assert_eq!(f64_bits(&ctx, wide), 1.25f64.to_bits());
    let narrow = ctx.fp_trunc(wide, 32, RNE);
    assert_eq!(narrow, x);
    // float to int
    let v = f64_lit(&mut ctx, 42.75);
    let as_u32 = ctx.fp_to_unsigned(v, 32, RNE);
    assert_eq!(ctx.get_const(as_u32).unwrap().to_u64().unwrap(), 43);
    let as_u32_trunc = ctx.fp_to_unsigned(v, 32, RoundingMode::TowardZero);
    assert_eq!(ctx.get_const(as_u32_trunc).unwrap().to_u64().unwrap(), 42);
    // int to float
    let minus_seven = ctx.bv_lit(&BitVecValue::from_i64(-7, 32));
    let f = ctx.signed_to_fp(minus_seven, 64, RNE);
    assert_eq!(f64_bits(&ctx, f), (-7.0f64).to_bits());
    let seven = ctx.bv_lit(&BitVecValue::from_u64(7, 32));
    let f = ctx.unsigned_to_fp(seven, 32, RNE);
    assert_eq!(
        ctx.get_const(f).unwrap().to_u64().unwrap(),
        7.0f32.to_bits() as u64
    );
}

#[test]
fn test_min_max_and_rem() {
    let mut ctx = Context::default();
    let a = f64_lit(&mut ctx, -3.0);
    let b = f64_lit(&mut ctx, 2.0);
    assert_eq!(ctx.fp_min(a, b), a);
    assert_eq!(ctx.fp_max(a, b), b);
    let five = f64_lit(&mut ctx, 5.0);
    let three = f64_lit(&mut ctx, 3.0);
    let r = ctx.fp_rem(five, three);
    // fmod semantics, the quotient truncates towards zero: 5 - 1*3 = 2
    assert_eq!(f64_bits(&ctx, r), 2.0f64.to_bits());
}

#[test]
fn test_sqrt_folding_is_limited() {
    let mut ctx = Context::default();
    let nine = f64_lit(&mut ctx, 9.0);
    let r = ctx.fp_sqrt(nine, RNE);
    assert_eq!(f64_bits(&ctx, r), 3.0f64.to_bits());
    // no bit-exact result for other rounding modes, the node stays symbolic
    let open = ctx.fp_sqrt(nine, RoundingMode::TowardZero);
    assert!(matches!(ctx.get(open), Expr::FPSqrt(..)));
    // same for the quad format
    let quad_one = {
        let hi = BitVecValue::from_u64(0x3fff_0000_0000_0000, 64);
        let lo = BitVecValue::from_u64(0, 64);
        ctx.fp_lit(&hi.concat(&lo))
    };
    let open = ctx.fp_sqrt(quad_one, RNE);
    assert!(matches!(ctx.get(open), Expr::FPSqrt(..)));
}

/// 1.0 in the 80-bit x87 format (explicit integer bit).
fn extended_lit(ctx: &mut Context, exponent: u64, significand: u64) -> ExprRef {
    let hi = BitVecValue::from_u64(exponent, 16);
    let lo = BitVecValue::from_u64(significand, 64);
    ctx.fp_lit(&hi.concat(&lo))
}

struct FixedResult(u128);

impl NativeExtendedEval for FixedResult {
    fn binary(&self, _op: FPBinOp, _a: u128, _b: u128, _rm: RoundingMode) -> Option<u128> {
        Some(self.0)
    }
    fn unary(&self, _op: FPUnOp, _a: u128, _rm: RoundingMode) -> Option<u128> {
        Some(self.0)
    }
}

#[test]
fn test_native_extended_strategy() {
    let mut ctx = Context::default();
    let one = extended_lit(&mut ctx, 16383, 1 << 63);
    // without a native evaluator, sqrt of the extended format cannot fold
    let open = ctx.fp_sqrt(one, RNE);
    assert!(matches!(ctx.get(open), Expr::FPSqrt(..)));
    // with one registered, the strategy's result is used
    let one_bits = (16383u128 << 64) | (1u128 << 63);
    ctx.set_native_extended(Rc::new(FixedResult(one_bits)));
    let folded = ctx.fp_sqrt(one, RNE);
    assert_eq!(folded, one);
    let sum = ctx.fp_add(one, one, RNE);
    assert_eq!(sum, one);
}

#[test]
fn test_const_array_opt_cap() {
    let mut ctx = Context::default();
    ctx.set_const_array_opt(true);
    let needle = ctx.bv_lit(&BitVecValue::from_u64(7, 8));
    // more matches than the cap allows: the rewrite is abandoned
    let cells = vec![needle; CONST_ARRAY_OPT_MAX_MATCHES + 1];
    let table = ctx.array_concrete("big", &cells, 32, 8);
    let i = ctx.bv_symbol("i", 32);
    let read = ctx.read(UpdateList::new(table), i);
    let e = ctx.eq(needle, read);
    assert!(matches!(ctx.get(e), Expr::Equal(..)));
    // a small table rewrites into a disjunction over the matching indices
    let small: Vec<_> = [7u64, 1, 7]
        .iter()
        .map(|v| ctx.bv_lit(&BitVecValue::from_u64(*v, 8)))
        .collect();
    let table = ctx.array_concrete("small", &small, 32, 8);
    let read = ctx.read(UpdateList::new(table), i);
    let e = ctx.eq(needle, read);
    let zero = ctx.zero(32);
    let two = ctx.bv_lit(&BitVecValue::from_u64(2, 32));
    let hit0 = ctx.eq(zero, i);
    let hit2 = ctx.eq(two, i);
    assert_eq!(e, ctx.or(hit0, hit2));
}
