// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

//! Simplifying expression factories. These are the only sanctioned way to build
//! non-terminal nodes: every factory folds constants, applies algebraic
//! identities and canonicalizes operand order before falling back to a plain
//! node allocation (which then goes through hash-consing).

use crate::expr::context::{Context, ExprRef, CONST_ARRAY_OPT_MAX_MATCHES};
use crate::expr::eval;
use crate::expr::float::{
    self, FPBinOp, FPCmpOp, FPPredicate, FPUnOp, FloatFormat, RoundingMode,
};
use crate::expr::memory::{ArraySource, UpdateList};
use crate::expr::nodes::{widths, Expr, WidthInt};
use baa::{BitVecOps, BitVecValue};

/// Shared helpers.
impl Context {
    /// Raw bits of a constant of up to 128 bits.
    fn get_const_bits(&self, e: ExprRef) -> Option<u128> {
        match *self.get(e) {
            Expr::Constant { value, width, .. } if width <= 128 => {
                Some(eval::value_to_bits(&self.get_bv_value(value)))
            }
            _ => None,
        }
    }

    fn fp_const(&mut self, bits: u128, fmt: FloatFormat) -> ExprRef {
        self.fp_lit(&eval::bits_to_value(bits, fmt.width()))
    }

    fn as_const_select(&self, e: ExprRef) -> Option<(ExprRef, ExprRef, ExprRef)> {
        match *self.get(e) {
            Expr::Select { cond, tru, fals }
                if self.is_const(tru) && self.is_const(fals) =>
            {
                Some((cond, tru, fals))
            }
            _ => None,
        }
    }

    /// Pushes a binary operator through a select with two constant branches when
    /// the other operand is a constant. Both branches fold, so the result is
    /// never larger than the input.
    fn try_select_distribute(
        &mut self,
        a: ExprRef,
        b: ExprRef,
        mk: fn(&mut Context, ExprRef, ExprRef) -> ExprRef,
    ) -> Option<ExprRef> {
        if self.is_const(b) {
            if let Some((cond, tru, fals)) = self.as_const_select(a) {
                let t = mk(self, tru, b);
                let f = mk(self, fals, b);
                return Some(self.select(cond, t, f));
            }
        }
        if self.is_const(a) {
            if let Some((cond, tru, fals)) = self.as_const_select(b) {
                let t = mk(self, a, tru);
                let f = mk(self, a, fals);
                return Some(self.select(cond, t, f));
            }
        }
        None
    }

    /// Matches a constant-headed `Add`/`Sub` chain: `Add(c, x)` or `Sub(c, x)`
    /// with a constant `c`. The factories keep constants in the left slot, so
    /// this is the only shape a partially folded chain can take.
    fn as_const_chain(&self, e: ExprRef) -> Option<(bool, ExprRef, ExprRef)> {
        match *self.get(e) {
            Expr::Add(x, y, _) if self.is_const(x) => Some((false, x, y)),
            Expr::Sub(x, y, _) if self.is_const(x) => Some((true, x, y)),
            _ => None,
        }
    }
}

/// Integer arithmetic.
impl Context {
    pub fn add(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        let width = self.width(a);
        assert_eq!(width, self.width(b), "widths must match");
        if let (Some(va), Some(vb)) = (self.get_const(a), self.get_const(b)) {
            return self.bv_lit(&va.add(&vb));
        }
        if width == widths::BOOL {
            return self.xor(a, b);
        }
        if let Some(r) = self.try_select_distribute(a, b, Context::add) {
            return r;
        }
        // canonical orientation: constant first
        let (a, b) = if self.is_const(b) { (b, a) } else { (a, b) };
        if let Some(va) = self.get_const(a) {
            if self.is_zero_const(a) {
                return b;
            }
            // float the constant of a partially folded chain to the head
            match self.as_const_chain(b) {
                // c1 + (c2 + x) = (c1 + c2) + x
                Some((false, c2, x)) => {
                    let c = va.add(&self.get_const(c2).unwrap());
                    let c = self.bv_lit(&c);
                    return self.add(c, x);
                }
                // c1 + (c2 - x) = (c1 + c2) - x
                Some((true, c2, x)) => {
                    let c = va.add(&self.get_const(c2).unwrap());
                    let c = self.bv_lit(&c);
                    return self.sub(c, x);
                }
                None => {}
            }
        } else {
            match self.as_const_chain(a) {
                // (c + x) + b = c + (x + b)
                Some((false, c, x)) => {
                    let t = self.add(x, b);
                    return self.add(c, t);
                }
                // (c - x) + b = c + (b - x)
                Some((true, c, x)) => {
                    let t = self.sub(b, x);
                    return self.add(c, t);
                }
                None => {}
            }
            match self.as_const_chain(b) {
                // a + (c + y) = c + (a + y)
                Some((false, c, y)) => {
                    let t = self.add(a, y);
                    return self.add(c, t);
                }
                // a + (c - y) = c + (a - y)
                Some((true, c, y)) => {
                    let t = self.sub(a, y);
                    return self.add(c, t);
                }
                None => {}
            }
        }
        self.add_expr(Expr::Add(a, b, width))
    }

    pub fn sub(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        let width = self.width(a);
        assert_eq!(width, self.width(b), "widths must match");
        if a == b {
            return self.zero(width);
        }
        if let (Some(va), Some(vb)) = (self.get_const(a), self.get_const(b)) {
            return self.bv_lit(&va.sub(&vb));
        }
        if width == widths::BOOL {
            return self.xor(a, b);
        }
        if let Some(r) = self.try_select_distribute(a, b, Context::sub) {
            return r;
        }
        // a - c = (-c) + a, so that constants always end up at a chain head
        if let Some(vb) = self.get_const(b) {
            let c = self.bv_lit(&vb.negate());
            return self.add(c, a);
        }
        if let Some(va) = self.get_const(a) {
            match self.as_const_chain(b) {
                // c1 - (c2 + x) = (c1 - c2) - x
                Some((false, c2, x)) => {
                    let c = va.sub(&self.get_const(c2).unwrap());
                    let c = self.bv_lit(&c);
                    return self.sub(c, x);
                }
                // c1 - (c2 - x) = (c1 - c2) + x
                Some((true, c2, x)) => {
                    let c = va.sub(&self.get_const(c2).unwrap());
                    let c = self.bv_lit(&c);
                    return self.add(c, x);
                }
                None => {}
            }
        } else {
            match self.as_const_chain(a) {
                // (c + x) - b = c + (x - b)
                Some((false, c, x)) => {
                    let t = self.sub(x, b);
                    return self.add(c, t);
                }
                // (c - x) - b = c - (x + b)
                Some((true, c, x)) => {
                    let t = self.add(x, b);
                    return self.sub(c, t);
                }
                None => {}
            }
            match self.as_const_chain(b) {
                // a - (c + y) = (-c) + (a - y)
                Some((false, c, y)) => {
                    let neg = self.get_const(c).unwrap().negate();
                    let neg = self.bv_lit(&neg);
                    let t = self.sub(a, y);
                    return self.add(neg, t);
                }
                // a - (c - y) = (-c) + (a + y)
                Some((true, c, y)) => {
                    let neg = self.get_const(c).unwrap().negate();
                    let neg = self.bv_lit(&neg);
                    let t = self.add(a, y);
                    return self.add(neg, t);
                }
                None => {}
            }
        }
        self.add_expr(Expr::Sub(a, b, width))
    }

    pub fn mul(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        let width = self.width(a);
        assert_eq!(width, self.width(b), "widths must match");
        if let (Some(va), Some(vb)) = (self.get_const(a), self.get_const(b)) {
            return self.bv_lit(&va.mul(&vb));
        }
        if width == widths::BOOL {
            return self.and(a, b);
        }
        if let Some(r) = self.try_select_distribute(a, b, Context::mul) {
            return r;
        }
        let (a, b) = if self.is_const(b) { (b, a) } else { (a, b) };
        if self.is_zero_const(a) {
            return a;
        }
        if let Some(va) = self.get_const(a) {
            if va.is_equal(&BitVecValue::from_u64(1, width)) {
                return b;
            }
        }
        self.add_expr(Expr::Mul(a, b, width))
    }

    pub fn unsigned_div(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        let width = self.width(a);
        assert_eq!(width, self.width(b), "widths must match");
        if let (Some(va), Some(vb)) = (self.get_const(a), self.get_const(b)) {
            return self.bv_lit(&eval::unsigned_div_rem(&va, &vb).0);
        }
        if let Some(r) = self.try_select_distribute(a, b, Context::unsigned_div) {
            return r;
        }
        if self.is_one_const(b) {
            return a;
        }
        self.add_expr(Expr::UnsignedDiv(a, b, width))
    }

    pub fn signed_div(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        let width = self.width(a);
        assert_eq!(width, self.width(b), "widths must match");
        if let (Some(va), Some(vb)) = (self.get_const(a), self.get_const(b)) {
            return self.bv_lit(&eval::signed_div_rem(&va, &vb).0);
        }
        if let Some(r) = self.try_select_distribute(a, b, Context::signed_div) {
            return r;
        }
        if self.is_one_const(b) {
            return a;
        }
        self.add_expr(Expr::SignedDiv(a, b, width))
    }

    pub fn unsigned_rem(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        let width = self.width(a);
        assert_eq!(width, self.width(b), "widths must match");
        if let (Some(va), Some(vb)) = (self.get_const(a), self.get_const(b)) {
            return self.bv_lit(&eval::unsigned_div_rem(&va, &vb).1);
        }
        if let Some(r) = self.try_select_distribute(a, b, Context::unsigned_rem) {
            return r;
        }
        if self.is_one_const(b) {
            return self.zero(width);
        }
        self.add_expr(Expr::UnsignedRem(a, b, width))
    }

    pub fn signed_rem(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        let width = self.width(a);
        assert_eq!(width, self.width(b), "widths must match");
        if let (Some(va), Some(vb)) = (self.get_const(a), self.get_const(b)) {
            return self.bv_lit(&eval::signed_div_rem(&va, &vb).1);
        }
        if let Some(r) = self.try_select_distribute(a, b, Context::signed_rem) {
            return r;
        }
        if self.is_one_const(b) {
            return self.zero(width);
        }
        self.add_expr(Expr::SignedRem(a, b, width))
    }

    fn is_one_const(&self, e: ExprRef) -> bool {
        match self.get_const(e) {
            Some(v) => v.is_equal(&BitVecValue::from_u64(1, v.width())),
            None => false,
        }
    }
}

/// Bitwise operations and shifts.
impl Context {
    pub fn and(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        let width = self.width(a);
        assert_eq!(width, self.width(b), "widths must match");
        if let (Some(va), Some(vb)) = (self.get_const(a), self.get_const(b)) {
            return self.bv_lit(&va.and(&vb));
        }
        if a == b {
            return a;
        }
        if let Some(r) = self.try_select_distribute(a, b, Context::and) {
            return r;
        }
        let (a, b) = if self.is_const(b) { (b, a) } else { (a, b) };
        if self.is_zero_const(a) {
            return a;
        }
        if self.is_all_ones_const(a) {
            return b;
        }
        self.add_expr(Expr::And(a, b, width))
    }

    pub fn or(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        let width = self.width(a);
        assert_eq!(width, self.width(b), "widths must match");
        if let (Some(va), Some(vb)) = (self.get_const(a), self.get_const(b)) {
            return self.bv_lit(&va.or(&vb));
        }
        if a == b {
            return a;
        }
        if let Some(r) = self.try_select_distribute(a, b, Context::or) {
            return r;
        }
        let (a, b) = if self.is_const(b) { (b, a) } else { (a, b) };
        if self.is_zero_const(a) {
            return b;
        }
        if self.is_all_ones_const(a) {
            return a;
        }
        self.add_expr(Expr::Or(a, b, width))
    }

    pub fn xor(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        let width = self.width(a);
        assert_eq!(width, self.width(b), "widths must match");
        if let (Some(va), Some(vb)) = (self.get_const(a), self.get_const(b)) {
            return self.bv_lit(&va.xor(&vb));
        }
        if a == b {
            return self.zero(width);
        }
        if let Some(r) = self.try_select_distribute(a, b, Context::xor) {
            return r;
        }
        let (a, b) = if self.is_const(b) { (b, a) } else { (a, b) };
        if self.is_zero_const(a) {
            return b;
        }
        if self.is_all_ones_const(a) {
            return self.not(b);
        }
        self.add_expr(Expr::Xor(a, b, width))
    }

    pub fn shift_left(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        let width = self.width(a);
        assert_eq!(width, self.width(b), "widths must match");
        if let (Some(va), Some(vb)) = (self.get_const(a), self.get_const(b)) {
            return self.bv_lit(&va.shift_left(&vb));
        }
        if width == widths::BOOL {
            // shifting a single bit by one clears it
            let nb = self.not(b);
            return self.and(a, nb);
        }
        if self.is_zero_const(b) || self.is_zero_const(a) {
            return a;
        }
        self.add_expr(Expr::ShiftLeft(a, b, width))
    }

    pub fn shift_right(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        let width = self.width(a);
        assert_eq!(width, self.width(b), "widths must match");
        if let (Some(va), Some(vb)) = (self.get_const(a), self.get_const(b)) {
            return self.bv_lit(&va.shift_right(&vb));
        }
        if width == widths::BOOL {
            let nb = self.not(b);
            return self.and(a, nb);
        }
        if self.is_zero_const(b) || self.is_zero_const(a) {
            return a;
        }
        self.add_expr(Expr::ShiftRight(a, b, width))
    }

    pub fn arithmetic_shift_right(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        let width = self.width(a);
        assert_eq!(width, self.width(b), "widths must match");
        if let (Some(va), Some(vb)) = (self.get_const(a), self.get_const(b)) {
            return self.bv_lit(&va.arithmetic_shift_right(&vb));
        }
        if width == widths::BOOL {
            // the sign bit is replicated into itself
            return a;
        }
        if self.is_zero_const(b) {
            return a;
        }
        self.add_expr(Expr::ArithmeticShiftRight(a, b, width))
    }

    pub fn not(&mut self, e: ExprRef) -> ExprRef {
        let width = self.width(e);
        if let Some(v) = self.get_const(e) {
            return self.bv_lit(&v.not());
        }
        match *self.get(e) {
            Expr::Not(inner, _) => return inner,
            // De Morgan, for 1-bit operands only where it cannot grow the tree
            Expr::And(x, y, widths::BOOL) => {
                let nx = self.not(x);
                let ny = self.not(y);
                return self.or(nx, ny);
            }
            Expr::Or(x, y, widths::BOOL) => {
                let nx = self.not(x);
                let ny = self.not(y);
                return self.and(nx, ny);
            }
            _ => {}
        }
        self.add_expr(Expr::Not(e, width))
    }
}

/// Bit manipulation and integer casts.
impl Context {
    pub fn concat(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        let width = self.width(a) + self.width(b);
        if let (Some(va), Some(vb)) = (self.get_const(a), self.get_const(b)) {
            return self.bv_lit(&va.concat(&vb));
        }
        // fuse adjacent extracts over the same source
        if let (
            Expr::Extract {
                e: ea,
                offset: offset_a,
                width: width_a,
            },
            Expr::Extract {
                e: eb,
                offset: offset_b,
                width: width_b,
            },
        ) = (*self.get(a), *self.get(b))
        {
            if ea == eb && offset_b + width_b == offset_a {
                return self.extract(ea, offset_b, width_a + width_b);
            }
        }
        self.add_expr(Expr::Concat(a, b, width))
    }

    /// Extracts `width` bits starting at the least-significant `offset`.
    pub fn extract(&mut self, e: ExprRef, offset: WidthInt, width: WidthInt) -> ExprRef {
        let e_width = self.width(e);
        assert!(width > 0, "0-bit bitvectors are not allowed");
        assert!(
            offset + width <= e_width,
            "extract [{}, {}) out of range for a {e_width}-bit expression",
            offset,
            offset + width
        );
        if offset == 0 && width == e_width {
            return e;
        }
        if let Some(v) = self.get_const(e) {
            return self.bv_lit(&v.slice(offset + width - 1, offset));
        }
        match *self.get(e) {
            // decompose over a concatenation
            Expr::Concat(hi, lo, _) => {
                let lo_width = self.width(lo);
                if offset + width <= lo_width {
                    return self.extract(lo, offset, width);
                }
                if offset >= lo_width {
                    return self.extract(hi, offset - lo_width, width);
                }
                let hi_part = self.extract(hi, 0, offset + width - lo_width);
                let lo_part = self.extract(lo, offset, lo_width - offset);
                return self.concat(hi_part, lo_part);
            }
            // fuse nested extracts
            Expr::Extract {
                e: inner,
                offset: inner_offset,
                ..
            } => {
                return self.extract(inner, inner_offset + offset, width);
            }
            // an extract that stays within the original bits skips the extension
            Expr::ZeroExt { e: inner, .. } | Expr::SignExt { e: inner, .. } => {
                if offset + width <= self.width(inner) {
                    return self.extract(inner, offset, width);
                }
            }
            _ => {}
        }
        self.add_expr(Expr::Extract { e, offset, width })
    }

    /// Zero-extends (or truncates) to exactly `width` bits.
    pub fn zero_extend(&mut self, e: ExprRef, width: WidthInt) -> ExprRef {
        let e_width = self.width(e);
        if width == e_width {
            return e;
        }
        if width < e_width {
            return self.extract(e, 0, width);
        }
        if let Some(v) = self.get_const(e) {
            let ext = BitVecValue::zero(width - e_width);
            return self.bv_lit(&ext.concat(&v));
        }
        if let Expr::ZeroExt { e: inner, .. } = *self.get(e) {
            return self.zero_extend(inner, width);
        }
        self.add_expr(Expr::ZeroExt { e, width })
    }

    /// Sign-extends (or truncates) to exactly `width` bits.
    pub fn sign_extend(&mut self, e: ExprRef, width: WidthInt) -> ExprRef {
        let e_width = self.width(e);
        if width == e_width {
            return e;
        }
        if width < e_width {
            return self.extract(e, 0, width);
        }
        if let Some(v) = self.get_const(e) {
            let ext = if eval::is_negative(&v) {
                BitVecValue::zero(width - e_width).not()
            } else {
                BitVecValue::zero(width - e_width)
            };
            return self.bv_lit(&ext.concat(&v));
        }
        match *self.get(e) {
            Expr::SignExt { e: inner, .. } => return self.sign_extend(inner, width),
            // a zero-extended value is known non-negative
            Expr::ZeroExt { e: inner, .. } if self.width(inner) < e_width => {
                return self.zero_extend(inner, width);
            }
            _ => {}
        }
        self.add_expr(Expr::SignExt { e, width })
    }

    pub fn select(&mut self, cond: ExprRef, tru: ExprRef, fals: ExprRef) -> ExprRef {
        assert_eq!(self.width(cond), widths::BOOL, "condition must be 1-bit");
        let width = self.width(tru);
        assert_eq!(width, self.width(fals), "widths must match");
        if let Some(c) = self.get_const(cond) {
            return if c.is_tru() { tru } else { fals };
        }
        if tru == fals {
            return tru;
        }
        if width == widths::BOOL {
            if self.is_all_ones_const(tru) {
                return self.or(cond, fals);
            }
            if self.is_zero_const(tru) {
                let nc = self.not(cond);
                return self.and(nc, fals);
            }
            if self.is_all_ones_const(fals) {
                let nc = self.not(cond);
                return self.or(nc, tru);
            }
            if self.is_zero_const(fals) {
                return self.and(cond, tru);
            }
        }
        self.add_expr(Expr::Select { cond, tru, fals })
    }
}

/// Integer comparisons. The reversed and negated forms (`ne`, `ugt`, `uge`,
/// `sgt`, `sge`) are factory-level rewrites so that hash-consing only ever sees
/// the canonical operators.
impl Context {
    pub fn eq(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        let width = self.width(a);
        assert_eq!(width, self.width(b), "widths must match");
        if a == b {
            return self.tru();
        }
        if let (Some(va), Some(vb)) = (self.get_const(a), self.get_const(b)) {
            return self.bool_lit(va.is_equal(&vb));
        }
        if let Some(r) = self.try_select_distribute(a, b, Context::eq) {
            return r;
        }
        let (a, b) = if self.is_const(b) { (b, a) } else { (a, b) };
        if let Some(va) = self.get_const(a) {
            if width == widths::BOOL {
                return if va.is_tru() { b } else { self.not(b) };
            }
            // solve for the pre-image of an invertible operation
            match *self.get(b) {
                Expr::ZeroExt { e, .. } => {
                    let inner_width = self.width(e);
                    let high = va.slice(width - 1, inner_width);
                    if high.is_equal(&BitVecValue::zero(width - inner_width)) {
                        let low = self.bv_lit(&va.slice(inner_width - 1, 0));
                        return self.eq(low, e);
                    }
                    return self.fals();
                }
                Expr::SignExt { e, .. } => {
                    let inner_width = self.width(e);
                    let low = va.slice(inner_width - 1, 0);
                    let high = va.slice(width - 1, inner_width);
                    let expected = if eval::is_negative(&low) {
                        BitVecValue::zero(width - inner_width).not()
                    } else {
                        BitVecValue::zero(width - inner_width)
                    };
                    if high.is_equal(&expected) {
                        let low = self.bv_lit(&low);
                        return self.eq(low, e);
                    }
                    return self.fals();
                }
                // c1 == c2 + x  <=>  c1 - c2 == x
                Expr::Add(x, y, _) if self.is_const(x) => {
                    let c = va.sub(&self.get_const(x).unwrap());
                    let c = self.bv_lit(&c);
                    return self.eq(c, y);
                }
                // c1 == c2 - x  <=>  c2 - c1 == x
                Expr::Sub(x, y, _) if self.is_const(x) => {
                    let c = self.get_const(x).unwrap().sub(&va);
                    let c = self.bv_lit(&c);
                    return self.eq(c, y);
                }
                Expr::Read { updates, index, .. } if self.const_array_opt_enabled() => {
                    if let Some(r) = self.try_const_array_opt(&va, updates, index) {
                        return r;
                    }
                }
                _ => {}
            }
        }
        self.add_expr(Expr::Equal(a, b))
    }

    pub fn ne(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        let e = self.eq(a, b);
        self.not(e)
    }

    pub fn ult(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        let width = self.width(a);
        assert_eq!(width, self.width(b), "widths must match");
        if a == b {
            return self.fals();
        }
        if let (Some(va), Some(vb)) = (self.get_const(a), self.get_const(b)) {
            return self.bool_lit(vb.is_greater(&va));
        }
        if let Some(r) = self.try_select_distribute(a, b, Context::ult) {
            return r;
        }
        if self.is_zero_const(b) {
            return self.fals();
        }
        if width == widths::BOOL {
            let na = self.not(a);
            return self.and(na, b);
        }
        self.add_expr(Expr::UnsignedLess(a, b))
    }

    pub fn ule(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        let width = self.width(a);
        assert_eq!(width, self.width(b), "widths must match");
        if a == b {
            return self.tru();
        }
        if let (Some(va), Some(vb)) = (self.get_const(a), self.get_const(b)) {
            return self.bool_lit(vb.is_greater_or_equal(&va));
        }
        if let Some(r) = self.try_select_distribute(a, b, Context::ule) {
            return r;
        }
        if self.is_zero_const(a) {
            return self.tru();
        }
        if width == widths::BOOL {
            let na = self.not(a);
            return self.or(na, b);
        }
        self.add_expr(Expr::UnsignedLessEqual(a, b))
    }

    pub fn slt(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        let width = self.width(a);
        assert_eq!(width, self.width(b), "widths must match");
        if a == b {
            return self.fals();
        }
        if let (Some(va), Some(vb)) = (self.get_const(a), self.get_const(b)) {
            return self.bool_lit(vb.is_greater_signed(&va));
        }
        if let Some(r) = self.try_select_distribute(a, b, Context::slt) {
            return r;
        }
        if width == widths::BOOL {
            // the only 1-bit value below 0 is -1
            let nb = self.not(b);
            return self.and(a, nb);
        }
        self.add_expr(Expr::SignedLess(a, b))
    }

    pub fn sle(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        let width = self.width(a);
        assert_eq!(width, self.width(b), "widths must match");
        if a == b {
            return self.tru();
        }
        if let (Some(va), Some(vb)) = (self.get_const(a), self.get_const(b)) {
            return self.bool_lit(vb.is_greater_or_equal_signed(&va));
        }
        if let Some(r) = self.try_select_distribute(a, b, Context::sle) {
            return r;
        }
        if width == widths::BOOL {
            let nb = self.not(b);
            return self.or(a, nb);
        }
        self.add_expr(Expr::SignedLessEqual(a, b))
    }

    pub fn ugt(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        self.ult(b, a)
    }

    pub fn uge(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        self.ule(b, a)
    }

    pub fn sgt(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        self.slt(b, a)
    }

    pub fn sge(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        self.sle(b, a)
    }

    /// Rewrites `eq(constant, read(concrete-array, index))` into a disjunction
    /// over the indices whose stored value equals the constant. Abandoned once
    /// the number of matches exceeds [`CONST_ARRAY_OPT_MAX_MATCHES`].
    fn try_const_array_opt(
        &mut self,
        value: &BitVecValue,
        updates: UpdateList,
        index: ExprRef,
    ) -> Option<ExprRef> {
        if !updates.is_empty() {
            return None;
        }
        let array = self.get_array(updates.root);
        let domain = array.domain;
        let cells = match &array.source {
            ArraySource::Concrete(cells) => cells.clone(),
            ArraySource::Symbolic => return None,
        };
        let mut matches = Vec::new();
        for (i, cell) in cells.iter().enumerate() {
            if self.get_const(*cell)?.is_equal(value) {
                if matches.len() >= CONST_ARRAY_OPT_MAX_MATCHES {
                    return None;
                }
                matches.push(i as u64);
            }
        }
        let mut result = self.fals();
        for i in matches {
            let idx = self.bv_lit(&BitVecValue::from_u64(i, domain));
            let hit = self.eq(idx, index);
            result = self.or(result, hit);
        }
        Some(result)
    }
}

/// Memory reads.
impl Context {
    /// Reads through a write history. Folds to a written value when the indices
    /// provably match, drops writes that provably cannot alias the read index,
    /// and resolves reads of concrete arrays with in-bounds constant indices.
    pub fn read(&mut self, updates: UpdateList, index: ExprRef) -> ExprRef {
        let (domain, range) = {
            let array = self.get_array(updates.root);
            (array.domain, array.range)
        };
        assert_eq!(
            self.width(index),
            domain,
            "read index must match the array domain"
        );
        let index_value = self.get_const(index);
        let mut head = updates.head;
        while let Some(node_ref) = head {
            let node = *self.get_update(node_ref);
            // hash-consing makes provable equality a reference check
            if node.index == index {
                return node.value;
            }
            match (self.get_const(node.index), &index_value) {
                // two distinct constant refs are provably unequal, the write
                // cannot alias this read
                (Some(_), Some(_)) => head = node.next,
                // a symbolic write may alias, no folding past this point
                _ => break,
            }
        }
        if head.is_none() {
            if let Some(read_index) = &index_value {
                let array = self.get_array(updates.root);
                if let ArraySource::Concrete(cells) = &array.source {
                    if let Some(i) = read_index.to_u64() {
                        if (i as usize) < cells.len() {
                            return cells[i as usize];
                        }
                    }
                }
            }
        }
        let trimmed = UpdateList {
            root: updates.root,
            head,
        };
        self.add_expr(Expr::Read {
            updates: trimmed,
            index,
            width: range,
        })
    }
}

/// Floating-point arithmetic.
impl Context {
    fn fp_format(&self, e: ExprRef) -> FloatFormat {
        let width = self.width(e);
        FloatFormat::from_width(width)
            .unwrap_or_else(|| panic!("{width} bits is not a supported floating-point format"))
    }

    /// Constant folding for binary floating-point operations. Routes the 80-bit
    /// extended format through the registered native evaluator when possible.
    fn fp_fold_binary(
        &mut self,
        op: FPBinOp,
        a: ExprRef,
        b: ExprRef,
        rm: RoundingMode,
    ) -> Option<ExprRef> {
        let fmt = self.fp_format(a);
        assert_eq!(self.width(a), self.width(b), "widths must match");
        let canonical = self.canonical_nan_enabled();
        let ca = self.get_const_bits(a);
        let cb = self.get_const_bits(b);
        // a single NaN operand decides the NaN-propagating operations, even
        // when the other operand is symbolic
        if canonical
            && matches!(
                op,
                FPBinOp::Add | FPBinOp::Sub | FPBinOp::Mul | FPBinOp::Div | FPBinOp::Rem
            )
        {
            let nan_in = |x: Option<u128>| {
                x.map(|bits| float::eval_predicate(fmt, FPPredicate::IsNan, bits))
                    .unwrap_or(false)
            };
            if nan_in(ca) || nan_in(cb) {
                let nan = float::canonical_nan(fmt);
                return Some(self.fp_const(nan, fmt));
            }
        }
        let (xa, xb) = (ca?, cb?);
        if fmt == FloatFormat::Extended {
            match self.native_extended() {
                Some(native) => {
                    if let Some(bits) = native.binary(op, xa, xb, rm) {
                        let bits = if canonical
                            && float::eval_predicate(fmt, FPPredicate::IsNan, bits)
                        {
                            float::canonical_nan(fmt)
                        } else {
                            bits
                        };
                        return Some(self.fp_const(bits, fmt));
                    }
                }
                None => float::warn_native_extended_missing(),
            }
        }
        let bits = float::eval_binary(fmt, op, xa, xb, rm, canonical);
        Some(self.fp_const(bits, fmt))
    }

    fn fp_fold_unary(&mut self, op: FPUnOp, e: ExprRef, rm: RoundingMode) -> Option<ExprRef> {
        let fmt = self.fp_format(e);
        let canonical = self.canonical_nan_enabled();
        let bits = self.get_const_bits(e)?;
        if fmt == FloatFormat::Extended {
            match self.native_extended() {
                Some(native) => {
                    if let Some(r) = native.unary(op, bits, rm) {
                        let r = if canonical && float::eval_predicate(fmt, FPPredicate::IsNan, r)
                        {
                            float::canonical_nan(fmt)
                        } else {
                            r
                        };
                        return Some(self.fp_const(r, fmt));
                    }
                }
                None => float::warn_native_extended_missing(),
            }
        }
        let r = float::eval_unary(fmt, op, bits, rm, canonical)?;
        Some(self.fp_const(r, fmt))
    }

    pub fn fp_add(&mut self, a: ExprRef, b: ExprRef, rm: RoundingMode) -> ExprRef {
        if let Some(r) = self.fp_fold_binary(FPBinOp::Add, a, b, rm) {
            return r;
        }
        let width = self.width(a);
        self.add_expr(Expr::FPAdd(a, b, width, rm))
    }

    pub fn fp_sub(&mut self, a: ExprRef, b: ExprRef, rm: RoundingMode) -> ExprRef {
        if let Some(r) = self.fp_fold_binary(FPBinOp::Sub, a, b, rm) {
            return r;
        }
        let width = self.width(a);
        self.add_expr(Expr::FPSub(a, b, width, rm))
    }

    pub fn fp_mul(&mut self, a: ExprRef, b: ExprRef, rm: RoundingMode) -> ExprRef {
        if let Some(r) = self.fp_fold_binary(FPBinOp::Mul, a, b, rm) {
            return r;
        }
        let width = self.width(a);
        self.add_expr(Expr::FPMul(a, b, width, rm))
    }

    pub fn fp_div(&mut self, a: ExprRef, b: ExprRef, rm: RoundingMode) -> ExprRef {
        if let Some(r) = self.fp_fold_binary(FPBinOp::Div, a, b, rm) {
            return r;
        }
        let width = self.width(a);
        self.add_expr(Expr::FPDiv(a, b, width, rm))
    }

    pub fn fp_rem(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        // the remainder is exact, the rounding mode never matters
        if let Some(r) =
            self.fp_fold_binary(FPBinOp::Rem, a, b, RoundingMode::NearestTiesToEven)
        {
            return r;
        }
        let width = self.width(a);
        self.add_expr(Expr::FPRem(a, b, width))
    }

    pub fn fp_min(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        if let Some(r) =
            self.fp_fold_binary(FPBinOp::Min, a, b, RoundingMode::NearestTiesToEven)
        {
            return r;
        }
        let width = self.width(a);
        self.add_expr(Expr::FPMin(a, b, width))
    }

    pub fn fp_max(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        if let Some(r) =
            self.fp_fold_binary(FPBinOp::Max, a, b, RoundingMode::NearestTiesToEven)
        {
            return r;
        }
        let width = self.width(a);
        self.add_expr(Expr::FPMax(a, b, width))
    }

    pub fn fp_neg(&mut self, e: ExprRef) -> ExprRef {
        if let Some(r) = self.fp_fold_unary(FPUnOp::Neg, e, RoundingMode::NearestTiesToEven) {
            return r;
        }
        // negation only flips the sign bit, double negation is bit-exact
        if let Expr::FPNeg(inner, _) = *self.get(e) {
            return inner;
        }
        let width = self.width(e);
        self.add_expr(Expr::FPNeg(e, width))
    }

    pub fn fp_abs(&mut self, e: ExprRef) -> ExprRef {
        if let Some(r) = self.fp_fold_unary(FPUnOp::Abs, e, RoundingMode::NearestTiesToEven) {
            return r;
        }
        match *self.get(e) {
            Expr::FPAbs(..) => return e,
            Expr::FPNeg(inner, _) => return self.fp_abs(inner),
            _ => {}
        }
        let width = self.width(e);
        self.add_expr(Expr::FPAbs(e, width))
    }

    pub fn fp_sqrt(&mut self, e: ExprRef, rm: RoundingMode) -> ExprRef {
        if let Some(r) = self.fp_fold_unary(FPUnOp::Sqrt, e, rm) {
            return r;
        }
        let width = self.width(e);
        self.add_expr(Expr::FPSqrt(e, width, rm))
    }

    pub fn fp_round_to_integral(&mut self, e: ExprRef, rm: RoundingMode) -> ExprRef {
        if let Some(r) = self.fp_fold_unary(FPUnOp::RoundToIntegral, e, rm) {
            return r;
        }
        let width = self.width(e);
        self.add_expr(Expr::FPRoundToIntegral(e, width, rm))
    }
}

/// Floating-point comparisons and predicates. Only the ordered `eq`, `lt` and
/// `le` exist as nodes; `gt` and `ge` are factory rewrites.
impl Context {
    fn fp_fold_compare(&mut self, op: FPCmpOp, a: ExprRef, b: ExprRef) -> Option<ExprRef> {
        let fmt = self.fp_format(a);
        assert_eq!(self.width(a), self.width(b), "widths must match");
        let ca = self.get_const_bits(a);
        let cb = self.get_const_bits(b);
        // an ordered comparison with a NaN operand is false regardless of the other side
        for c in [ca, cb].into_iter().flatten() {
            if float::eval_predicate(fmt, FPPredicate::IsNan, c) {
                return Some(self.fals());
            }
        }
        let result = float::eval_compare(fmt, op, ca?, cb?);
        Some(self.bool_lit(result))
    }

    pub fn fp_equal(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        if let Some(r) = self.fp_fold_compare(FPCmpOp::Equal, a, b) {
            return r;
        }
        self.add_expr(Expr::FPEqual(a, b))
    }

    pub fn fp_less(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        if let Some(r) = self.fp_fold_compare(FPCmpOp::Less, a, b) {
            return r;
        }
        self.add_expr(Expr::FPLess(a, b))
    }

    pub fn fp_less_equal(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        if let Some(r) = self.fp_fold_compare(FPCmpOp::LessEqual, a, b) {
            return r;
        }
        self.add_expr(Expr::FPLessEqual(a, b))
    }

    pub fn fp_greater(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        self.fp_less(b, a)
    }

    pub fn fp_greater_equal(&mut self, a: ExprRef, b: ExprRef) -> ExprRef {
        self.fp_less_equal(b, a)
    }

    pub fn fp_is_nan(&mut self, e: ExprRef) -> ExprRef {
        let fmt = self.fp_format(e);
        if let Some(bits) = self.get_const_bits(e) {
            return self.bool_lit(float::eval_predicate(fmt, FPPredicate::IsNan, bits));
        }
        self.add_expr(Expr::FPIsNan(e))
    }

    pub fn fp_is_infinite(&mut self, e: ExprRef) -> ExprRef {
        let fmt = self.fp_format(e);
        if let Some(bits) = self.get_const_bits(e) {
            return self.bool_lit(float::eval_predicate(fmt, FPPredicate::IsInfinite, bits));
        }
        self.add_expr(Expr::FPIsInfinite(e))
    }

    pub fn fp_is_normal(&mut self, e: ExprRef) -> ExprRef {
        let fmt = self.fp_format(e);
        if let Some(bits) = self.get_const_bits(e) {
            return self.bool_lit(float::eval_predicate(fmt, FPPredicate::IsNormal, bits));
        }
        self.add_expr(Expr::FPIsNormal(e))
    }

    pub fn fp_is_subnormal(&mut self, e: ExprRef) -> ExprRef {
        let fmt = self.fp_format(e);
        if let Some(bits) = self.get_const_bits(e) {
            return self.bool_lit(float::eval_predicate(fmt, FPPredicate::IsSubnormal, bits));
        }
        self.add_expr(Expr::FPIsSubnormal(e))
    }
}

/// Floating-point casts and integer conversions.
impl Context {
    /// Extends to a wider floating-point format. Exact, no rounding involved.
    pub fn fp_extend(&mut self, e: ExprRef, width: WidthInt) -> ExprRef {
        let from = self.fp_format(e);
        let to = FloatFormat::from_width(width)
            .unwrap_or_else(|| panic!("{width} bits is not a supported floating-point format"));
        if width == self.width(e) {
            return e;
        }
        assert!(width > self.width(e), "fp_extend must widen");
        if let Some(bits) = self.get_const_bits(e) {
            let canonical = self.canonical_nan_enabled();
            let r =
                float::eval_convert(from, to, bits, RoundingMode::NearestTiesToEven, canonical);
            return self.fp_const(r, to);
        }
        self.add_expr(Expr::FPExt { e, width })
    }

    /// Truncates to a narrower floating-point format, rounding per `rm`.
    pub fn fp_trunc(&mut self, e: ExprRef, width: WidthInt, rm: RoundingMode) -> ExprRef {
        let from = self.fp_format(e);
        let to = FloatFormat::from_width(width)
            .unwrap_or_else(|| panic!("{width} bits is not a supported floating-point format"));
        assert!(width < self.width(e), "fp_trunc must narrow");
        if let Some(bits) = self.get_const_bits(e) {
            let canonical = self.canonical_nan_enabled();
            let r = float::eval_convert(from, to, bits, rm, canonical);
            return self.fp_const(r, to);
        }
        self.add_expr(Expr::FPTrunc { e, width, rm })
    }

    pub fn fp_to_unsigned(&mut self, e: ExprRef, width: WidthInt, rm: RoundingMode) -> ExprRef {
        let fmt = self.fp_format(e);
        assert!(width > 0 && width <= 128, "unsupported conversion width");
        if let Some(bits) = self.get_const_bits(e) {
            let r = float::eval_to_unsigned(fmt, bits, width, rm);
            return self.bv_lit(&eval::bits_to_value(r, width));
        }
        self.add_expr(Expr::FPToUnsigned { e, width, rm })
    }

    pub fn fp_to_signed(&mut self, e: ExprRef, width: WidthInt, rm: RoundingMode) -> ExprRef {
        let fmt = self.fp_format(e);
        assert!(width > 0 && width <= 128, "unsupported conversion width");
        if let Some(bits) = self.get_const_bits(e) {
            let r = float::eval_to_signed(fmt, bits, width, rm);
            return self.bv_lit(&eval::bits_to_value(r, width));
        }
        self.add_expr(Expr::FPToSigned { e, width, rm })
    }

    pub fn unsigned_to_fp(&mut self, e: ExprRef, width: WidthInt, rm: RoundingMode) -> ExprRef {
        let to = FloatFormat::from_width(width)
            .unwrap_or_else(|| panic!("{width} bits is not a supported floating-point format"));
        assert!(self.width(e) <= 128, "unsupported conversion width");
        if let Some(bits) = self.get_const_bits(e) {
            let r = float::eval_from_unsigned(to, bits, rm);
            return self.fp_const(r, to);
        }
        self.add_expr(Expr::UnsignedToFP { e, width, rm })
    }

    pub fn signed_to_fp(&mut self, e: ExprRef, width: WidthInt, rm: RoundingMode) -> ExprRef {
        let to = FloatFormat::from_width(width)
            .unwrap_or_else(|| panic!("{width} bits is not a supported floating-point format"));
        let e_width = self.width(e);
        assert!(e_width <= 128, "unsupported conversion width");
        if let Some(bits) = self.get_const_bits(e) {
            let signed = sign_extend_to_i128(bits, e_width);
            let r = float::eval_from_signed(to, signed, rm);
            return self.fp_const(r, to);
        }
        self.add_expr(Expr::SignedToFP { e, width, rm })
    }
}

fn sign_extend_to_i128(bits: u128, width: WidthInt) -> i128 {
    if width == 128 || (bits >> (width - 1)) & 1 == 0 {
        bits as i128
    } else {
        (bits | (u128::MAX << width)) as i128
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(ctx: &mut Context, value: u64, width: WidthInt) -> ExprRef {
        ctx.bv_lit(&BitVecValue::from_u64(value, width))
    }

    #[test]
    fn add_constant_folding() {
        let mut ctx = Context::default();
        let two = lit(&mut ctx, 2, 32);
        let three = lit(&mut ctx, 3, 32);
        let sum = ctx.add(two, three);
        assert_eq!(ctx.get_const(sum).unwrap().to_u64().unwrap(), 5);
    }

    #[test]
    fn identity_laws() {
        let mut ctx = Context::default();
        let x = ctx.bv_symbol("x", 32);
        let zero = ctx.zero(32);
        let one = ctx.one(32);
        let mask = ctx.mask(32);
        assert_eq!(ctx.add(x, zero), x);
        assert_eq!(ctx.mul(x, one), x);
        assert_eq!(ctx.mul(x, zero), zero);
        assert_eq!(ctx.and(x, zero), zero);
        assert_eq!(ctx.and(x, mask), x);
        assert_eq!(ctx.or(x, zero), x);
        assert_eq!(ctx.or(x, mask), mask);
        assert_eq!(ctx.xor(x, zero), x);
        assert_eq!(ctx.xor(x, x), zero);
        assert_eq!(ctx.sub(x, x), zero);
        assert_eq!(ctx.shift_left(x, zero), x);
        let nn = ctx.not(x);
        assert_eq!(ctx.not(nn), x);
    }

    #[test]
    fn bool_arithmetic_degrades_to_logic() {
        let mut ctx = Context::default();
        let a = ctx.bv_symbol("a", 1);
        let b = ctx.bv_symbol("b", 1);
        assert_eq!(ctx.add(a, b), ctx.xor(a, b));
        assert_eq!(ctx.mul(a, b), ctx.and(a, b));
        assert_eq!(ctx.sub(a, b), ctx.xor(a, b));
    }

    #[test]
    fn constants_float_to_chain_heads() {
        let mut ctx = Context::default();
        let x = ctx.bv_symbol("x", 32);
        let two = lit(&mut ctx, 2, 32);
        let three = lit(&mut ctx, 3, 32);
        // (x + 2) + 3 = 5 + x
        let t = ctx.add(x, two);
        let sum = ctx.add(t, three);
        let five = lit(&mut ctx, 5, 32);
        assert_eq!(sum, ctx.add(five, x));
        // x - 2 = (-2) + x
        let d = ctx.sub(x, two);
        let minus_two = ctx.bv_lit(&BitVecValue::from_i64(-2, 32));
        assert_eq!(d, ctx.add(minus_two, x));
    }

    #[test]
    fn eq_preimage_through_add() {
        let mut ctx = Context::default();
        let x = ctx.bv_symbol("x", 32);
        let two = lit(&mut ctx, 2, 32);
        let five = lit(&mut ctx, 5, 32);
        let sum = ctx.add(x, two);
        let cond = ctx.eq(five, sum);
        let three = lit(&mut ctx, 3, 32);
        assert_eq!(cond, ctx.eq(three, x));
    }

    #[test]
    fn eq_preimage_through_extension() {
        let mut ctx = Context::default();
        let x = ctx.bv_symbol("x", 8);
        let wide = ctx.zero_extend(x, 32);
        let c = lit(&mut ctx, 0xab, 32);
        let cond = ctx.eq(c, wide);
        let c_narrow = lit(&mut ctx, 0xab, 8);
        assert_eq!(cond, ctx.eq(c_narrow, x));
        // a constant with high bits set can never equal a zero-extended value
        let big = lit(&mut ctx, 0x1_0000, 32);
        assert_eq!(ctx.eq(big, wide), ctx.fals());
    }

    #[test]
    fn extract_of_concat_decomposes() {
        let mut ctx = Context::default();
        let a = ctx.bv_symbol("a", 8);
        let b = ctx.bv_symbol("b", 8);
        let ab = ctx.concat(a, b);
        assert_eq!(ctx.extract(ab, 0, 8), b);
        assert_eq!(ctx.extract(ab, 8, 8), a);
        // extract of the whole word is the identity
        assert_eq!(ctx.extract(ab, 0, 16), ab);
    }

    #[test]
    fn extract_fusion() {
        let mut ctx = Context::default();
        let x = ctx.bv_symbol("x", 32);
        let mid = ctx.extract(x, 8, 16);
        let low = ctx.extract(mid, 4, 8);
        assert_eq!(low, ctx.extract(x, 12, 8));
        // concat of adjacent extracts fuses back
        let hi = ctx.extract(x, 16, 8);
        let lo = ctx.extract(x, 8, 8);
        assert_eq!(ctx.concat(hi, lo), ctx.extract(x, 8, 16));
    }

    #[test]
    fn extension_collapse_and_truncation() {
        let mut ctx = Context::default();
        let x = ctx.bv_symbol("x", 8);
        let z16 = ctx.zero_extend(x, 16);
        let z32 = ctx.zero_extend(z16, 32);
        assert_eq!(z32, ctx.zero_extend(x, 32));
        // a smaller target acts as an extract
        assert_eq!(ctx.zero_extend(x, 4), ctx.extract(x, 0, 4));
        assert_eq!(ctx.sign_extend(x, 8), x);
        let s16 = ctx.sign_extend(x, 16);
        assert_eq!(ctx.sign_extend(s16, 32), ctx.sign_extend(x, 32));
    }

    #[test]
    fn select_rules() {
        let mut ctx = Context::default();
        let c = ctx.bv_symbol("c", 1);
        let x = ctx.bv_symbol("x", 32);
        let y = ctx.bv_symbol("y", 32);
        let tru = ctx.tru();
        assert_eq!(ctx.select(tru, x, y), x);
        let fals = ctx.fals();
        assert_eq!(ctx.select(fals, x, y), y);
        assert_eq!(ctx.select(c, x, x), x);
        // bool specializations
        let p = ctx.bv_symbol("p", 1);
        assert_eq!(ctx.select(c, tru, p), ctx.or(c, p));
        assert_eq!(ctx.select(c, p, fals), ctx.and(c, p));
    }

    #[test]
    fn select_distribution() {
        let mut ctx = Context::default();
        let c = ctx.bv_symbol("c", 1);
        let two = lit(&mut ctx, 2, 32);
        let three = lit(&mut ctx, 3, 32);
        let ten = lit(&mut ctx, 10, 32);
        let sel = ctx.select(c, two, three);
        let sum = ctx.add(sel, ten);
        let twelve = lit(&mut ctx, 12, 32);
        let thirteen = lit(&mut ctx, 13, 32);
        assert_eq!(sum, ctx.select(c, twelve, thirteen));
    }

    #[test]
    fn division_folding_and_identities() {
        let mut ctx = Context::default();
        let x = ctx.bv_symbol("x", 32);
        let one = ctx.one(32);
        let zero = ctx.zero(32);
        assert_eq!(ctx.unsigned_div(x, one), x);
        assert_eq!(ctx.unsigned_rem(x, one), zero);
        let a = lit(&mut ctx, 17, 32);
        let b = lit(&mut ctx, 5, 32);
        let q = ctx.unsigned_div(a, b);
        assert_eq!(ctx.get_const(q).unwrap().to_u64().unwrap(), 3);
        // division by zero stays total
        let dz = ctx.unsigned_div(a, zero);
        assert_eq!(ctx.get_const(dz).unwrap().to_u64().unwrap(), 0xffff_ffff);
    }

    #[test]
    fn comparison_rewrites() {
        let mut ctx = Context::default();
        let x = ctx.bv_symbol("x", 32);
        let y = ctx.bv_symbol("y", 32);
        assert_eq!(ctx.ugt(x, y), ctx.ult(y, x));
        assert_eq!(ctx.sge(x, y), ctx.sle(y, x));
        let e = ctx.eq(x, y);
        assert_eq!(ctx.ne(x, y), ctx.not(e));
        assert_eq!(ctx.ult(x, x), ctx.fals());
        assert_eq!(ctx.ule(x, x), ctx.tru());
        let a = lit(&mut ctx, 3, 32);
        let b = lit(&mut ctx, 7, 32);
        assert_eq!(ctx.ult(a, b), ctx.tru());
        assert_eq!(ctx.slt(b, a), ctx.fals());
    }

    #[test]
    fn nan_input_folds_with_symbolic_operand() {
        let mut ctx = Context::default();
        let nan = float::canonical_nan(FloatFormat::Single);
        let nan = ctx.fp_lit(&eval::bits_to_value(nan, 32));
        let x = ctx.bv_symbol("x", 32);
        let r = ctx.fp_add(nan, x, RoundingMode::NearestTiesToEven);
        assert_eq!(r, nan);
        // a NaN also decides ordered comparisons
        assert_eq!(ctx.fp_less(nan, x), ctx.fals());
    }

    #[test]
    fn const_array_opt() {
        let mut ctx = Context::default();
        let cells: Vec<_> = [1u64, 2, 3, 2]
            .iter()
            .map(|v| lit(&mut ctx, *v, 8))
            .collect();
        let arr = ctx.array_concrete("table", &cells, 32, 8);
        let idx = ctx.bv_symbol("i", 32);
        let two = lit(&mut ctx, 2, 8);
        // disabled by default: the equality stays opaque
        let read = ctx.read(UpdateList::new(arr), idx);
        let opaque = ctx.eq(two, read);
        assert!(matches!(ctx.get(opaque), Expr::Equal(..)));
        // enabled: i == 1 || i == 3
        ctx.set_const_array_opt(true);
        let rewritten = ctx.eq(two, read);
        let one = lit(&mut ctx, 1, 32);
        let three = lit(&mut ctx, 3, 32);
        let hit1 = ctx.eq(one, idx);
        let hit3 = ctx.eq(three, idx);
        assert_eq!(rewritten, ctx.or(hit1, hit3));
    }
}
