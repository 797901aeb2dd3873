// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::expr::context::{Context, ExprRef, StringRef};
use crate::expr::float::RoundingMode;
use crate::expr::memory::UpdateList;
use baa::BitVecValueIndex;

/// This type restricts the maximum width that a bit-vector type is allowed to have.
pub type WidthInt = u32;

/// Widths with a floating-point interpretation.
pub mod widths {
    use super::WidthInt;
    pub const BOOL: WidthInt = 1;
    pub const HALF: WidthInt = 16;
    pub const SINGLE: WidthInt = 32;
    pub const DOUBLE: WidthInt = 64;
    pub const EXTENDED: WidthInt = 80;
    pub const QUAD: WidthInt = 128;
}

/// Represents a bit-vector or floating-point expression.
/// All nodes are immutable and interned in a [`Context`], thus `ExprRef` equality
/// is structural equality.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Expr {
    // nullary
    /// Arbitrary-precision bit pattern. `is_float` marks that the pattern is to be
    /// interpreted as a floating-point value; the format is determined by the width.
    Constant {
        value: BitVecValueIndex,
        width: WidthInt,
        is_float: bool,
    },
    Symbol {
        name: StringRef,
        width: WidthInt,
    },
    // memory read
    Read {
        updates: UpdateList,
        index: ExprRef,
        width: WidthInt,
    },
    // ternary
    Select {
        cond: ExprRef,
        tru: ExprRef,
        fals: ExprRef,
    },
    // bit manipulation
    Concat(ExprRef, ExprRef, WidthInt),
    Extract {
        e: ExprRef,
        offset: WidthInt,
        width: WidthInt,
    },
    Not(ExprRef, WidthInt),
    // casts
    ZeroExt {
        e: ExprRef,
        width: WidthInt,
    },
    SignExt {
        e: ExprRef,
        width: WidthInt,
    },
    // arithmetic
    Add(ExprRef, ExprRef, WidthInt),
    Sub(ExprRef, ExprRef, WidthInt),
    Mul(ExprRef, ExprRef, WidthInt),
    UnsignedDiv(ExprRef, ExprRef, WidthInt),
    SignedDiv(ExprRef, ExprRef, WidthInt),
    UnsignedRem(ExprRef, ExprRef, WidthInt),
    SignedRem(ExprRef, ExprRef, WidthInt),
    // bitwise
    And(ExprRef, ExprRef, WidthInt),
    Or(ExprRef, ExprRef, WidthInt),
    Xor(ExprRef, ExprRef, WidthInt),
    ShiftLeft(ExprRef, ExprRef, WidthInt),
    ShiftRight(ExprRef, ExprRef, WidthInt),
    ArithmeticShiftRight(ExprRef, ExprRef, WidthInt),
    // comparisons, 1-bit results
    // the reversed and negated comparisons (ne, ugt, uge, sgt, sge) only exist as
    // factory-level rewrites so that hash-consing sees a single canonical form
    Equal(ExprRef, ExprRef),
    UnsignedLess(ExprRef, ExprRef),
    UnsignedLessEqual(ExprRef, ExprRef),
    SignedLess(ExprRef, ExprRef),
    SignedLessEqual(ExprRef, ExprRef),
    // floating-point casts
    FPExt {
        e: ExprRef,
        width: WidthInt,
    },
    FPTrunc {
        e: ExprRef,
        width: WidthInt,
        rm: RoundingMode,
    },
    FPToUnsigned {
        e: ExprRef,
        width: WidthInt,
        rm: RoundingMode,
    },
    FPToSigned {
        e: ExprRef,
        width: WidthInt,
        rm: RoundingMode,
    },
    UnsignedToFP {
        e: ExprRef,
        width: WidthInt,
        rm: RoundingMode,
    },
    SignedToFP {
        e: ExprRef,
        width: WidthInt,
        rm: RoundingMode,
    },
    // floating-point arithmetic
    FPAdd(ExprRef, ExprRef, WidthInt, RoundingMode),
    FPSub(ExprRef, ExprRef, WidthInt, RoundingMode),
    FPMul(ExprRef, ExprRef, WidthInt, RoundingMode),
    FPDiv(ExprRef, ExprRef, WidthInt, RoundingMode),
    FPRem(ExprRef, ExprRef, WidthInt),
    FPMin(ExprRef, ExprRef, WidthInt),
    FPMax(ExprRef, ExprRef, WidthInt),
    FPNeg(ExprRef, WidthInt),
    FPAbs(ExprRef, WidthInt),
    FPSqrt(ExprRef, WidthInt, RoundingMode),
    FPRoundToIntegral(ExprRef, WidthInt, RoundingMode),
    // ordered floating-point comparisons and predicates, 1-bit results
    FPEqual(ExprRef, ExprRef),
    FPLess(ExprRef, ExprRef),
    FPLessEqual(ExprRef, ExprRef),
    FPIsNan(ExprRef),
    FPIsInfinite(ExprRef),
    FPIsNormal(ExprRef),
    FPIsSubnormal(ExprRef),
}

/// Closed tag taxonomy. The order of the variants defines the primary rank of the
/// structural total order over expressions.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Kind {
    Constant,
    Symbol,
    Read,
    Select,
    Concat,
    Extract,
    Not,
    ZeroExt,
    SignExt,
    Add,
    Sub,
    Mul,
    UnsignedDiv,
    SignedDiv,
    UnsignedRem,
    SignedRem,
    And,
    Or,
    Xor,
    ShiftLeft,
    ShiftRight,
    ArithmeticShiftRight,
    Equal,
    UnsignedLess,
    UnsignedLessEqual,
    SignedLess,
    SignedLessEqual,
    FPExt,
    FPTrunc,
    FPToUnsigned,
    FPToSigned,
    UnsignedToFP,
    SignedToFP,
    FPAdd,
    FPSub,
    FPMul,
    FPDiv,
    FPRem,
    FPMin,
    FPMax,
    FPNeg,
    FPAbs,
    FPSqrt,
    FPRoundToIntegral,
    FPEqual,
    FPLess,
    FPLessEqual,
    FPIsNan,
    FPIsInfinite,
    FPIsNormal,
    FPIsSubnormal,
}

impl Expr {
    pub fn kind(&self) -> Kind {
        match self {
            Expr::Constant { .. } => Kind::Constant,
            Expr::Symbol { .. } => Kind::Symbol,
            Expr::Read { .. } => Kind::Read,
            Expr::Select { .. } => Kind::Select,
            Expr::Concat(..) => Kind::Concat,
            Expr::Extract { .. } => Kind::Extract,
            Expr::Not(..) => Kind::Not,
            Expr::ZeroExt { .. } => Kind::ZeroExt,
            Expr::SignExt { .. } => Kind::SignExt,
            Expr::Add(..) => Kind::Add,
            Expr::Sub(..) => Kind::Sub,
            Expr::Mul(..) => Kind::Mul,
            Expr::UnsignedDiv(..) => Kind::UnsignedDiv,
            Expr::SignedDiv(..) => Kind::SignedDiv,
            Expr::UnsignedRem(..) => Kind::UnsignedRem,
            Expr::SignedRem(..) => Kind::SignedRem,
            Expr::And(..) => Kind::And,
            Expr::Or(..) => Kind::Or,
            Expr::Xor(..) => Kind::Xor,
            Expr::ShiftLeft(..) => Kind::ShiftLeft,
            Expr::ShiftRight(..) => Kind::ShiftRight,
            Expr::ArithmeticShiftRight(..) => Kind::ArithmeticShiftRight,
            Expr::Equal(..) => Kind::Equal,
            Expr::UnsignedLess(..) => Kind::UnsignedLess,
            Expr::UnsignedLessEqual(..) => Kind::UnsignedLessEqual,
            Expr::SignedLess(..) => Kind::SignedLess,
            Expr::SignedLessEqual(..) => Kind::SignedLessEqual,
            Expr::FPExt { .. } => Kind::FPExt,
            Expr::FPTrunc { .. } => Kind::FPTrunc,
            Expr::FPToUnsigned { .. } => Kind::FPToUnsigned,
            Expr::FPToSigned { .. } => Kind::FPToSigned,
            Expr::UnsignedToFP { .. } => Kind::UnsignedToFP,
            Expr::SignedToFP { .. } => Kind::SignedToFP,
            Expr::FPAdd(..) => Kind::FPAdd,
            Expr::FPSub(..) => Kind::FPSub,
            Expr::FPMul(..) => Kind::FPMul,
            Expr::FPDiv(..) => Kind::FPDiv,
            Expr::FPRem(..) => Kind::FPRem,
            Expr::FPMin(..) => Kind::FPMin,
            Expr::FPMax(..) => Kind::FPMax,
            Expr::FPNeg(..) => Kind::FPNeg,
            Expr::FPAbs(..) => Kind::FPAbs,
            Expr::FPSqrt(..) => Kind::FPSqrt,
            Expr::FPRoundToIntegral(..) => Kind::FPRoundToIntegral,
            Expr::FPEqual(..) => Kind::FPEqual,
            Expr::FPLess(..) => Kind::FPLess,
            Expr::FPLessEqual(..) => Kind::FPLessEqual,
            Expr::FPIsNan(..) => Kind::FPIsNan,
            Expr::FPIsInfinite(..) => Kind::FPIsInfinite,
            Expr::FPIsNormal(..) => Kind::FPIsNormal,
            Expr::FPIsSubnormal(..) => Kind::FPIsSubnormal,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Expr::Constant { .. })
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, Expr::Symbol { .. })
    }

    /// Width of the expression result in bits.
    pub fn width(&self, ctx: &Context) -> WidthInt {
        match *self {
            Expr::Constant { width, .. } => width,
            Expr::Symbol { width, .. } => width,
            Expr::Read { width, .. } => width,
            Expr::Select { tru, .. } => ctx.get(tru).width(ctx),
            Expr::Concat(_, _, width) => width,
            Expr::Extract { width, .. } => width,
            Expr::Not(_, width) => width,
            Expr::ZeroExt { width, .. } => width,
            Expr::SignExt { width, .. } => width,
            Expr::Add(_, _, width)
            | Expr::Sub(_, _, width)
            | Expr::Mul(_, _, width)
            | Expr::UnsignedDiv(_, _, width)
            | Expr::SignedDiv(_, _, width)
            | Expr::UnsignedRem(_, _, width)
            | Expr::SignedRem(_, _, width)
            | Expr::And(_, _, width)
            | Expr::Or(_, _, width)
            | Expr::Xor(_, _, width)
            | Expr::ShiftLeft(_, _, width)
            | Expr::ShiftRight(_, _, width)
            | Expr::ArithmeticShiftRight(_, _, width) => width,
            Expr::Equal(..)
            | Expr::UnsignedLess(..)
            | Expr::UnsignedLessEqual(..)
            | Expr::SignedLess(..)
            | Expr::SignedLessEqual(..) => widths::BOOL,
            Expr::FPExt { width, .. }
            | Expr::FPTrunc { width, .. }
            | Expr::FPToUnsigned { width, .. }
            | Expr::FPToSigned { width, .. }
            | Expr::UnsignedToFP { width, .. }
            | Expr::SignedToFP { width, .. } => width,
            Expr::FPAdd(_, _, width, _)
            | Expr::FPSub(_, _, width, _)
            | Expr::FPMul(_, _, width, _)
            | Expr::FPDiv(_, _, width, _) => width,
            Expr::FPRem(_, _, width) | Expr::FPMin(_, _, width) | Expr::FPMax(_, _, width) => width,
            Expr::FPNeg(_, width) | Expr::FPAbs(_, width) => width,
            Expr::FPSqrt(_, width, _) | Expr::FPRoundToIntegral(_, width, _) => width,
            Expr::FPEqual(..)
            | Expr::FPLess(..)
            | Expr::FPLessEqual(..)
            | Expr::FPIsNan(..)
            | Expr::FPIsInfinite(..)
            | Expr::FPIsNormal(..)
            | Expr::FPIsSubnormal(..) => widths::BOOL,
        }
    }
}

pub trait ForEachChild<T: Clone> {
    fn for_each_child(&self, visitor: impl FnMut(&T));
    fn collect_children(&self, children: &mut Vec<T>) {
        self.for_each_child(|c: &T| {
            children.push(c.clone());
        });
    }
    fn num_children(&self) -> usize;
}

impl ForEachChild<ExprRef> for Expr {
    fn for_each_child(&self, mut visitor: impl FnMut(&ExprRef)) {
        match self {
            Expr::Constant { .. } | Expr::Symbol { .. } => {} // no children
            // the update list is part of the node content, not a child
            Expr::Read { index, .. } => {
                (visitor)(index);
            }
            Expr::Select { cond, tru, fals } => {
                (visitor)(cond);
                (visitor)(tru);
                (visitor)(fals);
            }
            Expr::Extract { e, .. }
            | Expr::ZeroExt { e, .. }
            | Expr::SignExt { e, .. }
            | Expr::FPExt { e, .. }
            | Expr::FPTrunc { e, .. }
            | Expr::FPToUnsigned { e, .. }
            | Expr::FPToSigned { e, .. }
            | Expr::UnsignedToFP { e, .. }
            | Expr::SignedToFP { e, .. } => {
                (visitor)(e);
            }
            Expr::Not(e, _)
            | Expr::FPNeg(e, _)
            | Expr::FPAbs(e, _)
            | Expr::FPSqrt(e, _, _)
            | Expr::FPRoundToIntegral(e, _, _) => {
                (visitor)(e);
            }
            Expr::FPIsNan(e)
            | Expr::FPIsInfinite(e)
            | Expr::FPIsNormal(e)
            | Expr::FPIsSubnormal(e) => {
                (visitor)(e);
            }
            Expr::Concat(a, b, _)
            | Expr::Add(a, b, _)
            | Expr::Sub(a, b, _)
            | Expr::Mul(a, b, _)
            | Expr::UnsignedDiv(a, b, _)
            | Expr::SignedDiv(a, b, _)
            | Expr::UnsignedRem(a, b, _)
            | Expr::SignedRem(a, b, _)
            | Expr::And(a, b, _)
            | Expr::Or(a, b, _)
            | Expr::Xor(a, b, _)
            | Expr::ShiftLeft(a, b, _)
            | Expr::ShiftRight(a, b, _)
            | Expr::ArithmeticShiftRight(a, b, _)
            | Expr::FPRem(a, b, _)
            | Expr::FPMin(a, b, _)
            | Expr::FPMax(a, b, _) => {
                (visitor)(a);
                (visitor)(b);
            }
            Expr::Equal(a, b)
            | Expr::UnsignedLess(a, b)
            | Expr::UnsignedLessEqual(a, b)
            | Expr::SignedLess(a, b)
            | Expr::SignedLessEqual(a, b)
            | Expr::FPEqual(a, b)
            | Expr::FPLess(a, b)
            | Expr::FPLessEqual(a, b) => {
                (visitor)(a);
                (visitor)(b);
            }
            Expr::FPAdd(a, b, _, _)
            | Expr::FPSub(a, b, _, _)
            | Expr::FPMul(a, b, _, _)
            | Expr::FPDiv(a, b, _, _) => {
                (visitor)(a);
                (visitor)(b);
            }
        }
    }

    fn num_children(&self) -> usize {
        let mut count = 0;
        self.for_each_child(|_| count += 1);
        count
    }
}
