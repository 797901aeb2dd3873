// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::expr::context::{Context, ExprRef};
use crate::expr::float::RoundingMode;
use crate::expr::memory::{Array, UpdateList};
use crate::expr::nodes::Expr;
use baa::BitVecOps;
use std::io::Write;

pub trait SerializableIrNode {
    fn serialize<W: Write>(&self, ctx: &Context, writer: &mut W) -> std::io::Result<()>;
    fn serialize_to_str(&self, ctx: &Context) -> String {
        let mut buf = Vec::new();
        self.serialize(ctx, &mut buf)
            .expect("Failed to write to string!");
        String::from_utf8(buf).expect("Failed to read string we wrote!")
    }
}

impl SerializableIrNode for Expr {
    fn serialize<W: Write>(&self, ctx: &Context, writer: &mut W) -> std::io::Result<()> {
        serialize_expr(self, ctx, writer)
    }
}

impl SerializableIrNode for ExprRef {
    fn serialize<W: Write>(&self, ctx: &Context, writer: &mut W) -> std::io::Result<()> {
        serialize_expr(ctx.get(*self), ctx, writer)
    }
}

fn rm_str(rm: RoundingMode) -> &'static str {
    match rm {
        RoundingMode::NearestTiesToEven => "rne",
        RoundingMode::TowardPositive => "rtp",
        RoundingMode::TowardNegative => "rtn",
        RoundingMode::TowardZero => "rtz",
        RoundingMode::NearestTiesToAway => "rna",
    }
}

fn serialize_fun_call<W: Write>(
    name: &str,
    args: &[ExprRef],
    ctx: &Context,
    writer: &mut W,
) -> std::io::Result<()> {
    write!(writer, "{name}(")?;
    for (ii, arg) in args.iter().enumerate() {
        if ii > 0 {
            write!(writer, ", ")?;
        }
        serialize_expr(ctx.get(*arg), ctx, writer)?;
    }
    write!(writer, ")")
}

fn serialize_expr<W: Write>(expr: &Expr, ctx: &Context, writer: &mut W) -> std::io::Result<()> {
    match *expr {
        Expr::Constant {
            value,
            width,
            is_float,
        } => {
            let v = ctx.get_bv_value(value);
            if is_float {
                write!(writer, "fp{width}'x")?;
            } else {
                write!(writer, "{width}'x")?;
            }
            let mut words = v.words().iter().rev();
            if let Some(first) = words.next() {
                write!(writer, "{first:x}")?;
            }
            for word in words {
                write!(writer, "{word:016x}")?;
            }
            Ok(())
        }
        Expr::Symbol { name, .. } => write!(writer, "{}", ctx.get_str(name)),
        Expr::Read { updates, index, .. } => {
            write!(writer, "read(")?;
            updates.serialize(ctx, writer)?;
            write!(writer, ", ")?;
            serialize_expr(ctx.get(index), ctx, writer)?;
            write!(writer, ")")
        }
        Expr::Select { cond, tru, fals } => {
            serialize_fun_call("ite", &[cond, tru, fals], ctx, writer)
        }
        Expr::Concat(a, b, _) => serialize_fun_call("concat", &[a, b], ctx, writer),
        Expr::Extract { e, offset, width } => {
            serialize_expr(ctx.get(e), ctx, writer)?;
            let hi = offset + width - 1;
            if hi == offset {
                write!(writer, "[{offset}]")
            } else {
                write!(writer, "[{hi}:{offset}]")
            }
        }
        Expr::Not(e, _) => serialize_fun_call("not", &[e], ctx, writer),
        Expr::ZeroExt { e, width } => {
            write!(writer, "zext(")?;
            serialize_expr(ctx.get(e), ctx, writer)?;
            write!(writer, ", {width})")
        }
        Expr::SignExt { e, width } => {
            write!(writer, "sext(")?;
            serialize_expr(ctx.get(e), ctx, writer)?;
            write!(writer, ", {width})")
        }
        Expr::Add(a, b, _) => serialize_fun_call("add", &[a, b], ctx, writer),
        Expr::Sub(a, b, _) => serialize_fun_call("sub", &[a, b], ctx, writer),
        Expr::Mul(a, b, _) => serialize_fun_call("mul", &[a, b], ctx, writer),
        Expr::UnsignedDiv(a, b, _) => serialize_fun_call("udiv", &[a, b], ctx, writer),
        Expr::SignedDiv(a, b, _) => serialize_fun_call("sdiv", &[a, b], ctx, writer),
        Expr::UnsignedRem(a, b, _) => serialize_fun_call("urem", &[a, b], ctx, writer),
        Expr::SignedRem(a, b, _) => serialize_fun_call("srem", &[a, b], ctx, writer),
        Expr::And(a, b, _) => serialize_fun_call("and", &[a, b], ctx, writer),
        Expr::Or(a, b, _) => serialize_fun_call("or", &[a, b], ctx, writer),
        Expr::Xor(a, b, _) => serialize_fun_call("xor", &[a, b], ctx, writer),
        Expr::ShiftLeft(a, b, _) => serialize_fun_call("shl", &[a, b], ctx, writer),
        Expr::ShiftRight(a, b, _) => serialize_fun_call("lshr", &[a, b], ctx, writer),
        Expr::ArithmeticShiftRight(a, b, _) => serialize_fun_call("ashr", &[a, b], ctx, writer),
        Expr::Equal(a, b) => serialize_fun_call("eq", &[a, b], ctx, writer),
        Expr::UnsignedLess(a, b) => serialize_fun_call("ult", &[a, b], ctx, writer),
        Expr::UnsignedLessEqual(a, b) => serialize_fun_call("ule", &[a, b], ctx, writer),
        Expr::SignedLess(a, b) => serialize_fun_call("slt", &[a, b], ctx, writer),
        Expr::SignedLessEqual(a, b) => serialize_fun_call("sle", &[a, b], ctx, writer),
        Expr::FPExt { e, width } => {
            write!(writer, "fpext(")?;
            serialize_expr(ctx.get(e), ctx, writer)?;
            write!(writer, ", {width})")
        }
        Expr::FPTrunc { e, width, rm } => {
            write!(writer, "fptrunc(")?;
            serialize_expr(ctx.get(e), ctx, writer)?;
            write!(writer, ", {width}, {})", rm_str(rm))
        }
        Expr::FPToUnsigned { e, width, rm } => {
            write!(writer, "fptoui(")?;
            serialize_expr(ctx.get(e), ctx, writer)?;
            write!(writer, ", {width}, {})", rm_str(rm))
        }
        Expr::FPToSigned { e, width, rm } => {
            write!(writer, "fptosi(")?;
            serialize_expr(ctx.get(e), ctx, writer)?;
            write!(writer, ", {width}, {})", rm_str(rm))
        }
        Expr::UnsignedToFP { e, width, rm } => {
            write!(writer, "uitofp(")?;
            serialize_expr(ctx.get(e), ctx, writer)?;
            write!(writer, ", {width}, {})", rm_str(rm))
        }
        Expr::SignedToFP { e, width, rm } => {
            write!(writer, "sitofp(")?;
            serialize_expr(ctx.get(e), ctx, writer)?;
            write!(writer, ", {width}, {})", rm_str(rm))
        }
        Expr::FPAdd(a, b, _, rm) => serialize_fp_call("fadd", &[a, b], rm, ctx, writer),
        Expr::FPSub(a, b, _, rm) => serialize_fp_call("fsub", &[a, b], rm, ctx, writer),
        Expr::FPMul(a, b, _, rm) => serialize_fp_call("fmul", &[a, b], rm, ctx, writer),
        Expr::FPDiv(a, b, _, rm) => serialize_fp_call("fdiv", &[a, b], rm, ctx, writer),
        Expr::FPRem(a, b, _) => serialize_fun_call("frem", &[a, b], ctx, writer),
        Expr::FPMin(a, b, _) => serialize_fun_call("fmin", &[a, b], ctx, writer),
        Expr::FPMax(a, b, _) => serialize_fun_call("fmax", &[a, b], ctx, writer),
        Expr::FPNeg(e, _) => serialize_fun_call("fneg", &[e], ctx, writer),
        Expr::FPAbs(e, _) => serialize_fun_call("fabs", &[e], ctx, writer),
        Expr::FPSqrt(e, _, rm) => serialize_fp_call("fsqrt", &[e], rm, ctx, writer),
        Expr::FPRoundToIntegral(e, _, rm) => serialize_fp_call("frint", &[e], rm, ctx, writer),
        Expr::FPEqual(a, b) => serialize_fun_call("feq", &[a, b], ctx, writer),
        Expr::FPLess(a, b) => serialize_fun_call("flt", &[a, b], ctx, writer),
        Expr::FPLessEqual(a, b) => serialize_fun_call("fle", &[a, b], ctx, writer),
        Expr::FPIsNan(e) => serialize_fun_call("is_nan", &[e], ctx, writer),
        Expr::FPIsInfinite(e) => serialize_fun_call("is_infinite", &[e], ctx, writer),
        Expr::FPIsNormal(e) => serialize_fun_call("is_normal", &[e], ctx, writer),
        Expr::FPIsSubnormal(e) => serialize_fun_call("is_subnormal", &[e], ctx, writer),
    }
}

fn serialize_fp_call<W: Write>(
    name: &str,
    args: &[ExprRef],
    rm: RoundingMode,
    ctx: &Context,
    writer: &mut W,
) -> std::io::Result<()> {
    write!(writer, "{name}(")?;
    for arg in args.iter() {
        serialize_expr(ctx.get(*arg), ctx, writer)?;
        write!(writer, ", ")?;
    }
    write!(writer, "{})", rm_str(rm))
}

/// Writes the array name followed by the writes from oldest to newest, e.g.
/// `mem[32'x0 <- 8'xab][32'x1 <- 8'xcd]`.
impl SerializableIrNode for UpdateList {
    fn serialize<W: Write>(&self, ctx: &Context, writer: &mut W) -> std::io::Result<()> {
        let array = ctx.get_array(self.root);
        write!(writer, "{}", ctx.get_str(array.name))?;
        let mut writes: Vec<_> = self.iter(ctx).map(|n| (n.index, n.value)).collect();
        writes.reverse();
        for (index, value) in writes {
            write!(writer, "[")?;
            serialize_expr(ctx.get(index), ctx, writer)?;
            write!(writer, " <- ")?;
            serialize_expr(ctx.get(value), ctx, writer)?;
            write!(writer, "]")?;
        }
        Ok(())
    }
}

impl SerializableIrNode for Array {
    fn serialize<W: Write>(&self, ctx: &Context, writer: &mut W) -> std::io::Result<()> {
        write!(
            writer,
            "{} : bv<{}> -> bv<{}> of size ",
            ctx.get_str(self.name),
            self.domain,
            self.range
        )?;
        serialize_expr(ctx.get(self.size), ctx, writer)
    }
}
