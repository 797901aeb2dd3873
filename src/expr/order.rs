// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

//! A strict total order over expressions, used for canonical operand ordering
//! and as a container key. Ranks by kind first, then by the cached structural
//! hash, then by node content and finally by children pairwise.

use crate::expr::context::{Context, ExprRef};
use crate::expr::memory::UpdateList;
use crate::expr::nodes::{Expr, ForEachChild};
use baa::BitVecOps;
use std::cmp::Ordering;
use std::collections::HashSet;

pub fn compare_exprs(ctx: &Context, a: ExprRef, b: ExprRef) -> Ordering {
    let mut memo = HashSet::new();
    compare_rec(ctx, a, b, &mut memo)
}

/// The memo records pairs already proven equal within this call, bounding the
/// work on large shared sub-DAGs.
fn compare_rec(
    ctx: &Context,
    a: ExprRef,
    b: ExprRef,
    memo: &mut HashSet<(ExprRef, ExprRef)>,
) -> Ordering {
    // hash-consing makes structural equality a reference check
    if a == b {
        return Ordering::Equal;
    }
    let key = (a.min(b), a.max(b));
    if memo.contains(&key) {
        return Ordering::Equal;
    }
    let ea = ctx.get(a);
    let eb = ctx.get(b);
    match ea.kind().cmp(&eb.kind()) {
        Ordering::Equal => {}
        o => return o,
    }
    match ctx.expr_hash(a).cmp(&ctx.expr_hash(b)) {
        Ordering::Equal => {}
        o => return o,
    }
    match compare_content(ctx, ea, eb, memo) {
        Ordering::Equal => {}
        o => return o,
    }
    let mut children_a = Vec::with_capacity(3);
    ea.collect_children(&mut children_a);
    let mut children_b = Vec::with_capacity(3);
    eb.collect_children(&mut children_b);
    debug_assert_eq!(children_a.len(), children_b.len(), "same kind, same arity");
    for (ca, cb) in children_a.iter().zip(children_b.iter()) {
        match compare_rec(ctx, *ca, *cb, memo) {
            Ordering::Equal => {}
            o => return o,
        }
    }
    memo.insert(key);
    Ordering::Equal
}

/// Kind-specific content comparison. Both arguments are of the same kind.
fn compare_content(
    ctx: &Context,
    a: &Expr,
    b: &Expr,
    memo: &mut HashSet<(ExprRef, ExprRef)>,
) -> Ordering {
    match (*a, *b) {
        (
            Expr::Constant {
                value: va,
                width: wa,
                is_float: fa,
            },
            Expr::Constant {
                value: vb,
                width: wb,
                is_float: fb,
            },
        ) => wa
            .cmp(&wb)
            .then(fa.cmp(&fb))
            .then_with(|| {
                let va = ctx.get_bv_value(va);
                let vb = ctx.get_bv_value(vb);
                if va.is_equal(&vb) {
                    Ordering::Equal
                } else if va.is_greater(&vb) {
                    Ordering::Greater
                } else {
                    Ordering::Less
                }
            }),
        (Expr::Symbol { name: na, width: wa }, Expr::Symbol { name: nb, width: wb }) => {
            na.index().cmp(&nb.index()).then(wa.cmp(&wb))
        }
        (Expr::Read { updates: ua, .. }, Expr::Read { updates: ub, .. }) => {
            compare_updates(ctx, ua, ub, memo)
        }
        (
            Expr::Extract {
                offset: oa,
                width: wa,
                ..
            },
            Expr::Extract {
                offset: ob,
                width: wb,
                ..
            },
        ) => oa.cmp(&ob).then(wa.cmp(&wb)),
        (Expr::ZeroExt { width: wa, .. }, Expr::ZeroExt { width: wb, .. })
        | (Expr::SignExt { width: wa, .. }, Expr::SignExt { width: wb, .. })
        | (Expr::FPExt { width: wa, .. }, Expr::FPExt { width: wb, .. }) => wa.cmp(&wb),
        (
            Expr::FPTrunc {
                width: wa, rm: ra, ..
            },
            Expr::FPTrunc {
                width: wb, rm: rb, ..
            },
        )
        | (
            Expr::FPToUnsigned {
                width: wa, rm: ra, ..
            },
            Expr::FPToUnsigned {
                width: wb, rm: rb, ..
            },
        )
        | (
            Expr::FPToSigned {
                width: wa, rm: ra, ..
            },
            Expr::FPToSigned {
                width: wb, rm: rb, ..
            },
        )
        | (
            Expr::UnsignedToFP {
                width: wa, rm: ra, ..
            },
            Expr::UnsignedToFP {
                width: wb, rm: rb, ..
            },
        )
        | (
            Expr::SignedToFP {
                width: wa, rm: ra, ..
            },
            Expr::SignedToFP {
                width: wb, rm: rb, ..
            },
        ) => wa.cmp(&wb).then(ra.cmp(&rb)),
        (Expr::FPAdd(_, _, _, ra), Expr::FPAdd(_, _, _, rb))
        | (Expr::FPSub(_, _, _, ra), Expr::FPSub(_, _, _, rb))
        | (Expr::FPMul(_, _, _, ra), Expr::FPMul(_, _, _, rb))
        | (Expr::FPDiv(_, _, _, ra), Expr::FPDiv(_, _, _, rb))
        | (Expr::FPSqrt(_, _, ra), Expr::FPSqrt(_, _, rb))
        | (Expr::FPRoundToIntegral(_, _, ra), Expr::FPRoundToIntegral(_, _, rb)) => ra.cmp(&rb),
        _ => Ordering::Equal,
    }
}

/// Update lists order by root array id, then length, then pairwise by node. A
/// shared suffix ends the walk early.
fn compare_updates(
    ctx: &Context,
    a: UpdateList,
    b: UpdateList,
    memo: &mut HashSet<(ExprRef, ExprRef)>,
) -> Ordering {
    match a.root.cmp(&b.root) {
        Ordering::Equal => {}
        o => return o,
    }
    match a.len(ctx).cmp(&b.len(ctx)) {
        Ordering::Equal => {}
        o => return o,
    }
    let mut na = a.head;
    let mut nb = b.head;
    while let (Some(ra), Some(rb)) = (na, nb) {
        if ra == rb {
            break;
        }
        let node_a = *ctx.get_update(ra);
        let node_b = *ctx.get_update(rb);
        match compare_rec(ctx, node_a.index, node_b.index, memo) {
            Ordering::Equal => {}
            o => return o,
        }
        match compare_rec(ctx, node_a.value, node_b.value, memo) {
            Ordering::Equal => {}
            o => return o,
        }
        na = node_a.next;
        nb = node_b.next;
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use baa::BitVecValue;

    #[test]
    fn reflexive_and_antisymmetric() {
        let mut ctx = Context::default();
        let x = ctx.bv_symbol("x", 32);
        let y = ctx.bv_symbol("y", 32);
        let sum = ctx.add(x, y);
        let prod = ctx.mul(x, y);
        for e in [x, y, sum, prod] {
            assert_eq!(compare_exprs(&ctx, e, e), Ordering::Equal);
        }
        for a in [x, y, sum, prod] {
            for b in [x, y, sum, prod] {
                assert_eq!(
                    compare_exprs(&ctx, a, b),
                    compare_exprs(&ctx, b, a).reverse()
                );
                // distinct refs are structurally distinct
                if a != b {
                    assert_ne!(compare_exprs(&ctx, a, b), Ordering::Equal);
                }
            }
        }
    }

    #[test]
    fn kind_is_the_primary_rank() {
        let mut ctx = Context::default();
        let c = ctx.bv_lit(&BitVecValue::from_u64(7, 32));
        let s = ctx.bv_symbol("s", 32);
        let sum = ctx.add(c, s);
        assert_eq!(compare_exprs(&ctx, c, s), Ordering::Less);
        assert_eq!(compare_exprs(&ctx, s, sum), Ordering::Less);
        assert_eq!(compare_exprs(&ctx, c, sum), Ordering::Less);
    }

    #[test]
    fn sorting_is_consistent() {
        let mut ctx = Context::default();
        let mut exprs = Vec::new();
        for i in 0..8u64 {
            let c = ctx.bv_lit(&BitVecValue::from_u64(i, 16));
            let s = ctx.bv_symbol(&format!("s{i}"), 16);
            exprs.push(c);
            exprs.push(s);
            exprs.push(ctx.add(c, s));
        }
        let mut sorted = exprs.clone();
        sorted.sort_by(|a, b| compare_exprs(&ctx, *a, *b));
        // transitivity spot check: every adjacent pair is ordered
        for w in sorted.windows(2) {
            assert_ne!(compare_exprs(&ctx, w[0], w[1]), Ordering::Greater);
        }
        // a total order has no duplicates among distinct expressions
        for w in sorted.windows(2) {
            if w[0] != w[1] {
                assert_eq!(compare_exprs(&ctx, w[0], w[1]), Ordering::Less);
            }
        }
    }
}
