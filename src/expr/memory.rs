// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::expr::context::{ArrayRef, Context, ExprRef, StringRef, UpdateNodeRef};
use crate::expr::nodes::{Expr, ForEachChild, WidthInt};
use smallvec::SmallVec;

/// Backing data of a symbolic memory object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArraySource {
    /// every cell is unconstrained
    Symbolic,
    /// seeded with constant expressions, one per cell
    Concrete(Vec<ExprRef>),
}

/// A symbolic memory object. Arrays are immutable; writes are layered on top via
/// [`UpdateList`]s.
#[derive(Debug, Clone)]
pub struct Array {
    pub name: StringRef,
    /// cell count, may be symbolic (conventionally 64 bits wide)
    pub size: ExprRef,
    /// width of an index
    pub domain: WidthInt,
    /// width of a cell
    pub range: WidthInt,
    pub source: ArraySource,
    /// arrays transitively referenced by `size`, computed once at construction
    pub(crate) dependencies: SmallVec<[ArrayRef; 4]>,
}

impl Array {
    pub fn is_concrete(&self) -> bool {
        matches!(self.source, ArraySource::Concrete(_))
    }

    /// Arrays that this array's size expression depends on.
    pub fn dependencies(&self) -> &[ArrayRef] {
        &self.dependencies
    }
}

/// A single write: `array[index] <- value`, layered over `next`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct UpdateNode {
    pub index: ExprRef,
    pub value: ExprRef,
    pub next: Option<UpdateNodeRef>,
    /// number of nodes in the list headed by this node
    pub depth: u32,
}

/// A persistent write history over an array. Pushing a write returns a new list;
/// the old list stays valid and shares all its nodes with the new one.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct UpdateList {
    pub root: ArrayRef,
    pub head: Option<UpdateNodeRef>,
}

impl UpdateList {
    pub fn new(root: ArrayRef) -> Self {
        UpdateList { root, head: None }
    }

    /// Records a write, newest first.
    pub fn push(&self, ctx: &mut Context, index: ExprRef, value: ExprRef) -> UpdateList {
        let array = ctx.get_array(self.root);
        assert_eq!(
            ctx.width(index),
            array.domain,
            "write index must match the array domain"
        );
        assert_eq!(
            ctx.width(value),
            array.range,
            "write value must match the array range"
        );
        let depth = self.len(ctx) as u32 + 1;
        let node = ctx.add_update(UpdateNode {
            index,
            value,
            next: self.head,
            depth,
        });
        UpdateList {
            root: self.root,
            head: Some(node),
        }
    }

    pub fn len(&self, ctx: &Context) -> usize {
        match self.head {
            Some(head) => ctx.get_update(head).depth as usize,
            None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Writes from newest to oldest.
    pub fn iter<'a>(&self, ctx: &'a Context) -> UpdateListIter<'a> {
        UpdateListIter {
            ctx,
            next: self.head,
        }
    }
}

pub struct UpdateListIter<'a> {
    ctx: &'a Context,
    next: Option<UpdateNodeRef>,
}

impl<'a> Iterator for UpdateListIter<'a> {
    type Item = &'a UpdateNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.ctx.get_update(self.next?);
        self.next = node.next;
        Some(node)
    }
}

/// Collects all arrays that an expression transitively references through reads,
/// including the dependencies the referenced arrays were constructed with.
pub(crate) fn collect_array_dependencies(ctx: &Context, e: ExprRef) -> SmallVec<[ArrayRef; 4]> {
    let mut out: SmallVec<[ArrayRef; 4]> = SmallVec::new();
    let mut todo = vec![e];
    while let Some(e) = todo.pop() {
        let expr = ctx.get(e);
        if let Expr::Read { updates, .. } = expr {
            out.push(updates.root);
            out.extend_from_slice(ctx.get_array(updates.root).dependencies());
            for node in updates.iter(ctx) {
                todo.push(node.index);
                todo.push(node.value);
            }
        }
        expr.for_each_child(|c| todo.push(*c));
    }
    out.sort_unstable();
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use baa::BitVecValue;

    #[test]
    fn update_list_sharing() {
        let mut ctx = Context::default();
        let size = ctx.bv_lit(&BitVecValue::from_u64(16, 64));
        let mem = ctx.array_symbol("mem", size, 32, 8);
        let ul = UpdateList::new(mem);
        assert!(ul.is_empty());

        let i0 = ctx.bv_lit(&BitVecValue::from_u64(0, 32));
        let v0 = ctx.bv_lit(&BitVecValue::from_u64(0xab, 8));
        let base = ul.push(&mut ctx, i0, v0);
        assert_eq!(base.len(&ctx), 1);

        // two diverging histories share their suffix
        let i1 = ctx.bv_lit(&BitVecValue::from_u64(1, 32));
        let v1 = ctx.bv_lit(&BitVecValue::from_u64(0xcd, 8));
        let left = base.push(&mut ctx, i1, v1);
        let i2 = ctx.bv_lit(&BitVecValue::from_u64(2, 32));
        let right = base.push(&mut ctx, i2, v1);
        assert_eq!(left.len(&ctx), 2);
        assert_eq!(right.len(&ctx), 2);
        let left_tail = ctx.get_update(left.head.unwrap()).next;
        let right_tail = ctx.get_update(right.head.unwrap()).next;
        assert_eq!(left_tail, right_tail);
        assert_eq!(left_tail, base.head);

        // identical histories are interned to the same nodes
        let left_again = base.push(&mut ctx, i1, v1);
        assert_eq!(left, left_again);
    }

    #[test]
    fn array_dependencies() {
        let mut ctx = Context::default();
        let size_a = ctx.bv_lit(&BitVecValue::from_u64(8, 64));
        let a = ctx.array_symbol("a", size_a, 32, 64);
        // size of b is a read from a
        let idx = ctx.bv_symbol("i", 32);
        let size_b = ctx.read(UpdateList::new(a), idx);
        let b = ctx.array_symbol("b", size_b, 32, 8);
        assert_eq!(ctx.get_array(b).dependencies(), &[a]);
        assert!(ctx.get_array(a).dependencies().is_empty());
    }
}
