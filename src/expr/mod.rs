// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>
mod builder;
mod context;
mod eval;
mod float;
mod memory;
mod nodes;
mod order;
mod serialize;

pub use context::{
    ArrayRef, Context, ExprRef, StringRef, UpdateNodeRef, CONST_ARRAY_OPT_MAX_MATCHES,
};
pub use eval::{signed_div_rem, unsigned_div_rem};
pub use float::{
    FPBinOp, FPCmpOp, FPPredicate, FPUnOp, FloatFormat, NativeExtendedEval, RoundingMode,
};
pub use memory::{Array, ArraySource, UpdateList, UpdateListIter, UpdateNode};
pub use nodes::{widths, Expr, ForEachChild, Kind, WidthInt};
pub use order::compare_exprs;
pub use serialize::SerializableIrNode;
