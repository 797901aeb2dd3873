// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::expr::float::NativeExtendedEval;
use crate::expr::memory::{collect_array_dependencies, Array, ArraySource, UpdateList, UpdateNode};
use crate::expr::nodes::{Expr, ForEachChild, WidthInt};
use baa::{BitVecOps, BitVecValue, BitVecValueIndex, BitVecValueRef, IndexToRef};
use std::fmt::{Debug, Formatter};
use std::num::{NonZeroU16, NonZeroU32};
use std::rc::Rc;

/// Multiplier used by the structural hash. Chosen to spread consecutive interner
/// indices over the whole hash range.
pub(crate) const MAGIC_HASH_CONSTANT: u64 = 39916801;

#[derive(PartialEq, Eq, Clone, Copy, Hash)]
pub struct StringRef(NonZeroU16);

impl Debug for StringRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "StringRef({})", self.index())
    }
}

impl StringRef {
    fn from_index(index: usize) -> Self {
        Self(NonZeroU16::new((index + 1) as u16).unwrap())
    }

    pub(crate) fn index(&self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// Shared-ownership handle to an interned expression. Since every expression is
/// hash-consed in its [`Context`], two handles are equal iff the expressions are
/// structurally equal.
#[derive(PartialEq, Eq, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct ExprRef(NonZeroU32);

impl Debug for ExprRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // we need a custom implementation in order to show the zero based index
        write!(f, "ExprRef({})", self.index())
    }
}

impl ExprRef {
    pub(crate) fn from_index(index: usize) -> Self {
        ExprRef(NonZeroU32::new((index + 1) as u32).unwrap())
    }

    pub(crate) fn index(&self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// Handle to a symbolic memory object. Arrays are nominal: every call to an array
/// constructor creates a fresh object, the monotonically increasing id doubles as
/// the ordering key.
#[derive(PartialEq, Eq, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct ArrayRef(NonZeroU32);

impl Debug for ArrayRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ArrayRef({})", self.index())
    }
}

impl ArrayRef {
    pub(crate) fn from_index(index: usize) -> Self {
        ArrayRef(NonZeroU32::new((index + 1) as u32).unwrap())
    }

    pub(crate) fn index(&self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// Handle to an interned update node. Update nodes form persistent singly-linked
/// lists, thus lists with a common suffix share their tail nodes.
#[derive(PartialEq, Eq, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct UpdateNodeRef(NonZeroU32);

impl Debug for UpdateNodeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "UpdateNodeRef({})", self.index())
    }
}

impl UpdateNodeRef {
    pub(crate) fn from_index(index: usize) -> Self {
        UpdateNodeRef(NonZeroU32::new((index + 1) as u32).unwrap())
    }

    pub(crate) fn index(&self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// Number of matches after which the array-read disjunction rewrite is abandoned
/// in favor of the plain equality.
pub const CONST_ARRAY_OPT_MAX_MATCHES: usize = 100;

/// Context which is used to create all expressions. Expressions are interned such that
/// reference equivalence implies structural equivalence.
#[derive(Clone)]
pub struct Context {
    strings: indexmap::IndexSet<String>,
    exprs: indexmap::IndexSet<Expr>,
    /// structural hash per expression, computed bottom-up exactly once at interning time
    hashes: Vec<u64>,
    values: baa::ValueInterner,
    arrays: Vec<Array>,
    updates: indexmap::IndexSet<UpdateNode>,
    update_hashes: Vec<u64>,
    canonical_nan: bool,
    const_array_opt: bool,
    native_extended: Option<Rc<dyn NativeExtendedEval>>,
}

impl Default for Context {
    fn default() -> Self {
        Context {
            strings: indexmap::IndexSet::default(),
            exprs: indexmap::IndexSet::default(),
            hashes: Vec::new(),
            values: baa::ValueInterner::default(),
            arrays: Vec::new(),
            updates: indexmap::IndexSet::default(),
            update_hashes: Vec::new(),
            canonical_nan: true,
            const_array_opt: false,
            native_extended: None,
        }
    }
}

/// Configuration.
impl Context {
    /// Controls whether floating-point evaluation replaces every NaN with the
    /// canonical quiet NaN bit pattern of its width. On by default.
    pub fn set_canonical_nan(&mut self, enable: bool) {
        self.canonical_nan = enable;
    }

    /// Enables the bounded rewrite of `eq(constant, read(concrete-array, index))`
    /// into a disjunction over matching indices. Off by default.
    pub fn set_const_array_opt(&mut self, enable: bool) {
        self.const_array_opt = enable;
    }

    /// Installs a host-native evaluator for the 80-bit extended format.
    pub fn set_native_extended(&mut self, eval: Rc<dyn NativeExtendedEval>) {
        self.native_extended = Some(eval);
    }

    pub(crate) fn canonical_nan_enabled(&self) -> bool {
        self.canonical_nan
    }

    pub(crate) fn const_array_opt_enabled(&self) -> bool {
        self.const_array_opt
    }

    pub(crate) fn native_extended(&self) -> Option<Rc<dyn NativeExtendedEval>> {
        self.native_extended.clone()
    }
}

/// Adding and querying nodes.
impl Context {
    pub fn get(&self, reference: ExprRef) -> &Expr {
        self.exprs.get_index(reference.index()).expect("Invalid ExprRef!")
    }

    /// Interns an expression. This is the hash-consing step: a structurally equal
    /// expression that was added before is returned unchanged, otherwise the new node
    /// is inserted and its structural hash is computed (children are always interned
    /// before their parents, so their hashes are available).
    pub(crate) fn add_expr(&mut self, value: Expr) -> ExprRef {
        let (index, inserted) = self.exprs.insert_full(value);
        if inserted {
            debug_assert_eq!(index, self.hashes.len());
            let hash = self.structural_hash(&value);
            self.hashes.push(hash);
        }
        ExprRef::from_index(index)
    }

    /// Structural hash of an interned expression. Deterministic and stable for the
    /// lifetime of the context.
    pub fn expr_hash(&self, reference: ExprRef) -> u64 {
        self.hashes[reference.index()]
    }

    pub fn width(&self, reference: ExprRef) -> WidthInt {
        self.get(reference).width(self)
    }

    pub(crate) fn get_str(&self, reference: StringRef) -> &str {
        self.strings
            .get_index(reference.index())
            .expect("Invalid StringRef!")
    }

    pub(crate) fn string(&mut self, value: std::borrow::Cow<str>) -> StringRef {
        if let Some(index) = self.strings.get_index_of(value.as_ref()) {
            StringRef::from_index(index)
        } else {
            let (index, _) = self.strings.insert_full(value.into_owned());
            StringRef::from_index(index)
        }
    }

    pub(crate) fn get_bv_value(&self, index: BitVecValueIndex) -> BitVecValueRef<'_> {
        self.values.words().get_ref(index)
    }

    /// Looks up the bit pattern of a constant expression.
    pub fn get_const(&self, reference: ExprRef) -> Option<BitVecValue> {
        match *self.get(reference) {
            Expr::Constant { value, .. } => Some(self.get_bv_value(value).into()),
            _ => None,
        }
    }

    pub fn is_const(&self, reference: ExprRef) -> bool {
        self.get(reference).is_constant()
    }

    /// True iff the expression is the constant with all bits zero.
    pub(crate) fn is_zero_const(&self, reference: ExprRef) -> bool {
        match self.get_const(reference) {
            Some(v) => v.is_equal(&BitVecValue::zero(v.width())),
            None => false,
        }
    }

    /// True iff the expression is the constant with all bits set.
    pub(crate) fn is_all_ones_const(&self, reference: ExprRef) -> bool {
        match self.get_const(reference) {
            Some(v) => v.is_equal(&BitVecValue::zero(v.width()).not()),
            None => false,
        }
    }
}

/// Constructing terminal nodes. All non-terminal construction goes through the
/// simplifying factories in the builder module.
impl Context {
    pub fn bv_symbol(&mut self, name: &str, width: WidthInt) -> ExprRef {
        assert!(width > 0, "0-bit bitvectors are not allowed");
        let name_ref = self.string(name.into());
        self.add_expr(Expr::Symbol {
            name: name_ref,
            width,
        })
    }

    pub fn bv_lit<'a>(&mut self, value: impl Into<BitVecValueRef<'a>>) -> ExprRef {
        let value = value.into();
        let width = value.width();
        assert!(width > 0, "0-bit bitvectors are not allowed");
        let index = self.values.get_index(value);
        self.add_expr(Expr::Constant {
            value: index,
            width,
            is_float: false,
        })
    }

    /// A constant carrying a floating-point bit pattern. The interpretation of the
    /// pattern is determined by the width alone.
    pub fn fp_lit<'a>(&mut self, value: impl Into<BitVecValueRef<'a>>) -> ExprRef {
        let value = value.into();
        let width = value.width();
        assert!(
            crate::expr::float::FloatFormat::from_width(width).is_some(),
            "{width} bits is not a supported floating-point format"
        );
        let index = self.values.get_index(value);
        self.add_expr(Expr::Constant {
            value: index,
            width,
            is_float: true,
        })
    }

    pub fn zero(&mut self, width: WidthInt) -> ExprRef {
        self.bv_lit(&BitVecValue::zero(width))
    }

    pub fn one(&mut self, width: WidthInt) -> ExprRef {
        self.bv_lit(&BitVecValue::from_u64(1, width))
    }

    pub fn mask(&mut self, width: WidthInt) -> ExprRef {
        let value = BitVecValue::zero(width).not();
        self.bv_lit(&value)
    }

    pub fn tru(&mut self) -> ExprRef {
        self.one(1)
    }

    pub fn fals(&mut self) -> ExprRef {
        self.zero(1)
    }

    pub fn bool_lit(&mut self, value: bool) -> ExprRef {
        if value {
            self.tru()
        } else {
            self.fals()
        }
    }
}

/// Arrays and update lists.
impl Context {
    /// Creates a fresh symbolic memory object without backing data. `size` may be
    /// symbolic and is conventionally a 64-bit cell count.
    pub fn array_symbol(
        &mut self,
        name: &str,
        size: ExprRef,
        domain: WidthInt,
        range: WidthInt,
    ) -> ArrayRef {
        assert!(domain > 0 && range > 0, "0-bit bitvectors are not allowed");
        let name_ref = self.string(name.into());
        let dependencies = collect_array_dependencies(self, size);
        let array = Array {
            name: name_ref,
            size,
            domain,
            range,
            source: ArraySource::Symbolic,
            dependencies,
        };
        self.add_array(array)
    }

    /// Creates a fresh memory object seeded with concrete data. Every entry must be
    /// a constant of the range width; the size is fixed to the entry count.
    pub fn array_concrete(
        &mut self,
        name: &str,
        values: &[ExprRef],
        domain: WidthInt,
        range: WidthInt,
    ) -> ArrayRef {
        assert!(domain > 0 && range > 0, "0-bit bitvectors are not allowed");
        for value in values.iter() {
            let expr = self.get(*value);
            assert!(
                expr.is_constant() && expr.width(self) == range,
                "concrete array entries must be constants of the range width"
            );
        }
        let name_ref = self.string(name.into());
        let size = self.bv_lit(&BitVecValue::from_u64(values.len() as u64, 64));
        let array = Array {
            name: name_ref,
            size,
            domain,
            range,
            source: ArraySource::Concrete(values.to_vec()),
            dependencies: smallvec::SmallVec::new(),
        };
        self.add_array(array)
    }

    fn add_array(&mut self, array: Array) -> ArrayRef {
        let index = self.arrays.len();
        self.arrays.push(array);
        ArrayRef::from_index(index)
    }

    pub fn get_array(&self, reference: ArrayRef) -> &Array {
        self.arrays.get(reference.index()).expect("Invalid ArrayRef!")
    }

    pub(crate) fn get_update(&self, reference: UpdateNodeRef) -> &UpdateNode {
        self.updates
            .get_index(reference.index())
            .expect("Invalid UpdateNodeRef!")
    }

    pub(crate) fn add_update(&mut self, node: UpdateNode) -> UpdateNodeRef {
        let (index, inserted) = self.updates.insert_full(node);
        if inserted {
            debug_assert_eq!(index, self.update_hashes.len());
            let next_hash = match node.next {
                Some(n) => self.update_hash(n),
                None => 0,
            };
            let hash = self
                .expr_hash(node.index)
                .wrapping_mul(MAGIC_HASH_CONSTANT)
                ^ self.expr_hash(node.value)
                ^ next_hash;
            self.update_hashes.push(hash);
        }
        UpdateNodeRef::from_index(index)
    }

    pub(crate) fn update_hash(&self, reference: UpdateNodeRef) -> u64 {
        self.update_hashes[reference.index()]
    }

    pub(crate) fn update_list_hash(&self, updates: UpdateList) -> u64 {
        let root = (updates.root.index() as u64 + 1).wrapping_mul(MAGIC_HASH_CONSTANT);
        match updates.head {
            Some(head) => root ^ self.update_hash(head),
            None => root,
        }
    }
}

/// Structural hashing:
/// `hash(node) = kind * MAGIC; for each child: hash = (hash << 1) ^ (hash(child) * MAGIC)`
/// with content-specific mixing for the content-bearing kinds.
impl Context {
    fn structural_hash(&self, expr: &Expr) -> u64 {
        let mut h = (expr.kind() as u64).wrapping_mul(MAGIC_HASH_CONSTANT);
        expr.for_each_child(|c| {
            h = (h << 1) ^ self.expr_hash(*c).wrapping_mul(MAGIC_HASH_CONSTANT);
        });
        match *expr {
            Expr::Constant {
                value,
                width,
                is_float,
            } => {
                h ^= (width as u64).wrapping_mul(MAGIC_HASH_CONSTANT);
                for word in self.get_bv_value(value).words().iter() {
                    h = (h << 1) ^ word.wrapping_mul(MAGIC_HASH_CONSTANT);
                }
                if is_float {
                    h ^= MAGIC_HASH_CONSTANT;
                }
            }
            Expr::Symbol { name, width } => {
                h ^= (name.index() as u64 + 1).wrapping_mul(MAGIC_HASH_CONSTANT);
                h ^= width as u64;
            }
            Expr::Read { updates, .. } => {
                h = (h << 1) ^ self.update_list_hash(updates);
            }
            Expr::Extract { offset, width, .. } => {
                h ^= (offset as u64).wrapping_mul(MAGIC_HASH_CONSTANT) ^ (width as u64);
            }
            Expr::ZeroExt { width, .. }
            | Expr::SignExt { width, .. }
            | Expr::FPExt { width, .. } => {
                h ^= (width as u64).wrapping_mul(MAGIC_HASH_CONSTANT);
            }
            Expr::FPTrunc { width, rm, .. }
            | Expr::FPToUnsigned { width, rm, .. }
            | Expr::FPToSigned { width, rm, .. }
            | Expr::UnsignedToFP { width, rm, .. }
            | Expr::SignedToFP { width, rm, .. } => {
                h ^= (width as u64).wrapping_mul(MAGIC_HASH_CONSTANT) ^ (rm as u64);
            }
            Expr::FPAdd(_, _, _, rm)
            | Expr::FPSub(_, _, _, rm)
            | Expr::FPMul(_, _, _, rm)
            | Expr::FPDiv(_, _, _, rm)
            | Expr::FPSqrt(_, _, rm)
            | Expr::FPRoundToIntegral(_, _, rm) => {
                h ^= rm as u64;
            }
            _ => {}
        }
        h
    }
}
