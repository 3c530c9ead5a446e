//! The predicate tree: `Term` and `Range` leaves, `Not` and `BoolBin` inner
//! nodes.
//!
//! Nodes are a tagged enum dispatched by `match` rather than a double-dispatch
//! visitor (see the design notes on replacing the source's visitor pattern).
//! Leaf payloads stay generic over [`Scalar`] so comparisons monomorphize;
//! they are boxed behind the small object-safe [`LeafEval`] trait so a single
//! tree can mix leaves over different fields and scalar types.

use smallvec::SmallVec;
use std::fmt::Debug;

use crate::bitset::ChunkedBitset;
use crate::error::ExecError;
use crate::executor::ExecCtx;
use crate::scalar::{Scalar, ScalarType};

/// Range comparison operators. The discriminant order `Lt, Le, Gt, Ge, Eq, Ne`
/// (`0..5`) is the canonical sort order the executor relies on to recognize
/// the two enumerated two-condition range shapes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(u8)]
pub enum RangeOp {
    /// `<`
    Lt = 0,
    /// `<=`
    Le = 1,
    /// `>`
    Gt = 2,
    /// `>=`
    Ge = 3,
    /// `=`
    Eq = 4,
    /// `!=`
    Ne = 5,
}

/// A single `(operator, value)` condition within a `Range` leaf.
#[derive(Clone, Copy, Debug)]
pub struct RangeCond<T: Scalar> {
    /// The comparison operator.
    pub op: RangeOp,
    /// The literal value compared against.
    pub val: T,
}

impl<T: Scalar> RangeCond<T> {
    /// Builds a condition.
    pub fn new(op: RangeOp, val: T) -> Self {
        Self { op, val }
    }
}

/// Boolean connective applied by a `BoolBin` inner node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BoolOp {
    /// Conjunction (`&=`).
    And,
    /// Disjunction (`|=`).
    Or,
    /// Exclusive or (`^=`).
    Xor,
    /// `a AND NOT b` (`a &= !b`).
    AndNot,
}

/// Object-safe evaluation contract implemented generically for [`Term`] and
/// [`Range`] leaves, letting heterogeneous leaves share one tree type.
pub(crate) trait LeafEval: Debug + Send + Sync {
    fn field(&self) -> &str;
    fn declared_type(&self) -> ScalarType;
    fn eval(&self, ctx: &ExecCtx<'_>) -> Result<ChunkedBitset, ExecError>;
}

/// `Term{field, values}`: a row matches iff `field ∈ values`.
///
/// `values` is sorted and de-duplicated at construction time (via
/// [`Scalar::total_cmp`]) so the scan path can binary-search.
#[derive(Clone, Debug)]
pub struct Term<T: Scalar> {
    field: String,
    values: Vec<T>,
}

impl<T: Scalar> Term<T> {
    /// Builds a `Term` leaf, canonicalizing `values` (sort + de-dup).
    /// Shuffling the input before calling this has no effect on the result
    /// (the sorted-terms-invariance property).
    pub fn new(field: impl Into<String>, mut values: Vec<T>) -> Self {
        values.sort_by(|a, b| a.total_cmp(b));
        values.dedup_by(|a, b| a.total_cmp(b) == std::cmp::Ordering::Equal);
        Self {
            field: field.into(),
            values,
        }
    }

    /// The canonicalized, sorted, de-duplicated value set.
    pub fn values(&self) -> &[T] {
        &self.values
    }
}

/// `Range{field, conds}`: a row matches iff every condition holds.
///
/// `conds` holds 1 or 2 entries, sorted by [`RangeOp`] discriminant. For a
/// two-sided range this puts the upper bound (`Lt`/`Le`, codes 0/1) ahead of
/// the lower bound (`Gt`/`Ge`, codes 2/3); the executor re-pairs them by role
/// rather than by position. Shapes outside "one condition" or "one upper +
/// one lower bound" (e.g. two upper bounds, or `Eq`/`Ne` combined with
/// anything else) are rejected at evaluation time as
/// `ExecError::UnsupportedOperator`.
#[derive(Clone, Debug)]
pub struct Range<T: Scalar> {
    field: String,
    conds: SmallVec<[RangeCond<T>; 2]>,
}

impl<T: Scalar> Range<T> {
    /// Builds a `Range` leaf from 1 or 2 conditions, sorted by operator code.
    /// Shape validation (does this sorted list match one of the enumerated
    /// patterns?) happens lazily, on first evaluation (§7 policy: "leaf
    /// validation happens on first touch").
    pub fn new(field: impl Into<String>, mut conds: Vec<RangeCond<T>>) -> Self {
        conds.sort_by_key(|c| c.op);
        Self {
            field: field.into(),
            conds: conds.into(),
        }
    }

    /// The canonicalized condition list.
    pub fn conds(&self) -> &[RangeCond<T>] {
        &self.conds
    }
}

/// A node in the predicate tree.
#[derive(Debug)]
pub enum PredicateNode {
    /// A `Term` or `Range` leaf, type-erased behind [`LeafEval`].
    Leaf(Box<dyn LeafEval>),
    /// Bitwise complement of the child, per chunk.
    Not(Box<PredicateNode>),
    /// A chunkwise boolean combination of two children.
    BoolBin(BoolOp, Box<PredicateNode>, Box<PredicateNode>),
}

impl PredicateNode {
    /// Builds a `Term` leaf node.
    pub fn term<T: Scalar>(field: impl Into<String>, values: Vec<T>) -> Self {
        PredicateNode::Leaf(Box::new(Term::new(field, values)))
    }

    /// Builds a `Range` leaf node from an already-constructed [`Range`].
    pub fn from_range<T: Scalar>(range: Range<T>) -> Self {
        PredicateNode::Leaf(Box::new(range))
    }

    /// Builds a `Range` leaf node from 1 or 2 conditions.
    pub fn range<T: Scalar>(field: impl Into<String>, conds: Vec<RangeCond<T>>) -> Self {
        PredicateNode::from_range(Range::new(field, conds))
    }

    /// Wraps `self` in a `Not`.
    pub fn not(self) -> Self {
        PredicateNode::Not(Box::new(self))
    }

    /// `And(self, other)`.
    pub fn and(self, other: Self) -> Self {
        PredicateNode::BoolBin(BoolOp::And, Box::new(self), Box::new(other))
    }

    /// `Or(self, other)`.
    pub fn or(self, other: Self) -> Self {
        PredicateNode::BoolBin(BoolOp::Or, Box::new(self), Box::new(other))
    }

    /// `Xor(self, other)`.
    pub fn xor(self, other: Self) -> Self {
        PredicateNode::BoolBin(BoolOp::Xor, Box::new(self), Box::new(other))
    }

    /// `AndNot(self, other)`.
    pub fn and_not(self, other: Self) -> Self {
        PredicateNode::BoolBin(BoolOp::AndNot, Box::new(self), Box::new(other))
    }
}

mod leaf_eval_impls {
    use super::*;
    use crate::executor::{eval_range_leaf, eval_term_leaf};

    impl<T: Scalar> LeafEval for Term<T> {
        fn field(&self) -> &str {
            &self.field
        }

        fn declared_type(&self) -> ScalarType {
            T::TYPE
        }

        fn eval(&self, ctx: &ExecCtx<'_>) -> Result<ChunkedBitset, ExecError> {
            eval_term_leaf(ctx, &self.field, &self.values)
        }
    }

    impl<T: Scalar> LeafEval for Range<T> {
        fn field(&self) -> &str {
            &self.field
        }

        fn declared_type(&self) -> ScalarType {
            T::TYPE
        }

        fn eval(&self, ctx: &ExecCtx<'_>) -> Result<ChunkedBitset, ExecError> {
            eval_range_leaf(ctx, &self.field, &self.conds)
        }
    }
}
