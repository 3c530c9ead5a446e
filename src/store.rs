//! Collaborator traits the executor consumes: the raw column store, the
//! scalar index registry, and the schema. A segment implementation
//! (production or test double) implements all three; the executor only ever
//! sees them through these interfaces.

use crate::bitset::Bitset;
use crate::scalar::{Scalar, ScalarType};

/// Read access to a growing columnar segment's scalar fields.
///
/// A segment is divided into `num_chunks()` fixed-width chunks of
/// `chunk_size()` rows each, except possibly the last, whose logical length
/// may be shorter (bits past it are always 0 in any returned bitset).
pub trait ColumnStore {
    /// Number of chunks currently present for `field`.
    fn num_chunks(&self, field: &str) -> usize;

    /// The fixed chunk width (rows per chunk, except possibly the last).
    fn chunk_size(&self) -> usize;

    /// Number of rows acknowledged (durably visible) across the whole
    /// segment at the moment this is sampled. Bounds the logical length of
    /// the last chunk.
    fn acked_rows(&self) -> usize;

    /// Borrows the raw values of chunk `i` of `field`, typed as `T`.
    /// Undefined for `i >= num_chunks(field)`. The caller (the executor) has
    /// already checked `T::TYPE` against the schema before calling this.
    fn chunk<T: Scalar>(&self, field: &str, i: usize) -> &[T];
}

/// The four one-sided comparison operators a [`ScalarIndex`] resolves
/// directly; `Eq`/`Ne` are resolved by [`ScalarIndex::in_set`]/
/// [`ScalarIndex::not_in_set`] instead.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScalarIndexOp {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

/// A prebuilt index over one field's single chunk. Every method returns a
/// bitset of width [`ColumnStore::chunk_size`]; bits at or beyond that
/// chunk's logical length are meaningless and are clamped to 0 by the
/// executor rather than by the index itself.
pub trait ScalarIndex<T: Scalar> {
    /// Rows whose value is a member of `values` (already sorted/deduped).
    fn in_set(&self, values: &[T]) -> Bitset;

    /// Rows whose value is *not* a member of `values`.
    fn not_in_set(&self, values: &[T]) -> Bitset;

    /// Rows satisfying the single-bound comparison `value <op> v`.
    fn range(&self, op: ScalarIndexOp, v: T) -> Bitset;

    /// Rows satisfying both bounds of a two-sided range at once (an index
    /// may implement this more efficiently than two `range` calls ANDed
    /// together; the default does exactly that).
    fn range_between(&self, lo: T, lo_inclusive: bool, hi: T, hi_inclusive: bool) -> Bitset {
        let lo_op = if lo_inclusive {
            ScalarIndexOp::Ge
        } else {
            ScalarIndexOp::Gt
        };
        let hi_op = if hi_inclusive {
            ScalarIndexOp::Le
        } else {
            ScalarIndexOp::Lt
        };
        let mut low = self.range(lo_op, lo);
        let high = self.range(hi_op, hi);
        low.and_assign(&high);
        low
    }
}

/// Read access to the segment's prebuilt scalar indexes.
///
/// Publishes a monotonic indexing barrier `B` per field: chunks `[0, B)` are
/// fully indexed and immutable; chunks `[B, num_chunks)` have no index and
/// must be scanned directly.
pub trait ScalarIndexRegistry {
    /// The first chunk index of `field` not yet covered by a built index.
    /// Sampled once per field on first touch during a single execution.
    fn barrier(&self, field: &str) -> usize;

    /// Borrows the index over chunk `i` of `field`, typed as `T`. Defined
    /// only for `i < barrier(field)`. The caller has already checked
    /// `T::TYPE` against the schema.
    fn index<T: Scalar>(&self, field: &str, i: usize) -> &dyn ScalarIndex<T>;
}

/// Field-name to scalar-type resolution for the segment being queried.
pub trait Schema {
    /// The declared [`ScalarType`] of `field`, or `None` if the segment has
    /// no such field.
    fn field_type(&self, field: &str) -> Option<ScalarType>;
}

/// Object-safe mirror of [`ColumnStore`], generated with one method per
/// concrete scalar type so the executor can hold `&dyn ColumnStoreErased`
/// without the generic `chunk::<T>` method making the trait object-unsafe.
/// Blanket-implemented for every [`ColumnStore`]; not part of the public API
/// a segment author implements.
pub(crate) trait ColumnStoreErased {
    fn num_chunks(&self, field: &str) -> usize;
    fn chunk_size(&self) -> usize;
    fn acked_rows(&self) -> usize;
    fn chunk_bool(&self, field: &str, i: usize) -> &[bool];
    fn chunk_i8(&self, field: &str, i: usize) -> &[i8];
    fn chunk_i16(&self, field: &str, i: usize) -> &[i16];
    fn chunk_i32(&self, field: &str, i: usize) -> &[i32];
    fn chunk_i64(&self, field: &str, i: usize) -> &[i64];
    fn chunk_f32(&self, field: &str, i: usize) -> &[f32];
    fn chunk_f64(&self, field: &str, i: usize) -> &[f64];
}

impl<C: ColumnStore> ColumnStoreErased for C {
    fn num_chunks(&self, field: &str) -> usize {
        ColumnStore::num_chunks(self, field)
    }

    fn chunk_size(&self) -> usize {
        ColumnStore::chunk_size(self)
    }

    fn acked_rows(&self) -> usize {
        ColumnStore::acked_rows(self)
    }

    fn chunk_bool(&self, field: &str, i: usize) -> &[bool] {
        self.chunk(field, i)
    }

    fn chunk_i8(&self, field: &str, i: usize) -> &[i8] {
        self.chunk(field, i)
    }

    fn chunk_i16(&self, field: &str, i: usize) -> &[i16] {
        self.chunk(field, i)
    }

    fn chunk_i32(&self, field: &str, i: usize) -> &[i32] {
        self.chunk(field, i)
    }

    fn chunk_i64(&self, field: &str, i: usize) -> &[i64] {
        self.chunk(field, i)
    }

    fn chunk_f32(&self, field: &str, i: usize) -> &[f32] {
        self.chunk(field, i)
    }

    fn chunk_f64(&self, field: &str, i: usize) -> &[f64] {
        self.chunk(field, i)
    }
}

/// Object-safe mirror of [`ScalarIndexRegistry`], generated with one accessor
/// per concrete scalar type. Blanket-implemented for every
/// [`ScalarIndexRegistry`].
pub(crate) trait ScalarIndexRegistryErased {
    fn barrier(&self, field: &str) -> usize;
    fn index_bool(&self, field: &str, i: usize) -> &dyn ScalarIndex<bool>;
    fn index_i8(&self, field: &str, i: usize) -> &dyn ScalarIndex<i8>;
    fn index_i16(&self, field: &str, i: usize) -> &dyn ScalarIndex<i16>;
    fn index_i32(&self, field: &str, i: usize) -> &dyn ScalarIndex<i32>;
    fn index_i64(&self, field: &str, i: usize) -> &dyn ScalarIndex<i64>;
    fn index_f32(&self, field: &str, i: usize) -> &dyn ScalarIndex<f32>;
    fn index_f64(&self, field: &str, i: usize) -> &dyn ScalarIndex<f64>;
}

impl<R: ScalarIndexRegistry> ScalarIndexRegistryErased for R {
    fn barrier(&self, field: &str) -> usize {
        ScalarIndexRegistry::barrier(self, field)
    }

    fn index_bool(&self, field: &str, i: usize) -> &dyn ScalarIndex<bool> {
        self.index(field, i)
    }

    fn index_i8(&self, field: &str, i: usize) -> &dyn ScalarIndex<i8> {
        self.index(field, i)
    }

    fn index_i16(&self, field: &str, i: usize) -> &dyn ScalarIndex<i16> {
        self.index(field, i)
    }

    fn index_i32(&self, field: &str, i: usize) -> &dyn ScalarIndex<i32> {
        self.index(field, i)
    }

    fn index_i64(&self, field: &str, i: usize) -> &dyn ScalarIndex<i64> {
        self.index(field, i)
    }

    fn index_f32(&self, field: &str, i: usize) -> &dyn ScalarIndex<f32> {
        self.index(field, i)
    }

    fn index_f64(&self, field: &str, i: usize) -> &dyn ScalarIndex<f64> {
        self.index(field, i)
    }
}
