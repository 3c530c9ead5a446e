//! An in-memory segment double implementing [`ColumnStore`],
//! [`ScalarIndexRegistry`], and [`Schema`] at once, for doctests and
//! integration tests. Not part of the crate's production surface.

use std::any::Any;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::bitset::Bitset;
use crate::scalar::{Scalar, ScalarType};
use crate::store::{ColumnStore, ScalarIndex, ScalarIndexOp, ScalarIndexRegistry, Schema};

/// The index over a single chunk: a copy of that chunk's values, queried
/// linearly. Real segments would use something smarter (sorted arrays,
/// bitmaps per distinct value); this double only needs to be correct.
struct VecIndex<T: Scalar> {
    chunk_size: usize,
    values: Vec<T>,
}

impl<T: Scalar> ScalarIndex<T> for VecIndex<T> {
    fn in_set(&self, values: &[T]) -> Bitset {
        let mut bs = Bitset::new(self.chunk_size);
        for (i, v) in self.values.iter().enumerate() {
            let matched = values.iter().any(|c| c.total_cmp(v) == Ordering::Equal);
            bs.set(i, matched);
        }
        bs
    }

    fn not_in_set(&self, values: &[T]) -> Bitset {
        let mut bs = self.in_set(values);
        bs.flip();
        bs
    }

    fn range(&self, op: ScalarIndexOp, v: T) -> Bitset {
        let mut bs = Bitset::new(self.chunk_size);
        for (i, x) in self.values.iter().enumerate() {
            let matched = match (op, x.partial_cmp(&v)) {
                (_, None) => false,
                (ScalarIndexOp::Lt, Some(Ordering::Less)) => true,
                (ScalarIndexOp::Le, Some(Ordering::Less | Ordering::Equal)) => true,
                (ScalarIndexOp::Gt, Some(Ordering::Greater)) => true,
                (ScalarIndexOp::Ge, Some(Ordering::Greater | Ordering::Equal)) => true,
                _ => false,
            };
            bs.set(i, matched);
        }
        bs
    }
}

struct FieldEntry {
    scalar_type: ScalarType,
    num_rows: usize,
    /// First chunk index not covered by `indices`, a chunk count, not a
    /// row count.
    barrier: usize,
    data: Box<dyn Any + Send + Sync>,
    /// One `VecIndex<T>` per chunk in `[0, barrier)`.
    indices: Box<dyn Any + Send + Sync>,
}

/// An in-memory, growable segment double. Rows are appended per field
/// independently; `acked_rows` tracks the widest field added so far unless
/// overridden with [`FakeSegment::set_acked_rows`].
pub struct FakeSegment {
    chunk_size: usize,
    acked_rows: usize,
    fields: HashMap<String, FieldEntry>,
}

impl FakeSegment {
    /// Builds an empty segment with the given fixed chunk width.
    pub fn new(chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk_size must be positive");
        Self {
            chunk_size,
            acked_rows: 0,
            fields: HashMap::new(),
        }
    }

    /// Adds (or replaces) a field's data. `barrier` is a *chunk* count: the
    /// first `barrier` chunks get a prebuilt [`VecIndex`], the rest are
    /// scan-only. Clamped to the field's actual chunk count.
    pub fn add_field<T: Scalar>(&mut self, field: impl Into<String>, values: Vec<T>, barrier: usize) {
        let num_rows = values.len();
        self.acked_rows = self.acked_rows.max(num_rows);
        let chunk_size = self.chunk_size;
        let num_chunks = num_rows.div_ceil(chunk_size);
        let barrier = barrier.min(num_chunks);

        let indices: Vec<VecIndex<T>> = (0..barrier)
            .map(|i| {
                let start = i * chunk_size;
                let end = (start + chunk_size).min(num_rows);
                VecIndex {
                    chunk_size,
                    values: values[start..end].to_vec(),
                }
            })
            .collect();

        self.fields.insert(
            field.into(),
            FieldEntry {
                scalar_type: T::TYPE,
                num_rows,
                barrier,
                data: Box::new(values),
                indices: Box::new(indices),
            },
        );
    }

    /// Overrides the segment-wide acked row count, e.g. to model a field
    /// that has ingested more chunks than have been acknowledged yet.
    pub fn set_acked_rows(&mut self, n: usize) {
        self.acked_rows = n;
    }

    /// Adds a `bool` field.
    pub fn add_bool_field(&mut self, field: impl Into<String>, values: Vec<bool>, barrier: usize) {
        self.add_field(field, values, barrier)
    }

    /// Adds an `i8` field.
    pub fn add_i8_field(&mut self, field: impl Into<String>, values: Vec<i8>, barrier: usize) {
        self.add_field(field, values, barrier)
    }

    /// Adds an `i16` field.
    pub fn add_i16_field(&mut self, field: impl Into<String>, values: Vec<i16>, barrier: usize) {
        self.add_field(field, values, barrier)
    }

    /// Adds an `i32` field.
    pub fn add_i32_field(&mut self, field: impl Into<String>, values: Vec<i32>, barrier: usize) {
        self.add_field(field, values, barrier)
    }

    /// Adds an `i64` field.
    pub fn add_i64_field(&mut self, field: impl Into<String>, values: Vec<i64>, barrier: usize) {
        self.add_field(field, values, barrier)
    }

    /// Adds an `f32` field.
    pub fn add_f32_field(&mut self, field: impl Into<String>, values: Vec<f32>, barrier: usize) {
        self.add_field(field, values, barrier)
    }

    /// Adds an `f64` field.
    pub fn add_f64_field(&mut self, field: impl Into<String>, values: Vec<f64>, barrier: usize) {
        self.add_field(field, values, barrier)
    }

    fn entry(&self, field: &str) -> &FieldEntry {
        self.fields
            .get(field)
            .unwrap_or_else(|| panic!("FakeSegment has no field '{field}'"))
    }
}

impl ColumnStore for FakeSegment {
    fn num_chunks(&self, field: &str) -> usize {
        self.entry(field).num_rows.div_ceil(self.chunk_size)
    }

    fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn acked_rows(&self) -> usize {
        self.acked_rows
    }

    fn chunk<T: Scalar>(&self, field: &str, i: usize) -> &[T] {
        let entry = self.entry(field);
        let data = entry
            .data
            .downcast_ref::<Vec<T>>()
            .expect("FakeSegment: scalar type mismatch on chunk access");
        let start = i * self.chunk_size;
        let end = (start + self.chunk_size).min(data.len());
        &data[start..end]
    }
}

impl ScalarIndexRegistry for FakeSegment {
    fn barrier(&self, field: &str) -> usize {
        self.entry(field).barrier
    }

    fn index<T: Scalar>(&self, field: &str, i: usize) -> &dyn ScalarIndex<T> {
        let entry = self.entry(field);
        let indices = entry
            .indices
            .downcast_ref::<Vec<VecIndex<T>>>()
            .expect("FakeSegment: scalar type mismatch on index access");
        &indices[i]
    }
}

impl Schema for FakeSegment {
    fn field_type(&self, field: &str) -> Option<ScalarType> {
        self.fields.get(field).map(|e| e.scalar_type)
    }
}
