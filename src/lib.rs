//! # scalarband - scalar predicate execution core for a vector-database segment
//!
//! This crate evaluates a boolean predicate tree over the scalar fields of a
//! growing columnar segment and produces, per chunk, a bitmap of matching row
//! offsets. It transparently switches between a prebuilt scalar index and a
//! direct chunk scan at the segment's indexing barrier, and composes leaf
//! results through chunkwise boolean algebra.
//!
//! ## Quick start
//!
//! ```
//! use scalarband::{Executor, PredicateNode, RangeCond, RangeOp};
//! use scalarband::testing::FakeSegment;
//!
//! let mut seg = FakeSegment::new(4);
//! seg.add_i32_field("age", vec![10, 20, 30, 40, 50, 60], 0);
//!
//! let pred = PredicateNode::range::<i32>(
//!     "age",
//!     vec![
//!         RangeCond::new(RangeOp::Ge, 20),
//!         RangeCond::new(RangeOp::Lt, 60),
//!     ],
//! );
//!
//! let executor = Executor::new(&seg, &seg, &seg);
//! let result = executor.execute(&pred).expect("valid predicate");
//! assert_eq!(result.len(), 2);
//! ```
//!
//! ## Architecture
//!
//! - [`bitset`] - the fixed-width bitmap type and its chunkwise sequence.
//! - [`scalar`] - the supported scalar kinds and their total ordering.
//! - [`predicate`] - the predicate tree (`Term`, `Range`, `Not`, `BoolBin`).
//! - [`store`] - the external collaborator traits (column store, scalar index
//!   registry, schema).
//! - [`executor`] - the visitor that turns a tree + snapshot into a
//!   [`bitset::ChunkedBitset`].

/// Fixed-width bitmap and the chunkwise sequence of them.
pub mod bitset;
/// Error taxonomy for predicate execution.
pub mod error;
/// Turns a predicate tree plus a segment snapshot into a result bitmap.
pub mod executor;
/// Ambient `tracing` subscriber bootstrap.
pub mod logging;
/// The predicate tree: `Term`/`Range` leaves, `Not`/`BoolBin` inner nodes.
pub mod predicate;
/// Opt-in, env-var-gated execution profiler.
pub mod profile;
/// The supported scalar kinds and their total ordering.
pub mod scalar;
/// Collaborator traits consumed by the executor.
pub mod store;

/// An in-memory segment double for tests and doctests.
pub mod testing;

pub use bitset::{Bitset, ChunkedBitset};
pub use error::{ExecError, ExecErrorWithCode};
pub use executor::{Executor, ExecutorConfig};
pub use predicate::{BoolOp, PredicateNode, Range, RangeCond, RangeOp, Term};
pub use scalar::{Scalar, ScalarType};
pub use store::{ColumnStore, Schema, ScalarIndex, ScalarIndexOp, ScalarIndexRegistry};
