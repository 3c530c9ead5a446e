//! Turns a [`PredicateNode`] plus a segment snapshot into a
//! [`ChunkedBitset`]: the index/scan split at each field's barrier, the
//! chunkwise boolean algebra for inner nodes, and the snapshot/cancellation
//! bookkeeping shared across a single [`Executor::execute`] call.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use crate::bitset::{Bitset, ChunkedBitset};
use crate::error::ExecError;
use crate::predicate::{BoolOp, PredicateNode, RangeCond, RangeOp};
use crate::profile::{self, Phase};
use crate::scalar::Scalar;
use crate::store::{
    ColumnStore, ColumnStoreErased, ScalarIndexOp, ScalarIndexRegistry, ScalarIndexRegistryErased,
    Schema,
};

/// Tunables that shape execution strategy without changing its result.
#[derive(Clone, Copy, Debug)]
pub struct ExecutorConfig {
    /// Below this many values, a `Term` leaf scans its candidate set
    /// linearly instead of binary-searching it. Both paths are correct;
    /// this only avoids binary search's fixed overhead on tiny sets.
    pub small_set_threshold: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            small_set_threshold: 4,
        }
    }
}

/// Per-execution context threaded through leaf evaluation: the erased
/// collaborator handles, the once-per-execution global snapshot
/// (`acked_rows`, `chunk_size`), and a per-field cache of `(num_chunks,
/// barrier)` sampled once on first touch.
pub(crate) struct ExecCtx<'a> {
    store: &'a dyn ColumnStoreErased,
    registry: &'a dyn ScalarIndexRegistryErased,
    schema: &'a dyn Schema,
    config: &'a ExecutorConfig,
    cancel: Option<&'a AtomicBool>,
    acked_rows: usize,
    chunk_size: usize,
    field_cache: RefCell<HashMap<String, (usize, usize)>>,
}

impl<'a> ExecCtx<'a> {
    fn field_snapshot(&self, field: &str) -> (usize, usize) {
        if let Some(&cached) = self.field_cache.borrow().get(field) {
            return cached;
        }
        let snapshot = (self.store.num_chunks(field), self.registry.barrier(field));
        self.field_cache
            .borrow_mut()
            .insert(field.to_string(), snapshot);
        snapshot
    }

    fn check_schema<T: Scalar>(&self, field: &str) -> Result<(), ExecError> {
        match self.schema.field_type(field) {
            Some(t) if t == T::TYPE => Ok(()),
            _ => Err(ExecError::SchemaMismatch {
                field: field.to_string(),
            }),
        }
    }

    fn check_cancelled(&self) -> Result<(), ExecError> {
        if self
            .cancel
            .map(|flag| flag.load(AtomicOrdering::Acquire))
            .unwrap_or(false)
        {
            Err(ExecError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Evaluates a predicate tree over a segment snapshot, producing one bitmap
/// per chunk. Holds no owned data beyond its tunables; cheap to construct
/// per query.
pub struct Executor<'a> {
    store: &'a dyn ColumnStoreErased,
    registry: &'a dyn ScalarIndexRegistryErased,
    schema: &'a dyn Schema,
    config: ExecutorConfig,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> Executor<'a> {
    /// Builds an executor with the default [`ExecutorConfig`] and no
    /// cancellation token.
    pub fn new<S, R, Sch>(store: &'a S, registry: &'a R, schema: &'a Sch) -> Self
    where
        S: ColumnStore + 'a,
        R: ScalarIndexRegistry + 'a,
        Sch: Schema + 'a,
    {
        Self::with_config(store, registry, schema, ExecutorConfig::default())
    }

    /// Builds an executor with an explicit [`ExecutorConfig`].
    pub fn with_config<S, R, Sch>(
        store: &'a S,
        registry: &'a R,
        schema: &'a Sch,
        config: ExecutorConfig,
    ) -> Self
    where
        S: ColumnStore + 'a,
        R: ScalarIndexRegistry + 'a,
        Sch: Schema + 'a,
    {
        Self {
            store,
            registry,
            schema,
            config,
            cancel: None,
        }
    }

    /// Attaches a cooperative cancellation flag, polled between chunks.
    /// Setting it mid-execution aborts with [`ExecError::Cancelled`] and no
    /// partial result.
    pub fn with_cancel_token(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Evaluates `root` against the current snapshot of the segment this
    /// executor was built over.
    #[tracing::instrument(level = "debug", skip(self, root))]
    pub fn execute(&self, root: &PredicateNode) -> Result<ChunkedBitset, ExecError> {
        let ctx = ExecCtx {
            store: self.store,
            registry: self.registry,
            schema: self.schema,
            config: &self.config,
            cancel: self.cancel,
            acked_rows: self.store.acked_rows(),
            chunk_size: self.store.chunk_size(),
            field_cache: RefCell::new(HashMap::new()),
        };
        tracing::debug!(acked_rows = ctx.acked_rows, chunk_size = ctx.chunk_size, "execute start");
        let result = self.eval_node(root, &ctx);
        if let Err(ref e) = result {
            tracing::warn!(error = %e.with_code(), "execute failed");
        }
        result
    }

    fn eval_node(&self, node: &PredicateNode, ctx: &ExecCtx<'_>) -> Result<ChunkedBitset, ExecError> {
        ctx.check_cancelled()?;
        match node {
            PredicateNode::Leaf(leaf) => leaf.eval(ctx),
            PredicateNode::Not(child) => {
                let mut result = self.eval_node(child, ctx)?;
                for bs in result.iter_mut() {
                    bs.flip();
                }
                // `flip` masks only at the word boundary, not the logical
                // row count, so the last chunk's padding bits (rows past
                // acked_rows) can come back as 1 and must be re-cleared.
                let n = result.len();
                if n > 0 {
                    let last = n - 1;
                    let valid_len = ctx
                        .acked_rows
                        .saturating_sub(last * ctx.chunk_size)
                        .min(ctx.chunk_size);
                    result.chunk_mut(last).clear_tail(valid_len);
                }
                Ok(result)
            }
            PredicateNode::BoolBin(op, lhs, rhs) => {
                let mut left = self.eval_node(lhs, ctx)?;
                let right = self.eval_node(rhs, ctx)?;
                if left.len() != right.len() {
                    return Err(ExecError::InvariantViolation(format!(
                        "boolean combination chunk-count mismatch: {} vs {}",
                        left.len(),
                        right.len()
                    )));
                }
                for (a, b) in left.iter_mut().zip(right.iter()) {
                    if a.len() != b.len() {
                        return Err(ExecError::InvariantViolation(format!(
                            "boolean combination chunk-width mismatch: {} vs {}",
                            a.len(),
                            b.len()
                        )));
                    }
                    let t = profile::start(Phase::BoolCombine);
                    match op {
                        BoolOp::And => a.and_assign(b),
                        BoolOp::Or => a.or_assign(b),
                        BoolOp::Xor => a.xor_assign(b),
                        BoolOp::AndNot => a.and_not_assign(b),
                    }
                    profile::record(Phase::BoolCombine, t);
                }
                Ok(left)
            }
        }
    }
}

/// Builds every chunk's bits: chunks below the field's barrier come from the
/// prebuilt per-chunk index via `build_index_bits(i)`, chunks at or beyond it
/// are scanned directly via `row_matches`. Either way the last chunk's tail
/// (rows beyond `acked_rows`) is clamped to 0 afterward, uniformly across
/// both branches. Shared by `Term` and `Range` leaf evaluation.
fn assemble<T, F, M>(
    ctx: &ExecCtx<'_>,
    field: &str,
    build_index_bits: F,
    row_matches: M,
) -> Result<ChunkedBitset, ExecError>
where
    T: Scalar,
    F: Fn(usize) -> Bitset,
    M: Fn(&T) -> bool,
{
    let (num_chunks, barrier) = ctx.field_snapshot(field);
    let chunk_size = ctx.chunk_size;
    let acked = ctx.acked_rows;

    let mut chunks = Vec::with_capacity(num_chunks);
    for i in 0..num_chunks {
        ctx.check_cancelled()?;
        let chunk_start = i * chunk_size;
        let valid_len = acked.saturating_sub(chunk_start).min(chunk_size);

        let mut bs = if i < barrier {
            let t = profile::start(Phase::IndexLookup);
            let bits = build_index_bits(i);
            profile::record(Phase::IndexLookup, t);
            bits
        } else {
            let t = profile::start(Phase::Scan);
            let mut bs = Bitset::new(chunk_size);
            let scan_vals: &[T] = T::chunk_from_erased(ctx.store, field, i);
            for j in 0..valid_len {
                bs.set(j, row_matches(&scan_vals[j]));
            }
            profile::record(Phase::Scan, t);
            bs
        };
        bs.clear_tail(valid_len);
        chunks.push(bs);
    }
    Ok(ChunkedBitset::from_chunks(chunks))
}

/// Evaluates a `Term` leaf: membership in `values`, which is already sorted
/// and de-duplicated.
pub(crate) fn eval_term_leaf<T: Scalar>(
    ctx: &ExecCtx<'_>,
    field: &str,
    values: &[T],
) -> Result<ChunkedBitset, ExecError> {
    ctx.check_schema::<T>(field)?;
    let small_set_threshold = ctx.config.small_set_threshold;

    let row_matches = |v: &T| {
        if values.len() <= small_set_threshold {
            values.iter().any(|c| c.total_cmp(v) == std::cmp::Ordering::Equal)
        } else {
            values
                .binary_search_by(|probe| probe.total_cmp(v))
                .is_ok()
        }
    };

    assemble(
        ctx,
        field,
        |i| T::index_from_erased(ctx.registry, field, i).in_set(values),
        row_matches,
    )
}

/// Every valid `Range` shape is resolvable by the prebuilt index: a single
/// condition (any of the six operators), or two conditions forming one
/// lower bound (`Gt`/`Ge`) and one upper bound (`Lt`/`Le`).
fn validate_range_shape<T: Scalar>(conds: &[RangeCond<T>]) -> bool {
    match conds.len() {
        1 => true,
        2 => {
            let is_upper = |o: RangeOp| matches!(o, RangeOp::Lt | RangeOp::Le);
            let is_lower = |o: RangeOp| matches!(o, RangeOp::Gt | RangeOp::Ge);
            let (a, b) = (conds[0].op, conds[1].op);
            (is_upper(a) && is_lower(b)) || (is_lower(a) && is_upper(b))
        }
        _ => false,
    }
}

fn to_index_op(op: RangeOp) -> ScalarIndexOp {
    match op {
        RangeOp::Lt => ScalarIndexOp::Lt,
        RangeOp::Le => ScalarIndexOp::Le,
        RangeOp::Gt => ScalarIndexOp::Gt,
        RangeOp::Ge => ScalarIndexOp::Ge,
        RangeOp::Eq | RangeOp::Ne => {
            unreachable!("Eq/Ne are resolved via in_set/not_in_set, not range")
        }
    }
}

fn build_index_bits_for_conds<T: Scalar>(
    ctx: &ExecCtx<'_>,
    field: &str,
    conds: &[RangeCond<T>],
    i: usize,
) -> Bitset {
    let idx = T::index_from_erased(ctx.registry, field, i);
    match conds.len() {
        1 => match conds[0].op {
            RangeOp::Eq => idx.in_set(std::slice::from_ref(&conds[0].val)),
            RangeOp::Ne => idx.not_in_set(std::slice::from_ref(&conds[0].val)),
            op => idx.range(to_index_op(op), conds[0].val),
        },
        2 => {
            let (lo, hi) = if matches!(conds[0].op, RangeOp::Gt | RangeOp::Ge) {
                (conds[0], conds[1])
            } else {
                (conds[1], conds[0])
            };
            idx.range_between(lo.val, lo.op == RangeOp::Ge, hi.val, hi.op == RangeOp::Le)
        }
        _ => unreachable!("validate_range_shape only accepts 1 or 2 conditions"),
    }
}

fn range_cond_matches<T: Scalar>(v: &T, cond: &RangeCond<T>) -> bool {
    use std::cmp::Ordering::*;
    match v.partial_cmp(&cond.val) {
        None => false,
        Some(Less) => matches!(cond.op, RangeOp::Lt | RangeOp::Le | RangeOp::Ne),
        Some(Equal) => matches!(cond.op, RangeOp::Le | RangeOp::Ge | RangeOp::Eq),
        Some(Greater) => matches!(cond.op, RangeOp::Gt | RangeOp::Ge | RangeOp::Ne),
    }
}

/// Evaluates a `Range` leaf: conjunction of `conds`, already canonicalized
/// and sorted by operator code.
pub(crate) fn eval_range_leaf<T: Scalar>(
    ctx: &ExecCtx<'_>,
    field: &str,
    conds: &[RangeCond<T>],
) -> Result<ChunkedBitset, ExecError> {
    ctx.check_schema::<T>(field)?;
    if !validate_range_shape(conds) {
        return Err(ExecError::UnsupportedOperator {
            field: field.to_string(),
            count: conds.len(),
        });
    }

    let row_matches = |v: &T| conds.iter().all(|c| range_cond_matches(v, c));

    assemble(
        ctx,
        field,
        |i| build_index_bits_for_conds(ctx, field, conds, i),
        row_matches,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSegment;

    #[test]
    fn schema_mismatch_is_reported() {
        let mut seg = FakeSegment::new(4);
        seg.add_i32_field("age", vec![1, 2, 3], 0);
        let pred = PredicateNode::term::<i64>("age", vec![1]);
        let executor = Executor::new(&seg, &seg, &seg);
        let err = executor.execute(&pred).unwrap_err();
        assert_eq!(err.code(), "SchemaMismatch");
    }

    #[test]
    fn unsupported_range_shape_is_reported() {
        let mut seg = FakeSegment::new(4);
        seg.add_i32_field("age", vec![1, 2, 3], 0);
        let pred = PredicateNode::range::<i32>(
            "age",
            vec![
                RangeCond::new(RangeOp::Eq, 1),
                RangeCond::new(RangeOp::Lt, 10),
            ],
        );
        let executor = Executor::new(&seg, &seg, &seg);
        let err = executor.execute(&pred).unwrap_err();
        assert_eq!(err.code(), "UnsupportedOperator");
    }

    #[test]
    fn cancellation_is_observed_between_chunks() {
        let mut seg = FakeSegment::new(2);
        seg.add_i32_field("age", vec![1, 2, 3, 4, 5, 6], 0);
        let flag = AtomicBool::new(true);
        let pred = PredicateNode::term::<i32>("age", vec![1]);
        let executor = Executor::new(&seg, &seg, &seg).with_cancel_token(&flag);
        let err = executor.execute(&pred).unwrap_err();
        assert_eq!(err.code(), "Cancelled");
    }
}
