//! Universal properties fuzzed over random data/barrier/predicate shapes:
//! boolean algebra laws, range/term duality, sorted-terms invariance, and
//! tail cleanliness, all exercised through [`FakeSegment`].

use proptest::prelude::*;
use scalarband::testing::FakeSegment;
use scalarband::{ChunkedBitset, Executor, PredicateNode, RangeCond, RangeOp};

const CHUNK_SIZE: usize = 8;

fn build(values: &[i32], barrier_chunks: usize, acked: usize) -> FakeSegment {
    let mut seg = FakeSegment::new(CHUNK_SIZE);
    seg.add_i32_field("v", values.to_vec(), barrier_chunks);
    seg.set_acked_rows(acked);
    seg
}

fn run(seg: &FakeSegment, pred: &PredicateNode) -> ChunkedBitset {
    Executor::new(seg, seg, seg)
        .execute(pred)
        .expect("valid predicate")
}

fn all_bits(r: &ChunkedBitset) -> Vec<bool> {
    r.iter().flat_map(|bs| bs.to_bits()).collect()
}

fn arb_values() -> impl Strategy<Value = Vec<i32>> {
    prop::collection::vec(-50i32..50, 1..40)
}

proptest! {
    #[test]
    fn length_equals_num_chunks(
        values in arb_values(),
        barrier_frac in 0u32..=4,
    ) {
        let num_chunks = values.len().div_ceil(CHUNK_SIZE);
        let barrier = (num_chunks as u32 * barrier_frac / 4) as usize;
        let seg = build(&values, barrier, values.len());
        let pred = PredicateNode::term::<i32>("v", vec![0]);
        let result = run(&seg, &pred);
        prop_assert_eq!(result.len(), num_chunks);
    }

    #[test]
    fn tail_beyond_acked_rows_is_always_zero(
        values in arb_values(),
        acked_delta in 0usize..8,
    ) {
        let acked = values.len().saturating_sub(acked_delta);
        let num_chunks = values.len().div_ceil(CHUNK_SIZE);
        let seg = build(&values, num_chunks, acked);
        let pred = PredicateNode::range::<i32>("v", vec![RangeCond::new(RangeOp::Ge, -1000)]);
        let result = run(&seg, &pred);
        for row in acked..values.len() {
            let chunk = row / CHUNK_SIZE;
            let offset = row % CHUNK_SIZE;
            prop_assert!(!result.chunk(chunk).get(offset), "row {} should be clamped", row);
        }
    }

    #[test]
    fn index_and_scan_branches_agree(
        values in arb_values(),
        threshold in -50i32..50,
    ) {
        let num_chunks = values.len().div_ceil(CHUNK_SIZE);
        let indexed = build(&values, num_chunks, values.len());
        let scanned = build(&values, 0, values.len());
        let pred = PredicateNode::range::<i32>("v", vec![RangeCond::new(RangeOp::Ge, threshold)]);
        let r1 = run(&indexed, &pred);
        let r2 = run(&scanned, &pred);
        prop_assert_eq!(all_bits(&r1), all_bits(&r2));
    }

    #[test]
    fn not_not_is_identity(values in arb_values(), threshold in -50i32..50) {
        let seg = build(&values, 0, values.len());
        let base = PredicateNode::range::<i32>("v", vec![RangeCond::new(RangeOp::Lt, threshold)]);
        let double_negated = PredicateNode::range::<i32>("v", vec![RangeCond::new(RangeOp::Lt, threshold)])
            .not()
            .not();
        prop_assert_eq!(all_bits(&run(&seg, &base)), all_bits(&run(&seg, &double_negated)));
    }

    #[test]
    fn and_or_xor_of_a_predicate_with_itself(values in arb_values(), threshold in -50i32..50) {
        let seg = build(&values, 0, values.len());
        let e = || PredicateNode::range::<i32>("v", vec![RangeCond::new(RangeOp::Lt, threshold)]);

        let and_self = run(&seg, &e().and(e()));
        let or_self = run(&seg, &e().or(e()));
        let xor_self = run(&seg, &e().xor(e()));
        let e_bits = all_bits(&run(&seg, &e()));

        prop_assert_eq!(all_bits(&and_self), e_bits.clone());
        prop_assert_eq!(all_bits(&or_self), e_bits);
        prop_assert!(xor_self.iter().all(|bs| bs.count_ones() == 0));
    }

    #[test]
    fn and_not_self_is_empty_and_and_not_zero_is_identity(values in arb_values(), threshold in -50i32..50) {
        let seg = build(&values, 0, values.len());
        let e = || PredicateNode::range::<i32>("v", vec![RangeCond::new(RangeOp::Lt, threshold)]);
        let nothing = || PredicateNode::range::<i32>("v", vec![RangeCond::new(RangeOp::Lt, threshold)])
            .and_not(PredicateNode::range::<i32>("v", vec![RangeCond::new(RangeOp::Lt, threshold)]));

        let empty = run(&seg, &nothing());
        prop_assert!(empty.iter().all(|bs| bs.count_ones() == 0));

        let zero = e().and_not(e());
        let identity = e().and_not(zero);
        prop_assert_eq!(all_bits(&run(&seg, &e())), all_bits(&run(&seg, &identity)));
    }

    #[test]
    fn de_morgans_laws_hold(
        values in arb_values(),
        t1 in -50i32..50,
        t2 in -50i32..50,
    ) {
        let seg = build(&values, 0, values.len());
        let a = || PredicateNode::range::<i32>("v", vec![RangeCond::new(RangeOp::Lt, t1)]);
        let b = || PredicateNode::range::<i32>("v", vec![RangeCond::new(RangeOp::Gt, t2)]);

        let not_and = run(&seg, &a().and(b()).not());
        let or_of_nots = run(&seg, &a().not().or(b().not()));
        prop_assert_eq!(all_bits(&not_and), all_bits(&or_of_nots));

        let not_or = run(&seg, &a().or(b()).not());
        let and_of_nots = run(&seg, &a().not().and(b().not()));
        prop_assert_eq!(all_bits(&not_or), all_bits(&and_of_nots));
    }

    #[test]
    fn range_eq_matches_term_and_ne_matches_negated_term(values in arb_values(), v in -50i32..50) {
        let seg = build(&values, 0, values.len());
        let as_range_eq = PredicateNode::range::<i32>("v", vec![RangeCond::new(RangeOp::Eq, v)]);
        let as_term = PredicateNode::term::<i32>("v", vec![v]);
        prop_assert_eq!(all_bits(&run(&seg, &as_range_eq)), all_bits(&run(&seg, &as_term)));

        let as_range_ne = PredicateNode::range::<i32>("v", vec![RangeCond::new(RangeOp::Ne, v)]);
        let as_negated_term = PredicateNode::term::<i32>("v", vec![v]).not();
        prop_assert_eq!(all_bits(&run(&seg, &as_range_ne)), all_bits(&run(&seg, &as_negated_term)));
    }

    #[test]
    fn two_sided_range_equals_and_of_both_bounds(
        values in arb_values(),
        lo in -50i32..50,
        hi in -50i32..50,
    ) {
        prop_assume!(lo <= hi);
        let seg = build(&values, 0, values.len());
        let two_sided = PredicateNode::range::<i32>(
            "v",
            vec![RangeCond::new(RangeOp::Ge, lo), RangeCond::new(RangeOp::Lt, hi)],
        );
        let anded = PredicateNode::range::<i32>("v", vec![RangeCond::new(RangeOp::Ge, lo)])
            .and(PredicateNode::range::<i32>("v", vec![RangeCond::new(RangeOp::Lt, hi)]));
        prop_assert_eq!(all_bits(&run(&seg, &two_sided)), all_bits(&run(&seg, &anded)));
    }

    #[test]
    fn term_values_order_does_not_affect_result(
        values in arb_values(),
        mut members in prop::collection::vec(-50i32..50, 0..10),
    ) {
        let seg = build(&values, 0, values.len());
        let forward = PredicateNode::term::<i32>("v", members.clone());
        members.reverse();
        let reversed = PredicateNode::term::<i32>("v", members);
        prop_assert_eq!(all_bits(&run(&seg, &forward)), all_bits(&run(&seg, &reversed)));
    }

    #[test]
    fn repeated_execution_on_a_stable_snapshot_is_stable(values in arb_values()) {
        let seg = build(&values, values.len().div_ceil(CHUNK_SIZE) / 2, values.len());
        let pred = PredicateNode::range::<i32>("v", vec![RangeCond::new(RangeOp::Gt, 0)]);
        let executor = Executor::new(&seg, &seg, &seg);
        let first = executor.execute(&pred).expect("valid predicate");
        let second = executor.execute(&pred).expect("valid predicate");
        prop_assert_eq!(all_bits(&first), all_bits(&second));
    }
}
