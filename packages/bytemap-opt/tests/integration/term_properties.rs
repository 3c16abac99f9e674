//! Property-based tests for the term algebra and its interval backing
//!
//! - A term read twice at the same location is equal to itself
//! - Containment answers agree with the concrete comparison on constants
//! - Wrapped-interval arithmetic over-approximates the concrete result

use bytemap_opt::features::bytemaps::{Term, TermFactory};
use bytemap_opt::features::data_flow::AnalysisCache;
use bytemap_opt::features::intervals::{IntervalAnalysis, IntervalOracle, WrappedInterval};
use bytemap_opt::shared::models::{BinaryOp, Cmd, Expr, Loc, Program, Var};
use primitive_types::U256;
use proptest::prelude::*;

fn word() -> impl Strategy<Value = U256> {
    prop_oneof![
        any::<u64>().prop_map(U256::from),
        any::<u64>().prop_map(|x| U256::MAX - U256::from(x)),
        any::<[u64; 4]>().prop_map(U256),
    ]
}

fn program() -> Program {
    let (a, b) = (Var::bits256("a"), Var::bits256("b"));
    Program::single_block(vec![
        Cmd::havoc(&a),
        Cmd::havoc(&b),
        Cmd::Assume(Expr::binary(BinaryOp::Lt, &a, Expr::num(100u64))),
        Cmd::Assert {
            cond: Expr::binary(BinaryOp::Lt, &b, &a),
            msg: "end".to_string(),
        },
    ])
}

fn linear(
    tf: &TermFactory<'_>,
    cache: &AnalysisCache<'_>,
    at: Loc,
    c: U256,
    k1: U256,
    k2: U256,
) -> Term {
    let (a, b) = (Var::bits256("a"), Var::bits256("b"));
    let ta = tf.atom(&a, cache.def_sites(&a, at));
    let tb = tf.atom(&b, cache.def_sites(&b, at));
    &(&ta * k1) + &(&tb * k2).plus_const(c)
}

proptest! {
    #[test]
    fn prop_term_equals_itself(c in word(), k1 in word(), k2 in word(), intervals in any::<bool>()) {
        let program = program();
        let cache = AnalysisCache::build(&program).unwrap();
        let analysis = IntervalAnalysis::new(&cache).unwrap();
        let oracle: Option<&dyn IntervalOracle> = if intervals { Some(&analysis) } else { None };
        let tf = TermFactory::new(&cache, oracle);

        let at = Loc::new(0, 3);
        let t = linear(&tf, &cache, at, c, k1, k2);
        prop_assert_eq!(tf.are_equal(at, &t, at, &t).unwrap(), Some(true));
    }

    #[test]
    fn prop_is_inside_matches_constants(q in 0u64..1 << 32, lo in 0u64..1 << 32, len in 0u64..1 << 16) {
        let program = program();
        let cache = AnalysisCache::build(&program).unwrap();
        let analysis = IntervalAnalysis::new(&cache).unwrap();
        let tf = TermFactory::new(&cache, Some(&analysis as &dyn IntervalOracle));

        let (range_loc, query_loc) = (Loc::new(0, 1), Loc::new(0, 3));
        let low = Term::constant(U256::from(lo));
        let high = Term::constant(U256::from(lo + len));
        let query = Term::constant(U256::from(q));
        let inside = tf.is_inside(query_loc, &query, range_loc, &low, &high).unwrap();
        prop_assert_eq!(inside, Some(lo <= q && q < lo + len));
    }

    #[test]
    fn prop_is_inside_on_atoms_is_sound(lo in 0u64..200, len in 0u64..200, shift in 0u64..300) {
        // a is in [0, 99] at the query, so `a + shift` is only decided when
        // the whole range falls on one side
        let program = program();
        let cache = AnalysisCache::build(&program).unwrap();
        let analysis = IntervalAnalysis::new(&cache).unwrap();
        let tf = TermFactory::new(&cache, Some(&analysis as &dyn IntervalOracle));

        let at = Loc::new(0, 3);
        let query = linear(&tf, &cache, at, U256::from(shift), U256::one(), U256::zero());
        let low = Term::constant(U256::from(lo));
        let high = Term::constant(U256::from(lo + len));
        let inside = tf.is_inside(at, &query, Loc::new(0, 0), &low, &high).unwrap();

        let values = (0..100u64).map(|a| a + shift);
        match inside {
            Some(true) => prop_assert!(values.clone().all(|v| lo <= v && v < lo + len)),
            Some(false) => prop_assert!(values.clone().all(|v| v < lo || v >= lo + len)),
            None => {}
        }
    }

    #[test]
    fn prop_wrapped_add_contains_sum(
        s1 in word(), l1 in 0u64..1000, o1 in 0u64..1000,
        s2 in word(), l2 in 0u64..1000, o2 in 0u64..1000,
    ) {
        let (o1, o2) = (o1.min(l1), o2.min(l2));
        let w1 = WrappedInterval::Arc { start: s1, len: U256::from(l1) };
        let w2 = WrappedInterval::Arc { start: s2, len: U256::from(l2) };
        let x = s1.overflowing_add(U256::from(o1)).0;
        let y = s2.overflowing_add(U256::from(o2)).0;
        prop_assert!(w1.contains(x) && w2.contains(y));
        prop_assert!(w1.add(&w2).contains(x.overflowing_add(y).0));
    }

    #[test]
    fn prop_wrapped_scale_contains_product(
        s in word(), l in 0u64..1000, o in 0u64..1000, k in word(),
    ) {
        let o = o.min(l);
        let w = WrappedInterval::Arc { start: s, len: U256::from(l) };
        let x = s.overflowing_add(U256::from(o)).0;
        prop_assert!(w.scale(k).contains(x.overflowing_mul(k).0));
    }
}
