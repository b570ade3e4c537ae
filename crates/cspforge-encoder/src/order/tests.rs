use std::collections::BTreeSet;

use cspforge_core::{
    BoolVar, CspBuilder, CspError, CspFactory, IntegerClause, LinearExpression, LinearLiteral, Model,
};
use cspforge_test::{brute_force_solutions, fixtures, DpllSolver, Fixture, Projection};
use proptest::prelude::*;

use super::*;
use crate::stats::EncodingStats;
use crate::testing::encoded_solutions;

fn order_solutions(fixture: &mut Fixture) -> BTreeSet<Projection> {
    let mut encoder = OrderEncoder::new(1024);
    encoded_solutions(&mut encoder, fixture).0
}

fn projection(pairs: &[(&str, i64)]) -> Projection {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[test]
fn test_le_literal_mapping() {
    let mut factory = CspFactory::new();
    let x = factory.int_var_values("x", [1, 4, 6, 9]).unwrap();
    let mut solver = DpllSolver::new();
    let mut stats = EncodingStats::default();
    let mut sink = ClauseSink::new(&mut solver, &mut stats);
    let mut context = OrderContext::new();

    assert_eq!(context.le(&x, 0, &mut sink), Lit::FALSE);
    assert_eq!(context.le(&x, 9, &mut sink), Lit::TRUE);
    let chain = context.indicators(&x, &mut sink).to_vec();
    assert_eq!(chain.len(), 3);
    // x <= 5 is x <= 4
    assert_eq!(context.le(&x, 5, &mut sink), Lit::from(chain[1].positive()));
    // 2x <= 9 is x <= 4
    assert_eq!(context.le_ax(2, &x, 9, &mut sink), Lit::from(chain[1].positive()));
    // -x <= -5 is x >= 5, i.e. not x <= 4
    assert_eq!(context.le_ax(-1, &x, -5, &mut sink), Lit::from(chain[1].negative()));
    assert_eq!(context.le_ax(0, &x, -1, &mut sink), Lit::FALSE);
    drop(sink);
    // two chain clauses, no more
    assert_eq!(stats.clauses, 2);
}

#[test]
fn test_simple_lit_rejects_non_simple() {
    let mut factory = CspFactory::new();
    let x = factory.int_var_range("x", 0, 3).unwrap();
    let y = factory.int_var_range("y", 0, 3).unwrap();
    let mut solver = DpllSolver::new();
    let mut stats = EncodingStats::default();
    let mut sink = ClauseSink::new(&mut solver, &mut stats);
    let mut encoder = OrderEncoder::new(1024);

    let sum = LinearExpression::from_var(&x).add(&LinearExpression::from_var(&y));
    let err = encoder
        .simple_lit(&LinearLiteral::le(sum), &mut sink)
        .unwrap_err();
    assert!(matches!(err, CspError::NonSimpleLiteral(_)));

    let constant = LinearLiteral::le(LinearExpression::from_constant(-1));
    assert_eq!(encoder.simple_lit(&constant, &mut sink).unwrap(), Lit::TRUE);
}

#[test]
fn test_decode_unencoded_variable_is_maximum() {
    let mut factory = CspFactory::new();
    let x = factory.int_var_range("x", -2, 7).unwrap();
    let encoder = OrderEncoder::new(1024);
    assert_eq!(encoder.decode(&x, &Model::default()), 7);
}

#[test]
fn test_decode_reads_first_true_indicator() {
    let mut factory = CspFactory::new();
    let x = factory.int_var_range("x", 0, 3).unwrap();
    let mut solver = DpllSolver::new();
    let mut stats = EncodingStats::default();
    let mut encoder = OrderEncoder::new(1024);
    let chain = {
        let mut sink = ClauseSink::new(&mut solver, &mut stats);
        encoder.context.indicators(&x, &mut sink).to_vec()
    };
    let model = Model::new(
        [chain[1].clone(), chain[2].clone()].into_iter().collect(),
        [chain[0].clone()].into_iter().collect(),
    );
    assert_eq!(encoder.decode(&x, &model), 1);
}

#[test]
fn test_scenario_a() {
    let mut fixture = fixtures::scenario_a();
    let expected: BTreeSet<Projection> = (3..=5)
        .map(|b| projection(&[("a", 2), ("b", b)]))
        .collect();
    assert_eq!(order_solutions(&mut fixture), expected);
}

#[test]
fn test_scenario_b_permutations() {
    let mut fixture = fixtures::scenario_b();
    let solutions = order_solutions(&mut fixture);
    assert_eq!(solutions.len(), 6);
    for s in &solutions {
        let values: BTreeSet<i64> = s.values().copied().collect();
        assert_eq!(values, (0..=2).collect());
    }
}

#[test]
fn test_scenario_c() {
    let mut fixture = fixtures::scenario_c();
    let expected = brute_force_solutions(&fixture.csp);
    assert_eq!(expected.len(), 3);
    assert_eq!(order_solutions(&mut fixture), expected);
}

#[test]
fn test_mixed_matches_brute_force() {
    let mut fixture = fixtures::mixed();
    let expected = brute_force_solutions(&fixture.csp);
    assert!(!expected.is_empty());
    assert_eq!(order_solutions(&mut fixture), expected);
}

#[test]
fn test_product_matches_brute_force() {
    let mut fixture = fixtures::product();
    let expected = brute_force_solutions(&fixture.csp);
    assert!(!expected.is_empty());
    assert_eq!(order_solutions(&mut fixture), expected);
}

#[test]
fn test_empty_clause_is_unsat() {
    let mut factory = CspFactory::new();
    let x = factory.int_var_range("x", 0, 1).unwrap();
    let mut builder = CspBuilder::new();
    builder.add_int_var(&x).add_clause(IntegerClause::new());
    let mut fixture = Fixture {
        factory,
        csp: builder.build(),
        int_vars: vec![x],
        bool_vars: vec![],
    };
    assert!(order_solutions(&mut fixture).is_empty());
}

#[test]
fn test_split_introduces_aux_and_keeps_solutions() {
    let mut f = CspFactory::new();
    let vars: Vec<_> = ["a", "b", "c", "d"]
        .iter()
        .map(|n| f.int_var_range(n, 0, 3).unwrap())
        .collect();
    let terms: Vec<_> = vars.iter().map(|v| f.variable(v)).collect();
    let sum = f.sum(&terms);
    let seven = f.constant(7);
    let formula = f.eq(sum, seven);
    let mut fixture = Fixture::build(f, vars, vec![], &[formula]);
    let expected = brute_force_solutions(&fixture.csp);

    let mut encoder = OrderEncoder::new(4);
    let (solutions, stats) = encoded_solutions(&mut encoder, &mut fixture);
    assert!(stats.aux_int_vars > 0);
    assert_eq!(solutions, expected);
}

#[test]
fn test_several_non_simple_literals_are_guarded() {
    let mut f = CspFactory::new();
    let x = f.int_var_range("x", 0, 3).unwrap();
    let y = f.int_var_range("y", 0, 3).unwrap();
    let p = f.bool_var("p").unwrap();
    let (xt, yt) = (f.variable(&x), f.variable(&y));
    let sum = f.add(xt, yt);
    let diff = f.sub(xt, yt);
    let five = f.constant(5);
    let two = f.constant(2);
    let one = f.constant(1);
    // x + y = 5 or x - y >= 2 or p
    let formula = cspforge_core::Formula::or([
        f.eq(sum, five),
        f.ge(diff, two),
        cspforge_core::Formula::lit(p.positive()),
    ]);
    let guard = f.ne(xt, one);
    let mut fixture = Fixture::build(f, vec![x, y], vec![p], &[formula, guard]);
    let expected = brute_force_solutions(&fixture.csp);
    assert_eq!(order_solutions(&mut fixture), expected);
}

#[test]
fn test_fresh_bool_names_come_from_backend() {
    let mut factory = CspFactory::new();
    let x = factory.int_var_range("x", 0, 2).unwrap();
    let mut solver = DpllSolver::new();
    let mut stats = EncodingStats::default();
    let mut sink = ClauseSink::new(&mut solver, &mut stats);
    let mut context = OrderContext::new();
    let chain: Vec<BoolVar> = context.indicators(&x, &mut sink).to_vec();
    assert!(chain.iter().all(|b| b.name().starts_with("@SAT")));
}

fn arb_linear() -> impl Strategy<Value = (Vec<i64>, i64, u8)> {
    (
        proptest::collection::vec(-3i64..=3, 3),
        -6i64..=6,
        0u8..3,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_linear_literal_matches_brute_force((coefs, k, op) in arb_linear()) {
        let mut f = CspFactory::new();
        let vars = vec![
            f.int_var_range("x", -2, 2).unwrap(),
            f.int_var_values("y", [0, 1, 4]).unwrap(),
            f.int_var_range("z", 1, 3).unwrap(),
        ];
        let expr = vars
            .iter()
            .zip(&coefs)
            .fold(LinearExpression::from_constant(k), |e, (v, a)| {
                e.add(&LinearExpression::from_term(v, *a))
            });
        let literal = match op {
            0 => LinearLiteral::le(expr),
            1 => LinearLiteral::eq(expr),
            _ => LinearLiteral::ne(expr),
        };
        let mut builder = CspBuilder::new();
        for v in &vars {
            builder.add_int_var(v);
        }
        builder.add_clause(IntegerClause::from_arith(literal));
        let mut fixture = Fixture { factory: f, csp: builder.build(), int_vars: vars, bool_vars: vec![] };
        let expected = brute_force_solutions(&fixture.csp);
        let mut encoder = OrderEncoder::new(2);
        let (solutions, _) = encoded_solutions(&mut encoder, &mut fixture);
        prop_assert_eq!(solutions, expected);
    }
}
