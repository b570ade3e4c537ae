//! End-to-end runs: formulas in, decoded assignments out.

use std::collections::BTreeSet;

use cspforge::prelude::*;
use cspforge::{decode_assignment, LinearExpression, LinearLiteral, OrderEncoder, TermId};
use cspforge_test::{brute_force_solutions, fixtures, project, DpllSolver, Fixture, Projection};

fn configs() -> Vec<EncoderConfig> {
    let mut configs = vec![
        EncoderConfig::default(),
        EncoderConfig::default().with_propagation(false),
    ];
    for base in [2, 3, 5, 10, 20] {
        configs.push(EncoderConfig::default().with_algorithm(AlgorithmConfig::compact_order(base)));
    }
    configs
}

/// Every solution of `csp`, found by blocking each decoded model in turn.
fn enumerate(
    config: &EncoderConfig,
    factory: &mut CspFactory,
    csp: &Csp,
) -> BTreeSet<Projection> {
    let mut solver = DpllSolver::new();
    let mut session = cspforge::encode(config, factory, csp, &mut solver).unwrap();
    let mut solutions = BTreeSet::new();
    while let Some(model) = solver.solve() {
        let assignment = session.decode(&model).unwrap();
        let mut block = IntegerClause::new();
        for v in &csp.int_vars {
            let value = assignment.int_value(v).unwrap();
            block.push_arith(LinearLiteral::ne(
                LinearExpression::from_var(v).add_constant(-value),
            ));
        }
        for b in &csp.bool_vars {
            let value = assignment.bool_value(b).unwrap_or(false);
            block.push_bool(BoolLit::new(b.clone(), !value));
        }
        let mut projection = project(&assignment, csp);
        for b in &csp.bool_vars {
            projection.entry(b.name().to_string()).or_insert(0);
        }
        assert!(solutions.insert(projection), "model repeated after blocking");
        session.add_clause(factory, &block, &mut solver).unwrap();
    }
    solutions
}

fn run_fixture(config: &EncoderConfig, build: fn() -> Fixture) -> BTreeSet<Projection> {
    let mut fixture = build();
    enumerate(config, &mut fixture.factory, &fixture.csp)
}

#[test]
fn test_scenario_a() {
    for config in configs() {
        let solutions = run_fixture(&config, fixtures::scenario_a);
        assert_eq!(solutions.len(), 3, "{:?}", config);
        assert!(solutions.iter().all(|s| s["a"] == 2));
        let bs: BTreeSet<i64> = solutions.iter().map(|s| s["b"]).collect();
        assert_eq!(bs, BTreeSet::from([3, 4, 5]));
    }
}

#[test]
fn test_scenario_b_permutations() {
    for config in configs() {
        let solutions = run_fixture(&config, fixtures::scenario_b);
        assert_eq!(solutions.len(), 6, "{:?}", config);
        for s in &solutions {
            let values: BTreeSet<i64> = [s["a"], s["b"], s["c"]].into_iter().collect();
            assert_eq!(values, BTreeSet::from([0, 1, 2]));
        }
    }
}

#[test]
fn test_scenario_c() {
    for config in configs() {
        let solutions = run_fixture(&config, fixtures::scenario_c);
        assert_eq!(solutions.len(), 3, "{:?}", config);
        for s in &solutions {
            assert_eq!(s["a"] + s["b"], s["c"]);
            assert!((11..=12).contains(&s["c"]));
        }
    }
}

#[test]
fn test_encoders_agree_with_brute_force() {
    for build in [fixtures::mixed, fixtures::product] {
        let expected = brute_force_solutions(&build().csp);
        assert!(!expected.is_empty());
        for config in configs() {
            assert_eq!(run_fixture(&config, build), expected, "{:?}", config);
        }
    }
}

#[test]
fn test_round_trip_satisfies_formulas() {
    let mut factory = CspFactory::new();
    let x = factory.int_var_range("x", -5, 5).unwrap();
    let y = factory.int_var_values("y", [1, 2, 4, 8]).unwrap();
    let z = factory.int_var_range("z", 0, 20).unwrap();
    let p = factory.bool_var("p").unwrap();
    let (tx, ty, tz) = (factory.variable(&x), factory.variable(&y), factory.variable(&z));

    let mut formulas: Vec<Formula> = Vec::new();
    // z = |x| * y
    let ax = factory.abs(tx);
    let prod = factory.product(ax, ty);
    formulas.push(factory.eq(tz, prod));
    // x div 2 != y mod 3
    let half = factory.div(tx, 2).unwrap();
    let rest = factory.modulo(ty, 3).unwrap();
    formulas.push(factory.ne(half, rest));
    // p <-> z >= 7
    let seven = factory.constant(7);
    let big = factory.ge(tz, seven);
    formulas.push(Formula::equiv(Formula::lit(p.positive()), big));
    // max(x, y) - 3 < z
    let hi = factory.max(tx, ty);
    let three = factory.constant(3);
    let shifted = factory.sub(hi, three);
    formulas.push(factory.lt(shifted, tz));

    let mut builder = CspBuilder::new();
    builder.add_int_var(&x).add_int_var(&y).add_int_var(&z).add_bool_var(&p);
    for f in &formulas {
        builder.add_formula(&mut factory, f).unwrap();
    }
    let csp = builder.build();

    for config in configs() {
        let mut solver = DpllSolver::new();
        let session = cspforge::encode(&config, &mut factory, &csp, &mut solver).unwrap();
        let model = solver.solve().unwrap();
        let assignment = session.decode(&model).unwrap();
        let mut full = assignment.clone();
        if full.bool_value(&p).is_none() {
            full.set_bool(&p, false);
        }
        for f in &formulas {
            assert_eq!(factory.evaluate(f, &full).unwrap(), Some(true), "{:?}", config);
        }
    }
}

#[test]
fn test_unsat_problem_has_no_model() {
    let mut factory = CspFactory::new();
    let terms: Vec<TermId> = ["a", "b", "c", "d"]
        .iter()
        .map(|n| {
            let v = factory.int_var_range(n, 0, 2).unwrap();
            factory.variable(&v)
        })
        .collect();
    let formula = factory.all_different(&terms);
    let mut builder = CspBuilder::new();
    for v in factory.int_vars().to_vec() {
        builder.add_int_var(&v);
    }
    builder.add_formula(&mut factory, &formula).unwrap();
    let csp = builder.build();

    for config in configs() {
        let mut solver = DpllSolver::new();
        cspforge::encode(&config, &mut factory, &csp, &mut solver).unwrap();
        assert!(solver.solve().is_none(), "{:?}", config);
    }
}

#[test]
fn test_config_from_toml() {
    let config = EncoderConfig::from_toml_str(
        r#"
        [algorithm]
        type = "compact_order"
        base = 5
        "#,
    )
    .unwrap();
    let mut fixture = fixtures::scenario_c();
    let mut solver = DpllSolver::new();
    let session =
        cspforge::encode(&config, &mut fixture.factory, &fixture.csp, &mut solver).unwrap();
    assert_eq!(session.algorithm(), "compact_order");
    assert!(session.propagation().is_some());

    let model = solver.solve().unwrap();
    let encoded = session.csp().unwrap();
    let direct = decode_assignment(&OrderEncoder::new(1024), encoded, &Model::default());
    // an encoder that saw nothing decodes every variable to its maximum
    assert_eq!(direct.int_value(fixture.var("c")), Some(12));
    let assignment = session.decode(&model).unwrap();
    let a = assignment.int_value(fixture.var("a")).unwrap();
    let b = assignment.int_value(fixture.var("b")).unwrap();
    assert_eq!(assignment.int_value(fixture.var("c")), Some(a + b));
}
