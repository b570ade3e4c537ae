use std::collections::BTreeSet;

use cspforge_config::LimitsConfig;
use cspforge_core::{BoolLit, CspBuilder, LinearExpression, LinearLiteral};
use cspforge_test::{brute_force_solutions, fixtures, DpllSolver, Fixture, Projection};

use super::*;

fn configs() -> Vec<EncoderConfig> {
    let mut configs = vec![EncoderConfig::new()];
    for base in [2, 3, 5, 10, 20] {
        configs.push(EncoderConfig::new().with_algorithm(AlgorithmConfig::compact_order(base)));
    }
    configs
}

fn blocking_clause(fixture: &Fixture, assignment: &CspAssignment) -> IntegerClause {
    let mut clause = IntegerClause::new();
    for v in &fixture.int_vars {
        let value = assignment.int_value(v).unwrap();
        clause.push_arith(LinearLiteral::ne(
            LinearExpression::from_var(v).add_constant(-value),
        ));
    }
    for b in &fixture.bool_vars {
        let value = assignment.bool_value(b).unwrap_or(false);
        clause.push_bool(BoolLit::new(b.clone(), !value));
    }
    clause
}

fn projection(fixture: &Fixture, assignment: &CspAssignment) -> Projection {
    let mut projection = Projection::new();
    for v in &fixture.int_vars {
        projection.insert(v.name().to_string(), assignment.int_value(v).unwrap());
    }
    for b in &fixture.bool_vars {
        let value = assignment.bool_value(b).unwrap_or(false);
        projection.insert(b.name().to_string(), i64::from(value));
    }
    projection
}

fn enumerate(config: &EncoderConfig, mut fixture: Fixture) -> BTreeSet<Projection> {
    let mut session = EncodingSession::new(config).unwrap();
    let mut solver = DpllSolver::new();
    session.encode(&mut fixture.factory, &fixture.csp, &mut solver).unwrap();
    let mut solutions = BTreeSet::new();
    while let Some(model) = solver.solve() {
        let assignment = session.decode(&model).unwrap();
        for clause in &fixture.csp.clauses {
            assert_ne!(assignment.satisfies(clause), Some(false), "{}", clause);
        }
        assert!(solutions.insert(projection(&fixture, &assignment)));
        let block = blocking_clause(&fixture, &assignment);
        session.add_clause(&mut fixture.factory, &block, &mut solver).unwrap();
    }
    solutions
}

#[test]
fn test_base_below_two_is_unsupported() {
    let config = EncoderConfig::new().with_algorithm(AlgorithmConfig::compact_order(1));
    let err = EncodingSession::new(&config).unwrap_err();
    assert!(matches!(err, CspError::UnsupportedAlgorithm(_)));
}

#[test]
fn test_invalid_limits_are_invalid_argument() {
    let config = EncoderConfig::new().with_split_threshold(1);
    let err = EncodingSession::new(&config).unwrap_err();
    assert!(matches!(err, CspError::InvalidArgument(_)));
}

#[test]
fn test_algorithm_names() {
    let order = EncodingSession::new(&EncoderConfig::new()).unwrap();
    assert_eq!(order.algorithm(), "order");
    let compact =
        EncodingSession::new(&EncoderConfig::new().with_algorithm(AlgorithmConfig::compact_order(4)))
            .unwrap();
    assert_eq!(compact.algorithm(), "compact_order");
}

#[test]
fn test_encode_twice_is_invalid_state() {
    let mut fixture = fixtures::scenario_a();
    let mut session = EncodingSession::new(&EncoderConfig::new()).unwrap();
    let mut solver = DpllSolver::new();
    session.encode(&mut fixture.factory, &fixture.csp, &mut solver).unwrap();
    let err = session
        .encode(&mut fixture.factory, &fixture.csp, &mut solver)
        .unwrap_err();
    assert!(matches!(err, CspError::InvalidState(_)));
}

#[test]
fn test_use_before_encode_is_invalid_state() {
    let mut fixture = fixtures::scenario_a();
    let mut session = EncodingSession::new(&EncoderConfig::new()).unwrap();
    let mut solver = DpllSolver::new();
    let err = session
        .add_clause(&mut fixture.factory, &IntegerClause::new(), &mut solver)
        .unwrap_err();
    assert!(matches!(err, CspError::InvalidState(_)));
    assert!(matches!(
        session.decode(&Model::default()),
        Err(CspError::InvalidState(_))
    ));
    assert!(session.csp().is_none());
}

#[test]
fn test_propagation_report() {
    let mut fixture = fixtures::scenario_c();
    let mut session = EncodingSession::new(&EncoderConfig::new()).unwrap();
    let mut solver = DpllSolver::new();
    session.encode(&mut fixture.factory, &fixture.csp, &mut solver).unwrap();
    let report = session.propagation().unwrap();
    assert!(report.narrowed >= 2);
    assert!(!report.unsat);
    assert!(session.csp().unwrap().is_propagated());
    assert!(session.stats().clauses > 0);

    let mut fixture = fixtures::scenario_c();
    let mut session =
        EncodingSession::new(&EncoderConfig::new().with_propagation(false)).unwrap();
    session.encode(&mut fixture.factory, &fixture.csp, &mut DpllSolver::new()).unwrap();
    assert!(session.propagation().is_none());
    assert!(!session.csp().unwrap().is_propagated());
}

#[test]
fn test_already_propagated_input_is_rejected() {
    let mut fixture = fixtures::scenario_c();
    let (propagated, _) = propagate(&mut fixture.factory, &fixture.csp).unwrap();
    let mut session = EncodingSession::new(&EncoderConfig::new()).unwrap();
    let err = session
        .encode(&mut fixture.factory, &propagated, &mut DpllSolver::new())
        .unwrap_err();
    assert_eq!(err, CspError::AlreadyPropagated);
}

#[test]
fn test_wipeout_gives_no_model() {
    let mut factory = CspFactory::new();
    let x = factory.int_var_range("x", 0, 3).unwrap();
    let y = factory.int_var_range("y", 0, 3).unwrap();
    let (tx, ty) = (factory.variable(&x), factory.variable(&y));
    let sum = factory.add(tx, ty);
    let seven = factory.constant(7);
    let formula = factory.ge(sum, seven);
    let mut builder = CspBuilder::new();
    builder.add_int_var(&x).add_int_var(&y);
    builder.add_formula(&mut factory, &formula).unwrap();
    let csp = builder.build();

    for config in configs() {
        let mut session = EncodingSession::new(&config).unwrap();
        let mut solver = DpllSolver::new();
        session.encode(&mut factory, &csp, &mut solver).unwrap();
        assert!(solver.solve().is_none(), "{}", session.algorithm());
        assert!(session.propagation().unwrap().unsat);
    }
}

#[test]
fn test_enumeration_matches_brute_force() {
    for config in configs() {
        for build in [fixtures::scenario_b, fixtures::scenario_c, fixtures::mixed] {
            let fixture = build();
            let expected = brute_force_solutions(&fixture.csp);
            assert_eq!(enumerate(&config, fixture), expected, "{:?}", config.algorithm);
        }
    }
}

#[test]
fn test_enumeration_without_propagation() {
    let config = EncoderConfig::new()
        .with_propagation(false)
        .with_algorithm(AlgorithmConfig::compact_order(3));
    let fixture = fixtures::product();
    let expected = brute_force_solutions(&fixture.csp);
    assert_eq!(enumerate(&config, fixture), expected);
}

#[test]
fn test_factory_options_follow_limits() {
    let config = EncoderConfig {
        limits: LimitsConfig {
            max_set_size: 16,
            split_threshold: 64,
            all_different_bounds: false,
        },
        ..EncoderConfig::new()
    };
    let options = factory_options(&config);
    assert_eq!(options.max_set_size, 16);
    assert!(!options.all_different_bounds);
}
