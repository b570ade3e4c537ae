//! Reads an assignment of the visible variables back from a SAT model.

use cspforge_core::{Csp, CspAssignment, Model};
use tracing::trace;

use crate::traits::ClauseEncoder;

/// Decodes every visible variable of `csp` under `model`.
///
/// Integer variables replaced during propagation are read through their
/// substitute. Booleans the model does not mention are left out of the
/// assignment.
pub fn decode_assignment(encoder: &dyn ClauseEncoder, csp: &Csp, model: &Model) -> CspAssignment {
    let mut assignment = CspAssignment::new();
    for var in &csp.int_vars {
        let value = encoder.decode_int(csp.resolve(var), model);
        trace!(event = "decode_int", var = %var, value);
        assignment.set_int(var, value);
    }
    for var in &csp.bool_vars {
        if let Some(value) = model.is_true(var) {
            assignment.set_bool(var, value);
        }
    }
    assignment
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use cspforge_core::{CspBuilder, CspFactory, IntegerClause, SatBackend};
    use cspforge_test::{fixtures, DpllSolver};

    use super::*;
    use crate::emit::ClauseSink;
    use crate::order::OrderEncoder;
    use crate::propagate::propagate;
    use crate::stats::EncodingStats;

    fn solve(encoder: &mut OrderEncoder, factory: &mut CspFactory, csp: &Csp) -> Model {
        let mut solver = DpllSolver::new();
        let mut stats = EncodingStats::default();
        let clauses: Vec<IntegerClause> = csp.clauses.iter().cloned().collect();
        let mut sink = ClauseSink::new(&mut solver, &mut stats);
        encoder.encode_clauses(factory, &clauses, &mut sink).unwrap();
        solver.solve().unwrap()
    }

    #[test]
    fn test_scenario_a_values() {
        let mut fixture = fixtures::scenario_a();
        let mut encoder = OrderEncoder::new(1024);
        let model = solve(&mut encoder, &mut fixture.factory, &fixture.csp);
        let assignment = decode_assignment(&encoder, &fixture.csp, &model);

        assert_eq!(assignment.int_value(fixture.var("a")), Some(2));
        let b = assignment.int_value(fixture.var("b")).unwrap();
        assert!((3..=5).contains(&b));
    }

    #[test]
    fn test_unconstrained_variable_is_maximum() {
        let mut factory = CspFactory::new();
        let x = factory.int_var_range("x", -4, 9).unwrap();
        let mut builder = CspBuilder::new();
        builder.add_int_var(&x);
        let csp = builder.build();

        let encoder = OrderEncoder::new(1024);
        let assignment = decode_assignment(&encoder, &csp, &Model::default());
        assert_eq!(assignment.int_value(&x), Some(9));
    }

    #[test]
    fn test_absent_booleans_are_omitted() {
        let mut factory = CspFactory::new();
        let p = factory.bool_var("p").unwrap();
        let q = factory.bool_var("q").unwrap();
        let mut builder = CspBuilder::new();
        builder.add_bool_var(&p).add_bool_var(&q);
        let csp = builder.build();

        let model = Model::new(BTreeSet::from([p.clone()]), BTreeSet::new());
        let assignment = decode_assignment(&OrderEncoder::new(1024), &csp, &model);
        assert_eq!(assignment.bool_value(&p), Some(true));
        assert_eq!(assignment.bool_value(&q), None);

        let model = Model::new(BTreeSet::new(), BTreeSet::from([q.clone()]));
        let assignment = decode_assignment(&OrderEncoder::new(1024), &csp, &model);
        assert_eq!(assignment.bool_value(&q), Some(false));
        assert!(assignment.positive().is_empty());
    }

    #[test]
    fn test_follows_substitution() {
        let mut fixture = fixtures::scenario_c();
        let (propagated, _) = propagate(&mut fixture.factory, &fixture.csp).unwrap();
        assert!(propagated.is_propagated());

        let mut encoder = OrderEncoder::new(1024);
        let model = solve(&mut encoder, &mut fixture.factory, &propagated);
        let assignment = decode_assignment(&encoder, &propagated, &model);

        assert_eq!(assignment.int_values().len(), 3);
        for clause in &fixture.csp.clauses {
            assert_eq!(assignment.satisfies(clause), Some(true), "{}", clause);
        }
        let b = assignment.int_value(fixture.var("b")).unwrap();
        assert!((10..=11).contains(&b));
    }

    #[test]
    fn test_fresh_solver_variables_are_not_decoded() {
        let mut solver = DpllSolver::new();
        let aux = solver.new_aux_var();
        let model = Model::new(BTreeSet::from([aux]), BTreeSet::new());
        let assignment = decode_assignment(&OrderEncoder::new(1024), &Csp::new(), &model);
        assert_eq!(assignment, CspAssignment::new());
    }
}
