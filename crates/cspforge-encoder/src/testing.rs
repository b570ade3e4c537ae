//! Solution enumeration through an encoder, for the unit tests.

use std::collections::BTreeSet;

use cspforge_core::{
    BoolLit, CspFactory, IntegerClause, LinearExpression, LinearLiteral, Model, SatBackend,
};
use cspforge_test::{DpllSolver, Fixture, Projection};

use crate::emit::ClauseSink;
use crate::stats::EncodingStats;
use crate::traits::ClauseEncoder;

/// Encodes `fixture` and collects every decoded solution, blocking each one
/// with a clause encoded by the same encoder.
pub(crate) fn encoded_solutions(
    encoder: &mut dyn ClauseEncoder,
    fixture: &mut Fixture,
) -> (BTreeSet<Projection>, EncodingStats) {
    let mut solver = DpllSolver::new();
    for b in &fixture.csp.bool_vars {
        solver.declare(b);
    }
    let mut stats = EncodingStats::default();
    let clauses: Vec<IntegerClause> = fixture.csp.clauses.iter().cloned().collect();
    encode(encoder, &mut fixture.factory, &clauses, &mut solver, &mut stats);

    let mut solutions = BTreeSet::new();
    while let Some(model) = solver.solve() {
        let (projection, block) = decode(encoder, fixture, &model);
        assert!(
            solutions.insert(projection),
            "solution repeated after blocking"
        );
        encode(encoder, &mut fixture.factory, &[block], &mut solver, &mut stats);
    }
    (solutions, stats)
}

fn encode(
    encoder: &mut dyn ClauseEncoder,
    factory: &mut CspFactory,
    clauses: &[IntegerClause],
    solver: &mut DpllSolver,
    stats: &mut EncodingStats,
) {
    let mut sink = ClauseSink::new(solver, stats);
    encoder
        .encode_clauses(factory, clauses, &mut sink)
        .expect("encoding succeeds");
}

fn decode(
    encoder: &dyn ClauseEncoder,
    fixture: &Fixture,
    model: &Model,
) -> (Projection, IntegerClause) {
    let mut projection = Projection::new();
    let mut block = IntegerClause::new();
    for v in &fixture.csp.int_vars {
        let current = fixture.csp.resolve(v);
        let value = encoder.decode_int(current, model);
        assert!(current.domain().contains(value), "{} decoded outside its domain", v);
        projection.insert(v.name().to_string(), value);
        block.push_arith(LinearLiteral::ne(
            LinearExpression::from_var(current).add_constant(-value),
        ));
    }
    for b in &fixture.csp.bool_vars {
        let value = model.is_true(b).unwrap_or(false);
        projection.insert(b.name().to_string(), i64::from(value));
        block.push_bool(BoolLit::new(b.clone(), !value));
    }
    (projection, block)
}
