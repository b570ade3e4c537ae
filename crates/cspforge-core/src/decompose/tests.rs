//! Tests for formula decomposition.
//!
//! Most checks compare a decomposition against the formula itself by brute
//! force: for every assignment of the user variables, the formula holds iff
//! some assignment of the auxiliaries satisfies every clause.

use std::collections::{BTreeMap, BTreeSet};

use super::*;
use crate::assignment::CspAssignment;
use crate::error::CspError;
use crate::literal::ArithmeticLiteral;
use crate::term::{LinearExpression, TermId};

fn assignments(vars: &[IntVar]) -> Vec<BTreeMap<IntVar, i64>> {
    let mut result = vec![BTreeMap::new()];
    for v in vars {
        let mut next = Vec::new();
        for partial in &result {
            for value in v.domain().values() {
                let mut extended = partial.clone();
                extended.insert(v.clone(), value);
                next.push(extended);
            }
        }
        result = next;
    }
    result
}

fn to_assignment(values: &BTreeMap<IntVar, i64>) -> CspAssignment {
    let mut assignment = CspAssignment::new();
    for (v, x) in values {
        assignment.set_int(v, *x);
    }
    assignment
}

fn assert_equivalent(factory: &mut CspFactory, formula: &Formula, user: &[IntVar]) {
    let d = factory.decompose(formula).unwrap();
    let user_set: BTreeSet<IntVar> = user.iter().cloned().collect();
    let aux: Vec<IntVar> = d
        .clauses
        .iter()
        .flat_map(|c| c.int_vars())
        .chain(d.int_vars.iter().cloned())
        .filter(|v| !user_set.contains(v))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let aux_assignments = assignments(&aux);
    for values in assignments(user) {
        let expected = factory
            .evaluate(formula, &to_assignment(&values))
            .unwrap()
            .unwrap();
        let actual = aux_assignments.iter().any(|aux_values| {
            let mut all = values.clone();
            all.extend(aux_values.iter().map(|(v, x)| (v.clone(), *x)));
            let assignment = to_assignment(&all);
            d.clauses
                .iter()
                .all(|c| assignment.satisfies(c) == Some(true))
        });
        assert_eq!(expected, actual, "mismatch at {:?}", values);
    }
}

fn setup(lb: i64, ub: i64) -> (CspFactory, IntVar, IntVar, TermId, TermId) {
    let mut factory = CspFactory::new();
    let x = factory.int_var_range("x", lb, ub).unwrap();
    let y = factory.int_var_range("y", lb, ub).unwrap();
    let xt = factory.variable(&x);
    let yt = factory.variable(&y);
    (factory, x, y, xt, yt)
}

#[test]
fn test_constants() {
    let mut f = CspFactory::new();
    let t = f.decompose(&Formula::Constant(true)).unwrap();
    assert!(t.clauses.is_empty());
    let fls = f.decompose(&Formula::Constant(false)).unwrap();
    assert_eq!(fls.clauses, BTreeSet::from([IntegerClause::new()]));
}

#[test]
fn test_and_is_union() {
    let (mut f, _, _, x, y) = setup(0, 3);
    let two = f.constant(2);
    let p = f.le(x, y);
    let q = f.ne(x, two);
    let dp = f.decompose(&p).unwrap();
    let dq = f.decompose(&q).unwrap();
    let dand = f.decompose(&Formula::and([p, q])).unwrap();
    let union: BTreeSet<IntegerClause> = dp.clauses.union(&dq.clauses).cloned().collect();
    assert_eq!(dand.clauses, union);
}

#[test]
fn test_double_negation() {
    let (mut f, _, _, x, y) = setup(0, 3);
    let p = f.lt(x, y);
    let direct = f.decompose(&p).unwrap();
    let doubled = f.decompose(&Formula::not(Formula::not(p))).unwrap();
    assert_eq!(direct, doubled);
}

#[test]
fn test_domain_short_circuit() {
    let (mut f, _, _, x, _) = setup(0, 5);
    let ten = f.constant(10);
    let le = f.le(x, ten);
    assert!(f.decompose(&le).unwrap().is_valid());
    let gt = f.gt(x, ten);
    assert!(f.decompose(&gt).unwrap().is_unsat());
}

#[test]
fn test_or_factorizes() {
    let (mut f, _, _, x, y) = setup(0, 3);
    let p = f.bool_var("p").unwrap();
    let eq = f.eq(x, y);
    let d = f
        .decompose(&Formula::or([Formula::lit(p.positive()), eq]))
        .unwrap();
    // x = y is two-sided, so it stays one literal and the OR is one clause
    assert_eq!(d.clauses.len(), 1);
    let clause = d.clauses.iter().next().unwrap();
    assert_eq!(clause.bool_lits().len(), 1);
    assert_eq!(clause.arith_lits().len(), 1);
    assert!(d.bool_vars.contains(&p));
}

#[test]
fn test_or_with_true_child_is_true() {
    let (mut f, _, _, x, _) = setup(0, 3);
    let five = f.constant(5);
    let always = f.le(x, five);
    let p = f.bool_var("p").unwrap();
    let d = f
        .decompose(&Formula::or([Formula::lit(p.positive()), always]))
        .unwrap();
    assert!(d.is_valid());
}

#[test]
fn test_implication_and_equivalence() {
    let (mut f, x, y, xt, yt) = setup(0, 2);
    let one = f.constant(1);
    let p = f.eq(xt, one);
    let q = f.lt(yt, xt);
    assert_equivalent(&mut f, &Formula::implies(p.clone(), q.clone()), &[x.clone(), y.clone()]);
    assert_equivalent(&mut f, &Formula::equiv(p, q), &[x, y]);
}

#[test]
fn test_normalized_rejects_implication() {
    let mut f = CspFactory::new();
    let formula = Formula::implies(Formula::Constant(true), Formula::Constant(false));
    assert!(matches!(
        f.decompose_normalized(&formula),
        Err(CspError::UnsupportedFormula(_))
    ));
    let nested = Formula::not(Formula::and([Formula::Constant(true)]));
    assert!(matches!(
        f.decompose_normalized(&nested),
        Err(CspError::UnsupportedFormula(_))
    ));
}

#[test]
fn test_abs_comparisons() {
    let (mut f, x, y, xt, yt) = setup(-2, 2);
    let diff = f.sub(xt, yt);
    let abs_diff = f.abs(diff);
    let one = f.constant(1);
    let abs_x = f.abs(xt);
    for formula in [
        f.le(abs_diff, one),
        f.gt(abs_diff, one),
        f.eq(abs_x, yt),
        f.ne(abs_x, yt),
        f.ge(yt, abs_x),
    ] {
        assert_equivalent(&mut f, &formula, &[x.clone(), y.clone()]);
    }
}

#[test]
fn test_abs_term_in_sum() {
    let (mut f, x, y, xt, yt) = setup(-2, 2);
    let abs_x = f.abs(xt);
    let sum = f.add(abs_x, yt);
    let three = f.constant(3);
    let formula = f.eq(sum, three);
    assert_equivalent(&mut f, &formula, &[x, y]);
}

#[test]
fn test_min_max() {
    let (mut f, x, y, xt, yt) = setup(0, 3);
    let m = f.min(xt, yt);
    let big = f.max(xt, yt);
    let one = f.constant(1);
    let sum = f.add(m, big);
    let four = f.constant(4);
    for formula in [f.eq(m, one), f.ge(big, one), f.eq(sum, four)] {
        assert_equivalent(&mut f, &formula, &[x.clone(), y.clone()]);
    }
}

#[test]
fn test_dominated_min_needs_no_aux() {
    let mut f = CspFactory::new();
    let x = f.int_var_range("x", 0, 2).unwrap();
    let y = f.int_var_range("y", 5, 7).unwrap();
    let (xt, yt) = (f.variable(&x), f.variable(&y));
    let m = f.min(xt, yt);
    let d = f.decompose_term(m).unwrap();
    assert_eq!(d.linear, LinearExpression::from_var(&x));
    assert!(d.side.int_vars.is_empty());
}

#[test]
fn test_div_mod() {
    let (mut f, x, y, xt, yt) = setup(-5, 5);
    let q = f.div(xt, 3).unwrap();
    let r = f.modulo(xt, 3).unwrap();
    let qn = f.div(xt, -2).unwrap();
    let formulas = [f.eq(q, yt), f.eq(r, yt), f.eq(qn, yt)];
    for formula in formulas {
        assert_equivalent(&mut f, &formula, &[x.clone(), y.clone()]);
    }
}

#[test]
fn test_div_and_mod_share_auxiliaries() {
    let (mut f, _, _, xt, _) = setup(-5, 5);
    let q = f.div(xt, 3).unwrap();
    let r = f.modulo(xt, 3).unwrap();
    let dq = f.decompose_term(q).unwrap();
    let dr = f.decompose_term(r).unwrap();
    assert_eq!(dq.side.clauses, dr.side.clauses);
    assert_eq!(dq.side.int_vars.len(), 2);
}

#[test]
fn test_product_signs() {
    let (mut f, x, y, xt, yt) = setup(-2, 2);
    let p = f.product(xt, yt);
    let zero = f.constant(0);
    let two = f.constant(2);
    let formulas = [
        f.eq(p, zero),
        f.ne(p, zero),
        f.le(p, zero),
        f.lt(p, zero),
        f.ge(p, zero),
        f.gt(p, zero),
        f.ge(zero, p),
        f.eq(p, two),
    ];
    for formula in formulas {
        assert_equivalent(&mut f, &formula, &[x.clone(), y.clone()]);
    }
}

#[test]
fn test_product_yields_product_literal() {
    let (mut f, _, _, xt, yt) = setup(0, 3);
    let p = f.product(xt, yt);
    let two = f.constant(2);
    let formula = f.eq(p, two);
    let d = f.decompose(&formula).unwrap();
    let has_product = d
        .clauses
        .iter()
        .flat_map(|c| c.arith_lits())
        .any(|l| matches!(l, ArithmeticLiteral::Product(_)));
    assert!(has_product);
}

#[test]
fn test_all_different_and_pigeonhole() {
    let mut f = CspFactory::new();
    let vars: Vec<IntVar> = ["a", "b", "c"]
        .iter()
        .map(|n| f.int_var_range(n, 0, 2).unwrap())
        .collect();
    let terms: Vec<TermId> = vars.iter().map(|v| f.variable(v)).collect();
    let alldiff = f.all_different(&terms);
    let pigeon = f.pigeonhole(&terms);
    assert_equivalent(&mut f, &alldiff, &vars);
    assert_equivalent(&mut f, &pigeon, &vars);
    assert_equivalent(&mut f, &Formula::not(alldiff.clone()), &vars);

    // pairwise != plus the two bound clauses
    let d = f.decompose(&alldiff).unwrap();
    assert_eq!(d.clauses.len(), 5);
}

#[test]
fn test_all_different_without_bounds() {
    let mut f = CspFactory::with_options(crate::term::FactoryOptions {
        all_different_bounds: false,
        ..Default::default()
    });
    let vars: Vec<IntVar> = ["a", "b", "c"]
        .iter()
        .map(|n| f.int_var_range(n, 0, 2).unwrap())
        .collect();
    let terms: Vec<TermId> = vars.iter().map(|v| f.variable(v)).collect();
    let alldiff = f.all_different(&terms);
    assert_eq!(f.decompose(&alldiff).unwrap().clauses.len(), 3);
}

#[test]
fn test_predicate_memoized() {
    let (mut f, _, _, xt, _) = setup(-3, 3);
    let abs = f.abs(xt);
    let two = f.constant(2);
    let formula = f.eq(abs, two);
    let first = f.decompose(&formula).unwrap();
    let second = f.decompose(&formula).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_foreign_predicate_rejected() {
    let mut f = CspFactory::new();
    let mut other = CspFactory::new();
    let x = other.int_var_range("x", 0, 1).unwrap();
    let xt = other.variable(&x);
    let formula = other.eq(xt, xt);
    assert!(matches!(
        f.decompose(&formula),
        Err(CspError::UnsupportedPredicate(_))
    ));
}
