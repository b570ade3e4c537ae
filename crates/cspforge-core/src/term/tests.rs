//! Tests for term canonicalization and linear expressions.

use std::collections::BTreeMap;

use super::*;
use crate::domain::IntegerDomain;
use crate::error::CspError;

fn setup() -> (CspFactory, TermId, TermId) {
    let mut factory = CspFactory::new();
    let a = factory.int_var_range("a", 0, 3).unwrap();
    let b = factory.int_var_range("b", -2, 2).unwrap();
    let a = factory.variable(&a);
    let b = factory.variable(&b);
    (factory, a, b)
}

#[test]
fn test_add_is_order_insensitive() {
    let (mut f, a, b) = setup();
    assert_eq!(f.add(a, b), f.add(b, a));
    let c = f.constant(5);
    let left = f.add(a, b);
    let left = f.add(left, c);
    let right = f.add(c, b);
    let right = f.add(a, right);
    assert_eq!(left, right);
}

#[test]
fn test_add_same_term_is_scalar_multiple() {
    let (mut f, a, _) = setup();
    let twice = f.add(a, a);
    assert_eq!(twice, f.mul(2, a));
    assert_eq!(f.kind(twice), &TermKind::Mul(2, a));
}

#[test]
fn test_sub_rules() {
    let (mut f, a, b) = setup();
    let zero = f.constant(0);
    assert_eq!(f.sub(a, a), zero);
    assert_eq!(f.sub(a, zero), a);
    assert_eq!(f.sub(zero, a), f.negate(a));
    assert_ne!(f.sub(a, b), f.sub(b, a));
}

#[test]
fn test_mul_and_negate_rules() {
    let (mut f, a, b) = setup();
    assert_eq!(f.mul(0, a), f.constant(0));
    assert_eq!(f.mul(1, a), a);
    let neg = f.negate(a);
    assert_eq!(f.negate(neg), a);
    let three_a = f.mul(3, a);
    assert_eq!(f.mul(2, three_a), f.mul(6, a));

    let sum = f.add(a, b);
    let distributed = f.mul(2, sum);
    let two_a = f.mul(2, a);
    let two_b = f.mul(2, b);
    assert_eq!(distributed, f.add(two_a, two_b));
}

#[test]
fn test_add_cancels_to_constant() {
    let (mut f, a, _) = setup();
    let neg = f.negate(a);
    let sum = f.add(a, neg);
    assert_eq!(f.as_constant(sum), Some(0));
    let seven = f.constant(7);
    let three = f.constant(3);
    assert_eq!(f.add(seven, three), f.constant(10));
}

#[test]
fn test_div_mod_by_zero_rejected() {
    let (mut f, a, _) = setup();
    assert!(matches!(f.div(a, 0), Err(CspError::InvalidArgument(_))));
    assert!(matches!(f.modulo(a, 0), Err(CspError::InvalidArgument(_))));
    assert_eq!(f.div(a, 1).unwrap(), a);
    assert_eq!(f.modulo(a, -1).unwrap(), f.constant(0));
    let c = f.constant(-7);
    assert_eq!(f.div(c, 2).unwrap(), f.constant(-4));
    assert_eq!(f.modulo(c, 2).unwrap(), f.constant(1));
}

#[test]
fn test_term_domains() {
    let (mut f, a, b) = setup();
    let sum = f.add(a, b);
    assert_eq!(f.domain_of(sum), &IntegerDomain::range(-2, 5));
    let abs = f.abs(b);
    assert_eq!(f.domain_of(abs), &IntegerDomain::range(0, 2));
    let m = f.min(a, b);
    assert_eq!(f.domain_of(m), &IntegerDomain::range(-2, 2));
    let d = f.div(a, 2).unwrap();
    assert_eq!(f.domain_of(d), &IntegerDomain::range(0, 1));
    let p = f.product(a, b);
    assert_eq!(f.domain_of(p), &IntegerDomain::range(-6, 6));
}

#[test]
fn test_product_with_constant_is_scalar() {
    let (mut f, a, b) = setup();
    let three = f.constant(3);
    assert_eq!(f.product(three, a), f.mul(3, a));
    assert_eq!(f.product(a, b), f.product(b, a));
}

#[test]
fn test_variable_declaration_errors() {
    let mut f = CspFactory::new();
    f.int_var_range("x", 0, 1).unwrap();
    assert_eq!(
        f.int_var_range("x", 0, 1).unwrap_err(),
        CspError::DuplicateVariable("x".to_string())
    );
    assert_eq!(
        f.int_var_range("y", 1, 0).unwrap_err(),
        CspError::EmptyDomain("y".to_string())
    );
    assert!(matches!(f.bool_var("@p"), Err(CspError::InvalidArgument(_))));
    assert!(matches!(f.bool_var("x"), Err(CspError::DuplicateVariable(_))));
}

#[test]
fn test_aux_vars_are_marked() {
    let mut f = CspFactory::new();
    let v = f.aux_int_var(IntegerDomain::range(0, 4));
    assert!(v.is_aux());
    assert!(v.name().starts_with('@'));
    let b = f.aux_bool_var();
    assert!(b.is_aux());
}

#[test]
fn test_evaluate_term() {
    let mut f = CspFactory::new();
    let x = f.int_var_range("x", -5, 5).unwrap();
    let xt = f.variable(&x);
    let m = f.modulo(xt, 3).unwrap();
    let q = f.div(xt, 3).unwrap();
    let mut values = BTreeMap::new();
    values.insert(x.clone(), -4);
    assert_eq!(f.evaluate_term(m, &values), Some(2));
    assert_eq!(f.evaluate_term(q, &values), Some(-2));
}

#[test]
fn test_display() {
    let (mut f, a, b) = setup();
    let d = f.sub(a, b);
    assert_eq!(f.display(d).to_string(), "(a - b)");
    let abs = f.abs(b);
    assert_eq!(f.display(abs).to_string(), "abs(b)");
}

#[test]
fn test_linear_expression_ops() {
    let mut f = CspFactory::new();
    let x = f.int_var_range("x", 0, 3).unwrap();
    let y = f.int_var_range("y", 1, 2).unwrap();
    let e = LinearExpression::from_term(&x, 2).add(&LinearExpression::from_term(&y, -4));
    assert_eq!(e.gcd(), 2);
    assert_eq!(e.bounds(), (-8, 2));
    assert_eq!(e.to_string(), "2*x - 4*y");

    let cancelled = e.add(&LinearExpression::from_term(&x, -2));
    assert_eq!(cancelled.len(), 1);
    assert_eq!(cancelled.coef(&x), 0);

    let shifted = e.add_constant(-3);
    assert_eq!(shifted.to_string(), "2*x - 4*y - 3");

    let mut values = BTreeMap::new();
    values.insert(x.clone(), 3);
    values.insert(y.clone(), 1);
    assert_eq!(e.evaluate(&values), Some(2));
}

#[test]
fn test_linear_expression_substitute_merges() {
    let mut f = CspFactory::new();
    let x = f.int_var_range("x", 0, 3).unwrap();
    let y = f.int_var_range("y", 0, 3).unwrap();
    let e = LinearExpression::from_var(&x).add(&LinearExpression::from_term(&y, 2));
    let mut substitution = BTreeMap::new();
    substitution.insert(y.clone(), x.clone());
    let s = e.substitute(&substitution);
    assert_eq!(s.coef(&x), 3);
    assert_eq!(s.len(), 1);
}

#[test]
fn test_derived_domains_follow_factory_cap() {
    let options = FactoryOptions {
        max_set_size: 4,
        all_different_bounds: true,
    };
    let mut f = CspFactory::with_options(options);
    let x = f.int_var_range("x", 0, 20).unwrap();
    let y = f.int_var_values("y", [0, 5, 10]).unwrap();
    let z = f.int_var_values("z", [0, 100]).unwrap();
    let w = f.int_var_values("w", [1, 3]).unwrap();
    let (x, y, z, w) = (f.variable(&x), f.variable(&y), f.variable(&z), f.variable(&w));

    let t = f.mul(3, x);
    assert_eq!(f.domain_of(t), &IntegerDomain::range(0, 60));
    let t = f.add(y, z);
    assert_eq!(f.domain_of(t), &IntegerDomain::range(0, 110));
    let t = f.product(y, w);
    assert_eq!(f.domain_of(t), &IntegerDomain::range(0, 30));
    let t = f.product(y, z);
    assert_eq!(f.domain_of(t), &IntegerDomain::from_values([0, 500, 1000]));

    // the default cap keeps the same sum sparse
    let mut f = CspFactory::new();
    let y = f.int_var_values("y", [0, 5, 10]).unwrap();
    let z = f.int_var_values("z", [0, 100]).unwrap();
    let (y, z) = (f.variable(&y), f.variable(&z));
    let t = f.add(y, z);
    assert_eq!(f.domain_of(t).size(), 6);
    assert!(!f.domain_of(t).is_contiguous());
}

#[test]
fn test_scaling_past_i64_is_not_folded() {
    let mut f = CspFactory::new();
    let x = f.int_var_range("x", 0, 3).unwrap();
    let tx = f.variable(&x);
    let big = f.mul(i64::MAX, tx);
    let t = f.mul(2, big);
    assert_eq!(f.kind(t), &TermKind::Mul(2, big));

    let max = f.constant(i64::MAX);
    let c = f.mul(2, max);
    assert_eq!(f.kind(c), &TermKind::Mul(2, max));
    assert_eq!(f.evaluate_term(c, &BTreeMap::new()), None);

    let values = BTreeMap::from([(x.clone(), 1)]);
    assert_eq!(f.evaluate_term(big, &values), Some(i64::MAX));
    assert_eq!(f.evaluate_term(t, &values), None);
    let values = BTreeMap::from([(x, 0)]);
    assert_eq!(f.evaluate_term(t, &values), Some(0));
}
