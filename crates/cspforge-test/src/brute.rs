//! Brute-force reference semantics of a [`Csp`].
//!
//! Enumerates the visible variables and asks whether some assignment of
//! the internal variables satisfies every clause. Exponential, so only for
//! problems with a handful of small domains.

use std::collections::{BTreeMap, BTreeSet};

use cspforge_core::{BoolVar, Csp, CspAssignment, IntVar, IntegerClause};

/// Values of the visible variables by name; booleans as 0/1.
pub type Projection = BTreeMap<String, i64>;

/// Projects a decoded assignment onto the visible variables of `csp`.
///
/// Variables the assignment does not mention are left out.
pub fn project(assignment: &CspAssignment, csp: &Csp) -> Projection {
    let mut projection = Projection::new();
    for v in &csp.int_vars {
        if let Some(value) = assignment.int_value(v) {
            projection.insert(v.name().to_string(), value);
        }
    }
    for b in &csp.bool_vars {
        if let Some(value) = assignment.bool_value(b) {
            projection.insert(b.name().to_string(), i64::from(value));
        }
    }
    projection
}

#[derive(Clone)]
enum Slot {
    Int(IntVar),
    Bool(BoolVar),
}

#[derive(Default)]
struct Partial {
    ints: BTreeMap<IntVar, i64>,
    bools: BTreeMap<BoolVar, bool>,
}

impl Partial {
    fn clause_value(&self, clause: &IntegerClause) -> Option<bool> {
        let mut unknown = false;
        for lit in clause.bool_lits() {
            match self.bools.get(lit.var()) {
                Some(v) if *v == lit.is_positive() => return Some(true),
                Some(_) => {}
                None => unknown = true,
            }
        }
        for lit in clause.arith_lits() {
            match lit.evaluate(&self.ints) {
                Some(true) => return Some(true),
                Some(false) => {}
                None => unknown = true,
            }
        }
        if unknown {
            None
        } else {
            Some(false)
        }
    }

    fn consistent(&self, csp: &Csp) -> bool {
        csp.clauses.iter().all(|c| self.clause_value(c) != Some(false))
    }

    fn unset(&mut self, slot: &Slot) {
        match slot {
            Slot::Int(v) => {
                self.ints.remove(v);
            }
            Slot::Bool(b) => {
                self.bools.remove(b);
            }
        }
    }

    fn choices(slot: &Slot) -> Vec<i64> {
        match slot {
            Slot::Int(v) => v.domain().values().collect(),
            Slot::Bool(_) => vec![0, 1],
        }
    }

    fn set(&mut self, slot: &Slot, value: i64) {
        match slot {
            Slot::Int(v) => {
                self.ints.insert(v.clone(), value);
            }
            Slot::Bool(b) => {
                self.bools.insert(b.clone(), value != 0);
            }
        }
    }

    fn projection(&self, visible: &[Slot]) -> Projection {
        visible
            .iter()
            .filter_map(|slot| match slot {
                Slot::Int(v) => self.ints.get(v).map(|x| (v.name().to_string(), *x)),
                Slot::Bool(b) => self.bools.get(b).map(|x| (b.name().to_string(), i64::from(*x))),
            })
            .collect()
    }
}

/// Every projection onto the visible variables of a solution of `csp`.
pub fn brute_force_solutions(csp: &Csp) -> BTreeSet<Projection> {
    let visible: Vec<Slot> = csp
        .int_vars
        .iter()
        .cloned()
        .map(Slot::Int)
        .chain(csp.bool_vars.iter().cloned().map(Slot::Bool))
        .collect();
    let internal: Vec<Slot> = csp
        .internal_int_vars
        .iter()
        .cloned()
        .map(Slot::Int)
        .chain(csp.internal_bool_vars.iter().cloned().map(Slot::Bool))
        .collect();
    let mut partial = Partial::default();
    let mut out = BTreeSet::new();
    enumerate(csp, &visible, 0, &internal, &mut partial, &mut out);
    out
}

fn enumerate(
    csp: &Csp,
    visible: &[Slot],
    i: usize,
    internal: &[Slot],
    partial: &mut Partial,
    out: &mut BTreeSet<Projection>,
) {
    if i == visible.len() {
        if extends(csp, internal, 0, partial) {
            out.insert(partial.projection(visible));
        }
        return;
    }
    let slot = &visible[i];
    for value in Partial::choices(slot) {
        partial.set(slot, value);
        if partial.consistent(csp) {
            enumerate(csp, visible, i + 1, internal, partial, out);
        }
    }
    partial.unset(slot);
}

fn extends(csp: &Csp, internal: &[Slot], i: usize, partial: &mut Partial) -> bool {
    if i == internal.len() {
        return csp.clauses.iter().all(|c| partial.clause_value(c) == Some(true));
    }
    let slot = &internal[i];
    for value in Partial::choices(slot) {
        partial.set(slot, value);
        if partial.consistent(csp) && extends(csp, internal, i + 1, partial) {
            partial.unset(slot);
            return true;
        }
    }
    partial.unset(slot);
    false
}
