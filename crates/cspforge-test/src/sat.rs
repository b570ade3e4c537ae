//! A small reference SAT solver.
//!
//! `DpllSolver` implements [`SatBackend`] so encoders can write straight
//! into it. Search is DPLL with two watched literals, first-UIP clause
//! learning and activity-ordered decisions. No restarts and no clause
//! deletion: fine for the small problems the test suites build.
//!
//! # Example
//!
//! ```
//! use cspforge_core::SatBackend;
//! use cspforge_test::sat::DpllSolver;
//!
//! let mut solver = DpllSolver::new();
//! let p = solver.new_aux_var();
//! let q = solver.new_aux_var();
//! solver.add_clause(vec![p.positive(), q.positive()]);
//! solver.add_clause(vec![p.negative()]);
//!
//! let model = solver.solve().unwrap();
//! assert_eq!(model.is_true(&p), Some(false));
//! assert_eq!(model.is_true(&q), Some(true));
//!
//! solver.add_clause(vec![q.negative()]);
//! assert!(solver.solve().is_none());
//! ```

use std::collections::{BTreeSet, HashMap};

use cspforge_core::{BoolLit, BoolVar, Model, SatBackend};

/// Clause store and DPLL search over named propositional variables.
#[derive(Debug, Clone, Default)]
pub struct DpllSolver {
    vars: Vec<BoolVar>,
    index: HashMap<BoolVar, usize>,
    clauses: Vec<Vec<usize>>,
    has_empty: bool,
    fresh: usize,
}

impl DpllSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    pub fn clause_count(&self) -> usize {
        self.clauses.len() + usize::from(self.has_empty)
    }

    /// Registers `var` without constraining it.
    pub fn declare(&mut self, var: &BoolVar) -> usize {
        if let Some(&i) = self.index.get(var) {
            return i;
        }
        let i = self.vars.len();
        self.vars.push(var.clone());
        self.index.insert(var.clone(), i);
        i
    }

    fn code(&mut self, lit: &BoolLit) -> usize {
        2 * self.declare(lit.var()) + usize::from(!lit.is_positive())
    }

    /// Searches for a model of every clause added so far.
    pub fn solve(&self) -> Option<Model> {
        if self.has_empty {
            return None;
        }
        let mut search = Search::new(self.vars.len(), &self.clauses)?;
        let values = search.run()?;
        let mut positive = BTreeSet::new();
        let mut negative = BTreeSet::new();
        for (var, value) in self.vars.iter().zip(values) {
            if value {
                positive.insert(var.clone());
            } else {
                negative.insert(var.clone());
            }
        }
        Some(Model::new(positive, negative))
    }
}

impl SatBackend for DpllSolver {
    fn new_aux_var(&mut self) -> BoolVar {
        self.fresh += 1;
        let var = BoolVar::new(format!("@SAT{}", self.fresh));
        self.declare(&var);
        var
    }

    fn add_clause(&mut self, literals: Vec<BoolLit>) {
        let mut codes: Vec<usize> = literals.iter().map(|l| self.code(l)).collect();
        codes.sort_unstable();
        codes.dedup();
        if codes.windows(2).any(|w| w[0] ^ 1 == w[1]) {
            return;
        }
        if codes.is_empty() {
            self.has_empty = true;
        } else {
            self.clauses.push(codes);
        }
    }
}

struct Search {
    clauses: Vec<Vec<usize>>,
    watches: Vec<Vec<usize>>,
    assign: Vec<Option<bool>>,
    level: Vec<usize>,
    reason: Vec<Option<usize>>,
    activity: Vec<f64>,
    bump: f64,
    trail: Vec<usize>,
    trail_lim: Vec<usize>,
    head: usize,
}

impl Search {
    fn new(var_count: usize, clauses: &[Vec<usize>]) -> Option<Self> {
        let mut search = Search {
            clauses: Vec::new(),
            watches: vec![Vec::new(); 2 * var_count],
            assign: vec![None; var_count],
            level: vec![0; var_count],
            reason: vec![None; var_count],
            activity: vec![0.0; var_count],
            bump: 1.0,
            trail: Vec::new(),
            trail_lim: Vec::new(),
            head: 0,
        };
        for clause in clauses {
            if let [unit] = clause.as_slice() {
                if !search.enqueue(*unit, None) {
                    return None;
                }
            } else {
                search.attach(clause.clone());
            }
        }
        Some(search)
    }

    fn attach(&mut self, clause: Vec<usize>) -> usize {
        let ci = self.clauses.len();
        self.watches[clause[0]].push(ci);
        self.watches[clause[1]].push(ci);
        self.clauses.push(clause);
        ci
    }

    fn value(&self, lit: usize) -> Option<bool> {
        self.assign[lit / 2].map(|v| v != (lit % 2 == 1))
    }

    fn enqueue(&mut self, lit: usize, reason: Option<usize>) -> bool {
        match self.value(lit) {
            Some(v) => v,
            None => {
                let var = lit / 2;
                self.assign[var] = Some(lit % 2 == 0);
                self.level[var] = self.trail_lim.len();
                self.reason[var] = reason;
                self.trail.push(lit);
                true
            }
        }
    }

    /// Unit propagation; the index of a falsified clause on conflict.
    fn propagate(&mut self) -> Option<usize> {
        while self.head < self.trail.len() {
            let false_lit = self.trail[self.head] ^ 1;
            self.head += 1;
            let watching = std::mem::take(&mut self.watches[false_lit]);
            let mut kept = Vec::with_capacity(watching.len());
            let mut conflict = None;
            for ci in watching {
                if conflict.is_some() {
                    kept.push(ci);
                    continue;
                }
                if self.clauses[ci][0] == false_lit {
                    self.clauses[ci].swap(0, 1);
                }
                let first = self.clauses[ci][0];
                if self.value(first) == Some(true) {
                    kept.push(ci);
                    continue;
                }
                let replacement =
                    (2..self.clauses[ci].len()).find(|&k| self.value(self.clauses[ci][k]) != Some(false));
                if let Some(k) = replacement {
                    self.clauses[ci].swap(1, k);
                    let watch = self.clauses[ci][1];
                    self.watches[watch].push(ci);
                    continue;
                }
                kept.push(ci);
                if !self.enqueue(first, Some(ci)) {
                    conflict = Some(ci);
                }
            }
            self.watches[false_lit] = kept;
            if conflict.is_some() {
                return conflict;
            }
        }
        None
    }

    /// First-UIP learnt clause for `conflict` and the level to jump back to.
    /// The asserting literal comes first.
    fn analyze(&mut self, conflict: usize) -> (Vec<usize>, usize) {
        let current = self.trail_lim.len();
        let mut seen = vec![false; self.assign.len()];
        let mut learnt = vec![0];
        let mut pending = 0usize;
        let mut clause = conflict;
        let mut resolved: Option<usize> = None;
        let mut index = self.trail.len();
        loop {
            for k in 0..self.clauses[clause].len() {
                let q = self.clauses[clause][k];
                if Some(q) == resolved {
                    continue;
                }
                let var = q / 2;
                if seen[var] || self.level[var] == 0 {
                    continue;
                }
                seen[var] = true;
                self.activity[var] += self.bump;
                if self.level[var] == current {
                    pending += 1;
                } else {
                    learnt.push(q);
                }
            }
            loop {
                index -= 1;
                if seen[self.trail[index] / 2] {
                    break;
                }
            }
            let lit = self.trail[index];
            seen[lit / 2] = false;
            pending -= 1;
            match self.reason[lit / 2] {
                Some(r) if pending > 0 => {
                    clause = r;
                    resolved = Some(lit);
                }
                _ => {
                    learnt[0] = lit ^ 1;
                    break;
                }
            }
        }
        let mut back = 0;
        for k in 1..learnt.len() {
            let lvl = self.level[learnt[k] / 2];
            if lvl > back {
                back = lvl;
                learnt.swap(1, k);
            }
        }
        (learnt, back)
    }

    fn backtrack(&mut self, level: usize) {
        while self.trail_lim.len() > level {
            let Some(lim) = self.trail_lim.pop() else { break };
            for lit in self.trail.drain(lim..) {
                self.assign[lit / 2] = None;
                self.reason[lit / 2] = None;
            }
        }
        self.head = self.trail.len();
    }

    fn decay(&mut self) {
        self.bump *= 1.05;
        if self.bump > 1e100 {
            for a in &mut self.activity {
                *a *= 1e-100;
            }
            self.bump *= 1e-100;
        }
    }

    /// Unassigned variable with the highest activity.
    fn pick(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (var, value) in self.assign.iter().enumerate() {
            if value.is_none() && best.map_or(true, |b| self.activity[var] > self.activity[b]) {
                best = Some(var);
            }
        }
        best
    }

    fn run(&mut self) -> Option<Vec<bool>> {
        loop {
            if let Some(conflict) = self.propagate() {
                if self.trail_lim.is_empty() {
                    return None;
                }
                let (learnt, level) = self.analyze(conflict);
                self.backtrack(level);
                let asserting = learnt[0];
                if learnt.len() == 1 {
                    self.enqueue(asserting, None);
                } else {
                    let ci = self.attach(learnt);
                    self.enqueue(asserting, Some(ci));
                }
                self.decay();
                continue;
            }
            match self.pick() {
                None => return Some(self.assign.iter().map(|v| *v == Some(true)).collect()),
                Some(var) => {
                    self.trail_lim.push(self.trail.len());
                    self.enqueue(2 * var + 1, None);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(solver: &mut DpllSolver, n: usize) -> Vec<BoolVar> {
        (0..n).map(|_| solver.new_aux_var()).collect()
    }

    #[test]
    fn test_empty_problem_is_sat() {
        let solver = DpllSolver::new();
        assert!(solver.solve().is_some());
    }

    #[test]
    fn test_empty_clause_is_unsat() {
        let mut solver = DpllSolver::new();
        solver.add_clause(vec![]);
        assert!(solver.solve().is_none());
    }

    #[test]
    fn test_tautology_ignored() {
        let mut solver = DpllSolver::new();
        let v = vars(&mut solver, 1);
        solver.add_clause(vec![v[0].positive(), v[0].negative()]);
        assert_eq!(solver.clause_count(), 0);
    }

    #[test]
    fn test_pigeonhole_three_into_two_is_unsat() {
        let mut solver = DpllSolver::new();
        // p[i][j]: pigeon i sits in hole j
        let p: Vec<Vec<BoolVar>> = (0..3).map(|_| vars(&mut solver, 2)).collect();
        for row in &p {
            solver.add_clause(row.iter().map(BoolVar::positive).collect());
        }
        for j in 0..2 {
            for a in 0..3 {
                for b in (a + 1)..3 {
                    solver.add_clause(vec![p[a][j].negative(), p[b][j].negative()]);
                }
            }
        }
        assert!(solver.solve().is_none());
    }

    #[test]
    fn test_model_satisfies_clauses() {
        let mut solver = DpllSolver::new();
        let v = vars(&mut solver, 4);
        let clauses = vec![
            vec![v[0].positive(), v[1].positive()],
            vec![v[0].negative(), v[2].positive()],
            vec![v[2].negative(), v[3].negative()],
            vec![v[1].negative(), v[3].positive()],
        ];
        for c in &clauses {
            solver.add_clause(c.clone());
        }
        let model = solver.solve().unwrap();
        for c in &clauses {
            assert!(c
                .iter()
                .any(|l| model.is_true(l.var()) == Some(l.is_positive())));
        }
    }
}
