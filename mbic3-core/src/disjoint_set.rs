/*!

`DisjointSet` (spec §4.4): union-find over `Term`s, used after a SAT check to group a state
variable with the concrete model value it was assigned. `add(solver, key, value)` unions `key`
and `value` directly into the same class; the representative a class resolves to is chosen by
`disjoint_set_rank` (spec §4 Supplemented Features): a Solver value-term always outranks a
non-value term, so `find(v)` for a state variable `v` resolves to the shared value (or to another
variable found congruent to it) rather than staying `v` itself. Between two non-value
representatives, the lower Term identity wins, so the choice is deterministic rather than
whichever was unioned first.

The rank comparator needs a `&S` to ask `is_value`, but only transiently per call — it is never
stored on the struct, so a `DisjointSet` never holds a live borrow of the solver across calls.

*/

use mbic3_abs::HashMap;

use crate::solver::SmtSolver;

pub struct DisjointSet<T> {
    parent: HashMap<T, T>,
    is_preferred: HashMap<T, bool>,
}

impl<T: Clone + Eq + std::hash::Hash + std::fmt::Debug> DisjointSet<T> {
    pub fn new() -> Self {
        DisjointSet {
            parent: HashMap::default(),
            is_preferred: HashMap::default(),
        }
    }

    /// Unions `key` and `value` into the same class (spec §4.4's `add`).
    pub fn add<S: SmtSolver<Term = T>>(&mut self, solver: &S, key: T, value: T) {
        self.ensure_singleton(solver, &key);
        self.ensure_singleton(solver, &value);
        self.union(key, value);
    }

    fn ensure_singleton<S: SmtSolver<Term = T>>(&mut self, solver: &S, t: &T) {
        if !self.parent.contains_key(t) {
            self.parent.insert(t.clone(), t.clone());
            self.is_preferred.insert(t.clone(), solver.is_value(t));
        }
    }

    fn union(&mut self, a: T, b: T) {
        let ra = self.find(&a);
        let rb = self.find(&b);
        if ra == rb {
            return;
        }
        let ra_preferred = *self.is_preferred.get(&ra).expect("representative always has a rank entry");
        let rb_preferred = *self.is_preferred.get(&rb).expect("representative always has a rank entry");

        let (winner, loser) = if rb_preferred && !ra_preferred {
            (rb, ra)
        } else if ra_preferred && !rb_preferred {
            (ra, rb)
        } else if !ra_preferred && !rb_preferred {
            // Among two non-value representatives, the lower Term identity wins. `Term` is only
            // required to be `Debug`, not `Ord`, so its formatted representation stands in for
            // identity here.
            if format!("{ra:?}") <= format!("{rb:?}") { (ra, rb) } else { (rb, ra) }
        } else {
            (ra, rb)
        };
        self.parent.insert(loser, winner);
    }

    pub fn find(&self, t: &T) -> T {
        let mut current = t.clone();
        loop {
            match self.parent.get(&current) {
                Some(p) if p != &current => current = p.clone(),
                _ => return current,
            }
        }
    }
}

impl<T: Clone + Eq + std::hash::Hash + std::fmt::Debug> Default for DisjointSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{Literal, Sort};
    use crate::test_solver::BoolTestSolver;

    #[test]
    fn variables_sharing_a_value_resolve_to_the_value() {
        let mut solver = BoolTestSolver::new();
        let v1 = solver.make_symbol("v1", Sort::Bool);
        let v2 = solver.make_symbol("v2", Sort::Bool);
        let val = solver.make_value(Sort::Bool, Literal::Bool(true));

        let mut ds: DisjointSet<_> = DisjointSet::new();
        ds.add(&solver, v1.clone(), val.clone());
        ds.add(&solver, v2.clone(), val.clone());

        assert_eq!(ds.find(&v1), val);
        assert_eq!(ds.find(&v2), val);
    }

    #[test]
    fn unrelated_variables_stay_in_separate_classes() {
        let mut solver = BoolTestSolver::new();
        let v1 = solver.make_symbol("v1", Sort::Bool);
        let v2 = solver.make_symbol("v2", Sort::Bool);
        let a = solver.make_value(Sort::Bool, Literal::Bool(true));
        let b = solver.make_value(Sort::Bool, Literal::Bool(false));

        let mut ds: DisjointSet<_> = DisjointSet::new();
        ds.add(&solver, v1.clone(), a);
        ds.add(&solver, v2.clone(), b);

        assert_ne!(ds.find(&v1), ds.find(&v2));
    }
}
