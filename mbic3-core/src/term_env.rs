/*!

`TermEnv` (spec §4.1): a thin facade over an `S: SmtSolver` that adds the DAG-traversal
utilities the rest of the engine needs — free-symbol enumeration and conjunctive
partitioning — implemented once here instead of in every caller.

*/

use mbic3_abs::HashSet;

use crate::error::Ic3Result;
use crate::solver::{Literal, Op, SatResult, SmtSolver, Sort};

pub struct TermEnv<S: SmtSolver> {
    solver: S,
}

impl<S: SmtSolver> TermEnv<S> {
    pub fn new(solver: S) -> Self {
        TermEnv { solver }
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn solver_mut(&mut self) -> &mut S {
        &mut self.solver
    }

    pub fn make_symbol(&mut self, name: &str, sort: Sort) -> S::Term {
        self.solver.make_symbol(name, sort)
    }

    pub fn make_value(&mut self, sort: Sort, literal: Literal) -> S::Term {
        self.solver.make_value(sort, literal)
    }

    pub fn make_term(&mut self, op: Op, args: &[S::Term]) -> Ic3Result<S::Term> {
        self.solver.make_term(op, args)
    }

    pub fn substitute(
        &mut self,
        term: &S::Term,
        map: &mbic3_abs::HashMap<S::Term, S::Term>,
    ) -> S::Term {
        self.solver.substitute(term, map)
    }

    /// Collects the 0-arity variable/constant symbols reachable from `term`, memoizing visited
    /// nodes so a shared DAG is only walked once. Does *not* include uninterpreted-function
    /// symbols — use `free_symbols` for that (spec §4.1).
    pub fn free_symbolic_consts(&self, term: &S::Term, out: &mut HashSet<S::Term>) {
        self.walk_free(term, out, false);
    }

    /// As `free_symbolic_consts`, but also collects uninterpreted-function symbols.
    pub fn free_symbols(&self, term: &S::Term, out: &mut HashSet<S::Term>) {
        self.walk_free(term, out, true);
    }

    fn walk_free(&self, term: &S::Term, out: &mut HashSet<S::Term>, include_ufs: bool) {
        let mut visited: HashSet<S::Term> = HashSet::default();
        let mut stack = vec![term.clone()];
        while let Some(t) = stack.pop() {
            // Check the popped node, not the original input term, against the visited cache —
            // the walk visits many distinct DAG nodes per call, and the original `term` is
            // almost never the thing being re-examined (spec §9's open-question note).
            if visited.contains(&t) {
                continue;
            }
            visited.insert(t.clone());

            if self.solver.is_symbolic_const(&t) {
                out.insert(t.clone());
            } else if include_ufs && self.solver.is_uninterpreted_function_symbol(&t) {
                out.insert(t.clone());
            }

            for child in self.solver.children(&t) {
                stack.push(child);
            }
        }
    }

    /// Flattens nested `AND`s into a flat list of conjuncts. If `flatten_nested` is false, only
    /// the top-level `AND` (if any) is split; a non-`AND` term is returned as its sole element
    /// either way.
    pub fn conjunctive_partition(&self, term: &S::Term, out: &mut Vec<S::Term>, flatten_nested: bool) {
        match self.solver.op_of(term) {
            Some(Op::And) => {
                for child in self.solver.children(term) {
                    if flatten_nested && self.solver.op_of(&child) == Some(Op::And) {
                        self.conjunctive_partition(&child, out, true);
                    } else {
                        out.push(child);
                    }
                }
            }
            _ => out.push(term.clone()),
        }
    }

    pub fn get_value(&mut self, term: &S::Term) -> S::Term {
        self.solver.get_value(term)
    }

    pub fn push(&mut self) {
        self.solver.push();
    }

    pub fn pop(&mut self) {
        self.solver.pop();
    }

    pub fn assert_formula(&mut self, term: &S::Term) {
        self.solver.assert_formula(term);
    }

    pub fn check_sat(&mut self) -> SatResult {
        self.solver.check_sat()
    }

    pub fn check_sat_assuming(&mut self, assumptions: &[S::Term]) -> SatResult {
        self.solver.check_sat_assuming(assumptions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_solver::BoolTestSolver;

    #[test]
    fn conjunctive_partition_flattens_nested_and() {
        let mut env = TermEnv::new(BoolTestSolver::new());
        let a = env.make_symbol("a", Sort::Bool);
        let b = env.make_symbol("b", Sort::Bool);
        let c = env.make_symbol("c", Sort::Bool);
        let inner = env.make_term(Op::And, &[b.clone(), c.clone()]).unwrap();
        let outer = env.make_term(Op::And, &[a.clone(), inner]).unwrap();

        let mut out = Vec::new();
        env.conjunctive_partition(&outer, &mut out, true);
        assert_eq!(out.len(), 3);
        assert!(out.contains(&a));
        assert!(out.contains(&b));
        assert!(out.contains(&c));
    }

    #[test]
    fn free_symbolic_consts_dedupes_shared_subterms() {
        let mut env = TermEnv::new(BoolTestSolver::new());
        let x = env.make_symbol("x", Sort::Bool);
        let shared = env.make_term(Op::Not, &[x.clone()]).unwrap();
        let term = env.make_term(Op::And, &[shared.clone(), shared]).unwrap();

        let mut out = HashSet::default();
        env.free_symbolic_consts(&term, &mut out);
        assert_eq!(out.len(), 1);
        assert!(out.contains(&x));
    }
}
