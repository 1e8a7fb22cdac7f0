/*!

`IC3Formula` (spec §4.3): a tagged cube/clause — a flat list of Bool-sorted literals plus a flag
recording whether `term` is their conjunction ("cube") or disjunction ("clause"). Keeping both
the flattened `term` and the literal list avoids re-deriving one from the other at every call
site that needs to distinguish "the formula" from "its literals".

*/

use mbic3_abs::SmallVec;

use crate::error::Ic3Result;
use crate::solver::{Op, SmtSolver};

pub type LiteralVec<S> = SmallVec<[<S as SmtSolver>::Term; 4]>;

#[derive(Clone)]
pub struct IC3Formula<S: SmtSolver> {
    pub term: S::Term,
    pub children: LiteralVec<S>,
    pub disjunction: bool,
}

impl<S: SmtSolver> IC3Formula<S> {
    pub fn conjunction(solver: &mut S, lits: &[S::Term]) -> Ic3Result<Self> {
        let term = Self::fold(solver, Op::And, lits)?;
        Ok(IC3Formula {
            term,
            children: lits.iter().cloned().collect(),
            disjunction: false,
        })
    }

    pub fn disjunction(solver: &mut S, lits: &[S::Term]) -> Ic3Result<Self> {
        let term = Self::fold(solver, Op::Or, lits)?;
        Ok(IC3Formula {
            term,
            children: lits.iter().cloned().collect(),
            disjunction: true,
        })
    }

    fn fold(solver: &mut S, op: Op, lits: &[S::Term]) -> Ic3Result<S::Term> {
        match lits.len() {
            0 => {
                let identity = matches!(op, Op::And);
                Ok(solver.make_value(crate::solver::Sort::Bool, crate::solver::Literal::Bool(identity)))
            }
            1 => Ok(lits[0].clone()),
            _ => solver.make_term(op, lits),
        }
    }

    /// Flips the conjunction/disjunction flag and negates every child, recomputing `term`. A
    /// child that is already `Not(x)` unwraps to `x` rather than growing a `Not(Not(x))`, so that
    /// `negate` stays involutive under the solver's hash-consing instead of drifting further from
    /// the original term with every call.
    pub fn negate(&self, solver: &mut S) -> Ic3Result<Self> {
        let negated_children: Vec<S::Term> = self
            .children
            .iter()
            .map(|c| Self::negate_literal(solver, c))
            .collect::<Ic3Result<_>>()?;
        if self.disjunction {
            Self::conjunction(solver, &negated_children)
        } else {
            Self::disjunction(solver, &negated_children)
        }
    }

    fn negate_literal(solver: &mut S, lit: &S::Term) -> Ic3Result<S::Term> {
        if solver.op_of(lit) == Some(Op::Not) {
            Ok(solver.children(lit).remove(0))
        } else {
            solver.make_term(Op::Not, &[lit.clone()])
        }
    }

    /// Every child must be Bool-sorted (spec §4.3). Additional literal-shape checks are policy
    /// of the caller, not enforced here.
    pub fn check_valid(&self, solver: &S) -> bool {
        self.children
            .iter()
            .all(|c| solver.sort_of(c) == crate::solver::Sort::Bool)
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::Sort;
    use crate::test_solver::BoolTestSolver;

    #[test]
    fn negate_is_involutive() {
        let mut solver = BoolTestSolver::new();
        let a = solver.make_symbol("a", Sort::Bool);
        let b = solver.make_symbol("b", Sort::Bool);
        let cube = IC3Formula::conjunction(&mut solver, &[a, b]).unwrap();

        let once = cube.negate(&mut solver).unwrap();
        let twice = once.negate(&mut solver).unwrap();

        assert_eq!(twice.disjunction, cube.disjunction);
        assert_eq!(twice.children.len(), cube.children.len());
        assert_eq!(twice.term, cube.term);
    }

    #[test]
    fn negate_conjunction_yields_disjunction_of_negated_literals() {
        let mut solver = BoolTestSolver::new();
        let a = solver.make_symbol("a", Sort::Bool);
        let b = solver.make_symbol("b", Sort::Bool);
        let cube = IC3Formula::conjunction(&mut solver, &[a.clone(), b.clone()]).unwrap();

        let clause = cube.negate(&mut solver).unwrap();
        assert!(clause.disjunction);
        assert_eq!(clause.children.len(), 2);
    }

    #[test]
    fn check_valid_rejects_non_bool_literal() {
        let mut solver = BoolTestSolver::new();
        let a = solver.make_symbol("a", Sort::Bool);
        let cube = IC3Formula::conjunction(&mut solver, &[a]).unwrap();
        assert!(cube.check_valid(&solver));
    }
}
