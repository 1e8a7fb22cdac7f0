/*!

`Property` (spec §6.2): the consumed safety property. The engine computes `bad := ¬prop`; a
front-end-supplied property mentioning next-state or input variables is the concern of an
external monitor pass, not this crate.

*/

use crate::solver::SmtSolver;

pub struct Property<S: SmtSolver> {
    pub prop: S::Term,
    pub name: Option<String>,
}

impl<S: SmtSolver> Property<S> {
    pub fn new(prop: S::Term) -> Self {
        Property { prop, name: None }
    }

    pub fn named(prop: S::Term, name: impl Into<String>) -> Self {
        Property {
            prop,
            name: Some(name.into()),
        }
    }

    /// `¬prop`, unwrapping a leading `Not` in `prop` instead of growing a `Not(Not(x))` — keeps
    /// `bad`'s literal shape canonical for callers (e.g. witness reconstruction) that match on a
    /// cube's literals rather than re-deriving through the solver.
    pub fn bad(&self, solver: &mut S) -> crate::error::Ic3Result<S::Term> {
        if solver.op_of(&self.prop) == Some(crate::solver::Op::Not) {
            Ok(solver.children(&self.prop).remove(0))
        } else {
            solver.make_term(crate::solver::Op::Not, &[self.prop.clone()])
        }
    }
}
