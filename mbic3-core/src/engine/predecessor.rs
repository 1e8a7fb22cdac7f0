/*!

Predecessor extraction and generalization (spec §4.6.8). Called only while the `block` query's
SAT result (and its model) are still live on the solver stack, i.e. before that query's
`pop_solver_context`.

*/

use mbic3_abs::HashMap;

use crate::disjoint_set::DisjointSet;
use crate::error::Ic3Result;
use crate::ic3_formula::IC3Formula;
use crate::solver::{Op, SmtSolver};
use crate::unsat_core_reducer::UnsatCoreReducer;

use super::Ic3Engine;
use super::generalize::split_eq;

impl<S: SmtSolver> Ic3Engine<S> {
    /// Spec §4.4/§4.6.8: builds the concrete predecessor cube from state-variable model values,
    /// plus the congruence equalities a `DisjointSet` finds among equally-valued variables.
    /// `out_inputs`/`out_next` optionally collect the input and next-state equalities for
    /// callers (the relational preimage path) that need them.
    pub(crate) fn get_model_ic3formula(
        &mut self,
        out_inputs: Option<&mut Vec<S::Term>>,
        out_next: Option<&mut Vec<S::Term>>,
    ) -> Ic3Result<IC3Formula<S>> {
        let mut ds: DisjointSet<S::Term> = DisjointSet::new();
        let mut cube_lits = Vec::new();

        let state_vars: Vec<S::Term> = self.ts.state_vars().iter().cloned().collect();
        for v in &state_vars {
            let val = self.env.get_value(v);
            let eq = self.env.solver_mut().make_term(Op::Equal, &[v.clone(), val.clone()])?;
            cube_lits.push(eq);
            ds.add(self.env.solver(), v.clone(), val);
        }
        if let Some(out_next) = out_next {
            for v in &state_vars {
                let nv = self.ts.next(&mut self.env, v);
                let next_val = self.env.get_value(&nv);
                let eq = self.env.solver_mut().make_term(Op::Equal, &[nv, next_val])?;
                out_next.push(eq);
            }
        }

        for v in &state_vars {
            let repr = ds.find(v);
            if &repr != v {
                let eq = self.env.solver_mut().make_term(Op::Equal, &[repr, v.clone()])?;
                cube_lits.push(eq);
            }
        }

        if let Some(out_inputs) = out_inputs {
            let input_vars: Vec<S::Term> = self.ts.input_vars().iter().cloned().collect();
            for v in &input_vars {
                let val = self.env.get_value(v);
                let eq = self.env.solver_mut().make_term(Op::Equal, &[v.clone(), val])?;
                out_inputs.push(eq);
            }
        }

        IC3Formula::conjunction(self.env.solver_mut(), &cube_lits)
    }

    /// Spec §4.6.8. After a SAT result to the block query at level `i`, turns the concrete
    /// predecessor model into a (possibly generalized) cube for the next proof goal.
    pub(crate) fn generalize_predecessor(&mut self, i: usize, c: &IC3Formula<S>) -> Ic3Result<IC3Formula<S>> {
        let mut next_lits = Vec::new();
        let mut input_lits = Vec::new();
        let concrete = self.get_model_ic3formula(Some(&mut input_lits), Some(&mut next_lits))?;

        debug_assert!(i > 0);
        if i == 1 {
            // The predecessor of a frame-1 proof goal is, by construction, an initial state;
            // no further generalization is needed (spec §4.6.8).
            return Ok(concrete);
        }

        if !self.options.ic3_pregen {
            return Ok(concrete);
        }

        if self.options.ic3_functional_preimage {
            return self.generalize_predecessor_functional(&input_lits);
        }

        self.generalize_predecessor_relational(i, c, &concrete, &input_lits, &next_lits)
    }

    /// Relational preimage (spec §4.6.8): reduces the current-state equality literals of the
    /// concrete predecessor via the `UnsatCoreReducer`, guided by a formula built from the
    /// input assignment, the next-state literals, and the negated relative-induction query.
    fn generalize_predecessor_relational(
        &mut self,
        i: usize,
        c: &IC3Formula<S>,
        concrete: &IC3Formula<S>,
        input_lits: &[S::Term],
        next_lits: &[S::Term],
    ) -> Ic3Result<IC3Formula<S>> {
        let inputs_formula = self.conjoin(input_lits)?;
        let next_formula = self.conjoin(next_lits)?;

        let pre_formula = {
            let frame_term = self.frame_term(i - 1)?;
            let trans = self.ts.trans().expect("trans must be set").clone();
            let not_c = self.env.solver_mut().make_term(Op::Not, &[c.term.clone()])?;
            let next_c = self.ts.next(&mut self.env, &c.term);
            let conj = self.conjoin(&[frame_term, trans, not_c, next_c])?;
            self.env.solver_mut().make_term(Op::Not, &[conj])?
        };
        let formula = self.conjoin(&[inputs_formula, next_formula, pre_formula])?;

        let splits = split_eq(self.env.solver_mut(), &concrete.children)?;
        let (reduced, _removed) = UnsatCoreReducer::reduce_assump_unsatcore(
            self.env.solver_mut(),
            &formula,
            &splits,
            self.options.gen_max_iter,
            self.options.random_seed,
        );

        debug_assert!(!reduced.is_empty(), "predecessor generalization must keep at least one literal");
        IC3Formula::conjunction(self.env.solver_mut(), &reduced)
    }

    /// Functional preimage (spec §4.6.8): only valid when `trans` is a deterministic update.
    /// Substitutes the input model into `trans` directly and partitions the result.
    fn generalize_predecessor_functional(&mut self, input_lits: &[S::Term]) -> Ic3Result<IC3Formula<S>> {
        let mut model: HashMap<S::Term, S::Term> = HashMap::default();
        for eq in input_lits {
            if let Some(Op::Equal) = self.env.solver().op_of(eq) {
                let children = self.env.solver().children(eq);
                model.insert(children[0].clone(), children[1].clone());
            }
        }
        let trans = self.ts.trans().expect("trans must be set").clone();
        let substituted = self.env.substitute(&trans, &model);
        let mut conjuncts = Vec::new();
        self.env.conjunctive_partition(&substituted, &mut conjuncts, true);
        IC3Formula::conjunction(self.env.solver_mut(), &conjuncts)
    }
}
