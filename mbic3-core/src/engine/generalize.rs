/*!

Inductive generalization (spec §4.6.7): three modes for turning a blocked cube into a weaker
learned clause. `split_eq` splits equality literals by sort before either of the unsat-core-based
modes tries to drop literals from them.

*/

use mbic3_abs::seeded_shuffle;

use crate::error::Ic3Result;
use crate::ic3_formula::IC3Formula;
use crate::options::IndGenMode;
use crate::solver::{Op, SatResult, Sort, SmtSolver};
use crate::unsat_core_reducer::UnsatCoreReducer;

use super::Ic3Engine;

/// Splits equality literals into two inequalities — BV-unsigned comparisons for bitvector sorts,
/// linear `Le` for Int/Real, left as-is for Bool or any other literal shape (spec §4 Supplemented
/// Features).
pub(crate) fn split_eq<S: SmtSolver>(solver: &mut S, lits: &[S::Term]) -> Ic3Result<Vec<S::Term>> {
    let mut out = Vec::with_capacity(lits.len());
    for lit in lits {
        if solver.op_of(lit) == Some(Op::Equal) {
            let children = solver.children(lit);
            let (a, b) = (children[0].clone(), children[1].clone());
            match solver.sort_of(&a) {
                Sort::Bool => out.push(lit.clone()),
                Sort::BitVector(_) => {
                    out.push(solver.make_term(Op::BVUle, &[a.clone(), b.clone()])?);
                    out.push(solver.make_term(Op::BVUle, &[b, a])?);
                }
                Sort::Int | Sort::Real => {
                    out.push(solver.make_term(Op::Le, &[a.clone(), b.clone()])?);
                    out.push(solver.make_term(Op::Le, &[b, a])?);
                }
                _ => out.push(lit.clone()),
            }
        } else {
            out.push(lit.clone());
        }
    }
    Ok(out)
}

impl<S: SmtSolver> Ic3Engine<S> {
    pub(crate) fn inductive_generalization(&mut self, i: usize, c: &IC3Formula<S>) -> Ic3Result<Vec<IC3Formula<S>>> {
        if !self.options.ic3_indgen {
            let negated = c.negate(self.env.solver_mut())?;
            return Ok(vec![negated]);
        }

        match self.options.indgen_mode {
            IndGenMode::CoreDropping => self.generalize_mode_core_dropping(i, c),
            IndGenMode::ReducerBased => self.generalize_mode_reducer_based(i, c),
            IndGenMode::Interpolation => Err(crate::error::Ic3Error::internal(
                "interpolation-mode generalization requires an InterpolatingSolver; use \
                 Ic3Engine::inductive_generalization_interpolation directly",
            )),
        }
    }

    /// Mode 0 (spec §4.6.7): iteratively drop literals whose removal keeps the remaining cube
    /// disjoint from `init` and still blocked, using the unsat core from each trial query to
    /// prune multiple literals per pass.
    fn generalize_mode_core_dropping(&mut self, i: usize, c: &IC3Formula<S>) -> Ic3Result<Vec<IC3Formula<S>>> {
        let mut lits = split_eq(self.env.solver_mut(), &c.children)?;
        if self.options.random_seed > 0 {
            seeded_shuffle(&mut lits, self.options.random_seed);
        }

        let mut keep: Vec<S::Term> = Vec::new();
        let mut iter = 0u32;
        let mut progress = true;

        while (self.options.gen_max_iter == 0 || iter <= self.options.gen_max_iter) && lits.len() > 1 && progress {
            if self.options.gen_max_iter > 0 {
                iter += 1;
            }
            let prev_size = lits.len();

            let mut made_progress_this_pass = false;
            for a in lits.clone() {
                if keep.contains(&a) {
                    continue;
                }
                let tmp: Vec<S::Term> = lits.iter().filter(|l| **l != a).cloned().collect();
                let tmp_and = self.conjoin(&tmp)?;

                if self.check_intersects_initial(&tmp_and)? {
                    continue;
                }

                self.push_solver_context();
                self.assert_frame_labels(i - 1);
                self.assert_trans_label();
                let not_tmp_and = self.env.solver_mut().make_term(Op::Not, &[tmp_and])?;
                self.env.assert_formula(&not_tmp_and);

                let assumps: Vec<S::Term> = tmp.iter().map(|t| self.ts.next(&mut self.env, t)).collect();
                let result = self.env.check_sat_assuming(&assumps);

                if result == SatResult::Unknown {
                    self.pop_solver_context();
                    return Err(crate::error::Ic3Error::solver("check_sat_assuming returned Unknown during generalization"));
                }

                if result == SatResult::Sat {
                    // cannot drop `a`
                    self.pop_solver_context();
                    continue;
                }

                let core = self.env.solver_mut().get_unsat_core();
                self.pop_solver_context();

                let mut new_tmp: Vec<S::Term> = Vec::new();
                let mut removed: Vec<S::Term> = Vec::new();
                for (next_lit, curr_lit) in assumps.iter().zip(tmp.iter()) {
                    if core.contains(next_lit) {
                        new_tmp.push(curr_lit.clone());
                    } else {
                        removed.push(curr_lit.clone());
                    }
                }

                let restored = self.fix_if_intersects_initial(&mut new_tmp, removed)?;
                // Literals forced back in to avoid covering an initial state can never be
                // dropped again, or a later pass would just rediscover the same unsoundness.
                keep.extend(restored);

                lits = new_tmp;
                made_progress_this_pass = true;
                break;
            }

            progress = made_progress_this_pass && lits.len() < prev_size;
        }

        let negated = IC3Formula::conjunction(self.env.solver_mut(), &lits)?.negate(self.env.solver_mut())?;
        Ok(vec![negated])
    }

    /// Mode 1 (spec §4.6.7): drive the generic `UnsatCoreReducer` over the cube's next-state
    /// literals against `(F_{i-1} ∧ trans ∧ ¬c) ∨ init'`.
    fn generalize_mode_reducer_based(&mut self, i: usize, c: &IC3Formula<S>) -> Ic3Result<Vec<IC3Formula<S>>> {
        let next_lits: Vec<S::Term> = c.children.iter().map(|l| self.ts.next(&mut self.env, l)).collect();
        let split_lits = split_eq(self.env.solver_mut(), &next_lits)?;

        let formula = self.reducer_target_formula(i, c)?;

        let (reduced, _removed) =
            UnsatCoreReducer::reduce_assump_unsatcore(self.env.solver_mut(), &formula, &split_lits, self.options.gen_max_iter, self.options.random_seed);

        let curr_lits: Vec<S::Term> = reduced.iter().map(|l| self.ts.curr(&mut self.env, l)).collect();
        let negated = IC3Formula::conjunction(self.env.solver_mut(), &curr_lits)?.negate(self.env.solver_mut())?;
        Ok(vec![negated])
    }

    /// `(F_{i-1} ∧ trans ∧ ¬c) ∨ init'` — the shared assumption-minimization target for modes 1
    /// and (via §4.6.8) predecessor generalization's relational preimage path.
    pub(crate) fn reducer_target_formula(&mut self, i: usize, c: &IC3Formula<S>) -> Ic3Result<S::Term> {
        let frame_term = self.frame_term(i - 1)?;
        let trans = self.ts.trans().expect("trans must be set").clone();
        let not_c = self.env.solver_mut().make_term(Op::Not, &[c.term.clone()])?;
        let lhs = self.conjoin(&[frame_term, trans, not_c])?;

        let init = self.ts.init().expect("init must be set").clone();
        let next_init = self.ts.next(&mut self.env, &init);
        self.env.solver_mut().make_term(Op::Or, &[lhs, next_init])
    }

    /// Mode 2 (spec §4.6.7): interpolation between `(F_{i-1} ∧ trans ∧ ¬c) ∨ init'` and `c'`,
    /// conjunctively partitioned into one-literal clauses. Requires an `InterpolatingSolver`, so
    /// it is not reachable through `inductive_generalization` (which is generic over a plain
    /// `SmtSolver`); callers running in interpolation mode invoke this directly with their
    /// `InterpolationContext`.
    pub fn inductive_generalization_interpolation<I: crate::solver::InterpolatingSolver>(
        &mut self,
        ctx: &mut crate::interpolation::InterpolationContext<S, I>,
        i: usize,
        c: &IC3Formula<S>,
    ) -> Ic3Result<Vec<IC3Formula<S>>> {
        ctx.interpolator.reset_assertions();

        let conjuncts = split_eq(self.env.solver_mut(), &c.children)?;
        let not_conjunction = {
            let and_term = self.conjoin(&conjuncts)?;
            self.env.solver_mut().make_term(Op::Not, &[and_term])?
        };

        let frame_term = self.frame_term(i - 1)?;
        let trans = self.ts.trans().expect("trans must be set").clone();
        let lhs = self.conjoin(&[frame_term, trans, not_conjunction])?;
        let init = self.ts.init().expect("init must be set").clone();
        let next_init = self.ts.next(&mut self.env, &init);
        let formula_a = self.env.solver_mut().make_term(Op::Or, &[lhs, next_init])?;

        let next_c = self.ts.next(&mut self.env, &c.term);

        let int_a = ctx.to_interpolator.translate(self.env.solver(), &mut ctx.interpolator, &formula_a)?;
        let int_b = ctx.to_interpolator.translate(self.env.solver(), &mut ctx.interpolator, &next_c)?;

        let interpolant = ctx.interpolator.get_interpolant(&int_a, &int_b)?;
        let solver_interp = ctx.to_solver.translate(&ctx.interpolator, self.env.solver_mut(), &interpolant)?;

        let mut interp_conjuncts = Vec::new();
        self.env.conjunctive_partition(&solver_interp, &mut interp_conjuncts, true);

        let mut gen_res = Vec::with_capacity(interp_conjuncts.len());
        for conjunct in interp_conjuncts {
            let curr = self.ts.curr(&mut self.env, &conjunct);
            gen_res.push(IC3Formula::disjunction(self.env.solver_mut(), &[curr])?);
        }
        Ok(gen_res)
    }

    pub(crate) fn conjoin(&mut self, terms: &[S::Term]) -> Ic3Result<S::Term> {
        match terms.len() {
            0 => Ok(self.env.solver_mut().make_value(Sort::Bool, crate::solver::Literal::Bool(true))),
            1 => Ok(terms[0].clone()),
            _ => self.env.solver_mut().make_term(Op::And, terms),
        }
    }

    /// True iff `tmp_and ∧ init` is SAT, i.e. the candidate generalized cube would also cover an
    /// initial state — dropping the literals that got us here is unsound.
    pub(crate) fn check_intersects_initial(&mut self, tmp_and: &S::Term) -> Ic3Result<bool> {
        self.push_solver_context();
        let init = self.ts.init().expect("init must be set").clone();
        self.env.assert_formula(&init);
        self.env.assert_formula(tmp_and);
        let result = self.env.check_sat();
        self.pop_solver_context();
        match result {
            SatResult::Sat => Ok(true),
            SatResult::Unsat => Ok(false),
            SatResult::Unknown => Err(crate::error::Ic3Error::solver(
                "check_sat returned Unknown while checking intersection with init",
            )),
        }
    }

    /// A reduced cube can intersect `init` even when the pre-reduction cube didn't, since it
    /// covers a superset of states. Re-adds literals from `removed` one at a time until `lits`
    /// no longer intersects `init`, and returns the literals it had to restore so the caller can
    /// mark them un-droppable for the remainder of generalization.
    fn fix_if_intersects_initial(&mut self, lits: &mut Vec<S::Term>, mut removed: Vec<S::Term>) -> Ic3Result<Vec<S::Term>> {
        let mut restored = Vec::new();
        loop {
            let and_term = self.conjoin(lits)?;
            if !self.check_intersects_initial(&and_term)? {
                return Ok(restored);
            }
            let Some(lit) = removed.pop() else {
                // Exhausted the pool of droppable literals without escaping init; the
                // pre-reduction cube was already checked not to intersect init, so this can only
                // happen if `lits` is empty here, which `check_intersects_initial` on `true`
                // correctly reports as intersecting.
                return Ok(restored);
            };
            lits.push(lit.clone());
            restored.push(lit);
        }
    }
}
