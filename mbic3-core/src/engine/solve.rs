/*!

The main-loop mechanics (spec §4.6.3–§4.6.6, §4.6.9): `intersects_bad`, the block-all-goals inner
loop, `block` (the relative-induction query), `propagate`, and the witness/invariant extraction
that run once a conclusion is reached.

*/

use std::rc::Rc;

use mbic3_abs::{debug, trace, HashMap};

use crate::error::{Ic3Error, Ic3Result};
use crate::frames::ProofGoal;
use crate::ic3_formula::IC3Formula;
use crate::solver::{Op, SatResult, SmtSolver};
use crate::witness::Witness;

use super::{Ic3Engine, ProveResult};

impl<S: SmtSolver> Ic3Engine<S> {
    /// Spec §4.6.4: is `F_top ∧ bad` SAT? If so, enqueues a new proof goal at `top` built from
    /// the conjunctive partition of `bad`.
    pub(crate) fn intersects_bad(&mut self) -> Ic3Result<bool> {
        let top = self.frames.top();
        self.push_solver_context();
        self.assert_frame_labels(top);
        let bad = self.bad.clone();
        self.env.assert_formula(&bad);
        let result = self.env.check_sat();

        if result == SatResult::Unknown {
            self.pop_solver_context();
            return Err(Ic3Error::solver("check_sat returned Unknown"));
        }

        if result == SatResult::Sat {
            let mut conjuncts = Vec::new();
            self.env.conjunctive_partition(&bad, &mut conjuncts, true);
            let cube = IC3Formula::conjunction(self.env.solver_mut(), &conjuncts)?;
            self.queue.add(cube, top, None);
        }

        self.pop_solver_context();
        Ok(result == SatResult::Sat)
    }

    /// Drains the proof-goal queue (spec §4.6.3 inner loop). Returns `Some(False)` once a goal
    /// at `idx == 0` is reached (the trace is reconstructed lazily by `witness()`), or `None`
    /// once the queue empties with everything blocked.
    pub(crate) fn block_all_goals(&mut self) -> Ic3Result<Option<ProveResult>> {
        while let Some(goal) = self.queue.pop() {
            if goal.idx == 0 {
                self.last_cex_goal = Some(goal);
                return Ok(Some(ProveResult::False));
            }

            match self.block(&goal)? {
                BlockResult::Blocked(lemmas) => {
                    self.push_forward(&goal, &lemmas)?;
                }
                BlockResult::Predecessor(pred_cube) => {
                    self.queue.add(pred_cube, goal.idx - 1, Some(goal.clone()));
                    self.queue.add_goal(goal);
                }
            }
        }
        Ok(None)
    }

    /// Spec §4.6.5: is `F_{i-1} ∧ trans ∧ cube' ∧ ¬cube` SAT? UNSAT means `cube` is blocked at
    /// `i`; a learned clause is generalized and stored in `frames[i]`. SAT means a predecessor
    /// exists and is generalized into the next goal's cube.
    pub(crate) fn block(&mut self, goal: &Rc<ProofGoal<S>>) -> Ic3Result<BlockResult<S>> {
        let i = goal.idx;
        self.push_solver_context();
        self.assert_frame_labels(i - 1);
        self.assert_trans_label();

        let not_cube = self.env.solver_mut().make_term(Op::Not, &[goal.cube.term.clone()])?;
        self.env.assert_formula(&not_cube);

        let next_cube = self.ts.next(&mut self.env, &goal.cube.term);
        let result = self.env.check_sat_assuming(&[next_cube]);

        if result == SatResult::Unknown {
            self.pop_solver_context();
            return Err(Ic3Error::solver("check_sat_assuming returned Unknown"));
        }

        if result == SatResult::Unsat {
            self.pop_solver_context();
            trace!(level = i, "cube blocked, generalizing");
            let lemmas = self.inductive_generalization(i, &goal.cube)?;
            for lemma in &lemmas {
                self.add_clause_to_frame(i, lemma.clone());
            }
            Ok(BlockResult::Blocked(lemmas))
        } else {
            let predecessor = self.generalize_predecessor(i, &goal.cube)?;
            self.pop_solver_context();
            Ok(BlockResult::Predecessor(predecessor))
        }
    }

    /// Spec §4.6.6: after blocking `goal` at `goal.idx` via `lemmas`, attempt to push it one
    /// level further. If every just-learned lemma is also inductive relative to `F_{idx}`, push
    /// each forward into `frames[idx + 1]` directly and drop the goal; otherwise re-enqueue the
    /// original goal at `idx + 1`, but only while `idx < top`.
    fn push_forward(&mut self, goal: &Rc<ProofGoal<S>>, lemmas: &[IC3Formula<S>]) -> Ic3Result<()> {
        if goal.idx >= self.frames.top() {
            return Ok(());
        }

        let mut all_inductive = true;
        for lemma in lemmas {
            if !self.is_relatively_inductive(goal.idx, lemma)? {
                all_inductive = false;
                break;
            }
        }

        if all_inductive {
            for lemma in lemmas {
                self.add_clause_to_frame(goal.idx + 1, lemma.clone());
            }
        } else {
            self.queue.add(goal.cube.clone(), goal.idx + 1, goal.parent.clone());
        }
        Ok(())
    }

    pub(crate) fn add_clause_to_frame(&mut self, level: usize, clause: IC3Formula<S>) {
        let label = self.frames.labels[level].clone();
        let implication = self
            .env
            .solver_mut()
            .make_term(Op::Implies, &[label, clause.term.clone()])
            .expect("Implies is always constructible over two Bool terms");
        self.env.assert_formula(&implication);
        self.frames.add_clause(level, clause);
    }

    /// Spec §4.6.3's `propagate`: pushes inductive clauses forward one level at a time; returns
    /// the level at which two consecutive frames become equal (as clause sets), i.e. an
    /// inductive fixed point, if one is found this round.
    pub(crate) fn propagate(&mut self) -> Ic3Result<Option<usize>> {
        let top = self.frames.top();
        for i in 1..top {
            let clauses = self.frames.clauses[i].clone();
            for clause in clauses {
                if self.is_relatively_inductive(i, &clause)? {
                    self.add_clause_to_frame(i + 1, clause);
                }
            }
        }

        for i in 1..top {
            if self.frame_sets_equal(i, i + 1) {
                debug!(level = i, "frames[{i}] == frames[{}], invariant found", i + 1);
                return Ok(Some(i));
            }
        }
        Ok(None)
    }

    /// `C` is inductive relative to `F_i` iff `F_i ∧ trans ∧ ¬C → next(C)` is valid, i.e.
    /// `F_i ∧ trans ∧ ¬C ∧ ¬next(C)` is UNSAT.
    fn is_relatively_inductive(&mut self, i: usize, clause: &IC3Formula<S>) -> Ic3Result<bool> {
        self.push_solver_context();
        self.assert_frame_labels(i);
        self.assert_trans_label();
        let not_clause = self.env.solver_mut().make_term(Op::Not, &[clause.term.clone()])?;
        self.env.assert_formula(&not_clause);
        let next_clause = self.ts.next(&mut self.env, &clause.term);
        let not_next_clause = self.env.solver_mut().make_term(Op::Not, &[next_clause])?;
        let result = self.env.check_sat_assuming(&[not_next_clause]);
        self.pop_solver_context();

        match result {
            SatResult::Unsat => Ok(true),
            SatResult::Sat => Ok(false),
            SatResult::Unknown => Err(Ic3Error::solver(
                "check_sat_assuming returned Unknown during propagation",
            )),
        }
    }

    fn frame_sets_equal(&self, i: usize, j: usize) -> bool {
        self.frames.len_at(i) == self.frames.len_at(j)
            && self.frames.clauses[i]
                .iter()
                .all(|c| self.frames.clauses[j].iter().any(|d| d.term == c.term))
    }

    /// Spec §4.6.9: the conjunction of every clause stored at or above `level`.
    pub(crate) fn frame_term(&mut self, level: usize) -> Ic3Result<S::Term> {
        let mut lits: Vec<S::Term> = Vec::new();
        for j in level..=self.frames.top() {
            for clause in &self.frames.clauses[j] {
                lits.push(clause.term.clone());
            }
        }
        if lits.is_empty() {
            return Ok(self
                .env
                .solver_mut()
                .make_value(crate::solver::Sort::Bool, crate::solver::Literal::Bool(true)));
        }
        self.env.solver_mut().make_term(Op::And, &lits)
    }

    pub(crate) fn invariant_term(&mut self) -> Ic3Result<S::Term> {
        let level = self
            .last_invariant_level
            .ok_or_else(|| Ic3Error::internal("invar() called before a TRUE result"))?;
        self.frame_term(level)
    }

    pub(crate) fn reconstruct_witness(&mut self) -> Ic3Result<Witness<S>> {
        let last_goal = self
            .last_cex_goal
            .clone()
            .ok_or_else(|| Ic3Error::internal("witness() called before a FALSE result"))?;

        // `last_goal` is already the idx == 0 (initial-state) goal; each `.parent` hop moves to
        // the next higher idx that spawned it, so walking the chain collects cubes in
        // init-first order already — `steps[0]` satisfies `init` with no reversal needed.
        let mut chain = vec![last_goal.clone()];
        let mut cur = last_goal;
        while let Some(parent) = cur.parent.clone() {
            chain.push(parent.clone());
            cur = parent;
        }

        let mut steps: Vec<HashMap<S::Term, S::Term>> = Vec::with_capacity(chain.len());
        for goal in &chain {
            let mut step = HashMap::default();
            for v in self.ts.state_vars().clone() {
                for lit in &goal.cube.children {
                    match self.env.solver().op_of(lit) {
                        Some(Op::Equal) => {
                            let children = self.env.solver().children(lit);
                            if children[0] == v {
                                step.insert(v.clone(), children[1].clone());
                            } else if children[1] == v {
                                step.insert(v.clone(), children[0].clone());
                            }
                        }
                        // A Bool-sorted state variable's cube literal is the bare variable or its
                        // negation rather than an `Equal`, since it was never built from a
                        // concrete model (unlike `get_model_ic3formula`'s predecessor cubes).
                        Some(Op::Not) => {
                            let children = self.env.solver().children(lit);
                            if children[0] == v {
                                let false_val = self
                                    .env
                                    .solver_mut()
                                    .make_value(crate::solver::Sort::Bool, crate::solver::Literal::Bool(false));
                                step.insert(v.clone(), false_val);
                            }
                        }
                        None if *lit == v => {
                            let true_val = self
                                .env
                                .solver_mut()
                                .make_value(crate::solver::Sort::Bool, crate::solver::Literal::Bool(true));
                            step.insert(v.clone(), true_val);
                        }
                        _ => {}
                    }
                }
            }
            steps.push(step);
        }

        Ok(Witness::new(steps))
    }
}

pub(crate) enum BlockResult<S: SmtSolver> {
    Blocked(Vec<IC3Formula<S>>),
    Predecessor(IC3Formula<S>),
}
