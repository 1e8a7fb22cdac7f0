/*!

`Ic3Engine` (spec §4.6): the main loop driving frame-based reachability. This module holds the
engine's state and public contract (`prove`, `check_until`, `witness`, `invar`); the
per-mechanism logic lives in the sibling submodules, splitting a large subsystem across a
`mod.rs` plus focused files the way `core/state_transition_graph/` does.

*/

mod generalize;
mod init;
mod predecessor;
mod solve;

use mbic3_abs::{debug, info, HashMap};

use crate::error::Ic3Result;
use crate::frames::{Frames, ProofGoal, ProofGoalQueue};
use crate::options::Ic3Options;
use crate::property::Property;
use crate::solver::SmtSolver;
use crate::term_env::TermEnv;
use crate::transition_system::TransitionSystem;
use crate::witness::Witness;

/// Result of a `prove`/`check_until` run (spec §4.6.1, §9 "Tagged variants"). A `SolverError`
/// encountered mid-proof is never returned here — per spec §7 it degrades to `Unknown` instead,
/// surfaced through the `Ic3Result` the caller already has to handle for `UnknownSymbol`.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ProveResult {
    True,
    False,
    Unknown,
}

pub struct Ic3Engine<S: SmtSolver> {
    pub(crate) env: TermEnv<S>,
    pub(crate) ts: TransitionSystem<S>,
    pub(crate) property: Property<S>,
    pub(crate) bad: S::Term,
    pub(crate) options: Ic3Options,

    pub(crate) frames: Frames<S>,
    pub(crate) queue: ProofGoalQueue<S>,
    /// Tracks `push`/`pop` nesting so every public method can assert it returns to 0 (spec §5
    /// "Solver stack discipline").
    pub(crate) solver_context: i64,
    pub(crate) reached_k: usize,

    /// Set by `block_all_goals` when a goal at `idx == 0` is reached; `witness()` chases its
    /// `parent` chain back to the root.
    pub(crate) last_cex_goal: Option<std::rc::Rc<ProofGoal<S>>>,
    /// Set by `check_until` when `propagate` finds a fixed point; `invar()` reads it.
    pub(crate) last_invariant_level: Option<usize>,
}

impl<S: SmtSolver> Ic3Engine<S> {
    pub fn new(
        mut env: TermEnv<S>,
        ts: TransitionSystem<S>,
        property: Property<S>,
        options: Ic3Options,
    ) -> Ic3Result<Self> {
        let bad = property.bad(env.solver_mut())?;
        let mut engine = Ic3Engine {
            env,
            ts,
            property,
            bad,
            options,
            frames: Frames::new(),
            queue: ProofGoalQueue::new(),
            solver_context: 0,
            reached_k: 0,
            last_cex_goal: None,
            last_invariant_level: None,
        };
        engine.check_ts()?;
        engine.initialize()?;
        Ok(engine)
    }

    /// Rejects transition systems with Array/Uninterpreted-sorted state or input variables
    /// (spec §1 Non-goals, §4.6.2).
    fn check_ts(&self) -> Ic3Result<()> {
        use crate::error::Ic3Error;
        let solver = self.env.solver();
        for v in self.ts.state_vars().iter().chain(self.ts.input_vars().iter()) {
            let sort = solver.sort_of(v);
            if sort.is_array() || sort.is_uninterpreted() {
                return Err(Ic3Error::UnsupportedSort(format!("{sort:?}")));
            }
        }
        Ok(())
    }

    pub(crate) fn push_solver_context(&mut self) {
        self.env.push();
        self.solver_context += 1;
    }

    pub(crate) fn pop_solver_context(&mut self) {
        self.env.pop();
        self.solver_context -= 1;
    }

    /// Runs to completion (spec §4.6.1). Equivalent to `check_until(usize::MAX)`.
    pub fn prove(&mut self) -> Ic3Result<ProveResult> {
        self.check_until(usize::MAX)
    }

    /// Runs the main loop (spec §4.6.3) until a conclusion is reached or `top` reaches `bound`.
    pub fn check_until(&mut self, bound: usize) -> Ic3Result<ProveResult> {
        loop {
            if self.frames.top() >= bound {
                debug_assert_eq!(self.solver_context, 0);
                return Ok(ProveResult::Unknown);
            }

            if self.intersects_bad()? {
                match self.block_all_goals()? {
                    Some(result) => {
                        debug_assert_eq!(self.solver_context, 0);
                        return Ok(result);
                    }
                    None => continue,
                }
            }

            info!(frame = self.frames.top(), "no bad state at top frame, pushing new frame");
            let label = self.fresh_label();
            self.frames.push_empty_frame(label);
            self.reached_k += 1;

            if let Some(invariant_level) = self.propagate()? {
                debug!(level = invariant_level, "propagation reached a fixed point");
                self.last_invariant_level = Some(invariant_level);
                debug_assert_eq!(self.solver_context, 0);
                return Ok(ProveResult::True);
            }
        }
    }

    /// After `ProveResult::False`, populates the counterexample trace by chasing the blocked
    /// goal's `parent` chain back to frame 0 (spec §4.6.1, §6.3).
    pub fn witness(&mut self) -> Ic3Result<Witness<S>> {
        self.reconstruct_witness()
    }

    /// After `ProveResult::True`, returns the inductive invariant discovered at the frame where
    /// propagation found a fixed point (spec §4.6.9).
    pub fn invar(&mut self) -> Ic3Result<S::Term> {
        self.invariant_term()
    }

    /// Exposes the underlying term environment so callers can build further formulas around a
    /// produced `invar()`/`witness()` (spec §6.1, §6.3, §6.4 — the invariant/witness are handed
    /// back as bare terms, which are only useful with access back to the solver that made them).
    pub fn env(&self) -> &TermEnv<S> {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut TermEnv<S> {
        &mut self.env
    }

    pub fn ts(&self) -> &crate::TransitionSystem<S> {
        &self.ts
    }

    /// Substitutes current-state variables in `term` for their next-state counterparts, via the
    /// engine's own transition system (spec §4.2's `next`).
    pub fn next_state_term(&mut self, term: &S::Term) -> S::Term {
        self.ts.next(&mut self.env, term)
    }

    /// The transition relation asserted over this engine's transition system.
    pub fn trans_term(&self) -> S::Term {
        self.ts.trans().expect("trans must be set before constructing the engine").clone()
    }

    pub(crate) fn fresh_label(&mut self) -> S::Term {
        let name = format!("__ic3_label_{}", self.frames.labels.len());
        self.env.make_symbol(&name, crate::solver::Sort::Bool)
    }

    /// Asserts `L_j → clause` for every clause in `frames[j]`, `j` from `from` to `top`
    /// inclusive, by assuming each level's activation label (spec §3 "Activation labels").
    pub(crate) fn assert_frame_labels(&mut self, from: usize) {
        for j in from..=self.frames.top() {
            self.env.assert_formula(&self.frames.labels[j].clone());
        }
    }

    pub(crate) fn assert_trans_label(&mut self) {
        let trans = self.ts.trans().expect("trans must be set before solving").clone();
        self.env.assert_formula(&trans);
    }
}

pub(crate) type Model<S> = HashMap<<S as SmtSolver>::Term, <S as SmtSolver>::Term>;
