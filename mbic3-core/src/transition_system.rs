/*!

`TransitionSystem` (spec §4.2): current/next/input variable bookkeeping, the current↔next
substitution maps, and the well-formedness checks (`known_symbols`, `only_curr`) the engine
relies on before it ever issues a SAT query. This is the relational variant from spec §4.2 —
`add_constraint` conjoins the next-state version of a constraint onto `trans` whenever the
constraint mentions only current-state variables, so the invariant is preserved across steps.

*/

use mbic3_abs::{HashMap, HashSet};

use crate::error::{Ic3Error, Ic3Result};
use crate::solver::{Op, SmtSolver, Sort};
use crate::term_env::TermEnv;

pub struct TransitionSystem<S: SmtSolver> {
    state_vars: HashSet<S::Term>,
    next_vars: HashSet<S::Term>,
    input_vars: HashSet<S::Term>,
    states_map: HashMap<S::Term, S::Term>,
    next_states_map: HashMap<S::Term, S::Term>,
    named_terms: HashMap<String, S::Term>,
    init: Option<S::Term>,
    trans: Option<S::Term>,
}

impl<S: SmtSolver> TransitionSystem<S> {
    pub fn new() -> Self {
        TransitionSystem {
            state_vars: HashSet::default(),
            next_vars: HashSet::default(),
            input_vars: HashSet::default(),
            states_map: HashMap::default(),
            next_states_map: HashMap::default(),
            named_terms: HashMap::default(),
            init: None,
            trans: None,
        }
    }

    pub fn state_vars(&self) -> &HashSet<S::Term> {
        &self.state_vars
    }

    pub fn next_vars(&self) -> &HashSet<S::Term> {
        &self.next_vars
    }

    pub fn input_vars(&self) -> &HashSet<S::Term> {
        &self.input_vars
    }

    pub fn init(&self) -> Option<&S::Term> {
        self.init.as_ref()
    }

    pub fn trans(&self) -> Option<&S::Term> {
        self.trans.as_ref()
    }

    pub fn is_curr_var(&self, t: &S::Term) -> bool {
        self.state_vars.contains(t)
    }

    pub fn is_next_var(&self, t: &S::Term) -> bool {
        self.next_vars.contains(t)
    }

    /// Creates paired current/next symbols `name` and `name.next`; rejects Array/Uninterpreted
    /// sorts (spec §4.6.2).
    pub fn make_state(&mut self, env: &mut TermEnv<S>, name: &str, sort: Sort) -> Ic3Result<S::Term> {
        Self::check_supported_sort(&sort)?;
        let state = env.make_symbol(name, sort.clone());
        let next_state = env.make_symbol(&format!("{name}.next"), sort);
        self.state_vars.insert(state.clone());
        self.next_vars.insert(next_state.clone());
        self.states_map.insert(state.clone(), next_state.clone());
        self.next_states_map.insert(next_state.clone(), state.clone());
        self.named_terms.insert(name.to_string(), state.clone());
        Ok(state)
    }

    pub fn make_input(&mut self, env: &mut TermEnv<S>, name: &str, sort: Sort) -> Ic3Result<S::Term> {
        Self::check_supported_sort(&sort)?;
        let input = env.make_symbol(name, sort);
        self.input_vars.insert(input.clone());
        self.named_terms.insert(name.to_string(), input.clone());
        Ok(input)
    }

    fn check_supported_sort(sort: &Sort) -> Ic3Result<()> {
        if sort.is_array() || sort.is_uninterpreted() {
            return Err(Ic3Error::UnsupportedSort(format!("{sort:?}")));
        }
        Ok(())
    }

    pub fn set_init(&mut self, env: &TermEnv<S>, term: S::Term) -> Ic3Result<()> {
        self.require_state_only(env, &term)?;
        self.init = Some(term);
        Ok(())
    }

    pub fn set_trans(&mut self, env: &TermEnv<S>, term: S::Term) -> Ic3Result<()> {
        self.require_known_symbols(env, &term)?;
        self.trans = Some(term);
        Ok(())
    }

    pub fn constrain_trans(&mut self, env: &mut TermEnv<S>, constraint: S::Term) -> Ic3Result<()> {
        self.require_known_symbols(env, &constraint)?;
        let trans = self.trans.take().unwrap_or_else(|| panic!("constrain_trans before set_trans"));
        self.trans = Some(env.make_term(Op::And, &[trans, constraint])?);
        Ok(())
    }

    /// `trans := trans ∧ c`; additionally conjoins `next(c)` when `c` mentions only
    /// current-state variables, so the constraint holds at every step (spec §4.2).
    pub fn add_constraint(&mut self, env: &mut TermEnv<S>, constraint: S::Term) -> Ic3Result<()> {
        let trans = self.trans.take().unwrap_or_else(|| panic!("add_constraint before set_trans"));
        let mut trans = env.make_term(Op::And, &[trans, constraint.clone()])?;
        if self.only_curr(env, &constraint) {
            let next_constraint = self.next(env, &constraint);
            trans = env.make_term(Op::And, &[trans, next_constraint])?;
        }
        self.trans = Some(trans);
        Ok(())
    }

    /// Substitutes current-state variables for their next-state counterparts.
    pub fn next(&self, env: &mut TermEnv<S>, term: &S::Term) -> S::Term {
        env.substitute(term, &self.states_map)
    }

    /// Substitutes next-state variables for their current-state counterparts.
    pub fn curr(&self, env: &mut TermEnv<S>, term: &S::Term) -> S::Term {
        env.substitute(term, &self.next_states_map)
    }

    /// True iff every symbolic constant reachable from `term` is a current-state variable.
    pub fn only_curr(&self, env: &TermEnv<S>, term: &S::Term) -> bool {
        self.walk_check(env, term, &mut |t| self.state_vars.contains(t))
    }

    /// True iff every symbolic constant reachable from `term` is a state, next-state, or input
    /// variable.
    pub fn known_symbols(&self, env: &TermEnv<S>, term: &S::Term) -> bool {
        self.walk_check(env, term, &mut |t| {
            self.input_vars.contains(t) || self.state_vars.contains(t) || self.next_vars.contains(t)
        })
    }

    /// Shared DAG walk backing `only_curr`/`known_symbols`. Memoizes the **popped** node, not
    /// the original input `term`, against the visited cache.
    fn walk_check(&self, env: &TermEnv<S>, term: &S::Term, accept: &mut dyn FnMut(&S::Term) -> bool) -> bool {
        let solver = env.solver();
        let mut visited: HashSet<S::Term> = HashSet::default();
        let mut stack = vec![term.clone()];
        while let Some(t) = stack.pop() {
            if visited.contains(&t) {
                continue;
            }

            if solver.is_symbolic_const(&t) && !accept(&t) {
                return false;
            }

            visited.insert(t.clone());
            for child in solver.children(&t) {
                stack.push(child);
            }
        }
        true
    }

    fn require_state_only(&self, env: &TermEnv<S>, term: &S::Term) -> Ic3Result<()> {
        if self.only_curr(env, term) {
            Ok(())
        } else {
            Err(Ic3Error::UnknownSymbol(format!("{term:?}")))
        }
    }

    fn require_known_symbols(&self, env: &TermEnv<S>, term: &S::Term) -> Ic3Result<()> {
        if self.known_symbols(env, term) {
            Ok(())
        } else {
            Err(Ic3Error::UnknownSymbol(format!("{term:?}")))
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&S::Term> {
        self.named_terms.get(name)
    }
}

impl<S: SmtSolver> Default for TransitionSystem<S> {
    fn default() -> Self {
        Self::new()
    }
}
