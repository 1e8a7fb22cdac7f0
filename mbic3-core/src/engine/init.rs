/*!

`Ic3Engine::initialize` (spec §4.6.2): creates the level-0 activation label and asserts `L_0 →
init`, then opens an empty `frames[1]` behind a fresh `L_1`. Interpolation-mode setup (a second
solver, symbol pre-caching) is layered on top via [`Ic3Engine::enable_interpolation`], called by
constructors that have an `InterpolatingSolver` on hand — kept out of `new` itself because not
every `S: SmtSolver` is also an `InterpolatingSolver`.

*/

use mbic3_abs::debug;

use crate::error::Ic3Result;
use crate::solver::{InterpolatingSolver, Op, SmtSolver};

use super::Ic3Engine;

impl<S: SmtSolver> Ic3Engine<S> {
    pub(super) fn initialize(&mut self) -> Ic3Result<()> {
        let l0 = self.fresh_label();
        self.frames.push_empty_frame(l0.clone());
        let init = self.ts.init().expect("init must be set before constructing the engine").clone();
        let l0_implies_init = self.env.solver_mut().make_term(Op::Implies, &[l0, init])?;
        self.env.assert_formula(&l0_implies_init);

        let l1 = self.fresh_label();
        self.frames.push_empty_frame(l1);
        self.reached_k = 1;

        debug!("engine initialized: frames[0] (init) and frames[1] (empty) in place");
        Ok(())
    }

    /// Pre-caches the symbols interpolation-mode translation needs to be a pure rename: every
    /// state and next-state variable, plus any uninterpreted-function symbol reachable from
    /// `init`, `trans`, or `bad` (spec §4.6.2 — "NOTE: need `free_symbols`, not
    /// `free_symbolic_consts`, to also catch the uninterpreted functions").
    pub fn enable_interpolation<I: InterpolatingSolver>(
        &mut self,
        mut ctx: crate::interpolation::InterpolationContext<S, I>,
    ) -> Ic3Result<crate::interpolation::InterpolationContext<S, I>>
    where
        I::Term: Clone,
    {
        for s in self.ts.state_vars().iter() {
            let sort = self.env.solver().sort_of(s);
            let interp_s = ctx.interpolator.make_symbol(&format!("{s:?}"), sort);
            ctx.register_symbol_pair(s.clone(), interp_s);

            let ns = self.ts.next(&mut self.env, s);
            let ns_sort = self.env.solver().sort_of(&ns);
            let interp_ns = ctx.interpolator.make_symbol(&format!("{ns:?}.next"), ns_sort);
            ctx.register_symbol_pair(ns, interp_ns);
        }

        let mut free_symbols = mbic3_abs::HashSet::default();
        let init = self.ts.init().expect("init must be set").clone();
        let trans = self.ts.trans().expect("trans must be set").clone();
        self.env.free_symbols(&init, &mut free_symbols);
        self.env.free_symbols(&trans, &mut free_symbols);
        self.env.free_symbols(&self.bad.clone(), &mut free_symbols);

        for sym in free_symbols {
            if self.env.solver().is_symbolic_const(&sym) {
                continue;
            }
            let sort = self.env.solver().sort_of(&sym);
            let interp_sym = ctx.interpolator.make_symbol(&format!("{sym:?}"), sort);
            ctx.register_symbol_pair(sym, interp_sym);
        }

        Ok(ctx)
    }
}
