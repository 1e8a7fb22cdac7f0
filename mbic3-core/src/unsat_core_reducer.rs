/*!

`UnsatCoreReducer` (spec §4.7): best-effort, not-guaranteed-minimal assumption-set reduction via
repeated unsat-core iteration. Shared by generalization mode 1 (§4.6.7) and predecessor
generalization's relational preimage path (§4.6.8).

*/

use mbic3_abs::{seeded_shuffle, HashSet};

use crate::solver::{SatResult, SmtSolver};

pub struct UnsatCoreReducer;

impl UnsatCoreReducer {
    /// Pre: `formula ∧ AND(assumps)` is UNSAT. Post: `formula ∧ AND(kept)` is still UNSAT, and
    /// `removed ∪ kept = assumps`. Repeatedly re-solves with the current assumption set, taking
    /// the unsat core as the next iteration's assumptions, until a fixed point or `max_iter` is
    /// reached. `seed > 0` shuffles the assumption order deterministically between iterations so
    /// repeated runs with the same seed reduce identically (spec §5 "Ordering").
    pub fn reduce_assump_unsatcore<S: SmtSolver>(
        solver: &mut S,
        formula: &S::Term,
        assumps: &[S::Term],
        max_iter: u32,
        seed: u64,
    ) -> (Vec<S::Term>, Vec<S::Term>) {
        let mut current: Vec<S::Term> = assumps.to_vec();
        let mut iter = 0u32;

        loop {
            if seed != 0 {
                seeded_shuffle(&mut current, seed.wrapping_add(iter as u64));
            }

            solver.push();
            solver.assert_formula(formula);
            let result = solver.check_sat_assuming(&current);
            debug_assert!(
                !matches!(result, SatResult::Unknown),
                "reduce_assump_unsatcore requires a decisive solver"
            );

            let core: HashSet<S::Term> = if result == SatResult::Unsat {
                solver.get_unsat_core()
            } else {
                // Shouldn't happen given the precondition, but fail safe by keeping everything
                // rather than silently dropping assumptions that are actually load-bearing.
                current.iter().cloned().collect()
            };
            solver.pop();

            let next: Vec<S::Term> = current.iter().filter(|a| core.contains(a)).cloned().collect();

            iter += 1;
            let fixed_point = next.len() == current.len();
            current = next;

            if fixed_point || (max_iter != 0 && iter >= max_iter) {
                break;
            }
        }

        let kept_set: HashSet<S::Term> = current.iter().cloned().collect();
        let removed: Vec<S::Term> = assumps
            .iter()
            .filter(|a| !kept_set.contains(a))
            .cloned()
            .collect();
        (current, removed)
    }
}
