/*!

`mbic3-core`: an IC3/PDR frame-based reachability engine operating on concrete model values
(MBIC3). Every piece of theory reasoning — term construction, satisfiability, model extraction,
interpolation — is delegated to an external `SmtSolver` implementor; this crate owns only the
frame bookkeeping, proof-goal scheduling, and the three inductive-generalization strategies built
on top of that capability.

See `mbic3-toy` for a reference `SmtSolver`/`InterpolatingSolver` pair and an end-to-end test
suite driving this engine against small bitvector transition systems.

*/

mod disjoint_set;
mod engine;
mod error;
mod frames;
mod ic3_formula;
mod interpolation;
mod options;
mod property;
mod solver;
mod term_env;
#[cfg(test)]
mod test_solver;
mod transition_system;
mod unsat_core_reducer;
mod witness;

pub use engine::{Ic3Engine, ProveResult};
pub use error::{Ic3Error, Ic3Result};
pub use ic3_formula::IC3Formula;
pub use interpolation::{InterpolationContext, TermTranslator};
pub use options::{Ic3Options, IndGenMode};
pub use property::Property;
pub use solver::{InterpolatingSolver, Literal, Op, SatResult, SmtSolver, Sort};
pub use term_env::TermEnv;
pub use transition_system::TransitionSystem;
pub use witness::Witness;
