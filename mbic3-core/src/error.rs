/*!

Error kinds for the MBIC3 engine (spec §7).

`UnknownSymbol` and `UnsupportedSort` are caller errors: something passed to the
`TransitionSystem` or `IC3Engine` was malformed. `SolverError` wraps a failure reported by the
backing `SmtSolver` (timeout, out-of-memory, incomplete theory); the engine never tries to
interpret it further and surfaces `ProveResult::Unknown` instead of panicking. `InternalInvariantViolated`
is reserved for conditions the algorithm itself guarantees can't happen (a SAT result where an
UNSAT result was just proven, an empty unsat core where a non-empty one is required); seeing one
is a bug in this crate, not in the caller or the solver, so it aborts with a diagnostic rather
than being handed back as a `Result`.

*/

use std::fmt;

#[derive(thiserror::Error, Debug)]
pub enum Ic3Error {
    #[error("term mentions unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("unsupported sort for a state/input variable: {0}")]
    UnsupportedSort(String),

    #[error("solver error: {0}")]
    SolverError(String),

    #[error("internal invariant violated: {0}")]
    InternalInvariantViolated(String),
}

impl Ic3Error {
    /// Internal invariant violations are bugs in this crate, not recoverable caller errors.
    /// Call sites that detect one should use this to fail loudly with a diagnostic rather than
    /// silently returning `ProveResult::Unknown`, per spec §7.
    pub fn internal(msg: impl fmt::Display) -> Self {
        let msg = msg.to_string();
        mbic3_abs::error!(%msg, "internal invariant violated");
        Ic3Error::InternalInvariantViolated(msg)
    }

    /// A failure reported by the backing `SmtSolver` (timeout, incomplete theory, out of memory).
    /// Logged at `warn` since the engine degrades to `ProveResult::Unknown` rather than panicking.
    pub fn solver(msg: impl fmt::Display) -> Self {
        let msg = msg.to_string();
        mbic3_abs::warn!(%msg, "solver reported an error");
        Ic3Error::SolverError(msg)
    }
}

pub type Ic3Result<T> = Result<T, Ic3Error>;
