/*!

The `SmtSolver` capability (spec §6.1): the opaque, external collaborator this crate delegates
all theory reasoning to. Everything downstream of this trait — `TermEnv`, `TransitionSystem`,
the engine itself — is generic over `S: SmtSolver` and never assumes a concrete backend. See
`mbic3-toy` for a reference implementation used by this crate's own tests.

*/

use std::fmt;
use std::hash::Hash;

use mbic3_abs::{HashMap, HashSet};

use crate::error::Ic3Result;

/// One of the sort kinds a `Term` can carry (spec §3). `Array` and `Uninterpreted` are accepted
/// by the `Sort` type itself — rejecting them for state/input variables is the engine's job
/// (`check_ts`, spec §4.6.2), not the sort representation's.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Sort {
    Bool,
    BitVector(u32),
    Int,
    Real,
    Array(Box<Sort>, Box<Sort>),
    Uninterpreted,
}

impl Sort {
    pub fn is_array(&self) -> bool {
        matches!(self, Sort::Array(..))
    }

    pub fn is_uninterpreted(&self) -> bool {
        matches!(self, Sort::Uninterpreted)
    }
}

/// A literal value used to construct a value-term via `SmtSolver::make_value`.
#[derive(Clone, PartialEq, Debug)]
pub enum Literal {
    Bool(bool),
    BitVector(u64),
    Int(i64),
}

/// The first-order operator signature a conforming solver supports (spec §6.1). `Apply` tags a
/// node as an uninterpreted-function application whose first child (per `SmtSolver::children`)
/// is the function symbol itself.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Op {
    And,
    Or,
    Not,
    Implies,
    Equal,
    Ite,

    BVNot,
    BVAnd,
    BVOr,
    BVXor,
    BVAdd,
    BVSub,
    BVShl,
    BVLshr,
    BVConcat,
    BVExtract(u32, u32), // (high, low), inclusive, SMT-LIB convention
    BVZeroExtend(u32),
    BVRotateLeft(u32),
    BVRotateRight(u32),

    BVUle,
    BVUlt,
    BVUge,
    BVUgt,

    Le,
    Lt,
    Ge,
    Gt,

    Apply,
}

/// Result of a `check_sat`/`check_sat_assuming` query.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SatResult {
    Sat,
    Unsat,
    Unknown,
}

impl SatResult {
    pub fn is_sat(self) -> bool {
        matches!(self, SatResult::Sat)
    }

    pub fn is_unsat(self) -> bool {
        matches!(self, SatResult::Unsat)
    }

    pub fn is_unknown(self) -> bool {
        matches!(self, SatResult::Unknown)
    }
}

/// A conforming SMT solver (spec §6.1). `Term` is an opaque, hash-consed handle: cloning is
/// cheap, and equality/hash are structural-sharing (reference) identity, guaranteed by the
/// implementor, not by this trait.
pub trait SmtSolver {
    type Term: Clone + Eq + Hash + fmt::Debug;

    fn make_symbol(&mut self, name: &str, sort: Sort) -> Self::Term;
    fn make_value(&mut self, sort: Sort, literal: Literal) -> Self::Term;
    fn make_term(&mut self, op: Op, args: &[Self::Term]) -> Ic3Result<Self::Term>;

    fn sort_of(&self, term: &Self::Term) -> Sort;
    /// True for a 0-arity variable/constant symbol (a leaf that isn't a value and isn't an
    /// uninterpreted-function symbol).
    fn is_symbolic_const(&self, term: &Self::Term) -> bool;
    /// True for the bare function-symbol leaf of an `Op::Apply` node (spec §4.1:
    /// `free_symbols` includes these, `free_symbolic_consts` does not).
    fn is_uninterpreted_function_symbol(&self, term: &Self::Term) -> bool;
    fn is_value(&self, term: &Self::Term) -> bool;
    fn op_of(&self, term: &Self::Term) -> Option<Op>;
    fn children(&self, term: &Self::Term) -> Vec<Self::Term>;

    fn substitute(&mut self, term: &Self::Term, map: &HashMap<Self::Term, Self::Term>) -> Self::Term;

    fn push(&mut self);
    fn pop(&mut self);
    fn assert_formula(&mut self, term: &Self::Term);
    fn check_sat(&mut self) -> SatResult;
    fn check_sat_assuming(&mut self, assumptions: &[Self::Term]) -> SatResult;
    /// Valid only immediately after a `Sat` result from this solver instance.
    fn get_value(&mut self, term: &Self::Term) -> Self::Term;
    fn get_unsat_core(&mut self) -> HashSet<Self::Term>;

    /// `produce-models` / `incremental` / `produce-unsat-cores`, among others.
    fn set_opt(&mut self, name: &str, value: &str);
}

/// A second, interpolation-capable solver (spec §4.8). Not every backend implements this; the
/// engine only requires it for `IndGenMode::Interpolation`.
pub trait InterpolatingSolver: SmtSolver {
    fn reset_assertions(&mut self);

    /// Requires `a ∧ b` UNSAT. Returns `I` with `a → I`, `I ∧ b` UNSAT, `vars(I) ⊆ vars(a) ∩
    /// vars(b)`.
    fn get_interpolant(&mut self, a: &Self::Term, b: &Self::Term) -> Ic3Result<Self::Term>;
}
