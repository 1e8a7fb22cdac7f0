/*!

`ToySolver`: a brute-force, hash-consed `SmtSolver`/`InterpolatingSolver` over Bool, bounded
bitvector, and (narrow-range) Int sorts. It exists purely as a reference backend to drive
`mbic3-core`'s engine end to end in this crate's `tests/`; no production system would brute-force
satisfiability like this. Terms are hash-consed into `Rc<TermNode>` the same way
`mbic3-core`'s own internal test solver is, so `Eq`/`Hash` reduce to pointer identity once
interned.

*/

use std::collections::hash_map::Entry;
use std::fmt;
use std::rc::Rc;

use mbic3_abs::{HashMap, HashSet};
use mbic3_core::{InterpolatingSolver, Ic3Result, Literal, Op, SatResult, SmtSolver, Sort};

#[derive(Clone, Eq)]
pub struct ToyTerm(Rc<TermNode>);

impl PartialEq for ToyTerm {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::hash::Hash for ToyTerm {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl fmt::Debug for ToyTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

#[derive(Debug)]
enum TermNode {
    Symbol(String, Sort),
    Value(Sort, Literal),
    Compound(Op, Vec<ToyTerm>, Sort),
}

/// A brute-force-enumerable domain value. Bitvectors are masked to their declared width on every
/// construction so equality/comparison never sees stray high bits.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
enum Val {
    Bool(bool),
    Bv(u64),
    Int(i64),
}

/// Brute force enumerates the full domain of every free bitvector/Int variable, so widths (and
/// the Int scan range) must stay small. 24 bits of combined state space is already generous for
/// the scenarios this crate's tests exercise.
const MAX_STATE_SPACE_BITS: u32 = 24;
const TOY_INT_RANGE: std::ops::Range<i64> = -16..16;

pub struct ToySolver {
    interned: HashMap<String, ToyTerm>,
    scopes: Vec<Vec<ToyTerm>>,
    model: HashMap<ToyTerm, Val>,
    last_assumptions: Vec<ToyTerm>,
}

impl ToySolver {
    pub fn new() -> Self {
        ToySolver {
            interned: HashMap::default(),
            scopes: vec![Vec::new()],
            model: HashMap::default(),
            last_assumptions: Vec::new(),
        }
    }

    fn intern(&mut self, node: TermNode, key: String) -> ToyTerm {
        match self.interned.entry(key) {
            Entry::Occupied(e) => e.get().clone(),
            Entry::Vacant(e) => {
                let term = ToyTerm(Rc::new(node));
                e.insert(term.clone());
                term
            }
        }
    }

    fn asserted(&self) -> impl Iterator<Item = &ToyTerm> {
        self.scopes.iter().flatten()
    }

    fn sort_of_node(&self, term: &ToyTerm) -> Sort {
        match &*term.0 {
            TermNode::Symbol(_, sort) => sort.clone(),
            TermNode::Value(sort, _) => sort.clone(),
            TermNode::Compound(_, _, sort) => sort.clone(),
        }
    }

    fn bv_width(sort: &Sort) -> u32 {
        match sort {
            Sort::BitVector(w) => *w,
            other => panic!("expected a bitvector sort, got {other:?}"),
        }
    }

    fn mask(width: u32, v: u64) -> u64 {
        if width >= 64 {
            v
        } else {
            v & ((1u64 << width) - 1)
        }
    }

    fn result_sort(op: Op, children: &[ToyTerm], toy: &ToySolver) -> Sort {
        use Op::*;
        match op {
            And | Or | Not | Implies | Equal => Sort::Bool,
            Ite => toy.sort_of_node(&children[1]),
            BVNot | BVAnd | BVOr | BVXor | BVAdd | BVSub | BVShl | BVLshr => toy.sort_of_node(&children[0]),
            BVConcat => {
                let w0 = Self::bv_width(&toy.sort_of_node(&children[0]));
                let w1 = Self::bv_width(&toy.sort_of_node(&children[1]));
                Sort::BitVector(w0 + w1)
            }
            BVExtract(high, low) => Sort::BitVector(high - low + 1),
            BVZeroExtend(n) => {
                let w = Self::bv_width(&toy.sort_of_node(&children[0]));
                Sort::BitVector(w + n)
            }
            BVRotateLeft(_) | BVRotateRight(_) => toy.sort_of_node(&children[0]),
            BVUle | BVUlt | BVUge | BVUgt | Le | Lt | Ge | Gt => Sort::Bool,
            Apply => panic!("ToySolver does not support uninterpreted functions"),
        }
    }

    fn free_vars(&self, term: &ToyTerm, out: &mut HashSet<ToyTerm>) {
        let mut stack = vec![term.clone()];
        let mut visited: HashSet<ToyTerm> = HashSet::default();
        while let Some(t) = stack.pop() {
            if visited.contains(&t) {
                continue;
            }
            visited.insert(t.clone());
            match &*t.0 {
                TermNode::Symbol(..) => {
                    out.insert(t.clone());
                }
                TermNode::Value(..) => {}
                TermNode::Compound(_, children, _) => {
                    for c in children {
                        stack.push(c.clone());
                    }
                }
            }
        }
    }

    fn bits_for(domain_len: usize) -> u32 {
        if domain_len <= 1 {
            0
        } else {
            ((domain_len - 1) as u32).ilog2() + 1
        }
    }

    fn domain(sort: &Sort) -> Vec<Val> {
        match sort {
            Sort::Bool => vec![Val::Bool(false), Val::Bool(true)],
            Sort::BitVector(w) => (0u64..(1u64 << *w)).map(Val::Bv).collect(),
            Sort::Int => TOY_INT_RANGE.map(Val::Int).collect(),
            other => panic!("ToySolver has no brute-force domain for {other:?}"),
        }
    }

    fn eval(&self, term: &ToyTerm, assignment: &HashMap<ToyTerm, Val>) -> Val {
        match &*term.0 {
            TermNode::Symbol(..) => *assignment.get(term).expect("unassigned symbol during eval"),
            TermNode::Value(_, Literal::Bool(b)) => Val::Bool(*b),
            TermNode::Value(sort, Literal::BitVector(v)) => Val::Bv(Self::mask(Self::bv_width(sort), *v)),
            TermNode::Value(_, Literal::Int(v)) => Val::Int(*v),
            TermNode::Compound(op, children, sort) => self.eval_compound(*op, children, sort, assignment),
        }
    }

    fn eval_compound(&self, op: Op, children: &[ToyTerm], sort: &Sort, assignment: &HashMap<ToyTerm, Val>) -> Val {
        use Op::*;
        let v: Vec<Val> = children.iter().map(|c| self.eval(c, assignment)).collect();
        let as_bool = |val: Val| match val {
            Val::Bool(b) => b,
            other => panic!("expected Bool, got {other:?}"),
        };
        let as_bv = |val: Val| match val {
            Val::Bv(b) => b,
            other => panic!("expected bitvector, got {other:?}"),
        };
        match op {
            And => Val::Bool(v.iter().all(|x| as_bool(*x))),
            Or => Val::Bool(v.iter().any(|x| as_bool(*x))),
            Not => Val::Bool(!as_bool(v[0])),
            Implies => Val::Bool(!as_bool(v[0]) || as_bool(v[1])),
            Equal => Val::Bool(v[0] == v[1]),
            Ite => {
                if as_bool(v[0]) {
                    v[1]
                } else {
                    v[2]
                }
            }
            BVNot => Val::Bv(Self::mask(Self::bv_width(sort), !as_bv(v[0]))),
            BVAnd => Val::Bv(as_bv(v[0]) & as_bv(v[1])),
            BVOr => Val::Bv(as_bv(v[0]) | as_bv(v[1])),
            BVXor => Val::Bv(as_bv(v[0]) ^ as_bv(v[1])),
            BVAdd => Val::Bv(Self::mask(Self::bv_width(sort), as_bv(v[0]).wrapping_add(as_bv(v[1])))),
            BVSub => Val::Bv(Self::mask(Self::bv_width(sort), as_bv(v[0]).wrapping_sub(as_bv(v[1])))),
            BVShl => Val::Bv(Self::mask(Self::bv_width(sort), as_bv(v[0]) << as_bv(v[1]))),
            BVLshr => Val::Bv(as_bv(v[0]) >> as_bv(v[1])),
            BVConcat => {
                let low_width = Self::bv_width(&self.sort_of_node(&children[1]));
                Val::Bv(Self::mask(Self::bv_width(sort), (as_bv(v[0]) << low_width) | as_bv(v[1])))
            }
            BVExtract(high, low) => Val::Bv(Self::mask(high - low + 1, as_bv(v[0]) >> low)),
            BVZeroExtend(_) => Val::Bv(as_bv(v[0])),
            BVRotateLeft(n) => {
                let w = Self::bv_width(sort);
                let x = as_bv(v[0]);
                let n = n % w.max(1);
                Val::Bv(Self::mask(w, (x << n) | (x >> (w - n))))
            }
            BVRotateRight(n) => {
                let w = Self::bv_width(sort);
                let x = as_bv(v[0]);
                let n = n % w.max(1);
                Val::Bv(Self::mask(w, (x >> n) | (x << (w - n))))
            }
            BVUle => Val::Bool(as_bv(v[0]) <= as_bv(v[1])),
            BVUlt => Val::Bool(as_bv(v[0]) < as_bv(v[1])),
            BVUge => Val::Bool(as_bv(v[0]) >= as_bv(v[1])),
            BVUgt => Val::Bool(as_bv(v[0]) > as_bv(v[1])),
            Le => Val::Bool(match (v[0], v[1]) {
                (Val::Int(a), Val::Int(b)) => a <= b,
                other => panic!("Le over non-Int operands: {other:?}"),
            }),
            Lt => Val::Bool(match (v[0], v[1]) {
                (Val::Int(a), Val::Int(b)) => a < b,
                other => panic!("Lt over non-Int operands: {other:?}"),
            }),
            Ge => Val::Bool(match (v[0], v[1]) {
                (Val::Int(a), Val::Int(b)) => a >= b,
                other => panic!("Ge over non-Int operands: {other:?}"),
            }),
            Gt => Val::Bool(match (v[0], v[1]) {
                (Val::Int(a), Val::Int(b)) => a > b,
                other => panic!("Gt over non-Int operands: {other:?}"),
            }),
            Apply => panic!("ToySolver does not support uninterpreted functions"),
        }
    }

    /// Brute-forces satisfiability of the conjunction of `formulas` by trying every assignment of
    /// their free variables.
    fn solve(&self, formulas: &[ToyTerm]) -> Option<HashMap<ToyTerm, Val>> {
        let mut vars = HashSet::default();
        for f in formulas {
            self.free_vars(f, &mut vars);
        }
        let vars: Vec<ToyTerm> = vars.into_iter().collect();
        let domains: Vec<Vec<Val>> = vars.iter().map(|v| Self::domain(&self.sort_of_node(v))).collect();

        let total_bits: u32 = domains.iter().map(|d| Self::bits_for(d.len())).sum();
        assert!(
            total_bits <= MAX_STATE_SPACE_BITS,
            "ToySolver's brute-force search space is too large ({total_bits} bits); narrow the sorts/widths under test"
        );

        Self::search(&vars, &domains, 0, &mut HashMap::default(), formulas, self)
    }

    fn search(
        vars: &[ToyTerm],
        domains: &[Vec<Val>],
        i: usize,
        assignment: &mut HashMap<ToyTerm, Val>,
        formulas: &[ToyTerm],
        toy: &ToySolver,
    ) -> Option<HashMap<ToyTerm, Val>> {
        if i == vars.len() {
            return if formulas.iter().all(|f| matches!(toy.eval(f, assignment), Val::Bool(true))) {
                Some(assignment.clone())
            } else {
                None
            };
        }
        for val in &domains[i] {
            assignment.insert(vars[i].clone(), *val);
            if let Some(model) = Self::search(vars, domains, i + 1, assignment, formulas, toy) {
                return Some(model);
            }
        }
        assignment.remove(&vars[i]);
        None
    }

    fn value_to_term(&mut self, sort: &Sort, val: Val) -> ToyTerm {
        match (sort, val) {
            (Sort::Bool, Val::Bool(b)) => self.make_value(sort.clone(), Literal::Bool(b)),
            (Sort::BitVector(_), Val::Bv(b)) => self.make_value(sort.clone(), Literal::BitVector(b)),
            (Sort::Int, Val::Int(i)) => self.make_value(sort.clone(), Literal::Int(i)),
            (sort, val) => panic!("sort/value mismatch: {sort:?} vs {val:?}"),
        }
    }
}

impl Default for ToySolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ToySolver {
    /// Decodes a Bool-sorted value term produced by `get_value`/`make_value`.
    pub fn decode_bool(&self, term: &ToyTerm) -> bool {
        match &*term.0 {
            TermNode::Value(Sort::Bool, Literal::Bool(b)) => *b,
            other => panic!("decode_bool called on a non-Bool value term: {other:?}"),
        }
    }

    /// Decodes a bitvector-sorted value term produced by `get_value`/`make_value`.
    pub fn decode_bv(&self, term: &ToyTerm) -> u64 {
        match &*term.0 {
            TermNode::Value(Sort::BitVector(w), Literal::BitVector(v)) => Self::mask(*w, *v),
            other => panic!("decode_bv called on a non-bitvector value term: {other:?}"),
        }
    }
}

impl SmtSolver for ToySolver {
    type Term = ToyTerm;

    fn make_symbol(&mut self, name: &str, sort: Sort) -> ToyTerm {
        let key = format!("sym:{name}");
        self.intern(TermNode::Symbol(name.to_string(), sort), key)
    }

    fn make_value(&mut self, sort: Sort, literal: Literal) -> ToyTerm {
        let key = format!("val:{sort:?}:{literal:?}");
        self.intern(TermNode::Value(sort, literal), key)
    }

    fn make_term(&mut self, op: Op, args: &[ToyTerm]) -> Ic3Result<ToyTerm> {
        let sort = Self::result_sort(op, args, self);
        let key = format!("{op:?}:{sort:?}:{args:?}");
        Ok(self.intern(TermNode::Compound(op, args.to_vec(), sort), key))
    }

    fn sort_of(&self, term: &ToyTerm) -> Sort {
        self.sort_of_node(term)
    }

    fn is_symbolic_const(&self, term: &ToyTerm) -> bool {
        matches!(&*term.0, TermNode::Symbol(..))
    }

    fn is_uninterpreted_function_symbol(&self, _term: &ToyTerm) -> bool {
        false
    }

    fn is_value(&self, term: &ToyTerm) -> bool {
        matches!(&*term.0, TermNode::Value(..))
    }

    fn op_of(&self, term: &ToyTerm) -> Option<Op> {
        match &*term.0 {
            TermNode::Compound(op, ..) => Some(*op),
            _ => None,
        }
    }

    fn children(&self, term: &ToyTerm) -> Vec<ToyTerm> {
        match &*term.0 {
            TermNode::Compound(_, children, _) => children.clone(),
            _ => Vec::new(),
        }
    }

    fn substitute(&mut self, term: &ToyTerm, map: &HashMap<ToyTerm, ToyTerm>) -> ToyTerm {
        if let Some(replacement) = map.get(term) {
            return replacement.clone();
        }
        match &*term.0 {
            TermNode::Symbol(..) | TermNode::Value(..) => term.clone(),
            TermNode::Compound(op, children, _) => {
                let new_children: Vec<ToyTerm> = children.iter().map(|c| self.substitute(c, map)).collect();
                self.make_term(*op, &new_children).expect("substitution preserves well-sortedness")
            }
        }
    }

    fn push(&mut self) {
        self.scopes.push(Vec::new());
    }

    fn pop(&mut self) {
        self.scopes.pop();
        if self.scopes.is_empty() {
            self.scopes.push(Vec::new());
        }
    }

    fn assert_formula(&mut self, term: &ToyTerm) {
        self.scopes.last_mut().unwrap().push(term.clone());
    }

    fn check_sat(&mut self) -> SatResult {
        self.last_assumptions.clear();
        let formulas: Vec<ToyTerm> = self.asserted().cloned().collect();
        match self.solve(&formulas) {
            Some(model) => {
                self.model = model;
                SatResult::Sat
            }
            None => SatResult::Unsat,
        }
    }

    fn check_sat_assuming(&mut self, assumptions: &[ToyTerm]) -> SatResult {
        self.last_assumptions = assumptions.to_vec();
        let mut formulas: Vec<ToyTerm> = self.asserted().cloned().collect();
        formulas.extend_from_slice(assumptions);
        match self.solve(&formulas) {
            Some(model) => {
                self.model = model;
                SatResult::Sat
            }
            None => SatResult::Unsat,
        }
    }

    fn get_value(&mut self, term: &ToyTerm) -> ToyTerm {
        let sort = self.sort_of_node(term);
        let val = *self.model.get(term).unwrap_or(&Self::domain(&sort)[0]);
        self.value_to_term(&sort, val)
    }

    /// Approximates an unsat core by greedily dropping each of the last `check_sat_assuming`
    /// assumptions in turn, keeping the drop whenever the remainder (plus the permanent
    /// assertions) is still UNSAT. Not guaranteed minimal.
    fn get_unsat_core(&mut self) -> HashSet<ToyTerm> {
        let base: Vec<ToyTerm> = self.asserted().cloned().collect();
        let mut kept = self.last_assumptions.clone();

        let mut i = 0;
        while i < kept.len() {
            let mut trial = base.clone();
            trial.extend(kept.iter().enumerate().filter(|(j, _)| *j != i).map(|(_, t)| t.clone()));
            if self.solve(&trial).is_none() {
                kept.remove(i);
            } else {
                i += 1;
            }
        }

        base.into_iter().chain(kept).collect()
    }

    fn set_opt(&mut self, _name: &str, _value: &str) {}
}

impl InterpolatingSolver for ToySolver {
    fn reset_assertions(&mut self) {
        self.scopes = vec![Vec::new()];
    }

    /// Precondition: `a ∧ b` is UNSAT. Computes a Craig interpolant by projecting the models of
    /// `a` onto the variables `a` shares with `b`: `I := OR` over every distinct shared-variable
    /// assignment some full model of `a` extends, each written as a conjunction of equalities.
    /// `a → I` holds by construction; `I ∧ b` is UNSAT because any shared assignment `I` allows
    /// came from a genuine model of `a`, and `vars(a) \ vars(b)` / `vars(b) \ vars(a)` never
    /// appear in `I`, so combining that shared assignment with any model of `b` over `vars(b)`
    /// would reconstruct a model of `a ∧ b` — contradicting the precondition.
    fn get_interpolant(&mut self, a: &ToyTerm, b: &ToyTerm) -> Ic3Result<ToyTerm> {
        let mut vars_a = HashSet::default();
        let mut vars_b = HashSet::default();
        self.free_vars(a, &mut vars_a);
        self.free_vars(b, &mut vars_b);
        let shared: Vec<ToyTerm> = vars_a.intersection(&vars_b).cloned().collect();
        let vars_a: Vec<ToyTerm> = vars_a.into_iter().collect();
        let domains: Vec<Vec<Val>> = vars_a.iter().map(|v| Self::domain(&self.sort_of_node(v))).collect();

        let mut shared_models: HashSet<Vec<Val>> = HashSet::default();
        let mut assignment = HashMap::default();
        Self::collect_projections(&vars_a, &domains, 0, &mut assignment, a, &shared, self, &mut shared_models);

        if shared_models.is_empty() {
            // `a` is unsatisfiable on its own; `false` is trivially a valid interpolant.
            return Ok(self.make_value(Sort::Bool, Literal::Bool(false)));
        }

        let mut disjuncts = Vec::with_capacity(shared_models.len());
        for point in shared_models {
            let mut conjuncts = Vec::with_capacity(shared.len());
            for (var, val) in shared.iter().zip(point.into_iter()) {
                let sort = self.sort_of_node(var);
                let value_term = self.value_to_term(&sort, val);
                conjuncts.push(self.make_term(Op::Equal, &[var.clone(), value_term])?);
            }
            disjuncts.push(if conjuncts.len() == 1 {
                conjuncts.remove(0)
            } else {
                self.make_term(Op::And, &conjuncts)?
            });
        }

        if disjuncts.len() == 1 {
            Ok(disjuncts.remove(0))
        } else {
            self.make_term(Op::Or, &disjuncts)
        }
    }
}

impl ToySolver {
    #[allow(clippy::too_many_arguments)]
    fn collect_projections(
        vars: &[ToyTerm],
        domains: &[Vec<Val>],
        i: usize,
        assignment: &mut HashMap<ToyTerm, Val>,
        formula: &ToyTerm,
        shared: &[ToyTerm],
        toy: &ToySolver,
        out: &mut HashSet<Vec<Val>>,
    ) {
        if i == vars.len() {
            if matches!(toy.eval(formula, assignment), Val::Bool(true)) {
                out.insert(shared.iter().map(|v| *assignment.get(v).expect("shared var assigned")).collect());
            }
            return;
        }
        for val in &domains[i] {
            assignment.insert(vars[i].clone(), *val);
            Self::collect_projections(vars, domains, i + 1, assignment, formula, shared, toy, out);
        }
        assignment.remove(&vars[i]);
    }
}
