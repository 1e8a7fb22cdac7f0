/*!

A minimal, boolean-only brute-force `SmtSolver` used exclusively by this crate's own unit
tests. It exists so that `TermEnv`, `TransitionSystem`, `IC3Formula`, and engine unit tests can
exercise real push/pop/check-sat behavior without this crate depending on an external SMT
solver or on `mbic3-toy` (which depends on this crate). `mbic3-toy` carries the fuller,
bitvector-capable reference solver used for the end-to-end scenarios in spec §8.

Terms are hash-consed by structural content into `Rc<TermNode>`, so `Eq`/`Hash` reduce to
pointer identity once interned, matching the reference-identity guarantee spec §3 places on the
(external) Solver.

*/

#![cfg(test)]

use std::collections::hash_map::Entry;
use std::fmt;
use std::rc::Rc;

use mbic3_abs::{HashMap, HashSet};

use crate::error::Ic3Result;
use crate::solver::{Literal, Op, SatResult, SmtSolver, Sort};

#[derive(Clone, Eq, Debug)]
pub struct BoolTerm(Rc<TermNode>);

impl PartialEq for BoolTerm {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::hash::Hash for BoolTerm {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as usize).hash(state);
    }
}

#[derive(PartialEq, Eq, Hash, Debug)]
enum TermNode {
    Symbol(String),
    Value(bool),
    Compound(Op, Vec<BoolTerm>),
}

impl fmt::Display for BoolTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            TermNode::Symbol(name) => write!(f, "{name}"),
            TermNode::Value(b) => write!(f, "{b}"),
            TermNode::Compound(op, children) => {
                write!(f, "({op:?}")?;
                for c in children {
                    write!(f, " {c}")?;
                }
                write!(f, ")")
            }
        }
    }
}

pub struct BoolTestSolver {
    interned: HashMap<String, BoolTerm>,
    scopes: Vec<Vec<BoolTerm>>,
    model: HashMap<BoolTerm, bool>,
    last_assumptions: Vec<BoolTerm>,
}

impl BoolTestSolver {
    pub fn new() -> Self {
        BoolTestSolver {
            interned: HashMap::default(),
            scopes: vec![Vec::new()],
            model: HashMap::default(),
            last_assumptions: Vec::new(),
        }
    }

    fn intern(&mut self, node: TermNode, key: String) -> BoolTerm {
        match self.interned.entry(key) {
            Entry::Occupied(e) => e.get().clone(),
            Entry::Vacant(e) => {
                let term = BoolTerm(Rc::new(node));
                e.insert(term.clone());
                term
            }
        }
    }

    fn structural_key(node: &TermNode) -> String {
        format!("{node:?}")
    }

    fn asserted(&self) -> impl Iterator<Item = &BoolTerm> {
        self.scopes.iter().flatten()
    }

    fn free_vars(&self, term: &BoolTerm, out: &mut HashSet<BoolTerm>) {
        let mut stack = vec![term.clone()];
        let mut visited = HashSet::default();
        while let Some(t) = stack.pop() {
            if visited.contains(&t) {
                continue;
            }
            visited.insert(t.clone());
            match &*t.0 {
                TermNode::Symbol(_) => {
                    out.insert(t.clone());
                }
                TermNode::Value(_) => {}
                TermNode::Compound(_, children) => {
                    for c in children {
                        stack.push(c.clone());
                    }
                }
            }
        }
    }

    fn eval(term: &BoolTerm, assignment: &HashMap<BoolTerm, bool>) -> bool {
        match &*term.0 {
            TermNode::Symbol(_) => *assignment.get(term).expect("unassigned symbol"),
            TermNode::Value(b) => *b,
            TermNode::Compound(op, children) => {
                let v: Vec<bool> = children.iter().map(|c| Self::eval(c, assignment)).collect();
                match op {
                    Op::And => v.iter().all(|b| *b),
                    Op::Or => v.iter().any(|b| *b),
                    Op::Not => !v[0],
                    Op::Implies => !v[0] || v[1],
                    Op::Equal => v[0] == v[1],
                    Op::Ite => {
                        if v[0] {
                            v[1]
                        } else {
                            v[2]
                        }
                    }
                    _ => panic!("BoolTestSolver only supports boolean connectives, got {op:?}"),
                }
            }
        }
    }

    /// Brute-forces satisfiability over the given formulas, trying all assignments of the free
    /// variables. Fine for the handful of booleans these unit tests use.
    fn solve(formulas: &[BoolTerm]) -> Option<HashMap<BoolTerm, bool>> {
        let mut vars = HashSet::default();
        let dummy = BoolTestSolver::new();
        for f in formulas {
            dummy.free_vars(f, &mut vars);
        }
        let vars: Vec<BoolTerm> = vars.into_iter().collect();
        let n = vars.len();
        assert!(n <= 20, "too many free variables for brute force");

        for bits in 0u32..(1u32 << n) {
            let mut assignment = HashMap::default();
            for (i, v) in vars.iter().enumerate() {
                assignment.insert(v.clone(), (bits >> i) & 1 == 1);
            }
            if formulas.iter().all(|f| Self::eval(f, &assignment)) {
                return Some(assignment);
            }
        }
        None
    }
}

impl SmtSolver for BoolTestSolver {
    type Term = BoolTerm;

    fn make_symbol(&mut self, name: &str, sort: Sort) -> BoolTerm {
        assert_eq!(sort, Sort::Bool, "BoolTestSolver only supports Bool sort");
        self.intern(TermNode::Symbol(name.to_string()), format!("sym:{name}"))
    }

    fn make_value(&mut self, sort: Sort, literal: Literal) -> BoolTerm {
        assert_eq!(sort, Sort::Bool);
        let b = matches!(literal, Literal::Bool(true));
        let key = format!("val:{b}");
        self.intern(TermNode::Value(b), key)
    }

    fn make_term(&mut self, op: Op, args: &[BoolTerm]) -> Ic3Result<BoolTerm> {
        let node = TermNode::Compound(op, args.to_vec());
        let key = Self::structural_key(&node);
        Ok(self.intern(node, key))
    }

    fn sort_of(&self, _term: &BoolTerm) -> Sort {
        Sort::Bool
    }

    fn is_symbolic_const(&self, term: &BoolTerm) -> bool {
        matches!(&*term.0, TermNode::Symbol(_))
    }

    fn is_uninterpreted_function_symbol(&self, _term: &BoolTerm) -> bool {
        false
    }

    fn is_value(&self, term: &BoolTerm) -> bool {
        matches!(&*term.0, TermNode::Value(_))
    }

    fn op_of(&self, term: &BoolTerm) -> Option<Op> {
        match &*term.0 {
            TermNode::Compound(op, _) => Some(*op),
            _ => None,
        }
    }

    fn children(&self, term: &BoolTerm) -> Vec<BoolTerm> {
        match &*term.0 {
            TermNode::Compound(_, children) => children.clone(),
            _ => Vec::new(),
        }
    }

    fn substitute(&mut self, term: &BoolTerm, map: &HashMap<BoolTerm, BoolTerm>) -> BoolTerm {
        if let Some(replacement) = map.get(term) {
            return replacement.clone();
        }
        match &*term.0 {
            TermNode::Symbol(_) | TermNode::Value(_) => term.clone(),
            TermNode::Compound(op, children) => {
                let new_children: Vec<BoolTerm> =
                    children.iter().map(|c| self.substitute(c, map)).collect();
                self.make_term(*op, &new_children).unwrap()
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

    fn assert_formula(&mut self, term: &BoolTerm) {
        self.scopes.last_mut().unwrap().push(term.clone());
    }

    fn check_sat(&mut self) -> SatResult {
        self.last_assumptions.clear();
        let formulas: Vec<BoolTerm> = self.asserted().cloned().collect();
        match Self::solve(&formulas) {
            Some(model) => {
                self.model = model;
                SatResult::Sat
            }
            None => SatResult::Unsat,
        }
    }

    fn check_sat_assuming(&mut self, assumptions: &[BoolTerm]) -> SatResult {
        self.last_assumptions = assumptions.to_vec();
        let mut formulas: Vec<BoolTerm> = self.asserted().cloned().collect();
        formulas.extend_from_slice(assumptions);
        match Self::solve(&formulas) {
            Some(model) => {
                self.model = model;
                SatResult::Sat
            }
            None => SatResult::Unsat,
        }
    }

    fn get_value(&mut self, term: &BoolTerm) -> BoolTerm {
        let b = *self.model.get(term).unwrap_or(&false);
        self.make_value(Sort::Bool, Literal::Bool(b))
    }

    /// This brute-force solver doesn't produce a real proof-backed unsat core; it approximates
    /// one by greedily dropping each of the last `check_sat_assuming` assumptions in turn and
    /// keeping the drop whenever the remainder (plus the permanent assertions) is still UNSAT.
    /// Good enough for this crate's own unit tests, which only need *some* valid core, not a
    /// minimal one.
    fn get_unsat_core(&mut self) -> HashSet<BoolTerm> {
        let base: Vec<BoolTerm> = self.asserted().cloned().collect();
        let mut kept = self.last_assumptions.clone();

        let mut i = 0;
        while i < kept.len() {
            let mut trial = base.clone();
            trial.extend(kept.iter().enumerate().filter(|(j, _)| *j != i).map(|(_, t)| t.clone()));
            if Self::solve(&trial).is_none() {
                kept.remove(i);
            } else {
                i += 1;
            }
        }

        base.into_iter().chain(kept).collect()
    }

    fn set_opt(&mut self, _name: &str, _value: &str) {}
}

impl Default for BoolTestSolver {
    fn default() -> Self {
        Self::new()
    }
}
