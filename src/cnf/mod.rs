//! Propositional groundwork shared by all lattice encodings: structured
//! variable names, literals, clause sinks and cardinality constraints.

pub(crate) mod cardinality;
pub(crate) mod cardnet;
pub(crate) mod sequential;

use std::ops::Not;

use crate::function::VarId;

/// A candidate cell label: a function input or the distinguished constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LabelTarget {
    /// A function input variable.
    Input(VarId),
    /// The always-true constant variable.
    Constant,
}

/// A two-sided cell label candidate: a target together with its polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellLiteral {
    pub target: LabelTarget,
    pub negated: bool,
}

/// Structured identity of a propositional variable.
///
/// Value equality of these names is the key for interning into solver
/// integers, and the `Label` variant round-trips solver models back into
/// lattice cells. The `tag` fields keep per-assignment subcircuits of the
/// unfolded encodings disjoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarName {
    /// A function input.
    Input(VarId),
    /// The always-true constant.
    Constant,
    /// Cell (i, j) carries the given label.
    Label { i: u32, j: u32, literal: CellLiteral },
    /// Cell (i, j) lies on the conducting top-to-bottom path.
    Path { i: u32, j: u32, tag: Option<u32> },
    /// Cell (i, j) lies on the blocking left-to-right path.
    NegPath { i: u32, j: u32, tag: Option<u32> },
    /// Cell (i, j) is a closed switch under the current inputs.
    Switch { i: u32, j: u32, tag: Option<u32> },
    /// Cell (i, j) is an open switch under the current inputs.
    NegSwitch { i: u32, j: u32, tag: Option<u32> },
    /// Cell (i, j) is reachable from the top row within `round` steps.
    Reach { i: u32, j: u32, round: u32, tag: Option<u32> },
    /// Cell (i, j) is reachable from the left column within `round` steps.
    NegReach { i: u32, j: u32, round: u32, tag: Option<u32> },
    /// Fresh auxiliary introduced by an encoder.
    Aux(u32),
}

/// A propositional literal over a structured variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lit {
    pub var: VarName,
    pub negated: bool,
}

impl Lit {
    pub fn pos(var: VarName) -> Self {
        Self { var, negated: false }
    }

    pub fn neg(var: VarName) -> Self {
        Self { var, negated: true }
    }
}

impl Not for Lit {
    type Output = Lit;

    fn not(self) -> Lit {
        Lit {
            var: self.var,
            negated: !self.negated,
        }
    }
}

/// Receiver for a stream of CNF clauses.
///
/// Encoders emit one clause at a time so the full formula is never
/// materialised; solver adapters implement this by interning the literals
/// directly into their own representation.
pub trait ClauseSink {
    fn add_clause(&mut self, clause: &[Lit]);
}

impl ClauseSink for Vec<Vec<Lit>> {
    fn add_clause(&mut self, clause: &[Lit]) {
        self.push(clause.to_vec());
    }
}

/// Source of fresh auxiliary variables and unfolding tags.
///
/// One allocator is created per oracle invocation; freshness is only needed
/// within a single formula.
#[derive(Debug, Default)]
pub struct AuxAllocator {
    next: u32,
}

impl AuxAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> VarName {
        let id = self.next;
        self.next += 1;
        VarName::Aux(id)
    }

    pub fn fresh_lit(&mut self) -> Lit {
        Lit::pos(self.fresh())
    }

    pub fn fresh_tag(&mut self) -> u32 {
        let tag = self.next;
        self.next += 1;
        tag
    }
}

/// Emits `antecedent => (c_1 | ... | c_k)` as a single clause.
pub(crate) fn imply(sink: &mut impl ClauseSink, antecedent: Lit, consequent: &[Lit]) {
    let mut clause = Vec::with_capacity(1 + consequent.len());
    clause.push(!antecedent);
    clause.extend_from_slice(consequent);
    sink.add_clause(&clause);
}

/// Reifies a conjunction of clauses by an equivalence literal.
///
/// Each clause c is re-expressed as a fresh auxiliary b with b <=> c, and
/// eq <=> (b_1 & ... & b_k) is asserted.
pub(crate) fn reify_clauses(
    sink: &mut impl ClauseSink,
    aux: &mut AuxAllocator,
    clauses: &[Vec<Lit>],
    eq: Lit,
) {
    let mut markers = Vec::with_capacity(clauses.len());
    for clause in clauses {
        let b = aux.fresh_lit();
        imply(sink, b, clause);
        for &lit in clause {
            sink.add_clause(&[!lit, b]);
        }
        markers.push(b);
    }
    for &b in &markers {
        sink.add_clause(&[!eq, b]);
    }
    let mut closing: Vec<Lit> = markers.into_iter().map(|b| !b).collect();
    closing.push(eq);
    sink.add_clause(&closing);
}

/// Reifies a single clause by an equivalence literal: eq <=> (c_1 | ...).
pub(crate) fn reify_clause(sink: &mut impl ClauseSink, clause: &[Lit], eq: Lit) {
    imply(sink, eq, clause);
    for &lit in clause {
        sink.add_clause(&[!lit, eq]);
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::{ClauseSink, Lit, VarName};
    use crate::function::VarId;
    use crate::solver::{ConstraintSolver, VarisatSolver};
    use crate::timing::Timer;

    /// Positive literals over the first `len` input variables.
    pub(crate) fn var_lits(len: usize) -> Vec<Lit> {
        (0..len as u32)
            .map(|i| Lit::pos(VarName::Input(VarId::new(i))))
            .collect()
    }

    pub(crate) fn all_assignments(len: usize) -> impl Iterator<Item = u64> {
        0..1u64 << len
    }

    pub(crate) fn count_ones(mask: u64) -> usize {
        mask.count_ones() as usize
    }

    /// Whether the clauses are satisfiable with the given literals fixed
    /// according to `mask` and the extra assumptions asserted.
    pub(crate) fn sat_under(
        clauses: &[Vec<Lit>],
        lits: &[Lit],
        mask: u64,
        extra: &[Lit],
    ) -> bool {
        let mut solver = VarisatSolver::new();
        for clause in clauses {
            solver.add_clause(clause);
        }
        let mut assumptions: Vec<Lit> = lits
            .iter()
            .enumerate()
            .map(|(i, &l)| if mask & (1 << i) != 0 { l } else { !l })
            .collect();
        assumptions.extend_from_slice(extra);
        let mut timer = Timer::new();
        solver
            .solve(&assumptions, &mut timer)
            .expect("sat solver failed")
    }
}
