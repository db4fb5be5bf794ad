//! Solver adapters: interning of structured variables and the common
//! constraint-solver interface implemented by the in-process and
//! subprocess backends.

mod dimacs;
mod varisat;

use std::collections::HashMap;
use std::fmt;
use std::io;

pub use self::dimacs::{DimacsSolver, QdimacsSolver};
pub use self::varisat::VarisatSolver;

use crate::cnf::{ClauseSink, Lit, VarName};
use crate::timing::Timer;

/// An error raised by a solver backend.
///
/// Backend failures are kept distinct from unsatisfiability: a crashed or
/// garbled solver must never be interpreted as "no lattice exists".
#[derive(Debug)]
pub enum SolverError {
    /// The requested backend is not known or not installed.
    Unavailable { name: String },
    /// The backend ran but failed or produced unparseable output.
    Failed { name: String, message: String },
    /// An I/O error occurred while talking to a subprocess backend.
    Io(io::Error),
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverError::Unavailable { name } => write!(f, "solver '{}' is not available", name),
            SolverError::Failed { name, message } => {
                write!(f, "solver '{}' failed: {}", name, message)
            }
            SolverError::Io(e) => write!(f, "solver I/O error: {}", e),
        }
    }
}

impl std::error::Error for SolverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SolverError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SolverError {
    fn from(error: io::Error) -> Self {
        SolverError::Io(error)
    }
}

/// A propositional solver accepting streamed clauses.
pub trait ConstraintSolver: ClauseSink {
    /// Solves under the given assumptions, accumulating solver time into
    /// the timer. Returns whether the formula is satisfiable.
    fn solve(&mut self, assumptions: &[Lit], timer: &mut Timer) -> Result<bool, SolverError>;

    /// The value of a variable in the most recent model.
    ///
    /// Returns None for variables the model does not mention, which
    /// includes every variable after an unsatisfiable result.
    fn value(&self, var: &VarName) -> Option<bool>;

    fn num_variables(&self) -> usize;

    fn num_clauses(&self) -> usize;
}

/// Stable mapping from structured variable names to solver integers in
/// order of first appearance.
#[derive(Debug, Default)]
pub(crate) struct VarMap {
    indices: HashMap<VarName, usize>,
    names: Vec<VarName>,
}

impl VarMap {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The 0-based index of the variable, interning it if new.
    pub(crate) fn index(&mut self, var: VarName) -> usize {
        let names = &mut self.names;
        *self.indices.entry(var).or_insert_with(|| {
            names.push(var);
            names.len() - 1
        })
    }

    pub(crate) fn lookup(&self, var: &VarName) -> Option<usize> {
        self.indices.get(var).copied()
    }

    /// The 1-based DIMACS integer of a literal.
    pub(crate) fn dimacs(&mut self, lit: &Lit) -> i64 {
        let index = self.index(lit.var) as i64 + 1;
        if lit.negated {
            -index
        } else {
            index
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.names.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_stable() {
        let mut map = VarMap::new();
        let a = VarName::Aux(7);
        let b = VarName::Constant;
        assert_eq!(map.index(a), 0);
        assert_eq!(map.index(b), 1);
        assert_eq!(map.index(a), 0);
        assert_eq!(map.lookup(&b), Some(1));
        assert_eq!(map.lookup(&VarName::Aux(8)), None);
        assert_eq!(map.dimacs(&Lit::neg(a)), -1);
        assert_eq!(map.len(), 2);
    }
}
