//! In-process SAT solving through varisat.

use varisat::{ExtendFormula, Solver};

use super::{ConstraintSolver, SolverError, VarMap};
use crate::cnf::{ClauseSink, Lit, VarName};
use crate::timing::Timer;

/// Adapter around an in-process varisat solver instance.
pub struct VarisatSolver {
    solver: Solver<'static>,
    map: VarMap,
    model: Option<Vec<varisat::Lit>>,
    clauses: usize,
}

impl VarisatSolver {
    pub fn new() -> Self {
        Self {
            solver: Solver::new(),
            map: VarMap::new(),
            model: None,
            clauses: 0,
        }
    }

    fn translate(&mut self, lit: &Lit) -> varisat::Lit {
        varisat::Lit::from_dimacs(self.map.dimacs(lit) as isize)
    }
}

impl Default for VarisatSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ClauseSink for VarisatSolver {
    fn add_clause(&mut self, clause: &[Lit]) {
        let translated: Vec<varisat::Lit> = clause.iter().map(|l| self.translate(l)).collect();
        self.solver.add_clause(&translated);
        self.clauses += 1;
    }
}

impl ConstraintSolver for VarisatSolver {
    fn solve(&mut self, assumptions: &[Lit], timer: &mut Timer) -> Result<bool, SolverError> {
        let translated: Vec<varisat::Lit> =
            assumptions.iter().map(|l| self.translate(l)).collect();
        self.solver.assume(&translated);

        let solver = &mut self.solver;
        let satisfiable = timer
            .measure(|| solver.solve())
            .map_err(|e| SolverError::Failed {
                name: "varisat".to_string(),
                message: e.to_string(),
            })?;

        self.model = if satisfiable { self.solver.model() } else { None };
        Ok(satisfiable)
    }

    fn value(&self, var: &VarName) -> Option<bool> {
        let index = self.map.lookup(var)?;
        let model = self.model.as_ref()?;
        model.get(index).map(|lit| lit.is_positive())
    }

    fn num_variables(&self) -> usize {
        self.map.len()
    }

    fn num_clauses(&self) -> usize {
        self.clauses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(id: u32) -> Lit {
        Lit::pos(VarName::Aux(id))
    }

    #[test]
    fn solves_and_reports_a_model() {
        let mut solver = VarisatSolver::new();
        solver.add_clause(&[lit(0), lit(1)]);
        solver.add_clause(&[!lit(0)]);
        let mut timer = Timer::new();
        assert!(solver.solve(&[], &mut timer).unwrap());
        assert_eq!(solver.value(&VarName::Aux(0)), Some(false));
        assert_eq!(solver.value(&VarName::Aux(1)), Some(true));
        assert_eq!(solver.num_variables(), 2);
        assert_eq!(solver.num_clauses(), 2);
    }

    #[test]
    fn assumptions_are_transient() {
        let mut solver = VarisatSolver::new();
        solver.add_clause(&[lit(0), lit(1)]);
        let mut timer = Timer::new();
        assert!(!solver
            .solve(&[!lit(0), !lit(1)], &mut timer)
            .unwrap());
        assert!(solver.solve(&[], &mut timer).unwrap());
    }

    #[test]
    fn unsatisfiable_formula_has_no_model() {
        let mut solver = VarisatSolver::new();
        solver.add_clause(&[lit(0)]);
        solver.add_clause(&[!lit(0)]);
        let mut timer = Timer::new();
        assert!(!solver.solve(&[], &mut timer).unwrap());
        assert_eq!(solver.value(&VarName::Aux(0)), None);
    }
}
