//! Subprocess solver backends speaking DIMACS CNF and QDIMACS.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::process::{Command, Stdio};

use log::debug;

use super::{ConstraintSolver, SolverError, VarMap};
use crate::cnf::{ClauseSink, Lit, VarName};
use crate::timing::Timer;

fn unavailable(name: &str) -> SolverError {
    SolverError::Unavailable {
        name: name.to_string(),
    }
}

fn failed(name: &str, message: impl Into<String>) -> SolverError {
    SolverError::Failed {
        name: name.to_string(),
        message: message.into(),
    }
}

/// Runs the solver executable, feeding it the given input on stdin, and
/// returns its standard output.
fn run_process(
    name: &str,
    program: &str,
    args: &[String],
    input: Option<&str>,
    timer: &mut Timer,
) -> Result<String, SolverError> {
    let mut command = Command::new(program);
    command.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());
    command.stdin(if input.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });

    timer.measure(|| -> Result<String, SolverError> {
        let mut child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                unavailable(name)
            } else {
                SolverError::Io(e)
            }
        })?;
        if let Some(input) = input {
            child
                .stdin
                .take()
                .expect("stdin was requested")
                .write_all(input.as_bytes())?;
        }
        let output = child.wait_with_output()?;
        String::from_utf8(output.stdout)
            .map_err(|_| failed(name, "output is not valid UTF-8"))
    })
}

fn clause_line(clause: &[i64]) -> String {
    let mut line = String::new();
    for literal in clause {
        line.push_str(&literal.to_string());
        line.push(' ');
    }
    line.push('0');
    line
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// The formula is piped to the solver on stdin.
    Stdin,
    /// The formula and the result are exchanged through temporary files.
    File,
}

/// SAT solving through an external DIMACS solver executable.
pub struct DimacsSolver {
    name: String,
    args: Vec<String>,
    mode: Mode,
    map: VarMap,
    clauses: Vec<Vec<i64>>,
    model: Option<Vec<bool>>,
}

impl DimacsSolver {
    /// Creates an adapter for one of the known solver executables.
    pub fn from_known(name: &str) -> Result<Self, SolverError> {
        let (args, mode) = match name {
            "minisat" => (Vec::new(), Mode::File),
            "cryptominisat5" => (Vec::new(), Mode::Stdin),
            _ => return Err(unavailable(name)),
        };
        Ok(Self {
            name: name.to_string(),
            args,
            mode,
            map: VarMap::new(),
            clauses: Vec::new(),
            model: None,
        })
    }

    fn generate_input(&self, assumptions: &[Vec<i64>]) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "p cnf {} {}\n",
            self.map.len(),
            self.clauses.len() + assumptions.len()
        ));
        for clause in self.clauses.iter().chain(assumptions) {
            out.push_str(&clause_line(clause));
            out.push('\n');
        }
        out
    }

    /// Parses solution-style output: an `s` verdict line with `v` model
    /// lines (cryptominisat and friends).
    fn parse_solution_output(&self, output: &str) -> Result<Option<Vec<i64>>, SolverError> {
        let mut verdict = None;
        let mut literals = Vec::new();
        for line in output.lines() {
            if let Some(rest) = line.strip_prefix("s ") {
                verdict = Some(rest.trim().to_string());
            } else if let Some(rest) = line.strip_prefix("v ") {
                for token in rest.split_whitespace() {
                    let literal: i64 = token
                        .parse()
                        .map_err(|_| failed(&self.name, "malformed model line"))?;
                    if literal != 0 {
                        literals.push(literal);
                    }
                }
            }
        }
        match verdict.as_deref() {
            Some("SATISFIABLE") => Ok(Some(literals)),
            Some("UNSATISFIABLE") => Ok(None),
            _ => Err(failed(&self.name, "missing verdict in output")),
        }
    }

    /// Parses result-file output: a `SAT`/`UNSAT` line followed by the
    /// model literals (minisat).
    fn parse_result_file(&self, output: &str) -> Result<Option<Vec<i64>>, SolverError> {
        let mut lines = output.lines();
        match lines.next().map(str::trim) {
            Some("SAT") => {
                let mut literals = Vec::new();
                for token in lines.flat_map(str::split_whitespace) {
                    let literal: i64 = token
                        .parse()
                        .map_err(|_| failed(&self.name, "malformed model line"))?;
                    if literal != 0 {
                        literals.push(literal);
                    }
                }
                Ok(Some(literals))
            }
            Some("UNSAT") => Ok(None),
            _ => Err(failed(&self.name, "missing verdict in result file")),
        }
    }

    fn store_model(&mut self, literals: Vec<i64>) {
        let mut model = vec![false; self.map.len()];
        for literal in literals {
            let index = literal.unsigned_abs() as usize - 1;
            if index < model.len() {
                model[index] = literal > 0;
            }
        }
        self.model = Some(model);
    }
}

impl ClauseSink for DimacsSolver {
    fn add_clause(&mut self, clause: &[Lit]) {
        let map = &mut self.map;
        self.clauses.push(clause.iter().map(|l| map.dimacs(l)).collect());
    }
}

impl ConstraintSolver for DimacsSolver {
    fn solve(&mut self, assumptions: &[Lit], timer: &mut Timer) -> Result<bool, SolverError> {
        let map = &mut self.map;
        let assumption_clauses: Vec<Vec<i64>> =
            assumptions.iter().map(|l| vec![map.dimacs(l)]).collect();
        let input = self.generate_input(&assumption_clauses);
        debug!(
            "Running {} on {} variables, {} clauses",
            self.name,
            self.map.len(),
            self.clauses.len() + assumption_clauses.len()
        );

        let literals = match self.mode {
            Mode::Stdin => {
                let output = run_process(&self.name, &self.name, &self.args, Some(&input), timer)?;
                self.parse_solution_output(&output)?
            }
            Mode::File => {
                // both temporary files are removed when the guards drop
                let mut input_file = tempfile::NamedTempFile::new()?;
                input_file.write_all(input.as_bytes())?;
                input_file.flush()?;
                let result_file = tempfile::NamedTempFile::new()?;

                let mut args = self.args.clone();
                args.push(input_file.path().display().to_string());
                args.push(result_file.path().display().to_string());
                run_process(&self.name, &self.name, &args, None, timer)?;

                let mut result = String::new();
                result_file.reopen()?.read_to_string(&mut result)?;
                self.parse_result_file(&result)?
            }
        };

        match literals {
            Some(literals) => {
                self.store_model(literals);
                Ok(true)
            }
            None => {
                self.model = None;
                Ok(false)
            }
        }
    }

    fn value(&self, var: &VarName) -> Option<bool> {
        let index = self.map.lookup(var)?;
        self.model.as_ref()?.get(index).copied()
    }

    fn num_variables(&self) -> usize {
        self.map.len()
    }

    fn num_clauses(&self) -> usize {
        self.clauses.len()
    }
}

/// QBF solving through an external QDIMACS solver executable.
///
/// Variables not covered by an explicit quantifier block are existentially
/// quantified in an automatically appended innermost block.
pub struct QdimacsSolver {
    name: String,
    args: Vec<String>,
    map: VarMap,
    clauses: Vec<Vec<i64>>,
    quantifiers: Vec<(bool, Vec<usize>)>,
    model: Option<HashMap<usize, bool>>,
}

impl QdimacsSolver {
    /// Creates an adapter for one of the known QBF solver executables.
    pub fn from_known(name: &str) -> Result<Self, SolverError> {
        let args = match name {
            "depqbf" => vec!["--qdo".to_string()],
            _ => return Err(unavailable(name)),
        };
        Ok(Self {
            name: name.to_string(),
            args,
            map: VarMap::new(),
            clauses: Vec::new(),
            quantifiers: Vec::new(),
            model: None,
        })
    }

    /// Pushes an existential quantifier block.
    pub fn exists(&mut self, vars: &[VarName]) {
        assert!(
            self.quantifiers.last().map_or(true, |(universal, _)| *universal),
            "adjacent existential blocks"
        );
        let block = vars.iter().map(|&v| self.map.index(v)).collect();
        self.quantifiers.push((false, block));
    }

    /// Pushes a universal quantifier block.
    pub fn forall(&mut self, vars: &[VarName]) {
        assert!(
            self.quantifiers.last().map_or(true, |(universal, _)| !*universal),
            "adjacent universal blocks"
        );
        let block = vars.iter().map(|&v| self.map.index(v)).collect();
        self.quantifiers.push((true, block));
    }

    fn generate_input(&self, assumptions: &[Vec<i64>]) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "p cnf {} {}\n",
            self.map.len(),
            self.clauses.len() + assumptions.len()
        ));

        let mut quantified = vec![false; self.map.len()];
        for (_, block) in &self.quantifiers {
            for &index in block {
                quantified[index] = true;
            }
        }
        for (universal, block) in &self.quantifiers {
            out.push(if *universal { 'a' } else { 'e' });
            for &index in block {
                out.push_str(&format!(" {}", index + 1));
            }
            out.push_str(" 0\n");
        }
        // free variables become the innermost existential block
        let free: Vec<usize> = (0..self.map.len()).filter(|&i| !quantified[i]).collect();
        if !free.is_empty() && self.quantifiers.last().map_or(false, |(u, _)| *u) {
            out.push('e');
            for index in free {
                out.push_str(&format!(" {}", index + 1));
            }
            out.push_str(" 0\n");
        }

        for clause in self.clauses.iter().chain(assumptions) {
            out.push_str(&clause_line(clause));
            out.push('\n');
        }
        out
    }

    fn parse_output(&self, output: &str) -> Result<Option<Vec<i64>>, SolverError> {
        let mut verdict = None;
        let mut literals = Vec::new();
        for line in output.lines() {
            if line.starts_with('c') {
                continue;
            }
            if let Some(rest) = line.strip_prefix("s ") {
                verdict = Some(rest.trim().to_string());
            } else if let Some(rest) = line.strip_prefix('V') {
                for token in rest.split_whitespace() {
                    let literal: i64 = token
                        .parse()
                        .map_err(|_| failed(&self.name, "malformed certificate line"))?;
                    if literal != 0 {
                        literals.push(literal);
                    }
                }
            }
        }
        match verdict.as_deref() {
            Some("cnf 1") => Ok(Some(literals)),
            Some("cnf 0") => Ok(None),
            _ => Err(failed(&self.name, "missing verdict in output")),
        }
    }
}

impl ClauseSink for QdimacsSolver {
    fn add_clause(&mut self, clause: &[Lit]) {
        let map = &mut self.map;
        self.clauses.push(clause.iter().map(|l| map.dimacs(l)).collect());
    }
}

impl ConstraintSolver for QdimacsSolver {
    fn solve(&mut self, assumptions: &[Lit], timer: &mut Timer) -> Result<bool, SolverError> {
        let map = &mut self.map;
        let assumption_clauses: Vec<Vec<i64>> =
            assumptions.iter().map(|l| vec![map.dimacs(l)]).collect();
        let input = self.generate_input(&assumption_clauses);
        debug!(
            "Running {} on {} variables, {} clauses",
            self.name,
            self.map.len(),
            self.clauses.len() + assumption_clauses.len()
        );

        let output = run_process(&self.name, &self.name, &self.args, Some(&input), timer)?;
        match self.parse_output(&output)? {
            Some(literals) => {
                let mut model = HashMap::with_capacity(literals.len());
                for literal in literals {
                    model.insert(literal.unsigned_abs() as usize - 1, literal > 0);
                }
                self.model = Some(model);
                Ok(true)
            }
            None => {
                self.model = None;
                Ok(false)
            }
        }
    }

    fn value(&self, var: &VarName) -> Option<bool> {
        let index = self.map.lookup(var)?;
        self.model.as_ref()?.get(&index).copied()
    }

    fn num_variables(&self) -> usize {
        self.map.len()
    }

    fn num_clauses(&self) -> usize {
        self.clauses.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(id: u32) -> Lit {
        Lit::pos(VarName::Aux(id))
    }

    #[test]
    fn qdimacs_appends_the_free_variable_block() {
        let mut solver = QdimacsSolver::from_known("depqbf").unwrap();
        solver.exists(&[VarName::Aux(0)]);
        solver.forall(&[VarName::Aux(1)]);
        solver.add_clause(&[lit(0), !lit(1), lit(2)]);
        let input = solver.generate_input(&[]);
        assert_eq!(input, "p cnf 3 1\ne 1 0\na 2 0\ne 3 0\n1 -2 3 0\n");
    }

    #[test]
    fn qdimacs_parses_verdicts_and_certificates() {
        let solver = QdimacsSolver::from_known("depqbf").unwrap();
        assert_eq!(
            solver.parse_output("s cnf 1\nV 1 0\nV -2 0\n").unwrap(),
            Some(vec![1, -2])
        );
        assert_eq!(solver.parse_output("s cnf 0\n").unwrap(), None);
        assert!(solver.parse_output("segmentation fault\n").is_err());
    }

    #[test]
    fn dimacs_input_has_assumption_clauses() {
        let mut solver = DimacsSolver::from_known("cryptominisat5").unwrap();
        solver.add_clause(&[lit(0), lit(1)]);
        let input = solver.generate_input(&[vec![-1]]);
        assert_eq!(input, "p cnf 2 2\n1 2 0\n-1 0\n");
    }

    #[test]
    fn dimacs_parses_both_output_styles() {
        let solver = DimacsSolver::from_known("cryptominisat5").unwrap();
        assert_eq!(
            solver
                .parse_solution_output("c comment\ns SATISFIABLE\nv 1 -2 0\n")
                .unwrap(),
            Some(vec![1, -2])
        );
        assert_eq!(
            solver.parse_solution_output("s UNSATISFIABLE\n").unwrap(),
            None
        );
        assert!(solver.parse_solution_output("").is_err());

        let minisat = DimacsSolver::from_known("minisat").unwrap();
        assert_eq!(
            minisat.parse_result_file("SAT\n1 -2 0\n").unwrap(),
            Some(vec![1, -2])
        );
        assert_eq!(minisat.parse_result_file("UNSAT\n").unwrap(), None);
        assert!(minisat.parse_result_file("INDET\n").is_err());
    }

    #[test]
    fn unknown_backends_are_rejected() {
        assert!(matches!(
            DimacsSolver::from_known("picosat"),
            Err(SolverError::Unavailable { .. })
        ));
        assert!(matches!(
            QdimacsSolver::from_known("rareqs"),
            Err(SolverError::Unavailable { .. })
        ));
    }
}
