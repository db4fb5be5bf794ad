//! Synthesis drivers: reduce one candidate lattice size to constraint
//! solving and decode the result.

use log::{debug, trace};

use crate::cnf::AuxAllocator;
use crate::encode::irredundant::Irredundant;
use crate::encode::reachability::Reachability;
use crate::encode::{Encoding, Frame};
use crate::function::Function;
use crate::lattice::Lattice;
use crate::options::{Method, SynthesisOptions, Technique};
use crate::solver::{
    ConstraintSolver, DimacsSolver, QdimacsSolver, SolverError, VarisatSolver,
};
use crate::timing::Timer;
use crate::Error;

/// Result of one synthesis attempt at a fixed lattice size.
#[derive(Debug, Clone)]
pub struct SynthOutcome {
    /// Whether a valid labelling exists.
    pub found: bool,
    /// The decoded labelling, unless decoding was disabled or the size
    /// admits no lattice.
    pub lattice: Option<Lattice>,
    pub num_variables: usize,
    pub num_clauses: usize,
    /// Number of refinement iterations, for the refining driver.
    pub unfolding_steps: Option<usize>,
}

impl SynthOutcome {
    fn unsat<S: ConstraintSolver>(solver: &S, unfolding_steps: Option<usize>) -> Self {
        Self {
            found: false,
            lattice: None,
            num_variables: solver.num_variables(),
            num_clauses: solver.num_clauses(),
            unfolding_steps,
        }
    }

    fn sat<S: ConstraintSolver>(
        solver: &S,
        frame: &Frame<'_>,
        no_decode: bool,
        unfolding_steps: Option<usize>,
    ) -> Self {
        Self {
            found: true,
            lattice: if no_decode {
                None
            } else {
                Some(frame.decode(solver))
            },
            num_variables: solver.num_variables(),
            num_clauses: solver.num_clauses(),
            unfolding_steps,
        }
    }
}

/// The SAT backends available to the propositional drivers.
enum SatSolver {
    Varisat(VarisatSolver),
    Dimacs(DimacsSolver),
}

impl SatSolver {
    fn from_name(name: &str) -> Result<Self, SolverError> {
        if name == "varisat" {
            Ok(SatSolver::Varisat(VarisatSolver::new()))
        } else {
            Ok(SatSolver::Dimacs(DimacsSolver::from_known(name)?))
        }
    }
}

impl crate::cnf::ClauseSink for SatSolver {
    fn add_clause(&mut self, clause: &[crate::cnf::Lit]) {
        match self {
            SatSolver::Varisat(s) => s.add_clause(clause),
            SatSolver::Dimacs(s) => s.add_clause(clause),
        }
    }
}

impl ConstraintSolver for SatSolver {
    fn solve(
        &mut self,
        assumptions: &[crate::cnf::Lit],
        timer: &mut Timer,
    ) -> Result<bool, SolverError> {
        match self {
            SatSolver::Varisat(s) => s.solve(assumptions, timer),
            SatSolver::Dimacs(s) => s.solve(assumptions, timer),
        }
    }

    fn value(&self, var: &crate::cnf::VarName) -> Option<bool> {
        match self {
            SatSolver::Varisat(s) => s.value(var),
            SatSolver::Dimacs(s) => s.value(var),
        }
    }

    fn num_variables(&self) -> usize {
        match self {
            SatSolver::Varisat(s) => s.num_variables(),
            SatSolver::Dimacs(s) => s.num_variables(),
        }
    }

    fn num_clauses(&self) -> usize {
        match self {
            SatSolver::Varisat(s) => s.num_clauses(),
            SatSolver::Dimacs(s) => s.num_clauses(),
        }
    }
}

/// Quantified synthesis: bind the labels existentially and the inputs
/// universally, and hand the formula to a QBF solver.
fn qbf_synth<E: Encoding>(
    function: &Function,
    m: usize,
    n: usize,
    qbf_solver: &str,
    no_decode: bool,
    timer: &mut Timer,
) -> Result<SynthOutcome, Error> {
    let frame = Frame::new(function, m, n);
    let mut aux = AuxAllocator::new();
    let mut solver = QdimacsSolver::from_known(qbf_solver)?;

    solver.exists(&frame.label_vars());
    solver.forall(&frame.input_vars());
    frame.emit_base(&mut aux, &mut solver);
    E::universal(&frame, &mut aux, &mut solver);
    trace!(
        "Quantified formula for {}x{}: {} variables, {} clauses",
        m,
        n,
        solver.num_variables(),
        solver.num_clauses()
    );

    if solver.solve(&[], timer)? {
        Ok(SynthOutcome::sat(&solver, &frame, no_decode, None))
    } else {
        Ok(SynthOutcome::unsat(&solver, None))
    }
}

/// Unfolded synthesis: one propositional block per input assignment.
fn unfolded_synth<E: Encoding>(
    function: &Function,
    m: usize,
    n: usize,
    sat_solver: &str,
    no_decode: bool,
    timer: &mut Timer,
) -> Result<SynthOutcome, Error> {
    let frame = Frame::new(function, m, n);
    let mut aux = AuxAllocator::new();
    let mut solver = SatSolver::from_name(sat_solver)?;

    frame.emit_base(&mut aux, &mut solver);
    for assignment in function.assignments() {
        let tag = aux.fresh_tag();
        E::assignment(&frame, assignment, tag, &mut aux, &mut solver);
    }
    trace!(
        "Unfolded formula for {}x{}: {} variables, {} clauses",
        m,
        n,
        solver.num_variables(),
        solver.num_clauses()
    );

    if solver.solve(&[], timer)? {
        Ok(SynthOutcome::sat(&solver, &frame, no_decode, None))
    } else {
        Ok(SynthOutcome::unsat(&solver, None))
    }
}

/// Refining synthesis: alternate between a refining solver proposing
/// labellings and a counterexample solver searching for inputs on which
/// the proposal computes the wrong value.
fn cegar_synth<E: Encoding>(
    function: &Function,
    m: usize,
    n: usize,
    sat_solver: &str,
    no_decode: bool,
    timer: &mut Timer,
) -> Result<SynthOutcome, Error> {
    let frame = Frame::new(function, m, n);
    let mut aux = AuxAllocator::new();
    let mut refining = SatSolver::from_name(sat_solver)?;
    let mut counterexample = SatSolver::from_name(sat_solver)?;

    frame.emit_base(&mut aux, &mut refining);
    frame.emit_base(&mut aux, &mut counterexample);
    E::counterexample(&frame, &mut aux, &mut counterexample);

    let mut steps = 0usize;
    loop {
        if !refining.solve(&[], timer)? {
            debug!("Refinement exhausted after {} steps", steps);
            return Ok(SynthOutcome::unsat(&refining, Some(steps)));
        }

        let labelling = frame.label_assumptions(&refining);
        if !counterexample.solve(&labelling, timer)? {
            debug!("Labelling verified after {} steps", steps);
            return Ok(SynthOutcome::sat(&refining, &frame, no_decode, Some(steps)));
        }

        let witness = frame.model_assignment(&counterexample);
        trace!("Refining against input {:#b}", witness.mask());
        let tag = aux.fresh_tag();
        E::assignment(&frame, witness, tag, &mut aux, &mut refining);
        steps += 1;
    }
}

/// A synthesis oracle for a fixed function, method and technique,
/// invocable at any candidate lattice size.
pub struct Synthesizer<'f> {
    function: &'f Function,
    method: Method,
    technique: Technique,
    sat_solver: String,
    qbf_solver: String,
    no_decode: bool,
}

impl<'f> Synthesizer<'f> {
    pub fn new(
        function: &'f Function,
        method: Method,
        technique: Technique,
        options: &SynthesisOptions,
    ) -> Self {
        Self {
            function,
            method,
            technique,
            sat_solver: options.sat_solver.clone(),
            qbf_solver: options.qbf_solver.clone(),
            no_decode: options.no_decode,
        }
    }

    /// The name of the solver backend this oracle runs on.
    pub fn solver_name(&self) -> &str {
        match self.technique {
            Technique::Qbf => &self.qbf_solver,
            Technique::Qbfu | Technique::Cegar => &self.sat_solver,
        }
    }

    /// Attempts to synthesize an m x n lattice for the function.
    pub fn synthesize(
        &self,
        m: usize,
        n: usize,
        timer: &mut Timer,
    ) -> Result<SynthOutcome, Error> {
        debug!(
            "Synthesizing {}x{} lattice with {} {}",
            m, n, self.method, self.technique
        );
        match (self.method, self.technique) {
            (Method::Irredundant, Technique::Qbf) => {
                qbf_synth::<Irredundant>(self.function, m, n, &self.qbf_solver, self.no_decode, timer)
            }
            (Method::Irredundant, Technique::Qbfu) => unfolded_synth::<Irredundant>(
                self.function,
                m,
                n,
                &self.sat_solver,
                self.no_decode,
                timer,
            ),
            (Method::Irredundant, Technique::Cegar) => cegar_synth::<Irredundant>(
                self.function,
                m,
                n,
                &self.sat_solver,
                self.no_decode,
                timer,
            ),
            (Method::Reachability, Technique::Qbf) => qbf_synth::<Reachability>(
                self.function,
                m,
                n,
                &self.qbf_solver,
                self.no_decode,
                timer,
            ),
            (Method::Reachability, Technique::Qbfu) => unfolded_synth::<Reachability>(
                self.function,
                m,
                n,
                &self.sat_solver,
                self.no_decode,
                timer,
            ),
            (Method::Reachability, Technique::Cegar) => cegar_synth::<Reachability>(
                self.function,
                m,
                n,
                &self.sat_solver,
                self.no_decode,
                timer,
            ),
        }
    }
}
