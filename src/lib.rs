//! Library crate for exact synthesis of minimum-area switching lattices
//! from Boolean functions.
//!
//! A switching lattice is a rectangular grid of cells labelled with input
//! literals or constants. It computes a function f when, for every input,
//! a top-to-bottom 4-connected path of true cells exists exactly if f is
//! 1, and a left-to-right 8-connected path of false cells exists exactly
//! if f is 0. Synthesis reduces each candidate grid size to Boolean
//! constraint solving and searches the dimension space for the smallest
//! area admitting a valid labelling.

mod cnf;
mod encode;
pub mod function;
pub mod lattice;
pub mod options;
mod reference;
pub mod search;
pub mod solver;
mod synth;
mod timing;

use std::fmt;
use std::io;

use log::info;

pub use crate::cnf::{CellLiteral, ClauseSink, LabelTarget, Lit, VarName};
pub use crate::function::{Function, InputError};
pub use crate::lattice::{Cell, Lattice};
pub use crate::search::{SearchResult, Solution};
pub use crate::solver::SolverError;
pub use crate::synth::{SynthOutcome, Synthesizer};
pub use crate::timing::Timer;

use crate::options::{SearchStrategy, SynthesisOptions, Technique};
use crate::search::{Bounds, Strategy};

/// An error of the synthesis procedure.
#[derive(Debug)]
pub enum Error {
    /// The function input could not be used.
    Input(InputError),
    /// A solver backend is missing or failed.
    Solver(SolverError),
    /// An I/O error occurred.
    Io(io::Error),
    /// The command line arguments are inconsistent.
    Usage(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Input(e) => write!(f, "{}", e),
            Error::Solver(e) => write!(f, "{}", e),
            Error::Io(e) => write!(f, "{}", e),
            Error::Usage(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Input(e) => Some(e),
            Error::Solver(e) => Some(e),
            Error::Io(e) => Some(e),
            Error::Usage(_) => None,
        }
    }
}

impl From<InputError> for Error {
    fn from(error: InputError) -> Self {
        Error::Input(error)
    }
}

impl From<SolverError> for Error {
    fn from(error: SolverError) -> Self {
        Error::Solver(error)
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::Io(error)
    }
}

/// The outcome of one synthesis campaign: a function synthesized with one
/// technique under one search strategy.
#[derive(Debug)]
pub struct SynthesisRecord {
    pub search: SearchStrategy,
    pub method: options::Method,
    pub synthesizer: Technique,
    /// Name of the solver backend the oracle ran on.
    pub solver: String,
    /// Path of the PLA input, empty for expression inputs.
    pub path: String,
    /// Source of the function, for display.
    pub source: String,
    pub upper_height: usize,
    pub upper_width: usize,
    pub lower_bound: usize,
    pub inputs: usize,
    pub result: SearchResult,
}

/// Synthesizes a function with the default options.
pub fn synthesize(function: &Function) -> Result<Vec<SynthesisRecord>, Error> {
    synthesize_with(function, &SynthesisOptions::default())
}

/// Synthesizes a function with the given options, returning one record
/// per selected technique.
pub fn synthesize_with(
    function: &Function,
    options: &SynthesisOptions,
) -> Result<Vec<SynthesisRecord>, Error> {
    let (upper_height, upper_width) = function.naive_lattice_bounds();
    let lower_bound = function.lower_bound();
    let bounds = Bounds {
        lower_area: lower_bound,
        upper: (upper_height, upper_width),
    };
    let upper_override = options
        .upper_bound
        .map(|bound| (bound.height, bound.width));

    let strategy = match options.search {
        SearchStrategy::Simple => Strategy::Simple,
        SearchStrategy::Split => Strategy::MinimizedSplit,
        SearchStrategy::Partition => Strategy::BinaryPartition,
        SearchStrategy::Saddleback => Strategy::Saddleback,
    };

    let techniques = if options.synthesizers.is_empty() {
        vec![Technique::Qbf, Technique::Qbfu, Technique::Cegar]
    } else {
        options.synthesizers.clone()
    };

    let mut records = Vec::with_capacity(techniques.len());
    for &technique in &techniques {
        info!(
            "Synthesizing {} with method {} and technique {}",
            function.source(),
            options.method,
            technique
        );
        let mut oracle = Synthesizer::new(function, options.method, technique, options);
        let solver = oracle.solver_name().to_string();
        let result = search::run(strategy, &mut oracle, bounds, upper_override)?;
        records.push(SynthesisRecord {
            search: options.search,
            method: options.method,
            synthesizer: technique,
            solver,
            path: function.path().to_string(),
            source: function.source().to_string(),
            upper_height,
            upper_width,
            lower_bound,
            inputs: function.inputs(),
            result,
        });
    }
    Ok(records)
}

/// The dual-product reference lattice for a function, if the construction
/// applies.
pub fn reference_lattice(function: &Function) -> Option<Lattice> {
    reference::dual_product(function)
}
