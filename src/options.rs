//! Options for the synthesis procedure.

use std::fmt;
use std::str::FromStr;

use clap::{Args, Parser, ValueEnum};

/// Implement [`Display`](std::fmt::Display) with the information in
/// [`clap::ValueEnum`].
///
/// This ensures consistent names for printing and parsing of the default
/// argument.
macro_rules! value_enum_display {
    ($t:ty) => {
        impl std::fmt::Display for $t {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let value = clap::ValueEnum::to_possible_value(self)
                    .expect("variants are never skipped");
                write!(f, "{}", value.get_name())
            }
        }
    };
}

/// The constraint family used to state lattice validity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Method {
    /// Explicit path variables with irredundant path shapes.
    Irredundant,
    /// Round-indexed reachability variables.
    Reachability,
}
impl Default for Method {
    fn default() -> Self {
        Self::Irredundant
    }
}
value_enum_display!(Method);

/// The technique used to deal with the universal quantification over the
/// inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Technique {
    /// Keep the quantifier and solve the formula with a QBF solver.
    Qbf,
    /// Unfold the quantifier into one propositional copy per assignment.
    Qbfu,
    /// Counterexample-guided refinement between two SAT solvers.
    Cegar,
}
impl Default for Technique {
    fn default() -> Self {
        Self::Qbf
    }
}
value_enum_display!(Technique);

/// The strategy for exploring candidate lattice dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchStrategy {
    /// A single attempt at the upper bound.
    Simple,
    /// Binary search on the lattice area.
    Split,
    /// Recursive partitioning of the dimension rectangle.
    Partition,
    /// Staircase walk over the dimension grid.
    Saddleback,
}
impl Default for SearchStrategy {
    fn default() -> Self {
        Self::Simple
    }
}
value_enum_display!(SearchStrategy);

/// The trace level / verbosity for the logging framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TraceLevel {
    /// Turn logging off.
    Off,
    /// Only print errors.
    Error,
    /// Print errors and warnings.
    Warn,
    /// Print errors, warnings and useful information.
    Info,
    /// Print errors, warnings, useful and debug information.
    Debug,
    /// Print all information, including very verbose output.
    Trace,
}
impl Default for TraceLevel {
    fn default() -> Self {
        Self::Error
    }
}
value_enum_display!(TraceLevel);

impl From<TraceLevel> for log::LevelFilter {
    fn from(level: TraceLevel) -> Self {
        match level {
            TraceLevel::Off => Self::Off,
            TraceLevel::Error => Self::Error,
            TraceLevel::Warn => Self::Warn,
            TraceLevel::Info => Self::Info,
            TraceLevel::Debug => Self::Debug,
            TraceLevel::Trace => Self::Trace,
        }
    }
}

/// Explicit lattice dimensions, parsed from the form `m,n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpperBound {
    pub height: usize,
    pub width: usize,
}

impl fmt::Display for UpperBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.height, self.width)
    }
}

/// An error which can be returned when parsing an upper bound.
#[derive(Debug)]
pub struct ParseUpperBoundError {
    msg: String,
}

impl ParseUpperBoundError {
    fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

impl fmt::Display for ParseUpperBoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg)
    }
}

impl std::error::Error for ParseUpperBoundError {}

impl FromStr for UpperBound {
    type Err = ParseUpperBoundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(2, ',');
        let height = parts
            .next()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .ok_or_else(|| ParseUpperBoundError::new("expected dimensions of the form m,n"))?;
        let width = parts
            .next()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .ok_or_else(|| ParseUpperBoundError::new("expected dimensions of the form m,n"))?;
        if height == 0 || width == 0 {
            return Err(ParseUpperBoundError::new("dimensions must be positive"));
        }
        Ok(Self { height, width })
    }
}

/// Options to control the synthesis procedure.
///
/// These options can be used with
/// [`synthesize_with`](crate::synthesize_with).
///
/// # Examples
///
/// ```
/// use lattice_synth::options::*;
/// let options = SynthesisOptions {
///     method: Method::Reachability,
///     synthesizers: vec![Technique::Cegar],
///     search: SearchStrategy::Saddleback,
///     ..SynthesisOptions::default()
/// };
/// ```
#[derive(Debug, Clone, Args)]
pub struct SynthesisOptions {
    /// The constraint family for lattice validity.
    #[arg(
        long = "method",
        value_enum,
        default_value_t,
        help = "Synthesis method to use",
        display_order = 10
    )]
    pub method: Method,
    /// The synthesis techniques to run; empty means all of them.
    #[arg(
        long = "synthesizer",
        value_enum,
        help = "Synthesizer technique to use (repeatable, default: all)",
        display_order = 11
    )]
    pub synthesizers: Vec<Technique>,
    /// The dimension search strategy.
    #[arg(
        long = "search",
        value_enum,
        default_value_t,
        help = "Search technique to use",
        display_order = 12
    )]
    pub search: SearchStrategy,
    /// The SAT solver backend for the unfolded and refining techniques.
    #[arg(
        long = "sat-solver",
        default_value = "varisat",
        help = "SAT solver to use (varisat, minisat, cryptominisat5)",
        display_order = 13
    )]
    pub sat_solver: String,
    /// The QBF solver backend for the quantified technique.
    #[arg(
        long = "qbf-solver",
        default_value = "depqbf",
        help = "QBF solver to use",
        display_order = 14
    )]
    pub qbf_solver: String,
    /// Lattice dimensions to use instead of the naive upper bound.
    ///
    /// Only meaningful for the simple search strategy.
    #[arg(
        long = "upper-bound",
        value_name = "m,n",
        help = "Lattice size for the simple search (format m,n)",
        display_order = 15
    )]
    pub upper_bound: Option<UpperBound>,
    /// Skip decoding solver models into lattices.
    #[arg(
        long = "no-decode",
        help = "Don't decode lattice solutions",
        display_order = 16
    )]
    pub no_decode: bool,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            method: Method::default(),
            synthesizers: Vec::new(),
            search: SearchStrategy::default(),
            sat_solver: "varisat".to_string(),
            qbf_solver: "depqbf".to_string(),
            upper_bound: None,
            no_decode: false,
        }
    }
}

/// A group of options used for parsing the arguments of the command-line
/// interface.
///
/// This struct should mainly be used with [`clap`]. For using this crate
/// as a library, please use [`SynthesisOptions`] directly instead.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct CliOptions {
    /// Boolean functions given as expression strings.
    #[arg(
        short = 'f',
        long = "function",
        value_name = "EXPR",
        help = "Parsable Boolean function to synthesize (repeatable)",
        display_order = 0
    )]
    pub functions: Vec<String>,
    /// Paths to function definitions in PLA format.
    #[arg(value_name = "PATH", help = "Path to a function definition in PLA format")]
    pub paths: Vec<String>,
    /// Print the available SAT solver backends.
    #[arg(
        long = "list-sat-solver",
        help = "Print available SAT solvers",
        display_order = 20
    )]
    pub list_sat_solver: bool,
    /// Print the available QBF solver backends.
    #[arg(
        long = "list-qbf-solver",
        help = "Print available QBF solvers",
        display_order = 21
    )]
    pub list_qbf_solver: bool,
    /// Print the available synthesis techniques.
    #[arg(
        long = "list-synthesizer",
        help = "Print available synthesizers",
        display_order = 22
    )]
    pub list_synthesizer: bool,
    /// Print the available search strategies.
    #[arg(
        long = "list-search",
        help = "Print available search techniques",
        display_order = 23
    )]
    pub list_search: bool,
    /// Print the available synthesis methods.
    #[arg(
        long = "list-method",
        help = "Print available synthesis methods",
        display_order = 24
    )]
    pub list_method: bool,
    /// Write one CSV statistics row per result to stdout.
    #[arg(
        long = "dump-csv",
        help = "Write statistics as CSV to stdout",
        display_order = 25
    )]
    pub dump_csv: bool,
    /// Write the CSV header to stdout.
    #[arg(
        long = "dump-csv-header",
        help = "Write CSV header to stdout",
        display_order = 26
    )]
    pub dump_csv_header: bool,
    /// Print the dual-product reference construction for each function.
    #[arg(
        long = "print-reference",
        help = "Print the reference dual-product construction",
        display_order = 27
    )]
    pub print_reference: bool,
    /// The trace level to use for instantiating the logging framework.
    #[arg(
        short = 't',
        long = "trace",
        value_name = "trace-level",
        value_enum,
        default_value_t,
        help = "Trace level",
        display_order = 28
    )]
    pub trace_level: TraceLevel,
    /// The set of options for the synthesis process.
    #[command(flatten)]
    pub synthesis_options: SynthesisOptions,
}

impl From<&CliOptions> for SynthesisOptions {
    fn from(options: &CliOptions) -> Self {
        options.synthesis_options.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_enums_display_their_clap_names() {
        assert_eq!(Method::Irredundant.to_string(), "irredundant");
        assert_eq!(Technique::Qbfu.to_string(), "qbfu");
        assert_eq!(SearchStrategy::Saddleback.to_string(), "saddleback");
        assert_eq!(TraceLevel::Info.to_string(), "info");
    }

    #[test]
    fn upper_bounds_parse_and_reject() {
        let bound: UpperBound = "3,4".parse().unwrap();
        assert_eq!((bound.height, bound.width), (3, 4));
        assert!("3".parse::<UpperBound>().is_err());
        assert!("0,4".parse::<UpperBound>().is_err());
        assert!("a,b".parse::<UpperBound>().is_err());
    }

    #[test]
    fn cli_parses_a_full_invocation() {
        let options = CliOptions::parse_from([
            "lattice-synth",
            "--function",
            "a & b",
            "--method",
            "reachability",
            "--synthesizer",
            "cegar",
            "--search",
            "saddleback",
        ]);
        assert_eq!(options.functions, vec!["a & b"]);
        assert_eq!(options.synthesis_options.method, Method::Reachability);
        assert_eq!(
            options.synthesis_options.synthesizers,
            vec![Technique::Cegar]
        );
        assert_eq!(
            options.synthesis_options.search,
            SearchStrategy::Saddleback
        );
        assert_eq!(options.synthesis_options.sat_solver, "varisat");
    }
}
