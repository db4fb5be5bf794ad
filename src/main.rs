//! Lattice synthesis binary crate.

use std::io::{self, Write};

use clap::Parser;
use fs_err as fs;

use lattice_synth::options::{CliOptions, SearchStrategy, SynthesisOptions, TraceLevel};
use lattice_synth::{reference_lattice, synthesize_with, Error, Function, SynthesisRecord};

const CSV_FIELDS: &[&str] = &[
    "search",
    "method",
    "synthesizer",
    "solver",
    "path",
    "upper_height",
    "upper_width",
    "time",
    "steps",
    "solution_height",
    "solution_width",
    "lower_bound",
    "inputs",
    "unfolding_steps",
    "num_variables",
    "num_clauses",
];

fn main() {
    if let Err(error) = synth_main() {
        // discard result as we cannot further propagate a write error
        let _ = writeln!(io::stderr(), "Error: {}", error);
        std::process::exit(1);
    }
}

/// Initialize the logging framework with the given trace level.
///
/// # Errors
///
/// Returns an error if the logging framework has already been initialized.
fn initialize_logging(level: TraceLevel) -> io::Result<()> {
    env_logger::builder()
        .filter(None, level.into())
        .format_timestamp_millis()
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e))
}

/// Main function that parses the options, reads the functions, runs the
/// searches and writes the results.
fn synth_main() -> Result<(), Error> {
    let options = CliOptions::parse();
    initialize_logging(options.trace_level)?;

    if options.list_sat_solver {
        println!("varisat\nminisat\ncryptominisat5");
        return Ok(());
    }
    if options.list_qbf_solver {
        println!("depqbf");
        return Ok(());
    }
    if options.list_synthesizer {
        println!("qbf\nqbfu\ncegar");
        return Ok(());
    }
    if options.list_search {
        println!("simple\nsplit\npartition\nsaddleback");
        return Ok(());
    }
    if options.list_method {
        println!("irredundant\nreachability");
        return Ok(());
    }
    if options.dump_csv_header {
        println!("{}", CSV_FIELDS.join(","));
        return Ok(());
    }

    let synthesis_options = SynthesisOptions::from(&options);
    if synthesis_options.upper_bound.is_some()
        && synthesis_options.search != SearchStrategy::Simple
    {
        return Err(Error::Usage(
            "--upper-bound may only be given with --search=simple".to_string(),
        ));
    }

    let mut functions = Vec::new();
    for text in &options.functions {
        functions.push(Function::parse(text)?);
    }
    for path in &options.paths {
        let text = fs::read_to_string(path)?;
        functions.push(Function::parse_pla(&text, path)?);
    }
    if functions.is_empty() {
        return Err(Error::Usage(
            "no function given; use --function or a PLA path".to_string(),
        ));
    }

    for function in &functions {
        let reference = if options.print_reference {
            reference_lattice(function)
        } else {
            None
        };

        let records = synthesize_with(function, &synthesis_options)?;
        for record in &records {
            if options.dump_csv {
                println!("{}", csv_row(record));
            } else {
                print_record(record);
            }
        }

        if let Some(reference) = reference {
            println!("Reference construction:");
            println!("{}", reference);
            println!();
        }
    }
    Ok(())
}

fn print_record(record: &SynthesisRecord) {
    println!(
        "{} {} {} {}",
        record.synthesizer, record.source, record.upper_height, record.upper_width
    );
    println!(
        "Timing: {:?} in {} steps",
        record.result.time, record.result.steps
    );
    match &record.result.solution {
        None => println!("No solution"),
        Some(solution) => {
            println!("Got solution: {} {}", solution.height, solution.width);
            if let Some(lattice) = &solution.outcome.lattice {
                println!("{}", lattice);
            }
        }
    }
    println!();
}

fn csv_row(record: &SynthesisRecord) -> String {
    let result = &record.result;
    let (solution_height, solution_width) = match &result.solution {
        Some(solution) => (solution.height.to_string(), solution.width.to_string()),
        None => (String::new(), String::new()),
    };
    let unfolding_steps = result
        .unfolding_steps
        .map(|steps| steps.to_string())
        .unwrap_or_default();

    let fields = [
        record.search.to_string(),
        record.method.to_string(),
        record.synthesizer.to_string(),
        record.solver.clone(),
        record.path.clone(),
        record.upper_height.to_string(),
        record.upper_width.to_string(),
        format!("{}", record.result.time.as_secs_f64()),
        result.steps.to_string(),
        solution_height,
        solution_width,
        record.lower_bound.to_string(),
        record.inputs.to_string(),
        unfolding_steps,
        result.num_variables.to_string(),
        result.num_clauses.to_string(),
    ];
    fields.join(",")
}
