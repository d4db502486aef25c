//! Command-line driver: load a source file and run its entry predicate.

use crate::machine::{Control, EngineError, Machine, MachineConfig, Outcome};
use crate::parser::{parse_program, ParseError};
use crate::program::{LoadError, Program};
use crate::trail::Trail;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

#[cfg(feature = "tracing")]
use crate::trace::info;

/// Exit status when the goal has no solution.
pub const EXIT_NO_SOLUTION: i32 = 1;
/// Exit status for load, parse and runtime errors.
pub const EXIT_ERROR: i32 = 2;

#[derive(Parser, Debug)]
#[command(name = "suchlog")]
#[command(about = "Logic programs with constraint handling rules")]
#[command(version)]
pub struct Cli {
    /// Source file to load
    pub file: PathBuf,

    /// Zero-arity predicate to run
    #[arg(long, default_value = "main")]
    pub goal: String,

    /// Enumerate every solution instead of stopping at the first
    #[arg(long)]
    pub all: bool,

    /// Maximum nesting of conditional and guard sub-searches
    #[arg(long, default_value_t = MachineConfig::default().max_depth)]
    pub max_depth: usize,

    /// Print the loaded clauses and rules before running
    #[arg(long)]
    pub dump_program: bool,
}

/// Anything that stops the driver before the goal finishes.
#[derive(Debug)]
pub enum CliError {
    Parse(ParseError),
    Engine(EngineError),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Parse(e) => write!(f, "{}", e),
            CliError::Engine(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ParseError> for CliError {
    fn from(e: ParseError) -> Self {
        CliError::Parse(e)
    }
}

impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        CliError::Engine(e)
    }
}

impl From<LoadError> for CliError {
    fn from(e: LoadError) -> Self {
        CliError::Engine(EngineError::Load(e))
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Engine(EngineError::Io(e))
    }
}

/// Run the CLI and return the process exit status.
pub fn run(cli: &Cli, out: &mut dyn Write, err: &mut dyn Write) -> i32 {
    match execute(cli, out) {
        Ok(code) => code,
        Err(e) => {
            // Already failing; a broken stderr has nowhere left to report.
            let _ = writeln!(err, "{}: {}", cli.file.display(), e);
            EXIT_ERROR
        }
    }
}

fn execute(cli: &Cli, out: &mut dyn Write) -> Result<i32, CliError> {
    let source = std::fs::read_to_string(&cli.file)?;
    run_source(&source, cli, out)
}

/// Load `source` and run the configured goal against it.
pub fn run_source(source: &str, cli: &Cli, out: &mut dyn Write) -> Result<i32, CliError> {
    let mut trail = Trail::new();
    let code = parse_program(source, &mut trail)?;
    let program = Program::load(code, &trail)?;

    #[cfg(feature = "tracing")]
    info!(
        file = %cli.file.display(),
        rules = program.rules().len(),
        "program_ready"
    );

    if cli.dump_program {
        for clause in trail.list_items(code).unwrap_or_default() {
            writeln!(out, "{}.", trail.stringify(clause))?;
        }
    }

    let goal = trail.atom(&cli.goal);
    let config = MachineConfig {
        max_depth: cli.max_depth,
    };
    let all = cli.all;
    let mut solutions = 0usize;
    let outcome = Machine::with_config(&program, &mut trail, out, config).solve(goal, |_| {
        solutions += 1;
        if all {
            Control::Continue
        } else {
            Control::Stop
        }
    })?;

    #[cfg(feature = "tracing")]
    info!(solutions, outcome = ?outcome, "goal_finished");

    Ok(match outcome {
        Outcome::Exit(code) => i32::try_from(&code).unwrap_or(EXIT_ERROR),
        Outcome::Stopped => 0,
        Outcome::Exhausted if solutions > 0 => 0,
        Outcome::Exhausted => EXIT_NO_SOLUTION,
    })
}

#[cfg(test)]
#[path = "tests/cli.rs"]
mod tests;
