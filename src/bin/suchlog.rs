//! suchlog CLI - logic programs with constraint handling rules
//!
//! Loads a source file and runs its entry predicate; the exit status reports
//! the result (see `suchlog --help`).

use std::io::{stderr, stdout};

use clap::Parser;
use suchlog::cli::{run, Cli};

fn main() {
    suchlog::trace::init_subscriber();
    let cli = Cli::parse();

    let mut output = stdout().lock();
    let mut errors = stderr().lock();
    let code = run(&cli, &mut output, &mut errors);
    std::process::exit(code);
}
