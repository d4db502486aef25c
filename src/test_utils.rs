use crate::machine::{run_first, EngineError, Outcome};
use crate::parser::{parse_goal, parse_program};
use crate::program::Program;
use crate::term::TermId;
use crate::trail::Trail;

pub(crate) fn setup() -> Trail {
    Trail::new()
}

/// Parse and load `source` into a fresh trail.
pub(crate) fn load(source: &str) -> (Trail, Program) {
    let mut trail = setup();
    let code = parse_program(source, &mut trail).expect("program should parse");
    let program = Program::load(code, &trail).expect("program should load");
    (trail, program)
}

/// Parse a goal in `trail`, returning the goal term.
pub(crate) fn goal(trail: &mut Trail, source: &str) -> TermId {
    parse_goal(source, trail).expect("goal should parse").term
}

/// Run `goal_src` against `source` to its first solution, capturing output.
pub(crate) fn run(source: &str, goal_src: &str) -> (Result<Outcome, EngineError>, String) {
    let (mut trail, program) = load(source);
    let g = goal(&mut trail, goal_src);
    let mut out = Vec::new();
    let result = run_first(&program, &mut trail, g, &mut out);
    (result, String::from_utf8(out).expect("utf8 output"))
}
