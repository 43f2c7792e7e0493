//! Runs a bundle's testcases and compares the finished machines with the expected output.

use tracing::debug;
use tur_tape::{Halt, MotionAware, Symbol, TapeCore, TuringMachine, TuringMachineError};

use crate::bundle::{Bundle, ExpectedOutput, Testcase};

/// The result of one testcase.
#[derive(Debug, Clone, PartialEq)]
pub struct TestReport {
    pub name: String,
    pub halt: Halt,
    pub steps: usize,
    /// One message per mismatching field. Empty when the testcase passed.
    pub failures: Vec<String>,
}

impl TestReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs every testcase of `bundle`, each on a fresh machine.
pub fn run_testcases(
    bundle: &Bundle,
    max_iterations: usize,
) -> Result<Vec<TestReport>, TuringMachineError> {
    bundle
        .testcases
        .iter()
        .map(|testcase| run_testcase(bundle, testcase, max_iterations))
        .collect()
}

pub fn run_testcase(
    bundle: &Bundle,
    testcase: &Testcase,
    max_iterations: usize,
) -> Result<TestReport, TuringMachineError> {
    let mut machine =
        bundle.machine_with(&testcase.input.tape, &testcase.input.state, max_iterations)?;
    let halt = machine.run();
    debug!(testcase = %testcase.name, ?halt, steps = machine.step(), "testcase finished");

    Ok(TestReport {
        name: testcase.name.clone(),
        halt,
        steps: machine.step(),
        failures: compare(&machine, &testcase.output),
    })
}

fn compare(machine: &TuringMachine, expected: &ExpectedOutput) -> Vec<String> {
    let mut failures = Vec::new();

    if let Some(state) = &expected.state {
        if machine.state() != state {
            failures.push(format!(
                "expected state {}, got {}",
                state,
                machine.state()
            ));
        }
    }

    if let Some(content) = &expected.tapecontent {
        let blank = machine.tape().blank_symbol();
        let actual = tape_content(machine);
        let wanted = trim_blanks(content, blank);
        if actual != wanted {
            failures.push(format!(
                "expected tape content {:?}, got {:?}",
                join(wanted),
                join(&actual)
            ));
        }
    }

    if let Some(cursor) = expected.cursorposition {
        let actual = machine.tape().cursor().index();
        if actual != cursor {
            failures.push(format!(
                "expected cursor position {}, got {}",
                cursor, actual
            ));
        }
    }

    failures
}

/// The visited cells of the machine's tape without blank cells at either end.
fn tape_content(machine: &TuringMachine) -> Vec<Symbol> {
    let mut cells = Vec::new();
    machine.tape().for_each(|_, value| cells.push(value.clone()));
    trim_blanks(&cells, machine.tape().blank_symbol()).to_vec()
}

fn trim_blanks<'a>(cells: &'a [Symbol], blank: &Symbol) -> &'a [Symbol] {
    let start = cells
        .iter()
        .position(|cell| cell != blank)
        .unwrap_or(cells.len());
    let end = cells
        .iter()
        .rposition(|cell| cell != blank)
        .map_or(start, |last| last + 1);
    &cells[start..end]
}

fn join(cells: &[Symbol]) -> String {
    cells
        .iter()
        .map(Symbol::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
