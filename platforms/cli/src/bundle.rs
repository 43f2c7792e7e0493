//! Program bundles: a transition table, its initial tape and state, and optional testcases,
//! as distributed in a single JSON file.

use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tracing::warn;

use tur_tape::{
    nondeterministic_rows, MachineConfig, Position, Program, State, Symbol, TapeConfig, TapeCore,
    TuringMachine, TuringMachineError, UserFriendlyTape,
};

#[derive(Debug, Clone, Deserialize)]
pub struct Bundle {
    pub title: String,
    #[serde(default)]
    pub description: Vec<Value>,
    pub version: String,
    pub tape: TapeSpec,
    /// Program rows, `[[read, state, [write, motion, next]], ...]`.
    pub program: Value,
    pub state: State,
    pub final_states: Vec<State>,
    #[serde(default)]
    pub testcases: Vec<Testcase>,
}

/// The initial content of a tape. `cursor` is a logical position and `offset` is the
/// number of `data` cells left of position 0.
#[derive(Debug, Clone, Deserialize)]
pub struct TapeSpec {
    pub blank: Option<Symbol>,
    pub offset: Option<usize>,
    pub cursor: Option<Position>,
    pub data: Vec<Symbol>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Testcase {
    pub name: String,
    pub input: TestInput,
    pub output: ExpectedOutput,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestInput {
    pub tape: TapeSpec,
    pub state: State,
}

/// What a finished testcase run must look like. At least one field is set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpectedOutput {
    pub state: Option<State>,
    pub tapecontent: Option<Vec<Symbol>>,
    pub cursorposition: Option<i64>,
}

impl Bundle {
    /// Reads and checks a bundle file.
    pub fn load(path: &Path) -> Result<Self, TuringMachineError> {
        let content = fs::read_to_string(path).map_err(|e| {
            TuringMachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, TuringMachineError> {
        let bundle: Bundle = serde_json::from_str(content)?;
        bundle.check()?;
        Ok(bundle)
    }

    fn check(&self) -> Result<(), TuringMachineError> {
        if self.title.chars().count() < 3 {
            return Err(TuringMachineError::Assertion(format!(
                "Bundle title {:?} is too short",
                self.title
            )));
        }
        if self.version.chars().count() < 3 {
            return Err(TuringMachineError::Assertion(format!(
                "Bundle version {:?} is too short",
                self.version
            )));
        }
        if self.final_states.is_empty() {
            return Err(TuringMachineError::Assertion(
                "Bundle declares no final states".to_string(),
            ));
        }
        for testcase in &self.testcases {
            if testcase.name.is_empty() {
                return Err(TuringMachineError::Assertion(
                    "Testcase name must not be empty".to_string(),
                ));
            }
            if testcase.output.is_empty() {
                return Err(TuringMachineError::Assertion(format!(
                    "Testcase {:?} expects nothing",
                    testcase.name
                )));
            }
        }
        Ok(())
    }

    /// Builds the transition table. Rows sharing a key are reported and the last one wins.
    pub fn program(&self) -> Result<Program, TuringMachineError> {
        let rows = Program::parse_rows(&self.program)?;
        for (symbol, state) in nondeterministic_rows(&rows) {
            warn!(%symbol, %state, "multiple instructions for the same key, keeping the last");
        }
        Ok(Program::from_rows(rows))
    }

    /// Builds the machine described by the bundle itself.
    pub fn machine(&self, max_iterations: usize) -> Result<TuringMachine, TuringMachineError> {
        self.machine_with(&self.tape, &self.state, max_iterations)
    }

    /// Builds a machine running the bundle's program on another tape and start state.
    pub fn machine_with(
        &self,
        tape: &TapeSpec,
        state: &State,
        max_iterations: usize,
    ) -> Result<TuringMachine, TuringMachineError> {
        let machine = TuringMachine::new(
            self.program()?,
            tape.build()?,
            self.final_states.iter().cloned(),
            state.clone(),
        )?;

        Ok(machine.with_config(&MachineConfig {
            name: self.title.clone(),
            max_iterations,
        }))
    }
}

impl TapeSpec {
    pub fn build(&self) -> Result<UserFriendlyTape, TuringMachineError> {
        let blank = self.blank.clone().unwrap_or_default();
        let mut tape = UserFriendlyTape::from_config(&TapeConfig::new(blank.clone()));
        tape.from_json(&json!({
            "blank_symbol": blank,
            "offset": self.offset.unwrap_or(0),
            "cursor": self.cursor.unwrap_or_default(),
            "data": self.data,
        }))?;
        Ok(tape)
    }
}

impl ExpectedOutput {
    pub fn is_empty(&self) -> bool {
        self.state.is_none() && self.tapecontent.is_none() && self.cursorposition.is_none()
    }
}
