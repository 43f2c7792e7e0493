//! This module defines the value types shared by every layer of the interpreter: tape
//! symbols, machine states, head motions, tape positions and instruction tuples, along with
//! the per-step result type and the error type returned by all fallible operations.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;
use thiserror::Error;

use crate::Rule;

/// The default blank symbol, also used as the placeholder for empty symbol input.
pub const DEFAULT_BLANK_SYMBOL: &str = " ";
/// The default maximum number of steps `TuringMachine::run` executes before giving up.
pub const MAX_EXECUTION_STEPS: usize = 10000;

/// A normalization strategy turning raw input into the canonical form of a value.
///
/// Returning `None` means the input does not describe a valid value.
pub type Normalizer = fn(&str) -> Option<String>;

/// Default symbol normalization: trims the input and maps empty input to the blank placeholder.
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Some(DEFAULT_BLANK_SYMBOL.to_string())
    } else {
        Some(trimmed.to_string())
    }
}

/// Default state normalization: trims the input. Empty names are rejected.
pub fn normalize_state(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Stringifies a JSON scalar so it can be fed to a normalizer.
fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A normalized value written on a tape cell.
///
/// Two symbols are equal iff their normalized forms are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Creates a symbol using the default normalization (`normalize_symbol`).
    pub fn new(raw: &str) -> Result<Self, TuringMachineError> {
        Self::with_normalizer(raw, normalize_symbol)
    }

    /// Creates a symbol using a caller-supplied normalization strategy.
    pub fn with_normalizer(raw: &str, normalizer: Normalizer) -> Result<Self, TuringMachineError> {
        normalizer(raw).map(Self).ok_or_else(|| {
            TuringMachineError::InvalidValue(format!("Cannot create a symbol from {:?}", raw))
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Symbol {
    /// Returns the default blank symbol.
    fn default() -> Self {
        Self(DEFAULT_BLANK_SYMBOL.to_string())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = TuringMachineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<Value> for Symbol {
    type Error = TuringMachineError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let raw = stringify(&value).ok_or_else(|| {
            TuringMachineError::InvalidValue(format!("Cannot create a symbol from {}", value))
        })?;
        Self::new(&raw)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

/// The normalized name of a machine state.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "String")]
pub struct State(String);

impl State {
    /// Creates a state using the default normalization (`normalize_state`).
    pub fn new(raw: &str) -> Result<Self, TuringMachineError> {
        Self::with_normalizer(raw, normalize_state)
    }

    /// Creates a state using a caller-supplied normalization strategy.
    pub fn with_normalizer(raw: &str, normalizer: Normalizer) -> Result<Self, TuringMachineError> {
        normalizer(raw).map(Self).ok_or_else(|| {
            TuringMachineError::InvalidValue(format!("Cannot create a state from {:?}", raw))
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for State {
    type Err = TuringMachineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<Value> for State {
    type Error = TuringMachineError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let raw = stringify(&value).ok_or_else(|| {
            TuringMachineError::InvalidValue(format!("Cannot create a state from {}", value))
        })?;
        Self::new(&raw)
    }
}

impl From<State> for String {
    fn from(state: State) -> Self {
        state.0
    }
}

/// The action of the tape head after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Motion {
    /// Move the head one position to the left.
    Left,
    /// Move the head one position to the right.
    Right,
    /// Keep the head in the same position.
    Stop,
    /// Keep the head in the same position (explicit halt marker).
    Halt,
}

impl Motion {
    /// Returns the canonical name of the motion.
    pub fn as_str(&self) -> &'static str {
        match self {
            Motion::Left => "LEFT",
            Motion::Right => "RIGHT",
            Motion::Stop => "STOP",
            Motion::Halt => "HALT",
        }
    }

    /// Returns the cursor offset caused by this motion.
    pub fn delta(&self) -> i64 {
        match self {
            Motion::Left => -1,
            Motion::Right => 1,
            Motion::Stop | Motion::Halt => 0,
        }
    }
}

impl FromStr for Motion {
    type Err = TuringMachineError;

    /// Resolves case-insensitive aliases (`l`, `left`, `r`, `right`, `s`, `stop`, `h`, `halt`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "l" | "left" => Ok(Motion::Left),
            "r" | "right" => Ok(Motion::Right),
            "s" | "stop" => Ok(Motion::Stop),
            "h" | "halt" => Ok(Motion::Halt),
            _ => Err(TuringMachineError::UnknownMotion(s.to_string())),
        }
    }
}

impl TryFrom<String> for Motion {
    type Error = TuringMachineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Motion> for String {
    fn from(motion: Motion) -> Self {
        motion.as_str().to_string()
    }
}

impl fmt::Display for Motion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An integer tape coordinate.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Position(i64);

impl Position {
    pub const fn new(index: i64) -> Self {
        Self(index)
    }

    pub const fn index(self) -> i64 {
        self.0
    }
}

impl From<i64> for Position {
    fn from(index: i64) -> Self {
        Self(index)
    }
}

impl TryFrom<f64> for Position {
    type Error = TuringMachineError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        // i64::MAX as f64 rounds up to 2^63, which is already out of range.
        if !value.is_finite()
            || value.fract() != 0.0
            || value < i64::MIN as f64
            || value >= i64::MAX as f64
        {
            return Err(TuringMachineError::InvalidPosition(value.to_string()));
        }
        Ok(Self(value as i64))
    }
}

impl FromStr for Position {
    type Err = TuringMachineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| TuringMachineError::InvalidPosition(s.to_string()))
    }
}

impl Add<i64> for Position {
    type Output = Position;

    fn add(self, rhs: i64) -> Self::Output {
        Self(self.0.saturating_add(rhs))
    }
}

impl Sub<i64> for Position {
    type Output = Position;

    fn sub(self, rhs: i64) -> Self::Output {
        Self(self.0.saturating_sub(rhs))
    }
}

impl Sub<Position> for Position {
    type Output = i64;

    /// Returns the signed distance between two positions, saturating at the `i64` bounds.
    fn sub(self, rhs: Position) -> Self::Output {
        self.0.saturating_sub(rhs.0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The outcome of a transition: the symbol to write, the head motion and the next state.
///
/// Serialized as the JSON triple `[write, move, next_state]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(Symbol, Motion, State)", into = "(Symbol, Motion, State)")]
pub struct InstrTuple {
    /// The symbol written at the cursor.
    pub write: Symbol,
    /// The head motion applied after writing.
    pub motion: Motion,
    /// The state entered after the transition.
    pub next_state: State,
}

impl InstrTuple {
    pub fn new(write: Symbol, motion: Motion, next_state: State) -> Self {
        Self {
            write,
            motion,
            next_state,
        }
    }
}

impl From<(Symbol, Motion, State)> for InstrTuple {
    fn from((write, motion, next_state): (Symbol, Motion, State)) -> Self {
        Self::new(write, motion, next_state)
    }
}

impl From<InstrTuple> for (Symbol, Motion, State) {
    fn from(instr: InstrTuple) -> Self {
        (instr.write, instr.motion, instr.next_state)
    }
}

impl fmt::Display for InstrTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.write, self.motion, self.next_state)
    }
}

/// The record of a single forward or backward transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepResult {
    /// The symbol under the cursor before the transition.
    pub old_value: Symbol,
    /// The state before the transition.
    pub old_state: State,
    /// The symbol in the same cell after the transition.
    pub new_value: Symbol,
    /// The head motion performed by the (forward) transition.
    pub motion: Motion,
    /// The state after the transition.
    pub new_state: State,
    /// The step counter after the transition.
    pub step: usize,
    /// Whether no instruction is defined for the resulting configuration.
    pub next_is_undefined: bool,
    /// Whether the resulting state is final.
    pub next_is_final: bool,
}

/// The reason `TuringMachine::run` stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// The current state is one of the final states.
    FinalState,
    /// No instruction exists for the current symbol and state.
    UndefinedInstruction,
    /// The configured iteration cap was hit before the machine finished.
    IterationLimit,
}

/// Represents the errors that can occur while building or driving a Turing machine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuringMachineError {
    /// A symbol or state could not be constructed from its input.
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    /// A motion name is outside the recognized alias set.
    #[error("Unknown motion: {0}")]
    UnknownMotion(String),
    /// A position was built from non-integral input.
    #[error("Invalid position: {0}")]
    InvalidPosition(String),
    /// An internal invariant or a precondition was violated.
    #[error("Assertion failed: {0}")]
    Assertion(String),
    /// A JSON document is malformed or lacks required keys.
    #[error("Syntax error: {0}")]
    Syntax(String),
    /// Undo was requested beyond the retained history.
    #[error("Out of history: {0}")]
    OutOfHistory(String),
    /// The human-readable tape string could not be parsed.
    #[error("Tape parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// The program failed static analysis.
    #[error("Program validation error: {0}")]
    ValidationError(String),
    /// Indicates an error related to file system operations.
    #[error("File error: {0}")]
    FileError(String),
}

impl TuringMachineError {
    /// Returns `true` for the errors raised when a value type rejects its input.
    pub fn is_invalid_value(&self) -> bool {
        matches!(
            self,
            TuringMachineError::InvalidValue(_)
                | TuringMachineError::UnknownMotion(_)
                | TuringMachineError::InvalidPosition(_)
        )
    }
}

impl From<serde_json::Error> for TuringMachineError {
    fn from(error: serde_json::Error) -> Self {
        TuringMachineError::Syntax(error.to_string())
    }
}
