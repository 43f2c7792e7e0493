//! This module layers a reversible operation log on top of `Tape`.
//!
//! Every mutation is appended to the current history frame before it is applied. A new frame
//! starts on `snapshot`; `undo` pops the last frame and applies its inverse operations directly
//! to the inner tape.

use serde_json::{json, Value};
use tracing::trace;

use crate::config::TapeConfig;
use crate::tape::{distance, Tape, TapeCore};
use crate::types::{Position, Symbol, TuringMachineError};

/// An atomic, invertible tape operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// The cell under the cursor changed from `old` to `new`. `None` is a never-written cell.
    Write {
        old: Option<Symbol>,
        new: Option<Symbol>,
    },
    /// The cursor moved by a signed distance.
    Move(i64),
}

impl Op {
    pub fn inverse(&self) -> Op {
        match self {
            Op::Write { old, new } => Op::Write {
                old: new.clone(),
                new: old.clone(),
            },
            Op::Move(delta) => Op::Move(-delta),
        }
    }

    /// Encodes the operation as `["w", old, new]` or `[delta]`.
    pub fn to_json(&self) -> Value {
        match self {
            Op::Write { old, new } => json!(["w", old, new]),
            Op::Move(delta) => json!([delta]),
        }
    }

    pub fn from_json(json: &Value) -> Result<Op, TuringMachineError> {
        let invalid = || TuringMachineError::Syntax(format!("Invalid tape operation: {}", json));

        match json.as_array().map(Vec::as_slice) {
            Some([tag, old, new]) if tag == "w" => Ok(Op::Write {
                old: serde_json::from_value(old.clone()).map_err(|_| invalid())?,
                new: serde_json::from_value(new.clone()).map_err(|_| invalid())?,
            }),
            Some([delta]) => delta.as_i64().map(Op::Move).ok_or_else(invalid),
            _ => Err(invalid()),
        }
    }
}

/// The capability of recording mutations and rolling them back.
pub trait Recordable: TapeCore {
    /// Closes the current history frame and opens a new, empty one.
    fn snapshot(&mut self);

    /// Reverts the operations of the last frame.
    ///
    /// Returns the inverse operations in the order they were applied.
    fn undo(&mut self) -> Result<Vec<Op>, TuringMachineError>;

    fn history(&self) -> &[Vec<Op>];

    /// The number of retained frames. `None` means unbounded.
    fn history_size(&self) -> Option<usize>;
}

/// A tape that records every mutation so it can be undone.
#[derive(Debug, Clone)]
pub struct RecordedTape {
    tape: Tape,
    history: Vec<Vec<Op>>,
    history_size: Option<usize>,
}

impl RecordedTape {
    pub fn new(tape: Tape, history_size: Option<usize>) -> Self {
        Self {
            tape,
            history: vec![Vec::new()],
            history_size,
        }
    }

    pub fn from_config(config: &TapeConfig) -> Self {
        Self::new(Tape::from_config(config), config.history_size)
    }

    /// The underlying tape.
    pub fn inner(&self) -> &Tape {
        &self.tape
    }

    pub fn set_history_size(&mut self, history_size: Option<usize>) {
        self.history_size = history_size;
        self.evict();
    }

    fn record(&mut self, op: Op) {
        match self.history.last_mut() {
            Some(frame) => frame.push(op),
            None => self.history.push(vec![op]),
        }
    }

    /// Drops the oldest frames beyond `history_size`. The current frame is always kept.
    fn evict(&mut self) {
        if let Some(limit) = self.history_size {
            let limit = limit.max(1);
            if self.history.len() > limit {
                let excess = self.history.len() - limit;
                self.history.drain(..excess);
                trace!(excess, limit, "evicted tape history frames");
            }
        }
    }

    fn apply(&mut self, op: &Op) {
        match op {
            Op::Write { new, .. } => self.tape.put(self.tape.cursor(), new.clone()),
            Op::Move(delta) => self.tape.shift(*delta),
        }
    }

    fn parse_history(json: &Value) -> Result<Vec<Vec<Op>>, TuringMachineError> {
        let frames = match json.get("history") {
            None | Some(Value::Null) => return Ok(vec![Vec::new()]),
            Some(Value::Array(frames)) => frames,
            Some(other) => {
                return Err(TuringMachineError::Syntax(format!(
                    "Tape history must be an array, got {}",
                    other
                )))
            }
        };

        let mut history = frames
            .iter()
            .map(|frame| {
                frame
                    .as_array()
                    .ok_or_else(|| {
                        TuringMachineError::Syntax(format!(
                            "History frame must be an array, got {}",
                            frame
                        ))
                    })?
                    .iter()
                    .map(Op::from_json)
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        if history.is_empty() {
            history.push(Vec::new());
        }
        Ok(history)
    }

    fn parse_history_size(&self, json: &Value) -> Result<Option<usize>, TuringMachineError> {
        match json.get("history_size") {
            None => Ok(self.history_size),
            Some(Value::Null) => Ok(None),
            Some(size) => size
                .as_u64()
                .map(|size| Some(size as usize))
                .ok_or_else(|| {
                    TuringMachineError::Syntax(format!("Invalid history size: {}", size))
                }),
        }
    }
}

impl Default for RecordedTape {
    fn default() -> Self {
        Self::new(Tape::default(), None)
    }
}

impl TapeCore for RecordedTape {
    fn blank_symbol(&self) -> &Symbol {
        self.tape.blank_symbol()
    }

    fn cursor(&self) -> Position {
        self.tape.cursor()
    }

    fn begin(&self) -> Position {
        self.tape.begin()
    }

    fn end(&self) -> Position {
        self.tape.end()
    }

    fn cell(&self, position: Position) -> Option<&Symbol> {
        self.tape.cell(position)
    }

    fn read_at(&mut self, position: Position) -> Symbol {
        self.tape.read_at(position)
    }

    fn write(&mut self, value: Symbol) {
        let old = self.tape.cell(self.tape.cursor()).cloned();
        self.record(Op::Write {
            old,
            new: Some(value.clone()),
        });
        self.tape.write(value);
    }

    fn left(&mut self, n: usize) {
        self.move_to(self.tape.cursor() - distance(n));
    }

    fn right(&mut self, n: usize) {
        self.move_to(self.tape.cursor() + distance(n));
    }

    fn move_to(&mut self, position: Position) {
        self.record(Op::Move(position - self.tape.cursor()));
        self.tape.move_to(position);
    }

    /// Empties the tape and forgets its history.
    fn clear(&mut self) {
        self.tape.clear();
        self.history = vec![Vec::new()];
    }

    fn to_json(&self) -> Value {
        let mut json = self.tape.to_json();
        if let Value::Object(map) = &mut json {
            let history: Vec<Vec<Value>> = self
                .history
                .iter()
                .map(|frame| frame.iter().map(Op::to_json).collect())
                .collect();
            map.insert("history".to_string(), json!(history));
            map.insert("history_size".to_string(), json!(self.history_size));
        }
        json
    }

    fn from_json(&mut self, json: &Value) -> Result<(), TuringMachineError> {
        let history = Self::parse_history(json)?;
        let history_size = self.parse_history_size(json)?;
        self.tape.from_json(json)?;

        self.history = history;
        self.history_size = history_size;
        self.evict();
        Ok(())
    }
}

impl Recordable for RecordedTape {
    fn snapshot(&mut self) {
        self.history.push(Vec::new());
        self.evict();
    }

    fn undo(&mut self) -> Result<Vec<Op>, TuringMachineError> {
        let exhausted = match self.history.as_slice() {
            [] => true,
            [only] => only.is_empty(),
            _ => false,
        };
        if exhausted {
            return Err(TuringMachineError::OutOfHistory(
                "No recorded tape operations left to undo".to_string(),
            ));
        }

        let frame = self.history.pop().unwrap_or_default();
        if self.history.is_empty() {
            self.history.push(Vec::new());
        }

        let inverse: Vec<Op> = frame.iter().rev().map(Op::inverse).collect();
        for op in &inverse {
            self.apply(op);
        }
        trace!(operations = inverse.len(), "undid tape frame");

        Ok(inverse)
    }

    fn history(&self) -> &[Vec<Op>] {
        &self.history
    }

    fn history_size(&self) -> Option<usize> {
        self.history_size
    }
}
