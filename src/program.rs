//! This module defines the `Program`, the transition table of a Turing machine mapping a
//! `(read_symbol, current_state)` pair to the instruction to execute.

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::types::{InstrTuple, Motion, State, Symbol, TuringMachineError};

/// A single row of the transition-table JSON: `[read_symbol, current_state, [write, move, next]]`.
pub type ProgramRow = (Symbol, State, InstrTuple);

/// The transition table of a Turing machine.
///
/// Keys are unique; inserting an existing key replaces its instruction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    rules: BTreeMap<State, BTreeMap<Symbol, InstrTuple>>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a program from a sequence of rows. Later rows win over earlier ones with the same key.
    pub fn from_rows(rows: impl IntoIterator<Item = ProgramRow>) -> Self {
        let mut program = Self::new();
        for (read, state, instr) in rows {
            program.insert(read, state, instr);
        }
        program
    }

    /// Sets the instruction for `(read_symbol, current_state)`.
    ///
    /// Returns the instruction previously stored under that key, if any.
    pub fn set(
        &mut self,
        read_symbol: Symbol,
        current_state: State,
        write_symbol: Symbol,
        motion: Motion,
        next_state: State,
    ) -> Option<InstrTuple> {
        self.insert(
            read_symbol,
            current_state,
            InstrTuple::new(write_symbol, motion, next_state),
        )
    }

    /// Same as `set`, with the outcome already packaged as an `InstrTuple`.
    pub fn insert(
        &mut self,
        read_symbol: Symbol,
        current_state: State,
        instr: InstrTuple,
    ) -> Option<InstrTuple> {
        self.rules
            .entry(current_state)
            .or_default()
            .insert(read_symbol, instr)
    }

    pub fn exists(&self, read_symbol: &Symbol, current_state: &State) -> bool {
        self.get(read_symbol, current_state).is_some()
    }

    pub fn get(&self, read_symbol: &Symbol, current_state: &State) -> Option<&InstrTuple> {
        self.rules.get(current_state)?.get(read_symbol)
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }

    pub fn len(&self) -> usize {
        self.rules.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterates over `(read_symbol, current_state, instruction)`, grouped by state.
    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &State, &InstrTuple)> {
        self.rules.iter().flat_map(|(state, row)| {
            row.iter().map(move |(symbol, instr)| (symbol, state, instr))
        })
    }

    /// Returns every state that has at least one outgoing instruction.
    pub fn states(&self) -> BTreeSet<State> {
        self.rules.keys().cloned().collect()
    }

    /// Returns every symbol read or written by the program.
    pub fn symbols(&self) -> BTreeSet<Symbol> {
        self.iter()
            .flat_map(|(read, _, instr)| [read.clone(), instr.write.clone()])
            .collect()
    }

    pub fn rows(&self) -> Vec<ProgramRow> {
        self.iter()
            .map(|(symbol, state, instr)| (symbol.clone(), state.clone(), instr.clone()))
            .collect()
    }

    /// Decodes transition-table JSON into rows without touching any program.
    pub fn parse_rows(json: &Value) -> Result<Vec<ProgramRow>, TuringMachineError> {
        serde_json::from_value(json.clone()).map_err(|e| {
            TuringMachineError::Syntax(format!("Cannot import program from JSON: {}", e))
        })
    }

    /// Replaces the whole table with the rows of `json`.
    ///
    /// A malformed row fails the import and leaves the table untouched.
    pub fn from_json(&mut self, json: &Value) -> Result<(), TuringMachineError> {
        let rows = Self::parse_rows(json)?;
        *self = Self::from_rows(rows);
        Ok(())
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!(self.rows())
    }
}
