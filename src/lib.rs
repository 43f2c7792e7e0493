//! This crate provides the core logic for a reversible single-tape Turing machine.
//! It includes the layered tape (plain storage, undo history, motion helpers and
//! convenience operations), the transition program, a machine that steps forward and
//! backward, static program analysis, and JSON import/export of the complete state.

pub mod analyzer;
pub mod config;
pub mod extended;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod program;
pub mod recorded;
pub mod tape;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the analysis entry points and `AnalysisError` from the analyzer module.
pub use analyzer::{analyze, check_rows, nondeterministic_rows, AnalysisError};
/// Re-exports the tape and machine settings.
pub use config::{MachineConfig, TapeConfig};
/// Re-exports the outer tape layers and their capability traits.
pub use extended::{BinaryValue, Convenience, ExtendedTape, MotionAware, UserFriendlyTape};
/// Re-exports the `MachineLoader` struct from the loader module.
pub use loader::MachineLoader;
/// Re-exports the `TuringMachine` struct from the machine module.
pub use machine::TuringMachine;
/// Re-exports the human-readable tape parser.
pub use parser::{parse_human_tape, HumanTape};
/// Re-exports the transition table.
pub use program::{Program, ProgramRow};
/// Re-exports the undo-recording tape layer.
pub use recorded::{Op, RecordedTape, Recordable};
/// Re-exports the base tape and its core trait.
pub use tape::{Tape, TapeCore};
/// Re-exports the value types, outcomes and errors from the types module.
pub use types::{
    normalize_state, normalize_symbol, Halt, InstrTuple, Motion, Normalizer, Position, State,
    StepResult, Symbol, TuringMachineError, DEFAULT_BLANK_SYMBOL, MAX_EXECUTION_STEPS,
};
