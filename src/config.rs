//! Configuration values passed into tape and machine constructors.

use serde::{Deserialize, Serialize};

use crate::types::{Symbol, MAX_EXECUTION_STEPS};

/// Settings for a newly created tape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TapeConfig {
    /// The symbol implicitly occupying every cell that was never written.
    pub blank_symbol: Symbol,
    /// The number of undo frames retained by a recorded tape. `None` keeps all of them.
    pub history_size: Option<usize>,
}

impl TapeConfig {
    pub fn new(blank_symbol: Symbol) -> Self {
        Self {
            blank_symbol,
            ..Self::default()
        }
    }

    pub fn with_history_size(mut self, history_size: Option<usize>) -> Self {
        self.history_size = history_size;
        self
    }
}

impl Default for TapeConfig {
    fn default() -> Self {
        Self {
            blank_symbol: Symbol::default(),
            history_size: None,
        }
    }
}

/// Settings for a Turing machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Display label of the machine.
    pub name: String,
    /// The number of steps `TuringMachine::run` executes before it gives up.
    pub max_iterations: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            name: "machine".to_string(),
            max_iterations: MAX_EXECUTION_STEPS,
        }
    }
}
