//! This module provides the `MachineLoader` struct, responsible for loading and saving
//! Turing machines as JSON documents.

use crate::machine::TuringMachine;
use crate::types::TuringMachineError;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// `MachineLoader` is a utility struct for loading Turing machines.
/// It provides methods to load machines from individual files, from string content,
/// and to discover and load all `.json` files within a specified directory.
pub struct MachineLoader;

impl MachineLoader {
    /// Loads a single Turing machine from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(TuringMachine)` if the file is successfully read and imported.
    /// * `Err(TuringMachineError::FileError)` if the file cannot be read.
    /// * `Err(TuringMachineError::Syntax)` if the file is not valid JSON.
    /// * `Err(TuringMachineError::Assertion)` if required machine keys are missing.
    pub fn load_machine(path: &Path) -> Result<TuringMachine, TuringMachineError> {
        let content = fs::read_to_string(path).map_err(|e| {
            TuringMachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        Self::load_machine_from_string(&content)
    }

    /// Loads a single Turing machine from the provided JSON text.
    pub fn load_machine_from_string(content: &str) -> Result<TuringMachine, TuringMachineError> {
        let json: Value = serde_json::from_str(content)?;
        TuringMachine::import(&json)
    }

    /// Loads all machine files (`.json` extension) from a given directory.
    ///
    /// Directories and other files are skipped. Each element of the result is either the
    /// path and the loaded machine, or the error that occurred while loading it.
    pub fn load_machines(
        directory: &Path,
    ) -> Vec<Result<(PathBuf, TuringMachine), TuringMachineError>> {
        if !directory.exists() {
            return vec![Err(TuringMachineError::FileError(format!(
                "Directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(TuringMachineError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        entries
            .filter_map(|entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        return Some(Err(TuringMachineError::FileError(format!(
                            "Failed to read directory entry: {}",
                            e
                        ))))
                    }
                };

                let path = entry.path();

                // Skip directories and non-.json files
                if path.is_dir() || path.extension().is_none_or(|ext| ext != "json") {
                    return None;
                }

                match Self::load_machine(&path) {
                    Ok(machine) => Some(Ok((path, machine))),
                    Err(e) => Some(Err(TuringMachineError::FileError(format!(
                        "Failed to load machine from {}: {}",
                        path.display(),
                        e
                    )))),
                }
            })
            .collect()
    }

    /// Writes the machine's JSON document to `path`.
    pub fn save_machine(machine: &TuringMachine, path: &Path) -> Result<(), TuringMachineError> {
        let content = serde_json::to_string_pretty(&machine.to_json())?;
        fs::write(path, content).map_err(|e| {
            TuringMachineError::FileError(format!("Failed to write file {}: {}", path.display(), e))
        })
    }
}
