//! This module provides functions for analyzing Turing Machine programs to detect common errors
//! before execution: an unusable start state, final states that can never be entered, states
//! whose rules can never fire, and rows that compete for the same `(symbol, state)` key.

use std::collections::{BTreeMap, BTreeSet};

use crate::program::{Program, ProgramRow};
use crate::types::{State, Symbol, TuringMachineError};

/// Represents various errors that can be found during the analysis of a Turing Machine program.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AnalysisError {
    /// The initial state has no rules and is not final, so the machine cannot do anything.
    InvalidStartState(String),
    /// Final states that no transition ever enters.
    UnreachableFinalStates(Vec<String>),
    /// States with rules that cannot be reached from the initial state.
    UnreachableStates(Vec<String>),
    /// `(symbol, state)` keys defined by more than one row.
    NondeterministicRows(Vec<String>),
}

impl From<AnalysisError> for TuringMachineError {
    /// Converts an `AnalysisError` into a `TuringMachineError::ValidationError`.
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::InvalidStartState(state) => {
                TuringMachineError::ValidationError(format!("Invalid start state: {}", state))
            }
            AnalysisError::UnreachableFinalStates(states) => TuringMachineError::ValidationError(
                format!("Final states are never entered: {:?}", states),
            ),
            AnalysisError::UnreachableStates(states) => TuringMachineError::ValidationError(
                format!("Unreachable states detected: {:?}", states),
            ),
            AnalysisError::NondeterministicRows(keys) => TuringMachineError::ValidationError(
                format!("Multiple instructions for: {:?}", keys),
            ),
        }
    }
}

/// The program together with the machine settings the checks need.
struct Subject<'a> {
    program: &'a Program,
    initial_state: &'a State,
    final_states: &'a BTreeSet<State>,
}

/// Analyzes a program for logical errors.
///
/// # Returns
///
/// * `Ok(())` if no errors are found.
/// * `Err(TuringMachineError::ValidationError)` describing the first violated rule.
pub fn analyze(
    program: &Program,
    initial_state: &State,
    final_states: &BTreeSet<State>,
) -> Result<(), TuringMachineError> {
    let subject = Subject {
        program,
        initial_state,
        final_states,
    };

    [
        check_valid_start_state,
        check_final_states_reachable,
        check_unreachable_states,
    ]
    .iter()
    .find_map(|f| f(&subject).err())
    .map_or(Ok(()), |error| Err(error.into()))
}

/// Checks rows about to be imported for keys defined more than once.
///
/// `Program` keeps only the last row for a key, so such conflicts are only visible here.
pub fn check_rows(rows: &[ProgramRow]) -> Result<(), TuringMachineError> {
    let duplicates = nondeterministic_rows(rows);
    if duplicates.is_empty() {
        return Ok(());
    }

    Err(AnalysisError::NondeterministicRows(
        duplicates
            .iter()
            .map(|(symbol, state)| format!("({}, {})", symbol, state))
            .collect(),
    )
    .into())
}

/// Returns the `(symbol, state)` keys that occur in more than one row, sorted.
pub fn nondeterministic_rows(rows: &[ProgramRow]) -> Vec<(Symbol, State)> {
    let mut counts: BTreeMap<(&Symbol, &State), usize> = BTreeMap::new();
    for (symbol, state, _) in rows {
        *counts.entry((symbol, state)).or_default() += 1;
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|((symbol, state), _)| (symbol.clone(), state.clone()))
        .collect()
}

/// Collects every state reachable from the initial state by following next states.
fn reachable_states(subject: &Subject) -> BTreeSet<State> {
    let mut visited = BTreeSet::new();
    let mut queue = vec![subject.initial_state.clone()];

    while let Some(state) = queue.pop() {
        if !visited.insert(state.clone()) {
            continue;
        }

        for (_, source, instr) in subject.program.iter() {
            if source == &state && !visited.contains(&instr.next_state) {
                queue.push(instr.next_state.clone());
            }
        }
    }

    visited
}

/// Checks that the initial state either has rules or is already final.
fn check_valid_start_state(subject: &Subject) -> Result<(), AnalysisError> {
    let has_rules = subject
        .program
        .iter()
        .any(|(_, state, _)| state == subject.initial_state);

    if !has_rules && !subject.final_states.contains(subject.initial_state) {
        return Err(AnalysisError::InvalidStartState(
            subject.initial_state.to_string(),
        ));
    }

    Ok(())
}

/// Checks that every final state can be entered from the initial state.
fn check_final_states_reachable(subject: &Subject) -> Result<(), AnalysisError> {
    let reachable = reachable_states(subject);
    let unreachable: Vec<String> = subject
        .final_states
        .difference(&reachable)
        .map(State::to_string)
        .collect();

    if !unreachable.is_empty() {
        return Err(AnalysisError::UnreachableFinalStates(unreachable));
    }

    Ok(())
}

/// Checks for states with rules that can never be entered.
fn check_unreachable_states(subject: &Subject) -> Result<(), AnalysisError> {
    let reachable = reachable_states(subject);
    let unreachable: Vec<String> = subject
        .program
        .states()
        .difference(&reachable)
        .map(State::to_string)
        .collect();

    if !unreachable.is_empty() {
        return Err(AnalysisError::UnreachableStates(unreachable));
    }

    Ok(())
}
