//! This module defines the `TuringMachine` struct, which drives a single-tape machine over a
//! `Program`. It handles forward stepping, stepping back through the recorded tape history,
//! termination detection, reset, and JSON import/export of the complete machine state.

use serde_json::{json, Value};
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::analyzer::analyze;
use crate::config::MachineConfig;
use crate::extended::{MotionAware, UserFriendlyTape};
use crate::program::Program;
use crate::recorded::{Op, Recordable};
use crate::tape::TapeCore;
use crate::types::{Halt, Motion, State, StepResult, Symbol, TuringMachineError};

/// A single-tape Turing machine with reversible execution.
///
/// `state_history` holds every state entered since the last reset; its first element is the
/// initial state and its last element is the current state.
#[derive(Debug, Clone)]
pub struct TuringMachine {
    program: Program,
    tape: UserFriendlyTape,
    final_states: BTreeSet<State>,
    initial_state: State,
    initial_tape: Value,
    state_history: Vec<State>,
    step_id: usize,
    name: String,
    max_iterations: usize,
}

/// The validated pieces of a machine JSON document, ready to be committed.
struct Decoded {
    program: Program,
    tape: UserFriendlyTape,
    final_states: BTreeSet<State>,
    initial_state: State,
    initial_tape: Value,
    state_history: Vec<State>,
    step_id: usize,
    name: Option<String>,
}

impl TuringMachine {
    /// Creates a new `TuringMachine`.
    ///
    /// The tape is snapshotted as the initial tape restored by `reset`.
    ///
    /// # Returns
    ///
    /// * `Err(TuringMachineError::Assertion)` if `final_states` is empty.
    pub fn new(
        program: Program,
        tape: UserFriendlyTape,
        final_states: impl IntoIterator<Item = State>,
        initial_state: State,
    ) -> Result<Self, TuringMachineError> {
        let final_states: BTreeSet<State> = final_states.into_iter().collect();
        if final_states.is_empty() {
            return Err(TuringMachineError::Assertion(
                "At least one final state is required".to_string(),
            ));
        }

        let config = MachineConfig::default();
        Ok(Self {
            program,
            initial_tape: tape.to_json(),
            tape,
            final_states,
            state_history: vec![initial_state.clone()],
            initial_state,
            step_id: 0,
            name: config.name,
            max_iterations: config.max_iterations,
        })
    }

    /// Applies a `MachineConfig` (name and iteration cap).
    pub fn with_config(mut self, config: &MachineConfig) -> Self {
        self.name = config.name.clone();
        self.max_iterations = config.max_iterations;
        self
    }

    /// Creates a machine from its JSON document.
    pub fn import(json: &Value) -> Result<Self, TuringMachineError> {
        let decoded = Self::decode(json, &UserFriendlyTape::default())?;
        let config = MachineConfig::default();

        Ok(Self {
            program: decoded.program,
            tape: decoded.tape,
            final_states: decoded.final_states,
            initial_state: decoded.initial_state,
            initial_tape: decoded.initial_tape,
            state_history: decoded.state_history,
            step_id: decoded.step_id,
            name: decoded.name.unwrap_or(config.name),
            max_iterations: config.max_iterations,
        })
    }

    /// Returns the current state.
    pub fn state(&self) -> &State {
        self.state_history.last().unwrap_or(&self.initial_state)
    }

    pub fn initial_state(&self) -> &State {
        &self.initial_state
    }

    /// Every state entered since the last reset, the initial state first.
    pub fn state_history(&self) -> &[State] {
        &self.state_history
    }

    pub fn final_states(&self) -> &BTreeSet<State> {
        &self.final_states
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn tape(&self) -> &UserFriendlyTape {
        &self.tape
    }

    /// Mutable access to the tape. Changes made here are not part of the initial tape.
    pub fn tape_mut(&mut self) -> &mut UserFriendlyTape {
        &mut self.tape
    }

    /// Returns the number of forward transitions since the last reset.
    pub fn step(&self) -> usize {
        self.step_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_program(&mut self, program: Program) {
        self.program = program;
    }

    /// Replaces the tape and makes it the tape restored by `reset`.
    pub fn set_tape(&mut self, tape: UserFriendlyTape) {
        self.initial_tape = tape.to_json();
        self.tape = tape;
    }

    pub fn set_final_states(
        &mut self,
        final_states: impl IntoIterator<Item = State>,
    ) -> Result<(), TuringMachineError> {
        let final_states: BTreeSet<State> = final_states.into_iter().collect();
        if final_states.is_empty() {
            return Err(TuringMachineError::Assertion(
                "At least one final state is required".to_string(),
            ));
        }
        self.final_states = final_states;
        Ok(())
    }

    /// Sets the state entered on reset. Before the first step it also becomes the current state.
    pub fn set_initial_state(&mut self, state: State) {
        if self.step_id == 0 {
            self.state_history = vec![state.clone()];
        }
        self.initial_state = state;
    }

    /// Checks the program for unreachable or undefined states.
    pub fn validate(&self) -> Result<(), TuringMachineError> {
        analyze(&self.program, &self.initial_state, &self.final_states)
    }

    /// Checks if the current state is one of the final states.
    pub fn final_state_reached(&self) -> bool {
        self.final_states.contains(self.state())
    }

    /// Checks if the program has no instruction for the current symbol and state.
    pub fn undefined_instruction(&self) -> bool {
        !self.program.exists(&self.tape.read(), self.state())
    }

    pub fn finished(&self) -> bool {
        self.final_state_reached() || self.undefined_instruction()
    }

    /// Executes up to `steps` transitions, stopping early once the machine is finished.
    ///
    /// # Returns
    ///
    /// * `None` if the machine was already finished and no transition ran.
    /// * `Some(results)` with one entry per executed transition otherwise.
    pub fn forth(&mut self, steps: usize) -> Option<Vec<StepResult>> {
        if self.finished() {
            debug!(state = %self.state(), step = self.step_id, "machine is finished");
            return None;
        }

        let mut results = Vec::with_capacity(steps);
        while results.len() < steps && !self.finished() {
            results.push(self.transition()?);
        }
        Some(results)
    }

    fn transition(&mut self) -> Option<StepResult> {
        let old_state = self.state().clone();
        let old_value = self.tape.read();
        let instr = self.program.get(&old_value, &old_state)?.clone();

        self.tape.snapshot();
        self.tape.write(instr.write.clone());
        self.tape.move_by(instr.motion);
        self.state_history.push(instr.next_state.clone());
        self.step_id += 1;

        debug!(
            step = self.step_id,
            read = %old_value,
            from = %old_state,
            write = %instr.write,
            motion = %instr.motion,
            to = %instr.next_state,
            "forth"
        );

        Some(StepResult {
            old_value,
            old_state,
            new_value: instr.write,
            motion: instr.motion,
            new_state: instr.next_state,
            step: self.step_id,
            next_is_undefined: self.undefined_instruction(),
            next_is_final: self.final_state_reached(),
        })
    }

    /// Reverts up to `steps` transitions.
    ///
    /// # Returns
    ///
    /// * `Err(TuringMachineError::OutOfHistory)` if not even one step can be reverted. Nothing
    ///   is changed in that case.
    /// * `Ok(results)` with one entry per reverted transition otherwise.
    pub fn back(&mut self, steps: usize) -> Result<Vec<StepResult>, TuringMachineError> {
        let mut results = Vec::with_capacity(steps);

        for _ in 0..steps {
            if self.state_history.len() <= 1 {
                if results.is_empty() {
                    return Err(TuringMachineError::OutOfHistory(
                        "Already at the initial state".to_string(),
                    ));
                }
                break;
            }
            match self.reverse() {
                Ok(result) => results.push(result),
                Err(TuringMachineError::OutOfHistory(_)) if !results.is_empty() => break,
                Err(e) => return Err(e),
            }
        }

        Ok(results)
    }

    /// Reverts one transition. The frame is decoded before anything is undone, so a failure
    /// leaves the tape, the state history and the step counter untouched.
    fn reverse(&mut self) -> Result<StepResult, TuringMachineError> {
        let pending: Vec<Op> = self
            .tape
            .history()
            .last()
            .map(|frame| frame.iter().rev().map(Op::inverse).collect())
            .unwrap_or_default();
        let (written, motion) = decode_frame(&pending)?;

        let before = self.tape.read();
        self.tape.undo()?;

        let old_state = self.state_history.pop().ok_or_else(|| {
            TuringMachineError::OutOfHistory("State history is empty".to_string())
        })?;
        self.step_id -= 1;

        let blank = self.tape.blank_symbol().clone();
        let (old_value, new_value) = match written {
            Some((old, new)) => (old.unwrap_or(blank.clone()), new.unwrap_or(blank)),
            None => (before, self.tape.read()),
        };

        debug!(
            step = self.step_id,
            from = %old_state,
            to = %self.state(),
            restored = %new_value,
            "back"
        );

        Ok(StepResult {
            old_value,
            old_state,
            new_value,
            motion,
            new_state: self.state().clone(),
            step: self.step_id,
            next_is_undefined: self.undefined_instruction(),
            next_is_final: self.final_state_reached(),
        })
    }

    /// Runs the machine until it is finished or the iteration cap is reached.
    pub fn run(&mut self) -> Halt {
        for _ in 0..self.max_iterations {
            if self.forth(1).is_none() {
                break;
            }
        }

        if self.final_state_reached() {
            Halt::FinalState
        } else if self.undefined_instruction() {
            Halt::UndefinedInstruction
        } else {
            Halt::IterationLimit
        }
    }

    /// Resets the Turing Machine to its initial configuration.
    /// This restores the initial tape, the state history and the step counter.
    pub fn reset(&mut self) -> Result<(), TuringMachineError> {
        self.tape.from_json(&self.initial_tape)?;
        self.state_history = vec![self.initial_state.clone()];
        self.step_id = 0;
        info!(name = %self.name, state = %self.initial_state, "machine reset");
        Ok(())
    }

    pub fn to_json(&self) -> Value {
        json!({
            "program": self.program.to_json(),
            "tape": self.tape.to_json(),
            "final_states": self.final_states,
            "initial_state": self.initial_state,
            "initial_tape": self.initial_tape,
            "state_history": self.state_history,
            "name": self.name,
            "step": self.step_id,
        })
    }

    /// Replaces the machine state with a JSON document.
    ///
    /// The whole document is validated before anything is replaced, so a failed import leaves
    /// the machine unchanged.
    pub fn from_json(&mut self, json: &Value) -> Result<(), TuringMachineError> {
        let decoded = Self::decode(json, &self.tape)?;

        self.program = decoded.program;
        self.tape = decoded.tape;
        self.final_states = decoded.final_states;
        self.initial_state = decoded.initial_state;
        self.initial_tape = decoded.initial_tape;
        self.state_history = decoded.state_history;
        self.step_id = decoded.step_id;
        if let Some(name) = decoded.name {
            self.name = name;
        }

        info!(name = %self.name, step = self.step_id, "machine imported");
        Ok(())
    }

    fn decode(json: &Value, template: &UserFriendlyTape) -> Result<Decoded, TuringMachineError> {
        for key in ["state_history", "tape", "program", "final_states"] {
            if json.get(key).is_none() {
                return Err(TuringMachineError::Assertion(format!(
                    "Machine JSON is missing '{}'",
                    key
                )));
            }
        }

        let mut program = Program::new();
        program.from_json(&json["program"])?;

        let mut tape = template.clone();
        tape.from_json(&json["tape"])?;

        let final_states: BTreeSet<State> =
            serde_json::from_value(json["final_states"].clone())?;
        if final_states.is_empty() {
            return Err(TuringMachineError::Assertion(
                "At least one final state is required".to_string(),
            ));
        }

        let state_history: Vec<State> = serde_json::from_value(json["state_history"].clone())?;
        let Some(first) = state_history.first().cloned() else {
            return Err(TuringMachineError::Assertion(
                "State history must contain the initial state".to_string(),
            ));
        };

        let initial_state = match json.get("initial_state") {
            Some(state) => serde_json::from_value(state.clone())?,
            None => first,
        };

        let initial_tape = match json.get("initial_tape") {
            Some(initial) => {
                let mut probe = template.clone();
                probe.from_json(initial)?;
                initial.clone()
            }
            None => tape.to_json(),
        };

        let step_id = match json.get("step") {
            Some(step) => step.as_u64().map(|step| step as usize).ok_or_else(|| {
                TuringMachineError::Syntax(format!("Invalid step counter: {}", step))
            })?,
            None => state_history.len() - 1,
        };
        if step_id != state_history.len() - 1 {
            return Err(TuringMachineError::Assertion(format!(
                "Step counter {} does not match a state history of {} entries",
                step_id,
                state_history.len()
            )));
        }

        let name = match json.get("name") {
            Some(Value::String(name)) => Some(name.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        };

        Ok(Decoded {
            program,
            tape,
            final_states,
            initial_state,
            initial_tape,
            state_history,
            step_id,
            name,
        })
    }
}

/// Decodes the inverse operations of one transition into the written cell values and the
/// motion of the original transition.
///
/// A transition frame holds at most one write and at most one unit move.
#[allow(clippy::type_complexity)]
fn decode_frame(
    inverse: &[Op],
) -> Result<(Option<(Option<Symbol>, Option<Symbol>)>, Motion), TuringMachineError> {
    let mut written = None;
    let mut moved = None;

    for op in inverse {
        match op {
            Op::Write { old, new } if written.is_none() => {
                written = Some((old.clone(), new.clone()));
            }
            Op::Move(delta) if moved.is_none() && delta.abs() <= 1 => moved = Some(*delta),
            _ => {
                return Err(TuringMachineError::Assertion(format!(
                    "Tape frame does not describe a single transition: {:?}",
                    inverse
                )))
            }
        }
    }

    let motion = match moved.map(|delta| -delta) {
        Some(1) => Motion::Right,
        Some(-1) => Motion::Left,
        _ => Motion::Stop,
    };
    Ok((written, motion))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TapeConfig;
    use crate::extended::Convenience;

    fn sym(s: &str) -> Symbol {
        Symbol::new(s).unwrap()
    }

    fn st(s: &str) -> State {
        State::new(s).unwrap()
    }

    fn unary_counter() -> TuringMachine {
        let mut program = Program::new();
        program
            .from_json(&json!([
                ["0", "Start", ["0", "RIGHT", "Start"]],
                ["1", "Start", ["1", "RIGHT", "Found1one"]],
                ["$", "Start", ["$", "STOP", "Count0ones"]],
                ["0", "Found1one", ["0", "RIGHT", "Found1one"]],
                ["1", "Found1one", ["1", "RIGHT", "Found2ones"]],
                ["$", "Found1one", ["$", "STOP", "Count1one"]],
                ["0", "Found2ones", ["0", "RIGHT", "Found2ones"]],
                ["1", "Found2ones", ["1", "STOP", "Count2ones"]],
                ["$", "Found2ones", ["$", "STOP", "Count2ones"]]
            ]))
            .unwrap();

        let mut tape = UserFriendlyTape::from_config(&TapeConfig::new(sym("0")));
        tape.from_array(["^", "0", "0", "0", "1", "0", "$"].map(sym));
        tape.move_to(crate::types::Position::new(1));

        TuringMachine::new(
            program,
            tape,
            [st("Count0ones"), st("Count1one"), st("Count2ones")],
            st("Start"),
        )
        .unwrap()
    }

    fn flipper() -> TuringMachine {
        let mut program = Program::new();
        program.set(sym("0"), st("flip"), sym("1"), Motion::Right, st("flip"));
        program.set(sym("1"), st("flip"), sym("0"), Motion::Right, st("flip"));
        program.set(sym("_"), st("flip"), sym("_"), Motion::Left, st("done"));

        let mut tape = UserFriendlyTape::from_config(&TapeConfig::new(sym("_")));
        tape.from_array(["1", "0", "1"].map(sym));

        TuringMachine::new(program, tape, [st("done")], st("flip")).unwrap()
    }

    #[test]
    fn test_machine_creation() {
        let machine = unary_counter();

        assert_eq!(machine.state(), &st("Start"));
        assert_eq!(machine.step(), 0);
        assert_eq!(machine.state_history(), &[st("Start")]);
        assert!(!machine.finished());
    }

    #[test]
    fn test_requires_final_states() {
        let result = TuringMachine::new(
            Program::new(),
            UserFriendlyTape::default(),
            Vec::new(),
            st("q0"),
        );
        assert!(matches!(result, Err(TuringMachineError::Assertion(_))));
    }

    #[test]
    fn test_unary_counter_scenario() {
        let mut machine = unary_counter();

        while machine.forth(1).is_some() {}

        assert!(machine.finished());
        assert!(machine.final_state_reached());
        assert_eq!(machine.state(), &st("Count1one"));
        assert_eq!(machine.step(), 6);
        assert_eq!(machine.state_history().len(), machine.step() + 1);
    }

    #[test]
    fn test_run_reports_halt_reason() {
        let mut machine = unary_counter();
        assert_eq!(machine.run(), Halt::FinalState);

        let mut machine = flipper();
        assert_eq!(machine.run(), Halt::FinalState);
        assert_eq!(machine.tape().to_human_string(), "0, 1, *0*");

        let mut machine = unary_counter().with_config(&MachineConfig {
            name: "capped".to_string(),
            max_iterations: 2,
        });
        assert_eq!(machine.run(), Halt::IterationLimit);
        assert_eq!(machine.step(), 2);
        assert_eq!(machine.name(), "capped");
    }

    #[test]
    fn test_undefined_instruction_scenario() {
        let tape = UserFriendlyTape::from_config(&TapeConfig::new(sym("_")));
        let mut machine = TuringMachine::new(Program::new(), tape, [st("end")], st("any")).unwrap();

        assert!(machine.undefined_instruction());
        assert!(machine.finished());
        assert!(machine.forth(1).is_none());
        assert_eq!(machine.step(), 0);
        assert_eq!(machine.run(), Halt::UndefinedInstruction);
    }

    #[test]
    fn test_forth_results() {
        let mut machine = flipper();

        let results = machine.forth(2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0],
            StepResult {
                old_value: sym("1"),
                old_state: st("flip"),
                new_value: sym("0"),
                motion: Motion::Right,
                new_state: st("flip"),
                step: 1,
                next_is_undefined: false,
                next_is_final: false,
            }
        );
        assert_eq!(results[1].step, 2);
    }

    #[test]
    fn test_forth_stops_when_finished() {
        let mut machine = flipper();

        let results = machine.forth(100).unwrap();
        assert_eq!(results.len(), 4);
        let last = results.last().unwrap();
        assert!(last.next_is_final);
        assert_eq!(last.new_state, st("done"));
        assert!(machine.forth(1).is_none());
    }

    #[test]
    fn test_finished_iff_final_or_undefined() {
        let mut machine = unary_counter();
        loop {
            assert_eq!(
                machine.finished(),
                machine.final_state_reached() || machine.undefined_instruction()
            );
            if machine.forth(1).is_none() {
                break;
            }
        }
    }

    #[test]
    fn test_forth_back_inverse() {
        let mut machine = flipper();
        machine.forth(1).unwrap();

        let state = machine.state().clone();
        let tape = machine.tape().to_json();
        let step = machine.step();

        machine.forth(1).unwrap();
        let results = machine.back(1).unwrap();

        assert_eq!(machine.state(), &state);
        assert_eq!(machine.tape().to_json(), tape);
        assert_eq!(machine.step(), step);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].old_value, sym("1"));
        assert_eq!(results[0].new_value, sym("0"));
        assert_eq!(results[0].motion, Motion::Right);
        assert_eq!(results[0].old_state, st("flip"));
        assert_eq!(results[0].step, 1);
    }

    #[test]
    fn test_forth_back_inverse_beyond_written_cells() {
        let mut machine = flipper();
        machine.forth(3).unwrap();
        let tape = machine.tape().to_json();

        let results = machine.forth(1).unwrap();
        assert_eq!(results[0].motion, Motion::Left);

        let results = machine.back(1).unwrap();
        assert_eq!(results[0].motion, Motion::Left);
        assert_eq!(machine.tape().to_json(), tape);
        assert_eq!(machine.state(), &st("flip"));
    }

    #[test]
    fn test_back_to_start() {
        let mut machine = flipper();
        let initial = machine.to_json();

        machine.forth(3).unwrap();
        let results = machine.back(10).unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(machine.step(), 0);
        assert_eq!(machine.to_json(), initial);
        assert!(matches!(
            machine.back(1),
            Err(TuringMachineError::OutOfHistory(_))
        ));
    }

    #[test]
    fn test_back_beyond_history_window() {
        let mut machine = flipper();
        machine.tape_mut().set_history_size(Some(1));
        machine.forth(2).unwrap();

        assert!(machine.back(1).is_ok());
        let before = machine.to_json();
        assert!(matches!(
            machine.back(1),
            Err(TuringMachineError::OutOfHistory(_))
        ));
        assert_eq!(machine.to_json(), before);
        assert_eq!(machine.step(), 1);
    }

    #[test]
    fn test_back_stops_at_history_window() {
        let mut machine = flipper();
        machine.tape_mut().set_history_size(Some(2));
        machine.forth(3).unwrap();

        let results = machine.back(3).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].step, 2);
        assert_eq!(results[1].step, 1);
        assert_eq!(machine.step(), 1);
        assert_eq!(machine.state_history().len(), 2);
        assert_eq!(machine.tape().to_human_string(), "0, *0*, 1");
    }

    #[test]
    fn test_back_rejects_foreign_frame_without_changes() {
        let mut machine = flipper();
        machine.forth(1).unwrap();
        machine.tape_mut().write(sym("x"));
        let before = machine.to_json();

        assert!(matches!(
            machine.back(1),
            Err(TuringMachineError::Assertion(_))
        ));
        assert_eq!(machine.to_json(), before);
        assert_eq!(machine.step(), 1);
        assert_eq!(machine.tape().to_human_string(), "0, *x*, 1");
    }

    #[test]
    fn test_validate() {
        assert!(flipper().validate().is_ok());
        assert!(unary_counter().validate().is_ok());

        let mut machine = flipper();
        machine.set_initial_state(st("nowhere"));
        assert!(matches!(
            machine.validate(),
            Err(TuringMachineError::ValidationError(_))
        ));

        let mut program = machine.program().clone();
        program.set(sym("0"), st("island"), sym("0"), Motion::Stop, st("done"));
        machine.set_initial_state(st("flip"));
        machine.set_program(program);
        let err = machine.validate().unwrap_err();
        assert!(err.to_string().contains("island"));
    }

    #[test]
    fn test_reset() {
        let mut machine = unary_counter();
        let initial_tape = machine.tape().to_json();

        machine.run();
        machine.reset().unwrap();

        assert_eq!(machine.state(), &st("Start"));
        assert_eq!(machine.step(), 0);
        assert_eq!(machine.state_history().len(), 1);
        assert_eq!(machine.tape().to_json(), initial_tape);
    }

    #[test]
    fn test_set_tape_updates_reset_target() {
        let mut machine = flipper();
        let mut tape = UserFriendlyTape::from_config(&TapeConfig::new(sym("_")));
        tape.from_array(["0", "0"].map(sym));
        machine.set_tape(tape);

        machine.run();
        assert_eq!(machine.tape().to_human_string(), "1, *1*");

        machine.reset().unwrap();
        assert_eq!(machine.tape().to_human_string(), "*0*, 0");
    }

    #[test]
    fn test_set_initial_state() {
        let mut machine = flipper();
        machine.set_initial_state(st("done"));
        assert_eq!(machine.state(), &st("done"));
        assert!(machine.finished());

        assert!(machine.set_final_states(Vec::new()).is_err());
        machine.set_final_states([st("elsewhere")]).unwrap();
        assert!(!machine.final_state_reached());
    }

    #[test]
    fn test_json_shape() {
        let mut machine = flipper();
        machine.set_name("flipper");
        machine.forth(1).unwrap();

        let json = machine.to_json();
        assert_eq!(json["final_states"], json!(["done"]));
        assert_eq!(json["initial_state"], json!("flip"));
        assert_eq!(json["state_history"], json!(["flip", "flip"]));
        assert_eq!(json["name"], json!("flipper"));
        assert_eq!(json["step"], json!(1));
        assert_eq!(json["tape"]["data"], json!(["0", "0", "1"]));
        assert_eq!(json["initial_tape"]["data"], json!(["1", "0", "1"]));
        assert_eq!(json["program"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_json_round_trip() {
        let mut machine = flipper();
        machine.forth(2).unwrap();
        let json = machine.to_json();

        let mut copy = TuringMachine::import(&json).unwrap();
        assert_eq!(copy.to_json(), json);
        assert_eq!(copy.state(), machine.state());

        copy.back(2).unwrap();
        assert_eq!(copy.tape().to_human_string(), "*1*, 0, 1");

        copy.forth(10).unwrap();
        machine.run();
        assert_eq!(copy.tape().to_json(), machine.tape().to_json());

        copy.reset().unwrap();
        assert_eq!(copy.step(), 0);
    }

    #[test]
    fn test_from_json_requires_keys() {
        let machine = flipper();
        for key in ["state_history", "tape", "program", "final_states"] {
            let mut json = machine.to_json();
            json.as_object_mut().unwrap().remove(key);

            let mut target = unary_counter();
            let before = target.to_json();
            let err = target.from_json(&json).unwrap_err();

            assert!(matches!(err, TuringMachineError::Assertion(_)), "{}", key);
            assert_eq!(target.to_json(), before);
        }
    }

    #[test]
    fn test_from_json_is_atomic() {
        let mut json = flipper().to_json();
        json["tape"] = json!({ "cursor": 0 });

        let mut target = unary_counter();
        let before = target.to_json();

        assert!(matches!(
            target.from_json(&json),
            Err(TuringMachineError::Syntax(_))
        ));
        assert_eq!(target.to_json(), before);
    }

    #[test]
    fn test_from_json_rejects_inconsistent_step() {
        let mut machine = flipper();
        machine.forth(2).unwrap();
        let mut json = machine.to_json();
        json["step"] = json!(5);

        let mut target = unary_counter();
        let before = target.to_json();

        assert!(matches!(
            target.from_json(&json),
            Err(TuringMachineError::Assertion(_))
        ));
        assert_eq!(target.to_json(), before);
        assert!(TuringMachine::import(&json).is_err());

        json["step"] = json!(2);
        assert_eq!(TuringMachine::import(&json).unwrap().step(), 2);
    }

    #[test]
    fn test_decode_frame_rejects_multi_step_frames() {
        let frame = [Op::Move(-1), Op::Move(-1)];
        assert!(matches!(
            decode_frame(&frame),
            Err(TuringMachineError::Assertion(_))
        ));

        let frame = [Op::Move(3)];
        assert!(decode_frame(&frame).is_err());

        let (written, motion) = decode_frame(&[]).unwrap();
        assert!(written.is_none());
        assert_eq!(motion, Motion::Stop);
    }
}
