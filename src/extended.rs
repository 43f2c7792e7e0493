//! The outer tape layers: `ExtendedTape` adds motion by `Motion` value and full-tape
//! iteration, `UserFriendlyTape` adds bulk loading, alphabet collection and binary decoding.
//!
//! Each layer owns the layer below it and forwards everything it does not add.

use std::collections::BTreeSet;

use crate::config::TapeConfig;
use crate::recorded::{Op, RecordedTape, Recordable};
use crate::tape::{forward_tape_core, TapeCore};
use crate::types::{Motion, Position, Symbol, TuringMachineError};

/// The capability of moving the head by a `Motion` and walking the visited range.
pub trait MotionAware: TapeCore {
    /// Moves left or right by one cell. `Stop` and `Halt` leave the head in place.
    fn move_by(&mut self, motion: Motion);

    /// Calls `f(position, value)` for every position from `begin()` to `end()`, left to right.
    ///
    /// The cursor is not moved.
    fn for_each<F: FnMut(Position, &Symbol)>(&self, f: F);
}

/// The convenience operations offered by the outermost tape layer.
pub trait Convenience: MotionAware {
    /// Returns the distinct symbols seen by `for_each`.
    fn alphabet(&self) -> BTreeSet<Symbol>;

    /// Clears the tape and writes `values` from position 0 onwards, leaving the cursor at 0.
    fn from_array<I: IntoIterator<Item = Symbol>>(&mut self, values: I);

    /// Interprets the visited range as a binary number.
    fn read_binary_value(&self) -> Result<BinaryValue, TuringMachineError>;
}

/// A binary number read off a tape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryValue {
    pub value: u128,
    pub bits: String,
    pub length: usize,
}

/// A tape layer that understands `Motion` values.
#[derive(Debug, Clone, Default)]
pub struct ExtendedTape<T = RecordedTape> {
    inner: T,
}

impl<T> ExtendedTape<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: TapeCore> TapeCore for ExtendedTape<T> {
    forward_tape_core!(inner);
}

impl<T: Recordable> Recordable for ExtendedTape<T> {
    fn snapshot(&mut self) {
        self.inner.snapshot()
    }

    fn undo(&mut self) -> Result<Vec<Op>, TuringMachineError> {
        self.inner.undo()
    }

    fn history(&self) -> &[Vec<Op>] {
        self.inner.history()
    }

    fn history_size(&self) -> Option<usize> {
        self.inner.history_size()
    }
}

impl<T: TapeCore> MotionAware for ExtendedTape<T> {
    fn move_by(&mut self, motion: Motion) {
        match motion {
            Motion::Left => self.inner.left(1),
            Motion::Right => self.inner.right(1),
            Motion::Stop | Motion::Halt => {}
        }
    }

    fn for_each<F: FnMut(Position, &Symbol)>(&self, mut f: F) {
        let blank = self.inner.blank_symbol();
        for index in self.inner.begin().index()..=self.inner.end().index() {
            let position = Position::new(index);
            f(position, self.inner.cell(position).unwrap_or(blank));
        }
    }
}

/// The outermost tape layer, the one a `TuringMachine` drives.
#[derive(Debug, Clone, Default)]
pub struct UserFriendlyTape<T = ExtendedTape> {
    inner: T,
}

impl<T> UserFriendlyTape<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl UserFriendlyTape {
    /// Builds the full layer stack (`Tape` → `RecordedTape` → `ExtendedTape` → `UserFriendlyTape`).
    pub fn from_config(config: &TapeConfig) -> Self {
        Self::new(ExtendedTape::new(RecordedTape::from_config(config)))
    }

    /// Changes the number of retained undo frames.
    pub fn set_history_size(&mut self, history_size: Option<usize>) {
        self.inner.inner.set_history_size(history_size);
    }
}

impl<T: TapeCore> TapeCore for UserFriendlyTape<T> {
    forward_tape_core!(inner);
}

impl<T: Recordable> Recordable for UserFriendlyTape<T> {
    fn snapshot(&mut self) {
        self.inner.snapshot()
    }

    fn undo(&mut self) -> Result<Vec<Op>, TuringMachineError> {
        self.inner.undo()
    }

    fn history(&self) -> &[Vec<Op>] {
        self.inner.history()
    }

    fn history_size(&self) -> Option<usize> {
        self.inner.history_size()
    }
}

impl<T: MotionAware> MotionAware for UserFriendlyTape<T> {
    fn move_by(&mut self, motion: Motion) {
        self.inner.move_by(motion)
    }

    fn for_each<F: FnMut(Position, &Symbol)>(&self, f: F) {
        self.inner.for_each(f)
    }
}

impl<T: MotionAware> Convenience for UserFriendlyTape<T> {
    fn alphabet(&self) -> BTreeSet<Symbol> {
        let mut symbols = BTreeSet::new();
        self.for_each(|_, value| {
            symbols.insert(value.clone());
        });
        symbols
    }

    fn from_array<I: IntoIterator<Item = Symbol>>(&mut self, values: I) {
        self.clear();
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                self.right(1);
            }
            self.write(value);
        }
        self.move_to(Position::new(0));
    }

    fn read_binary_value(&self) -> Result<BinaryValue, TuringMachineError> {
        let mut bits = String::new();
        let mut invalid = None;

        self.for_each(|position, value| match value.as_str() {
            "0" | "1" => bits.push_str(value.as_str()),
            other => {
                invalid.get_or_insert_with(|| (position, other.to_string()));
            }
        });

        if let Some((position, symbol)) = invalid {
            return Err(TuringMachineError::InvalidValue(format!(
                "Non-binary symbol {:?} at position {}",
                symbol, position
            )));
        }

        let value = u128::from_str_radix(&bits, 2).map_err(|e| {
            TuringMachineError::InvalidValue(format!("Cannot decode {:?}: {}", bits, e))
        })?;

        Ok(BinaryValue {
            value,
            length: bits.len(),
            bits,
        })
    }
}
