//! This module defines the base infinite tape and the `TapeCore` capability shared by every
//! tape layer.
//!
//! Storage is sparse: a cell that was never written holds `None` and reads as the blank
//! symbol. The `offset` translates a logical `Position` into an index of the backing vector,
//! and grows whenever a write lands left of the first stored cell.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::TapeConfig;
use crate::parser::parse_human_tape;
use crate::types::{Position, Symbol, TuringMachineError};

/// The operations every tape layer offers.
pub trait TapeCore {
    /// The symbol occupying cells that were never written.
    fn blank_symbol(&self) -> &Symbol;

    /// The current head position.
    fn cursor(&self) -> Position;

    /// The leftmost position ever visited.
    fn begin(&self) -> Position;

    /// The rightmost position ever visited.
    fn end(&self) -> Position;

    /// Returns the stored value at `position`, or `None` for a never-written cell.
    fn cell(&self, position: Position) -> Option<&Symbol>;

    /// Reads the symbol at `position`, extending the visited range when needed.
    fn read_at(&mut self, position: Position) -> Symbol;

    /// Writes `value` under the cursor.
    fn write(&mut self, value: Symbol);

    fn left(&mut self, n: usize);

    fn right(&mut self, n: usize);

    fn move_to(&mut self, position: Position);

    /// Empties the tape and puts the cursor back to position 0.
    fn clear(&mut self);

    fn to_json(&self) -> Value;

    /// Replaces the tape content with a JSON document.
    ///
    /// Fails with `Syntax` and leaves the tape untouched when `data` or `cursor` is missing.
    fn from_json(&mut self, json: &Value) -> Result<(), TuringMachineError>;

    /// Reads the symbol under the cursor.
    fn read(&self) -> Symbol {
        self.cell(self.cursor())
            .cloned()
            .unwrap_or_else(|| self.blank_symbol().clone())
    }

    /// Reads `count` symbols centered on `position`. `count` must be odd.
    fn read_window(
        &mut self,
        position: Position,
        count: usize,
    ) -> Result<Vec<Symbol>, TuringMachineError> {
        if count % 2 == 0 {
            return Err(TuringMachineError::Assertion(format!(
                "Window size must be odd, got {}",
                count
            )));
        }

        let half = (count / 2) as i64;
        Ok((-half..=half)
            .map(|delta| self.read_at(position + delta))
            .collect())
    }

    /// Compares two tapes over the union of their visited ranges.
    ///
    /// With `ignore_blanks`, a never-written cell equals a cell holding the blank symbol.
    /// Tapes with different blank symbols are never equal.
    fn equals<T: TapeCore + ?Sized>(&self, other: &T, ignore_blanks: bool, ignore_cursor: bool) -> bool
    where
        Self: Sized,
    {
        if self.blank_symbol() != other.blank_symbol() {
            return false;
        }
        if !ignore_cursor && self.cursor() != other.cursor() {
            return false;
        }

        let from = self.begin().min(other.begin()).index();
        let to = self.end().max(other.end()).index();

        (from..=to).map(Position::new).all(|position| {
            let (mine, theirs) = (self.cell(position), other.cell(position));
            if ignore_blanks {
                mine.unwrap_or(self.blank_symbol()) == theirs.unwrap_or(other.blank_symbol())
            } else {
                mine == theirs
            }
        })
    }

    /// Renders the tape as comma-separated symbols with the cursor cell wrapped in `*...*`.
    ///
    /// Blank cells at both ends are dropped; the cursor cell is always kept.
    fn to_human_string(&self) -> String {
        let blank = self.blank_symbol();
        let cursor = self.cursor().index();
        let filled: Vec<i64> = (self.begin().index()..=self.end().index())
            .filter(|&index| {
                self.cell(Position::new(index))
                    .is_some_and(|symbol| symbol != blank)
            })
            .collect();

        let from = filled.first().map_or(cursor, |&first| first.min(cursor));
        let to = filled.last().map_or(cursor, |&last| last.max(cursor));

        (from..=to)
            .map(|index| {
                let symbol = self.cell(Position::new(index)).unwrap_or(blank);
                if index == cursor {
                    format!("*{}*", symbol)
                } else {
                    symbol.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Replaces the tape content with a human-readable tape string such as `"1, *0*, 1"`.
    ///
    /// Cells are written from position 0; the cursor lands on the marked cell (or 0).
    fn from_human_string(&mut self, text: &str) -> Result<(), TuringMachineError> {
        let parsed = parse_human_tape(text)?;

        self.clear();
        for (i, symbol) in parsed.cells.into_iter().enumerate() {
            if i > 0 {
                self.right(1);
            }
            self.write(symbol);
        }
        self.move_to(Position::new(parsed.cursor as i64));

        Ok(())
    }
}

/// Implements `TapeCore` for a layer by forwarding every call to the named field.
macro_rules! forward_tape_core {
    ($field:ident) => {
        fn blank_symbol(&self) -> &$crate::types::Symbol {
            self.$field.blank_symbol()
        }

        fn cursor(&self) -> $crate::types::Position {
            self.$field.cursor()
        }

        fn begin(&self) -> $crate::types::Position {
            self.$field.begin()
        }

        fn end(&self) -> $crate::types::Position {
            self.$field.end()
        }

        fn cell(&self, position: $crate::types::Position) -> Option<&$crate::types::Symbol> {
            self.$field.cell(position)
        }

        fn read_at(&mut self, position: $crate::types::Position) -> $crate::types::Symbol {
            self.$field.read_at(position)
        }

        fn write(&mut self, value: $crate::types::Symbol) {
            self.$field.write(value)
        }

        fn left(&mut self, n: usize) {
            self.$field.left(n)
        }

        fn right(&mut self, n: usize) {
            self.$field.right(n)
        }

        fn move_to(&mut self, position: $crate::types::Position) {
            self.$field.move_to(position)
        }

        fn clear(&mut self) {
            self.$field.clear()
        }

        fn to_json(&self) -> serde_json::Value {
            self.$field.to_json()
        }

        fn from_json(
            &mut self,
            json: &serde_json::Value,
        ) -> Result<(), $crate::types::TuringMachineError> {
            self.$field.from_json(json)
        }
    };
}

pub(crate) use forward_tape_core;

/// The JSON form of a tape. Every field is optional so missing keys can be reported.
#[derive(Deserialize)]
struct TapeDocument {
    blank_symbol: Option<Symbol>,
    #[serde(default)]
    offset: usize,
    cursor: Option<Position>,
    data: Option<Vec<Option<Symbol>>>,
}

/// Converts a cell count into a signed distance, saturating at `i64::MAX`.
pub(crate) fn distance(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// A sparse, two-way infinite tape.
#[derive(Debug, Clone)]
pub struct Tape {
    data: Vec<Option<Symbol>>,
    offset: usize,
    cursor: Position,
    blank_symbol: Symbol,
    min: i64,
    max: i64,
}

impl Tape {
    pub fn new(blank_symbol: Symbol) -> Self {
        Self {
            data: Vec::new(),
            offset: 0,
            cursor: Position::default(),
            blank_symbol,
            min: 0,
            max: 0,
        }
    }

    pub fn from_config(config: &TapeConfig) -> Self {
        Self::new(config.blank_symbol.clone())
    }

    /// The number of cells in the backing storage.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The distance from logical position 0 to index 0 of the backing storage.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn index_of(&self, position: Position) -> Option<usize> {
        let index = position.index() + self.offset as i64;
        (0..self.data.len() as i64)
            .contains(&index)
            .then_some(index as usize)
    }

    fn touch(&mut self, position: Position) {
        self.min = self.min.min(position.index());
        self.max = self.max.max(position.index());
    }

    /// Stores `value` at `position`, growing the storage on the side it falls off.
    pub(crate) fn put(&mut self, position: Position, value: Option<Symbol>) {
        let mut index = position.index() + self.offset as i64;
        if index < 0 {
            let missing = index.unsigned_abs() as usize;
            let mut grown = vec![None; missing];
            grown.append(&mut self.data);
            self.data = grown;
            self.offset += missing;
            index = 0;
        }

        let index = index as usize;
        if index >= self.data.len() {
            self.data.resize(index + 1, None);
        }
        self.data[index] = value;
        self.touch(position);
    }

    /// Moves the cursor by a signed distance.
    pub(crate) fn shift(&mut self, delta: i64) {
        self.cursor = self.cursor + delta;
        self.touch(self.cursor);
    }
}

impl Default for Tape {
    fn default() -> Self {
        Self::new(Symbol::default())
    }
}

impl TapeCore for Tape {
    fn blank_symbol(&self) -> &Symbol {
        &self.blank_symbol
    }

    fn cursor(&self) -> Position {
        self.cursor
    }

    fn begin(&self) -> Position {
        Position::new(self.min)
    }

    fn end(&self) -> Position {
        Position::new(self.max)
    }

    fn cell(&self, position: Position) -> Option<&Symbol> {
        self.index_of(position)
            .and_then(|index| self.data[index].as_ref())
    }

    fn read_at(&mut self, position: Position) -> Symbol {
        self.touch(position);
        self.cell(position)
            .cloned()
            .unwrap_or_else(|| self.blank_symbol.clone())
    }

    fn write(&mut self, value: Symbol) {
        self.put(self.cursor, Some(value));
    }

    fn left(&mut self, n: usize) {
        self.shift(-distance(n));
    }

    fn right(&mut self, n: usize) {
        self.shift(distance(n));
    }

    fn move_to(&mut self, position: Position) {
        self.cursor = position;
        self.touch(position);
    }

    fn clear(&mut self) {
        self.data.clear();
        self.offset = 0;
        self.cursor = Position::default();
        self.min = 0;
        self.max = 0;
    }

    /// Emits the canonical JSON form: never-written cells are dropped from both ends of `data`
    /// while position 0 stays inside the stored range.
    fn to_json(&self) -> Value {
        let first = self.data.iter().position(Option::is_some);
        let last = self.data.iter().rposition(Option::is_some);

        let (data, offset) = match (first, last) {
            (Some(first), Some(last)) => {
                let from = (first as i64 - self.offset as i64).min(0);
                let to = (last as i64 - self.offset as i64).max(0);
                let data: Vec<Option<Symbol>> = (from..=to)
                    .map(|index| self.cell(Position::new(index)).cloned())
                    .collect();
                (data, from.unsigned_abs())
            }
            _ => (Vec::new(), 0),
        };

        json!({
            "blank_symbol": self.blank_symbol,
            "offset": offset,
            "cursor": self.cursor,
            "data": data,
        })
    }

    fn from_json(&mut self, json: &Value) -> Result<(), TuringMachineError> {
        let document: TapeDocument = serde_json::from_value(json.clone()).map_err(|e| {
            TuringMachineError::Syntax(format!("Cannot import tape from JSON: {}", e))
        })?;

        let (Some(data), Some(cursor)) = (document.data, document.cursor) else {
            return Err(TuringMachineError::Syntax(
                "Cannot import tape from JSON: data or cursor missing".to_string(),
            ));
        };

        if document.offset > data.len() {
            return Err(TuringMachineError::Syntax(format!(
                "Cannot import tape from JSON: offset {} exceeds the {} stored cells",
                document.offset,
                data.len()
            )));
        }

        if let Some(blank_symbol) = document.blank_symbol {
            self.blank_symbol = blank_symbol;
        }
        self.offset = document.offset;
        self.data = data;
        self.cursor = cursor;

        if self.data.is_empty() {
            self.min = cursor.index();
            self.max = cursor.index();
        } else {
            let first = -(self.offset as i64);
            let last = first + self.data.len() as i64 - 1;
            self.min = first.min(cursor.index());
            self.max = last.max(cursor.index());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> Symbol {
        Symbol::new(s).unwrap()
    }

    fn tape_with(values: &[&str]) -> Tape {
        let mut tape = Tape::new(sym("_"));
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                tape.right(1);
            }
            tape.write(sym(value));
        }
        tape.move_to(Position::new(0));
        tape
    }

    #[test]
    fn test_write_read_identity() {
        let mut tape = Tape::default();
        tape.write(sym("a"));
        assert_eq!(tape.read(), sym("a"));

        tape.left(3);
        tape.write(sym("b"));
        assert_eq!(tape.read(), sym("b"));
        assert_eq!(tape.offset(), 3);
        assert_eq!(tape.read_at(Position::new(0)), sym("a"));
    }

    #[test]
    fn test_unwritten_cells_read_blank() {
        let mut tape = Tape::new(sym("_"));
        assert_eq!(tape.read(), sym("_"));
        assert_eq!(tape.read_at(Position::new(-10)), sym("_"));
        assert!(tape.is_empty());
        assert_eq!(tape.begin(), Position::new(-10));
    }

    #[test]
    fn test_storage_grows_on_write_only() {
        let mut tape = Tape::default();
        tape.right(5);
        assert_eq!(tape.size(), 0);

        tape.write(sym("x"));
        assert_eq!(tape.size(), 6);

        tape.move_to(Position::new(-2));
        tape.write(sym("y"));
        assert_eq!(tape.size(), 8);
        assert_eq!(tape.offset(), 2);
        assert_eq!(tape.cell(Position::new(-1)), None);
        assert_eq!(tape.cell(Position::new(5)), Some(&sym("x")));
    }

    #[test]
    fn test_motion_inverse() {
        let mut tape = Tape::default();
        tape.move_to(Position::new(4));
        for n in [0, 1, 7] {
            tape.left(n);
            tape.right(n);
            assert_eq!(tape.cursor(), Position::new(4));
            tape.right(n);
            tape.left(n);
            assert_eq!(tape.cursor(), Position::new(4));
        }
    }

    #[test]
    fn test_watermarks_cover_cursor() {
        let mut tape = Tape::default();
        tape.left(2);
        tape.right(6);
        assert_eq!(tape.begin(), Position::new(-2));
        assert_eq!(tape.end(), Position::new(4));
        assert!(tape.begin() <= tape.cursor() && tape.cursor() <= tape.end());
    }

    #[test]
    fn test_read_window() {
        let mut tape = tape_with(&["a", "b", "c"]);
        let window = tape.read_window(Position::new(1), 5).unwrap();
        assert_eq!(window, vec![sym("_"), sym("a"), sym("b"), sym("c"), sym("_")]);
        assert_eq!(tape.begin(), Position::new(-1));
        assert_eq!(tape.end(), Position::new(3));
        assert_eq!(tape.size(), 3);

        assert!(matches!(
            tape.read_window(Position::new(0), 2),
            Err(TuringMachineError::Assertion(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let mut tape = tape_with(&["1", "0", "1"]);
        tape.left(2);
        tape.write(sym("$"));
        tape.right(3);

        let mut copy = Tape::default();
        copy.from_json(&tape.to_json()).unwrap();

        assert!(copy.equals(&tape, false, false));
        assert_eq!(copy.to_json(), tape.to_json());
    }

    #[test]
    fn test_to_json_shape() {
        let mut tape = tape_with(&["a", "b"]);
        tape.left(1);
        tape.write(sym("z"));

        assert_eq!(
            tape.to_json(),
            json!({
                "blank_symbol": "_",
                "offset": 1,
                "cursor": -1,
                "data": ["z", "a", "b"],
            })
        );
    }

    #[test]
    fn test_to_json_trims_unwritten_ends() {
        let mut tape = Tape::new(sym("_"));
        tape.right(3);
        tape.write(sym("x"));
        tape.put(Position::new(3), None);

        assert_eq!(
            tape.to_json(),
            json!({ "blank_symbol": "_", "offset": 0, "cursor": 3, "data": [] })
        );
    }

    #[test]
    fn test_from_json_requires_data_and_cursor() {
        let mut tape = tape_with(&["a"]);
        let before = tape.to_json();

        for bad in [
            json!({ "cursor": 0 }),
            json!({ "data": ["a"] }),
            json!({ "data": "abc", "cursor": 0 }),
        ] {
            assert!(matches!(
                tape.from_json(&bad),
                Err(TuringMachineError::Syntax(_))
            ));
        }
        assert_eq!(tape.to_json(), before);
    }

    #[test]
    fn test_from_json_rejects_offset_beyond_data() {
        let mut tape = tape_with(&["a"]);
        let before = tape.to_json();

        for offset in [json!(2), json!(9_223_372_036_854_775_808u64), json!(u64::MAX)] {
            let result = tape.from_json(&json!({
                "offset": offset,
                "cursor": 0,
                "data": ["a"],
            }));
            assert!(matches!(result, Err(TuringMachineError::Syntax(_))));
        }
        assert_eq!(tape.to_json(), before);

        tape.from_json(&json!({ "offset": 1, "cursor": 0, "data": ["a"] }))
            .unwrap();
        assert_eq!(tape.begin(), Position::new(-1));
        assert_eq!(tape.end(), Position::new(0));
    }

    #[test]
    fn test_huge_moves_saturate() {
        let mut tape = Tape::default();
        tape.left(usize::MAX);
        assert_eq!(tape.cursor(), Position::new(-i64::MAX));

        tape.move_to(Position::new(0));
        tape.right(usize::MAX);
        assert_eq!(tape.cursor(), Position::new(i64::MAX));
        tape.right(1);
        assert_eq!(tape.cursor(), Position::new(i64::MAX));
    }

    #[test]
    fn test_from_json_with_offset() {
        let mut tape = Tape::default();
        tape.from_json(&json!({
            "blank_symbol": "0",
            "offset": 2,
            "cursor": 1,
            "data": ["a", null, "b", "c"],
        }))
        .unwrap();

        assert_eq!(tape.blank_symbol(), &sym("0"));
        assert_eq!(tape.read(), sym("c"));
        assert_eq!(tape.cell(Position::new(-2)), Some(&sym("a")));
        assert_eq!(tape.cell(Position::new(-1)), None);
        assert_eq!(tape.begin(), Position::new(-2));
        assert_eq!(tape.end(), Position::new(1));
    }

    #[test]
    fn test_equals_blank_handling() {
        let mut written = Tape::new(sym("_"));
        written.write(sym("_"));
        let untouched = Tape::new(sym("_"));

        assert!(written.equals(&untouched, true, false));
        assert!(!written.equals(&untouched, false, false));

        let other_blank = Tape::new(sym("0"));
        assert!(!untouched.equals(&other_blank, true, true));
    }

    #[test]
    fn test_equals_cursor_handling() {
        let mut a = tape_with(&["1", "2"]);
        let b = tape_with(&["1", "2"]);
        a.right(1);

        assert!(!a.equals(&b, true, false));
        assert!(a.equals(&b, true, true));
    }

    #[test]
    fn test_human_string_round_trip() {
        let mut tape = Tape::default();
        tape.from_human_string("0,9,8,7,*6*,5").unwrap();

        assert_eq!(tape.cursor(), Position::new(4));
        assert_eq!(tape.read(), sym("6"));
        assert_eq!(tape.to_human_string(), "0, 9, 8, 7, *6*, 5");
    }

    #[test]
    fn test_human_string_trims_blanks() {
        let mut tape = Tape::new(sym("_"));
        tape.from_human_string("_, _, a, b, _, *_*, _").unwrap();

        assert_eq!(tape.to_human_string(), "a, b, _, *_*");

        tape.move_to(Position::new(-2));
        assert_eq!(tape.to_human_string(), "*_*, _, _, _, a, b");
    }

    #[test]
    fn test_human_string_of_empty_tape() {
        let tape = Tape::new(sym("_"));
        assert_eq!(tape.to_human_string(), "*_*");
    }

    #[test]
    fn test_clear() {
        let mut tape = tape_with(&["a", "b"]);
        tape.right(4);
        tape.clear();

        assert!(tape.is_empty());
        assert_eq!(tape.cursor(), Position::new(0));
        assert_eq!(tape.begin(), tape.end());
    }
}
