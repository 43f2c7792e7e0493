//! This module provides the parser for human-readable tape strings such as `"1, 0, *0*, 1"`,
//! utilizing the `pest` crate. The grammar lives in `grammar.pest`.

use pest::{
    error::{Error, ErrorVariant},
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;

use crate::types::{Symbol, TuringMachineError};

/// Derives a `PestParser` for the tape grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct TapeParser;

/// The cells of a parsed tape string and the index of the cursor cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HumanTape {
    pub cells: Vec<Symbol>,
    pub cursor: usize,
}

/// Parses a human-readable tape string.
///
/// Every cell is trimmed and normalized as a symbol. A missing cursor marker puts the
/// cursor on the first cell.
///
/// # Returns
///
/// * `Ok(HumanTape)` if the input is well formed.
/// * `Err(TuringMachineError::ParseError)` on syntax errors or repeated cursor markers.
pub fn parse_human_tape(input: &str) -> Result<HumanTape, TuringMachineError> {
    let root = TapeParser::parse(Rule::tape, input)
        .map_err(|e| TuringMachineError::ParseError(Box::new(e)))?
        .next()
        .ok_or_else(|| TuringMachineError::Syntax("Empty tape string".to_string()))?;

    let mut cells = Vec::new();
    let mut cursor = None;

    for pair in root.into_inner() {
        match pair.as_rule() {
            Rule::cursor_cell => {
                if cursor.is_some() {
                    return Err(parse_error(
                        "Only one cell may be marked as cursor",
                        pair.as_span(),
                    ));
                }
                cursor = Some(cells.len());

                let marked = pair.as_str();
                let inner = marked
                    .strip_prefix('*')
                    .and_then(|rest| rest.strip_suffix('*'))
                    .unwrap_or(marked);
                cells.push(Symbol::new(inner)?);
            }
            Rule::plain_cell => cells.push(Symbol::new(pair.as_str())?),
            _ => {} // EOI
        }
    }

    Ok(HumanTape {
        cells,
        cursor: cursor.unwrap_or(0),
    })
}

/// Creates a `TuringMachineError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> TuringMachineError {
    TuringMachineError::ParseError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(values: &[&str]) -> Vec<Symbol> {
        values.iter().map(|v| Symbol::new(v).unwrap()).collect()
    }

    #[test]
    fn test_parse_with_cursor() {
        let tape = parse_human_tape("0,9,8,7,*6*,5").unwrap();
        assert_eq!(tape.cells, symbols(&["0", "9", "8", "7", "6", "5"]));
        assert_eq!(tape.cursor, 4);
    }

    #[test]
    fn test_parse_with_whitespace() {
        let tape = parse_human_tape("  1 , *0* ,  1 ").unwrap();
        assert_eq!(tape.cells, symbols(&["1", "0", "1"]));
        assert_eq!(tape.cursor, 1);
    }

    #[test]
    fn test_parse_without_cursor() {
        let tape = parse_human_tape("a, b").unwrap();
        assert_eq!(tape.cursor, 0);
        assert_eq!(tape.cells.len(), 2);
    }

    #[test]
    fn test_empty_cells_become_blank() {
        let tape = parse_human_tape("a,,* *").unwrap();
        assert_eq!(tape.cells, vec![
            Symbol::new("a").unwrap(),
            Symbol::default(),
            Symbol::default(),
        ]);
        assert_eq!(tape.cursor, 2);
    }

    #[test]
    fn test_multiple_cursors_rejected() {
        let err = parse_human_tape("*a*, *b*").unwrap_err();
        assert!(matches!(err, TuringMachineError::ParseError(_)));
        assert!(err.to_string().contains("Only one cell"));
    }

    #[test]
    fn test_malformed_input_rejected() {
        assert!(parse_human_tape("a, *b").is_err());
        assert!(parse_human_tape("a*b").is_err());
    }
}
