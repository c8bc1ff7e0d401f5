//! Shell-style field splitting for GDI track lines
//!
//! Follows POSIX shell word rules: whitespace separates fields, single quotes
//! take everything literally, double quotes allow `\"` and `\\` escapes, and a
//! backslash outside quotes escapes the next character. Quoted and unquoted
//! parts that touch form a single field.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("No closing quotation")]
    UnclosedQuote,

    #[error("No escaped character")]
    DanglingEscape,
}

#[derive(Clone, Copy)]
enum State {
    /// Between fields
    Idle,
    /// Inside an unquoted part of a field
    Word,
    SingleQuoted,
    DoubleQuoted,
}

/// Split a line into fields, removing quoting and escapes
pub fn split_fields(line: &str) -> Result<Vec<String>, FieldError> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut state = State::Idle;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        state = match (state, c) {
            (State::Idle | State::Word, c) if c.is_ascii_whitespace() => {
                if let State::Word = state {
                    fields.push(std::mem::take(&mut current));
                }
                State::Idle
            }
            (State::Idle | State::Word, '\'') => State::SingleQuoted,
            (State::Idle | State::Word, '"') => State::DoubleQuoted,
            (State::Idle | State::Word, '\\') => {
                current.push(chars.next().ok_or(FieldError::DanglingEscape)?);
                State::Word
            }
            (State::Idle | State::Word, c) => {
                current.push(c);
                State::Word
            }
            (State::SingleQuoted, '\'') => State::Word,
            (State::DoubleQuoted, '"') => State::Word,
            (State::DoubleQuoted, '\\') => {
                match chars.next() {
                    Some(escaped @ ('"' | '\\')) => current.push(escaped),
                    Some(other) => {
                        current.push('\\');
                        current.push(other);
                    }
                    None => return Err(FieldError::UnclosedQuote),
                }
                State::DoubleQuoted
            }
            (quoted, c) => {
                current.push(c);
                quoted
            }
        };
    }

    match state {
        State::Idle => {}
        State::Word => fields.push(current),
        State::SingleQuoted | State::DoubleQuoted => return Err(FieldError::UnclosedQuote),
    }

    Ok(fields)
}
