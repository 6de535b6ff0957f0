//! Syntax errors with position information

use std::fmt;

/// A syntax error, carrying the position it was detected at
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub line: usize,
    pub column: usize,
}

/// Syntax error kinds
#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxErrorKind {
    /// Unexpected token
    UnexpectedToken { found: String, expected: String },
    /// Unexpected end of input
    UnexpectedEndOfInput,
    /// Unterminated string literal
    UnterminatedString,
    /// Unterminated block comment
    UnterminatedComment,
    /// Invalid number literal
    InvalidNumber(String),
    /// Character the scanner does not recognize
    UnexpectedCharacter(char),
    /// `use`/`include` is only allowed at the top level of a file
    ReferenceNotTopLevel,
    /// `use`/`include` with an empty filename
    EmptyReference,
}

impl SyntaxError {
    pub fn at(kind: SyntaxErrorKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: ", self.line, self.column)?;
        match &self.kind {
            SyntaxErrorKind::UnexpectedToken { found, expected } => {
                write!(f, "unexpected {}, expected {}", found, expected)
            }
            SyntaxErrorKind::UnexpectedEndOfInput => write!(f, "unexpected end of input"),
            SyntaxErrorKind::UnterminatedString => write!(f, "unterminated string literal"),
            SyntaxErrorKind::UnterminatedComment => write!(f, "unterminated block comment"),
            SyntaxErrorKind::InvalidNumber(text) => write!(f, "invalid number literal '{}'", text),
            SyntaxErrorKind::UnexpectedCharacter(c) => write!(f, "unexpected character '{}'", c),
            SyntaxErrorKind::ReferenceNotTopLevel => {
                write!(f, "use/include is only allowed at the top level of a file")
            }
            SyntaxErrorKind::EmptyReference => write!(f, "use/include requires a filename"),
        }
    }
}

impl std::error::Error for SyntaxError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_position() {
        let err = SyntaxError::at(
            SyntaxErrorKind::UnexpectedToken {
                found: "'}'".to_string(),
                expected: "';'".to_string(),
            },
            4,
            12,
        );
        assert_eq!(err.to_string(), "4:12: unexpected '}', expected ';'");
    }
}
