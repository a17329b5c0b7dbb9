//! Parser error types.
//!
//! Parsing bails on the first mismatch: a well-formed program either
//! parses completely or produces exactly one error carrying the position,
//! what was expected, and what was found. There is no recovery.

use thiserror::Error;

use crate::diagnostics::{Diagnostic, DiagnosticKind, ToDiagnostic};
use crate::lexer::Token;
use crate::semantic::SemanticError;

/// A parse error with location and description.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// Expected a specific construct but found something else.
    #[error("expected {expected}, got {found}")]
    UnexpectedToken {
        /// What the grammar wanted here.
        expected: String,
        /// What the token stream held.
        found: String,
        /// 1-based source line.
        line: u32,
        /// 1-based source column.
        column: u32,
    },

    /// A keyword the grammar knows but this compiler does not support.
    #[error("'{keyword}' is not in the supported subset")]
    Unsupported {
        /// The keyword or construct as spelled.
        keyword: String,
        /// 1-based source line.
        line: u32,
        /// 1-based source column.
        column: u32,
    },

    /// An executable line without a number, or not starting like one.
    #[error("executable line must start with a line number")]
    MissingLineNumber {
        /// 1-based source line.
        line: u32,
        /// 1-based source column.
        column: u32,
    },

    /// Line numbers must strictly increase in source order.
    #[error("line number {number} not greater than previous line {previous}")]
    LineNumberOrder {
        /// The out-of-order number.
        number: u16,
        /// The number of the preceding line.
        previous: u16,
        /// 1-based source line.
        line: u32,
        /// 1-based source column.
        column: u32,
    },

    /// A numeric operand outside its valid range.
    #[error("{message}")]
    OutOfRange {
        /// What was out of range and why.
        message: String,
        /// 1-based source line.
        line: u32,
        /// 1-based source column.
        column: u32,
    },

    /// A LABEL with no numbered line following it.
    #[error("label '{name}' is not followed by a numbered line")]
    DanglingLabel {
        /// The label name.
        name: String,
        /// 1-based source line.
        line: u32,
        /// 1-based source column.
        column: u32,
    },

    /// Symbol-table errors surfacing during parse (suffix conflicts,
    /// duplicate labels).
    #[error(transparent)]
    Semantic(#[from] SemanticError),
}

impl ParseError {
    /// Creates an "unexpected token" error pointing at `found`.
    pub fn unexpected(expected: impl Into<String>, found: &Token) -> Self {
        ParseError::UnexpectedToken {
            expected: expected.into(),
            found: describe(found),
            line: found.line,
            column: found.column,
        }
    }

    /// Creates an UnsupportedFeature error for a keyword token.
    pub fn unsupported(token: &Token) -> Self {
        ParseError::Unsupported {
            keyword: token.text.to_ascii_uppercase(),
            line: token.line,
            column: token.column,
        }
    }
}

/// How a token reads in an error message: keywords and punctuation by
/// their spelling, literals by their class.
fn describe(token: &Token) -> String {
    use crate::lexer::TokenKind::*;
    match token.kind {
        IntegerLiteral | HexLiteral | BinaryLiteral | RealLiteral | StringLiteral
        | Identifier | EndOfLine | EndOfFile => token.kind.to_string(),
        _ => format!("'{}'", token.text),
    }
}

impl ToDiagnostic for ParseError {
    fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ParseError::UnexpectedToken { line, column, .. }
            | ParseError::MissingLineNumber { line, column }
            | ParseError::LineNumberOrder { line, column, .. }
            | ParseError::DanglingLabel { line, column, .. } => {
                Diagnostic::new(DiagnosticKind::SyntaxError, *line, *column, self.to_string())
            }
            ParseError::Unsupported { line, column, .. } => Diagnostic::new(
                DiagnosticKind::UnsupportedFeature,
                *line,
                *column,
                self.to_string(),
            ),
            ParseError::OutOfRange { line, column, .. } => {
                Diagnostic::new(DiagnosticKind::RangeError, *line, *column, self.to_string())
            }
            ParseError::Semantic(inner) => inner.to_diagnostic(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{TokenKind, TokenValue};

    #[test]
    fn test_unexpected_spells_punctuation() {
        let token = Token::new(TokenKind::Comma, ",", TokenValue::None, 4, 12);
        let err = ParseError::unexpected("THEN", &token);
        assert_eq!(err.to_string(), "expected THEN, got ','");
        assert_eq!(err.to_diagnostic().kind, DiagnosticKind::SyntaxError);
        assert_eq!(err.to_diagnostic().column, 12);
    }

    #[test]
    fn test_unsupported_uppercases() {
        let token = Token::new(TokenKind::UnsupportedKeyword, "border", TokenValue::None, 2, 4);
        let err = ParseError::unsupported(&token);
        assert!(err.to_string().contains("BORDER"));
        assert_eq!(err.to_diagnostic().kind, DiagnosticKind::UnsupportedFeature);
    }
}
