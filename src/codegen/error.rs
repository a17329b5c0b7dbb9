//! Code generation error types.
//!
//! Everything the backend can reject carries the source position of the
//! statement or expression that caused it. Nesting errors deserve a note:
//! the parser emits `FOR`/`NEXT` and `WHILE`/`WEND` as independent
//! statements, so unbalanced loops only surface here, where the loop
//! stack lives.

use thiserror::Error;

use crate::ast::Pos;
use crate::diagnostics::{Diagnostic, DiagnosticKind, ToDiagnostic};

/// Error produced while lowering the AST to assembly.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodeGenError {
    /// Unbalanced or mismatched FOR/NEXT or WHILE/WEND.
    #[error("{message}")]
    Nesting {
        /// What is unbalanced.
        message: String,
        /// Position of the offending statement.
        pos: Pos,
    },

    /// An operation with no valid typing (string in arithmetic, undimensioned
    /// array, string loop index).
    #[error("{message}")]
    Type {
        /// What went wrong.
        message: String,
        /// Position of the offending expression or statement.
        pos: Pos,
    },

    /// A reference that survived parsing but has no destination here, such
    /// as RESTORE to a line without DATA.
    #[error("{message}")]
    Unresolved {
        /// What could not be resolved.
        message: String,
        /// Position of the reference.
        pos: Pos,
    },

    /// A constant operand outside its valid range.
    #[error("{message}")]
    Range {
        /// What was out of range.
        message: String,
        /// Position of the operand.
        pos: Pos,
    },
}

impl CodeGenError {
    /// Creates a nesting error.
    pub fn nesting(message: impl Into<String>, pos: Pos) -> Self {
        CodeGenError::Nesting {
            message: message.into(),
            pos,
        }
    }

    /// Creates a type error.
    pub fn type_error(message: impl Into<String>, pos: Pos) -> Self {
        CodeGenError::Type {
            message: message.into(),
            pos,
        }
    }
}

impl ToDiagnostic for CodeGenError {
    fn to_diagnostic(&self) -> Diagnostic {
        let (kind, pos) = match self {
            CodeGenError::Nesting { pos, .. } => (DiagnosticKind::NestingError, pos),
            CodeGenError::Type { pos, .. } => (DiagnosticKind::TypeError, pos),
            CodeGenError::Unresolved { pos, .. } => (DiagnosticKind::UnresolvedLabel, pos),
            CodeGenError::Range { pos, .. } => (DiagnosticKind::RangeError, pos),
        };
        Diagnostic::new(kind, pos.line, pos.column, self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nesting_kind_and_position() {
        let err = CodeGenError::nesting("NEXT without FOR", Pos::new(30, 4));
        let diag = err.to_diagnostic();
        assert_eq!(diag.kind, DiagnosticKind::NestingError);
        assert_eq!((diag.line, diag.column), (30, 4));
    }
}
