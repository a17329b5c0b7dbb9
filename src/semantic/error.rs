//! Semantic error types.

use thiserror::Error;

use crate::diagnostics::{Diagnostic, DiagnosticKind, ToDiagnostic};
use crate::semantic::types::ValueType;

/// Error produced by symbol handling and post-parse resolution.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SemanticError {
    /// A variable used with a suffix conflicting with its fixed type.
    #[error("variable '{name}' is {declared}, used as {used}")]
    TypeConflict {
        /// Canonical variable name.
        name: String,
        /// The type its first reference fixed.
        declared: ValueType,
        /// The type the conflicting reference asks for.
        used: ValueType,
        /// 1-based source line of the conflicting use.
        line: u32,
        /// 1-based source column of the conflicting use.
        column: u32,
    },

    /// A GOTO/GOSUB/THEN/RESTORE target that names no line.
    #[error("no such line: {target}")]
    UnresolvedTarget {
        /// The missing target as spelled (number or label name).
        target: String,
        /// 1-based source line of the reference.
        line: u32,
        /// 1-based source column of the reference.
        column: u32,
    },

    /// Two LABELs binding the same name.
    #[error("duplicate label '{name}'")]
    DuplicateLabel {
        /// The label name.
        name: String,
        /// 1-based source line of the second binding.
        line: u32,
        /// 1-based source column of the second binding.
        column: u32,
    },
}

impl ToDiagnostic for SemanticError {
    fn to_diagnostic(&self) -> Diagnostic {
        match self {
            SemanticError::TypeConflict { line, column, .. } => {
                Diagnostic::new(DiagnosticKind::TypeError, *line, *column, self.to_string())
            }
            SemanticError::UnresolvedTarget { line, column, .. } => Diagnostic::new(
                DiagnosticKind::UnresolvedLabel,
                *line,
                *column,
                self.to_string(),
            ),
            SemanticError::DuplicateLabel { line, column, .. } => Diagnostic::new(
                DiagnosticKind::SyntaxError,
                *line,
                *column,
                self.to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_target_kind() {
        let err = SemanticError::UnresolvedTarget {
            target: "99".to_string(),
            line: 1,
            column: 9,
        };
        let diag = err.to_diagnostic();
        assert_eq!(diag.kind, DiagnosticKind::UnresolvedLabel);
        assert_eq!(diag.line, 1);
        assert!(diag.message.contains("99"));
    }

    #[test]
    fn test_type_conflict_message() {
        let err = SemanticError::TypeConflict {
            name: "A".to_string(),
            declared: ValueType::Integer,
            used: ValueType::String,
            line: 2,
            column: 1,
        };
        assert_eq!(err.to_string(), "variable 'A' is integer, used as string");
    }
}
