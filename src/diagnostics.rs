//! Source-anchored diagnostics.
//!
//! Every error the compiler reports carries a source position and one of a
//! closed set of kinds. Fatal diagnostics abort compilation; warnings are
//! printed and compilation continues.
//!
//! The report format on stderr is:
//!
//! ```text
//! <file>:<line>:<column>: <kind>: <message>
//! ```
//!
//! with `warning:` substituted for the kind prefix position on non-fatal
//! diagnostics.

use std::fmt;

/// The closed set of diagnostic kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Malformed token (bad character, unterminated string).
    LexError,
    /// Token stream does not match the grammar.
    SyntaxError,
    /// Conflicting or impossible types (suffix conflict, string in arithmetic).
    TypeError,
    /// A GOTO/GOSUB/THEN target that names no line.
    UnresolvedLabel,
    /// Unbalanced FOR/NEXT or WHILE/WEND.
    NestingError,
    /// Numeric literal or operand outside the 16-bit range.
    RangeError,
    /// Keyword recognized by the grammar but outside the supported subset.
    UnsupportedFeature,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::LexError => "LexError",
            DiagnosticKind::SyntaxError => "SyntaxError",
            DiagnosticKind::TypeError => "TypeError",
            DiagnosticKind::UnresolvedLabel => "UnresolvedLabel",
            DiagnosticKind::NestingError => "NestingError",
            DiagnosticKind::RangeError => "RangeError",
            DiagnosticKind::UnsupportedFeature => "UnsupportedFeature",
        };
        write!(f, "{}", name)
    }
}

/// A diagnostic anchored to a source position.
///
/// `line` and `column` are 1-based. A column of 0 means the position is a
/// whole line (used by checks that run after parsing, where only the line
/// is known).
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// What class of problem this is.
    pub kind: DiagnosticKind,
    /// 1-based source line.
    pub line: u32,
    /// 1-based source column (0 when only the line is known).
    pub column: u32,
    /// Human-readable description.
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic at an exact position.
    pub fn new(kind: DiagnosticKind, line: u32, column: u32, message: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            column,
            message: message.into(),
        }
    }

    /// Formats the diagnostic in the `<file>:<line>:<column>: <kind>: <message>` shape.
    pub fn render(&self, file: &str) -> String {
        format!(
            "{}:{}:{}: {}: {}",
            file, self.line, self.column, self.kind, self.message
        )
    }

    /// Formats a non-fatal variant of the same shape.
    pub fn render_warning(&self, file: &str) -> String {
        format!(
            "{}:{}:{}: warning: {}",
            file, self.line, self.column, self.message
        )
    }
}

/// Conversion into a [`Diagnostic`], implemented by each stage's error type.
pub trait ToDiagnostic {
    /// The diagnostic equivalent of this error.
    fn to_diagnostic(&self) -> Diagnostic;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_format() {
        let d = Diagnostic::new(DiagnosticKind::SyntaxError, 10, 5, "expected THEN, got ELSE");
        assert_eq!(
            d.render("prog.bas"),
            "prog.bas:10:5: SyntaxError: expected THEN, got ELSE"
        );
    }

    #[test]
    fn test_render_warning_format() {
        let d = Diagnostic::new(DiagnosticKind::TypeError, 3, 1, "real truncated to integer");
        assert_eq!(
            d.render_warning("prog.bas"),
            "prog.bas:3:1: warning: real truncated to integer"
        );
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(DiagnosticKind::UnresolvedLabel.to_string(), "UnresolvedLabel");
        assert_eq!(DiagnosticKind::RangeError.to_string(), "RangeError");
    }
}
