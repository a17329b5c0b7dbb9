//! Lexical analysis for basc.
//!
//! This module converts Locomotive BASIC source code into a stream of
//! [`Token`]s. It handles:
//!
//! - Case-insensitive keyword recognition (BASIC tradition)
//! - Multiple integer formats (decimal, hex `&`/`&H`, binary `&X`)
//! - Real literals with optional exponent
//! - String literals (no escape syntax, per Locomotive BASIC)
//! - Comments (both `'` and `REM` styles) as single `Remark` tokens
//! - One `EndOfLine` token per source line and a final `EndOfFile`
//!
//! ## Design Notes
//!
//! The token patterns live in [`token::TokenKind`] as a `logos` lexer; this
//! module wraps it to stamp each token with its 1-based line/column (via
//! the [`SourceFile`] line map) and to decode literal values. Decoding is
//! where range checking happens: a decimal literal that does not fit a
//! 16-bit signed integer is rejected here, not downstream.

mod token;

pub use token::{Token, TokenKind, TokenValue};

use logos::Logos;
use thiserror::Error;

use crate::diagnostics::{Diagnostic, DiagnosticKind, ToDiagnostic};
use crate::source::SourceFile;

/// Error produced during lexical analysis. All variants are fatal.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LexError {
    /// A character no token pattern accepts.
    #[error("unexpected character '{ch}'")]
    UnexpectedCharacter {
        /// The offending character.
        ch: char,
        /// 1-based source line.
        line: u32,
        /// 1-based source column.
        column: u32,
    },

    /// A string literal still open at the end of its line.
    #[error("unterminated string literal")]
    UnterminatedString {
        /// 1-based source line.
        line: u32,
        /// 1-based source column of the opening quote.
        column: u32,
    },

    /// A numeric literal outside the 16-bit range.
    #[error("integer literal '{literal}' out of 16-bit range")]
    IntegerOutOfRange {
        /// Verbatim spelling of the literal.
        literal: String,
        /// 1-based source line.
        line: u32,
        /// 1-based source column.
        column: u32,
    },
}

impl ToDiagnostic for LexError {
    fn to_diagnostic(&self) -> Diagnostic {
        match self {
            LexError::UnexpectedCharacter { line, column, .. } => {
                Diagnostic::new(DiagnosticKind::LexError, *line, *column, self.to_string())
            }
            LexError::UnterminatedString { line, column } => {
                Diagnostic::new(DiagnosticKind::LexError, *line, *column, self.to_string())
            }
            LexError::IntegerOutOfRange { line, column, .. } => {
                Diagnostic::new(DiagnosticKind::RangeError, *line, *column, self.to_string())
            }
        }
    }
}

/// The lexer for basc source code.
///
/// Wraps a `logos` lexer over a [`SourceFile`] and yields position-stamped,
/// value-decoded [`Token`]s.
pub struct Lexer<'src> {
    inner: logos::Lexer<'src, TokenKind>,
    source: &'src SourceFile,
    finished: bool,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer over a normalized source file.
    pub fn new(source: &'src SourceFile) -> Self {
        Self {
            inner: TokenKind::lexer(&source.text),
            source,
            finished: false,
        }
    }

    /// Produces the next token, or `None` after `EndOfFile` was returned.
    pub fn next_token(&mut self) -> Option<Result<Token, LexError>> {
        if self.finished {
            return None;
        }

        let kind = match self.inner.next() {
            Some(Ok(kind)) => kind,
            Some(Err(())) => {
                self.finished = true;
                return Some(Err(self.error_at_current()));
            }
            None => {
                // Past the last newline: synthesize the file terminator.
                self.finished = true;
                let (line, column) = self.source.line_col(self.source.text.len());
                return Some(Ok(Token::new(
                    TokenKind::EndOfFile,
                    "",
                    TokenValue::None,
                    line,
                    column,
                )));
            }
        };

        let text = self.inner.slice();
        let (line, column) = self.source.line_col(self.inner.span().start);

        let value = match decode_value(kind, text) {
            Ok(value) => value,
            Err(()) => {
                self.finished = true;
                return Some(Err(LexError::IntegerOutOfRange {
                    literal: text.to_string(),
                    line,
                    column,
                }));
            }
        };

        Some(Ok(Token::new(kind, text, value, line, column)))
    }

    /// Classifies the slice logos could not match.
    fn error_at_current(&self) -> LexError {
        let span = self.inner.span();
        let (line, column) = self.source.line_col(span.start);
        let rest = &self.source.text[span.start..];
        if rest.starts_with('"') {
            LexError::UnterminatedString { line, column }
        } else {
            LexError::UnexpectedCharacter {
                ch: rest.chars().next().unwrap_or('\0'),
                line,
                column,
            }
        }
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Lexes a whole source file into a token vector ending in `EndOfFile`.
pub fn tokenize(source: &SourceFile) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).collect()
}

/// Decodes a literal's value. `Err(())` means out of 16-bit range.
fn decode_value(kind: TokenKind, text: &str) -> Result<TokenValue, ()> {
    match kind {
        TokenKind::IntegerLiteral => {
            let n: u32 = text.parse().map_err(|_| ())?;
            if n > i16::MAX as u32 {
                return Err(());
            }
            Ok(TokenValue::Integer(n as i16))
        }
        TokenKind::HexLiteral => {
            let digits = text[1..].strip_prefix(['H', 'h']).unwrap_or(&text[1..]);
            let n = u32::from_str_radix(digits, 16).map_err(|_| ())?;
            if n > u16::MAX as u32 {
                return Err(());
            }
            Ok(TokenValue::Integer(n as u16 as i16))
        }
        TokenKind::BinaryLiteral => {
            let n = u32::from_str_radix(&text[2..], 2).map_err(|_| ())?;
            if n > u16::MAX as u32 {
                return Err(());
            }
            Ok(TokenValue::Integer(n as u16 as i16))
        }
        TokenKind::RealLiteral => {
            let v: f64 = text.parse().map_err(|_| ())?;
            Ok(TokenValue::Real(v))
        }
        TokenKind::StringLiteral => Ok(TokenValue::Str(text[1..text.len() - 1].to_string())),
        _ => Ok(TokenValue::None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(text: &str) -> Vec<Token> {
        let src = SourceFile::from_text("test.bas", text);
        tokenize(&src).expect("lex error")
    }

    fn lex_err(text: &str) -> LexError {
        let src = SourceFile::from_text("test.bas", text);
        tokenize(&src).expect_err("expected lex error")
    }

    #[test]
    fn test_line_structure() {
        let tokens = lex("10 CLS\n20 END\n");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::IntegerLiteral,
                TokenKind::Cls,
                TokenKind::EndOfLine,
                TokenKind::IntegerLiteral,
                TokenKind::End,
                TokenKind::EndOfLine,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_positions_are_one_based() {
        let tokens = lex("10 PRINT X\n");
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (1, 4));
        assert_eq!((tokens[2].line, tokens[2].column), (1, 10));
    }

    #[test]
    fn test_integer_decoding() {
        let tokens = lex("10 POKE 32767,255\n");
        assert_eq!(tokens[2].int_value(), Some(32767));
        assert_eq!(tokens[4].int_value(), Some(255));
    }

    #[test]
    fn test_integer_range_limit() {
        // 32767 fits, 32768 does not.
        assert_eq!(lex("10 A%=32767\n")[3].int_value(), Some(32767));
        match lex_err("10 A%=32768\n") {
            LexError::IntegerOutOfRange { literal, line, .. } => {
                assert_eq!(literal, "32768");
                assert_eq!(line, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_hex_wraps_to_signed() {
        // &FFFF is the 16-bit pattern 0xFFFF, i.e. -1 signed.
        let tokens = lex("10 A%=&FFFF\n");
        assert_eq!(tokens[3].int_value(), Some(-1));
        let tokens = lex("10 A%=&H7F\n");
        assert_eq!(tokens[3].int_value(), Some(127));
    }

    #[test]
    fn test_binary_literal() {
        let tokens = lex("10 A%=&X1010\n");
        assert_eq!(tokens[3].int_value(), Some(10));
    }

    #[test]
    fn test_real_decoding() {
        let tokens = lex("10 B!=1.5\n");
        assert_eq!(tokens[3].value, TokenValue::Real(1.5));
    }

    #[test]
    fn test_string_value_strips_quotes() {
        let tokens = lex("10 PRINT \"HELLO\"\n");
        assert_eq!(tokens[2].value, TokenValue::Str("HELLO".to_string()));
        assert_eq!(tokens[2].text, "\"HELLO\"");
    }

    #[test]
    fn test_unterminated_string_is_fatal() {
        match lex_err("10 PRINT \"HELLO\n") {
            LexError::UnterminatedString { line, column } => {
                assert_eq!((line, column), (1, 10));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_remark_consumes_line() {
        let tokens = lex("10 REM set things up\n");
        assert_eq!(tokens[1].kind, TokenKind::Remark);
        assert_eq!(tokens[1].text, "REM set things up");
        assert_eq!(tokens[2].kind, TokenKind::EndOfLine);
    }

    #[test]
    fn test_spellings_kept_verbatim() {
        let tokens = lex("10 print Score%\n");
        assert_eq!(tokens[1].text, "print");
        assert_eq!(tokens[2].text, "Score%");
    }

    /// Serializing tokens back to text (single space between spellings) and
    /// re-lexing is idempotent.
    #[test]
    fn test_round_trip_idempotent() {
        let text = "10 FOR X=32 TO 255 STEP 2\n20 PRINT X;\" \";CHR$(X)\n30 NEXT\n";
        let first = lex(text);

        let mut rebuilt = String::new();
        for tok in &first {
            match tok.kind {
                TokenKind::EndOfLine => rebuilt.push('\n'),
                TokenKind::EndOfFile => {}
                _ => {
                    if !rebuilt.is_empty() && !rebuilt.ends_with('\n') {
                        rebuilt.push(' ');
                    }
                    rebuilt.push_str(&tok.text);
                }
            }
        }

        let second = lex(&rebuilt);
        let strip = |tokens: &[Token]| -> Vec<(TokenKind, String)> {
            tokens.iter().map(|t| (t.kind, t.text.clone())).collect()
        };
        assert_eq!(strip(&first), strip(&second));
    }
}
