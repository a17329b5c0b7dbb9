//! # basc
//!
//! An ahead-of-time compiler for a dialect of Locomotive BASIC, targeting
//! the Amstrad CPC. The output is Z80 assembly text (Maxam/WinAPE style)
//! that a downstream assembler turns into a loadable binary; the generated
//! code leans on the CPC firmware jump block for screen, keyboard, and
//! floating-point work.
//!
//! ## Architecture
//!
//! The compiler is a classic forward pipeline:
//!
//! ```text
//! Source (.bas) → Lexer → Parser → Symbol Table → Z80 CodeGen → .asm (+ .lst, .map)
//! ```
//!
//! Each phase is a separate module:
//!
//! - [`source`] - Reads and normalizes the input file, tracks line/column positions
//! - [`lexer`] - Tokenizes source code into a stream of tokens
//! - [`parser`] - Builds the line/statement AST and populates the symbol table
//! - [`ast`] - AST type definitions
//! - [`semantic`] - Symbol table, value types, line-target resolution
//! - [`codegen`] - The Z80 backend and the runtime-library catalog
//! - [`diagnostics`] - Source-anchored errors and warnings
//!
//! Data flows strictly forward; nothing after code generation touches the
//! AST, and the symbol table is frozen before the backend runs.
//!
//! ## Example
//!
//! ```
//! use basc::source::SourceFile;
//! use basc::lexer::tokenize;
//! use basc::parser::Parser;
//!
//! let src = SourceFile::from_text("test.bas", "10 PRINT \"HELLO\"\n20 GOTO 20\n");
//! let tokens = tokenize(&src).expect("lex error");
//! let (program, symbols) = Parser::new(&tokens).parse().expect("parse error");
//!
//! assert_eq!(program.lines.len(), 2);
//! assert!(symbols.has_line(20));
//! ```

pub mod ast;
pub mod codegen;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod semantic;
pub mod source;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::ast::{Expr, ExprKind, Line, Pos, Program, Statement, StatementKind};
    pub use crate::codegen::{CodeGenerator, GeneratedOutput, Z80Backend};
    pub use crate::diagnostics::{Diagnostic, DiagnosticKind};
    pub use crate::lexer::{Lexer, Token, TokenKind};
    pub use crate::parser::{ParseError, Parser};
    pub use crate::semantic::{SymbolTable, ValueType};
    pub use crate::source::SourceFile;
}
