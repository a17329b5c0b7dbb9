//! Symbol table, value types, and post-parse resolution.
//!
//! BASIC makes forward references routine: `GOTO` can target a later
//! line, and nothing declares variables ahead of use. The compiler deals
//! with both through this module:
//!
//! - the parser populates the [`SymbolTable`] as it walks the program —
//!   variables get their type fixed at first reference, line numbers and
//!   `LABEL` aliases accumulate into the line-target namespace;
//! - [`SymbolTable::resolve`] then verifies every recorded branch target
//!   exists and freezes the table;
//! - the code generator reads the frozen table and performs bottom-up
//!   expression type inference with the [`ValueType`] rules.
//!
//! Splitting it this way keeps the AST flat (no pairing or resolution
//! during parse) and gives code generation a complete label space before
//! it emits the first instruction.

mod error;
mod symbols;
mod types;

pub use error::SemanticError;
pub use symbols::{Symbol, SymbolTable};
pub use types::{TypeSuffix, ValueType};
