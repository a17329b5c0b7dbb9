//! Code generation for basc.
//!
//! This module turns the parsed program and its frozen symbol table into
//! Z80 assembly text. The architecture keeps a trait seam between the
//! driver and the backend so the emission strategy stays replaceable:
//!
//! ```text
//! Program + SymbolTable → CodeGenerator → GeneratedOutput (.asm, .lst, .map)
//!                              ↑
//!                         Z80Backend
//! ```
//!
//! The only implemented backend targets the Amstrad CPC: firmware-call
//! anchored statement lowering, a stack-machine expression scheme on the
//! hardware stack, and a runtime-library catalog injected on demand (see
//! [`z80`]).

mod error;
mod z80;

pub use error::CodeGenError;
pub use z80::Z80Backend;

use crate::ast::Program;
use crate::diagnostics::Diagnostic;
use crate::semantic::SymbolTable;
use crate::source::SourceFile;

/// Output from code generation.
#[derive(Debug)]
pub struct GeneratedOutput {
    /// The generated assembly text.
    pub asm: String,
    /// The listing side-channel, when requested.
    pub listing: Option<String>,
    /// The symbol-map side-channel, when requested.
    pub map: Option<String>,
    /// Non-fatal diagnostics gathered while emitting.
    pub warnings: Vec<Diagnostic>,
}

/// Trait for code generation backends.
///
/// A backend receives the AST and the frozen symbol table and produces
/// the complete output text. Backends may flag variables as referenced in
/// the symbol table (that is what drives live-reservation emission) but
/// otherwise only read it.
pub trait CodeGenerator {
    /// Generates output for a resolved program.
    fn generate(
        &self,
        source: &SourceFile,
        program: &Program,
        symbols: &mut SymbolTable,
    ) -> Result<GeneratedOutput, CodeGenError>;

    /// The name of this backend for diagnostics.
    fn backend_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_name() {
        let backend = Z80Backend::new();
        assert_eq!(backend.backend_name(), "z80");
    }
}
