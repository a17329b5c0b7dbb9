//! Z80 code generation backend for the Amstrad CPC.
//!
//! The backend walks the AST once, line by line, and emits three text
//! sections in a fixed order:
//!
//! ```text
//! org &4000
//! ; CODE AREA      every source line gets a __label_line_<n> label
//! ; LIBRARY AREA   referenced runtime routines, dependency order
//! ; DATA AREA      live variables, temporaries, literals, DATA pool
//! ```
//!
//! # Module Structure
//!
//! - [`expr`] - expression type inference and evaluation
//! - [`stmt`] - statement lowering
//! - [`runtime`] - the runtime-library catalog
//! - [`firmware`] - CPC firmware jump-block addresses
//! - [`real`] - the 5-byte Amstrad real encoding
//!
//! # Evaluation model
//!
//! A single-accumulator scheme on the hardware stack: integers live in
//! `HL`; reals and strings are passed as addresses in `HL`. Binary
//! operators push the left value, evaluate the right, `pop de`, and
//! apply. String and real intermediates materialize into `var_tmpN`
//! scratch reservations in the data area.
//!
//! Loop pairing happens here, not in the parser: `FOR`/`WHILE` push a
//! context onto [`Emitter::loop_stack`], `NEXT`/`WEND` pop and verify it.

mod expr;
mod firmware;
mod real;
mod runtime;
mod stmt;

use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as _;

use crate::ast::{LineTarget, Pos, Program, StatementKind};
use crate::codegen::error::CodeGenError;
use crate::codegen::{CodeGenerator, GeneratedOutput};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::semantic::{SymbolTable, ValueType};
use crate::source::SourceFile;

use self::firmware::FirmwareCall;

/// The Z80/Amstrad CPC backend.
#[derive(Debug, Clone)]
pub struct Z80Backend {
    org: u16,
    listing: bool,
    map: bool,
}

impl Default for Z80Backend {
    fn default() -> Self {
        Self::new()
    }
}

impl Z80Backend {
    /// Creates a backend with the default load address `&4000`.
    pub fn new() -> Self {
        Self {
            org: 0x4000,
            listing: false,
            map: false,
        }
    }

    /// Sets the `org` load address.
    pub fn with_org(mut self, org: u16) -> Self {
        self.org = org;
        self
    }

    /// Also produce the `.lst` listing text.
    pub fn with_listing(mut self, listing: bool) -> Self {
        self.listing = listing;
        self
    }

    /// Also produce the `.map` symbol map text.
    pub fn with_map(mut self, map: bool) -> Self {
        self.map = map;
        self
    }
}

impl CodeGenerator for Z80Backend {
    fn generate(
        &self,
        source: &SourceFile,
        program: &Program,
        symbols: &mut SymbolTable,
    ) -> Result<GeneratedOutput, CodeGenError> {
        // DATA-carrying lines, known up front so RESTORE can resolve
        // forward.
        let data_lines: Vec<u16> = program
            .lines
            .iter()
            .filter(|l| {
                l.statements
                    .iter()
                    .any(|s| matches!(s.kind, StatementKind::Data { .. }))
            })
            .map(|l| l.number)
            .collect();

        let mut emitter = Emitter::new(symbols, data_lines);

        for line in &program.lines {
            emitter.code.push(String::new());
            emitter
                .code
                .push(format!("; {}", source.line_text(line.pos.line).trim()));
            emitter.emit_label(&SymbolTable::line_label(line.number));
            for stmt in &line.statements {
                emitter.emit_statement(stmt, line.number)?;
            }
        }

        // Every loop must have closed by the end of the program.
        if let Some(ctx) = emitter.loop_stack.last() {
            return Err(match ctx {
                LoopContext::For { pos, var, .. } => CodeGenError::nesting(
                    format!("FOR {} without a matching NEXT", var),
                    *pos,
                ),
                LoopContext::While { pos, .. } => {
                    CodeGenError::nesting("WHILE without a matching WEND", *pos)
                }
            });
        }

        emitter.code.push(String::new());
        emitter.op("jp", "0 ; end of program");

        let asm = emitter.render(self.org);
        let listing = self.listing.then(|| render_listing(source, program));
        let map = self.map.then(|| render_map(emitter.symbols, &emitter.lib_order));
        let warnings = std::mem::take(&mut emitter.warnings);

        Ok(GeneratedOutput {
            asm,
            listing,
            map,
            warnings,
        })
    }

    fn backend_name(&self) -> &str {
        "z80"
    }
}

/// One open loop, kept on the emitter's stack between head and tail.
#[derive(Debug)]
pub(super) enum LoopContext {
    /// An open FOR, waiting for its NEXT.
    For {
        /// Canonical index variable name.
        var: String,
        /// Head label the NEXT jumps back to.
        head: String,
        /// Exit label emitted after the NEXT.
        exit: String,
        /// Where the step value lives.
        step: StepSlot,
        /// Index variable type (integer or real).
        var_ty: ValueType,
        /// Position of the FOR, for unclosed-loop errors.
        pos: Pos,
    },
    /// An open WHILE, waiting for its WEND.
    While {
        /// Head label the WEND jumps back to.
        head: String,
        /// Exit label emitted after the WEND.
        exit: String,
        /// Position of the WHILE.
        pos: Pos,
    },
}

/// Where a FOR step value lives and what is known about it.
#[derive(Debug, Clone)]
pub(super) enum StepSlot {
    /// Integer constant known at compile time.
    ConstInt(i16),
    /// Integer step in a temporary; sign tested at run time.
    IntTemp(String),
    /// Real constant in a literal; sign known at compile time.
    ConstReal {
        /// Data-area label of the encoded constant.
        label: String,
        /// Whether the constant is negative.
        negative: bool,
    },
    /// Real step in a temporary; sign tested at run time.
    RealTemp(String),
}

/// Emission state threaded through statement and expression lowering.
pub(super) struct Emitter<'a> {
    /// The frozen symbol table (referenced flags are still written).
    pub symbols: &'a mut SymbolTable,
    /// CODE AREA lines.
    pub code: Vec<String>,
    /// DATA AREA lines for temporaries and literals, allocation order.
    pub data: Vec<String>,
    /// Names of requested runtime-library entries.
    pub libs: BTreeSet<&'static str>,
    /// Non-fatal diagnostics.
    pub warnings: Vec<Diagnostic>,
    /// Open loops.
    pub loop_stack: Vec<LoopContext>,
    /// Lines that carry DATA, ascending.
    data_lines: Vec<u16>,
    /// The DATA pool body, in source order.
    data_pool: Vec<String>,
    /// The last line a pool label was emitted for.
    last_data_line: Option<u16>,
    /// Whether READ/RESTORE/DATA machinery is needed.
    uses_data: bool,
    label_counter: u32,
    tmp_counter: u32,
    /// Counter for SYMBOL matrix and table labels.
    pub(super) symbol_count: u32,
    string_labels: HashMap<String, String>,
    string_order: Vec<(String, String)>,
    real_labels: HashMap<u64, String>,
    real_order: Vec<(String, [u8; 5], f64)>,
    /// Library emission order, filled by `render` for the map.
    lib_order: Vec<&'static str>,
}

impl<'a> Emitter<'a> {
    fn new(symbols: &'a mut SymbolTable, data_lines: Vec<u16>) -> Self {
        Self {
            symbols,
            code: Vec::new(),
            data: Vec::new(),
            libs: BTreeSet::new(),
            warnings: Vec::new(),
            loop_stack: Vec::new(),
            data_lines,
            data_pool: Vec::new(),
            last_data_line: None,
            uses_data: false,
            label_counter: 0,
            tmp_counter: 0,
            symbol_count: 0,
            string_labels: HashMap::new(),
            string_order: Vec::new(),
            real_labels: HashMap::new(),
            real_order: Vec::new(),
            lib_order: Vec::new(),
        }
    }

    // ==================== Emission primitives ====================

    /// Emits one instruction line, tab-indented, mnemonic padded.
    pub(super) fn op(&mut self, mnemonic: &str, operands: &str) {
        if operands.is_empty() {
            self.code.push(format!("\t{}", mnemonic));
        } else {
            self.code.push(format!("\t{:<8}{}", mnemonic, operands));
        }
    }

    /// Emits a call or jump to a firmware entry, with its name comment.
    pub(super) fn fw(&mut self, mnemonic: &str, entry: FirmwareCall) {
        self.op(mnemonic, &format!("{} ;{}", entry.address, entry.name));
    }

    /// Emits a label line in the code area.
    pub(super) fn emit_label(&mut self, label: &str) {
        self.code.push(format!("{}:", label));
    }

    /// A fresh local label.
    pub(super) fn new_label(&mut self, stem: &str) -> String {
        let label = format!("__{}_{}", stem, self.label_counter);
        self.label_counter += 1;
        label
    }

    /// Requests a runtime-library entry.
    pub(super) fn need(&mut self, name: &'static str) {
        self.libs.insert(name);
    }

    /// Reserves a scratch slot in the data area and returns its label.
    pub(super) fn alloc_tmp(&mut self, directive: &str) -> String {
        let label = format!("var_tmp{}", self.tmp_counter);
        self.tmp_counter += 1;
        self.data.push(format!("{}:\t{}", label, directive));
        label
    }

    /// The data-area label of a string literal, deduplicated by content.
    pub(super) fn string_literal(&mut self, text: &str) -> String {
        if let Some(label) = self.string_labels.get(text) {
            return label.clone();
        }
        let label = format!("txt_{}", self.string_order.len());
        self.string_labels.insert(text.to_string(), label.clone());
        self.string_order.push((label.clone(), text.to_string()));
        label
    }

    /// The data-area label of an encoded real literal.
    pub(super) fn real_literal(&mut self, value: f64, pos: Pos) -> Result<String, CodeGenError> {
        if let Some(label) = self.real_labels.get(&value.to_bits()) {
            return Ok(label.clone());
        }
        let bytes = real::encode(value).ok_or_else(|| CodeGenError::Range {
            message: format!("real constant {} out of range", value),
            pos,
        })?;
        let label = format!("rconst_{}", self.real_order.len());
        self.real_labels.insert(value.to_bits(), label.clone());
        self.real_order.push((label.clone(), bytes, value));
        Ok(label)
    }

    /// Records a warning.
    pub(super) fn warn(&mut self, kind: DiagnosticKind, pos: Pos, message: impl Into<String>) {
        self.warnings
            .push(Diagnostic::new(kind, pos.line, pos.column, message));
    }

    // ==================== DATA pool ====================

    /// Appends one line's DATA constants to the pool. A line gets one
    /// pool label even when it carries several DATA statements.
    pub(super) fn pool_data_line(&mut self, number: u16, rendered: Vec<String>) {
        self.uses_data = true;
        if self.last_data_line != Some(number) {
            self.data_pool.push(format!("__data_line_{}:", number));
            self.last_data_line = Some(number);
        }
        self.data_pool.extend(rendered);
    }

    /// Marks READ/RESTORE machinery as used.
    pub(super) fn touch_data_machinery(&mut self) {
        self.uses_data = true;
    }

    /// The DATA-pool label RESTORE should reset to: the first DATA line
    /// at or after the target.
    pub(super) fn restore_label(
        &self,
        target: Option<&LineTarget>,
        pos: Pos,
    ) -> Result<String, CodeGenError> {
        let Some(target) = target else {
            return Ok("__data_pool".to_string());
        };
        let number = self
            .symbols
            .target_line_number(target)
            .ok_or_else(|| CodeGenError::Unresolved {
                message: format!("no such line: {}", target),
                pos,
            })?;
        self.data_lines
            .iter()
            .find(|&&d| d >= number)
            .map(|d| format!("__data_line_{}", d))
            .ok_or_else(|| CodeGenError::Unresolved {
                message: format!("no DATA at or after line {}", number),
                pos,
            })
    }

    // ==================== Final assembly ====================

    /// Joins the three sections into the final assembly text.
    fn render(&mut self, org: u16) -> String {
        let mut out = String::new();
        writeln!(out, "org &{:04X}", org).unwrap();
        writeln!(out).unwrap();
        writeln!(out, "; CODE AREA").unwrap();
        for line in &self.code {
            writeln!(out, "{}", line).unwrap();
        }

        writeln!(out).unwrap();
        writeln!(out, "; LIBRARY AREA").unwrap();
        let entries = runtime::closure_in_order(&self.libs);
        self.lib_order = entries.iter().map(|e| e.name).collect();
        for entry in &entries {
            if entry.body.is_empty() {
                continue;
            }
            writeln!(out).unwrap();
            for line in entry.body {
                writeln!(out, "{}", line).unwrap();
            }
        }

        writeln!(out).unwrap();
        writeln!(out, "; DATA AREA").unwrap();
        writeln!(out).unwrap();

        // Live variables, first-reference order.
        for sym in self.symbols.variables() {
            let label = sym.storage_label();
            if let Some(bound) = sym.array_bound {
                let elems = bound as u32 + 1;
                let size = elems * sym.ty.reservation_bytes() as u32;
                writeln!(out, "{}:\tdefs {} ; {}({})", label, size, sym.name, bound).unwrap();
            } else if sym.referenced {
                match sym.ty {
                    ValueType::Integer => writeln!(out, "{}:\tdw 0", label).unwrap(),
                    ValueType::Real => writeln!(out, "{}:\tdefs 5", label).unwrap(),
                    ValueType::String => writeln!(out, "{}:\tdefs 256", label).unwrap(),
                }
            }
        }

        // Temporaries, allocation order.
        for line in &self.data {
            writeln!(out, "{}", line).unwrap();
        }

        // String and real literals, first-use order.
        for (label, text) in &self.string_order {
            if text.is_empty() {
                writeln!(out, "{}:\tdb &00", label).unwrap();
            } else {
                writeln!(out, "{}:\tdb \"{}\",&00", label, text).unwrap();
            }
        }
        for (label, bytes, value) in &self.real_order {
            writeln!(out, "{}:\tdb {} ; {}", label, real::db_operands(*bytes), value).unwrap();
        }

        // Library reservations, library emission order.
        for entry in &entries {
            for line in entry.data {
                writeln!(out, "{}", line).unwrap();
            }
        }

        // The DATA pool, source order, NUL sentinel last.
        if self.uses_data {
            writeln!(out, "__datalib_ptr:\tdw __data_pool").unwrap();
            writeln!(out, "__data_pool:").unwrap();
            for line in &self.data_pool {
                writeln!(out, "{}", line).unwrap();
            }
            writeln!(out, "__data_end:\tdb &00").unwrap();
        }

        out
    }
}

/// The `.lst` text: line number, entry label, source text.
fn render_listing(source: &SourceFile, program: &Program) -> String {
    let mut out = String::new();
    writeln!(out, "; basc listing for {}", source.name).unwrap();
    for line in &program.lines {
        writeln!(
            out,
            "{:>5}  {:<22} {}",
            line.number,
            SymbolTable::line_label(line.number),
            source.line_text(line.pos.line).trim()
        )
        .unwrap();
    }
    out
}

/// The `.map` text: variables, line labels, aliases, library routines.
fn render_map(symbols: &SymbolTable, lib_order: &[&str]) -> String {
    let mut out = String::new();
    writeln!(out, "; basc symbol map").unwrap();

    writeln!(out, "; variables").unwrap();
    for sym in symbols.variables() {
        if !sym.referenced && sym.array_bound.is_none() {
            continue;
        }
        let size = match sym.array_bound {
            Some(bound) => (bound as u32 + 1) * sym.ty.reservation_bytes() as u32,
            None => sym.ty.reservation_bytes() as u32,
        };
        writeln!(out, "{:<20} {:<8} {} bytes", sym.storage_label(), sym.ty, size).unwrap();
    }

    writeln!(out, "; lines").unwrap();
    for number in symbols.line_numbers() {
        writeln!(out, "{:<8} {}", number, SymbolTable::line_label(number)).unwrap();
    }

    let aliases = symbols.aliases();
    if !aliases.is_empty() {
        writeln!(out, "; labels").unwrap();
        for (name, number) in aliases {
            writeln!(out, "{:<20} line {}", name, number).unwrap();
        }
    }

    if !lib_order.is_empty() {
        writeln!(out, "; library").unwrap();
        for name in lib_order {
            writeln!(out, "{}", name).unwrap();
        }
    }
    out
}

/// A signed 16-bit value as an assembly operand: decimal when
/// non-negative, `&` hex for the negative bit patterns.
pub(super) fn int_operand(n: i16) -> String {
    if n >= 0 {
        n.to_string()
    } else {
        format!("&{:04X}", n as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::Parser;

    fn compile(text: &str) -> GeneratedOutput {
        compile_with(Z80Backend::new(), text)
    }

    fn compile_with(backend: Z80Backend, text: &str) -> GeneratedOutput {
        let src = SourceFile::from_text("test.bas", text);
        let tokens = tokenize(&src).expect("lex error");
        let (program, mut symbols) = Parser::new(&tokens).parse().expect("parse error");
        symbols.resolve().expect("resolve error");
        backend
            .generate(&src, &program, &mut symbols)
            .expect("codegen error")
    }

    fn compile_err(text: &str) -> CodeGenError {
        let src = SourceFile::from_text("test.bas", text);
        let tokens = tokenize(&src).expect("lex error");
        let (program, mut symbols) = Parser::new(&tokens).parse().expect("parse error");
        symbols.resolve().expect("resolve error");
        Z80Backend::new()
            .generate(&src, &program, &mut symbols)
            .expect_err("expected codegen error")
    }

    #[test]
    fn test_hello_world() {
        let out = compile("10 PRINT \"HELLO\"\n20 GOTO 20\n");
        assert!(out.asm.contains("org &4000"));
        assert!(out.asm.contains("db \"HELLO\",&00"));
        assert!(out.asm.contains("call    strlib_print_str"));
        assert!(out.asm.contains("jp      __label_line_20"));
        assert!(out.asm.contains("__label_line_10:"));
    }

    #[test]
    fn test_configurable_org() {
        let out = compile_with(Z80Backend::new().with_org(0x8000), "10 CLS\n");
        assert!(out.asm.contains("org &8000"));
    }

    #[test]
    fn test_deterministic_output() {
        let text = "10 MODE 2\n20 FOR X=32 TO 255\n30 PRINT X;\" \";CHR$(X);\" \";\n40 NEXT\n50 GOTO 50\n";
        let first = compile(text);
        let second = compile(text);
        assert_eq!(first.asm, second.asm);
    }

    #[test]
    fn test_for_loop_scenario() {
        let out = compile(
            "10 MODE 2\n20 FOR X=32 TO 255\n30 PRINT X;\" \";CHR$(X);\" \";\n40 NEXT\n50 GOTO 50\n",
        );
        // MODE firmware call, variable slot, int2str in the library, a
        // small CHR$ temporary, and the loop labels.
        assert!(out.asm.contains(";SCR_SET_MODE"));
        assert!(out.asm.contains("var_X:"));
        assert!(out.asm.contains("strlib_int2str:"));
        assert!(out.asm.contains("var_tmp"));
        assert!(out.asm.contains("defs 2"));
        assert!(out.asm.contains("__for_head_"));
        assert!(out.asm.contains("__for_exit_"));
    }

    #[test]
    fn test_type_promotion_scenario() {
        let out = compile("10 A%=5\n20 B!=A%+1.5\n30 PRINT B!\n");
        // A% is a 2-byte slot, B! a 5-byte one, and the integer operand
        // goes through the int-to-real conversion.
        assert!(out.asm.contains("var_A:\tdw 0"));
        assert!(out.asm.contains("var_B:\tdefs 5"));
        assert!(out.asm.contains("call    reallib_int2real"));
        assert!(out.asm.contains("reallib_real2str:"));
    }

    #[test]
    fn test_nesting_mismatch_scenario() {
        let err = compile_err("10 FOR I=1 TO 3\n20 FOR J=1 TO 3\n30 NEXT I\n");
        match err {
            CodeGenError::Nesting { pos, message } => {
                assert_eq!(pos.line, 3);
                assert!(message.contains('J'));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_next_without_for() {
        let err = compile_err("10 NEXT\n");
        assert!(matches!(err, CodeGenError::Nesting { .. }));
    }

    #[test]
    fn test_unclosed_for_is_fatal() {
        let err = compile_err("10 FOR I=1 TO 3\n20 PRINT I\n");
        match err {
            CodeGenError::Nesting { pos, .. } => assert_eq!(pos.line, 1),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_symbol_scenario() {
        let out = compile(
            "10 SYMBOL AFTER 240\n20 SYMBOL 240,&00,&00,&74,&7E,&6C,&70,&7C,&30\n30 GOTO 30\n",
        );
        assert!(out.asm.contains(";TXT_SET_M_TABLE"));
        assert!(out.asm.contains(";TXT_SET_MATRIX"));
        assert!(out.asm.contains("db &00,&00,&74,&7E,&6C,&70,&7C,&30"));
        // 16 characters redefinable: 16*8 bytes of matrix table.
        assert!(out.asm.contains("defs 128"));
    }

    #[test]
    fn test_if_constant_branches() {
        let out = compile("10 IF 0 THEN 100 ELSE 200\n100 CLS\n200 CLS\n");
        assert!(out.asm.contains("jp      __label_line_100"));
        assert!(out.asm.contains("jp      __label_line_200"));
        let out = compile("10 IF -1 THEN 100\n100 CLS\n");
        assert!(out.asm.contains("jp      __label_line_100"));
    }

    #[test]
    fn test_empty_print_emits_newline() {
        let out = compile("10 PRINT\n");
        assert!(out.asm.contains("call    strlib_print_nl"));
    }

    #[test]
    fn test_library_minimality() {
        // A program with no prints pulls no print routines.
        let out = compile("10 A%=1+2\n20 END\n");
        assert!(!out.asm.contains("strlib_print_str:"));
        assert!(!out.asm.contains("mul16_unsigned:"));

        // Multiplication pulls the whole signed-multiply chain.
        let out = compile("10 A%=2*3\n20 END\n");
        assert!(out.asm.contains("mul16_signed:"));
        assert!(out.asm.contains("mul16_unsigned:"));
        assert!(out.asm.contains("sign_extract:"));
    }

    #[test]
    fn test_every_jump_target_is_defined() {
        let out = compile(
            "10 GOSUB 100\n20 FOR I=1 TO 3\n30 PRINT I\n40 NEXT\n50 GOTO 50\n100 RETURN\n",
        );
        let mut labels = BTreeSet::new();
        for line in out.asm.lines() {
            let line = line.trim_end();
            if !line.starts_with(['\t', ';']) {
                if let Some(name) = line.strip_suffix(':') {
                    labels.insert(name.to_string());
                }
            }
            // Inline labels like "txt_0:\tdb ..." and "var_X:\tdw 0".
            if let Some((head, _)) = line.split_once(":\t") {
                if !head.starts_with(['\t', ';']) {
                    labels.insert(head.to_string());
                }
            }
        }
        for line in out.asm.lines() {
            let trimmed = line.trim_start();
            for mnemonic in ["jp      ", "call    ", "jr      "] {
                if let Some(rest) = trimmed.strip_prefix(mnemonic) {
                    let target = rest
                        .split(';')
                        .next()
                        .unwrap()
                        .split(',')
                        .last()
                        .unwrap()
                        .trim();
                    if target.starts_with('&')
                        || target.starts_with('(')
                        || target.starts_with('$')
                        || target.chars().all(|c| c.is_ascii_digit())
                    {
                        continue;
                    }
                    assert!(labels.contains(target), "undefined jump target '{target}'");
                }
            }
        }
    }

    #[test]
    fn test_while_wend() {
        let out = compile("10 X%=0\n20 WHILE X%<10\n30 X%=X%+1\n40 WEND\n50 END\n");
        assert!(out.asm.contains("__while_head_"));
        assert!(out.asm.contains("__while_exit_"));
        assert!(out.asm.contains("call    comp16_signed"));
    }

    #[test]
    fn test_data_read_restore_pool() {
        let out = compile("10 DATA 1,2,\"THREE\"\n20 READ A%,B%,C$\n30 RESTORE 10\n40 END\n");
        assert!(out.asm.contains("__data_line_10:"));
        assert!(out.asm.contains("db \"THREE\",&00"));
        assert!(out.asm.contains("__datalib_ptr:"));
        assert!(out.asm.contains("ld      hl,__data_line_10"));
        assert!(out.asm.contains("call    strlib_str2int"));
    }

    #[test]
    fn test_restore_without_data_fails() {
        // Line 15 exists but no DATA lives at or after it.
        let err = compile_err("10 READ A%\n15 CLS\n20 RESTORE 15\n");
        assert!(matches!(err, CodeGenError::Unresolved { .. }));
    }

    #[test]
    fn test_locate_real_truncation_warns() {
        let out = compile("10 LOCATE 1.5,2\n");
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].message.contains("LOCATE"));
    }

    #[test]
    fn test_string_in_arithmetic_is_type_error() {
        let err = compile_err("10 A%=\"X\"+1\n");
        assert!(matches!(err, CodeGenError::Type { .. }));
    }

    #[test]
    fn test_listing_and_map() {
        let out = compile_with(
            Z80Backend::new().with_listing(true).with_map(true),
            "10 A%=1\n20 PRINT A%\n",
        );
        let listing = out.listing.expect("listing requested");
        assert!(listing.contains("__label_line_10"));
        assert!(listing.contains("10 A%=1"));
        let map = out.map.expect("map requested");
        assert!(map.contains("var_A"));
        assert!(map.contains("strlib_int2str"));
    }

    #[test]
    fn test_gosub_return() {
        let out = compile("10 GOSUB 100\n20 END\n100 RETURN\n");
        assert!(out.asm.contains("call    __label_line_100"));
        assert!(out.asm.contains("\tret"));
    }

    #[test]
    fn test_int_operand_formats() {
        assert_eq!(int_operand(42), "42");
        assert_eq!(int_operand(-1), "&FFFF");
        assert_eq!(int_operand(-32768), "&8000");
    }
}
