//! Symbol table for basc.
//!
//! Two disjoint namespaces live here:
//!
//! - **Variables**: canonical (uppercase) name → fixed type, array bound,
//!   and a referenced flag the code generator sets so the data area only
//!   reserves storage for variables that actually appear in emitted code.
//! - **Line targets**: the set of defined line numbers, plus textual
//!   `LABEL` aliases pointing into it.
//!
//! The table is populated incrementally during parsing; the first
//! reference to an identifier fixes its type from its suffix (real when
//! unsuffixed). A later reference with a *different explicit* suffix is a
//! type conflict; an unsuffixed later reference adopts the fixed type.
//!
//! After parsing, [`SymbolTable::resolve`] checks every recorded branch
//! target against the defined lines and freezes the table; code
//! generation only reads it (apart from the referenced flags).

use std::collections::{BTreeSet, HashMap};

use crate::ast::{LineTarget, Pos, VarRef};
use crate::semantic::error::SemanticError;
use crate::semantic::types::{TypeSuffix, ValueType};

/// A variable entry.
#[derive(Debug, Clone)]
pub struct Symbol {
    /// Canonical uppercase name, without suffix.
    pub name: String,
    /// The type fixed by the first reference.
    pub ty: ValueType,
    /// Highest valid index if DIM'd (elements 0..=bound).
    pub array_bound: Option<i16>,
    /// Whether any reference used element syntax.
    pub used_as_array: bool,
    /// Set by the code generator when a load or store is emitted.
    pub referenced: bool,
    /// Position of the first reference.
    pub pos: Pos,
}

impl Symbol {
    /// The label of this variable's data-area reservation.
    pub fn storage_label(&self) -> String {
        format!("var_{}", self.name)
    }
}

/// The compiler's symbol table.
#[derive(Debug, Default)]
pub struct SymbolTable {
    vars: HashMap<String, Symbol>,
    /// First-reference order, for deterministic data-area emission.
    var_order: Vec<String>,
    /// Every defined line number.
    lines: BTreeSet<u16>,
    /// LABEL aliases, name → line number.
    aliases: HashMap<String, u16>,
    /// Branch targets recorded during parse, checked by [`resolve`].
    ///
    /// [`resolve`]: SymbolTable::resolve
    used_targets: Vec<(LineTarget, Pos)>,
    frozen: bool,
}

impl SymbolTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Variables ====================

    /// Records a reference to a variable, fixing its type on first sight
    /// and checking suffix consistency afterwards. Returns the variable's
    /// type.
    pub fn touch_variable(
        &mut self,
        var: &VarRef,
        as_array: bool,
    ) -> Result<ValueType, SemanticError> {
        debug_assert!(!self.frozen, "symbol table mutated after freeze");

        if let Some(sym) = self.vars.get_mut(&var.base) {
            if let Some(suffix) = var.suffix {
                let used = ValueType::from_suffix(Some(suffix));
                if used != sym.ty {
                    return Err(SemanticError::TypeConflict {
                        name: var.base.clone(),
                        declared: sym.ty,
                        used,
                        line: var.pos.line,
                        column: var.pos.column,
                    });
                }
            }
            sym.used_as_array |= as_array;
            return Ok(sym.ty);
        }

        let ty = ValueType::from_suffix(var.suffix);
        self.vars.insert(
            var.base.clone(),
            Symbol {
                name: var.base.clone(),
                ty,
                array_bound: None,
                used_as_array: as_array,
                referenced: false,
                pos: var.pos,
            },
        );
        self.var_order.push(var.base.clone());
        Ok(ty)
    }

    /// Registers a DIM'd array. The last DIM wins if a program repeats one.
    pub fn declare_array(&mut self, var: &VarRef, bound: i16) -> Result<(), SemanticError> {
        self.touch_variable(var, true)?;
        let sym = self.vars.get_mut(&var.base).expect("just touched");
        sym.array_bound = Some(bound);
        Ok(())
    }

    /// Looks up a variable by canonical name.
    pub fn variable(&self, base: &str) -> Option<&Symbol> {
        self.vars.get(base)
    }

    /// Flags a variable as reachable from emitted code.
    pub fn mark_referenced(&mut self, base: &str) {
        if let Some(sym) = self.vars.get_mut(base) {
            sym.referenced = true;
        }
    }

    /// All variables in first-reference order.
    pub fn variables(&self) -> impl Iterator<Item = &Symbol> {
        self.var_order.iter().map(|name| &self.vars[name])
    }

    // ==================== Line targets ====================

    /// Registers a defined line number. Ordering is the parser's concern.
    pub fn add_line(&mut self, number: u16) {
        debug_assert!(!self.frozen, "symbol table mutated after freeze");
        self.lines.insert(number);
    }

    /// Binds a textual LABEL alias to a line number.
    pub fn add_alias(&mut self, name: &str, number: u16, pos: Pos) -> Result<(), SemanticError> {
        debug_assert!(!self.frozen, "symbol table mutated after freeze");
        let canonical = name.to_ascii_uppercase();
        if self.aliases.contains_key(&canonical) {
            return Err(SemanticError::DuplicateLabel {
                name: canonical,
                line: pos.line,
                column: pos.column,
            });
        }
        self.aliases.insert(canonical, number);
        Ok(())
    }

    /// Records a branch target for the post-parse resolution check.
    pub fn record_target(&mut self, target: &LineTarget, pos: Pos) {
        debug_assert!(!self.frozen, "symbol table mutated after freeze");
        self.used_targets.push((target.clone(), pos));
    }

    /// True if the program defines this line number.
    pub fn has_line(&self, number: u16) -> bool {
        self.lines.contains(&number)
    }

    /// The assembly label of a defined line.
    pub fn line_label(number: u16) -> String {
        format!("__label_line_{}", number)
    }

    /// The line number a target points at, if it exists.
    pub fn target_line_number(&self, target: &LineTarget) -> Option<u16> {
        let number = match target {
            LineTarget::Number(n) => *n,
            LineTarget::Name(name) => *self.aliases.get(&name.to_ascii_uppercase())?,
        };
        self.lines.contains(&number).then_some(number)
    }

    /// Resolves a target to its assembly label, if it exists.
    pub fn target_label(&self, target: &LineTarget) -> Option<String> {
        self.target_line_number(target).map(Self::line_label)
    }

    /// All textual aliases, name-sorted, with their line numbers.
    pub fn aliases(&self) -> Vec<(&str, u16)> {
        let mut out: Vec<_> = self
            .aliases
            .iter()
            .map(|(name, number)| (name.as_str(), *number))
            .collect();
        out.sort();
        out
    }

    /// All defined line numbers, ascending.
    pub fn line_numbers(&self) -> impl Iterator<Item = u16> + '_ {
        self.lines.iter().copied()
    }

    // ==================== Resolution ====================

    /// Verifies every recorded target names an existing line, then
    /// freezes the table for code generation.
    pub fn resolve(&mut self) -> Result<(), SemanticError> {
        for (target, pos) in &self.used_targets {
            if self.target_label(target).is_none() {
                return Err(SemanticError::UnresolvedTarget {
                    target: target.to_string(),
                    line: pos.line,
                    column: pos.column,
                });
            }
        }
        self.frozen = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(spelling: &str) -> VarRef {
        VarRef::from_spelling(spelling, Pos::new(1, 1))
    }

    #[test]
    fn test_first_reference_fixes_type() {
        let mut table = SymbolTable::new();
        assert_eq!(table.touch_variable(&var("A%"), false), Ok(ValueType::Integer));
        assert_eq!(table.touch_variable(&var("B"), false), Ok(ValueType::Real));
        assert_eq!(table.touch_variable(&var("C$"), false), Ok(ValueType::String));
    }

    #[test]
    fn test_conflicting_suffix_is_error() {
        let mut table = SymbolTable::new();
        table.touch_variable(&var("A%"), false).unwrap();
        let err = table.touch_variable(&var("A$"), false).unwrap_err();
        match err {
            SemanticError::TypeConflict { name, declared, used, .. } => {
                assert_eq!(name, "A");
                assert_eq!(declared, ValueType::Integer);
                assert_eq!(used, ValueType::String);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unsuffixed_reference_adopts_type() {
        let mut table = SymbolTable::new();
        table.touch_variable(&var("A%"), false).unwrap();
        assert_eq!(table.touch_variable(&var("A"), false), Ok(ValueType::Integer));
    }

    #[test]
    fn test_first_reference_order_is_kept() {
        let mut table = SymbolTable::new();
        table.touch_variable(&var("Z"), false).unwrap();
        table.touch_variable(&var("A"), false).unwrap();
        table.touch_variable(&var("Z"), false).unwrap();
        let names: Vec<_> = table.variables().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Z", "A"]);
    }

    #[test]
    fn test_target_resolution() {
        let mut table = SymbolTable::new();
        table.add_line(10);
        table.add_line(20);
        table.record_target(&LineTarget::Number(20), Pos::new(1, 9));
        assert!(table.resolve().is_ok());
        assert_eq!(
            table.target_label(&LineTarget::Number(20)).as_deref(),
            Some("__label_line_20")
        );
    }

    #[test]
    fn test_unresolved_target() {
        let mut table = SymbolTable::new();
        table.add_line(10);
        table.record_target(&LineTarget::Number(99), Pos::new(1, 9));
        let err = table.resolve().unwrap_err();
        match err {
            SemanticError::UnresolvedTarget { target, line, .. } => {
                assert_eq!(target, "99");
                assert_eq!(line, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_alias_targets() {
        let mut table = SymbolTable::new();
        table.add_line(30);
        table.add_alias("main", 30, Pos::new(3, 1)).unwrap();
        table
            .record_target(&LineTarget::Name("MAIN".to_string()), Pos::new(5, 4));
        assert!(table.resolve().is_ok());
        assert_eq!(
            table
                .target_label(&LineTarget::Name("Main".to_string()))
                .as_deref(),
            Some("__label_line_30")
        );
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        let mut table = SymbolTable::new();
        table.add_line(10);
        table.add_line(20);
        table.add_alias("LOOP1", 10, Pos::new(1, 1)).unwrap();
        assert!(table.add_alias("loop1", 20, Pos::new(2, 1)).is_err());
    }

    #[test]
    fn test_storage_label() {
        let mut table = SymbolTable::new();
        table.touch_variable(&var("SCORE%"), false).unwrap();
        let sym = table.variable("SCORE").unwrap();
        assert_eq!(sym.storage_label(), "var_SCORE");
    }
}
