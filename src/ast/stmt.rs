//! Statement AST nodes.
//!
//! One variant per supported keyword. Each variant carries its typed
//! operands; the code generator dispatches on the tag and lowers each to
//! a fixed Z80 snippet.

use super::{Expr, Pos, VarRef};

/// A statement with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// The kind of statement.
    pub kind: StatementKind,
    /// Source location of the statement's first token.
    pub pos: Pos,
}

impl Statement {
    /// Creates a new statement node.
    pub fn new(kind: StatementKind, pos: Pos) -> Self {
        Self { kind, pos }
    }
}

/// Destination of an assignment or READ.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    /// A scalar variable.
    Variable(VarRef),
    /// An array element: `A(I)`.
    Element {
        /// The array variable.
        var: VarRef,
        /// The index expression.
        index: Box<Expr>,
    },
}

impl AssignTarget {
    /// The variable behind the target.
    pub fn var(&self) -> &VarRef {
        match self {
            AssignTarget::Variable(v) => v,
            AssignTarget::Element { var, .. } => var,
        }
    }
}

/// A branch destination: a line number or a `LABEL` alias.
#[derive(Debug, Clone, PartialEq)]
pub enum LineTarget {
    /// A literal line number.
    Number(u16),
    /// A textual label bound with `LABEL`.
    Name(String),
}

impl std::fmt::Display for LineTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineTarget::Number(n) => write!(f, "{}", n),
            LineTarget::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Separator after a PRINT item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintSeparator {
    /// `;` - no spacing, cursor stays put
    Semicolon,
    /// `,` - advance to the next print zone
    Comma,
}

/// One printed value and the separator that follows it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintItem {
    /// The value to print.
    pub expr: Expr,
    /// Separator written after the value.
    pub separator: Option<PrintSeparator>,
}

/// One array declared by a DIM statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DimDecl {
    /// The array variable.
    pub var: VarRef,
    /// Highest valid index (elements 0..=bound).
    pub bound: i16,
}

/// A constant in a DATA statement.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    /// Numeric constant (optionally negated in source).
    Integer(i16),
    /// Real constant.
    Real(f64),
    /// Quoted string constant.
    Str(String),
}

/// The different kinds of statements in the supported subset.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    /// `LET target = expr` (LET keyword optional)
    Assign {
        /// Where the value goes.
        target: AssignTarget,
        /// The value.
        value: Expr,
    },

    /// `CALL addr` - jump to machine code
    Call {
        /// The routine address.
        address: Expr,
    },

    /// `CLS`
    Cls,

    /// `DATA c1, c2, ...`
    Data {
        /// The constants, in source order.
        values: Vec<DataValue>,
    },

    /// `DIM a(n) [, b(m) ...]` - one-dimensional arrays with constant bounds
    Dim {
        /// The declared arrays, in source order.
        arrays: Vec<DimDecl>,
    },

    /// `DRAW x, y [, pen]` - line from the graphics cursor
    Draw {
        /// Target X coordinate.
        x: Expr,
        /// Target Y coordinate.
        y: Expr,
        /// Graphics pen to select first, if given.
        pen: Option<Expr>,
    },

    /// `END`
    End,

    /// `FOR var = from TO to [STEP step]`
    For {
        /// The index variable.
        var: VarRef,
        /// Initial value.
        from: Expr,
        /// Limit value.
        to: Expr,
        /// Increment; 1 when absent.
        step: Option<Expr>,
    },

    /// `GOSUB target`
    Gosub {
        /// The destination line.
        target: LineTarget,
    },

    /// `GOTO target`
    Goto {
        /// The destination line.
        target: LineTarget,
    },

    /// `IF cond THEN stmts [ELSE stmts]`; a bare line number in either
    /// branch has already been rewritten to an implicit GOTO.
    If {
        /// The condition (nonzero = true).
        condition: Expr,
        /// Statements run when true.
        then_branch: Vec<Statement>,
        /// Statements run when false, if present.
        else_branch: Option<Vec<Statement>>,
    },

    /// `INPUT ["prompt";] var [, var ...]`
    Input {
        /// Literal prompt printed before the `?`.
        prompt: Option<String>,
        /// Receiving variables.
        vars: Vec<VarRef>,
    },

    /// `LABEL name` or `name:` - bind a textual alias to this line
    Label {
        /// The canonical (uppercase) label name.
        name: String,
    },

    /// `LOCATE col, row`
    Locate {
        /// 1-based column.
        col: Expr,
        /// 1-based row.
        row: Expr,
    },

    /// `MODE n`
    Mode {
        /// Screen mode 0-2.
        mode: Expr,
    },

    /// `NEXT [var]`
    Next {
        /// Index variable, when spelled out.
        var: Option<VarRef>,
    },

    /// `PAPER n`
    Paper {
        /// Ink number.
        ink: Expr,
    },

    /// `PEN n`
    Pen {
        /// Ink number.
        ink: Expr,
    },

    /// `PLOT x, y [, pen]`
    Plot {
        /// X coordinate.
        x: Expr,
        /// Y coordinate.
        y: Expr,
        /// Graphics pen to select first, if given.
        pen: Option<Expr>,
    },

    /// `POKE addr, value`
    Poke {
        /// Memory address.
        address: Expr,
        /// Byte value (low 8 bits are stored).
        value: Expr,
    },

    /// `PRINT [items]`
    Print {
        /// The values and separators.
        items: Vec<PrintItem>,
        /// Whether a newline follows the last item.
        newline: bool,
    },

    /// `READ var [, var ...]`
    Read {
        /// Receiving variables.
        vars: Vec<VarRef>,
    },

    /// `REM ...` or `' ...` - kept for listings
    Remark {
        /// Comment text, without the REM/apostrophe marker.
        text: String,
    },

    /// `RESTORE [target]`
    Restore {
        /// DATA line to reset to; pool start when absent.
        target: Option<LineTarget>,
    },

    /// `RETURN`
    Return,

    /// `SYMBOL code, r1, ..., r8` - redefine a character matrix
    Symbol {
        /// Character code.
        code: Expr,
        /// The eight matrix rows, top first.
        rows: Vec<Expr>,
    },

    /// `SYMBOL AFTER n` - reserve the character generator table from n up
    SymbolAfter {
        /// First redefinable character (constant 0..=255).
        first: i16,
    },

    /// `WEND`
    Wend,

    /// `WHILE cond`
    While {
        /// Loop condition (nonzero = continue).
        condition: Expr,
    },
}

impl std::fmt::Display for AssignTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssignTarget::Variable(var) => write!(f, "{}", var),
            AssignTarget::Element { var, index } => write!(f, "{}({})", var, index),
        }
    }
}

impl std::fmt::Display for DataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataValue::Integer(n) => write!(f, "{}", n),
            DataValue::Real(v) => write!(f, "{:?}", v),
            DataValue::Str(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// Source reconstruction, used by the round-trip tests: printing a parsed
/// statement and parsing it again yields the same tree.
impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let join = |f: &mut std::fmt::Formatter<'_>,
                    stmts: &[Statement]|
         -> std::fmt::Result {
            for (i, stmt) in stmts.iter().enumerate() {
                if i > 0 {
                    write!(f, ":")?;
                }
                write!(f, "{}", stmt)?;
            }
            Ok(())
        };

        match &self.kind {
            StatementKind::Assign { target, value } => write!(f, "{}={}", target, value),
            StatementKind::Call { address } => write!(f, "CALL {}", address),
            StatementKind::Cls => write!(f, "CLS"),
            StatementKind::Data { values } => {
                write!(f, "DATA ")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", value)?;
                }
                Ok(())
            }
            StatementKind::Dim { arrays } => {
                write!(f, "DIM ")?;
                for (i, decl) in arrays.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}({})", decl.var, decl.bound)?;
                }
                Ok(())
            }
            StatementKind::Draw { x, y, pen } => {
                write!(f, "DRAW {},{}", x, y)?;
                if let Some(pen) = pen {
                    write!(f, ",{}", pen)?;
                }
                Ok(())
            }
            StatementKind::End => write!(f, "END"),
            StatementKind::For {
                var,
                from,
                to,
                step,
            } => {
                write!(f, "FOR {}={} TO {}", var, from, to)?;
                if let Some(step) = step {
                    write!(f, " STEP {}", step)?;
                }
                Ok(())
            }
            StatementKind::Gosub { target } => write!(f, "GOSUB {}", target),
            StatementKind::Goto { target } => write!(f, "GOTO {}", target),
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                write!(f, "IF {} THEN ", condition)?;
                join(f, then_branch)?;
                if let Some(else_branch) = else_branch {
                    write!(f, " ELSE ")?;
                    join(f, else_branch)?;
                }
                Ok(())
            }
            StatementKind::Input { prompt, vars } => {
                write!(f, "INPUT ")?;
                if let Some(prompt) = prompt {
                    write!(f, "\"{}\";", prompt)?;
                }
                for (i, var) in vars.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", var)?;
                }
                Ok(())
            }
            StatementKind::Label { name } => write!(f, "LABEL {}", name),
            StatementKind::Locate { col, row } => write!(f, "LOCATE {},{}", col, row),
            StatementKind::Mode { mode } => write!(f, "MODE {}", mode),
            StatementKind::Next { var } => match var {
                Some(var) => write!(f, "NEXT {}", var),
                None => write!(f, "NEXT"),
            },
            StatementKind::Paper { ink } => write!(f, "PAPER {}", ink),
            StatementKind::Pen { ink } => write!(f, "PEN {}", ink),
            StatementKind::Plot { x, y, pen } => {
                write!(f, "PLOT {},{}", x, y)?;
                if let Some(pen) = pen {
                    write!(f, ",{}", pen)?;
                }
                Ok(())
            }
            StatementKind::Poke { address, value } => write!(f, "POKE {},{}", address, value),
            StatementKind::Print { items, .. } => {
                write!(f, "PRINT")?;
                for item in items {
                    write!(f, " {}", item.expr)?;
                    match item.separator {
                        Some(PrintSeparator::Semicolon) => write!(f, ";")?,
                        Some(PrintSeparator::Comma) => write!(f, ",")?,
                        None => {}
                    }
                }
                Ok(())
            }
            StatementKind::Read { vars } => {
                write!(f, "READ ")?;
                for (i, var) in vars.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", var)?;
                }
                Ok(())
            }
            StatementKind::Remark { text } => {
                if text.is_empty() {
                    write!(f, "REM")
                } else {
                    write!(f, "REM {}", text)
                }
            }
            StatementKind::Restore { target } => match target {
                Some(target) => write!(f, "RESTORE {}", target),
                None => write!(f, "RESTORE"),
            },
            StatementKind::Return => write!(f, "RETURN"),
            StatementKind::Symbol { code, rows } => {
                write!(f, "SYMBOL {}", code)?;
                for row in rows {
                    write!(f, ",{}", row)?;
                }
                Ok(())
            }
            StatementKind::SymbolAfter { first } => write!(f, "SYMBOL AFTER {}", first),
            StatementKind::Wend => write!(f, "WEND"),
            StatementKind::While { condition } => write!(f, "WHILE {}", condition),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ExprKind;

    #[test]
    fn test_line_target_display() {
        assert_eq!(LineTarget::Number(100).to_string(), "100");
        assert_eq!(LineTarget::Name("MAIN".to_string()).to_string(), "MAIN");
    }

    #[test]
    fn test_assign_target_var() {
        let v = VarRef::from_spelling("A%", Pos::new(1, 1));
        let target = AssignTarget::Element {
            var: v.clone(),
            index: Box::new(Expr::new(ExprKind::IntegerLit(0), Pos::new(1, 3))),
        };
        assert_eq!(target.var().base, "A");
    }
}
