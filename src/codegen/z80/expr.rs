//! Expression type inference and evaluation.
//!
//! Types are inferred bottom-up right here, at emission time: each node
//! ends up exactly one of integer, real, or string, following the
//! coercion rules of the dialect (integer stays integer, any real
//! operand widens the operation, strings only concatenate and compare).
//!
//! Evaluation contract:
//!
//! - integer results are left in `HL`;
//! - real results are left as an address in `HL`, pointing either at a
//!   literal, a variable slot, or a scratch temporary — binary operators
//!   always copy their left operand into a fresh temporary before
//!   applying the firmware routine in place, so no source buffer is ever
//!   written through;
//! - string results are left as an address in `HL` under the same rules.
//!
//! Binary operators evaluate left first, push it, evaluate right, then
//! `pop de` and apply.

use crate::ast::{BinaryOp, Builtin, Expr, ExprKind, Pos, UnaryOp, VarRef};
use crate::codegen::error::CodeGenError;
use crate::diagnostics::DiagnosticKind;
use crate::semantic::{SymbolTable, ValueType};

use super::firmware;
use super::{int_operand, Emitter};

/// Infers the result type of an expression without emitting anything.
pub(super) fn infer_type(symbols: &SymbolTable, expr: &Expr) -> Result<ValueType, CodeGenError> {
    match &expr.kind {
        ExprKind::IntegerLit(_) => Ok(ValueType::Integer),
        ExprKind::RealLit(_) => Ok(ValueType::Real),
        ExprKind::StringLit(_) => Ok(ValueType::String),
        ExprKind::Variable(var) | ExprKind::Element { var, .. } => Ok(var_type(symbols, var)),
        ExprKind::Grouped(inner) => infer_type(symbols, inner),
        ExprKind::Unary { op, operand } => {
            let ty = infer_type(symbols, operand)?;
            if ty == ValueType::String {
                return Err(CodeGenError::type_error(
                    format!("{} takes a numeric operand", unary_name(*op)),
                    operand.pos,
                ));
            }
            match op {
                UnaryOp::Negate => Ok(ty),
                UnaryOp::Not => Ok(ValueType::Integer),
            }
        }
        ExprKind::Binary { left, op, right } => {
            let lt = infer_type(symbols, left)?;
            let rt = infer_type(symbols, right)?;
            infer_binary(*op, lt, rt, expr.pos)
        }
        ExprKind::Builtin { func, args } => infer_builtin(symbols, *func, args, expr.pos),
    }
}

/// The result type of a binary operation, or the type error it is.
fn infer_binary(
    op: BinaryOp,
    lt: ValueType,
    rt: ValueType,
    pos: Pos,
) -> Result<ValueType, CodeGenError> {
    if lt == ValueType::String && rt == ValueType::String {
        if op == BinaryOp::Add {
            return Ok(ValueType::String);
        }
        if op.is_comparison() {
            return Ok(ValueType::Integer);
        }
        return Err(CodeGenError::type_error(
            format!("'{}' is not defined on strings", op.as_str()),
            pos,
        ));
    }
    if lt == ValueType::String || rt == ValueType::String {
        return Err(CodeGenError::type_error(
            format!("'{}' mixes a string with a {}", op.as_str(), if lt == ValueType::String { rt } else { lt }),
            pos,
        ));
    }

    match op {
        BinaryOp::Power => Ok(ValueType::Real),
        BinaryOp::Modulo | BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => Ok(ValueType::Integer),
        _ if op.is_comparison() => Ok(ValueType::Integer),
        // Integer / integer keeps the integer quotient; any real widens.
        _ => Ok(lt.numeric_common(rt)),
    }
}

/// The result type of a built-in call, with argument type checking.
fn infer_builtin(
    symbols: &SymbolTable,
    func: Builtin,
    args: &[Expr],
    _pos: Pos,
) -> Result<ValueType, CodeGenError> {
    let arg_ty = |i: usize| infer_type(symbols, &args[i]);
    let want_string = |i: usize| -> Result<(), CodeGenError> {
        if arg_ty(i)? != ValueType::String {
            return Err(CodeGenError::type_error(
                format!("{} takes a string argument", func.as_str()),
                args[i].pos,
            ));
        }
        Ok(())
    };
    let want_numeric = |i: usize| -> Result<(), CodeGenError> {
        if !arg_ty(i)?.is_numeric() {
            return Err(CodeGenError::type_error(
                format!("{} takes a numeric argument", func.as_str()),
                args[i].pos,
            ));
        }
        Ok(())
    };

    match func {
        Builtin::Abs => {
            want_numeric(0)?;
            arg_ty(0)
        }
        Builtin::Int => {
            want_numeric(0)?;
            Ok(ValueType::Integer)
        }
        Builtin::Peek => {
            want_numeric(0)?;
            Ok(ValueType::Integer)
        }
        Builtin::Asc | Builtin::Len | Builtin::Val => {
            want_string(0)?;
            Ok(ValueType::Integer)
        }
        Builtin::ChrS | Builtin::HexS | Builtin::StrS => {
            want_numeric(0)?;
            Ok(ValueType::String)
        }
        Builtin::InkeyS => Ok(ValueType::String),
        Builtin::LeftS | Builtin::RightS => {
            want_string(0)?;
            want_numeric(1)?;
            Ok(ValueType::String)
        }
        Builtin::MidS => {
            want_string(0)?;
            want_numeric(1)?;
            if args.len() == 3 {
                want_numeric(2)?;
            }
            Ok(ValueType::String)
        }
    }
}

fn unary_name(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Negate => "unary '-'",
        UnaryOp::Not => "NOT",
    }
}

/// The fixed type of a variable reference.
fn var_type(symbols: &SymbolTable, var: &VarRef) -> ValueType {
    symbols
        .variable(&var.base)
        .map(|s| s.ty)
        .unwrap_or_else(|| ValueType::from_suffix(var.suffix))
}

impl<'a> Emitter<'a> {
    /// Evaluates an expression, leaving its value per the module
    /// contract and returning its type.
    pub(super) fn eval_expr(&mut self, expr: &Expr) -> Result<ValueType, CodeGenError> {
        match &expr.kind {
            ExprKind::IntegerLit(n) => {
                self.op("ld", &format!("hl,{}", int_operand(*n)));
                Ok(ValueType::Integer)
            }
            ExprKind::RealLit(v) => {
                let label = self.real_literal(*v, expr.pos)?;
                self.op("ld", &format!("hl,{}", label));
                Ok(ValueType::Real)
            }
            ExprKind::StringLit(s) => {
                let label = self.string_literal(s);
                self.op("ld", &format!("hl,{}", label));
                Ok(ValueType::String)
            }
            ExprKind::Variable(var) => self.eval_variable(var),
            ExprKind::Element { var, index } => self.eval_element(var, index),
            ExprKind::Grouped(inner) => self.eval_expr(inner),
            ExprKind::Unary { op, operand } => self.eval_unary(*op, operand),
            ExprKind::Binary { left, op, right } => self.eval_binary(left, *op, right, expr.pos),
            ExprKind::Builtin { func, args } => self.eval_builtin(*func, args, expr.pos),
        }
    }

    /// Evaluates an expression and coerces the result into `HL` as an
    /// integer. `context` names the statement for the truncation warning;
    /// `None` converts silently (plain BASIC coercion).
    pub(super) fn eval_as_int(
        &mut self,
        expr: &Expr,
        context: Option<&str>,
    ) -> Result<(), CodeGenError> {
        match self.eval_expr(expr)? {
            ValueType::Integer => Ok(()),
            ValueType::Real => {
                if let Some(context) = context {
                    self.warn(
                        DiagnosticKind::TypeError,
                        expr.pos,
                        format!("implicit real-to-integer truncation in {}", context),
                    );
                }
                self.need("reallib_real2int");
                self.op("call", "reallib_real2int");
                Ok(())
            }
            ValueType::String => Err(CodeGenError::type_error(
                "expected a numeric value, got a string",
                expr.pos,
            )),
        }
    }

    /// Evaluates an expression as a real, leaving its address in `HL`.
    /// Integers are promoted through a fresh temporary.
    pub(super) fn eval_as_real(&mut self, expr: &Expr) -> Result<(), CodeGenError> {
        match self.eval_expr(expr)? {
            ValueType::Real => Ok(()),
            ValueType::Integer => {
                let tmp = self.alloc_tmp("defs 5");
                self.need("reallib_int2real");
                self.op("ld", &format!("de,{}", tmp));
                self.op("call", "reallib_int2real");
                self.op("ld", &format!("hl,{}", tmp));
                Ok(())
            }
            ValueType::String => Err(CodeGenError::type_error(
                "expected a numeric value, got a string",
                expr.pos,
            )),
        }
    }

    /// Loads a scalar variable.
    fn eval_variable(&mut self, var: &VarRef) -> Result<ValueType, CodeGenError> {
        let ty = var_type(self.symbols, var);
        let label = self
            .symbols
            .variable(&var.base)
            .map(|s| s.storage_label())
            .unwrap_or_else(|| format!("var_{}", var.base));
        self.symbols.mark_referenced(&var.base);
        match ty {
            ValueType::Integer => self.op("ld", &format!("hl,({})", label)),
            ValueType::Real | ValueType::String => self.op("ld", &format!("hl,{}", label)),
        }
        Ok(ty)
    }

    /// Loads an array element.
    fn eval_element(&mut self, var: &VarRef, index: &Expr) -> Result<ValueType, CodeGenError> {
        let ty = self.element_addr(var, index)?;
        if ty == ValueType::Integer {
            // Dereference the 16-bit cell.
            self.op("ld", "a,(hl)");
            self.op("inc", "hl");
            self.op("ld", "h,(hl)");
            self.op("ld", "l,a");
        }
        Ok(ty)
    }

    /// Leaves the address of an array element in `HL` and returns the
    /// element type.
    pub(super) fn element_addr(
        &mut self,
        var: &VarRef,
        index: &Expr,
    ) -> Result<ValueType, CodeGenError> {
        let sym = self.symbols.variable(&var.base).ok_or_else(|| {
            CodeGenError::type_error(format!("unknown array '{}'", var.base), var.pos)
        })?;
        if sym.array_bound.is_none() {
            return Err(CodeGenError::type_error(
                format!("array '{}' used without DIM", var.base),
                var.pos,
            ));
        }
        let ty = sym.ty;
        let label = sym.storage_label();
        self.symbols.mark_referenced(&var.base);

        self.eval_as_int(index, None)?;
        match ty {
            ValueType::Integer => {
                self.op("add", "hl,hl");
            }
            ValueType::Real => {
                // index * 5
                self.op("ld", "d,h");
                self.op("ld", "e,l");
                self.op("add", "hl,hl");
                self.op("add", "hl,hl");
                self.op("add", "hl,de");
            }
            ValueType::String => {
                // index * 256
                self.op("ld", "h,l");
                self.op("ld", "l,0");
            }
        }
        self.op("ld", &format!("de,{}", label));
        self.op("add", "hl,de");
        Ok(ty)
    }

    /// Unary operators.
    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr) -> Result<ValueType, CodeGenError> {
        let ty = infer_type(self.symbols, operand)?;
        if ty == ValueType::String {
            return Err(CodeGenError::type_error(
                format!("{} takes a numeric operand", unary_name(op)),
                operand.pos,
            ));
        }
        match (op, ty) {
            (UnaryOp::Negate, ValueType::Integer) => {
                self.eval_expr(operand)?;
                self.op("ld", "de,0");
                self.op("ex", "de,hl");
                self.op("xor", "a");
                self.op("sbc", "hl,de");
                Ok(ValueType::Integer)
            }
            (UnaryOp::Negate, ValueType::Real) => {
                self.eval_expr(operand)?;
                let tmp = self.alloc_tmp("defs 5");
                self.op("ld", &format!("de,{}", tmp));
                self.fw("call", firmware::MATH_MOVE_REAL);
                self.op("ex", "de,hl");
                self.fw("call", firmware::MATH_REAL_UMINUS);
                Ok(ValueType::Real)
            }
            (UnaryOp::Not, _) => {
                self.eval_as_int(operand, None)?;
                self.op("ld", "de,&FFFF");
                self.op("ex", "de,hl");
                self.op("xor", "a");
                self.op("sbc", "hl,de");
                Ok(ValueType::Integer)
            }
            (UnaryOp::Negate, ValueType::String) => unreachable!("checked above"),
        }
    }

    /// Binary operators, dispatched on the inferred operand types.
    fn eval_binary(
        &mut self,
        left: &Expr,
        op: BinaryOp,
        right: &Expr,
        pos: Pos,
    ) -> Result<ValueType, CodeGenError> {
        let lt = infer_type(self.symbols, left)?;
        let rt = infer_type(self.symbols, right)?;
        infer_binary(op, lt, rt, pos)?;

        if lt == ValueType::String && rt == ValueType::String {
            return if op == BinaryOp::Add {
                self.eval_string_concat(left, right)
            } else {
                self.eval_string_comparison(left, op, right)
            };
        }

        // MOD and the bitwise operators work on rounded integers.
        let integer_only = matches!(
            op,
            BinaryOp::Modulo | BinaryOp::And | BinaryOp::Or | BinaryOp::Xor
        );
        if integer_only
            || (lt == ValueType::Integer && rt == ValueType::Integer && op != BinaryOp::Power)
        {
            self.eval_int_binary(left, op, right)?;
            return Ok(ValueType::Integer);
        }

        if op.is_comparison() {
            self.eval_real_comparison(left, op, right)?;
            return Ok(ValueType::Integer);
        }

        self.eval_real_binary(left, op, right)?;
        Ok(ValueType::Real)
    }

    /// Integer path: left pushed, right in HL, pop DE, apply.
    fn eval_int_binary(
        &mut self,
        left: &Expr,
        op: BinaryOp,
        right: &Expr,
    ) -> Result<(), CodeGenError> {
        self.eval_as_int(left, None)?;
        self.op("push", "hl");
        self.eval_as_int(right, None)?;
        self.op("pop", "de");

        match op {
            BinaryOp::Add => {
                self.op("add", "hl,de");
            }
            BinaryOp::Subtract => {
                self.op("ex", "de,hl");
                self.op("xor", "a");
                self.op("sbc", "hl,de");
            }
            BinaryOp::Multiply => {
                self.need("mul16_signed");
                self.op("call", "mul16_signed");
            }
            BinaryOp::Divide => {
                self.need("div16_signed");
                self.op("call", "div16_signed");
            }
            BinaryOp::Modulo => {
                self.need("mod16");
                self.op("call", "mod16");
            }
            BinaryOp::And => {
                self.op("ld", "a,h");
                self.op("and", "d");
                self.op("ld", "h,a");
                self.op("ld", "a,l");
                self.op("and", "e");
                self.op("ld", "l,a");
            }
            BinaryOp::Or => {
                self.op("ld", "a,h");
                self.op("or", "d");
                self.op("ld", "h,a");
                self.op("ld", "a,l");
                self.op("or", "e");
                self.op("ld", "l,a");
            }
            BinaryOp::Xor => {
                self.op("ld", "a,h");
                self.op("xor", "d");
                self.op("ld", "h,a");
                self.op("ld", "a,l");
                self.op("xor", "e");
                self.op("ld", "l,a");
            }
            BinaryOp::Equal => {
                self.op("xor", "a");
                self.op("sbc", "hl,de");
                self.op("ld", "hl,&FFFF");
                self.op("jr", "z,$+3");
                self.op("inc", "hl");
            }
            BinaryOp::NotEqual => {
                self.op("xor", "a");
                self.op("sbc", "hl,de");
                self.op("ld", "hl,0");
                self.op("jr", "z,$+3");
                self.op("dec", "hl");
            }
            BinaryOp::Less => {
                self.need("comp16_signed");
                self.op("ex", "de,hl");
                self.op("call", "comp16_signed");
                self.op("ld", "hl,&FFFF");
                self.op("jr", "c,$+3");
                self.op("inc", "hl");
            }
            BinaryOp::Greater => {
                self.need("comp16_signed");
                self.op("call", "comp16_signed");
                self.op("ld", "hl,&FFFF");
                self.op("jr", "c,$+3");
                self.op("inc", "hl");
            }
            BinaryOp::LessEqual => {
                self.need("comp16_signed");
                self.op("call", "comp16_signed");
                self.op("ld", "hl,0");
                self.op("jr", "c,$+3");
                self.op("dec", "hl");
            }
            BinaryOp::GreaterEqual => {
                self.need("comp16_signed");
                self.op("ex", "de,hl");
                self.op("call", "comp16_signed");
                self.op("ld", "hl,0");
                self.op("jr", "c,$+3");
                self.op("dec", "hl");
            }
            BinaryOp::Power => unreachable!("power always takes the real path"),
        }
        Ok(())
    }

    /// Real path: copy the left value into a fresh temporary, apply the
    /// firmware routine in place, leave the temporary's address in HL.
    fn eval_real_binary(
        &mut self,
        left: &Expr,
        op: BinaryOp,
        right: &Expr,
    ) -> Result<(), CodeGenError> {
        let tmp = self.alloc_tmp("defs 5");
        self.eval_as_real(left)?;
        self.op("ld", &format!("de,{}", tmp));
        self.fw("call", firmware::MATH_MOVE_REAL);
        self.op("push", "de");
        self.eval_as_real(right)?;
        self.op("pop", "de");
        self.op("ex", "de,hl");
        match op {
            BinaryOp::Add => self.fw("call", firmware::MATH_REAL_ADD),
            BinaryOp::Subtract => {
                self.need("reallib_sub");
                self.op("call", "reallib_sub");
            }
            BinaryOp::Multiply => self.fw("call", firmware::MATH_REAL_MULT),
            BinaryOp::Divide => self.fw("call", firmware::MATH_REAL_DIV),
            BinaryOp::Power => self.fw("call", firmware::MATH_REAL_POWER),
            _ => unreachable!("not an arithmetic operator"),
        }
        self.op("ld", &format!("hl,{}", tmp));
        Ok(())
    }

    /// Real comparison: firmware compare sets A to &FF / 0 / 1 for
    /// less / equal / greater; the glue folds that to -1 / 0 in HL.
    fn eval_real_comparison(
        &mut self,
        left: &Expr,
        op: BinaryOp,
        right: &Expr,
    ) -> Result<(), CodeGenError> {
        self.eval_as_real(left)?;
        self.op("push", "hl");
        self.eval_as_real(right)?;
        self.op("pop", "de");
        self.op("ex", "de,hl");
        self.fw("call", firmware::MATH_REAL_COMP);
        match op {
            BinaryOp::Less => {
                self.op("cp", "&FF");
                self.op("ld", "hl,&FFFF");
                self.op("jr", "z,$+3");
                self.op("inc", "hl");
            }
            BinaryOp::Greater => {
                self.op("cp", "1");
                self.op("ld", "hl,&FFFF");
                self.op("jr", "z,$+3");
                self.op("inc", "hl");
            }
            BinaryOp::Equal => {
                self.op("or", "a");
                self.op("ld", "hl,&FFFF");
                self.op("jr", "z,$+3");
                self.op("inc", "hl");
            }
            BinaryOp::NotEqual => {
                self.op("or", "a");
                self.op("ld", "hl,0");
                self.op("jr", "z,$+3");
                self.op("dec", "hl");
            }
            BinaryOp::LessEqual => {
                self.op("cp", "1");
                self.op("ld", "hl,0");
                self.op("jr", "z,$+3");
                self.op("dec", "hl");
            }
            BinaryOp::GreaterEqual => {
                self.op("cp", "&FF");
                self.op("ld", "hl,0");
                self.op("jr", "z,$+3");
                self.op("dec", "hl");
            }
            _ => unreachable!("not a comparison"),
        }
        Ok(())
    }

    /// String concatenation into a fresh 256-byte temporary.
    fn eval_string_concat(&mut self, left: &Expr, right: &Expr) -> Result<ValueType, CodeGenError> {
        let tmp = self.alloc_tmp("defs 256");
        self.need("strlib_copy");
        self.eval_expr(left)?;
        self.op("ex", "de,hl");
        self.op("ld", &format!("hl,{}", tmp));
        self.op("call", "strlib_strcopy");
        self.op("dec", "hl");
        self.op("push", "hl");
        self.eval_expr(right)?;
        self.op("ex", "de,hl");
        self.op("pop", "hl");
        self.op("call", "strlib_strcopy");
        self.op("ld", &format!("hl,{}", tmp));
        Ok(ValueType::String)
    }

    /// String comparison through `strlib_strcomp` (Z equal, CY left
    /// before right), folded to -1 / 0 in HL.
    fn eval_string_comparison(
        &mut self,
        left: &Expr,
        op: BinaryOp,
        right: &Expr,
    ) -> Result<ValueType, CodeGenError> {
        self.need("strlib_comp");
        self.eval_expr(left)?;
        self.op("push", "hl");
        self.eval_expr(right)?;
        self.op("pop", "de");
        self.op("call", "strlib_strcomp");
        match op {
            BinaryOp::Equal => {
                self.op("ld", "hl,&FFFF");
                self.op("jr", "z,$+3");
                self.op("inc", "hl");
            }
            BinaryOp::NotEqual => {
                self.op("ld", "hl,0");
                self.op("jr", "z,$+3");
                self.op("dec", "hl");
            }
            BinaryOp::Less => {
                self.op("ld", "hl,&FFFF");
                self.op("jr", "c,$+3");
                self.op("inc", "hl");
            }
            BinaryOp::GreaterEqual => {
                self.op("ld", "hl,0");
                self.op("jr", "c,$+3");
                self.op("dec", "hl");
            }
            BinaryOp::Greater => {
                let done = self.new_label("strcmp");
                self.op("ld", "hl,0");
                self.op("jr", &format!("c,{}", done));
                self.op("jr", &format!("z,{}", done));
                self.op("dec", "hl");
                self.emit_label(&done);
            }
            BinaryOp::LessEqual => {
                let done = self.new_label("strcmp");
                self.op("ld", "hl,&FFFF");
                self.op("jr", &format!("c,{}", done));
                self.op("jr", &format!("z,{}", done));
                self.op("inc", "hl");
                self.emit_label(&done);
            }
            _ => unreachable!("not a string comparison"),
        }
        Ok(ValueType::Integer)
    }

    /// Built-in function calls.
    fn eval_builtin(
        &mut self,
        func: Builtin,
        args: &[Expr],
        pos: Pos,
    ) -> Result<ValueType, CodeGenError> {
        let result = infer_builtin(self.symbols, func, args, pos)?;
        match func {
            Builtin::Abs => {
                if infer_type(self.symbols, &args[0])? == ValueType::Integer {
                    self.eval_expr(&args[0])?;
                    self.need("abs16");
                    self.op("call", "abs16");
                } else {
                    self.eval_as_real(&args[0])?;
                    let tmp = self.alloc_tmp("defs 5");
                    self.op("ld", &format!("de,{}", tmp));
                    self.fw("call", firmware::MATH_MOVE_REAL);
                    self.op("ex", "de,hl");
                    self.need("reallib_abs");
                    self.op("call", "reallib_abs");
                }
            }
            Builtin::Asc => {
                self.eval_expr(&args[0])?;
                self.op("ld", "a,(hl)");
                self.op("ld", "l,a");
                self.op("ld", "h,0");
            }
            Builtin::ChrS => {
                let tmp = self.alloc_tmp("defs 2");
                self.eval_as_int(&args[0], None)?;
                self.op("ld", "a,l");
                self.op("ld", &format!("({}),a", tmp));
                self.op("xor", "a");
                self.op("ld", &format!("({}+1),a", tmp));
                self.op("ld", &format!("hl,{}", tmp));
            }
            Builtin::HexS => {
                self.eval_as_int(&args[0], None)?;
                self.op("ex", "de,hl");
                self.need("strlib_int2hex");
                self.op("call", "strlib_int2hex");
            }
            Builtin::InkeyS => {
                let tmp = self.alloc_tmp("defs 2");
                self.fw("call", firmware::KM_READ_CHAR);
                self.op("jr", "c,$+3");
                self.op("xor", "a");
                self.op("ld", &format!("hl,{}", tmp));
                self.op("ld", "(hl),a");
                self.op("inc", "hl");
                self.op("ld", "(hl),0");
                self.op("ld", &format!("hl,{}", tmp));
            }
            Builtin::Int => {
                if infer_type(self.symbols, &args[0])? == ValueType::Integer {
                    self.eval_expr(&args[0])?;
                } else {
                    self.eval_expr(&args[0])?;
                    self.need("reallib_floor");
                    self.op("call", "reallib_floor");
                }
            }
            Builtin::Len => {
                self.eval_expr(&args[0])?;
                self.need("strlib_len");
                self.op("call", "strlib_len");
            }
            Builtin::LeftS => {
                let tmp = self.alloc_tmp("defs 256");
                self.eval_expr(&args[0])?;
                self.op("push", "hl");
                self.eval_as_int(&args[1], None)?;
                self.op("ld", "b,h");
                self.op("ld", "c,l");
                self.op("pop", "hl");
                self.op("ld", &format!("de,{}", tmp));
                self.need("strlib_left");
                self.op("call", "strlib_left");
                self.op("ld", &format!("hl,{}", tmp));
            }
            Builtin::MidS => {
                let tmp = self.alloc_tmp("defs 256");
                self.eval_expr(&args[0])?;
                self.op("push", "hl");
                self.eval_as_int(&args[1], None)?;
                self.op("dec", "hl");
                self.op("push", "hl");
                if let Some(len) = args.get(2) {
                    self.eval_as_int(len, None)?;
                } else {
                    self.op("ld", "hl,255");
                }
                self.op("ld", "b,h");
                self.op("ld", "c,l");
                self.op("pop", "de");
                self.op("pop", "hl");
                self.need("strlib_skip");
                self.op("call", "strlib_skip");
                self.op("ld", &format!("de,{}", tmp));
                self.need("strlib_left");
                self.op("call", "strlib_left");
                self.op("ld", &format!("hl,{}", tmp));
            }
            Builtin::Peek => {
                self.eval_as_int(&args[0], None)?;
                self.op("ld", "a,(hl)");
                self.op("ld", "l,a");
                self.op("ld", "h,0");
            }
            Builtin::RightS => {
                let tmp = self.alloc_tmp("defs 256");
                self.eval_expr(&args[0])?;
                self.op("push", "hl");
                self.eval_as_int(&args[1], None)?;
                self.op("ld", "b,h");
                self.op("ld", "c,l");
                self.op("pop", "hl");
                self.op("ld", &format!("de,{}", tmp));
                self.need("strlib_right");
                self.op("call", "strlib_right");
                self.op("ld", &format!("hl,{}", tmp));
            }
            Builtin::StrS => {
                if infer_type(self.symbols, &args[0])? == ValueType::Integer {
                    self.eval_expr(&args[0])?;
                    self.need("strlib_int2str");
                    self.op("call", "strlib_int2str");
                } else {
                    self.eval_expr(&args[0])?;
                    self.need("reallib_real2str");
                    self.op("call", "reallib_real2str");
                }
            }
            Builtin::Val => {
                self.eval_expr(&args[0])?;
                self.op("ex", "de,hl");
                self.need("strlib_dropspaces");
                self.op("call", "strlib_dropspaces");
                self.need("strlib_str2int");
                self.op("call", "strlib_str2int");
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Pos;

    fn lit_int(n: i16) -> Expr {
        Expr::new(ExprKind::IntegerLit(n), Pos::new(1, 1))
    }

    fn lit_real(v: f64) -> Expr {
        Expr::new(ExprKind::RealLit(v), Pos::new(1, 1))
    }

    fn lit_str(s: &str) -> Expr {
        Expr::new(ExprKind::StringLit(s.to_string()), Pos::new(1, 1))
    }

    fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
        Expr::new(
            ExprKind::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            Pos::new(1, 1),
        )
    }

    #[test]
    fn test_integer_stays_integer() {
        let symbols = SymbolTable::new();
        let e = binary(lit_int(1), BinaryOp::Divide, lit_int(2));
        assert_eq!(infer_type(&symbols, &e).unwrap(), ValueType::Integer);
    }

    #[test]
    fn test_real_widens() {
        let symbols = SymbolTable::new();
        let e = binary(lit_int(1), BinaryOp::Add, lit_real(1.5));
        assert_eq!(infer_type(&symbols, &e).unwrap(), ValueType::Real);
    }

    #[test]
    fn test_comparisons_yield_integer() {
        let symbols = SymbolTable::new();
        let e = binary(lit_real(1.5), BinaryOp::Less, lit_real(2.5));
        assert_eq!(infer_type(&symbols, &e).unwrap(), ValueType::Integer);
        let e = binary(lit_str("A"), BinaryOp::Equal, lit_str("B"));
        assert_eq!(infer_type(&symbols, &e).unwrap(), ValueType::Integer);
    }

    #[test]
    fn test_string_concat_and_errors() {
        let symbols = SymbolTable::new();
        let ok = binary(lit_str("A"), BinaryOp::Add, lit_str("B"));
        assert_eq!(infer_type(&symbols, &ok).unwrap(), ValueType::String);

        let bad = binary(lit_str("A"), BinaryOp::Add, lit_int(1));
        assert!(infer_type(&symbols, &bad).is_err());

        let bad = binary(lit_str("A"), BinaryOp::Multiply, lit_str("B"));
        assert!(infer_type(&symbols, &bad).is_err());
    }

    #[test]
    fn test_power_is_real() {
        let symbols = SymbolTable::new();
        let e = binary(lit_int(2), BinaryOp::Power, lit_int(3));
        assert_eq!(infer_type(&symbols, &e).unwrap(), ValueType::Real);
    }

    #[test]
    fn test_builtin_types() {
        let symbols = SymbolTable::new();
        let chr = Expr::new(
            ExprKind::Builtin {
                func: Builtin::ChrS,
                args: vec![lit_int(65)],
            },
            Pos::new(1, 1),
        );
        assert_eq!(infer_type(&symbols, &chr).unwrap(), ValueType::String);

        let len_of_int = Expr::new(
            ExprKind::Builtin {
                func: Builtin::Len,
                args: vec![lit_int(65)],
            },
            Pos::new(1, 1),
        );
        assert!(infer_type(&symbols, &len_of_int).is_err());
    }
}
