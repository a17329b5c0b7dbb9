//! Statement lowering.
//!
//! Each statement lowers to a small fixed snippet anchored on firmware
//! entries and runtime-library calls. Loop pairing lives here: `FOR` and
//! `WHILE` push a [`LoopContext`], `NEXT` and `WEND` pop one and verify
//! it, and a mismatch is a fatal nesting error carrying the position of
//! the closing statement.

use crate::ast::{
    AssignTarget, DataValue, Expr, ExprKind, Pos, PrintItem, PrintSeparator, Statement,
    StatementKind, UnaryOp, VarRef,
};
use crate::codegen::error::CodeGenError;
use crate::semantic::ValueType;

use super::expr::infer_type;
use super::{firmware, int_operand, Emitter, LoopContext, StepSlot};

/// Loop comparison direction, decided by the step's sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

/// Constant value of a numeric literal expression, through grouping and
/// unary minus.
fn const_real(expr: &Expr) -> Option<f64> {
    match &expr.kind {
        ExprKind::RealLit(v) => Some(*v),
        ExprKind::IntegerLit(n) => Some(*n as f64),
        ExprKind::Grouped(inner) => const_real(inner),
        ExprKind::Unary {
            op: UnaryOp::Negate,
            operand,
        } => const_real(operand).map(|v| -v),
        _ => None,
    }
}

impl<'a> Emitter<'a> {
    /// Lowers one statement.
    pub(super) fn emit_statement(
        &mut self,
        stmt: &Statement,
        line_number: u16,
    ) -> Result<(), CodeGenError> {
        match &stmt.kind {
            StatementKind::Remark { text } => {
                if text.is_empty() {
                    self.code.push(";".to_string());
                } else {
                    self.code.push(format!("; {}", text));
                }
            }

            StatementKind::Label { name } => {
                self.code.push(format!("; LABEL {}", name));
            }

            StatementKind::Assign { target, value } => self.emit_assign(target, value)?,

            StatementKind::Call { address } => {
                if let Some(addr) = address.const_int() {
                    self.op("call", &format!("&{:04X}", addr as u16));
                } else {
                    self.eval_as_int(address, Some("CALL"))?;
                    self.need("calllib_jp_hl");
                    self.op("call", "calllib_jp_hl");
                }
            }

            StatementKind::Cls => self.fw("call", firmware::TXT_CLEAR_WINDOW),

            StatementKind::Data { values } => {
                let rendered = values.iter().map(render_data_value).collect();
                self.pool_data_line(line_number, rendered);
            }

            StatementKind::Dim { .. } => {
                // Reservation comes out of the symbol table; nothing to run.
            }

            StatementKind::Draw { x, y, pen } => {
                self.emit_graphics(x, y, pen.as_ref(), firmware::GRA_LINE_ABSOLUTE, "DRAW")?
            }
            StatementKind::Plot { x, y, pen } => {
                self.emit_graphics(x, y, pen.as_ref(), firmware::GRA_PLOT_ABSOLUTE, "PLOT")?
            }

            StatementKind::End => self.op("jp", "0"),

            StatementKind::For {
                var,
                from,
                to,
                step,
            } => self.emit_for(var, from, to, step.as_ref(), stmt.pos)?,

            StatementKind::Next { var } => self.emit_next(var.as_ref(), stmt.pos)?,

            StatementKind::While { condition } => self.emit_while(condition, stmt.pos)?,

            StatementKind::Wend => self.emit_wend(stmt.pos)?,

            StatementKind::Gosub { target } => {
                let label = self.symbols.target_label(target).ok_or_else(|| {
                    CodeGenError::Unresolved {
                        message: format!("no such line: {}", target),
                        pos: stmt.pos,
                    }
                })?;
                self.op("call", &label);
            }

            StatementKind::Goto { target } => {
                let label = self.symbols.target_label(target).ok_or_else(|| {
                    CodeGenError::Unresolved {
                        message: format!("no such line: {}", target),
                        pos: stmt.pos,
                    }
                })?;
                self.op("jp", &label);
            }

            StatementKind::Return => self.op("ret", ""),

            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            } => self.emit_if(condition, then_branch, else_branch.as_deref(), line_number)?,

            StatementKind::Input { prompt, vars } => self.emit_input(prompt.as_deref(), vars)?,

            StatementKind::Locate { col, row } => {
                self.eval_as_int(col, Some("LOCATE"))?;
                self.op("push", "hl");
                self.eval_as_int(row, Some("LOCATE"))?;
                self.op("pop", "de");
                self.op("ld", "h,e");
                self.fw("call", firmware::TXT_SET_CURSOR);
            }

            StatementKind::Mode { mode } => {
                self.eval_as_int(mode, Some("MODE"))?;
                self.op("ld", "a,l");
                self.fw("call", firmware::SCR_SET_MODE);
            }

            StatementKind::Paper { ink } => {
                self.eval_as_int(ink, Some("PAPER"))?;
                self.op("ld", "a,l");
                self.fw("call", firmware::TXT_SET_PAPER);
            }

            StatementKind::Pen { ink } => {
                self.eval_as_int(ink, Some("PEN"))?;
                self.op("ld", "a,l");
                self.fw("call", firmware::TXT_SET_PEN);
            }

            StatementKind::Poke { address, value } => {
                self.eval_as_int(address, Some("POKE"))?;
                self.op("push", "hl");
                self.eval_as_int(value, Some("POKE"))?;
                self.op("ld", "a,l");
                self.op("pop", "hl");
                self.op("ld", "(hl),a");
            }

            StatementKind::Print { items, newline } => self.emit_print(items, *newline)?,

            StatementKind::Read { vars } => self.emit_read(vars)?,

            StatementKind::Restore { target } => {
                let label = self.restore_label(target.as_ref(), stmt.pos)?;
                self.touch_data_machinery();
                self.op("ld", &format!("hl,{}", label));
                self.op("ld", "(__datalib_ptr),hl");
            }

            StatementKind::Symbol { code, rows } => self.emit_symbol(code, rows)?,

            StatementKind::SymbolAfter { first } => {
                let table = self.alloc_symbol_table(*first);
                self.op("ld", &format!("hl,{}", int_operand(*first)));
                self.op("ld", &format!("de,{}", table));
                self.fw("call", firmware::TXT_SET_M_TABLE);
            }
        }
        Ok(())
    }

    // ==================== Assignment ====================

    fn emit_assign(&mut self, target: &AssignTarget, value: &Expr) -> Result<(), CodeGenError> {
        match target {
            AssignTarget::Variable(var) => {
                let ty = self.variable_type(var);
                let label = format!("var_{}", var.base);
                self.symbols.mark_referenced(&var.base);
                match ty {
                    ValueType::Integer => {
                        self.eval_as_int(value, None)?;
                        self.op("ld", &format!("({}),hl", label));
                    }
                    ValueType::Real => {
                        self.store_real_into(value, &label)?;
                    }
                    ValueType::String => {
                        self.expect_string(value)?;
                        self.eval_expr(value)?;
                        self.op("ex", "de,hl");
                        self.op("ld", &format!("hl,{}", label));
                        self.need("strlib_copy");
                        self.op("call", "strlib_strcopy");
                    }
                }
            }
            AssignTarget::Element { var, index } => {
                let ty = self.element_addr(var, index)?;
                match ty {
                    ValueType::Integer => {
                        self.op("push", "hl");
                        self.eval_as_int(value, None)?;
                        self.op("ex", "de,hl");
                        self.op("pop", "hl");
                        self.op("ld", "(hl),e");
                        self.op("inc", "hl");
                        self.op("ld", "(hl),d");
                    }
                    ValueType::Real => {
                        self.op("push", "hl");
                        self.eval_as_real(value)?;
                        self.op("pop", "de");
                        self.fw("call", firmware::MATH_MOVE_REAL);
                    }
                    ValueType::String => {
                        self.expect_string(value)?;
                        self.op("push", "hl");
                        self.eval_expr(value)?;
                        self.op("ex", "de,hl");
                        self.op("pop", "hl");
                        self.need("strlib_copy");
                        self.op("call", "strlib_strcopy");
                    }
                }
            }
        }
        Ok(())
    }

    /// Evaluates `value` and stores it as a real at `label`, promoting
    /// integers on the way.
    fn store_real_into(&mut self, value: &Expr, label: &str) -> Result<(), CodeGenError> {
        match infer_type(self.symbols, value)? {
            ValueType::Integer => {
                self.eval_expr(value)?;
                self.op("ld", &format!("de,{}", label));
                self.need("reallib_int2real");
                self.op("call", "reallib_int2real");
            }
            ValueType::Real => {
                self.eval_expr(value)?;
                self.op("ld", &format!("de,{}", label));
                self.fw("call", firmware::MATH_MOVE_REAL);
            }
            ValueType::String => {
                return Err(CodeGenError::type_error(
                    "cannot assign a string to a numeric variable",
                    value.pos,
                ));
            }
        }
        Ok(())
    }

    fn expect_string(&mut self, value: &Expr) -> Result<(), CodeGenError> {
        if infer_type(self.symbols, value)? != ValueType::String {
            return Err(CodeGenError::type_error(
                "cannot assign a number to a string variable",
                value.pos,
            ));
        }
        Ok(())
    }

    fn variable_type(&self, var: &VarRef) -> ValueType {
        self.symbols
            .variable(&var.base)
            .map(|s| s.ty)
            .unwrap_or(ValueType::Real)
    }

    // ==================== Control flow ====================

    fn emit_if(
        &mut self,
        condition: &Expr,
        then_branch: &[Statement],
        else_branch: Option<&[Statement]>,
        line_number: u16,
    ) -> Result<(), CodeGenError> {
        if infer_type(self.symbols, condition)? == ValueType::String {
            return Err(CodeGenError::type_error(
                "IF condition cannot be a string",
                condition.pos,
            ));
        }
        self.eval_as_int(condition, None)?;
        self.op("ld", "a,h");
        self.op("or", "l");

        let end = self.new_label("if_end");
        match else_branch {
            Some(else_stmts) => {
                let else_label = self.new_label("if_else");
                self.op("jp", &format!("z,{}", else_label));
                for stmt in then_branch {
                    self.emit_statement(stmt, line_number)?;
                }
                self.op("jp", &end);
                self.emit_label(&else_label);
                for stmt in else_stmts {
                    self.emit_statement(stmt, line_number)?;
                }
            }
            None => {
                self.op("jp", &format!("z,{}", end));
                for stmt in then_branch {
                    self.emit_statement(stmt, line_number)?;
                }
            }
        }
        self.emit_label(&end);
        Ok(())
    }

    fn emit_for(
        &mut self,
        var: &VarRef,
        from: &Expr,
        to: &Expr,
        step: Option<&Expr>,
        pos: Pos,
    ) -> Result<(), CodeGenError> {
        let var_ty = self.variable_type(var);
        if var_ty == ValueType::String {
            return Err(CodeGenError::type_error(
                "FOR index cannot be a string variable",
                var.pos,
            ));
        }
        let var_label = format!("var_{}", var.base);
        self.symbols.mark_referenced(&var.base);

        let head = self.new_label("for_head");
        let exit = self.new_label("for_exit");

        let slot = if var_ty == ValueType::Integer {
            // Index, then limit into a fresh word.
            self.eval_as_int(from, None)?;
            self.op("ld", &format!("({}),hl", var_label));
            let limit = self.alloc_tmp("dw 0");
            self.eval_as_int(to, None)?;
            self.op("ld", &format!("({}),hl", limit));

            let slot = match step {
                None => StepSlot::ConstInt(1),
                Some(e) => match e.const_int() {
                    Some(k) => StepSlot::ConstInt(k),
                    None => {
                        let tmp = self.alloc_tmp("dw 0");
                        self.eval_as_int(e, None)?;
                        self.op("ld", &format!("({}),hl", tmp));
                        StepSlot::IntTemp(tmp)
                    }
                },
            };

            self.emit_label(&head);
            match &slot {
                StepSlot::ConstInt(k) if *k < 0 => {
                    self.emit_int_compare(&var_label, &limit, &exit, Direction::Down)
                }
                StepSlot::ConstInt(_) => {
                    self.emit_int_compare(&var_label, &limit, &exit, Direction::Up)
                }
                StepSlot::IntTemp(tmp) => {
                    let down = self.new_label("for_down");
                    let body = self.new_label("for_body");
                    self.op("ld", &format!("hl,({})", tmp));
                    self.op("bit", "7,h");
                    self.op("jr", &format!("nz,{}", down));
                    self.emit_int_compare(&var_label, &limit, &exit, Direction::Up);
                    self.op("jr", &body);
                    self.emit_label(&down);
                    self.emit_int_compare(&var_label, &limit, &exit, Direction::Down);
                    self.emit_label(&body);
                }
                _ => unreachable!("integer loop with a real step slot"),
            }
            slot
        } else {
            // Real index: value, limit, and step all live in 5-byte slots.
            self.store_real_into(from, &var_label)?;
            let limit = self.alloc_tmp("defs 5");
            self.store_real_into(to, &limit)?;

            let slot = match step.and_then(const_real) {
                Some(v) => StepSlot::ConstReal {
                    label: self.real_literal(v, pos)?,
                    negative: v < 0.0,
                },
                None => match step {
                    None => StepSlot::ConstReal {
                        label: self.real_literal(1.0, pos)?,
                        negative: false,
                    },
                    Some(e) => {
                        let tmp = self.alloc_tmp("defs 5");
                        self.store_real_into(e, &tmp)?;
                        StepSlot::RealTemp(tmp)
                    }
                },
            };

            self.emit_label(&head);
            match &slot {
                StepSlot::ConstReal { negative, .. } => {
                    let dir = if *negative { Direction::Down } else { Direction::Up };
                    self.emit_real_compare(&var_label, &limit, &exit, dir);
                }
                StepSlot::RealTemp(tmp) => {
                    let down = self.new_label("for_down");
                    let body = self.new_label("for_body");
                    self.op("ld", &format!("a,({}+3)", tmp));
                    self.op("rla", "");
                    self.op("jr", &format!("c,{}", down));
                    self.emit_real_compare(&var_label, &limit, &exit, Direction::Up);
                    self.op("jr", &body);
                    self.emit_label(&down);
                    self.emit_real_compare(&var_label, &limit, &exit, Direction::Down);
                    self.emit_label(&body);
                }
                _ => unreachable!("real loop with an integer step slot"),
            }
            slot
        };

        self.loop_stack.push(LoopContext::For {
            var: var.base.clone(),
            head,
            exit,
            step: slot,
            var_ty,
            pos,
        });
        Ok(())
    }

    /// In-range falls through; out-of-range jumps past the NEXT.
    fn emit_int_compare(&mut self, var: &str, limit: &str, exit: &str, dir: Direction) {
        self.need("comp16_signed");
        match dir {
            Direction::Up => {
                self.op("ld", &format!("hl,({})", limit));
                self.op("ld", &format!("de,({})", var));
            }
            Direction::Down => {
                self.op("ld", &format!("hl,({})", var));
                self.op("ld", &format!("de,({})", limit));
            }
        }
        self.op("call", "comp16_signed");
        self.op("jp", &format!("c,{}", exit));
    }

    fn emit_real_compare(&mut self, var: &str, limit: &str, exit: &str, dir: Direction) {
        self.op("ld", &format!("hl,{}", var));
        self.op("ld", &format!("de,{}", limit));
        self.fw("call", firmware::MATH_REAL_COMP);
        match dir {
            // Exit when index > limit.
            Direction::Up => self.op("cp", "1"),
            // Exit when index < limit.
            Direction::Down => self.op("cp", "&FF"),
        }
        self.op("jp", &format!("z,{}", exit));
    }

    fn emit_next(&mut self, var: Option<&VarRef>, pos: Pos) -> Result<(), CodeGenError> {
        let ctx = self.loop_stack.pop().ok_or_else(|| {
            CodeGenError::nesting("NEXT without FOR", pos)
        })?;
        let LoopContext::For {
            var: for_var,
            head,
            exit,
            step,
            var_ty,
            ..
        } = ctx
        else {
            return Err(CodeGenError::nesting("NEXT closes a WHILE", pos));
        };
        if let Some(given) = var {
            if given.base != for_var {
                return Err(CodeGenError::nesting(
                    format!("NEXT {} does not match FOR {}", given.base, for_var),
                    pos,
                ));
            }
        }

        let var_label = format!("var_{}", for_var);
        match var_ty {
            ValueType::Integer => {
                self.op("ld", &format!("hl,({})", var_label));
                match &step {
                    StepSlot::ConstInt(1) => self.op("inc", "hl"),
                    StepSlot::ConstInt(-1) => self.op("dec", "hl"),
                    StepSlot::ConstInt(k) => {
                        self.op("ld", &format!("de,{}", int_operand(*k)));
                        self.op("add", "hl,de");
                    }
                    StepSlot::IntTemp(tmp) => {
                        self.op("ld", &format!("de,({})", tmp));
                        self.op("add", "hl,de");
                    }
                    _ => unreachable!("integer loop with a real step slot"),
                }
                self.op("ld", &format!("({}),hl", var_label));
            }
            ValueType::Real => {
                let step_label = match &step {
                    StepSlot::ConstReal { label, .. } => label.clone(),
                    StepSlot::RealTemp(tmp) => tmp.clone(),
                    _ => unreachable!("real loop with an integer step slot"),
                };
                self.op("ld", &format!("hl,{}", var_label));
                self.op("ld", &format!("de,{}", step_label));
                self.fw("call", firmware::MATH_REAL_ADD);
            }
            ValueType::String => unreachable!("rejected at FOR"),
        }
        self.op("jp", &head);
        self.emit_label(&exit);
        Ok(())
    }

    fn emit_while(&mut self, condition: &Expr, pos: Pos) -> Result<(), CodeGenError> {
        if infer_type(self.symbols, condition)? == ValueType::String {
            return Err(CodeGenError::type_error(
                "WHILE condition cannot be a string",
                condition.pos,
            ));
        }
        let head = self.new_label("while_head");
        let exit = self.new_label("while_exit");
        self.emit_label(&head);
        self.eval_as_int(condition, None)?;
        self.op("ld", "a,h");
        self.op("or", "l");
        self.op("jp", &format!("z,{}", exit));
        self.loop_stack.push(LoopContext::While { head, exit, pos });
        Ok(())
    }

    fn emit_wend(&mut self, pos: Pos) -> Result<(), CodeGenError> {
        let ctx = self.loop_stack.pop().ok_or_else(|| {
            CodeGenError::nesting("WEND without WHILE", pos)
        })?;
        let LoopContext::While { head, exit, .. } = ctx else {
            return Err(CodeGenError::nesting("WEND closes a FOR", pos));
        };
        self.op("jp", &head);
        self.emit_label(&exit);
        Ok(())
    }

    // ==================== I/O ====================

    fn emit_print(&mut self, items: &[PrintItem], newline: bool) -> Result<(), CodeGenError> {
        for item in items {
            match infer_type(self.symbols, &item.expr)? {
                ValueType::Integer => {
                    self.eval_expr(&item.expr)?;
                    self.need("strlib_int2str");
                    self.op("call", "strlib_int2str");
                }
                ValueType::Real => {
                    self.eval_expr(&item.expr)?;
                    self.need("reallib_real2str");
                    self.op("call", "reallib_real2str");
                }
                ValueType::String => {
                    self.eval_expr(&item.expr)?;
                }
            }
            self.need("strlib_print_str");
            self.op("call", "strlib_print_str");

            if item.separator == Some(PrintSeparator::Comma) {
                self.need("strlib_print_zone");
                self.op("call", "strlib_print_zone");
            }
        }
        if newline {
            self.need("strlib_print_nl");
            self.op("call", "strlib_print_nl");
        }
        Ok(())
    }

    fn emit_input(&mut self, prompt: Option<&str>, vars: &[VarRef]) -> Result<(), CodeGenError> {
        if let Some(text) = prompt {
            let label = self.string_literal(text);
            self.need("strlib_print_str");
            self.op("ld", &format!("hl,{}", label));
            self.op("call", "strlib_print_str");
        }
        self.need("inputlib_input");
        self.need("strlib_print_str");
        self.op("ld", "hl,__inputlib_prompt");
        self.op("call", "strlib_print_str");
        self.op("call", "inputlib_input");
        self.op("ex", "de,hl");

        for (i, var) in vars.iter().enumerate() {
            let ty = self.variable_type(var);
            let label = format!("var_{}", var.base);
            self.symbols.mark_referenced(&var.base);
            self.need("strlib_dropspaces");
            self.op("call", "strlib_dropspaces");
            match ty {
                ValueType::Integer => {
                    self.need("strlib_str2int");
                    self.op("call", "strlib_str2int");
                    self.op("ld", &format!("({}),hl", label));
                }
                ValueType::Real => {
                    self.need("strlib_str2int");
                    self.op("call", "strlib_str2int");
                    self.op("push", "de");
                    self.op("ld", &format!("de,{}", label));
                    self.need("reallib_int2real");
                    self.op("call", "reallib_int2real");
                    self.op("pop", "de");
                }
                ValueType::String => {
                    self.need("inputlib_read_str");
                    self.op("ld", &format!("hl,{}", label));
                    self.op("call", "inputlib_read_str");
                }
            }
            if i + 1 < vars.len() {
                self.need("inputlib_next");
                self.op("call", "inputlib_next");
            }
        }
        Ok(())
    }

    fn emit_read(&mut self, vars: &[VarRef]) -> Result<(), CodeGenError> {
        self.touch_data_machinery();
        for var in vars {
            let ty = self.variable_type(var);
            let label = format!("var_{}", var.base);
            self.symbols.mark_referenced(&var.base);
            match ty {
                ValueType::Integer => {
                    self.op("ld", "de,(__datalib_ptr)");
                    self.op("push", "de");
                    self.need("strlib_str2int");
                    self.op("call", "strlib_str2int");
                    self.op("ld", &format!("({}),hl", label));
                    self.op("pop", "de");
                    self.need("datalib_next");
                    self.op("call", "datalib_next");
                    self.op("ld", "(__datalib_ptr),de");
                }
                ValueType::Real => {
                    self.op("ld", "de,(__datalib_ptr)");
                    self.op("push", "de");
                    self.need("strlib_str2int");
                    self.op("call", "strlib_str2int");
                    self.op("ld", &format!("de,{}", label));
                    self.need("reallib_int2real");
                    self.op("call", "reallib_int2real");
                    self.op("pop", "de");
                    self.need("datalib_next");
                    self.op("call", "datalib_next");
                    self.op("ld", "(__datalib_ptr),de");
                }
                ValueType::String => {
                    self.op("ld", "de,(__datalib_ptr)");
                    self.op("ld", &format!("hl,{}", label));
                    self.need("strlib_copy");
                    self.op("call", "strlib_strcopy");
                    self.op("ld", "(__datalib_ptr),de");
                }
            }
        }
        Ok(())
    }

    // ==================== Graphics and SYMBOL ====================

    fn emit_graphics(
        &mut self,
        x: &Expr,
        y: &Expr,
        pen: Option<&Expr>,
        entry: firmware::FirmwareCall,
        context: &str,
    ) -> Result<(), CodeGenError> {
        if let Some(pen) = pen {
            self.eval_as_int(pen, Some(context))?;
            self.op("ld", "a,l");
            self.fw("call", firmware::GRA_SET_PEN);
        }
        self.eval_as_int(x, Some(context))?;
        self.op("push", "hl");
        self.eval_as_int(y, Some(context))?;
        self.op("pop", "de");
        self.fw("call", entry);
        Ok(())
    }

    /// A fresh SYMBOL matrix label, kept apart from general temporaries.
    fn alloc_symbol_matrix(&mut self) -> String {
        let n = self.symbol_count;
        self.symbol_count += 1;
        format!("symbol_matrix_{}", n)
    }

    /// Reserves the character-generator table for SYMBOL AFTER.
    fn alloc_symbol_table(&mut self, first: i16) -> String {
        let n = self.symbol_count;
        self.symbol_count += 1;
        let label = format!("symbol_table_{}", n);
        let size = (256 - first as i32) * 8;
        self.data.push(format!("{}:\tdefs {} ; SYMBOL AFTER {}", label, size, first));
        label
    }

    fn emit_symbol(&mut self, code: &Expr, rows: &[Expr]) -> Result<(), CodeGenError> {
        let consts: Option<Vec<i16>> = rows.iter().map(|r| r.const_int()).collect();
        let matrix = match consts {
            Some(values) => {
                for (value, row) in values.iter().zip(rows) {
                    if !(0..=255).contains(value) {
                        return Err(CodeGenError::Range {
                            message: format!("SYMBOL row value {} out of range 0-255", value),
                            pos: row.pos,
                        });
                    }
                }
                let mut bytes: Vec<String> =
                    values.iter().map(|v| format!("&{:02X}", v)).collect();
                bytes.resize(8, "&00".to_string());
                let label = self.alloc_symbol_matrix();
                self.data.push(format!("{}:\tdb {}", label, bytes.join(",")));
                label
            }
            None => {
                let label = self.alloc_tmp("defs 8");
                for (i, row) in rows.iter().enumerate() {
                    self.eval_as_int(row, Some("SYMBOL"))?;
                    self.op("ld", "a,l");
                    if i == 0 {
                        self.op("ld", &format!("({}),a", label));
                    } else {
                        self.op("ld", &format!("({}+{}),a", label, i));
                    }
                }
                label
            }
        };
        self.eval_as_int(code, Some("SYMBOL"))?;
        self.op("ld", "a,l");
        self.op("ld", &format!("hl,{}", matrix));
        self.fw("call", firmware::TXT_SET_MATRIX);
        Ok(())
    }
}

/// One DATA constant as a pool line. Everything is stored as text and
/// converted by READ, so a single representation serves all three types.
fn render_data_value(value: &DataValue) -> String {
    let text = match value {
        DataValue::Integer(n) => n.to_string(),
        DataValue::Real(v) => v.to_string(),
        DataValue::Str(s) => s.clone(),
    };
    if text.is_empty() {
        "\tdb &00".to_string()
    } else {
        format!("\tdb \"{}\",&00", text)
    }
}
