//! Parser for basc.
//!
//! The parser transforms the token stream into an AST of numbered lines
//! and populates the symbol table along the way. It uses recursive
//! descent for statements and precedence climbing for expressions.
//!
//! # Line structure
//!
//! Each top-level step consumes a leading line number, then a
//! colon-separated statement sequence terminated by the end of the line.
//! Line numbers must strictly increase. Two kinds of lines are accepted
//! without a number: blank/comment lines (dropped) and bare `LABEL name`
//! lines, whose binding attaches to the next numbered line.
//!
//! # Statement sugar
//!
//! - `ident = expr` at statement start is an implicit `LET`;
//! - `ident :` at statement start binds a label, like `LABEL ident`;
//! - a bare integer after `THEN` or `ELSE` becomes an implicit `GOTO`.
//!
//! # What the parser does *not* do
//!
//! `FOR`/`NEXT` and `WHILE`/`WEND` are not paired here; the code
//! generator keeps the loop stack and reports nesting errors. The parser
//! also leaves expression types alone; inference happens bottom-up during
//! code generation.
//!
//! # Failure
//!
//! The first syntactic mismatch aborts parsing with the position, the
//! expected construct, and the found token. There is no error recovery.

mod error;

pub use error::ParseError;

use crate::ast::{
    AssignTarget, BinaryOp, Builtin, DataValue, DimDecl, Expr, ExprKind, Line, LineTarget, Pos,
    PrintItem, PrintSeparator, Program, Statement, StatementKind, UnaryOp, VarRef,
};
use crate::lexer::{Token, TokenKind, TokenValue};
use crate::semantic::SymbolTable;

/// Parser for a token stream ending in `EndOfFile`.
pub struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
    symbols: SymbolTable,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given tokens.
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            current: 0,
            symbols: SymbolTable::new(),
        }
    }

    /// Parses the whole program. On success the symbol table holds every
    /// variable, line number, alias, and recorded branch target.
    pub fn parse(mut self) -> Result<(Program, SymbolTable), ParseError> {
        let mut lines = Vec::new();
        let mut pending_labels: Vec<(String, Pos)> = Vec::new();
        let mut previous_number: Option<u16> = None;

        loop {
            // Blank lines and un-numbered comment lines carry no code.
            if self.check(TokenKind::EndOfLine) {
                self.advance();
                continue;
            }
            if self.check(TokenKind::Remark) && self.peek_ahead(1).kind == TokenKind::EndOfLine {
                self.advance();
                self.advance();
                continue;
            }
            if self.check(TokenKind::EndOfFile) {
                break;
            }

            match self.peek().kind {
                TokenKind::IntegerLiteral => {
                    let number_token = self.advance().clone();
                    let pos = token_pos(&number_token);
                    let number = number_token.int_value().unwrap_or(0);
                    if number <= 0 {
                        return Err(ParseError::OutOfRange {
                            message: format!("line number {} out of range", number),
                            line: pos.line,
                            column: pos.column,
                        });
                    }
                    let number = number as u16;
                    if let Some(previous) = previous_number {
                        if number <= previous {
                            return Err(ParseError::LineNumberOrder {
                                number,
                                previous,
                                line: pos.line,
                                column: pos.column,
                            });
                        }
                    }
                    self.symbols.add_line(number);

                    let mut statements = Vec::new();
                    for (name, label_pos) in pending_labels.drain(..) {
                        self.symbols.add_alias(&name, number, label_pos)?;
                        statements.push(Statement::new(StatementKind::Label { name }, label_pos));
                    }
                    self.parse_statements_until_eol(&mut statements, number)?;

                    lines.push(Line::new(number, statements, pos));
                    previous_number = Some(number);
                }
                TokenKind::Label => {
                    // Bare LABEL line: binds to the next numbered line.
                    self.advance();
                    let name_token = self.expect(TokenKind::Identifier, "label name")?;
                    pending_labels
                        .push((name_token.text.to_ascii_uppercase(), token_pos(&name_token)));
                    self.expect(TokenKind::EndOfLine, "end of line")?;
                }
                _ => {
                    let found = self.peek();
                    return Err(ParseError::MissingLineNumber {
                        line: found.line,
                        column: found.column,
                    });
                }
            }
        }

        if let Some((name, pos)) = pending_labels.into_iter().next() {
            return Err(ParseError::DanglingLabel {
                name,
                line: pos.line,
                column: pos.column,
            });
        }

        Ok((Program::new(lines), self.symbols))
    }

    // ==================== Token Navigation ====================

    /// The current token. The stream always ends in `EndOfFile`, so this
    /// never runs off the end.
    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    /// Looks ahead n tokens (0 = current token), clamping at `EndOfFile`.
    fn peek_ahead(&self, n: usize) -> &Token {
        &self.tokens[(self.current + n).min(self.tokens.len() - 1)]
    }

    /// Consumes and returns the current token.
    fn advance(&mut self) -> &Token {
        let token = &self.tokens[self.current.min(self.tokens.len() - 1)];
        if self.current < self.tokens.len() - 1 {
            self.current += 1;
        }
        token
    }

    /// True if the current token has the given kind.
    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// Consumes the current token if it matches; reports whether it did.
    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes a token of the given kind or fails with what was found.
    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance().clone())
        } else {
            Err(ParseError::unexpected(expected, self.peek()))
        }
    }

    /// True at the points that end a statement.
    fn at_statement_end(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::EndOfLine | TokenKind::EndOfFile | TokenKind::Colon | TokenKind::Else
        )
    }

    // ==================== Lines and Statements ====================

    /// Parses the colon-separated statements of one numbered line,
    /// consuming the terminating end-of-line token.
    fn parse_statements_until_eol(
        &mut self,
        out: &mut Vec<Statement>,
        line_number: u16,
    ) -> Result<(), ParseError> {
        loop {
            if self.match_token(TokenKind::EndOfLine) {
                return Ok(());
            }
            self.parse_statement(out, line_number)?;
            if self.match_token(TokenKind::Colon) {
                continue;
            }
            self.expect(TokenKind::EndOfLine, "':' or end of line")?;
            return Ok(());
        }
    }

    /// Parses one statement, appending it (or, for DIM lists, several) to
    /// `out`.
    fn parse_statement(
        &mut self,
        out: &mut Vec<Statement>,
        line_number: u16,
    ) -> Result<(), ParseError> {
        let token = self.peek().clone();
        let pos = token_pos(&token);

        let stmt = match token.kind {
            TokenKind::Remark => {
                self.advance();
                Statement::new(
                    StatementKind::Remark {
                        text: remark_text(&token.text),
                    },
                    pos,
                )
            }

            TokenKind::Identifier => self.parse_identifier_statement(pos, line_number)?,
            TokenKind::Let => {
                self.advance();
                let start = self.peek().clone();
                if start.kind != TokenKind::Identifier {
                    return Err(ParseError::unexpected("variable name", &start));
                }
                self.parse_identifier_statement(pos, line_number)?
            }

            TokenKind::Call => {
                self.advance();
                let address = self.parse_expression()?;
                if self.check(TokenKind::Comma) {
                    return Err(ParseError::Unsupported {
                        keyword: "CALL with parameters".to_string(),
                        line: pos.line,
                        column: pos.column,
                    });
                }
                Statement::new(StatementKind::Call { address }, pos)
            }
            TokenKind::Cls => {
                self.advance();
                Statement::new(StatementKind::Cls, pos)
            }
            TokenKind::Data => self.parse_data(pos)?,
            TokenKind::Dim => self.parse_dim(pos)?,
            TokenKind::Draw => {
                self.advance();
                let (x, y, pen) = self.parse_coordinates()?;
                Statement::new(StatementKind::Draw { x, y, pen }, pos)
            }
            TokenKind::End => {
                self.advance();
                Statement::new(StatementKind::End, pos)
            }
            TokenKind::For => self.parse_for(pos)?,
            TokenKind::Gosub => {
                self.advance();
                let target = self.parse_line_target()?;
                Statement::new(StatementKind::Gosub { target }, pos)
            }
            TokenKind::Goto => {
                self.advance();
                let target = self.parse_line_target()?;
                Statement::new(StatementKind::Goto { target }, pos)
            }
            TokenKind::If => self.parse_if(pos, line_number)?,
            TokenKind::Input => self.parse_input(pos)?,
            TokenKind::Label => {
                self.advance();
                let name_token = self.expect(TokenKind::Identifier, "label name")?;
                let name = name_token.text.to_ascii_uppercase();
                self.symbols
                    .add_alias(&name, line_number, token_pos(&name_token))?;
                Statement::new(StatementKind::Label { name }, pos)
            }
            TokenKind::Locate => {
                self.advance();
                let col = self.parse_expression()?;
                self.expect(TokenKind::Comma, "','")?;
                let row = self.parse_expression()?;
                Statement::new(StatementKind::Locate { col, row }, pos)
            }
            TokenKind::Mode => {
                self.advance();
                let mode = self.parse_expression()?;
                Statement::new(StatementKind::Mode { mode }, pos)
            }
            TokenKind::Next => {
                self.advance();
                let var = if self.check(TokenKind::Identifier) {
                    let token = self.advance().clone();
                    let var = VarRef::from_spelling(&token.text, token_pos(&token));
                    self.symbols.touch_variable(&var, false)?;
                    Some(var)
                } else {
                    None
                };
                Statement::new(StatementKind::Next { var }, pos)
            }
            TokenKind::Paper => {
                self.advance();
                let ink = self.parse_expression()?;
                Statement::new(StatementKind::Paper { ink }, pos)
            }
            TokenKind::Pen => {
                self.advance();
                let ink = self.parse_expression()?;
                Statement::new(StatementKind::Pen { ink }, pos)
            }
            TokenKind::Plot => {
                self.advance();
                let (x, y, pen) = self.parse_coordinates()?;
                Statement::new(StatementKind::Plot { x, y, pen }, pos)
            }
            TokenKind::Poke => {
                self.advance();
                let address = self.parse_expression()?;
                self.expect(TokenKind::Comma, "','")?;
                let value = self.parse_expression()?;
                Statement::new(StatementKind::Poke { address, value }, pos)
            }
            TokenKind::Print => self.parse_print(pos)?,
            TokenKind::Read => self.parse_read(pos)?,
            TokenKind::Restore => {
                self.advance();
                let target = if matches!(
                    self.peek().kind,
                    TokenKind::IntegerLiteral | TokenKind::Identifier
                ) {
                    Some(self.parse_line_target()?)
                } else {
                    None
                };
                Statement::new(StatementKind::Restore { target }, pos)
            }
            TokenKind::Return => {
                self.advance();
                Statement::new(StatementKind::Return, pos)
            }
            TokenKind::Symbol => self.parse_symbol(pos)?,
            TokenKind::Wend => {
                self.advance();
                Statement::new(StatementKind::Wend, pos)
            }
            TokenKind::While => {
                self.advance();
                let condition = self.parse_expression()?;
                Statement::new(StatementKind::While { condition }, pos)
            }

            TokenKind::UnsupportedKeyword => {
                return Err(ParseError::unsupported(&token));
            }
            _ => {
                return Err(ParseError::unexpected("statement", &token));
            }
        };

        out.push(stmt);
        Ok(())
    }

    /// A statement starting with an identifier: assignment, array element
    /// assignment, or an `ident :` label binding.
    fn parse_identifier_statement(
        &mut self,
        pos: Pos,
        line_number: u16,
    ) -> Result<Statement, ParseError> {
        match self.peek_ahead(1).kind {
            TokenKind::Equals => {
                let token = self.advance().clone();
                let var = VarRef::from_spelling(&token.text, token_pos(&token));
                self.symbols.touch_variable(&var, false)?;
                self.advance(); // '='
                let value = self.parse_expression()?;
                Ok(Statement::new(
                    StatementKind::Assign {
                        target: AssignTarget::Variable(var),
                        value,
                    },
                    pos,
                ))
            }
            TokenKind::LeftParen => {
                let token = self.advance().clone();
                let var = VarRef::from_spelling(&token.text, token_pos(&token));
                self.symbols.touch_variable(&var, true)?;
                self.advance(); // '('
                let index = self.parse_expression()?;
                self.expect(TokenKind::RightParen, "')'")?;
                self.expect(TokenKind::Equals, "'='")?;
                let value = self.parse_expression()?;
                Ok(Statement::new(
                    StatementKind::Assign {
                        target: AssignTarget::Element {
                            var,
                            index: Box::new(index),
                        },
                        value,
                    },
                    pos,
                ))
            }
            TokenKind::Colon => {
                // Label binding; the colon stays put and doubles as the
                // statement separator.
                let token = self.advance().clone();
                let name = token.text.to_ascii_uppercase();
                self.symbols.add_alias(&name, line_number, pos)?;
                Ok(Statement::new(StatementKind::Label { name }, pos))
            }
            _ => Err(ParseError::unexpected(
                "'=', '(' or ':' after identifier",
                self.peek_ahead(1),
            )),
        }
    }

    /// `DATA c1, c2, ...` with numeric and quoted-string constants.
    fn parse_data(&mut self, pos: Pos) -> Result<Statement, ParseError> {
        self.advance();
        let mut values = Vec::new();
        loop {
            let negate = self.match_token(TokenKind::Minus);
            let token = self.advance().clone();
            let value = match (&token.kind, &token.value) {
                (TokenKind::IntegerLiteral, TokenValue::Integer(n))
                | (TokenKind::HexLiteral, TokenValue::Integer(n))
                | (TokenKind::BinaryLiteral, TokenValue::Integer(n)) => {
                    DataValue::Integer(if negate { n.wrapping_neg() } else { *n })
                }
                (TokenKind::RealLiteral, TokenValue::Real(v)) => {
                    DataValue::Real(if negate { -v } else { *v })
                }
                (TokenKind::StringLiteral, TokenValue::Str(s)) if !negate => {
                    DataValue::Str(s.clone())
                }
                _ => return Err(ParseError::unexpected("DATA constant", &token)),
            };
            values.push(value);
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }
        Ok(Statement::new(StatementKind::Data { values }, pos))
    }

    /// `DIM a(n) [, b(m) ...]`, bounds constant, one dimension each.
    fn parse_dim(&mut self, pos: Pos) -> Result<Statement, ParseError> {
        self.advance();
        let mut arrays = Vec::new();
        loop {
            let name_token = self.expect(TokenKind::Identifier, "array name")?;
            let var = VarRef::from_spelling(&name_token.text, token_pos(&name_token));
            self.expect(TokenKind::LeftParen, "'('")?;
            let bound_expr = self.parse_expression()?;
            if self.check(TokenKind::Comma) {
                return Err(ParseError::Unsupported {
                    keyword: "multi-dimensional arrays".to_string(),
                    line: pos.line,
                    column: pos.column,
                });
            }
            self.expect(TokenKind::RightParen, "')'")?;

            let bound = bound_expr.const_int().ok_or_else(|| ParseError::OutOfRange {
                message: "DIM bound must be a constant".to_string(),
                line: bound_expr.pos.line,
                column: bound_expr.pos.column,
            })?;
            if bound < 0 {
                return Err(ParseError::OutOfRange {
                    message: format!("DIM bound {} is negative", bound),
                    line: bound_expr.pos.line,
                    column: bound_expr.pos.column,
                });
            }
            self.symbols.declare_array(&var, bound)?;
            arrays.push(DimDecl { var, bound });

            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }
        Ok(Statement::new(StatementKind::Dim { arrays }, pos))
    }

    /// `FOR var = from TO to [STEP step]`
    fn parse_for(&mut self, pos: Pos) -> Result<Statement, ParseError> {
        self.advance();
        let name_token = self.expect(TokenKind::Identifier, "loop variable")?;
        let var = VarRef::from_spelling(&name_token.text, token_pos(&name_token));
        self.symbols.touch_variable(&var, false)?;
        self.expect(TokenKind::Equals, "'='")?;
        let from = self.parse_expression()?;
        self.expect(TokenKind::To, "TO")?;
        let to = self.parse_expression()?;
        let step = if self.match_token(TokenKind::Step) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        Ok(Statement::new(
            StatementKind::For {
                var,
                from,
                to,
                step,
            },
            pos,
        ))
    }

    /// `IF cond THEN ... [ELSE ...]`; bare integers become implicit GOTOs.
    fn parse_if(&mut self, pos: Pos, line_number: u16) -> Result<Statement, ParseError> {
        self.advance();
        let condition = self.parse_expression()?;
        self.expect(TokenKind::Then, "THEN")?;

        let then_branch = self.parse_branch(line_number)?;
        let else_branch = if self.match_token(TokenKind::Else) {
            Some(self.parse_branch(line_number)?)
        } else {
            None
        };

        Ok(Statement::new(
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            },
            pos,
        ))
    }

    /// One IF branch: an implicit GOTO for a bare integer, otherwise
    /// statements up to ELSE or end of line.
    fn parse_branch(&mut self, line_number: u16) -> Result<Vec<Statement>, ParseError> {
        if self.check(TokenKind::IntegerLiteral) {
            let token = self.advance().clone();
            let pos = token_pos(&token);
            let target = LineTarget::Number(token.int_value().unwrap_or(0) as u16);
            self.symbols.record_target(&target, pos);
            return Ok(vec![Statement::new(StatementKind::Goto { target }, pos)]);
        }

        let mut stmts = Vec::new();
        loop {
            self.parse_statement(&mut stmts, line_number)?;
            if self.check(TokenKind::Colon) {
                self.advance();
                if self.check(TokenKind::Else) {
                    break;
                }
                continue;
            }
            break;
        }
        Ok(stmts)
    }

    /// `INPUT ["prompt";] var [, var ...]`
    fn parse_input(&mut self, pos: Pos) -> Result<Statement, ParseError> {
        self.advance();
        let prompt = if self.check(TokenKind::StringLiteral) {
            let token = self.advance().clone();
            if !self.match_token(TokenKind::Semicolon) {
                self.expect(TokenKind::Comma, "';' or ',' after INPUT prompt")?;
            }
            match token.value {
                TokenValue::Str(s) => Some(s),
                _ => None,
            }
        } else {
            None
        };

        let mut vars = Vec::new();
        loop {
            let name_token = self.expect(TokenKind::Identifier, "variable name")?;
            let var = VarRef::from_spelling(&name_token.text, token_pos(&name_token));
            self.symbols.touch_variable(&var, false)?;
            vars.push(var);
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }
        Ok(Statement::new(StatementKind::Input { prompt, vars }, pos))
    }

    /// `PRINT [items]` with `;` and `,` separators.
    fn parse_print(&mut self, pos: Pos) -> Result<Statement, ParseError> {
        self.advance();
        let mut items: Vec<PrintItem> = Vec::new();
        let mut newline = true;

        while !self.at_statement_end() {
            if self.check(TokenKind::Semicolon) || self.check(TokenKind::Comma) {
                let sep = if self.match_token(TokenKind::Semicolon) {
                    PrintSeparator::Semicolon
                } else {
                    self.advance();
                    PrintSeparator::Comma
                };
                if let Some(last) = items.last_mut() {
                    last.separator = Some(sep);
                }
                if self.at_statement_end() {
                    // Trailing separator: the cursor stays where the
                    // separator left it.
                    newline = false;
                    break;
                }
                continue;
            }

            let expr = self.parse_expression()?;
            items.push(PrintItem {
                expr,
                separator: None,
            });
        }

        Ok(Statement::new(StatementKind::Print { items, newline }, pos))
    }

    /// `READ var [, var ...]`
    fn parse_read(&mut self, pos: Pos) -> Result<Statement, ParseError> {
        self.advance();
        let mut vars = Vec::new();
        loop {
            let name_token = self.expect(TokenKind::Identifier, "variable name")?;
            let var = VarRef::from_spelling(&name_token.text, token_pos(&name_token));
            self.symbols.touch_variable(&var, false)?;
            vars.push(var);
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }
        Ok(Statement::new(StatementKind::Read { vars }, pos))
    }

    /// `SYMBOL AFTER n` or `SYMBOL code, r1 [, ... r8]`
    fn parse_symbol(&mut self, pos: Pos) -> Result<Statement, ParseError> {
        self.advance();
        if self.match_token(TokenKind::After) {
            let first_expr = self.parse_expression()?;
            let first = first_expr.const_int().ok_or_else(|| ParseError::UnexpectedToken {
                expected: "constant after SYMBOL AFTER".to_string(),
                found: "expression".to_string(),
                line: first_expr.pos.line,
                column: first_expr.pos.column,
            })?;
            if !(0..=255).contains(&first) {
                return Err(ParseError::OutOfRange {
                    message: format!("SYMBOL AFTER {} out of range 0-255", first),
                    line: first_expr.pos.line,
                    column: first_expr.pos.column,
                });
            }
            return Ok(Statement::new(StatementKind::SymbolAfter { first }, pos));
        }

        let code = self.parse_expression()?;
        let mut rows = Vec::new();
        while self.match_token(TokenKind::Comma) {
            rows.push(self.parse_expression()?);
        }
        if rows.is_empty() || rows.len() > 8 {
            return Err(ParseError::OutOfRange {
                message: format!("SYMBOL takes 1 to 8 matrix rows, got {}", rows.len()),
                line: pos.line,
                column: pos.column,
            });
        }
        Ok(Statement::new(StatementKind::Symbol { code, rows }, pos))
    }

    /// `x, y [, pen]` operands of PLOT and DRAW.
    fn parse_coordinates(&mut self) -> Result<(Expr, Expr, Option<Expr>), ParseError> {
        let x = self.parse_expression()?;
        self.expect(TokenKind::Comma, "','")?;
        let y = self.parse_expression()?;
        let pen = if self.match_token(TokenKind::Comma) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        Ok((x, y, pen))
    }

    /// A branch destination: a line number or a LABEL alias. Recorded in
    /// the symbol table for the post-parse resolution check.
    fn parse_line_target(&mut self) -> Result<LineTarget, ParseError> {
        let token = self.peek().clone();
        let target = match token.kind {
            TokenKind::IntegerLiteral => {
                self.advance();
                LineTarget::Number(token.int_value().unwrap_or(0) as u16)
            }
            TokenKind::Identifier => {
                self.advance();
                LineTarget::Name(token.text.to_ascii_uppercase())
            }
            _ => return Err(ParseError::unexpected("line number or label", &token)),
        };
        self.symbols.record_target(&target, token_pos(&token));
        Ok(target)
    }

    // ==================== Expression Parsing ====================

    /// Parses an expression at the lowest precedence level.
    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(1)
    }

    /// Precedence climbing over the binary operator table.
    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, ParseError> {
        let mut left = self.parse_prefix()?;

        while let Some((op, prec, right_assoc)) = binary_op(self.peek().kind) {
            if prec < min_prec {
                break;
            }
            self.advance();
            let next_min = if right_assoc { prec } else { prec + 1 };
            let right = self.parse_binary(next_min)?;
            let pos = left.pos;
            left = Expr::new(
                ExprKind::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                pos,
            );
        }
        Ok(left)
    }

    /// Unary operators, literals, variables, groups, and built-in calls.
    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek().clone();
        let pos = token_pos(&token);

        match token.kind {
            TokenKind::Minus => {
                self.advance();
                // Unary minus binds tighter than * and / but looser than ^.
                let operand = self.parse_binary(10)?;
                Ok(Expr::new(
                    ExprKind::Unary {
                        op: UnaryOp::Negate,
                        operand: Box::new(operand),
                    },
                    pos,
                ))
            }
            TokenKind::Not => {
                self.advance();
                // NOT sits just below the comparisons.
                let operand = self.parse_binary(5)?;
                Ok(Expr::new(
                    ExprKind::Unary {
                        op: UnaryOp::Not,
                        operand: Box::new(operand),
                    },
                    pos,
                ))
            }
            TokenKind::IntegerLiteral | TokenKind::HexLiteral | TokenKind::BinaryLiteral => {
                self.advance();
                match token.value {
                    TokenValue::Integer(n) => Ok(Expr::new(ExprKind::IntegerLit(n), pos)),
                    _ => Err(ParseError::unexpected("integer literal", &token)),
                }
            }
            TokenKind::RealLiteral => {
                self.advance();
                match token.value {
                    TokenValue::Real(v) => Ok(Expr::new(ExprKind::RealLit(v), pos)),
                    _ => Err(ParseError::unexpected("real literal", &token)),
                }
            }
            TokenKind::StringLiteral => {
                self.advance();
                match token.value {
                    TokenValue::Str(s) => Ok(Expr::new(ExprKind::StringLit(s), pos)),
                    _ => Err(ParseError::unexpected("string literal", &token)),
                }
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RightParen, "')'")?;
                Ok(Expr::new(ExprKind::Grouped(Box::new(inner)), pos))
            }
            TokenKind::Identifier => {
                self.advance();
                let var = VarRef::from_spelling(&token.text, pos);
                if self.check(TokenKind::LeftParen) {
                    self.symbols.touch_variable(&var, true)?;
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::RightParen, "')'")?;
                    Ok(Expr::new(
                        ExprKind::Element {
                            var,
                            index: Box::new(index),
                        },
                        pos,
                    ))
                } else {
                    self.symbols.touch_variable(&var, false)?;
                    Ok(Expr::new(ExprKind::Variable(var), pos))
                }
            }
            TokenKind::UnsupportedKeyword => Err(ParseError::unsupported(&token)),
            _ => {
                if let Some(func) = builtin_for(token.kind) {
                    self.advance();
                    self.parse_builtin_call(func, pos)
                } else {
                    Err(ParseError::unexpected("expression", &token))
                }
            }
        }
    }

    /// Arguments of a built-in function call; INKEY$ takes none and no
    /// parentheses.
    fn parse_builtin_call(&mut self, func: Builtin, pos: Pos) -> Result<Expr, ParseError> {
        let mut args = Vec::new();
        if func != Builtin::InkeyS {
            self.expect(TokenKind::LeftParen, "'('")?;
            loop {
                args.push(self.parse_expression()?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RightParen, "')'")?;
        }

        let (min, max) = func.arity();
        if args.len() < min || args.len() > max {
            return Err(ParseError::OutOfRange {
                message: format!(
                    "{} takes {} argument(s), got {}",
                    func.as_str(),
                    if min == max {
                        min.to_string()
                    } else {
                        format!("{}-{}", min, max)
                    },
                    args.len()
                ),
                line: pos.line,
                column: pos.column,
            });
        }
        Ok(Expr::new(ExprKind::Builtin { func, args }, pos))
    }
}

/// Position of a token as an AST position.
fn token_pos(token: &Token) -> Pos {
    Pos::new(token.line, token.column)
}

/// The comment body of a Remark token: the text after `'` or `REM `.
fn remark_text(text: &str) -> String {
    if let Some(rest) = text.strip_prefix('\'') {
        rest.to_string()
    } else {
        // REM, in whatever case, optionally followed by one separator.
        let rest = &text[3..];
        rest.strip_prefix([' ', '\t']).unwrap_or(rest).to_string()
    }
}

/// The binary operator table: (operator, precedence, right-associative).
fn binary_op(kind: TokenKind) -> Option<(BinaryOp, u8, bool)> {
    let entry = match kind {
        TokenKind::Xor => (BinaryOp::Xor, 1, false),
        TokenKind::Or => (BinaryOp::Or, 2, false),
        TokenKind::And => (BinaryOp::And, 3, false),
        TokenKind::Equals => (BinaryOp::Equal, 5, false),
        TokenKind::NotEquals => (BinaryOp::NotEqual, 5, false),
        TokenKind::LessThan => (BinaryOp::Less, 5, false),
        TokenKind::LessEquals => (BinaryOp::LessEqual, 5, false),
        TokenKind::GreaterThan => (BinaryOp::Greater, 5, false),
        TokenKind::GreaterEquals => (BinaryOp::GreaterEqual, 5, false),
        TokenKind::Plus => (BinaryOp::Add, 6, false),
        TokenKind::Minus => (BinaryOp::Subtract, 6, false),
        TokenKind::Mod => (BinaryOp::Modulo, 7, false),
        TokenKind::Star => (BinaryOp::Multiply, 8, false),
        TokenKind::Slash => (BinaryOp::Divide, 8, false),
        TokenKind::Caret => (BinaryOp::Power, 10, true),
        _ => return None,
    };
    Some(entry)
}

/// The built-in function for a function token, if it is one.
fn builtin_for(kind: TokenKind) -> Option<Builtin> {
    let func = match kind {
        TokenKind::Abs => Builtin::Abs,
        TokenKind::Asc => Builtin::Asc,
        TokenKind::ChrS => Builtin::ChrS,
        TokenKind::HexS => Builtin::HexS,
        TokenKind::InkeyS => Builtin::InkeyS,
        TokenKind::Int => Builtin::Int,
        TokenKind::Len => Builtin::Len,
        TokenKind::LeftS => Builtin::LeftS,
        TokenKind::MidS => Builtin::MidS,
        TokenKind::Peek => Builtin::Peek,
        TokenKind::RightS => Builtin::RightS,
        TokenKind::StrS => Builtin::StrS,
        TokenKind::Val => Builtin::Val,
        _ => return None,
    };
    Some(func)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::source::SourceFile;

    fn parse(text: &str) -> (Program, SymbolTable) {
        let src = SourceFile::from_text("test.bas", text);
        let tokens = tokenize(&src).expect("lex error");
        Parser::new(&tokens).parse().expect("parse error")
    }

    fn parse_err(text: &str) -> ParseError {
        let src = SourceFile::from_text("test.bas", text);
        let tokens = tokenize(&src).expect("lex error");
        Parser::new(&tokens).parse().expect_err("expected parse error")
    }

    #[test]
    fn test_hello_world_shape() {
        let (program, symbols) = parse("10 PRINT \"HELLO\"\n20 GOTO 20\n");
        assert_eq!(program.lines.len(), 2);
        assert_eq!(program.lines[0].number, 10);
        assert!(matches!(
            program.lines[0].statements[0].kind,
            StatementKind::Print { .. }
        ));
        assert!(symbols.has_line(20));
    }

    #[test]
    fn test_implicit_let() {
        let (program, symbols) = parse("10 X=5\n");
        match &program.lines[0].statements[0].kind {
            StatementKind::Assign {
                target: AssignTarget::Variable(var),
                ..
            } => assert_eq!(var.base, "X"),
            other => panic!("unexpected statement: {other:?}"),
        }
        assert!(symbols.variable("X").is_some());
    }

    #[test]
    fn test_colon_separates_statements() {
        let (program, _) = parse("10 CLS:MODE 2:PEN 1\n");
        assert_eq!(program.lines[0].statements.len(), 3);
    }

    #[test]
    fn test_line_numbers_must_increase() {
        let err = parse_err("20 CLS\n10 CLS\n");
        assert!(matches!(err, ParseError::LineNumberOrder { number: 10, previous: 20, .. }));
    }

    #[test]
    fn test_missing_line_number() {
        let err = parse_err("PRINT 1\n");
        assert!(matches!(err, ParseError::MissingLineNumber { line: 1, .. }));
    }

    #[test]
    fn test_precedence_mul_before_add() {
        let (program, _) = parse("10 X=1+2*3\n");
        let StatementKind::Assign { value, .. } = &program.lines[0].statements[0].kind else {
            panic!("not an assignment");
        };
        // 1 + (2 * 3)
        let ExprKind::Binary { op, right, .. } = &value.kind else {
            panic!("not binary");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(
            right.kind,
            ExprKind::Binary {
                op: BinaryOp::Multiply,
                ..
            }
        ));
    }

    #[test]
    fn test_power_is_right_associative() {
        let (program, _) = parse("10 X=2^3^2\n");
        let StatementKind::Assign { value, .. } = &program.lines[0].statements[0].kind else {
            panic!("not an assignment");
        };
        // 2 ^ (3 ^ 2)
        let ExprKind::Binary { op, right, .. } = &value.kind else {
            panic!("not binary");
        };
        assert_eq!(*op, BinaryOp::Power);
        assert!(matches!(
            right.kind,
            ExprKind::Binary {
                op: BinaryOp::Power,
                ..
            }
        ));
    }

    #[test]
    fn test_comparison_binds_below_additive() {
        let (program, _) = parse("10 X=1+2=3\n");
        let StatementKind::Assign { value, .. } = &program.lines[0].statements[0].kind else {
            panic!("not an assignment");
        };
        // (1+2) = 3
        let ExprKind::Binary { op, .. } = &value.kind else {
            panic!("not binary");
        };
        assert_eq!(*op, BinaryOp::Equal);
    }

    #[test]
    fn test_then_integer_rewrites_to_goto() {
        let (program, symbols) = parse("10 IF X=0 THEN 100 ELSE 200\n100 CLS\n200 CLS\n");
        let StatementKind::If {
            then_branch,
            else_branch,
            ..
        } = &program.lines[0].statements[0].kind
        else {
            panic!("not an IF");
        };
        assert!(matches!(
            then_branch[0].kind,
            StatementKind::Goto {
                target: LineTarget::Number(100)
            }
        ));
        assert!(matches!(
            else_branch.as_ref().unwrap()[0].kind,
            StatementKind::Goto {
                target: LineTarget::Number(200)
            }
        ));
        assert!(symbols.has_line(100));
    }

    #[test]
    fn test_if_then_statements_with_else() {
        let (program, _) = parse("10 IF A>0 THEN B=1:C=2 ELSE PRINT \"NO\"\n");
        let StatementKind::If {
            then_branch,
            else_branch,
            ..
        } = &program.lines[0].statements[0].kind
        else {
            panic!("not an IF");
        };
        assert_eq!(then_branch.len(), 2);
        assert_eq!(else_branch.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_for_next_are_independent() {
        let (program, _) = parse("10 FOR I=1 TO 10 STEP 2\n20 NEXT I\n");
        assert!(matches!(
            program.lines[0].statements[0].kind,
            StatementKind::For { step: Some(_), .. }
        ));
        assert!(matches!(
            program.lines[1].statements[0].kind,
            StatementKind::Next { var: Some(_) }
        ));
    }

    #[test]
    fn test_unsupported_keyword() {
        let err = parse_err("10 BORDER 0\n");
        match err {
            ParseError::Unsupported { keyword, line, .. } => {
                assert_eq!(keyword, "BORDER");
                assert_eq!(line, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_suffix_conflict_detected_at_parse() {
        let err = parse_err("10 A%=1\n20 A$=\"X\"\n");
        assert!(matches!(err, ParseError::Semantic(_)));
    }

    #[test]
    fn test_label_forms() {
        let (program, symbols) = parse("10 LABEL START\n20 MAIN: CLS\n30 GOTO MAIN\n");
        assert!(matches!(
            program.lines[0].statements[0].kind,
            StatementKind::Label { .. }
        ));
        assert!(matches!(
            program.lines[1].statements[0].kind,
            StatementKind::Label { .. }
        ));
        assert_eq!(
            symbols
                .target_label(&LineTarget::Name("MAIN".to_string()))
                .as_deref(),
            Some("__label_line_20")
        );
        assert_eq!(
            symbols
                .target_label(&LineTarget::Name("START".to_string()))
                .as_deref(),
            Some("__label_line_10")
        );
    }

    #[test]
    fn test_unnumbered_label_attaches_forward() {
        let (program, symbols) = parse("LABEL MAIN\n10 CLS\n20 GOTO MAIN\n");
        assert_eq!(program.lines.len(), 2);
        assert!(matches!(
            program.lines[0].statements[0].kind,
            StatementKind::Label { .. }
        ));
        assert_eq!(
            symbols
                .target_label(&LineTarget::Name("MAIN".to_string()))
                .as_deref(),
            Some("__label_line_10")
        );
    }

    #[test]
    fn test_print_trailing_semicolon() {
        let (program, _) = parse("10 PRINT X;\" \";\n");
        let StatementKind::Print { items, newline } = &program.lines[0].statements[0].kind else {
            panic!("not a PRINT");
        };
        assert_eq!(items.len(), 2);
        assert!(!newline);
    }

    #[test]
    fn test_empty_print() {
        let (program, _) = parse("10 PRINT\n");
        let StatementKind::Print { items, newline } = &program.lines[0].statements[0].kind else {
            panic!("not a PRINT");
        };
        assert!(items.is_empty());
        assert!(*newline);
    }

    #[test]
    fn test_symbol_after_and_matrix() {
        let (program, _) =
            parse("10 SYMBOL AFTER 240\n20 SYMBOL 240,&00,&00,&74,&7E,&6C,&70,&7C,&30\n");
        assert!(matches!(
            program.lines[0].statements[0].kind,
            StatementKind::SymbolAfter { first: 240 }
        ));
        let StatementKind::Symbol { rows, .. } = &program.lines[1].statements[0].kind else {
            panic!("not a SYMBOL");
        };
        assert_eq!(rows.len(), 8);
    }

    #[test]
    fn test_dim_and_element_access() {
        let (program, symbols) = parse("10 DIM A%(10),B(5)\n20 A%(3)=7\n30 X=A%(3)+B(0)\n");
        let StatementKind::Dim { arrays } = &program.lines[0].statements[0].kind else {
            panic!("not a DIM");
        };
        assert_eq!(arrays.len(), 2);
        assert_eq!(arrays[0].bound, 10);
        assert_eq!(symbols.variable("A").unwrap().array_bound, Some(10));
        assert!(symbols.variable("B").unwrap().used_as_array);
    }

    #[test]
    fn test_multidimensional_dim_unsupported() {
        let err = parse_err("10 DIM A(2,3)\n");
        assert!(matches!(err, ParseError::Unsupported { .. }));
    }

    #[test]
    fn test_data_read_restore() {
        let (program, _) = parse("10 DATA 1,-2,3.5,\"FOUR\"\n20 READ A%,B%\n30 RESTORE 10\n");
        let StatementKind::Data { values } = &program.lines[0].statements[0].kind else {
            panic!("not a DATA");
        };
        assert_eq!(values.len(), 4);
        assert_eq!(values[1], DataValue::Integer(-2));
        assert!(matches!(
            program.lines[2].statements[0].kind,
            StatementKind::Restore {
                target: Some(LineTarget::Number(10))
            }
        ));
    }

    #[test]
    fn test_input_with_prompt() {
        let (program, _) = parse("10 INPUT \"NAME\";N$\n");
        let StatementKind::Input { prompt, vars } = &program.lines[0].statements[0].kind else {
            panic!("not an INPUT");
        };
        assert_eq!(prompt.as_deref(), Some("NAME"));
        assert_eq!(vars.len(), 1);
    }

    #[test]
    fn test_builtin_arity_checked() {
        let err = parse_err("10 X=LEFT$(A$)\n");
        assert!(matches!(err, ParseError::OutOfRange { .. }));
    }

    #[test]
    fn test_first_mismatch_aborts() {
        let err = parse_err("10 FOR I=1 10\n");
        match err {
            ParseError::UnexpectedToken { expected, .. } => assert_eq!(expected, "TO"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    /// Printing a parsed program and re-parsing the text is a fixed
    /// point: the second rendering is byte-identical to the first.
    #[test]
    fn test_pretty_reparse_is_idempotent() {
        let sources = [
            "10 PRINT \"HELLO\"\n20 GOTO 20\n",
            "10 MODE 2\n20 FOR X=32 TO 255 STEP 2\n30 PRINT X;\" \";CHR$(X);\" \";\n40 NEXT X\n50 GOTO 50\n",
            "10 A%=5\n20 B!=A%+1.5\n30 IF B!>2 THEN PRINT B! ELSE PRINT -B!\n",
            "10 DIM T%(10)\n20 T%(3)=NOT 2*3\n30 DATA 1,-2,3.5,\"FOUR\"\n40 READ A%,B%\n50 RESTORE 30\n",
            "10 WHILE LEN(S$)<5\n20 S$=S$+MID$(\"ABCDEF\",2,3)\n30 WEND\n",
            "10 SYMBOL AFTER 240\n20 SYMBOL 240,&00,&74,&30\n30 REM all done\n",
        ];
        for source in sources {
            let (first, _) = parse(source);
            let rendered = first.to_string();
            let (second, _) = parse(&rendered);
            assert_eq!(second.to_string(), rendered, "not a fixed point for {source:?}");
        }
    }
}
