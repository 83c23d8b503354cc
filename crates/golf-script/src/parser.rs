//! Recursive-descent parser
//!
//! Precedence, lowest to highest:
//!
//! ```text
//! expr        := assignment
//! assignment  := comparison ("=" assignment)?
//! comparison  := term (("==" | "<=" | ">=" | "<" | ">") comparison)?
//! term        := factor (("+" | "-") factor)*
//! factor      := cast (("*" | "/") cast)*
//! cast        := "(" type ")" cast | postfix
//! postfix     := primary ("(" args ")" | "." symbol | "[" expr "]")*
//! primary     := int | float | string | symbol | "(" expr ")" | "[" args "]"
//! ```
//!
//! Comparisons recurse into `comparison` on the right, so `a < b < c`
//! parses as `a < (b < c)`. Existing generator scripts depend on this.

use crate::ast::{BinOp, Expr, ExprKind, FnDecl, Stmt, StmtKind};
use crate::error::{ParseError, Pos};
use crate::lexer::{Token, TokenKind};
use crate::value::ValType;
use std::rc::Rc;

type ParseResult<T> = Result<T, ParseError>;

pub struct Parser<'t> {
    toks: &'t [Token],
    i: usize,
}

impl<'t> Parser<'t> {
    /// `toks` must end with an EOF token, as produced by [`tokenize`](crate::lexer::tokenize)
    pub fn new(toks: &'t [Token]) -> Self {
        Self { toks, i: 0 }
    }

    /// Parse every top-level statement
    pub fn parse_program(mut self) -> ParseResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while !self.is_eof() {
            stmts.push(self.parse_stmt()?);
        }
        tracing::debug!("parsed {} top-level statements", stmts.len());
        Ok(stmts)
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn peek(&self) -> &Token {
        self.peek_n(0)
    }

    /// Look `n` tokens ahead; past the end this keeps returning EOF
    fn peek_n(&self, n: usize) -> &Token {
        let last = self.toks.len().saturating_sub(1);
        &self.toks[(self.i + n).min(last)]
    }

    fn pos(&self) -> Pos {
        self.peek().pos
    }

    fn is_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn bump(&mut self) -> &Token {
        let idx = self.i.min(self.toks.len().saturating_sub(1));
        if self.i < self.toks.len() {
            self.i += 1;
        }
        &self.toks[idx]
    }

    fn peek_char(&self, c: char) -> bool {
        self.peek().is_char(c)
    }

    fn eat_char(&mut self, c: char) -> bool {
        if self.peek_char(c) {
            self.i += 1;
            true
        } else {
            false
        }
    }

    fn expect_char(&mut self, c: char, ctx: &str) -> ParseResult<()> {
        if self.eat_char(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}' {}", c, ctx)))
        }
    }

    fn expect_symbol(&mut self, ctx: &str) -> ParseResult<String> {
        match self.peek().symbol() {
            Some(s) => {
                let s = s.to_string();
                self.i += 1;
                Ok(s)
            }
            None => Err(self.error(format!("expected identifier {}", ctx))),
        }
    }

    fn expect_type(&mut self, ctx: &str) -> ParseResult<ValType> {
        match self.peek_type(0) {
            Some(ty) => {
                self.i += 1;
                Ok(ty)
            }
            None => Err(self.error(format!("expected type {}", ctx))),
        }
    }

    fn peek_type(&self, n: usize) -> Option<ValType> {
        self.peek_n(n).symbol().and_then(ValType::from_name)
    }

    fn error(&self, message: String) -> ParseError {
        let tok = self.peek();
        ParseError::new(tok.pos, format!("{}, found {}", message, tok.describe()))
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        let pos = self.pos();
        if self.peek_char('{') {
            return self.parse_block();
        }
        if self.peek().is_symbol("if") {
            return self.parse_if();
        }
        if self.peek().is_symbol("for") {
            return self.parse_for();
        }
        if self.peek().is_symbol("return") {
            self.bump();
            let expr = if self.peek_char(';') {
                None
            } else {
                Some(self.parse_expr()?)
            };
            self.expect_char(';', "after return")?;
            return Ok(Stmt::new(StmtKind::Return { expr }, pos));
        }
        if self.peek_type(0).is_some() && self.peek_n(1).symbol().is_some() {
            if self.peek_n(2).is_char('(') {
                return self.parse_fn_decl();
            }
            return self.parse_var_decl();
        }

        let expr = self.parse_expr()?;
        self.expect_char(';', "after expression")?;
        Ok(Stmt::new(StmtKind::Expr { expr }, pos))
    }

    fn parse_block(&mut self) -> ParseResult<Stmt> {
        let pos = self.pos();
        let stmts = self.parse_block_body()?;
        Ok(Stmt::new(StmtKind::Block { stmts }, pos))
    }

    fn parse_block_body(&mut self) -> ParseResult<Vec<Stmt>> {
        self.expect_char('{', "to open block")?;
        let mut stmts = Vec::new();
        while !self.peek_char('}') {
            if self.is_eof() {
                return Err(self.error("expected '}' to close block".to_string()));
            }
            stmts.push(self.parse_stmt()?);
        }
        self.bump();
        Ok(stmts)
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        let pos = self.pos();
        let mut conds = Vec::new();
        let mut bodies = Vec::new();
        let mut else_body = None;

        self.bump();
        loop {
            self.expect_char('(', "after 'if'")?;
            conds.push(self.parse_expr()?);
            self.expect_char(')', "after if condition")?;
            bodies.push(self.parse_stmt()?);

            if !self.peek().is_symbol("else") {
                break;
            }
            self.bump();
            if self.peek().is_symbol("if") {
                self.bump();
                continue;
            }
            else_body = Some(Box::new(self.parse_stmt()?));
            break;
        }

        Ok(Stmt::new(
            StmtKind::If {
                conds,
                bodies,
                else_body,
            },
            pos,
        ))
    }

    fn parse_for(&mut self) -> ParseResult<Stmt> {
        let pos = self.pos();
        self.bump();
        self.expect_char('(', "after 'for'")?;

        let (decl_type, decl_symbol) = if self.peek_type(0).is_some()
            && self.peek_n(1).symbol().is_some()
        {
            let ty = self.expect_type("for loop variable")?;
            let name = self.expect_symbol("for loop variable")?;
            self.expect_char('=', "after for loop variable")?;
            (Some(ty), Some(name))
        } else {
            (None, None)
        };

        let init = self.parse_expr()?;
        self.expect_char(';', "after for initializer")?;
        let cond = self.parse_expr()?;
        self.expect_char(';', "after for condition")?;
        let inc = self.parse_expr()?;
        self.expect_char(')', "after for increment")?;
        let body = Box::new(self.parse_stmt()?);

        Ok(Stmt::new(
            StmtKind::For {
                decl_type,
                decl_symbol,
                init,
                cond,
                inc,
                body,
            },
            pos,
        ))
    }

    fn parse_fn_decl(&mut self) -> ParseResult<Stmt> {
        let pos = self.pos();
        let return_type = self.expect_type("for function return")?;
        let name = self.expect_symbol("for function name")?;
        self.expect_char('(', "after function name")?;

        let mut arg_types = Vec::new();
        let mut arg_names = Vec::new();
        if !self.eat_char(')') {
            loop {
                arg_types.push(self.expect_type("for parameter")?);
                arg_names.push(self.expect_symbol("for parameter name")?);
                if self.eat_char(')') {
                    break;
                }
                self.expect_char(',', "between parameters")?;
            }
        }

        let body = self.parse_block_body()?;
        let decl = FnDecl {
            return_type,
            name,
            arg_types,
            arg_names,
            body,
            pos,
        };
        Ok(Stmt::new(StmtKind::FnDecl(Rc::new(decl)), pos))
    }

    fn parse_var_decl(&mut self) -> ParseResult<Stmt> {
        let pos = self.pos();
        let ty = self.expect_type("for variable")?;
        let mut names = vec![self.expect_symbol("for variable name")?];
        while self.eat_char(',') {
            names.push(self.expect_symbol("for variable name")?);
        }
        let init = if self.eat_char('=') {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect_char(';', "after variable declaration")?;
        Ok(Stmt::new(StmtKind::VarDecl { ty, names, init }, pos))
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    pub fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> ParseResult<Expr> {
        let left = self.parse_comparison()?;
        if self.peek_char('=') && !self.peek_n(1).is_char('=') {
            let pos = self.pos();
            self.bump();
            let right = self.parse_assignment()?;
            return Ok(Expr::new(
                ExprKind::Assignment {
                    left: Box::new(left),
                    right: Box::new(right),
                },
                pos,
            ));
        }
        Ok(left)
    }

    /// Match a comparison operator at the cursor, returning it with its width
    fn peek_comparison(&self) -> Option<(BinOp, usize)> {
        let first = self.peek();
        let second_is_eq = self.peek_n(1).is_char('=');
        match first.kind {
            TokenKind::Char('=') if second_is_eq => Some((BinOp::Eq, 2)),
            TokenKind::Char('<') if second_is_eq => Some((BinOp::Le, 2)),
            TokenKind::Char('>') if second_is_eq => Some((BinOp::Ge, 2)),
            TokenKind::Char('<') => Some((BinOp::Lt, 1)),
            TokenKind::Char('>') => Some((BinOp::Gt, 1)),
            _ => None,
        }
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let left = self.parse_term()?;
        if let Some((op, width)) = self.peek_comparison() {
            let pos = self.pos();
            self.i += width;
            let right = self.parse_comparison()?;
            return Ok(binary(op, left, right, pos));
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_factor()?;
        loop {
            let op = if self.peek_char('+') {
                BinOp::Add
            } else if self.peek_char('-') {
                BinOp::Sub
            } else {
                break;
            };
            let pos = self.pos();
            self.bump();
            let right = self.parse_factor()?;
            left = binary(op, left, right, pos);
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_cast()?;
        loop {
            let op = if self.peek_char('*') {
                BinOp::Mul
            } else if self.peek_char('/') {
                BinOp::Div
            } else {
                break;
            };
            let pos = self.pos();
            self.bump();
            let right = self.parse_cast()?;
            left = binary(op, left, right, pos);
        }
        Ok(left)
    }

    fn parse_cast(&mut self) -> ParseResult<Expr> {
        if self.peek_char('(') && self.peek_n(2).is_char(')') {
            if let Some(ty) = self.peek_type(1) {
                let pos = self.pos();
                self.i += 3;
                let arg = self.parse_cast()?;
                return Ok(Expr::new(
                    ExprKind::Cast {
                        ty,
                        arg: Box::new(arg),
                    },
                    pos,
                ));
            }
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            let pos = self.pos();
            if self.eat_char('(') {
                let args = self.parse_args(')')?;
                expr = Expr::new(
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    pos,
                );
            } else if self.eat_char('.') {
                let member = self.expect_symbol("after '.'")?;
                expr = Expr::new(
                    ExprKind::MemberAccess {
                        target: Box::new(expr),
                        member,
                    },
                    pos,
                );
            } else if self.eat_char('[') {
                let index = self.parse_expr()?;
                self.expect_char(']', "after index")?;
                expr = Expr::new(
                    ExprKind::ArrayAccess {
                        target: Box::new(expr),
                        index: Box::new(index),
                    },
                    pos,
                );
            } else {
                break;
            }
        }
        Ok(expr)
    }

    /// Comma-separated expressions up to and including `close`
    fn parse_args(&mut self, close: char) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();
        if self.eat_char(close) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            if self.eat_char(close) {
                return Ok(args);
            }
            self.expect_char(',', "between arguments")?;
        }
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let pos = self.pos();
        let kind = match &self.peek().kind {
            TokenKind::Int(i) => ExprKind::IntLit(*i),
            TokenKind::Float(f) => ExprKind::FloatLit(*f),
            TokenKind::Str(s) => ExprKind::StringLit(Rc::from(s.as_str())),
            TokenKind::Symbol(s) if !is_keyword(s) => ExprKind::Symbol(s.clone()),
            // The lexer leaves `-` unattached after `)`, as in `(int)-2.7`
            TokenKind::Char('-') => match self.peek_n(1).kind.clone() {
                TokenKind::Int(i) => {
                    self.i += 2;
                    return Ok(Expr::new(ExprKind::IntLit(i.wrapping_neg()), pos));
                }
                TokenKind::Float(f) => {
                    self.i += 2;
                    return Ok(Expr::new(ExprKind::FloatLit(-f), pos));
                }
                _ => return Err(self.error("expected expression".to_string())),
            },
            TokenKind::Char('(') => {
                self.bump();
                let inner = self.parse_expr()?;
                self.expect_char(')', "to close parenthesis")?;
                return Ok(inner);
            }
            TokenKind::Char('[') => {
                self.bump();
                let args = self.parse_args(']')?;
                return Ok(Expr::new(ExprKind::ArrayDecl { args }, pos));
            }
            _ => return Err(self.error("expected expression".to_string())),
        };
        self.bump();
        Ok(Expr::new(kind, pos))
    }
}

fn is_keyword(s: &str) -> bool {
    matches!(s, "if" | "else" | "for" | "return")
}

fn binary(op: BinOp, left: Expr, right: Expr, pos: Pos) -> Expr {
    Expr::new(
        ExprKind::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        pos,
    )
}
