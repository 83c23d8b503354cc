//! Syntax tree for golf scripts
//!
//! Every expression node keeps the position of the token it was built from.
//! Function declarations are reference counted so that `Fn` values can
//! point back into the tree the script owns.

use crate::error::Pos;
use crate::value::ValType;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Eq => "==",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(self, Self::Lt | Self::Gt | Self::Le | Self::Ge | Self::Eq)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    IntLit(i32),
    FloatLit(f32),
    StringLit(Rc<str>),
    Symbol(String),
    BinaryOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assignment {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    MemberAccess {
        target: Box<Expr>,
        member: String,
    },
    ArrayAccess {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    ArrayDecl {
        args: Vec<Expr>,
    },
    Cast {
        ty: ValType,
        arg: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub pos: Pos,
}

impl Expr {
    pub fn new(kind: ExprKind, pos: Pos) -> Self {
        Self { kind, pos }
    }
}

/// `type name(type arg, ...) { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct FnDecl {
    pub return_type: ValType,
    pub name: String,
    pub arg_types: Vec<ValType>,
    pub arg_names: Vec<String>,
    pub body: Vec<Stmt>,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `conds` and `bodies` are parallel: one body per condition
    If {
        conds: Vec<Expr>,
        bodies: Vec<Stmt>,
        else_body: Option<Box<Stmt>>,
    },
    For {
        decl_type: Option<ValType>,
        decl_symbol: Option<String>,
        init: Expr,
        cond: Expr,
        inc: Expr,
        body: Box<Stmt>,
    },
    Return {
        expr: Option<Expr>,
    },
    Block {
        stmts: Vec<Stmt>,
    },
    Expr {
        expr: Expr,
    },
    VarDecl {
        ty: ValType,
        names: Vec<String>,
        init: Option<Expr>,
    },
    FnDecl(Rc<FnDecl>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub pos: Pos,
}

impl Stmt {
    pub fn new(kind: StmtKind, pos: Pos) -> Self {
        Self { kind, pos }
    }
}
