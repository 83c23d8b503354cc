//! Error types for golf scripts
//!
//! Lexing and parsing failures are fatal to loading a script. Runtime
//! failures are [`RuntimeError`]s that abort only the statement or call
//! chain currently executing.

use std::fmt;
use thiserror::Error;

/// Result type alias for evaluation
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// A 1-based source position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pos {
    pub line: u32,
    pub col: u32,
}

impl Pos {
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Tokenizer failure: an unknown character
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{pos}: unexpected character '{ch}'")]
pub struct LexError {
    pub ch: char,
    pub pos: Pos,
}

/// Grammar violation, reported at the offending token
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{pos}: {message}")]
pub struct ParseError {
    pub message: String,
    pub pos: Pos,
}

impl ParseError {
    pub fn new(pos: Pos, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            pos,
        }
    }
}

/// A fault raised while evaluating a script
///
/// `pos` is `None` for faults raised outside any source node, for example
/// when the host calls [`Script::eval_fn`](crate::Script::eval_fn) with the
/// wrong arguments.
#[derive(Error, Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub message: String,
    pub pos: Option<Pos>,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            pos: None,
        }
    }

    pub fn at(pos: Pos, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            pos: Some(pos),
        }
    }

    /// Attach a position unless one is already recorded
    pub fn or_at(mut self, pos: Pos) -> Self {
        if self.pos.is_none() {
            self.pos = Some(pos);
        }
        self
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pos {
            Some(pos) => write!(f, "{}: {}", pos, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Which stage of loading failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorKind {
    Lex,
    Parse,
    Runtime,
}

impl fmt::Display for LoadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lex => "tokenize error",
            Self::Parse => "parse error",
            Self::Runtime => "runtime error",
        })
    }
}

/// Failure to load a script, surfaced to the host as one message
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{path}:{line}:{col}: {kind}: {message}")]
pub struct LoadError {
    pub kind: LoadErrorKind,
    pub path: String,
    pub line: u32,
    pub col: u32,
    pub message: String,
}

impl LoadError {
    pub(crate) fn lex(path: &str, err: &LexError) -> Self {
        Self {
            kind: LoadErrorKind::Lex,
            path: path.to_string(),
            line: err.pos.line,
            col: err.pos.col,
            message: format!("unexpected character '{}'", err.ch),
        }
    }

    pub(crate) fn parse(path: &str, err: &ParseError) -> Self {
        Self {
            kind: LoadErrorKind::Parse,
            path: path.to_string(),
            line: err.pos.line,
            col: err.pos.col,
            message: err.message.clone(),
        }
    }

    pub(crate) fn runtime(path: &str, err: &RuntimeError) -> Self {
        let pos = err.pos.unwrap_or_default();
        Self {
            kind: LoadErrorKind::Runtime,
            path: path.to_string(),
            line: pos.line,
            col: pos.col,
            message: err.message.clone(),
        }
    }
}
