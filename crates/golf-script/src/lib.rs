//! golf-script - a small embedded scripting language for procedural geometry
//!
//! Scripts are C-like: typed declarations, functions, `if`/`for`, lists and
//! 2D/3D float vectors. A host loads a script, which runs its top-level
//! statements, then calls the functions it declared.
//!
//! ## Example Script
//!
//! ```text
//! // A ring of points around the origin
//! list generate(int segments, float radius) {
//!     list points = [];
//!     for (int i = 0; i < segments; i = i + 1) {
//!         float a = 2 * PI * i / segments;
//!         points[i] = V3(cos(a), 0, sin(a)) * radius;
//!     }
//!     return points;
//! }
//! ```
//!
//! ## Host Usage
//!
//! ```no_run
//! use golf_script::{Script, Val};
//!
//! let mut script = Script::load_file("ring.gs")?;
//! let points = script.eval_fn("generate", &[Val::Int(16), Val::Float(2.0)])?;
//! println!("{}", script.display(&points));
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Precision Notes
//!
//! Numbers are `i32` and `f32`, and vectors are `glam` `f32` vectors, so
//! script output can feed GPU buffers without conversion.

pub mod ast;
pub mod env;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod natives;
pub mod ops;
pub mod parser;
pub mod script;
pub mod value;

#[cfg(feature = "file-watcher")]
pub mod watcher;

pub use error::{LexError, LoadError, LoadErrorKind, ParseError, Pos, Result, RuntimeError};
pub use eval::{Interpreter, Scoping};
pub use lexer::{Token, TokenKind, tokenize};
pub use natives::check_args;
pub use parser::Parser;
pub use script::{
    FnSignature, Script, ScriptEntry, ScriptId, ScriptOptions, loaded_scripts, parse_source,
};
pub use value::{Heap, ListId, NativeFn, Val, ValType};

#[cfg(feature = "file-watcher")]
pub use watcher::{ScriptWatcher, WatchEvent};

// Re-export for hosts building vector values
pub use glam::{Vec2, Vec3};
