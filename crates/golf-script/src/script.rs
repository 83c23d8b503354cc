//! Script objects and the process-wide script registry
//!
//! A [`Script`] owns everything one loaded program needs: its tokens, its
//! syntax tree, the live environment stack and the list heap. Loading runs
//! every top-level statement immediately, which is how declared functions
//! and globals end up in the global frame. Dropping the script unloads it.

use crate::ast::{Stmt, StmtKind};
use crate::error::{LoadError, Result, RuntimeError};
use crate::eval::{Interpreter, Scoping};
use crate::lexer::{Token, tokenize};
use crate::parser::Parser;
use crate::value::{Heap, NativeFn, Val, ValType};
use anyhow::Context;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static REGISTRY: Mutex<Vec<ScriptEntry>> = parking_lot::const_mutex(Vec::new());
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier of a loaded script, unique for the life of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptId(u64);

/// Registry record for a loaded script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptEntry {
    pub id: ScriptId,
    pub path: PathBuf,
}

/// Snapshot of every currently loaded script, in load order
pub fn loaded_scripts() -> Vec<ScriptEntry> {
    REGISTRY.lock().clone()
}

/// Tokenize and parse `source` without running it
///
/// `path` only labels the error.
pub fn parse_source(
    path: &str,
    source: &str,
) -> std::result::Result<(Vec<Token>, Vec<Stmt>), LoadError> {
    let tokens = tokenize(source).map_err(|e| LoadError::lex(path, &e))?;
    let stmts = Parser::new(&tokens)
        .parse_program()
        .map_err(|e| LoadError::parse(path, &e))?;
    Ok((tokens, stmts))
}

/// Options applied when loading a script
#[derive(Debug, Clone, Default)]
pub struct ScriptOptions {
    /// Which frames a called function can see
    pub scoping: Scoping,
    /// Host natives installed before any top-level statement runs
    pub natives: Vec<NativeFn>,
}

impl ScriptOptions {
    pub fn with_scoping(mut self, scoping: Scoping) -> Self {
        self.scoping = scoping;
        self
    }

    pub fn with_native(mut self, native: NativeFn) -> Self {
        self.natives.push(native);
        self
    }
}

/// Declared shape of a script function
#[derive(Debug, Clone, PartialEq)]
pub struct FnSignature {
    pub name: String,
    pub return_type: ValType,
    pub params: Vec<(String, ValType)>,
}

pub struct Script {
    id: ScriptId,
    path: PathBuf,
    tokens: Vec<Token>,
    program: Vec<Stmt>,
    interp: Interpreter,
    /// Replayed by reloads, including natives added after loading
    options: ScriptOptions,
}

impl Script {
    /// Load a script with default options
    pub fn load(path: impl AsRef<Path>, source: &str) -> std::result::Result<Self, LoadError> {
        Self::load_with_options(path, source, ScriptOptions::default())
    }

    /// Tokenize, parse and run every top-level statement of `source`
    ///
    /// The first lex, parse or runtime error aborts the load. On success the
    /// script is added to the registry returned by [`loaded_scripts`].
    pub fn load_with_options(
        path: impl AsRef<Path>,
        source: &str,
        options: ScriptOptions,
    ) -> std::result::Result<Self, LoadError> {
        let path = path.as_ref().to_path_buf();
        let name = path.display().to_string();
        tracing::debug!("loading script {}", name);

        let mut interp = Interpreter::new(options.scoping);
        for native in &options.natives {
            interp
                .env_mut()
                .define_global(native.name(), Val::NativeFn(native.clone()));
        }

        let mut script = Self {
            id: ScriptId(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
            path,
            tokens: Vec::new(),
            program: Vec::new(),
            interp,
            options,
        };

        if let Err(err) = script.run_source(source) {
            tracing::warn!("failed to load {}", err);
            return Err(err);
        }

        REGISTRY.lock().push(ScriptEntry {
            id: script.id,
            path: script.path.clone(),
        });
        tracing::info!("registered script {} ({:?})", name, script.id);
        Ok(script)
    }

    /// Read `path` from disk and load it
    pub fn load_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Self::load_file_with_options(path, ScriptOptions::default())
    }

    pub fn load_file_with_options(
        path: impl AsRef<Path>,
        options: ScriptOptions,
    ) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script file {}", path.display()))?;
        Ok(Self::load_with_options(path, &source, options)?)
    }

    /// Lex, parse and run more top-level statements against this script's
    /// global frame. Returns the value of a trailing expression statement.
    ///
    /// Unlike a failed load, a failure here leaves the script usable.
    pub fn eval_source(&mut self, source: &str) -> std::result::Result<Option<Val>, LoadError> {
        self.run_source(source)
    }

    fn run_source(&mut self, source: &str) -> std::result::Result<Option<Val>, LoadError> {
        let name = self.path.display().to_string();
        let (tokens, stmts) = parse_source(&name, source)?;
        self.tokens.extend(tokens);

        let mut last = None;
        for stmt in &stmts {
            last = match &stmt.kind {
                StmtKind::Expr { expr } => Some(
                    self.interp
                        .eval(expr)
                        .map_err(|e| LoadError::runtime(&name, &e))?,
                ),
                _ => {
                    // A top-level return has no call to unwind to
                    self.interp
                        .exec(stmt)
                        .map_err(|e| LoadError::runtime(&name, &e))?;
                    None
                }
            };
        }
        self.program.extend(stmts);
        Ok(last)
    }

    pub fn id(&self) -> ScriptId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn program(&self) -> &[Stmt] {
        &self.program
    }

    pub fn scoping(&self) -> Scoping {
        self.interp.scoping()
    }

    /// Options to load this script again with the same scoping and natives
    pub fn options(&self) -> &ScriptOptions {
        &self.options
    }

    pub fn heap(&self) -> &Heap {
        self.interp.heap()
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        self.interp.heap_mut()
    }

    /// Look `name` up on the current environment stack, innermost frame first
    pub fn get_val(&self, name: &str) -> Option<Val> {
        self.interp.env().get(name).cloned()
    }

    /// Global bindings sorted by name
    pub fn globals(&self) -> Vec<(String, Val)> {
        let mut globals: Vec<_> = self
            .interp
            .env()
            .globals()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        globals.sort_by(|a, b| a.0.cmp(&b.0));
        globals
    }

    /// Declared signature of the global function `name`
    pub fn fn_signature(&self, name: &str) -> Option<FnSignature> {
        match self.interp.env().get_global(name)? {
            Val::Fn(decl) => Some(FnSignature {
                name: decl.name.clone(),
                return_type: decl.return_type,
                params: decl
                    .arg_names
                    .iter()
                    .cloned()
                    .zip(decl.arg_types.iter().copied())
                    .collect(),
            }),
            _ => None,
        }
    }

    /// Call the global function `name`
    ///
    /// Arguments must match the declared parameter types exactly; nothing
    /// is cast. An error aborts only this call.
    pub fn eval_fn(&mut self, name: &str, args: &[Val]) -> Result<Val> {
        let decl = match self.interp.env().get_global(name) {
            Some(Val::Fn(decl)) => Rc::clone(decl),
            Some(other) => {
                return Err(RuntimeError::new(format!(
                    "'{}' is a {}, not a function",
                    name,
                    other.ty()
                )));
            }
            None => return Err(RuntimeError::new(format!("no function named '{}'", name))),
        };

        if args.len() != decl.arg_types.len() {
            return Err(RuntimeError::new(format!(
                "'{}' expects {} arguments, got {}",
                name,
                decl.arg_types.len(),
                args.len()
            )));
        }
        for (i, (arg, ty)) in args.iter().zip(&decl.arg_types).enumerate() {
            if arg.ty() != *ty {
                return Err(RuntimeError::new(format!(
                    "argument {} of '{}' must be {}, got {}",
                    i + 1,
                    name,
                    ty,
                    arg.ty()
                )));
            }
        }

        tracing::trace!("calling {} in {}", name, self.path.display());
        self.interp.call_fn(&decl, args.to_vec())
    }

    /// Install or replace a native function in the global frame
    pub fn set_native_fn<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&mut Heap, &[Val]) -> Result<Val> + 'static,
    {
        let native = NativeFn::new(name, func);
        self.options.natives.retain(|n| n.name() != name);
        self.options.natives.push(native.clone());
        self.interp
            .env_mut()
            .define_global(name, Val::NativeFn(native));
    }

    /// Render a value the way `print` does
    pub fn display(&self, val: &Val) -> String {
        self.interp.heap().display(val)
    }
}

impl Drop for Script {
    fn drop(&mut self) {
        let mut registry = REGISTRY.lock();
        let before = registry.len();
        registry.retain(|entry| entry.id != self.id);
        if registry.len() != before {
            tracing::info!("unregistered script {}", self.path.display());
        }
    }
}

impl std::fmt::Debug for Script {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Script")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("statements", &self.program.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn registry_tracks_load_and_drop() {
        let script = Script::load("registry_a.gs", "int a = 1;").unwrap();
        let id = script.id();
        assert!(loaded_scripts().iter().any(|e| e.id == id));
        drop(script);
        assert!(!loaded_scripts().iter().any(|e| e.id == id));
    }

    #[test]
    fn failed_loads_are_not_registered() {
        assert!(Script::load("registry_bad.gs", "int x = ;").is_err());
        assert!(
            !loaded_scripts()
                .iter()
                .any(|e| e.path == Path::new("registry_bad.gs"))
        );
    }

    #[test]
    fn signature_of_generate() {
        let script = Script::load(
            "sig.gs",
            "list generate(int segments, float radius, vec3 center) { return []; }",
        )
        .unwrap();
        let sig = script.fn_signature("generate").unwrap();
        assert_eq!(sig.return_type, ValType::List);
        assert_eq!(
            sig.params,
            vec![
                ("segments".to_string(), ValType::Int),
                ("radius".to_string(), ValType::Float),
                ("center".to_string(), ValType::Vec3),
            ]
        );
        assert!(script.fn_signature("print").is_none());
        assert!(script.fn_signature("missing").is_none());
    }

    #[test]
    fn eval_source_keeps_the_script_usable_after_errors() {
        let mut script = Script::load("repl.gs", "int a = 1;").unwrap();
        assert!(script.eval_source("a = undefined_thing;").is_err());
        assert_eq!(script.eval_source("a + 1;").unwrap(), Some(Val::Int(2)));
        assert_eq!(script.eval_source("int b = 3;").unwrap(), None);
        assert_eq!(script.get_val("b"), Some(Val::Int(3)));
    }

    #[test]
    fn options_natives_are_visible_to_top_level_code() {
        let options = ScriptOptions::default().with_native(NativeFn::new("seven", |_, _| {
            Ok(Val::Int(7))
        }));
        let script = Script::load_with_options("opts.gs", "int s = seven();", options).unwrap();
        assert_eq!(script.get_val("s"), Some(Val::Int(7)));
    }

    #[test]
    fn parse_source_does_not_run_anything() {
        let (tokens, stmts) = parse_source("check.gs", "int x = y; print(x);").unwrap();
        assert_eq!(stmts.len(), 2);
        assert!(tokens.last().is_some_and(|t| t.kind == crate::lexer::TokenKind::Eof));
        let err = parse_source("check.gs", "int x = ;").unwrap_err();
        assert_eq!(err.kind, crate::error::LoadErrorKind::Parse);
    }

    #[test]
    fn set_native_fn_is_remembered_in_options() {
        let mut script = Script::load("natives.gs", "").unwrap();
        script.set_native_fn("emit", |_, _| Ok(Val::Int(1)));
        script.set_native_fn("emit", |_, _| Ok(Val::Int(2)));
        let names: Vec<_> = script.options().natives.iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["emit"]);
        assert_eq!(script.eval_source("emit();").unwrap(), Some(Val::Int(2)));
    }

    #[test]
    fn load_file_reports_missing_files() {
        let err = Script::load_file("/nonexistent/dir/hole.gs").unwrap_err();
        assert!(err.to_string().contains("Failed to read script file"));
    }
}
