//! Runtime values
//!
//! Scalars and vectors are plain copies. Lists live in the script's
//! [`Heap`] and a `Val::List` only carries the id, so copying a list value
//! aliases the same storage. The heap is released in one go when the
//! script is dropped; popping a frame never frees list storage.

use crate::ast::FnDecl;
use crate::error::{Result, RuntimeError};
use glam::{Vec2, Vec3};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

/// Type tag of a [`Val`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValType {
    Void,
    Bool,
    Int,
    Float,
    Vec2,
    Vec3,
    List,
    String,
    Fn,
    NativeFn,
}

impl ValType {
    /// Parse a type keyword as written in source
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "void" => Self::Void,
            "bool" => Self::Bool,
            "int" => Self::Int,
            "float" => Self::Float,
            "vec2" => Self::Vec2,
            "vec3" => Self::Vec3,
            "list" => Self::List,
            "string" => Self::String,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::List => "list",
            Self::String => "string",
            Self::Fn => "fn",
            Self::NativeFn => "native fn",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }
}

impl fmt::Display for ValType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Handle to a list stored in a script's [`Heap`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListId(usize);

/// Host callback signature for native functions
pub type NativeCallback = dyn Fn(&mut Heap, &[Val]) -> Result<Val>;

/// A host function exposed to scripts
#[derive(Clone)]
pub struct NativeFn {
    name: Rc<str>,
    func: Rc<NativeCallback>,
}

impl NativeFn {
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(&mut Heap, &[Val]) -> Result<Val> + 'static,
    {
        Self {
            name: Rc::from(name),
            func: Rc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, heap: &mut Heap, args: &[Val]) -> Result<Val> {
        (self.func)(heap, args)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFn({})", self.name)
    }
}

impl PartialEq for NativeFn {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    Void,
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    List(ListId),
    String(Rc<str>),
    Fn(Rc<FnDecl>),
    NativeFn(NativeFn),
}

impl Val {
    pub fn ty(&self) -> ValType {
        match self {
            Self::Void => ValType::Void,
            Self::Bool(_) => ValType::Bool,
            Self::Int(_) => ValType::Int,
            Self::Float(_) => ValType::Float,
            Self::Vec2(_) => ValType::Vec2,
            Self::Vec3(_) => ValType::Vec3,
            Self::List(_) => ValType::List,
            Self::String(_) => ValType::String,
            Self::Fn(_) => ValType::Fn,
            Self::NativeFn(_) => ValType::NativeFn,
        }
    }

    pub fn string(s: &str) -> Self {
        Self::String(Rc::from(s))
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f32),
            _ => None,
        }
    }

    /// Convert to `ty`. Only int and float convert into each other;
    /// any other pair of distinct types is an error.
    pub fn cast(self, ty: ValType) -> Result<Val> {
        if self.ty() == ty {
            return Ok(self);
        }
        match (self, ty) {
            (Self::Int(i), ValType::Float) => Ok(Self::Float(i as f32)),
            (Self::Float(f), ValType::Int) => Ok(Self::Int(f as i32)),
            (v, ty) => Err(RuntimeError::new(format!(
                "cannot cast {} to {}",
                v.ty(),
                ty
            ))),
        }
    }
}

/// Script-owned storage for list values
#[derive(Debug, Default)]
pub struct Heap {
    lists: Vec<Vec<Val>>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_list(&mut self, items: Vec<Val>) -> ListId {
        self.lists.push(items);
        ListId(self.lists.len() - 1)
    }

    /// Allocate a list and return it as a value
    pub fn new_list(&mut self, items: Vec<Val>) -> Val {
        Val::List(self.alloc_list(items))
    }

    pub fn list(&self, id: ListId) -> Result<&[Val]> {
        self.lists
            .get(id.0)
            .map(Vec::as_slice)
            .ok_or_else(|| RuntimeError::new("list does not belong to this script"))
    }

    pub fn list_mut(&mut self, id: ListId) -> Result<&mut Vec<Val>> {
        self.lists
            .get_mut(id.0)
            .ok_or_else(|| RuntimeError::new("list does not belong to this script"))
    }

    /// Number of lists allocated so far
    pub fn list_count(&self) -> usize {
        self.lists.len()
    }

    /// Human-readable rendering, as used by `print`
    pub fn display(&self, val: &Val) -> String {
        let mut out = String::new();
        let mut open = HashSet::new();
        self.write_val(&mut out, val, &mut open);
        out
    }

    fn write_val(&self, out: &mut String, val: &Val, open: &mut HashSet<ListId>) {
        match val {
            Val::Void => out.push_str("void"),
            Val::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Val::Int(i) => out.push_str(&i.to_string()),
            Val::Float(f) => out.push_str(&format!("{:.6}", f)),
            Val::Vec2(v) => out.push_str(&format!("<{:.6}, {:.6}>", v.x, v.y)),
            Val::Vec3(v) => out.push_str(&format!("<{:.6}, {:.6}, {:.6}>", v.x, v.y, v.z)),
            Val::String(s) => out.push_str(s),
            Val::Fn(decl) => out.push_str(&format!("<fn {}>", decl.name)),
            Val::NativeFn(native) => out.push_str(&format!("<native fn {}>", native.name())),
            Val::List(id) => {
                // Lists can contain themselves through aliasing
                if !open.insert(*id) {
                    out.push_str("[...]");
                    return;
                }
                out.push('[');
                if let Ok(items) = self.list(*id) {
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        self.write_val(out, item, open);
                    }
                }
                out.push(']');
                open.remove(id);
            }
        }
    }
}
