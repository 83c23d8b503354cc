//! Tree-walking evaluator
//!
//! Statements return a [`Flow`] so a `return` can unwind to its call site
//! without being confused with a fault. Faults are `Err(RuntimeError)` and
//! unwind all the way to whoever started the evaluation.

use crate::ast::{Expr, ExprKind, FnDecl, Stmt, StmtKind};
use crate::env::{Env, Frame};
use crate::error::{Pos, Result, RuntimeError};
use crate::natives;
use crate::ops;
use crate::value::{Heap, ListId, Val, ValType};
use glam::{Vec2, Vec3};
use std::rc::Rc;

/// Highest index a list assignment may grow a list to
pub const MAX_LIST_INDEX: usize = 16_000;

/// Outcome of executing a statement
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Val),
}

/// Which frames a called function can see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scoping {
    /// The global frame and the call's own argument frame
    #[default]
    Lexical,
    /// Every frame live at the call site, innermost first
    Dynamic,
}

/// Something an assignment can write to
enum Place {
    Var(String),
    Elem(ListId, usize),
}

pub struct Interpreter {
    env: Env,
    heap: Heap,
    scoping: Scoping,
}

impl Interpreter {
    /// Create an interpreter whose global frame holds the built-in natives
    pub fn new(scoping: Scoping) -> Self {
        let mut env = Env::new();
        natives::install(&mut env);
        Self {
            env,
            heap: Heap::new(),
            scoping,
        }
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Env {
        &mut self.env
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    pub fn scoping(&self) -> Scoping {
        self.scoping
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    pub fn exec(&mut self, stmt: &Stmt) -> Result<Flow> {
        match &stmt.kind {
            StmtKind::If {
                conds,
                bodies,
                else_body,
            } => {
                for (cond, body) in conds.iter().zip(bodies) {
                    if self.eval_condition(cond)? {
                        return self.exec(body);
                    }
                }
                match else_body {
                    Some(body) => self.exec(body),
                    None => Ok(Flow::Normal),
                }
            }
            StmtKind::For {
                decl_type,
                decl_symbol,
                init,
                cond,
                inc,
                body,
            } => {
                self.env.push();
                let result =
                    self.exec_for(*decl_type, decl_symbol.as_deref(), init, cond, inc, body);
                self.env.pop();
                result
            }
            StmtKind::Return { expr } => {
                let val = match expr {
                    Some(expr) => self.eval(expr)?,
                    None => Val::Void,
                };
                Ok(Flow::Return(val))
            }
            StmtKind::Block { stmts } => {
                self.env.push();
                let result = self.exec_stmts(stmts);
                self.env.pop();
                result
            }
            StmtKind::Expr { expr } => {
                self.eval(expr)?;
                Ok(Flow::Normal)
            }
            StmtKind::VarDecl { ty, names, init } => {
                let [name] = names.as_slice() else {
                    return Err(RuntimeError::at(
                        stmt.pos,
                        format!(
                            "only single-name declarations can be evaluated, found {} names",
                            names.len()
                        ),
                    ));
                };
                if *ty == ValType::Void {
                    return Err(RuntimeError::at(
                        stmt.pos,
                        format!("cannot declare void variable '{}'", name),
                    ));
                }
                let val = match init {
                    Some(init) => {
                        let val = self.eval(init)?;
                        let from = val.ty();
                        val.cast(*ty).map_err(|_| {
                            RuntimeError::at(
                                init.pos,
                                format!("cannot initialize {} '{}' with {}", ty, name, from),
                            )
                        })?
                    }
                    None => self.default_for(*ty).map_err(|e| e.or_at(stmt.pos))?,
                };
                self.env.declare(name, val).map_err(|e| e.or_at(stmt.pos))?;
                Ok(Flow::Normal)
            }
            StmtKind::FnDecl(decl) => {
                self.env
                    .declare(&decl.name, Val::Fn(Rc::clone(decl)))
                    .map_err(|e| e.or_at(stmt.pos))?;
                Ok(Flow::Normal)
            }
        }
    }

    /// Run statements in the current frame, stopping at the first return
    pub fn exec_stmts(&mut self, stmts: &[Stmt]) -> Result<Flow> {
        for stmt in stmts {
            if let Flow::Return(val) = self.exec(stmt)? {
                return Ok(Flow::Return(val));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_for(
        &mut self,
        decl_type: Option<ValType>,
        decl_symbol: Option<&str>,
        init: &Expr,
        cond: &Expr,
        inc: &Expr,
        body: &Stmt,
    ) -> Result<Flow> {
        let init_val = self.eval(init)?;
        if let (Some(ty), Some(name)) = (decl_type, decl_symbol) {
            let from = init_val.ty();
            let val = init_val.cast(ty).map_err(|_| {
                RuntimeError::at(
                    init.pos,
                    format!("cannot initialize {} '{}' with {}", ty, name, from),
                )
            })?;
            self.env.declare(name, val).map_err(|e| e.or_at(init.pos))?;
        }

        while self.eval_condition(cond)? {
            if let Flow::Return(val) = self.exec(body)? {
                return Ok(Flow::Return(val));
            }
            self.eval(inc)?;
        }
        Ok(Flow::Normal)
    }

    fn eval_condition(&mut self, cond: &Expr) -> Result<bool> {
        let val = self.eval(cond)?;
        match val {
            Val::Bool(b) => Ok(b),
            other => Err(RuntimeError::at(
                cond.pos,
                format!("condition must be bool, got {}", other.ty()),
            )),
        }
    }

    fn default_for(&mut self, ty: ValType) -> Result<Val> {
        Ok(match ty {
            ValType::Bool => Val::Bool(false),
            ValType::Int => Val::Int(0),
            ValType::Float => Val::Float(0.0),
            ValType::Vec2 => Val::Vec2(Vec2::ZERO),
            ValType::Vec3 => Val::Vec3(Vec3::ZERO),
            ValType::List => self.heap.new_list(Vec::new()),
            ValType::String => Val::string(""),
            ValType::Void | ValType::Fn | ValType::NativeFn => {
                return Err(RuntimeError::new(format!("{} has no default value", ty)));
            }
        })
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    pub fn eval(&mut self, expr: &Expr) -> Result<Val> {
        match &expr.kind {
            ExprKind::IntLit(i) => Ok(Val::Int(*i)),
            ExprKind::FloatLit(f) => Ok(Val::Float(*f)),
            ExprKind::StringLit(s) => Ok(Val::String(Rc::clone(s))),
            ExprKind::Symbol(name) => self.env.get(name).cloned().ok_or_else(|| {
                RuntimeError::at(expr.pos, format!("undeclared symbol '{}'", name))
            }),
            ExprKind::BinaryOp { op, left, right } => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                ops::binary(*op, &l, &r).map_err(|e| e.or_at(expr.pos))
            }
            ExprKind::Assignment { left, right } => {
                let val = self.eval(right)?;
                self.assign(left, val)
            }
            ExprKind::Call { callee, args } => self.eval_call(expr.pos, callee, args),
            ExprKind::MemberAccess { target, member } => {
                let val = self.eval(target)?;
                self.read_member(&val, member).map_err(|e| e.or_at(expr.pos))
            }
            ExprKind::ArrayAccess { target, index } => {
                let list = self.eval(target)?;
                let idx = self.eval(index)?;
                let Val::List(id) = list else {
                    return Err(RuntimeError::at(
                        expr.pos,
                        format!("cannot index into {}", list.ty()),
                    ));
                };
                let i = index_of(idx, index.pos)?;
                let items = self.heap.list(id).map_err(|e| e.or_at(expr.pos))?;
                items.get(i).cloned().ok_or_else(|| {
                    RuntimeError::at(
                        index.pos,
                        format!("list index {} out of range (length {})", i, items.len()),
                    )
                })
            }
            ExprKind::ArrayDecl { args } => {
                let items = args
                    .iter()
                    .map(|a| self.eval(a))
                    .collect::<Result<Vec<_>>>()?;
                Ok(self.heap.new_list(items))
            }
            ExprKind::Cast { ty, arg } => {
                let val = self.eval(arg)?;
                val.cast(*ty).map_err(|e| e.or_at(expr.pos))
            }
        }
    }

    fn eval_call(&mut self, pos: Pos, callee: &Expr, args: &[Expr]) -> Result<Val> {
        match self.eval(callee)? {
            Val::Fn(decl) => {
                if args.len() != decl.arg_types.len() {
                    return Err(RuntimeError::at(
                        pos,
                        format!(
                            "'{}' expects {} arguments, got {}",
                            decl.name,
                            decl.arg_types.len(),
                            args.len()
                        ),
                    ));
                }
                let mut bound = Vec::with_capacity(args.len());
                for (i, (arg, ty)) in args.iter().zip(&decl.arg_types).enumerate() {
                    let val = self.eval(arg)?;
                    let from = val.ty();
                    bound.push(val.cast(*ty).map_err(|_| {
                        RuntimeError::at(
                            arg.pos,
                            format!(
                                "argument {} of '{}' must be {}, got {}",
                                i + 1,
                                decl.name,
                                ty,
                                from
                            ),
                        )
                    })?);
                }
                self.call_fn(&decl, bound)
            }
            Val::NativeFn(native) => {
                let vals = args
                    .iter()
                    .map(|a| self.eval(a))
                    .collect::<Result<Vec<_>>>()?;
                native
                    .call(&mut self.heap, &vals)
                    .map_err(|e| e.or_at(pos))
            }
            other => Err(RuntimeError::at(
                pos,
                format!("cannot call a value of type {}", other.ty()),
            )),
        }
    }

    /// Run a user function with already type-checked arguments
    pub fn call_fn(&mut self, decl: &FnDecl, args: Vec<Val>) -> Result<Val> {
        let frame: Frame = decl.arg_names.iter().cloned().zip(args).collect();

        let saved = match self.scoping {
            Scoping::Lexical => Some(self.env.enter_global_only()),
            Scoping::Dynamic => None,
        };
        self.env.push_frame(frame);
        let result = self.exec_stmts(&decl.body);
        self.env.pop();
        if let Some(saved) = saved {
            self.env.restore(saved);
        }

        match result? {
            Flow::Return(val) => Ok(val),
            Flow::Normal => Ok(Val::Void),
        }
    }

    fn read_member(&self, val: &Val, member: &str) -> Result<Val> {
        match (val, member) {
            (Val::Vec2(v), "x") => Ok(Val::Float(v.x)),
            (Val::Vec2(v), "y") => Ok(Val::Float(v.y)),
            (Val::Vec3(v), "x") => Ok(Val::Float(v.x)),
            (Val::Vec3(v), "y") => Ok(Val::Float(v.y)),
            (Val::Vec3(v), "z") => Ok(Val::Float(v.z)),
            (Val::List(id), "length") => Ok(Val::Int(self.heap.list(*id)?.len() as i32)),
            (v, m) => Err(RuntimeError::new(format!(
                "{} has no member '{}'",
                v.ty(),
                m
            ))),
        }
    }

    // ------------------------------------------------------------------
    // Assignment
    // ------------------------------------------------------------------

    fn assign(&mut self, target: &Expr, val: Val) -> Result<Val> {
        match &target.kind {
            ExprKind::MemberAccess { target: inner, member } => {
                let from = val.ty();
                let Some(f) = val.cast(ValType::Float).ok().and_then(|v| v.as_float()) else {
                    return Err(RuntimeError::at(
                        target.pos,
                        format!("cannot assign {} to member '{}'", from, member),
                    ));
                };
                let place = self.resolve_place(inner)?;
                let current = self.read_place(&place).map_err(|e| e.or_at(inner.pos))?;
                let updated = with_member(current, member, f).map_err(|e| e.or_at(target.pos))?;
                self.write_place(place, updated)
                    .map_err(|e| e.or_at(target.pos))?;
                Ok(Val::Float(f))
            }
            _ => {
                let place = self.resolve_place(target)?;
                self.write_place(place, val).map_err(|e| e.or_at(target.pos))
            }
        }
    }

    fn resolve_place(&mut self, expr: &Expr) -> Result<Place> {
        match &expr.kind {
            ExprKind::Symbol(name) => {
                if self.env.get(name).is_none() {
                    return Err(RuntimeError::at(
                        expr.pos,
                        format!("undeclared symbol '{}'", name),
                    ));
                }
                Ok(Place::Var(name.clone()))
            }
            ExprKind::ArrayAccess { target, index } => {
                let list = self.eval(target)?;
                let idx = self.eval(index)?;
                let Val::List(id) = list else {
                    return Err(RuntimeError::at(
                        expr.pos,
                        format!("cannot index into {}", list.ty()),
                    ));
                };
                let i = index_of(idx, index.pos)?;
                if i > MAX_LIST_INDEX {
                    return Err(RuntimeError::at(
                        index.pos,
                        format!(
                            "list index {} exceeds the maximum of {}",
                            i, MAX_LIST_INDEX
                        ),
                    ));
                }
                Ok(Place::Elem(id, i))
            }
            _ => Err(RuntimeError::at(expr.pos, "invalid assignment target")),
        }
    }

    fn read_place(&self, place: &Place) -> Result<Val> {
        match place {
            Place::Var(name) => self
                .env
                .get(name)
                .cloned()
                .ok_or_else(|| RuntimeError::new(format!("undeclared symbol '{}'", name))),
            Place::Elem(id, i) => {
                let items = self.heap.list(*id)?;
                items.get(*i).cloned().ok_or_else(|| {
                    RuntimeError::new(format!(
                        "list index {} out of range (length {})",
                        i,
                        items.len()
                    ))
                })
            }
        }
    }

    /// Store `val`, casting to the variable's current type. List elements
    /// take the value as is; writing past the end grows the list with `0`s.
    fn write_place(&mut self, place: Place, val: Val) -> Result<Val> {
        match place {
            Place::Var(name) => {
                let slot = self
                    .env
                    .get_mut(&name)
                    .ok_or_else(|| RuntimeError::new(format!("undeclared symbol '{}'", name)))?;
                let (from, to) = (val.ty(), slot.ty());
                let val = val.cast(to).map_err(|_| {
                    RuntimeError::new(format!(
                        "cannot assign {} to '{}' of type {}",
                        from, name, to
                    ))
                })?;
                *slot = val.clone();
                Ok(val)
            }
            Place::Elem(id, i) => {
                let items = self.heap.list_mut(id)?;
                if i >= items.len() {
                    items.resize(i + 1, Val::Int(0));
                }
                items[i] = val.clone();
                Ok(val)
            }
        }
    }
}

fn index_of(idx: Val, pos: Pos) -> Result<usize> {
    let from = idx.ty();
    match idx.cast(ValType::Int) {
        Ok(Val::Int(i)) if i >= 0 => Ok(i as usize),
        Ok(Val::Int(i)) => Err(RuntimeError::at(pos, format!("negative list index {}", i))),
        _ => Err(RuntimeError::at(
            pos,
            format!("list index must be int, got {}", from),
        )),
    }
}

fn with_member(val: Val, member: &str, f: f32) -> Result<Val> {
    match (val, member) {
        (Val::Vec2(mut v), "x") => {
            v.x = f;
            Ok(Val::Vec2(v))
        }
        (Val::Vec2(mut v), "y") => {
            v.y = f;
            Ok(Val::Vec2(v))
        }
        (Val::Vec3(mut v), "x") => {
            v.x = f;
            Ok(Val::Vec3(v))
        }
        (Val::Vec3(mut v), "y") => {
            v.y = f;
            Ok(Val::Vec3(v))
        }
        (Val::Vec3(mut v), "z") => {
            v.z = f;
            Ok(Val::Vec3(v))
        }
        (Val::List(_), "length") => Err(RuntimeError::new("list length is read-only")),
        (v, m) => Err(RuntimeError::new(format!(
            "{} has no member '{}'",
            v.ty(),
            m
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::Parser;

    fn run_with(scoping: Scoping, src: &str) -> Result<Interpreter> {
        let tokens = tokenize(src).unwrap();
        let program = Parser::new(&tokens).parse_program().unwrap();
        let mut interp = Interpreter::new(scoping);
        for stmt in &program {
            interp.exec(stmt)?;
        }
        Ok(interp)
    }

    fn run(src: &str) -> Interpreter {
        run_with(Scoping::Lexical, src).unwrap()
    }

    fn global(interp: &Interpreter, name: &str) -> Val {
        interp.env().get_global(name).cloned().unwrap()
    }

    #[test]
    fn declarations_cast_their_initializer() {
        let interp = run("float f = 3; int i = 2.9; float g = (float)3 / 2;");
        assert_eq!(global(&interp, "f"), Val::Float(3.0));
        assert_eq!(global(&interp, "i"), Val::Int(2));
        assert_eq!(global(&interp, "g"), Val::Float(1.5));
    }

    #[test]
    fn uninitialized_declarations_get_defaults() {
        let interp = run("int i; bool b; vec3 v; list l; string s;");
        assert_eq!(global(&interp, "i"), Val::Int(0));
        assert_eq!(global(&interp, "b"), Val::Bool(false));
        assert_eq!(global(&interp, "v"), Val::Vec3(Vec3::ZERO));
        assert_eq!(global(&interp, "s"), Val::string(""));
        let Val::List(id) = global(&interp, "l") else {
            panic!("expected list");
        };
        assert!(interp.heap().list(id).unwrap().is_empty());
    }

    #[test]
    fn void_variables_are_rejected() {
        let err = run_with(Scoping::Lexical, "void v;").err().unwrap();
        assert!(err.message.contains("void"));
    }

    #[test]
    fn chained_comparison_evaluates_right_to_left() {
        let interp = run("bool r = 1 < 2 < 0;");
        assert_eq!(global(&interp, "r"), Val::Bool(false));
    }

    #[test]
    fn assignment_keeps_the_variable_type() {
        let interp = run("int i = 0; i = 2.5; float f = 0.0; f = 2;");
        assert_eq!(global(&interp, "i"), Val::Int(2));
        assert_eq!(global(&interp, "f"), Val::Float(2.0));
        assert!(run_with(Scoping::Lexical, "int i = 0; i = V2(1, 2);").is_err());
    }

    #[test]
    fn member_access_and_assignment() {
        let interp = run("vec3 v = V3(1, 2, 3); float y = v.y; v.z = 9; list l = [v]; l[0].x = 5;");
        assert_eq!(global(&interp, "y"), Val::Float(2.0));
        assert_eq!(global(&interp, "v"), Val::Vec3(Vec3::new(1.0, 2.0, 9.0)));
        let Val::List(id) = global(&interp, "l") else {
            panic!("expected list");
        };
        assert_eq!(
            interp.heap().list(id).unwrap()[0],
            Val::Vec3(Vec3::new(5.0, 2.0, 9.0))
        );
    }

    #[test]
    fn member_access_errors() {
        let message = |src: &str| run_with(Scoping::Lexical, src).err().unwrap().message;
        assert_eq!(
            message("vec2 v = V2(1, 2); float z = v.z;"),
            "vec2 has no member 'z'"
        );
        assert_eq!(message("int i = 3; float x = i.x;"), "int has no member 'x'");
        assert_eq!(message("list l = [1]; float x = l.x;"), "list has no member 'x'");
        assert_eq!(
            message("vec3 v = V3(1, 2, 3); int n = v.length;"),
            "vec3 has no member 'length'"
        );
        assert_eq!(message("vec2 v = V2(1, 2); v.z = 3;"), "vec2 has no member 'z'");
        assert_eq!(message("list l = [1]; l.length = 3;"), "list length is read-only");
    }

    #[test]
    fn casts_of_negative_literals() {
        let interp = run("int y = (int)-2.7; float f = (float)-3; int z = 1 - (int)-2.5;");
        assert_eq!(global(&interp, "y"), Val::Int(-2));
        assert_eq!(global(&interp, "f"), Val::Float(-3.0));
        assert_eq!(global(&interp, "z"), Val::Int(3));
    }

    #[test]
    fn list_assignment_grows_with_zeros() {
        let interp = run("list l = []; l[5] = 1; int n = l.length;");
        assert_eq!(global(&interp, "n"), Val::Int(6));
        let Val::List(id) = global(&interp, "l") else {
            panic!("expected list");
        };
        let items = interp.heap().list(id).unwrap();
        assert_eq!(items[0], Val::Int(0));
        assert_eq!(items[5], Val::Int(1));
    }

    #[test]
    fn list_index_limits() {
        assert!(run_with(Scoping::Lexical, "list l = []; l[16000] = 1;").is_ok());
        let err = run_with(Scoping::Lexical, "list l = []; l[16001] = 1;").err().unwrap();
        assert!(err.message.contains("exceeds"));
        assert!(run_with(Scoping::Lexical, "list l = [1]; int x = l[3];").is_err());
        assert!(run_with(Scoping::Lexical, "list l = [1]; int x = l[-1];").is_err());
    }

    #[test]
    fn lists_alias() {
        let interp = run("list a = [1]; list b = a; b[0] = 7; int x = a[0];");
        assert_eq!(global(&interp, "x"), Val::Int(7));
    }

    #[test]
    fn functions_cast_arguments_and_return() {
        let interp = run(
            "int add(int a, int b) { return a + b; }
             int r = add(2, 3);
             float half(float x) { return x / 2; }
             float h = half(3);",
        );
        assert_eq!(global(&interp, "r"), Val::Int(5));
        assert_eq!(global(&interp, "h"), Val::Float(1.5));
    }

    #[test]
    fn return_stops_only_the_enclosing_call() {
        let interp = run(
            "int first(list l) {
                 for (int i = 0; i < l.length; i = i + 1) {
                     if (l[i] > 2) { return i; }
                 }
                 return -1;
             }
             int a = first([1, 5, 3]);
             int b = first([1, 2]);
             int after = 1;",
        );
        assert_eq!(global(&interp, "a"), Val::Int(1));
        assert_eq!(global(&interp, "b"), Val::Int(-1));
        assert_eq!(global(&interp, "after"), Val::Int(1));
    }

    #[test]
    fn errors_unwind_through_calls() {
        let err = run_with(
            Scoping::Lexical,
            "int inner() { return missing; }
             int outer() { return inner() + 1; }
             int x = outer();",
        )
        .err()
        .unwrap();
        assert!(err.message.contains("missing"));
        assert_eq!(err.pos.map(|p| p.line), Some(1));
    }

    #[test]
    fn frames_are_balanced_after_errors() {
        let tokens = tokenize("int f() { { int y = nope; } return 0; }").unwrap();
        let program = Parser::new(&tokens).parse_program().unwrap();
        let mut interp = Interpreter::new(Scoping::Lexical);
        for stmt in &program {
            interp.exec(stmt).unwrap();
        }
        let Some(Val::Fn(decl)) = interp.env().get_global("f").cloned() else {
            panic!("expected fn");
        };
        assert!(interp.call_fn(&decl, Vec::new()).is_err());
        assert_eq!(interp.env().depth(), 1);
    }

    #[test]
    fn redeclaration_and_shadowing() {
        assert!(run_with(Scoping::Lexical, "int x = 1; int x = 2;").is_err());
        let interp = run("int x = 1; int y = 0; { int x = 2; y = x; }");
        assert_eq!(global(&interp, "x"), Val::Int(1));
        assert_eq!(global(&interp, "y"), Val::Int(2));
    }

    #[test]
    fn redeclaring_a_function_fails() {
        let err = run_with(
            Scoping::Lexical,
            "int f() { return 1; } int f() { return 2; }",
        )
        .err()
        .unwrap();
        assert_eq!(err.message, "'f' is already declared");
    }

    #[test]
    fn for_loop_variable_is_scoped_to_the_loop() {
        let interp = run("int sum = 0; for (int i = 0; i < 4; i = i + 1) sum = sum + i;");
        assert_eq!(global(&interp, "sum"), Val::Int(6));
        assert!(interp.env().get("i").is_none());
    }

    #[test]
    fn conditions_must_be_bool() {
        let err = run_with(Scoping::Lexical, "if (1) { }").err().unwrap();
        assert!(err.message.contains("condition must be bool"));
    }

    #[test]
    fn else_if_chain() {
        let interp = run(
            "int pick(int n) {
                 if (n < 0) { return 0; } else if (n == 0) { return 1; } else { return 2; }
             }
             int a = pick(-3); int b = pick(0); int c = pick(9);",
        );
        assert_eq!(global(&interp, "a"), Val::Int(0));
        assert_eq!(global(&interp, "b"), Val::Int(1));
        assert_eq!(global(&interp, "c"), Val::Int(2));
    }

    #[test]
    fn lexical_calls_cannot_see_caller_locals() {
        let src = "int peek() { return secret; }
                   int caller() { int secret = 4; return peek(); }
                   int r = caller();";
        assert!(run_with(Scoping::Lexical, src).is_err());
        let interp = run_with(Scoping::Dynamic, src).unwrap();
        assert_eq!(global(&interp, "r"), Val::Int(4));
    }

    #[test]
    fn functions_see_globals_and_recurse() {
        let interp = run(
            "int scale = 10;
             int fact(int n) { if (n < 2) { return 1; } return n * fact(n - 1); }
             int r = fact(5) * scale;",
        );
        assert_eq!(global(&interp, "r"), Val::Int(1200));
    }

    #[test]
    fn nested_functions_recurse_only_under_dynamic_scoping() {
        let src = "int outer() {
                       int h(int n) { if (n < 1) { return 0; } return h(n - 1); }
                       return h(3);
                   }
                   int r = outer();";
        let err = run_with(Scoping::Lexical, src).err().unwrap();
        assert_eq!(err.message, "undeclared symbol 'h'");
        let interp = run_with(Scoping::Dynamic, src).unwrap();
        assert_eq!(global(&interp, "r"), Val::Int(0));
    }

    #[test]
    fn calling_with_the_wrong_arity_fails() {
        let err = run_with(Scoping::Lexical, "int f(int a) { return a; } int r = f(1, 2);")
            .err()
            .unwrap();
        assert_eq!(err.message, "'f' expects 1 arguments, got 2");
    }

    #[test]
    fn calling_a_non_function_fails() {
        assert!(run_with(Scoping::Lexical, "int x = 1; int y = x();").is_err());
    }
}
