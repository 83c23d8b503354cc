//! Built-in native functions and constants
//!
//! Every script starts with these bound in its global frame. Hosts add
//! their own through [`Script::set_native_fn`](crate::Script::set_native_fn)
//! and can reuse [`check_args`] for signature checking.

use crate::env::Env;
use crate::error::{Result, RuntimeError};
use crate::value::{Heap, NativeFn, Val, ValType};
use glam::{Vec2, Vec3};

/// Validate `args` against `expected`, converting int to float where a
/// float is expected. Returns the converted arguments.
pub fn check_args(name: &str, args: &[Val], expected: &[ValType]) -> Result<Vec<Val>> {
    if args.len() != expected.len() {
        return Err(RuntimeError::new(format!(
            "{} expects {} argument{}, got {}",
            name,
            expected.len(),
            if expected.len() == 1 { "" } else { "s" },
            args.len()
        )));
    }
    args.iter()
        .zip(expected)
        .enumerate()
        .map(|(i, (arg, ty))| {
            arg.clone().cast(*ty).map_err(|_| {
                RuntimeError::new(format!(
                    "{}: argument {} must be {}, got {}",
                    name,
                    i + 1,
                    ty,
                    arg.ty()
                ))
            })
        })
        .collect()
}

fn float_arg(args: &[Val], i: usize) -> f32 {
    args.get(i).and_then(Val::as_float).unwrap_or_default()
}

fn vec3_arg(args: &[Val], i: usize) -> Vec3 {
    match args.get(i) {
        Some(Val::Vec3(v)) => *v,
        _ => Vec3::ZERO,
    }
}

fn unary_float(name: &'static str, f: fn(f32) -> f32) -> NativeFn {
    NativeFn::new(name, move |_, args| {
        let args = check_args(name, args, &[ValType::Float])?;
        Ok(Val::Float(f(float_arg(&args, 0))))
    })
}

fn print(heap: &mut Heap, args: &[Val]) -> Result<Val> {
    let line = args
        .iter()
        .map(|a| heap.display(a))
        .collect::<Vec<_>>()
        .join(" ");
    println!("{}", line);
    Ok(Val::Void)
}

/// The natives every script starts with
pub fn builtins() -> Vec<NativeFn> {
    vec![
        NativeFn::new("print", print),
        NativeFn::new("V2", |_, args| {
            let args = check_args("V2", args, &[ValType::Float, ValType::Float])?;
            Ok(Val::Vec2(Vec2::new(float_arg(&args, 0), float_arg(&args, 1))))
        }),
        NativeFn::new("V3", |_, args| {
            let args = check_args(
                "V3",
                args,
                &[ValType::Float, ValType::Float, ValType::Float],
            )?;
            Ok(Val::Vec3(Vec3::new(
                float_arg(&args, 0),
                float_arg(&args, 1),
                float_arg(&args, 2),
            )))
        }),
        NativeFn::new("vec3_length", |_, args| {
            let args = check_args("vec3_length", args, &[ValType::Vec3])?;
            Ok(Val::Float(vec3_arg(&args, 0).length()))
        }),
        NativeFn::new("vec3_normalize", |_, args| {
            let args = check_args("vec3_normalize", args, &[ValType::Vec3])?;
            Ok(Val::Vec3(vec3_arg(&args, 0).normalize_or_zero()))
        }),
        NativeFn::new("vec3_distance", |_, args| {
            let args = check_args("vec3_distance", args, &[ValType::Vec3, ValType::Vec3])?;
            Ok(Val::Float(vec3_arg(&args, 0).distance(vec3_arg(&args, 1))))
        }),
        unary_float("sin", f32::sin),
        unary_float("cos", f32::cos),
        unary_float("asin", f32::asin),
        unary_float("acos", f32::acos),
        unary_float("sqrt", f32::sqrt),
    ]
}

/// Bind built-in natives and constants into the global frame
pub fn install(env: &mut Env) {
    for native in builtins() {
        let name = native.name().to_string();
        env.define_global(&name, Val::NativeFn(native));
    }
    env.define_global("PI", Val::Float(std::f32::consts::PI));
    env.define_global("true", Val::Bool(true));
    env.define_global("false", Val::Bool(false));
}
