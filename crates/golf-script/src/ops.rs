//! Binary operators
//!
//! `int op int` stays int; any float operand promotes to float. Vectors add
//! and subtract with their own kind and scale by scalars. Comparisons work
//! on numbers, with `==` also defined on two bools. A bool compared against
//! a number is promoted to 0 or 1, which is how chained comparisons such as
//! `1 < 2 < 0` evaluate.

use crate::ast::BinOp;
use crate::error::{Result, RuntimeError};
use crate::value::Val;
use std::cmp::Ordering;

pub fn binary(op: BinOp, left: &Val, right: &Val) -> Result<Val> {
    if op.is_comparison() {
        compare(op, left, right)
    } else {
        arithmetic(op, left, right)
    }
}

fn undefined(op: BinOp, left: &Val, right: &Val) -> RuntimeError {
    RuntimeError::new(format!(
        "operator '{}' is not defined for {} and {}",
        op.symbol(),
        left.ty(),
        right.ty()
    ))
}

fn arithmetic(op: BinOp, left: &Val, right: &Val) -> Result<Val> {
    use Val::{Float, Int, Vec2, Vec3};

    match (left, right) {
        (Int(a), Int(b)) => int_arith(op, *a, *b),
        (Int(_) | Float(_), Int(_) | Float(_)) => {
            let (a, b) = (left.as_float(), right.as_float());
            match (a, b) {
                (Some(a), Some(b)) => Ok(Float(float_arith(op, a, b))),
                _ => Err(undefined(op, left, right)),
            }
        }
        (Vec2(a), Vec2(b)) => match op {
            BinOp::Add => Ok(Vec2(*a + *b)),
            BinOp::Sub => Ok(Vec2(*a - *b)),
            _ => Err(undefined(op, left, right)),
        },
        (Vec3(a), Vec3(b)) => match op {
            BinOp::Add => Ok(Vec3(*a + *b)),
            BinOp::Sub => Ok(Vec3(*a - *b)),
            _ => Err(undefined(op, left, right)),
        },
        (Vec2(v), s) => match (op, s.as_float()) {
            (BinOp::Mul, Some(s)) => Ok(Vec2(*v * s)),
            (BinOp::Div, Some(s)) => Ok(Vec2(*v / s)),
            _ => Err(undefined(op, left, right)),
        },
        (Vec3(v), s) => match (op, s.as_float()) {
            (BinOp::Mul, Some(s)) => Ok(Vec3(*v * s)),
            (BinOp::Div, Some(s)) => Ok(Vec3(*v / s)),
            _ => Err(undefined(op, left, right)),
        },
        (s, Vec2(v)) => match (op, s.as_float()) {
            (BinOp::Mul, Some(s)) => Ok(Vec2(s * *v)),
            _ => Err(undefined(op, left, right)),
        },
        (s, Vec3(v)) => match (op, s.as_float()) {
            (BinOp::Mul, Some(s)) => Ok(Vec3(s * *v)),
            _ => Err(undefined(op, left, right)),
        },
        _ => Err(undefined(op, left, right)),
    }
}

fn int_arith(op: BinOp, a: i32, b: i32) -> Result<Val> {
    let v = match op {
        BinOp::Add => a.wrapping_add(b),
        BinOp::Sub => a.wrapping_sub(b),
        BinOp::Mul => a.wrapping_mul(b),
        BinOp::Div => {
            if b == 0 {
                return Err(RuntimeError::new("integer division by zero"));
            }
            a.wrapping_div(b)
        }
        _ => return Err(RuntimeError::new(format!("'{}' is not arithmetic", op.symbol()))),
    };
    Ok(Val::Int(v))
}

fn float_arith(op: BinOp, a: f32, b: f32) -> f32 {
    match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        _ => a / b,
    }
}

/// Bools facing a number compare as 0 or 1
fn promote_bool(val: &Val, other: &Val) -> Val {
    match val {
        Val::Bool(b) if other.ty().is_numeric() => Val::Int(i32::from(*b)),
        v => v.clone(),
    }
}

fn compare(op: BinOp, left: &Val, right: &Val) -> Result<Val> {
    let l = promote_bool(left, right);
    let r = promote_bool(right, left);

    let ordering = match (&l, &r) {
        (Val::Int(a), Val::Int(b)) => Some(a.cmp(b)),
        (Val::Bool(a), Val::Bool(b)) if op == BinOp::Eq => return Ok(Val::Bool(a == b)),
        _ => match (l.as_float(), r.as_float()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => return Err(undefined(op, left, right)),
        },
    };

    // NaN compares false against everything
    let Some(ordering) = ordering else {
        return Ok(Val::Bool(false));
    };
    let result = match op {
        BinOp::Lt => ordering == Ordering::Less,
        BinOp::Gt => ordering == Ordering::Greater,
        BinOp::Le => ordering != Ordering::Greater,
        BinOp::Ge => ordering != Ordering::Less,
        _ => ordering == Ordering::Equal,
    };
    Ok(Val::Bool(result))
}
