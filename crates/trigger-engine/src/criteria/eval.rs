//! Criteria expression evaluation
//!
//! Evaluates a compiled [`Program`] against the read-only `event`
//! environment tree. Field access on a missing key yields an absent
//! marker rather than an error: equality against absent is false,
//! ordering against absent is a non-match. Only operations the language
//! itself rejects (logical operators on non-booleans, a non-boolean
//! final result) produce errors.

use anyhow::{bail, Result};
use serde_json::Value;
use std::cmp::Ordering;

use super::parser::{BinaryOp, Expr, Program};

/// Result of evaluating a sub-expression
#[derive(Debug, Clone)]
enum Evaluated {
    /// A field path walked off the environment tree
    Absent,
    Present(Value),
}

impl Program {
    /// Run the program against an environment tree.
    ///
    /// `env` is the object exposing the root variables, i.e.
    /// `{"event": {...}}`. Errors if the expression does not evaluate to
    /// a boolean.
    pub fn eval(&self, env: &Value) -> Result<bool> {
        match eval_expr(&self.root, env)? {
            Evaluated::Present(Value::Bool(value)) => Ok(value),
            _ => bail!("criteria expression did not evaluate to a boolean"),
        }
    }
}

fn eval_expr(expr: &Expr, env: &Value) -> Result<Evaluated> {
    match expr {
        Expr::Bool(value) => Ok(Evaluated::Present(Value::Bool(*value))),
        Expr::Int(value) => Ok(Evaluated::Present(Value::from(*value))),
        Expr::Float(value) => Ok(Evaluated::Present(Value::from(*value))),
        Expr::Str(value) => Ok(Evaluated::Present(Value::String(value.clone()))),
        Expr::Path(segments) => Ok(walk_path(segments, env)),
        Expr::Not(inner) => match eval_expr(inner, env)? {
            Evaluated::Present(Value::Bool(value)) => {
                Ok(Evaluated::Present(Value::Bool(!value)))
            }
            _ => bail!("operand of '!' is not a boolean"),
        },
        Expr::Neg(inner) => match eval_expr(inner, env)? {
            Evaluated::Present(Value::Number(n)) => match n.as_f64() {
                Some(value) if n.is_f64() => Ok(Evaluated::Present(Value::from(-value))),
                _ => match n.as_i64() {
                    Some(value) => Ok(Evaluated::Present(Value::from(-value))),
                    None => bail!("cannot negate {}", n),
                },
            },
            _ => bail!("operand of '-' is not a number"),
        },
        Expr::Call { name: _, args } => eval_has(args, env),
        Expr::Binary { op, lhs, rhs } => eval_binary(*op, lhs, rhs, env),
    }
}

fn eval_binary(op: BinaryOp, lhs: &Expr, rhs: &Expr, env: &Value) -> Result<Evaluated> {
    match op {
        BinaryOp::And | BinaryOp::Or => {
            let lhs = match eval_expr(lhs, env)? {
                Evaluated::Present(Value::Bool(value)) => value,
                _ => bail!("left operand of '{}' is not a boolean", logical_symbol(op)),
            };
            // Short-circuit
            if (op == BinaryOp::And && !lhs) || (op == BinaryOp::Or && lhs) {
                return Ok(Evaluated::Present(Value::Bool(lhs)));
            }
            match eval_expr(rhs, env)? {
                Evaluated::Present(Value::Bool(value)) => {
                    Ok(Evaluated::Present(Value::Bool(value)))
                }
                _ => bail!("right operand of '{}' is not a boolean", logical_symbol(op)),
            }
        }
        BinaryOp::Eq | BinaryOp::Ne => {
            let lhs = eval_expr(lhs, env)?;
            let rhs = eval_expr(rhs, env)?;
            let equal = values_equal(&lhs, &rhs);
            let result = if op == BinaryOp::Eq { equal } else { !equal };
            Ok(Evaluated::Present(Value::Bool(result)))
        }
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let lhs = eval_expr(lhs, env)?;
            let rhs = eval_expr(rhs, env)?;
            let result = match compare_values(&lhs, &rhs) {
                Some(ordering) => match op {
                    BinaryOp::Lt => ordering == Ordering::Less,
                    BinaryOp::Le => ordering != Ordering::Greater,
                    BinaryOp::Gt => ordering == Ordering::Greater,
                    BinaryOp::Ge => ordering != Ordering::Less,
                    _ => unreachable!(),
                },
                // Mixed or non-comparable operand types are a non-match
                None => false,
            };
            Ok(Evaluated::Present(Value::Bool(result)))
        }
    }
}

fn logical_symbol(op: BinaryOp) -> &'static str {
    if op == BinaryOp::And {
        "&&"
    } else {
        "||"
    }
}

/// Walk a dotted path from the environment root. Any missing key or
/// descent into a non-object yields `Absent`.
fn walk_path(segments: &[String], env: &Value) -> Evaluated {
    let mut current = env;
    for segment in segments {
        match current.get(segment) {
            Some(next) => current = next,
            None => return Evaluated::Absent,
        }
    }
    Evaluated::Present(current.clone())
}

/// Equality with defined coercions: both booleans, both numbers (compared
/// as f64), both strings or both null. Absent on either side, or any
/// other pairing, is not equal.
fn values_equal(lhs: &Evaluated, rhs: &Evaluated) -> bool {
    let (Evaluated::Present(lhs), Evaluated::Present(rhs)) = (lhs, rhs) else {
        return false;
    };
    match (lhs, rhs) {
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Null, Value::Null) => true,
        _ => false,
    }
}

/// Ordering with defined coercions: both numbers (as f64) or both
/// strings. Anything else is not comparable.
fn compare_values(lhs: &Evaluated, rhs: &Evaluated) -> Option<Ordering> {
    let (Evaluated::Present(lhs), Evaluated::Present(rhs)) = (lhs, rhs) else {
        return None;
    };
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// The `has(map, "a.b.c")` builtin: true iff every segment of the
/// dot-delimited path exists and every non-final segment's value is
/// itself a mapping. Every negative case is `false`, never an error
/// (arity is enforced at compile time).
fn eval_has(args: &[Expr], env: &Value) -> Result<Evaluated> {
    let root = eval_expr(&args[0], env)?;
    let path = eval_expr(&args[1], env)?;

    let found = match (&root, &path) {
        (Evaluated::Present(Value::Object(map)), Evaluated::Present(Value::String(path))) => {
            has_path(map, path)
        }
        _ => false,
    };
    Ok(Evaluated::Present(Value::Bool(found)))
}

fn has_path(map: &serde_json::Map<String, Value>, path: &str) -> bool {
    let mut current = map;
    let mut parts = path.split('.').peekable();
    while let Some(part) = parts.next() {
        let Some(value) = current.get(part) else {
            return false;
        };
        if parts.peek().is_none() {
            return true;
        }
        // Not final, so it must be a nested map
        let Value::Object(next) = value else {
            return false;
        };
        current = next;
    }
    false
}
