//! Tree-walking evaluator with JavaScript-like value semantics
//!
//! The only bindings are the keys of the scope map. Calls are restricted to a
//! small set of string/array methods.

use serde_json::{Map, Number, Value};

use crate::error::{KilnError, Result};

use super::parser::{BinaryOp, Expr, UnaryOp};

/// Intermediate value: `None` is `undefined`
type Val = Option<Value>;

/// JSON number from an f64, kept integral when it is one
pub fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 9.0e15 {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// JavaScript truthiness
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn truthy_val(value: &Val) -> bool {
    value.as_ref().is_some_and(truthy)
}

/// String conversion used by `+` and templates
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => (f as i64).to_string(),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(display).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn display_val(value: &Val) -> String {
    value
        .as_ref()
        .map(display)
        .unwrap_or_else(|| "undefined".to_string())
}

fn to_number(value: &Val) -> f64 {
    match value {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) if s.trim().is_empty() => 0.0,
        Some(Value::String(s)) => s.trim().parse().unwrap_or(f64::NAN),
        Some(Value::Array(_)) | Some(Value::Object(_)) => f64::NAN,
    }
}

fn strict_eq(left: &Val, right: &Val) -> bool {
    match (left, right) {
        (None, None) => true,
        (Some(Value::Number(a)), Some(Value::Number(b))) => a.as_f64() == b.as_f64(),
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn loose_eq(left: &Val, right: &Val) -> bool {
    let nullish = |v: &Val| matches!(v, None | Some(Value::Null));
    if nullish(left) || nullish(right) {
        return nullish(left) && nullish(right);
    }
    match (left, right) {
        (Some(Value::String(a)), Some(Value::String(b))) => a == b,
        (Some(Value::Array(_) | Value::Object(_)), _) | (_, Some(Value::Array(_) | Value::Object(_))) => {
            strict_eq(left, right)
        }
        _ => to_number(left) == to_number(right),
    }
}

/// Evaluate a parsed expression against `scope`
pub fn evaluate(expr: &Expr, scope: &Map<String, Value>) -> Result<Value> {
    Ok(eval(expr, scope)?.unwrap_or(Value::Null))
}

/// Evaluate and apply truthiness
pub fn evaluate_truthy(expr: &Expr, scope: &Map<String, Value>) -> Result<bool> {
    Ok(truthy_val(&eval(expr, scope)?))
}

fn type_error(reason: String) -> KilnError {
    KilnError::ExpressionError {
        expression: String::new(),
        reason,
    }
}

fn eval(expr: &Expr, scope: &Map<String, Value>) -> Result<Val> {
    match expr {
        Expr::Literal(value) => Ok(Some(value.clone())),
        Expr::Undefined => Ok(None),
        Expr::Array(items) => {
            let values = items
                .iter()
                .map(|item| eval(item, scope).map(|v| v.unwrap_or(Value::Null)))
                .collect::<Result<Vec<_>>>()?;
            Ok(Some(Value::Array(values)))
        }
        Expr::Ident(name) => scope
            .get(name)
            .cloned()
            .map(Some)
            .ok_or_else(|| KilnError::UndefinedReference { name: name.clone() }),
        Expr::Member(target, name) => {
            let target = eval(target, scope)?;
            property(&target, name)
        }
        Expr::Index(target, index) => {
            let target = eval(target, scope)?;
            let index = eval(index, scope)?;
            match (&target, &index) {
                (Some(Value::Array(items)), Some(Value::Number(n))) => Ok(n
                    .as_u64()
                    .and_then(|i| items.get(i as usize))
                    .cloned()),
                (Some(Value::String(s)), Some(Value::Number(n))) => Ok(n
                    .as_u64()
                    .and_then(|i| s.chars().nth(i as usize))
                    .map(|c| Value::String(c.to_string()))),
                _ => property(&target, &display_val(&index)),
            }
        }
        Expr::Call {
            target,
            method,
            args,
        } => {
            let target = eval(target, scope)?;
            let args = args
                .iter()
                .map(|arg| eval(arg, scope))
                .collect::<Result<Vec<_>>>()?;
            call(&target, method, &args)
        }
        Expr::Unary(op, operand) => {
            let value = eval(operand, scope)?;
            Ok(Some(match op {
                UnaryOp::Not => Value::Bool(!truthy_val(&value)),
                UnaryOp::Neg => number(-to_number(&value)),
            }))
        }
        Expr::Binary(BinaryOp::And, left, right) => {
            let left = eval(left, scope)?;
            if truthy_val(&left) {
                eval(right, scope)
            } else {
                Ok(left)
            }
        }
        Expr::Binary(BinaryOp::Or, left, right) => {
            let left = eval(left, scope)?;
            if truthy_val(&left) {
                Ok(left)
            } else {
                eval(right, scope)
            }
        }
        Expr::Binary(op, left, right) => {
            let left = eval(left, scope)?;
            let right = eval(right, scope)?;
            Ok(Some(binary(*op, &left, &right)))
        }
        Expr::Ternary(condition, if_true, if_false) => {
            if truthy_val(&eval(condition, scope)?) {
                eval(if_true, scope)
            } else {
                eval(if_false, scope)
            }
        }
    }
}

fn binary(op: BinaryOp, left: &Val, right: &Val) -> Value {
    match op {
        BinaryOp::Add => match (left, right) {
            (Some(Value::String(_)), _) | (_, Some(Value::String(_))) => {
                Value::String(format!("{}{}", display_val(left), display_val(right)))
            }
            _ => number(to_number(left) + to_number(right)),
        },
        BinaryOp::Sub => number(to_number(left) - to_number(right)),
        BinaryOp::Mul => number(to_number(left) * to_number(right)),
        BinaryOp::Div => number(to_number(left) / to_number(right)),
        BinaryOp::Rem => number(to_number(left) % to_number(right)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = match (left, right) {
                (Some(Value::String(a)), Some(Value::String(b))) => Some(a.cmp(b)),
                _ => to_number(left).partial_cmp(&to_number(right)),
            };
            Value::Bool(ordering.is_some_and(|o| match op {
                BinaryOp::Lt => o.is_lt(),
                BinaryOp::Le => o.is_le(),
                BinaryOp::Gt => o.is_gt(),
                _ => o.is_ge(),
            }))
        }
        BinaryOp::LooseEq => Value::Bool(loose_eq(left, right)),
        BinaryOp::LooseNe => Value::Bool(!loose_eq(left, right)),
        BinaryOp::StrictEq => Value::Bool(strict_eq(left, right)),
        BinaryOp::StrictNe => Value::Bool(!strict_eq(left, right)),
        // Short-circuit operators are handled in `eval`
        BinaryOp::And | BinaryOp::Or => Value::Null,
    }
}

fn property(target: &Val, name: &str) -> Result<Val> {
    match target {
        None | Some(Value::Null) => Err(type_error(format!(
            "cannot read property '{}' of {}",
            name,
            display_val(target)
        ))),
        Some(Value::Object(map)) => Ok(map.get(name).cloned()),
        Some(Value::Array(items)) if name == "length" => Ok(Some(Value::from(items.len()))),
        Some(Value::String(s)) if name == "length" => Ok(Some(Value::from(s.chars().count()))),
        Some(_) => Ok(None),
    }
}

fn call(target: &Val, method: &str, args: &[Val]) -> Result<Val> {
    let arg_str = |i: usize| args.get(i).map(display_val).unwrap_or_default();

    let result = match (target, method) {
        (Some(Value::String(s)), "includes") => Value::Bool(s.contains(&arg_str(0))),
        (Some(Value::String(s)), "startsWith") => Value::Bool(s.starts_with(&arg_str(0))),
        (Some(Value::String(s)), "endsWith") => Value::Bool(s.ends_with(&arg_str(0))),
        (Some(Value::String(s)), "toLowerCase") => Value::String(s.to_lowercase()),
        (Some(Value::String(s)), "toUpperCase") => Value::String(s.to_uppercase()),
        (Some(Value::String(s)), "trim") => Value::String(s.trim().to_string()),
        (Some(Value::Array(items)), "includes") => {
            let needle = args.first().cloned().flatten();
            Value::Bool(
                items
                    .iter()
                    .any(|item| strict_eq(&Some(item.clone()), &needle)),
            )
        }
        _ => {
            return Err(type_error(format!(
                "'{}' is not a supported method on {}",
                method,
                display_val(target)
            )))
        }
    };
    Ok(Some(result))
}
