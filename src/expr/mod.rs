//! Expr Module - safe expression language for conditions and computed values
//!
//! - `lexer`: tokens
//! - `parser`: recursive-descent parser → [`Expr`]
//! - `eval`: tree-walking evaluator (JavaScript-like truthiness/equality)
//!
//! Context keys are the only bindings; there is no host-code escape hatch.
//!
//! ```rust,ignore
//! let scope = json!({"framework": "react"}).as_object().cloned().unwrap();
//! assert!(kiln::expr::eval_truthy("framework === 'react'", &scope)?);
//! ```

mod eval;
mod lexer;
mod parser;

pub use eval::{display, evaluate, evaluate_truthy, number, truthy};
pub use parser::{parse, BinaryOp, Expr, UnaryOp};

use serde_json::{Map, Value};

use crate::error::{KilnError, Result};

/// Parse and evaluate `source` in one step
pub fn eval_str(source: &str, scope: &Map<String, Value>) -> Result<Value> {
    let expr = parse(source)?;
    evaluate(&expr, scope).map_err(|e| attach_expression(e, source))
}

/// Parse, evaluate and apply truthiness
pub fn eval_truthy(source: &str, scope: &Map<String, Value>) -> Result<bool> {
    let expr = parse(source)?;
    evaluate_truthy(&expr, scope).map_err(|e| attach_expression(e, source))
}

/// Runtime type errors are raised without the source text; fill it in.
fn attach_expression(error: KilnError, source: &str) -> KilnError {
    match error {
        KilnError::ExpressionError { expression, reason } if expression.is_empty() => {
            KilnError::ExpressionError {
                expression: source.to_string(),
                reason,
            }
        }
        other => other,
    }
}
