//! Expression evaluator
//!
//! Walks an AST and produces a number. Only arithmetic and a fixed set of math
//! functions are available; variables come exclusively from the bound scope.

use super::parser::{Expr, MAX_DEPTH};
use std::collections::HashMap;

/// Variable bindings for one evaluation
#[derive(Debug, Clone, Default)]
pub struct Scope {
    variables: HashMap<String, f64>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.variables.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.variables.get(name).copied()
    }
}

impl FromIterator<(String, f64)> for Scope {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            variables: iter.into_iter().collect(),
        }
    }
}

/// Error during evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct EvalError {
    pub message: String,
}

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Eval error: {}", self.message)
    }
}

impl std::error::Error for EvalError {}

/// Evaluate an expression against the given scope.
///
/// Arithmetic follows IEEE-754: `1/0` yields infinity and `log(-1)` yields NaN.
/// Callers decide whether such values are acceptable.
pub fn evaluate(expr: &Expr, scope: &Scope) -> Result<f64, EvalError> {
    evaluate_at(expr, scope, 0)
}

/// Long operator chains build deep trees without deep parser nesting
fn evaluate_at(expr: &Expr, scope: &Scope, depth: usize) -> Result<f64, EvalError> {
    if depth > MAX_DEPTH {
        return Err(EvalError::new("Expression nested too deeply"));
    }
    let depth = depth + 1;

    match expr {
        Expr::Number(n) => Ok(*n),

        Expr::Variable(name) => scope
            .get(name)
            .or_else(|| constant(name))
            .ok_or_else(|| EvalError::new(format!("Unknown variable: {}", name))),

        Expr::FunctionCall { name, args } => evaluate_function(name, args, scope, depth),

        Expr::BinaryOp { op, left, right } => {
            let l = evaluate_at(left, scope, depth)?;
            let r = evaluate_at(right, scope, depth)?;
            match op.as_str() {
                "+" => Ok(l + r),
                "-" => Ok(l - r),
                "*" => Ok(l * r),
                "/" => Ok(l / r),
                "^" => Ok(l.powf(r)),
                _ => Err(EvalError::new(format!("Unknown operator: {}", op))),
            }
        }

        Expr::UnaryOp { op, operand } => {
            let val = evaluate_at(operand, scope, depth)?;
            match op.as_str() {
                "-" => Ok(-val),
                "+" => Ok(val),
                _ => Err(EvalError::new(format!("Unknown unary operator: {}", op))),
            }
        }
    }
}

/// Named constants, consulted only when the scope has no binding of that name
fn constant(name: &str) -> Option<f64> {
    match name {
        "pi" | "PI" => Some(std::f64::consts::PI),
        "e" | "E" => Some(std::f64::consts::E),
        _ => None,
    }
}

fn evaluate_function(
    name: &str,
    args: &[Expr],
    scope: &Scope,
    depth: usize,
) -> Result<f64, EvalError> {
    let lower_name = name.to_lowercase();
    let values = args
        .iter()
        .map(|arg| evaluate_at(arg, scope, depth))
        .collect::<Result<Vec<f64>, EvalError>>()?;

    match lower_name.as_str() {
        // log(x) is the natural logarithm; log(x, base) uses the given base
        "log" => match values.as_slice() {
            [x] => Ok(x.ln()),
            [x, base] => Ok(x.ln() / base.ln()),
            _ => Err(arity_error(&lower_name, "1 or 2", values.len())),
        },
        "ln" => unary(&lower_name, &values, f64::ln),
        "log10" => unary(&lower_name, &values, f64::log10),
        "exp" => unary(&lower_name, &values, f64::exp),
        "sqrt" => unary(&lower_name, &values, f64::sqrt),
        "abs" => unary(&lower_name, &values, f64::abs),
        "pow" => match values.as_slice() {
            [base, exponent] => Ok(base.powf(*exponent)),
            _ => Err(arity_error(&lower_name, "2", values.len())),
        },
        _ => Err(EvalError::new(format!("Unknown function: {}", name))),
    }
}

fn unary(name: &str, values: &[f64], f: fn(f64) -> f64) -> Result<f64, EvalError> {
    match values {
        [x] => Ok(f(*x)),
        _ => Err(arity_error(name, "1", values.len())),
    }
}

fn arity_error(name: &str, expected: &str, got: usize) -> EvalError {
    EvalError::new(format!(
        "{}() requires {} argument(s), got {}",
        name, expected, got
    ))
}
