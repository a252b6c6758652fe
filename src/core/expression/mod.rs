//! Sandboxed arithmetic expressions for `formula_experimental`
//!
//! A plan may carry a `generated_formula` such as
//! `(1 + j / (360 / dias))^(plazo / dias) - 1`. It is tokenized, parsed and
//! evaluated here against the step's resolved inputs. The language has numbers,
//! variables, `+ - * / ^`, parentheses and a handful of math functions. Nothing
//! else: no assignment, no strings, no host access.

pub mod evaluator;
pub mod parser;
pub mod tokenizer;

use regex::{Captures, Regex};

use crate::error::{CalcError, CalcResult};
use crate::types::Inputs;

pub use evaluator::{evaluate, EvalError, Scope};
pub use parser::{parse, Expr, ParseError};
pub use tokenizer::{tokenize, Token, TokenizeError};

/// Tokenize and parse an expression string
pub fn compile(expression: &str) -> CalcResult<Expr> {
    let tokens = tokenize(expression).map_err(|e| CalcError::Expression(e.to_string()))?;
    parse(tokens).map_err(|e| CalcError::Expression(e.to_string()))
}

/// Build the evaluation scope from resolved step inputs.
///
/// Inputs that are not numeric are left unbound, so an expression that uses
/// one fails with an unknown-variable error.
pub fn scope_from_inputs(inputs: &Inputs) -> Scope {
    inputs
        .iter()
        .filter_map(|(name, value)| value.as_number().map(|n| (name.clone(), n)))
        .collect()
}

/// Evaluate a generated formula against resolved inputs
pub fn evaluate_generated(expression: &str, inputs: &Inputs) -> CalcResult<f64> {
    let expr = compile(expression)?;
    evaluate(&expr, &scope_from_inputs(inputs)).map_err(|e| CalcError::Expression(e.to_string()))
}

/// Replace every whole-word input name in `expression` with its value.
///
/// Names inside longer identifiers (`i` in `i_mensual`) or inside numeric
/// literals (`e` in `1e5`) are left alone.
pub fn substitute_inputs(expression: &str, inputs: &Inputs) -> CalcResult<String> {
    let re = Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*\b")
        .map_err(|e| CalcError::Expression(format!("Regex error: {}", e)))?;

    let substituted = re.replace_all(expression, |caps: &Captures| match inputs.get(&caps[0]) {
        Some(value) => value.to_string(),
        None => caps[0].to_string(),
    });
    Ok(substituted.into_owned())
}
