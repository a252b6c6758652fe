use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

//==============================================================================
// Plan values
//==============================================================================

/// A literal in `initial_data` or a step's `inputs`: a number or a string.
///
/// Strings of the exact form `{{name}}` are back-references to a value
/// computed earlier in the same plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    /// Numeric view of the value. Text is accepted when it parses as a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse().ok(),
        }
    }

    /// The referenced variable name if this value is a `{{name}}` back-reference
    pub fn as_reference(&self) -> Option<&str> {
        match self {
            Value::Text(s) => parse_reference(s),
            Value::Number(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&format_value(*n)),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

/// Render a number the way it appears in substituted formulas.
///
/// Plain decimal notation, except that magnitudes of `1e21` and above or
/// below `1e-6` switch to exponent form (`1e+21`, `1.5e-7`).
pub fn format_value(n: f64) -> String {
    let magnitude = n.abs();
    if !n.is_finite() || magnitude == 0.0 || (1e-6..1e21).contains(&magnitude) {
        return n.to_string();
    }

    let formatted = format!("{:e}", n);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => formatted,
    }
}

/// Parse a back-reference of the exact form `{{name}}`.
///
/// The inner name must be non-empty and contain no braces; anything else is
/// an ordinary string literal.
pub fn parse_reference(s: &str) -> Option<&str> {
    let inner = s.strip_prefix("{{")?.strip_suffix("}}")?;
    if inner.is_empty() || inner.contains(['{', '}']) {
        return None;
    }
    Some(inner)
}

/// Named values, as found in `initial_data` and step `inputs`
pub type Inputs = BTreeMap<String, Value>;

//==============================================================================
// Calculation plan
//==============================================================================

/// Sentinel formula name for plan-supplied expressions
pub const EXPERIMENTAL_FORMULA: &str = "formula_experimental";

/// An ordered calculation plan, as produced by the planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationPlan {
    /// Free-text restatement of the problem (display only)
    #[serde(default)]
    pub interpretation: String,
    #[serde(default)]
    pub initial_data: Inputs,
    pub final_target_variable: String,
    pub calculation_steps: Vec<CalculationStep>,
}

/// One formula application within a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationStep {
    pub step_name: String,
    pub target_variable: String,
    pub formula_name: String,
    #[serde(default)]
    pub inputs: Inputs,
    /// Only meaningful when `formula_name` is `formula_experimental`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_formula: Option<String>,
}

impl CalculationStep {
    pub fn is_experimental(&self) -> bool {
        self.formula_name == EXPERIMENTAL_FORMULA
    }

    /// The generated expression, unless absent or blank
    pub fn expression(&self) -> Option<&str> {
        self.generated_formula
            .as_deref()
            .filter(|expression| !expression.trim().is_empty())
    }

    /// Names referenced through `{{name}}` inputs, in input-name order
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.inputs.values().filter_map(Value::as_reference)
    }
}

/// A step after execution: resolved inputs plus its result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutedStep {
    /// The step as planned, with `inputs` replaced by their resolved values
    #[serde(flatten)]
    pub step: CalculationStep,
    pub result: f64,
    pub substituted_formula: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reference_exact_delimiters() {
        assert_eq!(parse_reference("{{i_mensual}}"), Some("i_mensual"));
        assert_eq!(parse_reference("{{ x }}"), Some(" x "));
        assert_eq!(parse_reference("{i}"), None);
        assert_eq!(parse_reference("{{i}"), None);
        assert_eq!(parse_reference("x{{i}}"), None);
        assert_eq!(parse_reference("{{}}"), None);
        assert_eq!(parse_reference("{{{i}}}"), None);
        assert_eq!(parse_reference("{{a}}{{b}}"), None);
    }

    #[test]
    fn test_value_untagged_deserialize() {
        let inputs: Inputs =
            serde_json::from_str(r#"{"P": 1000, "i": "{{i_q}}", "label": "abc"}"#).unwrap();
        assert_eq!(inputs["P"], Value::Number(1000.0));
        assert_eq!(inputs["i"].as_reference(), Some("i_q"));
        assert_eq!(inputs["label"], Value::Text("abc".to_string()));
    }

    #[test]
    fn test_value_as_number() {
        assert_eq!(Value::Number(0.12).as_number(), Some(0.12));
        assert_eq!(Value::from(" 1500 ").as_number(), Some(1500.0));
        assert_eq!(Value::from("{{x}}").as_number(), None);
    }

    #[test]
    fn test_value_display_matches_plain_numbers() {
        assert_eq!(Value::Number(1240.0).to_string(), "1240");
        assert_eq!(Value::Number(0.12).to_string(), "0.12");
        assert_eq!(Value::from("txt").to_string(), "txt");
    }

    #[test]
    fn test_format_value_exponent_ranges() {
        assert_eq!(format_value(1e21), "1e+21");
        assert_eq!(format_value(-2.5e22), "-2.5e+22");
        assert_eq!(format_value(1.5e-7), "1.5e-7");
        assert_eq!(format_value(1e20), "100000000000000000000");
        assert_eq!(format_value(0.000001), "0.000001");
        assert_eq!(format_value(0.0), "0");
        assert_eq!(Value::Number(1e21).to_string(), "1e+21");
    }

    #[test]
    fn test_executed_step_serializes_flat() {
        let executed = ExecutedStep {
            step: CalculationStep {
                step_name: "Monto".to_string(),
                target_variable: "S".to_string(),
                formula_name: "formula_is_S_from_Pjn".to_string(),
                inputs: Inputs::new(),
                generated_formula: None,
            },
            result: 1240.0,
            substituted_formula: "x = 1240".to_string(),
        };
        let json = serde_json::to_value(&executed).unwrap();
        assert_eq!(json["target_variable"], "S");
        assert_eq!(json["result"], 1240.0);
        assert!(json.get("generated_formula").is_none());
        assert!(json.get("step").is_none());
    }
}
