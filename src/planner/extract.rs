//! Pull a plan out of free-form model output
//!
//! Models are asked for bare JSON but often wrap it in a ```json fence or in
//! prose. A fenced block wins; otherwise the first well-formed JSON value that
//! starts at a `{` or `[` is used.

use regex::Regex;

use crate::error::{CalcError, CalcResult};
use crate::parser::plan_from_value;
use crate::types::CalculationPlan;

/// Locate the first JSON object or array in `raw`
pub fn extract_json(raw: &str) -> CalcResult<serde_json::Value> {
    let fence = Regex::new(r"(?s)```(?:json|JSON)?[ \t]*\r?\n(.*?)```")
        .map_err(|e| CalcError::MalformedResponse(format!("Regex error: {}", e)))?;

    if let Some(caps) = fence.captures(raw) {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(caps[1].trim()) {
            return Ok(value);
        }
    }

    for (start, _) in raw.match_indices(['{', '[']) {
        let mut values =
            serde_json::Deserializer::from_str(&raw[start..]).into_iter::<serde_json::Value>();
        if let Some(Ok(value)) = values.next() {
            return Ok(value);
        }
    }

    Err(CalcError::MalformedResponse(
        "The model response does not contain a valid JSON object".to_string(),
    ))
}

/// Extract and shape-check a calculation plan from model output
pub fn extract_plan(raw: &str) -> CalcResult<CalculationPlan> {
    let value = extract_json(raw)?;
    plan_from_value(value).map_err(|e| CalcError::MalformedResponse(e.to_string()))
}
