use crate::error::{CalcError, CalcResult};
use crate::types::CalculationPlan;
use jsonschema::JSONSchema;
use std::path::Path;

/// On-disk encoding of a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanFormat {
    Json,
    Yaml,
}

impl PlanFormat {
    /// `.yaml` / `.yml` are YAML; everything else is read as JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                PlanFormat::Yaml
            }
            _ => PlanFormat::Json,
        }
    }

    /// Guess from content: a leading `{` means JSON
    pub fn sniff(content: &str) -> Self {
        if content.trim_start().starts_with('{') {
            PlanFormat::Json
        } else {
            PlanFormat::Yaml
        }
    }
}

/// Load and validate a calculation plan file.
///
/// The format is chosen by extension. The document is checked against the
/// embedded plan schema before it is deserialized, so structural problems are
/// all reported together.
///
/// # Example
/// ```no_run
/// use financalc::parser::parse_plan;
/// use std::path::Path;
///
/// let plan = parse_plan(Path::new("plan.json"))?;
/// println!("Steps: {}", plan.calculation_steps.len());
/// # Ok::<(), financalc::error::CalcError>(())
/// ```
pub fn parse_plan(path: &Path) -> CalcResult<CalculationPlan> {
    let content = std::fs::read_to_string(path)?;
    parse_plan_as(&content, PlanFormat::from_path(path))
}

/// Parse a plan from a string, detecting JSON or YAML from its content
pub fn parse_plan_str(content: &str) -> CalcResult<CalculationPlan> {
    parse_plan_as(content, PlanFormat::sniff(content))
}

/// Parse a plan from a string in a known format
pub fn parse_plan_as(content: &str, format: PlanFormat) -> CalcResult<CalculationPlan> {
    let value: serde_json::Value = match format {
        PlanFormat::Json => serde_json::from_str(content)?,
        PlanFormat::Yaml => {
            let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;
            serde_json::to_value(yaml).map_err(|e| {
                CalcError::Validation(format!("Failed to convert YAML to JSON: {}", e))
            })?
        }
    };
    plan_from_value(value)
}

/// Validate a JSON document against the plan schema and deserialize it
pub fn plan_from_value(value: serde_json::Value) -> CalcResult<CalculationPlan> {
    validate_against_schema(&value)?;
    Ok(serde_json::from_value(value)?)
}

/// Validate a JSON document against the calculation plan JSON Schema
pub fn validate_against_schema(value: &serde_json::Value) -> CalcResult<()> {
    let schema_str = include_str!("../../schema/calculation-plan.schema.json");
    let schema_value: serde_json::Value = serde_json::from_str(schema_str)
        .map_err(|e| CalcError::Validation(format!("Failed to parse schema: {}", e)))?;

    let compiled_schema = JSONSchema::compile(&schema_value)
        .map_err(|e| CalcError::Validation(format!("Failed to compile schema: {}", e)))?;

    if let Err(errors) = compiled_schema.validate(value) {
        let error_messages: Vec<String> = errors.map(|e| format!("  - {}", e)).collect();
        return Err(CalcError::Validation(format!(
            "Schema validation failed:\n{}",
            error_messages.join("\n")
        )));
    }

    Ok(())
}
