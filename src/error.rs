use thiserror::Error;

pub type CalcResult<T> = Result<T, CalcError>;

#[derive(Error, Debug)]
pub enum CalcError {
    #[error("Variable '{0}' was not found among previously computed values")]
    Reference(String),

    #[error("Formula '{0}' is not implemented by the calculation engine")]
    UnknownFormula(String),

    #[error("'{0}' requires a 'generated_formula' expression")]
    MissingExpression(String),

    #[error("Calculation for '{0}' produced an invalid value (NaN or infinite). Check the inputs.")]
    InvalidResult(String),

    #[error("Expression error: {0}")]
    Expression(String),

    #[error("Malformed planner response: {0}")]
    MalformedResponse(String),

    #[error("Provider '{provider}' failed: {message}")]
    Provider { provider: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl CalcError {
    /// Stable machine-readable code, used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            CalcError::Reference(_) => "REFERENCE_ERROR",
            CalcError::UnknownFormula(_) => "UNKNOWN_FORMULA",
            CalcError::MissingExpression(_) => "MISSING_EXPRESSION",
            CalcError::InvalidResult(_) => "INVALID_RESULT",
            CalcError::Expression(_) => "EXPRESSION_ERROR",
            CalcError::MalformedResponse(_) => "MALFORMED_RESPONSE",
            CalcError::Provider { .. } => "PROVIDER_ERROR",
            CalcError::Config(_) => "CONFIG_ERROR",
            CalcError::Validation(_) => "VALIDATION_ERROR",
            CalcError::Io(_) => "IO_ERROR",
            CalcError::Json(_) => "JSON_ERROR",
            CalcError::Yaml(_) => "YAML_ERROR",
            CalcError::Http(_) => "HTTP_ERROR",
        }
    }

    /// True for failures raised while executing a plan step.
    pub fn is_execution_error(&self) -> bool {
        matches!(
            self,
            CalcError::Reference(_)
                | CalcError::UnknownFormula(_)
                | CalcError::MissingExpression(_)
                | CalcError::InvalidResult(_)
                | CalcError::Expression(_)
        )
    }
}
