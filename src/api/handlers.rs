//! API request handlers
//!
//! Handlers for all REST API endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::server::AppState;
use crate::core::catalog::{FormulaInfo, CATALOG};
use crate::core::dependencies::lint_plan;
use crate::core::executor::PlanExecutor;
use crate::error::{CalcError, CalcResult};
use crate::parser::{plan_from_value, validate_against_schema};
use crate::planner::{Mode, Planner, Provider, ProviderSelection};
use crate::solver::{self, validate_problem, ProviderOutcome};
use crate::types::{CalculationPlan, ExecutedStep};

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Machine-readable error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
            code: None,
        }
    }

    pub fn err(error: &CalcError) -> Self {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(error.to_string()),
            code: Some(error.code().to_string()),
        }
    }
}

/// HTTP status for a failed request
pub fn status_for(error: &CalcError) -> StatusCode {
    if error.is_execution_error() {
        return StatusCode::UNPROCESSABLE_ENTITY;
    }
    match error {
        CalcError::Validation(_) | CalcError::Json(_) | CalcError::Yaml(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        CalcError::MalformedResponse(_) | CalcError::Provider { .. } | CalcError::Http(_) => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn respond<T: Serialize>(result: CalcResult<T>) -> Response {
    match result {
        Ok(data) => Json(ApiResponse::ok(data)).into_response(),
        Err(e) => {
            tracing::warn!(code = e.code(), "Request failed: {}", e);
            (status_for(&e), Json(ApiResponse::<T>::err(&e))).into_response()
        }
    }
}

/// Root endpoint response
#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

fn endpoint(method: &str, path: &str, description: &str) -> EndpointInfo {
    EndpointInfo {
        path: path.to_string(),
        method: method.to_string(),
        description: description.to_string(),
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = RootResponse {
        name: "FinanCalc API Server".to_string(),
        version: state.version.clone(),
        description: "Step-by-step financial math from LLM-generated calculation plans"
            .to_string(),
        endpoints: vec![
            endpoint("GET", "/health", "Health check endpoint"),
            endpoint("GET", "/version", "Get server version"),
            endpoint("GET", "/api/v1/formulas", "List the formula catalog"),
            endpoint("POST", "/api/v1/execute", "Execute a calculation plan"),
            endpoint("POST", "/api/v1/validate", "Validate a calculation plan without executing it"),
            endpoint("POST", "/api/v1/solve", "Plan and execute a word problem with one or all providers"),
            endpoint("POST", "/api/v1/plan", "Generate a calculation plan with one provider"),
        ],
    };
    Json(ApiResponse::ok(response))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_message: String,
}

/// GET /health - Health check
pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
        uptime_message: "Server is running".to_string(),
    }))
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub features: Vec<String>,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        features: ["formulas", "execute", "validate", "solve", "plan"]
            .iter()
            .map(|f| f.to_string())
            .collect(),
    }))
}

/// GET /api/v1/formulas - Formula catalog
pub async fn formulas() -> Json<ApiResponse<&'static [FormulaInfo]>> {
    Json(ApiResponse::ok(&CATALOG[..]))
}

/// Execute response
#[derive(Serialize)]
pub struct ExecuteResponse {
    pub final_target_variable: String,
    pub final_result: Option<f64>,
    pub steps: Vec<ExecutedStep>,
}

/// POST /api/v1/execute - Execute a plan
pub async fn execute(Json(body): Json<serde_json::Value>) -> Response {
    respond(plan_from_value(body).and_then(|plan| {
        let execution = PlanExecutor::new(&plan).execute()?;
        Ok(ExecuteResponse {
            final_result: execution.final_value(&plan),
            final_target_variable: plan.final_target_variable,
            steps: execution.steps,
        })
    }))
}

/// Validate response
#[derive(Serialize, Default)]
pub struct ValidateResponse {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub order: Vec<String>,
}

/// POST /api/v1/validate - Schema check and lint, without executing
pub async fn validate(Json(body): Json<serde_json::Value>) -> impl IntoResponse {
    let plan = validate_against_schema(&body)
        .and_then(|()| serde_json::from_value::<CalculationPlan>(body).map_err(CalcError::from));

    let response = match plan {
        Ok(plan) => {
            let report = lint_plan(&plan);
            ValidateResponse {
                valid: report.is_valid(),
                errors: report.errors.iter().map(ToString::to_string).collect(),
                warnings: report.warnings.iter().map(ToString::to_string).collect(),
                order: report.order,
            }
        }
        Err(e) => ValidateResponse {
            valid: false,
            errors: vec![e.to_string()],
            ..Default::default()
        },
    };
    Json(ApiResponse::ok(response))
}

/// Solve request
#[derive(Deserialize)]
pub struct SolveRequest {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub provider: ProviderSelection,
    pub problem: String,
}

/// Solve response
#[derive(Serialize)]
pub struct SolveResponse {
    pub mode: Mode,
    pub outcomes: Vec<ProviderOutcome>,
}

/// POST /api/v1/solve - Plan and execute with the selected providers
pub async fn solve(State(state): State<Arc<AppState>>, Json(req): Json<SolveRequest>) -> Response {
    let planners = state.planners_for(&req.provider.providers());
    let result = solver::solve(&planners, req.mode, &req.problem)
        .await
        .map(|outcomes| SolveResponse {
            mode: req.mode,
            outcomes,
        });
    respond(result)
}

/// Plan request
#[derive(Deserialize)]
pub struct PlanRequest {
    #[serde(default)]
    pub mode: Mode,
    pub provider: Provider,
    pub problem: String,
}

/// POST /api/v1/plan - Generate a plan without executing it
pub async fn plan(State(state): State<Arc<AppState>>, Json(req): Json<PlanRequest>) -> Response {
    let result = async {
        let problem = validate_problem(&req.problem)?;
        let planner = state
            .planners_for(&[req.provider])
            .into_iter()
            .next()
            .ok_or_else(|| {
                CalcError::Config(format!("No planner configured for '{}'", req.provider))
            })?;
        planner.generate_plan(req.mode, problem).await
    }
    .await;
    respond(result)
}
