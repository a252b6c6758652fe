//! API integration tests
//!
//! Requests go through the full router with in-process stub planners.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use financalc::api::{router, AppState};
use financalc::error::{CalcError, CalcResult};
use financalc::planner::{extract_plan, Mode, Planner, Provider};
use financalc::types::CalculationPlan;
use serde_json::{json, Value};
use tower::ServiceExt;

const PLAN: &str = r#"{"interpretation": "Se debe calcular S", "initial_data": {"P": 1000, "j": 0.12, "n": 2},
  "final_target_variable": "S", "calculation_steps": [
    {"step_name": "Monto", "target_variable": "S",
     "formula_name": "formula_is_S_from_Pjn", "inputs": {"P": "{{P}}", "j": "{{j}}", "n": "{{n}}"}}]}"#;

/// Answers every problem with a fixed model response
struct StubPlanner {
    provider: Provider,
    response: &'static str,
}

#[async_trait]
impl Planner for StubPlanner {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn generate_plan(&self, mode: Mode, _problem: &str) -> CalcResult<CalculationPlan> {
        if mode == Mode::Experimental && self.provider == Provider::Mistral {
            return Err(CalcError::Provider {
                provider: self.provider.to_string(),
                message: "503 Service Unavailable".to_string(),
            });
        }
        extract_plan(self.response)
    }
}

fn app() -> Router {
    let planners: Vec<Arc<dyn Planner>> = vec![
        Arc::new(StubPlanner { provider: Provider::Google, response: PLAN }),
        Arc::new(StubPlanner { provider: Provider::Kimi, response: "Lo siento, no sé." }),
        Arc::new(StubPlanner { provider: Provider::Mistral, response: PLAN }),
    ];
    router(Arc::new(AppState::new(planners)))
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(uri: &str) -> (StatusCode, Value) {
    send(Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post(uri: &str, body: Value) -> (StatusCode, Value) {
    send(
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

// ═══════════════════════════════════════════════════════════════════════════
// INFO ENDPOINTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_health() {
    let (status, body) = get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["request_id"].as_str().unwrap().len(), 36);
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    let (status, body) = get("/").await;
    assert_eq!(status, StatusCode::OK);

    let paths: Vec<&str> = body["data"]["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["path"].as_str())
        .collect();
    assert!(paths.contains(&"/api/v1/solve"));
    assert!(paths.contains(&"/api/v1/execute"));
}

#[tokio::test]
async fn test_version() {
    let (_, body) = get("/version").await;
    assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_formulas_catalog() {
    let (status, body) = get("/api/v1/formulas").await;
    assert_eq!(status, StatusCode::OK);

    let formulas = body["data"].as_array().unwrap();
    assert_eq!(formulas.len(), 39);
    assert_eq!(formulas[0]["name"], "formula_is_I_from_Pjn");
    assert_eq!(formulas[0]["parameters"], json!(["P", "j", "n"]));
}

// ═══════════════════════════════════════════════════════════════════════════
// EXECUTE / VALIDATE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_execute_plan() {
    let plan: Value = serde_json::from_str(PLAN).unwrap();
    let (status, body) = post("/api/v1/execute", plan).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["final_result"], 1240.0);
    assert_eq!(body["data"]["final_target_variable"], "S");

    let step = &body["data"]["steps"][0];
    assert_eq!(step["substituted_formula"], "1000 * (1 + 0.12 * 2) = 1240");
    assert_eq!(step["inputs"]["P"], 1000.0);
    assert_eq!(step["step_name"], "Monto");
}

#[tokio::test]
async fn test_execute_reference_error_is_unprocessable() {
    let plan = json!({
        "final_target_variable": "S",
        "calculation_steps": [{
            "step_name": "Monto", "target_variable": "S",
            "formula_name": "formula_is_S_from_Pjn",
            "inputs": {"P": "{{capital}}", "j": 0.1, "n": 1}
        }]
    });
    let (status, body) = post("/api/v1/execute", plan).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "REFERENCE_ERROR");
    assert!(body["error"].as_str().unwrap().contains("capital"));
}

#[tokio::test]
async fn test_execute_rejects_schema_violations() {
    let (status, body) = post("/api/v1/execute", json!({"final_target_variable": "S"})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_validate_reports_without_executing() {
    let plan = json!({
        "final_target_variable": "S",
        "calculation_steps": [{
            "step_name": "Monto", "target_variable": "S",
            "formula_name": "formula_nope", "inputs": {}
        }]
    });
    let (status, body) = post("/api/v1/validate", plan).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["valid"], false);
    assert!(body["data"]["errors"][0].as_str().unwrap().contains("formula_nope"));

    let (_, body) = post("/api/v1/validate", json!({"calculation_steps": []})).await;
    assert_eq!(body["data"]["valid"], false);
    assert!(body["data"]["errors"][0]
        .as_str()
        .unwrap()
        .contains("final_target_variable"));
}

// ═══════════════════════════════════════════════════════════════════════════
// SOLVE / PLAN
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_solve_all_providers() {
    let (status, body) = post(
        "/api/v1/solve",
        json!({"problem": "Monto de 1000 al 12% simple en 2 años", "provider": "todas"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["mode"], "preciso");

    let outcomes = body["data"]["outcomes"].as_array().unwrap();
    assert_eq!(outcomes.len(), 3);

    assert_eq!(outcomes[0]["provider"], "google");
    assert_eq!(outcomes[0]["error"], Value::Null);
    assert_eq!(outcomes[0]["executed_steps"][0]["result"], 1240.0);

    assert_eq!(outcomes[1]["provider"], "kimi");
    assert_eq!(outcomes[1]["code"], "MALFORMED_RESPONSE");
    assert_eq!(outcomes[1]["executed_steps"], Value::Null);

    assert_eq!(outcomes[2]["provider"], "mistral");
    assert_eq!(outcomes[2]["executed_steps"][0]["result"], 1240.0);
}

#[tokio::test]
async fn test_solve_defaults_to_google() {
    let (_, body) = post("/api/v1/solve", json!({"problem": "monto"})).await;
    let outcomes = body["data"]["outcomes"].as_array().unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0]["provider"], "google");
}

#[tokio::test]
async fn test_solve_provider_failure_is_isolated() {
    let (status, body) = post(
        "/api/v1/solve",
        json!({"problem": "monto", "provider": "todas", "mode": "experimental"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let outcomes = body["data"]["outcomes"].as_array().unwrap();
    assert_eq!(outcomes[0]["error"], Value::Null);
    assert_eq!(outcomes[2]["code"], "PROVIDER_ERROR");
    assert!(outcomes[2]["error"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn test_solve_empty_problem() {
    let (status, body) = post("/api/v1/solve", json!({"problem": "   "})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_plan_single_provider() {
    let (status, body) = post(
        "/api/v1/plan",
        json!({"problem": "monto", "provider": "mistral"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["final_target_variable"], "S");
    assert_eq!(body["data"]["calculation_steps"][0]["inputs"]["P"], "{{P}}");

    let (status, body) = post("/api/v1/plan", json!({"problem": "monto", "provider": "kimi"})).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "MALFORMED_RESPONSE");
}
