//! Word problem → plan → executed steps, across one or more providers
//!
//! Every provider runs independently: a failure (network, malformed JSON,
//! execution error) is recorded on that provider's outcome and never affects
//! the others.

use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::core::executor::execute_plan;
use crate::error::{CalcError, CalcResult};
use crate::planner::{Mode, Planner, Provider};
use crate::types::{CalculationPlan, ExecutedStep};

/// Result of asking one provider
#[derive(Debug, Serialize)]
pub struct ProviderOutcome {
    pub provider: Provider,
    /// The plan, when the provider returned one (even if execution then failed)
    pub plan: Option<CalculationPlan>,
    pub executed_steps: Option<Vec<ExecutedStep>>,
    pub error: Option<String>,
    /// Machine code of `error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl ProviderOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Result of the plan's final target variable, when execution produced it
    pub fn final_result(&self) -> Option<f64> {
        let plan = self.plan.as_ref()?;
        self.executed_steps
            .as_ref()?
            .iter()
            .rev()
            .find(|s| s.step.target_variable == plan.final_target_variable)
            .map(|s| s.result)
    }

    fn failed(provider: Provider, plan: Option<CalculationPlan>, error: CalcError) -> Self {
        warn!(%provider, code = error.code(), "{}", error);
        Self {
            provider,
            plan,
            executed_steps: None,
            error: Some(error.to_string()),
            code: Some(error.code()),
        }
    }
}

/// Reject empty problems before any provider is called
pub fn validate_problem(problem: &str) -> CalcResult<&str> {
    let trimmed = problem.trim();
    if trimmed.is_empty() {
        return Err(CalcError::Validation(
            "Please describe the financial problem to solve".to_string(),
        ));
    }
    Ok(trimmed)
}

/// Plan and execute with one planner
pub async fn solve_with<P: Planner + ?Sized>(planner: &P, mode: Mode, problem: &str) -> ProviderOutcome {
    let provider = planner.provider();

    let plan = match planner.generate_plan(mode, problem).await {
        Ok(plan) => plan,
        Err(e) => return ProviderOutcome::failed(provider, None, e),
    };

    match execute_plan(&plan) {
        Ok(steps) => {
            info!(%provider, steps = steps.len(), "Plan executed");
            ProviderOutcome {
                provider,
                plan: Some(plan),
                executed_steps: Some(steps),
                error: None,
                code: None,
            }
        }
        Err(e) => ProviderOutcome::failed(provider, Some(plan), e),
    }
}

/// Run every planner concurrently and collect one outcome per planner, in order
pub async fn solve<P: Planner>(planners: &[P], mode: Mode, problem: &str) -> CalcResult<Vec<ProviderOutcome>> {
    let problem = validate_problem(problem)?;
    info!(providers = planners.len(), ?mode, "Solving problem");

    Ok(join_all(planners.iter().map(|p| solve_with(p, mode, problem))).await)
}
