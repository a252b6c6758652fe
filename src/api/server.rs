//! FinanCalc API server
//!
//! HTTP REST API using Axum. Exposes the formula catalog, plan execution and
//! validation, and the planner-backed solve endpoints.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::handlers;
use crate::error::CalcResult;
use crate::planner::{HttpPlanner, Planner, PlannerConfig, Provider};

/// API Server configuration
#[derive(Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub version: String,
    pub planners: Vec<Arc<dyn Planner>>,
}

impl AppState {
    pub fn new(planners: Vec<Arc<dyn Planner>>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            planners,
        }
    }

    /// HTTP planners for every provider. Missing keys surface per request.
    pub fn from_config(config: &PlannerConfig) -> CalcResult<Self> {
        let configured = config.configured_providers();
        if configured.is_empty() {
            warn!("No provider API keys configured; /api/v1/solve and /api/v1/plan will fail");
        } else {
            info!(providers = ?configured, "Provider API keys configured");
        }

        let planners = HttpPlanner::for_providers(&Provider::ALL, config)?
            .into_iter()
            .map(|p| Arc::new(p) as Arc<dyn Planner>)
            .collect();
        Ok(Self::new(planners))
    }

    /// Planners for the given providers, in the requested order
    pub fn planners_for(&self, providers: &[Provider]) -> Vec<Arc<dyn Planner>> {
        providers
            .iter()
            .filter_map(|provider| {
                self.planners
                    .iter()
                    .find(|p| p.provider() == *provider)
                    .cloned()
            })
            .collect()
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/version", get(handlers::version))
        // Core API endpoints
        .route("/api/v1/formulas", get(handlers::formulas))
        .route("/api/v1/execute", post(handlers::execute))
        .route("/api/v1/validate", post(handlers::validate))
        .route("/api/v1/solve", post(handlers::solve))
        .route("/api/v1/plan", post(handlers::plan))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Run the API server until Ctrl+C or SIGTERM
pub async fn run_api_server(config: ApiConfig, state: AppState) -> anyhow::Result<()> {
    let app = router(Arc::new(state));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("FinanCalc API Server starting on http://{}", addr);
    info!("   Endpoints: /api/v1/formulas, /api/v1/execute, /api/v1/validate, /api/v1/solve, /api/v1/plan");
    info!("   Health: /health, Version: /version");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("FinanCalc API Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping server...");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_config_address_format() {
        let config = ApiConfig {
            host: "192.168.1.100".to_string(),
            port: 9090,
        };
        let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse().unwrap();
        assert_eq!(addr.port(), 9090);
    }

    #[test]
    fn test_state_from_config_has_all_providers() {
        let state = AppState::from_config(&PlannerConfig::default()).unwrap();
        assert_eq!(state.planners.len(), 3);
        assert_eq!(state.version, env!("CARGO_PKG_VERSION"));

        let selected = state.planners_for(&[Provider::Mistral, Provider::Google]);
        let providers: Vec<Provider> = selected.iter().map(|p| p.provider()).collect();
        assert_eq!(providers, vec![Provider::Mistral, Provider::Google]);
    }
}
