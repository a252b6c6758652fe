//! FinanCalc API Server binary
//!
//! HTTP REST API for plan execution and LLM-backed solving.

use clap::Parser;
use financalc::api::{run_api_server, ApiConfig, AppState};
use financalc::planner::PlannerConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "financalc-server")]
#[command(version)]
#[command(about = "FinanCalc API Server - HTTP REST API for financial calculation plans")]
#[command(long_about = r#"
FinanCalc API Server - HTTP REST API

Endpoints:
  - GET  /api/v1/formulas  - Formula catalog
  - POST /api/v1/execute   - Execute a calculation plan
  - POST /api/v1/validate  - Schema check and lint a plan
  - POST /api/v1/solve     - Plan and execute with one or all providers
  - POST /api/v1/plan      - Generate a plan with one provider

Additional endpoints:
  - GET  /health           - Health check
  - GET  /version          - Server version info
  - GET  /                 - API documentation

Provider keys are read from GEMINI_API_KEY, OPENROUTER_KIMI_API_KEY
and OPENROUTER_MISTRAL_API_KEY. A missing key only fails requests to that provider.

Example usage:
  financalc-server                           # Start on localhost:8080
  financalc-server --host 0.0.0.0 --port 3000

  curl -X POST http://localhost:8080/api/v1/solve \
    -H "Content-Type: application/json" \
    -d '{"problem": "Monto de 1000 al 12% simple en 2 años", "provider": "todas"}'
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "FINANCALC_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "FINANCALC_PORT")]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("financalc=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();

    let config = ApiConfig {
        host: args.host,
        port: args.port,
    };
    let state = AppState::from_config(&PlannerConfig::from_env())?;

    run_api_server(config, state).await
}
