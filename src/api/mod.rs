//! FinanCalc API Server module
//!
//! Provides the HTTP REST API. Run with `financalc-server`.

pub mod handlers;
pub mod server;

pub use server::{router, run_api_server, ApiConfig, AppState};
