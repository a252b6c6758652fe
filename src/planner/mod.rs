//! LLM planner collaborators
//!
//! A planner turns a word problem into a [`CalculationPlan`]. The HTTP
//! implementation talks to Gemini or OpenRouter; tests plug in their own
//! [`Planner`] implementations.

pub mod client;
pub mod config;
pub mod extract;
pub mod prompt;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{CalcError, CalcResult};
use crate::types::CalculationPlan;

pub use client::HttpPlanner;
pub use config::PlannerConfig;
pub use extract::extract_plan;

/// Planning mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Catalog formulas only
    #[default]
    Preciso,
    /// Catalog formulas plus `formula_experimental` with a generated expression
    Experimental,
}

/// A model provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Kimi,
    Mistral,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Google, Provider::Kimi, Provider::Mistral];

    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Kimi => "kimi",
            Provider::Mistral => "mistral",
        }
    }

    /// Human-readable label for result headings
    pub fn label(self) -> &'static str {
        match self {
            Provider::Google => "Google Gemini",
            Provider::Kimi => "Kimi (OpenRouter)",
            Provider::Mistral => "Mistral (OpenRouter)",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| CalcError::Validation(format!("Provider '{}' is not supported", s)))
    }
}

/// Which providers to ask: one, or `todas` for all of them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderSelection {
    #[default]
    Google,
    Kimi,
    Mistral,
    Todas,
}

impl ProviderSelection {
    pub fn providers(self) -> Vec<Provider> {
        match self {
            ProviderSelection::Google => vec![Provider::Google],
            ProviderSelection::Kimi => vec![Provider::Kimi],
            ProviderSelection::Mistral => vec![Provider::Mistral],
            ProviderSelection::Todas => Provider::ALL.to_vec(),
        }
    }
}

impl From<Provider> for ProviderSelection {
    fn from(provider: Provider) -> Self {
        match provider {
            Provider::Google => ProviderSelection::Google,
            Provider::Kimi => ProviderSelection::Kimi,
            Provider::Mistral => ProviderSelection::Mistral,
        }
    }
}

/// Produces calculation plans from word problems
#[async_trait]
pub trait Planner: Send + Sync {
    /// Provider this planner speaks for
    fn provider(&self) -> Provider;

    async fn generate_plan(&self, mode: Mode, problem: &str) -> CalcResult<CalculationPlan>;
}

#[async_trait]
impl<T: Planner + ?Sized> Planner for Arc<T> {
    fn provider(&self) -> Provider {
        (**self).provider()
    }

    async fn generate_plan(&self, mode: Mode, problem: &str) -> CalcResult<CalculationPlan> {
        (**self).generate_plan(mode, problem).await
    }
}
