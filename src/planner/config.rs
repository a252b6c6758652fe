use std::time::Duration;

use tracing::warn;

use super::Provider;
use crate::error::{CalcError, CalcResult};

pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const KIMI_API_KEY: &str = "OPENROUTER_KIMI_API_KEY";
pub const MISTRAL_API_KEY: &str = "OPENROUTER_MISTRAL_API_KEY";
pub const REQUEST_TIMEOUT: &str = "FINANCALC_REQUEST_TIMEOUT";
pub const GEMINI_BASE_URL: &str = "GEMINI_API_BASE_URL";
pub const OPENROUTER_BASE_URL: &str = "OPENROUTER_API_BASE_URL";

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Credentials and endpoints for the HTTP planners
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub gemini_api_key: Option<String>,
    pub kimi_api_key: Option<String>,
    pub mistral_api_key: Option<String>,
    pub gemini_base_url: String,
    pub openrouter_base_url: String,
    pub timeout: Duration,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            kimi_api_key: None,
            mistral_api_key: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            openrouter_base_url: DEFAULT_OPENROUTER_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl PlannerConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            gemini_api_key: get(GEMINI_API_KEY),
            kimi_api_key: get(KIMI_API_KEY),
            mistral_api_key: get(MISTRAL_API_KEY),
            gemini_base_url: get(GEMINI_BASE_URL).unwrap_or(defaults.gemini_base_url),
            openrouter_base_url: get(OPENROUTER_BASE_URL).unwrap_or(defaults.openrouter_base_url),
            timeout: get(REQUEST_TIMEOUT)
                .and_then(|raw| parse_timeout(&raw))
                .unwrap_or(defaults.timeout),
        }
    }

    /// Environment variable holding the key for `provider`
    pub fn key_variable(provider: Provider) -> &'static str {
        match provider {
            Provider::Google => GEMINI_API_KEY,
            Provider::Kimi => KIMI_API_KEY,
            Provider::Mistral => MISTRAL_API_KEY,
        }
    }

    /// API key for `provider`, or a configuration error naming the variable
    pub fn api_key(&self, provider: Provider) -> CalcResult<&str> {
        let key = match provider {
            Provider::Google => &self.gemini_api_key,
            Provider::Kimi => &self.kimi_api_key,
            Provider::Mistral => &self.mistral_api_key,
        };
        key.as_deref().ok_or_else(|| {
            CalcError::Config(format!(
                "Missing environment variable '{}'",
                Self::key_variable(provider)
            ))
        })
    }

    /// Providers that have a key configured
    pub fn configured_providers(&self) -> Vec<Provider> {
        Provider::ALL
            .into_iter()
            .filter(|p| self.api_key(*p).is_ok())
            .collect()
    }
}

/// Whole seconds, at least one. Anything else is reported and ignored.
fn parse_timeout(raw: &str) -> Option<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        _ => {
            warn!(
                variable = REQUEST_TIMEOUT,
                value = raw,
                default_secs = DEFAULT_TIMEOUT_SECS,
                "Ignoring invalid request timeout"
            );
            None
        }
    }
}
