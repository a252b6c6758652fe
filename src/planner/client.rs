use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use tracing::{debug, warn};

use super::config::PlannerConfig;
use super::extract::extract_plan;
use super::prompt::build_prompt;
use super::{Mode, Planner, Provider};
use crate::error::{CalcError, CalcResult};
use crate::types::CalculationPlan;

pub const GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const KIMI_MODEL: &str = "moonshot/moonshot-v1-8k";
pub const MISTRAL_MODEL: &str = "mistralai/mistral-7b-instruct";

/// Planner backed by a provider's HTTP API
#[derive(Debug, Clone)]
pub struct HttpPlanner {
    provider: Provider,
    http: reqwest::Client,
    config: PlannerConfig,
}

impl HttpPlanner {
    pub fn new(provider: Provider, config: PlannerConfig) -> CalcResult<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            provider,
            http,
            config,
        })
    }

    /// One planner per provider, sharing the configuration
    pub fn for_providers(providers: &[Provider], config: &PlannerConfig) -> CalcResult<Vec<Self>> {
        providers
            .iter()
            .map(|p| Self::new(*p, config.clone()))
            .collect()
    }

    /// Model identifier sent to the provider
    pub fn model(&self) -> &'static str {
        match self.provider {
            Provider::Google => GEMINI_MODEL,
            Provider::Kimi => KIMI_MODEL,
            Provider::Mistral => MISTRAL_MODEL,
        }
    }

    /// Send the prompt and return the model's raw text
    pub async fn complete(&self, prompt: &str) -> CalcResult<String> {
        let api_key = self.config.api_key(self.provider)?;
        match self.provider {
            Provider::Google => self.complete_gemini(api_key, prompt).await,
            Provider::Kimi | Provider::Mistral => self.complete_openrouter(api_key, prompt).await,
        }
    }

    async fn complete_gemini(&self, api_key: &str, prompt: &str) -> CalcResult<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.gemini_base_url.trim_end_matches('/'),
            self.model()
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseMimeType": "application/json" }
        });

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-goog-api-key", self.header_value(api_key)?);

        let resp = self.http.post(url).headers(headers).json(&body).send().await?;
        let resp = self.check_status(resp).await?;
        let data: GeminiResponse = resp.json().await?;

        data.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|content| content.parts.into_iter().find_map(|p| p.text))
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                CalcError::MalformedResponse("Invalid response from the Gemini API".to_string())
            })
    }

    async fn complete_openrouter(&self, api_key: &str, prompt: &str) -> CalcResult<String> {
        let url = format!(
            "{}/chat/completions",
            self.config.openrouter_base_url.trim_end_matches('/')
        );
        let body = serde_json::json!({
            "model": self.model(),
            "messages": [{ "role": "user", "content": prompt }],
            "response_format": { "type": "json_object" }
        });

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            self.header_value(&format!("Bearer {}", api_key))?,
        );

        let resp = self.http.post(url).headers(headers).json(&body).send().await?;
        let resp = self.check_status(resp).await?;
        let data: ChatResponse = resp.json().await?;

        data.choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                CalcError::MalformedResponse("Invalid response from the OpenRouter API".to_string())
            })
    }

    fn header_value(&self, value: &str) -> CalcResult<HeaderValue> {
        HeaderValue::from_str(value).map_err(|e| {
            CalcError::Config(format!("Invalid API key for '{}': {}", self.provider, e))
        })
    }

    async fn check_status(&self, resp: reqwest::Response) -> CalcResult<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        warn!(provider = %self.provider, %status, "Provider request failed");
        Err(CalcError::Provider {
            provider: self.provider.to_string(),
            message: format!("{}: {}", status, body),
        })
    }
}

#[async_trait]
impl Planner for HttpPlanner {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn generate_plan(&self, mode: Mode, problem: &str) -> CalcResult<CalculationPlan> {
        let prompt = build_prompt(mode, problem);
        debug!(provider = %self.provider, model = self.model(), "Requesting plan");

        let raw = self.complete(&prompt).await?;
        extract_plan(&raw).inspect_err(|_| {
            warn!(provider = %self.provider, raw = %raw, "Could not extract a plan from the response");
        })
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}
