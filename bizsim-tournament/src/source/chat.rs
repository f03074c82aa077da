//! Chat-completions decision source
//!
//! Asks a language model for a move through an OpenAI-compatible
//! `/chat/completions` endpoint (OpenRouter by default). The agent id is the
//! model name. HTTP 429 maps to `SourceError::Overloaded`; every other
//! failure is `SourceError::Failed`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decision::{DecisionRequest, DecisionSource, SourceError};

/// Chat endpoint configuration
#[derive(Clone, Debug, PartialEq)]
pub struct ChatConfig {
    /// API base URL, without the `/chat/completions` suffix
    pub base_url: String,
    /// Bearer token (optional for local gateways)
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        ChatConfig {
            base_url: std::env::var("OPENROUTER_BASE_URL")
                .unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_string()),
            api_key: std::env::var("OPENROUTER_API_KEY").ok(),
            temperature: 0.7,
            max_tokens: 150,
            timeout: Duration::from_secs(120),
        }
    }
}

impl ChatConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Config for a specific endpoint
    pub fn new(base_url: &str) -> Self {
        ChatConfig {
            base_url: base_url.to_string(),
            api_key: None,
            ..Self::default()
        }
    }

    /// Set authentication token
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: Option<String>,
}

impl ChatMessage {
    fn new(role: &str, content: String) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

// ============================================================================
// PROMPTS
// ============================================================================

/// Framing shared by every request in a simulation
pub fn system_prompt(total_rounds: u32) -> String {
    format!(
        "You are an AI decision-making agent participating in a {}-round economic simulation.\n\
         OBJECTIVE: Maximize your cumulative numerical score across all rounds.\n\
         You will interact with another independent agent. In each round, both agents simultaneously \
         and independently choose between 'Option A' and 'Option B'.\n\
         Your score depends on the combination of choices made by you and the other agent.\n",
        total_rounds
    )
}

/// Per-round prompt: phase, payoff matrix and the opponent's recent choices
pub fn user_prompt(request: &DecisionRequest) -> String {
    let history = if request.opponent_history.is_empty() {
        "No previous rounds".to_string()
    } else {
        request
            .opponent_history
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "--- ROUND {round} of {total} ---\n\
         CURRENT CONDITION: {condition}\n\
         CURRENT PAYOFF MATRIX:\n{matrix}\n\n\
         OTHER AGENT'S RECENT CHOICES: [{history}]\n\n\
         INSTRUCTIONS:\n\
         1. Briefly analyze the payoff matrix and the other agent's history.\n\
         2. State the optimal strategic choice to maximize your cumulative score.\n\
         3. Conclude with exactly one of these phrases: 'DECISION: OPTION A' or 'DECISION: OPTION B'.\n\n\
         Provide your reasoning, then your decision.",
        round = request.round,
        total = request.total_rounds,
        condition = request.phase_description,
        matrix = request.payoff_matrix,
        history = history,
    )
}

// ============================================================================
// SOURCE
// ============================================================================

/// Decision source that queries a chat model per request
pub struct ChatSource {
    config: ChatConfig,
    http_client: reqwest::Client,
}

impl ChatSource {
    pub fn new(config: ChatConfig) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("bizsim/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;

        Ok(Self::with_client(config, http_client))
    }

    /// Use a preconfigured HTTP client (proxies, TLS roots, ...)
    pub fn with_client(config: ChatConfig, http_client: reqwest::Client) -> Self {
        ChatSource {
            config,
            http_client,
        }
    }

    /// Create source from environment variables
    pub fn from_env() -> Result<Self, reqwest::Error> {
        Self::new(ChatConfig::from_env())
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }
}

#[async_trait]
impl DecisionSource for ChatSource {
    async fn query(&self, request: &DecisionRequest) -> Result<String, SourceError> {
        let body = ChatRequest {
            model: &request.agent,
            messages: vec![
                ChatMessage::new("system", system_prompt(request.total_rounds)),
                ChatMessage::new("user", user_prompt(request)),
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let mut builder = self.http_client.post(self.config.endpoint()).json(&body);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SourceError::Failed(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::Overloaded);
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(SourceError::Failed(format!("HTTP {}: {}", status, detail.trim())));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Failed(format!("invalid completion payload: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| SourceError::Failed("completion has no content".to_string()))?;

        debug!(agent = %request.agent, round = request.round, "Completion: {}", content.trim());
        Ok(content)
    }
}
