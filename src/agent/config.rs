//! Agent configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::AgentError;

/// Model used when a request does not name one.
pub const DEFAULT_MODEL_ID: &str = "anthropic.claude-3-5-haiku-20241022-v1:0";
/// Region used for both the knowledge base and the model.
pub const DEFAULT_REGION: &str = "us-west-2";
/// Default number of knowledge-base results per search.
pub const DEFAULT_MAX_RESULTS: i32 = 5;
/// Default maximum tokens for a model response.
const DEFAULT_MAX_TOKENS: u32 = 4096;
/// Default sampling temperature.
const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Default maximum model round trips per request.
const DEFAULT_MAX_TOOL_ITERATIONS: usize = 10;
/// Default wall-clock budget per request in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Configuration for the agent system.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Model provider name (e.g., "bedrock").
    pub provider: String,
    /// Knowledge base to search. `None` disables retrieval.
    pub knowledge_base_id: Option<String>,
    /// AWS region for the knowledge base and model clients.
    pub region: String,
    /// Results per search when the model does not ask for a count.
    pub default_max_results: i32,
    /// Model used when the request does not select one.
    pub default_model_id: String,
    /// Maximum tokens for model responses.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum model round trips before the request is aborted.
    pub max_tool_iterations: usize,
    /// Wall-clock budget per request. `None` disables the budget.
    pub request_timeout: Option<Duration>,
    /// Directory containing prompt template files.
    ///
    /// When set, the system prompt is loaded from `system.md` in this
    /// directory, falling back to the compiled-in prompt.
    pub prompt_dir: Option<PathBuf>,
}

impl AgentConfig {
    /// Creates a new builder for `AgentConfig`.
    #[must_use]
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }
}

/// Builder for [`AgentConfig`].
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    provider: Option<String>,
    knowledge_base_id: Option<String>,
    region: Option<String>,
    default_max_results: Option<i32>,
    default_model_id: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    max_tool_iterations: Option<usize>,
    request_timeout: Option<Option<Duration>>,
    prompt_dir: Option<PathBuf>,
}

impl AgentConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.provider.is_none() {
            self.provider = std::env::var("KB_AGENT_PROVIDER").ok();
        }
        if self.knowledge_base_id.is_none() {
            self.knowledge_base_id = std::env::var("STRANDS_KNOWLEDGE_BASE_ID").ok();
        }
        if self.region.is_none() {
            self.region = std::env::var("AWS_REGION").ok();
        }
        if self.default_max_results.is_none() {
            self.default_max_results = std::env::var("BEDROCK_KB_MAX_RESULTS")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.max_tool_iterations.is_none() {
            self.max_tool_iterations = std::env::var("KB_AGENT_MAX_TOOL_ITERATIONS")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.request_timeout.is_none() {
            self.request_timeout = std::env::var("KB_AGENT_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| (secs > 0).then(|| Duration::from_secs(secs)));
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = std::env::var("KB_AGENT_PROMPT_DIR").ok().map(PathBuf::from);
        }
        self
    }

    /// Sets the model provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the knowledge-base identifier.
    #[must_use]
    pub fn knowledge_base_id(mut self, id: impl Into<String>) -> Self {
        self.knowledge_base_id = Some(id.into());
        self
    }

    /// Sets the AWS region.
    #[must_use]
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Sets the default number of results per search.
    #[must_use]
    pub const fn default_max_results(mut self, n: i32) -> Self {
        self.default_max_results = Some(n);
        self
    }

    /// Sets the model used when requests do not select one.
    #[must_use]
    pub fn default_model_id(mut self, model: impl Into<String>) -> Self {
        self.default_model_id = Some(model.into());
        self
    }

    /// Sets the maximum response tokens.
    #[must_use]
    pub const fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = Some(n);
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, t: f32) -> Self {
        self.temperature = Some(t);
        self
    }

    /// Sets the maximum model round trips per request.
    #[must_use]
    pub const fn max_tool_iterations(mut self, n: usize) -> Self {
        self.max_tool_iterations = Some(n);
        self
    }

    /// Sets the per-request time budget. `None` disables it.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Builds the [`AgentConfig`].
    ///
    /// An empty knowledge-base id is treated as unset. A non-positive
    /// default result count falls back to [`DEFAULT_MAX_RESULTS`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Config`] when `max_tokens` or
    /// `max_tool_iterations` is zero, or `temperature` is outside `0.0..=1.0`.
    pub fn build(self) -> Result<AgentConfig, AgentError> {
        let max_tokens = self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
        if max_tokens == 0 {
            return Err(AgentError::Config {
                message: "max_tokens must be positive".to_string(),
            });
        }

        let temperature = self.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        if !(0.0..=1.0).contains(&temperature) {
            return Err(AgentError::Config {
                message: format!("temperature {temperature} is outside 0.0..=1.0"),
            });
        }

        let max_tool_iterations = self
            .max_tool_iterations
            .unwrap_or(DEFAULT_MAX_TOOL_ITERATIONS);
        if max_tool_iterations == 0 {
            return Err(AgentError::Config {
                message: "max_tool_iterations must be positive".to_string(),
            });
        }

        Ok(AgentConfig {
            provider: self.provider.unwrap_or_else(|| "bedrock".to_string()),
            knowledge_base_id: self
                .knowledge_base_id
                .filter(|id| !id.trim().is_empty()),
            region: self
                .region
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            default_max_results: self
                .default_max_results
                .filter(|&n| n > 0)
                .unwrap_or(DEFAULT_MAX_RESULTS),
            default_model_id: self
                .default_model_id
                .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            max_tokens,
            temperature,
            max_tool_iterations,
            request_timeout: self
                .request_timeout
                .unwrap_or(Some(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))),
            prompt_dir: self.prompt_dir,
        })
    }
}
