//! Orchestrator for knowledge-base question answering.
//!
//! Owns the process-wide pieces (model provider, tool executor with its
//! lazily created retrieval client, configuration, prompts) and builds a
//! fresh [`KnowledgeBaseAgent`] for every request.

use std::sync::Arc;

use tracing::info;

use super::agentic_loop::AgentStream;
use super::client::create_provider;
use super::config::AgentConfig;
use super::executor::ToolExecutor;
use super::prompt::PromptSet;
use super::provider::LlmProvider;
use super::rag::KnowledgeBaseAgent;
use super::traits::stream_with_tools;
use crate::error::AgentError;
use crate::retrieval::{BedrockClientFactory, KnowledgeBaseSearch, LazyRetrievalClient};

/// Orchestrates one streamed answer per request.
///
/// Cheap to share behind an [`Arc`]; concurrent requests share the provider
/// and the retrieval client but nothing else.
pub struct Orchestrator {
    provider: Arc<dyn LlmProvider>,
    executor: Arc<ToolExecutor>,
    config: AgentConfig,
    prompts: PromptSet,
}

impl Orchestrator {
    /// Creates an orchestrator from already-built parts.
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        executor: Arc<ToolExecutor>,
        config: AgentConfig,
        prompts: PromptSet,
    ) -> Self {
        Self {
            provider,
            executor,
            config,
            prompts,
        }
    }

    /// Builds the Bedrock-backed orchestrator for `config`.
    ///
    /// The knowledge-base client is not created here; the first `kb_search`
    /// call creates it.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::UnsupportedProvider`] for unknown provider names.
    pub async fn from_config(config: AgentConfig) -> Result<Self, AgentError> {
        let provider = create_provider(&config).await?;
        let client = Arc::new(LazyRetrievalClient::new(
            Arc::new(BedrockClientFactory),
            config.region.clone(),
        ));
        let search = KnowledgeBaseSearch::new(
            config.knowledge_base_id.clone(),
            config.default_max_results,
            client,
        );
        let prompts = PromptSet::load(config.prompt_dir.as_deref());
        info!(
            provider = provider.name(),
            region = %config.region,
            knowledge_base = config.knowledge_base_id.as_deref().unwrap_or("<unset>"),
            "orchestrator ready"
        );
        Ok(Self::new(
            provider,
            Arc::new(ToolExecutor::new(search)),
            config,
            prompts,
        ))
    }

    /// Configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Model used when a request does not select one.
    #[must_use]
    pub fn default_model_id(&self) -> &str {
        &self.config.default_model_id
    }

    /// Builds the agent a request for `model_id` runs with.
    #[must_use]
    pub fn agent(&self, model_id: &str) -> KnowledgeBaseAgent {
        KnowledgeBaseAgent::new(&self.config, model_id, self.prompts.system.clone())
    }

    /// Streams the answer to `prompt` using `model_id`.
    ///
    /// The stream is lazy and independent of other requests.
    pub fn run(&self, prompt: &str, model_id: &str) -> AgentStream {
        let agent = self.agent(model_id);
        stream_with_tools(
            &agent,
            Arc::clone(&self.provider),
            prompt,
            Arc::clone(&self.executor),
        )
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
