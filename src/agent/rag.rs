//! Knowledge base answering agent.
//!
//! Answers from documents found through `kb_search`, citing them with
//! numbered markers and a closing references section.

use std::time::Duration;

use super::config::AgentConfig;
use super::tool::{ToolDefinition, ToolSet};
use super::traits::Agent;

/// Model settings an agent is created with.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    /// Bedrock model identifier.
    pub model_id: String,
    /// AWS region the model is invoked in.
    pub region: String,
    /// Maximum tokens for a response.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

/// Agent that answers from the knowledge base.
#[derive(Debug, Clone)]
pub struct KnowledgeBaseAgent {
    settings: ModelSettings,
    system_prompt: String,
    max_tool_iterations: usize,
    time_budget: Option<Duration>,
    tools: ToolSet,
}

impl KnowledgeBaseAgent {
    /// Creates an agent for `model_id` using the rest of `config`.
    #[must_use]
    pub fn new(config: &AgentConfig, model_id: &str, system_prompt: String) -> Self {
        Self {
            settings: ModelSettings {
                model_id: model_id.to_string(),
                region: config.region.clone(),
                max_tokens: config.max_tokens,
                temperature: config.temperature,
            },
            system_prompt,
            max_tool_iterations: config.max_tool_iterations,
            time_budget: config.request_timeout,
            tools: ToolSet::knowledge_base_tools(),
        }
    }

    /// Settings the agent was created with.
    #[must_use]
    pub const fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    /// Names of the tools offered to the model.
    #[must_use]
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools
            .definitions()
            .iter()
            .map(|d| d.name.as_str())
            .collect()
    }
}

impl Agent for KnowledgeBaseAgent {
    fn name(&self) -> &'static str {
        "knowledge-base"
    }

    fn model(&self) -> &str {
        &self.settings.model_id
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn temperature(&self) -> f32 {
        self.settings.temperature
    }

    fn max_tokens(&self) -> u32 {
        self.settings.max_tokens
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        self.tools.definitions().to_vec()
    }

    fn max_tool_iterations(&self) -> usize {
        self.max_tool_iterations
    }

    fn time_budget(&self) -> Option<Duration> {
        self.time_budget
    }
}
