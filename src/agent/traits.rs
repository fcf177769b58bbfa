//! Agent trait definition.
//!
//! An agent is a fixed role: a system prompt, a model configuration and a
//! tool set. [`stream_with_tools`] runs it against a provider.

use std::sync::Arc;
use std::time::Duration;

use super::agentic_loop::{AgentStream, LoopLimits, agentic_stream};
use super::executor::ToolExecutor;
use super::message::{ChatRequest, user_message};
use super::provider::LlmProvider;
use super::tool::ToolDefinition;

/// Trait implemented by agents.
///
/// Agents that support tool-calling override [`Agent::tools`] to return
/// their available tool definitions.
pub trait Agent: Send + Sync {
    /// Agent name for logging and identification.
    fn name(&self) -> &'static str;

    /// Model identifier to use for this agent.
    fn model(&self) -> &str;

    /// System prompt that defines the agent's role and behavior.
    fn system_prompt(&self) -> &str;

    /// Sampling temperature (0.0 = deterministic, higher = more creative).
    fn temperature(&self) -> f32 {
        0.0
    }

    /// Maximum tokens for the response.
    fn max_tokens(&self) -> u32 {
        2048
    }

    /// Tool definitions available to this agent.
    fn tools(&self) -> Vec<ToolDefinition> {
        Vec::new()
    }

    /// Maximum model round trips before aborting.
    fn max_tool_iterations(&self) -> usize {
        10
    }

    /// Wall-clock budget for one request.
    fn time_budget(&self) -> Option<Duration> {
        None
    }

    /// Builds the initial request for a user message.
    fn request(&self, user_msg: &str) -> ChatRequest {
        ChatRequest {
            model: self.model().to_string(),
            system: self.system_prompt().to_string(),
            messages: vec![user_message(user_msg)],
            temperature: Some(self.temperature()),
            max_tokens: Some(self.max_tokens()),
            tools: self.tools(),
        }
    }
}

/// Streams an agent's answer with tool-calling support.
///
/// The returned stream is lazy: no model call happens until it is polled.
pub fn stream_with_tools(
    agent: &dyn Agent,
    provider: Arc<dyn LlmProvider>,
    user_msg: &str,
    executor: Arc<ToolExecutor>,
) -> AgentStream {
    tracing::debug!(
        agent = agent.name(),
        model = agent.model(),
        provider = provider.name(),
        "starting agent stream"
    );
    agentic_stream(
        provider,
        agent.request(user_msg),
        executor,
        LoopLimits {
            max_iterations: agent.max_tool_iterations(),
            time_budget: agent.time_budget(),
        },
    )
}
