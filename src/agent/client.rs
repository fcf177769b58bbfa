//! Provider registry and factory.
//!
//! Maps provider names to concrete [`LlmProvider`] implementations.

use std::sync::Arc;

use crate::agent::config::AgentConfig;
use crate::agent::provider::LlmProvider;
use crate::agent::providers::BedrockProvider;
use crate::error::AgentError;

/// Creates an [`LlmProvider`] based on the configured provider name.
///
/// # Supported Providers
///
/// - `"bedrock"` (default): Amazon Bedrock `ConverseStream`
///
/// # Errors
///
/// Returns [`AgentError::UnsupportedProvider`] for unknown provider names.
pub async fn create_provider(config: &AgentConfig) -> Result<Arc<dyn LlmProvider>, AgentError> {
    match config.provider.as_str() {
        "bedrock" => Ok(Arc::new(BedrockProvider::new(config).await)),
        other => Err(AgentError::UnsupportedProvider {
            name: other.to_string(),
        }),
    }
}
