//! Amazon Bedrock provider implementation using `aws-sdk-bedrockruntime`.
//!
//! Drives the `ConverseStream` API, which supports tool use for every model
//! family Bedrock hosts.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_bedrockruntime::Client;
use aws_sdk_bedrockruntime::error::DisplayErrorContext;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ContentBlockDelta, ContentBlockStart, ConversationRole, ConverseStreamOutput,
    InferenceConfiguration, Message, SystemContentBlock, Tool, ToolConfiguration,
    ToolInputSchema, ToolResultBlock, ToolResultContentBlock, ToolResultStatus,
    ToolSpecification, ToolUseBlock,
};
use futures_util::stream;
use tracing::debug;

use crate::agent::config::AgentConfig;
use crate::agent::events::{BlockDelta, BlockStart, ModelEvent};
use crate::agent::message::{ChatMessage, ChatRequest, Role, TokenUsage};
use crate::agent::provider::{LlmProvider, ModelStream};
use crate::agent::tool::ToolDefinition;
use crate::document;
use crate::error::AgentError;

/// Bedrock `ConverseStream` provider.
pub struct BedrockProvider {
    client: Client,
}

fn build_error(e: impl std::fmt::Display) -> AgentError {
    AgentError::ApiRequest {
        message: format!("invalid request: {e}"),
    }
}

impl BedrockProvider {
    /// Creates a provider from the ambient AWS configuration in the
    /// configured region.
    pub async fn new(config: &AgentConfig) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;
        Self::from_client(Client::new(&sdk_config))
    }

    /// Wraps an existing SDK client.
    #[must_use]
    pub const fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Converts our messages to Bedrock messages.
    ///
    /// Consecutive tool results are merged into one user message, which is
    /// how Bedrock expects parallel tool calls to be answered.
    fn convert_messages(messages: &[ChatMessage]) -> Result<Vec<Message>, AgentError> {
        let mut converted = Vec::with_capacity(messages.len());
        let mut tool_results: Vec<ContentBlock> = Vec::new();

        for msg in messages {
            if msg.role == Role::Tool {
                tool_results.push(Self::tool_result_block(msg)?);
                continue;
            }
            if !tool_results.is_empty() {
                converted.push(Self::message(
                    ConversationRole::User,
                    std::mem::take(&mut tool_results),
                )?);
            }

            match msg.role {
                Role::User => converted.push(Self::message(
                    ConversationRole::User,
                    vec![ContentBlock::Text(msg.content.clone())],
                )?),
                Role::Assistant => {
                    let mut blocks = Vec::with_capacity(1 + msg.tool_calls.len());
                    if !msg.content.is_empty() {
                        blocks.push(ContentBlock::Text(msg.content.clone()));
                    }
                    for call in &msg.tool_calls {
                        let input = serde_json::from_str::<serde_json::Value>(&call.arguments)
                            .unwrap_or_else(|_| serde_json::json!({}));
                        let block = ToolUseBlock::builder()
                            .tool_use_id(&call.id)
                            .name(&call.name)
                            .input(document::from_json(&input))
                            .build()
                            .map_err(build_error)?;
                        blocks.push(ContentBlock::ToolUse(block));
                    }
                    if !blocks.is_empty() {
                        converted.push(Self::message(ConversationRole::Assistant, blocks)?);
                    }
                }
                Role::Tool => {}
            }
        }

        if !tool_results.is_empty() {
            converted.push(Self::message(ConversationRole::User, tool_results)?);
        }

        Ok(converted)
    }

    fn message(role: ConversationRole, content: Vec<ContentBlock>) -> Result<Message, AgentError> {
        Message::builder()
            .role(role)
            .set_content(Some(content))
            .build()
            .map_err(build_error)
    }

    fn tool_result_block(msg: &ChatMessage) -> Result<ContentBlock, AgentError> {
        let status = if msg.is_error {
            ToolResultStatus::Error
        } else {
            ToolResultStatus::Success
        };
        let block = ToolResultBlock::builder()
            .tool_use_id(msg.tool_call_id.clone().unwrap_or_default())
            .content(ToolResultContentBlock::Text(msg.content.clone()))
            .status(status)
            .build()
            .map_err(build_error)?;
        Ok(ContentBlock::ToolResult(block))
    }

    /// Builds the tool configuration, or `None` when no tools are offered.
    fn tool_config(tools: &[ToolDefinition]) -> Result<Option<ToolConfiguration>, AgentError> {
        if tools.is_empty() {
            return Ok(None);
        }

        let specs = tools
            .iter()
            .map(|td| {
                ToolSpecification::builder()
                    .name(&td.name)
                    .description(&td.description)
                    .input_schema(ToolInputSchema::Json(document::from_json(&td.parameters)))
                    .build()
                    .map(Tool::ToolSpec)
                    .map_err(build_error)
            })
            .collect::<Result<Vec<_>, _>>()?;

        ToolConfiguration::builder()
            .set_tools(Some(specs))
            .build()
            .map(Some)
            .map_err(build_error)
    }

    fn inference_config(request: &ChatRequest) -> InferenceConfiguration {
        InferenceConfiguration::builder()
            .set_max_tokens(request.max_tokens.map(|n| i32::try_from(n).unwrap_or(i32::MAX)))
            .set_temperature(request.temperature)
            .build()
    }

    /// Maps a Bedrock stream event to our event type.
    ///
    /// Events we do not model (reasoning deltas, unknown variants) map to `None`.
    fn convert_event(event: &ConverseStreamOutput) -> Option<ModelEvent> {
        match event {
            ConverseStreamOutput::MessageStart(e) => Some(ModelEvent::MessageStart {
                role: e.role().as_str().to_string(),
            }),
            ConverseStreamOutput::ContentBlockStart(e) => match e.start() {
                Some(ContentBlockStart::ToolUse(start)) => Some(ModelEvent::ContentBlockStart {
                    content_block_index: e.content_block_index(),
                    start: BlockStart::ToolUse {
                        tool_use_id: start.tool_use_id().to_string(),
                        name: start.name().to_string(),
                    },
                }),
                _ => None,
            },
            ConverseStreamOutput::ContentBlockDelta(e) => {
                let delta = match e.delta() {
                    Some(ContentBlockDelta::Text(text)) => BlockDelta::Text(text.clone()),
                    Some(ContentBlockDelta::ToolUse(tool)) => BlockDelta::ToolUse {
                        input: tool.input().to_string(),
                    },
                    _ => return None,
                };
                Some(ModelEvent::ContentBlockDelta {
                    content_block_index: e.content_block_index(),
                    delta,
                })
            }
            ConverseStreamOutput::ContentBlockStop(e) => Some(ModelEvent::ContentBlockStop {
                content_block_index: e.content_block_index(),
            }),
            ConverseStreamOutput::MessageStop(e) => Some(ModelEvent::MessageStop {
                stop_reason: e.stop_reason().as_str().to_string(),
            }),
            ConverseStreamOutput::Metadata(e) => {
                let usage = e.usage().map_or_else(TokenUsage::default, |u| TokenUsage {
                    input_tokens: u32::try_from(u.input_tokens()).unwrap_or_default(),
                    output_tokens: u32::try_from(u.output_tokens()).unwrap_or_default(),
                    total_tokens: u32::try_from(u.total_tokens()).unwrap_or_default(),
                });
                Some(ModelEvent::Metadata { usage })
            }
            _ => None,
        }
    }
}

impl std::fmt::Debug for BedrockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BedrockProvider")
            .field("client", &"<aws-sdk-bedrockruntime::Client>")
            .finish()
    }
}

#[async_trait]
impl LlmProvider for BedrockProvider {
    fn name(&self) -> &'static str {
        "bedrock"
    }

    async fn converse_stream(&self, request: &ChatRequest) -> Result<ModelStream, AgentError> {
        let messages = Self::convert_messages(&request.messages)?;
        let tool_config = Self::tool_config(&request.tools)?;

        debug!(
            model = %request.model,
            messages = messages.len(),
            tools = request.tools.len(),
            "opening converse stream"
        );

        let output = self
            .client
            .converse_stream()
            .model_id(&request.model)
            .system(SystemContentBlock::Text(request.system.clone()))
            .set_messages(Some(messages))
            .inference_config(Self::inference_config(request))
            .set_tool_config(tool_config)
            .send()
            .await
            .map_err(|e| AgentError::ApiRequest {
                message: DisplayErrorContext(&e).to_string(),
            })?;

        let events = stream::unfold(Some(output.stream), |receiver| async move {
            let mut receiver = receiver?;
            loop {
                match receiver.recv().await {
                    Ok(Some(event)) => {
                        if let Some(converted) = Self::convert_event(&event) {
                            return Some((Ok(converted), Some(receiver)));
                        }
                    }
                    Ok(None) => return None,
                    Err(e) => {
                        let err = AgentError::Stream {
                            message: DisplayErrorContext(&e).to_string(),
                        };
                        return Some((Err(err), None));
                    }
                }
            }
        });

        Ok(Box::pin(events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::message::{assistant_message, tool_message, user_message};
    use crate::agent::tool::{ToolCall, ToolSet};

    fn call(id: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: "kb_search".to_string(),
            arguments: r#"{"query":"太陽光"}"#.to_string(),
        }
    }

    #[test]
    fn test_convert_user_message() {
        let converted = BedrockProvider::convert_messages(&[user_message("hello")])
            .unwrap_or_default();
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].role(), &ConversationRole::User);
        assert!(matches!(converted[0].content()[0], ContentBlock::Text(ref t) if t == "hello"));
    }

    #[test]
    fn test_parallel_tool_results_share_one_message() {
        let messages = vec![
            user_message("q"),
            assistant_message("調べます".to_string(), vec![call("a"), call("b")]),
            tool_message("a", "{}", false),
            tool_message("b", "{}", true),
        ];
        let converted = BedrockProvider::convert_messages(&messages).unwrap_or_default();
        assert_eq!(converted.len(), 3);

        let assistant = &converted[1];
        assert_eq!(assistant.role(), &ConversationRole::Assistant);
        assert_eq!(assistant.content().len(), 3);
        assert!(matches!(assistant.content()[1], ContentBlock::ToolUse(_)));

        let results = &converted[2];
        assert_eq!(results.role(), &ConversationRole::User);
        assert_eq!(results.content().len(), 2);
        assert!(
            matches!(&results.content()[1], ContentBlock::ToolResult(r) if r.status() == Some(&ToolResultStatus::Error))
        );
    }

    #[test]
    fn test_tool_config_for_kb_search() {
        let tools = ToolSet::knowledge_base_tools();
        let config = BedrockProvider::tool_config(tools.definitions()).unwrap_or_default();
        let config = config.map_or(0, |c| c.tools().len());
        assert_eq!(config, 1);
    }

    #[test]
    fn test_no_tool_config_without_tools() {
        let config = BedrockProvider::tool_config(&[]).unwrap_or_default();
        assert!(config.is_none());
    }

    #[test]
    fn test_inference_config() {
        let request = ChatRequest {
            model: "m".to_string(),
            system: String::new(),
            messages: Vec::new(),
            temperature: Some(0.7),
            max_tokens: Some(4096),
            tools: Vec::new(),
        };
        let config = BedrockProvider::inference_config(&request);
        assert_eq!(config.max_tokens(), Some(4096));
        assert_eq!(config.temperature(), Some(0.7));
    }
}
