//! Tool executor that dispatches tool calls to the retrieval adapter.
//!
//! Tool arguments arrive as JSON text from the model; they are parsed into
//! typed arguments here, and the typed [`RetrievalResponse`] is serialized
//! back to JSON only when it is handed to the model.

use tracing::debug;

use super::tool::{KB_SEARCH_TOOL, KbSearchArgs, ToolCall, ToolResult};
use crate::error::AgentError;
use crate::retrieval::{KnowledgeBaseSearch, RetrievalQuery, RetrievalResponse};

/// Maximum raw byte length of tool argument JSON from the model.
const MAX_TOOL_ARGS_LEN: usize = 100_000;

/// Executes tool calls against the knowledge base.
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    search: KnowledgeBaseSearch,
}

impl ToolExecutor {
    /// Creates a new executor backed by the given search adapter.
    #[must_use]
    pub const fn new(search: KnowledgeBaseSearch) -> Self {
        Self { search }
    }

    /// Dispatches a tool call to the appropriate function.
    ///
    /// Validates raw argument size before dispatch to prevent oversized payloads.
    pub async fn execute(&self, call: &ToolCall) -> ToolResult {
        if call.arguments.len() > MAX_TOOL_ARGS_LEN {
            return ToolResult {
                tool_call_id: call.id.clone(),
                content: format!(
                    "tool arguments too large ({} bytes, max {MAX_TOOL_ARGS_LEN})",
                    call.arguments.len()
                ),
                is_error: true,
            };
        }

        let result = match call.name.as_str() {
            KB_SEARCH_TOOL => self.tool_kb_search(&call.arguments).await,
            other => Err(AgentError::ToolExecution {
                name: other.to_string(),
                message: "unknown tool".to_string(),
            }),
        };

        match result {
            Ok(response) => {
                debug!(
                    call_id = %call.id,
                    success = response.success,
                    results = response.results.len(),
                    "kb_search complete"
                );
                ToolResult {
                    tool_call_id: call.id.clone(),
                    content: response.to_tool_content(),
                    is_error: false,
                }
            }
            Err(e) => ToolResult {
                tool_call_id: call.id.clone(),
                content: e.to_string(),
                is_error: true,
            },
        }
    }

    /// Runs `kb_search`. Search failures are part of the response, not errors.
    async fn tool_kb_search(&self, args: &str) -> Result<RetrievalResponse, AgentError> {
        let args: KbSearchArgs = serde_json::from_str(args).map_err(|e| AgentError::ToolExecution {
            name: KB_SEARCH_TOOL.to_string(),
            message: format!("invalid arguments: {e}"),
        })?;

        let query = RetrievalQuery::new(args.query, args.max_results);
        Ok(self.search.search(&query).await)
    }
}
