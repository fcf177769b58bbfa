//! Tool type definitions for function-calling.
//!
//! Provides provider-agnostic types for tool definitions, calls, and results,
//! plus the schema of the single tool the agent exposes: `kb_search`.

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Name under which the knowledge-base search is exposed to the model.
pub const KB_SEARCH_TOOL: &str = "kb_search";

/// A tool definition that can be sent to a model for function-calling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (must match dispatch table in executor).
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema object describing the tool's parameters.
    pub parameters: serde_json::Value,
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this call (assigned by the provider).
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// JSON-encoded arguments for the tool.
    pub arguments: String,
}

/// The result of executing a tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    /// ID of the tool call this result corresponds to.
    pub tool_call_id: String,
    /// Result content (JSON string on success, error message on failure).
    pub content: String,
    /// Whether this result represents an error.
    pub is_error: bool,
}

/// Typed arguments of `kb_search`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KbSearchArgs {
    /// Search query.
    pub query: String,
    /// Maximum number of results; defaults to the configured count.
    #[serde(default)]
    pub max_results: Option<i64>,
}

/// A set of tool definitions scoped to an agent.
#[derive(Debug, Clone, Default)]
pub struct ToolSet {
    definitions: Vec<ToolDefinition>,
}

impl ToolSet {
    /// Returns the tool definitions in this set.
    #[must_use]
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Returns `true` if this set contains no tools.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Returns the number of tools in this set.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Tool set for the knowledge-base agent: exactly `kb_search`.
    #[must_use]
    pub fn knowledge_base_tools() -> Self {
        Self {
            definitions: vec![def_kb_search()],
        }
    }
}

/// Defines the `kb_search` tool.
fn def_kb_search() -> ToolDefinition {
    ToolDefinition {
        name: KB_SEARCH_TOOL.to_string(),
        description: "ナレッジベースから関連文書を検索（Retrieve）します。\
                      JSON文字列（success, results_count, results, error）を返します。\
                      各結果は content, type, score, uri, page, chunkId, dataSourceId を含みます。"
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "検索クエリ"
                },
                "max_results": {
                    "type": "integer",
                    "description": "取得する最大件数（省略時は環境変数の既定）"
                }
            },
            "required": ["query"]
        }),
    }
}
