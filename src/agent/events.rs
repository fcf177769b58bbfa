//! Streamed events produced by a model session.
//!
//! [`ModelEvent`] mirrors the `ConverseStream` event shapes so that callers
//! receive the same JSON a Bedrock client would. [`AgentEvent`] wraps model
//! events together with the loop's own notifications; only
//! [`AgentEvent::Event`] serializes with an `event` key.

use serde::Serialize;

use super::message::TokenUsage;
use super::tool::ToolResult;

/// Start payload of a content block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BlockStart {
    /// The model begins a tool invocation.
    ToolUse {
        /// Provider-assigned call id.
        tool_use_id: String,
        /// Tool name.
        name: String,
    },
}

/// Incremental payload of a content block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BlockDelta {
    /// Answer text.
    Text(String),
    /// A fragment of the tool input JSON.
    ToolUse {
        /// Partial JSON text.
        input: String,
    },
}

/// One increment of model output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ModelEvent {
    /// The model started a message.
    MessageStart {
        /// Message role (always `assistant`).
        role: String,
    },
    /// A content block started.
    ContentBlockStart {
        /// Block position within the message.
        content_block_index: i32,
        /// What kind of block starts.
        start: BlockStart,
    },
    /// A content block grew.
    ContentBlockDelta {
        /// Block position within the message.
        content_block_index: i32,
        /// The increment.
        delta: BlockDelta,
    },
    /// A content block finished.
    ContentBlockStop {
        /// Block position within the message.
        content_block_index: i32,
    },
    /// The message finished.
    MessageStop {
        /// Why generation stopped (e.g. `end_turn`, `tool_use`).
        stop_reason: String,
    },
    /// Usage reported after the message.
    Metadata {
        /// Token counts for this turn.
        usage: TokenUsage,
    },
}

impl ModelEvent {
    /// Answer text carried by this event, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::ContentBlockDelta {
                delta: BlockDelta::Text(text),
                ..
            } => Some(text),
            _ => None,
        }
    }
}

/// Final summary of a completed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSummary {
    /// Stop reason of the last model turn.
    pub stop_reason: String,
    /// Number of model round trips.
    pub model_calls: usize,
    /// Number of tool calls executed.
    pub tool_calls: usize,
    /// Token usage summed over all turns.
    pub usage: TokenUsage,
}

/// Anything the agent loop emits.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AgentEvent {
    /// A model stream event (serialized as `{"event": {...}}`).
    Event(ModelEvent),
    /// A tool finished (serialized as `{"toolResult": {...}}`).
    ToolResult(ToolResult),
    /// The request completed (serialized as `{"result": {...}}`).
    Result(AgentSummary),
}

impl AgentEvent {
    /// Serializes to the JSON object handed to callers.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Answer text carried by this event, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Event(event) => event.text(),
            _ => None,
        }
    }
}
