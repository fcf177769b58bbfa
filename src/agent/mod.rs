//! Knowledge-base question answering agent.
//!
//! One request runs one [`KnowledgeBaseAgent`] against a streaming model
//! provider. The agent may call the `kb_search` tool any number of times
//! (bounded by the iteration cap) before writing its cited answer.
//!
//! # Architecture
//!
//! ```text
//! prompt + modelId → Orchestrator::run
//!   ├── KnowledgeBaseAgent (system prompt, model settings, kb_search)
//!   └── agentic_stream
//!         ├── LlmProvider::converse_stream → ModelEvent* (relayed as they arrive)
//!         ├── ToolExecutor::execute(kb_search) → KnowledgeBaseSearch
//!         └── … until the model answers without tools
//!   ↓
//! AgentEvent stream: Event* / ToolResult* / Result
//! ```

pub mod agentic_loop;
pub mod citation;
pub mod client;
pub mod config;
pub mod events;
pub mod executor;
pub mod message;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod rag;
pub mod tool;
pub mod traits;

// Re-export key types
pub use agentic_loop::{AgentStream, LoopLimits, agentic_stream};
pub use citation::{CitationAudit, Reference};
pub use config::AgentConfig;
pub use events::{AgentEvent, AgentSummary, BlockDelta, BlockStart, ModelEvent};
pub use executor::ToolExecutor;
pub use message::{ChatMessage, ChatRequest, Role, TokenUsage};
pub use orchestrator::Orchestrator;
pub use prompt::PromptSet;
pub use provider::{LlmProvider, ModelStream};
pub use rag::{KnowledgeBaseAgent, ModelSettings};
pub use tool::{ToolCall, ToolDefinition, ToolResult, ToolSet};
pub use traits::{Agent, stream_with_tools};
