//! Pluggable model provider trait.
//!
//! Implementations translate the provider-agnostic [`ChatRequest`] into
//! provider-specific SDK calls and the provider's stream back into
//! [`ModelEvent`]s. This keeps the agent loop decoupled from any vendor.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

use super::events::ModelEvent;
use super::message::ChatRequest;
use crate::error::AgentError;

/// Stream of model events for one model turn.
pub type ModelStream = Pin<Box<dyn Stream<Item = Result<ModelEvent, AgentError>> + Send>>;

/// Trait for model provider backends.
///
/// Implementations handle the transport layer for a specific provider while
/// presenting a uniform streaming interface to the agent loop.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., `"bedrock"`).
    fn name(&self) -> &'static str;

    /// Opens a streaming conversation turn.
    ///
    /// The returned stream ends after the model's `messageStop` and optional
    /// `metadata` events.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] when the request is rejected or the connection
    /// cannot be established.
    async fn converse_stream(&self, request: &ChatRequest) -> Result<ModelStream, AgentError>;
}
