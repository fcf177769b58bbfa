//! Invocation entrypoint.
//!
//! Accepts the hosted-runtime payload `{"prompt": "...", "model": {"modelId": "..."}}`
//! and relays the agent's event stream, keeping only the model-stream events
//! (objects carrying an `event` key). Tool results and the closing summary
//! stay internal.

use std::pin::Pin;
use std::sync::Arc;

use futures_util::{Stream, StreamExt, future};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::agent::Orchestrator;
use crate::error::AgentError;

/// Stream of JSON event objects sent back to the caller.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<Value, AgentError>> + Send>>;

/// Model selection in an invocation payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSelector {
    /// Bedrock model identifier.
    #[serde(default)]
    pub model_id: Option<String>,
}

/// Inbound invocation payload. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InvocationRequest {
    /// User question. Missing means the empty string.
    #[serde(default)]
    pub prompt: Option<String>,
    /// Model selection.
    #[serde(default)]
    pub model: Option<ModelSelector>,
}

impl InvocationRequest {
    /// Parses a payload value.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidPayload`] when the payload is not an
    /// object or a field has the wrong type.
    pub fn from_value(payload: Value) -> Result<Self, AgentError> {
        serde_json::from_value(payload).map_err(|e| AgentError::InvalidPayload {
            message: e.to_string(),
        })
    }

    /// Prompt text, empty when absent.
    #[must_use]
    pub fn prompt(&self) -> &str {
        self.prompt.as_deref().unwrap_or_default()
    }

    /// Selected model, or `default` when the payload names none.
    #[must_use]
    pub fn model_id<'a>(&'a self, default: &'a str) -> &'a str {
        self.model
            .as_ref()
            .and_then(|m| m.model_id.as_deref())
            .unwrap_or(default)
    }
}

/// Relays invocations to the orchestrator.
#[derive(Debug, Clone)]
pub struct Entrypoint {
    orchestrator: Arc<Orchestrator>,
}

impl Entrypoint {
    /// Creates an entrypoint over a shared orchestrator.
    #[must_use]
    pub const fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Orchestrator behind this entrypoint.
    #[must_use]
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Handles a raw JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidPayload`] before any model call when the
    /// payload cannot be read.
    pub fn handle(&self, payload: Value) -> Result<EventStream, AgentError> {
        let request = InvocationRequest::from_value(payload)?;
        Ok(self.handle_request(&request))
    }

    /// Handles a parsed invocation.
    ///
    /// The stream is lazy. Errors from the agent are relayed as the last item.
    #[must_use]
    pub fn handle_request(&self, request: &InvocationRequest) -> EventStream {
        let model_id = request.model_id(self.orchestrator.default_model_id());
        info!(model_id, prompt_len = request.prompt().len(), "invocation received");

        let events = self.orchestrator.run(request.prompt(), model_id);
        Box::pin(events.filter_map(|item| {
            future::ready(match item {
                Ok(event) => {
                    let value = event.to_json();
                    value.get("event").is_some().then_some(Ok(value))
                }
                Err(e) => Some(Err(e)),
            })
        }))
    }
}
