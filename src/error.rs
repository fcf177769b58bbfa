//! Error types for the knowledge-base agent.
//!
//! Two families: [`AgentError`] covers model sessions, configuration and the
//! entrypoint, and is the only class that reaches the caller.
//! [`RetrievalError`] covers the knowledge-base call and is always folded
//! into a structured [`RetrievalResponse`](crate::retrieval::RetrievalResponse)
//! before the model sees it.

use thiserror::Error;

/// Errors raised while configuring or running the agent.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Configuration value is out of range or malformed.
    #[error("invalid configuration: {message}")]
    Config {
        /// What was wrong.
        message: String,
    },

    /// The requested model provider is not known.
    #[error("unsupported provider: {name}")]
    UnsupportedProvider {
        /// Name that was requested.
        name: String,
    },

    /// The model API rejected or failed a request.
    #[error("model API request failed: {message}")]
    ApiRequest {
        /// Error detail from the SDK.
        message: String,
    },

    /// The model stream failed after it was opened.
    #[error("model stream failed: {message}")]
    Stream {
        /// Error detail from the SDK.
        message: String,
    },

    /// A tool call could not be executed.
    #[error("tool `{name}` failed: {message}")]
    ToolExecution {
        /// Tool name.
        name: String,
        /// Failure detail.
        message: String,
    },

    /// The model kept requesting tools past the iteration cap.
    #[error("tool loop exceeded {max_iterations} model round trips")]
    ToolLoopExceeded {
        /// Configured cap.
        max_iterations: usize,
    },

    /// The per-request time budget ran out.
    #[error("request exceeded its time budget of {seconds}s")]
    Timeout {
        /// Configured budget in seconds.
        seconds: u64,
    },

    /// The inbound payload did not have the expected shape.
    #[error("invalid payload: {message}")]
    InvalidPayload {
        /// Deserialization detail.
        message: String,
    },
}

/// Reasons a knowledge-base search did not produce results.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RetrievalError {
    /// No knowledge-base identifier is configured.
    #[error("環境変数 STRANDS_KNOWLEDGE_BASE_ID が設定されていません")]
    NotConfigured,

    /// The query text was empty.
    #[error("query must not be empty")]
    EmptyQuery,

    /// The service client could not be created.
    #[error("failed to create knowledge-base client: {0}")]
    Client(String),

    /// The retrieval call failed.
    #[error("{0}")]
    Service(String),
}
