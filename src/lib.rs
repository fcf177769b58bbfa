//! # kb-agent
//!
//! Retrieval-augmented question answering over an Amazon Bedrock knowledge
//! base. A model session is given a single tool, `kb_search`, that runs a
//! semantic search and returns citation-ready results; the answer streams
//! back as Bedrock-shaped model events.
//!
//! ## Layout
//!
//! - [`retrieval`]: the `kb_search` adapter (lazy client, normalization)
//! - [`agent`]: prompt, provider, tool loop and orchestrator
//! - [`entrypoint`]: payload handling and event filtering
//! - [`server`]: HTTP runtime (`POST /invocations`, `GET /ping`)
//! - [`cli`]: the `kb-agent` command line

pub mod agent;
pub mod cli;
pub mod document;
pub mod entrypoint;
pub mod error;
pub mod retrieval;
#[cfg(feature = "server")]
pub mod server;

pub use agent::{AgentConfig, Orchestrator};
pub use entrypoint::{Entrypoint, EventStream, InvocationRequest};
pub use error::{AgentError, RetrievalError};
