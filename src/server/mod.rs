//! HTTP runtime for hosted deployment.
//!
//! # Feature Gate
//!
//! This module requires the `server` feature flag (enabled by default).
//!
//! # Contract
//!
//! ```text
//! POST /invocations  {"prompt": "...", "model": {"modelId": "..."}}
//!   ↓ Entrypoint::handle
//! text/event-stream  data: {"event": {...}}  (one per model event)
//!                    data: {"error": "..."}  (only on mid-stream failure)
//!
//! GET /ping → {"status": "Healthy"}
//! ```
//!
//! Unreadable payloads are rejected with 400 before any model call.

pub mod handlers;
pub mod transport;

pub use transport::{DEFAULT_PORT, router, serve_http};
