//! HTTP handlers for the invocation runtime contract.

use std::convert::Infallible;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use tokio_stream::StreamExt;
use tracing::{instrument, warn};

use crate::entrypoint::Entrypoint;
use crate::error::AgentError;

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// GET /ping
pub async fn ping_handler() -> Json<Value> {
    Json(json!({ "status": "Healthy" }))
}

/// POST /invocations
///
/// Streams each model event as an SSE `data:` line. A failure after the
/// stream has started is sent as a final `{"error": ...}` event.
#[instrument(skip_all, fields(body_len = body.len()))]
pub async fn invocations_handler(State(entrypoint): State<Entrypoint>, body: Bytes) -> Response {
    let payload: Value = if body.is_empty() {
        json!({})
    } else {
        match serde_json::from_slice(&body) {
            Ok(payload) => payload,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
        }
    };

    let events = match entrypoint.handle(payload) {
        Ok(events) => events,
        Err(e @ AgentError::InvalidPayload { .. }) => {
            return error_response(StatusCode::BAD_REQUEST, &e.to_string());
        }
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    };

    let stream = events.map(|item| {
        let data = match item {
            Ok(event) => event.to_string(),
            Err(e) => {
                warn!(error = %e, "invocation stream failed");
                json!({ "error": e.to_string() }).to_string()
            }
        };
        Ok::<_, Infallible>(Event::default().data(data))
    });

    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}
