//! Streaming agentic tool-calling loop.
//!
//! Drives the model ↔ tool round-trip as a lazy stream: opens a model turn,
//! relays each model event as it arrives, executes the tool calls the turn
//! requested, appends the results and opens the next turn, until the model
//! answers without tools or a limit is reached.
//!
//! ```text
//! Request ──open──▶ Streaming ──turn ends, tools──▶ Tools ──all done──▶ Request
//!                      │                                                  │
//!                      └──turn ends, no tools──▶ Finish ──▶ Done ◀──limit─┘
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{Stream, StreamExt, stream};
use tokio::time::Instant;
use tracing::{debug, warn};

use super::events::{AgentEvent, AgentSummary, BlockDelta, BlockStart, ModelEvent};
use super::executor::ToolExecutor;
use super::message::{ChatRequest, TokenUsage, assistant_message, tool_message};
use super::provider::{LlmProvider, ModelStream};
use super::tool::ToolCall;
use crate::error::AgentError;

/// Lazy, single-consumption stream of agent events for one request.
pub type AgentStream = Pin<Box<dyn Stream<Item = Result<AgentEvent, AgentError>> + Send>>;

/// Bounds on a single request's loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopLimits {
    /// Maximum model round trips.
    pub max_iterations: usize,
    /// Wall-clock budget measured from the first poll.
    pub time_budget: Option<Duration>,
}

/// Runs an agentic loop as a stream: model → tool calls → tool results → model → …
///
/// Nothing happens until the stream is polled. Model events are yielded as
/// [`AgentEvent::Event`] in arrival order, each executed tool call as
/// [`AgentEvent::ToolResult`], and a final [`AgentEvent::Result`] closes a
/// successful run.
///
/// # Errors
///
/// The stream yields one error item and ends on provider failures,
/// [`AgentError::ToolLoopExceeded`] when the model still wants tools after
/// `max_iterations` turns, or [`AgentError::Timeout`] when the time budget
/// runs out.
pub fn agentic_stream(
    provider: Arc<dyn LlmProvider>,
    request: ChatRequest,
    executor: Arc<ToolExecutor>,
    limits: LoopLimits,
) -> AgentStream {
    let state = LoopState {
        provider,
        executor,
        request,
        limits,
        deadline: None,
        phase: Phase::Request,
        turn: TurnAssembler::default(),
        model_calls: 0,
        tool_calls: 0,
        usage: TokenUsage::default(),
        stop_reason: None,
    };
    Box::pin(stream::unfold(state, LoopState::step))
}

enum Phase {
    /// About to open a model turn.
    Request,
    /// Relaying the current turn.
    Streaming(ModelStream),
    /// Executing the tool calls of the last turn.
    Tools(VecDeque<ToolCall>),
    /// Emitting the summary.
    Finish,
    Done,
}

struct LoopState {
    provider: Arc<dyn LlmProvider>,
    executor: Arc<ToolExecutor>,
    request: ChatRequest,
    limits: LoopLimits,
    deadline: Option<Instant>,
    phase: Phase,
    turn: TurnAssembler,
    model_calls: usize,
    tool_calls: usize,
    usage: TokenUsage,
    stop_reason: Option<String>,
}

type Step = Option<(Result<AgentEvent, AgentError>, LoopState)>;

/// Awaits `fut` unless the deadline passes first.
async fn within<F: Future>(
    deadline: Option<Instant>,
    budget: Option<Duration>,
    fut: F,
) -> Result<F::Output, AgentError> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut)
            .await
            .map_err(|_| AgentError::Timeout {
                seconds: budget.map_or(0, |b| b.as_secs()),
            }),
        None => Ok(fut.await),
    }
}

impl LoopState {
    async fn step(mut self) -> Step {
        if self.deadline.is_none() {
            self.deadline = self
                .limits
                .time_budget
                .and_then(|b| Instant::now().checked_add(b));
        }
        let (deadline, budget) = (self.deadline, self.limits.time_budget);

        loop {
            match std::mem::replace(&mut self.phase, Phase::Done) {
                Phase::Request => {
                    if self.model_calls >= self.limits.max_iterations {
                        warn!(
                            max_iterations = self.limits.max_iterations,
                            "tool loop limit reached"
                        );
                        let max_iterations = self.limits.max_iterations;
                        return self.fail(AgentError::ToolLoopExceeded { max_iterations });
                    }
                    self.model_calls += 1;
                    debug!(iteration = self.model_calls, "requesting model turn");

                    let opened =
                        within(deadline, budget, self.provider.converse_stream(&self.request))
                            .await
                            .and_then(|r| r);
                    match opened {
                        Ok(model_stream) => self.phase = Phase::Streaming(model_stream),
                        Err(e) => return self.fail(e),
                    }
                }
                Phase::Streaming(mut model_stream) => {
                    match within(deadline, budget, model_stream.next()).await {
                        Ok(Some(Ok(event))) => {
                            self.turn.apply(&event);
                            self.phase = Phase::Streaming(model_stream);
                            return Some((Ok(AgentEvent::Event(event)), self));
                        }
                        Ok(Some(Err(e))) | Err(e) => return self.fail(e),
                        Ok(None) => self.end_turn(),
                    }
                }
                Phase::Tools(mut calls) => {
                    let Some(call) = calls.pop_front() else {
                        self.phase = Phase::Request;
                        continue;
                    };
                    let result = match within(deadline, budget, self.executor.execute(&call)).await
                    {
                        Ok(result) => result,
                        Err(e) => return self.fail(e),
                    };
                    debug!(
                        tool = %call.name,
                        call_id = %call.id,
                        is_error = result.is_error,
                        "tool execution complete"
                    );
                    self.tool_calls += 1;
                    self.request.messages.push(tool_message(
                        &result.tool_call_id,
                        &result.content,
                        result.is_error,
                    ));
                    self.phase = Phase::Tools(calls);
                    return Some((Ok(AgentEvent::ToolResult(result)), self));
                }
                Phase::Finish => {
                    debug!(
                        model_calls = self.model_calls,
                        tool_calls = self.tool_calls,
                        "agentic loop completed with final text response"
                    );
                    let summary = AgentSummary {
                        stop_reason: self.stop_reason.take().unwrap_or_default(),
                        model_calls: self.model_calls,
                        tool_calls: self.tool_calls,
                        usage: self.usage,
                    };
                    return Some((Ok(AgentEvent::Result(summary)), self));
                }
                Phase::Done => return None,
            }
        }
    }

    /// Closes the current turn and decides what comes next.
    fn end_turn(&mut self) {
        let turn = std::mem::take(&mut self.turn).finish();
        self.usage.accumulate(turn.usage);
        self.stop_reason = turn.stop_reason;

        let has_tools = !turn.tool_calls.is_empty();
        if has_tools {
            debug!(
                iteration = self.model_calls,
                tool_count = turn.tool_calls.len(),
                "executing tool calls"
            );
        }
        self.request
            .messages
            .push(assistant_message(turn.text, turn.tool_calls.clone()));

        // Out of model turns: fail in Request without running the tools.
        self.phase = if has_tools && self.model_calls >= self.limits.max_iterations {
            Phase::Request
        } else if has_tools {
            Phase::Tools(turn.tool_calls.into())
        } else {
            Phase::Finish
        };
    }

    fn fail(mut self, error: AgentError) -> Step {
        self.phase = Phase::Done;
        Some((Err(error), self))
    }
}

/// A finished model turn.
struct Turn {
    text: String,
    tool_calls: Vec<ToolCall>,
    stop_reason: Option<String>,
    usage: TokenUsage,
}

struct PendingToolUse {
    id: String,
    name: String,
    input: String,
}

impl PendingToolUse {
    fn into_call(self) -> ToolCall {
        ToolCall {
            id: self.id,
            name: self.name,
            arguments: if self.input.trim().is_empty() {
                "{}".to_string()
            } else {
                self.input
            },
        }
    }
}

/// Rebuilds the assistant message from streamed events.
#[derive(Default)]
struct TurnAssembler {
    text: String,
    open: BTreeMap<i32, PendingToolUse>,
    closed: Vec<ToolCall>,
    stop_reason: Option<String>,
    usage: TokenUsage,
}

impl TurnAssembler {
    fn apply(&mut self, event: &ModelEvent) {
        match event {
            ModelEvent::ContentBlockStart {
                content_block_index,
                start: BlockStart::ToolUse { tool_use_id, name },
            } => {
                self.open.insert(
                    *content_block_index,
                    PendingToolUse {
                        id: tool_use_id.clone(),
                        name: name.clone(),
                        input: String::new(),
                    },
                );
            }
            ModelEvent::ContentBlockDelta { delta, content_block_index } => match delta {
                BlockDelta::Text(text) => self.text.push_str(text),
                BlockDelta::ToolUse { input } => {
                    if let Some(pending) = self.open.get_mut(content_block_index) {
                        pending.input.push_str(input);
                    }
                }
            },
            ModelEvent::ContentBlockStop { content_block_index } => {
                if let Some(pending) = self.open.remove(content_block_index) {
                    self.closed.push(pending.into_call());
                }
            }
            ModelEvent::MessageStop { stop_reason } => {
                self.stop_reason = Some(stop_reason.clone());
            }
            ModelEvent::Metadata { usage } => self.usage = *usage,
            ModelEvent::MessageStart { .. } => {}
        }
    }

    fn finish(mut self) -> Turn {
        // Blocks the provider never closed still count as requested calls.
        let unclosed = std::mem::take(&mut self.open);
        self.closed
            .extend(unclosed.into_values().map(PendingToolUse::into_call));
        Turn {
            text: self.text,
            tool_calls: self.closed,
            stop_reason: self.stop_reason,
            usage: self.usage,
        }
    }
}
