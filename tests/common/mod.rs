//! Shared fixtures for integration tests.
//!
//! A scripted model provider that searches on its first turn and answers
//! from the tool result on its second, and an in-memory retrieval client.

#![allow(dead_code, clippy::panic)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures_util::stream;
use serde_json::{Value, json};

use kb_agent::agent::message::{ChatRequest, Role, TokenUsage};
use kb_agent::agent::provider::{LlmProvider, ModelStream};
use kb_agent::agent::{
    AgentConfig, BlockDelta, BlockStart, ModelEvent, Orchestrator, PromptSet, ToolExecutor,
};
use kb_agent::error::{AgentError, RetrievalError};
use kb_agent::retrieval::{
    KnowledgeBaseSearch, LazyRetrievalClient, RawRetrievalResult, RetrievalClient,
    RetrieveRequest,
};

pub const SOLAR_PROMPT: &str = "太陽光発電について教えて";

/// Two solar chunks as the retrieval service returns them.
pub fn solar_chunks() -> Vec<RawRetrievalResult> {
    let meta = |uri: &str, page: Value| {
        json!({
            "x-amz-bedrock-kb-source-uri": uri,
            "x-amz-bedrock-kb-document-page-number": page,
            "x-amz-bedrock-kb-chunk-id": format!("chunk-{uri}"),
        })
        .as_object()
        .cloned()
        .unwrap_or_default()
    };
    vec![
        RawRetrievalResult {
            text: Some("太陽電池は光エネルギーを直接電気に変換する。".to_string()),
            content_type: Some("TEXT".to_string()),
            score: Some(0.91),
            s3_uri: Some("s3://kb-docs/energy/solar-basics.pdf".to_string()),
            metadata: meta("s3://kb-docs/energy/solar-basics.pdf", json!(3.0)),
        },
        RawRetrievalResult {
            text: Some("パワーコンディショナが直流を交流に変換する。".to_string()),
            content_type: Some("TEXT".to_string()),
            score: Some(0.84),
            s3_uri: None,
            metadata: meta("s3://kb-docs/energy/inverter-guide.pdf", json!(12)),
        },
    ]
}

/// Retrieval client returning fixed results, recording each request.
#[derive(Default)]
pub struct StaticClient {
    pub results: Vec<RawRetrievalResult>,
    pub by_query: Vec<(String, Vec<RawRetrievalResult>)>,
    pub failure: Option<String>,
    pub requests: Mutex<Vec<RetrieveRequest>>,
}

impl StaticClient {
    pub fn with(results: Vec<RawRetrievalResult>) -> Self {
        Self {
            results,
            ..Self::default()
        }
    }

    /// Returns a different result set per query text.
    pub fn keyed(by_query: Vec<(&str, Vec<RawRetrievalResult>)>) -> Self {
        Self {
            by_query: by_query
                .into_iter()
                .map(|(query, results)| (query.to_string(), results))
                .collect(),
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }
}

#[async_trait]
impl RetrievalClient for StaticClient {
    async fn retrieve(
        &self,
        request: &RetrieveRequest,
    ) -> Result<Vec<RawRetrievalResult>, RetrievalError> {
        if let Ok(mut seen) = self.requests.lock() {
            seen.push(request.clone());
        }
        let results = self
            .by_query
            .iter()
            .find(|(query, _)| *query == request.text)
            .map_or(&self.results, |(_, results)| results);
        match &self.failure {
            Some(message) => Err(RetrievalError::Service(message.clone())),
            None => Ok(results
                .iter()
                .take(usize::try_from(request.number_of_results).unwrap_or(0))
                .cloned()
                .collect()),
        }
    }
}

fn text_events(text_parts: &[String]) -> Vec<ModelEvent> {
    let mut events = vec![ModelEvent::MessageStart {
        role: "assistant".to_string(),
    }];
    events.extend(text_parts.iter().map(|part| ModelEvent::ContentBlockDelta {
        content_block_index: 0,
        delta: BlockDelta::Text(part.clone()),
    }));
    events.push(ModelEvent::ContentBlockStop {
        content_block_index: 0,
    });
    events.push(ModelEvent::MessageStop {
        stop_reason: "end_turn".to_string(),
    });
    events.push(ModelEvent::Metadata {
        usage: TokenUsage {
            input_tokens: 850,
            output_tokens: 120,
            total_tokens: 970,
        },
    });
    events
}

fn search_events(query: &str) -> Vec<ModelEvent> {
    vec![
        ModelEvent::MessageStart {
            role: "assistant".to_string(),
        },
        ModelEvent::ContentBlockStart {
            content_block_index: 0,
            start: BlockStart::ToolUse {
                tool_use_id: "tooluse_kb_1".to_string(),
                name: "kb_search".to_string(),
            },
        },
        ModelEvent::ContentBlockDelta {
            content_block_index: 0,
            delta: BlockDelta::ToolUse {
                input: json!({ "query": query, "max_results": 5 }).to_string(),
            },
        },
        ModelEvent::ContentBlockStop {
            content_block_index: 0,
        },
        ModelEvent::MessageStop {
            stop_reason: "tool_use".to_string(),
        },
    ]
}

/// Writes a cited answer from a `kb_search` tool result, following the
/// system prompt's citation rules.
pub fn cited_answer(tool_content: &str) -> Vec<String> {
    let response: Value = serde_json::from_str(tool_content).unwrap_or_default();
    let results = response["results"].as_array().cloned().unwrap_or_default();
    if results.is_empty() {
        return vec!["ナレッジベースに該当する情報が見つかりませんでした。".to_string()];
    }

    let mut parts = Vec::new();
    let mut references = String::from("\n\n## 参考文献\n");
    for (i, item) in results.iter().enumerate() {
        let n = i + 1;
        let content = item["content"].as_str().unwrap_or_default();
        parts.push(format!("{content}[{n}]"));
        let uri = item["uri"].as_str().unwrap_or_default();
        let file = uri.rsplit('/').next().unwrap_or(uri);
        let page = item["page"]
            .as_i64()
            .map(|p| format!(" (p.{p})"))
            .unwrap_or_default();
        references.push_str(&format!("[{n}] {file} {uri}{page}\n"));
    }
    parts.push(references);
    parts
}

/// Provider that searches on the first turn and answers on the second.
pub struct ScriptedProvider {
    pub turns: AtomicUsize,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            turns: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn turn_count(&self) -> usize {
        self.turns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn converse_stream(&self, request: &ChatRequest) -> Result<ModelStream, AgentError> {
        self.turns.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.requests.lock() {
            seen.push(request.clone());
        }

        let last = request.messages.last();
        let events = match last {
            Some(msg) if msg.role == Role::Tool => text_events(&cited_answer(&msg.content)),
            Some(msg) => search_events(&msg.content),
            None => text_events(&["?".to_string()]),
        };
        Ok(Box::pin(stream::iter(events.into_iter().map(Ok::<_, AgentError>))))
    }
}

/// Builds an orchestrator over the given provider and retrieval client.
pub fn orchestrator(
    provider: Arc<dyn LlmProvider>,
    client: Arc<dyn RetrievalClient>,
    knowledge_base_id: Option<&str>,
) -> Orchestrator {
    let mut builder = AgentConfig::builder();
    if let Some(id) = knowledge_base_id {
        builder = builder.knowledge_base_id(id);
    }
    let config = builder.build().unwrap_or_else(|e| panic!("config: {e}"));
    let search = KnowledgeBaseSearch::new(
        config.knowledge_base_id.clone(),
        config.default_max_results,
        Arc::new(LazyRetrievalClient::ready(client, config.region.clone())),
    );
    Orchestrator::new(
        provider,
        Arc::new(ToolExecutor::new(search)),
        config,
        PromptSet::defaults(),
    )
}
