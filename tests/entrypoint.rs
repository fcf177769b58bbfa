//! Payload handling and agent configuration per request.

#![allow(clippy::panic)]

mod common;

use std::sync::Arc;

use futures_util::StreamExt;
use serde_json::{Value, json};
use test_case::test_case;

use common::{ScriptedProvider, StaticClient, orchestrator};
use kb_agent::agent::Agent;
use kb_agent::agent::config::DEFAULT_MODEL_ID;
use kb_agent::entrypoint::{Entrypoint, InvocationRequest};

#[test_case(json!({}), "", DEFAULT_MODEL_ID ; "empty payload")]
#[test_case(json!({"prompt": "hi"}), "hi", DEFAULT_MODEL_ID ; "no model")]
#[test_case(json!({"prompt": "hi", "model": {}}), "hi", DEFAULT_MODEL_ID ; "model without id")]
#[test_case(json!({"prompt": "hi", "model": null}), "hi", DEFAULT_MODEL_ID ; "null model")]
#[test_case(
    json!({"prompt": "hi", "model": {"modelId": "anthropic.claude-3-5-sonnet-20241022-v2:0"}}),
    "hi",
    "anthropic.claude-3-5-sonnet-20241022-v2:0"
    ; "explicit model"
)]
fn test_payload_defaults(payload: Value, prompt: &str, model_id: &str) {
    let request = InvocationRequest::from_value(payload).unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(request.prompt(), prompt);
    assert_eq!(request.model_id(DEFAULT_MODEL_ID), model_id);
}

#[test_case(json!(null) ; "null payload")]
#[test_case(json!([1, 2]) ; "array payload")]
#[test_case(json!({"prompt": ["a"]}) ; "prompt not a string")]
#[test_case(json!({"model": {"modelId": 7}}) ; "model id not a string")]
fn test_malformed_payloads(payload: Value) {
    assert!(InvocationRequest::from_value(payload).is_err());
}

#[test]
fn test_default_model_is_visible_on_agent() {
    let orch = orchestrator(
        Arc::new(ScriptedProvider::new()),
        Arc::new(StaticClient::default()),
        Some("KB"),
    );
    let request = InvocationRequest::from_value(json!({"prompt": "x"}))
        .unwrap_or_else(|e| panic!("{e}"));
    let agent = orch.agent(request.model_id(orch.default_model_id()));

    assert_eq!(agent.settings().model_id, DEFAULT_MODEL_ID);
    assert_eq!(agent.settings().region, "us-west-2");
    assert_eq!(agent.settings().max_tokens, 4096);
    assert!((agent.settings().temperature - 0.7).abs() < f32::EPSILON);
    assert_eq!(agent.tool_names(), vec!["kb_search"]);
    assert!(agent.system_prompt().contains("## 参考文献"));
}

#[tokio::test]
async fn test_selected_model_reaches_the_provider() {
    let provider = Arc::new(ScriptedProvider::new());
    let entrypoint = Entrypoint::new(Arc::new(orchestrator(
        provider.clone(),
        Arc::new(StaticClient::default()),
        Some("KB"),
    )));

    let _: Vec<_> = entrypoint
        .handle(json!({"prompt": "q", "model": {"modelId": "custom-model"}}))
        .unwrap_or_else(|e| panic!("{e}"))
        .collect()
        .await;
    let _: Vec<_> = entrypoint
        .handle(json!({"prompt": "q"}))
        .unwrap_or_else(|e| panic!("{e}"))
        .collect()
        .await;

    let models: Vec<String> = provider
        .requests
        .lock()
        .map(|r| r.iter().map(|req| req.model.clone()).collect())
        .unwrap_or_default();
    assert_eq!(
        models,
        vec![
            "custom-model".to_string(),
            "custom-model".to_string(),
            DEFAULT_MODEL_ID.to_string(),
            DEFAULT_MODEL_ID.to_string(),
        ]
    );

    let request = provider
        .requests
        .lock()
        .map(|r| r[0].clone())
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(request.temperature, Some(0.7));
    assert_eq!(request.max_tokens, Some(4096));
    assert_eq!(request.tools.len(), 1);
    assert_eq!(request.tools[0].name, "kb_search");
}

#[tokio::test]
async fn test_missing_prompt_is_sent_as_empty() {
    let provider = Arc::new(ScriptedProvider::new());
    let entrypoint = Entrypoint::new(Arc::new(orchestrator(
        provider.clone(),
        Arc::new(StaticClient::default()),
        Some("KB"),
    )));

    let _: Vec<_> = entrypoint
        .handle(json!({}))
        .unwrap_or_else(|e| panic!("{e}"))
        .collect()
        .await;

    let first_user = provider
        .requests
        .lock()
        .map(|r| r[0].messages[0].content.clone())
        .unwrap_or_default();
    assert_eq!(first_user, "");
}
