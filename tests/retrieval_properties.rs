//! Properties of the `kb_search` adapter and result normalization.

#![allow(clippy::panic)]

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use proptest::prelude::*;
use serde_json::{Map, Value, json};

use common::{StaticClient, solar_chunks};
use kb_agent::error::RetrievalError;
use kb_agent::retrieval::types::{MAX_RESULTS_LIMIT, META_PAGE_NUMBER, META_SOURCE_URI};
use kb_agent::retrieval::{
    ClientFactory, KnowledgeBaseSearch, LazyRetrievalClient, Page, RawRetrievalResult,
    RetrievalClient, RetrievalQuery, RetrievalResultItem,
};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| panic!("runtime: {e}"))
}

fn raw(s3_uri: Option<String>, meta: Map<String, Value>) -> RawRetrievalResult {
    RawRetrievalResult {
        text: Some("chunk".to_string()),
        content_type: Some("TEXT".to_string()),
        score: Some(0.5),
        s3_uri,
        metadata: meta,
    }
}

/// Factory that counts how often a client is requested.
struct CountingFactory {
    created: AtomicUsize,
    client: Arc<dyn RetrievalClient>,
}

#[async_trait]
impl ClientFactory for CountingFactory {
    async fn create(&self, _region: &str) -> Result<Arc<dyn RetrievalClient>, RetrievalError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&self.client))
    }
}

proptest! {
    #[test]
    fn prop_max_results_resolves_into_service_range(requested in proptest::option::of(any::<i64>()), default in 1i32..=100) {
        let resolved = RetrievalQuery::new("q", requested).resolve_max_results(default);
        prop_assert!((1..=MAX_RESULTS_LIMIT).contains(&resolved));
        match requested {
            Some(n) if n > 0 => prop_assert_eq!(i64::from(resolved), n.min(i64::from(MAX_RESULTS_LIMIT))),
            _ => prop_assert_eq!(resolved, default),
        }
    }

    #[test]
    fn prop_uri_prefers_location_then_metadata(
        location in proptest::option::of("s3://[a-z]{1,8}/[a-z]{1,8}\\.pdf"),
        source in proptest::option::of("s3://[a-z]{1,8}/[a-z]{1,8}\\.txt"),
    ) {
        let mut meta = Map::new();
        if let Some(uri) = &source {
            meta.insert(META_SOURCE_URI.to_string(), json!(uri));
        }
        let item = RetrievalResultItem::from_raw(raw(location.clone(), meta));
        prop_assert_eq!(item.uri, location.or(source));
    }

    #[test]
    fn prop_whole_pages_become_integers(page in -1_000_000i64..1_000_000) {
        #[allow(clippy::cast_precision_loss)]
        let as_float = page as f64;
        prop_assert_eq!(Page::from_value(&json!(as_float)), Some(Page::Number(page)));
        prop_assert_eq!(Page::from_value(&json!(page)), Some(Page::Number(page)));
    }

    #[test]
    fn prop_fractional_pages_are_kept(page in 0i64..100_000) {
        #[allow(clippy::cast_precision_loss)]
        let fractional = page as f64 + 0.5;
        prop_assert_eq!(Page::from_value(&json!(fractional)), Some(Page::Fractional(fractional)));
    }

    #[test]
    fn prop_non_numeric_pages_are_dropped(text in "[a-z0-9]{0,6}") {
        prop_assert_eq!(Page::from_value(&json!(text)), None);
    }

    #[test]
    fn prop_results_count_matches_results(count in 0usize..8, requested in 1i64..20) {
        let chunks: Vec<RawRetrievalResult> = (0..count)
            .map(|i| raw(Some(format!("s3://kb/doc-{i}.pdf")), Map::new()))
            .collect();
        let search = KnowledgeBaseSearch::new(
            Some("KB".to_string()),
            5,
            Arc::new(LazyRetrievalClient::ready(Arc::new(StaticClient::with(chunks)), "us-west-2")),
        );
        let response = runtime().block_on(search.search(&RetrievalQuery::new("q", Some(requested))));
        prop_assert!(response.success);
        prop_assert_eq!(response.results_count, Some(response.results.len()));
        prop_assert!(response.results.len() <= usize::try_from(requested).unwrap_or(0));
    }
}

#[test]
fn test_page_metadata_normalized_on_items() {
    let mut meta = Map::new();
    meta.insert(META_PAGE_NUMBER.to_string(), json!(4.0));
    let item = RetrievalResultItem::from_raw(raw(None, meta));
    assert_eq!(item.page, Some(Page::Number(4)));
    assert_eq!(serde_json::to_value(&item).unwrap_or_default()["page"], json!(4));

    let mut meta = Map::new();
    meta.insert(META_PAGE_NUMBER.to_string(), json!(4.5));
    let item = RetrievalResultItem::from_raw(raw(None, meta));
    assert_eq!(serde_json::to_value(&item).unwrap_or_default()["page"], json!(4.5));
}

#[test]
fn test_uri_absent_when_both_missing() {
    let item = RetrievalResultItem::from_raw(raw(None, Map::new()));
    assert_eq!(item.uri, None);
}

#[tokio::test]
async fn test_unconfigured_knowledge_base_never_creates_a_client() {
    let factory = Arc::new(CountingFactory {
        created: AtomicUsize::new(0),
        client: Arc::new(StaticClient::with(solar_chunks())),
    });
    let lazy = Arc::new(LazyRetrievalClient::new(factory.clone(), "us-west-2"));
    let search = KnowledgeBaseSearch::new(None, 5, Arc::clone(&lazy));

    let response = search.search(&RetrievalQuery::new("太陽光", None)).await;

    assert!(!response.success);
    assert!(response.results.is_empty());
    assert!(response.error.as_deref().is_some_and(|e| !e.is_empty()));
    assert_eq!(factory.created.load(Ordering::SeqCst), 0);
    assert!(!lazy.is_initialized());
}

#[tokio::test]
async fn test_client_failure_is_reported() {
    let search = KnowledgeBaseSearch::new(
        Some("KB".to_string()),
        5,
        Arc::new(LazyRetrievalClient::ready(
            Arc::new(StaticClient::failing("ThrottlingException: rate exceeded")),
            "us-west-2",
        )),
    );
    let response = search.search(&RetrievalQuery::new("q", None)).await;
    assert!(!response.success);
    assert!(response.results.is_empty());
    assert_eq!(response.query.as_deref(), Some("q"));
    assert!(
        response
            .error
            .as_deref()
            .is_some_and(|e| e.contains("ThrottlingException"))
    );
}

#[tokio::test]
async fn test_client_is_created_once_across_searches() {
    let factory = Arc::new(CountingFactory {
        created: AtomicUsize::new(0),
        client: Arc::new(StaticClient::with(solar_chunks())),
    });
    let search = KnowledgeBaseSearch::new(
        Some("KB".to_string()),
        5,
        Arc::new(LazyRetrievalClient::new(factory.clone(), "us-west-2")),
    );

    let searches = (0..8).map(|i| {
        let search = search.clone();
        tokio::spawn(async move { search.search(&RetrievalQuery::new(format!("q{i}"), None)).await })
    });
    for handle in searches {
        let response = handle.await.unwrap_or_else(|e| panic!("join: {e}"));
        assert!(response.success);
        assert_eq!(response.results_count, Some(2));
    }
    assert_eq!(factory.created.load(Ordering::SeqCst), 1);
}
