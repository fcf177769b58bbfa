//! The `kb_search` operation: one semantic search, normalized for citation.

use std::sync::Arc;

use tracing::{debug, warn};

use super::client::{LazyRetrievalClient, RetrieveRequest};
use super::types::{RetrievalQuery, RetrievalResponse, RetrievalResultItem};
use crate::error::RetrievalError;

/// Knowledge-base search adapter.
///
/// Never fails: every error is reported inside the returned
/// [`RetrievalResponse`] so the model can explain it to the user.
#[derive(Debug, Clone)]
pub struct KnowledgeBaseSearch {
    knowledge_base_id: Option<String>,
    default_max_results: i32,
    client: Arc<LazyRetrievalClient>,
}

impl KnowledgeBaseSearch {
    /// Creates an adapter.
    ///
    /// `knowledge_base_id = None` makes every search fail locally.
    #[must_use]
    pub const fn new(
        knowledge_base_id: Option<String>,
        default_max_results: i32,
        client: Arc<LazyRetrievalClient>,
    ) -> Self {
        Self {
            knowledge_base_id,
            default_max_results,
            client,
        }
    }

    /// Default result count used when the caller does not pass one.
    #[must_use]
    pub const fn default_max_results(&self) -> i32 {
        self.default_max_results
    }

    /// Searches the knowledge base.
    pub async fn search(&self, query: &RetrievalQuery) -> RetrievalResponse {
        let outcome = self.try_search(query).await;
        if let Err(ref e) = outcome {
            warn!(error = %e, "knowledge-base search failed");
        }
        RetrievalResponse::from_outcome(&query.text, outcome)
    }

    /// Searches the knowledge base, surfacing the typed failure reason.
    pub async fn try_search(
        &self,
        query: &RetrievalQuery,
    ) -> Result<Vec<RetrievalResultItem>, RetrievalError> {
        let knowledge_base_id = self
            .knowledge_base_id
            .as_deref()
            .ok_or(RetrievalError::NotConfigured)?;

        if query.text.trim().is_empty() {
            return Err(RetrievalError::EmptyQuery);
        }

        let request = RetrieveRequest {
            knowledge_base_id: knowledge_base_id.to_string(),
            text: query.text.clone(),
            number_of_results: query.resolve_max_results(self.default_max_results),
        };

        debug!(
            knowledge_base_id,
            number_of_results = request.number_of_results,
            "searching knowledge base"
        );

        let client = self.client.get().await?;
        let raw = client.retrieve(&request).await?;

        Ok(raw.into_iter().map(RetrievalResultItem::from_raw).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::client::{ClientFactory, RetrievalClient};
    use crate::retrieval::types::{META_SOURCE_URI, RawRetrievalResult};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingClient {
        requests: Mutex<Vec<RetrieveRequest>>,
        fail_with: Option<String>,
    }

    #[async_trait]
    impl RetrievalClient for RecordingClient {
        async fn retrieve(
            &self,
            request: &RetrieveRequest,
        ) -> Result<Vec<RawRetrievalResult>, RetrievalError> {
            if let Ok(mut seen) = self.requests.lock() {
                seen.push(request.clone());
            }
            if let Some(ref msg) = self.fail_with {
                return Err(RetrievalError::Service(msg.clone()));
            }
            Ok(vec![RawRetrievalResult {
                text: Some("太陽電池は光を電気に変換します".to_string()),
                content_type: Some("TEXT".to_string()),
                score: Some(0.7),
                s3_uri: None,
                metadata: json!({ META_SOURCE_URI: "s3://docs/solar.pdf" })
                    .as_object()
                    .cloned()
                    .unwrap_or_default(),
            }])
        }
    }

    struct CountingFactory(AtomicUsize);

    #[async_trait]
    impl ClientFactory for CountingFactory {
        async fn create(&self, _region: &str) -> Result<Arc<dyn RetrievalClient>, RetrievalError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(RecordingClient::default()))
        }
    }

    fn adapter(kb: Option<&str>, client: Arc<RecordingClient>) -> KnowledgeBaseSearch {
        KnowledgeBaseSearch::new(
            kb.map(str::to_string),
            5,
            Arc::new(LazyRetrievalClient::ready(client, "us-west-2")),
        )
    }

    #[tokio::test]
    async fn test_unconfigured_never_builds_client() {
        let factory = Arc::new(CountingFactory(AtomicUsize::new(0)));
        let search = KnowledgeBaseSearch::new(
            None,
            5,
            Arc::new(LazyRetrievalClient::new(factory.clone(), "us-west-2")),
        );
        let resp = search.search(&RetrievalQuery::new("anything", None)).await;
        assert!(!resp.success);
        assert!(resp.results.is_empty());
        assert!(resp.error.as_deref().is_some_and(|e| !e.is_empty()));
        assert_eq!(factory.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_default_count_used_for_non_positive() {
        let client = Arc::new(RecordingClient::default());
        let search = adapter(Some("KB1"), client.clone());
        for max in [None, Some(0), Some(-1)] {
            let _ = search.search(&RetrievalQuery::new("solar", max)).await;
        }
        let _ = search.search(&RetrievalQuery::new("solar", Some(2))).await;
        let seen = client.requests.lock().map(|r| r.clone()).unwrap_or_default();
        let counts: Vec<i32> = seen.iter().map(|r| r.number_of_results).collect();
        assert_eq!(counts, vec![5, 5, 5, 2]);
        assert!(seen.iter().all(|r| r.knowledge_base_id == "KB1"));
    }

    #[tokio::test]
    async fn test_service_failure_is_reported() {
        let client = Arc::new(RecordingClient {
            fail_with: Some("ThrottlingException".to_string()),
            ..RecordingClient::default()
        });
        let resp = adapter(Some("KB1"), client)
            .search(&RetrievalQuery::new("solar", None))
            .await;
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("ThrottlingException"));
        assert_eq!(resp.query.as_deref(), Some("solar"));
        assert!(resp.results.is_empty());
    }

    #[tokio::test]
    async fn test_empty_query_rejected_locally() {
        let client = Arc::new(RecordingClient::default());
        let search = adapter(Some("KB1"), client.clone());
        let err = search.try_search(&RetrievalQuery::new("   ", None)).await;
        assert_eq!(err, Err(RetrievalError::EmptyQuery));
        assert!(client.requests.lock().map(|r| r.is_empty()).unwrap_or(false));
    }

    #[tokio::test]
    async fn test_success_normalizes_items() {
        let client = Arc::new(RecordingClient::default());
        let resp = adapter(Some("KB1"), client)
            .search(&RetrievalQuery::new("solar", None))
            .await;
        assert!(resp.success);
        assert_eq!(resp.results_count, Some(1));
        assert_eq!(resp.results[0].uri.as_deref(), Some("s3://docs/solar.pdf"));
    }
}
