//! Amazon Bedrock Knowledge Bases retrieval client.
//!
//! Translates [`RetrieveRequest`] into a `Retrieve` call on the Bedrock
//! Agent Runtime API (semantic search only) and flattens the response into
//! [`RawRetrievalResult`] items.

use std::sync::Arc;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_bedrockagentruntime::Client;
use aws_sdk_bedrockagentruntime::error::DisplayErrorContext;
use aws_sdk_bedrockagentruntime::types::{
    KnowledgeBaseQuery, KnowledgeBaseRetrievalConfiguration, KnowledgeBaseRetrievalResult,
    KnowledgeBaseVectorSearchConfiguration, SearchType,
};
use tracing::debug;

use super::client::{ClientFactory, RetrievalClient, RetrieveRequest};
use super::types::RawRetrievalResult;
use crate::document::metadata_to_json;
use crate::error::RetrievalError;

/// Retrieval client backed by the Bedrock Agent Runtime SDK.
pub struct BedrockRetrievalClient {
    client: Client,
}

impl BedrockRetrievalClient {
    /// Wraps an SDK client.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    /// Loads AWS configuration from the environment for `region`.
    pub async fn from_region(region: &str) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        Self::new(Client::new(&sdk_config))
    }

    fn convert_result(result: &KnowledgeBaseRetrievalResult) -> RawRetrievalResult {
        let content = result.content();
        RawRetrievalResult {
            text: content.map(|c| c.text()).map(str::to_string),
            content_type: content
                .and_then(|c| c.r#type())
                .map(|t| t.as_str().to_string()),
            score: result.score(),
            s3_uri: result
                .location()
                .and_then(|l| l.s3_location())
                .and_then(|s3| s3.uri())
                .map(str::to_string),
            metadata: result.metadata().map(metadata_to_json).unwrap_or_default(),
        }
    }
}

impl std::fmt::Debug for BedrockRetrievalClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BedrockRetrievalClient")
            .field("client", &"<aws-sdk-bedrockagentruntime::Client>")
            .finish()
    }
}

#[async_trait]
impl RetrievalClient for BedrockRetrievalClient {
    async fn retrieve(
        &self,
        request: &RetrieveRequest,
    ) -> Result<Vec<RawRetrievalResult>, RetrievalError> {
        let query = KnowledgeBaseQuery::builder()
            .text(&request.text)
            .build();

        let vector_search = KnowledgeBaseVectorSearchConfiguration::builder()
            .number_of_results(request.number_of_results)
            .override_search_type(SearchType::Semantic)
            .build();

        let retrieval_config = KnowledgeBaseRetrievalConfiguration::builder()
            .vector_search_configuration(vector_search)
            .build();

        let output = self
            .client
            .retrieve()
            .knowledge_base_id(&request.knowledge_base_id)
            .retrieval_query(query)
            .retrieval_configuration(retrieval_config)
            .send()
            .await
            .map_err(|e| RetrievalError::Service(DisplayErrorContext(&e).to_string()))?;

        let results: Vec<_> = output
            .retrieval_results()
            .iter()
            .map(Self::convert_result)
            .collect();

        debug!(
            knowledge_base_id = %request.knowledge_base_id,
            count = results.len(),
            "retrieve completed"
        );

        Ok(results)
    }
}

/// Builds [`BedrockRetrievalClient`]s from the ambient AWS configuration.
#[derive(Debug, Default, Clone, Copy)]
pub struct BedrockClientFactory;

#[async_trait]
impl ClientFactory for BedrockClientFactory {
    async fn create(&self, region: &str) -> Result<Arc<dyn RetrievalClient>, RetrievalError> {
        Ok(Arc::new(BedrockRetrievalClient::from_region(region).await))
    }
}
