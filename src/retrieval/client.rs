//! Retrieval client abstraction and its lazily-created process-wide handle.
//!
//! The adapter never owns a global. Instead a [`LazyRetrievalClient`] wraps a
//! [`ClientFactory`] and constructs the client on first use, exactly once,
//! even under concurrent first calls.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::info;

use super::types::RawRetrievalResult;
use crate::error::RetrievalError;

/// Parameters of a single retrieve call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrieveRequest {
    /// Knowledge base to query.
    pub knowledge_base_id: String,
    /// Query text.
    pub text: String,
    /// Number of results to request.
    pub number_of_results: i32,
}

/// A backend that can run semantic retrieval against a knowledge base.
#[async_trait]
pub trait RetrievalClient: Send + Sync {
    /// Runs one semantic search and returns the raw items in service order.
    async fn retrieve(
        &self,
        request: &RetrieveRequest,
    ) -> Result<Vec<RawRetrievalResult>, RetrievalError>;
}

/// Creates retrieval clients for a region.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    /// Builds a client scoped to `region`.
    async fn create(&self, region: &str) -> Result<Arc<dyn RetrievalClient>, RetrievalError>;
}

/// Construct-once, reuse-forever handle to a retrieval client.
pub struct LazyRetrievalClient {
    factory: Arc<dyn ClientFactory>,
    region: String,
    cell: OnceCell<Arc<dyn RetrievalClient>>,
}

impl LazyRetrievalClient {
    /// Creates a handle that will build its client through `factory`.
    #[must_use]
    pub fn new(factory: Arc<dyn ClientFactory>, region: impl Into<String>) -> Self {
        Self {
            factory,
            region: region.into(),
            cell: OnceCell::new(),
        }
    }

    /// Wraps an already constructed client.
    #[must_use]
    pub fn ready(client: Arc<dyn RetrievalClient>, region: impl Into<String>) -> Self {
        Self {
            factory: Arc::new(NoFactory),
            region: region.into(),
            cell: OnceCell::new_with(Some(client)),
        }
    }

    /// Region the client is scoped to.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Whether the client has been constructed yet.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    /// Returns the client, constructing it on first call.
    ///
    /// A failed construction is not cached; the next call tries again.
    pub async fn get(&self) -> Result<Arc<dyn RetrievalClient>, RetrievalError> {
        let client = self
            .cell
            .get_or_try_init(|| async {
                info!(region = %self.region, "creating knowledge-base client");
                self.factory.create(&self.region).await
            })
            .await?;
        Ok(Arc::clone(client))
    }
}

impl std::fmt::Debug for LazyRetrievalClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyRetrievalClient")
            .field("region", &self.region)
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

/// Factory for handles created with [`LazyRetrievalClient::ready`].
struct NoFactory;

#[async_trait]
impl ClientFactory for NoFactory {
    async fn create(&self, _region: &str) -> Result<Arc<dyn RetrievalClient>, RetrievalError> {
        Err(RetrievalError::Client("no client factory configured".to_string()))
    }
}
