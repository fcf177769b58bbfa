//! Knowledge-base retrieval adapter.
//!
//! Wraps the managed semantic-retrieval service behind a small client trait
//! and normalizes its response into citation-ready items.
//!
//! # Architecture
//!
//! ```text
//! kb_search(query, max_results?)
//!   ↓
//! KnowledgeBaseSearch::search
//!   ├── knowledge base configured? (no → structured failure, no call)
//!   ├── LazyRetrievalClient::get (construct once per process)
//!   ├── RetrievalClient::retrieve (SEMANTIC, numberOfResults)
//!   └── RetrievalResultItem::from_raw (uri fallback, page normalization)
//!   ↓
//! RetrievalResponse { success, query, results_count, results, error }
//! ```

pub mod bedrock;
pub mod client;
pub mod search;
pub mod types;

pub use bedrock::{BedrockClientFactory, BedrockRetrievalClient};
pub use client::{ClientFactory, LazyRetrievalClient, RetrievalClient, RetrieveRequest};
pub use search::KnowledgeBaseSearch;
pub use types::{
    Page, RawRetrievalResult, RetrievalQuery, RetrievalResponse, RetrievalResultItem,
};
