//! Retrieval request/response types and result normalization.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RetrievalError;

/// Metadata key holding the source document URI.
pub const META_SOURCE_URI: &str = "x-amz-bedrock-kb-source-uri";
/// Metadata key holding the page number within the source document.
pub const META_PAGE_NUMBER: &str = "x-amz-bedrock-kb-document-page-number";
/// Metadata key holding the chunk identifier.
pub const META_CHUNK_ID: &str = "x-amz-bedrock-kb-chunk-id";
/// Metadata key holding the data source identifier.
pub const META_DATA_SOURCE_ID: &str = "x-amz-bedrock-kb-data-source-id";

/// Upper bound the retrieval service accepts for `numberOfResults`.
pub const MAX_RESULTS_LIMIT: i32 = 100;

/// A search request against the knowledge base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalQuery {
    /// Natural-language query text.
    pub text: String,
    /// Requested result count; non-positive or absent means "use the default".
    pub max_results: Option<i64>,
}

impl RetrievalQuery {
    /// Creates a query.
    #[must_use]
    pub fn new(text: impl Into<String>, max_results: Option<i64>) -> Self {
        Self {
            text: text.into(),
            max_results,
        }
    }

    /// Resolves the effective result count.
    ///
    /// Absent or non-positive values use `default`; values above
    /// [`MAX_RESULTS_LIMIT`] are clamped.
    #[must_use]
    pub fn resolve_max_results(&self, default: i32) -> i32 {
        let default = default.clamp(1, MAX_RESULTS_LIMIT);
        match self.max_results {
            Some(n) if n > 0 => {
                i32::try_from(n.min(i64::from(MAX_RESULTS_LIMIT))).unwrap_or(MAX_RESULTS_LIMIT)
            }
            _ => default,
        }
    }
}

/// One item as returned by the retrieval service, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRetrievalResult {
    /// Chunk text.
    pub text: Option<String>,
    /// Content type reported by the service (e.g. `TEXT`).
    pub content_type: Option<String>,
    /// Relevance score.
    pub score: Option<f64>,
    /// Structured S3 location URI.
    pub s3_uri: Option<String>,
    /// Metadata attributes attached to the chunk.
    pub metadata: Map<String, Value>,
}

/// Page number of a retrieved chunk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Page {
    /// Whole page number.
    Number(i64),
    /// Fractional value reported by the service, kept as-is.
    Fractional(f64),
}

impl Page {
    /// Normalizes a raw metadata value into a page number.
    ///
    /// Integers and whole-number floats become [`Page::Number`]; finite
    /// fractional floats become [`Page::Fractional`]. Anything else is `None`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
    pub fn from_value(value: &Value) -> Option<Self> {
        let number = value.as_number()?;
        if let Some(i) = number.as_i64() {
            return Some(Self::Number(i));
        }
        let f = number.as_f64()?;
        if !f.is_finite() {
            return None;
        }
        if f.fract() == 0.0 && f.abs() < 9.0e15 {
            Some(Self::Number(f as i64))
        } else {
            Some(Self::Fractional(f))
        }
    }

    /// Returns the whole page number, if this is one.
    #[must_use]
    pub const fn as_whole(self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(n),
            Self::Fractional(_) => None,
        }
    }
}

/// A normalized, citation-ready retrieval result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalResultItem {
    /// Chunk text.
    pub content: String,
    /// Content type reported by the service.
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    /// Relevance score.
    pub score: f64,
    /// Resolved source URI.
    pub uri: Option<String>,
    /// Normalized page number.
    pub page: Option<Page>,
    /// Chunk identifier.
    pub chunk_id: Option<String>,
    /// Data source identifier.
    pub data_source_id: Option<String>,
}

impl RetrievalResultItem {
    /// Normalizes a raw service item.
    #[must_use]
    pub fn from_raw(raw: RawRetrievalResult) -> Self {
        let meta_str = |key: &str| {
            raw.metadata
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        let uri = raw
            .s3_uri
            .clone()
            .filter(|u| !u.is_empty())
            .or_else(|| meta_str(META_SOURCE_URI).filter(|u| !u.is_empty()));

        Self {
            content: raw.text.clone().unwrap_or_default(),
            content_type: raw.content_type.clone(),
            score: raw.score.unwrap_or(0.0),
            uri,
            page: raw.metadata.get(META_PAGE_NUMBER).and_then(Page::from_value),
            chunk_id: meta_str(META_CHUNK_ID),
            data_source_id: meta_str(META_DATA_SOURCE_ID),
        }
    }

    /// File name of the source document (last path segment of the URI).
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.uri.as_deref().map(crate::agent::citation::file_name_from_uri)
    }
}

/// Outcome of a knowledge-base search, shaped for the model.
///
/// Serializes to the tool wire contract:
/// `{ success, query?, results_count?, results, error? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResponse {
    /// Whether the search ran and returned results.
    pub success: bool,
    /// Query that was searched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Number of results (present on success).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_count: Option<usize>,
    /// Ordered results; empty on failure.
    #[serde(default)]
    pub results: Vec<RetrievalResultItem>,
    /// Failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RetrievalResponse {
    /// Builds a successful response.
    #[must_use]
    pub fn found(query: &str, results: Vec<RetrievalResultItem>) -> Self {
        Self {
            success: true,
            query: Some(query.to_string()),
            results_count: Some(results.len()),
            results,
            error: None,
        }
    }

    /// Builds a failure response from a typed error.
    ///
    /// The query is omitted for configuration failures, which happen before
    /// the query is considered.
    #[must_use]
    pub fn failed(query: &str, error: &RetrievalError) -> Self {
        let query = match error {
            RetrievalError::NotConfigured => None,
            _ => Some(query.to_string()),
        };
        Self {
            success: false,
            query,
            results_count: None,
            results: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    /// Folds a search outcome into a response.
    #[must_use]
    pub fn from_outcome(query: &str, outcome: Result<Vec<RetrievalResultItem>, RetrievalError>) -> Self {
        match outcome {
            Ok(items) => Self::found(query, items),
            Err(e) => Self::failed(query, &e),
        }
    }

    /// Serializes to the JSON string handed to the model.
    #[must_use]
    pub fn to_tool_content(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"success":false,"results":[],"error":"serialization error: {e}"}}"#)
        })
    }
}
