//! favicon_cached tool implementation.
//!
//! Asks the controlling agent over the cache query protocol, the same way a
//! page would.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use favicache_client::{CacheAnswer, CacheQueryClient};

use super::json_result;

/// Parameters for the favicon_cached tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FaviconCachedParams {
    /// URL to look up. Compared exactly against the current store's keys.
    pub url: String,
}

/// Output from the favicon_cached tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FaviconCachedOutput {
    pub url: String,
    pub is_cached: bool,
    /// cached, not_cached, no_controller, unanswered or malformed.
    pub answer: String,
    pub reason: Option<String>,
}

/// Implementation of the favicon_cached tool.
pub async fn cached_impl(query: &CacheQueryClient, params: FaviconCachedParams) -> Result<CallToolResult, McpError> {
    let answer = query.is_favicon_cached(&params.url).await;
    let is_cached = answer.is_cached();

    let (label, reason) = match answer {
        CacheAnswer::Cached => ("cached", None),
        CacheAnswer::NotCached => ("not_cached", None),
        CacheAnswer::NoController => ("no_controller", None),
        CacheAnswer::Unanswered { reason } => ("unanswered", Some(reason)),
        CacheAnswer::Malformed { reason } => ("malformed", Some(reason)),
    };

    json_result(&FaviconCachedOutput { url: params.url, is_cached, answer: label.into(), reason })
}
