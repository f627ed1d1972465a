//! MCP tool implementations.
//!
//! This module contains all tools exposed by the favicache server.

pub mod agent_fetch;
pub mod cache_stores;
pub mod favicon_cached;
pub mod favicon_resolve;

pub use agent_fetch::{AgentFetchParams, fetch_impl};
pub use cache_stores::{CacheStoresParams, stores_impl};
pub use favicon_cached::{FaviconCachedParams, cached_impl};
pub use favicon_resolve::{FaviconResolveParams, resolve_impl};

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use favicache_core::Error;

/// Serialize a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
