//! agent_fetch tool implementation.
//!
//! Sends a request through the agent's fetch interceptor, exactly as a page
//! request would be resolved.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use favicache_client::{Agent, FetchEvent};
use favicache_core::RequestKey;

use super::json_result;

/// Parameters for the agent_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AgentFetchParams {
    /// Absolute URL to request.
    pub url: String,

    /// HTTP method (default GET).
    #[serde(default = "default_method")]
    pub method: String,
}

fn default_method() -> String {
    "GET".into()
}

/// Output from the agent_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AgentFetchOutput {
    /// Normalized request URL.
    pub url: String,
    pub status: u16,
    /// Which tier answered: cache, preload, network, fallback or synthesized.
    pub tier: String,
    pub content_type: Option<String>,
    pub body_bytes: usize,
    /// Body as text, for text responses only.
    pub body_text: Option<String>,
    /// Why the live network did not answer, if it did not.
    pub degraded: Option<String>,
}

/// Implementation of the agent_fetch tool.
pub async fn fetch_impl(agent: &Agent, params: AgentFetchParams) -> Result<CallToolResult, McpError> {
    let key = RequestKey::new(&params.method, &params.url)?;
    let url = key.url().to_string();
    let resolved = agent.handle_fetch(FetchEvent::new(key)).await;

    let content_type = resolved.response.content_type().map(str::to_string);
    let body_text = content_type
        .as_deref()
        .filter(|ct| ct.starts_with("text/"))
        .and_then(|_| String::from_utf8(resolved.response.body.clone()).ok());

    let output = AgentFetchOutput {
        url,
        status: resolved.response.status,
        tier: resolved.tier.as_str().to_string(),
        content_type,
        body_bytes: resolved.response.body.len(),
        body_text,
        degraded: resolved.degraded,
    };

    json_result(&output)
}
