//! favicon_resolve tool implementation.
//!
//! Builds a row from a bang and runs its favicon through the loader, with
//! image loads served by the agent's fetch interceptor.

use std::sync::Arc;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use favicache_client::page::RowLink;
use favicache_client::{Agent, Bang, BangRow, FaviconLoader, FetchSurface, LoadOutcome};

use super::json_result;
use crate::error::ToolError;

/// Parameters for the favicon_resolve tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FaviconResolveParams {
    /// The bang's URL template, e.g. `https://www.google.com/search?q={{{s}}}`.
    pub template: String,

    /// Short name shown next to the icon.
    #[serde(default)]
    pub short: String,

    /// Trigger text.
    #[serde(default)]
    pub trigger: String,
}

/// Output from the favicon_resolve tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct FaviconResolveOutput {
    pub short: String,
    pub trigger: String,
    pub template: String,
    /// True when the template did not resolve and no icon was attempted.
    pub label_only: bool,
    /// Link target, absent for label-only rows.
    pub link: Option<String>,
    pub favicon: Option<String>,
    /// loaded or degraded. Absent for label-only rows.
    pub outcome: Option<String>,
    pub cached: bool,
    pub attempts: u8,
    pub displayed: Option<String>,
    pub confirmed_non_fallback: bool,
    pub reason: Option<String>,
}

/// Implementation of the favicon_resolve tool.
pub async fn resolve_impl(
    agent: &Arc<Agent>, loader: &FaviconLoader, params: FaviconResolveParams,
) -> Result<CallToolResult, McpError> {
    let row = BangRow::build(&Bang::new(params.short, params.trigger, params.template));

    let mut output = FaviconResolveOutput {
        short: row.short.clone(),
        trigger: row.trigger.clone(),
        template: row.template.clone(),
        label_only: !row.is_live(),
        link: match &row.link {
            RowLink::Navigate(url) => Some(url.to_string()),
            RowLink::Inert => None,
        },
        favicon: row.favicon().map(|u| u.to_string()),
        ..Default::default()
    };

    let Some(favicon) = row.favicon() else {
        return json_result(&output);
    };

    let surface = FetchSurface::new(agent.clone());
    let outcome = loader.load(&surface, favicon.clone()).await.map_err(ToolError::from)?;

    output.attempts = outcome.attempts();
    output.displayed = Some(outcome.state().displayed.to_string());
    output.confirmed_non_fallback = outcome.state().confirmed_non_fallback;
    match outcome {
        LoadOutcome::Loaded { cached, .. } => {
            output.outcome = Some("loaded".into());
            output.cached = cached;
        }
        LoadOutcome::Degraded { reason, .. } => {
            output.outcome = Some("degraded".into());
            output.reason = Some(reason.to_string());
        }
    }

    json_result(&output)
}
