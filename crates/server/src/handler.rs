//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::{
    AgentFetchParams, CacheStoresParams, FaviconCachedParams, FaviconResolveParams, cached_impl, fetch_impl,
    resolve_impl, stores_impl,
};

use favicache_client::{Agent, CacheQueryClient, FaviconLoader};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for favicache.
#[derive(Clone)]
pub struct FavicacheServer {
    tool_router: ToolRouter<Self>,
    agent: Arc<Agent>,
    query: CacheQueryClient,
    loader: Arc<FaviconLoader>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl FavicacheServer {
    /// Create a new server handler around a running agent.
    pub fn new(agent: Arc<Agent>, query: CacheQueryClient, loader: FaviconLoader) -> Self {
        Self { tool_router: Self::tool_router(), agent, query, loader: Arc::new(loader) }
    }

    #[tool(
        description = "Resolve a request through the agent's fetch interceptor (cache, preload, network, fallback, synthesized error). Reports which tier answered."
    )]
    async fn agent_fetch(&self, params: Parameters<AgentFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.agent, params.0).await
    }

    #[tool(description = "Ask the agent whether a favicon URL is in the current cache store (IS_FAVICON_CACHED).")]
    async fn favicon_cached(&self, params: Parameters<FaviconCachedParams>) -> Result<CallToolResult, McpError> {
        cached_impl(&self.query, params.0).await
    }

    #[tool(
        description = "Build a row from a bang URL template and load its favicon with crossfade and secondary-provider retry."
    )]
    async fn favicon_resolve(&self, params: Parameters<FaviconResolveParams>) -> Result<CallToolResult, McpError> {
        resolve_impl(&self.agent, &self.loader, params.0).await
    }

    #[tool(description = "List cache stores with entry counts and which one the current version owns.")]
    async fn cache_stores(&self, params: Parameters<CacheStoresParams>) -> Result<CallToolResult, McpError> {
        stores_impl(&self.agent, params.0).await
    }
}

impl ServerHandler for FavicacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "favicache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
