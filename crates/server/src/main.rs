//! favicache server entry point.
//!
//! Boots one agent (install, activate, mailbox) and exposes it as an MCP
//! server on stdio transport. Logging goes to stderr to avoid interfering
//! with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

use favicache_client::agent::mailbox;
use favicache_client::{
    Agent, AgentConfig, CacheQueryClient, FaviconLoader, FetchClient, FetchConfig, LoaderConfig, LocalHost,
};
use favicache_core::{AppConfig, CacheDb};

mod error;
mod handler;
mod tools;

/// Envelopes the agent may have queued before callers block.
const MAILBOX_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(db = %config.db_path.display(), origin = %config.page_origin, "Starting favicache on stdio transport");

    let db = CacheDb::open(&config.db_path).await?;
    let network = Arc::new(FetchClient::new(FetchConfig::from(&config))?);

    let (handle, mailbox) = mailbox::channel(MAILBOX_CAPACITY);
    let host = Arc::new(LocalHost::new(handle));
    let controller = host.controller();

    let agent = Arc::new(Agent::new(db, network, host, AgentConfig::from_app(&config)?));
    let _seed_task = agent.clone().install_in_background().await;
    let activation = agent.activate().await;
    if let Some(e) = &activation.purge_error {
        tracing::warn!(error = %e, "stale stores could not all be purged");
    }
    let _mailbox_task = agent.clone().serve(mailbox);

    let loader = FaviconLoader::new(CacheQueryClient::new(controller.clone()), LoaderConfig::from_app(&config)?);
    let handler = handler::FavicacheServer::new(agent, CacheQueryClient::new(controller), loader);

    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
