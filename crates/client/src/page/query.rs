//! Page side of the cache query protocol.

use std::sync::Arc;

use tokio::sync::RwLock;

use favicache_core::protocol::{FaviconCachedRequest, FaviconCachedResponse};

use crate::agent::AgentHandle;

/// The agent currently controlling the page, if any.
///
/// Empty until an agent activates and claims open pages.
#[derive(Debug, Clone, Default)]
pub struct ControllerSlot(Arc<RwLock<Option<AgentHandle>>>);

impl ControllerSlot {
    pub async fn claim(&self, handle: AgentHandle) {
        *self.0.write().await = Some(handle);
    }

    pub async fn current(&self) -> Option<AgentHandle> {
        self.0.read().await.clone()
    }
}

/// Answer to "is this favicon cached?". Every variant except `Cached` means no.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheAnswer {
    Cached,
    NotCached,
    /// No agent controls the page yet.
    NoController,
    /// The agent dropped the query without answering.
    Unanswered { reason: String },
    /// A reply arrived but could not be trusted.
    Malformed { reason: String },
}

impl CacheAnswer {
    pub fn is_cached(&self) -> bool {
        matches!(self, CacheAnswer::Cached)
    }
}

/// Asks the controlling agent whether URLs are in its current store.
#[derive(Debug, Clone)]
pub struct CacheQueryClient {
    controller: ControllerSlot,
}

impl CacheQueryClient {
    pub fn new(controller: ControllerSlot) -> Self {
        Self { controller }
    }

    /// One query on a fresh channel. Never fails and never waits without a controller.
    pub async fn is_favicon_cached(&self, url: &str) -> CacheAnswer {
        let Some(handle) = self.controller.current().await else {
            tracing::debug!(%url, "no controlling agent, treating as not cached");
            return CacheAnswer::NoController;
        };

        let pending = match handle.post(FaviconCachedRequest::new(url).to_value()).await {
            Ok(pending) => pending,
            Err(e) => return CacheAnswer::Unanswered { reason: e.to_string() },
        };

        let reply = match pending.receiver.await {
            Ok(reply) => reply,
            Err(_) => {
                tracing::debug!(%url, "query channel closed without reply");
                return CacheAnswer::Unanswered { reason: "reply channel closed".into() };
            }
        };

        if reply.token != pending.token {
            return CacheAnswer::Malformed { reason: format!("token mismatch: {}", reply.token) };
        }

        match FaviconCachedResponse::from_value(reply.payload) {
            Ok(response) if response.response.is_cached => CacheAnswer::Cached,
            Ok(_) => CacheAnswer::NotCached,
            Err(e) => {
                tracing::warn!(%url, error = %e, "undecodable cache query reply");
                CacheAnswer::Malformed { reason: e.to_string() }
            }
        }
    }
}
