//! Fetch interception.
//!
//! Every request the page issues resolves through a fixed ladder of tiers,
//! tried in order until one yields a response:
//!
//! 1. [`Tier::Cache`]: the current store already holds the request
//! 2. [`Tier::Preload`]: a speculative navigation fetch was handed over
//! 3. [`Tier::Network`]: live request, 2xx responses are stored
//! 4. [`Tier::Fallback`]: icon-shaped request, serve the bundled fallback
//! 5. [`Tier::Synthesized`]: plain-text 400
//!
//! Only GET requests touch the store. Other methods skip the cache tier and
//! are never written, whatever their status.
//!
//! The page always receives a response. Failures inside a tier are logged and
//! the ladder moves on.

use futures_util::future::BoxFuture;

use favicache_core::{CapturedResponse, RequestKey, Store};

use super::Agent;

/// A speculative fetch the host started before the agent saw the request.
pub type PreloadResponse = BoxFuture<'static, Option<CapturedResponse>>;

/// An intercepted request.
pub struct FetchEvent {
    pub request: RequestKey,
    pub preload: Option<PreloadResponse>,
}

impl FetchEvent {
    pub fn new(request: RequestKey) -> Self {
        Self { request, preload: None }
    }

    pub fn with_preload(request: RequestKey, preload: PreloadResponse) -> Self {
        Self { request, preload: Some(preload) }
    }
}

/// The tier that produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Cache,
    Preload,
    Network,
    Fallback,
    Synthesized,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Cache => "cache",
            Tier::Preload => "preload",
            Tier::Network => "network",
            Tier::Fallback => "fallback",
            Tier::Synthesized => "synthesized",
        }
    }
}

/// The response handed back to the page, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub response: CapturedResponse,
    pub tier: Tier,
    /// Why the live network did not answer, for the fallback and synthesized tiers.
    pub degraded: Option<String>,
}

impl Resolved {
    fn served(response: CapturedResponse, tier: Tier) -> Self {
        Self { response, tier, degraded: None }
    }
}

impl Agent {
    /// Resolve an intercepted request. Never fails.
    pub async fn handle_fetch(&self, event: FetchEvent) -> Resolved {
        let FetchEvent { request, preload } = event;

        let store = match self.current_store().await {
            Ok(store) => Some(store),
            Err(e) => {
                tracing::error!(error = %e, "current store unavailable, bypassing cache");
                None
            }
        };
        let cacheable = store.as_ref().filter(|_| request.is_get());

        if let Some(store) = cacheable {
            match store.match_request(&request).await {
                Ok(Some(response)) => {
                    tracing::debug!(url = %request.url(), "cache hit");
                    return Resolved::served(response, Tier::Cache);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(url = %request.url(), error = %e, "cache lookup failed"),
            }
        }

        if let Some(preload) = preload
            && let Some(response) = preload.await
        {
            tracing::debug!(url = %request.url(), status = response.status, "using preload response");
            if response.is_success()
                && let Some(store) = cacheable
            {
                write_copy(store, &request, &response).await;
            }
            return Resolved::served(response, Tier::Preload);
        }

        let failure = match self.network().fetch(&request).await {
            Ok(response) => {
                tracing::debug!(url = %request.url(), status = response.status, "network response");
                if response.is_success()
                    && let Some(store) = cacheable
                {
                    write_copy(store, &request, &response).await;
                }
                return Resolved::served(response, Tier::Network);
            }
            Err(e) => e.to_string(),
        };

        tracing::debug!(url = %request.url(), error = %failure, "network failed");

        if self.config().fallback_pattern.is_match(request.url()) {
            if let Some(response) = self.cached_fallback(store.as_ref()).await {
                return Resolved { response, tier: Tier::Fallback, degraded: Some(failure) };
            }
            tracing::warn!(url = %request.url(), "fallback asset not cached");
        }

        Resolved { response: CapturedResponse::network_error(), tier: Tier::Synthesized, degraded: Some(failure) }
    }

    async fn cached_fallback(&self, store: Option<&Store>) -> Option<CapturedResponse> {
        let store = store?;
        let key = match self.fallback_key() {
            Ok(key) => key,
            Err(e) => {
                tracing::error!(error = %e, "invalid fallback asset");
                return None;
            }
        };
        match store.match_request(&key).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(error = %e, "fallback lookup failed");
                None
            }
        }
    }
}

/// Store a copy of `response`.
///
/// The write is awaited, so the page's response waits for it and a request
/// that follows is already served from the cache. Failures are logged, never
/// raised.
async fn write_copy(store: &Store, request: &RequestKey, response: &CapturedResponse) {
    if let Err(e) = store.put(request, response).await {
        tracing::error!(url = %request.url(), error = %e, "failed to cache response");
    }
}
