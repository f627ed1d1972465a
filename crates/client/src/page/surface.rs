//! An [`IconSurface`] that loads images through the agent's fetch interceptor.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use favicache_core::RequestKey;

use super::loader::IconSurface;
use crate::agent::{Agent, FetchEvent, Tier};

/// Headless surface: an image "loads" when the interceptor returns a 2xx live
/// or cached response with a body. Fades are timed waits.
pub struct FetchSurface {
    agent: Arc<Agent>,
    loads: AtomicUsize,
}

impl FetchSurface {
    pub fn new(agent: Arc<Agent>) -> Self {
        Self { agent, loads: AtomicUsize::new(0) }
    }

    /// Number of image loads issued so far.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IconSurface for FetchSurface {
    async fn load(&self, src: &Url) -> Result<(), String> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let key = RequestKey::from_url("GET", src).map_err(|e| e.to_string())?;
        let resolved = self.agent.handle_fetch(FetchEvent::new(key)).await;

        match resolved.tier {
            Tier::Fallback | Tier::Synthesized => {
                Err(resolved.degraded.unwrap_or_else(|| format!("{} response", resolved.tier.as_str())))
            }
            _ if !resolved.response.is_success() => Err(format!("status {}", resolved.response.status)),
            _ if resolved.response.body.is_empty() => Err("empty image".into()),
            _ => Ok(()),
        }
    }

    async fn fade(&self, _src: &Url, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }

    async fn remove_placeholder(&self) {}
}

#[cfg(test)]
mod tests {
    use favicache_core::CapturedResponse;

    use super::*;
    use crate::agent::testing::{FakeNetwork, agent_with, config, ok};

    const ICON: &str = "https://example.com/favicon.ico";

    #[tokio::test]
    async fn test_live_icon_loads() {
        let (agent, _host, _mailbox) = agent_with(Arc::new(FakeNetwork::new().serve(ICON, ok("ico"))), config()).await;
        let surface = FetchSurface::new(agent);

        assert!(surface.load(&Url::parse(ICON).unwrap()).await.is_ok());
        assert_eq!(surface.loads(), 1);
    }

    #[tokio::test]
    async fn test_error_status_fails_load() {
        let network = FakeNetwork::new().serve(ICON, CapturedResponse::text(404, "nope"));
        let (agent, _host, _mailbox) = agent_with(Arc::new(network), config()).await;
        let surface = FetchSurface::new(agent);

        assert_eq!(surface.load(&Url::parse(ICON).unwrap()).await, Err("status 404".to_string()));
    }

    #[tokio::test]
    async fn test_empty_body_fails_load() {
        let network = FakeNetwork::new().serve(ICON, CapturedResponse::new(200, Vec::new(), Vec::new()));
        let (agent, _host, _mailbox) = agent_with(Arc::new(network), config()).await;
        let surface = FetchSurface::new(agent);

        assert!(surface.load(&Url::parse(ICON).unwrap()).await.is_err());
    }

    #[tokio::test]
    async fn test_fallback_response_counts_as_failure() {
        let (agent, _host, _mailbox) = agent_with(Arc::new(FakeNetwork::new()), config()).await;
        let fallback = RequestKey::get("http://localhost:3000/assets/bangs/fallback-icon.svg").unwrap();
        agent.current_store().await.unwrap().put(&fallback, &ok("<svg/>")).await.unwrap();
        let surface = FetchSurface::new(agent);

        assert!(surface.load(&Url::parse(ICON).unwrap()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fade_waits_for_duration() {
        let (agent, _host, _mailbox) = agent_with(Arc::new(FakeNetwork::new()), config()).await;
        let surface = FetchSurface::new(agent);
        let start = tokio::time::Instant::now();

        surface.fade(&Url::parse(ICON).unwrap(), Duration::from_millis(350)).await;

        assert!(start.elapsed() >= Duration::from_millis(350));
    }
}
