//! The background agent.
//!
//! One agent is shared by every page it controls and outlives any of them.
//! The host runtime drives it through exactly four lifecycle events:
//!
//! - `Install`: seed the current store, then skip waiting for the predecessor
//! - `Activate`: purge stale stores, enable navigation preload, claim pages
//! - `Fetch`: resolve an intercepted request (see [`intercept`])
//! - `Message`: answer a cache query (see [`mailbox`])

pub mod host;
pub mod intercept;
pub mod mailbox;
pub mod seed;

use std::sync::Arc;

use regex::Regex;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use url::Url;

use favicache_core::config::ConfigError;
use favicache_core::{AppConfig, CacheDb, CacheVersion, Error, RequestKey, Store};

use crate::fetch::Network;

pub use host::{HostRuntime, LocalHost};
pub use intercept::{FetchEvent, PreloadResponse, Resolved, Tier};
pub use mailbox::{AgentHandle, Envelope, Mailbox, MessageOutcome, PendingReply, ReplyPort};
pub use seed::{SeedFailure, SeedReport};

/// Everything the agent needs to know about the deployment.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub version: CacheVersion,
    pub seed_assets: Vec<Url>,
    pub fallback_asset: Url,
    pub fallback_pattern: Regex,
}

impl AgentConfig {
    pub fn from_app(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            version: CacheVersion::default(),
            seed_assets: config.seed_urls()?,
            fallback_asset: config.fallback_url()?,
            fallback_pattern: config.fallback_regex()?,
        })
    }

    pub fn store_name(&self) -> String {
        self.version.store_name()
    }
}

/// Where the agent is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentPhase {
    Parsed,
    Installed,
    Activated,
}

/// Outcome of the activate event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationReport {
    pub current: String,
    pub purged: Vec<String>,
    /// Set when stale stores could not be enumerated or deleted.
    pub purge_error: Option<String>,
}

/// Lifecycle events delivered by the host runtime.
pub enum AgentEvent {
    Install,
    Activate,
    Fetch(FetchEvent),
    Message(Envelope),
}

/// What handling an [`AgentEvent`] produced.
#[derive(Debug)]
pub enum AgentReply {
    Installed(SeedReport),
    Activated(ActivationReport),
    Fetched(Resolved),
    Message(MessageOutcome),
}

/// The agent itself. Holds the injected store handle, network and host.
pub struct Agent {
    db: CacheDb,
    network: Arc<dyn Network>,
    host: Arc<dyn HostRuntime>,
    config: AgentConfig,
    phase: RwLock<AgentPhase>,
}

impl Agent {
    pub fn new(db: CacheDb, network: Arc<dyn Network>, host: Arc<dyn HostRuntime>, config: AgentConfig) -> Self {
        Self { db, network, host, config, phase: RwLock::new(AgentPhase::Parsed) }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub async fn phase(&self) -> AgentPhase {
        *self.phase.read().await
    }

    /// Open the store owned by the current cache version.
    pub async fn current_store(&self) -> Result<Store, Error> {
        self.db.open_store(&self.config.store_name()).await
    }

    /// Route a lifecycle event to its handler.
    pub async fn dispatch(&self, event: AgentEvent) -> AgentReply {
        match event {
            AgentEvent::Install => AgentReply::Installed(self.install().await),
            AgentEvent::Activate => AgentReply::Activated(self.activate().await),
            AgentEvent::Fetch(fetch) => AgentReply::Fetched(self.handle_fetch(fetch).await),
            AgentEvent::Message(envelope) => AgentReply::Message(self.handle_message(envelope).await),
        }
    }

    /// Take over from any previous agent, then seed the current store.
    ///
    /// The ready signal goes out before any asset is fetched. Never fails: a
    /// partial or empty seed is reported, not raised.
    pub async fn install(&self) -> SeedReport {
        self.signal_ready().await;
        self.seed_current().await
    }

    /// Like [`install`](Self::install), but seeding runs on its own task so the
    /// caller can go on to activate while assets are still being fetched.
    pub async fn install_in_background(self: Arc<Self>) -> JoinHandle<SeedReport> {
        self.signal_ready().await;
        tokio::spawn(async move { self.seed_current().await })
    }

    async fn signal_ready(&self) {
        self.host.skip_waiting().await;
        let mut phase = self.phase.write().await;
        if *phase == AgentPhase::Parsed {
            *phase = AgentPhase::Installed;
        }
    }

    async fn seed_current(&self) -> SeedReport {
        let report = match self.current_store().await {
            Ok(store) => seed::seed(&store, self.network.as_ref(), &self.config.seed_assets).await,
            Err(e) => {
                tracing::error!(error = %e, "failed to open store for seeding");
                SeedReport::unopened(&self.config.store_name(), &self.config.seed_assets, &e)
            }
        };

        tracing::info!(
            store = %report.store,
            cached = report.cached.len(),
            failed = report.failed.len(),
            "install finished"
        );

        report
    }

    /// Delete every store not owned by the current version, then claim pages.
    pub async fn activate(&self) -> ActivationReport {
        if self.phase().await == AgentPhase::Parsed {
            tracing::warn!("activate received before install");
        }

        let mut report =
            ActivationReport { current: self.config.store_name(), purged: Vec::new(), purge_error: None };

        match self.db.store_names().await {
            Ok(names) => {
                for name in names.into_iter().filter(|name| !self.config.version.owns(name)) {
                    tracing::info!(
                        store = %name,
                        version = ?CacheVersion::from_store_name(&name),
                        "purging stale cache store"
                    );
                    match self.db.delete_store(&name).await {
                        Ok(_) => report.purged.push(name),
                        Err(e) => {
                            tracing::error!(store = %name, error = %e, "failed to purge stale store");
                            report.purge_error.get_or_insert_with(|| e.to_string());
                        }
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to enumerate cache stores");
                report.purge_error = Some(e.to_string());
            }
        }

        self.host.enable_navigation_preload().await;
        self.host.claim_clients().await;
        *self.phase.write().await = AgentPhase::Activated;

        report
    }

    /// Whether a URL is a key of the current store (exact, case-sensitive).
    pub async fn is_cached(&self, url: &str) -> Result<bool, Error> {
        let store = self.current_store().await?;
        Ok(store.keys().await?.iter().any(|key| key.url() == url))
    }

    pub(crate) fn fallback_key(&self) -> Result<RequestKey, Error> {
        RequestKey::from_url("GET", &self.config.fallback_asset)
    }

    pub(crate) fn network(&self) -> &dyn Network {
        self.network.as_ref()
    }
}
