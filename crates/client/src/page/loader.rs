//! Favicon loader: drives one row's crossfade against a rendering surface.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use url::Url;

use favicache_core::AppConfig;
use favicache_core::config::ConfigError;

use super::crossfade::{Crossfade, CrossfadeEvent, CrossfadeState, DegradeReason, Settlement, TransitionError};
use super::origin::is_foreign;
use super::query::{CacheAnswer, CacheQueryClient};
use super::row::BangRow;

/// What the loader needs from whatever renders the icon.
#[async_trait]
pub trait IconSurface: Send + Sync {
    /// Load `src` into a new, fully transparent image. `Err` carries the load error.
    async fn load(&self, src: &Url) -> Result<(), String>;

    /// Fade the new image in over the placeholder. Returns when the transition ends.
    async fn fade(&self, src: &Url, duration: Duration);

    /// Drop the placeholder once the new image is fully visible.
    async fn remove_placeholder(&self);
}

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub page_origin: Url,
    /// Bundled icon shown until a favicon has faded in.
    pub placeholder: Url,
    pub fade: Duration,
    pub secondary_provider: String,
}

impl LoaderConfig {
    pub fn from_app(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            page_origin: config.page_origin_url()?,
            placeholder: config.fallback_url()?,
            fade: config.fade(),
            secondary_provider: config.secondary_provider.clone(),
        })
    }
}

/// Per-row bookkeeping, kept only for the lifetime of the row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaviconRowState {
    pub placeholder: Url,
    pub favicon: Url,
    pub displayed: Url,
    /// Set when a crossfade completed onto an image from a foreign origin.
    pub confirmed_non_fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { src: Url, cached: bool, attempts: u8, state: FaviconRowState },
    Degraded { reason: DegradeReason, attempts: u8, state: FaviconRowState },
}

impl LoadOutcome {
    pub fn state(&self) -> &FaviconRowState {
        match self {
            LoadOutcome::Loaded { state, .. } | LoadOutcome::Degraded { state, .. } => state,
        }
    }

    pub fn attempts(&self) -> u8 {
        match self {
            LoadOutcome::Loaded { attempts, .. } | LoadOutcome::Degraded { attempts, .. } => *attempts,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded { .. })
    }
}

pub struct FaviconLoader {
    query: CacheQueryClient,
    config: LoaderConfig,
}

impl FaviconLoader {
    pub fn new(query: CacheQueryClient, config: LoaderConfig) -> Self {
        Self { query, config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Resolve one row's favicon. Query, pick a duration, then crossfade, in that order.
    pub async fn load<S: IconSurface + ?Sized>(&self, surface: &S, favicon: Url) -> Result<LoadOutcome, TransitionError> {
        let mut machine = Crossfade::new(self.config.fade, self.config.secondary_provider.clone());
        let mut state = FaviconRowState {
            placeholder: self.config.placeholder.clone(),
            favicon: favicon.clone(),
            displayed: self.config.placeholder.clone(),
            confirmed_non_fallback: false,
        };

        machine.apply(CrossfadeEvent::Start { favicon: favicon.clone() })?;
        let answer = self.query.is_favicon_cached(favicon.as_str()).await;
        if let CacheAnswer::Unanswered { reason } | CacheAnswer::Malformed { reason } = &answer {
            tracing::debug!(%favicon, %reason, "cache query degraded to not cached");
        }
        let cached = answer.is_cached();
        machine.apply(CrossfadeEvent::Answered { cached })?;

        let mut attempts = 0u8;
        loop {
            let (src, duration) = match machine.state().clone() {
                CrossfadeState::Transitioning { src, duration, .. } => (src, duration),
                CrossfadeState::RetryWithSecondaryProvider { src, .. } => {
                    tracing::debug!(%favicon, secondary = %src, "retrying with secondary provider");
                    machine.apply(CrossfadeEvent::Retry)?;
                    continue;
                }
                CrossfadeState::Settled(Settlement::Loaded { src, .. }) => {
                    state.displayed = src.clone();
                    state.confirmed_non_fallback = is_foreign(&src, &self.config.page_origin);
                    return Ok(LoadOutcome::Loaded { src, cached, attempts, state });
                }
                CrossfadeState::Settled(Settlement::Degraded(reason)) => {
                    tracing::debug!(%favicon, %reason, "favicon settled on placeholder");
                    return Ok(LoadOutcome::Degraded { reason, attempts, state });
                }
                other => return Err(TransitionError { state: other.name(), event: "Load" }),
            };

            attempts += 1;
            match surface.load(&src).await {
                Ok(()) => {
                    machine.apply(CrossfadeEvent::ImageLoaded)?;
                    surface.fade(&src, duration).await;
                    machine.apply(CrossfadeEvent::TransitionEnded)?;
                    surface.remove_placeholder().await;
                }
                Err(reason) => {
                    machine.apply(CrossfadeEvent::ImageFailed { reason })?;
                }
            }
        }
    }

    /// Resolve every live row concurrently. Label-only rows yield `None` and touch nothing.
    pub async fn load_rows<S: IconSurface + ?Sized>(
        &self, surface: &S, rows: &[BangRow],
    ) -> Vec<Option<Result<LoadOutcome, TransitionError>>> {
        join_all(rows.iter().map(|row| async move {
            let favicon = row.favicon()?;
            Some(self.load(surface, favicon.clone()).await)
        }))
        .await
    }
}
