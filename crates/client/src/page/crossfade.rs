//! Crossfade state machine for one row's favicon.
//!
//! ```text
//! Placeholder --Start--> Loading --Answered--> Transitioning --ImageLoaded--> (loaded)
//!                                                  |                              |
//!                                            ImageFailed                   TransitionEnded
//!                                                  v                              v
//!                                 RetryWithSecondaryProvider --Retry-->      Settled
//! ```
//!
//! The secondary provider is tried once. A failure there settles degraded with
//! the placeholder still showing.

use std::time::Duration;

use thiserror::Error;
use url::Url;

use super::origin::secondary_provider_url;

/// Which source the current transition is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Primary,
    Secondary,
}

/// Why a row ended up on its placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradeReason {
    /// Both the origin favicon and the secondary provider failed.
    BothFailed { primary: String, secondary: String },
    /// The origin favicon failed and no secondary URL could be derived from it.
    NoSecondary { primary: String },
}

impl std::fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DegradeReason::BothFailed { primary, secondary } => {
                write!(f, "primary failed ({primary}), secondary failed ({secondary})")
            }
            DegradeReason::NoSecondary { primary } => write!(f, "primary failed ({primary}), no secondary provider"),
        }
    }
}

/// How a row settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Loaded { src: Url, attempt: Attempt },
    Degraded(DegradeReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrossfadeState {
    Placeholder,
    Loading { favicon: Url },
    Transitioning { src: Url, duration: Duration, attempt: Attempt, loaded: bool },
    RetryWithSecondaryProvider { src: Url, duration: Duration },
    Settled(Settlement),
}

impl CrossfadeState {
    pub fn name(&self) -> &'static str {
        match self {
            CrossfadeState::Placeholder => "Placeholder",
            CrossfadeState::Loading { .. } => "Loading",
            CrossfadeState::Transitioning { .. } => "Transitioning",
            CrossfadeState::RetryWithSecondaryProvider { .. } => "RetryWithSecondaryProvider",
            CrossfadeState::Settled(_) => "Settled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrossfadeEvent {
    Start { favicon: Url },
    Answered { cached: bool },
    ImageLoaded,
    ImageFailed { reason: String },
    Retry,
    TransitionEnded,
}

impl CrossfadeEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CrossfadeEvent::Start { .. } => "Start",
            CrossfadeEvent::Answered { .. } => "Answered",
            CrossfadeEvent::ImageLoaded => "ImageLoaded",
            CrossfadeEvent::ImageFailed { .. } => "ImageFailed",
            CrossfadeEvent::Retry => "Retry",
            CrossfadeEvent::TransitionEnded => "TransitionEnded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid crossfade transition: {event} in {state}")]
pub struct TransitionError {
    pub state: &'static str,
    pub event: &'static str,
}

/// The machine for a single row.
#[derive(Debug, Clone)]
pub struct Crossfade {
    state: CrossfadeState,
    fade: Duration,
    secondary_provider: String,
    primary_error: Option<String>,
}

impl Crossfade {
    /// `fade` is used for uncached icons; cached icons swap in with a zero duration.
    pub fn new(fade: Duration, secondary_provider: impl Into<String>) -> Self {
        Self {
            state: CrossfadeState::Placeholder,
            fade,
            secondary_provider: secondary_provider.into(),
            primary_error: None,
        }
    }

    pub fn state(&self) -> &CrossfadeState {
        &self.state
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.state, CrossfadeState::Settled(_))
    }

    /// Apply one event. On error the state is left unchanged.
    pub fn apply(&mut self, event: CrossfadeEvent) -> Result<&CrossfadeState, TransitionError> {
        let invalid = TransitionError { state: self.state.name(), event: event.name() };

        let next = match (&self.state, event) {
            (CrossfadeState::Placeholder, CrossfadeEvent::Start { favicon }) => CrossfadeState::Loading { favicon },
            (CrossfadeState::Loading { favicon }, CrossfadeEvent::Answered { cached }) => {
                let duration = if cached { Duration::ZERO } else { self.fade };
                CrossfadeState::Transitioning { src: favicon.clone(), duration, attempt: Attempt::Primary, loaded: false }
            }
            (CrossfadeState::Transitioning { src, duration, attempt, loaded: false }, CrossfadeEvent::ImageLoaded) => {
                CrossfadeState::Transitioning { src: src.clone(), duration: *duration, attempt: *attempt, loaded: true }
            }
            (CrossfadeState::Transitioning { src, attempt, loaded: true, .. }, CrossfadeEvent::TransitionEnded) => {
                CrossfadeState::Settled(Settlement::Loaded { src: src.clone(), attempt: *attempt })
            }
            (
                CrossfadeState::Transitioning { src, duration, attempt: Attempt::Primary, loaded: false },
                CrossfadeEvent::ImageFailed { reason },
            ) => match secondary_provider_url(&self.secondary_provider, src) {
                Some(secondary) => {
                    self.primary_error = Some(reason);
                    CrossfadeState::RetryWithSecondaryProvider { src: secondary, duration: *duration }
                }
                None => CrossfadeState::Settled(Settlement::Degraded(DegradeReason::NoSecondary { primary: reason })),
            },
            (CrossfadeState::RetryWithSecondaryProvider { src, duration }, CrossfadeEvent::Retry) => {
                CrossfadeState::Transitioning {
                    src: src.clone(),
                    duration: *duration,
                    attempt: Attempt::Secondary,
                    loaded: false,
                }
            }
            (
                CrossfadeState::Transitioning { attempt: Attempt::Secondary, loaded: false, .. },
                CrossfadeEvent::ImageFailed { reason },
            ) => {
                let primary = self.primary_error.take().unwrap_or_default();
                CrossfadeState::Settled(Settlement::Degraded(DegradeReason::BothFailed { primary, secondary: reason }))
            }
            _ => return Err(invalid),
        };

        self.state = next;
        Ok(&self.state)
    }
}
