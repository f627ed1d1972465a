//! Ready signals the agent sends back to its hosting runtime.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use super::mailbox::AgentHandle;
use crate::page::ControllerSlot;

/// The hosting runtime as seen from the agent.
#[async_trait]
pub trait HostRuntime: Send + Sync {
    /// Take over immediately instead of waiting for the predecessor's pages to close.
    async fn skip_waiting(&self);

    /// Let the host start speculative navigation fetches and hand them to the agent.
    async fn enable_navigation_preload(&self);

    /// Become the controller of every already-open page.
    async fn claim_clients(&self);
}

/// In-process host: claiming publishes the agent's handle into a controller slot
/// that pages read before querying.
pub struct LocalHost {
    handle: AgentHandle,
    controller: ControllerSlot,
    waiting_skipped: AtomicBool,
    preload_enabled: AtomicBool,
    claimed: AtomicBool,
}

impl LocalHost {
    pub fn new(handle: AgentHandle) -> Self {
        Self {
            handle,
            controller: ControllerSlot::default(),
            waiting_skipped: AtomicBool::new(false),
            preload_enabled: AtomicBool::new(false),
            claimed: AtomicBool::new(false),
        }
    }

    /// The slot pages consult to find their controlling agent.
    pub fn controller(&self) -> ControllerSlot {
        self.controller.clone()
    }

    pub fn waiting_skipped(&self) -> bool {
        self.waiting_skipped.load(Ordering::SeqCst)
    }

    pub fn preload_enabled(&self) -> bool {
        self.preload_enabled.load(Ordering::SeqCst)
    }

    pub fn claimed(&self) -> bool {
        self.claimed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostRuntime for LocalHost {
    async fn skip_waiting(&self) {
        tracing::debug!("agent skipping wait for predecessor");
        self.waiting_skipped.store(true, Ordering::SeqCst);
    }

    async fn enable_navigation_preload(&self) {
        tracing::debug!("navigation preload enabled");
        self.preload_enabled.store(true, Ordering::SeqCst);
    }

    async fn claim_clients(&self) {
        self.controller.claim(self.handle.clone()).await;
        self.claimed.store(true, Ordering::SeqCst);
        tracing::info!("agent claimed open pages");
    }
}
