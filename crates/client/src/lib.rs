//! Client code for favicache.
//!
//! This crate provides the background agent (seeding, fetch interception,
//! cache queries), the HTTP fetch client it uses for live requests, and the
//! page side that queries the agent and crossfades favicons in.

pub mod agent;
pub mod fetch;
pub mod page;

pub use agent::{
    ActivationReport, Agent, AgentConfig, AgentEvent, AgentHandle, AgentPhase, AgentReply, FetchEvent, HostRuntime,
    LocalHost, Mailbox, MessageOutcome, Resolved, SeedReport, Tier,
};
pub use fetch::{FetchClient, FetchConfig, Network};
pub use page::{
    Bang, BangRow, CacheAnswer, CacheQueryClient, ControllerSlot, FaviconLoader, FetchSurface, LoadOutcome,
    LoaderConfig,
};
