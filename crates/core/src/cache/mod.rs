//! SQLite-backed, versioned response cache.
//!
//! This module provides named persistent stores mapping a request identity
//! (method + URL) to a captured response, with async access via
//! tokio-rusqlite. It supports:
//!
//! - Lazily created named stores, deleted only as a whole
//! - Versioned store names for stale-deployment cleanup
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod hash;
pub mod key;
pub mod migrations;
pub mod response;
pub mod store;
pub mod version;

pub use crate::Error;

pub use connection::CacheDb;
pub use key::RequestKey;
pub use response::CapturedResponse;
pub use store::Store;
pub use version::{CURRENT_CACHE_VERSION, CacheVersion};
