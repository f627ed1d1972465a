//! Core types and shared functionality for favicache.
//!
//! This crate provides:
//! - Versioned response cache with SQLite backend
//! - Cache query protocol wire types
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod protocol;

pub use cache::{CacheDb, CacheVersion, CapturedResponse, RequestKey, Store};
pub use config::AppConfig;
pub use error::Error;
