//! Cache versioning.
//!
//! The version is baked into the store name. Bumping it makes every store
//! left by an older deployment stale; activation deletes them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix shared by every versioned store name.
pub const STORE_PREFIX: &str = "favicons-v";

/// Version of the deployed cache contents and semantics.
pub const CURRENT_CACHE_VERSION: CacheVersion = CacheVersion(2);

/// Monotonic cache version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheVersion(pub u32);

impl CacheVersion {
    /// Name of the store owned by this version, e.g. `favicons-v2`.
    pub fn store_name(self) -> String {
        format!("{STORE_PREFIX}{}", self.0)
    }

    /// Parse a store name back into its version.
    ///
    /// Returns None for names that were not produced by [`store_name`](Self::store_name).
    pub fn from_store_name(name: &str) -> Option<Self> {
        let digits = name.strip_prefix(STORE_PREFIX)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(Self)
    }

    /// Whether `name` belongs to this version. Any other name is stale.
    pub fn owns(self, name: &str) -> bool {
        name == self.store_name()
    }
}

impl Default for CacheVersion {
    fn default() -> Self {
        CURRENT_CACHE_VERSION
    }
}

impl fmt::Display for CacheVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}
