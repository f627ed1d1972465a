//! Request identity used as the cache key.

use serde::{Deserialize, Serialize};
use url::Url;

use super::hash::compute_cache_key;
use crate::Error;

/// Normalized method + absolute URL.
///
/// Normalization is whatever the url crate's serializer applies (lowercase
/// scheme and host, default port elided, empty path becomes `/`) plus:
/// - method trimmed and upper-cased
/// - fragment removed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    method: String,
    url: String,
}

impl RequestKey {
    /// Build a key from a method and an absolute URL string.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an empty method, `InvalidUrl` if the URL is not
    /// absolute or does not parse.
    pub fn new(method: &str, url: &str) -> Result<Self, Error> {
        let parsed = Url::parse(url.trim()).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
        Self::from_url(method, &parsed)
    }

    /// Shorthand for a GET key.
    pub fn get(url: &str) -> Result<Self, Error> {
        Self::new("GET", url)
    }

    /// Build a key from an already parsed URL.
    pub fn from_url(method: &str, url: &Url) -> Result<Self, Error> {
        let method = method.trim().to_ascii_uppercase();
        if method.is_empty() {
            return Err(Error::InvalidInput("method cannot be empty".into()));
        }

        let mut url = url.clone();
        url.set_fragment(None);

        Ok(Self { method, url: url.into() })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Only GET requests are ever looked up in or written to a store.
    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// Storage digest of this identity.
    pub fn digest(&self) -> String {
        compute_cache_key(&self.method, &self.url)
    }

    /// Reassemble a key read back from storage without re-parsing.
    pub(crate) fn from_stored(method: String, url: String) -> Self {
        Self { method, url }
    }
}
