//! Install-time seeding of the current store.
//!
//! The whole bundle is tried as one transaction first. If any asset fails,
//! each asset is fetched and stored on its own and failures are only logged.

use futures_util::future::join_all;
use url::Url;

use favicache_core::{CapturedResponse, Error, RequestKey, Store};

use crate::fetch::Network;

/// An asset that could not be cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedFailure {
    pub url: String,
    pub reason: String,
}

/// What seeding achieved. Never an error: partial seeds are acceptable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub store: String,
    /// Cached asset URLs, in seed-list order.
    pub cached: Vec<String>,
    pub failed: Vec<SeedFailure>,
    /// True when the bulk transaction succeeded without falling back.
    pub bulk: bool,
}

impl SeedReport {
    /// Report for a store that could not even be opened.
    pub(crate) fn unopened(store: &str, assets: &[Url], err: &Error) -> Self {
        Self {
            store: store.to_string(),
            cached: Vec::new(),
            failed: assets
                .iter()
                .map(|url| SeedFailure { url: url.to_string(), reason: err.to_string() })
                .collect(),
            bulk: false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

async fn fetch_asset(network: &dyn Network, url: &Url) -> Result<(RequestKey, CapturedResponse), Error> {
    let key = RequestKey::from_url("GET", url)?;
    let response = network.fetch(&key).await?;
    if !response.is_success() {
        return Err(Error::HttpError(format!("status {}", response.status)));
    }
    Ok((key, response))
}

/// Seed `store` with `assets`.
pub async fn seed(store: &Store, network: &dyn Network, assets: &[Url]) -> SeedReport {
    let mut report = SeedReport { store: store.name().to_string(), cached: Vec::new(), failed: Vec::new(), bulk: false };

    match add_all(store, network, assets).await {
        Ok(()) => {
            report.cached = assets.iter().map(Url::to_string).collect();
            report.bulk = true;
            tracing::info!(store = %store.name(), count = assets.len(), "seeded store");
            return report;
        }
        Err(e) => {
            tracing::error!(error = %e, "bulk seed failed, adding assets individually");
        }
    }

    let results = join_all(assets.iter().map(|url| add_one(store, network, url))).await;
    for (url, result) in assets.iter().zip(results) {
        match result {
            Ok(()) => report.cached.push(url.to_string()),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "failed to cache seed asset");
                report.failed.push(SeedFailure { url: url.to_string(), reason: e.to_string() });
            }
        }
    }

    report
}

/// All or nothing: every asset must fetch with a 2xx, then one transaction.
async fn add_all(store: &Store, network: &dyn Network, assets: &[Url]) -> Result<(), Error> {
    let fetched = join_all(assets.iter().map(|url| fetch_asset(network, url)))
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;
    store.put_all(&fetched).await
}

async fn add_one(store: &Store, network: &dyn Network, url: &Url) -> Result<(), Error> {
    let (key, response) = fetch_asset(network, url).await?;
    store.put(&key, &response).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{FakeNetwork, ok};
    use favicache_core::CacheDb;

    fn urls(list: &[&str]) -> Vec<Url> {
        list.iter().map(|u| Url::parse(u).unwrap()).collect()
    }

    #[tokio::test]
    async fn test_bulk_seed() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.open_store("favicons-v2").await.unwrap();
        let network = FakeNetwork::new()
            .serve("http://localhost:3000/a.js", ok("a"))
            .serve("http://localhost:3000/b.css", ok("b"));
        let assets = urls(&["http://localhost:3000/a.js", "http://localhost:3000/b.css"]);

        let report = seed(&store, &network, &assets).await;

        assert!(report.bulk);
        assert!(report.is_complete());
        assert_eq!(report.cached.len(), 2);
        assert_eq!(store.len().await.unwrap(), 2);
        assert_eq!(network.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_partial_seed_falls_back_to_individual() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.open_store("favicons-v2").await.unwrap();
        let network = FakeNetwork::new()
            .serve("http://localhost:3000/a", ok("a"))
            .serve("http://localhost:3000/c", ok("c"));
        let assets = urls(&["http://localhost:3000/a", "http://localhost:3000/b", "http://localhost:3000/c"]);

        let report = seed(&store, &network, &assets).await;

        assert!(!report.bulk);
        assert_eq!(report.cached, vec!["http://localhost:3000/a".to_string(), "http://localhost:3000/c".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].url, "http://localhost:3000/b");

        let keys: Vec<String> = store.keys().await.unwrap().iter().map(|k| k.url().to_string()).collect();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&"http://localhost:3000/a".to_string()));
        assert!(keys.contains(&"http://localhost:3000/c".to_string()));
    }

    #[tokio::test]
    async fn test_non_success_status_not_cached() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.open_store("favicons-v2").await.unwrap();
        let network = FakeNetwork::new()
            .serve("http://localhost:3000/a", ok("a"))
            .serve("http://localhost:3000/missing", CapturedResponse::text(404, "not found"));
        let assets = urls(&["http://localhost:3000/a", "http://localhost:3000/missing"]);

        let report = seed(&store, &network, &assets).await;

        assert_eq!(report.cached, vec!["http://localhost:3000/a".to_string()]);
        assert!(report.failed[0].reason.contains("404"));
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_total_failure_is_reported_not_raised() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.open_store("favicons-v2").await.unwrap();
        let network = FakeNetwork::new();
        let assets = urls(&["http://localhost:3000/a", "http://localhost:3000/b"]);

        let report = seed(&store, &network, &assets).await;

        assert!(report.cached.is_empty());
        assert_eq!(report.failed.len(), 2);
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_seed_list() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.open_store("favicons-v2").await.unwrap();
        let network = FakeNetwork::new();

        let report = seed(&store, &network, &[]).await;

        assert!(report.bulk);
        assert!(report.is_complete());
        assert!(network.calls().is_empty());
    }
}
