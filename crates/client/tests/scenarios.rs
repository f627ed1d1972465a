//! End-to-end agent and page behavior through the public API.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use favicache_client::agent::mailbox;
use favicache_client::page::{IconSurface, RowLink};
use favicache_client::{
    Agent, AgentConfig, Bang, BangRow, CacheAnswer, CacheQueryClient, ControllerSlot, FaviconLoader, FetchEvent,
    FetchSurface, LoadOutcome, LoaderConfig, LocalHost, Network, Tier,
};
use favicache_core::protocol::FaviconCachedRequest;
use favicache_core::{AppConfig, CacheDb, CacheVersion, CapturedResponse, Error, RequestKey};

const ICON: &str = "https://example.com/favicon.ico";

#[derive(Default)]
struct ScriptedNetwork {
    responses: Mutex<HashMap<String, CapturedResponse>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedNetwork {
    fn with(responses: &[(&str, CapturedResponse)]) -> Arc<Self> {
        let network = Self::default();
        for (url, response) in responses {
            network.responses.lock().unwrap().insert(url.to_string(), response.clone());
        }
        Arc::new(network)
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &RequestKey) -> Result<CapturedResponse, Error> {
        self.calls.lock().unwrap().push(request.url().to_string());
        self.responses
            .lock()
            .unwrap()
            .get(request.url())
            .cloned()
            .ok_or_else(|| Error::HttpError(format!("{} unreachable", request.url())))
    }
}

fn icon(body: &str) -> CapturedResponse {
    CapturedResponse::new(200, vec![("Content-Type".into(), "image/x-icon".into())], body.as_bytes())
}

struct Harness {
    agent: Arc<Agent>,
    host: Arc<LocalHost>,
    controller: ControllerSlot,
}

async fn harness(db: CacheDb, network: Arc<ScriptedNetwork>, config: AgentConfig) -> Harness {
    let (handle, mailbox) = mailbox::channel(16);
    let host = Arc::new(LocalHost::new(handle));
    let controller = host.controller();
    let agent = Arc::new(Agent::new(db, network, host.clone(), config));
    let _task = agent.clone().serve(mailbox);
    Harness { agent, host, controller }
}

fn default_config() -> AgentConfig {
    AgentConfig::from_app(&AppConfig::default()).unwrap()
}

fn loader(controller: ControllerSlot) -> FaviconLoader {
    FaviconLoader::new(CacheQueryClient::new(controller), LoaderConfig::from_app(&AppConfig::default()).unwrap())
}

#[tokio::test]
async fn test_query_answers_true_for_stored_key() {
    let db = CacheDb::open_in_memory().await.unwrap();
    let h = harness(db, ScriptedNetwork::with(&[]), default_config()).await;
    h.agent.activate().await;
    h.agent.current_store().await.unwrap().put(&RequestKey::get(ICON).unwrap(), &icon("ico")).await.unwrap();

    let handle = h.controller.current().await.unwrap();
    let pending = handle.post(FaviconCachedRequest::new(ICON).to_value()).await.unwrap();
    let reply = pending.receiver.await.unwrap();

    assert_eq!(reply.token, pending.token);
    assert_eq!(
        reply.payload,
        serde_json::json!({ "message": "IS_FAVICON_CACHED", "response": { "isCached": true } })
    );
}

#[tokio::test]
async fn test_install_with_failing_asset_still_claims() {
    let config = AgentConfig {
        seed_assets: vec![
            Url::parse("http://localhost:3000/a").unwrap(),
            Url::parse("http://localhost:3000/b").unwrap(),
            Url::parse("http://localhost:3000/c").unwrap(),
        ],
        ..default_config()
    };
    let network =
        ScriptedNetwork::with(&[("http://localhost:3000/a", icon("a")), ("http://localhost:3000/c", icon("c"))]);
    let db = CacheDb::open_in_memory().await.unwrap();
    let h = harness(db, network, config).await;

    let report = h.agent.install().await;
    h.agent.activate().await;

    assert_eq!(report.failed.len(), 1);
    let keys: Vec<String> =
        h.agent.current_store().await.unwrap().keys().await.unwrap().iter().map(|k| k.url().to_string()).collect();
    assert_eq!(keys.len(), 2);
    assert!(keys.contains(&"http://localhost:3000/a".to_string()));
    assert!(keys.contains(&"http://localhost:3000/c".to_string()));
    assert!(h.host.waiting_skipped());
    assert!(h.host.claimed());
}

#[tokio::test]
async fn test_activation_deletes_previous_version() {
    let db = CacheDb::open_in_memory().await.unwrap();
    db.open_store("favicons-v1").await.unwrap();
    db.open_store("favicons-v2").await.unwrap();
    let h = harness(db, ScriptedNetwork::with(&[]), default_config()).await;

    h.agent.activate().await;

    let names = h.agent.db().store_names().await.unwrap();
    assert_eq!(names, vec!["favicons-v2".to_string()]);
}

#[tokio::test]
async fn test_dead_host_gets_synthesized_error() {
    let db = CacheDb::open_in_memory().await.unwrap();
    let h = harness(db, ScriptedNetwork::with(&[]), default_config()).await;

    let resolved = h
        .agent
        .handle_fetch(FetchEvent::new(RequestKey::get("https://dead-host.invalid/favicon.ico").unwrap()))
        .await;

    assert_eq!(resolved.tier, Tier::Synthesized);
    assert_eq!(resolved.response.status, 400);
    assert_eq!(resolved.response.content_type(), Some("text/plain"));
    assert_eq!(resolved.response.body, b"Network error occurred");
}

#[tokio::test]
async fn test_malformed_template_builds_label_row_without_fetching() {
    let db = CacheDb::open_in_memory().await.unwrap();
    let network = ScriptedNetwork::with(&[]);
    let h = harness(db, network.clone(), default_config()).await;
    h.agent.activate().await;

    let row = BangRow::build(&Bang::new("Broken", "br", "not a url"));
    assert_eq!(row.short, "Broken");
    assert_eq!(row.trigger, "br");
    assert_eq!(row.link, RowLink::Inert);

    let surface = FetchSurface::new(h.agent.clone());
    let outcomes = loader(h.controller.clone()).load_rows(&surface, &[row]).await;

    assert!(outcomes[0].is_none());
    assert_eq!(surface.loads(), 0);
    assert!(network.calls().is_empty());
}

#[tokio::test]
async fn test_cached_url_never_hits_network() {
    let network = ScriptedNetwork::with(&[(ICON, icon("live"))]);
    let db = CacheDb::open_in_memory().await.unwrap();
    let h = harness(db, network.clone(), default_config()).await;
    h.agent.current_store().await.unwrap().put(&RequestKey::get(ICON).unwrap(), &icon("cached")).await.unwrap();

    for _ in 0..5 {
        let resolved = h.agent.handle_fetch(FetchEvent::new(RequestKey::get(ICON).unwrap())).await;
        assert_eq!(resolved.tier, Tier::Cache);
    }

    assert!(network.calls().is_empty());
}

#[tokio::test]
async fn test_version_bump_isolates_stores() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("favicache.sqlite");
    let seeded = ScriptedNetwork::with(&[
        ("http://localhost:3000/assets/bangs/index.js", icon("js")),
        ("http://localhost:3000/assets/bangs/index.html", icon("html")),
        ("http://localhost:3000/assets/bangs/style.css", icon("css")),
        ("http://localhost:3000/assets/bangs/fallback-icon.svg", icon("svg")),
    ]);

    {
        let db = CacheDb::open(&path).await.unwrap();
        let h = harness(db, seeded.clone(), default_config()).await;
        h.agent.install().await;
        h.agent.activate().await;
    }

    let bumped = AgentConfig { version: CacheVersion(3), ..default_config() };
    let db = CacheDb::open(&path).await.unwrap();
    let h = harness(db, seeded, bumped).await;
    let report = h.agent.install().await;
    h.agent.activate().await;

    assert_eq!(h.agent.db().store_names().await.unwrap(), vec!["favicons-v3".to_string()]);
    assert!(!h.agent.db().has_store("favicons-v2").await.unwrap());
    assert_eq!(report.cached.len(), 4);
}

#[tokio::test]
async fn test_query_without_controller_is_false() {
    let client = CacheQueryClient::new(ControllerSlot::default());
    let answer = client.is_favicon_cached(ICON).await;
    assert_eq!(answer, CacheAnswer::NoController);
    assert!(!answer.is_cached());
}

#[tokio::test]
async fn test_query_tracks_current_store_contents() {
    let db = CacheDb::open_in_memory().await.unwrap();
    let h = harness(db, ScriptedNetwork::with(&[]), default_config()).await;
    h.agent.activate().await;
    let client = CacheQueryClient::new(h.controller.clone());

    assert!(!client.is_favicon_cached(ICON).await.is_cached());
    h.agent.current_store().await.unwrap().put(&RequestKey::get(ICON).unwrap(), &icon("ico")).await.unwrap();
    assert!(client.is_favicon_cached(ICON).await.is_cached());

    // Only the current version's store counts.
    let stale = h.agent.db().open_store("favicons-v1").await.unwrap();
    let other = "https://other.example/favicon.ico";
    stale.put(&RequestKey::get(other).unwrap(), &icon("old")).await.unwrap();
    assert!(!client.is_favicon_cached(other).await.is_cached());
}

#[tokio::test]
async fn test_concurrent_queries_each_get_one_reply() {
    let db = CacheDb::open_in_memory().await.unwrap();
    let h = harness(db, ScriptedNetwork::with(&[]), default_config()).await;
    h.agent.activate().await;
    h.agent.current_store().await.unwrap().put(&RequestKey::get(ICON).unwrap(), &icon("ico")).await.unwrap();
    let client = CacheQueryClient::new(h.controller.clone());

    let urls: Vec<String> = (0..10)
        .map(|i| if i % 2 == 0 { ICON.to_string() } else { format!("https://site{i}.test/favicon.ico") })
        .collect();
    let answers = futures_util::future::join_all(urls.iter().map(|u| client.is_favicon_cached(u))).await;

    for (i, answer) in answers.iter().enumerate() {
        assert_eq!(answer.is_cached(), i % 2 == 0);
    }
}

struct CountingSurface {
    loads: Mutex<Vec<String>>,
}

#[async_trait]
impl IconSurface for CountingSurface {
    async fn load(&self, src: &Url) -> Result<(), String> {
        self.loads.lock().unwrap().push(src.to_string());
        Err("broken image".into())
    }

    async fn fade(&self, _src: &Url, _duration: Duration) {}

    async fn remove_placeholder(&self) {}
}

#[tokio::test]
async fn test_two_failures_settle_on_placeholder() {
    let surface = CountingSurface { loads: Mutex::new(Vec::new()) };

    let outcome = loader(ControllerSlot::default()).load(&surface, Url::parse(ICON).unwrap()).await.unwrap();

    assert!(matches!(outcome, LoadOutcome::Degraded { .. }));
    assert_eq!(
        *surface.loads.lock().unwrap(),
        vec![ICON.to_string(), "https://icons.duckduckgo.com/ip3/example.com.ico".to_string()]
    );
    assert_eq!(outcome.state().displayed, outcome.state().placeholder);
}

#[tokio::test]
async fn test_two_failures_through_interceptor_issue_two_fetches() {
    let network = ScriptedNetwork::with(&[]);
    let db = CacheDb::open_in_memory().await.unwrap();
    let h = harness(db, network.clone(), default_config()).await;
    h.agent.activate().await;
    let surface = FetchSurface::new(h.agent.clone());

    let outcome = loader(h.controller.clone()).load(&surface, Url::parse(ICON).unwrap()).await.unwrap();

    assert!(!outcome.is_loaded());
    assert_eq!(surface.loads(), 2);
    assert_eq!(network.calls().len(), 2);
}
