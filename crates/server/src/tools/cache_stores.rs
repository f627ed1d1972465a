//! cache_stores tool implementation.
//!
//! Lists the cache stores in the database and their entry counts.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use favicache_client::Agent;

use super::json_result;

/// Parameters for the cache_stores tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheStoresParams {
    /// Include each store's keys in the output.
    #[serde(default)]
    pub include_keys: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoreInfo {
    pub name: String,
    pub entries: usize,
    pub current: bool,
    /// `METHOD url` per entry, in insertion order, when requested.
    pub keys: Option<Vec<String>>,
}

/// Output from the cache_stores tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStoresOutput {
    /// Name of the store owned by the running cache version.
    pub current: String,
    pub stores: Vec<StoreInfo>,
    /// RFC3339 time the listing was taken.
    pub listed_at: String,
}

/// Implementation of the cache_stores tool.
pub async fn stores_impl(agent: &Agent, params: CacheStoresParams) -> Result<CallToolResult, McpError> {
    let current = agent.config().store_name();
    let mut stores = Vec::new();

    for name in agent.db().store_names().await? {
        let store = agent.db().open_store(&name).await?;
        let keys = store.keys().await?;
        stores.push(StoreInfo {
            current: name == current,
            entries: keys.len(),
            keys: params
                .include_keys
                .then(|| keys.iter().map(|k| format!("{} {}", k.method(), k.url())).collect()),
            name,
        });
    }

    json_result(&CacheStoresOutput { current, stores, listed_at: chrono::Utc::now().to_rfc3339() })
}
