//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (FAVICACHE_*)
//! 2. TOML config file (if FAVICACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

mod validation;

pub use validation::ConfigError;

/// Placeholder substituted with the failing icon's host in `secondary_provider`.
pub const HOST_PLACEHOLDER: &str = "{host}";

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (FAVICACHE_*)
/// 2. TOML config file (if FAVICACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite cache database.
    ///
    /// Set via FAVICACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin the page is served from. Seed and fallback paths resolve against it.
    ///
    /// Set via FAVICACHE_PAGE_ORIGIN environment variable.
    #[serde(default = "default_page_origin")]
    pub page_origin: String,

    /// Assets cached at install time, in order.
    ///
    /// Set via FAVICACHE_SEED_ASSETS environment variable (TOML array).
    #[serde(default = "default_seed_assets")]
    pub seed_assets: Vec<String>,

    /// Asset served when an icon-shaped request fails outright.
    ///
    /// Set via FAVICACHE_FALLBACK_ASSET environment variable.
    #[serde(default = "default_fallback_asset")]
    pub fallback_asset: String,

    /// Regex over the request URL selecting requests eligible for the fallback asset.
    ///
    /// Set via FAVICACHE_FALLBACK_PATTERN environment variable.
    #[serde(default = "default_fallback_pattern")]
    pub fallback_pattern: String,

    /// Secondary favicon provider, `{host}` is replaced by the failing icon's host.
    ///
    /// Set via FAVICACHE_SECONDARY_PROVIDER environment variable.
    #[serde(default = "default_secondary_provider")]
    pub secondary_provider: String,

    /// Crossfade duration in milliseconds for icons that are not cached yet.
    ///
    /// Set via FAVICACHE_FADE_MS environment variable.
    #[serde(default = "default_fade_ms")]
    pub fade_ms: u64,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via FAVICACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via FAVICACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via FAVICACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./favicache.sqlite")
}

fn default_page_origin() -> String {
    "http://localhost:3000".into()
}

fn default_seed_assets() -> Vec<String> {
    vec![
        "/assets/bangs/index.js".into(),
        "/assets/bangs/index.html".into(),
        "/assets/bangs/style.css".into(),
        "/assets/bangs/fallback-icon.svg".into(),
    ]
}

fn default_fallback_asset() -> String {
    "/assets/bangs/fallback-icon.svg".into()
}

fn default_fallback_pattern() -> String {
    r"\.ico$".into()
}

fn default_secondary_provider() -> String {
    "https://icons.duckduckgo.com/ip3/{host}.ico".into()
}

fn default_fade_ms() -> u64 {
    350
}

fn default_user_agent() -> String {
    "favicache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            page_origin: default_page_origin(),
            seed_assets: default_seed_assets(),
            fallback_asset: default_fallback_asset(),
            fallback_pattern: default_fallback_pattern(),
            secondary_provider: default_secondary_provider(),
            fade_ms: default_fade_ms(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Crossfade duration for uncached icons.
    pub fn fade(&self) -> Duration {
        Duration::from_millis(self.fade_ms)
    }

    /// The page origin as a parsed URL.
    pub fn page_origin_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.page_origin).map_err(|e| ConfigError::Invalid {
            field: "page_origin".into(),
            reason: e.to_string(),
        })
    }

    /// Resolve an asset path (absolute or origin-relative) against the page origin.
    pub fn resolve_asset(&self, path: &str) -> Result<Url, ConfigError> {
        self.page_origin_url()?
            .join(path)
            .map_err(|e| ConfigError::Invalid { field: "asset".into(), reason: format!("{path}: {e}") })
    }

    /// Seed assets as absolute URLs, in configured order.
    pub fn seed_urls(&self) -> Result<Vec<Url>, ConfigError> {
        self.seed_assets.iter().map(|p| self.resolve_asset(p)).collect()
    }

    pub fn fallback_url(&self) -> Result<Url, ConfigError> {
        self.resolve_asset(&self.fallback_asset)
    }

    pub fn fallback_regex(&self) -> Result<Regex, ConfigError> {
        Regex::new(&self.fallback_pattern).map_err(|e| ConfigError::Invalid {
            field: "fallback_pattern".into(),
            reason: e.to_string(),
        })
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `FAVICACHE_`
    /// 2. TOML file from `FAVICACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("FAVICACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("FAVICACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
