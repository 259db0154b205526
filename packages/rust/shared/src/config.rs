//! Application configuration for orgscout.
//!
//! User config lives at `~/.orgscout/orgscout.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{OrgScoutError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "orgscout.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".orgscout";

// ---------------------------------------------------------------------------
// Config structs (matching orgscout.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Fuzzy name matching knobs.
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Website content cache.
    #[serde(default)]
    pub cache: CacheConfig,

    /// HTTP fetch engine.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Search engines and the paid search channel.
    #[serde(default)]
    pub search: SearchConfig,

    /// Organization-data providers.
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// `[matching]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Minimum similarity percentage for a relevance match.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Tokens shorter than this are dropped from the long-words variant.
    #[serde(default = "default_min_partial_len")]
    pub min_partial_len: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            min_partial_len: default_min_partial_len(),
        }
    }
}

fn default_similarity_threshold() -> f64 {
    70.0
}
fn default_min_partial_len() -> usize {
    4
}

/// `[cache]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Database path. Empty means `~/.orgscout/cache.db`.
    #[serde(default)]
    pub path: String,

    /// Host-scoped time to live for cached websites.
    #[serde(default = "default_ttl_days")]
    pub ttl_days: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            ttl_days: default_ttl_days(),
        }
    }
}

fn default_ttl_days() -> u32 {
    30
}

impl CacheConfig {
    /// Resolve the database path, falling back to the config directory.
    pub fn resolved_path(&self) -> Result<PathBuf> {
        if self.path.is_empty() {
            Ok(config_dir()?.join("cache.db"))
        } else {
            Ok(PathBuf::from(&self.path))
        }
    }
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User agent sent with every page request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Optional proxy URL used for requests that ask for one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            proxy: None,
        }
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0".into()
}
fn default_timeout_secs() -> u64 {
    20
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Free search engines in priority order.
    #[serde(default = "default_engines")]
    pub engines: Vec<String>,

    /// Result links ending in one of these extensions are dropped.
    #[serde(default = "default_excluded_filetypes")]
    pub excluded_filetypes: Vec<String>,

    /// Name of the env var holding the paid search API key.
    #[serde(default = "default_serpapi_key_env")]
    pub serpapi_key_env: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            engines: default_engines(),
            excluded_filetypes: default_excluded_filetypes(),
            serpapi_key_env: default_serpapi_key_env(),
        }
    }
}

fn default_engines() -> Vec<String> {
    vec!["duckduckgo".into(), "bing".into()]
}
fn default_excluded_filetypes() -> Vec<String> {
    vec!["pdf".into()]
}
fn default_serpapi_key_env() -> String {
    "ORGSCOUT_SERPAPI_KEY".into()
}

/// `[providers]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Organization-data providers allowed to run, by name.
    #[serde(default = "default_enabled_providers")]
    pub enabled: Vec<String>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled_providers(),
        }
    }
}

fn default_enabled_providers() -> Vec<String> {
    vec!["crunchbase".into(), "dnb".into()]
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.orgscout/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| OrgScoutError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.orgscout/orgscout.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| OrgScoutError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| OrgScoutError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| OrgScoutError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| OrgScoutError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| OrgScoutError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the paid search API key from the configured env var.
///
/// Returns `None` when the variable is unset or empty; the paid channel is
/// then disabled.
pub fn resolve_serpapi_key(config: &AppConfig) -> Option<String> {
    std::env::var(&config.search.serpapi_key_env)
        .ok()
        .filter(|val| !val.is_empty())
}
