//! Application configuration for LeadScout.
//!
//! User config lives at `~/.leadscout/leadscout.toml`.
//! CLI flags override config file values, which override defaults.
//! The file only names the environment variables holding credentials;
//! secrets themselves are read from the environment when a feature runs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{LeadScoutError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "leadscout.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".leadscout";

// ---------------------------------------------------------------------------
// Config structs (matching leadscout.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Search/extraction service settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Generative text service settings.
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// Automation (spreadsheet) service settings.
    #[serde(default)]
    pub sheets: SheetsConfig,
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Service base URL.
    #[serde(default = "default_search_base_url")]
    pub base_url: String,

    /// Env var that, when set, overrides `base_url`.
    #[serde(default = "default_search_base_url_env")]
    pub base_url_env: String,

    /// Name of the env var holding the API key.
    #[serde(default = "default_search_api_key_env")]
    pub api_key_env: String,

    /// Per-request timeout applied to every search/extract call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Result limit used when the caller supplies none.
    #[serde(default = "default_limit")]
    pub default_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_search_base_url(),
            base_url_env: default_search_base_url_env(),
            api_key_env: default_search_api_key_env(),
            timeout_secs: default_timeout_secs(),
            default_limit: default_limit(),
        }
    }
}

impl SearchConfig {
    /// Base URL after applying the env override, without a trailing slash.
    pub fn resolved_base_url(&self) -> Result<String> {
        let raw = match std::env::var(&self.base_url_env) {
            Ok(val) if !val.trim().is_empty() => val,
            _ => self.base_url.clone(),
        };
        normalize_base_url(&raw)
    }

    /// Per-request timeout; zero is rejected.
    pub fn resolved_timeout_secs(&self) -> Result<u64> {
        if self.timeout_secs == 0 {
            return Err(LeadScoutError::config(
                "[search] timeout_secs must be greater than 0",
            ));
        }
        Ok(self.timeout_secs)
    }
}

fn default_search_base_url() -> String {
    "https://api.firecrawl.dev".into()
}
fn default_search_base_url_env() -> String {
    "FIRECRAWL_BASE_URL".into()
}
fn default_search_api_key_env() -> String {
    "FIRECRAWL_API_KEY".into()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_limit() -> usize {
    10
}

/// `[enrichment]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Generative text service base URL.
    #[serde(default = "default_enrichment_base_url")]
    pub base_url: String,

    /// Name of the env var holding the API key.
    #[serde(default = "default_enrichment_api_key_env")]
    pub api_key_env: String,

    /// Model used for lead cleanup.
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            base_url: default_enrichment_base_url(),
            api_key_env: default_enrichment_api_key_env(),
            model: default_model(),
        }
    }
}

fn default_enrichment_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn default_enrichment_api_key_env() -> String {
    "GOOGLE_API_KEY".into()
}
fn default_model() -> String {
    "gemini-1.5-flash".into()
}

/// `[sheets]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    /// Automation service base URL.
    #[serde(default = "default_sheets_base_url")]
    pub base_url: String,

    /// Name of the env var holding the API key.
    #[serde(default = "default_sheets_api_key_env")]
    pub api_key_env: String,

    /// Invocation methods the deployment exposes
    /// (`execute_action`, `actions.execute`, `tools.execute`).
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            base_url: default_sheets_base_url(),
            api_key_env: default_sheets_api_key_env(),
            methods: default_methods(),
        }
    }
}

fn default_sheets_base_url() -> String {
    "https://backend.composio.dev".into()
}
fn default_sheets_api_key_env() -> String {
    "COMPOSIO_API_KEY".into()
}
fn default_methods() -> Vec<String> {
    vec![
        "execute_action".into(),
        "actions.execute".into(),
        "tools.execute".into(),
    ]
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.leadscout/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| LeadScoutError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.leadscout/leadscout.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| LeadScoutError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        LeadScoutError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| LeadScoutError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| LeadScoutError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| LeadScoutError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Read an API key from the named env var. Empty values count as unset.
pub fn optional_api_key(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Some(val),
        _ => None,
    }
}

/// Read an API key that the calling feature cannot run without.
pub fn require_api_key(var_name: &str) -> Result<String> {
    optional_api_key(var_name).ok_or_else(|| {
        LeadScoutError::config(format!(
            "API key not found. Set the {var_name} environment variable."
        ))
    })
}

/// Validate a base URL and strip trailing slashes.
fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    Url::parse(trimmed)
        .map_err(|e| LeadScoutError::config(format!("invalid base URL '{trimmed}': {e}")))?;
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("FIRECRAWL_API_KEY"));
        assert!(toml_str.contains("GOOGLE_API_KEY"));
        assert!(toml_str.contains("COMPOSIO_API_KEY"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[search]
timeout_secs = 15

[sheets]
methods = ["tools.execute"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.search.timeout_secs, 15);
        assert_eq!(config.search.default_limit, 10);
        assert_eq!(config.search.base_url, "https://api.firecrawl.dev");
        assert_eq!(config.enrichment.model, "gemini-1.5-flash");
        assert_eq!(config.sheets.methods, vec!["tools.execute".to_string()]);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = SearchConfig {
            base_url: "https://api.example.com///".into(),
            base_url_env: "LS_TEST_UNSET_BASE_URL_93211".into(),
            ..SearchConfig::default()
        };
        assert_eq!(config.resolved_base_url().unwrap(), "https://api.example.com");
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        let config = SearchConfig {
            base_url: "not a url".into(),
            base_url_env: "LS_TEST_UNSET_BASE_URL_93212".into(),
            ..SearchConfig::default()
        };
        let err = config.resolved_base_url().unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn zero_timeout_is_config_error() {
        let config = SearchConfig {
            timeout_secs: 0,
            ..SearchConfig::default()
        };
        assert!(config.resolved_timeout_secs().unwrap_err().is_config());

        let config: AppConfig = toml::from_str("[search]\ntimeout_secs = 0\n").expect("parse");
        assert!(config.search.resolved_timeout_secs().is_err());
        assert_eq!(SearchConfig::default().resolved_timeout_secs().unwrap(), 60);
    }

    #[test]
    fn missing_api_key_is_config_error() {
        // Use a unique env var name to avoid interfering with other tests
        let result = require_api_key("LS_TEST_NONEXISTENT_KEY_12345");
        let err = result.unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("LS_TEST_NONEXISTENT_KEY_12345"));
        assert!(optional_api_key("LS_TEST_NONEXISTENT_KEY_12345").is_none());
    }
}
