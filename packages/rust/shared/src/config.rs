//! Application configuration for arxivdigest.
//!
//! User config lives at `~/.arxivdigest/arxivdigest.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DigestError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "arxivdigest.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".arxivdigest";

// ---------------------------------------------------------------------------
// Config structs (matching arxivdigest.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Listing snapshot source.
    #[serde(default)]
    pub listing: ListingConfig,

    /// DeepSeek API settings.
    #[serde(default)]
    pub deepseek: DeepSeekConfig,

    /// Enrichment pipeline settings.
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// Output document and ledger locations.
    #[serde(default)]
    pub output: OutputConfig,

    /// Category and keyword classification rules.
    #[serde(default)]
    pub rules: RulesConfig,
}

/// `[listing]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Daily new-listings page to snapshot.
    #[serde(default = "default_listing_url")]
    pub url: String,

    /// HTTP timeout for the snapshot fetch, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            url: default_listing_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_listing_url() -> String {
    "https://arxiv.org/list/cs/new".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[deepseek]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepSeekConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// API base URL; `/chat/completions` is appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for summarization.
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for DeepSeekConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            model: default_model(),
        }
    }
}

fn default_api_key_env() -> String {
    "DEEPSEEK_API_KEY".into()
}
fn default_base_url() -> String {
    "https://api.deepseek.com".into()
}
fn default_model() -> String {
    "deepseek-chat".into()
}

/// `[enrichment]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Concurrent enrichment workers.
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Upper bound on first-page text sent to the model, in characters.
    #[serde(default = "default_max_first_page_chars")]
    pub max_first_page_chars: usize,

    /// Directory for transient PDF downloads.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: String,

    /// HTTP timeout for PDF and API requests, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            max_first_page_chars: default_max_first_page_chars(),
            temp_dir: default_temp_dir(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_workers() -> u32 {
    10
}
fn default_max_first_page_chars() -> usize {
    4096
}
fn default_temp_dir() -> String {
    "temp_pdfs".into()
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory holding the weekly digest documents.
    #[serde(default = "default_daily_dir")]
    pub daily_dir: String,

    /// Processed-date ledger file.
    #[serde(default = "default_ledger_file")]
    pub ledger_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            daily_dir: default_daily_dir(),
            ledger_file: default_ledger_file(),
        }
    }
}

fn default_daily_dir() -> String {
    "docs/daily".into()
}
fn default_ledger_file() -> String {
    "arxiv_date.txt".into()
}

/// `[rules]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Category whose papers are always retained and fully enriched.
    #[serde(default = "default_primary_category")]
    pub primary_category: String,

    /// Categories retained in the simplified tier.
    #[serde(default = "default_secondary_categories")]
    pub secondary_categories: Vec<String>,

    /// Secondary categories that additionally require a keyword match.
    #[serde(default = "default_keyword_gated")]
    pub keyword_gated: Vec<String>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            primary_category: default_primary_category(),
            secondary_categories: default_secondary_categories(),
            keyword_gated: default_keyword_gated(),
        }
    }
}

fn default_primary_category() -> String {
    "cs.DC".into()
}
fn default_secondary_categories() -> Vec<String> {
    vec!["cs.AI".into(), "cs.LG".into()]
}
fn default_keyword_gated() -> Vec<String> {
    vec!["cs.AI".into(), "cs.LG".into()]
}

// ---------------------------------------------------------------------------
// Category rules (runtime, merged from config)
// ---------------------------------------------------------------------------

/// Runtime classification rules, resolved from the config file.
#[derive(Debug, Clone)]
pub struct CategoryRules {
    /// Primary category code.
    pub primary: String,
    /// Secondary category allowlist.
    pub secondary: Vec<String>,
    /// Subset of secondary categories gated on keyword matches.
    pub keyword_gated: Vec<String>,
}

impl From<&AppConfig> for CategoryRules {
    fn from(config: &AppConfig) -> Self {
        Self {
            primary: config.rules.primary_category.clone(),
            secondary: config.rules.secondary_categories.clone(),
            keyword_gated: config.rules.keyword_gated.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.arxivdigest/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DigestError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.arxivdigest/arxivdigest.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| DigestError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| DigestError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DigestError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DigestError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DigestError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the DeepSeek API key env var is set and non-empty.
pub fn validate_api_key(config: &AppConfig) -> Result<()> {
    let var_name = &config.deepseek.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(()),
        _ => Err(DigestError::config(format!(
            "DeepSeek API key not found. Set the {var_name} environment variable.\n\
             Get a key at https://platform.deepseek.com/api_keys"
        ))),
    }
}
