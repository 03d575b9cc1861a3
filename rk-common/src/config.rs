//! Configuration loading and value resolution
//!
//! Every user-facing setting is resolved in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Backend URL used when nothing else is configured
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:1281";

/// Environment variable overriding the backend URL
pub const SERVER_URL_ENV: &str = "READKNOWS_SERVER_URL";

/// Environment variable carrying the API bearer token
pub const API_TOKEN_ENV: &str = "READKNOWS_API_TOKEN";

/// Environment variable pointing at an explicit config file
pub const CONFIG_PATH_ENV: &str = "READKNOWS_CONFIG";

/// Configuration loaded from TOML
///
/// All sections are optional; a missing file is equivalent to an empty one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Backend base URL, e.g. `http://nas.local:1281`
    #[serde(default)]
    pub server_url: Option<String>,

    /// Bearer token for authenticated endpoints
    #[serde(default)]
    pub api_token: Option<String>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Per-transport request timeouts
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Default import options applied when the CLI does not override them
    #[serde(default)]
    pub import: ImportDefaults,

    /// Rows per page when listing import history
    #[serde(default = "default_history_page_size")]
    pub history_page_size: usize,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            api_token: None,
            logging: LoggingConfig::default(),
            timeouts: TimeoutConfig::default(),
            import: ImportDefaults::default(),
            history_page_size: default_history_page_size(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Request timeouts, in seconds
///
/// Uploads carry whole book files and get the longest bound; the batch
/// import RPC makes the server copy and parse a file; everything else is
/// a lightweight JSON call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_upload_secs")]
    pub upload_secs: u64,
    #[serde(default = "default_batch_import_secs")]
    pub batch_import_secs: u64,
    #[serde(default = "default_request_secs")]
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            upload_secs: default_upload_secs(),
            batch_import_secs: default_batch_import_secs(),
            request_secs: default_request_secs(),
        }
    }
}

impl TimeoutConfig {
    pub fn upload(&self) -> Duration {
        Duration::from_secs(self.upload_secs)
    }

    pub fn batch_import(&self) -> Duration {
        Duration::from_secs(self.batch_import_secs)
    }

    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }
}

/// Default values for the per-run import options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDefaults {
    #[serde(default = "default_true")]
    pub auto_convert_txt: bool,
    #[serde(default = "default_true")]
    pub auto_convert_mobi: bool,
    #[serde(default = "default_true")]
    pub auto_fetch_metadata: bool,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub delete_source_after_import: bool,
}

impl Default for ImportDefaults {
    fn default() -> Self {
        Self {
            auto_convert_txt: true,
            auto_convert_mobi: true,
            auto_fetch_metadata: true,
            is_public: false,
            category: None,
            delete_source_after_import: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_upload_secs() -> u64 {
    600
}

fn default_batch_import_secs() -> u64 {
    300
}

fn default_request_secs() -> u64 {
    30
}

fn default_history_page_size() -> usize {
    20
}

fn default_true() -> bool {
    true
}

/// Where a resolved value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine,
    Environment,
    TomlFile,
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfigSource::CommandLine => "command line",
            ConfigSource::Environment => "environment",
            ConfigSource::TomlFile => "TOML config",
            ConfigSource::Default => "built-in default",
        };
        f.write_str(name)
    }
}

/// A non-empty, non-whitespace value counts as set
pub fn is_set(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Resolve a single string value through CLI → ENV → TOML
///
/// Returns `None` when no tier provides a usable value.
pub fn resolve_value(
    cli_arg: Option<&str>,
    env_var_name: &str,
    toml_value: Option<&str>,
) -> Option<(String, ConfigSource)> {
    // Priority 1: Command-line argument
    if let Some(value) = cli_arg.filter(|v| is_set(v)) {
        return Some((value.trim().to_string(), ConfigSource::CommandLine));
    }

    // Priority 2: Environment variable
    if let Ok(value) = std::env::var(env_var_name) {
        if is_set(&value) {
            return Some((value.trim().to_string(), ConfigSource::Environment));
        }
    }

    // Priority 3: TOML config file
    if let Some(value) = toml_value.filter(|v| is_set(v)) {
        return Some((value.trim().to_string(), ConfigSource::TomlFile));
    }

    None
}

/// Resolve the backend URL, falling back to [`DEFAULT_SERVER_URL`]
pub fn resolve_server_url(cli_arg: Option<&str>, config: &TomlConfig) -> String {
    let (url, source) = resolve_value(cli_arg, SERVER_URL_ENV, config.server_url.as_deref())
        .unwrap_or_else(|| (DEFAULT_SERVER_URL.to_string(), ConfigSource::Default));
    info!("Server URL {} (from {})", url, source);
    url.trim_end_matches('/').to_string()
}

/// Resolve the API token; `None` means requests go out unauthenticated
pub fn resolve_api_token(cli_arg: Option<&str>, config: &TomlConfig) -> Option<String> {
    match resolve_value(cli_arg, API_TOKEN_ENV, config.api_token.as_deref()) {
        Some((token, source)) => {
            debug!("API token loaded from {}", source);
            Some(token)
        }
        None => {
            debug!("No API token configured");
            None
        }
    }
}

/// Path of the config file
///
/// `$READKNOWS_CONFIG` wins; otherwise `<config_dir>/readknows/config.toml`.
pub fn config_file_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if is_set(&path) {
            return Ok(PathBuf::from(path));
        }
    }

    dirs::config_dir()
        .map(|d| d.join("readknows").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
}

/// Load and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    Ok(config)
}

/// Load the config file if present, defaults otherwise
///
/// A file that exists but does not parse is an error; silently ignoring
/// it would hide a typo behind default values.
pub fn load_or_default(explicit_path: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit_path {
        Some(path) => path.to_path_buf(),
        None => match config_file_path() {
            Ok(path) => path,
            Err(e) => {
                warn!("{}; using defaults", e);
                return Ok(TomlConfig::default());
            }
        },
    };

    if !path.exists() {
        debug!("Config file {} not found, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let config = load_toml_config(&path)?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Write config to `path` atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let content = toml::to_string_pretty(config)?;
    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
