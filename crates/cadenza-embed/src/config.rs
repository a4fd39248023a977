use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::audio::DecodeLimits;

/// Configuration for cadenza.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (CADENZA_* prefix)
/// 3. Config file (~/.config/cadenza/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the similarity index.
    ///
    /// Can be set via:
    /// - ENV: CADENZA_INDEX_URL
    /// - Config: index_url = "https://..."
    pub index_url: Option<String>,

    /// API key sent to the similarity index.
    ///
    /// Can be set via:
    /// - ENV: CADENZA_INDEX_API_KEY
    /// - Config: index_api_key = "..."
    pub index_api_key: Option<String>,

    /// Path to the SQLite asset database.
    ///
    /// Can be set via:
    /// - CLI: --db /path/to/db
    /// - ENV: CADENZA_DATABASE_PATH
    /// - Default: ~/.local/share/cadenza/cadenza.db
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,

    /// Directory holding uploaded raw audio.
    #[serde(default = "default_blob_dir")]
    pub blob_dir: PathBuf,

    /// Public base URL of `blob_dir`. Uploaded assets get `file://` URLs
    /// when unset.
    pub blob_base_url: Option<String>,

    /// Largest accepted encoded audio buffer, in bytes.
    #[serde(default = "default_max_input_bytes")]
    pub max_input_bytes: usize,

    /// Longest accepted audio, in seconds.
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u64,

    /// Concurrent embedding computations.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Embedding requests allowed to wait for a worker.
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,

    /// Matches returned by a query when no count is given.
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Timeout for index and fetch requests.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index_url: None,
            index_api_key: None,
            database_path: default_db_path(),
            blob_dir: default_blob_dir(),
            blob_base_url: None,
            max_input_bytes: default_max_input_bytes(),
            max_duration_secs: default_max_duration_secs(),
            workers: default_workers(),
            queue_depth: default_queue_depth(),
            default_top_k: default_top_k(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/cadenza/config.toml
    /// Reads environment variables with CADENZA_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("cadenza");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;

        Ok(config)
    }

    /// Load configuration with custom database path.
    ///
    /// This is used when the --db CLI flag is provided.
    pub fn load_with_db_path(db_path: PathBuf) -> Result<Self> {
        let mut config = Self::load()?;
        config.database_path = db_path;
        Ok(config)
    }

    /// Size and duration ceilings for the decoder.
    #[must_use]
    pub const fn decode_limits(&self) -> DecodeLimits {
        DecodeLimits {
            max_input_bytes: self.max_input_bytes,
            max_duration_secs: self.max_duration_secs,
        }
    }
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cadenza")
}

/// Returns: ~/.local/share/cadenza/cadenza.db (or platform equivalent)
fn default_db_path() -> PathBuf {
    data_dir().join("cadenza.db")
}

fn default_blob_dir() -> PathBuf {
    data_dir().join("blobs")
}

const fn default_max_input_bytes() -> usize {
    64 * 1024 * 1024
}

const fn default_max_duration_secs() -> u64 {
    900
}

fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(2, std::num::NonZeroUsize::get)
}

const fn default_queue_depth() -> usize {
    16
}

const fn default_top_k() -> usize {
    10
}

const fn default_request_timeout_secs() -> u64 {
    30
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/cadenza/config.toml
/// - macOS: ~/Library/Application Support/cadenza/config.toml
/// - Windows: %APPDATA%\cadenza\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cadenza")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Cadenza Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (CADENZA_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Similarity index endpoint (Pinecone-compatible REST API)
#
# Can also be set via:
# - Environment: CADENZA_INDEX_URL / CADENZA_INDEX_API_KEY
index_url = "https://your-index.svc.example.pinecone.io"
index_api_key = "your-index-api-key-here"

# Path to the SQLite asset database
#
# Can also be set via:
# - CLI: cadenza --db /custom/path.db status
# - Environment: CADENZA_DATABASE_PATH=/custom/path.db
#
# Default: Platform-specific data directory
#database_path = "/path/to/custom/cadenza.db"

# Where uploaded audio is stored, and the URL it is served from
#blob_dir = "/path/to/blobs"
#blob_base_url = "https://cdn.example.com/audio"

# Inputs larger or longer than this are rejected before decoding
max_input_bytes = 67108864
max_duration_secs = 900

# Embedding worker pool: concurrent computations and waiting requests
#workers = 4
queue_depth = 16

# Number of matches returned by `cadenza query`
default_top_k = 10

# Timeout for index and download requests, in seconds
request_timeout_secs = 30
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}
