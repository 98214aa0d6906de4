use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_CLICKHOUSE_DATABASE,
    DEFAULT_CLICKHOUSE_TIMEOUT_SECS, DEFAULT_CLICKHOUSE_USERNAME, DEFAULT_HOST, DEFAULT_PORT,
    DEFAULT_RPC_TIMEOUT_SECS, DEFAULT_RPC_URL, DEFAULT_SYNC_THRESHOLD_BLOCKS,
};

// =============================================================================
// File Config (JSON)
// =============================================================================

/// Server configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// ClickHouse configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ClickhouseFileConfig {
    /// HTTP endpoint (or use CLICKHOUSE_URL env var)
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Database holding the indexer tables (default: "indexer")
    pub database: Option<String>,
    /// Per-query timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Enable LZ4 compression (default: true)
    pub compression: Option<bool>,
}

/// Chain RPC configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ChainFileConfig {
    pub rpc_url: Option<String>,
    pub sync_threshold_blocks: Option<u64>,
    pub rpc_timeout_secs: Option<u64>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub clickhouse: Option<ClickhouseFileConfig>,
    pub chain: Option<ChainFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(ServerFileConfig::default);
            if server.host.is_some() {
                current.host = server.host;
            }
            if server.port.is_some() {
                current.port = server.port;
            }
        }

        if let Some(ch) = other.clickhouse {
            let current = self
                .clickhouse
                .get_or_insert_with(ClickhouseFileConfig::default);
            if ch.url.is_some() {
                current.url = ch.url;
            }
            if ch.username.is_some() {
                current.username = ch.username;
            }
            if ch.password.is_some() {
                current.password = ch.password;
            }
            if ch.database.is_some() {
                current.database = ch.database;
            }
            if ch.timeout_secs.is_some() {
                current.timeout_secs = ch.timeout_secs;
            }
            if ch.compression.is_some() {
                current.compression = ch.compression;
            }
        }

        if let Some(chain) = other.chain {
            let current = self.chain.get_or_insert_with(ChainFileConfig::default);
            if chain.rpc_url.is_some() {
                current.rpc_url = chain.rpc_url;
            }
            if chain.sync_threshold_blocks.is_some() {
                current.sync_threshold_blocks = chain.sync_threshold_blocks;
            }
            if chain.rpc_timeout_secs.is_some() {
                current.rpc_timeout_secs = chain.rpc_timeout_secs;
            }
        }
    }
}

// =============================================================================
// Resolved Config
// =============================================================================

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct ClickhouseConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    pub database: String,
    pub timeout_secs: u64,
    pub compression: bool,
}

#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub sync_threshold_blocks: u64,
    pub rpc_timeout_secs: u64,
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub clickhouse: ClickhouseConfig,
    pub chain: ChainConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.indexer/indexer.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_home(path);
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        Self::resolve(file_config, cli)
    }

    /// Layer defaults, file values and CLI/env overrides, then validate
    fn resolve(file_config: FileConfig, cli: &CliConfig) -> Result<Self> {
        let file_server = file_config.server.unwrap_or_default();
        let file_ch = file_config.clickhouse.unwrap_or_default();
        let file_chain = file_config.chain.unwrap_or_default();

        let server = ServerConfig {
            host: cli
                .host
                .clone()
                .or(file_server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT),
        };

        let clickhouse = ClickhouseConfig {
            url: cli
                .clickhouse_url
                .clone()
                .or(file_ch.url)
                .unwrap_or_default(),
            username: cli
                .clickhouse_username
                .clone()
                .or(file_ch.username)
                .unwrap_or_else(|| DEFAULT_CLICKHOUSE_USERNAME.to_string()),
            password: cli
                .clickhouse_password
                .clone()
                .or(file_ch.password)
                .unwrap_or_default(),
            database: cli
                .clickhouse_database
                .clone()
                .or(file_ch.database)
                .unwrap_or_else(|| DEFAULT_CLICKHOUSE_DATABASE.to_string()),
            timeout_secs: file_ch
                .timeout_secs
                .unwrap_or(DEFAULT_CLICKHOUSE_TIMEOUT_SECS),
            compression: file_ch.compression.unwrap_or(true),
        };

        let chain = ChainConfig {
            rpc_url: cli
                .rpc_url
                .clone()
                .or(file_chain.rpc_url)
                .unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            sync_threshold_blocks: file_chain
                .sync_threshold_blocks
                .unwrap_or(DEFAULT_SYNC_THRESHOLD_BLOCKS),
            rpc_timeout_secs: file_chain
                .rpc_timeout_secs
                .unwrap_or(DEFAULT_RPC_TIMEOUT_SECS),
        };

        let config = Self {
            server,
            clickhouse,
            chain,
        };
        config.validate()?;

        tracing::debug!(
            host = %config.server.host,
            port = config.server.port,
            clickhouse_url = %config.clickhouse.url,
            database = %config.clickhouse.database,
            rpc_url = %config.chain.rpc_url,
            "Configuration resolved"
        );

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }

        // Port 0 would bind a random port
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }

        let url = &self.clickhouse.url;
        if url.is_empty() {
            anyhow::bail!(
                "Configuration error: clickhouse.url is required (set CLICKHOUSE_URL or --clickhouse-url)"
            );
        }
        if !is_http_url(url) {
            anyhow::bail!(
                "Configuration error: clickhouse.url must start with http:// or https:// (got '{}')",
                url
            );
        }

        // Interpolated as a table qualifier, so only identifier characters
        let db = &self.clickhouse.database;
        if db.is_empty() || !db.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            anyhow::bail!(
                "Configuration error: clickhouse.database must be non-empty and contain only [A-Za-z0-9_] (got '{}')",
                db
            );
        }

        if self.clickhouse.timeout_secs == 0 {
            anyhow::bail!("Configuration error: clickhouse.timeout_secs must be greater than 0");
        }

        if !is_http_url(&self.chain.rpc_url) {
            anyhow::bail!(
                "Configuration error: chain.rpc_url must start with http:// or https:// (got '{}')",
                self.chain.rpc_url
            );
        }

        Ok(())
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

/// Get the profile config path (~/.indexer/indexer.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

/// Check if host binds to all network interfaces
pub(crate) fn is_all_interfaces(host: &str) -> bool {
    matches!(host, "0.0.0.0" | "::" | "[::]")
}
