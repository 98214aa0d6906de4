// =============================================================================
// Application Identity
// =============================================================================

/// Application name for display
pub const APP_NAME: &str = "Indexer API";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".indexer";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "indexer.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "INDEXER_CONFIG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "INDEXER_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "INDEXER_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "INDEXER_LOG";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 8787;

/// Default log filter when neither INDEXER_LOG nor RUST_LOG is set
pub const DEFAULT_LOG_FILTER: &str = "info,indexer_api_server=info";

// =============================================================================
// ClickHouse
// =============================================================================

pub const ENV_CLICKHOUSE_URL: &str = "CLICKHOUSE_URL";
pub const ENV_CLICKHOUSE_USERNAME: &str = "CLICKHOUSE_USERNAME";
pub const ENV_CLICKHOUSE_PASSWORD: &str = "CLICKHOUSE_PASSWORD";
pub const ENV_CLICKHOUSE_DATABASE: &str = "CLICKHOUSE_DATABASE";

/// Default ClickHouse user
pub const DEFAULT_CLICKHOUSE_USERNAME: &str = "default";

/// Database holding the indexer tables
pub const DEFAULT_CLICKHOUSE_DATABASE: &str = "indexer";

/// Per-query timeout in seconds
pub const DEFAULT_CLICKHOUSE_TIMEOUT_SECS: u64 = 60;

/// Background health check interval in seconds
pub const CLICKHOUSE_HEALTH_CHECK_INTERVAL_SECS: u64 = 30;

// =============================================================================
// Chain RPC
// =============================================================================

/// Environment variable for the chain JSON-RPC endpoint
pub const ENV_RPC_URL: &str = "INDEXER_RPC_URL";

/// Default chain JSON-RPC endpoint
pub const DEFAULT_RPC_URL: &str = "https://rpc1.monad.xyz";

/// Blocks behind the head still reported as synced
pub const DEFAULT_SYNC_THRESHOLD_BLOCKS: u64 = 10;

/// RPC request timeout in seconds
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// Pagination
// =============================================================================

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 1000;

// =============================================================================
// Shutdown
// =============================================================================

/// Maximum time to wait for background tasks during shutdown
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 10;
