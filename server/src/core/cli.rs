use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{
    ENV_CLICKHOUSE_DATABASE, ENV_CLICKHOUSE_PASSWORD, ENV_CLICKHOUSE_URL,
    ENV_CLICKHOUSE_USERNAME, ENV_CONFIG, ENV_HOST, ENV_PORT, ENV_RPC_URL,
};

#[derive(Parser)]
#[command(name = "indexer-api")]
#[command(version, about = "Read-only HTTP API over the blockchain indexer database", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// ClickHouse HTTP endpoint
    #[arg(long, global = true, env = ENV_CLICKHOUSE_URL)]
    pub clickhouse_url: Option<String>,

    /// ClickHouse user
    #[arg(long, global = true, env = ENV_CLICKHOUSE_USERNAME)]
    pub clickhouse_username: Option<String>,

    /// ClickHouse password
    #[arg(long, global = true, env = ENV_CLICKHOUSE_PASSWORD, hide_env_values = true)]
    pub clickhouse_password: Option<String>,

    /// ClickHouse database holding the indexer tables
    #[arg(long, global = true, env = ENV_CLICKHOUSE_DATABASE)]
    pub clickhouse_database: Option<String>,

    /// Chain JSON-RPC endpoint used for sync status
    #[arg(long, global = true, env = ENV_RPC_URL)]
    pub rpc_url: Option<String>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the server (default command)
    Start,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub clickhouse_url: Option<String>,
    pub clickhouse_username: Option<String>,
    pub clickhouse_password: Option<String>,
    pub clickhouse_database: Option<String>,
    pub rpc_url: Option<String>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        host: cli.host,
        port: cli.port,
        config: cli.config,
        clickhouse_url: cli.clickhouse_url,
        clickhouse_username: cli.clickhouse_username,
        clickhouse_password: cli.clickhouse_password,
        clickhouse_database: cli.clickhouse_database,
        rpc_url: cli.rpc_url,
    };
    (config, cli.command)
}
