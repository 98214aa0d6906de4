//! Core application

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::ApiServer;
use crate::core::banner;
use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{DEFAULT_LOG_FILTER, ENV_LOG};
use crate::core::shutdown::ShutdownService;
use crate::data::ClickhouseService;
use crate::domain::{ChainRpcClient, entities};

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub clickhouse: Arc<ClickhouseService>,
    pub rpc: ChainRpcClient,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Some(Commands::Start) | None => {}
        }

        let app = Self::init(&cli_config).await?;
        Self::start_server(app).await
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;

        entities::validate_all()
            .map_err(|e| anyhow::anyhow!("Invalid entity filter map: {}", e))?;

        let clickhouse = Arc::new(
            ClickhouseService::new(&config.clickhouse)
                .context("Failed to initialize ClickHouse client")?,
        );

        // The store may still be coming up; requests report failures on their own
        match clickhouse.health_check().await {
            Ok(()) => tracing::debug!("ClickHouse reachable"),
            Err(e) => tracing::warn!(
                url = %config.clickhouse.url,
                error = %e,
                "ClickHouse is not reachable at startup"
            ),
        }

        let rpc = ChainRpcClient::new(&config.chain)
            .map_err(|e| anyhow::anyhow!("Failed to initialize RPC client: {}", e))?;

        Ok(Self {
            shutdown: ShutdownService::new(),
            config,
            clickhouse,
            rpc,
        })
    }

    fn init_logging() {
        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_server(app: Self) -> Result<()> {
        // Install signal handlers FIRST (before any blocking calls)
        app.shutdown.install_signal_handlers();

        app.shutdown
            .register(
                app.clickhouse
                    .start_health_check_task(app.shutdown.subscribe()),
            )
            .await;

        banner::print_banner(
            &app.config.server.host,
            app.config.server.port,
            &app.config.clickhouse.url,
            &app.config.clickhouse.database,
        );

        let server = ApiServer::new(app);
        let app = server.start().await?;
        app.shutdown.shutdown().await;

        Ok(())
    }
}
