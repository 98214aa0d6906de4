//! ClickHouse query service
//!
//! Read-only access to the indexer database over the ClickHouse HTTP
//! interface. The clickhouse crate's `Client` pools connections through
//! HTTP keep-alive, so one service instance is shared by all requests.

pub mod error;
mod repository_impl;

pub use error::ClickhouseError;

use std::sync::Arc;
use std::time::Duration;

use clickhouse::Client;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::core::config::ClickhouseConfig;
use crate::core::constants::CLICKHOUSE_HEALTH_CHECK_INTERVAL_SECS;

/// ClickHouse query service
pub struct ClickhouseService {
    client: Client,
    timeout: Duration,
}

impl ClickhouseService {
    /// Build the client from configuration.
    ///
    /// No connection is made here; the store may legitimately be down at
    /// startup and every request reports that on its own.
    pub fn new(config: &ClickhouseConfig) -> Result<Self, ClickhouseError> {
        if config.url.is_empty() {
            return Err(ClickhouseError::Config("url must not be empty".to_string()));
        }

        let mut client = Client::default()
            .with_url(&config.url)
            .with_database(&config.database)
            .with_user(&config.username)
            .with_password(&config.password);

        if config.compression {
            client = client.with_compression(clickhouse::Compression::Lz4);
        }

        tracing::debug!(
            url = %config.url,
            database = %config.database,
            user = %config.username,
            compression = %config.compression,
            timeout_secs = config.timeout_secs,
            "ClickhouseService initialized"
        );

        Ok(Self {
            client,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Get the ClickHouse client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Health check - verify connection to ClickHouse
    pub async fn health_check(&self) -> Result<(), ClickhouseError> {
        tokio::time::timeout(self.timeout, self.client.query("SELECT 1").execute())
            .await
            .map_err(|_| ClickhouseError::Timeout {
                timeout_secs: self.timeout.as_secs(),
            })?
            .map_err(ClickhouseError::from)
    }

    /// Start periodic health check task
    pub fn start_health_check_task(
        self: &Arc<Self>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(
                CLICKHOUSE_HEALTH_CHECK_INTERVAL_SECS,
            ));
            let mut healthy = true;
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::debug!("ClickHouse health check task shutting down");
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        match service.health_check().await {
                            Ok(()) if !healthy => {
                                tracing::info!("ClickHouse connection restored");
                                healthy = true;
                            }
                            Ok(()) => {}
                            Err(e) => {
                                tracing::warn!(error = %e, "ClickHouse health check failed");
                                healthy = false;
                            }
                        }
                    }
                }
            }
        })
    }
}
