//! Indexer sync status
//!
//! Compares what the indexer has stored against the chain head reported by
//! a JSON-RPC node.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use utoipa::ToSchema;

use crate::core::config::ChainConfig;
use crate::data::error::StoreError;
use crate::data::query::BoundParams;
use crate::data::traits::QueryBackend;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("RPC request failed: {0}")]
    RpcStatus(reqwest::StatusCode),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("RPC transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid block number from RPC: {0}")]
    InvalidBlockNumber(String),
}

/// Sync status payload
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SyncStatus {
    /// Total number of blocks in the database
    pub indexed_blocks: u64,
    /// Most recent block number in the database
    pub latest_indexed_block: Option<u64>,
    /// Latest block number reported by the RPC node
    pub chain_head_block: u64,
    /// Blocks between the chain head and the indexed count
    pub blocks_behind: i64,
    /// Percentage of the chain indexed, two decimals
    pub sync_percentage: f64,
    /// Whether the indexer is within the configured threshold of the head
    pub is_synced: bool,
}

impl SyncStatus {
    pub fn compute(
        indexed_blocks: u64,
        latest_indexed_block: Option<u64>,
        chain_head_block: u64,
        threshold: u64,
    ) -> Self {
        let blocks_behind = chain_head_block as i64 - indexed_blocks as i64;
        let sync_percentage = if chain_head_block > 0 {
            let pct = (indexed_blocks as f64 / chain_head_block as f64 * 100.0).min(100.0);
            (pct * 100.0).round() / 100.0
        } else {
            0.0
        };

        Self {
            indexed_blocks,
            latest_indexed_block,
            chain_head_block,
            blocks_behind,
            sync_percentage,
            is_synced: blocks_behind <= threshold as i64,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    message: String,
}

/// Minimal JSON-RPC client for the chain head
#[derive(Debug, Clone)]
pub struct ChainRpcClient {
    http_client: reqwest::Client,
    rpc_url: String,
}

impl ChainRpcClient {
    pub fn new(config: &ChainConfig) -> Result<Self, SyncError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.rpc_timeout_secs))
            .user_agent(concat!("indexer-api/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            rpc_url: config.rpc_url.clone(),
        })
    }

    /// `eth_blockNumber`
    pub async fn block_number(&self) -> Result<u64, SyncError> {
        let body = json!({
            "jsonrpc": "2.0",
            "method": "eth_blockNumber",
            "params": [],
            "id": 1
        });

        let resp = self.http_client.post(&self.rpc_url).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(SyncError::RpcStatus(resp.status()));
        }

        let rpc: RpcResponse = resp.json().await?;
        if let Some(err) = rpc.error {
            return Err(SyncError::Rpc(err.message));
        }

        parse_hex_quantity(rpc.result.as_deref().unwrap_or_default())
    }
}

/// Parse an Ethereum hex quantity (`0x1a2b`)
fn parse_hex_quantity(value: &str) -> Result<u64, SyncError> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u64::from_str_radix(digits, 16).map_err(|_| SyncError::InvalidBlockNumber(value.to_string()))
}

/// Read the indexed block count and highest block number
pub async fn indexed_block_stats<B>(
    backend: &B,
    database: &str,
) -> Result<(u64, Option<u64>), SyncError>
where
    B: QueryBackend + ?Sized,
{
    let sql = format!(
        "SELECT count() AS total_blocks, max(number) AS latest_block FROM {}.blocks",
        database
    );
    let rows = backend.run_query(&sql, &BoundParams::new()).await?;
    let row = rows.first();

    let total = row
        .and_then(|r| r.get("total_blocks"))
        .and_then(as_u64)
        .unwrap_or(0);
    // max() over an empty table yields 0, not NULL
    let latest = if total == 0 {
        None
    } else {
        row.and_then(|r| r.get("latest_block")).and_then(as_u64)
    };

    Ok((total, latest))
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Full sync status: store stats, then the chain head
pub async fn sync_status<B>(
    backend: &B,
    database: &str,
    rpc: &ChainRpcClient,
    threshold: u64,
) -> Result<SyncStatus, SyncError>
where
    B: QueryBackend + ?Sized,
{
    let (indexed, latest) = indexed_block_stats(backend, database).await?;
    let head = rpc.block_number().await?;

    tracing::debug!(indexed, ?latest, head, "Computed sync status");

    Ok(SyncStatus::compute(indexed, latest, head, threshold))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::traits::Row;
    use async_trait::async_trait;

    struct StatsBackend(Result<Vec<Row>, StoreError>);

    #[async_trait]
    impl QueryBackend for StatsBackend {
        async fn run_query(
            &self,
            sql: &str,
            params: &BoundParams,
        ) -> Result<Vec<Row>, StoreError> {
            assert!(sql.ends_with("FROM indexer.blocks"));
            assert!(params.is_empty());
            self.0.clone()
        }
    }

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_compute_behind() {
        let status = SyncStatus::compute(900, Some(905), 1000, 10);
        assert_eq!(status.blocks_behind, 100);
        assert_eq!(status.sync_percentage, 90.0);
        assert!(!status.is_synced);
    }

    #[test]
    fn test_compute_within_threshold() {
        let status = SyncStatus::compute(995, Some(995), 1000, 10);
        assert_eq!(status.blocks_behind, 5);
        assert!(status.is_synced);
    }

    #[test]
    fn test_compute_ahead_is_capped() {
        let status = SyncStatus::compute(1010, Some(1010), 1000, 10);
        assert_eq!(status.blocks_behind, -10);
        assert_eq!(status.sync_percentage, 100.0);
        assert!(status.is_synced);
    }

    #[test]
    fn test_compute_rounds_two_decimals() {
        let status = SyncStatus::compute(1, Some(1), 3, 10);
        assert_eq!(status.sync_percentage, 33.33);
    }

    #[test]
    fn test_compute_zero_head() {
        let status = SyncStatus::compute(0, None, 0, 10);
        assert_eq!(status.sync_percentage, 0.0);
        assert_eq!(status.blocks_behind, 0);
    }

    #[test]
    fn test_parse_hex_quantity() {
        assert_eq!(parse_hex_quantity("0x1a").unwrap(), 26);
        assert_eq!(parse_hex_quantity("0X10").unwrap(), 16);
        assert!(matches!(
            parse_hex_quantity("0xzz"),
            Err(SyncError::InvalidBlockNumber(_))
        ));
        assert!(parse_hex_quantity("").is_err());
    }

    #[tokio::test]
    async fn test_indexed_block_stats() {
        let backend = StatsBackend(Ok(vec![row(serde_json::json!({
            "total_blocks": "1234",
            "latest_block": 5000
        }))]));
        let (total, latest) = indexed_block_stats(&backend, "indexer").await.unwrap();
        assert_eq!(total, 1234);
        assert_eq!(latest, Some(5000));
    }

    #[tokio::test]
    async fn test_indexed_block_stats_empty_table() {
        let backend = StatsBackend(Ok(vec![row(serde_json::json!({
            "total_blocks": "0",
            "latest_block": 0
        }))]));
        let (total, latest) = indexed_block_stats(&backend, "indexer").await.unwrap();
        assert_eq!(total, 0);
        assert_eq!(latest, None);
    }

    #[tokio::test]
    async fn test_indexed_block_stats_store_error() {
        let backend = StatsBackend(Err(StoreError::Connection("refused".into())));
        let err = indexed_block_stats(&backend, "indexer").await.unwrap_err();
        assert!(matches!(err, SyncError::Store(StoreError::Connection(_))));
        assert_eq!(err.to_string(), "refused");
    }

    #[test]
    fn test_rpc_status_message() {
        let err = SyncError::RpcStatus(reqwest::StatusCode::BAD_GATEWAY);
        assert_eq!(err.to_string(), "RPC request failed: 502 Bad Gateway");
    }
}
