//! Indexer sync status endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::types::{ApiError, ErrorResponse};
use crate::data::traits::QueryBackend;
use crate::domain::sync::{self, ChainRpcClient, SyncStatus};

#[derive(Clone)]
pub struct SyncApiState {
    pub backend: Arc<dyn QueryBackend>,
    pub database: Arc<str>,
    pub rpc: ChainRpcClient,
    /// Max blocks behind the head still reported as synced
    pub threshold: u64,
}

pub fn routes(state: SyncApiState) -> Router<()> {
    Router::new()
        .route("/status/sync", get(get_sync_status))
        .with_state(state)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SyncStatusResponse {
    pub success: bool,
    pub data: SyncStatus,
}

/// Compare indexed blocks with the chain head
#[utoipa::path(
    get,
    path = "/api/status/sync",
    tag = "status",
    responses(
        (status = 200, description = "Current sync status", body = SyncStatusResponse),
        (status = 500, description = "Store or RPC failure", body = ErrorResponse)
    )
)]
pub async fn get_sync_status(
    State(state): State<SyncApiState>,
) -> Result<Json<SyncStatusResponse>, ApiError> {
    let status = sync::sync_status(
        state.backend.as_ref(),
        &state.database,
        &state.rpc,
        state.threshold,
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to get sync status");
        ApiError::internal("Failed to get sync status", "SYNC_STATUS_ERROR", e.to_string())
    })?;

    Ok(Json(SyncStatusResponse {
        success: true,
        data: status,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::routing::post;
    use serde_json::json;

    use super::*;
    use crate::api::routes::test_support::{ScriptedBackend, get, row};
    use crate::core::config::ChainConfig;
    use crate::data::error::StoreError;

    fn rpc(url: &str) -> ChainRpcClient {
        ChainRpcClient::new(&ChainConfig {
            rpc_url: url.to_string(),
            sync_threshold_blocks: 10,
            rpc_timeout_secs: 2,
        })
        .unwrap()
    }

    fn router(backend: ScriptedBackend, rpc: ChainRpcClient) -> Router {
        Router::new().nest(
            "/api",
            routes(SyncApiState {
                backend: Arc::new(backend),
                database: "indexer".into(),
                rpc,
                threshold: 10,
            }),
        )
    }

    /// Local JSON-RPC node answering `eth_blockNumber` with a fixed result
    async fn spawn_rpc(result: serde_json::Value) -> String {
        let app = Router::new().route(
            "/",
            post(move || {
                let result = result.clone();
                async move { Json(json!({ "jsonrpc": "2.0", "id": 1, "result": result })) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn test_sync_status_success() {
        let url = spawn_rpc(json!("0x64")).await;
        let backend = ScriptedBackend::new(vec![Ok(vec![row(json!({
            "total_blocks": "95",
            "latest_block": "99"
        }))])]);

        let (status, body) = get(router(backend, rpc(&url)), "/api/status/sync").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "success": true,
                "data": {
                    "indexed_blocks": 95,
                    "latest_indexed_block": 99,
                    "chain_head_block": 100,
                    "blocks_behind": 5,
                    "sync_percentage": 95.0,
                    "is_synced": true
                }
            })
        );
    }

    #[tokio::test]
    async fn test_sync_status_store_failure() {
        let backend = ScriptedBackend::new(vec![Err(StoreError::Connection(
            "connection refused".into(),
        ))]);
        // Never contacted: the store is queried first
        let (status, body) = get(
            router(backend, rpc("http://127.0.0.1:9/")),
            "/api/status/sync",
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({
                "success": false,
                "error": "Failed to get sync status",
                "code": "SYNC_STATUS_ERROR",
                "message": "connection refused"
            })
        );
    }

    #[tokio::test]
    async fn test_sync_status_bad_rpc_result() {
        let url = spawn_rpc(json!("latest")).await;
        let backend = ScriptedBackend::new(vec![Ok(vec![row(json!({
            "total_blocks": 0,
            "latest_block": 0
        }))])]);

        let (status, body) = get(router(backend, rpc(&url)), "/api/status/sync").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "SYNC_STATUS_ERROR");
        assert_eq!(body["message"], "Invalid block number from RPC: latest");
    }
}
