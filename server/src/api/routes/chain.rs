//! Core chain data endpoints

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use validator::Validate;

use super::ListApiState;
use crate::api::extractors::ValidatedQuery;
use crate::api::types::{
    ApiError, ErrorResponse, ListResponse, default_limit, default_page, validate_limit,
    validate_page, validate_timestamp,
};
use crate::data::query::{FilterBag, PageEnvelope};
use crate::data::traits::Row;
use crate::domain::entities::{BLOCKS, CONTRACTS, LOGS, TRACES, TRANSACTIONS, WITHDRAWALS};

// ============================================================================
// Routes
// ============================================================================

pub fn routes(state: ListApiState) -> Router<()> {
    Router::new()
        .route("/blocks", get(list_blocks))
        .route("/contracts", get(list_contracts))
        .route("/logs", get(list_logs))
        .route("/traces", get(list_traces))
        .route("/transactions", get(list_transactions))
        .route("/withdrawals", get(list_withdrawals))
        .with_state(state)
}

// ============================================================================
// Query DTOs
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct BlocksQuery {
    #[serde(default = "default_page")]
    #[validate(custom(function = "validate_page"))]
    pub page: u32,
    #[serde(default = "default_limit")]
    #[validate(custom(function = "validate_limit"))]
    pub limit: u32,
    pub chain: Option<u64>,
    pub block_number: Option<u32>,
    pub from_block: Option<u32>,
    pub to_block: Option<u32>,
    #[validate(custom(function = "validate_timestamp"))]
    pub from_timestamp: Option<String>,
    #[validate(custom(function = "validate_timestamp"))]
    pub to_timestamp: Option<String>,
    pub miner: Option<String>,
    pub hash: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ContractsQuery {
    #[serde(default = "default_page")]
    #[validate(custom(function = "validate_page"))]
    pub page: u32,
    #[serde(default = "default_limit")]
    #[validate(custom(function = "validate_limit"))]
    pub limit: u32,
    pub chain: Option<u64>,
    pub block_number: Option<u32>,
    pub from_block: Option<u32>,
    pub to_block: Option<u32>,
    pub contract_address: Option<String>,
    pub creator: Option<String>,
    pub transaction_hash: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LogsQuery {
    #[serde(default = "default_page")]
    #[validate(custom(function = "validate_page"))]
    pub page: u32,
    #[serde(default = "default_limit")]
    #[validate(custom(function = "validate_limit"))]
    pub limit: u32,
    pub chain: Option<u64>,
    pub block_number: Option<u32>,
    pub from_block: Option<u32>,
    pub to_block: Option<u32>,
    #[validate(custom(function = "validate_timestamp"))]
    pub from_timestamp: Option<String>,
    #[validate(custom(function = "validate_timestamp"))]
    pub to_timestamp: Option<String>,
    pub address: Option<String>,
    pub topic0: Option<String>,
    pub transaction_hash: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TracesQuery {
    #[serde(default = "default_page")]
    #[validate(custom(function = "validate_page"))]
    pub page: u32,
    #[serde(default = "default_limit")]
    #[validate(custom(function = "validate_limit"))]
    pub limit: u32,
    pub chain: Option<u64>,
    pub block_number: Option<u32>,
    pub from_block: Option<u32>,
    pub to_block: Option<u32>,
    pub transaction_hash: Option<String>,
    pub action_type: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TransactionsQuery {
    #[serde(default = "default_page")]
    #[validate(custom(function = "validate_page"))]
    pub page: u32,
    #[serde(default = "default_limit")]
    #[validate(custom(function = "validate_limit"))]
    pub limit: u32,
    pub chain: Option<u64>,
    pub block_number: Option<u32>,
    pub from_block: Option<u32>,
    pub to_block: Option<u32>,
    #[validate(custom(function = "validate_timestamp"))]
    pub from_timestamp: Option<String>,
    #[validate(custom(function = "validate_timestamp"))]
    pub to_timestamp: Option<String>,
    pub hash: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub method: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct WithdrawalsQuery {
    #[serde(default = "default_page")]
    #[validate(custom(function = "validate_page"))]
    pub page: u32,
    #[serde(default = "default_limit")]
    #[validate(custom(function = "validate_limit"))]
    pub limit: u32,
    pub chain: Option<u64>,
    pub block_number: Option<u32>,
    pub from_block: Option<u32>,
    pub to_block: Option<u32>,
    #[validate(custom(function = "validate_timestamp"))]
    pub from_timestamp: Option<String>,
    #[validate(custom(function = "validate_timestamp"))]
    pub to_timestamp: Option<String>,
    pub address: Option<String>,
    pub validator_index: Option<u64>,
}

// ============================================================================
// Handlers
// ============================================================================

/// List blocks
#[utoipa::path(
    get,
    path = "/api/blocks",
    tag = "blocks",
    params(
        ("page" = Option<u32>, Query, description = "Page number (default 1)"),
        ("limit" = Option<u32>, Query, description = "Items per page (default 10, max 1000)"),
        ("chain" = Option<u64>, Query, description = "Chain ID"),
        ("block_number" = Option<u32>, Query, description = "Exact block number"),
        ("from_block" = Option<u32>, Query, description = "Minimum block number (inclusive)"),
        ("to_block" = Option<u32>, Query, description = "Maximum block number (inclusive)"),
        ("from_timestamp" = Option<String>, Query, description = "Start time (ISO 8601)"),
        ("to_timestamp" = Option<String>, Query, description = "End time (ISO 8601)"),
        ("miner" = Option<String>, Query, description = "Miner address (case-insensitive)"),
        ("hash" = Option<String>, Query, description = "Block hash")
    ),
    responses(
        (status = 200, description = "Blocks, newest first", body = ListResponse),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 500, description = "Query or authentication failure", body = ErrorResponse),
        (status = 503, description = "Database unreachable", body = ErrorResponse)
    )
)]
pub async fn list_blocks(
    State(state): State<ListApiState>,
    ValidatedQuery(q): ValidatedQuery<BlocksQuery>,
) -> Result<Json<PageEnvelope<Row>>, ApiError> {
    let filters = FilterBag::new()
        .with("chain", q.chain)
        .with("block_number", q.block_number)
        .with("from_block", q.from_block)
        .with("to_block", q.to_block)
        .with("from_timestamp", q.from_timestamp)
        .with("to_timestamp", q.to_timestamp)
        .with("miner", q.miner)
        .with("hash", q.hash);

    state.list(&BLOCKS, q.page, q.limit, filters).await
}

/// List contract deployments
#[utoipa::path(
    get,
    path = "/api/contracts",
    tag = "contracts",
    params(
        ("page" = Option<u32>, Query, description = "Page number (default 1)"),
        ("limit" = Option<u32>, Query, description = "Items per page (default 10, max 1000)"),
        ("chain" = Option<u64>, Query, description = "Chain ID"),
        ("block_number" = Option<u32>, Query, description = "Exact block number"),
        ("from_block" = Option<u32>, Query, description = "Minimum block number (inclusive)"),
        ("to_block" = Option<u32>, Query, description = "Maximum block number (inclusive)"),
        ("contract_address" = Option<String>, Query, description = "Contract address (case-insensitive)"),
        ("creator" = Option<String>, Query, description = "Deployer address (case-insensitive)"),
        ("transaction_hash" = Option<String>, Query, description = "Deployment transaction hash")
    ),
    responses(
        (status = 200, description = "Contracts, newest block first", body = ListResponse),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 500, description = "Query or authentication failure", body = ErrorResponse),
        (status = 503, description = "Database unreachable", body = ErrorResponse)
    )
)]
pub async fn list_contracts(
    State(state): State<ListApiState>,
    ValidatedQuery(q): ValidatedQuery<ContractsQuery>,
) -> Result<Json<PageEnvelope<Row>>, ApiError> {
    let filters = FilterBag::new()
        .with("chain", q.chain)
        .with("block_number", q.block_number)
        .with("from_block", q.from_block)
        .with("to_block", q.to_block)
        .with("contract_address", q.contract_address)
        .with("creator", q.creator)
        .with("transaction_hash", q.transaction_hash);

    state.list(&CONTRACTS, q.page, q.limit, filters).await
}

/// List event logs
#[utoipa::path(
    get,
    path = "/api/logs",
    tag = "logs",
    params(
        ("page" = Option<u32>, Query, description = "Page number (default 1)"),
        ("limit" = Option<u32>, Query, description = "Items per page (default 10, max 1000)"),
        ("chain" = Option<u64>, Query, description = "Chain ID"),
        ("block_number" = Option<u32>, Query, description = "Exact block number"),
        ("from_block" = Option<u32>, Query, description = "Minimum block number (inclusive)"),
        ("to_block" = Option<u32>, Query, description = "Maximum block number (inclusive)"),
        ("from_timestamp" = Option<String>, Query, description = "Start time (ISO 8601)"),
        ("to_timestamp" = Option<String>, Query, description = "End time (ISO 8601)"),
        ("address" = Option<String>, Query, description = "Emitting contract (case-insensitive)"),
        ("topic0" = Option<String>, Query, description = "Event signature topic (case-insensitive)"),
        ("transaction_hash" = Option<String>, Query, description = "Transaction hash")
    ),
    responses(
        (status = 200, description = "Logs, newest first", body = ListResponse),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 500, description = "Query or authentication failure", body = ErrorResponse),
        (status = 503, description = "Database unreachable", body = ErrorResponse)
    )
)]
pub async fn list_logs(
    State(state): State<ListApiState>,
    ValidatedQuery(q): ValidatedQuery<LogsQuery>,
) -> Result<Json<PageEnvelope<Row>>, ApiError> {
    let filters = FilterBag::new()
        .with("chain", q.chain)
        .with("block_number", q.block_number)
        .with("from_block", q.from_block)
        .with("to_block", q.to_block)
        .with("from_timestamp", q.from_timestamp)
        .with("to_timestamp", q.to_timestamp)
        .with("address", q.address)
        .with("topic0", q.topic0)
        .with("transaction_hash", q.transaction_hash);

    state.list(&LOGS, q.page, q.limit, filters).await
}

/// List execution traces
#[utoipa::path(
    get,
    path = "/api/traces",
    tag = "traces",
    params(
        ("page" = Option<u32>, Query, description = "Page number (default 1)"),
        ("limit" = Option<u32>, Query, description = "Items per page (default 10, max 1000)"),
        ("chain" = Option<u64>, Query, description = "Chain ID"),
        ("block_number" = Option<u32>, Query, description = "Exact block number"),
        ("from_block" = Option<u32>, Query, description = "Minimum block number (inclusive)"),
        ("to_block" = Option<u32>, Query, description = "Maximum block number (inclusive)"),
        ("transaction_hash" = Option<String>, Query, description = "Transaction hash"),
        ("action_type" = Option<String>, Query, description = "Trace action type (call, create, ...)"),
        ("from" = Option<String>, Query, description = "Sender address (case-insensitive)"),
        ("to" = Option<String>, Query, description = "Recipient address (case-insensitive)")
    ),
    responses(
        (status = 200, description = "Traces, newest block first", body = ListResponse),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 500, description = "Query or authentication failure", body = ErrorResponse),
        (status = 503, description = "Database unreachable", body = ErrorResponse)
    )
)]
pub async fn list_traces(
    State(state): State<ListApiState>,
    ValidatedQuery(q): ValidatedQuery<TracesQuery>,
) -> Result<Json<PageEnvelope<Row>>, ApiError> {
    let filters = FilterBag::new()
        .with("chain", q.chain)
        .with("block_number", q.block_number)
        .with("from_block", q.from_block)
        .with("to_block", q.to_block)
        .with("transaction_hash", q.transaction_hash)
        .with("action_type", q.action_type)
        .with("from", q.from)
        .with("to", q.to);

    state.list(&TRACES, q.page, q.limit, filters).await
}

/// List transactions
#[utoipa::path(
    get,
    path = "/api/transactions",
    tag = "transactions",
    params(
        ("page" = Option<u32>, Query, description = "Page number (default 1)"),
        ("limit" = Option<u32>, Query, description = "Items per page (default 10, max 1000)"),
        ("chain" = Option<u64>, Query, description = "Chain ID"),
        ("block_number" = Option<u32>, Query, description = "Exact block number"),
        ("from_block" = Option<u32>, Query, description = "Minimum block number (inclusive)"),
        ("to_block" = Option<u32>, Query, description = "Maximum block number (inclusive)"),
        ("from_timestamp" = Option<String>, Query, description = "Start time (ISO 8601)"),
        ("to_timestamp" = Option<String>, Query, description = "End time (ISO 8601)"),
        ("hash" = Option<String>, Query, description = "Transaction hash"),
        ("from" = Option<String>, Query, description = "Sender address (case-insensitive)"),
        ("to" = Option<String>, Query, description = "Recipient address (case-insensitive)"),
        ("method" = Option<String>, Query, description = "Method selector or name")
    ),
    responses(
        (status = 200, description = "Transactions, newest first", body = ListResponse),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 500, description = "Query or authentication failure", body = ErrorResponse),
        (status = 503, description = "Database unreachable", body = ErrorResponse)
    )
)]
pub async fn list_transactions(
    State(state): State<ListApiState>,
    ValidatedQuery(q): ValidatedQuery<TransactionsQuery>,
) -> Result<Json<PageEnvelope<Row>>, ApiError> {
    let filters = FilterBag::new()
        .with("chain", q.chain)
        .with("block_number", q.block_number)
        .with("from_block", q.from_block)
        .with("to_block", q.to_block)
        .with("from_timestamp", q.from_timestamp)
        .with("to_timestamp", q.to_timestamp)
        .with("hash", q.hash)
        .with("from", q.from)
        .with("to", q.to)
        .with("method", q.method);

    state.list(&TRANSACTIONS, q.page, q.limit, filters).await
}

/// List beacon withdrawals
#[utoipa::path(
    get,
    path = "/api/withdrawals",
    tag = "withdrawals",
    params(
        ("page" = Option<u32>, Query, description = "Page number (default 1)"),
        ("limit" = Option<u32>, Query, description = "Items per page (default 10, max 1000)"),
        ("chain" = Option<u64>, Query, description = "Chain ID"),
        ("block_number" = Option<u32>, Query, description = "Exact block number"),
        ("from_block" = Option<u32>, Query, description = "Minimum block number (inclusive)"),
        ("to_block" = Option<u32>, Query, description = "Maximum block number (inclusive)"),
        ("from_timestamp" = Option<String>, Query, description = "Start time (ISO 8601)"),
        ("to_timestamp" = Option<String>, Query, description = "End time (ISO 8601)"),
        ("address" = Option<String>, Query, description = "Recipient address (case-insensitive)"),
        ("validator_index" = Option<u64>, Query, description = "Validator index")
    ),
    responses(
        (status = 200, description = "Withdrawals, newest first", body = ListResponse),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 500, description = "Query or authentication failure", body = ErrorResponse),
        (status = 503, description = "Database unreachable", body = ErrorResponse)
    )
)]
pub async fn list_withdrawals(
    State(state): State<ListApiState>,
    ValidatedQuery(q): ValidatedQuery<WithdrawalsQuery>,
) -> Result<Json<PageEnvelope<Row>>, ApiError> {
    let filters = FilterBag::new()
        .with("chain", q.chain)
        .with("block_number", q.block_number)
        .with("from_block", q.from_block)
        .with("to_block", q.to_block)
        .with("from_timestamp", q.from_timestamp)
        .with("to_timestamp", q.to_timestamp)
        .with("address", q.address)
        .with("validator_index", q.validator_index);

    state.list(&WITHDRAWALS, q.page, q.limit, filters).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::api::routes::test_support::{ScriptedBackend, get};
    use crate::data::error::StoreError;
    use crate::data::query::FilterValue;

    fn router(backend: Arc<ScriptedBackend>) -> Router {
        Router::new().nest("/api", routes(ListApiState::new(backend, "indexer")))
    }

    #[tokio::test]
    async fn test_list_blocks_with_chain_filter() {
        let backend = Arc::new(ScriptedBackend::listing(
            57,
            vec![json!({ "number": 100, "hash": "0xaa" })],
        ));
        let (status, body) = get(
            router(backend.clone()),
            "/api/blocks?chain=10143&page=2&limit=25",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"][0]["hash"], "0xaa");
        assert_eq!(
            body["pagination"],
            json!({
                "page": 2, "limit": 25, "total": 57,
                "total_pages": 3, "has_next": true, "has_prev": true
            })
        );

        let calls = backend.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0].0,
            "SELECT count() AS total FROM indexer.blocks WHERE chain = {chain:UInt64}"
        );
        assert_eq!(
            calls[1].0,
            "SELECT * FROM indexer.blocks WHERE chain = {chain:UInt64} ORDER BY timestamp DESC LIMIT {limit:UInt32} OFFSET {offset:UInt64}"
        );
        assert_eq!(calls[1].1["chain"], FilterValue::Unsigned(10143));
        assert_eq!(calls[1].1["limit"], FilterValue::Unsigned(25));
        assert_eq!(calls[1].1["offset"], FilterValue::Unsigned(25));
    }

    #[tokio::test]
    async fn test_list_blocks_defaults() {
        let backend = Arc::new(ScriptedBackend::listing(0, vec![]));
        let (status, body) = get(router(backend.clone()), "/api/blocks").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([]));
        assert_eq!(body["pagination"]["page"], 1);
        assert_eq!(body["pagination"]["limit"], 10);
        assert_eq!(body["pagination"]["total_pages"], 0);

        let calls = backend.calls();
        assert_eq!(calls[0].0, "SELECT count() AS total FROM indexer.blocks");
        assert_eq!(calls[1].1["offset"], FilterValue::Unsigned(0));
    }

    #[tokio::test]
    async fn test_list_blocks_rejects_limit_over_max() {
        let backend = Arc::new(ScriptedBackend::default());
        let (status, body) = get(router(backend.clone()), "/api/blocks?limit=5000").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_list_blocks_rejects_page_zero() {
        let backend = Arc::new(ScriptedBackend::default());
        let (status, body) = get(router(backend), "/api/blocks?page=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_list_blocks_rejects_non_numeric_chain() {
        let backend = Arc::new(ScriptedBackend::default());
        let (status, body) = get(router(backend), "/api/blocks?chain=monad").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "QUERY_PARSE_ERROR");
    }

    #[tokio::test]
    async fn test_list_blocks_rejects_bad_timestamp() {
        let backend = Arc::new(ScriptedBackend::default());
        let (status, body) = get(router(backend), "/api/blocks?from_timestamp=last-week").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_list_blocks_rejects_nonexistent_date() {
        let backend = Arc::new(ScriptedBackend::default());
        let (status, body) = get(
            router(backend.clone()),
            "/api/blocks?from_timestamp=2024-02-30T10:30:00Z",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_list_transactions_time_range_normalized() {
        let backend = Arc::new(ScriptedBackend::listing(1, vec![json!({ "hash": "0x1" })]));
        let (status, _) = get(
            router(backend.clone()),
            "/api/transactions?from_timestamp=2024-01-01T00:00:00Z&to_timestamp=2024-01-02T00:00:00.500Z",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let (sql, params) = &backend.calls()[0];
        assert_eq!(
            sql,
            "SELECT count() AS total FROM indexer.transactions WHERE timestamp >= {from_timestamp:DateTime} AND timestamp <= {to_timestamp:DateTime}"
        );
        assert_eq!(
            params["from_timestamp"],
            FilterValue::Text("2024-01-01 00:00:00".into())
        );
        assert_eq!(
            params["to_timestamp"],
            FilterValue::Text("2024-01-02 00:00:00".into())
        );
    }

    #[tokio::test]
    async fn test_list_traces_orders_by_block() {
        let backend = Arc::new(ScriptedBackend::listing(0, vec![]));
        let (status, _) = get(router(backend.clone()), "/api/traces?from=0xABC").await;

        assert_eq!(status, StatusCode::OK);
        let (sql, params) = &backend.calls()[1];
        assert!(sql.contains("WHERE lower(`from`) = lower({from_address:String})"));
        assert!(sql.contains("ORDER BY block_number DESC"));
        assert_eq!(params["from_address"], FilterValue::Text("0xABC".into()));
    }

    #[tokio::test]
    async fn test_list_withdrawals_connection_failure() {
        let backend = Arc::new(ScriptedBackend::new(vec![Err(StoreError::Connection(
            "connect ECONNREFUSED 127.0.0.1:8123".into(),
        ))]));
        let (status, body) = get(router(backend.clone()), "/api/withdrawals").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body,
            json!({
                "success": false,
                "error": "Database connection failed",
                "code": "DB_CONNECTION_ERROR",
                "message": "Unable to connect to the database. Please try again later."
            })
        );
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_list_contracts_query_failure_echoes_message() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Ok(vec![]),
            Err(StoreError::Query("Code: 60. Table indexer.contracts does not exist".into())),
        ]));
        let (status, body) = get(router(backend), "/api/contracts?creator=0xdead").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "DB_QUERY_ERROR");
        assert_eq!(body["error"], "Failed to fetch data");
        assert_eq!(
            body["message"],
            "Code: 60. Table indexer.contracts does not exist"
        );
    }

    #[tokio::test]
    async fn test_empty_filter_value_is_ignored() {
        let backend = Arc::new(ScriptedBackend::listing(0, vec![]));
        let (status, _) = get(router(backend.clone()), "/api/logs?address=&topic0=").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            backend.calls()[0].0,
            "SELECT count() AS total FROM indexer.logs"
        );
    }
}
