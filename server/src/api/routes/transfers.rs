//! Token transfer endpoints

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
use crate::domain::EntityDef;
use crate::domain::entities::{ERC20_TRANSFERS, ERC721_TRANSFERS, ERC1155_TRANSFERS};

pub fn routes(state: ListApiState) -> Router<()> {
    Router::new()
        .route("/transfers/erc20", get(list_erc20_transfers))
        .route("/transfers/erc721", get(list_erc721_transfers))
        .route("/transfers/erc1155", get(list_erc1155_transfers))
        .with_state(state)
}

/// Query parameters shared by all transfer standards
#[derive(Debug, Deserialize, Validate)]
pub struct TransferQuery {
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
    pub token_address: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub transaction_hash: Option<String>,
}

impl TransferQuery {
    fn into_filters(self) -> (u32, u32, FilterBag) {
        let filters = FilterBag::new()
            .with("chain", self.chain)
            .with("block_number", self.block_number)
            .with("from_block", self.from_block)
            .with("to_block", self.to_block)
            .with("from_timestamp", self.from_timestamp)
            .with("to_timestamp", self.to_timestamp)
            .with("token_address", self.token_address)
            .with("from", self.from)
            .with("to", self.to)
            .with("transaction_hash", self.transaction_hash);
        (self.page, self.limit, filters)
    }
}

async fn list_transfers(
    state: &ListApiState,
    entity: &EntityDef,
    query: TransferQuery,
) -> Result<Json<PageEnvelope<Row>>, ApiError> {
    let (page, limit, filters) = query.into_filters();
    state.list(entity, page, limit, filters).await
}

/// List ERC-20 transfers
#[utoipa::path(
    get,
    path = "/api/transfers/erc20",
    tag = "transfers",
    params(
        ("page" = Option<u32>, Query, description = "Page number (default 1)"),
        ("limit" = Option<u32>, Query, description = "Items per page (default 10, max 1000)"),
        ("chain" = Option<u64>, Query, description = "Chain ID"),
        ("block_number" = Option<u32>, Query, description = "Exact block number"),
        ("from_block" = Option<u32>, Query, description = "Minimum block number (inclusive)"),
        ("to_block" = Option<u32>, Query, description = "Maximum block number (inclusive)"),
        ("from_timestamp" = Option<String>, Query, description = "Start time (ISO 8601)"),
        ("to_timestamp" = Option<String>, Query, description = "End time (ISO 8601)"),
        ("token_address" = Option<String>, Query, description = "Token contract (case-insensitive)"),
        ("from" = Option<String>, Query, description = "Sender address (case-insensitive)"),
        ("to" = Option<String>, Query, description = "Recipient address (case-insensitive)"),
        ("transaction_hash" = Option<String>, Query, description = "Transaction hash")
    ),
    responses(
        (status = 200, description = "ERC-20 transfers, newest first", body = ListResponse),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 500, description = "Query or authentication failure", body = ErrorResponse),
        (status = 503, description = "Database unreachable", body = ErrorResponse)
    )
)]
pub async fn list_erc20_transfers(
    State(state): State<ListApiState>,
    ValidatedQuery(q): ValidatedQuery<TransferQuery>,
) -> Result<Json<PageEnvelope<Row>>, ApiError> {
    list_transfers(&state, &ERC20_TRANSFERS, q).await
}

/// List ERC-721 transfers
#[utoipa::path(
    get,
    path = "/api/transfers/erc721",
    tag = "transfers",
    params(
        ("page" = Option<u32>, Query, description = "Page number (default 1)"),
        ("limit" = Option<u32>, Query, description = "Items per page (default 10, max 1000)"),
        ("chain" = Option<u64>, Query, description = "Chain ID"),
        ("block_number" = Option<u32>, Query, description = "Exact block number"),
        ("from_block" = Option<u32>, Query, description = "Minimum block number (inclusive)"),
        ("to_block" = Option<u32>, Query, description = "Maximum block number (inclusive)"),
        ("from_timestamp" = Option<String>, Query, description = "Start time (ISO 8601)"),
        ("to_timestamp" = Option<String>, Query, description = "End time (ISO 8601)"),
        ("token_address" = Option<String>, Query, description = "Collection contract (case-insensitive)"),
        ("from" = Option<String>, Query, description = "Sender address (case-insensitive)"),
        ("to" = Option<String>, Query, description = "Recipient address (case-insensitive)"),
        ("transaction_hash" = Option<String>, Query, description = "Transaction hash")
    ),
    responses(
        (status = 200, description = "ERC-721 transfers, newest first", body = ListResponse),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 500, description = "Query or authentication failure", body = ErrorResponse),
        (status = 503, description = "Database unreachable", body = ErrorResponse)
    )
)]
pub async fn list_erc721_transfers(
    State(state): State<ListApiState>,
    ValidatedQuery(q): ValidatedQuery<TransferQuery>,
) -> Result<Json<PageEnvelope<Row>>, ApiError> {
    list_transfers(&state, &ERC721_TRANSFERS, q).await
}

/// List ERC-1155 transfers
#[utoipa::path(
    get,
    path = "/api/transfers/erc1155",
    tag = "transfers",
    params(
        ("page" = Option<u32>, Query, description = "Page number (default 1)"),
        ("limit" = Option<u32>, Query, description = "Items per page (default 10, max 1000)"),
        ("chain" = Option<u64>, Query, description = "Chain ID"),
        ("block_number" = Option<u32>, Query, description = "Exact block number"),
        ("from_block" = Option<u32>, Query, description = "Minimum block number (inclusive)"),
        ("to_block" = Option<u32>, Query, description = "Maximum block number (inclusive)"),
        ("from_timestamp" = Option<String>, Query, description = "Start time (ISO 8601)"),
        ("to_timestamp" = Option<String>, Query, description = "End time (ISO 8601)"),
        ("token_address" = Option<String>, Query, description = "Token contract (case-insensitive)"),
        ("from" = Option<String>, Query, description = "Sender address (case-insensitive)"),
        ("to" = Option<String>, Query, description = "Recipient address (case-insensitive)"),
        ("transaction_hash" = Option<String>, Query, description = "Transaction hash")
    ),
    responses(
        (status = 200, description = "ERC-1155 transfers, newest first", body = ListResponse),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 500, description = "Query or authentication failure", body = ErrorResponse),
        (status = 503, description = "Database unreachable", body = ErrorResponse)
    )
)]
pub async fn list_erc1155_transfers(
    State(state): State<ListApiState>,
    ValidatedQuery(q): ValidatedQuery<TransferQuery>,
) -> Result<Json<PageEnvelope<Row>>, ApiError> {
    list_transfers(&state, &ERC1155_TRANSFERS, q).await
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
    async fn test_erc20_from_to_filters() {
        let backend = Arc::new(ScriptedBackend::listing(
            1,
            vec![json!({ "from": "0xabc", "to": "0xdef", "value": "1000" })],
        ));
        let (status, body) = get(
            router(backend.clone()),
            "/api/transfers/erc20?from=0xABC&to=0xDEF&token_address=0x1",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["value"], "1000");
        assert_eq!(body["pagination"]["total"], 1);

        let (sql, params) = &backend.calls()[0];
        assert_eq!(
            sql,
            "SELECT count() AS total FROM indexer.erc20_transfers WHERE lower(token_address) = lower({token_address:String}) AND lower(`from`) = lower({from_address:String}) AND lower(`to`) = lower({to_address:String})"
        );
        assert_eq!(params["from_address"], FilterValue::Text("0xABC".into()));
        assert_eq!(params["to_address"], FilterValue::Text("0xDEF".into()));
    }

    #[tokio::test]
    async fn test_each_standard_reads_its_table() {
        for (uri, table) in [
            ("/api/transfers/erc20", "indexer.erc20_transfers"),
            ("/api/transfers/erc721", "indexer.erc721_transfers"),
            ("/api/transfers/erc1155", "indexer.erc1155_transfers"),
        ] {
            let backend = Arc::new(ScriptedBackend::listing(0, vec![]));
            let (status, _) = get(router(backend.clone()), uri).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(
                backend.calls()[0].0,
                format!("SELECT count() AS total FROM {}", table)
            );
        }
    }

    #[tokio::test]
    async fn test_erc721_auth_failure() {
        let backend = Arc::new(ScriptedBackend::new(vec![Err(StoreError::Authentication(
            "Code: 516. Authentication failed".into(),
        ))]));
        let (status, body) = get(router(backend), "/api/transfers/erc721").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "DB_AUTH_ERROR");
        assert_eq!(body["error"], "Database authentication failed");
    }

    #[tokio::test]
    async fn test_erc1155_block_range() {
        let backend = Arc::new(ScriptedBackend::listing(0, vec![]));
        let (status, _) = get(
            router(backend.clone()),
            "/api/transfers/erc1155?from_block=10&to_block=20&page=3",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let (sql, params) = &backend.calls()[1];
        assert!(sql.contains(
            "WHERE block_number >= {from_block:UInt32} AND block_number <= {to_block:UInt32}"
        ));
        assert_eq!(params["offset"], FilterValue::Unsigned(20));
    }
}
