//! DEX trade and token endpoints

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use validator::Validate;

use super::ListApiState;
use crate::api::extractors::ValidatedQuery;
use crate::api::types::{
    ApiError, ErrorResponse, ListResponse, default_limit, default_page, split_list,
    validate_limit, validate_page, validate_timestamp,
};
use crate::data::query::{FilterBag, PageEnvelope};
use crate::data::traits::Row;
use crate::domain::entities::{DEX_TRADES, TOKENS};

pub fn routes(state: ListApiState) -> Router<()> {
    Router::new()
        .route("/dex_trades", get(list_dex_trades))
        .route("/tokens", get(list_tokens))
        .with_state(state)
}

#[derive(Debug, Deserialize, Validate)]
pub struct DexTradesQuery {
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
    pub pool_address: Option<String>,
    pub dex_name: Option<String>,
    /// Comma-separated list of DEX names
    pub dex_names: Option<String>,
    pub transaction_hash: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TokensQuery {
    #[serde(default = "default_page")]
    #[validate(custom(function = "validate_page"))]
    pub page: u32,
    #[serde(default = "default_limit")]
    #[validate(custom(function = "validate_limit"))]
    pub limit: u32,
    pub chain: Option<u64>,
    pub address: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
    #[serde(rename = "type")]
    pub token_type: Option<String>,
    /// Comma-separated list of token types
    pub types: Option<String>,
}

/// List DEX trades
#[utoipa::path(
    get,
    path = "/api/dex_trades",
    tag = "dex",
    params(
        ("page" = Option<u32>, Query, description = "Page number (default 1)"),
        ("limit" = Option<u32>, Query, description = "Items per page (default 10, max 1000)"),
        ("chain" = Option<u64>, Query, description = "Chain ID"),
        ("block_number" = Option<u32>, Query, description = "Exact block number"),
        ("from_block" = Option<u32>, Query, description = "Minimum block number (inclusive)"),
        ("to_block" = Option<u32>, Query, description = "Maximum block number (inclusive)"),
        ("from_timestamp" = Option<String>, Query, description = "Start time (ISO 8601)"),
        ("to_timestamp" = Option<String>, Query, description = "End time (ISO 8601)"),
        ("pool_address" = Option<String>, Query, description = "Pool contract (case-insensitive)"),
        ("dex_name" = Option<String>, Query, description = "Single DEX name"),
        ("dex_names" = Option<String>, Query, description = "Comma-separated DEX names"),
        ("transaction_hash" = Option<String>, Query, description = "Transaction hash")
    ),
    responses(
        (status = 200, description = "DEX trades, newest first", body = ListResponse),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 500, description = "Query or authentication failure", body = ErrorResponse),
        (status = 503, description = "Database unreachable", body = ErrorResponse)
    )
)]
pub async fn list_dex_trades(
    State(state): State<ListApiState>,
    ValidatedQuery(q): ValidatedQuery<DexTradesQuery>,
) -> Result<Json<PageEnvelope<Row>>, ApiError> {
    let filters = FilterBag::new()
        .with("chain", q.chain)
        .with("block_number", q.block_number)
        .with("from_block", q.from_block)
        .with("to_block", q.to_block)
        .with("from_timestamp", q.from_timestamp)
        .with("to_timestamp", q.to_timestamp)
        .with("pool_address", q.pool_address)
        .with("dex_name", q.dex_name)
        .with("dex_names", split_list(q.dex_names.as_deref()))
        .with("transaction_hash", q.transaction_hash);

    state.list(&DEX_TRADES, q.page, q.limit, filters).await
}

/// List tokens
#[utoipa::path(
    get,
    path = "/api/tokens",
    tag = "tokens",
    params(
        ("page" = Option<u32>, Query, description = "Page number (default 1)"),
        ("limit" = Option<u32>, Query, description = "Items per page (default 10, max 1000)"),
        ("chain" = Option<u64>, Query, description = "Chain ID"),
        ("address" = Option<String>, Query, description = "Token contract (case-insensitive)"),
        ("name" = Option<String>, Query, description = "Token name (case-insensitive)"),
        ("symbol" = Option<String>, Query, description = "Token symbol (case-insensitive)"),
        ("type" = Option<String>, Query, description = "Token standard (ERC20, ERC721, ERC1155)"),
        ("types" = Option<String>, Query, description = "Comma-separated token standards")
    ),
    responses(
        (status = 200, description = "Tokens ordered by address", body = ListResponse),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 500, description = "Query or authentication failure", body = ErrorResponse),
        (status = 503, description = "Database unreachable", body = ErrorResponse)
    )
)]
pub async fn list_tokens(
    State(state): State<ListApiState>,
    ValidatedQuery(q): ValidatedQuery<TokensQuery>,
) -> Result<Json<PageEnvelope<Row>>, ApiError> {
    let filters = FilterBag::new()
        .with("chain", q.chain)
        .with("address", q.address)
        .with("name", q.name)
        .with("symbol", q.symbol)
        .with("type", q.token_type)
        .with("types", split_list(q.types.as_deref()));

    state.list(&TOKENS, q.page, q.limit, filters).await
}
