//! OpenAPI specification and Swagger UI

use axum::http::header;
use axum::response::{Html, IntoResponse, Json};
use utoipa::OpenApi;

use crate::api::routes::{chain, health, markets, status, transfers};
use crate::api::types::{ErrorResponse, ListResponse};
use crate::data::query::PaginationMeta;
use crate::domain::SyncStatus;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Indexer API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Read-only query API over indexed blockchain data"
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "status", description = "Indexer sync status"),
        (name = "blocks", description = "Blocks"),
        (name = "contracts", description = "Contract deployments"),
        (name = "logs", description = "Event logs"),
        (name = "traces", description = "Execution traces"),
        (name = "transactions", description = "Transactions"),
        (name = "withdrawals", description = "Beacon chain withdrawals"),
        (name = "transfers", description = "ERC-20, ERC-721 and ERC-1155 transfers"),
        (name = "dex", description = "DEX trades"),
        (name = "tokens", description = "Token metadata")
    ),
    paths(
        // Health
        health::health,
        // Status
        status::get_sync_status,
        // Chain data
        chain::list_blocks,
        chain::list_contracts,
        chain::list_logs,
        chain::list_traces,
        chain::list_transactions,
        chain::list_withdrawals,
        // Transfers
        transfers::list_erc20_transfers,
        transfers::list_erc721_transfers,
        transfers::list_erc1155_transfers,
        // Markets
        markets::list_dex_trades,
        markets::list_tokens,
    ),
    components(schemas(
        PaginationMeta,
        ErrorResponse,
        ListResponse,
        health::HealthResponse,
        SyncStatus,
        status::SyncStatusResponse,
    ))
)]
pub struct ApiDoc;

/// Serve OpenAPI JSON specification
pub async fn openapi_json() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        Json(ApiDoc::openapi()),
    )
}

/// Serve Swagger UI from CDN
pub async fn swagger_ui_html() -> Html<&'static str> {
    Html(SWAGGER_UI_HTML)
}

const SWAGGER_UI_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Indexer API Documentation</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        html { box-sizing: border-box; overflow-y: scroll; }
        *, *:before, *:after { box-sizing: inherit; }
        body { margin: 0; background: #fafafa; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = () => {
            window.ui = SwaggerUIBundle({
                url: "/api/openapi.json",
                dom_id: '#swagger-ui',
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout",
                deepLinking: true,
                showExtensions: true,
                showCommonExtensions: true
            });
        };
    </script>
</body>
</html>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for path in [
            "/api/health",
            "/api/status/sync",
            "/api/blocks",
            "/api/contracts",
            "/api/logs",
            "/api/traces",
            "/api/transactions",
            "/api/withdrawals",
            "/api/transfers/erc20",
            "/api/transfers/erc721",
            "/api/transfers/erc1155",
            "/api/dex_trades",
            "/api/tokens",
        ] {
            assert!(paths.contains(&path), "missing {}", path);
        }
    }

    #[test]
    fn test_openapi_schemas() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().unwrap().schemas;
        assert!(schemas.contains_key("PaginationMeta"));
        assert!(schemas.contains_key("ErrorResponse"));
        assert!(schemas.contains_key("SyncStatus"));
    }
}
