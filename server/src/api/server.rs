//! API server initialization

use std::net::SocketAddr;

use anyhow::Result;
use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use super::middleware;
use super::openapi::{openapi_json, swagger_ui_html};
use super::routes::status::SyncApiState;
use super::routes::{ListApiState, chain, health, markets, status, transfers};
use crate::core::CoreApp;

pub struct ApiServer {
    app: CoreApp,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        Self { app }
    }

    /// Returns CoreApp for graceful shutdown
    pub async fn start(self) -> Result<CoreApp> {
        let Self { app } = self;

        // Clone shutdown before moving app
        let shutdown = app.shutdown.clone();

        let addr = SocketAddr::new(app.config.server.host.parse()?, app.config.server.port);

        let database = app.config.clickhouse.database.as_str();
        let list_state = ListApiState::new(app.clickhouse.clone(), database);
        let sync_state = SyncApiState {
            backend: app.clickhouse.clone(),
            database: database.into(),
            rpc: app.rpc.clone(),
            threshold: app.config.chain.sync_threshold_blocks,
        };

        let router = build_router(list_state, sync_state);

        let listener = TcpListener::bind(addr).await?;
        tracing::debug!(%addr, "HTTP listener bound");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        Ok(app)
    }
}

/// Full application router with middleware applied
pub fn build_router(list_state: ListApiState, sync_state: SyncApiState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health::health))
        .route("/openapi.json", get(openapi_json))
        .merge(chain::routes(list_state.clone()))
        .merge(transfers::routes(list_state.clone()))
        .merge(markets::routes(list_state))
        .merge(status::routes(sync_state));

    Router::new()
        .route("/", get(swagger_ui_html))
        .nest("/api", api_routes)
        .fallback(middleware::handle_404)
        .layer(CompressionLayer::new())
        .layer(middleware::cors())
        .layer(middleware::trace())
}
