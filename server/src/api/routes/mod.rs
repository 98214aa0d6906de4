//! API route handlers
//!
//! - `chain` - blocks, contracts, logs, traces, transactions, withdrawals
//! - `transfers` - ERC-20 / ERC-721 / ERC-1155 transfers
//! - `markets` - DEX trades and tokens
//! - `status` - indexer sync status
//! - `health` - liveness

pub mod chain;
pub mod health;
pub mod markets;
pub mod status;
pub mod transfers;

use std::sync::Arc;

use axum::Json;

use crate::api::types::ApiError;
use crate::data::query::{FilterBag, PageEnvelope, PageRequest, execute};
use crate::data::traits::{QueryBackend, Row};
use crate::domain::EntityDef;

/// Shared state of the entity list routes
#[derive(Clone)]
pub struct ListApiState {
    pub backend: Arc<dyn QueryBackend>,
    /// Database the entity tables live in
    pub database: Arc<str>,
}

impl ListApiState {
    pub fn new(backend: Arc<dyn QueryBackend>, database: impl Into<Arc<str>>) -> Self {
        Self {
            backend,
            database: database.into(),
        }
    }

    /// Run one entity listing
    pub(crate) async fn list(
        &self,
        entity: &EntityDef,
        page: u32,
        limit: u32,
        filters: FilterBag,
    ) -> Result<Json<PageEnvelope<Row>>, ApiError> {
        let table = entity.qualified_table(&self.database);
        let envelope = execute(
            self.backend.as_ref(),
            &entity.list_query(&table),
            PageRequest::new(page, limit),
            &filters,
        )
        .await
        .map_err(|e| {
            tracing::error!(
                entity = entity.name,
                status = e.status,
                code = e.code,
                "List request failed"
            );
            ApiError::from(e)
        })?;

        Ok(Json(envelope))
    }
}
