//! List query executor
//!
//! Runs the two-phase count + page query for one entity listing. Both phases
//! bind the same compiled filter. They are separate statements, so a write
//! landing between them can make `total` disagree slightly with the page;
//! the analytics store offers no cross-statement snapshot to prevent that.

use serde::Serialize;
use utoipa::ToSchema;

use super::classify::ClassifiedError;
use super::filter::{BoundParams, FilterBag, FilterSpec, FilterValue, compile};
use crate::data::traits::{QueryBackend, Row};

/// Static description of one listable table
#[derive(Debug, Clone, Copy)]
pub struct ListQuery<'a> {
    /// Qualified table name (trusted, never from the request)
    pub table: &'a str,
    /// ORDER BY clause (trusted, never from the request)
    pub order_by: &'a str,
    pub filters: &'a [FilterSpec],
}

/// Validated pagination input (`page >= 1`, `limit >= 1`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    /// Rows to skip: `(page - 1) * limit`
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// Pagination metadata in list responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let limit_wide = u64::from(limit.max(1));
        Self {
            page,
            limit,
            total,
            total_pages: total.div_ceil(limit_wide),
            has_next: u64::from(page).saturating_mul(limit_wide) < total,
            has_prev: page > 1,
        }
    }
}

/// Successful list response
#[derive(Debug, Clone, Serialize)]
pub struct PageEnvelope<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PageEnvelope<T> {
    pub fn new(data: Vec<T>, page: PageRequest, total: u64) -> Self {
        Self {
            success: true,
            data,
            pagination: PaginationMeta::new(page.page, page.limit, total),
        }
    }
}

/// Run the count and page queries for one listing.
///
/// The count runs first; if it fails the page query is never issued. No
/// retries are attempted.
pub async fn execute<B>(
    backend: &B,
    query: &ListQuery<'_>,
    page: PageRequest,
    raw: &FilterBag,
) -> Result<PageEnvelope<Row>, ClassifiedError>
where
    B: QueryBackend + ?Sized,
{
    let compiled = compile(raw, query.filters);
    let where_sql = compiled.where_sql();

    let count_sql = format!("SELECT count() AS total FROM {}{}", query.table, where_sql);
    tracing::debug!(
        table = query.table,
        sql = %count_sql,
        params = compiled.params.len(),
        "Running count query"
    );

    let count_rows = backend
        .run_query(&count_sql, &compiled.params)
        .await
        .map_err(|e| {
            tracing::warn!(table = query.table, kind = e.kind(), error = %e, "Count query failed");
            ClassifiedError::from(e)
        })?;
    let total = count_from_rows(&count_rows);

    let page_sql = format!(
        "SELECT * FROM {}{} ORDER BY {} LIMIT {{limit:UInt32}} OFFSET {{offset:UInt64}}",
        query.table, where_sql, query.order_by
    );
    let mut page_params: BoundParams = compiled.params;
    page_params.insert("limit".to_string(), FilterValue::Unsigned(page.limit.into()));
    page_params.insert("offset".to_string(), FilterValue::Unsigned(page.offset()));

    tracing::debug!(
        table = query.table,
        sql = %page_sql,
        page = page.page,
        limit = page.limit,
        "Running page query"
    );

    let rows = backend
        .run_query(&page_sql, &page_params)
        .await
        .map_err(|e| {
            tracing::warn!(table = query.table, kind = e.kind(), error = %e, "Page query failed");
            ClassifiedError::from(e)
        })?;

    Ok(PageEnvelope::new(rows, page, total))
}

/// Read the scalar of a count query, defaulting to 0.
///
/// ClickHouse renders 64-bit integers as JSON strings by default, so both
/// numbers and numeric strings are accepted.
pub fn count_from_rows(rows: &[Row]) -> u64 {
    let Some(row) = rows.first() else {
        return 0;
    };
    let value = row.get("total").or_else(|| row.values().next());
    match value {
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}
