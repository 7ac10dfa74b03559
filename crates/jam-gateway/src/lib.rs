//! # jam-gateway
//!
//! Thin async client over a PostgREST-style table protocol.
//!
//! The remote store exposes every relation as `{base}/{table}` with
//! filter-driven reads and writes. This crate provides:
//! - [`TableBackend`] — the protocol seam the service layer is written
//!   against, so tests can substitute an in-memory double
//! - [`TableClient`] — the HTTP implementation
//! - [`Filter`] / [`SelectOptions`] — query construction
//! - [`Diagnostic`] — classification of remote error payloads, which the
//!   schema-negotiating writer reacts to
//!
//! The gateway never retries by itself; negotiation and per-item recovery
//! live in the service layer above it.

mod client;
mod diagnostic;
mod error;
mod filter;
mod http;

pub use client::TableClient;
pub use diagnostic::Diagnostic;
pub use error::GatewayError;
pub use filter::{Filter, FilterOp, OrderDir, SelectOptions};

use async_trait::async_trait;

/// A decoded row: column name → JSON value.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Table-protocol operations the service layer depends on.
///
/// Implemented by [`TableClient`] over HTTP and by the in-memory double in
/// `jam-store`'s test support. All writes return the written rows
/// (`return=representation` semantics).
#[async_trait]
pub trait TableBackend: Send + Sync {
    /// Select rows matching all `filters`.
    async fn select(
        &self,
        table: &str,
        filters: &[Filter],
        opts: &SelectOptions,
    ) -> Result<Vec<Row>, GatewayError>;

    /// Insert a single row, returning the stored representation.
    async fn insert(&self, table: &str, row: &Row) -> Result<Row, GatewayError>;

    /// Insert a batch of rows.
    async fn insert_many(&self, table: &str, rows: &[Row]) -> Result<Vec<Row>, GatewayError>;

    /// Insert-or-merge on the `on_conflict` column.
    async fn upsert(&self, table: &str, row: &Row, on_conflict: &str) -> Result<Row, GatewayError>;

    /// Patch all rows matching `filters`, returning the affected rows.
    async fn patch(
        &self,
        table: &str,
        filters: &[Filter],
        patch: &Row,
    ) -> Result<Vec<Row>, GatewayError>;

    /// Delete all rows matching `filters`, returning the deleted rows.
    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>, GatewayError>;
}

/// Convenience: select at most one row.
///
/// # Errors
///
/// Propagates any [`GatewayError`] from the underlying select.
pub async fn select_one(
    backend: &dyn TableBackend,
    table: &str,
    filters: &[Filter],
) -> Result<Option<Row>, GatewayError> {
    let opts = SelectOptions::default().limit(1);
    let mut rows = backend.select(table, filters, &opts).await?;
    Ok(if rows.is_empty() {
        None
    } else {
        Some(rows.swap_remove(0))
    })
}
