//! Typed audit detail payloads.
//!
//! Each audit action can carry a structured `detail` JSON blob. These types
//! pin the shape of the most common ones.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Detail for `AuditAction::StatusChanged`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct StatusChangedDetail {
    pub from: String,
    pub to: String,
    pub reason: Option<String>,
}

/// Detail for the `sync_*` audit actions, carrying the classified run result.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SyncRunDetail {
    pub status: String,
    pub pushed_count: u32,
    pub skipped_count: u32,
    pub failed_ids: Vec<String>,
    pub category: String,
    pub retryable: bool,
}

/// Detail for `AuditAction::Deleted` on a draft jam.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DeletedDetail {
    pub name: String,
    pub page_id: Option<String>,
}
