//! Result shapes returned to callers of the lifecycle and sync operations.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{LifecycleStatus, SyncErrorCategory, SyncStatus};

/// Outcome of a reconciliation run, including operator guidance.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SyncResult {
    pub sync_status: SyncStatus,
    pub pushed_count: u32,
    pub skipped_count: u32,
    pub last_error: Option<String>,
    pub sync_error_category: SyncErrorCategory,
    pub retryable: bool,
    pub retry_guidance: Option<String>,
}

/// Outcome of a lifecycle transition.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct LifecycleResult {
    pub lifecycle_status: LifecycleStatus,
}
