use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::SyncStatus;

/// Persisted outcome of the most recent reconciliation run for a jam.
///
/// One row per jam, upserted. Counters describe the last run, not a
/// cumulative total — except that an `in_progress` marker write floors them
/// at the previous run's values so a failing run never regresses the
/// displayed counts.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SyncState {
    pub jam_id: String,
    pub status: SyncStatus,
    pub pushed_count: u32,
    pub skipped_count: u32,
    pub last_error: Option<String>,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl SyncState {
    /// The state reported for a jam that has never been synced.
    #[must_use]
    pub fn not_started(jam_id: &str) -> Self {
        Self {
            jam_id: jam_id.to_string(),
            status: SyncStatus::NotStarted,
            pushed_count: 0,
            skipped_count: 0,
            last_error: None,
            last_attempt_at: None,
        }
    }
}
