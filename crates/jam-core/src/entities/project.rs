use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::ProjectSource;

/// A piece of work filed against a jam (or free-standing for `general`
/// records), eligible for sync to the external library.
///
/// `synced_at = None` means not yet pushed. Only the reconciler sets it; the
/// record is immutable otherwise.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub source: ProjectSource,
    pub user_id: String,
    pub jam_id: Option<String>,
    /// Legacy linkage fk, present only on deployments whose schema still
    /// requires it.
    pub team_id: Option<String>,
    pub synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Whether this project has already been pushed to the external library.
    #[must_use]
    pub const fn is_synced(&self) -> bool {
        self.synced_at.is_some()
    }
}
