use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::AdminRole;

/// Membership of a user in a jam's admin set.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct JamAdmin {
    pub jam_id: String,
    pub user_id: String,
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
}
