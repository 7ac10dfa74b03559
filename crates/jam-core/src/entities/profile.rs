use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Read-only derived profile snapshot for a user.
///
/// Served through the TTL cache; never written by this system.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Profile {
    pub user_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}
