use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Legacy compatibility record.
///
/// Exists only to satisfy a foreign key that some deployed schemas still
/// require on project rows. Created lazily by the writer the first time a
/// deployment demands one.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Team {
    pub id: String,
    pub created_at: DateTime<Utc>,
}
