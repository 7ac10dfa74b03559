//! Reconciler and audit retention configuration.

use serde::{Deserialize, Serialize};

/// Per-jam audit log retention ceiling.
const fn default_audit_retention() -> u32 {
    200
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Maximum audit entries kept per jam; oldest are trimmed at write time.
    #[serde(default = "default_audit_retention")]
    pub audit_retention: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            audit_retention: default_audit_retention(),
        }
    }
}
