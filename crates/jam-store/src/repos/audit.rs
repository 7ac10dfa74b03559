//! Audit log repository.
//!
//! Append-only entries recording every mutation, with a write-time retention
//! ceiling: after each insert, a jam holding more than the configured number
//! of entries has its oldest excess deleted, oldest-first by creation order.

use chrono::Utc;

use jam_core::entities::AuditEntry;
use jam_core::enums::{AuditAction, EntityType};
use jam_core::ids::{self, PREFIX_AUDIT};
use jam_gateway::{Filter, OrderDir, SelectOptions, TableBackend};

use crate::error::StoreError;
use crate::helpers::{decode_row, encode_row, get_string};
use crate::service::JamService;

impl JamService {
    /// Append an audit entry and enforce the retention ceiling.
    ///
    /// # Errors
    ///
    /// Returns a gateway error if the insert or the trim fails.
    pub async fn append_audit(&self, entry: &AuditEntry) -> Result<(), StoreError> {
        self.backend()
            .insert("audit_log", &encode_row(entry)?)
            .await?;
        self.trim_audit(&entry.jam_id).await
    }

    /// Convenience used by every mutating repo method.
    pub(crate) async fn log_action(
        &self,
        jam_id: &str,
        actor_id: &str,
        entity_type: EntityType,
        entity_id: &str,
        action: AuditAction,
        detail: Option<serde_json::Value>,
    ) -> Result<(), StoreError> {
        let entry = AuditEntry {
            id: ids::new_id(PREFIX_AUDIT),
            jam_id: jam_id.to_string(),
            actor_id: actor_id.to_string(),
            entity_type,
            entity_id: entity_id.to_string(),
            action,
            detail,
            created_at: Utc::now(),
        };
        self.append_audit(&entry).await
    }

    /// Delete the oldest entries beyond the retention ceiling.
    async fn trim_audit(&self, jam_id: &str) -> Result<(), StoreError> {
        let opts = SelectOptions::default()
            .columns("id,created_at")
            .order("created_at", OrderDir::Asc);
        let rows = self
            .backend()
            .select("audit_log", &[Filter::eq("jam_id", jam_id)], &opts)
            .await?;

        let ceiling = self.audit_retention() as usize;
        if rows.len() <= ceiling {
            return Ok(());
        }
        let excess = rows.len() - ceiling;
        for row in rows.into_iter().take(excess) {
            let id = get_string(&row, "id")?;
            self.backend()
                .delete("audit_log", &[Filter::eq("id", &id)])
                .await?;
        }
        tracing::debug!(jam_id, trimmed = excess, "audit retention trim");
        Ok(())
    }

    /// Query a jam's audit entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns a gateway or decode error.
    pub async fn query_audit(
        &self,
        jam_id: &str,
        limit: u32,
    ) -> Result<Vec<AuditEntry>, StoreError> {
        let opts = SelectOptions::default()
            .order("created_at", OrderDir::Desc)
            .limit(limit);
        let rows = self
            .backend()
            .select("audit_log", &[Filter::eq("jam_id", jam_id)], &opts)
            .await?;
        rows.into_iter().map(decode_row).collect()
    }
}
