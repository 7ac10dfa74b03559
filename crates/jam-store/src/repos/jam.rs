//! Jam repository — idempotent creation, lifecycle transitions, draft
//! deletion, and settings edits.

use chrono::Utc;
use serde_json::Value;

use jam_core::audit_detail::{DeletedDetail, StatusChangedDetail};
use jam_core::entities::{BrandingConfig, Jam, JamAdmin, RulesConfig, ScheduleConfig};
use jam_core::enums::{AdminRole, AuditAction, EntityType, LifecycleStatus, SyncStatus};
use jam_core::ids::{self, PREFIX_JAM};
use jam_core::responses::LifecycleResult;
use jam_gateway::{Filter, Row, TableBackend, select_one};

use crate::error::StoreError;
use crate::helpers::{decode_merged, decode_row, encode_row};
use crate::service::JamService;

/// Input for the create-instance operation.
#[derive(Debug, Clone)]
pub struct CreateJamRequest {
    pub name: String,
    pub icon: Option<String>,
    pub tagline: Option<String>,
    pub timezone: String,
    /// Idempotency key: a repeated create with the same value returns the
    /// existing jam without a second page creation.
    pub creation_request_id: String,
    pub parent_page_id: Option<String>,
    pub schedule: ScheduleConfig,
    pub rules: RulesConfig,
    pub branding: BrandingConfig,
    pub creator_user_id: String,
}

/// Partial settings edit; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct JamSettingsUpdate {
    pub schedule: Option<ScheduleConfig>,
    pub rules: Option<RulesConfig>,
    pub branding: Option<BrandingConfig>,
}

impl JamService {
    /// Create a jam, its content page, and its primary admin.
    ///
    /// Idempotent on `creation_request_id`. Rules and schedule are validated
    /// before any write occurs.
    ///
    /// # Errors
    ///
    /// `Validation` for bad rules/schedule; `Content` if page creation
    /// fails; gateway errors otherwise.
    pub async fn create_jam(&self, req: CreateJamRequest) -> Result<Jam, StoreError> {
        req.rules.validate()?;
        req.schedule.validate()?;

        if let Some(row) = select_one(
            self.backend(),
            "jams",
            &[Filter::eq("creation_request_id", &req.creation_request_id)],
        )
        .await?
        {
            tracing::info!(
                creation_request_id = %req.creation_request_id,
                "create_jam replayed, returning existing jam"
            );
            return decode_row(row);
        }

        let page_id = self
            .content()
            .create_page(&req.name, req.parent_page_id.as_deref())
            .await
            .map_err(|e| StoreError::Content(e.to_string()))?;

        let now = Utc::now();
        let jam = Jam {
            id: ids::new_id(PREFIX_JAM),
            name: req.name,
            icon: req.icon,
            tagline: req.tagline,
            timezone: req.timezone,
            lifecycle_status: LifecycleStatus::Draft,
            page_id: Some(page_id),
            parent_page_id: req.parent_page_id,
            creation_request_id: req.creation_request_id,
            schedule: req.schedule,
            rules: req.rules,
            branding: req.branding,
            created_at: now,
            updated_at: now,
        };

        let intended = encode_row(&jam)?;
        let stored = self
            .insert_negotiated("jams", intended.clone(), None)
            .await?;
        let jam: Jam = decode_merged(intended, stored)?;

        let admin = JamAdmin {
            jam_id: jam.id.clone(),
            user_id: req.creator_user_id.clone(),
            role: AdminRole::Primary,
            created_at: now,
        };
        self.backend()
            .insert("jam_admins", &encode_row(&admin)?)
            .await?;

        self.log_action(
            &jam.id,
            &req.creator_user_id,
            EntityType::Jam,
            &jam.id,
            AuditAction::Created,
            None,
        )
        .await?;

        tracing::info!(jam_id = %jam.id, name = %jam.name, "jam created");
        Ok(jam)
    }

    /// Fetch a jam by id.
    ///
    /// # Errors
    ///
    /// `NotFound` if no row matches.
    pub async fn get_jam(&self, id: &str) -> Result<Jam, StoreError> {
        let row = select_one(self.backend(), "jams", &[Filter::eq("id", id)])
            .await?
            .ok_or_else(|| StoreError::NotFound {
                entity_type: "jam".to_string(),
                id: id.to_string(),
            })?;
        decode_row(row)
    }

    /// Advance a jam one step along the forward lifecycle chain.
    ///
    /// This is the only place lifecycle status changes, apart from the draft
    /// cascade delete. There is no compare-and-swap on the current status:
    /// two concurrent calls reading the same status can both apply the same
    /// transition (accepted gap, see DESIGN.md).
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden` for non-admins, `Terminal` when no forward
    /// successor exists (archived gets its own message), and
    /// `SyncIncomplete` on `results → completed` unless the sync state is
    /// exactly `complete`.
    pub async fn advance(&self, jam_id: &str, actor: &str) -> Result<LifecycleResult, StoreError> {
        let jam = self.get_jam(jam_id).await?;

        let admins = self.admin_set(jam_id).await?;
        if !admins.is_admin(actor) {
            return Err(StoreError::Forbidden(
                "only jam admins may advance the lifecycle".to_string(),
            ));
        }

        let Some(next) = jam.lifecycle_status.forward_successor() else {
            return Err(match jam.lifecycle_status {
                LifecycleStatus::Archived => {
                    StoreError::Terminal("jam is archived and cannot be advanced".to_string())
                }
                _ => StoreError::Terminal(
                    "jam has already reached the end of its lifecycle".to_string(),
                ),
            });
        };

        if next == LifecycleStatus::Completed {
            let sync = self.get_sync_state(jam_id).await?;
            if sync.status != SyncStatus::Complete {
                return Err(StoreError::SyncIncomplete(format!(
                    "submissions must be fully synced before completion (sync is {})",
                    sync.status
                )));
            }
        }

        self.apply_transition(&jam, next, actor).await?;
        Ok(LifecycleResult {
            lifecycle_status: next,
        })
    }

    /// Persist a lifecycle transition and its audit entry.
    pub(crate) async fn apply_transition(
        &self,
        jam: &Jam,
        next: LifecycleStatus,
        actor: &str,
    ) -> Result<(), StoreError> {
        let mut patch = Row::new();
        patch.insert(
            "lifecycle_status".to_string(),
            Value::String(next.as_str().to_string()),
        );
        patch.insert(
            "updated_at".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
        self.backend()
            .patch("jams", &[Filter::eq("id", &jam.id)], &patch)
            .await?;

        let detail = StatusChangedDetail {
            from: jam.lifecycle_status.as_str().to_string(),
            to: next.as_str().to_string(),
            reason: None,
        };
        self.log_action(
            &jam.id,
            actor,
            EntityType::Jam,
            &jam.id,
            AuditAction::StatusChanged,
            Some(serde_json::to_value(&detail).map_err(|e| StoreError::Decode(e.to_string()))?),
        )
        .await?;

        tracing::info!(
            jam_id = %jam.id,
            from = %jam.lifecycle_status,
            to = %next,
            "lifecycle advanced"
        );
        Ok(())
    }

    /// Edit a jam's schedule, rules, or branding.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admins, `ReadOnly` once the jam is terminal,
    /// `Validation` for out-of-range values.
    pub async fn update_jam_settings(
        &self,
        jam_id: &str,
        actor: &str,
        update: JamSettingsUpdate,
    ) -> Result<Jam, StoreError> {
        let jam = self.get_jam(jam_id).await?;
        let admins = self.admin_set(jam_id).await?;
        if !admins.is_admin(actor) {
            return Err(StoreError::Forbidden(
                "only jam admins may edit settings".to_string(),
            ));
        }
        if jam.lifecycle_status.is_read_only() {
            return Err(StoreError::ReadOnly(format!(
                "jam is {} and can no longer be edited",
                jam.lifecycle_status
            )));
        }

        let mut patch = Row::new();
        if let Some(schedule) = update.schedule {
            schedule.validate()?;
            patch.insert(
                "schedule".to_string(),
                serde_json::to_value(schedule).map_err(|e| StoreError::Decode(e.to_string()))?,
            );
        }
        if let Some(rules) = update.rules {
            rules.validate()?;
            patch.insert(
                "rules".to_string(),
                serde_json::to_value(rules).map_err(|e| StoreError::Decode(e.to_string()))?,
            );
        }
        if let Some(branding) = update.branding {
            patch.insert(
                "branding".to_string(),
                serde_json::to_value(branding).map_err(|e| StoreError::Decode(e.to_string()))?,
            );
        }
        if patch.is_empty() {
            return Ok(jam);
        }
        patch.insert(
            "updated_at".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );

        self.backend()
            .patch("jams", &[Filter::eq("id", jam_id)], &patch)
            .await?;
        self.log_action(
            jam_id,
            actor,
            EntityType::Jam,
            jam_id,
            AuditAction::Updated,
            None,
        )
        .await?;

        self.get_jam(jam_id).await
    }

    /// Delete a draft jam and everything hanging off it.
    ///
    /// Page deletion is best-effort cleanup; the cascade (admins, sync
    /// state, audit log, jam row) runs regardless of its outcome.
    ///
    /// # Errors
    ///
    /// `Forbidden` unless `actor` is the primary admin (co-admins are not
    /// authorized), `ReadOnly` unless the status is exactly `draft`, and
    /// `Validation` while any submission references the jam.
    pub async fn delete_draft(&self, jam_id: &str, actor: &str) -> Result<(), StoreError> {
        let jam = self.get_jam(jam_id).await?;

        let admins = self.admin_set(jam_id).await?;
        if !admins.is_primary(actor) {
            return Err(StoreError::Forbidden(
                "only the primary admin may delete a draft".to_string(),
            ));
        }
        if jam.lifecycle_status != LifecycleStatus::Draft {
            return Err(StoreError::ReadOnly(format!(
                "only draft jams can be deleted, this one is {}",
                jam.lifecycle_status
            )));
        }
        let projects = self.list_projects(jam_id).await?;
        if !projects.is_empty() {
            return Err(StoreError::Validation(format!(
                "jam has {} submission(s); it cannot be deleted",
                projects.len()
            )));
        }

        let detail = DeletedDetail {
            name: jam.name.clone(),
            page_id: jam.page_id.clone(),
        };
        self.log_action(
            jam_id,
            actor,
            EntityType::Jam,
            jam_id,
            AuditAction::Deleted,
            Some(serde_json::to_value(&detail).map_err(|e| StoreError::Decode(e.to_string()))?),
        )
        .await?;

        if let Some(ref page_id) = jam.page_id {
            if let Err(e) = self.content().delete_page(page_id).await {
                tracing::warn!(jam_id, page_id = %page_id, error = %e, "page deletion failed, continuing");
            }
        }

        // Cascade in dependency order.
        self.backend()
            .delete("jam_admins", &[Filter::eq("jam_id", jam_id)])
            .await?;
        self.backend()
            .delete("sync_states", &[Filter::eq("jam_id", jam_id)])
            .await?;
        self.backend()
            .delete("audit_log", &[Filter::eq("jam_id", jam_id)])
            .await?;
        self.backend()
            .delete("jams", &[Filter::eq("id", jam_id)])
            .await?;

        tracing::info!(jam_id, "draft jam deleted");
        Ok(())
    }
}
