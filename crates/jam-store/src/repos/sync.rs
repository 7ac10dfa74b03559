//! Sync reconciler — pushes a jam's submissions to the external library,
//! idempotently, and classifies the outcome for operator guidance.
//!
//! There is no lock coordinating concurrent runs for the same jam: each
//! per-project write is independently idempotent (re-marking an
//! already-synced project surfaces as "skipped"), and the last writer of the
//! aggregate sync state wins while per-project `synced_at` stays
//! authoritative.

use chrono::Utc;

use jam_core::audit_detail::SyncRunDetail;
use jam_core::entities::{Jam, Project, SyncState};
use jam_core::enums::{AuditAction, EntityType, LifecycleStatus, SyncErrorCategory, SyncStatus};
use jam_core::responses::SyncResult;
use jam_gateway::{Filter, TableBackend, select_one};

use crate::error::StoreError;
use crate::helpers::{decode_row, encode_row};
use crate::service::JamService;

/// How many failing ids the error summary names before eliding.
const MAX_NAMED_FAILURES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncEntryPoint {
    Initial,
    Retry,
}

impl JamService {
    /// Push every submission of a jam to the external library and, when the
    /// run is fully complete from `results`, advance the jam to `completed`.
    ///
    /// # Errors
    ///
    /// `NotFound`, `ReadOnly` for terminal jams, `Forbidden` for non-admins,
    /// `Validation` when the jam has no submissions, and `SyncRun` when the
    /// run itself dies mid-flight (per-item failures do not error — they are
    /// classified into the returned [`SyncResult`]).
    pub async fn complete_and_sync(
        &self,
        jam_id: &str,
        actor: &str,
    ) -> Result<SyncResult, StoreError> {
        self.run_sync(jam_id, actor, SyncEntryPoint::Initial).await
    }

    /// Re-run a previously partial or failed sync.
    ///
    /// Same behavior as [`Self::complete_and_sync`] minus the no-submissions
    /// check; the audit entry is recorded as `sync_retry`.
    ///
    /// # Errors
    ///
    /// As [`Self::complete_and_sync`].
    pub async fn retry_sync(&self, jam_id: &str, actor: &str) -> Result<SyncResult, StoreError> {
        self.run_sync(jam_id, actor, SyncEntryPoint::Retry).await
    }

    async fn run_sync(
        &self,
        jam_id: &str,
        actor: &str,
        entry: SyncEntryPoint,
    ) -> Result<SyncResult, StoreError> {
        let jam = self.get_jam(jam_id).await?;
        if jam.lifecycle_status.is_read_only() {
            return Err(StoreError::ReadOnly(format!(
                "jam is {} and its sync state is frozen",
                jam.lifecycle_status
            )));
        }
        let admins = self.admin_set(jam_id).await?;
        if !admins.is_admin(actor) {
            return Err(StoreError::Forbidden(
                "only jam admins may sync submissions".to_string(),
            ));
        }
        let projects = self.list_projects(jam_id).await?;
        if entry == SyncEntryPoint::Initial && projects.is_empty() {
            return Err(StoreError::Validation(
                "jam has no submissions to sync".to_string(),
            ));
        }
        let prior = self.get_sync_state(jam_id).await?;

        match self
            .run_push_loop(&jam, actor, entry, &projects, &prior)
            .await
        {
            Ok(result) => Ok(result),
            Err(err) => {
                // The run itself died — persist the failure and surface it
                // with guidance attached.
                let message = err.to_string();
                let failed = SyncState {
                    jam_id: jam_id.to_string(),
                    status: SyncStatus::Failed,
                    pushed_count: prior.pushed_count,
                    skipped_count: prior.skipped_count,
                    last_error: Some(message.clone()),
                    last_attempt_at: Some(Utc::now()),
                };
                if let Err(persist_err) = self.put_sync_state(&failed).await {
                    tracing::warn!(jam_id, error = %persist_err, "could not persist failed sync state");
                }
                let (_, _, guidance) =
                    classify_sync_error(SyncStatus::Failed, Some(message.as_str()));
                Err(StoreError::SyncRun {
                    message,
                    guidance: guidance
                        .unwrap_or_else(|| "retry the sync, and escalate if it persists".to_string()),
                })
            }
        }
    }

    async fn run_push_loop(
        &self,
        jam: &Jam,
        actor: &str,
        entry: SyncEntryPoint,
        projects: &[Project],
        prior: &SyncState,
    ) -> Result<SyncResult, StoreError> {
        let started_at = Utc::now();

        // In-progress marker, flooring counters at the previous run's values
        // so a failing run never regresses the displayed counts mid-flight.
        self.put_sync_state(&SyncState {
            jam_id: jam.id.clone(),
            status: SyncStatus::InProgress,
            pushed_count: prior.pushed_count,
            skipped_count: prior.skipped_count,
            last_error: prior.last_error.clone(),
            last_attempt_at: Some(started_at),
        })
        .await?;

        let mut pushed_count = 0u32;
        let mut skipped_count = 0u32;
        let mut failed_ids: Vec<String> = Vec::new();

        for project in projects {
            if project.is_synced() {
                skipped_count += 1;
                continue;
            }
            match self.mark_project_synced(&project.id, Utc::now()).await {
                Ok(()) => pushed_count += 1,
                Err(e) => {
                    // Per-item isolation: one failure never blocks the rest.
                    tracing::warn!(project_id = %project.id, error = %e, "submission push failed");
                    failed_ids.push(project.id.clone());
                }
            }
        }

        let status = if failed_ids.is_empty() {
            SyncStatus::Complete
        } else if pushed_count + skipped_count > 0 {
            SyncStatus::Partial
        } else {
            SyncStatus::Failed
        };
        let last_error = summarize_failures(&failed_ids);
        let (category, retryable, guidance) = classify_sync_error(status, last_error.as_deref());

        self.put_sync_state(&SyncState {
            jam_id: jam.id.clone(),
            status,
            pushed_count,
            skipped_count,
            last_error: last_error.clone(),
            last_attempt_at: Some(started_at),
        })
        .await?;

        let detail = SyncRunDetail {
            status: status.as_str().to_string(),
            pushed_count,
            skipped_count,
            failed_ids: failed_ids.clone(),
            category: category.as_str().to_string(),
            retryable,
        };
        let action = match (entry, status) {
            (SyncEntryPoint::Retry, _) => AuditAction::SyncRetry,
            (SyncEntryPoint::Initial, SyncStatus::Complete) => AuditAction::SyncComplete,
            (SyncEntryPoint::Initial, SyncStatus::Partial) => AuditAction::SyncPartial,
            (SyncEntryPoint::Initial, _) => AuditAction::SyncFailed,
        };
        self.log_action(
            &jam.id,
            actor,
            EntityType::SyncState,
            &jam.id,
            action,
            Some(serde_json::to_value(&detail).map_err(|e| StoreError::Decode(e.to_string()))?),
        )
        .await?;

        tracing::info!(
            jam_id = %jam.id,
            status = %status,
            pushed = pushed_count,
            skipped = skipped_count,
            failed = failed_ids.len(),
            "sync run finished"
        );

        // Only a fully complete run may move the jam out of `results`.
        if status == SyncStatus::Complete && jam.lifecycle_status == LifecycleStatus::Results {
            self.apply_transition(jam, LifecycleStatus::Completed, actor)
                .await?;
        }

        Ok(SyncResult {
            sync_status: status,
            pushed_count,
            skipped_count,
            last_error,
            sync_error_category: category,
            retryable,
            retry_guidance: guidance,
        })
    }

    /// The persisted sync state, or `not_started` if no run ever happened.
    ///
    /// # Errors
    ///
    /// Returns a gateway or decode error.
    pub async fn get_sync_state(&self, jam_id: &str) -> Result<SyncState, StoreError> {
        match select_one(
            self.backend(),
            "sync_states",
            &[Filter::eq("jam_id", jam_id)],
        )
        .await?
        {
            Some(row) => decode_row(row),
            None => Ok(SyncState::not_started(jam_id)),
        }
    }

    async fn put_sync_state(&self, state: &SyncState) -> Result<(), StoreError> {
        self.backend()
            .upsert("sync_states", &encode_row(state)?, "jam_id")
            .await?;
        Ok(())
    }
}

/// Human-readable failure summary naming up to three failing ids.
fn summarize_failures(failed_ids: &[String]) -> Option<String> {
    if failed_ids.is_empty() {
        return None;
    }
    let named: Vec<&str> = failed_ids
        .iter()
        .take(MAX_NAMED_FAILURES)
        .map(String::as_str)
        .collect();
    let suffix = if failed_ids.len() > MAX_NAMED_FAILURES {
        "…"
    } else {
        ""
    };
    Some(format!(
        "failed to push {} submission(s): {}{suffix}",
        failed_ids.len(),
        named.join(", ")
    ))
}

/// Map a run outcome to an operator-facing category, retryability, and
/// guidance. Pure function of the status and the error text: ordered
/// substring matchers over known phrases, with `unknown` (retryable) for
/// anything unrecognized on a failed run.
#[must_use]
pub fn classify_sync_error(
    status: SyncStatus,
    last_error: Option<&str>,
) -> (SyncErrorCategory, bool, Option<String>) {
    if matches!(
        status,
        SyncStatus::Complete | SyncStatus::NotStarted | SyncStatus::InProgress
    ) {
        return (SyncErrorCategory::None, false, None);
    }
    let text = last_error.unwrap_or_default().to_lowercase();

    if text.contains("only jam admins") || text.contains("forbidden") || text.contains("permission")
    {
        return (
            SyncErrorCategory::Permission,
            false,
            Some("Only jam admins can sync; ask one of them to run it.".to_string()),
        );
    }
    if text.contains("invalid") || text.contains("validation") {
        return (
            SyncErrorCategory::Validation,
            false,
            Some("Fix the submission data before retrying.".to_string()),
        );
    }
    if ["rate limit", "timeout", "network", "unavailable"]
        .iter()
        .any(|phrase| text.contains(phrase))
    {
        return (
            SyncErrorCategory::Transient,
            true,
            Some("The store had a temporary failure; retry the sync.".to_string()),
        );
    }
    if status == SyncStatus::Partial {
        return (
            SyncErrorCategory::PartialFailure,
            true,
            Some("Some submissions failed to push; retry to sync the rest.".to_string()),
        );
    }
    (
        SyncErrorCategory::Unknown,
        true,
        Some("The failure was not recognized; retry, and escalate if it persists.".to_string()),
    )
}
