//! Status enums, roles, actions, and entity types for Jamboree.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.
//! Status enums with state machines provide `allowed_next_states()` to enforce
//! valid transitions at the application layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// LifecycleStatus
// ---------------------------------------------------------------------------

/// Stage of a jam in its forward-only lifecycle.
///
/// ```text
/// draft → registration → team_formation → hacking → voting → results → completed
/// draft → archived (draft deletion only)
/// ```
///
/// `archived` is never reachable through the forward chain; it exists only as
/// the end state of draft deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    Draft,
    Registration,
    TeamFormation,
    Hacking,
    Voting,
    Results,
    Completed,
    Archived,
}

impl LifecycleStatus {
    /// The single legal forward transition from this stage, if any.
    #[must_use]
    pub const fn forward_successor(self) -> Option<Self> {
        match self {
            Self::Draft => Some(Self::Registration),
            Self::Registration => Some(Self::TeamFormation),
            Self::TeamFormation => Some(Self::Hacking),
            Self::Hacking => Some(Self::Voting),
            Self::Voting => Some(Self::Results),
            Self::Results => Some(Self::Completed),
            Self::Completed | Self::Archived => None,
        }
    }

    /// Valid next states from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Draft => &[Self::Registration],
            Self::Registration => &[Self::TeamFormation],
            Self::TeamFormation => &[Self::Hacking],
            Self::Hacking => &[Self::Voting],
            Self::Voting => &[Self::Results],
            Self::Results => &[Self::Completed],
            Self::Completed | Self::Archived => &[],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// Whether the jam accepts no further mutations (sync included).
    #[must_use]
    pub const fn is_read_only(self) -> bool {
        matches!(self, Self::Completed | Self::Archived)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Registration => "registration",
            Self::TeamFormation => "team_formation",
            Self::Hacking => "hacking",
            Self::Voting => "voting",
            Self::Results => "results",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AdminRole
// ---------------------------------------------------------------------------

/// Role of a jam admin. Exactly one `primary` exists per jam and cannot be
/// transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    Primary,
    CoAdmin,
}

impl AdminRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::CoAdmin => "co_admin",
        }
    }
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ProjectSource
// ---------------------------------------------------------------------------

/// How a project record entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProjectSource {
    /// Filed against a jam through submission intake.
    Submission,
    /// Free-standing record not tied to any jam.
    General,
}

impl ProjectSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submission => "submission",
            Self::General => "general",
        }
    }
}

impl fmt::Display for ProjectSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SyncStatus
// ---------------------------------------------------------------------------

/// Outcome of the most recent reconciliation run for a jam.
///
/// ```text
/// not_started → in_progress → complete
///                           → partial
///                           → failed
/// ```
///
/// `partial` and `failed` runs may re-enter `in_progress` on retry; only
/// `complete` unlocks the `results → completed` lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    NotStarted,
    InProgress,
    Partial,
    Failed,
    Complete,
}

impl SyncStatus {
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::NotStarted | Self::Partial | Self::Failed => &[Self::InProgress],
            Self::InProgress => &[Self::Complete, Self::Partial, Self::Failed],
            Self::Complete => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Partial => "partial",
            Self::Failed => "failed",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SyncErrorCategory
// ---------------------------------------------------------------------------

/// Operator-facing classification of a sync failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SyncErrorCategory {
    None,
    Permission,
    Validation,
    Transient,
    PartialFailure,
    Unknown,
}

impl SyncErrorCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Permission => "permission",
            Self::Validation => "validation",
            Self::Transient => "transient",
            Self::PartialFailure => "partial_failure",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SyncErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AuditAction
// ---------------------------------------------------------------------------

/// Type of action recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Updated,
    StatusChanged,
    Deleted,
    SyncComplete,
    SyncPartial,
    SyncFailed,
    SyncRetry,
}

impl AuditAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::StatusChanged => "status_changed",
            Self::Deleted => "deleted",
            Self::SyncComplete => "sync_complete",
            Self::SyncPartial => "sync_partial",
            Self::SyncFailed => "sync_failed",
            Self::SyncRetry => "sync_retry",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// JudgingMode
// ---------------------------------------------------------------------------

/// How submissions are judged at the end of a jam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum JudgingMode {
    Community,
    Panel,
    Hybrid,
}

impl JudgingMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Community => "community",
            Self::Panel => "panel",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for JudgingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// BrandingTheme
// ---------------------------------------------------------------------------

/// Visual theme applied to a jam's pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BrandingTheme {
    Light,
    Dark,
    System,
}

impl BrandingTheme {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }
}

impl fmt::Display for BrandingTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EntityType
// ---------------------------------------------------------------------------

/// Type of entity in the system, used in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Jam,
    Project,
    Admin,
    SyncState,
    Team,
    Profile,
    Audit,
}

impl EntityType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Jam => "jam",
            Self::Project => "project",
            Self::Admin => "admin",
            Self::SyncState => "sync_state",
            Self::Team => "team",
            Self::Profile => "profile",
            Self::Audit => "audit",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
