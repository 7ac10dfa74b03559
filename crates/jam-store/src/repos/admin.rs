//! Jam admin repository and the `AdminSet` role queries.

use chrono::Utc;

use jam_core::entities::JamAdmin;
use jam_core::enums::{AdminRole, AuditAction, EntityType};
use jam_gateway::{Filter, TableBackend};

use crate::error::StoreError;
use crate::helpers::{decode_row, encode_row};
use crate::service::JamService;

/// A jam's loaded admin memberships, with typed role queries.
///
/// Replaces ad hoc array scans at each call site: every authorization check
/// in the lifecycle machine and the reconciler goes through this.
#[derive(Debug, Clone)]
pub struct AdminSet {
    admins: Vec<JamAdmin>,
}

impl AdminSet {
    #[must_use]
    pub fn new(admins: Vec<JamAdmin>) -> Self {
        Self { admins }
    }

    /// Whether `user_id` is an admin at all (primary or co-admin).
    #[must_use]
    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admins.iter().any(|a| a.user_id == user_id)
    }

    /// Whether `user_id` holds the primary role.
    #[must_use]
    pub fn is_primary(&self, user_id: &str) -> bool {
        self.admins
            .iter()
            .any(|a| a.user_id == user_id && a.role == AdminRole::Primary)
    }

    /// The primary admin, if loaded.
    #[must_use]
    pub fn primary(&self) -> Option<&JamAdmin> {
        self.admins.iter().find(|a| a.role == AdminRole::Primary)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.admins.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }
}

impl JamService {
    /// Load the admin set for a jam.
    ///
    /// # Errors
    ///
    /// Returns a gateway or decode error; an empty set is not an error.
    pub async fn admin_set(&self, jam_id: &str) -> Result<AdminSet, StoreError> {
        let rows = self
            .backend()
            .select(
                "jam_admins",
                &[Filter::eq("jam_id", jam_id)],
                &jam_gateway::SelectOptions::default(),
            )
            .await?;
        let admins = rows
            .into_iter()
            .map(decode_row::<JamAdmin>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(AdminSet::new(admins))
    }

    /// Add a co-admin. Only the primary admin may do this; the primary role
    /// itself is immutable — there is no transfer operation.
    ///
    /// # Errors
    ///
    /// `Forbidden` unless `actor` is the primary admin; `Validation` if the
    /// user is already an admin.
    pub async fn add_co_admin(
        &self,
        jam_id: &str,
        actor: &str,
        user_id: &str,
    ) -> Result<JamAdmin, StoreError> {
        let admins = self.admin_set(jam_id).await?;
        if !admins.is_primary(actor) {
            return Err(StoreError::Forbidden(
                "only the primary admin may add co-admins".to_string(),
            ));
        }
        if admins.is_admin(user_id) {
            return Err(StoreError::Validation(format!(
                "{user_id} is already an admin of {jam_id}"
            )));
        }

        let admin = JamAdmin {
            jam_id: jam_id.to_string(),
            user_id: user_id.to_string(),
            role: AdminRole::CoAdmin,
            created_at: Utc::now(),
        };
        self.backend()
            .insert("jam_admins", &encode_row(&admin)?)
            .await?;
        self.log_action(
            jam_id,
            actor,
            EntityType::Admin,
            user_id,
            AuditAction::Created,
            None,
        )
        .await?;
        Ok(admin)
    }
}
