//! Service wiring for the Jamboree store.
//!
//! `JamService` bundles the table backend, the content host, the profile
//! cache, and the audit retention ceiling. All repository methods are
//! implemented as `impl JamService` blocks in `repos/`.

use std::sync::Arc;
use std::time::Duration;

use jam_config::JamConfig;
use jam_core::entities::Profile;
use jam_gateway::{Filter, TableBackend, TableClient, select_one};

use crate::cache::ProfileCache;
use crate::content::ContentHost;
use crate::error::StoreError;
use crate::helpers::decode_row;

/// Orchestrates all durable state operations for jams, projects, admins,
/// sync state, and the audit log.
///
/// Stateless per request apart from the bounded profile cache; safe to share
/// behind an `Arc` across request handlers.
pub struct JamService {
    backend: Arc<dyn TableBackend>,
    content: Arc<dyn ContentHost>,
    cache: ProfileCache,
    audit_retention: u32,
}

impl JamService {
    /// Create a service from configuration, connecting an HTTP table client.
    #[must_use]
    pub fn new(config: &JamConfig, content: Arc<dyn ContentHost>) -> Self {
        let backend: Arc<dyn TableBackend> = Arc::new(TableClient::new(
            &config.gateway.url,
            &config.gateway.service_key,
        ));
        Self::from_parts(
            backend,
            content,
            config.sync.audit_retention,
            ProfileCache::new(
                Duration::from_secs(config.cache.ttl_secs),
                config.cache.capacity,
            ),
        )
    }

    /// Create a service from pre-built parts (tests inject an in-memory
    /// backend and a recording content host here).
    #[must_use]
    pub fn from_parts(
        backend: Arc<dyn TableBackend>,
        content: Arc<dyn ContentHost>,
        audit_retention: u32,
        cache: ProfileCache,
    ) -> Self {
        Self {
            backend,
            content,
            cache,
            audit_retention,
        }
    }

    /// Access the table backend.
    #[must_use]
    pub fn backend(&self) -> &dyn TableBackend {
        self.backend.as_ref()
    }

    /// Access the content host.
    #[must_use]
    pub fn content(&self) -> &dyn ContentHost {
        self.content.as_ref()
    }

    /// Per-jam audit log retention ceiling.
    #[must_use]
    pub const fn audit_retention(&self) -> u32 {
        self.audit_retention
    }

    /// Read-through lookup of a user's derived profile snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no profile row exists, or a gateway
    /// error on transport failure.
    pub async fn get_profile(&self, user_id: &str) -> Result<Profile, StoreError> {
        if let Some(profile) = self.cache.get(user_id) {
            return Ok(profile);
        }
        let row = select_one(
            self.backend.as_ref(),
            "profiles",
            &[Filter::eq("user_id", user_id)],
        )
        .await?
        .ok_or_else(|| StoreError::NotFound {
            entity_type: "profile".to_string(),
            id: user_id.to_string(),
        })?;
        let profile: Profile = decode_row(row)?;
        self.cache.insert(profile.clone());
        Ok(profile)
    }

    /// Drop a cached profile snapshot.
    pub fn invalidate_profile(&self, user_id: &str) {
        self.cache.invalidate(user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::test_service;
    use jam_gateway::Row;
    use serde_json::Value;

    fn profile_row(user_id: &str, name: &str) -> Row {
        let mut row = Row::new();
        row.insert("user_id".to_string(), Value::String(user_id.to_string()));
        row.insert("display_name".to_string(), Value::String(name.to_string()));
        row.insert("avatar_url".to_string(), Value::Null);
        row
    }

    #[tokio::test]
    async fn get_profile_reads_through_and_caches() {
        let (svc, _, _) = test_service();
        svc.backend()
            .insert("profiles", &profile_row("user-1", "Ada"))
            .await
            .unwrap();

        let profile = svc.get_profile("user-1").await.unwrap();
        assert_eq!(profile.display_name, "Ada");

        // Remove the backing row; the cached snapshot is still served.
        svc.backend()
            .delete("profiles", &[Filter::eq("user_id", "user-1")])
            .await
            .unwrap();
        let cached = svc.get_profile("user-1").await.unwrap();
        assert_eq!(cached.display_name, "Ada");

        // After invalidation the read-through sees the deletion.
        svc.invalidate_profile("user-1");
        let result = svc.get_profile("user-1").await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn get_profile_missing_is_not_found() {
        let (svc, _, _) = test_service();
        let result = svc.get_profile("user-ghost").await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }
}
