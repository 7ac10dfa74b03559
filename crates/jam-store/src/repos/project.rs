//! Project repository — submission intake through the negotiating writer.

use chrono::{DateTime, Utc};

use jam_core::entities::Project;
use jam_core::enums::{AuditAction, EntityType, ProjectSource};
use jam_core::ids::{self, PREFIX_PROJECT};
use jam_gateway::{Filter, OrderDir, Row, SelectOptions, TableBackend, select_one};

use crate::error::StoreError;
use crate::helpers::{decode_merged, decode_row, encode_row};
use crate::service::JamService;
use crate::writer::TEAM_LINK;

/// Input for submission intake.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub title: String,
    pub description: Option<String>,
    pub source: ProjectSource,
    pub user_id: String,
    pub jam_id: Option<String>,
}

impl JamService {
    /// Create a project record.
    ///
    /// All writes into `projects` go through the schema-negotiating writer —
    /// the relation's deployed column set is not guaranteed to match this
    /// code's expectations, and legacy deployments still require a team
    /// linkage fk.
    ///
    /// # Errors
    ///
    /// `Validation` for an empty title or a missing jam; negotiation and
    /// gateway errors otherwise.
    pub async fn create_project(&self, new: NewProject) -> Result<Project, StoreError> {
        if new.title.trim().is_empty() {
            return Err(StoreError::Validation(
                "project title must not be empty".to_string(),
            ));
        }
        if let Some(ref jam_id) = new.jam_id {
            // Submission intake must target an existing jam.
            self.get_jam(jam_id).await?;
        }

        let project = Project {
            id: ids::new_id(PREFIX_PROJECT),
            title: new.title,
            description: new.description,
            source: new.source,
            user_id: new.user_id.clone(),
            jam_id: new.jam_id.clone(),
            team_id: None,
            synced_at: None,
            created_at: Utc::now(),
        };

        let intended = encode_row(&project)?;
        let stored = self
            .insert_negotiated("projects", intended.clone(), Some(&TEAM_LINK))
            .await?;
        let project: Project = decode_merged(intended, stored)?;

        if let Some(ref jam_id) = project.jam_id {
            self.log_action(
                jam_id,
                &new.user_id,
                EntityType::Project,
                &project.id,
                AuditAction::Created,
                None,
            )
            .await?;
        }

        tracing::info!(project_id = %project.id, jam_id = ?project.jam_id, "project created");
        Ok(project)
    }

    /// Fetch a project by id.
    ///
    /// # Errors
    ///
    /// `NotFound` if no row matches.
    pub async fn get_project(&self, id: &str) -> Result<Project, StoreError> {
        let row = select_one(self.backend(), "projects", &[Filter::eq("id", id)])
            .await?
            .ok_or_else(|| StoreError::NotFound {
                entity_type: "project".to_string(),
                id: id.to_string(),
            })?;
        decode_row(row)
    }

    /// All projects filed against a jam, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a gateway or decode error.
    pub async fn list_projects(&self, jam_id: &str) -> Result<Vec<Project>, StoreError> {
        let opts = SelectOptions::default().order("created_at", OrderDir::Asc);
        let rows = self
            .backend()
            .select("projects", &[Filter::eq("jam_id", jam_id)], &opts)
            .await?;
        rows.into_iter().map(decode_row).collect()
    }

    /// Mark a single project as pushed to the external library.
    ///
    /// Idempotent at the store level: re-marking an already-synced project
    /// rewrites the same column, which the reconciler surfaces as "skipped"
    /// before ever calling this.
    ///
    /// # Errors
    ///
    /// `NotFound` if the patch matched no row.
    pub(crate) async fn mark_project_synced(
        &self,
        project_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut patch = Row::new();
        patch.insert(
            "synced_at".to_string(),
            serde_json::Value::String(at.to_rfc3339()),
        );
        let affected = self
            .backend()
            .patch("projects", &[Filter::eq("id", project_id)], &patch)
            .await?;
        if affected.is_empty() {
            return Err(StoreError::NotFound {
                entity_type: "project".to_string(),
                id: project_id.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{seed_jam, test_service};

    fn submission(jam_id: &str, user: &str, title: &str) -> NewProject {
        NewProject {
            title: title.to_string(),
            description: None,
            source: ProjectSource::Submission,
            user_id: user.to_string(),
            jam_id: Some(jam_id.to_string()),
        }
    }

    #[tokio::test]
    async fn create_and_list_projects() {
        let (svc, _, _) = test_service();
        let jam = seed_jam(&svc, "alice").await;

        let first = svc
            .create_project(submission(&jam.id, "dave", "Solar tracker"))
            .await
            .unwrap();
        svc.create_project(submission(&jam.id, "erin", "Tide clock"))
            .await
            .unwrap();

        let projects = svc.list_projects(&jam.id).await.unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].id, first.id, "oldest first");
        assert!(projects.iter().all(|p| !p.is_synced()));
    }

    #[tokio::test]
    async fn empty_title_rejected() {
        let (svc, _, _) = test_service();
        let jam = seed_jam(&svc, "alice").await;

        let result = svc.create_project(submission(&jam.id, "dave", "  ")).await;
        assert!(matches!(result, Err(StoreError::Validation(_))));
    }

    #[tokio::test]
    async fn submission_against_missing_jam_rejected() {
        let (svc, _, _) = test_service();
        let result = svc
            .create_project(submission("jam-missing", "dave", "Orphan"))
            .await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn general_project_without_jam() {
        let (svc, _, _) = test_service();
        let project = svc
            .create_project(NewProject {
                title: "Scratch pad".to_string(),
                description: None,
                source: ProjectSource::General,
                user_id: "dave".to_string(),
                jam_id: None,
            })
            .await
            .unwrap();
        assert!(project.jam_id.is_none());
    }

    #[tokio::test]
    async fn mark_synced_sets_timestamp() {
        let (svc, _, _) = test_service();
        let jam = seed_jam(&svc, "alice").await;
        let project = svc
            .create_project(submission(&jam.id, "dave", "Solar tracker"))
            .await
            .unwrap();

        svc.mark_project_synced(&project.id, Utc::now())
            .await
            .unwrap();
        let reloaded = svc.get_project(&project.id).await.unwrap();
        assert!(reloaded.is_synced());
    }

    #[tokio::test]
    async fn mark_synced_missing_project_is_not_found() {
        let (svc, _, _) = test_service();
        let result = svc.mark_project_synced("prj-missing", Utc::now()).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }
}
