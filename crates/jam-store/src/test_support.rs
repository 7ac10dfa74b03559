//! Shared test utilities for jam-store tests.
//!
//! `MemoryBackend` implements the table protocol over in-memory tables with
//! configurable schema drift (restricted column sets, NOT NULL columns,
//! unique constraints, foreign keys) and per-row patch failure injection, so
//! negotiation and reconciliation paths can be exercised without a network.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use jam_gateway::{Diagnostic, Filter, FilterOp, GatewayError, Row, SelectOptions, TableBackend};

use crate::content::ContentHost;

#[derive(Default)]
struct TableDef {
    rows: Vec<Row>,
    /// `None` accepts any column; `Some` rejects unknown ones.
    columns: Option<HashSet<String>>,
    not_null: HashSet<String>,
    unique: Vec<String>,
    /// (column, referenced table)
    foreign_keys: Vec<(String, String)>,
    /// row id -> error message for injected patch failures
    patch_failures: HashMap<String, String>,
    /// error message injected into every upsert on this table
    upsert_failure: Option<String>,
    upsert_history: Vec<Row>,
    insert_attempts: usize,
    schema_denied: bool,
}

/// In-memory table store with failure injection.
#[derive(Default)]
pub(crate) struct MemoryBackend {
    state: Mutex<HashMap<String, TableDef>>,
}

fn api_err(diagnostic: Diagnostic) -> GatewayError {
    GatewayError::Api {
        status: 400,
        diagnostic,
    }
}

fn value_text(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    }
}

fn matches_filter(row: &Row, filter: &Filter) -> bool {
    let actual = value_text(row.get(&filter.field));
    match filter.op {
        FilterOp::Eq => actual.as_deref() == Some(filter.value.as_str()),
        FilterOp::Neq => actual.as_deref() != Some(filter.value.as_str()),
        FilterOp::Is => match filter.value.as_str() {
            "null" => actual.is_none(),
            other => actual.as_deref() == Some(other),
        },
        FilterOp::Ilike => {
            let pattern = filter.value.trim_matches('%').to_lowercase();
            actual
                .map(|a| a.to_lowercase().contains(&pattern))
                .unwrap_or(false)
        }
    }
}

fn matches_all(row: &Row, filters: &[Filter]) -> bool {
    filters.iter().all(|f| matches_filter(row, f))
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_table<R>(&self, table: &str, f: impl FnOnce(&mut TableDef) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(state.entry(table.to_string()).or_default())
    }

    // ── drift / failure configuration ──────────────────────────────

    pub fn restrict_columns(&self, table: &str, columns: &[&str]) {
        self.with_table(table, |def| {
            def.columns = Some(columns.iter().map(ToString::to_string).collect());
        });
    }

    pub fn require_not_null(&self, table: &str, column: &str) {
        self.with_table(table, |def| {
            def.not_null.insert(column.to_string());
        });
    }

    pub fn add_unique(&self, table: &str, column: &str) {
        self.with_table(table, |def| def.unique.push(column.to_string()));
    }

    pub fn add_foreign_key(&self, table: &str, column: &str, references: &str) {
        self.with_table(table, |def| {
            def.foreign_keys
                .push((column.to_string(), references.to_string()));
        });
    }

    pub fn fail_patch(&self, table: &str, row_id: &str, message: &str) {
        self.with_table(table, |def| {
            def.patch_failures
                .insert(row_id.to_string(), message.to_string());
        });
    }

    pub fn clear_patch_failures(&self, table: &str) {
        self.with_table(table, |def| def.patch_failures.clear());
    }

    pub fn fail_upserts(&self, table: &str, message: &str) {
        self.with_table(table, |def| {
            def.upsert_failure = Some(message.to_string());
        });
    }

    pub fn deny_schema(&self, table: &str) {
        self.with_table(table, |def| def.schema_denied = true);
    }

    // ── observation ────────────────────────────────────────────────

    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.with_table(table, |def| def.rows.clone())
    }

    pub fn upsert_history(&self, table: &str) -> Vec<Row> {
        self.with_table(table, |def| def.upsert_history.clone())
    }

    pub fn insert_attempts(&self, table: &str) -> usize {
        self.with_table(table, |def| def.insert_attempts)
    }

    pub fn set_field(&self, table: &str, id: &str, field: &str, value: &str) {
        self.with_table(table, |def| {
            for row in &mut def.rows {
                if value_text(row.get("id")).as_deref() == Some(id) {
                    row.insert(field.to_string(), Value::String(value.to_string()));
                }
            }
        });
    }

    pub fn clear_field(&self, table: &str, id: &str, field: &str) {
        self.with_table(table, |def| {
            for row in &mut def.rows {
                if value_text(row.get("id")).as_deref() == Some(id) {
                    row.insert(field.to_string(), Value::Null);
                }
            }
        });
    }

    // ── constraint simulation ──────────────────────────────────────

    fn check_insert(
        state: &HashMap<String, TableDef>,
        table: &str,
        row: &Row,
    ) -> Result<(), GatewayError> {
        let Some(def) = state.get(table) else {
            return Ok(());
        };
        if def.schema_denied {
            return Err(GatewayError::SchemaPermission(format!(
                "permission denied for schema public (table {table})"
            )));
        }
        if let Some(ref columns) = def.columns {
            for key in row.keys() {
                if !columns.contains(key) {
                    return Err(api_err(Diagnostic::UnknownColumn(key.clone())));
                }
            }
        }
        for column in &def.not_null {
            if row.get(column).is_none_or(Value::is_null) {
                return Err(api_err(Diagnostic::NotNullViolation(column.clone())));
            }
        }
        for column in &def.unique {
            if let Some(value) = row.get(column).filter(|v| !v.is_null()) {
                if def.rows.iter().any(|r| r.get(column) == Some(value)) {
                    return Err(api_err(Diagnostic::UniqueConflict(column.clone())));
                }
            }
        }
        for (column, references) in &def.foreign_keys {
            if let Some(value) = row.get(column).filter(|v| !v.is_null()) {
                let referenced = state
                    .get(references)
                    .map(|t| t.rows.iter().any(|r| r.get("id") == Some(value)))
                    .unwrap_or(false);
                if !referenced {
                    return Err(api_err(Diagnostic::ForeignKeyViolation(column.clone())));
                }
            }
        }
        Ok(())
    }

    fn insert_inner(&self, table: &str, row: &Row) -> Result<Row, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.entry(table.to_string()).or_default().insert_attempts += 1;
        Self::check_insert(&state, table, row)?;
        state
            .entry(table.to_string())
            .or_default()
            .rows
            .push(row.clone());
        Ok(row.clone())
    }
}

#[async_trait]
impl TableBackend for MemoryBackend {
    async fn select(
        &self,
        table: &str,
        filters: &[Filter],
        opts: &SelectOptions,
    ) -> Result<Vec<Row>, GatewayError> {
        let state = self.state.lock().unwrap();
        let Some(def) = state.get(table) else {
            return Ok(Vec::new());
        };
        if def.schema_denied {
            return Err(GatewayError::SchemaPermission(format!(
                "permission denied for schema public (table {table})"
            )));
        }
        let mut rows: Vec<Row> = def
            .rows
            .iter()
            .filter(|row| matches_all(row, filters))
            .cloned()
            .collect();
        if let Some((ref column, dir)) = opts.order {
            rows.sort_by(|a, b| {
                let ka = value_text(a.get(column));
                let kb = value_text(b.get(column));
                match dir {
                    jam_gateway::OrderDir::Asc => ka.cmp(&kb),
                    jam_gateway::OrderDir::Desc => kb.cmp(&ka),
                }
            });
        }
        if let Some(limit) = opts.limit {
            rows.truncate(limit as usize);
        }
        if let Some(ref columns) = opts.columns {
            let keep: HashSet<&str> = columns.split(',').map(str::trim).collect();
            for row in &mut rows {
                row.retain(|key, _| keep.contains(key.as_str()));
            }
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: &Row) -> Result<Row, GatewayError> {
        self.insert_inner(table, row)
    }

    async fn insert_many(&self, table: &str, rows: &[Row]) -> Result<Vec<Row>, GatewayError> {
        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            stored.push(self.insert_inner(table, row)?);
        }
        Ok(stored)
    }

    async fn upsert(&self, table: &str, row: &Row, on_conflict: &str) -> Result<Row, GatewayError> {
        let mut state = self.state.lock().unwrap();
        let def = state.entry(table.to_string()).or_default();
        if let Some(ref message) = def.upsert_failure {
            return Err(api_err(Diagnostic::Other {
                code: None,
                message: message.clone(),
            }));
        }
        def.upsert_history.push(row.clone());
        let conflict_value = row.get(on_conflict).cloned();
        if let Some(value) = conflict_value.filter(|v| !v.is_null()) {
            if let Some(existing) = def
                .rows
                .iter_mut()
                .find(|r| r.get(on_conflict) == Some(&value))
            {
                existing.extend(row.clone());
                return Ok(existing.clone());
            }
        }
        Self::check_insert(&state, table, row)?;
        state
            .entry(table.to_string())
            .or_default()
            .rows
            .push(row.clone());
        Ok(row.clone())
    }

    async fn patch(
        &self,
        table: &str,
        filters: &[Filter],
        patch: &Row,
    ) -> Result<Vec<Row>, GatewayError> {
        let mut state = self.state.lock().unwrap();
        let Some(def) = state.get_mut(table) else {
            return Ok(Vec::new());
        };
        let mut affected = Vec::new();
        for row in &mut def.rows {
            if !matches_all(row, filters) {
                continue;
            }
            if let Some(id) = value_text(row.get("id")) {
                if let Some(message) = def.patch_failures.get(&id) {
                    return Err(api_err(Diagnostic::Other {
                        code: None,
                        message: message.clone(),
                    }));
                }
            }
            row.extend(patch.clone());
            affected.push(row.clone());
        }
        Ok(affected)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>, GatewayError> {
        let mut state = self.state.lock().unwrap();
        let Some(def) = state.get_mut(table) else {
            return Ok(Vec::new());
        };
        let mut removed = Vec::new();
        def.rows.retain(|row| {
            if matches_all(row, filters) {
                removed.push(row.clone());
                false
            } else {
                true
            }
        });
        Ok(removed)
    }
}

/// Content host that counts page operations and can fail deletions.
#[derive(Default)]
pub(crate) struct RecordingContentHost {
    created: AtomicUsize,
    deleted: AtomicUsize,
    fail_delete: AtomicBool,
}

impl RecordingContentHost {
    pub fn created_pages(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn deleted_pages(&self) -> usize {
        self.deleted.load(Ordering::SeqCst)
    }

    pub fn fail_deletions(&self) {
        self.fail_delete.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContentHost for RecordingContentHost {
    async fn create_page(
        &self,
        _title: &str,
        _parent_page_id: Option<&str>,
    ) -> anyhow::Result<String> {
        let n = self.created.fetch_add(1, Ordering::SeqCst);
        Ok(format!("page-{n}"))
    }

    async fn delete_page(&self, page_id: &str) -> anyhow::Result<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            anyhow::bail!("content host rejected deletion of {page_id}");
        }
        self.deleted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub(crate) mod helpers {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{TimeZone, Utc};

    use jam_core::entities::{BrandingConfig, Jam, Project, RulesConfig, ScheduleConfig};
    use jam_core::enums::ProjectSource;
    use jam_core::ids;

    use super::{MemoryBackend, RecordingContentHost};
    use crate::cache::ProfileCache;
    use crate::repos::jam::CreateJamRequest;
    use crate::repos::project::NewProject;
    use crate::service::JamService;

    pub fn test_service() -> (JamService, Arc<MemoryBackend>, Arc<RecordingContentHost>) {
        test_service_with_retention(100)
    }

    pub fn test_service_with_retention(
        retention: u32,
    ) -> (JamService, Arc<MemoryBackend>, Arc<RecordingContentHost>) {
        let backend = Arc::new(MemoryBackend::new());
        let content = Arc::new(RecordingContentHost::default());
        let svc = JamService::from_parts(
            backend.clone(),
            content.clone(),
            retention,
            ProfileCache::new(Duration::from_secs(60), 16),
        );
        (svc, backend, content)
    }

    pub fn sample_schedule() -> ScheduleConfig {
        ScheduleConfig {
            registration_opens_at: Utc.with_ymd_and_hms(2026, 9, 1, 9, 0, 0).unwrap(),
            hacking_starts_at: Utc.with_ymd_and_hms(2026, 9, 8, 9, 0, 0).unwrap(),
            voting_starts_at: Utc.with_ymd_and_hms(2026, 9, 15, 9, 0, 0).unwrap(),
            ends_at: Utc.with_ymd_and_hms(2026, 9, 22, 9, 0, 0).unwrap(),
        }
    }

    pub fn sample_request(creator: &str, request_id: &str) -> CreateJamRequest {
        CreateJamRequest {
            name: "Space Race".to_string(),
            icon: Some("🚀".to_string()),
            tagline: Some("Build something orbital".to_string()),
            timezone: "UTC".to_string(),
            creation_request_id: request_id.to_string(),
            parent_page_id: None,
            schedule: sample_schedule(),
            rules: RulesConfig::default(),
            branding: BrandingConfig::default(),
            creator_user_id: creator.to_string(),
        }
    }

    pub async fn seed_jam(svc: &JamService, creator: &str) -> Jam {
        svc.create_jam(sample_request(creator, &ids::new_id("req")))
            .await
            .unwrap()
    }

    pub async fn seed_project(svc: &JamService, jam_id: &str, user: &str) -> Project {
        svc.create_project(NewProject {
            title: format!("Project by {user}"),
            description: None,
            source: ProjectSource::Submission,
            user_id: user.to_string(),
            jam_id: Some(jam_id.to_string()),
        })
        .await
        .unwrap()
    }

    /// Walk a fresh draft jam forward to `results`.
    pub async fn advance_to_results(svc: &JamService, jam_id: &str, actor: &str) {
        for _ in 0..5 {
            svc.advance(jam_id, actor).await.unwrap();
        }
    }
}
