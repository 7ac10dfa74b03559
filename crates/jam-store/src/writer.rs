//! Schema-negotiating insert path.
//!
//! The deployed column set of write-heavy relations is not known at compile
//! time or call time — deployments drift. Instead of pinning a shape, the
//! writer keeps a worklist of immutable payload candidates, tries them in
//! order, and reacts to the store's classified diagnostics by deriving new
//! candidates: drop an unknown column, default a missing NOT NULL column,
//! substitute or create a legacy team linkage row on constraint conflicts.
//!
//! Termination: candidates are deduplicated by a canonical signature and
//! every derived candidate strictly shrinks or strictly gains a previously
//! missing column; linkage creation is budgeted. Either a candidate lands or
//! the queue drains and the last store error is surfaced — exhaustion is a
//! reported error, never an empty success.

use std::collections::{BTreeMap, HashSet, VecDeque};

use chrono::Utc;
use serde_json::Value;

use jam_core::ids;
use jam_gateway::{Diagnostic, GatewayError, OrderDir, Row, SelectOptions, TableBackend};

use crate::error::StoreError;
use crate::helpers::get_string;
use crate::service::JamService;

/// Legacy linkage relation a record's fk column points at.
pub(crate) struct LinkSpec {
    pub table: &'static str,
    pub column: &'static str,
}

/// The team linkage some deployed schemas still require on project rows.
pub(crate) const TEAM_LINK: LinkSpec = LinkSpec {
    table: "teams",
    column: "team_id",
};

/// Linkage rows created per negotiated insert, at most.
const MAX_LINK_CREATES: usize = 3;
/// Defaulting rounds when creating a linkage row, at most.
const MAX_LINK_DEFAULT_ROUNDS: usize = 4;

impl JamService {
    /// Insert `base` into `table`, negotiating the payload shape against the
    /// deployed schema.
    ///
    /// `base` must carry an `id` and a title/name plus an owner reference;
    /// `link` names the legacy linkage relation when the target table may
    /// still require one.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::SchemaNegotiationExhausted` when every candidate
    /// was rejected, or the first unrecognized gateway error.
    pub(crate) async fn insert_negotiated(
        &self,
        table: &str,
        base: Row,
        link: Option<&LinkSpec>,
    ) -> Result<Row, StoreError> {
        let mut queue: VecDeque<Row> = VecDeque::new();
        let mut seen: HashSet<String> = HashSet::new();
        for candidate in self.seed_candidates(&base, link).await {
            if seen.insert(signature(&candidate)) {
                queue.push_back(candidate);
            }
        }

        let mut exhausted_links: HashSet<String> = HashSet::new();
        let mut link_creates = 0usize;
        let mut attempts = 0usize;
        let mut last_err: Option<GatewayError> = None;

        while let Some(candidate) = queue.pop_front() {
            attempts += 1;
            let err = match self.backend().insert(table, &candidate).await {
                Ok(row) => {
                    tracing::debug!(table, attempts, "negotiated insert succeeded");
                    return Ok(row);
                }
                Err(err) => err,
            };

            match (err.diagnostic().cloned(), link) {
                (Some(Diagnostic::UnknownColumn(column)), _)
                    if candidate.contains_key(&column) =>
                {
                    let mut next = candidate.clone();
                    next.remove(&column);
                    push_derived(&mut queue, &mut seen, next);
                    last_err = Some(err);
                }
                (Some(Diagnostic::NotNullViolation(column)), maybe_link)
                    if is_missing(&candidate, &column) =>
                {
                    let value = match maybe_link {
                        Some(l) if l.column == column => {
                            match self
                                .resolve_link_id(l, &exhausted_links, &mut link_creates)
                                .await?
                            {
                                Some(id) => Value::String(id),
                                None => {
                                    return Err(StoreError::SchemaNegotiationExhausted {
                                        attempts,
                                        last: err,
                                    });
                                }
                            }
                        }
                        _ => computed_default(&column, &base),
                    };
                    let mut next = candidate.clone();
                    next.insert(column, value);
                    push_derived(&mut queue, &mut seen, next);
                    last_err = Some(err);
                }
                (Some(Diagnostic::UniqueConflict(column)), Some(l)) if l.column == column => {
                    if let Some(current) = candidate.get(&column).and_then(Value::as_str) {
                        exhausted_links.insert(current.to_string());
                    }
                    let Some(id) = self
                        .resolve_link_id(l, &exhausted_links, &mut link_creates)
                        .await?
                    else {
                        return Err(StoreError::SchemaNegotiationExhausted {
                            attempts,
                            last: err,
                        });
                    };
                    let mut next = candidate.clone();
                    next.insert(column, Value::String(id));
                    push_derived(&mut queue, &mut seen, next);
                    last_err = Some(err);
                }
                (Some(Diagnostic::ForeignKeyViolation(column)), Some(l))
                    if l.column == column =>
                {
                    if link_creates >= MAX_LINK_CREATES {
                        return Err(StoreError::SchemaNegotiationExhausted {
                            attempts,
                            last: err,
                        });
                    }
                    let Some(desired) = candidate.get(&column).and_then(Value::as_str) else {
                        return Err(err.into());
                    };
                    // Recreate the referenced row so the existing reference
                    // becomes valid, then retry the identical candidate —
                    // the environment changed, not the shape.
                    let desired = desired.to_string();
                    self.create_link_row(l, Some(&desired)).await?;
                    link_creates += 1;
                    queue.push_front(candidate);
                    last_err = Some(err);
                }
                _ => return Err(err.into()),
            }
        }

        match last_err {
            Some(last) => Err(StoreError::SchemaNegotiationExhausted { attempts, last }),
            None => Err(StoreError::Decode(
                "negotiation ended with no candidates and no error".to_string(),
            )),
        }
    }

    /// Candidate seeds, richest to minimal.
    async fn seed_candidates(&self, base: &Row, link: Option<&LinkSpec>) -> Vec<Row> {
        let now = timestamp_value();

        let mut rich = base.clone();
        // Legacy deployments keep a duplicate name field.
        if let Some(title) = rich.get("title").cloned() {
            rich.entry("name").or_insert(title);
        } else if let Some(name) = rich.get("name").cloned() {
            rich.entry("title").or_insert(name);
        }
        if is_missing(&rich, "created_at") {
            rich.insert("created_at".to_string(), now.clone());
        }
        rich.insert("updated_at".to_string(), now.clone());
        if let Some(l) = link {
            if is_missing(&rich, l.column) {
                if let Some(id) = self.best_link_id(l).await {
                    rich.insert(l.column.to_string(), Value::String(id));
                }
            }
        }

        let mut with_timestamps = base.clone();
        if is_missing(&with_timestamps, "created_at") {
            with_timestamps.insert("created_at".to_string(), now.clone());
        }
        with_timestamps.insert("updated_at".to_string(), now);

        let mut minimal = Row::new();
        if let Some(id) = base.get("id").cloned() {
            minimal.insert("id".to_string(), id);
        }

        vec![rich, with_timestamps, base.clone(), minimal]
    }

    /// Best-known linkage id: the oldest existing row, if the relation is
    /// reachable at all. Lookup failures are tolerated — the sparser
    /// candidates simply omit the column.
    async fn best_link_id(&self, link: &LinkSpec) -> Option<String> {
        let opts = SelectOptions::default()
            .order("created_at", OrderDir::Asc)
            .limit(1);
        match self.backend().select(link.table, &[], &opts).await {
            Ok(rows) => rows.first().and_then(|row| {
                row.get("id")
                    .and_then(Value::as_str)
                    .map(ToString::to_string)
            }),
            Err(e) => {
                tracing::debug!(table = link.table, error = %e, "linkage lookup failed");
                None
            }
        }
    }

    /// Next untried existing linkage id, or a freshly created row within the
    /// per-call budget. `Ok(None)` means the budget is spent.
    async fn resolve_link_id(
        &self,
        link: &LinkSpec,
        exhausted: &HashSet<String>,
        creates: &mut usize,
    ) -> Result<Option<String>, StoreError> {
        let opts = SelectOptions::default()
            .order("created_at", OrderDir::Asc)
            .limit(20);
        if let Ok(rows) = self.backend().select(link.table, &[], &opts).await {
            for row in rows {
                if let Ok(id) = get_string(&row, "id") {
                    if !exhausted.contains(&id) {
                        return Ok(Some(id));
                    }
                }
            }
        }
        if *creates >= MAX_LINK_CREATES {
            return Ok(None);
        }
        *creates += 1;
        self.create_link_row(link, None).await.map(Some)
    }

    /// Create a linkage row, negotiating its own NOT NULL defaults.
    ///
    /// With a `desired` id, an id collision counts as success — the goal is a
    /// valid reference, and the row already existing satisfies it.
    async fn create_link_row(
        &self,
        link: &LinkSpec,
        desired: Option<&str>,
    ) -> Result<String, StoreError> {
        let id = desired.map_or_else(|| ids::new_id(ids::PREFIX_TEAM), ToString::to_string);
        let mut row = Row::new();
        row.insert("id".to_string(), Value::String(id.clone()));
        row.insert("created_at".to_string(), timestamp_value());

        let mut seen: HashSet<String> = HashSet::new();
        let mut rounds = 0usize;
        let mut last_err: Option<GatewayError> = None;

        while rounds < MAX_LINK_DEFAULT_ROUNDS && seen.insert(signature(&row)) {
            rounds += 1;
            let err = match self.backend().insert(link.table, &row).await {
                Ok(_) => return Ok(id),
                Err(err) => err,
            };
            match err.diagnostic().cloned() {
                Some(Diagnostic::UnknownColumn(column)) if row.contains_key(&column) => {
                    row.remove(&column);
                    last_err = Some(err);
                }
                Some(Diagnostic::NotNullViolation(column)) if is_missing(&row, &column) => {
                    let default = computed_default(&column, &row);
                    row.insert(column, default);
                    last_err = Some(err);
                }
                Some(Diagnostic::UniqueConflict(column))
                    if column == "id" && desired.is_some() =>
                {
                    return Ok(id);
                }
                _ => return Err(err.into()),
            }
        }

        match last_err {
            Some(last) => Err(StoreError::SchemaNegotiationExhausted {
                attempts: rounds,
                last,
            }),
            None => Err(StoreError::Decode(
                "linkage negotiation ended with no error".to_string(),
            )),
        }
    }
}

/// Canonical candidate signature: sorted field/value pairs.
fn signature(row: &Row) -> String {
    let sorted: BTreeMap<&String, &Value> = row.iter().collect();
    serde_json::to_string(&sorted).unwrap_or_default()
}

/// Push a derived candidate for immediate retry, unless its shape was
/// already tried.
fn push_derived(queue: &mut VecDeque<Row>, seen: &mut HashSet<String>, candidate: Row) {
    if seen.insert(signature(&candidate)) {
        queue.push_front(candidate);
    }
}

fn is_missing(row: &Row, column: &str) -> bool {
    !row.contains_key(column) || row.get(column).is_some_and(Value::is_null)
}

fn timestamp_value() -> Value {
    Value::String(Utc::now().to_rfc3339())
}

/// Computed default for a NOT NULL column the candidate lacks.
fn computed_default(column: &str, base: &Row) -> Value {
    if column == "id" || column.ends_with("_id") {
        let prefix = column
            .strip_suffix("_id")
            .filter(|p| !p.is_empty())
            .unwrap_or("row");
        return Value::String(ids::new_id(prefix));
    }
    if column.ends_with("_at") || column.contains("date") {
        return timestamp_value();
    }
    Value::String(title_fallback(base))
}

/// Human-readable fallback derived from the record's own title/name.
fn title_fallback(base: &Row) -> String {
    base.get("title")
        .or_else(|| base.get("name"))
        .and_then(Value::as_str)
        .map_or_else(|| "untitled".to_string(), ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn base_row() -> Row {
        let mut row = Row::new();
        row.insert("id".to_string(), Value::String("prj-1".to_string()));
        row.insert("title".to_string(), Value::String("Solar tracker".to_string()));
        row.insert("user_id".to_string(), Value::String("user-1".to_string()));
        row
    }

    #[test]
    fn signature_is_order_independent() {
        let mut a = Row::new();
        a.insert("b".to_string(), Value::from(1));
        a.insert("a".to_string(), Value::from(2));
        let mut b = Row::new();
        b.insert("a".to_string(), Value::from(2));
        b.insert("b".to_string(), Value::from(1));
        assert_eq!(signature(&a), signature(&b));
    }

    #[test]
    fn null_counts_as_missing() {
        let mut row = base_row();
        row.insert("team_id".to_string(), Value::Null);
        assert!(is_missing(&row, "team_id"));
        assert!(is_missing(&row, "absent"));
        assert!(!is_missing(&row, "title"));
    }

    #[test]
    fn default_for_id_like_column() {
        let value = computed_default("owner_id", &base_row());
        let Value::String(id) = value else {
            panic!("expected string default");
        };
        assert!(id.starts_with("owner-"), "got {id}");
    }

    #[test]
    fn default_for_timestamp_like_column() {
        let value = computed_default("submitted_at", &base_row());
        let Value::String(ts) = value else {
            panic!("expected string default");
        };
        assert!(ts.contains('T'), "expected RFC 3339 timestamp, got {ts}");
    }

    #[test]
    fn default_for_name_like_column_uses_title() {
        assert_eq!(
            computed_default("display_name", &base_row()),
            Value::String("Solar tracker".to_string())
        );
    }

    #[test]
    fn title_fallback_without_title_or_name() {
        assert_eq!(title_fallback(&Row::new()), "untitled");
    }

    mod negotiation {
        use super::*;
        use pretty_assertions::assert_eq;
        use crate::error::StoreError;
        use crate::test_support::helpers::{seed_jam, seed_project, test_service};
        use jam_core::enums::ProjectSource;
        use jam_gateway::TableBackend;

        #[tokio::test]
        async fn drops_unknown_columns_until_accepted() {
            let (svc, backend, _) = test_service();
            let jam = seed_jam(&svc, "alice").await;
            // Deployment whose projects relation never grew the newer columns.
            backend.restrict_columns(
                "projects",
                &["id", "title", "user_id", "jam_id", "created_at"],
            );

            let project = seed_project(&svc, &jam.id, "dave").await;
            assert_eq!(project.source, ProjectSource::Submission, "intent preserved");

            let stored = backend.rows("projects");
            assert_eq!(stored.len(), 1);
            assert!(!stored[0].contains_key("synced_at"));
            assert!(
                backend.insert_attempts("projects") <= 16,
                "negotiation must stay bounded, took {}",
                backend.insert_attempts("projects")
            );
        }

        #[tokio::test]
        async fn defaults_missing_not_null_linkage_by_creating_a_team() {
            let (svc, backend, _) = test_service();
            let jam = seed_jam(&svc, "alice").await;
            backend.require_not_null("projects", "team_id");
            backend.add_foreign_key("projects", "team_id", "teams");

            let project = seed_project(&svc, &jam.id, "dave").await;
            assert!(project.team_id.is_some(), "linkage id substituted");

            let teams = backend.rows("teams");
            assert_eq!(teams.len(), 1, "exactly one lazily created team");
        }

        #[tokio::test]
        async fn unique_conflict_substitutes_a_fresh_team() {
            let (svc, backend, _) = test_service();
            let jam = seed_jam(&svc, "alice").await;
            backend.require_not_null("projects", "team_id");
            backend.add_unique("projects", "team_id");
            backend.add_foreign_key("projects", "team_id", "teams");

            let first = seed_project(&svc, &jam.id, "dave").await;
            let second = seed_project(&svc, &jam.id, "erin").await;

            assert_ne!(first.team_id, second.team_id, "conflicting team replaced");
            assert_eq!(backend.rows("teams").len(), 2);
        }

        #[tokio::test]
        async fn fk_violation_recreates_the_referenced_row() {
            let (svc, backend, _) = test_service();
            backend.add_foreign_key("projects", "team_id", "teams");

            let mut base = base_row();
            base.insert(
                "team_id".to_string(),
                Value::String("team-ghost".to_string()),
            );
            let stored = svc
                .insert_negotiated("projects", base, Some(&TEAM_LINK))
                .await
                .unwrap();

            assert_eq!(
                stored.get("team_id").and_then(Value::as_str),
                Some("team-ghost")
            );
            let teams = backend.rows("teams");
            assert_eq!(teams.len(), 1);
            assert_eq!(teams[0].get("id").and_then(Value::as_str), Some("team-ghost"));
        }

        #[tokio::test]
        async fn exhaustion_surfaces_the_last_error() {
            let (svc, backend, _) = test_service();
            // Only `id` is a known column, but a column outside the set is
            // NOT NULL: every candidate either carries an unknown column or
            // misses the required one.
            backend.restrict_columns("projects", &["id"]);
            backend.require_not_null("projects", "secret");

            let err = svc
                .insert_negotiated("projects", base_row(), Some(&TEAM_LINK))
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                StoreError::SchemaNegotiationExhausted { .. }
            ));
        }

        #[tokio::test]
        async fn non_linkage_constraint_is_fatal() {
            let (svc, backend, _) = test_service();
            backend.add_unique("projects", "id");
            let mut seeded = base_row();
            seeded.insert("created_at".to_string(), timestamp_value());
            backend.insert("projects", &seeded).await.unwrap();

            let err = svc
                .insert_negotiated("projects", base_row(), Some(&TEAM_LINK))
                .await
                .unwrap_err();
            assert!(matches!(err, StoreError::Gateway(_)), "got {err:?}");
        }

        #[tokio::test]
        async fn schema_permission_denied_is_distinguished() {
            let (svc, backend, _) = test_service();
            backend.deny_schema("projects");

            let err = svc
                .insert_negotiated("projects", base_row(), None)
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                StoreError::Gateway(jam_gateway::GatewayError::SchemaPermission(_))
            ));
        }

        #[tokio::test]
        async fn never_retries_an_identical_signature() {
            let (svc, backend, _) = test_service();
            backend.restrict_columns(
                "projects",
                &["id", "title", "name", "user_id", "jam_id", "created_at", "updated_at"],
            );
            let jam = seed_jam(&svc, "alice").await;
            seed_project(&svc, &jam.id, "dave").await;

            // Candidates generated is small; attempts must not exceed a
            // generous multiple of the seed count.
            assert!(
                backend.insert_attempts("projects") <= 12,
                "took {} attempts",
                backend.insert_attempts("projects")
            );
        }
    }
}
