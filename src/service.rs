//! OnboardingService — the operation set exposed to the conversational agent
//! and the HTTP endpoints.
//!
//! One instance is constructed at startup and passed by `Arc` into request
//! handlers; all state lives in the session store, never in globals.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::directory::{DirectoryOutcome, DirectoryService};
use crate::error::{Error, Result, SchemaError, ValidationError};
use crate::report::{StatusReportEntry, build_report};
use crate::schema::{QuestionSource, Schema, normalize};
use crate::session::{Scope, SessionIdentity, SessionStore};
use crate::validate::validate;

/// Short key (under the `app` scope) caching the normalized schema.
pub const SCHEMA_STATE_KEY: &str = "question_schema";

/// Coordinates schema loading, answer collection, and registration for one
/// process lifetime.
pub struct OnboardingService {
    source: Arc<dyn QuestionSource>,
    store: Arc<dyn SessionStore>,
    directory: Arc<dyn DirectoryService>,
}

impl OnboardingService {
    pub fn new(
        source: Arc<dyn QuestionSource>,
        store: Arc<dyn SessionStore>,
        directory: Arc<dyn DirectoryService>,
    ) -> Self {
        Self {
            source,
            store,
            directory,
        }
    }

    /// Fetch and normalize the question schema without touching any session.
    pub async fn fetch_schema(&self) -> std::result::Result<Schema, SchemaError> {
        let rows = self.source.fetch_rows().await?;
        normalize(&rows)
    }

    /// Fetch, normalize, and cache the schema in the session's `app` scope.
    pub async fn load_schema(&self, session: &SessionIdentity) -> Result<Schema> {
        let schema = self.fetch_schema().await?;

        let snapshot = serde_json::to_value(&schema)
            .map_err(|e| Error::Schema(SchemaError::SourceUnavailable(e.to_string())))?;
        self.store
            .set_many(
                session,
                Scope::App,
                BTreeMap::from([(SCHEMA_STATE_KEY.to_string(), snapshot)]),
            )
            .await?;

        tracing::info!(session = %session, questions = schema.len(), "Schema loaded");
        Ok(schema)
    }

    /// The schema cached for this session, or empty if none was loaded.
    pub async fn cached_schema(&self, session: &SessionIdentity) -> Schema {
        self.store
            .get(session, Scope::App, SCHEMA_STATE_KEY)
            .await
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    /// Per-question completion status, ordered by priority.
    pub async fn status(&self, session: &SessionIdentity) -> Vec<StatusReportEntry> {
        let schema = self.cached_schema(session).await;
        build_report(&schema, self.store.as_ref(), session).await
    }

    /// Save one or more answers into the session's `user` scope.
    ///
    /// All-or-nothing; echoes the written entries under `user:<key>` names.
    pub async fn save_answers(
        &self,
        session: &SessionIdentity,
        entries: Map<String, Value>,
    ) -> Result<BTreeMap<String, Value>> {
        let entries: BTreeMap<String, Value> = entries.into_iter().collect();
        let written = self.store.set_many(session, Scope::User, entries).await?;
        tracing::debug!(session = %session, keys = written.len(), "Answers saved");
        Ok(written)
    }

    /// Validate a payload against a schema and forward it to the directory.
    ///
    /// The directory's verdict is returned verbatim (including rejections);
    /// only validation failures surface as errors.
    pub async fn register(
        &self,
        payload: &Map<String, Value>,
        schema: &Schema,
    ) -> std::result::Result<DirectoryOutcome, ValidationError> {
        validate(payload, schema)?;

        match self.directory.create_user(payload).await {
            Ok(data) => Ok(DirectoryOutcome::accepted(data)),
            Err(e) => {
                tracing::error!(status = e.status, "Directory rejected registration: {}", e.message);
                Ok(DirectoryOutcome::rejected(&e))
            }
        }
    }

    /// Assemble the collected answers for this session and register them.
    ///
    /// May be called with optional questions still pending; the validator
    /// only requires the mandatory set.
    pub async fn finalize(&self, session: &SessionIdentity) -> Result<DirectoryOutcome> {
        let schema = self.cached_schema(session).await;

        let mut payload = Map::new();
        for def in &schema {
            if let Some(value) = self
                .store
                .get(session, Scope::User, &def.entity_key)
                .await
                && !value.is_null()
            {
                payload.insert(def.entity_key.clone(), value);
            }
        }

        let outcome = self.register(&payload, &schema).await?;
        tracing::info!(
            session = %session,
            success = outcome.success,
            status = outcome.status_code,
            "Registration finalized"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::DirectoryService;
    use crate::error::DirectoryError;
    use crate::report::QuestionStatus;
    use crate::session::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::Mutex;

    struct StubSource {
        rows: Vec<Vec<String>>,
    }

    #[async_trait]
    impl QuestionSource for StubSource {
        async fn fetch_rows(&self) -> std::result::Result<Vec<Vec<String>>, SchemaError> {
            if self.rows.is_empty() {
                return Err(SchemaError::SourceUnavailable("offline".to_string()));
            }
            Ok(self.rows.clone())
        }
    }

    #[derive(Default)]
    struct RecordingDirectory {
        submitted: Mutex<Vec<Map<String, Value>>>,
    }

    #[async_trait]
    impl DirectoryService for RecordingDirectory {
        async fn create_user(
            &self,
            payload: &Map<String, Value>,
        ) -> std::result::Result<Value, DirectoryError> {
            if payload.is_empty() {
                return Err(DirectoryError {
                    status: 400,
                    message: "registration payload must be a non-empty map".to_string(),
                });
            }
            self.submitted.lock().await.push(payload.clone());
            Ok(json!({"created": true}))
        }
    }

    fn sheet_rows() -> Vec<Vec<String>> {
        let rows: Vec<Vec<&str>> = vec![
            vec![
                "questioned_entity",
                "question_phrasing_example",
                "question_order_priority",
                "is_mandatory",
                "is_active",
            ],
            vec!["name", "What's your name?", "1", "Y", "y"],
            vec!["email", "Your email?", "2", "Y", "y"],
            vec!["bio", "Tell me about yourself", "", "N", "y"],
        ];
        rows.into_iter()
            .map(|r| r.into_iter().map(String::from).collect())
            .collect()
    }

    fn service_with(rows: Vec<Vec<String>>) -> (OnboardingService, Arc<RecordingDirectory>) {
        let directory = Arc::new(RecordingDirectory::default());
        let service = OnboardingService::new(
            Arc::new(StubSource { rows }),
            Arc::new(MemoryStore::new()),
            directory.clone(),
        );
        (service, directory)
    }

    #[tokio::test]
    async fn load_schema_caches_per_session() {
        let (service, _) = service_with(sheet_rows());
        let session = SessionIdentity::new();

        let schema = service.load_schema(&session).await.unwrap();
        assert_eq!(schema.len(), 3);

        let cached = service.cached_schema(&session).await;
        assert_eq!(cached, schema);

        // A different session sees no cache.
        let other = SessionIdentity::new();
        assert!(service.cached_schema(&other).await.is_empty());
    }

    #[tokio::test]
    async fn status_before_load_is_empty() {
        let (service, _) = service_with(sheet_rows());
        let session = SessionIdentity::new();
        assert!(service.status(&session).await.is_empty());
    }

    #[tokio::test]
    async fn save_then_status_marks_completed() {
        let (service, _) = service_with(sheet_rows());
        let session = SessionIdentity::new();
        service.load_schema(&session).await.unwrap();

        let written = service
            .save_answers(&session, Map::from_iter([("name".to_string(), json!("Ada"))]))
            .await
            .unwrap();
        assert_eq!(written.get("user:name"), Some(&json!("Ada")));

        let report = service.status(&session).await;
        assert_eq!(report[0].entity_key, "name");
        assert_eq!(report[0].status, QuestionStatus::Completed);
        assert_eq!(report[1].status, QuestionStatus::Pending);
    }

    #[tokio::test]
    async fn finalize_submits_collected_answers() {
        let (service, directory) = service_with(sheet_rows());
        let session = SessionIdentity::new();
        service.load_schema(&session).await.unwrap();
        service
            .save_answers(
                &session,
                Map::from_iter([
                    ("name".to_string(), json!("Ada")),
                    ("email".to_string(), json!("ada@b.com")),
                ]),
            )
            .await
            .unwrap();

        // Early finalize: bio is optional and still pending.
        let outcome = service.finalize(&session).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.status_code, 200);

        let submitted = directory.submitted.lock().await;
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].get("name"), Some(&json!("Ada")));
        assert!(!submitted[0].contains_key("bio"));
    }

    #[tokio::test]
    async fn finalize_without_mandatory_answers_fails_validation() {
        let (service, directory) = service_with(sheet_rows());
        let session = SessionIdentity::new();
        service.load_schema(&session).await.unwrap();
        service
            .save_answers(&session, Map::from_iter([("name".to_string(), json!("Ada"))]))
            .await
            .unwrap();

        let err = service.finalize(&session).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::Missing(ref fields)) if fields == &["email"]
        ));
        assert!(directory.submitted.lock().await.is_empty());
    }

    #[tokio::test]
    async fn finalize_with_no_schema_fails_open_into_the_directory() {
        // Schema never loaded: validation is skipped, and the empty payload
        // is the directory's problem (it rejects with 400).
        let (service, _) = service_with(sheet_rows());
        let session = SessionIdentity::new();

        let outcome = service.finalize(&session).await.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.status_code, 400);
    }

    #[tokio::test]
    async fn fetch_schema_surfaces_source_errors() {
        let (service, _) = service_with(Vec::new());
        assert!(matches!(
            service.fetch_schema().await,
            Err(SchemaError::SourceUnavailable(_))
        ));
    }
}
