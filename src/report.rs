//! Per-question completion status, joined from schema + session state.

use serde::Serialize;
use serde_json::Value;

use crate::schema::{QuestionDefinition, Schema};
use crate::session::{Scope, SessionIdentity, SessionStore};

/// Completion state of one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionStatus {
    Pending,
    Completed,
}

/// One row of the status report — derived, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReportEntry {
    pub entity_key: String,
    pub example_phrasing: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    pub is_mandatory: bool,
    pub status: QuestionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_value: Option<Value>,
}

/// Whether a stored value counts as an answer.
///
/// Truthiness, not presence: null, false, 0, "" and empty collections are
/// all PENDING. The string "0" IS an answer — only the value's own
/// emptiness matters, matching the source system's dynamic check.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Join schema and session state into an ordered status report.
///
/// Reads `user:<entity_key>` for each definition and re-sorts by priority
/// ascending (absent priority last, stable), independently of schema order.
/// An empty schema yields an empty report.
pub async fn build_report(
    schema: &Schema,
    store: &dyn SessionStore,
    session: &SessionIdentity,
) -> Vec<StatusReportEntry> {
    let mut report = Vec::with_capacity(schema.len());
    for def in schema {
        let current_value = store.get(session, Scope::User, &def.entity_key).await;
        let status = match current_value.as_ref() {
            Some(v) if is_truthy(v) => QuestionStatus::Completed,
            _ => QuestionStatus::Pending,
        };
        report.push(StatusReportEntry {
            entity_key: def.entity_key.clone(),
            example_phrasing: def.example_phrasing.clone(),
            priority: def.priority,
            is_mandatory: def.is_mandatory,
            status,
            current_value,
        });
    }
    report.sort_by_key(|entry| entry.priority.unwrap_or(i64::MAX));
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemoryStore;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn def(key: &str, priority: Option<i64>, mandatory: bool) -> QuestionDefinition {
        QuestionDefinition {
            entity_key: key.to_string(),
            example_phrasing: format!("Tell me your {key}"),
            priority,
            is_mandatory: mandatory,
        }
    }

    async fn save(store: &MemoryStore, session: &SessionIdentity, pairs: &[(&str, Value)]) {
        let entries: BTreeMap<String, Value> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        store.set_many(session, Scope::User, entries).await.unwrap();
    }

    #[test]
    fn truthiness_mirrors_the_source_check() {
        assert!(is_truthy(&json!("Ada")));
        assert!(is_truthy(&json!("0"))); // non-empty string IS an answer
        assert!(is_truthy(&json!(36)));
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(["a"])));

        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!({})));
    }

    #[tokio::test]
    async fn empty_schema_yields_empty_report() {
        let store = MemoryStore::new();
        let session = SessionIdentity::new();
        let report = build_report(&Schema::new(), &store, &session).await;
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn spec_scenario_name_email_bio() {
        let store = MemoryStore::new();
        let session = SessionIdentity::new();
        let schema = vec![
            def("name", Some(1), true),
            def("email", Some(2), true),
            def("bio", None, false),
        ];

        let report = build_report(&schema, &store, &session).await;
        let keys: Vec<&str> = report.iter().map(|e| e.entity_key.as_str()).collect();
        assert_eq!(keys, vec!["name", "email", "bio"]);
        assert!(report.iter().all(|e| e.status == QuestionStatus::Pending));

        save(&store, &session, &[("name", json!("Ada"))]).await;
        let report = build_report(&schema, &store, &session).await;
        assert_eq!(report[0].status, QuestionStatus::Completed);
        assert_eq!(report[0].current_value, Some(json!("Ada")));
        assert_eq!(report[1].status, QuestionStatus::Pending);
        assert_eq!(report[2].status, QuestionStatus::Pending);
    }

    #[tokio::test]
    async fn falsy_saved_values_stay_pending() {
        let store = MemoryStore::new();
        let session = SessionIdentity::new();
        let schema = vec![def("age", Some(1), true), def("nick", Some(2), false)];

        save(&store, &session, &[("age", json!(0)), ("nick", json!(""))]).await;
        let report = build_report(&schema, &store, &session).await;
        assert_eq!(report[0].status, QuestionStatus::Pending);
        assert_eq!(report[0].current_value, Some(json!(0)));
        assert_eq!(report[1].status, QuestionStatus::Pending);
    }

    #[tokio::test]
    async fn report_resorts_by_priority_independently_of_schema_order() {
        let store = MemoryStore::new();
        let session = SessionIdentity::new();
        // Deliberately out of order, with a tie and an absent priority.
        let schema = vec![
            def("bio", None, false),
            def("email", Some(2), true),
            def("name", Some(1), true),
            def("city", Some(2), false),
        ];

        let report = build_report(&schema, &store, &session).await;
        let keys: Vec<&str> = report.iter().map(|e| e.entity_key.as_str()).collect();
        // Ties (email/city) keep their relative schema order; absent goes last.
        assert_eq!(keys, vec!["name", "email", "city", "bio"]);
    }

    #[test]
    fn status_serializes_screaming() {
        assert_eq!(
            serde_json::to_value(QuestionStatus::Pending).unwrap(),
            json!("PENDING")
        );
        assert_eq!(
            serde_json::to_value(QuestionStatus::Completed).unwrap(),
            json!("COMPLETED")
        );
    }
}
