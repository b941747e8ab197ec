//! Registration payload validation against the runtime schema.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::schema::Schema;

/// Validate a flat registration payload against the active schema.
///
/// The field sets are computed at call time because the schema only exists
/// at runtime. Missing mandatory fields are reported before unexpected ones.
///
/// Fail-open: an empty schema (the question source was down) accepts any
/// payload rather than blocking registrations. Logged, since it disables
/// all field checking.
pub fn validate(payload: &Map<String, Value>, schema: &Schema) -> Result<(), ValidationError> {
    if schema.is_empty() {
        tracing::warn!("Validation skipped: empty schema, accepting payload as-is");
        return Ok(());
    }

    let accepted: HashSet<&str> = schema.iter().map(|q| q.entity_key.as_str()).collect();
    let required: HashSet<&str> = schema
        .iter()
        .filter(|q| q.is_mandatory)
        .map(|q| q.entity_key.as_str())
        .collect();

    let mut missing: Vec<String> = required
        .iter()
        .filter(|field| !payload.contains_key(**field))
        .map(|field| field.to_string())
        .collect();
    if !missing.is_empty() {
        missing.sort();
        return Err(ValidationError::Missing(missing));
    }

    let mut unexpected: Vec<String> = payload
        .keys()
        .filter(|key| !accepted.contains(key.as_str()))
        .cloned()
        .collect();
    if !unexpected.is_empty() {
        unexpected.sort();
        return Err(ValidationError::Unexpected(unexpected));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::QuestionDefinition;
    use serde_json::json;

    fn schema() -> Schema {
        vec![
            QuestionDefinition {
                entity_key: "name".to_string(),
                example_phrasing: String::new(),
                priority: Some(1),
                is_mandatory: true,
            },
            QuestionDefinition {
                entity_key: "email".to_string(),
                example_phrasing: String::new(),
                priority: Some(2),
                is_mandatory: true,
            },
            QuestionDefinition {
                entity_key: "bio".to_string(),
                example_phrasing: String::new(),
                priority: None,
                is_mandatory: false,
            },
        ]
    }

    fn payload(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn complete_mandatory_payload_is_accepted() {
        let p = payload(&[("name", json!("Ada")), ("email", json!("a@b.com"))]);
        assert!(validate(&p, &schema()).is_ok());
    }

    #[test]
    fn optional_fields_may_be_omitted_or_included() {
        let p = payload(&[
            ("name", json!("Ada")),
            ("email", json!("a@b.com")),
            ("bio", json!("mathematician")),
        ]);
        assert!(validate(&p, &schema()).is_ok());
    }

    #[test]
    fn missing_mandatory_fields_are_reported_sorted() {
        let p = payload(&[("bio", json!("x"))]);
        assert_eq!(
            validate(&p, &schema()),
            Err(ValidationError::Missing(vec![
                "email".to_string(),
                "name".to_string()
            ]))
        );
    }

    #[test]
    fn unexpected_fields_are_rejected() {
        let p = payload(&[
            ("name", json!("Ada")),
            ("email", json!("a@b.com")),
            ("unknown_field", json!("x")),
        ]);
        assert_eq!(
            validate(&p, &schema()),
            Err(ValidationError::Unexpected(vec![
                "unknown_field".to_string()
            ]))
        );
    }

    #[test]
    fn missing_is_reported_before_unexpected() {
        let p = payload(&[("unknown_field", json!("x"))]);
        assert!(matches!(
            validate(&p, &schema()),
            Err(ValidationError::Missing(_))
        ));
    }

    #[test]
    fn empty_schema_fails_open_for_any_payload() {
        let p = payload(&[("anything", json!("goes")), ("really", json!(42))]);
        assert!(validate(&p, &Schema::new()).is_ok());
        assert!(validate(&Map::new(), &Schema::new()).is_ok());
    }

    #[test]
    fn presence_not_truthiness_satisfies_the_validator() {
        // The validator checks key presence only; "" still counts as supplied.
        let p = payload(&[("name", json!("")), ("email", json!(null))]);
        assert!(validate(&p, &schema()).is_ok());
    }
}
