//! Raw sheet rows → validated, ordered question schema.

use std::collections::HashSet;

use crate::error::SchemaError;
use crate::schema::model::{QuestionDefinition, Schema};

/// Sheet column holding the answer field name.
pub const COL_ENTITY: &str = "questioned_entity";
/// Sheet column holding the example phrasing.
pub const COL_PHRASING: &str = "question_phrasing_example";
/// Sheet column holding the ask-order priority.
pub const COL_PRIORITY: &str = "question_order_priority";
/// Sheet column holding the mandatory flag (`Y`/non-`Y`).
pub const COL_MANDATORY: &str = "is_mandatory";
/// Sheet column gating whether a row is live.
pub const COL_ACTIVE: &str = "is_active";

/// Cell values (trimmed, lowercased) that count as "active".
const TRUTHY: &[&str] = &["true", "1", "yes", "y"];

/// Convert raw tabular rows (header row + data rows) into the active schema.
///
/// Pure transform: filters inactive rows, maps header→cell positionally
/// (short rows pad with empty strings), resolves duplicate entity keys
/// (last occurrence wins), and orders by priority ascending with
/// absent/non-numeric priorities last. The sort is stable, so equal
/// priorities retain sheet order.
pub fn normalize(rows: &[Vec<String>]) -> Result<Schema, SchemaError> {
    if rows.is_empty() {
        return Err(SchemaError::Empty);
    }

    let headers: Vec<String> = rows[0]
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    let active_idx = headers
        .iter()
        .position(|h| h == COL_ACTIVE)
        .ok_or_else(|| SchemaError::MissingColumn(COL_ACTIVE.to_string()))?;

    let data_rows = &rows[1..];
    if data_rows.is_empty() {
        return Err(SchemaError::Empty);
    }

    let column = |name: &str| headers.iter().position(|h| h == name);
    let entity_idx = column(COL_ENTITY);
    let phrasing_idx = column(COL_PHRASING);
    let priority_idx = column(COL_PRIORITY);
    let mandatory_idx = column(COL_MANDATORY);

    let cell = |row: &[String], idx: Option<usize>| -> String {
        idx.and_then(|i| row.get(i)).cloned().unwrap_or_default()
    };

    let mut defs: Vec<QuestionDefinition> = Vec::new();
    for row in data_rows {
        // Rows too short to carry the is_active cell are inactive by definition.
        let active = row
            .get(active_idx)
            .map(|v| TRUTHY.contains(&v.trim().to_lowercase().as_str()))
            .unwrap_or(false);
        if !active {
            continue;
        }

        let entity_key = cell(row, entity_idx);
        if entity_key.is_empty() {
            // A definition without an answer field name is unaddressable.
            continue;
        }

        defs.push(QuestionDefinition {
            entity_key,
            example_phrasing: cell(row, phrasing_idx),
            priority: cell(row, priority_idx).trim().parse::<i64>().ok(),
            is_mandatory: cell(row, mandatory_idx).trim().eq_ignore_ascii_case("y"),
        });
    }

    // Duplicate entity keys: last occurrence wins, at its own position.
    let mut seen: HashSet<String> = HashSet::new();
    let mut deduped: Vec<QuestionDefinition> = Vec::with_capacity(defs.len());
    for def in defs.into_iter().rev() {
        if seen.insert(def.entity_key.clone()) {
            deduped.push(def);
        }
    }
    deduped.reverse();

    deduped.sort_by_key(QuestionDefinition::priority_rank);
    Ok(deduped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(spec: &[&[&str]]) -> Vec<Vec<String>> {
        spec.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    const HEADER: &[&str] = &[
        "questioned_entity",
        "question_phrasing_example",
        "question_order_priority",
        "is_mandatory",
        "is_active",
    ];

    #[test]
    fn missing_is_active_column_fails() {
        let raw = rows(&[
            &["questioned_entity", "question_phrasing_example"],
            &["name", "What's your name?"],
        ]);
        assert!(matches!(
            normalize(&raw),
            Err(SchemaError::MissingColumn(col)) if col == "is_active"
        ));
    }

    #[test]
    fn no_data_rows_fails_empty() {
        assert!(matches!(normalize(&[]), Err(SchemaError::Empty)));
        let raw = rows(&[HEADER]);
        assert!(matches!(normalize(&raw), Err(SchemaError::Empty)));
    }

    #[test]
    fn inactive_rows_are_filtered() {
        let raw = rows(&[
            HEADER,
            &["name", "What's your name?", "1", "Y", "TRUE"],
            &["fax", "Got a fax number?", "2", "N", "no"],
            &["email", "Your email?", "3", "y", " Yes "],
            &["pager", "Got a pager?", "4", "N", ""],
        ]);
        let schema = normalize(&raw).unwrap();
        let keys: Vec<&str> = schema.iter().map(|q| q.entity_key.as_str()).collect();
        assert_eq!(keys, vec!["name", "email"]);
    }

    #[test]
    fn short_rows_pad_with_empty_strings_but_need_the_active_cell() {
        let raw = rows(&[
            &["questioned_entity", "is_active", "question_phrasing_example"],
            &["name", "y"],
            &["email", "y", "Your email?"],
        ]);
        let schema = normalize(&raw).unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema[0].example_phrasing, "");
        assert_eq!(schema[1].example_phrasing, "Your email?");

        // Row that ends before the is_active column is dropped, not an error.
        let raw = rows(&[
            &["questioned_entity", "question_phrasing_example", "is_active"],
            &["name", "What's your name?"],
        ]);
        let schema = normalize(&raw).unwrap();
        assert!(schema.is_empty());
    }

    #[test]
    fn sorted_by_priority_with_absent_last_and_stable_ties() {
        let raw = rows(&[
            HEADER,
            &["bio", "Tell me about yourself", "", "N", "y"],
            &["email", "Your email?", "2", "Y", "y"],
            &["nickname", "Any nickname?", "oops", "N", "y"],
            &["name", "What's your name?", "1", "Y", "y"],
            &["city", "Where do you live?", "2", "N", "y"],
        ]);
        let schema = normalize(&raw).unwrap();
        let keys: Vec<&str> = schema.iter().map(|q| q.entity_key.as_str()).collect();
        // bio (absent) and nickname (non-numeric) keep sheet order at the end.
        assert_eq!(keys, vec!["name", "email", "city", "bio", "nickname"]);
    }

    #[test]
    fn duplicate_entity_key_last_occurrence_wins() {
        let raw = rows(&[
            HEADER,
            &["name", "First phrasing", "1", "N", "y"],
            &["email", "Your email?", "2", "Y", "y"],
            &["name", "Second phrasing", "3", "Y", "y"],
        ]);
        let schema = normalize(&raw).unwrap();
        assert_eq!(schema.len(), 2);
        let name = schema.iter().find(|q| q.entity_key == "name").unwrap();
        assert_eq!(name.example_phrasing, "Second phrasing");
        assert_eq!(name.priority, Some(3));
        assert!(name.is_mandatory);
    }

    #[test]
    fn mandatory_flag_is_case_insensitive_y() {
        let raw = rows(&[
            HEADER,
            &["a", "", "1", "y", "y"],
            &["b", "", "2", "Y", "y"],
            &["c", "", "3", "yes", "y"],
            &["d", "", "4", "", "y"],
        ]);
        let schema = normalize(&raw).unwrap();
        let flags: Vec<bool> = schema.iter().map(|q| q.is_mandatory).collect();
        assert_eq!(flags, vec![true, true, false, false]);
    }

    #[test]
    fn headers_are_trimmed_and_lowercased() {
        let raw = rows(&[
            &[" Questioned_Entity ", " IS_ACTIVE "],
            &["name", "y"],
        ]);
        let schema = normalize(&raw).unwrap();
        assert_eq!(schema[0].entity_key, "name");
    }
}
