//! Question definition model.

use serde::{Deserialize, Serialize};

/// One onboarding question the engine knows about.
///
/// Produced by [`crate::schema::normalize`] from a raw sheet row; immutable
/// once produced. The phrasing is opaque to the engine — only the
/// conversational agent reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDefinition {
    /// Canonical answer field name, unique across the active schema.
    pub entity_key: String,
    /// Illustrative phrasing for the agent to adapt.
    pub example_phrasing: String,
    /// Ask-order priority; lower is asked sooner, absent sorts last.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    /// Whether the answer is required before registration.
    pub is_mandatory: bool,
}

/// The ordered, active question set for one page/session load.
pub type Schema = Vec<QuestionDefinition>;

impl QuestionDefinition {
    /// Sort key placing absent/non-numeric priorities after every numeric one.
    pub fn priority_rank(&self) -> i64 {
        self.priority.unwrap_or(i64::MAX)
    }
}
