//! Question schema — definitions, normalization, and the source seam.

pub mod model;
pub mod normalize;
pub mod source;

pub use model::{QuestionDefinition, Schema};
pub use normalize::normalize;
pub use source::{HttpQuestionSource, QuestionSource};
