use crate::conditional_logic::RuleError;
use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A conditional-logic rule could not be parsed. Never recovered from by
    /// substituting a visibility default.
    #[error("Invalid conditional logic: {0}")]
    InvalidRule(#[from] RuleError),
}
