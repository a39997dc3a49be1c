//! Questionnaire template and version models and DTOs.
//!
//! Defines the row structs for `questionnaire_templates` and
//! `questionnaire_versions` and the create DTOs used by the repository and
//! store layers.

use memberdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// A row from the `questionnaire_templates` table.
///
/// `active_version_id` is `None` until the first publish.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct QuestionnaireTemplate {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub created_by: DbId,
    pub active_version_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `questionnaire_versions` table. Never updated after insert.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct QuestionnaireVersion {
    pub id: DbId,
    pub template_id: DbId,
    pub version_number: i32,
    /// Opaque serialized schema document, stored and returned verbatim.
    pub schema_definition: String,
    /// One of `memberdesk_core::questionnaire::VALID_VERSION_STATUSES`.
    pub status: String,
    pub change_summary: Option<String>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Create DTOs
// ---------------------------------------------------------------------------

/// Input for creating a template together with its first version.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuestionnaireTemplate {
    pub title: String,
    pub description: Option<String>,
    pub schema_definition: String,
    pub created_by: DbId,
}

/// Input for appending a version to an existing template.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuestionnaireVersion {
    pub schema_definition: String,
    pub change_summary: Option<String>,
    pub created_by: Option<DbId>,
}
