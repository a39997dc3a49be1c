//! The versioned template store contract.
//!
//! [`TemplateStore`] owns the lifecycle of a questionnaire template: creation,
//! schema edits (each appending an immutable version), restores, and
//! publication (moving the active pointer). Two implementations exist:
//!
//! - [`PgTemplateStore`]: backed by Postgres through the repository layer
//! - [`InMemoryTemplateStore`]: process-local, used when no database is
//!   configured and in tests
//!
//! Both guarantee per template that version numbers are exactly `1..=N`, that
//! the active pointer only ever references one of the template's own versions,
//! and that operations on different templates never wait on each other.

mod memory;
mod postgres;

pub use memory::InMemoryTemplateStore;
pub use postgres::PgTemplateStore;

use async_trait::async_trait;
use memberdesk_core::error::CoreError;
use memberdesk_core::questionnaire::{TEMPLATE_ENTITY, VERSION_ENTITY};
use memberdesk_core::types::DbId;

use crate::models::questionnaire::{
    CreateQuestionnaireTemplate, CreateQuestionnaireVersion, QuestionnaireTemplate,
    QuestionnaireVersion,
};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error returned by every [`TemplateStore`] operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// NotFound / Conflict and other domain errors.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub(crate) fn template_not_found(id: DbId) -> StoreError {
    StoreError::Core(CoreError::NotFound {
        entity: TEMPLATE_ENTITY,
        id,
    })
}

pub(crate) fn version_not_found(id: DbId) -> StoreError {
    StoreError::Core(CoreError::NotFound {
        entity: VERSION_ENTITY,
        id,
    })
}

pub(crate) fn version_not_in_template(
    version_id: DbId,
    owner_id: DbId,
    template_id: DbId,
) -> StoreError {
    StoreError::Core(CoreError::Conflict(format!(
        "Questionnaire version {version_id} belongs to template {owner_id}, \
         not template {template_id}"
    )))
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// Append-only version ledger plus active pointer, per questionnaire template.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Short backend name reported by the health endpoint.
    fn backend(&self) -> &'static str;

    /// Confirm the backing storage is reachable.
    async fn health_check(&self) -> StoreResult<()>;

    /// Create a template and atomically append version 1 with the given
    /// schema. The active pointer stays unset until [`publish`](Self::publish).
    async fn create(
        &self,
        input: &CreateQuestionnaireTemplate,
    ) -> StoreResult<QuestionnaireTemplate>;

    /// Append a new version numbered one past the template's current maximum.
    async fn update(
        &self,
        template_id: DbId,
        input: &CreateQuestionnaireVersion,
    ) -> StoreResult<QuestionnaireVersion>;

    /// Point the template's active version at `version_id`. Idempotent.
    ///
    /// Fails with NotFound for an unknown template or version and with
    /// Conflict when the version belongs to a different template.
    async fn publish(
        &self,
        template_id: DbId,
        version_id: DbId,
    ) -> StoreResult<QuestionnaireTemplate>;

    /// Append a new version whose schema is a copy of `version_id`'s.
    ///
    /// Same errors as [`publish`](Self::publish). The active pointer is not
    /// moved.
    async fn restore(
        &self,
        template_id: DbId,
        version_id: DbId,
        restored_by: Option<DbId>,
    ) -> StoreResult<QuestionnaireVersion>;

    async fn get_template(&self, template_id: DbId) -> StoreResult<QuestionnaireTemplate>;

    /// All templates, newest first.
    async fn list_templates(&self) -> StoreResult<Vec<QuestionnaireTemplate>>;

    async fn get_version(&self, version_id: DbId) -> StoreResult<QuestionnaireVersion>;

    /// Every version of the template, newest first.
    async fn get_version_history(
        &self,
        template_id: DbId,
    ) -> StoreResult<Vec<QuestionnaireVersion>>;

    /// The version the active pointer references, or `None` before the first
    /// publish.
    async fn get_active_version(
        &self,
        template_id: DbId,
    ) -> StoreResult<Option<QuestionnaireVersion>>;
}
