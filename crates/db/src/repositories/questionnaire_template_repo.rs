//! Repository for the `questionnaire_templates` table.

use memberdesk_core::questionnaire::VERSION_STATUS_INITIAL;
use memberdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::questionnaire::{
    CreateQuestionnaireTemplate, QuestionnaireTemplate, QuestionnaireVersion,
};
use crate::repositories::questionnaire_version_repo::COLUMNS as VERSION_COLUMNS;

/// Column list for questionnaire_templates queries.
const COLUMNS: &str = "id, title, description, created_by, active_version_id, \
    created_at, updated_at";

/// Provides create, lookup and publish operations for questionnaire templates.
pub struct QuestionnaireTemplateRepo;

impl QuestionnaireTemplateRepo {
    /// Insert a template and its version 1 in a single transaction.
    ///
    /// The active pointer is left unset; publishing is a separate step.
    pub async fn create_with_initial_version(
        pool: &PgPool,
        input: &CreateQuestionnaireTemplate,
    ) -> Result<(QuestionnaireTemplate, QuestionnaireVersion), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO questionnaire_templates (title, description, created_by)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        let template = sqlx::query_as::<_, QuestionnaireTemplate>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.created_by)
            .fetch_one(&mut *tx)
            .await?;

        let query = format!(
            "INSERT INTO questionnaire_versions
                (template_id, version_number, schema_definition, status, created_by)
             VALUES ($1, 1, $2, $3, $4)
             RETURNING {VERSION_COLUMNS}"
        );
        let version = sqlx::query_as::<_, QuestionnaireVersion>(&query)
            .bind(template.id)
            .bind(&input.schema_definition)
            .bind(VERSION_STATUS_INITIAL)
            .bind(input.created_by)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((template, version))
    }

    /// Find a template by its primary key.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<QuestionnaireTemplate>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM questionnaire_templates WHERE id = $1");
        sqlx::query_as::<_, QuestionnaireTemplate>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all templates, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<QuestionnaireTemplate>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM questionnaire_templates ORDER BY id DESC");
        sqlx::query_as::<_, QuestionnaireTemplate>(&query)
            .fetch_all(pool)
            .await
    }

    /// Point the template's active version at `version_id` in one statement.
    ///
    /// Returns `None` when the template does not exist or the version does not
    /// belong to it; the caller distinguishes the two.
    pub async fn set_active_version(
        pool: &PgPool,
        template_id: DbId,
        version_id: DbId,
    ) -> Result<Option<QuestionnaireTemplate>, sqlx::Error> {
        let query = format!(
            "UPDATE questionnaire_templates SET active_version_id = $2
             WHERE id = $1
               AND EXISTS (
                   SELECT 1 FROM questionnaire_versions v
                   WHERE v.id = $2 AND v.template_id = $1
               )
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QuestionnaireTemplate>(&query)
            .bind(template_id)
            .bind(version_id)
            .fetch_optional(pool)
            .await
    }
}
