//! Repository for the `questionnaire_versions` table.
//!
//! Versions are immutable snapshots; this repo only inserts and reads.

use memberdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::questionnaire::{CreateQuestionnaireVersion, QuestionnaireVersion};

/// Column list for questionnaire_versions queries.
pub(crate) const COLUMNS: &str = "id, template_id, version_number, schema_definition, \
    status, change_summary, created_by, created_at";

/// Provides append and read operations for questionnaire versions.
pub struct QuestionnaireVersionRepo;

impl QuestionnaireVersionRepo {
    /// Append a version with number `MAX(version_number) + 1`.
    ///
    /// The template row is locked with `FOR UPDATE` before the maximum is
    /// read, so concurrent appends to the same template run one after the
    /// other and always see the previous append's number. Appends to other
    /// templates are not blocked.
    ///
    /// Returns `None` if the template does not exist.
    pub async fn append(
        pool: &PgPool,
        template_id: DbId,
        input: &CreateQuestionnaireVersion,
        status: &str,
    ) -> Result<Option<QuestionnaireVersion>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let locked: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM questionnaire_templates WHERE id = $1 FOR UPDATE")
                .bind(template_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let next_version: (i32,) = sqlx::query_as(
            "SELECT COALESCE(MAX(version_number), 0) + 1 \
             FROM questionnaire_versions WHERE template_id = $1",
        )
        .bind(template_id)
        .fetch_one(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO questionnaire_versions
                (template_id, version_number, schema_definition, status, change_summary, created_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        let version = sqlx::query_as::<_, QuestionnaireVersion>(&query)
            .bind(template_id)
            .bind(next_version.0)
            .bind(&input.schema_definition)
            .bind(status)
            .bind(&input.change_summary)
            .bind(input.created_by)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(version))
    }

    /// Find a version by its primary key.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<QuestionnaireVersion>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM questionnaire_versions WHERE id = $1");
        sqlx::query_as::<_, QuestionnaireVersion>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List every version of a template, newest first.
    pub async fn list_for_template(
        pool: &PgPool,
        template_id: DbId,
    ) -> Result<Vec<QuestionnaireVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM questionnaire_versions
             WHERE template_id = $1
             ORDER BY version_number DESC"
        );
        sqlx::query_as::<_, QuestionnaireVersion>(&query)
            .bind(template_id)
            .fetch_all(pool)
            .await
    }

    /// Find the version a template's active pointer references (if any).
    pub async fn find_active_for_template(
        pool: &PgPool,
        template_id: DbId,
    ) -> Result<Option<QuestionnaireVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {cols} FROM questionnaire_versions v
             JOIN questionnaire_templates t ON t.active_version_id = v.id
             WHERE t.id = $1",
            cols = prefixed_columns("v")
        );
        sqlx::query_as::<_, QuestionnaireVersion>(&query)
            .bind(template_id)
            .fetch_optional(pool)
            .await
    }

    /// Count versions for a given template.
    pub async fn count_for_template(pool: &PgPool, template_id: DbId) -> Result<i64, sqlx::Error> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM questionnaire_versions WHERE template_id = $1")
                .bind(template_id)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }
}

fn prefixed_columns(alias: &str) -> String {
    COLUMNS
        .split(',')
        .map(|c| format!("{alias}.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}
