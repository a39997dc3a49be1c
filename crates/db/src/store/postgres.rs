use async_trait::async_trait;
use memberdesk_core::questionnaire::{
    restored_change_summary, VERSION_STATUS_EDITED, VERSION_STATUS_RESTORED,
};
use memberdesk_core::types::DbId;

use super::{
    template_not_found, version_not_found, version_not_in_template, StoreResult, TemplateStore,
};
use crate::models::questionnaire::{
    CreateQuestionnaireTemplate, CreateQuestionnaireVersion, QuestionnaireTemplate,
    QuestionnaireVersion,
};
use crate::repositories::{QuestionnaireTemplateRepo, QuestionnaireVersionRepo};
use crate::DbPool;

/// [`TemplateStore`] backed by Postgres.
///
/// Version appends take a row lock on the template (see
/// [`QuestionnaireVersionRepo::append`]); the unique constraint on
/// `(template_id, version_number)` backs that up at the schema level.
#[derive(Clone)]
pub struct PgTemplateStore {
    pool: DbPool,
}

impl PgTemplateStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn ensure_template(&self, template_id: DbId) -> StoreResult<QuestionnaireTemplate> {
        QuestionnaireTemplateRepo::find_by_id(&self.pool, template_id)
            .await?
            .ok_or_else(|| template_not_found(template_id))
    }

    /// Resolve `version_id` and check it belongs to `template_id`.
    async fn ensure_owned_version(
        &self,
        template_id: DbId,
        version_id: DbId,
    ) -> StoreResult<QuestionnaireVersion> {
        self.ensure_template(template_id).await?;
        let version = QuestionnaireVersionRepo::find_by_id(&self.pool, version_id)
            .await?
            .ok_or_else(|| version_not_found(version_id))?;
        if version.template_id != template_id {
            return Err(version_not_in_template(
                version.id,
                version.template_id,
                template_id,
            ));
        }
        Ok(version)
    }
}

#[async_trait]
impl TemplateStore for PgTemplateStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn health_check(&self) -> StoreResult<()> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }

    async fn create(
        &self,
        input: &CreateQuestionnaireTemplate,
    ) -> StoreResult<QuestionnaireTemplate> {
        let (template, version) =
            QuestionnaireTemplateRepo::create_with_initial_version(&self.pool, input).await?;
        tracing::debug!(
            template_id = template.id,
            version_id = version.id,
            "Questionnaire template stored with version 1"
        );
        Ok(template)
    }

    async fn update(
        &self,
        template_id: DbId,
        input: &CreateQuestionnaireVersion,
    ) -> StoreResult<QuestionnaireVersion> {
        let version =
            QuestionnaireVersionRepo::append(&self.pool, template_id, input, VERSION_STATUS_EDITED)
                .await?
                .ok_or_else(|| template_not_found(template_id))?;
        tracing::debug!(
            template_id,
            version_id = version.id,
            version_number = version.version_number,
            "Questionnaire version appended"
        );
        Ok(version)
    }

    async fn publish(
        &self,
        template_id: DbId,
        version_id: DbId,
    ) -> StoreResult<QuestionnaireTemplate> {
        if let Some(template) =
            QuestionnaireTemplateRepo::set_active_version(&self.pool, template_id, version_id)
                .await?
        {
            return Ok(template);
        }

        // Nothing matched: report which id failed, or write again if both
        // resolve on re-read.
        let version = self.ensure_owned_version(template_id, version_id).await?;
        QuestionnaireTemplateRepo::set_active_version(&self.pool, template_id, version.id)
            .await?
            .ok_or_else(|| template_not_found(template_id))
    }

    async fn restore(
        &self,
        template_id: DbId,
        version_id: DbId,
        restored_by: Option<DbId>,
    ) -> StoreResult<QuestionnaireVersion> {
        let source = self.ensure_owned_version(template_id, version_id).await?;
        let input = CreateQuestionnaireVersion {
            schema_definition: source.schema_definition,
            change_summary: Some(restored_change_summary(source.version_number)),
            created_by: restored_by,
        };
        let version = QuestionnaireVersionRepo::append(
            &self.pool,
            template_id,
            &input,
            VERSION_STATUS_RESTORED,
        )
        .await?
        .ok_or_else(|| template_not_found(template_id))?;
        tracing::debug!(
            template_id,
            source_version = source.version_number,
            version_number = version.version_number,
            "Questionnaire version restored"
        );
        Ok(version)
    }

    async fn get_template(&self, template_id: DbId) -> StoreResult<QuestionnaireTemplate> {
        self.ensure_template(template_id).await
    }

    async fn list_templates(&self) -> StoreResult<Vec<QuestionnaireTemplate>> {
        Ok(QuestionnaireTemplateRepo::list(&self.pool).await?)
    }

    async fn get_version(&self, version_id: DbId) -> StoreResult<QuestionnaireVersion> {
        QuestionnaireVersionRepo::find_by_id(&self.pool, version_id)
            .await?
            .ok_or_else(|| version_not_found(version_id))
    }

    async fn get_version_history(
        &self,
        template_id: DbId,
    ) -> StoreResult<Vec<QuestionnaireVersion>> {
        self.ensure_template(template_id).await?;
        Ok(QuestionnaireVersionRepo::list_for_template(&self.pool, template_id).await?)
    }

    async fn get_active_version(
        &self,
        template_id: DbId,
    ) -> StoreResult<Option<QuestionnaireVersion>> {
        self.ensure_template(template_id).await?;
        Ok(QuestionnaireVersionRepo::find_active_for_template(&self.pool, template_id).await?)
    }
}
