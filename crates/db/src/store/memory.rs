use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use memberdesk_core::questionnaire::{
    restored_change_summary, VERSION_STATUS_EDITED, VERSION_STATUS_INITIAL,
    VERSION_STATUS_RESTORED,
};
use memberdesk_core::types::DbId;
use tokio::sync::{Mutex, RwLock};

use super::{
    template_not_found, version_not_found, version_not_in_template, StoreResult, TemplateStore,
};
use crate::models::questionnaire::{
    CreateQuestionnaireTemplate, CreateQuestionnaireVersion, QuestionnaireTemplate,
    QuestionnaireVersion,
};

/// One template and all of its versions, guarded by that template's mutex.
struct Ledger {
    template: QuestionnaireTemplate,
    /// Ascending by version number: `versions[i].version_number == i + 1`.
    versions: Vec<QuestionnaireVersion>,
}

impl Ledger {
    fn append(
        &mut self,
        id: DbId,
        input: &CreateQuestionnaireVersion,
        status: &str,
    ) -> QuestionnaireVersion {
        let version = QuestionnaireVersion {
            id,
            template_id: self.template.id,
            version_number: self.versions.len() as i32 + 1,
            schema_definition: input.schema_definition.clone(),
            status: status.to_string(),
            change_summary: input.change_summary.clone(),
            created_by: input.created_by,
            created_at: chrono::Utc::now(),
        };
        self.versions.push(version.clone());
        version
    }

    fn version(&self, version_id: DbId) -> Option<&QuestionnaireVersion> {
        self.versions.iter().find(|v| v.id == version_id)
    }
}

/// Process-local [`TemplateStore`].
///
/// Each template's versions live in its own `Mutex<Ledger>`, so appends,
/// publishes and history reads on one template never wait on another. The
/// shared maps are only touched for momentary lookups and inserts, and never
/// while a ledger is locked.
///
/// A version id is reserved in `owners` before the version is pushed onto its
/// ledger, so any id a reader sees in a history resolves through
/// [`TemplateStore::get_version`].
pub struct InMemoryTemplateStore {
    ledgers: RwLock<HashMap<DbId, Arc<Mutex<Ledger>>>>,
    /// Version id to owning template id. Written once per version.
    owners: RwLock<HashMap<DbId, DbId>>,
    next_template_id: AtomicI64,
    next_version_id: AtomicI64,
}

impl Default for InMemoryTemplateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTemplateStore {
    /// Create an empty store. Ids start at 1.
    pub fn new() -> Self {
        Self {
            ledgers: RwLock::new(HashMap::new()),
            owners: RwLock::new(HashMap::new()),
            next_template_id: AtomicI64::new(1),
            next_version_id: AtomicI64::new(1),
        }
    }

    async fn ledger(&self, template_id: DbId) -> StoreResult<Arc<Mutex<Ledger>>> {
        self.ledgers
            .read()
            .await
            .get(&template_id)
            .cloned()
            .ok_or_else(|| template_not_found(template_id))
    }

    /// Allocate a version id and record which template it belongs to.
    async fn reserve_version_id(&self, template_id: DbId) -> DbId {
        let id = self.next_version_id.fetch_add(1, Ordering::SeqCst);
        self.owners.write().await.insert(id, template_id);
        id
    }

    async fn owner(&self, version_id: DbId) -> StoreResult<DbId> {
        self.owners
            .read()
            .await
            .get(&version_id)
            .copied()
            .ok_or_else(|| version_not_found(version_id))
    }

    /// Check that `version_id` exists and belongs to `template_id`.
    async fn ensure_owned_version(&self, template_id: DbId, version_id: DbId) -> StoreResult<()> {
        let owner = self.owner(version_id).await?;
        if owner != template_id {
            return Err(version_not_in_template(version_id, owner, template_id));
        }
        Ok(())
    }

    async fn append(
        &self,
        template_id: DbId,
        input: &CreateQuestionnaireVersion,
        status: &str,
    ) -> StoreResult<QuestionnaireVersion> {
        let ledger = self.ledger(template_id).await?;
        let id = self.reserve_version_id(template_id).await;
        let version = ledger.lock().await.append(id, input, status);
        Ok(version)
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create(
        &self,
        input: &CreateQuestionnaireTemplate,
    ) -> StoreResult<QuestionnaireTemplate> {
        let now = chrono::Utc::now();
        let template = QuestionnaireTemplate {
            id: self.next_template_id.fetch_add(1, Ordering::SeqCst),
            title: input.title.clone(),
            description: input.description.clone(),
            created_by: input.created_by,
            active_version_id: None,
            created_at: now,
            updated_at: now,
        };
        let mut ledger = Ledger {
            template: template.clone(),
            versions: Vec::with_capacity(1),
        };
        let first = CreateQuestionnaireVersion {
            schema_definition: input.schema_definition.clone(),
            change_summary: None,
            created_by: Some(input.created_by),
        };
        let version_id = self.reserve_version_id(template.id).await;
        let version = ledger.append(version_id, &first, VERSION_STATUS_INITIAL);

        // Only now does the template become reachable, with version 1 in place.
        self.ledgers
            .write()
            .await
            .insert(template.id, Arc::new(Mutex::new(ledger)));

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
        let version = self
            .append(template_id, input, VERSION_STATUS_EDITED)
            .await?;

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
        let ledger = self.ledger(template_id).await?;
        self.ensure_owned_version(template_id, version_id).await?;

        let mut ledger = ledger.lock().await;
        if ledger.version(version_id).is_none() {
            // Reserved by an append that has not landed yet.
            return Err(version_not_found(version_id));
        }
        if ledger.template.active_version_id != Some(version_id) {
            ledger.template.active_version_id = Some(version_id);
            ledger.template.updated_at = chrono::Utc::now();
        }
        Ok(ledger.template.clone())
    }

    async fn restore(
        &self,
        template_id: DbId,
        version_id: DbId,
        restored_by: Option<DbId>,
    ) -> StoreResult<QuestionnaireVersion> {
        let ledger = self.ledger(template_id).await?;
        self.ensure_owned_version(template_id, version_id).await?;

        let source = ledger
            .lock()
            .await
            .version(version_id)
            .cloned()
            .ok_or_else(|| version_not_found(version_id))?;
        let input = CreateQuestionnaireVersion {
            schema_definition: source.schema_definition,
            change_summary: Some(restored_change_summary(source.version_number)),
            created_by: restored_by,
        };
        let version = self
            .append(template_id, &input, VERSION_STATUS_RESTORED)
            .await?;

        tracing::debug!(
            template_id,
            source_version = source.version_number,
            version_number = version.version_number,
            "Questionnaire version restored"
        );
        Ok(version)
    }

    async fn get_template(&self, template_id: DbId) -> StoreResult<QuestionnaireTemplate> {
        let ledger = self.ledger(template_id).await?;
        let template = ledger.lock().await.template.clone();
        Ok(template)
    }

    async fn list_templates(&self) -> StoreResult<Vec<QuestionnaireTemplate>> {
        let ledgers: Vec<Arc<Mutex<Ledger>>> =
            self.ledgers.read().await.values().cloned().collect();

        let mut templates = Vec::with_capacity(ledgers.len());
        for ledger in ledgers {
            templates.push(ledger.lock().await.template.clone());
        }
        templates.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(templates)
    }

    async fn get_version(&self, version_id: DbId) -> StoreResult<QuestionnaireVersion> {
        let owner = self.owner(version_id).await?;
        // A reserved id can briefly precede its template's ledger during create.
        let ledger = self
            .ledger(owner)
            .await
            .map_err(|_| version_not_found(version_id))?;
        let version = ledger.lock().await.version(version_id).cloned();
        version.ok_or_else(|| version_not_found(version_id))
    }

    async fn get_version_history(
        &self,
        template_id: DbId,
    ) -> StoreResult<Vec<QuestionnaireVersion>> {
        let ledger = self.ledger(template_id).await?;
        let history: Vec<_> = ledger.lock().await.versions.iter().rev().cloned().collect();
        Ok(history)
    }

    async fn get_active_version(
        &self,
        template_id: DbId,
    ) -> StoreResult<Option<QuestionnaireVersion>> {
        let ledger = self.ledger(template_id).await?;
        let ledger = ledger.lock().await;
        let active = ledger
            .template
            .active_version_id
            .and_then(|id| ledger.version(id).cloned());
        Ok(active)
    }
}
