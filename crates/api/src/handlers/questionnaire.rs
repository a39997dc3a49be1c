//! Handlers for questionnaire templates and their version ledger.
//!
//! Templates are created with version 1, edited by appending versions, and
//! made visible to members by publishing one of those versions.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use memberdesk_core::conditional_logic::AnswerSet;
use memberdesk_core::questionnaire::{
    self, validate_description, validate_schema_definition, validate_title, FieldVisibility,
};
use memberdesk_core::types::DbId;
use memberdesk_db::models::questionnaire::{
    CreateQuestionnaireTemplate, CreateQuestionnaireVersion, QuestionnaireVersion,
};
use memberdesk_db::store::TemplateStore;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body for `POST /questionnaires`.
///
/// `schema_definition` may be a JSON string, stored verbatim, or any other
/// JSON value, stored in its compact serialized form.
#[derive(Debug, Deserialize)]
pub struct CreateQuestionnaireRequest {
    pub title: String,
    pub description: Option<String>,
    pub schema_definition: Value,
    pub created_by: DbId,
}

/// Body for `PUT /questionnaires/{id}/schema`.
#[derive(Debug, Deserialize)]
pub struct UpdateSchemaRequest {
    pub schema_definition: Value,
    pub change_summary: Option<String>,
    pub updated_by: Option<DbId>,
}

#[derive(Debug, Deserialize)]
pub struct RestoreParams {
    pub restored_by: Option<DbId>,
}

/// Body for `POST /questionnaires/{id}/visibility`.
#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    #[serde(default)]
    pub answers: AnswerSet,
}

#[derive(Debug, Serialize)]
pub struct VisibilityResponse {
    pub template_id: DbId,
    pub version_id: DbId,
    pub version_number: i32,
    pub fields: Vec<FieldVisibility>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Serialize an incoming schema value to the text the store keeps.
fn schema_text(schema: Value) -> String {
    match schema {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

async fn ensure_active_version(
    store: &dyn TemplateStore,
    template_id: DbId,
) -> AppResult<QuestionnaireVersion> {
    store.get_active_version(template_id).await?.ok_or_else(|| {
        AppError::NotFound(format!(
            "Questionnaire template {template_id} has no published version"
        ))
    })
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// GET /questionnaires
pub async fn list_questionnaires(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let templates = state.store.list_templates().await?;
    Ok(Json(DataResponse { data: templates }))
}

/// POST /questionnaires
///
/// Create a template and its version 1. The template is not active until a
/// version is published.
pub async fn create_questionnaire(
    State(state): State<AppState>,
    Json(input): Json<CreateQuestionnaireRequest>,
) -> AppResult<impl IntoResponse> {
    validate_title(&input.title)?;
    validate_description(input.description.as_deref())?;
    let schema_definition = schema_text(input.schema_definition);
    validate_schema_definition(&schema_definition)?;

    let template = state
        .store
        .create(&CreateQuestionnaireTemplate {
            title: input.title,
            description: input.description,
            schema_definition,
            created_by: input.created_by,
        })
        .await?;

    tracing::info!(
        user_id = template.created_by,
        template_id = template.id,
        "Questionnaire template created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: template })))
}

/// GET /questionnaires/{id}
pub async fn get_questionnaire(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let template = state.store.get_template(id).await?;
    Ok(Json(DataResponse { data: template }))
}

/// PUT /questionnaires/{id}/schema
///
/// Append a new version with the given schema. The active version is
/// unchanged.
pub async fn update_schema(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateSchemaRequest>,
) -> AppResult<impl IntoResponse> {
    let schema_definition = schema_text(input.schema_definition);
    validate_schema_definition(&schema_definition)?;

    let version = state
        .store
        .update(
            id,
            &CreateQuestionnaireVersion {
                schema_definition,
                change_summary: input.change_summary,
                created_by: input.updated_by,
            },
        )
        .await?;

    tracing::info!(
        template_id = id,
        version_id = version.id,
        version_number = version.version_number,
        "Questionnaire schema updated"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: version })))
}

// ---------------------------------------------------------------------------
// Versions
// ---------------------------------------------------------------------------

/// GET /questionnaires/{id}/versions
///
/// Every version of the template, newest first.
pub async fn list_versions(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let versions = state.store.get_version_history(id).await?;
    Ok(Json(DataResponse { data: versions }))
}

/// GET /questionnaires/{id}/active-version
///
/// 404 until a version has been published.
pub async fn get_active_version(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let version = ensure_active_version(state.store.as_ref(), id).await?;
    Ok(Json(DataResponse { data: version }))
}

/// GET /questionnaire-versions/{version_id}
pub async fn get_version(
    State(state): State<AppState>,
    Path(version_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let version = state.store.get_version(version_id).await?;
    Ok(Json(DataResponse { data: version }))
}

/// POST /questionnaires/{id}/publish/{version_id}
pub async fn publish_version(
    State(state): State<AppState>,
    Path((id, version_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let template = state.store.publish(id, version_id).await?;

    tracing::info!(template_id = id, version_id, "Questionnaire version published");

    Ok(Json(DataResponse { data: template }))
}

/// POST /questionnaires/{id}/restore/{version_id}
///
/// Append a copy of an earlier version's schema as the newest version.
/// Publishing the copy is a separate step.
pub async fn restore_version(
    State(state): State<AppState>,
    Path((id, version_id)): Path<(DbId, DbId)>,
    Query(params): Query<RestoreParams>,
) -> AppResult<impl IntoResponse> {
    let version = state
        .store
        .restore(id, version_id, params.restored_by)
        .await?;

    tracing::info!(
        template_id = id,
        source_version_id = version_id,
        version_number = version.version_number,
        "Questionnaire version restored"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: version })))
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

/// POST /questionnaires/{id}/visibility
///
/// Evaluate every field of the active version against the given answers.
pub async fn resolve_visibility(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<VisibilityRequest>,
) -> AppResult<impl IntoResponse> {
    let version = ensure_active_version(state.store.as_ref(), id).await?;
    let fields = questionnaire::resolve_visibility(&version.schema_definition, &input.answers)?;

    Ok(Json(DataResponse {
        data: VisibilityResponse {
            template_id: id,
            version_id: version.id,
            version_number: version.version_number,
            fields,
        },
    }))
}
