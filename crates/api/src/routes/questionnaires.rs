//! Route definitions for questionnaire templates and their versions.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::questionnaire;
use crate::state::AppState;

/// Template routes, registered as `/questionnaires`.
///
/// ```text
/// GET    /                                list_questionnaires
/// POST   /                                create_questionnaire
/// GET    /{id}                            get_questionnaire
/// PUT    /{id}/schema                     update_schema
/// GET    /{id}/versions                   list_versions
/// GET    /{id}/active-version             get_active_version
/// POST   /{id}/publish/{version_id}       publish_version
/// POST   /{id}/restore/{version_id}       restore_version
/// POST   /{id}/visibility                 resolve_visibility
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(questionnaire::list_questionnaires).post(questionnaire::create_questionnaire),
        )
        .route("/{id}", get(questionnaire::get_questionnaire))
        .route("/{id}/schema", put(questionnaire::update_schema))
        .route("/{id}/versions", get(questionnaire::list_versions))
        .route("/{id}/active-version", get(questionnaire::get_active_version))
        .route(
            "/{id}/publish/{version_id}",
            post(questionnaire::publish_version),
        )
        .route(
            "/{id}/restore/{version_id}",
            post(questionnaire::restore_version),
        )
        .route("/{id}/visibility", post(questionnaire::resolve_visibility))
}

/// Version lookup by id, registered as `/questionnaire-versions`.
pub fn versions_router() -> Router<AppState> {
    Router::new().route("/{version_id}", get(questionnaire::get_version))
}
