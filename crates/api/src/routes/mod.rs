pub mod conditional_logic;
pub mod health;
pub mod questionnaires;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /questionnaires                                   list, create
/// /questionnaires/{id}                              get
/// /questionnaires/{id}/schema                       update schema (PUT)
/// /questionnaires/{id}/versions                     version history
/// /questionnaires/{id}/active-version               active version
/// /questionnaires/{id}/publish/{version_id}         publish (POST)
/// /questionnaires/{id}/restore/{version_id}         restore (POST)
/// /questionnaires/{id}/visibility                   resolve field visibility (POST)
///
/// /questionnaire-versions/{version_id}              get version
///
/// /conditional-logic/evaluate                       evaluate one rule (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/questionnaires", questionnaires::router())
        .nest("/questionnaire-versions", questionnaires::versions_router())
        .nest("/conditional-logic", conditional_logic::router())
}
