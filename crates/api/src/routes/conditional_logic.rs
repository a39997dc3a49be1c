use axum::routing::post;
use axum::Router;

use crate::handlers::conditional_logic;
use crate::state::AppState;

/// Rule evaluation routes, registered as `/conditional-logic`.
pub fn router() -> Router<AppState> {
    Router::new().route("/evaluate", post(conditional_logic::evaluate))
}
