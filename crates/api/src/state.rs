use std::sync::Arc;

use memberdesk_db::store::TemplateStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Versioned template store (Postgres or in-memory).
    pub store: Arc<dyn TemplateStore>,
}
