//! Request handlers.
//!
//! Handlers validate input with `memberdesk_core`, delegate to the
//! [`TemplateStore`](memberdesk_db::store::TemplateStore) held in
//! [`AppState`](crate::state::AppState), and map errors via
//! [`AppError`](crate::error::AppError).

pub mod conditional_logic;
pub mod questionnaire;
