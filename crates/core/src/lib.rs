//! Domain logic for the memberdesk questionnaire engine.
//!
//! Everything in this crate is pure: no database, no network, no clock-driven
//! behaviour. The `db` crate persists what this crate describes and the `api`
//! crate exposes both over HTTP.

pub mod conditional_logic;
pub mod error;
pub mod questionnaire;
pub mod types;
