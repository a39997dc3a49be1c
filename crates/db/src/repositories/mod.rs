//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` as the first argument. Multi-statement writes open their own
//! transaction.

pub mod questionnaire_template_repo;
pub mod questionnaire_version_repo;

pub use questionnaire_template_repo::QuestionnaireTemplateRepo;
pub use questionnaire_version_repo::QuestionnaireVersionRepo;
