//! Questionnaire template validation and schema visibility helpers.
//!
//! The version store treats a schema definition as an opaque document. The
//! helpers here are for callers that render a version: they read the
//! `fields` array, pick up each field's `conditionalLogic`, and evaluate it.
//!
//! Expected schema shape (extra properties are ignored):
//!
//! ```json
//! {
//!   "fields": [
//!     { "key": "q1", "label": "Member?" },
//!     { "key": "q2", "conditionalLogic": { "action": "SHOW", "logicOperator": "AND",
//!         "conditions": [{ "fieldKey": "q1", "operator": "EQUALS", "value": "yes" }] } }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::conditional_logic::{is_field_visible, parse_rule, AnswerSet, RuleSpec};
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 2000;

/// Upper bound on a serialized schema definition, in bytes.
pub const MAX_SCHEMA_BYTES: usize = 1024 * 1024;

/// Entity names used in `CoreError::NotFound`.
pub const TEMPLATE_ENTITY: &str = "QuestionnaireTemplate";
pub const VERSION_ENTITY: &str = "QuestionnaireVersion";

// ---------------------------------------------------------------------------
// Version status constants
// ---------------------------------------------------------------------------

/// Version 1, written together with its template.
pub const VERSION_STATUS_INITIAL: &str = "initial";
/// Appended by a schema edit.
pub const VERSION_STATUS_EDITED: &str = "edited";
/// Appended by restoring an earlier version's schema.
pub const VERSION_STATUS_RESTORED: &str = "restored";

/// All valid version statuses. A version's status never changes after insert.
pub const VALID_VERSION_STATUSES: &[&str] = &[
    VERSION_STATUS_INITIAL,
    VERSION_STATUS_EDITED,
    VERSION_STATUS_RESTORED,
];

/// Change summary recorded on a version produced by a restore.
pub fn restored_change_summary(version_number: i32) -> String {
    format!("Restored from version {version_number}")
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a template title (non-empty, at most 200 characters).
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation("Title must not be empty".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(CoreError::Validation(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate an optional template description.
pub fn validate_description(description: Option<&str>) -> Result<(), CoreError> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LEN => Err(CoreError::Validation(format!(
            "Description must be at most {MAX_DESCRIPTION_LEN} characters"
        ))),
        _ => Ok(()),
    }
}

/// Validate that a schema definition is a non-empty, size-bounded JSON
/// document. Its contents are not inspected.
pub fn validate_schema_definition(schema: &str) -> Result<(), CoreError> {
    if schema.trim().is_empty() {
        return Err(CoreError::Validation(
            "Schema definition must not be empty".into(),
        ));
    }
    if schema.len() > MAX_SCHEMA_BYTES {
        return Err(CoreError::Validation(format!(
            "Schema definition must be at most {MAX_SCHEMA_BYTES} bytes"
        )));
    }
    serde_json::from_str::<Value>(schema).map_err(|e| {
        CoreError::Validation(format!("Schema definition is not valid JSON: {e}"))
    })?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Schema fields
// ---------------------------------------------------------------------------

/// A field of a schema document, reduced to what visibility needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub key: String,
    pub rule: Option<RuleSpec>,
}

/// Visibility decision for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldVisibility {
    pub key: String,
    pub visible: bool,
}

/// Read the fields of a serialized schema document, parsing every
/// `conditionalLogic` rule. A missing `fields` array means no fields.
pub fn extract_fields(schema: &str) -> Result<Vec<SchemaField>, CoreError> {
    let doc: Value = serde_json::from_str(schema).map_err(|e| {
        CoreError::Validation(format!("Schema definition is not valid JSON: {e}"))
    })?;

    let fields = match doc.get("fields") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(fields)) => fields,
        Some(_) => {
            return Err(CoreError::Validation(
                "Schema 'fields' must be an array".into(),
            ))
        }
    };

    fields
        .iter()
        .enumerate()
        .map(|(index, field)| -> Result<SchemaField, CoreError> {
            let key = field
                .get("key")
                .and_then(Value::as_str)
                .filter(|k| !k.is_empty())
                .ok_or_else(|| {
                    CoreError::Validation(format!("Schema field {index} has no 'key'"))
                })?;
            let rule = match field.get("conditionalLogic") {
                None | Some(Value::Null) => None,
                Some(raw) => Some(parse_rule(raw)?),
            };
            Ok(SchemaField {
                key: key.to_string(),
                rule,
            })
        })
        .collect()
}

/// Evaluate visibility for every field of a schema, in schema order.
///
/// Fields without conditional logic are always visible. A malformed rule on
/// any field fails the whole call.
pub fn resolve_visibility(
    schema: &str,
    answers: &AnswerSet,
) -> Result<Vec<FieldVisibility>, CoreError> {
    let fields = extract_fields(schema)?;
    Ok(fields
        .into_iter()
        .map(|field| {
            let visible = field
                .rule
                .as_ref()
                .map_or(true, |rule| is_field_visible(rule, answers));
            FieldVisibility {
                key: field.key,
                visible,
            }
        })
        .collect())
}
