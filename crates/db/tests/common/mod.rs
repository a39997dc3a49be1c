//! Behaviour checks shared by every `TemplateStore` implementation.
//!
//! Each `check_*` function drives a store through one scenario and asserts
//! the ledger invariants. The in-memory and Postgres test files call the same
//! checks so both backends are held to one contract.

#![allow(dead_code)]

use std::sync::Arc;

use assert_matches::assert_matches;
use memberdesk_core::error::CoreError;
use memberdesk_db::models::questionnaire::{
    CreateQuestionnaireTemplate, CreateQuestionnaireVersion, QuestionnaireVersion,
};
use memberdesk_db::store::{StoreError, TemplateStore};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub const S1: &str = r#"{"fields":[{"key":"q1","label":"Member?"}]}"#;
pub const S2: &str = concat!(
    r#"{"fields":[{"key":"q1"},{"key":"q2","conditionalLogic":"#,
    r#"{"action":"SHOW","logicOperator":"AND","conditions":"#,
    r#"[{"fieldKey":"q1","operator":"EQUALS","value":"yes"}]}}]}"#,
);

pub fn new_template(title: &str, schema: &str) -> CreateQuestionnaireTemplate {
    CreateQuestionnaireTemplate {
        title: title.to_string(),
        description: Some(format!("{title} description")),
        schema_definition: schema.to_string(),
        created_by: 7,
    }
}

pub fn edit(schema: &str) -> CreateQuestionnaireVersion {
    CreateQuestionnaireVersion {
        schema_definition: schema.to_string(),
        change_summary: Some("edit".to_string()),
        created_by: Some(7),
    }
}

fn version_numbers(history: &[QuestionnaireVersion]) -> Vec<i32> {
    history.iter().map(|v| v.version_number).collect()
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

/// Create with S1, update with S2, publish 1 then 2.
pub async fn check_create_update_publish(store: &dyn TemplateStore) {
    let template = store.create(&new_template("Intake", S1)).await.unwrap();
    assert_eq!(template.active_version_id, None);

    let history = store.get_version_history(template.id).await.unwrap();
    assert_eq!(version_numbers(&history), vec![1]);
    let v1 = history[0].clone();
    assert_eq!(v1.schema_definition, S1);
    assert_eq!(v1.status, "initial");

    let v2 = store.update(template.id, &edit(S2)).await.unwrap();
    assert_eq!(v2.version_number, 2);
    assert_eq!(v2.status, "edited");
    assert_eq!(v2.template_id, template.id);

    let history = store.get_version_history(template.id).await.unwrap();
    assert_eq!(version_numbers(&history), vec![2, 1]);
    assert_eq!(store.get_version(v2.id).await.unwrap().schema_definition, S2);

    let published = store.publish(template.id, v1.id).await.unwrap();
    assert_eq!(published.active_version_id, Some(v1.id));
    assert_eq!(
        store.get_template(template.id).await.unwrap().active_version_id,
        Some(v1.id)
    );

    let published = store.publish(template.id, v2.id).await.unwrap();
    assert_eq!(published.active_version_id, Some(v2.id));

    let history = store.get_version_history(template.id).await.unwrap();
    assert_eq!(version_numbers(&history), vec![2, 1]);
    assert_eq!(history[0].schema_definition, S2);
    assert_eq!(history[1].schema_definition, S1);
}

/// A fresh template has no active version until published.
pub async fn check_active_version_requires_publish(store: &dyn TemplateStore) {
    let template = store.create(&new_template("Unpublished", S1)).await.unwrap();
    assert_eq!(store.get_active_version(template.id).await.unwrap(), None);

    let history = store.get_version_history(template.id).await.unwrap();
    store.publish(template.id, history[0].id).await.unwrap();

    let active = store.get_active_version(template.id).await.unwrap().unwrap();
    assert_eq!(active.id, history[0].id);
    assert_eq!(active.schema_definition, S1);
}

/// Publishing the same version twice leaves the same observable state.
pub async fn check_publish_is_idempotent(store: &dyn TemplateStore) {
    let template = store.create(&new_template("Idempotent", S1)).await.unwrap();
    let v2 = store.update(template.id, &edit(S2)).await.unwrap();

    let first = store.publish(template.id, v2.id).await.unwrap();
    // Long enough for a rewritten `updated_at` to differ.
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    let second = store.publish(template.id, v2.id).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(second.active_version_id, Some(v2.id));
    assert_eq!(store.get_template(template.id).await.unwrap(), first);
    assert_eq!(store.get_version_history(template.id).await.unwrap().len(), 2);
}

/// Every existing version, not just the latest, can be published.
pub async fn check_any_version_can_be_active(store: &dyn TemplateStore) {
    let template = store.create(&new_template("Many", S1)).await.unwrap();
    for i in 0..4 {
        store
            .update(template.id, &edit(&format!(r#"{{"rev":{i}}}"#)))
            .await
            .unwrap();
    }
    let history = store.get_version_history(template.id).await.unwrap();
    assert_eq!(version_numbers(&history), vec![5, 4, 3, 2, 1]);

    for version in &history {
        let t = store.publish(template.id, version.id).await.unwrap();
        assert_eq!(t.active_version_id, Some(version.id));
    }
}

/// NotFound for missing ids, Conflict for a foreign version.
pub async fn check_error_kinds(store: &dyn TemplateStore) {
    let a = store.create(&new_template("A", S1)).await.unwrap();
    let b = store.create(&new_template("B", S2)).await.unwrap();
    let b_v1 = store.get_version_history(b.id).await.unwrap()[0].clone();

    assert_matches!(
        store.update(i64::MAX, &edit(S2)).await,
        Err(StoreError::Core(CoreError::NotFound { entity: "QuestionnaireTemplate", .. }))
    );
    assert_matches!(
        store.publish(i64::MAX, b_v1.id).await,
        Err(StoreError::Core(CoreError::NotFound { entity: "QuestionnaireTemplate", .. }))
    );
    assert_matches!(
        store.publish(a.id, i64::MAX).await,
        Err(StoreError::Core(CoreError::NotFound { entity: "QuestionnaireVersion", .. }))
    );
    assert_matches!(
        store.publish(a.id, b_v1.id).await,
        Err(StoreError::Core(CoreError::Conflict(_)))
    );
    assert_matches!(
        store.get_version(i64::MAX).await,
        Err(StoreError::Core(CoreError::NotFound { entity: "QuestionnaireVersion", .. }))
    );
    assert_matches!(
        store.get_version_history(i64::MAX).await,
        Err(StoreError::Core(CoreError::NotFound { entity: "QuestionnaireTemplate", .. }))
    );
    assert_matches!(
        store.restore(a.id, b_v1.id, None).await,
        Err(StoreError::Core(CoreError::Conflict(_)))
    );
    assert_matches!(
        store.restore(i64::MAX, b_v1.id, None).await,
        Err(StoreError::Core(CoreError::NotFound { entity: "QuestionnaireTemplate", .. }))
    );
    assert_matches!(
        store.restore(a.id, i64::MAX, None).await,
        Err(StoreError::Core(CoreError::NotFound { entity: "QuestionnaireVersion", .. }))
    );

    // Failed operations leave the pointer and ledger untouched.
    assert_eq!(store.get_template(a.id).await.unwrap().active_version_id, None);
    assert_eq!(store.get_version_history(a.id).await.unwrap().len(), 1);
}

/// Restoring appends a copy of an old schema without moving the pointer.
pub async fn check_restore(store: &dyn TemplateStore) {
    let template = store.create(&new_template("Restore", S1)).await.unwrap();
    let v1 = store.get_version_history(template.id).await.unwrap()[0].clone();
    let v2 = store.update(template.id, &edit(S2)).await.unwrap();
    store.publish(template.id, v2.id).await.unwrap();

    let v3 = store.restore(template.id, v1.id, Some(9)).await.unwrap();
    assert_eq!(v3.version_number, 3);
    assert_eq!(v3.status, "restored");
    assert_eq!(v3.schema_definition, S1);
    assert_eq!(v3.created_by, Some(9));
    assert_eq!(v3.change_summary.as_deref(), Some("Restored from version 1"));

    assert_eq!(
        store.get_template(template.id).await.unwrap().active_version_id,
        Some(v2.id)
    );
    // The source version is untouched.
    assert_eq!(store.get_version(v1.id).await.unwrap(), v1);
}

/// Concurrent updates against one template get consecutive numbers.
pub async fn check_concurrent_updates(store: Arc<dyn TemplateStore>, updates: usize) {
    let template_id = store.create(&new_template("Contended", S1)).await.unwrap().id;

    let handles: Vec<_> = (0..updates)
        .map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .update(template_id, &edit(&format!(r#"{{"writer":{i}}}"#)))
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut assigned = Vec::with_capacity(updates);
    for handle in handles {
        assigned.push(handle.await.unwrap().version_number);
    }
    assigned.sort_unstable();
    let expected: Vec<i32> = (2..=(updates as i32 + 1)).collect();
    assert_eq!(assigned, expected);

    let history = store.get_version_history(template_id).await.unwrap();
    let expected_history: Vec<i32> = (1..=(updates as i32 + 1)).rev().collect();
    assert_eq!(version_numbers(&history), expected_history);
}

/// Concurrent updates and publishes never leave the pointer on a foreign or
/// missing version.
pub async fn check_publish_racing_updates(store: Arc<dyn TemplateStore>) {
    let template_id = store.create(&new_template("Racing", S1)).await.unwrap().id;
    let v1_id = store.get_version_history(template_id).await.unwrap()[0].id;

    let writer = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            for i in 0..20 {
                store
                    .update(template_id, &edit(&format!(r#"{{"n":{i}}}"#)))
                    .await
                    .unwrap();
            }
        })
    };
    let publisher = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            for _ in 0..20 {
                let t = store.publish(template_id, v1_id).await.unwrap();
                assert_eq!(t.active_version_id, Some(v1_id));
            }
        })
    };
    writer.await.unwrap();
    publisher.await.unwrap();

    let active = store.get_active_version(template_id).await.unwrap().unwrap();
    assert_eq!(active.id, v1_id);
    assert_eq!(active.template_id, template_id);
    assert_eq!(store.get_version_history(template_id).await.unwrap().len(), 21);
}

/// Version numbering is scoped per template.
pub async fn check_templates_are_independent(store: Arc<dyn TemplateStore>) {
    let a = store.create(&new_template("Left", S1)).await.unwrap();
    let b = store.create(&new_template("Right", S1)).await.unwrap();

    tokio::join!(
        async {
            for _ in 0..5 {
                store.update(a.id, &edit(S2)).await.unwrap();
            }
        },
        async {
            for _ in 0..3 {
                store.update(b.id, &edit(S2)).await.unwrap();
            }
        }
    );

    let ha = store.get_version_history(a.id).await.unwrap();
    let hb = store.get_version_history(b.id).await.unwrap();
    assert_eq!(version_numbers(&ha), vec![6, 5, 4, 3, 2, 1]);
    assert_eq!(version_numbers(&hb), vec![4, 3, 2, 1]);
    assert!(ha.iter().all(|v| v.template_id == a.id));
    assert!(hb.iter().all(|v| v.template_id == b.id));
}

/// Schemas come back exactly as written, including whitespace.
pub async fn check_schema_round_trip(store: &dyn TemplateStore) {
    let odd = "{ \"fields\" : [ ],\n  \"note\": \"ünïcødé\"  }";
    let template = store.create(&new_template("Verbatim", odd)).await.unwrap();
    let history = store.get_version_history(template.id).await.unwrap();
    assert_eq!(history[0].schema_definition, odd);
    assert_eq!(
        store.get_version(history[0].id).await.unwrap().schema_definition,
        odd
    );
}
