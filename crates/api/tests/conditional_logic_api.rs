//! Integration tests for `POST /api/v1/conditional-logic/evaluate`.

mod common;

use axum::http::StatusCode;
use common::{body_json, post_json};
use serde_json::{json, Value};

const EVALUATE: &str = "/api/v1/conditional-logic/evaluate";

async fn evaluate(rule: Value, answers: Value) -> (StatusCode, Value) {
    let app = common::build_test_app();
    let response = post_json(app, EVALUATE, json!({"rule": rule, "answers": answers})).await;
    let status = response.status();
    (status, body_json(response).await)
}

#[tokio::test]
async fn show_rule_follows_answers() {
    let rule = json!({
        "action": "SHOW",
        "logicOperator": "AND",
        "conditions": [{"fieldKey": "q1", "operator": "EQUALS", "value": "yes"}]
    });

    let (status, json) = evaluate(rule.clone(), json!({"q1": "yes"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["visible"], true);

    let (_, json) = evaluate(rule.clone(), json!({"q1": "no"})).await;
    assert_eq!(json["data"]["visible"], false);

    let (_, json) = evaluate(rule, json!({})).await;
    assert_eq!(json["data"]["visible"], false);
}

#[tokio::test]
async fn hide_with_or_and_numeric_value() {
    let rule = json!({
        "action": "HIDE",
        "logicOperator": "OR",
        "conditions": [
            {"fieldKey": "age", "operator": "LESS_THAN", "value": 18},
            {"fieldKey": "country", "operator": "NOT_EQUALS", "value": "NZ"}
        ]
    });

    let (_, json) = evaluate(rule.clone(), json!({"age": 30, "country": "NZ"})).await;
    assert_eq!(json["data"]["visible"], true);

    let (_, json) = evaluate(rule, json!({"age": 16, "country": "NZ"})).await;
    assert_eq!(json["data"]["visible"], false);
}

#[tokio::test]
async fn answers_default_to_empty() {
    let app = common::build_test_app();
    let response = post_json(
        app,
        EVALUATE,
        json!({"rule": {"action": "SHOW", "logicOperator": "AND", "conditions": []}}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["visible"], true);
}

#[tokio::test]
async fn malformed_rules_return_422() {
    let cases = [
        json!({"action": "TOGGLE", "logicOperator": "AND", "conditions": []}),
        json!({"action": "SHOW", "logicOperator": "XOR", "conditions": []}),
        json!({"action": "SHOW", "logicOperator": "AND",
               "conditions": [{"fieldKey": "q1", "operator": "LIKE", "value": "a"}]}),
        json!({"action": "SHOW", "logicOperator": "AND",
               "conditions": [{"fieldKey": "", "operator": "EQUALS", "value": "a"}]}),
        json!({"action": "SHOW"}),
        json!("SHOW"),
    ];

    for rule in cases {
        let (status, json) = evaluate(rule.clone(), json!({})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "rule: {rule}");
        assert_eq!(json["code"], "INVALID_RULE", "rule: {rule}");
    }
}
