use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use memberdesk_core::conditional_logic::{evaluate_rule_json, AnswerSet};
use memberdesk_core::error::CoreError;

use crate::error::AppResult;
use crate::response::DataResponse;

/// Body for `POST /conditional-logic/evaluate`.
///
/// `rule` is a conditional-logic document in its wire format
/// (`action`, `logicOperator`, `conditions`).
#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub rule: Value,
    #[serde(default)]
    pub answers: AnswerSet,
}

#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub visible: bool,
}

/// POST /conditional-logic/evaluate
///
/// A malformed rule is rejected with 422 rather than defaulting to visible.
pub async fn evaluate(Json(input): Json<EvaluateRequest>) -> AppResult<impl IntoResponse> {
    let visible = evaluate_rule_json(&input.rule, &input.answers).map_err(CoreError::from)?;
    Ok(Json(DataResponse {
        data: EvaluateResponse { visible },
    }))
}
