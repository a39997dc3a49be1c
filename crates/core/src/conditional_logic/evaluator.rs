//! Rule evaluator. Pure logic, no database access.

use std::borrow::Cow;
use std::cmp::Ordering;

use serde_json::Value;

use super::rules::{
    parse_rule, ConditionOperator, ConditionSpec, LogicOperator, RuleAction, RuleError, RuleSpec,
};

/// Answers collected so far, keyed by field key. Missing keys and JSON `null`
/// both mean "unanswered".
pub type AnswerSet = serde_json::Map<String, Value>;

/// Decide whether a field governed by `rule` is visible for `answers`.
///
/// With no conditions, `AND` is vacuously satisfied and `OR` is not, so a
/// `SHOW`/`AND` rule with an empty list is always visible and a `SHOW`/`OR`
/// rule with an empty list never is.
pub fn is_field_visible(rule: &RuleSpec, answers: &AnswerSet) -> bool {
    let satisfied = conditions_satisfied(rule.logic_operator, &rule.conditions, answers);
    match rule.action {
        RuleAction::Show => satisfied,
        RuleAction::Hide => !satisfied,
    }
}

/// Parse a wire-format rule and evaluate it in one step.
pub fn evaluate_rule_json(rule: &Value, answers: &AnswerSet) -> Result<bool, RuleError> {
    let rule = parse_rule(rule)?;
    Ok(is_field_visible(&rule, answers))
}

fn conditions_satisfied(
    logic: LogicOperator,
    conditions: &[ConditionSpec],
    answers: &AnswerSet,
) -> bool {
    let mut results = conditions.iter().map(|c| evaluate_condition(c, answers));
    match logic {
        LogicOperator::And => results.all(|met| met),
        LogicOperator::Or => results.any(|met| met),
    }
}

/// Evaluate a single condition. Total over every (answer, value) pair.
pub fn evaluate_condition(condition: &ConditionSpec, answers: &AnswerSet) -> bool {
    let answer = answers.get(&condition.field_key).filter(|v| !v.is_null());
    let expected = condition.value.as_str();

    match condition.operator {
        ConditionOperator::Equals => equals(answer, expected),
        ConditionOperator::NotEquals => !equals(answer, expected),
        ConditionOperator::Contains => contains(answer, expected),
        ConditionOperator::NotContains => !contains(answer, expected),
        ConditionOperator::GreaterThan => compare(answer, expected) == Some(Ordering::Greater),
        ConditionOperator::LessThan => compare(answer, expected) == Some(Ordering::Less),
    }
}

/// Text form used for comparisons: strings verbatim, everything else as
/// compact JSON (`3`, `true`, `["a","b"]`).
fn answer_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

fn equals(answer: Option<&Value>, expected: &str) -> bool {
    answer.is_some_and(|a| answer_text(a) == expected)
}

fn contains(answer: Option<&Value>, expected: &str) -> bool {
    match answer {
        None => false,
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| !item.is_null())
            .any(|item| answer_text(item) == expected),
        Some(other) => answer_text(other).contains(expected),
    }
}

fn compare(answer: Option<&Value>, expected: &str) -> Option<Ordering> {
    let lhs = match answer? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    }?;
    let rhs = parse_number(expected)?;
    lhs.partial_cmp(&rhs)
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}
