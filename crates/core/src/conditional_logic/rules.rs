//! Conditional-logic rule types and their JSON wire format.
//!
//! A rule looks like:
//!
//! ```json
//! {
//!   "action": "SHOW",
//!   "logicOperator": "AND",
//!   "conditions": [{ "fieldKey": "q1", "operator": "EQUALS", "value": "yes" }]
//! }
//! ```
//!
//! Tags are matched exactly (upper-case). Anything unrecognised is a
//! [`RuleError`], never a silent default.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A malformed conditional-logic rule.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("malformed rule structure: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unknown action '{0}' (expected SHOW or HIDE)")]
    UnknownAction(String),

    #[error("unknown logic operator '{0}' (expected AND or OR)")]
    UnknownLogicOperator(String),

    #[error("condition {index}: unknown operator '{operator}'")]
    UnknownOperator { index: usize, operator: String },

    #[error("condition {index}: fieldKey must not be empty")]
    EmptyFieldKey { index: usize },
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// What happens to the field when the conditions hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleAction {
    Show,
    Hide,
}

impl RuleAction {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleAction::Show => "SHOW",
            RuleAction::Hide => "HIDE",
        }
    }
}

impl FromStr for RuleAction {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SHOW" => Ok(RuleAction::Show),
            "HIDE" => Ok(RuleAction::Hide),
            other => Err(RuleError::UnknownAction(other.to_string())),
        }
    }
}

/// How per-condition results are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogicOperator {
    And,
    Or,
}

impl LogicOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            LogicOperator::And => "AND",
            LogicOperator::Or => "OR",
        }
    }
}

impl FromStr for LogicOperator {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AND" => Ok(LogicOperator::And),
            "OR" => Ok(LogicOperator::Or),
            other => Err(RuleError::UnknownLogicOperator(other.to_string())),
        }
    }
}

/// Comparison applied between a recorded answer and a configured value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    GreaterThan,
    LessThan,
}

impl ConditionOperator {
    pub const ALL: [ConditionOperator; 6] = [
        ConditionOperator::Equals,
        ConditionOperator::NotEquals,
        ConditionOperator::Contains,
        ConditionOperator::NotContains,
        ConditionOperator::GreaterThan,
        ConditionOperator::LessThan,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConditionOperator::Equals => "EQUALS",
            ConditionOperator::NotEquals => "NOT_EQUALS",
            ConditionOperator::Contains => "CONTAINS",
            ConditionOperator::NotContains => "NOT_CONTAINS",
            ConditionOperator::GreaterThan => "GREATER_THAN",
            ConditionOperator::LessThan => "LESS_THAN",
        }
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Rule types
// ---------------------------------------------------------------------------

/// One atomic test against a single answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionSpec {
    pub field_key: String,
    pub operator: ConditionOperator,
    pub value: String,
}

/// A parsed conditional-visibility rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawRuleSpec")]
pub struct RuleSpec {
    pub action: RuleAction,
    pub logic_operator: LogicOperator,
    pub conditions: Vec<ConditionSpec>,
}

/// Wire shape before tag resolution. Kept private so the only way to get a
/// [`RuleSpec`] from JSON is through the checks in `TryFrom`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRuleSpec {
    action: String,
    logic_operator: String,
    conditions: Vec<RawConditionSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConditionSpec {
    field_key: String,
    operator: String,
    #[serde(deserialize_with = "scalar_as_string")]
    value: String,
}

impl TryFrom<RawRuleSpec> for RuleSpec {
    type Error = RuleError;

    fn try_from(raw: RawRuleSpec) -> Result<Self, Self::Error> {
        let action = raw.action.parse::<RuleAction>()?;
        let logic_operator = raw.logic_operator.parse::<LogicOperator>()?;
        let conditions = raw
            .conditions
            .into_iter()
            .enumerate()
            .map(|(index, c)| {
                if c.field_key.is_empty() {
                    return Err(RuleError::EmptyFieldKey { index });
                }
                let operator = c
                    .operator
                    .parse::<ConditionOperator>()
                    .map_err(|operator| RuleError::UnknownOperator { index, operator })?;
                Ok(ConditionSpec {
                    field_key: c.field_key,
                    operator,
                    value: c.value,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RuleSpec {
            action,
            logic_operator,
            conditions,
        })
    }
}

/// Accept strings, numbers and booleans as condition values, normalised to
/// their text form (`3` becomes `"3"`, `true` becomes `"true"`).
fn scalar_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(de::Error::custom(format!(
            "condition value must be a string, number or boolean, got {other}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a rule from an already-decoded JSON value.
pub fn parse_rule(value: &Value) -> Result<RuleSpec, RuleError> {
    let raw = RawRuleSpec::deserialize(value).map_err(RuleError::Malformed)?;
    RuleSpec::try_from(raw)
}

/// Parse a rule from its serialized JSON text.
pub fn parse_rule_str(s: &str) -> Result<RuleSpec, RuleError> {
    let raw: RawRuleSpec = serde_json::from_str(s)?;
    RuleSpec::try_from(raw)
}
