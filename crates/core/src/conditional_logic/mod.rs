//! Conditional field visibility for questionnaires.
//!
//! Provides the rule types, their wire-format parser, and a pure evaluator
//! that decides whether a field is shown given the answers collected so far.

pub mod evaluator;
pub mod rules;

pub use evaluator::{evaluate_condition, evaluate_rule_json, is_field_visible, AnswerSet};
pub use rules::{
    parse_rule, parse_rule_str, ConditionOperator, ConditionSpec, LogicOperator, RuleAction,
    RuleError, RuleSpec,
};
