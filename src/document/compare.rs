//! Typed comparison between document nodes and filter values.

use super::{Node, Value};
use crate::filter::Operator;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde_json::Number;
use std::borrow::Cow;
use std::cmp::Ordering;

/// Compare a document node with a filter value.
///
/// Returns `None` when the two have no common ordering (different types, or
/// a container node). Text that parses as an RFC 3339 timestamp on both sides
/// is compared chronologically; other text is compared case-insensitively
/// unless `case_exact` is set. Binary data on either side compares as its
/// base64 text, so a binary literal and its rendered string behave the same.
pub(crate) fn compare(node: &Node, value: &Value, case_exact: bool) -> Option<Ordering> {
    match (node, value) {
        (Node::Number(lhs), Value::Number(rhs)) => compare_numbers(lhs, rhs),
        (Node::Boolean(lhs), Value::Boolean(rhs)) => Some(lhs.cmp(rhs)),
        (Node::Null, Value::Null) => Some(Ordering::Equal),
        _ => {
            let (lhs, rhs) = (node_text(node)?, value_text(value)?);
            Some(compare_text(&lhs, &rhs, case_exact))
        }
    }
}

/// Typed equality used by `eq`.
pub(crate) fn equals(node: &Node, value: &Value, case_exact: bool) -> bool {
    compare(node, value, case_exact) == Some(Ordering::Equal)
}

/// Text of a string or binary node, the latter base64 encoded.
pub(crate) fn node_text(node: &Node) -> Option<Cow<'_, str>> {
    match node {
        Node::String(text) => Some(Cow::Borrowed(text.as_str())),
        Node::Binary(bytes) => Some(Cow::Owned(STANDARD.encode(bytes))),
        _ => None,
    }
}

/// Counterpart of [`node_text`] for filter values.
pub(crate) fn value_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(text) => Some(Cow::Borrowed(text.as_str())),
        Value::Binary(bytes) => Some(Cow::Owned(STANDARD.encode(bytes))),
        _ => None,
    }
}

/// Exact equality of the raw node against the value, without any type
/// coercion or case folding.
pub(crate) fn raw_equals(node: &Node, value: &Value) -> bool {
    match (node, value) {
        (Node::Null, Value::Null) => true,
        (Node::Boolean(lhs), Value::Boolean(rhs)) => lhs == rhs,
        (Node::Number(lhs), Value::Number(rhs)) => lhs == rhs,
        (Node::String(lhs), Value::String(rhs)) => lhs == rhs,
        (Node::Binary(lhs), Value::Binary(rhs)) => lhs == rhs,
        _ => false,
    }
}

/// Substring test for `sw`, `ew` and `co`.
pub(crate) fn text_match(
    operator: Operator,
    candidate: &str,
    value: &str,
    case_exact: bool,
) -> bool {
    let (candidate, value) = if case_exact {
        (candidate.to_string(), value.to_string())
    } else {
        (candidate.to_lowercase(), value.to_lowercase())
    };
    match operator {
        Operator::Sw => candidate.starts_with(&value),
        Operator::Ew => candidate.ends_with(&value),
        Operator::Co => candidate.contains(&value),
        _ => false,
    }
}

/// Canonical text of a scalar node such that two scalars are `equals`
/// (case-insensitively) exactly when their keys are identical. Containers and
/// nulls have no key.
pub(crate) fn node_key(node: &Node) -> Option<String> {
    match node {
        Node::Number(number) => number_key(number),
        Node::Boolean(b) => Some(format!("b:{}", b)),
        _ => node_text(node).map(|text| text_key(&text)),
    }
}

/// Counterpart of [`node_key`] for filter values.
pub(crate) fn value_key(value: &Value) -> Option<String> {
    match value {
        Value::Number(number) => number_key(number),
        Value::Boolean(b) => Some(format!("b:{}", b)),
        _ => value_text(value).map(|text| text_key(&text)),
    }
}

fn text_key(text: &str) -> String {
    match timestamp(text) {
        Some(instant) => format!(
            "t:{}",
            instant.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::AutoSi, true)
        ),
        None => format!("s:{}", text.to_lowercase()),
    }
}

fn number_key(number: &Number) -> Option<String> {
    if let Some(n) = number.as_i64() {
        return Some(format!("n:{}", n));
    }
    if let Some(n) = number.as_u64() {
        return Some(format!("n:{}", n));
    }
    let n = number.as_f64()?;
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        Some(format!("n:{}", n as i64))
    } else {
        Some(format!("n:{}", n))
    }
}

fn compare_text(lhs: &str, rhs: &str, case_exact: bool) -> Ordering {
    if let (Some(lhs), Some(rhs)) = (timestamp(lhs), timestamp(rhs)) {
        return lhs.cmp(&rhs);
    }
    if case_exact {
        lhs.cmp(rhs)
    } else {
        lhs.to_lowercase().cmp(&rhs.to_lowercase())
    }
}

fn timestamp(text: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(text.trim()).ok()
}

fn compare_numbers(lhs: &Number, rhs: &Number) -> Option<Ordering> {
    if let (Some(lhs), Some(rhs)) = (lhs.as_i64(), rhs.as_i64()) {
        return Some(lhs.cmp(&rhs));
    }
    if let (Some(lhs), Some(rhs)) = (lhs.as_u64(), rhs.as_u64()) {
        return Some(lhs.cmp(&rhs));
    }
    lhs.as_f64()?.partial_cmp(&rhs.as_f64()?)
}
