//! In-memory filter evaluation.
//!
//! The [`Evaluator`] decides whether a document [`Node`] matches a [`Filter`],
//! following SCIM matching rules: attribute names are case-insensitive, text
//! comparisons ignore case unless configured otherwise, multi-valued
//! attributes match when any of their values match, and an absent attribute
//! equals `null`.
//!
//! ```rust
//! use scim_filter::{Filter, Node, evaluate};
//! use serde_json::json;
//!
//! let user = Node::from(json!({
//!     "userName": "bjensen",
//!     "emails": [{"value": "bjensen@example.com", "type": "work"}]
//! }));
//! let filter = Filter::parse(r#"emails[type eq "WORK"] and userName sw "BJ""#).unwrap();
//! assert!(evaluate(&filter, &user).unwrap());
//! ```

use crate::config::EvaluatorConfig;
use crate::document::{self, Node, Value};
use crate::error::{FilterError, FilterResult};
use crate::filter::{Filter, Operator};
use crate::path::{self, Path};
use log::debug;
use std::cmp::Ordering;

/// Evaluate `filter` against `node` with the default configuration.
pub fn evaluate(filter: &Filter, node: &Node) -> FilterResult<bool> {
    Evaluator::new().evaluate(filter, node)
}

/// Stateless filter matcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator {
    config: EvaluatorConfig,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EvaluatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Whether `node` matches `filter`.
    ///
    /// # Errors
    ///
    /// [`FilterError::InvalidValueType`] when an ordering operator meets a
    /// boolean or binary attribute value. Failures that are not caused by the
    /// filter itself surface as [`FilterError::Internal`].
    pub fn evaluate(&self, filter: &Filter, node: &Node) -> FilterResult<bool> {
        self.matches(filter, node).map_err(|error| {
            if error.is_client_error() {
                error
            } else {
                debug!("evaluation of '{}' failed: {}", filter, error);
                FilterError::internal(format!("failed to evaluate filter '{}': {}", filter, error))
            }
        })
    }

    /// The elements of an array node that match `filter`. A node that is not
    /// an array is treated as a single element.
    pub fn filter_array<'a>(
        &self,
        array: &'a Node,
        filter: &Filter,
    ) -> FilterResult<Vec<&'a Node>> {
        let elements = match array {
            Node::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        let mut matched = Vec::new();
        for element in elements {
            if self.evaluate(filter, element)? {
                matched.push(element);
            }
        }
        Ok(matched)
    }

    pub(crate) fn matches(&self, filter: &Filter, node: &Node) -> FilterResult<bool> {
        match filter {
            Filter::And(lhs, rhs) => Ok(self.matches(lhs, node)? && self.matches(rhs, node)?),
            Filter::Or(lhs, rhs) => Ok(self.matches(lhs, node)? || self.matches(rhs, node)?),
            Filter::Not(inner) => Ok(!self.matches(inner, node)?),
            Filter::Present(path) => {
                let candidates = self.candidates(path, node)?;
                Ok(candidates.iter().any(|candidate| !candidate.is_empty()))
            }
            Filter::Equal(path, value) => self.equal(path, value, node),
            Filter::GreaterThan(path, value)
            | Filter::GreaterOrEqual(path, value)
            | Filter::LessThan(path, value)
            | Filter::LessOrEqual(path, value) => {
                let operator = filter
                    .operator()
                    .ok_or_else(|| FilterError::internal("ordering filter without operator"))?;
                self.ordered(operator, path, value, node)
            }
            Filter::StartsWith(path, value)
            | Filter::EndsWith(path, value)
            | Filter::Contains(path, value) => {
                let operator = filter
                    .operator()
                    .ok_or_else(|| FilterError::internal("substring filter without operator"))?;
                self.substring(operator, path, value, node)
            }
            Filter::Complex(path, inner) => {
                for candidate in self.candidates(path, node)? {
                    let matched = match candidate {
                        Node::Array(items) => self.any_matches(inner, items)?,
                        other => self.matches(inner, other)?,
                    };
                    if matched {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    fn any_matches(&self, filter: &Filter, items: &[Node]) -> FilterResult<bool> {
        for item in items {
            if self.matches(filter, item)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// `attr eq null` also matches when the attribute is absent or holds only
    /// empty values.
    fn equal(&self, path: &Path, value: &Value, node: &Node) -> FilterResult<bool> {
        let candidates = self.candidates(path, node)?;
        if value.is_null() && candidates.iter().all(|candidate| candidate.is_empty()) {
            return Ok(true);
        }
        Ok(candidates
            .iter()
            .any(|candidate| document::equals(candidate, value, self.config.case_exact)))
    }

    /// Booleans and binary data have no ordering: any such candidate fails the
    /// whole comparison, even when another candidate would match.
    fn ordered(
        &self,
        operator: Operator,
        path: &Path,
        value: &Value,
        node: &Node,
    ) -> FilterResult<bool> {
        let candidates = self.candidates(path, node)?;
        if let Some(unordered) = candidates
            .iter()
            .find(|candidate| matches!(candidate, Node::Boolean(_) | Node::Binary(_)))
        {
            return Err(FilterError::InvalidValueType {
                operator,
                path: path.to_string(),
                found: unordered.type_name(),
            });
        }

        for candidate in candidates {
            let Some(ordering) = document::compare(candidate, value, self.config.case_exact)
            else {
                continue;
            };
            let holds = match operator {
                Operator::Gt => ordering == Ordering::Greater,
                Operator::Ge => ordering != Ordering::Less,
                Operator::Lt => ordering == Ordering::Less,
                Operator::Le => ordering != Ordering::Greater,
                _ => false,
            };
            if holds {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn substring(
        &self,
        operator: Operator,
        path: &Path,
        value: &Value,
        node: &Node,
    ) -> FilterResult<bool> {
        let candidates = self.candidates(path, node)?;
        let pattern = document::value_text(value);
        Ok(candidates.iter().any(|candidate| {
            match (document::node_text(candidate), pattern.as_deref()) {
                (Some(text), Some(pattern)) => {
                    document::text_match(operator, &text, pattern, self.config.case_exact)
                }
                _ => document::raw_equals(candidate, value),
            }
        }))
    }

    /// The values a leaf at `path` is tested against.
    fn candidates<'a>(&self, path: &Path, node: &'a Node) -> FilterResult<Vec<&'a Node>> {
        match node {
            Node::Array(items) => Ok(items.iter().collect()),
            Node::Object(_) => {
                let mut candidates = Vec::new();
                for found in path::select(self, path, node)? {
                    match found {
                        Node::Array(items) => candidates.extend(items.iter()),
                        other => candidates.push(other),
                    }
                }
                Ok(candidates)
            }
            scalar if path.is_value() => Ok(vec![scalar]),
            _ => Ok(Vec::new()),
        }
    }
}
