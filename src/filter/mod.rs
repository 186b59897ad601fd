//! Filter expression tree.
//!
//! A [`Filter`] is an immutable tree of boolean composites (`and`, `or`,
//! `not`) over typed leaf predicates. Leaves compare the attribute at a
//! [`Path`] with a [`Value`]; `Complex` leaves apply a nested filter to the
//! elements of a multi-valued attribute.
//!
//! Filters are built with [`FilterFactory`] or parsed from SCIM filter syntax
//! (RFC 7644 §3.4.2.2):
//!
//! ```rust
//! use scim_filter::filter::{Filter, FilterFactory};
//!
//! let parsed = Filter::parse(r#"userName eq "bjensen" and not (title pr)"#).unwrap();
//! let built = FilterFactory::and(
//!     FilterFactory::eq("userName", "bjensen").unwrap(),
//!     FilterFactory::not(FilterFactory::pr("title").unwrap()),
//! );
//! assert_eq!(parsed, built);
//! assert_eq!(parsed.to_string(), r#"userName eq "bjensen" and not (title pr)"#);
//! ```

pub mod factory;
pub mod parser;

pub use factory::FilterFactory;

use crate::config::ParserConfig;
use crate::document::Value;
use crate::error::FilterResult;
use crate::path::Path;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Leaf comparison operators.
///
/// `ne` is not an operator of the tree: the parser expands it to `not (eq)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    /// Present (attribute has a non-empty value)
    #[serde(rename = "pr")]
    Pr,

    /// Equal comparison
    #[serde(rename = "eq")]
    Eq,

    /// Greater than
    #[serde(rename = "gt")]
    Gt,

    /// Greater than or equal
    #[serde(rename = "ge")]
    Ge,

    /// Less than
    #[serde(rename = "lt")]
    Lt,

    /// Less than or equal
    #[serde(rename = "le")]
    Le,

    /// Starts with operation for strings
    #[serde(rename = "sw")]
    Sw,

    /// Ends with operation for strings
    #[serde(rename = "ew")]
    Ew,

    /// Contains operation for strings
    #[serde(rename = "co")]
    Co,
}

impl Operator {
    pub const ALL: [Operator; 9] = [
        Operator::Pr,
        Operator::Eq,
        Operator::Gt,
        Operator::Ge,
        Operator::Lt,
        Operator::Le,
        Operator::Sw,
        Operator::Ew,
        Operator::Co,
    ];

    /// The SCIM keyword of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Pr => "pr",
            Operator::Eq => "eq",
            Operator::Gt => "gt",
            Operator::Ge => "ge",
            Operator::Lt => "lt",
            Operator::Le => "le",
            Operator::Sw => "sw",
            Operator::Ew => "ew",
            Operator::Co => "co",
        }
    }

    /// Whether the operator orders its operands (`gt`, `ge`, `lt`, `le`).
    pub fn is_ordering(&self) -> bool {
        matches!(self, Operator::Gt | Operator::Ge | Operator::Lt | Operator::Le)
    }

    /// Whether the operator is a substring test (`sw`, `ew`, `co`).
    pub fn is_substring(&self) -> bool {
        matches!(self, Operator::Sw | Operator::Ew | Operator::Co)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = crate::error::FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                crate::error::FilterError::invalid_filter(format!("unknown operator '{}'", s))
            })
    }
}

/// Tag of a filter node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    And,
    Or,
    Not,
    Complex,
    Leaf(Operator),
}

/// A filter expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    And(Box<Filter>, Box<Filter>),
    Or(Box<Filter>, Box<Filter>),
    Not(Box<Filter>),
    Present(Path),
    Equal(Path, Value),
    GreaterThan(Path, Value),
    GreaterOrEqual(Path, Value),
    LessThan(Path, Value),
    LessOrEqual(Path, Value),
    StartsWith(Path, Value),
    EndsWith(Path, Value),
    Contains(Path, Value),
    Complex(Path, Box<Filter>),
}

impl Filter {
    /// Parse a filter expression with the default parser limits.
    pub fn parse(expression: &str) -> FilterResult<Self> {
        parser::parse_filter(expression, &ParserConfig::default())
    }

    /// Parse a filter expression with explicit parser limits.
    pub fn parse_with(expression: &str, config: &ParserConfig) -> FilterResult<Self> {
        parser::parse_filter(expression, config)
    }

    /// Build a comparison leaf. `pr` ignores `value`.
    ///
    /// The path is taken as is; a leaf on the root path cannot be rendered.
    /// [`FilterFactory`] rejects such paths.
    pub fn compare(operator: Operator, path: Path, value: Value) -> Self {
        match operator {
            Operator::Pr => Filter::Present(path),
            Operator::Eq => Filter::Equal(path, value),
            Operator::Gt => Filter::GreaterThan(path, value),
            Operator::Ge => Filter::GreaterOrEqual(path, value),
            Operator::Lt => Filter::LessThan(path, value),
            Operator::Le => Filter::LessOrEqual(path, value),
            Operator::Sw => Filter::StartsWith(path, value),
            Operator::Ew => Filter::EndsWith(path, value),
            Operator::Co => Filter::Contains(path, value),
        }
    }

    pub fn kind(&self) -> FilterKind {
        match self {
            Filter::And(..) => FilterKind::And,
            Filter::Or(..) => FilterKind::Or,
            Filter::Not(_) => FilterKind::Not,
            Filter::Complex(..) => FilterKind::Complex,
            _ => match self.operator() {
                Some(operator) => FilterKind::Leaf(operator),
                None => unreachable!("every remaining variant is a leaf predicate"),
            },
        }
    }

    /// The operator of a leaf predicate.
    pub fn operator(&self) -> Option<Operator> {
        match self {
            Filter::Present(_) => Some(Operator::Pr),
            Filter::Equal(..) => Some(Operator::Eq),
            Filter::GreaterThan(..) => Some(Operator::Gt),
            Filter::GreaterOrEqual(..) => Some(Operator::Ge),
            Filter::LessThan(..) => Some(Operator::Lt),
            Filter::LessOrEqual(..) => Some(Operator::Le),
            Filter::StartsWith(..) => Some(Operator::Sw),
            Filter::EndsWith(..) => Some(Operator::Ew),
            Filter::Contains(..) => Some(Operator::Co),
            Filter::And(..) | Filter::Or(..) | Filter::Not(_) | Filter::Complex(..) => None,
        }
    }

    /// The attribute path of a leaf or complex filter.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Filter::Present(path)
            | Filter::Equal(path, _)
            | Filter::GreaterThan(path, _)
            | Filter::GreaterOrEqual(path, _)
            | Filter::LessThan(path, _)
            | Filter::LessOrEqual(path, _)
            | Filter::StartsWith(path, _)
            | Filter::EndsWith(path, _)
            | Filter::Contains(path, _)
            | Filter::Complex(path, _) => Some(path),
            Filter::And(..) | Filter::Or(..) | Filter::Not(_) => None,
        }
    }

    /// The comparison value of a leaf other than `pr`.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Filter::Equal(_, value)
            | Filter::GreaterThan(_, value)
            | Filter::GreaterOrEqual(_, value)
            | Filter::LessThan(_, value)
            | Filter::LessOrEqual(_, value)
            | Filter::StartsWith(_, value)
            | Filter::EndsWith(_, value)
            | Filter::Contains(_, value) => Some(value),
            _ => None,
        }
    }

    /// The operand of `not`, or the nested filter of a complex filter.
    pub fn inner(&self) -> Option<&Filter> {
        match self {
            Filter::Not(inner) | Filter::Complex(_, inner) => Some(inner),
            _ => None,
        }
    }

    /// Left operand of `and` / `or`.
    pub fn lhs(&self) -> Option<&Filter> {
        match self {
            Filter::And(lhs, _) | Filter::Or(lhs, _) => Some(lhs),
            _ => None,
        }
    }

    /// Right operand of `and` / `or`.
    pub fn rhs(&self) -> Option<&Filter> {
        match self {
            Filter::And(_, rhs) | Filter::Or(_, rhs) => Some(rhs),
            _ => None,
        }
    }

    /// Whether this is a leaf predicate (complex filters excluded).
    pub fn is_leaf(&self) -> bool {
        self.operator().is_some()
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, Filter::Complex(..))
    }

    /// Push every `not` down to the leaves using De Morgan's laws.
    ///
    /// In the result every `Not` directly wraps a leaf or complex filter.
    pub fn normalize(&self) -> Filter {
        match self {
            Filter::And(lhs, rhs) => FilterFactory::and(lhs.normalize(), rhs.normalize()),
            Filter::Or(lhs, rhs) => FilterFactory::or(lhs.normalize(), rhs.normalize()),
            Filter::Not(inner) => inner.normalize().negate(),
            leaf => leaf.clone(),
        }
    }

    /// The logical complement, with negation pushed through composites.
    pub fn negate(&self) -> Filter {
        match self {
            Filter::And(lhs, rhs) => FilterFactory::or(lhs.negate(), rhs.negate()),
            Filter::Or(lhs, rhs) => FilterFactory::and(lhs.negate(), rhs.negate()),
            Filter::Not(inner) => inner.as_ref().clone(),
            leaf => FilterFactory::not(leaf.clone()),
        }
    }

    /// Nesting depth of the tree; a single leaf has depth 1.
    pub fn depth(&self) -> usize {
        match self {
            Filter::And(lhs, rhs) | Filter::Or(lhs, rhs) => 1 + lhs.depth().max(rhs.depth()),
            Filter::Not(inner) | Filter::Complex(_, inner) => 1 + inner.depth(),
            _ => 1,
        }
    }
}

impl FromStr for Filter {
    type Err = crate::error::FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Filter::parse(s)
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, operand: &Filter, grouped: bool) -> fmt::Result {
    if grouped {
        write!(f, "({})", operand)
    } else {
        write!(f, "{}", operand)
    }
}

/// Renders the filter in SCIM syntax; parsing the output yields an equal
/// filter. Binary literals come back as their base64 string, which matches
/// exactly the same documents.
impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::And(lhs, rhs) => {
                write_operand(f, lhs, matches!(**lhs, Filter::Or(..)))?;
                f.write_str(" and ")?;
                write_operand(f, rhs, matches!(**rhs, Filter::Or(..) | Filter::And(..)))
            }
            Filter::Or(lhs, rhs) => {
                write_operand(f, lhs, false)?;
                f.write_str(" or ")?;
                write_operand(f, rhs, matches!(**rhs, Filter::Or(..)))
            }
            Filter::Not(inner) => write!(f, "not ({})", inner),
            Filter::Present(path) => write!(f, "{} pr", path),
            Filter::Complex(path, inner) => write!(f, "{}[{}]", path, inner),
            leaf => match (leaf.path(), leaf.operator(), leaf.value()) {
                (Some(path), Some(operator), Some(value)) => {
                    write!(f, "{} {} {}", path, operator, value)
                }
                _ => Err(fmt::Error),
            },
        }
    }
}
