//! Typed constructors for filter trees.

use super::{Filter, Operator};
use crate::config::ParserConfig;
use crate::document::Value;
use crate::error::{FilterError, FilterResult};
use crate::path::{IntoPath, Path};

/// Builds [`Filter`] trees.
///
/// Composites never fail. Leaf and complex constructors accept any
/// [`IntoPath`] and fail with
/// [`FilterError::InvalidPath`](crate::FilterError::InvalidPath) when a
/// textual path does not parse or names no attribute.
///
/// # Examples
///
/// ```rust
/// use scim_filter::filter::FilterFactory;
///
/// let filter = FilterFactory::or(
///     FilterFactory::sw("userName", "bj").unwrap(),
///     FilterFactory::ge("meta.version", 3).unwrap(),
/// );
/// assert_eq!(filter.to_string(), r#"userName sw "bj" or meta.version ge 3"#);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterFactory;

impl FilterFactory {
    pub fn and(lhs: Filter, rhs: Filter) -> Filter {
        Filter::And(Box::new(lhs), Box::new(rhs))
    }

    pub fn or(lhs: Filter, rhs: Filter) -> Filter {
        Filter::Or(Box::new(lhs), Box::new(rhs))
    }

    pub fn not(filter: Filter) -> Filter {
        Filter::Not(Box::new(filter))
    }

    /// Conjunction of every filter, left-associated. `None` when empty.
    pub fn and_all<I>(filters: I) -> Option<Filter>
    where
        I: IntoIterator<Item = Filter>,
    {
        filters.into_iter().reduce(Self::and)
    }

    /// Disjunction of every filter, left-associated. `None` when empty.
    pub fn or_all<I>(filters: I) -> Option<Filter>
    where
        I: IntoIterator<Item = Filter>,
    {
        filters.into_iter().reduce(Self::or)
    }

    pub fn pr(path: impl IntoPath) -> FilterResult<Filter> {
        Ok(Filter::Present(attribute_path(path)?))
    }

    pub fn eq(path: impl IntoPath, value: impl Into<Value>) -> FilterResult<Filter> {
        Self::leaf(Operator::Eq, path, value)
    }

    pub fn gt(path: impl IntoPath, value: impl Into<Value>) -> FilterResult<Filter> {
        Self::leaf(Operator::Gt, path, value)
    }

    pub fn ge(path: impl IntoPath, value: impl Into<Value>) -> FilterResult<Filter> {
        Self::leaf(Operator::Ge, path, value)
    }

    pub fn lt(path: impl IntoPath, value: impl Into<Value>) -> FilterResult<Filter> {
        Self::leaf(Operator::Lt, path, value)
    }

    pub fn le(path: impl IntoPath, value: impl Into<Value>) -> FilterResult<Filter> {
        Self::leaf(Operator::Le, path, value)
    }

    pub fn sw(path: impl IntoPath, value: impl Into<Value>) -> FilterResult<Filter> {
        Self::leaf(Operator::Sw, path, value)
    }

    pub fn ew(path: impl IntoPath, value: impl Into<Value>) -> FilterResult<Filter> {
        Self::leaf(Operator::Ew, path, value)
    }

    pub fn co(path: impl IntoPath, value: impl Into<Value>) -> FilterResult<Filter> {
        Self::leaf(Operator::Co, path, value)
    }

    /// Apply `inner` to the elements of the multi-valued attribute at `path`.
    pub fn complex(path: impl IntoPath, inner: Filter) -> FilterResult<Filter> {
        Ok(Filter::Complex(attribute_path(path)?, Box::new(inner)))
    }

    /// Like [`complex`](Self::complex), with the inner filter given as text.
    pub fn complex_expr(path: impl IntoPath, expression: &str) -> FilterResult<Filter> {
        let path = attribute_path(path)?;
        let inner = super::parser::parse_filter(expression, &ParserConfig::default())?;
        Ok(Filter::Complex(path, Box::new(inner)))
    }

    /// Parse a complete filter expression.
    pub fn from(expression: &str) -> FilterResult<Filter> {
        Filter::parse(expression)
    }

    fn leaf(
        operator: Operator,
        path: impl IntoPath,
        value: impl Into<Value>,
    ) -> FilterResult<Filter> {
        Ok(Filter::compare(operator, attribute_path(path)?, value.into()))
    }
}

/// A predicate on the root path has no SCIM rendering.
fn attribute_path(path: impl IntoPath) -> FilterResult<Path> {
    let path = path.into_path()?;
    if path.is_root() {
        return Err(FilterError::invalid_path(format!(
            "filter path '{}' names no attribute",
            path
        )));
    }
    Ok(path)
}
