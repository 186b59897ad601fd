//! Attribute paths.
//!
//! A [`Path`] locates attributes inside a resource: an optional schema URN
//! namespace followed by dot-separated attribute names, each of which may carry
//! a value filter that restricts a multi-valued attribute to its matching
//! elements.
//!
//! ```rust
//! use scim_filter::path::Path;
//!
//! let path: Path = r#"emails[type eq "work"].value"#.parse().unwrap();
//! assert_eq!(path.len(), 2);
//! assert!(path.element(0).unwrap().filter().is_some());
//! assert_eq!(path.to_string(), r#"emails[type eq "work"].value"#);
//!
//! const ENTERPRISE: &str = "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User";
//!
//! let path = Path::parse(&format!("{}:manager.value", ENTERPRISE)).unwrap();
//! assert_eq!(path.namespace(), Some(ENTERPRISE));
//! ```

mod resolve;

pub(crate) use resolve::select;

use crate::error::FilterResult;
use crate::filter::Filter;
use std::fmt;
use std::str::FromStr;

/// Name of the sentinel attribute addressing bare elements of a
/// multi-valued attribute.
pub const VALUE_ATTRIBUTE: &str = "value";

/// One segment of a path: an attribute name with an optional value filter.
#[derive(Debug, Clone)]
pub struct PathElement {
    attribute: String,
    filter: Option<Box<Filter>>,
}

impl PathElement {
    pub fn new(attribute: impl Into<String>, filter: Option<Filter>) -> Self {
        Self {
            attribute: attribute.into(),
            filter: filter.map(Box::new),
        }
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_deref()
    }
}

impl PartialEq for PathElement {
    fn eq(&self, other: &Self) -> bool {
        self.attribute.eq_ignore_ascii_case(&other.attribute) && self.filter == other.filter
    }
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.attribute)?;
        if let Some(filter) = &self.filter {
            write!(f, "[{}]", filter)?;
        }
        Ok(())
    }
}

/// An attribute path, optionally qualified by a schema URN.
#[derive(Debug, Clone, Default)]
pub struct Path {
    namespace: Option<String>,
    elements: Vec<PathElement>,
}

impl Path {
    /// The root path, addressing the resource itself.
    pub fn root() -> Self {
        Self::default()
    }

    /// A single attribute path.
    pub fn attribute(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            elements: vec![PathElement::new(name, None)],
        }
    }

    /// The `value` sentinel path, used when a value filter such as
    /// `emails[value eq "x"]` is applied to bare array elements.
    pub fn value() -> Self {
        Self::attribute(VALUE_ATTRIBUTE)
    }

    /// A root path inside a schema extension namespace.
    pub fn namespaced(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            elements: Vec::new(),
        }
    }

    /// Parse a path expression. An empty expression yields the root path.
    pub fn parse(expression: &str) -> FilterResult<Self> {
        crate::filter::parser::parse_path(expression)
    }

    pub(crate) fn from_parts(namespace: Option<String>, elements: Vec<PathElement>) -> Self {
        Self {
            namespace,
            elements,
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn is_root(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn element(&self, index: usize) -> Option<&PathElement> {
        self.elements.get(index)
    }

    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathElement> {
        self.elements.iter()
    }

    /// Whether this is the `value` sentinel path.
    pub fn is_value(&self) -> bool {
        self.namespace.is_none()
            && self.elements.len() == 1
            && self.elements[0].filter.is_none()
            && self.elements[0].attribute.eq_ignore_ascii_case(VALUE_ATTRIBUTE)
    }

    /// Append a sub-attribute.
    pub fn child(&self, attribute: impl Into<String>) -> Self {
        self.child_filtered(attribute, None)
    }

    /// Append a sub-attribute carrying a value filter.
    pub fn child_filtered(&self, attribute: impl Into<String>, filter: Option<Filter>) -> Self {
        let mut elements = self.elements.clone();
        elements.push(PathElement::new(attribute, filter));
        Self {
            namespace: self.namespace.clone(),
            elements,
        }
    }

    /// The path truncated to its first `len` elements.
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            namespace: self.namespace.clone(),
            elements: self.elements[..len.min(self.elements.len())].to_vec(),
        }
    }

    /// The same path with every value filter dropped.
    pub fn without_filters(&self) -> Self {
        Self {
            namespace: self.namespace.clone(),
            elements: self
                .elements
                .iter()
                .map(|element| PathElement::new(element.attribute.clone(), None))
                .collect(),
        }
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        let namespace = match (&self.namespace, &other.namespace) {
            (Some(lhs), Some(rhs)) => lhs.eq_ignore_ascii_case(rhs),
            (None, None) => true,
            _ => false,
        };
        namespace && self.elements == other.elements
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(namespace) = &self.namespace {
            f.write_str(namespace)?;
            if !self.elements.is_empty() {
                f.write_str(":")?;
            }
        }
        for (index, element) in self.elements.iter().enumerate() {
            if index > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", element)?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = crate::error::FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a PathElement;
    type IntoIter = std::slice::Iter<'a, PathElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

/// Anything that can name a path: a parsed [`Path`] or an expression string.
pub trait IntoPath {
    fn into_path(self) -> FilterResult<Path>;
}

impl IntoPath for Path {
    fn into_path(self) -> FilterResult<Path> {
        Ok(self)
    }
}

impl IntoPath for &Path {
    fn into_path(self) -> FilterResult<Path> {
        Ok(self.clone())
    }
}

impl IntoPath for &str {
    fn into_path(self) -> FilterResult<Path> {
        Path::parse(self)
    }
}

impl IntoPath for String {
    fn into_path(self) -> FilterResult<Path> {
        Path::parse(&self)
    }
}

impl IntoPath for &String {
    fn into_path(self) -> FilterResult<Path> {
        Path::parse(self)
    }
}
