//! Configuration for filter parsing and evaluation.
//!
//! All configuration types implement `Default` with conservative limits and
//! deserialize from JSON with every field optional.
//!
//! ```rust
//! use scim_filter::config::FilterConfig;
//!
//! let config = FilterConfig::from_json(r#"{"parser": {"maxDepth": 4}}"#).unwrap();
//! assert_eq!(config.parser.max_depth, 4);
//! assert_eq!(config.parser.max_length, 4096);
//! assert!(!config.evaluator.case_exact);
//! ```

use crate::error::FilterResult;
use serde::{Deserialize, Serialize};

/// Top level configuration for the filter engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterConfig {
    /// Limits applied while parsing filter expressions
    pub parser: ParserConfig,
    /// Comparison behaviour of the evaluator
    pub evaluator: EvaluatorConfig,
}

impl FilterConfig {
    /// Load configuration from a JSON document.
    pub fn from_json(json: &str) -> FilterResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Filter parsing limits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ParserConfig {
    /// Maximum length of a filter expression in bytes
    pub max_length: usize,
    /// Maximum nesting depth of groups, `not` and complex attribute filters
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_length: 4096,
            max_depth: 10,
        }
    }
}

/// Evaluator comparison settings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct EvaluatorConfig {
    /// Compare text case-sensitively (SCIM `caseExact` semantics)
    pub case_exact: bool,
}
