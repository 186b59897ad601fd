//! SCIM/ICF filter engine for Rust.
//!
//! Parses search filters into an immutable [`Filter`] tree, evaluates them
//! against JSON-like documents, and translates them into the native queries
//! of a backend that supports only part of the filter language.
//!
//! # Core Components
//!
//! - [`Filter`] and [`FilterFactory`] - the filter tree and its constructors
//! - [`Evaluator`] - in-memory matching with SCIM semantics
//! - [`Translator`] - filter to backend query translation with simplification
//! - [`storage::InMemoryStorage`] - document storage searchable by filter
//!
//! # Quick Start
//!
//! ```rust
//! use scim_filter::{Filter, FilterFactory, Node, Operator, Translator, evaluate};
//! use serde_json::json;
//!
//! let filter = Filter::parse(r#"userName eq "bjensen" and title pr"#).unwrap();
//! let user = Node::from(json!({"userName": "BJensen", "title": "Tour Guide"}));
//! assert!(evaluate(&filter, &user).unwrap());
//!
//! // A backend that only understands equality
//! let translator: Translator<String> = Translator::builder()
//!     .with_leaf(Operator::Eq, |filter, not| {
//!         if not {
//!             return None;
//!         }
//!         Some(format!("{}={}", filter.path()?, filter.value()?))
//!     })
//!     .build();
//! let queries = translator.translate(Some(&filter)).unwrap();
//! assert_eq!(queries, vec![r#"userName="bjensen""#.to_string()]);
//!
//! let built = FilterFactory::eq("userName", "bjensen").unwrap();
//! assert_eq!(built.to_string(), r#"userName eq "bjensen""#);
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod evaluator;
pub mod filter;
pub mod path;
pub mod storage;
pub mod translator;

// Re-export commonly used types for convenience
pub use config::{EvaluatorConfig, FilterConfig, ParserConfig};
pub use document::{Node, Object, Value};
pub use error::{FilterError, FilterResult, StorageError, StorageResult};
pub use evaluator::{Evaluator, evaluate};
pub use filter::{Filter, FilterFactory, FilterKind, Operator};
pub use path::{IntoPath, Path, PathElement};
pub use translator::{Translator, TranslatorBuilder};
