//! Common test utilities for filter testing.
//!
//! Provides fixtures, fluent document builders and small helpers shared by
//! the integration suites.

use scim_filter::{Filter, Node, evaluate};

pub mod builders;

/// Install `env_logger` once per test binary. Set `RUST_LOG=scim_filter=trace`
/// to follow translator decisions.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Parse a filter that is known to be valid.
pub fn parse(expression: &str) -> Filter {
    Filter::parse(expression)
        .unwrap_or_else(|e| panic!("failed to parse '{}': {}", expression, e))
}

/// Evaluate a filter expression against a JSON document.
pub fn matches(expression: &str, document: &serde_json::Value) -> bool {
    let node = Node::from(document.clone());
    evaluate(&parse(expression), &node)
        .unwrap_or_else(|e| panic!("failed to evaluate '{}': {}", expression, e))
}

/// Assert that each `(expression, expected)` pair evaluates as expected
/// against `document`.
#[macro_export]
macro_rules! assert_filters {
    ($document:expr, [$(($expression:expr, $expected:expr $(,)?)),* $(,)?]) => {
        $(
            assert_eq!(
                $crate::common::matches($expression, &$document),
                $expected,
                "filter: {}",
                $expression
            );
        )*
    };
}
