//! Integration tests for the filter engine.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test integration::evaluation
//! cargo test integration::properties -- --nocapture
//! ```

pub mod evaluation;
pub mod parsing;
pub mod storage;
pub mod translation;
