//! # SCIM Filter
//!
//! A command-line utility for checking SCIM filter expressions and trying
//! them against JSON documents.
//!
//! ## Usage
//!
//! ### Parse a Filter
//!
//! ```bash
//! cargo run --bin scim-filter 'userName eq "bjensen" and not (title pr)'
//! ```
//!
//! ### Evaluate Against Documents
//!
//! ```bash
//! cargo run --bin scim-filter 'emails[type eq "work"]' users.json
//! ```
//!
//! Each file holds a JSON object or an array of objects.
//!
//! ## Output Examples
//!
//! ```text
//! Filter: emails[type eq "work"]
//! Normalized: emails[type eq "work"]
//!
//! users.json
//!   ✓ [0] bjensen
//!   ✗ [1] jsmith
//!   Matched: 1 of 2
//! ```
//!
//! ## Environment
//!
//! - `SCIM_FILTER_CASE_EXACT`: compare text case-sensitively (`true`/`false`)
//! - `SCIM_FILTER_MAX_DEPTH`: maximum filter nesting depth
//! - `RUST_LOG`: log level, e.g. `RUST_LOG=scim_filter=trace`
//!
//! ## Exit Codes
//!
//! - `0`: The filter parsed and every document was evaluated
//! - `1`: The filter, a file or an evaluation failed
//! - `2`: Invalid usage

use scim_filter::{Evaluator, Filter, FilterConfig, Node};
use std::env;
use std::fs;
use std::path::Path;
use std::process;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <filter> [file.json ...]", args[0]);
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  {} 'userName eq \"bjensen\"'", args[0]);
        eprintln!("  {} 'emails[type eq \"work\"]' users.json", args[0]);
        process::exit(2);
    }

    let config = match load_config() {
        Ok(config) => config,
        Err(message) => {
            eprintln!("Error: {}", message);
            process::exit(2);
        }
    };

    let filter = match Filter::parse_with(&args[1], &config.parser) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("❌ Invalid filter: {}", e);
            process::exit(1);
        }
    };
    println!("Filter: {}", filter);
    println!("Normalized: {}", filter.normalize());

    let evaluator = Evaluator::with_config(config.evaluator);
    let mut failed = false;
    for file in &args[2..] {
        if let Err(message) = evaluate_file(&evaluator, &filter, Path::new(file)) {
            eprintln!("  ❌ {}", message);
            failed = true;
        }
    }

    if failed {
        process::exit(1);
    }
}

fn load_config() -> Result<FilterConfig, String> {
    let mut config = FilterConfig::default();
    if let Ok(value) = env::var("SCIM_FILTER_CASE_EXACT") {
        config.evaluator.case_exact = value
            .parse()
            .map_err(|_| format!("SCIM_FILTER_CASE_EXACT must be true or false, got '{}'", value))?;
    }
    if let Ok(value) = env::var("SCIM_FILTER_MAX_DEPTH") {
        config.parser.max_depth = value
            .parse()
            .map_err(|_| format!("SCIM_FILTER_MAX_DEPTH must be a number, got '{}'", value))?;
    }
    Ok(config)
}

fn evaluate_file(evaluator: &Evaluator, filter: &Filter, path: &Path) -> Result<(), String> {
    println!("\n{}", path.display());

    let content = fs::read_to_string(path).map_err(|e| format!("Failed to read file: {}", e))?;
    let document = Node::from_json_str(&content).map_err(|e| format!("Invalid JSON: {}", e))?;
    let documents = match document {
        Node::Array(items) => items,
        other => vec![other],
    };

    let mut matched = 0;
    for (position, document) in documents.iter().enumerate() {
        let is_match = evaluator
            .evaluate(filter, document)
            .map_err(|e| format!("Evaluation failed for [{}]: {}", position, e))?;
        let mark = if is_match { "✓" } else { "✗" };
        println!("  {} [{}] {}", mark, position, label(document));
        if is_match {
            matched += 1;
        }
    }
    println!("  Matched: {} of {}", matched, documents.len());
    Ok(())
}

/// A short human label for a document: its userName, displayName or id.
fn label(document: &Node) -> String {
    ["userName", "displayName", "id"]
        .iter()
        .find_map(|name| document.get(name).and_then(Node::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| "-".to_string())
}
