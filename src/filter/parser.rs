//! SCIM filter and attribute path grammar.
//!
//! ```text
//! filter     = or-expr
//! or-expr    = and-expr *( SP "or" SP and-expr )
//! and-expr   = unary *( SP "and" SP unary )
//! unary      = "not" *SP "(" filter ")" / "(" filter ")" / attr-expr
//! attr-expr  = path SP "pr" / path SP compare-op SP value / path "[" filter "]"
//! path       = [ urn ":" ] segment *( "." segment )
//! segment    = attrname [ "[" filter "]" ]
//! ```
//!
//! Keywords are case-insensitive, `ne` expands to `not (eq)` and `and` binds
//! tighter than `or`. Errors carry the byte offset where parsing stopped.

use super::{Filter, Operator};
use crate::config::ParserConfig;
use crate::document::Value;
use crate::error::{FilterError, FilterResult};
use crate::path::{Path, PathElement};
use log::trace;
use serde_json::Number;
use winnow::ascii::{Caseless, space0, space1};
use winnow::combinator::alt;
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::take_while;

/// Parse a complete filter expression.
pub fn parse_filter(expression: &str, config: &ParserConfig) -> FilterResult<Filter> {
    if expression.len() > config.max_length {
        return Err(FilterError::invalid_filter(format!(
            "filter exceeds the maximum length of {} bytes",
            config.max_length
        ))
        .at(config.max_length));
    }

    let grammar = Grammar::new(expression, config);
    let mut input = expression;
    let parsed = grammar.complete(&mut input, |input| grammar.filter(input, 0));
    match parsed {
        Ok(filter) => {
            trace!("parsed filter '{}' as {:?}", expression, filter);
            Ok(filter)
        }
        Err(failure) => Err(FilterError::invalid_filter(failure.message).at(failure.offset)),
    }
}

/// Parse an attribute path. Blank input yields the root path.
pub fn parse_path(expression: &str) -> FilterResult<Path> {
    let config = ParserConfig::default();
    let grammar = Grammar::new(expression, &config);
    let mut input = expression;
    grammar
        .complete(&mut input, |input| {
            if input.is_empty() {
                Ok(Path::root())
            } else {
                grammar.path(input, 0)
            }
        })
        .map_err(|failure| FilterError::invalid_path(failure.message).at(failure.offset))
}

#[derive(Debug)]
struct Failure {
    offset: usize,
    message: String,
}

type Step<T> = Result<T, Failure>;

struct Grammar<'s> {
    source: &'s str,
    max_depth: usize,
}

impl<'s> Grammar<'s> {
    fn new(source: &'s str, config: &ParserConfig) -> Self {
        Self {
            source,
            max_depth: config.max_depth,
        }
    }

    fn offset(&self, input: &str) -> usize {
        self.source.len() - input.len()
    }

    fn fail<T>(&self, input: &str, message: impl Into<String>) -> Step<T> {
        Err(Failure {
            offset: self.offset(input),
            message: message.into(),
        })
    }

    /// Run `parse` over the whole input, allowing surrounding blanks.
    fn complete<T>(
        &self,
        input: &mut &'s str,
        parse: impl FnOnce(&mut &'s str) -> Step<T>,
    ) -> Step<T> {
        skip_space(input);
        let parsed = parse(input)?;
        skip_space(input);
        if !input.is_empty() {
            return self.fail(input, format!("unexpected input '{}'", preview(input)));
        }
        Ok(parsed)
    }

    fn enter(&self, input: &str, depth: usize) -> Step<usize> {
        let depth = depth + 1;
        if depth > self.max_depth {
            return self.fail(
                input,
                format!("filter nesting exceeds the maximum depth of {}", self.max_depth),
            );
        }
        Ok(depth)
    }

    fn filter(&self, input: &mut &'s str, depth: usize) -> Step<Filter> {
        let mut filter = self.and_expression(input, depth)?;
        while self.connective(input, "or") {
            let rhs = self.and_expression(input, depth)?;
            filter = Filter::Or(Box::new(filter), Box::new(rhs));
        }
        Ok(filter)
    }

    fn and_expression(&self, input: &mut &'s str, depth: usize) -> Step<Filter> {
        let mut filter = self.unary(input, depth)?;
        while self.connective(input, "and") {
            let rhs = self.unary(input, depth)?;
            filter = Filter::And(Box::new(filter), Box::new(rhs));
        }
        Ok(filter)
    }

    /// Consume `SP word` followed by optional blanks, or nothing at all.
    fn connective(&self, input: &mut &'s str, word: &'static str) -> bool {
        let checkpoint = *input;
        let spaced: Result<&str, ContextError> = space1.parse_next(input);
        if spaced.is_ok() && keyword(input, word) {
            skip_space(input);
            return true;
        }
        *input = checkpoint;
        false
    }

    fn unary(&self, input: &mut &'s str, depth: usize) -> Step<Filter> {
        let checkpoint = *input;
        if keyword(input, "not") {
            skip_space(input);
            if input.starts_with('(') {
                let inner = self.group(input, depth)?;
                return Ok(Filter::Not(Box::new(inner)));
            }
            // An attribute that happens to be called "not".
            *input = checkpoint;
        }
        if input.starts_with('(') {
            return self.group(input, depth);
        }
        self.attribute_expression(input, depth)
    }

    fn group(&self, input: &mut &'s str, depth: usize) -> Step<Filter> {
        let depth = self.enter(input, depth)?;
        let opened: Result<char, ContextError> = '('.parse_next(input);
        if opened.is_err() {
            return self.fail(input, "expected '('");
        }
        skip_space(input);
        let inner = self.filter(input, depth)?;
        skip_space(input);
        let closed: Result<char, ContextError> = ')'.parse_next(input);
        if closed.is_err() {
            return self.fail(input, "expected ')' to close group");
        }
        Ok(inner)
    }

    fn attribute_expression(&self, input: &mut &'s str, depth: usize) -> Step<Filter> {
        if input.is_empty() {
            return self.fail(input, "expected attribute path");
        }
        let path = self.path(input, depth)?;

        let checkpoint = *input;
        let spaced: Result<&str, ContextError> = space1.parse_next(input);
        let word_start = *input;
        let word: Result<&str, ContextError> =
            take_while(0.., |c: char| c.is_ascii_alphanumeric()).parse_next(input);
        let word = match (spaced, word) {
            (Ok(_), Ok(word)) => word,
            _ => "",
        };

        let Some((operator, negated)) = comparison_operator(word) else {
            *input = checkpoint;
            return match complex(&path) {
                Some(filter) => Ok(filter),
                None if word.is_empty() => {
                    self.fail(word_start, "expected operator after attribute path")
                }
                None => self.fail(word_start, format!("unknown operator '{}'", word)),
            };
        };

        if operator == Operator::Pr {
            return Ok(Filter::Present(path));
        }
        let spaced: Result<&str, ContextError> = space1.parse_next(input);
        if spaced.is_err() || input.is_empty() {
            return self.fail(
                input,
                format!("expected value after '{}'", word.to_ascii_lowercase()),
            );
        }
        let value = self.value(input)?;
        let leaf = Filter::compare(operator, path, value);
        Ok(if negated { Filter::Not(Box::new(leaf)) } else { leaf })
    }

    fn value(&self, input: &mut &'s str) -> Step<Value> {
        if input.starts_with('"') {
            return self.string(input);
        }

        let start = *input;
        let keyword: Result<Value, ContextError> = alt((
            Caseless("true").value(Value::Boolean(true)),
            Caseless("false").value(Value::Boolean(false)),
            Caseless("null").value(Value::Null),
        ))
        .parse_next(input);
        if let Ok(value) = keyword {
            if at_boundary(input) {
                return Ok(value);
            }
            *input = start;
        }

        let token: Result<&str, ContextError> =
            take_while(1.., |c: char| !c.is_whitespace() && c != ')' && c != ']').parse_next(input);
        let Ok(token) = token else {
            return self.fail(start, "expected value");
        };
        if token.starts_with(|c: char| c == '-' || c.is_ascii_digit()) {
            return match token.parse::<Number>() {
                Ok(number) => Ok(Value::Number(number)),
                Err(_) => self.fail(start, format!("invalid number '{}'", token)),
            };
        }
        self.fail(
            start,
            format!("invalid value '{}': expected a string, number, boolean or null", token),
        )
    }

    fn string(&self, input: &mut &'s str) -> Step<Value> {
        let text: &'s str = input;
        let mut escaped = false;
        let end = text.char_indices().skip(1).find_map(|(index, c)| {
            match (escaped, c) {
                (true, _) => escaped = false,
                (false, '\\') => escaped = true,
                (false, '"') => return Some(index),
                _ => {}
            }
            None
        });
        let Some(end) = end else {
            return self.fail(text, "unterminated string");
        };

        let (literal, rest) = text.split_at(end + 1);
        match serde_json::from_str::<String>(literal) {
            Ok(text) => {
                *input = rest;
                Ok(Value::String(text))
            }
            Err(e) => self.fail(text, format!("invalid string {}: {}", literal, e)),
        }
    }

    /// `[urn:] name[filter] (. name[filter])*`
    fn path(&self, input: &mut &'s str, depth: usize) -> Step<Path> {
        let mut namespace = None;
        let mut elements: Vec<PathElement> = Vec::new();

        loop {
            let run_start = *input;
            let run: Result<&str, ContextError> = take_while(1.., is_path_char).parse_next(input);
            let Ok(run) = run else {
                return self.fail(run_start, "expected attribute name");
            };

            let mut names = run;
            let mut names_start = run_start;
            if elements.is_empty() && namespace.is_none() && is_urn(run) {
                match run.rfind(':') {
                    Some(split) if split + 1 < run.len() => {
                        namespace = Some(run[..split].to_string());
                        names = &run[split + 1..];
                        names_start = &run_start[split + 1..];
                    }
                    _ => return self.fail(run_start, "expected attribute name after schema URN"),
                }
            }
            if let Some(colon) = names.find(':') {
                return self.fail(&names_start[colon..], "unexpected ':' in attribute path");
            }

            let mut offset = 0;
            for name in names.split('.') {
                let at = &names_start[offset..];
                if name.is_empty() {
                    return self.fail(at, "empty attribute name");
                }
                if !name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_' || c == '$') {
                    return self.fail(at, format!("invalid attribute name '{}'", name));
                }
                elements.push(PathElement::new(name, None));
                offset += name.len() + 1;
            }

            if input.starts_with('[') {
                let filter = self.value_filter(input, depth)?;
                if let Some(last) = elements.pop() {
                    elements.push(PathElement::new(last.attribute(), Some(filter)));
                }
                if input.starts_with('.') {
                    let dot: Result<char, ContextError> = '.'.parse_next(input);
                    if dot.is_ok() {
                        continue;
                    }
                }
            }
            break;
        }

        Ok(Path::from_parts(namespace, elements))
    }

    fn value_filter(&self, input: &mut &'s str, depth: usize) -> Step<Filter> {
        let depth = self.enter(input, depth)?;
        let opened: Result<char, ContextError> = '['.parse_next(input);
        if opened.is_err() {
            return self.fail(input, "expected '['");
        }
        skip_space(input);
        let filter = self.filter(input, depth)?;
        skip_space(input);
        let closed: Result<char, ContextError> = ']'.parse_next(input);
        if closed.is_err() {
            return self.fail(input, "expected ']' to close value filter");
        }
        Ok(filter)
    }
}

/// A path whose last segment carries a value filter, with no comparison
/// following it, is a complex attribute filter.
fn complex(path: &Path) -> Option<Filter> {
    let last = path.elements().last()?;
    let inner = last.filter()?.clone();
    let base = path.prefix(path.len() - 1).child(last.attribute());
    Some(Filter::Complex(base, Box::new(inner)))
}

fn comparison_operator(word: &str) -> Option<(Operator, bool)> {
    if word.eq_ignore_ascii_case("ne") {
        return Some((Operator::Eq, true));
    }
    word.parse::<Operator>().ok().map(|operator| (operator, false))
}

/// Match a case-insensitive keyword that is not the prefix of a longer name.
fn keyword(input: &mut &str, word: &'static str) -> bool {
    let checkpoint = *input;
    let matched: Result<&str, ContextError> = Caseless(word).parse_next(input);
    if matched.is_ok() && !input.starts_with(is_path_char) {
        return true;
    }
    *input = checkpoint;
    false
}

fn skip_space(input: &mut &str) {
    let _: Result<&str, ContextError> = space0.parse_next(input);
}

fn at_boundary(input: &str) -> bool {
    input.is_empty() || input.starts_with(|c: char| c.is_whitespace() || c == ')' || c == ']')
}

fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '$' | '.' | ':')
}

fn is_urn(text: &str) -> bool {
    text.get(..4).is_some_and(|prefix| prefix.eq_ignore_ascii_case("urn:"))
}

fn preview(input: &str) -> String {
    input.chars().take(16).collect()
}
