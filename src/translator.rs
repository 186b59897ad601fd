//! Translation of filters into native backend queries.
//!
//! A [`Translator`] turns a [`Filter`] into a list of native expressions of
//! some type `T` (SQL fragments, LDAP filters, index lookups). Backends
//! describe what they can express by registering handlers: an optional
//! conjunction combiner, an optional disjunction combiner, and one handler per
//! leaf operator. A handler returning `None` means "not expressible here".
//!
//! Whatever cannot be expressed is widened: the translation then selects a
//! superset of the matching resources and the caller re-filters in memory
//! with the [`Evaluator`](crate::Evaluator). The returned list reads as:
//!
//! * empty: fetch everything,
//! * one expression: run it,
//! * several expressions: run each and union the results by resource id.
//!
//! ```rust
//! use scim_filter::filter::{Filter, Operator};
//! use scim_filter::translator::Translator;
//!
//! let translator = Translator::<String>::builder()
//!     .with_and(|l, r| Some(format!("({l} AND {r})")))
//!     .with_leaf(Operator::Eq, |filter, not| {
//!         let path = filter.path()?;
//!         let value = filter.value()?;
//!         Some(format!("{path} {} {value}", if not { "<>" } else { "=" }))
//!     })
//!     .build();
//!
//! let filter = Filter::parse(r#"userName eq "bjensen" and title pr"#).unwrap();
//! assert_eq!(translator.translate(Some(&filter)).unwrap(), vec![r#"userName = "bjensen""#]);
//!
//! let filter = Filter::parse(r#"userName eq "a" or userName ne "b""#).unwrap();
//! assert_eq!(
//!     translator.translate(Some(&filter)).unwrap(),
//!     vec![r#"userName = "a""#, r#"userName <> "b""#]
//! );
//! ```

use crate::error::{FilterError, FilterResult};
use crate::filter::{Filter, FilterFactory, Operator};
use log::{debug, trace, warn};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

/// Combines two native expressions, or returns `None` when the backend
/// cannot.
pub type CombineFn<T> = Box<dyn Fn(&T, &T) -> Option<T> + Send + Sync>;

/// Builds the native expression of a leaf. The flag is set when the leaf is
/// negated.
pub type LeafFn<T> = Box<dyn Fn(&Filter, bool) -> Option<T> + Send + Sync>;

/// Filter translator configured by its native capabilities.
pub struct Translator<T> {
    and: Option<CombineFn<T>>,
    or: Option<CombineFn<T>>,
    leaves: HashMap<Operator, LeafFn<T>>,
}

impl<T> Default for Translator<T> {
    fn default() -> Self {
        Self {
            and: None,
            or: None,
            leaves: HashMap::new(),
        }
    }
}

impl<T> fmt::Debug for Translator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut leaves: Vec<_> = self.leaves.keys().copied().collect();
        leaves.sort();
        f.debug_struct("Translator")
            .field("and", &self.and.is_some())
            .field("or", &self.or.is_some())
            .field("leaves", &leaves)
            .finish()
    }
}

impl<T> Translator<T> {
    /// A translator with no native capabilities; every filter translates to
    /// "fetch everything".
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> TranslatorBuilder<T> {
        TranslatorBuilder::new()
    }

    /// Whether a leaf handler is registered for `operator`.
    pub fn supports(&self, operator: Operator) -> bool {
        self.leaves.contains_key(&operator)
    }

    pub fn supports_and(&self) -> bool {
        self.and.is_some()
    }

    pub fn supports_or(&self) -> bool {
        self.or.is_some()
    }
}

impl<T: Clone + Eq + Hash> Translator<T> {
    /// Translate an optional filter; no filter means "fetch everything".
    pub fn translate(&self, filter: Option<&Filter>) -> FilterResult<Vec<T>> {
        match filter {
            Some(filter) => self.translate_filter(filter),
            None => Ok(Vec::new()),
        }
    }

    /// Translate a filter into native expressions, without duplicates.
    ///
    /// # Errors
    ///
    /// [`FilterError::InconsistentTranslator`] when a handler answers
    /// differently for the same input during one translation.
    pub fn translate_filter(&self, filter: &Filter) -> FilterResult<Vec<T>> {
        let Some(simplified) = self.simplify_normalized(&filter.normalize())? else {
            debug!("filter '{}' cannot be narrowed natively", filter);
            return Ok(Vec::new());
        };

        let expressions = self.translate_internal(&simplified)?;
        let mut seen = HashSet::with_capacity(expressions.len());
        let mut unique = Vec::with_capacity(expressions.len());
        for expression in expressions {
            if seen.insert(expression.clone()) {
                unique.push(expression);
            }
        }
        debug!(
            "translated '{}' as '{}' into {} native expression(s)",
            filter,
            simplified,
            unique.len()
        );
        Ok(unique)
    }

    /// Prune what cannot be expressed natively and distribute conjunctions
    /// over disjunctions the backend cannot combine.
    ///
    /// Returns `None` for the unrestricted "everything" filter. The input is
    /// normalized first; the result is a fixed point (simplifying it again
    /// yields the same tree).
    pub fn simplify(&self, filter: &Filter) -> FilterResult<Option<Filter>> {
        self.simplify_normalized(&filter.normalize())
    }

    fn simplify_normalized(&self, filter: &Filter) -> FilterResult<Option<Filter>> {
        match filter {
            Filter::And(lhs, rhs) => self.simplify_and(lhs, rhs),
            Filter::Or(lhs, rhs) => {
                let lhs = self.simplify_normalized(lhs)?;
                let rhs = self.simplify_normalized(rhs)?;
                match (lhs, rhs) {
                    (Some(lhs), Some(rhs)) => Ok(Some(FilterFactory::or(lhs, rhs))),
                    _ => {
                        trace!("'{}' has an unrestricted branch", filter);
                        Ok(None)
                    }
                }
            }
            leaf => match self.leaf_expression(leaf) {
                Some(_) => Ok(Some(leaf.clone())),
                None => {
                    trace!("no native expression for '{}'", leaf);
                    Ok(None)
                }
            },
        }
    }

    fn simplify_and(&self, lhs: &Filter, rhs: &Filter) -> FilterResult<Option<Filter>> {
        let (lhs, rhs) = match (self.simplify_normalized(lhs)?, self.simplify_normalized(rhs)?) {
            (None, rhs) => return Ok(rhs),
            (lhs, None) => return Ok(lhs),
            (Some(lhs), Some(rhs)) => (lhs, rhs),
        };

        let lex = self.translate_internal(&lhs)?;
        let rex = self.translate_internal(&rhs)?;
        for (side, expressions) in [(&lhs, &lex), (&rhs, &rex)] {
            if expressions.is_empty() {
                return Err(inconsistent(
                    method_name(side),
                    format!("'{}' produced no expression after being kept", side),
                ));
            }
        }

        let combinable = lex
            .iter()
            .any(|l| rex.iter().any(|r| self.combine_and(l, r).is_some()));
        if !combinable {
            // Narrow by whichever side needs fewer queries.
            let narrower = if lex.len() <= rex.len() { lhs } else { rhs };
            debug!("conjunction not expressible, narrowing by '{}' alone", narrower);
            return Ok(Some(narrower));
        }

        // A side with several expressions is a disjunction the backend could
        // not combine: distribute the conjunction over it.
        if lex.len() > 1 {
            let Filter::Or(first, second) = &lhs else {
                return Err(inconsistent(
                    "or",
                    format!(
                        "'{}' produced {} expressions but is not a disjunction",
                        lhs,
                        lex.len()
                    ),
                ));
            };
            trace!("distributing '{}' over '{}'", rhs, lhs);
            let distributed = FilterFactory::or(
                FilterFactory::and(first.as_ref().clone(), rhs.clone()),
                FilterFactory::and(second.as_ref().clone(), rhs),
            );
            return self.simplify_normalized(&distributed);
        }
        if rex.len() > 1 {
            let Filter::Or(first, second) = &rhs else {
                return Err(inconsistent(
                    "or",
                    format!(
                        "'{}' produced {} expressions but is not a disjunction",
                        rhs,
                        rex.len()
                    ),
                ));
            };
            trace!("distributing '{}' over '{}'", lhs, rhs);
            let distributed = FilterFactory::or(
                FilterFactory::and(lhs.clone(), first.as_ref().clone()),
                FilterFactory::and(lhs, second.as_ref().clone()),
            );
            return self.simplify_normalized(&distributed);
        }

        Ok(Some(FilterFactory::and(lhs, rhs)))
    }

    /// Structural translation of a simplified filter.
    fn translate_internal(&self, filter: &Filter) -> FilterResult<Vec<T>> {
        match filter {
            Filter::And(lhs, rhs) => Ok(vec![self.translate_and(lhs, rhs)?]),
            Filter::Or(lhs, rhs) => self.translate_or(lhs, rhs),
            leaf => Ok(self.leaf_expression(leaf).into_iter().collect()),
        }
    }

    fn translate_and(&self, lhs: &Filter, rhs: &Filter) -> FilterResult<T> {
        let lex = self.translate_internal(lhs)?;
        let rex = self.translate_internal(rhs)?;
        let [l] = lex.as_slice() else {
            return Err(inconsistent(
                method_name(lhs),
                format!("expected one expression for '{}', found {}", lhs, lex.len()),
            ));
        };
        let [r] = rex.as_slice() else {
            return Err(inconsistent(
                method_name(rhs),
                format!("expected one expression for '{}', found {}", rhs, rex.len()),
            ));
        };
        self.combine_and(l, r).ok_or_else(|| {
            inconsistent(
                "and",
                format!("no conjunction of '{}' and '{}' after probing succeeded", lhs, rhs),
            )
        })
    }

    fn translate_or(&self, lhs: &Filter, rhs: &Filter) -> FilterResult<Vec<T>> {
        let mut lex = self.translate_internal(lhs)?;
        let rex = self.translate_internal(rhs)?;
        for (side, expressions) in [(lhs, &lex), (rhs, &rex)] {
            if expressions.is_empty() {
                return Err(inconsistent(
                    method_name(side),
                    format!("'{}' produced no expression after being kept", side),
                ));
            }
        }

        if let ([l], [r]) = (lex.as_slice(), rex.as_slice()) {
            if let Some(combined) = self.combine_or(l, r) {
                return Ok(vec![combined]);
            }
        }
        lex.extend(rex);
        Ok(lex)
    }

    fn leaf_expression(&self, filter: &Filter) -> Option<T> {
        let (leaf, negated) = match filter {
            Filter::Not(inner) => (inner.as_ref(), true),
            other => (other, false),
        };
        let handler = self.leaves.get(&leaf.operator()?)?;
        handler(leaf, negated)
    }

    fn combine_and(&self, lhs: &T, rhs: &T) -> Option<T> {
        self.and.as_ref().and_then(|and| and(lhs, rhs))
    }

    fn combine_or(&self, lhs: &T, rhs: &T) -> Option<T> {
        self.or.as_ref().and_then(|or| or(lhs, rhs))
    }
}

fn method_name(filter: &Filter) -> &'static str {
    match filter {
        Filter::And(..) => "and",
        Filter::Or(..) => "or",
        Filter::Not(inner) => method_name(inner),
        Filter::Complex(..) => "complex",
        leaf => leaf.operator().map_or("leaf", |operator| operator.as_str()),
    }
}

fn inconsistent(method: &str, detail: String) -> FilterError {
    warn!("inconsistent translator method '{}': {}", method, detail);
    FilterError::inconsistent(method, detail)
}

/// Builder for [`Translator`].
pub struct TranslatorBuilder<T> {
    translator: Translator<T>,
}

impl<T> TranslatorBuilder<T> {
    pub fn new() -> Self {
        Self {
            translator: Translator::default(),
        }
    }

    /// Set the native conjunction.
    pub fn with_and<F>(mut self, combine: F) -> Self
    where
        F: Fn(&T, &T) -> Option<T> + Send + Sync + 'static,
    {
        self.translator.and = Some(Box::new(combine));
        self
    }

    /// Set the native disjunction.
    pub fn with_or<F>(mut self, combine: F) -> Self
    where
        F: Fn(&T, &T) -> Option<T> + Send + Sync + 'static,
    {
        self.translator.or = Some(Box::new(combine));
        self
    }

    /// Register the handler for one leaf operator.
    pub fn with_leaf<F>(mut self, operator: Operator, handler: F) -> Self
    where
        F: Fn(&Filter, bool) -> Option<T> + Send + Sync + 'static,
    {
        self.translator.leaves.insert(operator, Box::new(handler));
        self
    }

    /// Register the same handler for several leaf operators.
    pub fn with_leaves<I, F>(mut self, operators: I, handler: F) -> Self
    where
        I: IntoIterator<Item = Operator>,
        F: Fn(&Filter, bool) -> Option<T> + Clone + Send + Sync + 'static,
    {
        for operator in operators {
            self = self.with_leaf(operator, handler.clone());
        }
        self
    }

    pub fn build(self) -> Translator<T> {
        self.translator
    }
}

impl<T> Default for TranslatorBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}
