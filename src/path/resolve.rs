//! Resolving paths against document trees.

use super::{Path, PathElement};
use crate::document::Node;
use crate::error::FilterResult;
use crate::evaluator::Evaluator;
use crate::filter::Filter;

impl Node {
    /// Select the nodes addressed by `path`.
    ///
    /// Arrays met on the way are descended element by element. A value filter
    /// on a multi-valued attribute keeps only the matching elements; on the
    /// last segment those elements are returned individually. An unfiltered
    /// multi-valued attribute on the last segment is returned as a single
    /// array node. Missing attributes contribute nothing; explicit nulls do.
    pub fn select(&self, path: &Path) -> FilterResult<Vec<&Node>> {
        select(&Evaluator::new(), path, self)
    }

    /// Remove the nodes addressed by `path` and return them.
    ///
    /// With a value filter on the last segment only the matching elements are
    /// removed, and the attribute itself is dropped once it has no elements
    /// left. Nothing is modified when a value filter fails to evaluate.
    pub fn remove(&mut self, path: &Path) -> FilterResult<Vec<Node>> {
        remove(&Evaluator::new(), path, self)
    }
}

/// Start of resolution: a member named after the namespace when the document
/// has one (schema extensions), otherwise the document itself (core schema
/// attributes live at the top level).
fn base<'a>(path: &Path, node: &'a Node) -> &'a Node {
    path.namespace()
        .and_then(|namespace| node.get(namespace))
        .filter(|scoped| scoped.is_object())
        .unwrap_or(node)
}

pub(crate) fn select<'a>(
    evaluator: &Evaluator,
    path: &Path,
    node: &'a Node,
) -> FilterResult<Vec<&'a Node>> {
    let mut matches = Vec::new();
    traverse(evaluator, base(path, node), path.elements(), &mut matches)?;
    Ok(matches)
}

fn accepts(evaluator: &Evaluator, filter: Option<&Filter>, node: &Node) -> FilterResult<bool> {
    match filter {
        Some(filter) => evaluator.matches(filter, node),
        None => Ok(true),
    }
}

fn traverse<'a>(
    evaluator: &Evaluator,
    node: &'a Node,
    elements: &[PathElement],
    matches: &mut Vec<&'a Node>,
) -> FilterResult<()> {
    let Some((element, rest)) = elements.split_first() else {
        matches.push(node);
        return Ok(());
    };
    let Some(child) = node.get(element.attribute()) else {
        return Ok(());
    };

    match (child, element.filter()) {
        (Node::Array(items), Some(filter)) => {
            for item in items {
                if evaluator.matches(filter, item)? {
                    descend(evaluator, item, rest, matches)?;
                }
            }
            Ok(())
        }
        (child, filter) => {
            if accepts(evaluator, filter, child)? {
                descend(evaluator, child, rest, matches)?;
            }
            Ok(())
        }
    }
}

fn descend<'a>(
    evaluator: &Evaluator,
    node: &'a Node,
    rest: &[PathElement],
    matches: &mut Vec<&'a Node>,
) -> FilterResult<()> {
    if rest.is_empty() {
        matches.push(node);
        return Ok(());
    }
    match node {
        Node::Array(items) => {
            for item in items.iter().filter(|item| item.is_object()) {
                traverse(evaluator, item, rest, matches)?;
            }
            Ok(())
        }
        Node::Object(_) => traverse(evaluator, node, rest, matches),
        _ => Ok(()),
    }
}

pub(crate) fn remove(
    evaluator: &Evaluator,
    path: &Path,
    node: &mut Node,
) -> FilterResult<Vec<Node>> {
    // Evaluate every value filter once up front so a failing filter leaves
    // the document untouched.
    select(evaluator, path, node)?;

    let scoped = path
        .namespace()
        .is_some_and(|namespace| node.get(namespace).is_some_and(Node::is_object));
    let target = match (scoped, path.namespace()) {
        (true, Some(namespace)) => match node.as_object_mut().and_then(|o| o.get_mut(namespace)) {
            Some(target) => target,
            None => return Ok(Vec::new()),
        },
        _ => node,
    };

    let mut removed = Vec::new();
    remove_in(evaluator, target, path.elements(), &mut removed)?;
    Ok(removed)
}

fn remove_in(
    evaluator: &Evaluator,
    node: &mut Node,
    elements: &[PathElement],
    removed: &mut Vec<Node>,
) -> FilterResult<()> {
    let Some((element, rest)) = elements.split_first() else {
        return Ok(());
    };
    let Some(object) = node.as_object_mut() else {
        return Ok(());
    };
    let name = element.attribute();
    let filter = element.filter();

    if !rest.is_empty() {
        let Some(child) = object.get_mut(name) else {
            return Ok(());
        };
        match child {
            Node::Array(items) => {
                for item in items.iter_mut() {
                    if accepts(evaluator, filter, item)? {
                        remove_in(evaluator, item, rest, removed)?;
                    }
                }
            }
            other => {
                if accepts(evaluator, filter, other)? {
                    remove_in(evaluator, other, rest, removed)?;
                }
            }
        }
        return Ok(());
    }

    let Some(filter) = filter else {
        removed.extend(object.remove(name));
        return Ok(());
    };

    let drop_member = match object.get_mut(name) {
        None => false,
        Some(Node::Array(items)) => {
            let mut verdicts = Vec::with_capacity(items.len());
            for item in items.iter() {
                verdicts.push(evaluator.matches(filter, item)?);
            }
            let mut kept = Vec::with_capacity(items.len());
            for (item, matched) in std::mem::take(items).into_iter().zip(verdicts) {
                if matched {
                    removed.push(item);
                } else {
                    kept.push(item);
                }
            }
            *items = kept;
            items.is_empty()
        }
        Some(other) => {
            if evaluator.matches(filter, other)? {
                removed.push(other.clone());
                true
            } else {
                false
            }
        }
    };
    if drop_member {
        object.remove(name);
    }
    Ok(())
}
