//! Translating filters into native queries.

use crate::common::fixtures::rfc_examples;
use crate::common::{init_logging, parse};
use scim_filter::{Filter, FilterError, Node, Operator, Translator, evaluate};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A backend speaking SQL-ish conditions for the given operators.
fn sql(operators: &[Operator], and: bool, or: bool) -> Translator<String> {
    let mut builder = Translator::builder().with_leaves(operators.iter().copied(), |filter, not| {
        let path = filter.path()?.to_string();
        let condition = match filter.value() {
            Some(value) => format!("{} {} {}", path, filter.operator()?, value),
            None => format!("{} IS NOT NULL", path),
        };
        Some(if not { format!("NOT {}", condition) } else { condition })
    });
    if and {
        builder = builder
            .with_and(|lhs: &String, rhs: &String| Some(format!("({} AND {})", lhs, rhs)));
    }
    if or {
        builder = builder
            .with_or(|lhs: &String, rhs: &String| Some(format!("({} OR {})", lhs, rhs)));
    }
    builder.build()
}

/// A backend whose native queries are filter expressions again.
fn echo(operators: &[Operator]) -> Translator<String> {
    Translator::builder()
        .with_leaves(operators.iter().copied(), |filter, not| {
            Some(if not {
                format!("not ({})", filter)
            } else {
                filter.to_string()
            })
        })
        .with_and(|lhs: &String, rhs: &String| Some(format!("({}) and ({})", lhs, rhs)))
        .with_or(|lhs: &String, rhs: &String| Some(format!("({}) or ({})", lhs, rhs)))
        .build()
}

fn translate(translator: &Translator<String>, expression: &str) -> Vec<String> {
    translator.translate(Some(&parse(expression))).unwrap()
}

#[test]
fn test_no_capabilities_fetch_everything() {
    init_logging();
    let translator: Translator<String> = Translator::new();
    assert!(translator.translate(None).unwrap().is_empty());
    assert!(translate(&translator, r#"userName eq "bjensen""#).is_empty());
    assert!(translate(&translator, r#"title pr and not (userType eq "Intern")"#).is_empty());
}

#[test]
fn test_full_capabilities_yield_one_query() {
    let translator = sql(&Operator::ALL, true, true);
    assert_eq!(
        translate(&translator, r#"title pr and (userType eq "Employee" or userType eq "Intern")"#),
        vec![r#"(title IS NOT NULL AND (userType eq "Employee" OR userType eq "Intern"))"#]
    );
    assert_eq!(
        translate(&translator, r#"not (title pr or userName sw "J")"#),
        vec![r#"(NOT title IS NOT NULL AND NOT userName sw "J")"#]
    );
}

#[test]
fn test_disjunctions_split_without_or() {
    let translator = sql(&[Operator::Eq], true, false);
    assert_eq!(
        translate(&translator, r#"userType eq "Employee" or userType eq "Intern""#),
        vec![r#"userType eq "Employee""#, r#"userType eq "Intern""#]
    );
    assert_eq!(
        translate(&translator, "(a eq 1 or b eq 2) and c eq 3"),
        vec!["(a eq 1 AND c eq 3)", "(b eq 2 AND c eq 3)"]
    );
}

#[test]
fn test_unsupported_predicates_widen() {
    let translator = sql(&[Operator::Eq, Operator::Pr], true, true);
    // one side of the conjunction is enough to narrow
    assert_eq!(
        translate(&translator, r#"userName eq "bjensen" and name.familyName co "ens""#),
        vec![r#"userName eq "bjensen""#]
    );
    // an unrestricted disjunct widens the whole disjunction
    assert!(translate(&translator, r#"title pr or nickName sw "B""#).is_empty());
    // complex attribute filters are never native
    assert!(translate(&translator, r#"emails[type eq "work"]"#).is_empty());
}

#[test]
fn test_duplicates_are_removed() {
    let by_path: Translator<String> = Translator::builder()
        .with_leaf(Operator::Eq, |filter, _| Some(filter.path()?.to_string()))
        .build();
    assert_eq!(
        translate(&by_path, r#"title eq "a" or title eq "b" or userName eq "c""#),
        vec!["title", "userName"]
    );
}

#[test]
fn test_simplify_is_idempotent_on_rfc_filters() {
    let translators = [
        sql(&Operator::ALL, true, true),
        sql(&[Operator::Eq], true, false),
        sql(&[Operator::Eq, Operator::Co, Operator::Pr], false, true),
        sql(&[Operator::Sw], false, false),
    ];
    let filters = [
        r#"title pr and userType eq "Employee""#,
        r#"userType eq "Employee" and (emails co "example.com" or emails.value co "example.org")"#,
        r#"userType ne "Employee" and not (emails co "example.com" or emails.value co "example.org")"#,
        r#"(a eq 1 or b co "x") and (c pr or d eq 4)"#,
        r#"userName sw "J" or emails[type eq "work"]"#,
    ];
    for translator in &translators {
        for expression in filters {
            let once = translator.simplify(&parse(expression)).unwrap();
            if let Some(once) = once {
                let twice = translator.simplify(&once).unwrap();
                assert_eq!(twice.as_ref(), Some(&once), "{:?} on {}", translator, expression);
            }
        }
    }
}

/// Documents match a filter exactly when they match one of its native
/// queries, or the translation asked for everything.
#[test]
fn test_queries_agree_with_evaluation() {
    let documents: Vec<Node> = [
        rfc_examples::user_minimal(),
        rfc_examples::user_full(),
        rfc_examples::enterprise_user(),
        rfc_examples::group(),
    ]
    .into_iter()
    .map(Node::from)
    .collect();
    let filters = [
        r#"userName sw "bjensen" and (title pr or nickName eq "Babs")"#,
        r#"not (userType eq "Employee" or displayName co "Tour")"#,
        r#"displayName pr and (userName pr or members.display sw "Mandy")"#,
        r#"meta.lastModified ge "2011-01-01T00:00:00Z" and not (meta.resourceType eq "Group")"#,
        r#"emails[type eq "work"] or title co "guide""#,
    ];

    let full = echo(&Operator::ALL);
    let partial = echo(&[Operator::Eq, Operator::Pr]);
    for expression in filters {
        let filter = parse(expression);
        for document in &documents {
            let expected = evaluate(&filter, document).unwrap();
            for translator in [&full, &partial] {
                let queries = translator.translate(Some(&filter)).unwrap();
                let any = queries
                    .iter()
                    .any(|query| evaluate(&parse(query), document).unwrap());
                if expected {
                    assert!(queries.is_empty() || any, "{} lost by {:?}", expression, queries);
                }
            }

            let queries = full.translate(Some(&filter)).unwrap();
            if !expression.contains('[') {
                assert_eq!(queries.len(), 1);
                assert_eq!(evaluate(&parse(&queries[0]), document).unwrap(), expected);
            }
        }
    }
}

#[test]
fn test_inconsistent_handlers_are_reported() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let flaky: Translator<String> = Translator::builder()
        .with_leaf(Operator::Eq, move |filter, _| {
            (counter.fetch_add(1, Ordering::SeqCst) < 2).then(|| filter.to_string())
        })
        .with_or(|lhs: &String, rhs: &String| Some(format!("{} | {}", lhs, rhs)))
        .build();

    let filter: Filter = parse("a eq 1 or b eq 2");
    let err = flaky.translate(Some(&filter)).unwrap_err();
    assert!(matches!(err, FilterError::InconsistentTranslator { .. }));
    assert!(!err.is_client_error());
    assert_eq!(err.status(), 500);
    assert!(calls.load(Ordering::SeqCst) >= 3);
}
