//! Filter syntax: RFC 7644 examples, rendering and error reporting.

use crate::common::parse;
use scim_filter::{Filter, FilterError, FilterFactory, FilterKind, Operator, ParserConfig, Path};

/// Filter examples from RFC 7644 Section 3.4.2.2
const RFC_FILTERS: [&str; 14] = [
    r#"userName Eq "john""#,
    r#"title pr"#,
    r#"name.familyName co "O'Malley""#,
    r#"userName sw "J""#,
    r#"urn:ietf:params:scim:schemas:core:2.0:User:userName sw "J""#,
    r#"meta.lastModified gt "2011-05-13T04:42:34Z""#,
    r#"title pr and userType eq "Employee""#,
    r#"title pr or userType eq "Intern""#,
    r#"schemas eq "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User""#,
    r#"userType eq "Employee" and (emails co "example.com" or emails.value co "example.org")"#,
    r#"userType ne "Employee" and not (emails co "example.com" or emails.value co "example.org")"#,
    r#"userType eq "Employee" and (emails.type eq "work")"#,
    r#"userType eq "Employee" and emails[type eq "work" and value co "@example.com"]"#,
    r#"emails[type eq "work" and value co "@example.com"] or ims[type eq "xmpp" and value co "@foo.com"]"#,
];

#[test]
fn test_rfc_examples_parse_and_render() {
    for expression in RFC_FILTERS {
        let filter = parse(expression);
        let rendered = filter.to_string();
        assert_eq!(parse(&rendered), filter, "{} rendered as {}", expression, rendered);
    }
}

#[test]
fn test_rendering_is_canonical() {
    assert_eq!(parse(r#"userName Eq "john""#).to_string(), r#"userName eq "john""#);
    assert_eq!(
        parse(r#"userType ne "Employee""#).to_string(),
        r#"not (userType eq "Employee")"#
    );
    assert_eq!(
        parse(r#"userType eq "Employee" and (emails.type eq "work")"#).to_string(),
        r#"userType eq "Employee" and emails.type eq "work""#
    );
    assert_eq!(
        parse("(a pr or b pr) and (c pr or d pr)").to_string(),
        "(a pr or b pr) and (c pr or d pr)"
    );
    assert_eq!(parse("a pr or (b pr or c pr)").to_string(), "a pr or (b pr or c pr)");
}

#[test]
fn test_parsed_and_built_filters_agree() {
    let parsed = parse(
        r#"userType eq "Employee" and emails[type eq "work" and value co "@example.com"]"#,
    );
    let built = FilterFactory::and(
        FilterFactory::eq("userType", "Employee").unwrap(),
        FilterFactory::complex_expr("emails", r#"type eq "work" and value co "@example.com""#)
            .unwrap(),
    );
    assert_eq!(parsed, built);
    assert_eq!(FilterFactory::from(&built.to_string()).unwrap(), built);
}

#[test]
fn test_structure_accessors() {
    let filter = parse(r#"title pr and not (userType eq "Intern")"#);
    assert_eq!(filter.kind(), FilterKind::And);
    assert_eq!(filter.lhs().unwrap().kind(), FilterKind::Leaf(Operator::Pr));

    let negated = filter.rhs().unwrap();
    assert_eq!(negated.kind(), FilterKind::Not);
    let inner = negated.inner().unwrap();
    assert_eq!(inner.path(), Some(&Path::attribute("userType")));
    assert_eq!(inner.value().and_then(|value| value.as_str()), Some("Intern"));
    assert_eq!(filter.depth(), 3);
}

#[test]
fn test_enterprise_extension_path() {
    let filter = parse(
        r#"urn:ietf:params:scim:schemas:extension:enterprise:2.0:User:employeeNumber eq "701984""#,
    );
    let path = filter.path().unwrap();
    assert_eq!(
        path.namespace(),
        Some("urn:ietf:params:scim:schemas:extension:enterprise:2.0:User")
    );
    assert_eq!(path.len(), 1);
    assert_eq!(path.element(0).unwrap().attribute(), "employeeNumber");
}

#[test]
fn test_parse_errors_map_to_scim_responses() {
    let err = Filter::parse(r#"userName eq "bjensen" and"#).unwrap_err();
    assert!(matches!(err, FilterError::InvalidFilter { .. }));
    assert!(err.is_client_error());
    let body = err.to_scim_response();
    assert_eq!(body["status"], "400");
    assert_eq!(body["scimType"], "invalidFilter");
    assert_eq!(body["schemas"][0], "urn:ietf:params:scim:api:messages:2.0:Error");

    let err = FilterFactory::eq("name..familyName", "Jensen").unwrap_err();
    assert_eq!(err.scim_type(), Some("invalidPath"));
    assert_eq!(err.status(), 400);
}

#[test]
fn test_parser_limits() {
    let config = ParserConfig {
        max_depth: 3,
        ..ParserConfig::default()
    };
    assert!(Filter::parse_with("not ((a pr or b pr))", &config).is_ok());
    assert!(Filter::parse_with("not ((((a pr))))", &config).is_err());

    let long = format!(r#"userName eq "{}""#, "x".repeat(5000));
    assert!(Filter::parse(&long).is_err());
    let relaxed = ParserConfig {
        max_length: 8192,
        ..ParserConfig::default()
    };
    assert!(Filter::parse_with(&long, &relaxed).is_ok());
}

#[test]
fn test_rejected_expressions() {
    for expression in [
        "",
        "userName",
        r#"userName eq"#,
        r#"userName xx "a""#,
        r#"(userName pr"#,
        r#"userName pr )"#,
        r#"userName eq bjensen"#,
        r#"emails[type eq "work""#,
        r#"not userName pr"#,
    ] {
        assert!(Filter::parse(expression).is_err(), "accepted '{}'", expression);
    }
}
