//! Matching RFC 7643 example resources.

use crate::assert_filters;
use crate::common::builders::UserBuilder;
use crate::common::fixtures::rfc_examples;
use crate::common::{init_logging, parse};
use scim_filter::{Evaluator, EvaluatorConfig, FilterError, FilterFactory, Node, Operator, Path};

#[test]
fn test_full_user() {
    init_logging();
    let user = rfc_examples::user_full();
    assert_filters!(user, [
        (r#"userName eq "BJENSEN@EXAMPLE.COM""#, true),
        (r#"userName Eq "john""#, false),
        (r#"name.familyName co "ense""#, true),
        (r#"urn:ietf:params:scim:schemas:core:2.0:User:userName sw "bjen""#, true),
        (r#"meta.lastModified gt "2011-05-13T04:42:34Z""#, false),
        (r#"meta.lastModified ge "2011-05-13T04:42:34Z""#, true),
        (r#"meta.lastModified lt "2011-05-14T00:00:00Z""#, true),
        (r#"title pr and userType eq "Employee""#, true),
        (r#"title pr or userType eq "Intern""#, true),
        (r#"userType ne "Employee" and not (emails.value co "example.com")"#, false),
        (
            r#"userType eq "Employee" and (emails.value co "example.com" or emails.value co "example.org")"#,
            true,
        ),
        (r#"emails[type eq "work" and value co "@example.com"]"#, true),
        (r#"emails[type eq "home" and value co "@example.com"]"#, false),
        (r#"emails[type eq "work"].value ew "example.com""#, true),
        (r#"emails[type eq "home"].value ew "example.com""#, false),
        (r#"addresses[type eq "work"].postalCode eq "91608""#, true),
        (r#"phoneNumbers.type eq "fax""#, false),
        (r#"groups.display eq "tour guides""#, true),
        (r#"active eq true and active ne false"#, true),
        (r#"nickName pr and not (externalId eq "701985")"#, true),
        (r#"x509Certificates pr"#, false),
        (r#"x509Certificates eq null"#, true),
    ]);
}

#[test]
fn test_enterprise_extension() {
    let user = rfc_examples::enterprise_user();
    assert_filters!(user, [
        (
            r#"urn:ietf:params:scim:schemas:extension:enterprise:2.0:User:manager.value eq "26118915-6090-4610-87e4-49d8ca9f808d""#,
            true,
        ),
        (
            r#"urn:ietf:params:scim:schemas:extension:enterprise:2.0:User:department sw "tour""#,
            true,
        ),
        (r#"urn:ietf:params:scim:schemas:extension:enterprise:2.0:User:userName pr"#, false),
        (r#"manager.value pr"#, false),
        (r#"schemas eq "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User""#, true),
    ]);
}

#[test]
fn test_group_members() {
    let group = rfc_examples::group();
    assert_filters!(group, [
        (r#"members[value eq "902c246b-6245-4190-8e05-00816be7344a"]"#, true),
        (r#"members.display co "pepper""#, true),
        (r#"members[display sw "babs" and value sw "902c"]"#, false),
        (r#"displayName eq "Tour Guides" and meta.resourceType eq "Group""#, true),
    ]);
}

#[test]
fn test_case_exact_configuration() {
    let user = Node::from(rfc_examples::user_full());
    let filter = parse(r#"userName eq "BJENSEN@EXAMPLE.COM""#);

    let exact = Evaluator::with_config(EvaluatorConfig { case_exact: true });
    assert!(!exact.evaluate(&filter, &user).unwrap());
    assert!(exact.evaluate(&parse(r#"userName eq "bjensen@example.com""#), &user).unwrap());
    // attribute names stay case-insensitive
    assert!(exact.evaluate(&parse(r#"USERNAME sw "bjensen""#), &user).unwrap());
}

#[test]
fn test_ordering_type_guard() {
    let user = Node::from(rfc_examples::user_full());
    let err = Evaluator::new()
        .evaluate(&FilterFactory::gt("active", true).unwrap(), &user)
        .unwrap_err();
    assert!(matches!(
        err,
        FilterError::InvalidValueType {
            operator: Operator::Gt,
            ..
        }
    ));
    assert_eq!(err.to_scim_response()["scimType"], "invalidFilter");

    // a short-circuited branch is never evaluated
    let guarded = parse(r#"userName eq "nobody" and active lt false"#);
    assert!(!Evaluator::new().evaluate(&guarded, &user).unwrap());
}

#[test]
fn test_filter_array() {
    let user = rfc_examples::user_full();
    let emails = Node::from(user["emails"].clone());
    let evaluator = Evaluator::new();

    let work = evaluator.filter_array(&emails, &parse(r#"type eq "work""#)).unwrap();
    assert_eq!(work.len(), 1);
    assert_eq!(work[0].get("value").and_then(Node::as_str), Some("bjensen@example.com"));

    let tags = Node::from(serde_json::json!(["admin", "ops", "audit"]));
    let matched = evaluator.filter_array(&tags, &parse(r#"value sw "a""#)).unwrap();
    assert_eq!(matched.len(), 2);
}

#[test]
fn test_select_and_remove() {
    let mut user = Node::from(rfc_examples::user_full());

    let path = Path::parse(r#"emails[type eq "work"].value"#).unwrap();
    let selected = user.select(&path).unwrap();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].as_str(), Some("bjensen@example.com"));

    let removed = user.remove(&Path::parse(r#"emails[type eq "home"]"#).unwrap()).unwrap();
    assert_eq!(removed.len(), 1);
    let remaining = user.get("emails").and_then(Node::as_array).map(<[Node]>::len);
    assert_eq!(remaining, Some(1));
    assert!(!crate::common::matches(
        r#"emails[type eq "home"]"#,
        &serde_json::Value::from(user)
    ));
}

#[test]
fn test_built_documents() {
    let user = UserBuilder::new("jsmith")
        .with_name("John", "Smith")
        .with_email("john@work.example", "work")
        .with_email("john@home.example", "home")
        .with_active(false)
        .build();
    assert_filters!(user, [
        (r#"name.givenName eq "john" and active eq false"#, true),
        (r#"emails[type eq "home" and value ew ".example"]"#, true),
        (r#"emails.value co "@work""#, true),
        (r#"title pr"#, false),
    ]);
}
