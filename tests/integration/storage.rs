//! Filtered search over the in-memory store.

use crate::common::builders::UserBuilder;
use crate::common::fixtures::rfc_examples;
use crate::common::{init_logging, parse};
use scim_filter::storage::{InMemoryStorage, StorageKey};
use scim_filter::{Evaluator, EvaluatorConfig, Node, evaluate};

fn populated() -> InMemoryStorage {
    let storage = InMemoryStorage::new();
    let mut users = vec![
        ("2819c223", rfc_examples::user_full()),
        ("26118915", rfc_examples::enterprise_user()),
        ("b0000001", rfc_examples::user_minimal()),
    ];
    users.push((
        "c0000001",
        UserBuilder::new("jsmith")
            .with_title("Manager")
            .with_active(true)
            .with_email("jsmith@example.com", "work")
            .build(),
    ));
    users.push((
        "c0000002",
        UserBuilder::new("adoe")
            .with_name("Ann", "Doe")
            .with_active(false)
            .with_email("ann@home.example", "home")
            .with_attribute("meta", serde_json::json!({"version": 7}))
            .build(),
    ));
    for (id, user) in users {
        storage
            .put(StorageKey::new("acme", "User", id), Node::from(user))
            .unwrap();
    }
    storage
        .put(
            StorageKey::new("acme", "Group", "e9e30dba"),
            Node::from(rfc_examples::group()),
        )
        .unwrap();
    storage
}

const FILTERS: [&str; 14] = [
    r#"userName eq "bjensen@example.com""#,
    r#"userName eq "JSMITH" or userName eq "adoe""#,
    r#"active eq true"#,
    r#"active eq true and title eq "manager""#,
    r#"title pr"#,
    r#"not (title pr)"#,
    r#"emails.type eq "work" and emails.value ew "example.com""#,
    r#"emails[type eq "home"]"#,
    r#"name.familyName eq "Jensen" or name.givenName sw "an""#,
    r#"meta.version eq 7 or meta.version eq 7.0"#,
    r#"meta.lastModified eq "2011-05-13T06:42:34+02:00""#,
    r#"urn:ietf:params:scim:schemas:extension:enterprise:2.0:User:costCenter eq "4130""#,
    r#"nickName eq null"#,
    r#"userName ne "jsmith" and active pr"#,
];

#[test]
fn test_search_matches_full_scan() {
    init_logging();
    let storage = populated();
    let prefix = StorageKey::prefix("acme", "User");
    let everything = storage.list(&prefix, 0, usize::MAX).unwrap();
    assert_eq!(everything.len(), 5);

    for expression in FILTERS {
        let filter = parse(expression);
        let expected: Vec<&StorageKey> = everything
            .iter()
            .filter(|(_, document)| evaluate(&filter, document).unwrap())
            .map(|(key, _)| key)
            .collect();
        let found = storage.search(&prefix, Some(&filter)).unwrap();
        let found: Vec<&StorageKey> = found.iter().map(|(key, _)| key).collect();
        assert_eq!(found, expected, "{}", expression);
    }
}

#[test]
fn test_search_results() {
    let storage = populated();
    let prefix = StorageKey::prefix("acme", "User");
    let ids = |expression: &str| -> Vec<String> {
        storage
            .search(&prefix, Some(&parse(expression)))
            .unwrap()
            .into_iter()
            .map(|(key, _)| key.resource_id().to_string())
            .collect()
    };

    assert_eq!(ids(r#"userName eq "JSMITH" or userName eq "adoe""#), vec!["c0000001", "c0000002"]);
    assert_eq!(ids(r#"meta.version eq 7.0"#), vec!["c0000002"]);
    assert_eq!(
        ids(r#"meta.lastModified eq "2011-05-13T06:42:34+02:00""#),
        vec!["26118915", "2819c223", "b0000001"]
    );
    assert_eq!(
        ids(r#"urn:ietf:params:scim:schemas:extension:enterprise:2.0:User:costCenter eq "4130""#),
        vec!["26118915"]
    );
    assert!(ids(r#"members.display pr"#).is_empty());
}

#[test]
fn test_search_without_filter_lists_collection() {
    let storage = populated();
    let groups = StorageKey::prefix("acme", "Group");
    let all = storage.search(&groups, None).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all, storage.list(&groups, 0, 10).unwrap());

    let found = storage
        .search(&groups, Some(&parse(r#"members[display sw "mandy"]"#)))
        .unwrap();
    assert_eq!(found.len(), 1);
}

#[test]
fn test_search_uses_storage_evaluator() {
    let storage = InMemoryStorage::with_evaluator(Evaluator::with_config(EvaluatorConfig {
        case_exact: true,
    }));
    let key = StorageKey::new("acme", "User", "1");
    storage
        .put(key, UserBuilder::new("BJensen").build_node())
        .unwrap();
    let prefix = StorageKey::prefix("acme", "User");

    let exact = storage
        .search(&prefix, Some(&parse(r#"userName eq "BJensen""#)))
        .unwrap();
    assert_eq!(exact.len(), 1);
    let folded = storage
        .search(&prefix, Some(&parse(r#"userName eq "bjensen""#)))
        .unwrap();
    assert!(folded.is_empty());
}

#[test]
fn test_concurrent_readers_and_writers() {
    let storage = populated();
    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let storage = storage.clone();
            std::thread::spawn(move || {
                let key = StorageKey::new("acme", "User", format!("w{}", worker));
                let user = UserBuilder::new(&format!("worker{}", worker))
                    .with_active(true)
                    .build_node();
                storage.put(key, user).unwrap();
                let prefix = StorageKey::prefix("acme", "User");
                storage
                    .search(&prefix, Some(&parse("active eq true")))
                    .unwrap()
                    .len()
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap() >= 3);
    }
    let prefix = StorageKey::prefix("acme", "User");
    assert_eq!(storage.count(&prefix).unwrap(), 9);
}
