//! Fluent builders for test documents.

use scim_filter::Node;
use serde_json::{Value, json};

/// Builder for User documents
#[derive(Debug, Clone)]
pub struct UserBuilder {
    data: Value,
}

impl UserBuilder {
    /// A user with only a userName
    pub fn new(user_name: &str) -> Self {
        Self {
            data: json!({
                "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
                "userName": user_name
            }),
        }
    }

    pub fn with_id(self, id: &str) -> Self {
        self.with_attribute("id", json!(id))
    }

    pub fn with_title(self, title: &str) -> Self {
        self.with_attribute("title", json!(title))
    }

    pub fn with_active(self, active: bool) -> Self {
        self.with_attribute("active", json!(active))
    }

    pub fn with_name(self, given: &str, family: &str) -> Self {
        self.with_attribute("name", json!({"givenName": given, "familyName": family}))
    }

    /// Append an email of the given type
    pub fn with_email(mut self, value: &str, kind: &str) -> Self {
        let email = json!({"value": value, "type": kind});
        match self.data.get_mut("emails").and_then(Value::as_array_mut) {
            Some(emails) => emails.push(email),
            None => self.data["emails"] = json!([email]),
        }
        self
    }

    pub fn with_attribute(mut self, name: &str, value: Value) -> Self {
        self.data[name] = value;
        self
    }

    pub fn build(self) -> Value {
        self.data
    }

    pub fn build_node(self) -> Node {
        Node::from(self.data)
    }
}
