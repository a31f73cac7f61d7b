//! User record types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A row of the identity model.
///
/// The adapter never interprets `attributes`; they are whatever text columns
/// the backing table carries besides the key and the remember token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub remember_token: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Set only for records loaded from or written to a store.
    #[serde(skip)]
    pub exists: bool,
}

impl UserRecord {
    /// A record that has not been persisted.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            remember_token: None,
            attributes: BTreeMap::new(),
            exists: false,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    pub fn set_remember_token(&mut self, token: impl Into<String>) {
        self.remember_token = Some(token.into());
    }

    /// Mark the record as backed by a stored row.
    pub fn persisted(mut self) -> Self {
        self.exists = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_does_not_exist() {
        let user = UserRecord::new("42").with_attribute("email", "a@b.com");
        assert!(!user.exists);
        assert_eq!(user.get("email"), Some("a@b.com"));
        assert!(user.persisted().exists);
    }
}
