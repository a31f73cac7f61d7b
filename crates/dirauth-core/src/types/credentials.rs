//! Submitted login credentials

use std::collections::HashMap;
use std::fmt;

/// Marker that keeps a field out of identity lookups.
pub const PASSWORD_MARKER: &str = "password";

/// Field name/value pairs submitted by a login attempt.
///
/// Every field whose name contains `password` is a secret: it never reaches
/// an identity query and is redacted from `Debug` output.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    fields: HashMap<String, String>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(|s| s.as_str())
    }

    pub fn password(&self) -> Option<&str> {
        self.get(PASSWORD_MARKER)
    }

    /// Fields that take part in identity lookup, sorted by name.
    pub fn identity_fields(&self) -> Vec<(&str, &str)> {
        let mut fields: Vec<_> = self
            .fields
            .iter()
            .filter(|(name, _)| !is_secret_field(name))
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();
        fields.sort_unstable();
        fields
    }
}

pub fn is_secret_field(name: &str) -> bool {
    name.contains(PASSWORD_MARKER)
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Credentials {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in &self.fields {
            if is_secret_field(name) {
                map.entry(name, &"[redacted]");
            } else {
                map.entry(name, value);
            }
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_fields_skip_passwords() {
        let creds = Credentials::new()
            .with("username", "alice")
            .with("password", "secret1")
            .with("password_confirmation", "secret1")
            .with("email", "alice@example.com");

        assert_eq!(
            creds.identity_fields(),
            vec![("email", "alice@example.com"), ("username", "alice")]
        );
        assert_eq!(creds.password(), Some("secret1"));
    }

    #[test]
    fn test_password_only_has_no_identity_fields() {
        let creds: Credentials = [("password", "secret1")].into_iter().collect();
        assert!(creds.identity_fields().is_empty());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::new()
            .with("username", "alice")
            .with("password", "hunter22");

        let out = format!("{:?}", creds);
        assert!(out.contains("alice"));
        assert!(!out.contains("hunter22"));
    }
}
