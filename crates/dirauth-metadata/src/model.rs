//! User model descriptors and queries

use dirauth_core::types::UserRecord;
use dirauth_core::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::traits::{Filter, UserStore};

/// Where and how a user model is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserModel {
    pub name: String,
    pub table: String,
    pub key_name: String,
    pub remember_token_name: String,
}

impl UserModel {
    /// Model backed by `table`, keyed by `id`, remembering in `remember_token`.
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            key_name: "id".to_string(),
            remember_token_name: "remember_token".to_string(),
        }
    }

    pub fn with_key_name(mut self, key_name: impl Into<String>) -> Self {
        self.key_name = key_name.into();
        self
    }

    pub fn with_remember_token_name(mut self, name: impl Into<String>) -> Self {
        self.remember_token_name = name.into();
        self
    }

    pub fn new_query(&self) -> UserQuery {
        UserQuery {
            model: self.clone(),
            filters: Vec::new(),
        }
    }
}

/// Equality query against one user model.
#[derive(Debug, Clone)]
pub struct UserQuery {
    model: UserModel,
    filters: Vec<Filter>,
}

impl UserQuery {
    pub fn where_eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((column.into(), value.into()));
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub async fn find(&self, store: &dyn UserStore, id: &str) -> Result<Option<UserRecord>> {
        store.find(&self.model, id).await
    }

    pub async fn first(&self, store: &dyn UserStore) -> Result<Option<UserRecord>> {
        store.first(&self.model, &self.filters).await
    }
}

pub type ModelFactory = Arc<dyn Fn() -> UserModel + Send + Sync>;

/// Configured model names mapped to their constructors.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    factories: HashMap<String, ModelFactory>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the stock `users` model.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("users", || UserModel::new("users", "users"));
        registry
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> UserModel + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn resolve(&self, name: &str) -> Result<UserModel> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| Error::UnknownModel(name.to_string()))
    }
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("ModelRegistry").field("models", &names).finish()
    }
}
