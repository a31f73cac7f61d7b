//! In-process identity store
//!
//! Keeps records per table in insertion order, so "first match" is the
//! earliest inserted record.

use async_trait::async_trait;
use dirauth_core::types::UserRecord;
use dirauth_core::Result;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::model::UserModel;
use crate::traits::{Filter, UserStore};

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    tables: RwLock<HashMap<String, Vec<UserRecord>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self, model: &UserModel) -> usize {
        self.tables
            .read()
            .await
            .get(&model.table)
            .map(|rows| rows.len())
            .unwrap_or(0)
    }
}

fn column_value<'a>(model: &UserModel, user: &'a UserRecord, column: &str) -> Option<&'a str> {
    if column == model.key_name {
        Some(user.id.as_str())
    } else if column == model.remember_token_name {
        user.remember_token.as_deref()
    } else {
        user.get(column)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find(&self, model: &UserModel, id: &str) -> Result<Option<UserRecord>> {
        let tables = self.tables.read().await;

        Ok(tables
            .get(&model.table)
            .and_then(|rows| rows.iter().find(|u| u.id == id))
            .cloned()
            .map(UserRecord::persisted))
    }

    async fn first(&self, model: &UserModel, filters: &[Filter]) -> Result<Option<UserRecord>> {
        let tables = self.tables.read().await;

        Ok(tables
            .get(&model.table)
            .and_then(|rows| {
                rows.iter().find(|user| {
                    filters
                        .iter()
                        .all(|(col, val)| column_value(model, user, col) == Some(val.as_str()))
                })
            })
            .cloned()
            .map(UserRecord::persisted))
    }

    async fn save(&self, model: &UserModel, user: &UserRecord) -> Result<()> {
        let mut tables = self.tables.write().await;
        let rows = tables.entry(model.table.clone()).or_default();

        match rows.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user.clone(),
            None => rows.push(user.clone()),
        }

        debug!("Saved user {} to {}", user.id, model.table);
        Ok(())
    }
}
