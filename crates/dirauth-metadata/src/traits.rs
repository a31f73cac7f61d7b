//! Identity store trait
//!
//! Defines the interface the user provider needs from the model layer.
//! Implementations exist for SQLite and an in-process store.

use async_trait::async_trait;
use dirauth_core::types::UserRecord;
use dirauth_core::Result;

use crate::model::UserModel;

/// Column/value equality filter.
pub type Filter = (String, String);

#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Keyed lookup on the model's primary key.
    async fn find(&self, model: &UserModel, id: &str) -> Result<Option<UserRecord>>;

    /// First record matching every filter. No filters means no restriction.
    async fn first(&self, model: &UserModel, filters: &[Filter]) -> Result<Option<UserRecord>>;

    /// Insert or update the record under its key.
    async fn save(&self, model: &UserModel, user: &UserRecord) -> Result<()>;
}
