//! User provider backed by an identity store and a directory bind

use async_trait::async_trait;
use dirauth_core::types::{Credentials, UserRecord};
use dirauth_core::Result;
use dirauth_metadata::{ModelRegistry, UserModel, UserStore};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::ldap::LdapAuthenticator;

/// What an auth guard needs from a source of users.
#[async_trait]
pub trait UserProvider: Send + Sync {
    /// Retrieve a user by their unique identifier.
    async fn retrieve_by_id(&self, identifier: &str) -> Result<Option<UserRecord>>;

    /// Retrieve a user by their unique identifier and "remember me" token.
    async fn retrieve_by_token(&self, identifier: &str, token: &str)
        -> Result<Option<UserRecord>>;

    /// Update the "remember me" token for the given user in storage.
    async fn update_remember_token(&self, user: &mut UserRecord, token: &str) -> Result<()>;

    /// Retrieve a user by the given credentials, ignoring password fields.
    async fn retrieve_by_credentials(&self, credentials: &Credentials)
        -> Result<Option<UserRecord>>;

    /// Validate a user against the given credentials.
    async fn validate_credentials(
        &self,
        user: &UserRecord,
        credentials: &Credentials,
    ) -> Result<bool>;
}

/// Finds users in the identity store and checks passwords against LDAP.
pub struct LdapUserProvider {
    model: String,
    models: Arc<ModelRegistry>,
    store: Arc<dyn UserStore>,
    authenticator: LdapAuthenticator,
}

impl LdapUserProvider {
    pub fn new(
        model: impl Into<String>,
        models: Arc<ModelRegistry>,
        store: Arc<dyn UserStore>,
        authenticator: LdapAuthenticator,
    ) -> Self {
        Self {
            model: model.into(),
            models,
            store,
            authenticator,
        }
    }

    /// Build the configured user model.
    ///
    /// Fails with `Error::UnknownModel` when nothing is registered under the
    /// configured name.
    pub fn create_model(&self) -> Result<UserModel> {
        self.models.resolve(&self.model)
    }
}

#[async_trait]
impl UserProvider for LdapUserProvider {
    async fn retrieve_by_id(&self, identifier: &str) -> Result<Option<UserRecord>> {
        let model = self.create_model()?;
        model.new_query().find(self.store.as_ref(), identifier).await
    }

    async fn retrieve_by_token(
        &self,
        identifier: &str,
        token: &str,
    ) -> Result<Option<UserRecord>> {
        let model = self.create_model()?;

        model
            .new_query()
            .where_eq(model.key_name.as_str(), identifier)
            .where_eq(model.remember_token_name.as_str(), token)
            .first(self.store.as_ref())
            .await
    }

    async fn update_remember_token(&self, user: &mut UserRecord, token: &str) -> Result<()> {
        let model = self.create_model()?;

        user.set_remember_token(token);
        self.store.save(&model, user).await
    }

    async fn retrieve_by_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<UserRecord>> {
        let fields = credentials.identity_fields();
        if fields.is_empty() {
            // TODO: return None here once callers stop relying on password-only lookups
            warn!("No identity fields in credentials, user lookup is unfiltered");
        }

        let mut query = self.create_model()?.new_query();
        for (field, value) in fields {
            query = query.where_eq(field, value);
        }

        query.first(self.store.as_ref()).await
    }

    async fn validate_credentials(
        &self,
        user: &UserRecord,
        credentials: &Credentials,
    ) -> Result<bool> {
        if !user.exists {
            debug!("Refusing to validate unsaved user {}", user.id);
            return Ok(false);
        }

        let result = self.authenticator.authenticate(credentials).await?;
        debug!("Directory bind for user {}: {:?}", user.id, result);

        Ok(result.is_success())
    }
}
