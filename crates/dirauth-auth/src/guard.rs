//! Login attempts against a user provider

use dirauth_core::types::{Credentials, UserRecord};
use dirauth_core::Result;
use rand::distr::Alphanumeric;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info};

use crate::provider::UserProvider;

/// Remember-me token length
pub const REMEMBER_TOKEN_LENGTH: usize = 60;

/// Generate a random remember-me token.
pub fn generate_remember_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(REMEMBER_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Runs the retrieve-then-validate login sequence. Keeping the session is the
/// caller's job.
#[derive(Clone)]
pub struct SessionGuard {
    provider: Arc<dyn UserProvider>,
}

impl SessionGuard {
    pub fn new(provider: Arc<dyn UserProvider>) -> Self {
        Self { provider }
    }

    /// Returns the authenticated user, or `None` for any failed login.
    ///
    /// With `remember`, a fresh remember token is stored on the user.
    pub async fn attempt(
        &self,
        credentials: &Credentials,
        remember: bool,
    ) -> Result<Option<UserRecord>> {
        let Some(mut user) = self.provider.retrieve_by_credentials(credentials).await? else {
            debug!("Login failed: no matching user");
            return Ok(None);
        };

        if !self.provider.validate_credentials(&user, credentials).await? {
            debug!("Login failed for user {}", user.id);
            return Ok(None);
        }

        if remember {
            let token = generate_remember_token();
            self.provider.update_remember_token(&mut user, &token).await?;
        }

        info!("User {} authenticated", user.id);
        Ok(Some(user))
    }

    /// Resolve a user from a remember-me cookie's id and token.
    pub async fn via_remember(&self, identifier: &str, token: &str) -> Result<Option<UserRecord>> {
        if token.is_empty() {
            return Ok(None);
        }

        self.provider.retrieve_by_token(identifier, token).await
    }
}
