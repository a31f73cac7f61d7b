//! Auth driver registry and the LDAP driver registration

use dirauth_core::{DirAuthConfig, Error, Result, LDAP_DRIVER};
use dirauth_metadata::{ModelRegistry, UserStore};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::ldap::{Directory, LdapAuthenticator};
use crate::provider::{LdapUserProvider, UserProvider};

pub type ProviderFactory = Arc<dyn Fn() -> Arc<dyn UserProvider> + Send + Sync>;

/// Named user-provider factories the application authenticates through.
#[derive(Clone, Default)]
pub struct AuthManager {
    drivers: HashMap<String, ProviderFactory>,
}

impl AuthManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider factory under `driver`, replacing any previous one.
    pub fn extend<F>(&mut self, driver: impl Into<String>, factory: F)
    where
        F: Fn() -> Arc<dyn UserProvider> + Send + Sync + 'static,
    {
        let driver = driver.into();
        debug!("Registered auth driver: {}", driver);
        self.drivers.insert(driver, Arc::new(factory));
    }

    pub fn has_driver(&self, driver: &str) -> bool {
        self.drivers.contains_key(driver)
    }

    pub fn create_user_provider(&self, driver: &str) -> Result<Arc<dyn UserProvider>> {
        self.drivers
            .get(driver)
            .map(|factory| factory())
            .ok_or_else(|| Error::UnknownDriver(driver.to_string()))
    }
}

impl fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut drivers: Vec<_> = self.drivers.keys().collect();
        drivers.sort();
        f.debug_struct("AuthManager").field("drivers", &drivers).finish()
    }
}

/// Wires the `ldap-auth` driver into an [`AuthManager`].
pub struct LdapServiceProvider {
    config: Arc<DirAuthConfig>,
    models: Arc<ModelRegistry>,
    store: Arc<dyn UserStore>,
    directory: Arc<dyn Directory>,
}

impl LdapServiceProvider {
    pub fn new(
        config: Arc<DirAuthConfig>,
        models: Arc<ModelRegistry>,
        store: Arc<dyn UserStore>,
        directory: Arc<dyn Directory>,
    ) -> Self {
        Self {
            config,
            models,
            store,
            directory,
        }
    }

    /// Register the driver. The model name is only resolved when a provider
    /// first builds its model.
    pub fn boot(&self, manager: &mut AuthManager) {
        let config = self.config.clone();
        let models = self.models.clone();
        let store = self.store.clone();
        let directory = self.directory.clone();

        manager.extend(LDAP_DRIVER, move || {
            let authenticator = LdapAuthenticator::new(config.ldap.clone(), directory.clone());
            Arc::new(LdapUserProvider::new(
                config.auth.model.clone(),
                models.clone(),
                store.clone(),
                authenticator,
            )) as Arc<dyn UserProvider>
        });

        info!(
            "LDAP auth driver registered (model: {})",
            self.config.auth.model
        );
    }
}
