//! Picks the storage backend for rate tables and saved computations.
//!
//! The engine itself never opens a database. Front-ends build a
//! [`RepositoryRegistry`] with the backends they ship, then ask it for a
//! [`TaxRepository`] matching the configured [`DbConfig`].

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::repository::{RepositoryError, TaxRepository};

/// Where the rate tables and saved computations live.
///
/// `connection_string` is handed to the backend untouched; for SQLite it is
/// a file path (`fbr-tax.db`), a `sqlite://` URL or `:memory:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub backend: String,
    pub connection_string: String,
}

impl DbConfig {
    pub fn sqlite(connection_string: impl Into<String>) -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: connection_string.into(),
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::sqlite("fbr-tax.db")
    }
}

/// Opens one kind of store. The returned repository is migrated and holds
/// the bundled rate seeds.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    fn backend_name(&self) -> &'static str;

    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn TaxRepository>, RepositoryError>;
}

/// Backends known to a front-end, keyed by [`RepositoryFactory::backend_name`].
#[derive(Default)]
pub struct RepositoryRegistry {
    factories: BTreeMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `factory`. A later factory with the same name wins.
    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    pub fn available_backends(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    /// Opens the store named by `config.backend`.
    ///
    /// An unregistered backend is a [`RepositoryError::Configuration`] that
    /// lists what is available; factory failures pass through unchanged.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn TaxRepository>, RepositoryError> {
        let Some(factory) = self.factories.get(config.backend.as_str()) else {
            return Err(RepositoryError::Configuration(format!(
                "no '{}' storage backend; this build supports {}",
                config.backend,
                self.available_backends().join(", ")
            )));
        };

        tracing::debug!(backend = %config.backend, "opening rate store");
        factory.create(config).await
    }
}
