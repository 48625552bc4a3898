pub mod factory;
pub mod repository;

#[cfg(test)]
pub(crate) mod testing;

pub use factory::{DbConfig, RepositoryFactory, RepositoryRegistry};
pub use repository::{RepositoryError, TaxRepository};
