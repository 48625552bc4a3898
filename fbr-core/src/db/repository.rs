use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    CapitalGainRate, FilerStatus, NewTaxComputation, TaxComputation, TaxSlab, TaxYearConfig,
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

#[async_trait]
pub trait TaxRepository: Send + Sync {
    // Tax years
    async fn list_tax_years(&self) -> Result<Vec<String>, RepositoryError>;
    async fn get_tax_year_config(&self, tax_year: &str) -> Result<TaxYearConfig, RepositoryError>;
    async fn upsert_tax_year_config(&self, config: &TaxYearConfig) -> Result<(), RepositoryError>;

    // Slabs
    async fn get_tax_slabs(
        &self,
        tax_year: &str,
        filer_status: FilerStatus,
    ) -> Result<Vec<TaxSlab>, RepositoryError>;

    async fn insert_tax_slab(&self, slab: &TaxSlab) -> Result<(), RepositoryError>;

    async fn delete_tax_slabs(
        &self,
        tax_year: &str,
        filer_status: FilerStatus,
    ) -> Result<(), RepositoryError>;

    // Capital gains rates
    async fn get_capital_gain_rates(
        &self,
        tax_year: &str,
    ) -> Result<Vec<CapitalGainRate>, RepositoryError>;

    async fn upsert_capital_gain_rate(&self, rate: &CapitalGainRate) -> Result<(), RepositoryError>;

    // Computations
    async fn create_computation(
        &self,
        computation: NewTaxComputation,
    ) -> Result<TaxComputation, RepositoryError>;

    async fn get_computation(&self, id: i64) -> Result<TaxComputation, RepositoryError>;

    async fn delete_computation(&self, id: i64) -> Result<(), RepositoryError>;

    async fn list_computations(
        &self,
        tax_year: Option<&str>,
    ) -> Result<Vec<TaxComputation>, RepositoryError>;
}
