//! Rate configuration consumed by the calculator.
//!
//! The calculator itself is synchronous and never touches storage. Callers
//! fetch a tax year's slabs, capital gains rates and surcharge settings up
//! front (see [`RateBook::load`]) and hand the calculator a
//! [`TaxRateProvider`].

use std::collections::HashMap;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::calculations::TaxEngineError;
use crate::db::{RepositoryError, TaxRepository};
use crate::models::{CapitalGainBucket, CapitalGainRate, FilerStatus, SlabTable, TaxYearConfig};

/// Lookup of rate configuration by tax year.
///
/// Lookups never fall back to another year or filer status.
pub trait TaxRateProvider {
    /// Slab table for `(tax_year, filer_status)`.
    ///
    /// # Errors
    /// [`TaxEngineError::ConfigurationNotFound`] when no table is configured.
    fn slab_table(
        &self,
        tax_year: &str,
        filer_status: FilerStatus,
    ) -> Result<&SlabTable, TaxEngineError>;

    /// Flat rate (fraction) for one capital gains bucket.
    ///
    /// # Errors
    /// [`TaxEngineError::ConfigurationNotFound`] when no rate is configured.
    fn capital_gain_rate(
        &self,
        tax_year: &str,
        bucket: CapitalGainBucket,
    ) -> Result<Decimal, TaxEngineError>;

    /// Per-year settings; `None` means no surcharge applies.
    fn tax_year_config(
        &self,
        tax_year: &str,
    ) -> Option<&TaxYearConfig>;
}

#[derive(Debug, Error)]
pub enum RateBookError {
    #[error("failed to read rate configuration: {0}")]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Engine(#[from] TaxEngineError),
}

/// In-memory [`TaxRateProvider`].
#[derive(Debug, Clone, Default)]
pub struct RateBook {
    slab_tables: HashMap<(String, FilerStatus), SlabTable>,
    capital_gain_rates: HashMap<(String, CapitalGainBucket), Decimal>,
    tax_years: HashMap<String, TaxYearConfig>,
}

impl RateBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table, replacing any table for the same year and status.
    pub fn insert_slab_table(
        &mut self,
        table: SlabTable,
    ) {
        let key = (table.tax_year().to_string(), table.filer_status());
        self.slab_tables.insert(key, table);
    }

    pub fn insert_capital_gain_rate(
        &mut self,
        rate: CapitalGainRate,
    ) {
        self.capital_gain_rates
            .insert((rate.tax_year, rate.bucket), rate.rate);
    }

    pub fn insert_tax_year_config(
        &mut self,
        config: TaxYearConfig,
    ) {
        self.tax_years.insert(config.tax_year.clone(), config);
    }

    /// Reads everything configured for `tax_year` from `repo`.
    ///
    /// A filer status with no stored brackets is left out, so computing for
    /// it later fails with [`TaxEngineError::ConfigurationNotFound`]. Stored
    /// brackets that do not form a valid table fail here.
    pub async fn load(
        repo: &dyn TaxRepository,
        tax_year: &str,
    ) -> Result<Self, RateBookError> {
        let mut book = Self::new();

        match repo.get_tax_year_config(tax_year).await {
            Ok(config) => book.insert_tax_year_config(config),
            Err(RepositoryError::NotFound) => {
                tracing::debug!(tax_year, "no tax year settings stored");
            }
            Err(e) => return Err(e.into()),
        }

        for &filer_status in FilerStatus::all() {
            let slabs = repo.get_tax_slabs(tax_year, filer_status).await?;
            if slabs.is_empty() {
                tracing::debug!(tax_year, %filer_status, "no slabs stored");
                continue;
            }
            let table = SlabTable::new(tax_year, filer_status, slabs).map_err(|source| {
                TaxEngineError::InvalidSlabTable {
                    tax_year: tax_year.to_string(),
                    filer_status,
                    source,
                }
            })?;
            book.insert_slab_table(table);
        }

        for rate in repo.get_capital_gain_rates(tax_year).await? {
            book.insert_capital_gain_rate(rate);
        }

        tracing::debug!(
            tax_year,
            slab_tables = book.slab_tables.len(),
            capital_gain_rates = book.capital_gain_rates.len(),
            "loaded rate book"
        );

        Ok(book)
    }
}

impl TaxRateProvider for RateBook {
    fn slab_table(
        &self,
        tax_year: &str,
        filer_status: FilerStatus,
    ) -> Result<&SlabTable, TaxEngineError> {
        self.slab_tables
            .get(&(tax_year.to_string(), filer_status))
            .ok_or_else(|| {
                TaxEngineError::ConfigurationNotFound(format!(
                    "no {filer_status} slab table for tax year {tax_year}"
                ))
            })
    }

    fn capital_gain_rate(
        &self,
        tax_year: &str,
        bucket: CapitalGainBucket,
    ) -> Result<Decimal, TaxEngineError> {
        self.capital_gain_rates
            .get(&(tax_year.to_string(), bucket))
            .copied()
            .ok_or_else(|| {
                TaxEngineError::ConfigurationNotFound(format!(
                    "no {bucket} capital gains rate for tax year {tax_year}"
                ))
            })
    }

    fn tax_year_config(
        &self,
        tax_year: &str,
    ) -> Option<&TaxYearConfig> {
        self.tax_years.get(tax_year)
    }
}
