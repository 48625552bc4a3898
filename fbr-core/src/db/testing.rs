//! In-memory [`TaxRepository`] for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::repository::{RepositoryError, TaxRepository};
use crate::models::{
    CapitalGainRate, FilerStatus, NewTaxComputation, TaxComputation, TaxSlab, TaxYearConfig,
};

#[derive(Default)]
struct State {
    configs: Vec<TaxYearConfig>,
    slabs: Vec<TaxSlab>,
    capital_gain_rates: Vec<CapitalGainRate>,
    computations: Vec<TaxComputation>,
    next_id: i64,
}

#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<State>,
}

impl MemoryRepository {
    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl TaxRepository for MemoryRepository {
    async fn list_tax_years(&self) -> Result<Vec<String>, RepositoryError> {
        let mut years: Vec<_> = self.state().configs.iter().map(|c| c.tax_year.clone()).collect();
        years.sort();
        years.reverse();
        Ok(years)
    }

    async fn get_tax_year_config(&self, tax_year: &str) -> Result<TaxYearConfig, RepositoryError> {
        self.state()
            .configs
            .iter()
            .find(|c| c.tax_year == tax_year)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn upsert_tax_year_config(&self, config: &TaxYearConfig) -> Result<(), RepositoryError> {
        let mut state = self.state();
        state.configs.retain(|c| c.tax_year != config.tax_year);
        state.configs.push(config.clone());
        Ok(())
    }

    async fn get_tax_slabs(
        &self,
        tax_year: &str,
        filer_status: FilerStatus,
    ) -> Result<Vec<TaxSlab>, RepositoryError> {
        Ok(self
            .state()
            .slabs
            .iter()
            .filter(|s| s.tax_year == tax_year && s.filer_status == filer_status)
            .cloned()
            .collect())
    }

    async fn insert_tax_slab(&self, slab: &TaxSlab) -> Result<(), RepositoryError> {
        self.state().slabs.push(slab.clone());
        Ok(())
    }

    async fn delete_tax_slabs(
        &self,
        tax_year: &str,
        filer_status: FilerStatus,
    ) -> Result<(), RepositoryError> {
        self.state()
            .slabs
            .retain(|s| !(s.tax_year == tax_year && s.filer_status == filer_status));
        Ok(())
    }

    async fn get_capital_gain_rates(
        &self,
        tax_year: &str,
    ) -> Result<Vec<CapitalGainRate>, RepositoryError> {
        Ok(self
            .state()
            .capital_gain_rates
            .iter()
            .filter(|r| r.tax_year == tax_year)
            .cloned()
            .collect())
    }

    async fn upsert_capital_gain_rate(&self, rate: &CapitalGainRate) -> Result<(), RepositoryError> {
        let mut state = self.state();
        state
            .capital_gain_rates
            .retain(|r| !(r.tax_year == rate.tax_year && r.bucket == rate.bucket));
        state.capital_gain_rates.push(rate.clone());
        Ok(())
    }

    async fn create_computation(
        &self,
        computation: NewTaxComputation,
    ) -> Result<TaxComputation, RepositoryError> {
        let mut state = self.state();
        state.next_id += 1;
        let stored = TaxComputation {
            id: state.next_id,
            tax_year: computation.tax_year,
            filer_status: computation.filer_status,
            label: computation.label,
            gross_income: computation.gross_income,
            taxable_income: computation.taxable_income,
            normal_tax: computation.normal_tax,
            surcharge: computation.surcharge,
            capital_gain_tax: computation.capital_gain_tax,
            total_tax_liability: computation.total_tax_liability,
            total_tax_paid: computation.total_tax_paid,
            refund_due: computation.refund_due,
            additional_tax_due: computation.additional_tax_due,
            effective_tax_rate: computation.effective_tax_rate,
            created_at: Utc::now(),
        };
        state.computations.push(stored.clone());
        Ok(stored)
    }

    async fn get_computation(&self, id: i64) -> Result<TaxComputation, RepositoryError> {
        self.state()
            .computations
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn delete_computation(&self, id: i64) -> Result<(), RepositoryError> {
        let mut state = self.state();
        let before = state.computations.len();
        state.computations.retain(|c| c.id != id);
        if state.computations.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_computations(
        &self,
        tax_year: Option<&str>,
    ) -> Result<Vec<TaxComputation>, RepositoryError> {
        Ok(self
            .state()
            .computations
            .iter()
            .filter(|c| tax_year.is_none_or(|year| c.tax_year == year))
            .cloned()
            .collect())
    }
}
