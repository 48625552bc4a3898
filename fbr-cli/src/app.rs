use std::path::Path;

use anyhow::{Context, Result};
use fbr_core::calculations::{calculate_comprehensive_tax, validate_tax_data};
use fbr_core::db::{DbConfig, RepositoryRegistry};
use fbr_core::{
    ComprehensiveTaxResult, FilerStatus, NewTaxComputation, RateBook, SlabTable, TaxComputation,
    TaxFormData, TaxRepository, ValidationReport,
};
use fbr_db_sqlite::SqliteRepositoryFactory;
use tracing::{debug, info};

/// Registry with every backend this binary ships with.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

pub async fn open_repository(config: &DbConfig) -> Result<Box<dyn TaxRepository>> {
    debug!(backend = %config.backend, "connecting");
    build_registry()
        .create(config)
        .await
        .with_context(|| format!("Failed to open database '{}'", config.connection_string))
}

/// Reads a return from a JSON file shaped like [`TaxFormData`].
pub fn read_forms(path: &Path) -> Result<TaxFormData> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read forms file '{}'", path.display()))?;
    parse_forms(&text).with_context(|| format!("Failed to parse forms file '{}'", path.display()))
}

pub fn parse_forms(json: &str) -> Result<TaxFormData> {
    serde_json::from_str(json).context("Forms must be a JSON object of form categories")
}

pub async fn compute(
    repo: &dyn TaxRepository,
    forms: &TaxFormData,
    tax_year: &str,
    filer_status: FilerStatus,
) -> Result<ComprehensiveTaxResult> {
    let rates = RateBook::load(repo, tax_year)
        .await
        .with_context(|| format!("Failed to load rates for {tax_year}"))?;
    let result = calculate_comprehensive_tax(forms, tax_year, filer_status, &rates)?;
    info!(
        tax_year,
        %filer_status,
        total_tax_liability = %result.total_tax_liability,
        "computed tax"
    );
    Ok(result)
}

pub async fn save(
    repo: &dyn TaxRepository,
    label: &str,
    result: &ComprehensiveTaxResult,
) -> Result<TaxComputation> {
    repo.create_computation(NewTaxComputation::from_result(label, result))
        .await
        .context("Failed to save computation")
}

pub fn validate(forms: &TaxFormData) -> ValidationReport {
    validate_tax_data(forms)
}

pub async fn slab_table(
    repo: &dyn TaxRepository,
    tax_year: &str,
    filer_status: FilerStatus,
) -> Result<SlabTable> {
    let slabs = repo.get_tax_slabs(tax_year, filer_status).await?;
    if slabs.is_empty() {
        anyhow::bail!("no {filer_status} slab table for tax year {tax_year}");
    }
    Ok(SlabTable::new(tax_year, filer_status, slabs)?)
}

pub async fn history(
    repo: &dyn TaxRepository,
    tax_year: Option<&str>,
) -> Result<Vec<TaxComputation>> {
    Ok(repo.list_computations(tax_year).await?)
}

pub async fn delete(
    repo: &dyn TaxRepository,
    id: i64,
) -> Result<()> {
    repo.delete_computation(id)
        .await
        .with_context(|| format!("Failed to delete computation {id}"))
}
