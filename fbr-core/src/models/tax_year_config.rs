use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-year settings that sit alongside the slab schedules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxYearConfig {
    /// FBR tax year label, e.g. `"2025-26"`.
    pub tax_year: String,
    pub effective_from: NaiveDate,
    pub effective_to: NaiveDate,
    /// Taxable income above which the surcharge applies. `None` disables it.
    pub surcharge_threshold: Option<Decimal>,
    /// Fraction of normal tax charged as surcharge.
    pub surcharge_rate: Decimal,
}

impl TaxYearConfig {
    /// Surcharge owed on `normal_tax` for a taxpayer with `taxable_income`.
    pub fn surcharge_on(
        &self,
        taxable_income: Decimal,
        normal_tax: Decimal,
    ) -> Decimal {
        match self.surcharge_threshold {
            Some(threshold) if taxable_income > threshold => normal_tax * self.surcharge_rate,
            _ => Decimal::ZERO,
        }
    }
}
