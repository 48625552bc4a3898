//! Tax calculation modules for the FBR individual return.
//!
//! The pipeline runs bottom-up: [`aggregator`] turns raw form fields into
//! totals, [`progressive`] applies the slab schedule, [`capital_gains`]
//! taxes each holding-period bucket, and [`comprehensive`] nets reductions,
//! credits and tax already paid into the final figure.

pub mod aggregator;
pub mod capital_gains;
pub mod common;
pub mod comprehensive;
pub mod progressive;
pub mod validation;

use thiserror::Error;

use crate::models::{FilerStatus, SlabTableError};

pub use aggregator::{CapitalGainAggregate, FormAggregate, aggregate};
pub use capital_gains::{CapitalGainSummary, CapitalGainTax, compute_capital_gains};
pub use comprehensive::{ComprehensiveTaxCalculator, ComprehensiveTaxResult, calculate_comprehensive_tax};
pub use progressive::{SlabBreakdown, compute_tax, marginal_rate, slab_breakdown};
pub use validation::{ValidationReport, validate_tax_data};

/// Errors that stop a calculation.
///
/// Bad field values never show up here: they are coerced to 0 and reported
/// as [`crate::money::InputIssue`]s on the result instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaxEngineError {
    /// A slab table, capital gains rate or other rate setting is missing
    /// for the requested tax year.
    #[error("configuration not found: {0}")]
    ConfigurationNotFound(String),

    #[error("invalid slab table for {tax_year} ({filer_status}): {source}")]
    InvalidSlabTable {
        tax_year: String,
        filer_status: FilerStatus,
        #[source]
        source: SlabTableError,
    },
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::models::{CapitalGainBucket, CapitalGainRate, FilerStatus, SlabTable, TaxSlab, TaxYearConfig};
    use crate::rates::RateBook;

    pub const TAX_YEAR: &str = "2025-26";

    fn table(
        status: FilerStatus,
        rows: &[(Decimal, Option<Decimal>, Decimal, Decimal)],
    ) -> SlabTable {
        let slabs = rows
            .iter()
            .map(|&(min_income, max_income, rate, fixed_amount)| TaxSlab {
                tax_year: TAX_YEAR.to_string(),
                filer_status: status,
                min_income,
                max_income,
                rate,
                fixed_amount,
            })
            .collect();
        SlabTable::new(TAX_YEAR, status, slabs).unwrap()
    }

    pub fn filer_table() -> SlabTable {
        table(
            FilerStatus::Filer,
            &[
                (dec!(0), Some(dec!(600000)), dec!(0), dec!(0)),
                (dec!(600000), Some(dec!(1200000)), dec!(0.05), dec!(0)),
                (dec!(1200000), Some(dec!(2200000)), dec!(0.125), dec!(30000)),
                (dec!(2200000), Some(dec!(3200000)), dec!(0.20), dec!(155000)),
                (dec!(3200000), Some(dec!(4100000)), dec!(0.25), dec!(355000)),
                (dec!(4100000), None, dec!(0.35), dec!(580000)),
            ],
        )
    }

    pub fn non_filer_table() -> SlabTable {
        table(
            FilerStatus::NonFiler,
            &[
                (dec!(0), Some(dec!(600000)), dec!(0), dec!(0)),
                (dec!(600000), Some(dec!(1200000)), dec!(0.10), dec!(0)),
                (dec!(1200000), Some(dec!(2200000)), dec!(0.25), dec!(60000)),
                (dec!(2200000), Some(dec!(3200000)), dec!(0.40), dec!(310000)),
                (dec!(3200000), Some(dec!(4100000)), dec!(0.50), dec!(710000)),
                (dec!(4100000), None, dec!(0.70), dec!(1160000)),
            ],
        )
    }

    pub fn tax_year_config() -> TaxYearConfig {
        TaxYearConfig {
            tax_year: TAX_YEAR.to_string(),
            effective_from: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            effective_to: NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
            surcharge_threshold: Some(dec!(10000000)),
            surcharge_rate: dec!(0.10),
        }
    }

    pub fn capital_gain_rates() -> Vec<CapitalGainRate> {
        [
            (CapitalGainBucket::PropertyUpToOneYear, dec!(0.15)),
            (CapitalGainBucket::PropertyTwoToThreeYears, dec!(0.10)),
            (CapitalGainBucket::PropertyFourYearsPlus, dec!(0)),
            (CapitalGainBucket::Securities, dec!(0.125)),
            (CapitalGainBucket::Other, dec!(0.15)),
        ]
        .into_iter()
        .map(|(bucket, rate)| CapitalGainRate {
            tax_year: TAX_YEAR.to_string(),
            bucket,
            rate,
        })
        .collect()
    }

    /// Filer and non-filer schedules, surcharge settings and capital gains
    /// rates for 2025-26.
    pub fn rate_book() -> RateBook {
        let mut book = RateBook::new();
        book.insert_slab_table(filer_table());
        book.insert_slab_table(non_filer_table());
        book.insert_tax_year_config(tax_year_config());
        for rate in capital_gain_rates() {
            book.insert_capital_gain_rate(rate);
        }
        book
    }
}
