//! The comprehensive tax computation for one return.
//!
//! # Computation Structure
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Aggregate every form into totals |
//! | 2    | Taxable income (gross − exempt − deductions, minimum 0) |
//! | 3    | Normal tax from the slab table for the filer status |
//! | 4    | Surcharge on normal tax above the year's threshold |
//! | 5    | Capital gains tax at the bucket rates |
//! | 6    | Tax chargeable (Steps 3 + 4 + 5) |
//! | 7    | Tax after reductions (Step 6 − reductions, minimum 0) |
//! | 8    | Tax after credits (Step 7 − credits, minimum 0) = total liability |
//! | 9    | Tax paid (adjustable tax + final tax) |
//! | 10   | Refund or additional tax due |
//! | 11   | Effective and marginal rates |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use fbr_core::calculations::calculate_comprehensive_tax;
//! use fbr_core::{FilerStatus, FormFields, RateBook, SlabTable, TaxFormData, TaxSlab};
//!
//! let slab = |min, max, rate, fixed| TaxSlab {
//!     tax_year: "2025-26".to_string(),
//!     filer_status: FilerStatus::Filer,
//!     min_income: min,
//!     max_income: max,
//!     rate,
//!     fixed_amount: fixed,
//! };
//! let mut rates = RateBook::new();
//! rates.insert_slab_table(
//!     SlabTable::new(
//!         "2025-26",
//!         FilerStatus::Filer,
//!         vec![
//!             slab(dec!(0), Some(dec!(600000)), dec!(0), dec!(0)),
//!             slab(dec!(600000), Some(dec!(1200000)), dec!(0.05), dec!(0)),
//!             slab(dec!(1200000), None, dec!(0.125), dec!(30000)),
//!         ],
//!     )
//!     .unwrap(),
//! );
//!
//! let forms = TaxFormData {
//!     income: FormFields::new()
//!         .with("annual_basic_salary", "1200000")
//!         .with("salary_tax_deducted", "40000"),
//!     ..Default::default()
//! };
//!
//! let result = calculate_comprehensive_tax(&forms, "2025-26", FilerStatus::Filer, &rates).unwrap();
//!
//! assert_eq!(result.normal_tax, dec!(30000.00));
//! assert_eq!(result.refund_due, dec!(10000.00));
//! assert_eq!(result.additional_tax_due, dec!(0));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::TaxEngineError;
use crate::calculations::aggregator::{FormAggregate, aggregate};
use crate::calculations::capital_gains::{CapitalGainSummary, compute_capital_gains};
use crate::calculations::common::{non_negative, percentage_of, rate_as_percentage, round_half_up};
use crate::calculations::progressive::{SlabBreakdown, compute_tax, marginal_rate, slab_breakdown};
use crate::models::{FilerStatus, TaxFormData};
use crate::money::InputIssue;
use crate::rates::TaxRateProvider;

/// Result of the comprehensive computation.
///
/// Every amount is rounded to two places. Rates are percentages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComprehensiveTaxResult {
    pub tax_year: String,
    pub filer_status: FilerStatus,

    // Income
    pub gross_income: Decimal,
    pub exempt_income: Decimal,
    pub allowable_deductions: Decimal,
    pub taxable_income: Decimal,
    pub salary_income: Decimal,
    pub income_subject_to_minimum_tax: Decimal,

    // Tax
    pub normal_tax: Decimal,
    pub surcharge: Decimal,
    /// Capital gains after carried-forward losses, taxed separately.
    pub capital_gain: Decimal,
    pub capital_gain_tax: Decimal,
    pub tax_chargeable: Decimal,
    pub tax_reductions: Decimal,
    pub tax_after_reductions: Decimal,
    pub tax_credits: Decimal,
    pub tax_after_credits: Decimal,

    // Payments
    pub adjustable_tax: Decimal,
    pub final_tax: Decimal,
    pub total_tax_liability: Decimal,
    pub total_tax_paid: Decimal,
    pub refund_due: Decimal,
    pub additional_tax_due: Decimal,

    // Rates
    pub effective_tax_rate: Decimal,
    pub marginal_tax_rate: Decimal,

    pub slab_breakdown: Vec<SlabBreakdown>,
    pub capital_gains: CapitalGainSummary,

    /// Fields that were unusable and counted as 0.
    pub input_issues: Vec<InputIssue>,
}

impl ComprehensiveTaxResult {
    pub fn has_refund(&self) -> bool {
        self.refund_due > Decimal::ZERO
    }
}

/// Computes returns against one rate configuration.
#[derive(Debug, Clone)]
pub struct ComprehensiveTaxCalculator<'a, P: TaxRateProvider + ?Sized> {
    rates: &'a P,
}

impl<'a, P: TaxRateProvider + ?Sized> ComprehensiveTaxCalculator<'a, P> {
    pub fn new(rates: &'a P) -> Self {
        Self { rates }
    }

    /// Computes the return for `tax_year` under the `filer_status` schedule.
    ///
    /// Missing forms and fields count as 0, so a partially filled return
    /// still computes.
    ///
    /// # Errors
    ///
    /// [`TaxEngineError::ConfigurationNotFound`] if the rate configuration has
    /// no slab table for `(tax_year, filer_status)`, or no rate for a capital
    /// gains bucket that has a taxable amount.
    pub fn calculate(
        &self,
        form_data: &TaxFormData,
        tax_year: &str,
        filer_status: FilerStatus,
    ) -> Result<ComprehensiveTaxResult, TaxEngineError> {
        let table = self.rates.slab_table(tax_year, filer_status)?;

        // Aggregate the forms
        let FormAggregate {
            gross_income,
            exempt_income,
            allowable_deductions,
            salary_income,
            income_subject_to_minimum_tax,
            tax_reductions,
            tax_credits,
            adjustable_tax,
            final_tax,
            capital_gains,
            issues,
            ..
        } = aggregate(form_data);

        let taxable_income = self.taxable_income(gross_income, exempt_income, allowable_deductions);

        let normal_tax = compute_tax(taxable_income, table);
        let surcharge = self.surcharge(tax_year, taxable_income, normal_tax);
        let capital_gains = compute_capital_gains(&capital_gains, tax_year, self.rates)?;

        let tax_chargeable = round_half_up(normal_tax + surcharge + capital_gains.total_tax);
        let tax_after_reductions = self.subtract_clamped(tax_chargeable, tax_reductions);
        let tax_after_credits = self.subtract_clamped(tax_after_reductions, tax_credits);

        let total_tax_liability = tax_after_credits;
        let total_tax_paid = round_half_up(adjustable_tax + final_tax);
        let refund_due = self.subtract_clamped(total_tax_paid, total_tax_liability);
        let additional_tax_due = self.subtract_clamped(total_tax_liability, total_tax_paid);

        let effective_tax_rate = percentage_of(total_tax_liability, taxable_income);
        let marginal_tax_rate = rate_as_percentage(marginal_rate(taxable_income, table));

        tracing::debug!(
            tax_year,
            %filer_status,
            %taxable_income,
            %normal_tax,
            %total_tax_liability,
            %total_tax_paid,
            "computed return"
        );

        Ok(ComprehensiveTaxResult {
            tax_year: tax_year.to_string(),
            filer_status,
            gross_income,
            exempt_income,
            allowable_deductions,
            taxable_income,
            salary_income,
            income_subject_to_minimum_tax,
            normal_tax,
            surcharge,
            capital_gain: capital_gains.total_taxable_amount,
            capital_gain_tax: capital_gains.total_tax,
            tax_chargeable,
            tax_reductions,
            tax_after_reductions,
            tax_credits,
            tax_after_credits,
            adjustable_tax,
            final_tax,
            total_tax_liability,
            total_tax_paid,
            refund_due,
            additional_tax_due,
            effective_tax_rate,
            marginal_tax_rate,
            slab_breakdown: slab_breakdown(taxable_income, table),
            capital_gains,
            input_issues: issues,
        })
    }

    /// Gross income less exempt income and allowable deductions, minimum 0.
    fn taxable_income(
        &self,
        gross_income: Decimal,
        exempt_income: Decimal,
        allowable_deductions: Decimal,
    ) -> Decimal {
        non_negative(round_half_up(gross_income - exempt_income - allowable_deductions))
    }

    fn surcharge(
        &self,
        tax_year: &str,
        taxable_income: Decimal,
        normal_tax: Decimal,
    ) -> Decimal {
        self.rates
            .tax_year_config(tax_year)
            .map(|config| round_half_up(config.surcharge_on(taxable_income, normal_tax)))
            .unwrap_or(Decimal::ZERO)
    }

    fn subtract_clamped(
        &self,
        amount: Decimal,
        offset: Decimal,
    ) -> Decimal {
        non_negative(round_half_up(amount - offset))
    }
}

/// Convenience wrapper around [`ComprehensiveTaxCalculator::calculate`].
pub fn calculate_comprehensive_tax<P: TaxRateProvider + ?Sized>(
    form_data: &TaxFormData,
    tax_year: &str,
    filer_status: FilerStatus,
    rates: &P,
) -> Result<ComprehensiveTaxResult, TaxEngineError> {
    ComprehensiveTaxCalculator::new(rates).calculate(form_data, tax_year, filer_status)
}
