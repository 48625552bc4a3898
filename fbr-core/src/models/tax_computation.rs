use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::ComprehensiveTaxResult;
use crate::models::FilerStatus;

/// Headline figures of a computed return, as kept in the reporting table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxComputation {
    pub id: i64,
    pub tax_year: String,
    pub filer_status: FilerStatus,
    /// Caller-supplied reference (taxpayer, return or report name).
    pub label: String,

    pub gross_income: Decimal,
    pub taxable_income: Decimal,
    pub normal_tax: Decimal,
    pub surcharge: Decimal,
    pub capital_gain_tax: Decimal,
    pub total_tax_liability: Decimal,
    pub total_tax_paid: Decimal,
    pub refund_due: Decimal,
    pub additional_tax_due: Decimal,
    pub effective_tax_rate: Decimal,

    pub created_at: DateTime<Utc>,
}

/// For persisting a new computation (no id or timestamp)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTaxComputation {
    pub tax_year: String,
    pub filer_status: FilerStatus,
    pub label: String,
    pub gross_income: Decimal,
    pub taxable_income: Decimal,
    pub normal_tax: Decimal,
    pub surcharge: Decimal,
    pub capital_gain_tax: Decimal,
    pub total_tax_liability: Decimal,
    pub total_tax_paid: Decimal,
    pub refund_due: Decimal,
    pub additional_tax_due: Decimal,
    pub effective_tax_rate: Decimal,
}

impl NewTaxComputation {
    pub fn from_result(
        label: impl Into<String>,
        result: &ComprehensiveTaxResult,
    ) -> Self {
        Self {
            tax_year: result.tax_year.clone(),
            filer_status: result.filer_status,
            label: label.into(),
            gross_income: result.gross_income,
            taxable_income: result.taxable_income,
            normal_tax: result.normal_tax,
            surcharge: result.surcharge,
            capital_gain_tax: result.capital_gain_tax,
            total_tax_liability: result.total_tax_liability,
            total_tax_paid: result.total_tax_paid,
            refund_due: result.refund_due,
            additional_tax_due: result.additional_tax_due,
            effective_tax_rate: result.effective_tax_rate,
        }
    }
}
